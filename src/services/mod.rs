//! Dashboard sections and the query/render machinery they share.

pub mod dashboard;
pub mod indicators;
pub mod prenatal;
pub mod query;
pub mod render;
pub mod semaforo;
pub mod syphilis;

/// A control value, treating an empty string like no selection.
pub(crate) fn selected(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
