//! Data model: loaded tables, their column headers, and rendered artifacts.

pub mod artifact;
pub mod columns;
pub mod table;
