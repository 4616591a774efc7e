//! Column headers of the input spreadsheets, exactly as they appear in the files.

/// `indicadores.xlsx`: one row per (municipality, indicator).
pub mod indicator {
    pub const MUNICIPALITY: &str = "Municipio";
    pub const CATEGORY: &str = "Categoría";
    pub const INDICATOR: &str = "Indicador";
    pub const VALUE: &str = "Valor (%)";
    pub const TARGET: &str = "Meta (%)";
    pub const YEAR: &str = "Año";

    /// Category holding the sexual-violence indicators.
    pub const SEXUAL_VIOLENCE: &str = "Violencia Sexual";
}

/// `cpn_gestantes_resumen.xlsx`: one row per municipality, one column per
/// prenatal-care sub-indicator.
pub mod prenatal {
    pub const MUNICIPALITY: &str = "Municipio";

    /// Headers that are identifiers rather than indicators.
    pub const NON_INDICATOR: &[&str] = &["id", "codigo", "municipio"];
}

/// `GESTANTES_MUNICIPIO.xlsx`: pregnant women followed per municipality.
pub mod pregnant {
    pub const MUNICIPALITY: &str = "Municipio";
    pub const ACTIVE: &str = "Gestantes Activas";
}

/// `its_sifilis.xlsx`: individual case counts per event, municipality and week.
pub mod syphilis {
    pub const EVENT: &str = "evento";
    pub const MUNICIPALITY: &str = "municipio";
    pub const EPS: &str = "eps";
    pub const WEEK: &str = "semana";
    pub const NOTIFIED: &str = "fecha_notif";
    pub const CASES: &str = "casos";
}

/// GeoJSON property carrying the municipality name of a boundary feature.
pub const BOUNDARY_NAME_PROPERTY: &str = "NOMBRE_MUN";
