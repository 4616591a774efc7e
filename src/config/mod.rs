use std::env;
use std::path::{Path, PathBuf};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub frontend_url: String,
    pub data: DataConfig,
}

/// Location of the input spreadsheets.
#[derive(Debug, Clone)]
pub struct DataConfig {
    pub data_dir: PathBuf,
    pub indicators_file: String,
    pub prenatal_file: String,
    pub pregnant_file: String,
    pub syphilis_file: String,
    pub boundaries_file: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            host: env::var("BACKEND_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("BACKEND_PORT")
                .unwrap_or_else(|_| "8050".to_string())
                .parse()
                .unwrap_or(8050),
            frontend_url: env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            data: DataConfig::from_env(),
        }
    }
}

impl DataConfig {
    pub fn from_env() -> Self {
        let defaults = Self::with_dir(
            env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()),
        );
        Self {
            indicators_file: env::var("INDICATORS_FILE").unwrap_or(defaults.indicators_file),
            prenatal_file: env::var("PRENATAL_FILE").unwrap_or(defaults.prenatal_file),
            pregnant_file: env::var("PREGNANT_FILE").unwrap_or(defaults.pregnant_file),
            syphilis_file: env::var("SYPHILIS_FILE").unwrap_or(defaults.syphilis_file),
            boundaries_file: env::var("BOUNDARIES_FILE").unwrap_or(defaults.boundaries_file),
            data_dir: defaults.data_dir,
        }
    }

    /// Default file names under `data_dir`.
    pub fn with_dir(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            indicators_file: "indicadores.xlsx".to_string(),
            prenatal_file: "cpn_gestantes_resumen.xlsx".to_string(),
            pregnant_file: "GESTANTES_MUNICIPIO.xlsx".to_string(),
            syphilis_file: "its_sifilis.xlsx".to_string(),
            boundaries_file: "cauca_municipios.geojson".to_string(),
        }
    }

    pub fn indicators_path(&self) -> PathBuf {
        self.data_dir.join(&self.indicators_file)
    }

    pub fn prenatal_path(&self) -> PathBuf {
        self.data_dir.join(&self.prenatal_file)
    }

    pub fn pregnant_path(&self) -> PathBuf {
        self.data_dir.join(&self.pregnant_file)
    }

    pub fn syphilis_path(&self) -> PathBuf {
        self.data_dir.join(&self.syphilis_file)
    }

    pub fn boundaries_path(&self) -> PathBuf {
        self.data_dir.join(&self.boundaries_file)
    }
}
