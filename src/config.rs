use crate::error::StudyError;
use script_kit::{
    charts::FigureOptions,
    models::FolderLayout,
    services::CollisionPolicy,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const WORLD_BANK_API: &str = "https://api.worldbank.org/v2";

/// Largest figure `validate` accepts, in pixels.
pub const MAX_FIGURE_PIXELS: f64 = 100_000_000.0;

/// A World Bank series code and the column name it gets in the result table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Indicator {
    pub code: String,
    pub name: String,
}

impl Indicator {
    pub fn new(code: &str, name: &str) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
        }
    }
}

pub fn science_indicators() -> Vec<Indicator> {
    vec![
        Indicator::new("NY.GDP.MKTP.CD", "GDP"),
        Indicator::new("SP.POP.TOTL", "population"),
        Indicator::new("IP.JRN.ARTC.SC", "scientific_articles"),
        Indicator::new("GB.XPD.RSDV.GD.ZS", "rd_expend_per_gdp"),
    ]
}

// Holds application-wide settings
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub root: PathBuf,
    pub log_dir: PathBuf,
    pub year: i32,
    pub indicators: Vec<Indicator>,
    pub result_file_name: String,
    pub save_figures: bool,
    pub all_pairs: bool,
    pub regression_x: String,
    pub regression_y: String,
    pub collision_policy: CollisionPolicy,
    pub figure: FigureOptions,
    pub font_path: Option<PathBuf>,
    pub api_base_url: String,
    pub console_log: bool,
    pub detail_log: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            log_dir: PathBuf::from("log"),
            year: 2007,
            indicators: science_indicators(),
            result_file_name: "research_outcome.csv".to_string(),
            save_figures: true,
            all_pairs: false,
            regression_x: "rd_expend_per_gdp".to_string(),
            regression_y: "scientific_articles_per_gdp".to_string(),
            collision_policy: CollisionPolicy::Overwrite,
            figure: FigureOptions::default(),
            font_path: None,
            api_base_url: WORLD_BANK_API.to_string(),
            console_log: true,
            detail_log: true,
        }
    }
}

impl AppConfig {
    /// Load from an explicit YAML file, else from `$CONFIG_FILE`, else defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, StudyError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let path = path
            .map(Path::to_path_buf)
            .or_else(|| env::var_os("CONFIG_FILE").map(PathBuf::from));

        let config = match path {
            Some(path) => Self::from_yaml(&path)?,
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml(path: &Path) -> Result<Self, StudyError> {
        let yaml_content = fs::read_to_string(path).map_err(|e| {
            StudyError::Config(format!("failed to read config file {}: {}", path.display(), e))
        })?;
        Self::from_yaml_str(&yaml_content)
    }

    pub fn from_yaml_str(yaml_content: &str) -> Result<Self, StudyError> {
        serde_yaml::from_str(yaml_content)
            .map_err(|e| StudyError::Config(format!("failed to parse YAML config: {}", e)))
    }

    pub fn validate(&self) -> Result<(), StudyError> {
        if self.indicators.is_empty() {
            return Err(StudyError::Config("no indicators configured".to_string()));
        }
        if self.result_file_name.is_empty() {
            return Err(StudyError::Config("result_file_name is empty".to_string()));
        }
        let figure = &self.figure;
        let positive = |inches: f64| inches.is_finite() && inches > 0.0;
        if figure.dpi == 0 || !positive(figure.width_in) || !positive(figure.height_in) {
            return Err(StudyError::Config(format!(
                "invalid figure size {}x{} in at {} dpi",
                figure.width_in, figure.height_in, figure.dpi
            )));
        }
        let pixels = figure.width_in * figure.height_in * (figure.dpi as f64).powi(2);
        if pixels > MAX_FIGURE_PIXELS {
            return Err(StudyError::Config(format!(
                "figure of {}x{} in at {} dpi exceeds {} pixels",
                figure.width_in, figure.height_in, figure.dpi, MAX_FIGURE_PIXELS
            )));
        }
        let mut names: Vec<&str> = self.indicators.iter().map(|i| i.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        if names.len() != self.indicators.len() {
            return Err(StudyError::Config("indicator names must be unique".to_string()));
        }
        Ok(())
    }

    pub fn folder_layout(&self) -> FolderLayout {
        FolderLayout::analysis(&self.result_file_name)
    }

    /// The log folder, relative paths taken from the project root.
    pub fn log_path(&self) -> PathBuf {
        if self.log_dir.is_absolute() {
            self.log_dir.clone()
        } else {
            self.root.join(&self.log_dir)
        }
    }
}
