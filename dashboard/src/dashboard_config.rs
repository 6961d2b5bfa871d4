use std::fs;
use std::io;
use std::path::Path;

use resample::ResampleConfig;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Default)]
pub struct DashboardConfig {
    #[serde(default)]
    pub charts: Vec<ChartPreset>,
}

impl DashboardConfig {
    pub fn preset(&self, name: &str) -> Option<&ChartPreset> {
        self.charts.iter().find(|c| c.name == name)
    }
}

/// A named chart a widget can request instead of spelling out its config.
#[derive(Serialize, Deserialize, Clone)]
pub struct ChartPreset {
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub chart_type: ChartType,
    #[serde(default)]
    pub config: ResampleConfig,
}

/// Chart visualization types.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default, Debug)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    #[default]
    Bar,
    Line,
}

impl ChartType {
    pub fn display_name(&self) -> &str {
        match self {
            ChartType::Bar => "Bar",
            ChartType::Line => "Line",
        }
    }
}

pub fn parse(content: &str) -> Result<DashboardConfig, toml::de::Error> {
    toml::from_str(content)
}

/// Loads chart presets. Returns `DashboardConfig::default()` if the file
/// doesn't exist; propagates other I/O and parse errors.
pub fn load(path: &Path) -> io::Result<DashboardConfig> {
    match fs::read_to_string(path) {
        Ok(content) => parse(&content).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(DashboardConfig::default()),
        Err(e) => Err(e),
    }
}
