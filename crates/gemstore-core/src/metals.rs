use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Metal purity offered for a setting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetalCode {
    #[default]
    #[serde(rename = "14k")]
    K14,
    #[serde(rename = "18k")]
    K18,
}

impl MetalCode {
    pub const ALL: [MetalCode; 2] = [MetalCode::K14, MetalCode::K18];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MetalCode::K14 => "14k",
            MetalCode::K18 => "18k",
        }
    }
}

impl std::fmt::Display for MetalCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MetalCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "14k" => Ok(MetalCode::K14),
            "18k" => Ok(MetalCode::K18),
            other => Err(format!("unknown metal code '{other}'; expected 14k or 18k")),
        }
    }
}

/// A metal purity together with the factor it scales the fallback price by.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetalOption {
    pub code: MetalCode,
    pub multiplier: f64,
}

/// The process-wide metal multiplier table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetalTable {
    pub metals: Vec<MetalOption>,
}

impl Default for MetalTable {
    fn default() -> Self {
        Self {
            metals: vec![
                MetalOption {
                    code: MetalCode::K14,
                    multiplier: 1.0,
                },
                MetalOption {
                    code: MetalCode::K18,
                    multiplier: 1.3,
                },
            ],
        }
    }
}

impl MetalTable {
    /// Returns the multiplier for `code`.
    ///
    /// A validated table always carries every code; an unvalidated one that
    /// lacks `code` prices it at `1.0` (no markup).
    #[must_use]
    pub fn multiplier(&self, code: MetalCode) -> f64 {
        self.metals
            .iter()
            .find(|m| m.code == code)
            .map_or(1.0, |m| m.multiplier)
    }
}

/// Load and validate a metal multiplier table from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_metal_table(path: &Path) -> Result<MetalTable, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::MetalsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let table = parse_metal_table(&content)?;
    Ok(table)
}

fn parse_metal_table(content: &str) -> Result<MetalTable, ConfigError> {
    let table: MetalTable = serde_yaml::from_str(content).map_err(ConfigError::MetalsFileParse)?;
    validate_metal_table(&table)?;
    Ok(table)
}

fn validate_metal_table(table: &MetalTable) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for metal in &table.metals {
        if !metal.multiplier.is_finite() || metal.multiplier < 1.0 {
            return Err(ConfigError::Validation(format!(
                "metal '{}' has invalid multiplier {}; must be a finite number >= 1.0",
                metal.code, metal.multiplier
            )));
        }

        if !seen.insert(metal.code) {
            return Err(ConfigError::Validation(format!(
                "duplicate metal code: '{}'",
                metal.code
            )));
        }
    }

    if let Some(missing) = MetalCode::ALL.iter().find(|code| !seen.contains(*code)) {
        return Err(ConfigError::Validation(format!(
            "metal table is missing code '{missing}'"
        )));
    }

    Ok(())
}
