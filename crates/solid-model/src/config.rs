//! Export configuration.

use cad_types::{ExportFormat, Rgba};
use serde::{Deserialize, Serialize};

/// Tessellation tolerance in millimeters used when none is configured.
pub const DEFAULT_TESSELLATION_TOLERANCE: f64 = 0.05;

/// Color given to solids that never had one set.
pub const DEFAULT_SOLID_COLOR: Rgba = Rgba::rgb(0.8, 0.8, 0.8);

/// Options for [`crate::Model::export`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Formats to write, in order. Duplicates are written once.
    pub formats: Vec<ExportFormat>,
    /// Chordal tolerance for the faceted writer.
    pub tessellation_tolerance: f64,
    pub default_color: Rgba,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            formats: vec![ExportFormat::Vrml],
            tessellation_tolerance: DEFAULT_TESSELLATION_TOLERANCE,
            default_color: DEFAULT_SOLID_COLOR,
        }
    }
}

impl ExportOptions {
    pub fn with_formats(mut self, formats: impl IntoIterator<Item = ExportFormat>) -> Self {
        self.formats = formats.into_iter().collect();
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tessellation_tolerance = tolerance;
        self
    }

    /// Requested formats with duplicates removed, first occurrence wins.
    pub(crate) fn unique_formats(&self) -> Vec<ExportFormat> {
        let mut seen = Vec::with_capacity(self.formats.len());
        for format in &self.formats {
            if !seen.contains(format) {
                seen.push(*format);
            }
        }
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_vrml_only() {
        let options = ExportOptions::default();
        assert_eq!(options.formats, vec![ExportFormat::Vrml]);
        assert_eq!(options.tessellation_tolerance, 0.05);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let options: ExportOptions = serde_json::from_str(r#"{"formats": ["step", "vrml"]}"#).unwrap();
        assert_eq!(options.formats, vec![ExportFormat::Step, ExportFormat::Vrml]);
        assert_eq!(options.default_color, DEFAULT_SOLID_COLOR);
    }

    #[test]
    fn duplicate_formats_collapse() {
        let options = ExportOptions::default().with_formats([
            ExportFormat::Vrml,
            ExportFormat::Step,
            ExportFormat::Vrml,
        ]);
        assert_eq!(options.unique_formats(), vec![ExportFormat::Vrml, ExportFormat::Step]);
    }
}
