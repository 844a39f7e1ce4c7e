use serde::{Deserialize, Serialize};

/// Output formats a model can be exported to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Tessellated VRML 2.0 scene. Keeps per-solid color and name.
    Vrml,
    /// STEP AP203 boundary representation. Color and name are dropped.
    Step,
}

impl ExportFormat {
    /// File extension, without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Vrml => "wrl",
            ExportFormat::Step => "step",
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportFormat::Vrml => f.write_str("vrml"),
            ExportFormat::Step => f.write_str("step"),
        }
    }
}
