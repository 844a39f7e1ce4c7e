//! Scene writers and the record of what an export produced.

pub mod step;
pub mod vrml;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use cad_types::{ExportFormat, Model3DLink, Rgba};
use chrono::{DateTime, Utc};
use serde::Serialize;
use solid_kernel::ShapeId;

use crate::errors::StepFailure;

/// One solid as seen by the writers: a shape and its display metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSolid {
    pub shape: ShapeId,
    pub color: Option<Rgba>,
    pub name: Option<String>,
}

/// A requested format that produced no file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedExport {
    pub format: ExportFormat,
    pub reason: StepFailure,
}

/// Files written by one [`crate::Model::export`] call.
#[derive(Debug, Clone, Serialize)]
pub struct ExportReport {
    pub files: BTreeMap<ExportFormat, PathBuf>,
    pub skipped: Vec<SkippedExport>,
    pub exported_at: DateTime<Utc>,
}

impl ExportReport {
    pub(crate) fn new() -> Self {
        Self {
            files: BTreeMap::new(),
            skipped: Vec::new(),
            exported_at: Utc::now(),
        }
    }

    pub fn path(&self, format: ExportFormat) -> Option<&Path> {
        self.files.get(&format).map(PathBuf::as_path)
    }

    /// Reference to the produced file for a host document, with neutral
    /// placement.
    pub fn model_link(&self, format: ExportFormat) -> Option<Model3DLink> {
        self.path(format).map(Model3DLink::new)
    }
}

/// `<out_dir>/<base_name>.<ext>`
pub(crate) fn target_path(out_dir: &Path, base_name: &str, format: ExportFormat) -> PathBuf {
    out_dir.join(format!("{base_name}.{}", format.extension()))
}
