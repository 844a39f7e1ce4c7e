//! Solid registry, fluent builders and scene export.
//!
//! A [`Model`] owns the solids of one modeling session. Constructors hand
//! back a [`SolidBuilder`] for chained edits; booleans run on the model and
//! fold one operand into the other. [`Model::export`] writes the scene to the
//! requested formats.

pub mod bootstrap;
pub mod builder;
pub mod config;
pub mod errors;
pub mod export;
pub mod handle;
pub mod model;

pub use builder::SolidBuilder;
pub use config::ExportOptions;
pub use errors::{ExportError, ModelError, StepFailure};
pub use export::{ExportReport, ExportSolid, SkippedExport};
pub use handle::{SolidHandle, SolidId};
pub use model::Model;
