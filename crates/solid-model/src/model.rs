//! The solid registry.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use cad_types::{ExportFormat, Vec3};
use solid_kernel::{KernelBundle, ShapeId, SharedKernel};
use solid_ops::{BooleanKind, OpError, Scratch};
use tracing::{debug, info, warn};

use crate::bootstrap;
use crate::builder::SolidBuilder;
use crate::config::ExportOptions;
use crate::errors::{ExportError, ModelError};
use crate::export::{self, step, vrml, ExportReport, ExportSolid, SkippedExport};
use crate::handle::SolidHandle;

/// Ordered collection of the live solids of one modeling session.
///
/// Insertion order is kept and decides node order on export. The whole-model
/// rotation is fixed at construction and only ever applied to export copies.
pub struct Model {
    rotation: Vec3,
    kernel: Option<SharedKernel>,
    solids: Vec<Rc<RefCell<SolidHandle>>>,
}

impl Model {
    /// A model with no kernel attached yet; see [`Model::init`].
    pub fn new(rotation: impl Into<Vec3>) -> Self {
        Self {
            rotation: rotation.into(),
            kernel: None,
            solids: Vec::new(),
        }
    }

    pub fn with_kernel(kernel: SharedKernel, rotation: impl Into<Vec3>) -> Self {
        Self {
            rotation: rotation.into(),
            kernel: Some(kernel),
            solids: Vec::new(),
        }
    }

    /// Attach the process-wide kernel, loading it on first use.
    pub async fn init(&mut self) -> Result<(), ModelError> {
        if self.kernel.is_none() {
            self.kernel = Some(bootstrap::init().await?);
        }
        Ok(())
    }

    pub fn rotation(&self) -> Vec3 {
        self.rotation
    }

    pub fn kernel(&self) -> Result<&SharedKernel, ModelError> {
        self.kernel.as_ref().ok_or(ModelError::KernelNotInitialized)
    }

    pub fn len(&self) -> usize {
        self.solids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solids.is_empty()
    }

    /// Builders for every solid, in insertion order.
    pub fn solids(&self) -> Vec<SolidBuilder> {
        let Some(kernel) = &self.kernel else {
            return Vec::new();
        };
        self.solids
            .iter()
            .map(|handle| SolidBuilder::new(handle, kernel.clone()))
            .collect()
    }

    fn construct<F>(&mut self, op: F) -> Result<SolidBuilder, ModelError>
    where
        F: FnOnce(&mut dyn KernelBundle) -> Result<ShapeId, OpError>,
    {
        let kernel = self.kernel()?.clone();
        let shape = {
            let mut guard = kernel.lock();
            op(&mut *guard)?
        };
        let handle = Rc::new(RefCell::new(SolidHandle::new(kernel.clone(), shape)));
        let builder = SolidBuilder::new(&handle, kernel);
        self.solids.push(handle);
        Ok(builder)
    }

    /// Box of `size`; corner on the origin, or centered on it.
    pub fn cuboid(&mut self, size: impl Into<Vec3>, center: bool) -> Result<SolidBuilder, ModelError> {
        let size = size.into();
        self.construct(|kb| solid_ops::make_box(kb, size, center))
    }

    pub fn sphere(&mut self, radius: f64, center: bool) -> Result<SolidBuilder, ModelError> {
        self.construct(|kb| solid_ops::make_sphere(kb, radius, center))
    }

    pub fn cylinder(&mut self, radius: f64, height: f64, center: bool) -> Result<SolidBuilder, ModelError> {
        self.construct(|kb| solid_ops::make_cylinder(kb, radius, height, center))
    }

    pub fn pipe(
        &mut self,
        radius: f64,
        wall: f64,
        height: f64,
        center: bool,
    ) -> Result<SolidBuilder, ModelError> {
        self.construct(|kb| solid_ops::make_pipe(kb, radius, wall, height, center))
    }

    pub fn rounded_box(
        &mut self,
        size: impl Into<Vec3>,
        radius: f64,
        center: bool,
    ) -> Result<SolidBuilder, ModelError> {
        let size = size.into();
        self.construct(|kb| solid_ops::make_rounded_box(kb, size, radius, center))
    }

    pub fn union(&mut self, a: &SolidBuilder, b: &SolidBuilder) -> Result<SolidBuilder, ModelError> {
        self.combine(a, b, BooleanKind::Union)
    }

    /// `a` minus `b`.
    pub fn cut(&mut self, a: &SolidBuilder, b: &SolidBuilder) -> Result<SolidBuilder, ModelError> {
        self.combine(a, b, BooleanKind::Subtract)
    }

    pub fn intersect(&mut self, a: &SolidBuilder, b: &SolidBuilder) -> Result<SolidBuilder, ModelError> {
        self.combine(a, b, BooleanKind::Intersect)
    }

    /// Store the result in `a`'s handle and drop `b` from the registry.
    /// Dropping `b`'s handle releases its shape.
    fn combine(
        &mut self,
        a: &SolidBuilder,
        b: &SolidBuilder,
        kind: BooleanKind,
    ) -> Result<SolidBuilder, ModelError> {
        let kernel = self.kernel()?.clone();
        if a.same_solid(b) {
            return Err(ModelError::SameOperand);
        }
        let (handle_a, handle_b) = (a.handle()?, b.handle()?);
        // A foreign shape id would be resolved against the wrong kernel
        for (builder, handle) in [(a, &handle_a), (b, &handle_b)] {
            if !self.owns(handle) {
                return Err(ModelError::ForeignSolid { id: builder.id() });
            }
        }
        let (shape_a, shape_b) = (handle_a.borrow().shape(), handle_b.borrow().shape());

        let result = {
            let mut guard = kernel.lock();
            solid_ops::execute_boolean(&mut *guard, shape_a, shape_b, kind)?
        };
        handle_a.borrow_mut().set_shape(result);
        debug!(a = %a.id(), b = %b.id(), ?kind, "combined");

        drop(handle_b);
        self.remove(b);
        Ok(a.clone())
    }

    fn owns(&self, handle: &Rc<RefCell<SolidHandle>>) -> bool {
        self.solids.iter().any(|h| Rc::ptr_eq(h, handle))
    }

    /// Remove a solid by identity. Removing one that is not here is a no-op.
    pub fn remove(&mut self, solid: &SolidBuilder) {
        let Ok(target) = solid.handle() else {
            return;
        };
        let before = self.solids.len();
        self.solids.retain(|h| !Rc::ptr_eq(h, &target));
        if self.solids.len() < before {
            debug!(solid = %solid.id(), "removed");
        }
    }

    /// Write the scene to `out_dir/base_name.<ext>` for each requested format.
    ///
    /// Loads the kernel if none is attached. VRML failures abort the export;
    /// STEP failures are logged and listed in [`ExportReport::skipped`].
    pub async fn export(
        &mut self,
        out_dir: impl AsRef<Path>,
        base_name: &str,
        options: &ExportOptions,
    ) -> Result<ExportReport, ModelError> {
        self.init().await?;
        let kernel = self.kernel()?.clone();
        let out_dir = out_dir.as_ref();

        let formats = options.unique_formats();
        let mut report = ExportReport::new();
        if !formats.is_empty() {
            std::fs::create_dir_all(out_dir).map_err(|source| ExportError::Io {
                path: out_dir.to_path_buf(),
                source,
            })?;
        }

        let mut guard = kernel.lock();
        let mut scratch = Scratch::new(&mut *guard);
        let solids = self.export_solids(&mut scratch)?;

        for format in formats {
            let path = export::target_path(out_dir, base_name, format);
            match format {
                ExportFormat::Vrml => {
                    vrml::write_vrml(&mut *scratch, &solids, &path, options)?;
                    report.files.insert(format, path);
                }
                ExportFormat::Step => match step::write_step(&mut *scratch, &solids, &path) {
                    Ok(()) => {
                        report.files.insert(format, path);
                    }
                    Err(reason) => {
                        warn!(?format, %reason, "export format skipped");
                        report.skipped.push(SkippedExport { format, reason });
                    }
                },
            }
        }
        drop(scratch);
        drop(guard);

        info!(
            files = report.files.len(),
            skipped = report.skipped.len(),
            "export finished"
        );
        Ok(report)
    }

    /// The solids as the writers see them. With a non-zero model rotation
    /// these are rotated copies, tracked by `scratch` so they are released
    /// once the export is done; the registry's own shapes are never touched.
    fn export_solids(&self, scratch: &mut Scratch<'_>) -> Result<Vec<ExportSolid>, ModelError> {
        let mut solids = Vec::with_capacity(self.solids.len());
        for handle in &self.solids {
            let handle = handle.borrow();
            let mut shape = handle.shape();
            if !self.rotation.is_zero() {
                shape = solid_ops::rotate(&mut **scratch, shape, self.rotation)?;
                if shape != handle.shape() {
                    scratch.track(shape);
                }
            }
            solids.push(ExportSolid {
                shape,
                color: handle.color(),
                name: handle.name().map(str::to_string),
            });
        }
        Ok(solids)
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("rotation", &self.rotation)
            .field("initialized", &self.kernel.is_some())
            .field("solids", &self.solids.len())
            .finish()
    }
}
