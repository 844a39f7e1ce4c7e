//! Fluent per-solid edits.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use cad_types::{Rgba, Vec3};
use solid_kernel::{BoundingBox, KernelBundle, ShapeId, SharedKernel};
use solid_ops::{EdgeSelection, OpError};

use crate::errors::ModelError;
use crate::handle::{SolidHandle, SolidId};

/// Chainable view of one solid in a [`crate::Model`].
///
/// The builder does not own the solid. Every edit replaces the shape held by
/// the model's handle, so the model sees the change immediately. Once a
/// boolean consumes the solid, every call returns
/// [`ModelError::SolidConsumed`].
///
/// ```ignore
/// let plate = model
///     .cuboid(Vec3::new(20.0, 15.0, 5.0), true)?
///     .translate(Vec3::z(2.5))?
///     .fillet(0.5)?
///     .color_hex("#1f4fa3")?
///     .name("plate")?;
/// ```
#[derive(Clone)]
pub struct SolidBuilder {
    id: SolidId,
    handle: Weak<RefCell<SolidHandle>>,
    kernel: SharedKernel,
}

impl SolidBuilder {
    pub(crate) fn new(handle: &Rc<RefCell<SolidHandle>>, kernel: SharedKernel) -> Self {
        Self {
            id: handle.borrow().id(),
            handle: Rc::downgrade(handle),
            kernel,
        }
    }

    pub(crate) fn handle(&self) -> Result<Rc<RefCell<SolidHandle>>, ModelError> {
        self.handle
            .upgrade()
            .ok_or(ModelError::SolidConsumed { id: self.id })
    }

    /// Run one geometry operation against the current shape and store the
    /// result in the handle.
    fn apply<F>(self, op: F) -> Result<Self, ModelError>
    where
        F: FnOnce(&mut dyn KernelBundle, ShapeId) -> Result<ShapeId, OpError>,
    {
        let handle = self.handle()?;
        let current = handle.borrow().shape();
        let next = {
            let mut kernel = self.kernel.lock();
            op(&mut *kernel, current)?
        };
        // kernel lock is released before the handle frees the old shape
        handle.borrow_mut().set_shape(next);
        Ok(self)
    }

    pub fn translate(self, offset: impl Into<Vec3>) -> Result<Self, ModelError> {
        let offset = offset.into();
        self.apply(|kb, shape| solid_ops::translate(kb, shape, offset))
    }

    /// Euler rotation in degrees about the world X, Y and Z axes, in that
    /// order.
    pub fn rotate(self, angles: impl Into<Vec3>) -> Result<Self, ModelError> {
        let angles = angles.into();
        self.apply(|kb, shape| solid_ops::rotate(kb, shape, angles))
    }

    pub fn scale(self, factors: impl Into<Vec3>) -> Result<Self, ModelError> {
        let factors = factors.into();
        self.apply(|kb, shape| solid_ops::scale(kb, shape, factors))
    }

    /// Round every edge.
    pub fn fillet(self, radius: f64) -> Result<Self, ModelError> {
        self.apply(|kb, shape| solid_ops::fillet(kb, shape, &EdgeSelection::All, radius))
    }

    /// Round the edges at the given traversal positions.
    pub fn fillet_edges(self, indices: &[usize], radius: f64) -> Result<Self, ModelError> {
        self.apply(|kb, shape| solid_ops::fillet_by_index(kb, shape, indices, radius))
    }

    pub fn color(self, color: Rgba) -> Result<Self, ModelError> {
        self.handle()?.borrow_mut().set_color(color);
        Ok(self)
    }

    /// Set the color from `#rrggbb` or `#rgb`.
    pub fn color_hex(self, hex: &str) -> Result<Self, ModelError> {
        let color = Rgba::from_hex(hex)?;
        self.color(color)
    }

    pub fn name(self, name: &str) -> Result<Self, ModelError> {
        self.handle()?.borrow_mut().set_name(name);
        Ok(self)
    }

    pub fn id(&self) -> SolidId {
        self.id
    }

    /// False once the solid has been consumed by a boolean.
    pub fn is_live(&self) -> bool {
        self.handle.strong_count() > 0
    }

    pub fn shape(&self) -> Result<ShapeId, ModelError> {
        Ok(self.handle()?.borrow().shape())
    }

    pub fn current_color(&self) -> Result<Option<Rgba>, ModelError> {
        Ok(self.handle()?.borrow().color())
    }

    pub fn label(&self) -> Result<Option<String>, ModelError> {
        Ok(self.handle()?.borrow().name().map(str::to_string))
    }

    pub fn bounding_box(&self) -> Result<BoundingBox, ModelError> {
        let shape = self.shape()?;
        let kernel = self.kernel.lock();
        Ok(kernel.as_introspect().bounding_box(shape)?)
    }

    pub(crate) fn same_solid(&self, other: &SolidBuilder) -> bool {
        Weak::ptr_eq(&self.handle, &other.handle)
    }
}

impl std::fmt::Debug for SolidBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SolidBuilder")
            .field("id", &self.id)
            .field("live", &self.is_live())
            .finish()
    }
}
