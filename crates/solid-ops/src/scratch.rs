//! Scoped release of transient kernel shapes.
//!
//! Kernel shapes are not reclaimed automatically. An operation that creates
//! intermediate shapes wraps its kernel in a [`Scratch`], tracks each
//! intermediate, and hands the final result out with [`Scratch::keep`].
//! Everything still tracked is released when the scratch is dropped, on the
//! success path and on every `?` early return alike.

use std::ops::{Deref, DerefMut};

use solid_kernel::{KernelBundle, ShapeId};

pub struct Scratch<'k> {
    kernel: &'k mut dyn KernelBundle,
    transient: Vec<ShapeId>,
}

impl<'k> Scratch<'k> {
    pub fn new(kernel: &'k mut dyn KernelBundle) -> Self {
        Self {
            kernel,
            transient: Vec::new(),
        }
    }

    /// Release `shape` when this scratch goes out of scope.
    pub fn track(&mut self, shape: ShapeId) -> ShapeId {
        if !self.transient.contains(&shape) {
            self.transient.push(shape);
        }
        shape
    }

    /// Release a tracked shape right away.
    pub fn release(&mut self, shape: ShapeId) {
        self.transient.retain(|s| *s != shape);
        self.kernel.release(shape);
    }

    /// Stop tracking `shape` and end the scope, releasing everything else.
    pub fn keep(mut self, shape: ShapeId) -> ShapeId {
        self.transient.retain(|s| *s != shape);
        shape
    }

    /// Shapes that would be released if the scope ended now.
    pub fn pending(&self) -> &[ShapeId] {
        &self.transient
    }
}

impl<'k> Deref for Scratch<'k> {
    type Target = dyn KernelBundle + 'k;

    fn deref(&self) -> &Self::Target {
        &*self.kernel
    }
}

impl<'k> DerefMut for Scratch<'k> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut *self.kernel
    }
}

impl Drop for Scratch<'_> {
    fn drop(&mut self) {
        for shape in self.transient.drain(..) {
            self.kernel.release(shape);
        }
    }
}
