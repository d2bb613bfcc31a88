//! Sub-components released on shutdown.
//!
//! A [`Controller`] is anything the service has to release when it stops
//! (worker pools, open stores, background jobs). Controllers are registered
//! before serving starts and closed as a batch, first registered first closed.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

/// A sub-component that can be asked to release its resources.
pub trait Controller: Send + Sync {
    /// Releases held resources. Called at most once by the registry.
    fn close(&self);
}

impl<C: Controller + ?Sized> Controller for Arc<C> {
    fn close(&self) {
        (**self).close();
    }
}

impl<C: Controller + ?Sized> Controller for Box<C> {
    fn close(&self) {
        (**self).close();
    }
}

/// Ordered collection of controllers closed together on shutdown.
#[derive(Default)]
pub struct ControllerRegistry {
    controllers: Vec<Box<dyn Controller>>,
}

impl ControllerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a controller. Close order is registration order.
    pub fn register(&mut self, controller: impl Controller + 'static) {
        self.controllers.push(Box::new(controller));
    }

    /// Number of controllers still awaiting close.
    #[must_use]
    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    /// Whether no controllers are awaiting close.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    /// Closes every registered controller in registration order.
    ///
    /// Best effort: a controller that panics is logged and the remaining ones
    /// are still closed. The registry is drained, so a second call is a no-op.
    pub fn close_all(&mut self) {
        let controllers = std::mem::take(&mut self.controllers);
        let total = controllers.len();
        for (index, controller) in controllers.into_iter().enumerate() {
            if catch_unwind(AssertUnwindSafe(|| controller.close())).is_err() {
                tracing::error!(index, total, "controller panicked while closing");
            }
        }
        tracing::debug!(total, "controllers closed");
    }
}

impl fmt::Debug for ControllerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerRegistry")
            .field("controllers", &self.controllers.len())
            .finish()
    }
}
