//! One-time kernel bootstrap.
//!
//! The first caller runs the loader; callers that arrive while it is in
//! flight wait for that same load and see its outcome, success or failure.
//! Success is kept for the life of the [`Bootstrap`]. Failure is not, so a
//! later call starts a fresh load.

use std::future::Future;
use std::sync::OnceLock;

use parking_lot::Mutex;
use solid_kernel::{share, KernelError, SharedKernel};
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Capability libraries staged by the default loader, in link order.
#[cfg(not(feature = "opencascade"))]
pub const CAPABILITIES: &[&str] = &["modeling", "shapeops", "meshalgo", "stepio"];

/// Capability libraries staged by the default loader, in link order.
#[cfg(feature = "opencascade")]
pub const CAPABILITIES: &[&str] = &["TKPrim", "TKBO", "TKFillet", "TKMesh", "TKSTEP"];

type Outcome = Option<Result<SharedKernel, KernelError>>;

pub struct Bootstrap {
    ready: OnceLock<SharedKernel>,
    in_flight: Mutex<Option<watch::Receiver<Outcome>>>,
}

enum Role {
    Leader(watch::Sender<Outcome>),
    Waiter(watch::Receiver<Outcome>),
}

impl Bootstrap {
    pub const fn new() -> Self {
        Self {
            ready: OnceLock::new(),
            in_flight: parking_lot::const_mutex(None),
        }
    }

    /// The kernel, if a load has already succeeded.
    pub fn get(&self) -> Option<SharedKernel> {
        self.ready.get().cloned()
    }

    /// Return the cached kernel, join a load in progress, or run `loader`.
    pub async fn init_with<F, Fut>(&self, loader: F) -> Result<SharedKernel, KernelError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<SharedKernel, KernelError>>,
    {
        if let Some(kernel) = self.get() {
            return Ok(kernel);
        }

        let role = {
            let mut in_flight = self.in_flight.lock();
            if let Some(kernel) = self.get() {
                return Ok(kernel);
            }
            // A receiver whose sender is gone belongs to an abandoned load
            match in_flight.as_ref() {
                Some(rx) if rx.has_changed().is_ok() => Role::Waiter(rx.clone()),
                _ => {
                    let (tx, rx) = watch::channel(None);
                    *in_flight = Some(rx);
                    Role::Leader(tx)
                }
            }
        };

        match role {
            Role::Leader(tx) => {
                let outcome = loader().await;
                match &outcome {
                    Ok(kernel) => {
                        let _ = self.ready.set(kernel.clone());
                        info!("kernel ready");
                    }
                    Err(err) => warn!(error = %err, "kernel load failed"),
                }
                *self.in_flight.lock() = None;
                tx.send_replace(Some(outcome.clone()));
                outcome
            }
            Role::Waiter(mut rx) => {
                debug!("joining kernel load in progress");
                let settled = rx.wait_for(Option::is_some).await;
                match settled {
                    Ok(outcome) => outcome.clone().unwrap_or_else(|| Err(abandoned())),
                    Err(_) => Err(abandoned()),
                }
            }
        }
    }
}

impl Default for Bootstrap {
    fn default() -> Self {
        Self::new()
    }
}

fn abandoned() -> KernelError {
    KernelError::LoadFailed {
        reason: "kernel load was abandoned before completing".to_string(),
    }
}

static PROCESS: Bootstrap = Bootstrap::new();

/// Initialize the process-wide kernel with the default loader: OCCT when
/// built with the `opencascade` feature, truck otherwise.
pub async fn init() -> Result<SharedKernel, KernelError> {
    PROCESS.init_with(load_default).await
}

/// The process-wide kernel, if [`init`] has completed.
pub fn kernel() -> Option<SharedKernel> {
    PROCESS.get()
}

async fn load_default() -> Result<SharedKernel, KernelError> {
    for (stage, capability) in CAPABILITIES.iter().enumerate() {
        debug!(stage, capability, "linking kernel capability");
        tokio::task::yield_now().await;
    }
    Ok(default_kernel())
}

#[cfg(feature = "opencascade")]
fn default_kernel() -> SharedKernel {
    share(solid_kernel::OcctKernel::new())
}

#[cfg(not(feature = "opencascade"))]
fn default_kernel() -> SharedKernel {
    share(solid_kernel::TruckKernel::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use solid_kernel::MockKernel;
    use std::sync::atomic::{AtomicUsize, Ordering};

    async fn slow_load(calls: &AtomicUsize, fail: bool) -> Result<SharedKernel, KernelError> {
        calls.fetch_add(1, Ordering::SeqCst);
        for _ in 0..3 {
            tokio::task::yield_now().await;
        }
        if fail {
            Err(KernelError::LoadFailed {
                reason: "missing capability".to_string(),
            })
        } else {
            Ok(share(MockKernel::new()))
        }
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_load() {
        let boot = Bootstrap::new();
        let calls = AtomicUsize::new(0);
        let (a, b, c) = tokio::join!(
            boot.init_with(|| slow_load(&calls, false)),
            boot.init_with(|| slow_load(&calls, false)),
            boot.init_with(|| slow_load(&calls, false)),
        );
        let (a, b, c) = (a.unwrap(), b.unwrap(), c.unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(std::sync::Arc::ptr_eq(&a, &b));
        assert!(std::sync::Arc::ptr_eq(&a, &c));
    }

    #[tokio::test]
    async fn success_is_cached() {
        let boot = Bootstrap::new();
        let calls = AtomicUsize::new(0);
        let first = boot.init_with(|| slow_load(&calls, false)).await.unwrap();
        let second = boot.init_with(|| slow_load(&calls, false)).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(std::sync::Arc::ptr_eq(&first, &second));
        assert!(boot.get().is_some());
    }

    #[tokio::test]
    async fn failure_reaches_every_waiter_and_is_not_cached() {
        let boot = Bootstrap::new();
        let calls = AtomicUsize::new(0);
        let (a, b) = tokio::join!(
            boot.init_with(|| slow_load(&calls, true)),
            boot.init_with(|| slow_load(&calls, true)),
        );
        assert!(matches!(a, Err(KernelError::LoadFailed { .. })));
        assert!(matches!(b, Err(KernelError::LoadFailed { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(boot.get().is_none());

        boot.init_with(|| slow_load(&calls, false)).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn default_loader_is_cached_process_wide() {
        let kernel = init().await.unwrap();
        assert!(std::sync::Arc::ptr_eq(&kernel, &super::kernel().unwrap()));
    }

    #[cfg(feature = "opencascade")]
    #[tokio::test]
    async fn default_kernel_fillets_with_occt() {
        let kernel = load_default().await.unwrap();
        let mut kb = kernel.lock();
        let b = kb.make_box(10.0, 10.0, 10.0).unwrap();
        let edges = kb.explore_edges(b).unwrap();
        assert!(kb.fillet_edges(b, &edges, 1.0).is_ok());
    }
}
