use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::runtime::Handle;
use tokio::sync::Semaphore;

use crate::config::Config;
use crate::error::DispatchError;

/// Bounded executor for blocking work, backed by the blocking thread pool of
/// an injected runtime.
///
/// The pool is owned by whoever builds it and lives until [`WorkerPool::shutdown`].
/// Clones share the same bound and lifecycle.
#[derive(Clone)]
pub struct WorkerPool {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    handle: Handle,
    permits: Arc<Semaphore>,
    max_concurrency: u32,
    closed: AtomicBool,
}

impl WorkerPool {
    pub fn new(handle: Handle, max_concurrency: usize) -> Self {
        let max_concurrency = max_concurrency.clamp(1, u32::MAX as usize) as u32;
        Self {
            inner: Arc::new(PoolInner {
                handle,
                permits: Arc::new(Semaphore::new(max_concurrency as usize)),
                max_concurrency,
                closed: AtomicBool::new(false),
            }),
        }
    }

    pub fn from_config(handle: Handle, config: &Config) -> Self {
        Self::new(handle, config.dispatch_max_blocking)
    }

    pub fn max_concurrency(&self) -> usize {
        self.inner.max_concurrency as usize
    }

    pub fn in_flight(&self) -> usize {
        if self.inner.permits.is_closed() {
            return 0;
        }
        self.max_concurrency()
            .saturating_sub(self.inner.permits.available_permits())
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Runs `f` on a blocking worker and waits for it without blocking the
    /// calling task.
    ///
    /// A panic inside `f` is resumed on the caller.
    pub async fn submit<T, F>(&self, f: F) -> Result<T, DispatchError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        if self.is_closed() {
            return Err(DispatchError::PoolClosed);
        }

        let permit = self
            .inner
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| DispatchError::PoolClosed)?;

        let job = self.inner.handle.spawn_blocking(move || {
            let _permit = permit;
            f()
        });

        match job.await {
            Ok(value) => Ok(value),
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(_) => Err(DispatchError::Cancelled),
        }
    }

    /// Stops accepting work, waits for in-flight jobs to finish, then closes
    /// the pool. Submissions waiting for a slot fail with `PoolClosed`.
    pub async fn shutdown(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        let drained = self
            .inner
            .permits
            .acquire_many(self.inner.max_concurrency)
            .await;
        self.inner.permits.close();
        drop(drained);

        tracing::debug!(
            max_concurrency = self.inner.max_concurrency,
            "Worker pool shut down"
        );
    }
}
