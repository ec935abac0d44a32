use std::time::Instant;

use opentelemetry::KeyValue;
use tracing::Instrument;

use super::pool::WorkerPool;
use super::task::Task;
use crate::error::DispatchError;
use crate::telemetry::metrics::{DISPATCH_CALLS, DISPATCH_DURATION};

#[derive(Clone)]
pub struct Dispatcher {
    pool: WorkerPool,
}

impl Dispatcher {
    pub fn new(pool: WorkerPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Awaits an async task in place, or runs a blocking task on the worker
    /// pool. The task's output comes back the same way on either path.
    pub async fn run<T>(&self, task: Task<T>) -> Result<T, DispatchError>
    where
        T: Send + 'static,
    {
        let path = task.path();
        let span = tracing::info_span!("dispatch.run", dispatch.path = path);
        let start = Instant::now();

        let result = async {
            match task {
                Task::Async(fut) => Ok(fut.await),
                Task::Blocking(f) => self.pool.submit(f).await,
            }
        }
        .instrument(span)
        .await;

        let path_kv = KeyValue::new("dispatch.path", path);
        DISPATCH_CALLS.add(1, &[path_kv.clone()]);
        DISPATCH_DURATION.record(start.elapsed().as_secs_f64(), &[path_kv]);

        result
    }

    /// Like [`Dispatcher::run`] for fallible tasks: the task's own error is
    /// returned untouched and pool failures are converted into `E`.
    pub async fn try_run<T, E>(&self, task: Task<Result<T, E>>) -> Result<T, E>
    where
        T: Send + 'static,
        E: From<DispatchError> + Send + 'static,
    {
        self.run(task).await?
    }
}
