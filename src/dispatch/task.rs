use std::fmt;
use std::future::Future;
use std::pin::Pin;

pub type BoxFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;
pub type BlockingFn<T> = Box<dyn FnOnce() -> T + Send + 'static>;

/// A unit of work together with its captured arguments.
pub enum Task<T> {
    Async(BoxFuture<T>),
    Blocking(BlockingFn<T>),
}

impl<T> Task<T> {
    pub fn future<F>(fut: F) -> Self
    where
        F: Future<Output = T> + Send + 'static,
    {
        Task::Async(Box::pin(fut))
    }

    pub fn blocking<F>(f: F) -> Self
    where
        F: FnOnce() -> T + Send + 'static,
    {
        Task::Blocking(Box::new(f))
    }

    pub fn is_async(&self) -> bool {
        matches!(self, Task::Async(_))
    }

    pub fn path(&self) -> &'static str {
        match self {
            Task::Async(_) => "async",
            Task::Blocking(_) => "blocking",
        }
    }
}

impl<T> fmt::Debug for Task<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Task").field(&self.path()).finish()
    }
}
