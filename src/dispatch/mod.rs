//! Uniform execution of async and blocking work.
//!
//! A [`Task`] is tagged when it is built. Async tasks are awaited in place,
//! blocking tasks go to an explicitly owned [`WorkerPool`] so they never stall
//! the calling runtime.

pub mod dispatcher;
pub mod pool;
pub mod task;

pub use dispatcher::Dispatcher;
pub use pool::WorkerPool;
pub use task::Task;
