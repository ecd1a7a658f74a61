//! # Task System Core Traits
//!
//! This module defines the building blocks of the task system, which runs
//! independent units of work on worker threads.
//!
//! ## Core Components
//! - `Task`: a unit of work executed on a worker thread
//! - `TaskResult`: the outcome of a task, handled back on the calling thread
//!
//! ## Task Lifecycle
//! 1. A `Task` is created and scheduled via `TaskManager::publish_task()`
//! 2. The task's `process()` method is called on a worker thread
//! 3. The task returns a boxed `TaskResult`
//! 4. The result's `handle_result()` is called on the thread driving the manager
//! 5. The result records itself in the report and can spawn follow-up tasks
//!
//! ## Thread Safety
//! - `Task` must be `Send` to be transferred to a worker
//! - `TaskResult` must be `Send` to be transferred back
//! - Shared state reached from a task must synchronize itself

use crate::render::tasks::SurveyReport;

/// A unit of work executed on a worker thread.
///
/// Tasks own everything they need. Shared services such as the
/// [`World`](crate::world::World) are held behind an `Arc`.
pub trait Task: Send {
    /// Performs the work and returns a result for the calling thread.
    ///
    /// Errors are part of the result; a task should not panic on bad input.
    fn process(&self) -> Box<dyn TaskResult + Send>;
}

/// The result of processing a [`Task`].
pub trait TaskResult: Send {
    /// Records the result in `report` and returns any follow-up tasks.
    ///
    /// Runs on the thread driving the `TaskManager`; keep it cheap.
    fn handle_result(self: Box<Self>, report: &mut SurveyReport) -> Vec<Box<dyn Task + Send>>;
}
