//! # Task Management System
//!
//! This module runs independent units of work on a pool of worker threads. The
//! survey uses it to assemble and inspect many block neighborhoods in parallel
//! while the world accessor and its cache are shared between workers.
//!
//! ## Architecture Overview
//!
//! - `TaskManager`: central coordinator for task distribution and worker management
//! - `Task`: a unit of work executed on a worker thread
//! - `TaskResult`: the result of a completed task, which can spawn additional tasks
//! - `TaskChannel`: communication channel between the driving thread and one worker
//!
//! ## Task Lifecycle
//! 1. Tasks are published via `TaskManager::publish_task()`
//! 2. The manager hands them to free worker channels round-robin, queueing the rest
//! 3. Workers process tasks and send results back
//! 4. Results are handled on the driving thread in `process_completed_tasks()`
//! 5. Results can spawn new tasks
//! 6. `run_until_idle()` repeats the cycle until nothing is queued or in flight
//!
//! ## Worker Failures
//!
//! A worker that panics drops its end of the channels. The manager notices the
//! disconnect, counts the task it was running as lost and stops scheduling on that
//! channel. The remaining workers carry on.
//!
//! ## Example Usage
//! ```
//! use panorama::render::tasks::SurveyReport;
//! use panorama::task_management::TaskManager;
//!
//! let mut task_manager = TaskManager::new(2).unwrap();
//! let mut report = SurveyReport::new();
//! task_manager.run_until_idle(&mut report);
//! assert!(task_manager.is_idle());
//! ```

pub mod task;

use std::collections::VecDeque;
use std::io;
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, error, info};

use crate::render::tasks::SurveyReport;

pub use task::{Task, TaskResult};

/// Maximum number of tasks that can be in flight per worker channel.
///
/// Set to 1 so a slow task never holds work back behind it on the same worker.
pub const MAX_TASKS_IN_FLIGHT: usize = 1;

/// How long `run_until_idle` sleeps when no result has arrived.
const IDLE_WAIT: Duration = Duration::from_millis(1);

/// A communication channel between the driving thread and a worker thread.
///
/// # Fields
/// - `task_sender`: sends tasks to the worker
/// - `result_receiver`: receives task results from the worker
/// - `num_tasks_in_flight`: tasks sent but not yet answered
/// - `disconnected`: the worker has gone away
/// - `worker`: handle to the worker thread, joined when the manager drops
#[derive(Debug)]
pub struct TaskChannel {
    task_sender: Sender<Box<dyn Task + Send>>,
    result_receiver: Receiver<Box<dyn TaskResult + Send>>,
    num_tasks_in_flight: usize,
    disconnected: bool,
    worker: JoinHandle<()>,
}

impl TaskChannel {
    fn accepts_task(&self) -> bool {
        !self.disconnected && self.num_tasks_in_flight < MAX_TASKS_IN_FLIGHT
    }
}

/// Manages a pool of worker threads and coordinates task execution.
///
/// A manager with zero workers runs every task inline on the driving thread
/// inside `run_until_idle`.
///
/// # Fields
/// - `channels`: one channel per worker
/// - `queued_tasks`: tasks waiting for a free worker
/// - `current_channel`: index for round-robin scheduling
pub struct TaskManager {
    channels: Vec<TaskChannel>,
    queued_tasks: VecDeque<Box<dyn Task + Send>>,
    current_channel: usize,
}

impl TaskManager {
    /// Creates a new `TaskManager` with `num_workers` worker threads.
    ///
    /// # Errors
    /// Returns the OS error if a worker thread cannot be spawned.
    pub fn new(num_workers: usize) -> io::Result<Self> {
        let mut channels = Vec::with_capacity(num_workers);

        info!(
            "Starting {} survey workers (available parallelism: {:?})",
            num_workers,
            thread::available_parallelism()
        );

        for index in 0..num_workers {
            let (task_tx, task_rx) = channel::<Box<dyn Task + Send>>();
            let (result_tx, result_rx) = channel::<Box<dyn TaskResult + Send>>();

            let task_closure = move || {
                while let Ok(task) = task_rx.recv() {
                    let result = task.process();
                    if result_tx.send(result).is_err() {
                        break;
                    }
                }
            };

            let worker = thread::Builder::new()
                .name(format!("survey-worker-{}", index))
                .spawn(task_closure)?;

            channels.push(TaskChannel {
                task_sender: task_tx,
                result_receiver: result_rx,
                num_tasks_in_flight: 0,
                disconnected: false,
                worker,
            });
        }

        Ok(TaskManager {
            channels,
            queued_tasks: VecDeque::new(),
            current_channel: 0,
        })
    }

    /// The number of worker threads.
    pub fn worker_count(&self) -> usize {
        self.channels.len()
    }

    /// Tasks waiting for a free worker.
    pub fn queued_count(&self) -> usize {
        self.queued_tasks.len()
    }

    /// Tasks sent to workers and not yet answered.
    pub fn in_flight_count(&self) -> usize {
        self.channels
            .iter()
            .map(|channel| channel.num_tasks_in_flight)
            .sum()
    }

    /// Returns true when nothing is queued or in flight.
    pub fn is_idle(&self) -> bool {
        self.queued_tasks.is_empty() && self.in_flight_count() == 0
    }

    /// Attempts to send a task to a specific worker channel.
    ///
    /// # Returns
    /// - `Ok(())` if the worker accepted the task
    /// - `Err(task)` if the worker is gone, handing the task back for requeueing
    fn try_send_task(
        &mut self,
        task: Box<dyn Task + Send>,
        channel_idx: usize,
    ) -> Result<(), Box<dyn Task + Send>> {
        let channel = &mut self.channels[channel_idx];
        match channel.task_sender.send(task) {
            Ok(_) => {
                channel.num_tasks_in_flight += 1;
                Ok(())
            }
            Err(err) => {
                channel.disconnected = true;
                Err(err.0)
            }
        }
    }

    /// Finds a worker channel that can accept a task, round-robin from
    /// `current_channel`.
    fn find_available_channel(&self) -> Option<usize> {
        let len = self.channels.len();
        (0..len)
            .map(|step| (self.current_channel + step) % len)
            .find(|&idx| self.channels[idx].accepts_task())
    }

    /// Publishes a new task for execution.
    ///
    /// # Returns
    /// - `true` if the task was handed to a worker immediately
    /// - `false` if it was queued because every worker is busy
    pub fn publish_task(&mut self, task: Box<dyn Task + Send>) -> bool {
        match self.find_available_channel() {
            Some(channel_idx) => match self.try_send_task(task, channel_idx) {
                Ok(_) => {
                    self.current_channel = (channel_idx + 1) % self.channels.len();
                    true
                }
                Err(task) => {
                    self.queued_tasks.push_back(task);
                    false
                }
            },
            None => {
                self.queued_tasks.push_back(task);
                false
            }
        }
    }

    /// Hands queued tasks to free workers, oldest first, until the queue is empty or
    /// every worker is busy.
    pub fn process_queued_tasks(&mut self) {
        while let Some(channel_idx) = self.find_available_channel() {
            let Some(task) = self.queued_tasks.pop_front() else {
                break;
            };
            match self.try_send_task(task, channel_idx) {
                Ok(_) => self.current_channel = (channel_idx + 1) % self.channels.len(),
                Err(task) => self.queued_tasks.push_front(task),
            }
        }
    }

    /// Handles every result the workers have finished, on the calling thread.
    ///
    /// Follow-up tasks returned by the results are published.
    ///
    /// # Returns
    /// The number of results handled.
    pub fn process_completed_tasks(&mut self, report: &mut SurveyReport) -> usize {
        let mut tasks_to_queue = Vec::new();
        let mut handled = 0;

        for (idx, channel) in self.channels.iter_mut().enumerate() {
            loop {
                match channel.result_receiver.try_recv() {
                    Ok(result) => {
                        channel.num_tasks_in_flight -= 1;
                        handled += 1;
                        tasks_to_queue.extend(result.handle_result(report));
                    }
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        if channel.num_tasks_in_flight > 0 {
                            error!(
                                "Worker {} stopped with {} task(s) in flight",
                                idx, channel.num_tasks_in_flight
                            );
                            report.lost_tasks += channel.num_tasks_in_flight;
                            channel.num_tasks_in_flight = 0;
                        }
                        channel.disconnected = true;
                        break;
                    }
                }
            }
        }

        for task in tasks_to_queue {
            self.publish_task(task);
        }

        handled
    }

    /// Drives the manager until every queued task and every follow-up has been
    /// handled.
    ///
    /// If no worker is left to run them, queued tasks are processed inline.
    pub fn run_until_idle(&mut self, report: &mut SurveyReport) {
        loop {
            let handled = self.process_completed_tasks(report);
            self.process_queued_tasks();

            if self.in_flight_count() == 0 {
                if self.queued_tasks.is_empty() {
                    break;
                }
                if self.find_available_channel().is_none() {
                    self.run_queued_inline(report);
                }
            } else if handled == 0 {
                thread::sleep(IDLE_WAIT);
            }
        }
    }

    fn run_queued_inline(&mut self, report: &mut SurveyReport) {
        debug!(
            "No live workers, running {} queued task(s) inline",
            self.queued_tasks.len()
        );
        while let Some(task) = self.queued_tasks.pop_front() {
            let follow_ups = task.process().handle_result(report);
            self.queued_tasks.extend(follow_ups);
        }
    }
}

impl Drop for TaskManager {
    fn drop(&mut self) {
        for channel in self.channels.drain(..) {
            let TaskChannel {
                task_sender,
                worker,
                ..
            } = channel;
            // closing the sender ends the worker loop
            drop(task_sender);
            if worker.join().is_err() {
                error!("Survey worker panicked");
            }
        }
    }
}
