//! Run a [`Runner`] on a dedicated thread.

use std::panic;
use std::thread::{self, JoinHandle};

use uuid::Uuid;

use super::{Runner, StopHandle};
use crate::processor::{BatchProcessor, ProcessorError};

/// A background thread driving one run loop.
///
/// ## Example
///
/// ```ignore
/// let processor = UnorderedProcessor::new(store.clone(), registry, config.clone());
/// let worker = RunnerThread::spawn(Runner::new(processor, config));
///
/// // ... do work ...
///
/// worker.stop()?;
/// ```
pub struct RunnerThread {
    runner_id: Uuid,
    stop: StopHandle,
    handle: Option<JoinHandle<Result<(), ProcessorError>>>,
}

impl RunnerThread {
    pub fn spawn<P>(runner: Runner<P>) -> Self
    where
        P: BatchProcessor + 'static,
    {
        let runner_id = runner.id();
        let stop = runner.stop_handle();
        let handle = thread::spawn(move || runner.start());

        Self {
            runner_id,
            stop,
            handle: Some(handle),
        }
    }

    pub fn runner_id(&self) -> Uuid {
        self.runner_id
    }

    /// Whether the loop has exited, either stopped or failed.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Signal the loop to stop without waiting.
    pub fn signal_stop(&self) {
        self.stop.stop();
    }

    /// Signal the loop to stop and wait for it. Returns the loop's result.
    pub fn stop(mut self) -> Result<(), ProcessorError> {
        if !self.stop.is_stopped() {
            self.stop.stop();
        }
        self.join_inner()
    }

    /// Wait for the loop to exit on its own, e.g. after a fatal error.
    pub fn join(mut self) -> Result<(), ProcessorError> {
        self.join_inner()
    }

    fn join_inner(&mut self) -> Result<(), ProcessorError> {
        match self.handle.take() {
            Some(handle) => match handle.join() {
                Ok(result) => result,
                Err(payload) => panic::resume_unwind(payload),
            },
            None => Ok(()),
        }
    }
}

impl Drop for RunnerThread {
    fn drop(&mut self) {
        if self.handle.is_some() && !self.stop.is_stopped() {
            self.stop.stop();
        }
        // Don't join on drop; the loop exits at its next boundary check.
    }
}
