//! The canonical driver: one dedicated thread per instance.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tox4rs_protocol::{AvEventCategory, EventCategory};

use crate::av::ToxAv;
use crate::dispatch::DispatchReport;
use crate::engine::CoreEngine;
use crate::error::{Closed, ContractViolation, PollError};
use crate::session::Tox;

/// Something with an engine-supplied poll interval and a poll pass.
pub trait Pollable {
    type Category;

    fn iteration_interval(&self) -> Result<Duration, Closed>;

    fn poll(&self) -> Result<DispatchReport<Self::Category>, PollError>;
}

impl<E: CoreEngine> Pollable for Tox<E> {
    type Category = EventCategory;

    fn iteration_interval(&self) -> Result<Duration, Closed> {
        Tox::iteration_interval(self)
    }

    fn poll(&self) -> Result<DispatchReport<EventCategory>, PollError> {
        Tox::poll(self)
    }
}

impl<E: CoreEngine> Pollable for ToxAv<E> {
    type Category = AvEventCategory;

    fn iteration_interval(&self) -> Result<Duration, Closed> {
        ToxAv::iteration_interval(self)
    }

    fn poll(&self) -> Result<DispatchReport<AvEventCategory>, PollError> {
        ToxAv::poll(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// `stop` was raised.
    Stopped,
    /// The instance was closed under the loop.
    Closed,
}

/// Interval, sleep, poll; until `stop` is raised or the instance closes.
///
/// A fatal poll error ends the loop and is returned: the engine and decoder
/// disagree and continuing would drop or misread events.
pub fn run_poll_loop<P: Pollable>(
    instance: &P,
    stop: &AtomicBool,
) -> Result<LoopExit, ContractViolation> {
    let mut passes: u64 = 0;
    while !stop.load(Ordering::Acquire) {
        let interval = match instance.iteration_interval() {
            Ok(interval) => interval,
            Err(Closed) => return Ok(LoopExit::Closed),
        };
        std::thread::sleep(interval);

        match instance.poll() {
            Ok(_) => passes += 1,
            Err(PollError::Closed) => {
                tracing::debug!(passes, "poll loop ended: instance closed");
                return Ok(LoopExit::Closed);
            }
            Err(PollError::Fatal(violation)) => {
                tracing::error!(passes, error = %violation, "poll loop aborted");
                return Err(violation);
            }
        }
    }
    tracing::debug!(passes, "poll loop stopped");
    Ok(LoopExit::Stopped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryProvider;
    use crate::options::{Savedata, SessionOptions};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_loop_stops_on_flag() {
        let provider = MemoryProvider::new();
        let probe = provider.probe();
        probe.set_iteration_interval(1);
        let tox = Tox::open(&provider, &SessionOptions::default(), Savedata::None).unwrap();
        let stop = AtomicBool::new(true);
        assert_eq!(run_poll_loop(&tox, &stop).unwrap(), LoopExit::Stopped);
    }

    #[test]
    fn test_loop_ends_when_closed() {
        let provider = MemoryProvider::new();
        provider.probe().set_iteration_interval(1);
        let tox = Arc::new(Tox::open(&provider, &SessionOptions::default(), Savedata::None).unwrap());
        let stop = Arc::new(AtomicBool::new(false));

        let worker = {
            let tox = tox.clone();
            let stop = stop.clone();
            thread::spawn(move || run_poll_loop(&*tox, &stop))
        };
        thread::sleep(Duration::from_millis(10));
        tox.close();

        let exit = worker.join().unwrap().unwrap();
        assert_eq!(exit, LoopExit::Closed);
    }

    #[test]
    fn test_loop_aborts_on_bad_batch() {
        let provider = MemoryProvider::new();
        let probe = provider.probe();
        probe.set_iteration_interval(1);
        probe.push_raw_batch(vec![1, 2, 3]);
        let tox = Tox::open(&provider, &SessionOptions::default(), Savedata::None).unwrap();
        let stop = AtomicBool::new(false);
        let err = run_poll_loop(&tox, &stop).unwrap_err();
        assert!(matches!(err, ContractViolation::Decode(_)));
    }
}
