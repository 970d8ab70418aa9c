//! tox4rs core -- typed sessions over a pluggable messaging engine.
//!
//! ```text
//! open -> loop { iteration_interval, sleep, poll (iterate -> decode -> dispatch) } -> close
//! ```
//!
//! Operations check liveness, validate locally, call the engine and map its
//! status into the operation's own code set.

pub mod av;
pub mod callbacks;
pub mod codes;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod memory;
pub mod ops;
pub mod options;
pub mod poll_loop;
pub mod session;

pub use av::ToxAv;
pub use callbacks::{Callback, CallbackTable};
pub use dispatch::{dispatch, CallbackFailure, DispatchReport};
pub use engine::{AvEngine, CoreEngine, EngineProvider};
pub use error::{Closed, ContractViolation, ErrorCode, PollError, Status, ToxError};
pub use options::{ProxyOptions, Savedata, SessionOptions};
pub use poll_loop::{run_poll_loop, LoopExit, Pollable};
pub use session::Tox;

pub use tox4rs_protocol as protocol;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock, recovering the guard if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
