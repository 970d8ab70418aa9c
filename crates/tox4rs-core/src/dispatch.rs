//! Callback dispatcher.
//!
//! Walks one decoded batch in order. Each record goes to the callback
//! registered for its category at that moment, or is dropped if there is
//! none. A panicking callback is contained to its own record.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tox4rs_protocol::{EventBatch, EventRecord};

use crate::callbacks::CallbackTable;

/// Outcome of one dispatch pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReport<C> {
    /// Records handed to a callback that returned normally.
    pub delivered: usize,
    /// Records whose category had no callback.
    pub skipped: usize,
    pub failures: Vec<CallbackFailure<C>>,
}

impl<C> DispatchReport<C> {
    pub fn new() -> Self {
        Self {
            delivered: 0,
            skipped: 0,
            failures: Vec::new(),
        }
    }

    /// Records seen in the pass.
    pub fn total(&self) -> usize {
        self.delivered + self.skipped + self.failures.len()
    }

    /// Callback invocations, including the ones that panicked.
    pub fn invocations(&self) -> usize {
        self.delivered + self.failures.len()
    }
}

impl<C> Default for DispatchReport<C> {
    fn default() -> Self {
        Self::new()
    }
}

/// A callback panicked while handling the record at `position`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackFailure<C> {
    pub position: usize,
    pub category: C,
    pub message: String,
}

pub fn dispatch<Ev: EventRecord>(
    table: &CallbackTable<Ev>,
    batch: EventBatch<Ev>,
) -> DispatchReport<Ev::Category> {
    let mut report = DispatchReport::new();

    for (position, record) in batch.into_iter().enumerate() {
        let category = record.category();
        let Some(callback) = table.get(category) else {
            tracing::trace!(?category, position, "no callback, record dropped");
            report.skipped += 1;
            continue;
        };

        match panic::catch_unwind(AssertUnwindSafe(|| callback(&record))) {
            Ok(()) => report.delivered += 1,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::warn!(?category, position, %message, "callback panicked, continuing");
                report.failures.push(CallbackFailure {
                    position,
                    category,
                    message,
                });
            }
        }
    }

    report
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
