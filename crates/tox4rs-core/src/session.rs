//! Session instances.
//!
//! A `Tox` exclusively owns one engine. The engine lives in a
//! `Mutex<Option<E>>`: `Some` while live, `None` once closed. Every operation
//! takes the lock and checks liveness before touching the engine, so a
//! concurrent `close` leaves other callers with either a result or
//! `Closed`, never a released engine.
//!
//! Poll passes are serialised by a second lock. The engine lock is released
//! before dispatch so callbacks may call back into the instance.

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tox4rs_protocol::{decode_batch, CoreEvent, EventCategory, TypedEvent};

use crate::av::AvShared;
use crate::callbacks::CallbackTable;
use crate::codes::NewCode;
use crate::dispatch::{dispatch, DispatchReport};
use crate::engine::{CoreEngine, EngineProvider};
use crate::error::{Closed, ContractViolation, ErrorCode, PollError, StatusExt, ToxError};
use crate::lock;
use crate::options::{Savedata, SessionOptions};

pub struct Tox<E: CoreEngine> {
    shared: Arc<Shared<E>>,
}

pub(crate) struct Shared<E: CoreEngine> {
    engine: Mutex<Option<E>>,
    poll_lock: Mutex<()>,
    callbacks: CallbackTable<CoreEvent>,
    /// Attached AV instance, referenced without ownership.
    pub(crate) av: Mutex<Weak<AvShared<E>>>,
}

impl<E: CoreEngine> Shared<E> {
    pub(crate) fn engine(&self) -> &Mutex<Option<E>> {
        &self.engine
    }

    /// Live -> Closed. Returns false if already closed.
    fn close(&self) -> bool {
        let taken = lock(&self.engine).take();
        let Some(mut engine) = taken else {
            return false;
        };

        // The AV subsystem points into the engine; release it first.
        let attached = std::mem::take(&mut *lock(&self.av)).upgrade();
        if let Some(av) = attached {
            av.release();
        }

        engine.kill();
        true
    }
}

impl<E: CoreEngine> Tox<E> {
    /// Construct a session. Options are checked before the engine is asked.
    pub fn open<P>(
        provider: &P,
        options: &SessionOptions,
        savedata: Savedata,
    ) -> Result<Self, ToxError<NewCode>>
    where
        P: EngineProvider<Engine = E>,
    {
        options.validate().map_err(ToxError::local)?;

        let engine = provider.construct(options, &savedata).mapped()?;
        tracing::info!(
            restored = !savedata.is_none(),
            udp = options.udp_enabled,
            proxy = ?options.proxy.kind,
            "session opened"
        );

        Ok(Self {
            shared: Arc::new(Shared {
                engine: Mutex::new(Some(engine)),
                poll_lock: Mutex::new(()),
                callbacks: CallbackTable::new(),
                av: Mutex::new(Weak::new()),
            }),
        })
    }

    /// Close the session, releasing an attached AV instance first.
    ///
    /// Closing an already-closed session does nothing.
    pub fn close(&self) {
        if self.shared.close() {
            tracing::info!("session closed");
        } else {
            tracing::debug!("close on closed session ignored");
        }
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.shared.engine).is_none()
    }

    /// Opaque state for a later `open` with [`Savedata::ToxSave`].
    pub fn save(&self) -> Result<Vec<u8>, Closed> {
        self.query(|engine| engine.savedata())
    }

    /// How long to wait before the next `poll`. May change between polls.
    pub fn iteration_interval(&self) -> Result<Duration, Closed> {
        self.query(|engine| Duration::from_millis(u64::from(engine.iteration_interval())))
    }

    /// Run one engine iteration and deliver its events.
    ///
    /// A batch the decoder rejects is a fatal error: nothing from it is
    /// delivered and the poll loop should stop.
    ///
    /// Callbacks may call any other operation on this instance, but must not
    /// call `poll` on it: the poll lock is not reentrant and the pass would
    /// deadlock.
    pub fn poll(&self) -> Result<DispatchReport<EventCategory>, PollError> {
        let _pass = lock(&self.shared.poll_lock);

        let raw = self.query(|engine| engine.iterate())?;
        let batch = decode_batch::<CoreEvent>(&raw).map_err(|e| {
            tracing::error!(error = %e, bytes = raw.len(), "undecodable event batch");
            ContractViolation::from(e)
        })?;

        let report = dispatch(&self.shared.callbacks, batch);
        if report.total() > 0 {
            tracing::debug!(
                delivered = report.delivered,
                skipped = report.skipped,
                failed = report.failures.len(),
                "poll dispatched"
            );
        }
        Ok(report)
    }

    pub fn callbacks(&self) -> &CallbackTable<CoreEvent> {
        &self.shared.callbacks
    }

    /// Register `f` for the category of `P`, replacing any previous callback.
    pub fn on<P, F>(&self, f: F)
    where
        P: TypedEvent<CoreEvent>,
        F: Fn(&P) + Send + Sync + 'static,
    {
        self.shared.callbacks.register::<P, F>(f);
    }

    /// Empty the slot for the category of `P`.
    pub fn off<P: TypedEvent<CoreEvent>>(&self) {
        self.shared.callbacks.unregister::<P>();
    }

    pub(crate) fn shared(&self) -> &Arc<Shared<E>> {
        &self.shared
    }

    /// Run `f` against the live engine.
    pub(crate) fn query<T>(&self, f: impl FnOnce(&mut E) -> T) -> Result<T, Closed> {
        let mut guard = lock(&self.shared.engine);
        let engine = guard.as_mut().ok_or(Closed)?;
        Ok(f(engine))
    }

    /// Run a fallible operation against the live engine. The closed check
    /// comes first, so it supersedes any code `op` could produce.
    pub(crate) fn invoke<C, T>(
        &self,
        op: impl FnOnce(&mut E) -> Result<T, ToxError<C>>,
    ) -> Result<T, ToxError<C>>
    where
        C: ErrorCode,
    {
        let mut guard = lock(&self.shared.engine);
        let engine = guard.as_mut().ok_or(ToxError::Closed)?;
        op(engine)
    }
}

impl<E: CoreEngine> Drop for Tox<E> {
    fn drop(&mut self) {
        if self.shared.close() {
            tracing::debug!("session released on drop");
        }
    }
}
