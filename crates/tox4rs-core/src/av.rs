//! AV subsystem bound to one session.
//!
//! Mirrors the session: its own engine slot, poll lock, callback table and
//! poll interval. It holds only a weak reference to the session, and the
//! session holds only a weak reference to it; closing the session releases
//! the AV engine before the session engine.

use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use tox4rs_protocol::{
    decode_batch, AvEvent, AvEventCategory, CallControl, FriendNumber, TypedEvent, CURRENT_LIMITS,
};

use crate::callbacks::CallbackTable;
use crate::codes::{AnswerCode, AvNewCode, BitRateSetCode, CallCode, CallControlCode, SendFrameCode};
use crate::dispatch::{dispatch, DispatchReport};
use crate::engine::{AvEngine, CoreEngine};
use crate::error::{ensure, Closed, ContractViolation, ErrorCode, PollError, StatusExt, ToxError};
use crate::lock;
use crate::session::{Shared, Tox};

pub struct ToxAv<E: CoreEngine> {
    shared: Arc<AvShared<E>>,
}

pub(crate) struct AvShared<E: CoreEngine> {
    engine: Mutex<Option<E::Av>>,
    poll_lock: Mutex<()>,
    callbacks: CallbackTable<AvEvent>,
    session: Weak<Shared<E>>,
}

impl<E: CoreEngine> AvShared<E> {
    /// Kill the AV engine. Returns false if it was already gone.
    pub(crate) fn release(&self) -> bool {
        let taken = lock(&self.engine).take();
        match taken {
            Some(mut engine) => {
                engine.kill();
                tracing::info!("av closed");
                true
            }
            None => false,
        }
    }

    fn close(&self) -> bool {
        if !self.release() {
            return false;
        }
        // Detach from the session unless it has already moved on.
        if let Some(session) = self.session.upgrade() {
            let mut slot = lock(&session.av);
            if std::ptr::eq(slot.as_ptr(), self) {
                *slot = Weak::new();
            }
        }
        true
    }
}

impl<E: CoreEngine> ToxAv<E> {
    /// Attach the AV subsystem to a live session. At most one may be attached
    /// at a time.
    pub fn new(tox: &Tox<E>) -> Result<Self, ToxError<AvNewCode>> {
        let session = tox.shared();
        let mut guard = lock(session.engine());
        let engine = guard.as_mut().ok_or(ToxError::Closed)?;

        let mut slot = lock(&session.av);
        if slot.upgrade().is_some() {
            return Err(ToxError::local(AvNewCode::Multiple));
        }

        let av_engine = engine.new_av().mapped()?;
        let shared = Arc::new(AvShared {
            engine: Mutex::new(Some(av_engine)),
            poll_lock: Mutex::new(()),
            callbacks: CallbackTable::new(),
            session: Arc::downgrade(session),
        });
        *slot = Arc::downgrade(&shared);
        tracing::info!("av attached");

        Ok(Self { shared })
    }

    /// Close the AV subsystem. The session stays live and a new AV instance
    /// may be attached afterwards. Closing twice does nothing.
    pub fn close(&self) {
        if !self.shared.close() {
            tracing::debug!("close on closed av ignored");
        }
    }

    pub fn is_closed(&self) -> bool {
        lock(&self.shared.engine).is_none()
    }

    pub fn iteration_interval(&self) -> Result<Duration, Closed> {
        self.query(|engine| Duration::from_millis(u64::from(engine.iteration_interval())))
    }

    /// Run one AV iteration and deliver its events. As with [`Tox::poll`],
    /// an AV callback must not poll this AV instance.
    pub fn poll(&self) -> Result<DispatchReport<AvEventCategory>, PollError> {
        let _pass = lock(&self.shared.poll_lock);

        let raw = self.query(|engine| engine.iterate())?;
        let batch = decode_batch::<AvEvent>(&raw).map_err(|e| {
            tracing::error!(error = %e, bytes = raw.len(), "undecodable av event batch");
            ContractViolation::from(e)
        })?;

        Ok(dispatch(&self.shared.callbacks, batch))
    }

    pub fn callbacks(&self) -> &CallbackTable<AvEvent> {
        &self.shared.callbacks
    }

    pub fn on<P, F>(&self, f: F)
    where
        P: TypedEvent<AvEvent>,
        F: Fn(&P) + Send + Sync + 'static,
    {
        self.shared.callbacks.register::<P, F>(f);
    }

    pub fn off<P: TypedEvent<AvEvent>>(&self) {
        self.shared.callbacks.unregister::<P>();
    }

    // ------------------------------------------------------------------
    // Call control
    // ------------------------------------------------------------------

    /// Ring a friend. A bit rate of 0 disables that stream.
    pub fn call(
        &self,
        friend: FriendNumber,
        audio_bit_rate: u32,
        video_bit_rate: u32,
    ) -> Result<(), ToxError<CallCode>> {
        self.invoke(|engine| {
            ensure(
                CURRENT_LIMITS.is_valid_audio_bit_rate(audio_bit_rate),
                CallCode::InvalidBitRate,
            )?;
            engine.call(friend, audio_bit_rate, video_bit_rate).mapped()
        })
    }

    pub fn answer(
        &self,
        friend: FriendNumber,
        audio_bit_rate: u32,
        video_bit_rate: u32,
    ) -> Result<(), ToxError<AnswerCode>> {
        self.invoke(|engine| {
            ensure(
                CURRENT_LIMITS.is_valid_audio_bit_rate(audio_bit_rate),
                AnswerCode::InvalidBitRate,
            )?;
            engine.answer(friend, audio_bit_rate, video_bit_rate).mapped()
        })
    }

    pub fn call_control(
        &self,
        friend: FriendNumber,
        control: CallControl,
    ) -> Result<(), ToxError<CallControlCode>> {
        self.invoke(|engine| engine.call_control(friend, control).mapped())
    }

    pub fn set_audio_bit_rate(
        &self,
        friend: FriendNumber,
        bit_rate: u32,
    ) -> Result<(), ToxError<BitRateSetCode>> {
        self.invoke(|engine| {
            ensure(
                CURRENT_LIMITS.is_valid_audio_bit_rate(bit_rate),
                BitRateSetCode::InvalidBitRate,
            )?;
            engine.set_audio_bit_rate(friend, bit_rate).mapped()
        })
    }

    pub fn set_video_bit_rate(
        &self,
        friend: FriendNumber,
        bit_rate: u32,
    ) -> Result<(), ToxError<BitRateSetCode>> {
        self.invoke(|engine| engine.set_video_bit_rate(friend, bit_rate).mapped())
    }

    // ------------------------------------------------------------------
    // Frames
    // ------------------------------------------------------------------

    /// Send interleaved PCM. `pcm.len()` must equal `sample_count * channels`.
    pub fn send_audio_frame(
        &self,
        friend: FriendNumber,
        pcm: &[i16],
        sample_count: usize,
        channels: u8,
        sampling_rate: u32,
    ) -> Result<(), ToxError<SendFrameCode>> {
        self.invoke(|engine| {
            ensure(!pcm.is_empty(), SendFrameCode::Null)?;
            ensure(
                (1..=CURRENT_LIMITS.max_audio_channels).contains(&channels),
                SendFrameCode::Invalid,
            )?;
            ensure(
                CURRENT_LIMITS.is_valid_sampling_rate(sampling_rate),
                SendFrameCode::Invalid,
            )?;
            ensure(
                sample_count.checked_mul(channels as usize) == Some(pcm.len()),
                SendFrameCode::Invalid,
            )?;
            engine
                .send_audio_frame(friend, pcm, sample_count, channels, sampling_rate)
                .mapped()
        })
    }

    /// Send a YUV420 frame with tightly packed planes. Chroma planes are
    /// `(width / 2) * (height / 2)` bytes, rounded down.
    pub fn send_video_frame(
        &self,
        friend: FriendNumber,
        width: u16,
        height: u16,
        y: &[u8],
        u: &[u8],
        v: &[u8],
    ) -> Result<(), ToxError<SendFrameCode>> {
        self.invoke(|engine| {
            ensure(!y.is_empty() && !u.is_empty() && !v.is_empty(), SendFrameCode::Null)?;
            let (w, h) = (width as usize, height as usize);
            let chroma = (w / 2) * (h / 2);
            ensure(
                w > 0 && h > 0 && y.len() == w * h && u.len() == chroma && v.len() == chroma,
                SendFrameCode::Invalid,
            )?;
            engine.send_video_frame(friend, width, height, y, u, v).mapped()
        })
    }

    fn query<T>(&self, f: impl FnOnce(&mut E::Av) -> T) -> Result<T, Closed> {
        let mut guard = lock(&self.shared.engine);
        let engine = guard.as_mut().ok_or(Closed)?;
        Ok(f(engine))
    }

    fn invoke<C, T>(
        &self,
        op: impl FnOnce(&mut E::Av) -> Result<T, ToxError<C>>,
    ) -> Result<T, ToxError<C>>
    where
        C: ErrorCode,
    {
        let mut guard = lock(&self.shared.engine);
        let engine = guard.as_mut().ok_or(ToxError::Closed)?;
        op(engine)
    }
}

impl<E: CoreEngine> Drop for ToxAv<E> {
    fn drop(&mut self) {
        self.shared.close();
    }
}
