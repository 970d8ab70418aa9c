//! `AvEngine` for the memory engine. Calls share the session's state so
//! friend lookups and connection checks see the same world.

use std::sync::{Arc, Mutex, MutexGuard};

use tox4rs_protocol::events::av::CallStateChange;
use tox4rs_protocol::{CallControl, CallState, FriendNumber};

use crate::codes::{AnswerCode, BitRateSetCode, CallCode, CallControlCode, SendFrameCode};
use crate::engine::AvEngine;
use crate::error::{ErrorCode, Status};
use crate::lock;

use super::state::{CallRecord, MemoryState};
use super::MemoryProbe;

pub struct MemoryAv {
    state: Arc<Mutex<MemoryState>>,
    probe: MemoryProbe,
}

fn fail<T, C: ErrorCode>(code: C) -> Status<T> {
    Err(code.status())
}

impl MemoryAv {
    pub(crate) fn new(state: Arc<Mutex<MemoryState>>, probe: MemoryProbe) -> Self {
        Self { state, probe }
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        lock(&self.state)
    }
}

/// The live, answered call with `friend`, or the given codes.
fn active_call<'a>(
    state: &'a mut MemoryState,
    friend: FriendNumber,
    not_found: u32,
    not_in_call: u32,
) -> Status<&'a mut CallRecord> {
    if !state.friends.contains_key(&friend) {
        return Err(not_found);
    }
    match state.calls.get_mut(&friend) {
        Some(call) if call.answered => Ok(call),
        _ => Err(not_in_call),
    }
}

impl AvEngine for MemoryAv {
    fn kill(&mut self) {
        self.probe.record("av.kill");
        let mut s = self.state();
        s.calls.clear();
        s.av_attached = false;
    }

    fn iteration_interval(&self) -> u32 {
        self.probe.av_interval()
    }

    fn iterate(&mut self) -> Vec<u8> {
        self.probe.record("av.iterate");
        self.probe.take_av_batch()
    }

    fn call(&mut self, friend: FriendNumber, audio_bit_rate: u32, video_bit_rate: u32) -> Status<()> {
        self.probe.enter("av.call")?;
        let mut s = self.state();
        let Some(f) = s.friends.get(&friend) else {
            return fail(CallCode::FriendNotFound);
        };
        if !f.connection.is_connected() {
            return fail(CallCode::FriendNotConnected);
        }
        if s.calls.contains_key(&friend) {
            return fail(CallCode::FriendAlreadyInCall);
        }
        s.calls.insert(
            friend,
            CallRecord {
                incoming: false,
                answered: false,
                paused: false,
                audio_bit_rate,
                video_bit_rate,
                state: CallState::empty(),
            },
        );
        Ok(())
    }

    fn answer(&mut self, friend: FriendNumber, audio_bit_rate: u32, video_bit_rate: u32) -> Status<()> {
        self.probe.enter("av.answer")?;
        let mut s = self.state();
        if !s.friends.contains_key(&friend) {
            return fail(AnswerCode::FriendNotFound);
        }
        match s.calls.get_mut(&friend) {
            Some(call) if call.incoming && !call.answered => {
                call.answered = true;
                call.audio_bit_rate = audio_bit_rate;
                call.video_bit_rate = video_bit_rate;
                Ok(())
            }
            _ => fail(AnswerCode::FriendNotCalling),
        }
    }

    fn call_control(&mut self, friend: FriendNumber, control: CallControl) -> Status<()> {
        self.probe.enter("av.call_control")?;
        let mut s = self.state();
        if !s.friends.contains_key(&friend) {
            return fail(CallControlCode::FriendNotFound);
        }
        let Some(call) = s.calls.get_mut(&friend) else {
            return fail(CallControlCode::FriendNotInCall);
        };
        // Before an incoming call is answered it can only be rejected.
        if call.incoming && !call.answered && control != CallControl::Cancel {
            return fail(CallControlCode::InvalidTransition);
        }
        match control {
            CallControl::Cancel => {
                s.calls.remove(&friend);
                self.probe.push_av_event(CallStateChange {
                    friend_number: friend,
                    state: CallState::FINISHED,
                });
            }
            CallControl::Pause if call.paused => return fail(CallControlCode::InvalidTransition),
            CallControl::Resume if !call.paused => return fail(CallControlCode::InvalidTransition),
            CallControl::Pause => call.paused = true,
            CallControl::Resume => call.paused = false,
            CallControl::MuteAudio => call.state.remove(CallState::SENDING_AUDIO),
            CallControl::UnmuteAudio => call.state.insert(CallState::SENDING_AUDIO),
            CallControl::HideVideo => call.state.remove(CallState::ACCEPTING_VIDEO),
            CallControl::ShowVideo => call.state.insert(CallState::ACCEPTING_VIDEO),
        }
        Ok(())
    }

    fn set_audio_bit_rate(&mut self, friend: FriendNumber, bit_rate: u32) -> Status<()> {
        self.probe.enter("av.set_audio_bit_rate")?;
        let mut s = self.state();
        let call = active_call(
            &mut s,
            friend,
            BitRateSetCode::FriendNotFound.status(),
            BitRateSetCode::FriendNotInCall.status(),
        )?;
        call.audio_bit_rate = bit_rate;
        Ok(())
    }

    fn set_video_bit_rate(&mut self, friend: FriendNumber, bit_rate: u32) -> Status<()> {
        self.probe.enter("av.set_video_bit_rate")?;
        let mut s = self.state();
        let call = active_call(
            &mut s,
            friend,
            BitRateSetCode::FriendNotFound.status(),
            BitRateSetCode::FriendNotInCall.status(),
        )?;
        call.video_bit_rate = bit_rate;
        Ok(())
    }

    fn send_audio_frame(
        &mut self,
        friend: FriendNumber,
        _pcm: &[i16],
        _sample_count: usize,
        _channels: u8,
        _sampling_rate: u32,
    ) -> Status<()> {
        self.probe.enter("av.send_audio_frame")?;
        let mut s = self.state();
        let call = active_call(
            &mut s,
            friend,
            SendFrameCode::FriendNotFound.status(),
            SendFrameCode::FriendNotInCall.status(),
        )?;
        if call.audio_bit_rate == 0 {
            return fail(SendFrameCode::PayloadTypeDisabled);
        }
        Ok(())
    }

    fn send_video_frame(
        &mut self,
        friend: FriendNumber,
        _width: u16,
        _height: u16,
        _y: &[u8],
        _u: &[u8],
        _v: &[u8],
    ) -> Status<()> {
        self.probe.enter("av.send_video_frame")?;
        let mut s = self.state();
        let call = active_call(
            &mut s,
            friend,
            SendFrameCode::FriendNotFound.status(),
            SendFrameCode::FriendNotInCall.status(),
        )?;
        if call.video_bit_rate == 0 {
            return fail(SendFrameCode::PayloadTypeDisabled);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{CoreEngine, EngineProvider};
    use crate::memory::{MemoryEngine, MemoryProvider};
    use crate::options::{Savedata, SessionOptions};
    use tox4rs_protocol::Connection;

    fn setup() -> (MemoryEngine, MemoryAv, MemoryProbe, FriendNumber) {
        let provider = MemoryProvider::new();
        let probe = provider.probe();
        let mut engine = provider
            .construct(&SessionOptions::default(), &Savedata::None)
            .ok()
            .unwrap();
        let friend = engine.friend_add_norequest(&[3; 32]).unwrap();
        probe.set_friend_connection(friend, Connection::Udp);
        let av = engine.new_av().ok().unwrap();
        (engine, av, probe, friend)
    }

    #[test]
    fn test_outgoing_call_needs_pick_up() {
        let (_engine, mut av, probe, friend) = setup();
        assert_eq!(av.call(friend, 48, 0), Ok(()));
        assert_eq!(
            av.call(friend, 48, 0),
            Err(CallCode::FriendAlreadyInCall.status())
        );
        assert_eq!(
            av.send_audio_frame(friend, &[0; 960], 960, 1, 48_000),
            Err(SendFrameCode::FriendNotInCall.status())
        );
        assert!(probe.pick_up(friend));
        assert_eq!(av.send_audio_frame(friend, &[0; 960], 960, 1, 48_000), Ok(()));
        assert_eq!(
            av.send_video_frame(friend, 2, 2, &[0; 4], &[0], &[0]),
            Err(SendFrameCode::PayloadTypeDisabled.status())
        );
    }

    #[test]
    fn test_incoming_call_answer_and_hang_up() {
        let (_engine, mut av, probe, friend) = setup();
        assert_eq!(
            av.answer(friend, 48, 0),
            Err(AnswerCode::FriendNotCalling.status())
        );
        assert!(probe.ring(friend, true, false));
        assert_eq!(
            av.call_control(friend, CallControl::Pause),
            Err(CallControlCode::InvalidTransition.status())
        );
        assert_eq!(av.answer(friend, 48, 0), Ok(()));
        assert_eq!(
            av.call_control(friend, CallControl::Resume),
            Err(CallControlCode::InvalidTransition.status())
        );
        assert_eq!(av.call_control(friend, CallControl::Pause), Ok(()));
        assert_eq!(av.call_control(friend, CallControl::Cancel), Ok(()));
        assert_eq!(
            av.call_control(friend, CallControl::Cancel),
            Err(CallControlCode::FriendNotInCall.status())
        );
    }

    #[test]
    fn test_kill_detaches() {
        let (mut engine, mut av, probe, _friend) = setup();
        av.kill();
        assert_eq!(probe.calls_named("av.kill"), 1);
        assert!(engine.new_av().is_ok());
    }
}
