//! The AV subsystem attached to a session.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tox4rs_core::codes::{AnswerCode, AvNewCode, CallCode, SendFrameCode};
use tox4rs_core::protocol::events::av::{AudioReceiveFrame, Call, CallStateChange};
use tox4rs_core::protocol::{CallControl, CallState};
use tox4rs_core::{run_poll_loop, LoopExit, ToxAv};

use crate::harness::{Recorder, TestSession};

#[test]
fn test_incoming_call_flow() {
    let s = TestSession::open();
    let friend = s.online_friend(1);
    let av = ToxAv::new(&s.tox).unwrap();

    let log = Recorder::default();
    let l = log.clone();
    av.on::<Call, _>(move |e| {
        l.push(format!("call {} audio={} video={}", e.friend_number, e.audio_enabled, e.video_enabled))
    });
    let l = log.clone();
    av.on::<CallStateChange, _>(move |e| l.push(format!("state {}", e.state.bits())));

    let err = av.answer(friend, 48, 0).unwrap_err();
    assert_eq!(err.code(), Some(AnswerCode::FriendNotCalling));

    assert!(s.probe.ring(friend, true, false));
    av.poll().unwrap();
    av.answer(friend, 48, 0).unwrap();
    av.send_audio_frame(friend, &[0; 960], 960, 1, 48_000).unwrap();
    av.call_control(friend, CallControl::Cancel).unwrap();
    av.poll().unwrap();

    assert_eq!(
        log.entries(),
        vec![
            "call 1 audio=true video=false".to_string(),
            format!("state {}", CallState::FINISHED.bits()),
        ]
    );
}

#[test]
fn test_outgoing_call_flow() {
    let s = TestSession::open();
    let friend = s.online_friend(2);
    let av = ToxAv::new(&s.tox).unwrap();

    av.call(friend, 64, 0).unwrap();
    let err = av.call(friend, 64, 0).unwrap_err();
    assert_eq!(err.code(), Some(CallCode::FriendAlreadyInCall));

    let err = av.send_audio_frame(friend, &[0; 480], 480, 1, 48_000).unwrap_err();
    assert_eq!(err.code(), Some(SendFrameCode::FriendNotInCall));

    assert!(s.probe.pick_up(friend));
    av.send_audio_frame(friend, &[0; 480], 480, 1, 48_000).unwrap();
    let err = av
        .send_video_frame(friend, 2, 2, &[0; 4], &[0], &[0])
        .unwrap_err();
    assert_eq!(err.code(), Some(SendFrameCode::PayloadTypeDisabled));
}

#[test]
fn test_received_frames_carry_samples() {
    let s = TestSession::open();
    let av = ToxAv::new(&s.tox).unwrap();
    let log = Recorder::default();
    let l = log.clone();
    av.on::<AudioReceiveFrame, _>(move |e| {
        l.push(format!("{} samples x{} @{}", e.sample_count(), e.channels, e.sampling_rate))
    });
    s.probe.push_av_event(AudioReceiveFrame {
        friend_number: 0,
        pcm: vec![1; 1920],
        channels: 2,
        sampling_rate: 48_000,
    });
    av.poll().unwrap();
    assert_eq!(log.entries(), vec!["960 samples x2 @48000"]);
}

#[test]
fn test_av_cannot_outlive_session() {
    let s = TestSession::open();
    let av = ToxAv::new(&s.tox).unwrap();
    s.probe.clear_calls();
    s.tox.close();

    assert!(av.is_closed());
    assert_eq!(s.probe.calls(), vec!["av.kill", "kill"]);
    assert!(av.poll().is_err());
    assert!(av.iteration_interval().is_err());
    assert!(av.call(0, 0, 0).unwrap_err().is_closed());
    assert!(ToxAv::new(&s.tox).err().unwrap().is_closed());
}

#[test]
fn test_dropping_av_allows_reattach() {
    let s = TestSession::open();
    let av = ToxAv::new(&s.tox).unwrap();
    assert_eq!(
        ToxAv::new(&s.tox).err().unwrap().code(),
        Some(AvNewCode::Multiple)
    );
    drop(av);
    assert_eq!(s.probe.calls_named("av.kill"), 1);
    let again = ToxAv::new(&s.tox).unwrap();
    assert!(!again.is_closed());
}

#[test]
fn test_av_loop_on_own_thread() {
    let s = TestSession::open();
    s.probe.set_av_iteration_interval(1);
    let av = Arc::new(ToxAv::new(&s.tox).unwrap());
    let hits = Recorder::default();
    let h = hits.clone();
    av.on::<CallStateChange, _>(move |_| h.push("state"));

    let stop = Arc::new(AtomicBool::new(false));
    let worker = {
        let av = av.clone();
        let stop = stop.clone();
        thread::spawn(move || run_poll_loop(&*av, &stop))
    };

    s.probe.push_av_event(CallStateChange {
        friend_number: 0,
        state: CallState::FINISHED,
    });
    for _ in 0..200 {
        if hits.len() == 1 {
            break;
        }
        thread::sleep(Duration::from_millis(5));
    }
    stop.store(true, Ordering::Release);

    assert_eq!(worker.join().unwrap().unwrap(), LoopExit::Stopped);
    assert_eq!(hits.len(), 1);
}
