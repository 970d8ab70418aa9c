//! End-to-end walkthroughs of a session's public surface.

use std::time::Duration;

use tox4rs_core::codes::{FriendAddCode, GroupSendMessageCode, SetInfoCode};
use tox4rs_core::protocol::events::session::{FriendMessage, FriendName};
use tox4rs_core::protocol::{MessageType, MAX_NAME_LENGTH};

use crate::harness::{Recorder, TestSession};

#[test]
fn test_open_and_empty_poll() {
    let s = TestSession::open();
    assert!(s.tox.iteration_interval().unwrap() >= Duration::ZERO);

    let report = s.tox.poll().unwrap();
    assert_eq!(report.total(), 0);
    assert_eq!(report.invocations(), 0);
}

#[test]
fn test_overlong_name_is_local() {
    let s = TestSession::open();
    let name = vec![b'n'; MAX_NAME_LENGTH + 1];
    let err = s.assert_no_engine_call(|tox| tox.set_name(&name).unwrap_err());
    assert_eq!(err.code(), Some(SetInfoCode::TooLong));
    assert_eq!(err.to_string(), "set-info failed: too-long");
}

#[test]
fn test_malformed_address_is_local() {
    let s = TestSession::open();
    let err = s.assert_no_engine_call(|tox| tox.add_friend(&[0xab; 12], b"hi").unwrap_err());
    assert_eq!(err.code(), Some(FriendAddCode::MalformedAddress));
}

#[test]
fn test_name_after_close() {
    let s = TestSession::open();
    s.tox.close();
    assert!(s.tox.name().is_err());
}

#[test]
fn test_name_then_message_in_order() {
    let s = TestSession::open();
    let log = Recorder::default();

    let l = log.clone();
    s.tox.on::<FriendName, _>(move |e| {
        l.push(format!("name {} {}", e.friend_number, String::from_utf8_lossy(&e.name)))
    });
    let l = log.clone();
    s.tox.on::<FriendMessage, _>(move |e| {
        l.push(format!("message {} {}", e.friend_number, String::from_utf8_lossy(&e.message)))
    });

    s.probe.push_event(FriendName {
        friend_number: 3,
        name: b"Bob".to_vec(),
    });
    s.probe.push_event(FriendMessage {
        friend_number: 3,
        message_type: MessageType::Normal,
        message: b"hi".to_vec(),
        time_delta: 0,
    });

    let report = s.tox.poll().unwrap();
    assert_eq!(report.delivered, 2);
    assert_eq!(log.entries(), vec!["name 3 Bob", "message 3 hi"]);
}

#[test]
fn test_empty_group_message_after_join() {
    let s = TestSession::open();
    let group = s.tox.group_join(&[0x42; 32], b"me", b"").unwrap();
    let err = s.assert_no_engine_call(|tox| {
        tox.group_send_message(group, MessageType::Normal, b"").unwrap_err()
    });
    assert_eq!(err.code(), Some(GroupSendMessageCode::Empty));
}
