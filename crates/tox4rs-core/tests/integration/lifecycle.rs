//! Open, save, restore and close.

use tox4rs_core::codes::{FriendDeleteCode, NewCode, SetInfoCode};
use tox4rs_core::memory::MemoryProvider;
use tox4rs_core::protocol::{
    FileControl, GroupPrivacyState, GroupRole, MessageType, UserStatus,
};
use tox4rs_core::{Closed, ContractViolation, Savedata, SessionOptions, Tox, ToxError};

use crate::harness::TestSession;

#[test]
fn test_save_restore_round_trip() {
    let s = TestSession::open();
    s.tox.set_name(b"Alice").unwrap();
    s.tox.set_status_message(b"around").unwrap();
    s.tox.set_status(UserStatus::Away).unwrap();
    s.tox.set_nospam(0x0102_0304).unwrap();
    let a = s.tox.add_friend_norequest(&[1; 32]).unwrap();
    let b = s.tox.add_friend_norequest(&[2; 32]).unwrap();
    let blob = s.tox.save().unwrap();

    let restored = TestSession::open_with(SessionOptions::default(), Savedata::ToxSave(blob));
    let tox = &restored.tox;
    assert_eq!(tox.name().unwrap(), b"Alice");
    assert_eq!(tox.status_message().unwrap(), b"around");
    assert_eq!(tox.status().unwrap(), UserStatus::Away);
    assert_eq!(tox.nospam().unwrap(), 0x0102_0304);
    assert_eq!(tox.friend_list().unwrap(), vec![a, b]);
    assert_eq!(tox.public_key().unwrap(), s.tox.public_key().unwrap());
    assert_eq!(tox.address().unwrap(), s.tox.address().unwrap());
}

#[test]
fn test_secret_key_restores_identity() {
    let first = TestSession::open_with(SessionOptions::default(), Savedata::SecretKey([7; 32]));
    let second = TestSession::open_with(SessionOptions::default(), Savedata::SecretKey([7; 32]));
    assert_eq!(
        first.tox.public_key().unwrap(),
        second.tox.public_key().unwrap()
    );
    assert_eq!(second.tox.secret_key().unwrap(), [7; 32]);
}

#[test]
fn test_foreign_savedata_rejected() {
    let provider = MemoryProvider::new();
    let options = SessionOptions::default();

    let err = Tox::open(&provider, &options, Savedata::ToxSave(b"toxEsave....".to_vec()))
        .err()
        .unwrap();
    assert_eq!(err.code(), Some(NewCode::LoadEncrypted));

    let err = Tox::open(&provider, &options, Savedata::ToxSave(vec![1, 2, 3]))
        .err()
        .unwrap();
    assert_eq!(err.code(), Some(NewCode::LoadBadFormat));
}

#[test]
fn test_every_operation_fails_closed() {
    let s = TestSession::open();
    let friend = s.online_friend(4);
    let group = s
        .tox
        .group_new(GroupPrivacyState::Public, b"g", b"me")
        .unwrap();
    s.tox.close();
    s.probe.clear_calls();

    let tox = &s.tox;
    assert_eq!(tox.save(), Err(Closed));
    assert_eq!(tox.address(), Err(Closed));
    assert_eq!(tox.friend_list(), Err(Closed));
    assert_eq!(tox.group_count(), Err(Closed));
    assert_eq!(tox.set_status(UserStatus::Busy), Err(Closed));
    assert!(tox.iteration_interval().is_err());
    assert!(tox.poll().is_err());

    // Arguments that would be rejected locally still see the closed state first.
    assert!(tox.set_name(&[0; 4096]).unwrap_err().is_closed());
    assert!(tox.add_friend(b"bad", b"").unwrap_err().is_closed());
    assert!(tox.bootstrap("", 0, &[]).unwrap_err().is_closed());
    assert!(tox
        .send_message(friend, MessageType::Normal, b"")
        .unwrap_err()
        .is_closed());
    assert!(tox
        .file_control(friend, 0, FileControl::Cancel)
        .unwrap_err()
        .is_closed());
    assert!(tox.send_lossy_packet(friend, &[]).unwrap_err().is_closed());
    assert!(tox.group_topic(group).unwrap_err().is_closed());
    assert!(tox
        .group_mod_set_role(group, 1, GroupRole::Founder)
        .unwrap_err()
        .is_closed());
    assert!(tox.udp_port().unwrap_err().is_closed());
    assert!(tox.delete_friend(friend).unwrap_err().is_closed());

    assert!(s.probe.calls().is_empty());
}

#[test]
fn test_unknown_status_is_fatal() {
    let s = TestSession::open();
    s.probe.force_status("set_name", 99);
    let err = s.tox.set_name(b"x").unwrap_err();
    assert!(err.is_fatal());
    assert!(matches!(
        err,
        ToxError::Fatal(ContractViolation::UnknownStatus { status: 99, .. })
    ));
    // The session itself is unaffected.
    s.tox.set_name(b"x").unwrap();
}

#[test]
fn test_documented_status_maps_to_code() {
    let s = TestSession::open();
    s.probe.force_status("set_name", 2);
    let err = s.tox.set_name(b"short").unwrap_err();
    assert_eq!(err.code(), Some(SetInfoCode::TooLong));

    let err = s.tox.delete_friend(40).unwrap_err();
    assert_eq!(err.code(), Some(FriendDeleteCode::FriendNotFound));
}

#[test]
fn test_options_file_drives_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.toml");
    std::fs::write(
        &path,
        "udp_enabled = false\ntcp_port = 33446\n\n[proxy]\ntype = \"none\"\n",
    )
    .unwrap();

    let options = SessionOptions::load_or_default(&path).unwrap();
    let s = TestSession::open_with(options, Savedata::None);
    assert!(s.tox.udp_port().is_err());
    assert_eq!(s.tox.tcp_port().unwrap(), 33446);
}

#[test]
fn test_many_sessions_are_independent() {
    let a = TestSession::open();
    let b = TestSession::open();
    a.tox.set_name(b"a").unwrap();
    b.tox.close();
    assert_eq!(a.tox.name().unwrap(), b"a");
    assert!(b.tox.is_closed());
    assert!(!a.tox.is_closed());
}
