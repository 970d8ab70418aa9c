//! Batch delivery through the session's callback table.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use proptest::prelude::*;

use tox4rs_core::protocol::events::session::{
    FriendConnectionStatus, FriendName, FriendTyping, SelfConnectionStatus,
};
use tox4rs_core::protocol::{encode_batch, Connection, CoreEvent, EventCategory};

use crate::harness::{Recorder, TestSession};

fn name(friend_number: u32) -> CoreEvent {
    FriendName {
        friend_number,
        name: format!("f{friend_number}").into_bytes(),
    }
    .into()
}

fn typing(friend_number: u32) -> CoreEvent {
    FriendTyping {
        friend_number,
        is_typing: true,
    }
    .into()
}

fn online() -> CoreEvent {
    SelfConnectionStatus {
        connection_status: Connection::Tcp,
    }
    .into()
}

#[test]
fn test_only_registered_categories_invoked() {
    let s = TestSession::open();
    let log = Recorder::default();
    let l = log.clone();
    s.tox.on::<FriendName, _>(move |e| l.push(format!("name {}", e.friend_number)));
    let l = log.clone();
    s.tox.on::<SelfConnectionStatus, _>(move |e| l.push(format!("self {:?}", e.connection_status)));

    for event in [name(1), typing(1), online(), name(2), typing(2)] {
        s.probe.push_event(event);
    }
    let report = s.tox.poll().unwrap();

    assert_eq!(report.delivered, 3);
    assert_eq!(report.skipped, 2);
    assert_eq!(log.entries(), vec!["name 1", "self Tcp", "name 2"]);
}

#[test]
fn test_replaced_callback_never_runs_again() {
    let s = TestSession::open();
    let old = Arc::new(AtomicUsize::new(0));
    let new = Arc::new(AtomicUsize::new(0));

    let o = old.clone();
    s.tox.on::<FriendName, _>(move |_| {
        o.fetch_add(1, Ordering::SeqCst);
    });
    s.probe.push_event(name(1));
    s.tox.poll().unwrap();

    let n = new.clone();
    s.tox.on::<FriendName, _>(move |_| {
        n.fetch_add(1, Ordering::SeqCst);
    });
    s.probe.push_event(name(2));
    s.probe.push_event(name(3));
    s.tox.poll().unwrap();

    assert_eq!(old.load(Ordering::SeqCst), 1);
    assert_eq!(new.load(Ordering::SeqCst), 2);
}

#[test]
fn test_unregistered_category_goes_quiet() {
    let s = TestSession::open();
    let hits = Arc::new(AtomicUsize::new(0));
    let h = hits.clone();
    s.tox.on::<FriendName, _>(move |_| {
        h.fetch_add(1, Ordering::SeqCst);
    });
    s.tox.off::<FriendName>();
    s.probe.push_event(name(1));
    let report = s.tox.poll().unwrap();
    assert_eq!(report.skipped, 1);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[test]
fn test_panicking_callback_does_not_stop_batch() {
    let s = TestSession::open();
    let log = Recorder::default();
    s.tox.on::<FriendName, _>(|e| {
        if e.friend_number == 1 {
            panic!("bad handler");
        }
    });
    let l = log.clone();
    s.tox.on::<FriendTyping, _>(move |e| l.push(format!("typing {}", e.friend_number)));

    s.probe.push_event(name(1));
    s.probe.push_event(typing(1));
    let report = s.tox.poll().unwrap();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].category, EventCategory::FriendName);
    assert_eq!(report.failures[0].position, 0);
    assert_eq!(log.entries(), vec!["typing 1"]);
}

#[test]
fn test_engine_batch_bytes_dispatched_verbatim() {
    let s = TestSession::open();
    let seen = Recorder::default();
    let l = seen.clone();
    s.tox.on::<FriendConnectionStatus, _>(move |e| {
        l.push(format!("{} {:?}", e.friend_number, e.connection_status))
    });

    let records: Vec<CoreEvent> = vec![
        FriendConnectionStatus {
            friend_number: 8,
            connection_status: Connection::Udp,
        }
        .into(),
        FriendConnectionStatus {
            friend_number: 8,
            connection_status: Connection::None,
        }
        .into(),
    ];
    s.probe.push_raw_batch(encode_batch(&records).unwrap().to_vec());
    s.tox.poll().unwrap();
    assert_eq!(seen.entries(), vec!["8 Udp", "8 None"]);
}

fn arb_event() -> impl Strategy<Value = CoreEvent> {
    prop_oneof![
        (0u32..4).prop_map(name),
        (0u32..4).prop_map(typing),
        Just(online()),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_invocations_match_registered_records(
        events in proptest::collection::vec(arb_event(), 0..24),
        with_names in any::<bool>(),
        with_typing in any::<bool>(),
    ) {
        let s = TestSession::open();
        let log = Recorder::default();
        if with_names {
            let l = log.clone();
            s.tox.on::<FriendName, _>(move |e| l.push(format!("name {}", e.friend_number)));
        }
        if with_typing {
            let l = log.clone();
            s.tox.on::<FriendTyping, _>(move |e| l.push(format!("typing {}", e.friend_number)));
        }

        let expected: Vec<String> = events
            .iter()
            .filter_map(|event| match event {
                CoreEvent::FriendName(e) if with_names => Some(format!("name {}", e.friend_number)),
                CoreEvent::FriendTyping(e) if with_typing => Some(format!("typing {}", e.friend_number)),
                _ => None,
            })
            .collect();

        for event in events.iter().cloned() {
            s.probe.push_event(event);
        }
        let report = s.tox.poll().unwrap();

        prop_assert_eq!(report.total(), events.len());
        prop_assert_eq!(report.delivered, expected.len());
        prop_assert_eq!(log.entries(), expected);
    }
}
