//! Sessions shared across threads: close racing operations, registration
//! racing dispatch, and serialised poll passes.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tox4rs_core::protocol::events::session::FriendName;
use tox4rs_core::protocol::{encode_batch, CoreEvent};
use tox4rs_core::PollError;

use crate::harness::TestSession;

const WORKERS: usize = 4;

fn name_event(friend_number: u32) -> FriendName {
    FriendName {
        friend_number,
        name: b"racer".to_vec(),
    }
}

#[test]
fn test_close_racing_operations_yields_ok_or_closed() {
    let s = Arc::new(TestSession::open());
    for n in 0..64 {
        s.probe.push_event(name_event(n));
    }
    s.tox.on::<FriendName, _>(|_| thread::sleep(Duration::from_micros(50)));

    let workers: Vec<_> = (0..WORKERS)
        .map(|_| {
            let s = s.clone();
            thread::spawn(move || {
                let mut closed_seen = false;
                for _ in 0..200 {
                    match s.tox.set_name(b"racer") {
                        Ok(()) => assert!(!closed_seen, "operation succeeded after close"),
                        Err(e) => {
                            assert!(e.is_closed(), "unexpected failure: {e}");
                            closed_seen = true;
                        }
                    }
                    match s.tox.poll() {
                        Ok(_) => assert!(!closed_seen, "poll succeeded after close"),
                        Err(PollError::Closed) => closed_seen = true,
                        Err(e) => panic!("unexpected poll failure: {e}"),
                    }
                }
                closed_seen
            })
        })
        .collect();

    let closer = {
        let s = s.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(2));
            s.tox.close();
        })
    };

    closer.join().unwrap();
    for worker in workers {
        worker.join().unwrap();
    }

    assert!(s.tox.is_closed());
    assert_eq!(s.probe.calls_named("kill"), 1);
    assert!(s.tox.set_name(b"late").unwrap_err().is_closed());
}

#[test]
fn test_registration_racing_dispatch_hits_one_callback_per_record() {
    const RECORDS: usize = 2_000;

    let s = TestSession::open();
    for n in 0..RECORDS as u32 {
        s.probe.push_event(name_event(n));
    }

    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));
    let f = first.clone();
    s.tox.on::<FriendName, _>(move |_| {
        f.fetch_add(1, Ordering::SeqCst);
    });

    let stop = Arc::new(AtomicBool::new(false));
    let report = thread::scope(|scope| {
        scope.spawn(|| {
            let mut use_second = true;
            while !stop.load(Ordering::Acquire) {
                if use_second {
                    let c = second.clone();
                    s.tox.on::<FriendName, _>(move |_| {
                        c.fetch_add(1, Ordering::SeqCst);
                    });
                } else {
                    let c = first.clone();
                    s.tox.on::<FriendName, _>(move |_| {
                        c.fetch_add(1, Ordering::SeqCst);
                    });
                }
                use_second = !use_second;
            }
        });

        let report = s.tox.poll().unwrap();
        stop.store(true, Ordering::Release);
        report
    });

    assert_eq!(report.skipped, 0);
    assert!(report.failures.is_empty());
    assert_eq!(report.delivered, RECORDS);
    assert_eq!(
        first.load(Ordering::SeqCst) + second.load(Ordering::SeqCst),
        RECORDS
    );
}

#[test]
fn test_poll_passes_never_overlap() {
    const BATCHES: usize = 20;
    const PER_BATCH: u32 = 5;

    let s = Arc::new(TestSession::open());
    for b in 0..BATCHES as u32 {
        let records: Vec<CoreEvent> = (0..PER_BATCH)
            .map(|n| name_event(b * PER_BATCH + n).into())
            .collect();
        s.probe.push_raw_batch(encode_batch(&records).unwrap().to_vec());
    }

    let active = Arc::new(AtomicUsize::new(0));
    let overlapped = Arc::new(AtomicBool::new(false));
    let seen = Arc::new(AtomicUsize::new(0));
    {
        let (active, overlapped, seen) = (active.clone(), overlapped.clone(), seen.clone());
        s.tox.on::<FriendName, _>(move |_| {
            if active.fetch_add(1, Ordering::SeqCst) != 0 {
                overlapped.store(true, Ordering::SeqCst);
            }
            thread::sleep(Duration::from_micros(200));
            active.fetch_sub(1, Ordering::SeqCst);
            seen.fetch_add(1, Ordering::SeqCst);
        });
    }

    let pollers: Vec<_> = (0..WORKERS)
        .map(|_| {
            let s = s.clone();
            thread::spawn(move || {
                for _ in 0..BATCHES / WORKERS {
                    s.tox.poll().unwrap();
                }
            })
        })
        .collect();
    for poller in pollers {
        poller.join().unwrap();
    }

    assert!(!overlapped.load(Ordering::SeqCst));
    assert_eq!(seen.load(Ordering::SeqCst), BATCHES * PER_BATCH as usize);
}
