//! Test harness: sessions over the memory engine plus a recorder for
//! callback invocations.

use std::sync::{Arc, Mutex, Once};

use tox4rs_core::memory::{MemoryEngine, MemoryProbe, MemoryProvider};
use tox4rs_core::{Savedata, SessionOptions, Tox};

static TRACING: Once = Once::new();

/// Route `tracing` output through the test writer. Set RUST_LOG to see it.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// A live session and the probe of the engine behind it.
pub struct TestSession {
    pub tox: Tox<MemoryEngine>,
    pub probe: MemoryProbe,
}

#[allow(dead_code)]
impl TestSession {
    pub fn open() -> Self {
        Self::open_with(SessionOptions::default(), Savedata::None)
    }

    pub fn open_with(options: SessionOptions, savedata: Savedata) -> Self {
        init_tracing();
        let provider = MemoryProvider::new();
        let probe = provider.probe();
        let tox = Tox::open(&provider, &options, savedata).expect("memory session opens");
        Self { tox, probe }
    }

    /// Add a friend by key and bring them online.
    pub fn online_friend(&self, seed: u8) -> u32 {
        let friend = self
            .tox
            .add_friend_norequest(&[seed; 32])
            .expect("friend added");
        assert!(self
            .probe
            .set_friend_connection(friend, tox4rs_core::protocol::Connection::Udp));
        friend
    }

    /// Run `f` and assert it reached no engine operation.
    pub fn assert_no_engine_call<T>(&self, f: impl FnOnce(&Tox<MemoryEngine>) -> T) -> T {
        self.probe.clear_calls();
        let out = f(&self.tox);
        assert_eq!(self.probe.calls(), Vec::<&str>::new());
        out
    }
}

/// Shared log that callbacks append to.
#[derive(Clone, Default)]
pub struct Recorder {
    entries: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl Recorder {
    pub fn push(&self, entry: impl Into<String>) {
        self.entries.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}
