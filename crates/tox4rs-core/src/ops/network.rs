//! Joining the network.

use tox4rs_protocol::{PublicKey, MAX_HOSTNAME_LENGTH};

use super::{fixed, within};
use crate::codes::{BootstrapCode, GetPortCode};
use crate::engine::CoreEngine;
use crate::error::{ensure, Closed, StatusExt, ToxError};
use crate::session::Tox;

/// Host, port and key checks shared by bootstrap and relay.
fn check_node(host: &str, port: u16, public_key: &[u8]) -> Result<PublicKey, ToxError<BootstrapCode>> {
    ensure(!host.is_empty(), BootstrapCode::BadHost)?;
    within(host.len(), MAX_HOSTNAME_LENGTH, BootstrapCode::BadHost)?;
    ensure(port != 0, BootstrapCode::BadPort)?;
    fixed(public_key, BootstrapCode::BadPublicKey)
}

impl<E: CoreEngine> Tox<E> {
    /// Contact a DHT node. Success only means the request was queued.
    pub fn bootstrap(
        &self,
        host: &str,
        port: u16,
        public_key: &[u8],
    ) -> Result<(), ToxError<BootstrapCode>> {
        self.invoke(|engine| {
            let key = check_node(host, port, public_key)?;
            engine.bootstrap(host, port, &key).mapped()
        })
    }

    pub fn add_tcp_relay(
        &self,
        host: &str,
        port: u16,
        public_key: &[u8],
    ) -> Result<(), ToxError<BootstrapCode>> {
        self.invoke(|engine| {
            let key = check_node(host, port, public_key)?;
            engine.add_tcp_relay(host, port, &key).mapped()
        })
    }

    pub fn udp_port(&self) -> Result<u16, ToxError<GetPortCode>> {
        self.invoke(|engine| engine.udp_port().mapped())
    }

    pub fn tcp_port(&self) -> Result<u16, ToxError<GetPortCode>> {
        self.invoke(|engine| engine.tcp_port().mapped())
    }

    /// Our temporary DHT key. Differs from the long-term public key.
    pub fn dht_id(&self) -> Result<PublicKey, Closed> {
        self.query(|engine| engine.dht_id())
    }
}
