//! Our own identity and presence.

use tox4rs_protocol::{
    Address, Connection, PublicKey, SecretKey, UserStatus, MAX_NAME_LENGTH,
    MAX_STATUS_MESSAGE_LENGTH,
};

use super::within;
use crate::codes::SetInfoCode;
use crate::engine::CoreEngine;
use crate::error::{Closed, StatusExt, ToxError};
use crate::session::Tox;

impl<E: CoreEngine> Tox<E> {
    pub fn public_key(&self) -> Result<PublicKey, Closed> {
        self.query(|engine| engine.public_key())
    }

    pub fn secret_key(&self) -> Result<SecretKey, Closed> {
        self.query(|engine| engine.secret_key())
    }

    /// Public key, nospam and checksum: what a friend needs to add us.
    pub fn address(&self) -> Result<Address, Closed> {
        self.query(|engine| engine.address())
    }

    pub fn nospam(&self) -> Result<u32, Closed> {
        self.query(|engine| engine.nospam())
    }

    /// Changing the nospam invalidates addresses handed out earlier.
    pub fn set_nospam(&self, nospam: u32) -> Result<(), Closed> {
        self.query(|engine| engine.set_nospam(nospam))
    }

    pub fn name(&self) -> Result<Vec<u8>, Closed> {
        self.query(|engine| engine.name())
    }

    pub fn set_name(&self, name: &[u8]) -> Result<(), ToxError<SetInfoCode>> {
        self.invoke(|engine| {
            within(name.len(), MAX_NAME_LENGTH, SetInfoCode::TooLong)?;
            engine.set_name(name).mapped()
        })
    }

    pub fn status_message(&self) -> Result<Vec<u8>, Closed> {
        self.query(|engine| engine.status_message())
    }

    pub fn set_status_message(&self, message: &[u8]) -> Result<(), ToxError<SetInfoCode>> {
        self.invoke(|engine| {
            within(message.len(), MAX_STATUS_MESSAGE_LENGTH, SetInfoCode::TooLong)?;
            engine.set_status_message(message).mapped()
        })
    }

    pub fn status(&self) -> Result<UserStatus, Closed> {
        self.query(|engine| engine.status())
    }

    pub fn set_status(&self, status: UserStatus) -> Result<(), Closed> {
        self.query(|engine| engine.set_status(status))
    }

    pub fn connection_status(&self) -> Result<Connection, Closed> {
        self.query(|engine| engine.connection_status())
    }
}
