//! Friend list, friend queries and messaging.

use tox4rs_protocol::{
    Connection, FriendNumber, MessageType, PublicKey, UserStatus, MAX_FRIEND_REQUEST_LENGTH,
    MAX_MESSAGE_LENGTH,
};

use super::{fixed, within};
use crate::codes::{
    FriendAddCode, FriendByPublicKeyCode, FriendDeleteCode, FriendGetLastOnlineCode,
    FriendGetPublicKeyCode, FriendQueryCode, FriendSendMessageCode, SetTypingCode,
};
use crate::engine::CoreEngine;
use crate::error::{ensure, Closed, StatusExt, ToxError};
use crate::session::Tox;

impl<E: CoreEngine> Tox<E> {
    /// Send a friend request to a full address. Returns the new friend number.
    pub fn add_friend(
        &self,
        address: &[u8],
        message: &[u8],
    ) -> Result<FriendNumber, ToxError<FriendAddCode>> {
        self.invoke(|engine| {
            let address = fixed(address, FriendAddCode::MalformedAddress)?;
            ensure(!message.is_empty(), FriendAddCode::NoMessage)?;
            within(message.len(), MAX_FRIEND_REQUEST_LENGTH, FriendAddCode::TooLong)?;
            let friend = engine.friend_add(&address, message).mapped()?;
            tracing::debug!(friend, "friend request sent");
            Ok(friend)
        })
    }

    /// Add a friend by bare public key without sending a request, typically
    /// to accept one received earlier.
    pub fn add_friend_norequest(
        &self,
        public_key: &[u8],
    ) -> Result<FriendNumber, ToxError<FriendAddCode>> {
        self.invoke(|engine| {
            let key = fixed(public_key, FriendAddCode::MalformedAddress)?;
            engine.friend_add_norequest(&key).mapped()
        })
    }

    pub fn delete_friend(&self, friend: FriendNumber) -> Result<(), ToxError<FriendDeleteCode>> {
        self.invoke(|engine| engine.friend_delete(friend).mapped())
    }

    pub fn friend_by_public_key(
        &self,
        public_key: &[u8],
    ) -> Result<FriendNumber, ToxError<FriendByPublicKeyCode>> {
        self.invoke(|engine| {
            let key = fixed(public_key, FriendByPublicKeyCode::MalformedKey)?;
            engine.friend_by_public_key(&key).mapped()
        })
    }

    pub fn friend_exists(&self, friend: FriendNumber) -> Result<bool, Closed> {
        self.query(|engine| engine.friend_exists(friend))
    }

    pub fn friend_list(&self) -> Result<Vec<FriendNumber>, Closed> {
        self.query(|engine| engine.friend_list())
    }

    pub fn friend_public_key(
        &self,
        friend: FriendNumber,
    ) -> Result<PublicKey, ToxError<FriendGetPublicKeyCode>> {
        self.invoke(|engine| engine.friend_public_key(friend).mapped())
    }

    /// Unix seconds of the last time the friend was seen online.
    pub fn friend_last_online(
        &self,
        friend: FriendNumber,
    ) -> Result<u64, ToxError<FriendGetLastOnlineCode>> {
        self.invoke(|engine| engine.friend_last_online(friend).mapped())
    }

    pub fn friend_name(&self, friend: FriendNumber) -> Result<Vec<u8>, ToxError<FriendQueryCode>> {
        self.invoke(|engine| engine.friend_name(friend).mapped())
    }

    pub fn friend_status_message(
        &self,
        friend: FriendNumber,
    ) -> Result<Vec<u8>, ToxError<FriendQueryCode>> {
        self.invoke(|engine| engine.friend_status_message(friend).mapped())
    }

    pub fn friend_status(
        &self,
        friend: FriendNumber,
    ) -> Result<UserStatus, ToxError<FriendQueryCode>> {
        self.invoke(|engine| engine.friend_status(friend).mapped())
    }

    pub fn friend_connection_status(
        &self,
        friend: FriendNumber,
    ) -> Result<Connection, ToxError<FriendQueryCode>> {
        self.invoke(|engine| engine.friend_connection_status(friend).mapped())
    }

    pub fn friend_typing(&self, friend: FriendNumber) -> Result<bool, ToxError<FriendQueryCode>> {
        self.invoke(|engine| engine.friend_typing(friend).mapped())
    }

    pub fn set_typing(
        &self,
        friend: FriendNumber,
        typing: bool,
    ) -> Result<(), ToxError<SetTypingCode>> {
        self.invoke(|engine| engine.set_typing(friend, typing).mapped())
    }

    /// Queue a message. The returned id comes back in a read receipt.
    pub fn send_message(
        &self,
        friend: FriendNumber,
        kind: MessageType,
        message: &[u8],
    ) -> Result<u32, ToxError<FriendSendMessageCode>> {
        self.invoke(|engine| {
            ensure(!message.is_empty(), FriendSendMessageCode::Empty)?;
            within(message.len(), MAX_MESSAGE_LENGTH, FriendSendMessageCode::TooLong)?;
            engine.friend_send_message(friend, kind, message).mapped()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryEngine, MemoryProbe, MemoryProvider};
    use crate::options::{Savedata, SessionOptions};
    use std::sync::{Arc, Mutex};
    use tox4rs_protocol::events::session::FriendReadReceipt;

    fn open() -> (Tox<MemoryEngine>, MemoryProbe) {
        let provider = MemoryProvider::new();
        let probe = provider.probe();
        let tox = Tox::open(&provider, &SessionOptions::default(), Savedata::None).unwrap();
        (tox, probe)
    }

    fn peer_address(seed: u8) -> Vec<u8> {
        let provider = MemoryProvider::new();
        let peer = Tox::open(&provider, &SessionOptions::default(), Savedata::SecretKey([seed; 32]))
            .unwrap();
        peer.address().unwrap().to_vec()
    }

    #[test]
    fn test_add_friend_local_checks() {
        let (tox, probe) = open();
        probe.clear_calls();
        let address = peer_address(1);

        let err = tox.add_friend(&address[..37], b"hi").unwrap_err();
        assert_eq!(err.code(), Some(FriendAddCode::MalformedAddress));
        let err = tox.add_friend(&address, b"").unwrap_err();
        assert_eq!(err.code(), Some(FriendAddCode::NoMessage));
        let long = vec![b'x'; MAX_FRIEND_REQUEST_LENGTH + 1];
        let err = tox.add_friend(&address, &long).unwrap_err();
        assert_eq!(err.code(), Some(FriendAddCode::TooLong));
        assert_eq!(probe.call_count(), 0);
    }

    #[test]
    fn test_add_then_look_up() {
        let (tox, _probe) = open();
        let address = peer_address(2);
        let friend = tox.add_friend(&address, b"hello").unwrap();

        assert_eq!(tox.friend_list().unwrap(), vec![friend]);
        assert!(tox.friend_exists(friend).unwrap());
        assert_eq!(tox.friend_by_public_key(&address[..32]).unwrap(), friend);
        assert_eq!(&tox.friend_public_key(friend).unwrap()[..], &address[..32]);
        assert_eq!(tox.friend_connection_status(friend).unwrap(), Connection::None);

        tox.delete_friend(friend).unwrap();
        assert!(!tox.friend_exists(friend).unwrap());
        let err = tox.friend_name(friend).unwrap_err();
        assert_eq!(err.code(), Some(FriendQueryCode::FriendNotFound));
    }

    #[test]
    fn test_own_address_rejected_by_engine() {
        let (tox, _probe) = open();
        let own = tox.address().unwrap();
        let err = tox.add_friend(&own, b"me?").unwrap_err();
        assert_eq!(err.code(), Some(FriendAddCode::OwnKey));
    }

    #[test]
    fn test_message_read_receipt() {
        let (tox, probe) = open();
        let friend = tox.add_friend_norequest(&[9; 32]).unwrap();

        let err = tox.send_message(friend, MessageType::Normal, b"hi").unwrap_err();
        assert_eq!(err.code(), Some(FriendSendMessageCode::FriendNotConnected));

        probe.set_friend_connection(friend, Connection::Tcp);
        let receipts = Arc::new(Mutex::new(Vec::new()));
        let r = receipts.clone();
        tox.on::<FriendReadReceipt, _>(move |e| r.lock().unwrap().push(e.message_id));

        let id = tox.send_message(friend, MessageType::Action, b"waves").unwrap();
        tox.poll().unwrap();
        assert_eq!(*receipts.lock().unwrap(), vec![id]);
    }

    #[test]
    fn test_empty_message_local() {
        let (tox, probe) = open();
        probe.clear_calls();
        let err = tox.send_message(0, MessageType::Normal, b"").unwrap_err();
        assert_eq!(err.code(), Some(FriendSendMessageCode::Empty));
        assert_eq!(probe.call_count(), 0);
    }
}
