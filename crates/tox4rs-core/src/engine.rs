//! Engine capability interface.
//!
//! The session layer owns exactly one engine value per instance and talks to
//! it only through these traits. Fallible calls return [`Status`]: the value,
//! or the operation's numeric status as documented by the matching code enum
//! in [`crate::codes`]. Callers never see raw statuses.
//!
//! Engines are not required to be `Sync`; the session serialises every call.

use tox4rs_protocol::{
    Address, CallControl, ChatId, Connection, FileControl, FileId, FileNumber, FriendNumber,
    GroupNumber, GroupPrivacyState, GroupRole, MessageType, PeerId, PublicKey, SecretKey,
    UserStatus,
};

use crate::error::Status;
use crate::options::{Savedata, SessionOptions};

/// Builds engines. Construction failures use [`crate::codes::NewCode`]
/// statuses.
pub trait EngineProvider {
    type Engine: CoreEngine;

    fn construct(&self, options: &SessionOptions, savedata: &Savedata) -> Status<Self::Engine>;
}

/// One live session of the messaging engine.
pub trait CoreEngine: Send + 'static {
    type Av: AvEngine;

    /// Release every engine resource. Called exactly once.
    fn kill(&mut self);

    /// Opaque blob suitable for [`Savedata::ToxSave`].
    fn savedata(&self) -> Vec<u8>;

    /// Milliseconds until the next `iterate` is due.
    fn iteration_interval(&self) -> u32;

    /// Run one iteration and return the pending events as an encoded batch.
    /// An empty vector means no events.
    fn iterate(&mut self) -> Vec<u8>;

    // -- Self --
    fn public_key(&self) -> PublicKey;
    fn secret_key(&self) -> SecretKey;
    fn address(&self) -> Address;
    fn nospam(&self) -> u32;
    fn set_nospam(&mut self, nospam: u32);
    fn name(&self) -> Vec<u8>;
    fn set_name(&mut self, name: &[u8]) -> Status<()>;
    fn status_message(&self) -> Vec<u8>;
    fn set_status_message(&mut self, message: &[u8]) -> Status<()>;
    fn status(&self) -> UserStatus;
    fn set_status(&mut self, status: UserStatus);
    fn connection_status(&self) -> Connection;

    // -- Network --
    fn bootstrap(&mut self, host: &str, port: u16, public_key: &PublicKey) -> Status<()>;
    fn add_tcp_relay(&mut self, host: &str, port: u16, public_key: &PublicKey) -> Status<()>;
    fn udp_port(&self) -> Status<u16>;
    fn tcp_port(&self) -> Status<u16>;
    fn dht_id(&self) -> PublicKey;

    // -- Friends --
    fn friend_add(&mut self, address: &Address, message: &[u8]) -> Status<FriendNumber>;
    fn friend_add_norequest(&mut self, public_key: &PublicKey) -> Status<FriendNumber>;
    fn friend_delete(&mut self, friend: FriendNumber) -> Status<()>;
    fn friend_by_public_key(&self, public_key: &PublicKey) -> Status<FriendNumber>;
    fn friend_exists(&self, friend: FriendNumber) -> bool;
    fn friend_list(&self) -> Vec<FriendNumber>;
    fn friend_public_key(&self, friend: FriendNumber) -> Status<PublicKey>;
    /// Unix seconds; 0 if never seen.
    fn friend_last_online(&self, friend: FriendNumber) -> Status<u64>;
    fn friend_name(&self, friend: FriendNumber) -> Status<Vec<u8>>;
    fn friend_status_message(&self, friend: FriendNumber) -> Status<Vec<u8>>;
    fn friend_status(&self, friend: FriendNumber) -> Status<UserStatus>;
    fn friend_connection_status(&self, friend: FriendNumber) -> Status<Connection>;
    fn friend_typing(&self, friend: FriendNumber) -> Status<bool>;
    fn set_typing(&mut self, friend: FriendNumber, typing: bool) -> Status<()>;
    fn friend_send_message(
        &mut self,
        friend: FriendNumber,
        kind: MessageType,
        message: &[u8],
    ) -> Status<u32>;

    // -- File transfer --
    fn file_control(
        &mut self,
        friend: FriendNumber,
        file: FileNumber,
        control: FileControl,
    ) -> Status<()>;
    fn file_seek(&mut self, friend: FriendNumber, file: FileNumber, position: u64) -> Status<()>;
    fn file_file_id(&self, friend: FriendNumber, file: FileNumber) -> Status<FileId>;
    fn file_send(
        &mut self,
        friend: FriendNumber,
        kind: u32,
        file_size: u64,
        file_id: Option<&FileId>,
        filename: &[u8],
    ) -> Status<FileNumber>;
    fn file_send_chunk(
        &mut self,
        friend: FriendNumber,
        file: FileNumber,
        position: u64,
        data: &[u8],
    ) -> Status<()>;

    // -- Custom packets --
    fn friend_send_lossy_packet(&mut self, friend: FriendNumber, data: &[u8]) -> Status<()>;
    fn friend_send_lossless_packet(&mut self, friend: FriendNumber, data: &[u8]) -> Status<()>;

    // -- Groups --
    fn group_new(
        &mut self,
        privacy: GroupPrivacyState,
        group_name: &[u8],
        self_name: &[u8],
    ) -> Status<GroupNumber>;
    fn group_join(
        &mut self,
        chat_id: &ChatId,
        self_name: &[u8],
        password: &[u8],
    ) -> Status<GroupNumber>;
    fn group_reconnect(&mut self, group: GroupNumber) -> Status<()>;
    fn group_leave(&mut self, group: GroupNumber, part_message: &[u8]) -> Status<()>;
    fn group_count(&self) -> u32;

    fn group_self_name(&self, group: GroupNumber) -> Status<Vec<u8>>;
    fn group_set_self_name(&mut self, group: GroupNumber, name: &[u8]) -> Status<()>;
    fn group_self_status(&self, group: GroupNumber) -> Status<UserStatus>;
    fn group_set_self_status(&mut self, group: GroupNumber, status: UserStatus) -> Status<()>;
    fn group_self_role(&self, group: GroupNumber) -> Status<GroupRole>;
    fn group_self_peer_id(&self, group: GroupNumber) -> Status<PeerId>;

    fn group_peer_name(&self, group: GroupNumber, peer: PeerId) -> Status<Vec<u8>>;
    fn group_peer_status(&self, group: GroupNumber, peer: PeerId) -> Status<UserStatus>;
    fn group_peer_role(&self, group: GroupNumber, peer: PeerId) -> Status<GroupRole>;

    fn group_topic(&self, group: GroupNumber) -> Status<Vec<u8>>;
    fn group_set_topic(&mut self, group: GroupNumber, topic: &[u8]) -> Status<()>;
    fn group_name(&self, group: GroupNumber) -> Status<Vec<u8>>;
    fn group_chat_id(&self, group: GroupNumber) -> Status<ChatId>;
    fn group_peer_count(&self, group: GroupNumber) -> Status<u32>;
    fn group_privacy_state(&self, group: GroupNumber) -> Status<GroupPrivacyState>;
    fn group_peer_limit(&self, group: GroupNumber) -> Status<u16>;
    fn group_password(&self, group: GroupNumber) -> Status<Vec<u8>>;

    fn group_send_message(
        &mut self,
        group: GroupNumber,
        kind: MessageType,
        message: &[u8],
    ) -> Status<u32>;
    fn group_send_private_message(
        &mut self,
        group: GroupNumber,
        peer: PeerId,
        kind: MessageType,
        message: &[u8],
    ) -> Status<()>;

    fn group_invite_friend(&mut self, group: GroupNumber, friend: FriendNumber) -> Status<()>;
    fn group_invite_accept(
        &mut self,
        friend: FriendNumber,
        invite_data: &[u8],
        self_name: &[u8],
        password: &[u8],
    ) -> Status<GroupNumber>;

    fn group_founder_set_password(&mut self, group: GroupNumber, password: &[u8]) -> Status<()>;
    fn group_founder_set_privacy_state(
        &mut self,
        group: GroupNumber,
        privacy: GroupPrivacyState,
    ) -> Status<()>;
    fn group_founder_set_peer_limit(&mut self, group: GroupNumber, limit: u16) -> Status<()>;

    fn group_toggle_ignore(&mut self, group: GroupNumber, peer: PeerId, ignore: bool)
        -> Status<()>;
    fn group_mod_set_role(&mut self, group: GroupNumber, peer: PeerId, role: GroupRole)
        -> Status<()>;
    fn group_mod_remove_peer(&mut self, group: GroupNumber, peer: PeerId, ban: bool)
        -> Status<()>;
    fn group_mod_remove_ban(&mut self, group: GroupNumber, ban_id: u32) -> Status<()>;
    fn group_ban_list(&self, group: GroupNumber) -> Status<Vec<u32>>;
    fn group_ban_name(&self, group: GroupNumber, ban_id: u32) -> Status<Vec<u8>>;

    // -- AV --
    /// Create the AV subsystem bound to this session. Failures use
    /// [`crate::codes::AvNewCode`] statuses.
    fn new_av(&mut self) -> Status<Self::Av>;
}

/// The AV subsystem of one session.
pub trait AvEngine: Send + 'static {
    fn kill(&mut self);
    fn iteration_interval(&self) -> u32;
    fn iterate(&mut self) -> Vec<u8>;

    fn call(&mut self, friend: FriendNumber, audio_bit_rate: u32, video_bit_rate: u32)
        -> Status<()>;
    fn answer(
        &mut self,
        friend: FriendNumber,
        audio_bit_rate: u32,
        video_bit_rate: u32,
    ) -> Status<()>;
    fn call_control(&mut self, friend: FriendNumber, control: CallControl) -> Status<()>;
    fn set_audio_bit_rate(&mut self, friend: FriendNumber, bit_rate: u32) -> Status<()>;
    fn set_video_bit_rate(&mut self, friend: FriendNumber, bit_rate: u32) -> Status<()>;
    fn send_audio_frame(
        &mut self,
        friend: FriendNumber,
        pcm: &[i16],
        sample_count: usize,
        channels: u8,
        sampling_rate: u32,
    ) -> Status<()>;
    fn send_video_frame(
        &mut self,
        friend: FriendNumber,
        width: u16,
        height: u16,
        y: &[u8],
        u: &[u8],
        v: &[u8],
    ) -> Status<()>;
}
