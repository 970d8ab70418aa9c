//! `CoreEngine` for the memory engine.

use std::sync::{Arc, Mutex, MutexGuard};

use tox4rs_protocol::events::session::{
    FriendReadReceipt, GroupSelfJoin, GroupTopicChange, SelfConnectionStatus,
};
use tox4rs_protocol::{
    Address, ChatId, Connection, FileControl, FileId, FileNumber, FriendNumber, GroupNumber,
    GroupPrivacyState, GroupRole, MessageType, PeerId, PublicKey, SecretKey, UserStatus,
    MAX_FILE_CHUNK,
};

use crate::codes::*;
use crate::engine::CoreEngine;
use crate::error::{ErrorCode, Status};
use crate::lock;

use super::av::MemoryAv;
use super::state::{derive_key, parse_address, Direction, Group, MemoryState, Transfer};
use super::MemoryProbe;

/// Hosts under this reserved suffix never resolve.
const UNRESOLVABLE_SUFFIX: &str = ".invalid";

pub struct MemoryEngine {
    state: Arc<Mutex<MemoryState>>,
    probe: MemoryProbe,
}

fn fail<T, C: ErrorCode>(code: C) -> Status<T> {
    Err(code.status())
}

impl MemoryEngine {
    pub(crate) fn new(state: Arc<Mutex<MemoryState>>, probe: MemoryProbe) -> Self {
        Self { state, probe }
    }

    pub fn probe(&self) -> &MemoryProbe {
        &self.probe
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        lock(&self.state)
    }

    fn connect_via(&self, host: &str, port: u16, code_host: u32, code_port: u32) -> Status<()> {
        if host.is_empty() || host.ends_with(UNRESOLVABLE_SUFFIX) {
            return Err(code_host);
        }
        if port == 0 {
            return Err(code_port);
        }
        let mut s = self.state();
        if !s.connection.is_connected() {
            s.connection = if s.options.udp_enabled {
                Connection::Udp
            } else {
                Connection::Tcp
            };
            self.probe.push_event(SelfConnectionStatus {
                connection_status: s.connection,
            });
        }
        Ok(())
    }
}

/// Look up a friend or fail with `missing`.
macro_rules! friend {
    (mut $state:expr, $friend:expr, $missing:expr) => {
        match $state.friends.get_mut(&$friend) {
            Some(f) => f,
            None => return fail($missing),
        }
    };
    ($state:expr, $friend:expr, $missing:expr) => {
        match $state.friends.get(&$friend) {
            Some(f) => f,
            None => return fail($missing),
        }
    };
}

/// Look up a group or fail with `missing`.
macro_rules! group {
    (mut $state:expr, $group:expr, $missing:expr) => {
        match $state.groups.get_mut(&$group) {
            Some(g) => g,
            None => return fail($missing),
        }
    };
    ($state:expr, $group:expr, $missing:expr) => {
        match $state.groups.get(&$group) {
            Some(g) => g,
            None => return fail($missing),
        }
    };
}

impl CoreEngine for MemoryEngine {
    type Av = MemoryAv;

    fn kill(&mut self) {
        self.probe.record("kill");
        let mut s = self.state();
        s.connection = Connection::None;
        s.calls.clear();
    }

    fn savedata(&self) -> Vec<u8> {
        self.probe.record("savedata");
        self.state().save()
    }

    fn iteration_interval(&self) -> u32 {
        self.probe.interval()
    }

    fn iterate(&mut self) -> Vec<u8> {
        self.probe.record("iterate");
        self.probe.take_core_batch()
    }

    // ------------------------------------------------------------------
    // Self
    // ------------------------------------------------------------------

    fn public_key(&self) -> PublicKey {
        self.probe.record("public_key");
        self.state().public_key
    }

    fn secret_key(&self) -> SecretKey {
        self.probe.record("secret_key");
        self.state().secret_key
    }

    fn address(&self) -> Address {
        self.probe.record("address");
        self.state().address()
    }

    fn nospam(&self) -> u32 {
        self.probe.record("nospam");
        self.state().nospam
    }

    fn set_nospam(&mut self, nospam: u32) {
        self.probe.record("set_nospam");
        self.state().nospam = nospam;
    }

    fn name(&self) -> Vec<u8> {
        self.probe.record("name");
        self.state().name.clone()
    }

    fn set_name(&mut self, name: &[u8]) -> Status<()> {
        self.probe.enter("set_name")?;
        self.state().name = name.to_vec();
        Ok(())
    }

    fn status_message(&self) -> Vec<u8> {
        self.probe.record("status_message");
        self.state().status_message.clone()
    }

    fn set_status_message(&mut self, message: &[u8]) -> Status<()> {
        self.probe.enter("set_status_message")?;
        self.state().status_message = message.to_vec();
        Ok(())
    }

    fn status(&self) -> UserStatus {
        self.probe.record("status");
        self.state().status
    }

    fn set_status(&mut self, status: UserStatus) {
        self.probe.record("set_status");
        self.state().status = status;
    }

    fn connection_status(&self) -> Connection {
        self.probe.record("connection_status");
        self.state().connection
    }

    // ------------------------------------------------------------------
    // Network
    // ------------------------------------------------------------------

    fn bootstrap(&mut self, host: &str, port: u16, _public_key: &PublicKey) -> Status<()> {
        self.probe.enter("bootstrap")?;
        self.connect_via(
            host,
            port,
            BootstrapCode::BadHost.status(),
            BootstrapCode::BadPort.status(),
        )
    }

    fn add_tcp_relay(&mut self, host: &str, port: u16, _public_key: &PublicKey) -> Status<()> {
        self.probe.enter("add_tcp_relay")?;
        self.connect_via(
            host,
            port,
            BootstrapCode::BadHost.status(),
            BootstrapCode::BadPort.status(),
        )
    }

    fn udp_port(&self) -> Status<u16> {
        self.probe.enter("udp_port")?;
        self.state()
            .udp_port()
            .ok_or(GetPortCode::NotBound.status())
    }

    fn tcp_port(&self) -> Status<u16> {
        self.probe.enter("tcp_port")?;
        self.state()
            .tcp_port()
            .ok_or(GetPortCode::NotBound.status())
    }

    fn dht_id(&self) -> PublicKey {
        self.probe.record("dht_id");
        self.state().dht_id
    }

    // ------------------------------------------------------------------
    // Friends
    // ------------------------------------------------------------------

    fn friend_add(&mut self, address: &Address, message: &[u8]) -> Status<FriendNumber> {
        self.probe.enter("friend_add")?;
        if message.is_empty() {
            return fail(FriendAddCode::NoMessage);
        }
        let Some((public_key, nospam)) = parse_address(address) else {
            return fail(FriendAddCode::BadChecksum);
        };

        let mut s = self.state();
        if public_key == s.public_key {
            return fail(FriendAddCode::OwnKey);
        }
        if let Some(existing) = s.friends.values_mut().find(|f| f.public_key == public_key) {
            if existing.nospam == nospam {
                return fail(FriendAddCode::AlreadySent);
            }
            existing.nospam = nospam;
            return fail(FriendAddCode::SetNewNospam);
        }
        Ok(s.add_friend_record(public_key, nospam))
    }

    fn friend_add_norequest(&mut self, public_key: &PublicKey) -> Status<FriendNumber> {
        self.probe.enter("friend_add_norequest")?;
        let mut s = self.state();
        if *public_key == s.public_key {
            return fail(FriendAddCode::OwnKey);
        }
        if s.friends.values().any(|f| f.public_key == *public_key) {
            return fail(FriendAddCode::AlreadySent);
        }
        Ok(s.add_friend_record(*public_key, 0))
    }

    fn friend_delete(&mut self, friend: FriendNumber) -> Status<()> {
        self.probe.enter("friend_delete")?;
        let mut s = self.state();
        if s.friends.remove(&friend).is_none() {
            return fail(FriendDeleteCode::FriendNotFound);
        }
        s.calls.remove(&friend);
        Ok(())
    }

    fn friend_by_public_key(&self, public_key: &PublicKey) -> Status<FriendNumber> {
        self.probe.enter("friend_by_public_key")?;
        self.state()
            .friends
            .iter()
            .find(|(_, f)| f.public_key == *public_key)
            .map(|(n, _)| *n)
            .ok_or(FriendByPublicKeyCode::NotFound.status())
    }

    fn friend_exists(&self, friend: FriendNumber) -> bool {
        self.probe.record("friend_exists");
        self.state().friends.contains_key(&friend)
    }

    fn friend_list(&self) -> Vec<FriendNumber> {
        self.probe.record("friend_list");
        self.state().friends.keys().copied().collect()
    }

    fn friend_public_key(&self, friend: FriendNumber) -> Status<PublicKey> {
        self.probe.enter("friend_public_key")?;
        let s = self.state();
        Ok(friend!(s, friend, FriendGetPublicKeyCode::FriendNotFound).public_key)
    }

    fn friend_last_online(&self, friend: FriendNumber) -> Status<u64> {
        self.probe.enter("friend_last_online")?;
        let s = self.state();
        Ok(friend!(s, friend, FriendGetLastOnlineCode::FriendNotFound).last_online)
    }

    fn friend_name(&self, friend: FriendNumber) -> Status<Vec<u8>> {
        self.probe.enter("friend_name")?;
        let s = self.state();
        Ok(friend!(s, friend, FriendQueryCode::FriendNotFound).name.clone())
    }

    fn friend_status_message(&self, friend: FriendNumber) -> Status<Vec<u8>> {
        self.probe.enter("friend_status_message")?;
        let s = self.state();
        Ok(friend!(s, friend, FriendQueryCode::FriendNotFound)
            .status_message
            .clone())
    }

    fn friend_status(&self, friend: FriendNumber) -> Status<UserStatus> {
        self.probe.enter("friend_status")?;
        let s = self.state();
        Ok(friend!(s, friend, FriendQueryCode::FriendNotFound).status)
    }

    fn friend_connection_status(&self, friend: FriendNumber) -> Status<Connection> {
        self.probe.enter("friend_connection_status")?;
        let s = self.state();
        Ok(friend!(s, friend, FriendQueryCode::FriendNotFound).connection)
    }

    fn friend_typing(&self, friend: FriendNumber) -> Status<bool> {
        self.probe.enter("friend_typing")?;
        let s = self.state();
        Ok(friend!(s, friend, FriendQueryCode::FriendNotFound).typing)
    }

    fn set_typing(&mut self, friend: FriendNumber, _typing: bool) -> Status<()> {
        self.probe.enter("set_typing")?;
        let s = self.state();
        friend!(s, friend, SetTypingCode::FriendNotFound);
        Ok(())
    }

    fn friend_send_message(
        &mut self,
        friend: FriendNumber,
        _kind: MessageType,
        _message: &[u8],
    ) -> Status<u32> {
        self.probe.enter("friend_send_message")?;
        let mut s = self.state();
        let f = friend!(s, friend, FriendSendMessageCode::FriendNotFound);
        if !f.connection.is_connected() {
            return fail(FriendSendMessageCode::FriendNotConnected);
        }
        let message_id = s.next_message_id;
        s.next_message_id = s.next_message_id.wrapping_add(1);
        // Connected memory friends read everything immediately.
        self.probe.push_event(FriendReadReceipt {
            friend_number: friend,
            message_id,
        });
        Ok(message_id)
    }

    // ------------------------------------------------------------------
    // File transfer
    // ------------------------------------------------------------------

    fn file_control(
        &mut self,
        friend: FriendNumber,
        file: FileNumber,
        control: FileControl,
    ) -> Status<()> {
        self.probe.enter("file_control")?;
        let mut s = self.state();
        let f = friend!(mut s, friend, FileControlCode::FriendNotFound);
        if !f.connection.is_connected() {
            return fail(FileControlCode::FriendNotConnected);
        }
        let Some(t) = f.transfers.get_mut(&file) else {
            return fail(FileControlCode::NotFound);
        };
        match control {
            FileControl::Resume => {
                if !t.paused_by_us {
                    return if t.paused_by_peer {
                        fail(FileControlCode::Denied)
                    } else {
                        fail(FileControlCode::NotPaused)
                    };
                }
                t.paused_by_us = false;
            }
            FileControl::Pause => {
                if t.paused_by_us {
                    return fail(FileControlCode::AlreadyPaused);
                }
                t.paused_by_us = true;
            }
            FileControl::Cancel => {
                f.transfers.remove(&file);
            }
        }
        Ok(())
    }

    fn file_seek(&mut self, friend: FriendNumber, file: FileNumber, position: u64) -> Status<()> {
        self.probe.enter("file_seek")?;
        let mut s = self.state();
        let f = friend!(mut s, friend, FileSeekCode::FriendNotFound);
        if !f.connection.is_connected() {
            return fail(FileSeekCode::FriendNotConnected);
        }
        let Some(t) = f.transfers.get_mut(&file) else {
            return fail(FileSeekCode::NotFound);
        };
        // Only an incoming transfer that has not started may seek.
        if t.direction != Direction::Incoming || !t.paused_by_us || t.position != 0 {
            return fail(FileSeekCode::Denied);
        }
        if position >= t.size {
            return fail(FileSeekCode::InvalidPosition);
        }
        t.position = position;
        Ok(())
    }

    fn file_file_id(&self, friend: FriendNumber, file: FileNumber) -> Status<FileId> {
        self.probe.enter("file_file_id")?;
        let s = self.state();
        let f = friend!(s, friend, FileGetCode::FriendNotFound);
        f.transfers
            .get(&file)
            .map(|t| t.file_id)
            .ok_or(FileGetCode::NotFound.status())
    }

    fn file_send(
        &mut self,
        friend: FriendNumber,
        kind: u32,
        file_size: u64,
        file_id: Option<&FileId>,
        filename: &[u8],
    ) -> Status<FileNumber> {
        self.probe.enter("file_send")?;
        let mut s = self.state();
        let secret_key = s.secret_key;
        let f = friend!(mut s, friend, FileSendCode::FriendNotFound);
        if !f.connection.is_connected() {
            return fail(FileSendCode::FriendNotConnected);
        }
        let Some(file_number) = (0..256u32).find(|n| !f.transfers.contains_key(n)) else {
            return fail(FileSendCode::TooMany);
        };
        let file_id = match file_id {
            Some(id) => *id,
            None => derive_key(filename, &secret_key),
        };
        f.transfers.insert(
            file_number,
            Transfer {
                direction: Direction::Outgoing,
                kind,
                size: file_size,
                position: 0,
                file_id,
                paused_by_us: false,
                paused_by_peer: true,
            },
        );
        Ok(file_number)
    }

    fn file_send_chunk(
        &mut self,
        friend: FriendNumber,
        file: FileNumber,
        position: u64,
        data: &[u8],
    ) -> Status<()> {
        self.probe.enter("file_send_chunk")?;
        let mut s = self.state();
        let f = friend!(mut s, friend, FileSendChunkCode::FriendNotFound);
        if !f.connection.is_connected() {
            return fail(FileSendChunkCode::FriendNotConnected);
        }
        let Some(t) = f.transfers.get_mut(&file) else {
            return fail(FileSendChunkCode::NotFound);
        };
        if t.direction != Direction::Outgoing || !t.is_transferring() {
            return fail(FileSendChunkCode::NotTransferring);
        }
        if position != t.position {
            return fail(FileSendChunkCode::WrongPosition);
        }
        let expected = (t.size - t.position).min(MAX_FILE_CHUNK as u64);
        if data.len() as u64 != expected {
            return fail(FileSendChunkCode::InvalidLength);
        }
        t.position += data.len() as u64;
        if t.position == t.size {
            tracing::trace!(friend, file, "memory transfer complete");
            f.transfers.remove(&file);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Custom packets
    // ------------------------------------------------------------------

    fn friend_send_lossy_packet(&mut self, friend: FriendNumber, _data: &[u8]) -> Status<()> {
        self.probe.enter("friend_send_lossy_packet")?;
        let s = self.state();
        let f = friend!(s, friend, FriendCustomPacketCode::FriendNotFound);
        if !f.connection.is_connected() {
            return fail(FriendCustomPacketCode::FriendNotConnected);
        }
        Ok(())
    }

    fn friend_send_lossless_packet(&mut self, friend: FriendNumber, _data: &[u8]) -> Status<()> {
        self.probe.enter("friend_send_lossless_packet")?;
        let s = self.state();
        let f = friend!(s, friend, FriendCustomPacketCode::FriendNotFound);
        if !f.connection.is_connected() {
            return fail(FriendCustomPacketCode::FriendNotConnected);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Groups
    // ------------------------------------------------------------------

    fn group_new(
        &mut self,
        privacy: GroupPrivacyState,
        group_name: &[u8],
        self_name: &[u8],
    ) -> Status<GroupNumber> {
        self.probe.enter("group_new")?;
        let mut s = self.state();
        let number = s.next_group_number();
        let mut group = Group::new(rand::random(), group_name, self_name, GroupRole::Founder);
        group.privacy = privacy;
        s.groups.insert(number, group);
        Ok(number)
    }

    fn group_join(
        &mut self,
        chat_id: &ChatId,
        self_name: &[u8],
        password: &[u8],
    ) -> Status<GroupNumber> {
        self.probe.enter("group_join")?;
        let mut s = self.state();
        if s.groups.values().any(|g| g.chat_id == *chat_id) {
            return fail(GroupJoinCode::Init);
        }
        let number = s.next_group_number();
        let mut group = Group::new(*chat_id, b"", self_name, GroupRole::User);
        group.password = password.to_vec();
        s.groups.insert(number, group);
        self.probe.push_event(GroupSelfJoin {
            group_number: number,
        });
        Ok(number)
    }

    fn group_reconnect(&mut self, group: GroupNumber) -> Status<()> {
        self.probe.enter("group_reconnect")?;
        let s = self.state();
        group!(s, group, GroupReconnectCode::GroupNotFound);
        Ok(())
    }

    fn group_leave(&mut self, group: GroupNumber, _part_message: &[u8]) -> Status<()> {
        self.probe.enter("group_leave")?;
        let mut s = self.state();
        if s.groups.remove(&group).is_none() {
            return fail(GroupLeaveCode::GroupNotFound);
        }
        Ok(())
    }

    fn group_count(&self) -> u32 {
        self.probe.record("group_count");
        self.state().groups.len() as u32
    }

    fn group_self_name(&self, group: GroupNumber) -> Status<Vec<u8>> {
        self.probe.enter("group_self_name")?;
        let s = self.state();
        Ok(group!(s, group, GroupSelfQueryCode::GroupNotFound)
            .self_name
            .clone())
    }

    fn group_set_self_name(&mut self, group: GroupNumber, name: &[u8]) -> Status<()> {
        self.probe.enter("group_set_self_name")?;
        let mut s = self.state();
        group!(mut s, group, GroupSelfNameSetCode::GroupNotFound).self_name = name.to_vec();
        Ok(())
    }

    fn group_self_status(&self, group: GroupNumber) -> Status<UserStatus> {
        self.probe.enter("group_self_status")?;
        let s = self.state();
        Ok(group!(s, group, GroupSelfQueryCode::GroupNotFound).self_status)
    }

    fn group_set_self_status(&mut self, group: GroupNumber, status: UserStatus) -> Status<()> {
        self.probe.enter("group_set_self_status")?;
        let mut s = self.state();
        group!(mut s, group, GroupSelfStatusSetCode::GroupNotFound).self_status = status;
        Ok(())
    }

    fn group_self_role(&self, group: GroupNumber) -> Status<GroupRole> {
        self.probe.enter("group_self_role")?;
        let s = self.state();
        Ok(group!(s, group, GroupSelfQueryCode::GroupNotFound).self_role)
    }

    fn group_self_peer_id(&self, group: GroupNumber) -> Status<PeerId> {
        self.probe.enter("group_self_peer_id")?;
        let s = self.state();
        Ok(group!(s, group, GroupSelfQueryCode::GroupNotFound).self_peer_id)
    }

    fn group_peer_name(&self, group: GroupNumber, peer: PeerId) -> Status<Vec<u8>> {
        self.probe.enter("group_peer_name")?;
        let s = self.state();
        let g = group!(s, group, GroupPeerQueryCode::GroupNotFound);
        g.peers
            .get(&peer)
            .map(|p| p.name.clone())
            .ok_or(GroupPeerQueryCode::PeerNotFound.status())
    }

    fn group_peer_status(&self, group: GroupNumber, peer: PeerId) -> Status<UserStatus> {
        self.probe.enter("group_peer_status")?;
        let s = self.state();
        let g = group!(s, group, GroupPeerQueryCode::GroupNotFound);
        g.peers
            .get(&peer)
            .map(|p| p.status)
            .ok_or(GroupPeerQueryCode::PeerNotFound.status())
    }

    fn group_peer_role(&self, group: GroupNumber, peer: PeerId) -> Status<GroupRole> {
        self.probe.enter("group_peer_role")?;
        let s = self.state();
        let g = group!(s, group, GroupPeerQueryCode::GroupNotFound);
        g.peers
            .get(&peer)
            .map(|p| p.role)
            .ok_or(GroupPeerQueryCode::PeerNotFound.status())
    }

    fn group_topic(&self, group: GroupNumber) -> Status<Vec<u8>> {
        self.probe.enter("group_topic")?;
        let s = self.state();
        Ok(group!(s, group, GroupStateQueryCode::GroupNotFound).topic.clone())
    }

    fn group_set_topic(&mut self, group: GroupNumber, topic: &[u8]) -> Status<()> {
        self.probe.enter("group_set_topic")?;
        let mut s = self.state();
        let g = group!(mut s, group, GroupTopicSetCode::GroupNotFound);
        if g.self_role == GroupRole::Observer {
            return fail(GroupTopicSetCode::Permissions);
        }
        g.topic = topic.to_vec();
        self.probe.push_event(GroupTopicChange {
            group_number: group,
            peer_id: g.self_peer_id,
            topic: topic.to_vec(),
        });
        Ok(())
    }

    fn group_name(&self, group: GroupNumber) -> Status<Vec<u8>> {
        self.probe.enter("group_name")?;
        let s = self.state();
        Ok(group!(s, group, GroupStateQueryCode::GroupNotFound).name.clone())
    }

    fn group_chat_id(&self, group: GroupNumber) -> Status<ChatId> {
        self.probe.enter("group_chat_id")?;
        let s = self.state();
        Ok(group!(s, group, GroupStateQueryCode::GroupNotFound).chat_id)
    }

    fn group_peer_count(&self, group: GroupNumber) -> Status<u32> {
        self.probe.enter("group_peer_count")?;
        let s = self.state();
        // Includes ourselves.
        Ok(group!(s, group, GroupStateQueryCode::GroupNotFound).peers.len() as u32 + 1)
    }

    fn group_privacy_state(&self, group: GroupNumber) -> Status<GroupPrivacyState> {
        self.probe.enter("group_privacy_state")?;
        let s = self.state();
        Ok(group!(s, group, GroupStateQueryCode::GroupNotFound).privacy)
    }

    fn group_peer_limit(&self, group: GroupNumber) -> Status<u16> {
        self.probe.enter("group_peer_limit")?;
        let s = self.state();
        Ok(group!(s, group, GroupStateQueryCode::GroupNotFound).peer_limit)
    }

    fn group_password(&self, group: GroupNumber) -> Status<Vec<u8>> {
        self.probe.enter("group_password")?;
        let s = self.state();
        Ok(group!(s, group, GroupStateQueryCode::GroupNotFound)
            .password
            .clone())
    }

    fn group_send_message(
        &mut self,
        group: GroupNumber,
        _kind: MessageType,
        _message: &[u8],
    ) -> Status<u32> {
        self.probe.enter("group_send_message")?;
        let mut s = self.state();
        let g = group!(mut s, group, GroupSendMessageCode::GroupNotFound);
        if g.self_role == GroupRole::Observer {
            return fail(GroupSendMessageCode::Permissions);
        }
        let message_id = g.next_message_id;
        g.next_message_id = g.next_message_id.wrapping_add(1);
        Ok(message_id)
    }

    fn group_send_private_message(
        &mut self,
        group: GroupNumber,
        peer: PeerId,
        _kind: MessageType,
        _message: &[u8],
    ) -> Status<()> {
        self.probe.enter("group_send_private_message")?;
        let s = self.state();
        let g = group!(s, group, GroupSendPrivateMessageCode::GroupNotFound);
        if !g.peers.contains_key(&peer) {
            return fail(GroupSendPrivateMessageCode::PeerNotFound);
        }
        if g.self_role == GroupRole::Observer {
            return fail(GroupSendPrivateMessageCode::Permissions);
        }
        Ok(())
    }

    fn group_invite_friend(&mut self, group: GroupNumber, friend: FriendNumber) -> Status<()> {
        self.probe.enter("group_invite_friend")?;
        let s = self.state();
        group!(s, group, GroupInviteFriendCode::GroupNotFound);
        let f = friend!(s, friend, GroupInviteFriendCode::FriendNotFound);
        if !f.connection.is_connected() {
            return fail(GroupInviteFriendCode::FailSend);
        }
        Ok(())
    }

    fn group_invite_accept(
        &mut self,
        friend: FriendNumber,
        invite_data: &[u8],
        self_name: &[u8],
        password: &[u8],
    ) -> Status<GroupNumber> {
        self.probe.enter("group_invite_accept")?;
        let mut s = self.state();
        friend!(s, friend, GroupInviteAcceptCode::FriendNotFound);
        // Memory invites carry the bare chat id.
        let Ok(chat_id) = <ChatId>::try_from(invite_data) else {
            return fail(GroupInviteAcceptCode::BadInvite);
        };
        if s.groups.values().any(|g| g.chat_id == chat_id) {
            return fail(GroupInviteAcceptCode::InitFailed);
        }
        let number = s.next_group_number();
        let mut group = Group::new(chat_id, b"", self_name, GroupRole::User);
        group.password = password.to_vec();
        s.groups.insert(number, group);
        self.probe.push_event(GroupSelfJoin {
            group_number: number,
        });
        Ok(number)
    }

    fn group_founder_set_password(&mut self, group: GroupNumber, password: &[u8]) -> Status<()> {
        self.probe.enter("group_founder_set_password")?;
        let mut s = self.state();
        let g = group!(mut s, group, GroupFounderSetPasswordCode::GroupNotFound);
        if g.self_role != GroupRole::Founder {
            return fail(GroupFounderSetPasswordCode::Permissions);
        }
        g.password = password.to_vec();
        Ok(())
    }

    fn group_founder_set_privacy_state(
        &mut self,
        group: GroupNumber,
        privacy: GroupPrivacyState,
    ) -> Status<()> {
        self.probe.enter("group_founder_set_privacy_state")?;
        let mut s = self.state();
        let g = group!(mut s, group, GroupFounderSetPrivacyStateCode::GroupNotFound);
        if g.self_role != GroupRole::Founder {
            return fail(GroupFounderSetPrivacyStateCode::Permissions);
        }
        g.privacy = privacy;
        Ok(())
    }

    fn group_founder_set_peer_limit(&mut self, group: GroupNumber, limit: u16) -> Status<()> {
        self.probe.enter("group_founder_set_peer_limit")?;
        let mut s = self.state();
        let g = group!(mut s, group, GroupFounderSetPeerLimitCode::GroupNotFound);
        if g.self_role != GroupRole::Founder {
            return fail(GroupFounderSetPeerLimitCode::Permissions);
        }
        if (limit as usize) < g.peers.len() + 1 {
            return fail(GroupFounderSetPeerLimitCode::FailSet);
        }
        g.peer_limit = limit;
        Ok(())
    }

    fn group_toggle_ignore(&mut self, group: GroupNumber, peer: PeerId, ignore: bool) -> Status<()> {
        self.probe.enter("group_toggle_ignore")?;
        let mut s = self.state();
        let g = group!(mut s, group, GroupToggleIgnoreCode::GroupNotFound);
        if peer == g.self_peer_id {
            return fail(GroupToggleIgnoreCode::SelfTarget);
        }
        let Some(p) = g.peers.get_mut(&peer) else {
            return fail(GroupToggleIgnoreCode::PeerNotFound);
        };
        p.ignored = ignore;
        Ok(())
    }

    fn group_mod_set_role(&mut self, group: GroupNumber, peer: PeerId, role: GroupRole) -> Status<()> {
        self.probe.enter("group_mod_set_role")?;
        let mut s = self.state();
        let g = group!(mut s, group, GroupModSetRoleCode::GroupNotFound);
        if peer == g.self_peer_id {
            return fail(GroupModSetRoleCode::SelfTarget);
        }
        let self_role = g.self_role;
        let Some(p) = g.peers.get_mut(&peer) else {
            return fail(GroupModSetRoleCode::PeerNotFound);
        };
        if role == GroupRole::Founder {
            return fail(GroupModSetRoleCode::Assignment);
        }
        // Only the founder may touch moderators; moderators manage users and
        // observers.
        let may_assign = match self_role {
            GroupRole::Founder => true,
            GroupRole::Moderator => {
                self_role.outranks(p.role) && self_role.outranks(role)
            }
            _ => false,
        };
        if !may_assign {
            return fail(GroupModSetRoleCode::Permissions);
        }
        if p.role == role {
            return fail(GroupModSetRoleCode::Assignment);
        }
        p.role = role;
        Ok(())
    }

    fn group_mod_remove_peer(&mut self, group: GroupNumber, peer: PeerId, ban: bool) -> Status<()> {
        self.probe.enter("group_mod_remove_peer")?;
        let mut s = self.state();
        let g = group!(mut s, group, GroupModRemovePeerCode::GroupNotFound);
        if peer == g.self_peer_id {
            return fail(GroupModRemovePeerCode::SelfTarget);
        }
        let Some(target_role) = g.peers.get(&peer).map(|p| p.role) else {
            return fail(GroupModRemovePeerCode::PeerNotFound);
        };
        if g.self_role > GroupRole::Moderator || !g.self_role.outranks(target_role) {
            return fail(GroupModRemovePeerCode::Permissions);
        }
        if let Some(removed) = g.peers.remove(&peer) {
            if ban {
                let ban_id = g.next_ban_id;
                g.next_ban_id += 1;
                g.bans.insert(ban_id, removed.name);
            }
        }
        Ok(())
    }

    fn group_mod_remove_ban(&mut self, group: GroupNumber, ban_id: u32) -> Status<()> {
        self.probe.enter("group_mod_remove_ban")?;
        let mut s = self.state();
        let g = group!(mut s, group, GroupModRemoveBanCode::GroupNotFound);
        if g.self_role > GroupRole::Moderator {
            return fail(GroupModRemoveBanCode::Permissions);
        }
        if g.bans.remove(&ban_id).is_none() {
            return fail(GroupModRemoveBanCode::FailAction);
        }
        Ok(())
    }

    fn group_ban_list(&self, group: GroupNumber) -> Status<Vec<u32>> {
        self.probe.enter("group_ban_list")?;
        let s = self.state();
        Ok(group!(s, group, GroupBanQueryCode::GroupNotFound)
            .bans
            .keys()
            .copied()
            .collect())
    }

    fn group_ban_name(&self, group: GroupNumber, ban_id: u32) -> Status<Vec<u8>> {
        self.probe.enter("group_ban_name")?;
        let s = self.state();
        let g = group!(s, group, GroupBanQueryCode::GroupNotFound);
        g.bans
            .get(&ban_id)
            .cloned()
            .ok_or(GroupBanQueryCode::BadId.status())
    }

    // ------------------------------------------------------------------
    // AV
    // ------------------------------------------------------------------

    fn new_av(&mut self) -> Status<MemoryAv> {
        self.probe.enter("new_av")?;
        let mut s = self.state();
        if s.av_attached {
            return fail(AvNewCode::Multiple);
        }
        s.av_attached = true;
        Ok(MemoryAv::new(self.state.clone(), self.probe.clone()))
    }
}
