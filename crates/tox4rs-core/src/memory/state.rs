//! Memory engine state and its savedata format.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use tox4rs_protocol::events::av::{Call, CallStateChange};
use tox4rs_protocol::events::session::{FileRecv, FriendConnectionStatus, GroupPeerJoin};
use tox4rs_protocol::{
    file_kind, Address, CallState, ChatId, Connection, FileId, FileNumber, FriendNumber,
    GroupNumber, GroupPrivacyState, GroupRole, PeerId, PublicKey, SecretKey, UserStatus,
    ADDRESS_SIZE, PUBLIC_KEY_SIZE,
};

use crate::codes::NewCode;
use crate::error::{ErrorCode, Status};
use crate::options::SessionOptions;

use super::MemoryProbe;

/// Savedata prefix for this engine's own format.
const SAVE_MAGIC: &[u8] = b"tox4rs-memory\x00\x01";

/// Prefix of passphrase-encrypted savedata, which this engine cannot open.
const ENCRYPTED_MAGIC: &[u8] = b"toxEsave";

const SAVE_VERSION: u32 = 1;

const DEFAULT_UDP_PORT: u16 = 33445;
const DEFAULT_PEER_LIMIT: u16 = 100;

pub(crate) struct MemoryState {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
    pub dht_id: PublicKey,
    pub nospam: u32,
    pub name: Vec<u8>,
    pub status_message: Vec<u8>,
    pub status: UserStatus,
    pub connection: Connection,
    pub options: SessionOptions,
    pub friends: BTreeMap<FriendNumber, Friend>,
    pub groups: BTreeMap<GroupNumber, Group>,
    pub calls: BTreeMap<FriendNumber, CallRecord>,
    pub av_attached: bool,
    pub next_message_id: u32,
}

pub(crate) struct Friend {
    pub public_key: PublicKey,
    /// Nospam of the address the request went to; 0 when added without one.
    pub nospam: u32,
    pub name: Vec<u8>,
    pub status_message: Vec<u8>,
    pub status: UserStatus,
    pub connection: Connection,
    pub typing: bool,
    pub last_online: u64,
    pub transfers: BTreeMap<FileNumber, Transfer>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    Outgoing,
    Incoming,
}

pub(crate) struct Transfer {
    pub direction: Direction,
    pub kind: u32,
    pub size: u64,
    pub position: u64,
    pub file_id: FileId,
    pub paused_by_us: bool,
    pub paused_by_peer: bool,
}

impl Transfer {
    pub fn is_transferring(&self) -> bool {
        !self.paused_by_us && !self.paused_by_peer
    }
}

pub(crate) struct Group {
    pub chat_id: ChatId,
    pub name: Vec<u8>,
    pub topic: Vec<u8>,
    pub privacy: GroupPrivacyState,
    pub peer_limit: u16,
    pub password: Vec<u8>,
    pub self_name: Vec<u8>,
    pub self_status: UserStatus,
    pub self_role: GroupRole,
    pub self_peer_id: PeerId,
    pub peers: BTreeMap<PeerId, Peer>,
    pub bans: BTreeMap<u32, Vec<u8>>,
    pub next_peer_id: PeerId,
    pub next_ban_id: u32,
    pub next_message_id: u32,
}

impl Group {
    pub fn new(chat_id: ChatId, name: &[u8], self_name: &[u8], role: GroupRole) -> Self {
        Self {
            chat_id,
            name: name.to_vec(),
            topic: Vec::new(),
            privacy: GroupPrivacyState::Public,
            peer_limit: DEFAULT_PEER_LIMIT,
            password: Vec::new(),
            self_name: self_name.to_vec(),
            self_status: UserStatus::None,
            self_role: role,
            self_peer_id: 0,
            peers: BTreeMap::new(),
            bans: BTreeMap::new(),
            next_peer_id: 1,
            next_ban_id: 0,
            next_message_id: 0,
        }
    }
}

pub(crate) struct Peer {
    pub name: Vec<u8>,
    pub status: UserStatus,
    pub role: GroupRole,
    pub ignored: bool,
}

pub(crate) struct CallRecord {
    pub incoming: bool,
    pub answered: bool,
    pub paused: bool,
    pub audio_bit_rate: u32,
    pub video_bit_rate: u32,
    pub state: CallState,
}

// ============================================================================
// Identity
// ============================================================================

pub(crate) fn derive_key(label: &[u8], secret_key: &SecretKey) -> PublicKey {
    let mut hasher = Sha256::new();
    hasher.update(label);
    hasher.update(secret_key);
    hasher.finalize().into()
}

/// XOR of the preceding bytes, folded into two.
pub(crate) fn address_checksum(body: &[u8]) -> [u8; 2] {
    let mut checksum = [0u8; 2];
    for (i, byte) in body.iter().enumerate() {
        checksum[i % 2] ^= byte;
    }
    checksum
}

pub(crate) fn make_address(public_key: &PublicKey, nospam: u32) -> Address {
    let mut address = [0u8; ADDRESS_SIZE];
    address[..PUBLIC_KEY_SIZE].copy_from_slice(public_key);
    address[PUBLIC_KEY_SIZE..PUBLIC_KEY_SIZE + 4].copy_from_slice(&nospam.to_be_bytes());
    let checksum = address_checksum(&address[..PUBLIC_KEY_SIZE + 4]);
    address[PUBLIC_KEY_SIZE + 4..].copy_from_slice(&checksum);
    address
}

/// Split an address into key and nospam, or `None` if the checksum is wrong.
pub(crate) fn parse_address(address: &Address) -> Option<(PublicKey, u32)> {
    let body = &address[..PUBLIC_KEY_SIZE + 4];
    if address_checksum(body) != address[PUBLIC_KEY_SIZE + 4..] {
        return None;
    }
    let mut public_key = [0u8; PUBLIC_KEY_SIZE];
    public_key.copy_from_slice(&address[..PUBLIC_KEY_SIZE]);
    let mut nospam = [0u8; 4];
    nospam.copy_from_slice(&address[PUBLIC_KEY_SIZE..PUBLIC_KEY_SIZE + 4]);
    Some((public_key, u32::from_be_bytes(nospam)))
}

pub(crate) fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

// ============================================================================
// Savedata
// ============================================================================

#[derive(Serialize, Deserialize)]
struct SavedState {
    version: u32,
    #[serde(with = "hex_key")]
    secret_key: SecretKey,
    nospam: u32,
    #[serde(with = "base64_bytes")]
    name: Vec<u8>,
    #[serde(with = "base64_bytes")]
    status_message: Vec<u8>,
    status: UserStatus,
    friends: Vec<SavedFriend>,
}

#[derive(Serialize, Deserialize)]
struct SavedFriend {
    number: FriendNumber,
    #[serde(with = "hex_key")]
    public_key: PublicKey,
    nospam: u32,
    #[serde(with = "base64_bytes")]
    name: Vec<u8>,
    #[serde(with = "base64_bytes")]
    status_message: Vec<u8>,
    status: UserStatus,
    last_online: u64,
}

impl MemoryState {
    pub fn fresh(secret_key: SecretKey, options: &SessionOptions) -> Self {
        Self {
            secret_key,
            public_key: derive_key(b"public", &secret_key),
            dht_id: derive_key(b"dht", &secret_key),
            nospam: rand::random(),
            name: Vec::new(),
            status_message: Vec::new(),
            status: UserStatus::None,
            connection: Connection::None,
            options: options.clone(),
            friends: BTreeMap::new(),
            groups: BTreeMap::new(),
            calls: BTreeMap::new(),
            av_attached: false,
            next_message_id: 1,
        }
    }

    pub fn restore(blob: &[u8], options: &SessionOptions) -> Status<Self> {
        if blob.starts_with(ENCRYPTED_MAGIC) {
            return Err(NewCode::LoadEncrypted.status());
        }
        let Some(body) = blob.strip_prefix(SAVE_MAGIC) else {
            return Err(NewCode::LoadBadFormat.status());
        };
        let saved: SavedState = serde_json::from_slice(body).map_err(|e| {
            tracing::debug!(error = %e, "memory savedata rejected");
            NewCode::LoadBadFormat.status()
        })?;
        if saved.version != SAVE_VERSION {
            return Err(NewCode::LoadBadFormat.status());
        }

        let mut state = Self::fresh(saved.secret_key, options);
        state.nospam = saved.nospam;
        state.name = saved.name;
        state.status_message = saved.status_message;
        state.status = saved.status;
        for f in saved.friends {
            state.friends.insert(
                f.number,
                Friend {
                    public_key: f.public_key,
                    nospam: f.nospam,
                    name: f.name,
                    status_message: f.status_message,
                    status: f.status,
                    connection: Connection::None,
                    typing: false,
                    last_online: f.last_online,
                    transfers: BTreeMap::new(),
                },
            );
        }
        Ok(state)
    }

    pub fn save(&self) -> Vec<u8> {
        let saved = SavedState {
            version: SAVE_VERSION,
            secret_key: self.secret_key,
            nospam: self.nospam,
            name: self.name.clone(),
            status_message: self.status_message.clone(),
            status: self.status,
            friends: self
                .friends
                .iter()
                .map(|(number, f)| SavedFriend {
                    number: *number,
                    public_key: f.public_key,
                    nospam: f.nospam,
                    name: f.name.clone(),
                    status_message: f.status_message.clone(),
                    status: f.status,
                    last_online: f.last_online,
                })
                .collect(),
        };
        let mut blob = SAVE_MAGIC.to_vec();
        match serde_json::to_vec(&saved) {
            Ok(body) => blob.extend_from_slice(&body),
            Err(e) => tracing::error!(error = %e, "memory savedata not serialisable"),
        }
        blob
    }

    pub fn address(&self) -> Address {
        make_address(&self.public_key, self.nospam)
    }

    pub fn udp_port(&self) -> Option<u16> {
        if !self.options.udp_enabled {
            return None;
        }
        Some(
            self.options
                .port_range()
                .map(|(start, _)| start)
                .unwrap_or(DEFAULT_UDP_PORT),
        )
    }

    pub fn tcp_port(&self) -> Option<u16> {
        match self.options.tcp_port {
            0 => None,
            port => Some(port),
        }
    }

    /// Lowest free friend number.
    pub fn next_friend_number(&self) -> FriendNumber {
        (0..)
            .find(|n| !self.friends.contains_key(n))
            .unwrap_or(FriendNumber::MAX)
    }

    pub fn next_group_number(&self) -> GroupNumber {
        (0..)
            .find(|n| !self.groups.contains_key(n))
            .unwrap_or(GroupNumber::MAX)
    }

    pub fn add_friend_record(&mut self, public_key: PublicKey, nospam: u32) -> FriendNumber {
        let number = self.next_friend_number();
        self.friends.insert(
            number,
            Friend {
                public_key,
                nospam,
                name: Vec::new(),
                status_message: Vec::new(),
                status: UserStatus::None,
                connection: Connection::None,
                typing: false,
                last_online: 0,
                transfers: BTreeMap::new(),
            },
        );
        number
    }

    // ------------------------------------------------------------------
    // Remote simulation
    // ------------------------------------------------------------------

    pub fn set_friend_connection(
        &mut self,
        friend: FriendNumber,
        connection: Connection,
        probe: &MemoryProbe,
    ) -> bool {
        let Some(f) = self.friends.get_mut(&friend) else {
            return false;
        };
        if f.connection.is_connected() && !connection.is_connected() {
            f.last_online = now_secs();
            f.typing = false;
        }
        f.connection = connection;
        probe.push_event(FriendConnectionStatus {
            friend_number: friend,
            connection_status: connection,
        });
        true
    }

    pub fn add_group_peer(
        &mut self,
        group: GroupNumber,
        name: &[u8],
        role: GroupRole,
        probe: &MemoryProbe,
    ) -> Option<PeerId> {
        let g = self.groups.get_mut(&group)?;
        let peer_id = g.next_peer_id;
        g.next_peer_id += 1;
        g.peers.insert(
            peer_id,
            Peer {
                name: name.to_vec(),
                status: UserStatus::None,
                role,
                ignored: false,
            },
        );
        probe.push_event(GroupPeerJoin {
            group_number: group,
            peer_id,
        });
        Some(peer_id)
    }

    pub fn set_self_role(&mut self, group: GroupNumber, role: GroupRole) -> bool {
        match self.groups.get_mut(&group) {
            Some(g) => {
                g.self_role = role;
                true
            }
            None => false,
        }
    }

    pub fn offer_file(
        &mut self,
        friend: FriendNumber,
        file_size: u64,
        filename: &[u8],
        probe: &MemoryProbe,
    ) -> Option<FileNumber> {
        let f = self.friends.get_mut(&friend)?;
        // Incoming transfers live in the upper half of the number space.
        let file_number = (1u32 << 16)
            + (0..)
                .find(|n| !f.transfers.contains_key(&((1u32 << 16) + n)))
                .unwrap_or(0);
        f.transfers.insert(
            file_number,
            Transfer {
                direction: Direction::Incoming,
                kind: file_kind::DATA,
                size: file_size,
                position: 0,
                file_id: derive_key(filename, &[0u8; 32]),
                paused_by_us: true,
                paused_by_peer: false,
            },
        );
        probe.push_event(FileRecv {
            friend_number: friend,
            file_number,
            kind: file_kind::DATA,
            file_size,
            filename: filename.to_vec(),
        });
        Some(file_number)
    }

    pub fn transfer_kind(&self, friend: FriendNumber, file: FileNumber) -> Option<u32> {
        self.friends.get(&friend)?.transfers.get(&file).map(|t| t.kind)
    }

    pub fn accept_file(&mut self, friend: FriendNumber, file: FileNumber) -> bool {
        let Some(t) = self
            .friends
            .get_mut(&friend)
            .and_then(|f| f.transfers.get_mut(&file))
        else {
            return false;
        };
        t.paused_by_peer = false;
        true
    }

    pub fn ring(&mut self, friend: FriendNumber, audio: bool, video: bool, probe: &MemoryProbe) -> bool {
        if !self.av_attached || !self.friends.contains_key(&friend) || self.calls.contains_key(&friend) {
            return false;
        }
        let mut state = CallState::empty();
        if audio {
            state.insert(CallState::SENDING_AUDIO | CallState::ACCEPTING_AUDIO);
        }
        if video {
            state.insert(CallState::SENDING_VIDEO | CallState::ACCEPTING_VIDEO);
        }
        self.calls.insert(
            friend,
            CallRecord {
                incoming: true,
                answered: false,
                paused: false,
                audio_bit_rate: 0,
                video_bit_rate: 0,
                state,
            },
        );
        probe.push_av_event(Call {
            friend_number: friend,
            audio_enabled: audio,
            video_enabled: video,
        });
        true
    }

    /// The callee of one of our calls answers it.
    pub fn pick_up(&mut self, friend: FriendNumber, probe: &MemoryProbe) -> bool {
        let Some(call) = self.calls.get_mut(&friend) else {
            return false;
        };
        if call.incoming || call.answered {
            return false;
        }
        call.answered = true;
        if call.audio_bit_rate > 0 {
            call.state.insert(CallState::SENDING_AUDIO | CallState::ACCEPTING_AUDIO);
        }
        if call.video_bit_rate > 0 {
            call.state.insert(CallState::SENDING_VIDEO | CallState::ACCEPTING_VIDEO);
        }
        probe.push_av_event(CallStateChange {
            friend_number: friend,
            state: call.state,
        });
        true
    }
}

// ============================================================================
// Serde helpers
// ============================================================================

mod hex_key {
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(key: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&hex::encode(key))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<[u8; 32], D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let mut key = [0u8; 32];
        hex::decode_to_slice(&s, &mut key).map_err(serde::de::Error::custom)?;
        Ok(key)
    }
}

mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{self, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_checksum_roundtrip() {
        let pk = derive_key(b"public", &[1; 32]);
        let address = make_address(&pk, 0xdead_beef);
        assert_eq!(parse_address(&address), Some((pk, 0xdead_beef)));
    }

    #[test]
    fn test_corrupt_address_rejected() {
        let mut address = make_address(&[2; 32], 7);
        address[10] ^= 1;
        assert_eq!(parse_address(&address), None);
    }

    #[test]
    fn test_keys_derived_deterministically() {
        let a = MemoryState::fresh([3; 32], &SessionOptions::default());
        let b = MemoryState::fresh([3; 32], &SessionOptions::default());
        assert_eq!(a.public_key, b.public_key);
        assert_ne!(a.public_key, a.dht_id);
    }

    #[test]
    fn test_save_restore_keeps_identity() {
        let opts = SessionOptions::default();
        let mut state = MemoryState::fresh([4; 32], &opts);
        state.name = b"alice".to_vec();
        state.status = UserStatus::Away;
        state.add_friend_record([9; 32], 0);

        let restored = MemoryState::restore(&state.save(), &opts).ok().unwrap();
        assert_eq!(restored.public_key, state.public_key);
        assert_eq!(restored.nospam, state.nospam);
        assert_eq!(restored.name, b"alice");
        assert_eq!(restored.status, UserStatus::Away);
        assert_eq!(restored.friends.len(), 1);
        assert_eq!(restored.friends[&0].public_key, [9; 32]);
    }

    #[test]
    fn test_restore_rejects_garbage() {
        let opts = SessionOptions::default();
        assert_eq!(
            MemoryState::restore(b"not a save", &opts).err(),
            Some(NewCode::LoadBadFormat.status())
        );
        let mut truncated = SAVE_MAGIC.to_vec();
        truncated.extend_from_slice(b"{\"version\":1");
        assert_eq!(
            MemoryState::restore(&truncated, &opts).err(),
            Some(NewCode::LoadBadFormat.status())
        );
    }

    #[test]
    fn test_restore_rejects_encrypted() {
        assert_eq!(
            MemoryState::restore(b"toxEsave....", &SessionOptions::default()).err(),
            Some(NewCode::LoadEncrypted.status())
        );
    }

    #[test]
    fn test_lowest_free_friend_number() {
        let mut state = MemoryState::fresh([5; 32], &SessionOptions::default());
        assert_eq!(state.add_friend_record([1; 32], 0), 0);
        assert_eq!(state.add_friend_record([2; 32], 0), 1);
        state.friends.remove(&0);
        assert_eq!(state.add_friend_record([3; 32], 0), 0);
    }
}
