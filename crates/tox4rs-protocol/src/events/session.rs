//! Session event records.

use serde::{Deserialize, Serialize};

use super::event_records;
use crate::enums::{
    Connection, FileControl, GroupExitType, GroupJoinFail, GroupModEvent, GroupPrivacyState,
    MessageType, UserStatus,
};
use crate::{FileNumber, FriendNumber, GroupNumber, PeerId, PublicKey};

event_records! {
    /// One record of a session event batch.
    CoreEvent / EventCategory {
        SelfConnectionStatus,
        FriendName,
        FriendStatusMessage,
        FriendStatus,
        FriendConnectionStatus,
        FriendTyping,
        FriendReadReceipt,
        FriendRequest,
        FriendMessage,
        FileRecvControl,
        FileChunkRequest,
        FileRecv,
        FileRecvChunk,
        FriendLossyPacket,
        FriendLosslessPacket,
        GroupInvite,
        GroupMessage,
        GroupPrivateMessage,
        GroupAction,
        GroupNickChange,
        GroupTopicChange,
        GroupPeerJoin,
        GroupPeerExit,
        GroupSelfJoin,
        GroupPeerlistUpdate,
        GroupJoinRejected,
        GroupPeerStatus,
        GroupPrivacyStateChange,
        GroupPeerLimit,
        GroupPassword,
        GroupModeration,
    }
}

// ============================================================================
// Self
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelfConnectionStatus {
    pub connection_status: Connection,
}

// ============================================================================
// Friends
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendName {
    pub friend_number: FriendNumber,
    #[serde(with = "crate::base64_bytes")]
    pub name: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendStatusMessage {
    pub friend_number: FriendNumber,
    #[serde(with = "crate::base64_bytes")]
    pub message: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendStatus {
    pub friend_number: FriendNumber,
    pub status: UserStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendConnectionStatus {
    pub friend_number: FriendNumber,
    pub connection_status: Connection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendTyping {
    pub friend_number: FriendNumber,
    pub is_typing: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendReadReceipt {
    pub friend_number: FriendNumber,
    pub message_id: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendRequest {
    #[serde(with = "crate::hex_key")]
    pub public_key: PublicKey,
    #[serde(with = "crate::base64_bytes")]
    pub message: Vec<u8>,
    /// Age of the message when it reached us, in milliseconds.
    #[serde(default)]
    pub time_delta: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendMessage {
    pub friend_number: FriendNumber,
    #[serde(default)]
    pub message_type: MessageType,
    #[serde(with = "crate::base64_bytes")]
    pub message: Vec<u8>,
    /// Age of the message when it reached us, in milliseconds.
    #[serde(default)]
    pub time_delta: u32,
}

// ============================================================================
// File transfer
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecvControl {
    pub friend_number: FriendNumber,
    pub file_number: FileNumber,
    pub control: FileControl,
}

/// The peer wants `length` bytes starting at `position`. Zero length means the
/// transfer is complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChunkRequest {
    pub friend_number: FriendNumber,
    pub file_number: FileNumber,
    pub position: u64,
    pub length: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecv {
    pub friend_number: FriendNumber,
    pub file_number: FileNumber,
    pub kind: u32,
    pub file_size: u64,
    #[serde(with = "crate::base64_bytes")]
    pub filename: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecvChunk {
    pub friend_number: FriendNumber,
    pub file_number: FileNumber,
    pub position: u64,
    #[serde(with = "crate::base64_bytes")]
    pub data: Vec<u8>,
}

// ============================================================================
// Custom packets
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendLossyPacket {
    pub friend_number: FriendNumber,
    #[serde(with = "crate::base64_bytes")]
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendLosslessPacket {
    pub friend_number: FriendNumber,
    #[serde(with = "crate::base64_bytes")]
    pub data: Vec<u8>,
}

// ============================================================================
// Groups
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupInvite {
    pub friend_number: FriendNumber,
    /// Opaque; hand back to `group_accept_invite` unchanged.
    #[serde(with = "crate::base64_bytes")]
    pub invite_data: Vec<u8>,
    #[serde(with = "crate::base64_bytes")]
    pub group_name: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMessage {
    pub group_number: GroupNumber,
    pub peer_id: PeerId,
    #[serde(with = "crate::base64_bytes")]
    pub message: Vec<u8>,
    pub message_id: u32,
    #[serde(default)]
    pub time_delta: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupPrivateMessage {
    pub group_number: GroupNumber,
    pub peer_id: PeerId,
    #[serde(default)]
    pub message_type: MessageType,
    #[serde(with = "crate::base64_bytes")]
    pub message: Vec<u8>,
    #[serde(default)]
    pub time_delta: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupAction {
    pub group_number: GroupNumber,
    pub peer_id: PeerId,
    #[serde(with = "crate::base64_bytes")]
    pub action: Vec<u8>,
    pub message_id: u32,
    #[serde(default)]
    pub time_delta: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupNickChange {
    pub group_number: GroupNumber,
    pub peer_id: PeerId,
    #[serde(with = "crate::base64_bytes")]
    pub name: Vec<u8>,
}

/// `peer_id` is the setter; topics set before we joined arrive with our own id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupTopicChange {
    pub group_number: GroupNumber,
    pub peer_id: PeerId,
    #[serde(with = "crate::base64_bytes")]
    pub topic: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupPeerJoin {
    pub group_number: GroupNumber,
    pub peer_id: PeerId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupPeerExit {
    pub group_number: GroupNumber,
    pub peer_id: PeerId,
    pub exit_type: GroupExitType,
    #[serde(with = "crate::base64_bytes")]
    pub name: Vec<u8>,
    #[serde(with = "crate::base64_bytes")]
    pub part_message: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSelfJoin {
    pub group_number: GroupNumber,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupPeerlistUpdate {
    pub group_number: GroupNumber,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupJoinRejected {
    pub group_number: GroupNumber,
    pub reason: GroupJoinFail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupPeerStatus {
    pub group_number: GroupNumber,
    pub peer_id: PeerId,
    pub status: UserStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupPrivacyStateChange {
    pub group_number: GroupNumber,
    pub privacy_state: GroupPrivacyState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupPeerLimit {
    pub group_number: GroupNumber,
    pub peer_limit: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupPassword {
    pub group_number: GroupNumber,
    #[serde(with = "crate::base64_bytes")]
    pub password: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupModeration {
    pub group_number: GroupNumber,
    pub source_peer_id: PeerId,
    pub target_peer_id: PeerId,
    pub event: GroupModEvent,
}
