//! Small closed enums shared by events, options and operations.

use serde::{Deserialize, Serialize};

/// Network connection state of self or a friend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connection {
    #[default]
    None,
    Tcp,
    Udp,
}

impl Connection {
    pub fn is_connected(self) -> bool {
        self != Connection::None
    }
}

/// Presence status advertised to friends and group peers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    #[default]
    None,
    Away,
    Busy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    #[default]
    Normal,
    Action,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileControl {
    Resume,
    Pause,
    Cancel,
}

/// Well-known file kinds. Engines may use other values.
pub mod file_kind {
    pub const DATA: u32 = 0;
    pub const AVATAR: u32 = 1;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProxyType {
    #[default]
    None,
    Http,
    Socks5,
}

/// Role of a peer in a group, most to least privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupRole {
    Founder,
    Moderator,
    User,
    Observer,
}

impl GroupRole {
    /// True when `self` strictly outranks `other`.
    pub fn outranks(self, other: GroupRole) -> bool {
        self < other
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupPrivacyState {
    #[default]
    Public,
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupExitType {
    Quit,
    Timeout,
    Disconnected,
    SelfDisconnected,
    Kick,
    SyncError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupJoinFail {
    PeerLimit,
    InvalidPassword,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupModEvent {
    Kick,
    Observer,
    User,
    Moderator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallControl {
    Resume,
    Pause,
    Cancel,
    MuteAudio,
    UnmuteAudio,
    HideVideo,
    ShowVideo,
}

/// Bit set describing the remote side of a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallState(u32);

impl CallState {
    pub const ERROR: CallState = CallState(1);
    pub const FINISHED: CallState = CallState(2);
    pub const SENDING_AUDIO: CallState = CallState(4);
    pub const SENDING_VIDEO: CallState = CallState(8);
    pub const ACCEPTING_AUDIO: CallState = CallState(16);
    pub const ACCEPTING_VIDEO: CallState = CallState(32);

    pub const fn empty() -> Self {
        CallState(0)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, other: CallState) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: CallState) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: CallState) {
        self.0 &= !other.0;
    }

    /// Terminal states end the call on the receiving side.
    pub fn is_terminal(self) -> bool {
        self.contains(Self::ERROR) || self.contains(Self::FINISHED)
    }
}

impl std::ops::BitOr for CallState {
    type Output = CallState;

    fn bitor(self, rhs: CallState) -> CallState {
        CallState(self.0 | rhs.0)
    }
}
