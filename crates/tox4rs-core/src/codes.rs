//! Per-operation failure codes.
//!
//! Statuses are the 1-based positions the engine reports. Codes whose status
//! the engine never produces (local shape checks) sit at the end of a set.

use crate::error_codes;

// ============================================================================
// Lifecycle
// ============================================================================

error_codes! {
    /// Session construction.
    NewCode, "new" {
        Null = 1 => "null",
        Malloc = 2 => "malloc",
        PortAlloc = 3 => "port-alloc",
        ProxyBadType = 4 => "proxy-bad-type",
        ProxyBadHost = 5 => "proxy-bad-host",
        ProxyBadPort = 6 => "proxy-bad-port",
        ProxyNotFound = 7 => "proxy-not-found",
        LoadEncrypted = 8 => "load-encrypted",
        LoadBadFormat = 9 => "load-bad-format",
    }
}

// ============================================================================
// Network
// ============================================================================

error_codes! {
    /// `bootstrap` and `add_tcp_relay`.
    BootstrapCode, "bootstrap" {
        Null = 1 => "null",
        BadHost = 2 => "bad-host",
        BadPort = 3 => "bad-port",
        BadPublicKey = 4 => "bad-public-key",
    }
}

error_codes! {
    /// `udp_port` and `tcp_port`.
    GetPortCode, "get-port" {
        NotBound = 1 => "not-bound",
    }
}

// ============================================================================
// Self
// ============================================================================

error_codes! {
    /// `set_name` and `set_status_message`.
    SetInfoCode, "set-info" {
        Null = 1 => "null",
        TooLong = 2 => "too-long",
    }
}

// ============================================================================
// Friends
// ============================================================================

error_codes! {
    /// `add_friend` and `add_friend_norequest`.
    FriendAddCode, "friend-add" {
        Null = 1 => "null",
        TooLong = 2 => "too-long",
        NoMessage = 3 => "no-message",
        OwnKey = 4 => "own-key",
        AlreadySent = 5 => "already-sent",
        BadChecksum = 6 => "bad-checksum",
        SetNewNospam = 7 => "set-new-nospam",
        Malloc = 8 => "malloc",
        /// Address or key of the wrong length.
        MalformedAddress = 9 => "malformed-address",
    }
}

error_codes! {
    FriendDeleteCode, "friend-delete" {
        FriendNotFound = 1 => "friend-not-found",
    }
}

error_codes! {
    FriendByPublicKeyCode, "friend-by-public-key" {
        Null = 1 => "null",
        NotFound = 2 => "not-found",
        MalformedKey = 3 => "malformed-key",
    }
}

error_codes! {
    FriendGetPublicKeyCode, "friend-get-public-key" {
        FriendNotFound = 1 => "friend-not-found",
    }
}

error_codes! {
    FriendGetLastOnlineCode, "friend-get-last-online" {
        FriendNotFound = 1 => "friend-not-found",
    }
}

error_codes! {
    /// Friend name, status message, status, connection and typing getters.
    FriendQueryCode, "friend-query" {
        Null = 1 => "null",
        FriendNotFound = 2 => "friend-not-found",
    }
}

error_codes! {
    SetTypingCode, "set-typing" {
        FriendNotFound = 1 => "friend-not-found",
    }
}

error_codes! {
    FriendSendMessageCode, "friend-send-message" {
        Null = 1 => "null",
        FriendNotFound = 2 => "friend-not-found",
        FriendNotConnected = 3 => "friend-not-connected",
        Sendq = 4 => "sendq",
        TooLong = 5 => "too-long",
        Empty = 6 => "empty",
    }
}

// ============================================================================
// File transfer
// ============================================================================

error_codes! {
    FileControlCode, "file-control" {
        FriendNotFound = 1 => "friend-not-found",
        FriendNotConnected = 2 => "friend-not-connected",
        NotFound = 3 => "not-found",
        NotPaused = 4 => "not-paused",
        Denied = 5 => "denied",
        AlreadyPaused = 6 => "already-paused",
        Sendq = 7 => "sendq",
    }
}

error_codes! {
    FileSeekCode, "file-seek" {
        FriendNotFound = 1 => "friend-not-found",
        FriendNotConnected = 2 => "friend-not-connected",
        NotFound = 3 => "not-found",
        Denied = 4 => "denied",
        InvalidPosition = 5 => "invalid-position",
        Sendq = 6 => "sendq",
    }
}

error_codes! {
    FileGetCode, "file-get" {
        Null = 1 => "null",
        FriendNotFound = 2 => "friend-not-found",
        NotFound = 3 => "not-found",
    }
}

error_codes! {
    FileSendCode, "file-send" {
        Null = 1 => "null",
        FriendNotFound = 2 => "friend-not-found",
        FriendNotConnected = 3 => "friend-not-connected",
        NameTooLong = 4 => "name-too-long",
        TooMany = 5 => "too-many",
    }
}

error_codes! {
    FileSendChunkCode, "file-send-chunk" {
        Null = 1 => "null",
        FriendNotFound = 2 => "friend-not-found",
        FriendNotConnected = 3 => "friend-not-connected",
        NotFound = 4 => "not-found",
        NotTransferring = 5 => "not-transferring",
        InvalidLength = 6 => "invalid-length",
        Sendq = 7 => "sendq",
        WrongPosition = 8 => "wrong-position",
    }
}

// ============================================================================
// Custom packets
// ============================================================================

error_codes! {
    /// `send_lossy_packet` and `send_lossless_packet`.
    FriendCustomPacketCode, "friend-custom-packet" {
        Null = 1 => "null",
        FriendNotFound = 2 => "friend-not-found",
        FriendNotConnected = 3 => "friend-not-connected",
        Invalid = 4 => "invalid",
        Empty = 5 => "empty",
        TooLong = 6 => "too-long",
        Sendq = 7 => "sendq",
    }
}

// ============================================================================
// Groups
// ============================================================================

error_codes! {
    GroupNewCode, "group-new" {
        TooLong = 1 => "too-long",
        Empty = 2 => "empty",
        Init = 3 => "init",
        State = 4 => "state",
        Announce = 5 => "announce",
    }
}

error_codes! {
    GroupJoinCode, "group-join" {
        Init = 1 => "init",
        BadChatId = 2 => "bad-chat-id",
        Empty = 3 => "empty",
        TooLong = 4 => "too-long",
        Password = 5 => "password",
        Core = 6 => "core",
    }
}

error_codes! {
    GroupReconnectCode, "group-reconnect" {
        GroupNotFound = 1 => "group-not-found",
        Core = 2 => "core",
    }
}

error_codes! {
    GroupLeaveCode, "group-leave" {
        GroupNotFound = 1 => "group-not-found",
        TooLong = 2 => "too-long",
        FailSend = 3 => "fail-send",
    }
}

error_codes! {
    /// Own name, status, role and peer id within a group.
    GroupSelfQueryCode, "group-self-query" {
        GroupNotFound = 1 => "group-not-found",
    }
}

error_codes! {
    GroupSelfNameSetCode, "group-self-name-set" {
        GroupNotFound = 1 => "group-not-found",
        TooLong = 2 => "too-long",
        Invalid = 3 => "invalid",
        FailSend = 4 => "fail-send",
    }
}

error_codes! {
    GroupSelfStatusSetCode, "group-self-status-set" {
        GroupNotFound = 1 => "group-not-found",
        FailSend = 2 => "fail-send",
    }
}

error_codes! {
    /// Another peer's name, status and role.
    GroupPeerQueryCode, "group-peer-query" {
        GroupNotFound = 1 => "group-not-found",
        PeerNotFound = 2 => "peer-not-found",
    }
}

error_codes! {
    /// Topic, name, chat id, peer count, privacy state, peer limit, password.
    GroupStateQueryCode, "group-state-query" {
        GroupNotFound = 1 => "group-not-found",
    }
}

error_codes! {
    GroupTopicSetCode, "group-topic-set" {
        GroupNotFound = 1 => "group-not-found",
        TooLong = 2 => "too-long",
        Permissions = 3 => "permissions",
        FailCreate = 4 => "fail-create",
        FailSend = 5 => "fail-send",
        Disconnected = 6 => "disconnected",
    }
}

error_codes! {
    GroupSendMessageCode, "group-send-message" {
        GroupNotFound = 1 => "group-not-found",
        TooLong = 2 => "too-long",
        Empty = 3 => "empty",
        BadType = 4 => "bad-type",
        Permissions = 5 => "permissions",
        FailSend = 6 => "fail-send",
        Disconnected = 7 => "disconnected",
    }
}

error_codes! {
    GroupSendPrivateMessageCode, "group-send-private-message" {
        GroupNotFound = 1 => "group-not-found",
        PeerNotFound = 2 => "peer-not-found",
        TooLong = 3 => "too-long",
        Empty = 4 => "empty",
        BadType = 5 => "bad-type",
        Permissions = 6 => "permissions",
        FailSend = 7 => "fail-send",
        Disconnected = 8 => "disconnected",
    }
}

error_codes! {
    GroupInviteFriendCode, "group-invite-friend" {
        GroupNotFound = 1 => "group-not-found",
        FriendNotFound = 2 => "friend-not-found",
        InviteFail = 3 => "invite-fail",
        FailSend = 4 => "fail-send",
        Disconnected = 5 => "disconnected",
    }
}

error_codes! {
    GroupInviteAcceptCode, "group-invite-accept" {
        BadInvite = 1 => "bad-invite",
        InitFailed = 2 => "init-failed",
        TooLong = 3 => "too-long",
        Empty = 4 => "empty",
        Password = 5 => "password",
        FriendNotFound = 6 => "friend-not-found",
        FailSend = 7 => "fail-send",
    }
}

error_codes! {
    GroupFounderSetPasswordCode, "group-founder-set-password" {
        GroupNotFound = 1 => "group-not-found",
        Permissions = 2 => "permissions",
        TooLong = 3 => "too-long",
        FailSend = 4 => "fail-send",
        Malloc = 5 => "malloc",
        Disconnected = 6 => "disconnected",
    }
}

error_codes! {
    GroupFounderSetPrivacyStateCode, "group-founder-set-privacy-state" {
        GroupNotFound = 1 => "group-not-found",
        Permissions = 2 => "permissions",
        FailSet = 3 => "fail-set",
        FailSend = 4 => "fail-send",
        Disconnected = 5 => "disconnected",
    }
}

error_codes! {
    GroupFounderSetPeerLimitCode, "group-founder-set-peer-limit" {
        GroupNotFound = 1 => "group-not-found",
        Permissions = 2 => "permissions",
        FailSet = 3 => "fail-set",
        FailSend = 4 => "fail-send",
        Disconnected = 5 => "disconnected",
    }
}

error_codes! {
    GroupToggleIgnoreCode, "group-toggle-ignore" {
        GroupNotFound = 1 => "group-not-found",
        PeerNotFound = 2 => "peer-not-found",
        SelfTarget = 3 => "self",
    }
}

error_codes! {
    GroupModSetRoleCode, "group-mod-set-role" {
        GroupNotFound = 1 => "group-not-found",
        PeerNotFound = 2 => "peer-not-found",
        Permissions = 3 => "permissions",
        Assignment = 4 => "assignment",
        FailAction = 5 => "fail-action",
        SelfTarget = 6 => "self",
    }
}

error_codes! {
    /// Kick, optionally with a ban.
    GroupModRemovePeerCode, "group-mod-remove-peer" {
        GroupNotFound = 1 => "group-not-found",
        PeerNotFound = 2 => "peer-not-found",
        Permissions = 3 => "permissions",
        FailAction = 4 => "fail-action",
        FailSend = 5 => "fail-send",
        SelfTarget = 6 => "self",
    }
}

error_codes! {
    GroupModRemoveBanCode, "group-mod-remove-ban" {
        GroupNotFound = 1 => "group-not-found",
        Permissions = 2 => "permissions",
        FailAction = 3 => "fail-action",
        FailSend = 4 => "fail-send",
    }
}

error_codes! {
    /// Ban list and ban entry lookups.
    GroupBanQueryCode, "group-ban-query" {
        GroupNotFound = 1 => "group-not-found",
        BadId = 2 => "bad-id",
    }
}

// ============================================================================
// AV
// ============================================================================

error_codes! {
    AvNewCode, "av-new" {
        Null = 1 => "null",
        Malloc = 2 => "malloc",
        Multiple = 3 => "multiple",
    }
}

error_codes! {
    CallCode, "call" {
        Malloc = 1 => "malloc",
        Sync = 2 => "sync",
        FriendNotFound = 3 => "friend-not-found",
        FriendNotConnected = 4 => "friend-not-connected",
        FriendAlreadyInCall = 5 => "friend-already-in-call",
        InvalidBitRate = 6 => "invalid-bit-rate",
    }
}

error_codes! {
    AnswerCode, "answer" {
        Sync = 1 => "sync",
        CodecInitialization = 2 => "codec-initialization",
        FriendNotFound = 3 => "friend-not-found",
        FriendNotCalling = 4 => "friend-not-calling",
        InvalidBitRate = 5 => "invalid-bit-rate",
    }
}

error_codes! {
    CallControlCode, "call-control" {
        Sync = 1 => "sync",
        FriendNotFound = 2 => "friend-not-found",
        FriendNotInCall = 3 => "friend-not-in-call",
        InvalidTransition = 4 => "invalid-transition",
    }
}

error_codes! {
    /// `set_audio_bit_rate` and `set_video_bit_rate`.
    BitRateSetCode, "bit-rate-set" {
        Sync = 1 => "sync",
        InvalidBitRate = 2 => "invalid-bit-rate",
        FriendNotFound = 3 => "friend-not-found",
        FriendNotInCall = 4 => "friend-not-in-call",
    }
}

error_codes! {
    /// `send_audio_frame` and `send_video_frame`.
    SendFrameCode, "send-frame" {
        Null = 1 => "null",
        FriendNotFound = 2 => "friend-not-found",
        FriendNotInCall = 3 => "friend-not-in-call",
        Sync = 4 => "sync",
        Invalid = 5 => "invalid",
        PayloadTypeDisabled = 6 => "payload-type-disabled",
        RtpFailed = 7 => "rtp-failed",
    }
}
