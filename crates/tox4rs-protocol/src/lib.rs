//! tox4rs protocol -- event records, protocol limits, event-batch codec.
//!
//! One poll of the engine yields one event batch. A batch is a small header
//! (magic, version, record count) followed by records framed with a 4-byte
//! big-endian length prefix + serde JSON.

pub mod codec;
pub mod enums;
pub mod events;
pub mod limits;

pub use codec::{decode_batch, encode_batch, EventBatch, RecordCodec};
pub use enums::*;
pub use events::{AvEvent, AvEventCategory, CoreEvent, EventCategory, EventRecord, TypedEvent};
pub use limits::{ProtocolLimits, CURRENT_LIMITS, LIMITS_0};

/// Event batch magic number: 0x70C5_EB47
pub const BATCH_MAGIC: u32 = 0x70C5_EB47;

/// Event batch encoding version understood by this decoder.
pub const BATCH_VERSION: u16 = 1;

/// Long-term public key size in bytes.
pub const PUBLIC_KEY_SIZE: usize = CURRENT_LIMITS.public_key_size;

/// Long-term secret key size in bytes.
pub const SECRET_KEY_SIZE: usize = CURRENT_LIMITS.secret_key_size;

/// Friend address size: public key + nospam + checksum.
pub const ADDRESS_SIZE: usize = CURRENT_LIMITS.address_size;

pub const MAX_NAME_LENGTH: usize = CURRENT_LIMITS.max_name_length;
pub const MAX_STATUS_MESSAGE_LENGTH: usize = CURRENT_LIMITS.max_status_message_length;
pub const MAX_FRIEND_REQUEST_LENGTH: usize = CURRENT_LIMITS.max_friend_request_length;
pub const MAX_MESSAGE_LENGTH: usize = CURRENT_LIMITS.max_message_length;
pub const MAX_CUSTOM_PACKET_SIZE: usize = CURRENT_LIMITS.max_custom_packet_size;
pub const MAX_HOSTNAME_LENGTH: usize = CURRENT_LIMITS.max_hostname_length;
pub const FILE_ID_LENGTH: usize = CURRENT_LIMITS.file_id_length;
pub const MAX_FILENAME_LENGTH: usize = CURRENT_LIMITS.max_filename_length;

/// Largest payload a single file chunk may carry.
pub const MAX_FILE_CHUNK: usize = CURRENT_LIMITS.max_file_chunk;

pub const GROUP_CHAT_ID_SIZE: usize = CURRENT_LIMITS.group_chat_id_size;
pub const MAX_GROUP_TOPIC_LENGTH: usize = CURRENT_LIMITS.max_group_topic_length;
pub const MAX_GROUP_PART_LENGTH: usize = CURRENT_LIMITS.max_group_part_length;
pub const MAX_GROUP_NAME_LENGTH: usize = CURRENT_LIMITS.max_group_name_length;
pub const MAX_GROUP_PASSWORD_SIZE: usize = CURRENT_LIMITS.max_group_password_size;

pub type PublicKey = [u8; PUBLIC_KEY_SIZE];
pub type SecretKey = [u8; SECRET_KEY_SIZE];
pub type Address = [u8; ADDRESS_SIZE];
pub type FileId = [u8; FILE_ID_LENGTH];
pub type ChatId = [u8; GROUP_CHAT_ID_SIZE];

/// Friend, file, group and peer numbers are small indices owned by the engine.
pub type FriendNumber = u32;
pub type FileNumber = u32;
pub type GroupNumber = u32;
pub type PeerId = u32;

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid magic: expected {expected:#010x}, got {got:#010x}")]
    InvalidMagic { expected: u32, got: u32 },
    #[error("version mismatch: batch is v{got}, decoder understands v{supported}")]
    VersionMismatch { got: u16, supported: u16 },
    #[error("truncated batch: {context} needs {needed} bytes, {available} available")]
    Truncated {
        context: &'static str,
        needed: usize,
        available: usize,
    },
    #[error("record too large: {size} bytes (max {max})")]
    RecordTooLarge { size: usize, max: usize },
    #[error("record count mismatch: header declares {declared}, found {found}")]
    CountMismatch { declared: usize, found: usize },
    #[error("{remaining} trailing bytes after last record")]
    TrailingBytes { remaining: usize },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Serde helper: `Vec<u8>` as a base64 string.
pub(crate) mod base64_bytes {
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

/// Serde helper: 32-byte keys as lowercase hex.
pub(crate) mod hex_key {
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
