//! Protocol limits -- the sizes and ranges the engine and the session layer
//! agree on.
//!
//! The session layer validates inputs against these values before any engine
//! call. A new engine revision that changes a limit gets a new constant here;
//! `CURRENT_LIMITS` names the one in force.

/// A named, versioned set of protocol size limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolLimits {
    /// Revision identifier. Monotonically increasing.
    pub revision: u16,

    // -- Identity --
    pub public_key_size: usize,
    pub secret_key_size: usize,
    pub nospam_size: usize,
    pub checksum_size: usize,
    /// public key + nospam + checksum.
    pub address_size: usize,

    // -- Self and friend text --
    pub max_name_length: usize,
    pub max_status_message_length: usize,
    pub max_friend_request_length: usize,
    pub max_message_length: usize,
    pub max_hostname_length: usize,

    // -- Custom packets --
    pub max_custom_packet_size: usize,
    /// Inclusive first-byte range reserved for lossy custom packets.
    pub lossy_packet_range: (u8, u8),
    /// Inclusive first-byte range reserved for lossless custom packets.
    pub lossless_packet_range: (u8, u8),

    // -- File transfer --
    pub file_id_length: usize,
    pub max_filename_length: usize,
    pub max_file_chunk: usize,

    // -- Groups --
    pub group_chat_id_size: usize,
    pub max_group_topic_length: usize,
    pub max_group_part_length: usize,
    pub max_group_name_length: usize,
    pub max_group_password_size: usize,

    // -- AV --
    /// Inclusive audio bit rate range in kbit/s. Zero disables audio.
    pub audio_bit_rate_range: (u32, u32),
    pub audio_sampling_rates: [u32; 5],
    pub max_audio_channels: u8,
}

/// Revision 0: the limits in force at launch.
pub const LIMITS_0: ProtocolLimits = ProtocolLimits {
    revision: 0,

    public_key_size: 32,
    secret_key_size: 32,
    nospam_size: 4,
    checksum_size: 2,
    address_size: 38,

    max_name_length: 128,
    max_status_message_length: 1007,
    max_friend_request_length: 1016,
    max_message_length: 1372,
    max_hostname_length: 255,

    max_custom_packet_size: 1373,
    lossy_packet_range: (200, 254),
    lossless_packet_range: (160, 191),

    file_id_length: 32,
    max_filename_length: 255,
    max_file_chunk: 1371,

    group_chat_id_size: 32,
    max_group_topic_length: 512,
    max_group_part_length: 128,
    max_group_name_length: 48,
    max_group_password_size: 32,

    audio_bit_rate_range: (6, 510),
    audio_sampling_rates: [8_000, 12_000, 16_000, 24_000, 48_000],
    max_audio_channels: 2,
};

/// The limits currently in force.
pub const CURRENT_LIMITS: ProtocolLimits = LIMITS_0;

impl ProtocolLimits {
    /// Whether `first_byte` may start a lossy custom packet.
    pub fn is_lossy_packet_id(&self, first_byte: u8) -> bool {
        let (lo, hi) = self.lossy_packet_range;
        (lo..=hi).contains(&first_byte)
    }

    /// Whether `first_byte` may start a lossless custom packet.
    pub fn is_lossless_packet_id(&self, first_byte: u8) -> bool {
        let (lo, hi) = self.lossless_packet_range;
        (lo..=hi).contains(&first_byte)
    }

    /// Zero disables audio; anything else must sit in the allowed range.
    pub fn is_valid_audio_bit_rate(&self, bit_rate: u32) -> bool {
        let (lo, hi) = self.audio_bit_rate_range;
        bit_rate == 0 || (lo..=hi).contains(&bit_rate)
    }

    pub fn is_valid_sampling_rate(&self, sampling_rate: u32) -> bool {
        self.audio_sampling_rates.contains(&sampling_rate)
    }
}
