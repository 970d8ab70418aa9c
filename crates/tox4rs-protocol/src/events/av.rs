//! AV event records: call signalling and received media frames.

use serde::{Deserialize, Serialize};

use super::event_records;
use crate::enums::CallState;
use crate::FriendNumber;

event_records! {
    /// One record of an AV event batch.
    AvEvent / AvEventCategory {
        Call,
        CallStateChange,
        AudioBitRate,
        VideoBitRate,
        AudioReceiveFrame,
        VideoReceiveFrame,
    }
}

/// Incoming call request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    pub friend_number: FriendNumber,
    pub audio_enabled: bool,
    pub video_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallStateChange {
    pub friend_number: FriendNumber,
    pub state: CallState,
}

/// Bit rate suggestion from the engine's congestion control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioBitRate {
    pub friend_number: FriendNumber,
    pub audio_bit_rate: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoBitRate {
    pub friend_number: FriendNumber,
    pub video_bit_rate: u32,
}

/// Interleaved PCM: `pcm.len() == sample_count * channels`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioReceiveFrame {
    pub friend_number: FriendNumber,
    pub pcm: Vec<i16>,
    pub channels: u8,
    pub sampling_rate: u32,
}

impl AudioReceiveFrame {
    pub fn sample_count(&self) -> usize {
        if self.channels == 0 {
            0
        } else {
            self.pcm.len() / self.channels as usize
        }
    }
}

/// Planar YUV420 frame. Planes are tightly packed; `u` and `v` are
/// quarter-size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoReceiveFrame {
    pub friend_number: FriendNumber,
    pub width: u16,
    pub height: u16,
    #[serde(with = "crate::base64_bytes")]
    pub y: Vec<u8>,
    #[serde(with = "crate::base64_bytes")]
    pub u: Vec<u8>,
    #[serde(with = "crate::base64_bytes")]
    pub v: Vec<u8>,
}
