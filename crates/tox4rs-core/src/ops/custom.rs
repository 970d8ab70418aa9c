//! Application-defined packets. The first byte selects the packet id and
//! must fall in the range for the chosen delivery mode.

use tox4rs_protocol::{FriendNumber, CURRENT_LIMITS, MAX_CUSTOM_PACKET_SIZE};

use super::within;
use crate::codes::FriendCustomPacketCode;
use crate::engine::CoreEngine;
use crate::error::{ensure, StatusExt, ToxError};
use crate::session::Tox;

fn check_packet(data: &[u8], id_ok: fn(u8) -> bool) -> Result<(), ToxError<FriendCustomPacketCode>> {
    let Some(&first) = data.first() else {
        return Err(ToxError::local(FriendCustomPacketCode::Empty));
    };
    within(data.len(), MAX_CUSTOM_PACKET_SIZE, FriendCustomPacketCode::TooLong)?;
    ensure(id_ok(first), FriendCustomPacketCode::Invalid)
}

impl<E: CoreEngine> Tox<E> {
    /// Unreliable, unordered delivery.
    pub fn send_lossy_packet(
        &self,
        friend: FriendNumber,
        data: &[u8],
    ) -> Result<(), ToxError<FriendCustomPacketCode>> {
        self.invoke(|engine| {
            check_packet(data, |id| CURRENT_LIMITS.is_lossy_packet_id(id))?;
            engine.friend_send_lossy_packet(friend, data).mapped()
        })
    }

    /// Reliable, ordered delivery.
    pub fn send_lossless_packet(
        &self,
        friend: FriendNumber,
        data: &[u8],
    ) -> Result<(), ToxError<FriendCustomPacketCode>> {
        self.invoke(|engine| {
            check_packet(data, |id| CURRENT_LIMITS.is_lossless_packet_id(id))?;
            engine.friend_send_lossless_packet(friend, data).mapped()
        })
    }
}
