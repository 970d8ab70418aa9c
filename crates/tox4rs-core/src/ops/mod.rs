//! The operation surface of [`crate::Tox`].
//!
//! Each submodule adds one `impl` block. Fallible operations return
//! `ToxError<C>` with `C` the operation's own code set; plain getters only
//! fail when the session is closed.

mod custom;
mod file;
mod friend;
mod group;
mod network;
mod self_info;

use crate::error::{ErrorCode, ToxError};

/// Reject `len` above `max` with `code`, noting both in the detail.
pub(crate) fn within<C: ErrorCode>(len: usize, max: usize, code: C) -> Result<(), ToxError<C>> {
    if len > max {
        return Err(ToxError::local(code).with_detail(format!("length {len} exceeds {max}")));
    }
    Ok(())
}

/// Copy `bytes` into a fixed-size key, or fail with `code`.
pub(crate) fn fixed<const N: usize, C: ErrorCode>(
    bytes: &[u8],
    code: C,
) -> Result<[u8; N], ToxError<C>> {
    <[u8; N]>::try_from(bytes).map_err(|_| {
        ToxError::local(code).with_detail(format!("expected {N} bytes, got {}", bytes.len()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codes::{FriendAddCode, SetInfoCode};

    #[test]
    fn test_within_boundary() {
        assert!(within(128, 128, SetInfoCode::TooLong).is_ok());
        let err = within(129, 128, SetInfoCode::TooLong).unwrap_err();
        assert_eq!(err.code(), Some(SetInfoCode::TooLong));
        assert_eq!(err.detail(), Some("length 129 exceeds 128"));
    }

    #[test]
    fn test_fixed_rejects_wrong_length() {
        let key: [u8; 4] = fixed(&[1, 2, 3, 4], FriendAddCode::MalformedAddress).unwrap();
        assert_eq!(key, [1, 2, 3, 4]);
        let err = fixed::<4, _>(&[1, 2, 3], FriendAddCode::MalformedAddress).unwrap_err();
        assert_eq!(err.code(), Some(FriendAddCode::MalformedAddress));
    }
}
