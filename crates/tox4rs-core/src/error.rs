//! Error taxonomy.
//!
//! Every operation has its own closed code enum (see [`crate::codes`]). An
//! operation fails with exactly one of:
//!
//! - `ToxError::Closed` -- the instance was closed; supersedes every code.
//! - `ToxError::Code` -- one code from the operation's own set.
//! - `ToxError::Fatal` -- the engine broke its contract (undocumented status,
//!   undecodable batch). Not a user-facing error; callers should stop.

use std::fmt;
use std::hash::Hash;

use tox4rs_protocol::DecodeError;

/// A closed set of failure codes belonging to one operation.
///
/// Engines report failures as the code's numeric status. Status 0 is success
/// and never maps to a code.
pub trait ErrorCode:
    Copy + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    /// Name of the operation family the codes belong to.
    const OPERATION: &'static str;

    fn from_status(status: u32) -> Option<Self>;

    fn status(self) -> u32;

    /// Kebab-case code name.
    fn name(self) -> &'static str;

    fn all() -> &'static [Self];
}

#[derive(Debug, thiserror::Error)]
pub enum ToxError<C: ErrorCode> {
    #[error("instance is closed")]
    Closed,
    #[error("{op} failed: {code}", op = C::OPERATION)]
    Code { code: C, detail: Option<String> },
    #[error(transparent)]
    Fatal(#[from] ContractViolation),
}

impl<C: ErrorCode> ToxError<C> {
    /// A failure decided before reaching the engine.
    pub fn local(code: C) -> Self {
        tracing::debug!(operation = C::OPERATION, code = code.name(), "rejected locally");
        ToxError::Code { code, detail: None }
    }

    /// Translate an engine status into this operation's code set.
    pub fn from_status(status: u32) -> Self {
        match C::from_status(status) {
            Some(code) => ToxError::Code { code, detail: None },
            None => {
                tracing::error!(
                    operation = C::OPERATION,
                    status,
                    "engine returned a status outside the operation's code set"
                );
                ToxError::Fatal(ContractViolation::UnknownStatus {
                    operation: C::OPERATION,
                    status,
                })
            }
        }
    }

    pub fn with_detail(self, detail: impl Into<String>) -> Self {
        match self {
            ToxError::Code { code, .. } => ToxError::Code {
                code,
                detail: Some(detail.into()),
            },
            other => other,
        }
    }

    pub fn code(&self) -> Option<C> {
        match self {
            ToxError::Code { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            ToxError::Code { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, ToxError::Closed)
    }

    pub fn is_fatal(&self) -> bool {
        matches!(self, ToxError::Fatal(_))
    }
}

/// The engine and this layer disagree; continuing would act on bad data.
#[derive(Debug, thiserror::Error)]
pub enum ContractViolation {
    #[error("{operation}: engine returned undocumented status {status}")]
    UnknownStatus {
        operation: &'static str,
        status: u32,
    },
    #[error("event batch rejected: {0}")]
    Decode(#[from] DecodeError),
}

/// The instance was closed. Returned by operations that have no failure codes
/// of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("instance is closed")]
pub struct Closed;

impl<C: ErrorCode> From<Closed> for ToxError<C> {
    fn from(_: Closed) -> Self {
        ToxError::Closed
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PollError {
    #[error("instance is closed")]
    Closed,
    #[error(transparent)]
    Fatal(#[from] ContractViolation),
}

impl From<Closed> for PollError {
    fn from(_: Closed) -> Self {
        PollError::Closed
    }
}

/// Engine call result: a value, or the operation's numeric status.
pub type Status<T> = std::result::Result<T, u32>;

pub(crate) trait StatusExt<T> {
    /// Map a failing status into the caller's code set.
    fn mapped<C: ErrorCode>(self) -> Result<T, ToxError<C>>;
}

impl<T> StatusExt<T> for Status<T> {
    fn mapped<C: ErrorCode>(self) -> Result<T, ToxError<C>> {
        self.map_err(ToxError::from_status)
    }
}

/// Fail locally with `code` unless `condition` holds.
pub(crate) fn ensure<C: ErrorCode>(condition: bool, code: C) -> Result<(), ToxError<C>> {
    if condition {
        Ok(())
    } else {
        Err(ToxError::local(code))
    }
}

/// Declares one operation's closed code set.
///
/// ```ignore
/// error_codes! {
///     /// Codes for `set_name` and `set_status_message`.
///     SetInfoCode, "set-info" {
///         Null = 1 => "null",
///         TooLong = 2 => "too-long",
///     }
/// }
/// ```
#[macro_export]
macro_rules! error_codes {
    (
        $(#[$meta:meta])*
        $name:ident, $operation:literal {
            $($(#[$vmeta:meta])* $variant:ident = $status:literal => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(rename_all = "kebab-case")]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $crate::error::ErrorCode for $name {
            const OPERATION: &'static str = $operation;

            fn from_status(status: u32) -> Option<Self> {
                match status {
                    $($status => Some($name::$variant),)+
                    _ => None,
                }
            }

            fn status(self) -> u32 {
                match self {
                    $($name::$variant => $status),+
                }
            }

            fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            fn all() -> &'static [Self] {
                &[$($name::$variant),+]
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str($crate::error::ErrorCode::name(*self))
            }
        }
    };
}
