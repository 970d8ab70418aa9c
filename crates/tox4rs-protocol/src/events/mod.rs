//! Typed event records.
//!
//! Every record belongs to exactly one category. A category is the key of a
//! callback slot, so each record enum comes with a fieldless category enum and
//! each payload struct knows its own category through [`TypedEvent`].

use std::fmt::Debug;
use std::hash::Hash;

use serde::de::DeserializeOwned;
use serde::Serialize;

pub mod av;
pub mod session;

pub use self::av::{AvEvent, AvEventCategory};
pub use self::session::{CoreEvent, EventCategory};

/// A category-tagged event record carried in an event batch.
pub trait EventRecord: Serialize + DeserializeOwned + Debug + Send + Sync + 'static {
    type Category: Copy + Eq + Hash + Debug + Send + Sync + 'static;

    fn category(&self) -> Self::Category;
}

/// A payload struct that is the body of exactly one category of `Ev`.
pub trait TypedEvent<Ev: EventRecord>: Sized + 'static {
    const CATEGORY: Ev::Category;

    /// Borrow the payload out of a record, if the record is of this category.
    fn project(record: &Ev) -> Option<&Self>;
}

/// Declares a record enum, its category enum, and the per-payload glue.
macro_rules! event_records {
    (
        $(#[$meta:meta])*
        $record:ident / $category:ident {
            $($variant:ident),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
        #[serde(tag = "category", content = "fields", rename_all = "snake_case")]
        pub enum $record {
            $($variant($variant)),+
        }

        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
        )]
        #[serde(rename_all = "snake_case")]
        pub enum $category {
            $($variant),+
        }

        impl $category {
            pub const ALL: &'static [$category] = &[$($category::$variant),+];
        }

        impl $crate::events::EventRecord for $record {
            type Category = $category;

            fn category(&self) -> $category {
                match self {
                    $($record::$variant(_) => $category::$variant),+
                }
            }
        }

        $(
            impl $crate::events::TypedEvent<$record> for $variant {
                const CATEGORY: $category = $category::$variant;

                fn project(record: &$record) -> Option<&Self> {
                    match record {
                        $record::$variant(payload) => Some(payload),
                        #[allow(unreachable_patterns)]
                        _ => None,
                    }
                }
            }

            impl From<$variant> for $record {
                fn from(payload: $variant) -> Self {
                    $record::$variant(payload)
                }
            }
        )+
    };
}

pub(crate) use event_records;
