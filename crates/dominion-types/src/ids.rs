//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Every runtime entity the engine tracks has a strongly-typed ID so that a
//! settlement can never be passed where a structure is expected. All IDs use
//! UUID v7 (time-ordered), which keeps `BTreeMap` iteration roughly in
//! creation order.
//!
//! Static content (structure and district definitions) is keyed by
//! `snake_case` strings instead; see [`crate::structs`].

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS,
        )]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a dominion (the owning political entity).
    DominionId
}

define_id! {
    /// Unique identifier for a settlement owned by a dominion.
    SettlementId
}

define_id! {
    /// Unique identifier for a structure built inside a settlement.
    StructureId
}

define_id! {
    /// Unique identifier for an importer (a trade link delivering a resource).
    ImporterId
}
