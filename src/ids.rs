//! Identifiers
//!
//! Server-assigned ids arrive as opaque strings. Client-generated ids
//! (placeholders, notes) are random strings over a URL-safe alphabet so
//! independent tabs and devices never need to coordinate.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// 64 URL-safe characters, same alphabet size as nanoid
const URL_SAFE_ALPHABET: &[u8; 64] = b"useandom-26T198340PX75pxJACKVERYMINDBUSHWOLF_GQZbfghjklqvwyzrict";

/// Shortest client-generated id (126 bits of entropy)
pub const MIN_CLIENT_ID_LEN: usize = 21;

/// Random string of `len` URL-safe characters
pub fn random_id(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| URL_SAFE_ALPHABET[rng.gen_range(0..URL_SAFE_ALPHABET.len())] as char)
        .collect()
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self(raw.to_string())
            }
        }
    };
}

string_id!(
    /// Server-assigned item identifier
    ItemId
);

string_id!(
    /// Placeholder identifier, only meaningful inside the client cache
    TempId
);

string_id!(
    /// Note identifier, generated on the client
    NoteId
);

string_id!(
    /// Stable identity of the signed-in user
    UserId
);

impl TempId {
    /// Fresh placeholder id; never shorter than `MIN_CLIENT_ID_LEN`
    pub fn generate(len: usize) -> Self {
        Self(random_id(len.max(MIN_CLIENT_ID_LEN)))
    }
}

impl NoteId {
    pub fn generate() -> Self {
        Self(random_id(MIN_CLIENT_ID_LEN))
    }
}
