//! Little-endian byte codec shared by every scalar encoding.
#[cfg(test)]
mod helpers;
mod serialize;

pub use crate::error::ParseResult;
#[cfg(test)]
pub use self::helpers::serialize_deserialize;
pub use self::serialize::*;

// Reexport for ease of use.
pub use byteorder::{ReadBytesExt, WriteBytesExt};

/// Derive macro to derive [serde::Deserialize] instances.
pub use serde::Deserialize as SerdeDeserialize;
/// Derive macro to derive [serde::Serialize] instances.
pub use serde::Serialize as SerdeSerialize;
