//! Settings of an [AbiSerializer](crate::AbiSerializer).
use crate::{
    common::*,
    constants::{DEFAULT_KEY_PREFIX, DEFAULT_MAX_DEPTH},
    types::TimeUnit,
};
use anyhow::Context;
use std::path::Path;

/// Codec settings. In JSON the field names are camelCase and every field is
/// optional, e.g.,
///
/// ```json
/// { "publicKeyPrefix": "EOS", "timePointUnit": "microseconds" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, SerdeSerialize, SerdeDeserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SerializerConfig {
    /// Prefix of legacy public keys, both accepted when packing and used when
    /// unpacking.
    pub public_key_prefix: String,
    /// Length of a `time_point` tick.
    pub time_point_unit:   TimeUnit,
    /// Maximal struct nesting before packing or unpacking gives up.
    pub max_depth:         usize,
    /// Whether the token contract ABI is registered at construction.
    pub preload_token_abi: bool,
}

impl Default for SerializerConfig {
    fn default() -> Self {
        SerializerConfig {
            public_key_prefix: DEFAULT_KEY_PREFIX.into(),
            time_point_unit:   TimeUnit::default(),
            max_depth:         DEFAULT_MAX_DEPTH,
            preload_token_abi: true,
        }
    }
}

impl SerializerConfig {
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let data = std::fs::read(path)
            .with_context(|| format!("Cannot read config file {}.", path.display()))?;
        serde_json::from_slice(&data).context("Could not parse serializer config.")
    }
}
