//! Constants shared by the codecs and the registry.

/// Suffix that turns a type name into the name of a list of that type.
pub const ARRAY_SUFFIX: &str = "[]";

/// Largest number of decimal places an asset or symbol may declare.
pub const MAX_PRECISION: u8 = 16;

/// Longest symbol code, in bytes. A symbol packs its code into the 7 bytes
/// following the precision byte.
pub const MAX_SYMBOL_CODE_LEN: usize = 7;

/// Prefix of the legacy public key text form.
pub const DEFAULT_KEY_PREFIX: &str = "EOS";

/// Default limit on struct nesting during packing and unpacking.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Account of the token contract whose ABI is available without registration.
pub const TOKEN_CONTRACT: &str = "eosio.token";

/// Struct of the system ABI that describes ABI documents themselves.
pub const ABI_DEF_STRUCT: &str = "abi_def";

/// Built-in ABI that every contract ABI falls back to for struct lookup.
pub(crate) const SYSTEM_ABI: &str = include_str!("../data/system.abi.json");

/// ABI of the token contract, registered at startup unless disabled.
pub(crate) const TOKEN_ABI: &str = include_str!("../data/eosio.token.abi.json");
