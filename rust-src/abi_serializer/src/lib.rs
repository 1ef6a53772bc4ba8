#![doc = include_str!("../README.md")]
pub mod abi;
pub mod common;
pub mod config;
pub mod constants;
pub mod error;
pub mod keys;
pub mod name;
pub mod registry;
pub mod scalar;
pub mod serializer;
pub mod types;
pub mod value;
pub mod walker;

pub use abi::AbiDefinition;
pub use config::SerializerConfig;
pub use error::{AbiError, ErrorKind, ParseResult};
pub use serializer::AbiSerializer;
pub use value::AbiValue;
