//! The fixed set of primitive types, and how each is read from JSON, written
//! in binary and rendered back.
//!
//! Integers accept a JSON number or a decimal string. Floats likewise, and are
//! rendered as strings so that no precision is lost. Booleans are JSON
//! booleans. Every other primitive is written as a JSON string.
use crate::{
    common::*,
    config::SerializerConfig,
    error::*,
    keys::{PublicKey, Signature},
    name::Name,
    types::*,
    value::{AbiValue, ScalarText},
};
use serde_json::{json, Value};
use std::{
    convert::TryFrom,
    num::{IntErrorKind, ParseIntError},
    str::FromStr,
};

/// The primitive types understood by the codec. Any type name that is not one
/// of these must be a struct declared in an ABI, or a list thereof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Bool,
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Int64,
    Uint64,
    /// Raw 16 bytes, written as hex.
    Int128,
    /// Raw 16 bytes, written as hex.
    Uint128,
    /// Raw 16 bytes, written as hex.
    Float128,
    VarInt32,
    VarUint32,
    Float32,
    Float64,
    TimePoint,
    TimePointSec,
    /// Same layout as [ScalarType::TimePointSec].
    BlockTimestamp,
    Name,
    /// Length-prefixed bytes, written as hex without a `0x` prefix.
    Bytes,
    /// Length-prefixed utf8.
    String,
    Checksum160,
    Checksum256,
    Checksum512,
    PublicKey,
    Signature,
    Symbol,
    SymbolCode,
    Asset,
    ExtendedAsset,
}

impl ScalarType {
    pub const ALL: [ScalarType; 31] = [
        ScalarType::Bool,
        ScalarType::Int8,
        ScalarType::Uint8,
        ScalarType::Int16,
        ScalarType::Uint16,
        ScalarType::Int32,
        ScalarType::Uint32,
        ScalarType::Int64,
        ScalarType::Uint64,
        ScalarType::Int128,
        ScalarType::Uint128,
        ScalarType::Float128,
        ScalarType::VarInt32,
        ScalarType::VarUint32,
        ScalarType::Float32,
        ScalarType::Float64,
        ScalarType::TimePoint,
        ScalarType::TimePointSec,
        ScalarType::BlockTimestamp,
        ScalarType::Name,
        ScalarType::Bytes,
        ScalarType::String,
        ScalarType::Checksum160,
        ScalarType::Checksum256,
        ScalarType::Checksum512,
        ScalarType::PublicKey,
        ScalarType::Signature,
        ScalarType::Symbol,
        ScalarType::SymbolCode,
        ScalarType::Asset,
        ScalarType::ExtendedAsset,
    ];

    pub fn from_type_name(name: &str) -> Option<Self> {
        let ty = match name {
            "bool" => ScalarType::Bool,
            "int8" => ScalarType::Int8,
            "uint8" => ScalarType::Uint8,
            "int16" => ScalarType::Int16,
            "uint16" => ScalarType::Uint16,
            "int32" => ScalarType::Int32,
            "uint32" => ScalarType::Uint32,
            "int64" => ScalarType::Int64,
            "uint64" => ScalarType::Uint64,
            "int128" => ScalarType::Int128,
            "uint128" => ScalarType::Uint128,
            "float128" => ScalarType::Float128,
            "varint32" => ScalarType::VarInt32,
            "varuint32" => ScalarType::VarUint32,
            "float32" => ScalarType::Float32,
            "float64" => ScalarType::Float64,
            "time_point" => ScalarType::TimePoint,
            "time_point_sec" => ScalarType::TimePointSec,
            "block_timestamp_type" => ScalarType::BlockTimestamp,
            "name" => ScalarType::Name,
            "bytes" => ScalarType::Bytes,
            "string" => ScalarType::String,
            "checksum160" => ScalarType::Checksum160,
            "checksum256" => ScalarType::Checksum256,
            "checksum512" => ScalarType::Checksum512,
            "public_key" => ScalarType::PublicKey,
            "signature" => ScalarType::Signature,
            "symbol" => ScalarType::Symbol,
            "symbol_code" => ScalarType::SymbolCode,
            "asset" => ScalarType::Asset,
            "extended_asset" => ScalarType::ExtendedAsset,
            _ => return None,
        };
        Some(ty)
    }

    pub fn type_name(self) -> &'static str {
        match self {
            ScalarType::Bool => "bool",
            ScalarType::Int8 => "int8",
            ScalarType::Uint8 => "uint8",
            ScalarType::Int16 => "int16",
            ScalarType::Uint16 => "uint16",
            ScalarType::Int32 => "int32",
            ScalarType::Uint32 => "uint32",
            ScalarType::Int64 => "int64",
            ScalarType::Uint64 => "uint64",
            ScalarType::Int128 => "int128",
            ScalarType::Uint128 => "uint128",
            ScalarType::Float128 => "float128",
            ScalarType::VarInt32 => "varint32",
            ScalarType::VarUint32 => "varuint32",
            ScalarType::Float32 => "float32",
            ScalarType::Float64 => "float64",
            ScalarType::TimePoint => "time_point",
            ScalarType::TimePointSec => "time_point_sec",
            ScalarType::BlockTimestamp => "block_timestamp_type",
            ScalarType::Name => "name",
            ScalarType::Bytes => "bytes",
            ScalarType::String => "string",
            ScalarType::Checksum160 => "checksum160",
            ScalarType::Checksum256 => "checksum256",
            ScalarType::Checksum512 => "checksum512",
            ScalarType::PublicKey => "public_key",
            ScalarType::Signature => "signature",
            ScalarType::Symbol => "symbol",
            ScalarType::SymbolCode => "symbol_code",
            ScalarType::Asset => "asset",
            ScalarType::ExtendedAsset => "extended_asset",
        }
    }
}

fn parse_integer<T: TryFrom<i128>>(ty: ScalarType, text: &ScalarText) -> ParseResult<T> {
    let literal = text.literal();
    let wide: i128 = literal.parse().map_err(|e: ParseIntError| match e.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
            AbiError::overflow(ty.type_name(), literal)
        }
        _ => AbiError::format(ty.type_name(), literal, "expected a decimal integer"),
    })?;
    T::try_from(wide).map_err(|_| AbiError::overflow(ty.type_name(), literal))
}

fn parse_float<T: FromStr>(ty: ScalarType, text: &ScalarText) -> ParseResult<T> {
    text.literal()
        .parse()
        .map_err(|_| AbiError::format(ty.type_name(), text.literal(), "expected a number"))
}

fn parse_asset(ty: &str, text: &str) -> ParseResult<Asset> {
    let asset: Asset = text.parse()?;
    if asset.amount < 0 {
        return Err(AbiError::format(ty, text, "negative amounts cannot be packed"));
    }
    Ok(asset)
}

/// An extended asset is given either as an object with `quantity` and
/// `contract`, or as a string holding that object as JSON.
fn parse_extended_asset(value: &AbiValue) -> ParseResult<ExtendedAsset> {
    const TY: &str = "extended_asset";
    let record = match value {
        AbiValue::Scalar(text) => AbiValue::from_json_slice(text.string(TY)?.as_bytes())
            .map_err(|_| AbiError::format(TY, text.literal(), "expected a JSON object"))?,
        AbiValue::Object(_) => value.clone(),
        AbiValue::Array(_) => {
            return Err(AbiError::format(TY, value.describe(), "expected a JSON object"))
        }
    };
    fn field<'a>(record: &'a AbiValue, name: &str) -> ParseResult<&'a str> {
        match record.get(name) {
            Some(AbiValue::Scalar(text)) => text.string(TY),
            Some(other) => Err(AbiError::format(TY, other.describe(), "expected a JSON string")),
            None => Err(AbiError::MissingField {
                structure: TY.into(),
                field:     name.into(),
            }),
        }
    }
    Ok(ExtendedAsset {
        quantity: parse_asset(TY, field(&record, "quantity")?)?,
        contract: field(&record, "contract")?.parse()?,
    })
}

/// Parse `value` as the given primitive and append its binary form to `out`.
pub fn encode_scalar<B: Buffer>(
    ty: ScalarType,
    value: &AbiValue,
    config: &SerializerConfig,
    out: &mut B,
) -> ParseResult<()> {
    let text = match value {
        AbiValue::Scalar(text) => text,
        _ if ty == ScalarType::ExtendedAsset => {
            out.put(&parse_extended_asset(value)?);
            return Ok(());
        }
        other => {
            return Err(AbiError::format(ty.type_name(), other.describe(), "expected a scalar"))
        }
    };
    let name = ty.type_name();
    match ty {
        ScalarType::Bool => match (text.quoted, text.literal()) {
            (false, "true") => out.put(&true),
            (false, "false") => out.put(&false),
            _ => return Err(AbiError::format(name, value.describe(), "expected true or false")),
        },
        ScalarType::Int8 => out.put(&parse_integer::<i8>(ty, text)?),
        ScalarType::Uint8 => out.put(&parse_integer::<u8>(ty, text)?),
        ScalarType::Int16 => out.put(&parse_integer::<i16>(ty, text)?),
        ScalarType::Uint16 => out.put(&parse_integer::<u16>(ty, text)?),
        ScalarType::Int32 => out.put(&parse_integer::<i32>(ty, text)?),
        ScalarType::Uint32 => out.put(&parse_integer::<u32>(ty, text)?),
        ScalarType::Int64 => out.put(&parse_integer::<i64>(ty, text)?),
        ScalarType::Uint64 => out.put(&parse_integer::<u64>(ty, text)?),
        ScalarType::Int128 | ScalarType::Uint128 | ScalarType::Float128 => {
            out.put(&Bits128::from_hex(name, text.string(name)?)?)
        }
        ScalarType::VarInt32 => out.put(&VarInt32(parse_integer(ty, text)?)),
        ScalarType::VarUint32 => out.put(&VarUint32(parse_integer(ty, text)?)),
        ScalarType::Float32 => out.put(&parse_float::<f32>(ty, text)?),
        ScalarType::Float64 => out.put(&parse_float::<f64>(ty, text)?),
        ScalarType::TimePoint => {
            out.put(&TimePoint::parse(text.string(name)?, config.time_point_unit)?)
        }
        ScalarType::TimePointSec | ScalarType::BlockTimestamp => {
            out.put(&TimePointSec::parse_as(name, text.string(name)?)?)
        }
        ScalarType::Name => out.put(&text.string(name)?.parse::<Name>()?),
        ScalarType::Bytes => {
            let hex_text = text.string(name)?;
            let bytes =
                hex::decode(hex_text).map_err(|e| AbiError::format(name, hex_text, e.to_string()))?;
            serial_bytes(&bytes, out)?
        }
        ScalarType::String => serial_bytes(text.string(name)?.as_bytes(), out)?,
        ScalarType::Checksum160 => out.put(&Checksum160::from_hex(name, text.string(name)?)?),
        ScalarType::Checksum256 => out.put(&Checksum256::from_hex(name, text.string(name)?)?),
        ScalarType::Checksum512 => out.put(&Checksum512::from_hex(name, text.string(name)?)?),
        ScalarType::PublicKey => out.put(&PublicKey::from_text(
            text.string(name)?,
            &config.public_key_prefix,
        )?),
        ScalarType::Signature => out.put(&text.string(name)?.parse::<Signature>()?),
        ScalarType::Symbol => out.put(&text.string(name)?.parse::<Symbol>()?),
        ScalarType::SymbolCode => out.put(&text.string(name)?.parse::<SymbolCode>()?),
        ScalarType::Asset => out.put(&parse_asset(name, text.string(name)?)?),
        ScalarType::ExtendedAsset => out.put(&parse_extended_asset(value)?),
    }
    Ok(())
}

/// Read one value of the given primitive from `source` and render it as JSON.
pub fn decode_scalar<R: ReadBytesExt>(
    ty: ScalarType,
    config: &SerializerConfig,
    source: &mut R,
) -> ParseResult<Value> {
    let value = match ty {
        ScalarType::Bool => Value::Bool(source.get()?),
        ScalarType::Int8 => Value::from(i8::deserial(source)?),
        ScalarType::Uint8 => Value::from(u8::deserial(source)?),
        ScalarType::Int16 => Value::from(i16::deserial(source)?),
        ScalarType::Uint16 => Value::from(u16::deserial(source)?),
        ScalarType::Int32 => Value::from(i32::deserial(source)?),
        ScalarType::Uint32 => Value::from(u32::deserial(source)?),
        ScalarType::Int64 => Value::from(i64::deserial(source)?),
        ScalarType::Uint64 => Value::from(u64::deserial(source)?),
        ScalarType::Int128 | ScalarType::Uint128 | ScalarType::Float128 => {
            Value::String(Bits128::deserial(source)?.to_string())
        }
        ScalarType::VarInt32 => Value::from(VarInt32::deserial(source)?.0),
        ScalarType::VarUint32 => Value::from(VarUint32::deserial(source)?.0),
        ScalarType::Float32 => Value::String(f32::deserial(source)?.to_string()),
        ScalarType::Float64 => Value::String(f64::deserial(source)?.to_string()),
        ScalarType::TimePoint => {
            Value::String(TimePoint::deserial(source)?.render(config.time_point_unit)?)
        }
        ScalarType::TimePointSec | ScalarType::BlockTimestamp => {
            Value::String(TimePointSec::deserial(source)?.to_string())
        }
        ScalarType::Name => Value::String(Name::deserial(source)?.to_string()),
        ScalarType::Bytes => Value::String(hex::encode(deserial_bytes(source)?)),
        ScalarType::String => Value::String(deserial_string(source)?),
        ScalarType::Checksum160 => Value::String(Checksum160::deserial(source)?.to_string()),
        ScalarType::Checksum256 => Value::String(Checksum256::deserial(source)?.to_string()),
        ScalarType::Checksum512 => Value::String(Checksum512::deserial(source)?.to_string()),
        ScalarType::PublicKey => Value::String(
            PublicKey::deserial(source)?.to_legacy_string(&config.public_key_prefix),
        ),
        ScalarType::Signature => Value::String(Signature::deserial(source)?.to_string()),
        ScalarType::Symbol => Value::String(Symbol::deserial(source)?.to_string()),
        ScalarType::SymbolCode => Value::String(SymbolCode::deserial(source)?.to_string()),
        ScalarType::Asset => Value::String(Asset::deserial(source)?.to_string()),
        ScalarType::ExtendedAsset => {
            let asset = ExtendedAsset::deserial(source)?;
            json!({
                "quantity": asset.quantity.to_string(),
                "contract": asset.contract.to_string(),
            })
        }
    };
    Ok(value)
}
