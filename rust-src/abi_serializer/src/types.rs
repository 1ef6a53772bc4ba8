//! Ledger value types with a text form and a fixed binary layout: symbols,
//! assets, time points and fixed width hashes.
use crate::{
    common::*,
    constants::{MAX_PRECISION, MAX_SYMBOL_CODE_LEN},
    error::*,
    name::Name,
};
use chrono::{DateTime, NaiveDateTime};
use std::{convert::TryFrom, fmt, str::FromStr};

/// Text layout of time points. The fraction is optional when parsing and
/// omitted when rendering a whole second.
const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Check the bytes of a symbol code: between one and seven bytes, each an
/// uppercase ASCII letter, except that once a NUL byte is seen all remaining
/// bytes must be NUL as well. The first byte is never NUL.
pub fn is_valid_symbol_code(code: &[u8]) -> bool {
    if code.len() > MAX_SYMBOL_CODE_LEN || code.first().map_or(true, |&c| c == 0) {
        return false;
    }
    let mut seen_nul = false;
    for &c in code {
        if seen_nul {
            if c != 0 {
                return false;
            }
        } else if c == 0 {
            seen_nul = true;
        } else if !c.is_ascii_uppercase() {
            return false;
        }
    }
    true
}

/// Ticker of a token, e.g., `EOS`. Stored NUL padded.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SymbolCode([u8; MAX_SYMBOL_CODE_LEN]);

impl SymbolCode {
    fn from_padded(ty: &str, bytes: [u8; MAX_SYMBOL_CODE_LEN]) -> ParseResult<Self> {
        if !is_valid_symbol_code(&bytes) {
            return Err(AbiError::format(ty, hex::encode(bytes), "invalid symbol code"));
        }
        Ok(SymbolCode(bytes))
    }

    /// The code without its NUL padding.
    pub fn as_str(&self) -> &str {
        let end = self.0.iter().position(|&c| c == 0).unwrap_or(MAX_SYMBOL_CODE_LEN);
        std::str::from_utf8(&self.0[..end]).unwrap_or_default()
    }

    /// The code as the little-endian `u64` it occupies on the ledger.
    pub fn value(&self) -> u64 {
        let mut bytes = [0u8; 8];
        bytes[..MAX_SYMBOL_CODE_LEN].copy_from_slice(&self.0);
        u64::from_le_bytes(bytes)
    }
}

impl fmt::Debug for SymbolCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "SymbolCode({})", self.as_str())
    }
}

impl fmt::Display for SymbolCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for SymbolCode {
    type Err = AbiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !is_valid_symbol_code(s.as_bytes()) {
            return Err(AbiError::format("symbol_code", s, "invalid symbol code"));
        }
        let mut bytes = [0u8; MAX_SYMBOL_CODE_LEN];
        bytes[..s.len()].copy_from_slice(s.as_bytes());
        Ok(SymbolCode(bytes))
    }
}

/// Standalone symbol codes take a full 8 bytes.
impl Serial for SymbolCode {
    fn serial<B: Buffer>(&self, out: &mut B) { self.value().serial(out) }
}

impl Deserial for SymbolCode {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let bytes: [u8; 8] = source.get()?;
        if bytes[MAX_SYMBOL_CODE_LEN] != 0 {
            return Err(AbiError::format("symbol_code", hex::encode(bytes), "code is too long"));
        }
        let mut code = [0u8; MAX_SYMBOL_CODE_LEN];
        code.copy_from_slice(&bytes[..MAX_SYMBOL_CODE_LEN]);
        SymbolCode::from_padded("symbol_code", code)
    }
}

/// A symbol code together with the number of decimal places amounts of it
/// are written with. The text form is `precision,CODE`, e.g., `4,EOS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol {
    pub precision: u8,
    pub code:      SymbolCode,
}

impl Symbol {
    pub fn new(precision: u8, code: SymbolCode) -> ParseResult<Self> {
        if precision > MAX_PRECISION {
            return Err(AbiError::format(
                "symbol",
                precision.to_string(),
                format!("precision must be at most {}", MAX_PRECISION),
            ));
        }
        Ok(Symbol { precision, code })
    }

    /// The symbol as the little-endian `u64` it occupies on the ledger, the
    /// precision in the lowest byte.
    pub fn value(&self) -> u64 { (self.code.value() << 8) | u64::from(self.precision) }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{},{}", self.precision, self.code)
    }
}

impl FromStr for Symbol {
    type Err = AbiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (precision, code) = s
            .split_once(',')
            .ok_or_else(|| AbiError::format("symbol", s, "expected precision,CODE"))?;
        let precision = precision
            .parse::<u8>()
            .map_err(|e| AbiError::format("symbol", s, e.to_string()))?;
        Symbol::new(precision, code.parse()?)
    }
}

impl Serial for Symbol {
    fn serial<B: Buffer>(&self, out: &mut B) {
        out.put(&self.precision);
        out.put(&self.code.0);
    }
}

impl Deserial for Symbol {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let precision: u8 = source.get()?;
        let code = SymbolCode::from_padded("symbol", source.get()?)?;
        Symbol::new(precision, code)
    }
}

/// A quantity of a token. The amount is in the smallest unit, so `1.0000 EOS`
/// has amount 10000 and precision 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Asset {
    pub amount: i64,
    pub symbol: Symbol,
}

fn parse_amount(text: &str) -> ParseResult<(i64, u8)> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let overflow = || AbiError::overflow("asset", text);
    // Accumulated wider than i64 so that i64::MIN is reachable.
    let mut amount: i128 = 0;
    let mut int_digits = 0;
    let mut precision: u8 = 0;
    let mut after_dot = false;
    for c in digits.chars() {
        if let Some(d) = c.to_digit(10) {
            amount = amount.checked_mul(10).ok_or_else(overflow)?;
            amount = amount.checked_add(i128::from(d)).ok_or_else(overflow)?;
            if after_dot {
                if precision >= MAX_PRECISION {
                    return Err(AbiError::format(
                        "asset",
                        text,
                        format!("at most {} decimals", MAX_PRECISION),
                    ));
                }
                precision += 1;
            } else {
                int_digits += 1;
            }
        } else if c == '.' && !after_dot {
            after_dot = true;
        } else {
            return Err(AbiError::format("asset", text, "expected a digit or a dot"));
        }
    }
    if int_digits == 0 || after_dot && precision == 0 {
        return Err(AbiError::format("asset", text, "expected more digits"));
    }
    let amount = i64::try_from(if negative { -amount } else { amount }).map_err(|_| overflow())?;
    Ok((amount, precision))
}

/// Parses `AMOUNT CODE` where the number of decimals in the amount sets the
/// precision. Negative amounts parse, but are refused when packing.
impl FromStr for Asset {
    type Err = AbiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(' ');
        let (amount, code) = match (parts.next(), parts.next(), parts.next()) {
            (Some(amount), Some(code), None) => (amount, code),
            _ => return Err(AbiError::format("asset", s, "expected AMOUNT CODE")),
        };
        let (amount, precision) = parse_amount(amount)?;
        Ok(Asset {
            amount,
            symbol: Symbol::new(precision, code.parse()?)?,
        })
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let sign = if self.amount < 0 { "-" } else { "" };
        let magnitude = self.amount.unsigned_abs();
        let precision = u32::from(self.symbol.precision);
        if precision == 0 {
            return write!(f, "{}{} {}", sign, magnitude, self.symbol.code);
        }
        let unit = 10u64.pow(precision);
        write!(
            f,
            "{}{}.{:0width$} {}",
            sign,
            magnitude / unit,
            magnitude % unit,
            self.symbol.code,
            width = precision as usize
        )
    }
}

impl Serial for Asset {
    fn serial<B: Buffer>(&self, out: &mut B) {
        out.put(&self.amount);
        out.put(&self.symbol);
    }
}

impl Deserial for Asset {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let amount = source.get()?;
        let symbol = source.get()?;
        Ok(Asset { amount, symbol })
    }
}

/// An asset together with the account of the token contract that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExtendedAsset {
    pub quantity: Asset,
    pub contract: Name,
}

impl Serial for ExtendedAsset {
    fn serial<B: Buffer>(&self, out: &mut B) {
        out.put(&self.quantity);
        out.put(&self.contract);
    }
}

impl Deserial for ExtendedAsset {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        let quantity = source.get()?;
        let contract = source.get()?;
        Ok(ExtendedAsset { quantity, contract })
    }
}

/// Resolution of `time_point` values on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, SerdeSerialize, SerdeDeserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    #[default]
    Nanoseconds,
    Microseconds,
}

impl TimeUnit {
    pub fn ticks_per_second(self) -> i64 {
        match self {
            TimeUnit::Nanoseconds => 1_000_000_000,
            TimeUnit::Microseconds => 1_000_000,
        }
    }

    fn nanos_per_tick(self) -> i64 { 1_000_000_000 / self.ticks_per_second() }
}

fn parse_time(ty: &str, text: &str) -> ParseResult<NaiveDateTime> {
    let trimmed = text.strip_suffix('Z').unwrap_or(text);
    NaiveDateTime::parse_from_str(trimmed, TIME_FORMAT)
        .map_err(|e| AbiError::format(ty, text, e.to_string()))
}

/// Ticks since the unix epoch, in UTC. The length of a tick is given by a
/// [TimeUnit].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimePoint(pub i64);

impl TimePoint {
    /// Parse `YYYY-MM-DDTHH:MM:SS[.fraction]`, truncating the fraction to
    /// whole ticks.
    pub fn parse(text: &str, unit: TimeUnit) -> ParseResult<Self> {
        let time = parse_time("time_point", text)?.and_utc();
        let ticks = time
            .timestamp()
            .checked_mul(unit.ticks_per_second())
            .and_then(|t| {
                t.checked_add(i64::from(time.timestamp_subsec_nanos()) / unit.nanos_per_tick())
            })
            .ok_or_else(|| AbiError::overflow("time_point", text))?;
        Ok(TimePoint(ticks))
    }

    pub fn render(self, unit: TimeUnit) -> ParseResult<String> {
        let secs = self.0.div_euclid(unit.ticks_per_second());
        let nanos = self.0.rem_euclid(unit.ticks_per_second()) * unit.nanos_per_tick();
        let time = DateTime::from_timestamp(secs, nanos as u32)
            .ok_or_else(|| AbiError::overflow("time_point", self.0))?;
        Ok(time.naive_utc().format(TIME_FORMAT).to_string())
    }
}

impl Serial for TimePoint {
    fn serial<B: Buffer>(&self, out: &mut B) { self.0.serial(out) }
}

impl Deserial for TimePoint {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        Ok(TimePoint(source.get()?))
    }
}

/// Whole seconds since the unix epoch, in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimePointSec(pub u32);

impl TimePointSec {
    /// Parse the same layout as [TimePoint]. Any fraction is dropped. The type
    /// name is only used for error reporting.
    pub fn parse_as(ty: &str, text: &str) -> ParseResult<Self> {
        let secs = parse_time(ty, text)?.and_utc().timestamp();
        u32::try_from(secs).map(TimePointSec).map_err(|_| AbiError::overflow(ty, text))
    }
}

impl FromStr for TimePointSec {
    type Err = AbiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> { Self::parse_as("time_point_sec", s) }
}

impl fmt::Display for TimePointSec {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let time = DateTime::from_timestamp(i64::from(self.0), 0).ok_or(fmt::Error)?;
        write!(f, "{}", time.naive_utc().format(TIME_FORMAT))
    }
}

impl Serial for TimePointSec {
    fn serial<B: Buffer>(&self, out: &mut B) { self.0.serial(out) }
}

impl Deserial for TimePointSec {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        Ok(TimePointSec(source.get()?))
    }
}

/// Copy `bytes` to the front of an `N` byte array, zero filling the rest.
fn left_aligned<const N: usize>(ty: &str, text: &str, bytes: &[u8]) -> ParseResult<[u8; N]> {
    if bytes.len() > N {
        return Err(AbiError::format(ty, text, format!("more than {} bytes", N)));
    }
    let mut out = [0u8; N];
    out[..bytes.len()].copy_from_slice(bytes);
    Ok(out)
}

/// A fixed width hash, written as hex without a prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Checksum<const N: usize>(pub [u8; N]);

pub type Checksum160 = Checksum<20>;
pub type Checksum256 = Checksum<32>;
pub type Checksum512 = Checksum<64>;

impl<const N: usize> Checksum<N> {
    /// Shorter input is zero filled on the right.
    pub fn from_hex(ty: &str, text: &str) -> ParseResult<Self> {
        let bytes = hex::decode(text).map_err(|e| AbiError::format(ty, text, e.to_string()))?;
        left_aligned(ty, text, &bytes).map(Checksum)
    }
}

impl<const N: usize> fmt::Display for Checksum<N> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { f.write_str(&hex::encode(self.0)) }
}

impl<const N: usize> Serial for Checksum<N> {
    fn serial<B: Buffer>(&self, out: &mut B) { out.put(&self.0) }
}

impl<const N: usize> Deserial for Checksum<N> {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        Ok(Checksum(source.get()?))
    }
}

/// Raw 16 bytes of an `int128`, `uint128` or `float128`, written as `0x`
/// followed by hex. No arithmetic is done on these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bits128(pub [u8; 16]);

impl Bits128 {
    /// The `0x` prefix is optional. Shorter input is zero filled on the right.
    pub fn from_hex(ty: &str, text: &str) -> ParseResult<Self> {
        let digits = text.strip_prefix("0x").unwrap_or(text);
        let bytes = hex::decode(digits).map_err(|e| AbiError::format(ty, text, e.to_string()))?;
        left_aligned(ty, text, &bytes).map(Bits128)
    }
}

impl fmt::Display for Bits128 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, "0x{}", hex::encode(self.0)) }
}

impl Serial for Bits128 {
    fn serial<B: Buffer>(&self, out: &mut B) { out.put(&self.0) }
}

impl Deserial for Bits128 {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> { Ok(Bits128(source.get()?)) }
}
