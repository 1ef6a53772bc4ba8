//! Account and action names. A name is a string of up to 13 characters packed
//! into a single `u64`, five bits per character for the first twelve and four
//! bits for the thirteenth.
use crate::{common::*, error::*};
use std::{fmt, str::FromStr};

/// Characters a name may contain, indexed by their 5-bit code.
pub const NAME_CHARS: &[u8; 32] = b".12345abcdefghijklmnopqrstuvwxyz";

/// Number of characters a name can hold.
pub const NAME_MAX_LEN: usize = 13;

fn char_to_symbol(c: u8) -> u64 {
    match c {
        b'a'..=b'z' => u64::from(c - b'a') + 6,
        b'1'..=b'5' => u64::from(c - b'1') + 1,
        _ => 0,
    }
}

/// Pack a string into its `u64` form. Characters outside the alphabet map to
/// `.` and characters past the thirteenth are ignored, so this never fails.
/// Use the [FromStr] instance of [Name] to reject such input.
pub fn encode_name(s: &str) -> u64 {
    let bytes = s.as_bytes();
    let mut value = 0u64;
    for i in 0..NAME_MAX_LEN {
        let c = bytes.get(i).map_or(0, |&c| char_to_symbol(c));
        if i < NAME_MAX_LEN - 1 {
            value |= (c & 0x1f) << (64 - 5 * (i + 1));
        } else {
            value |= c & 0x0f;
        }
    }
    value
}

/// Render the `u64` form of a name. Trailing dots are not part of the name.
pub fn decode_name(value: u64) -> String {
    let mut chars = [b'.'; NAME_MAX_LEN];
    let mut rest = value;
    for i in 0..NAME_MAX_LEN {
        let (mask, shift) = if i == 0 { (0x0f, 4) } else { (0x1f, 5) };
        chars[NAME_MAX_LEN - 1 - i] = NAME_CHARS[(rest & mask) as usize];
        rest >>= shift;
    }
    let end = chars.iter().rposition(|&c| c != b'.').map_or(0, |p| p + 1);
    chars[..end].iter().map(|&c| char::from(c)).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Name(pub u64);

impl Name {
    pub fn value(self) -> u64 { self.0 }
}

/// Parse a name, failing if packing it loses information, e.g., because it
/// is too long, contains characters outside the alphabet, or ends in a dot.
impl FromStr for Name {
    type Err = AbiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = encode_name(s);
        if decode_name(value) != s {
            return Err(AbiError::format("name", s, "not a valid name"));
        }
        Ok(Name(value))
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { f.write_str(&decode_name(self.0)) }
}

impl From<u64> for Name {
    fn from(value: u64) -> Self { Name(value) }
}

impl Serial for Name {
    fn serial<B: Buffer>(&self, out: &mut B) { self.0.serial(out) }
}

impl Deserial for Name {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> { Ok(Name(source.get()?)) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::{Gen, QuickCheck};

    const NUM_TESTS: u64 = 1000;

    #[test]
    fn test_known_names() {
        let cases = [
            ("hello", "00000000001aa36a"),
            ("alice", "0000000000855c34"),
            ("helloworld11", "10428a97721aa36a"),
            ("bob", "0000000000000e3d"),
            ("eosio", "0000000000ea3055"),
            ("eosio.token", "00a6823403ea3055"),
        ];
        for (name, le_hex) in cases {
            let parsed: Name = name.parse().expect("Valid name.");
            assert_eq!(hex::encode(to_bytes(&parsed)), le_hex, "Encoding of {}", name);
            assert_eq!(parsed.to_string(), name);
        }
    }

    #[test]
    fn test_thirteenth_char_uses_four_bits() {
        let name: Name = "aaaaaaaaaaaaj".parse().expect("Valid thirteen character name.");
        assert_eq!(name.0 & 0x0f, 0x0f);
        assert!("aaaaaaaaaaaak".parse::<Name>().is_err());
    }

    #[test]
    fn test_invalid_names_rejected() {
        for bad in ["Alice", "alice!", "a6", "toolongname1234", "alice."] {
            assert!(bad.parse::<Name>().is_err(), "{} should be rejected", bad);
        }
        assert_eq!("".parse::<Name>().expect("Empty name is valid."), Name(0));
    }

    #[test]
    fn test_encode_does_not_fail() {
        assert_eq!(encode_name("Alice"), encode_name(".lice"));
    }

    #[test]
    fn test_decode_encode_round_trip() {
        fn prop(value: u64) -> anyhow::Result<()> {
            let name = decode_name(value);
            let back: Name = name.parse()?;
            anyhow::ensure!(decode_name(back.0) == name, "Name changed in transit.");
            Ok(())
        }
        QuickCheck::new()
            .tests(NUM_TESTS)
            .gen(Gen::new(64))
            .quickcheck(prop as fn(u64) -> anyhow::Result<()>);
    }
}
