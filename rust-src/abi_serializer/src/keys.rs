//! Text and binary forms of public keys and signatures.
//!
//! Keys are rendered either in the legacy form, a configurable prefix followed
//! by the base58 encoding of the key and a 4 byte ripemd160 checksum, or in the
//! `PUB_K1_` form whose checksum additionally covers the curve suffix `K1`.
//! Signatures only have the `SIG_K1_` form.
use crate::{common::*, constants::DEFAULT_KEY_PREFIX, error::*};
use ripemd::{Digest, Ripemd160};
use std::{fmt, str::FromStr};

/// Size of a compressed secp256k1 public key.
pub const PUBLIC_KEY_SIZE: usize = 33;
/// Size of a compact recoverable secp256k1 signature.
pub const SIGNATURE_SIZE: usize = 65;
const CHECKSUM_SIZE: usize = 4;
/// Type tag written before every key and signature. Only K1 is supported.
const K1_TAG: u8 = 0;
const K1_SUFFIX: &[u8] = b"K1";
const PUB_K1_PREFIX: &str = "PUB_K1_";
const SIG_K1_PREFIX: &str = "SIG_K1_";

fn checksum(data: &[u8], suffix: &[u8]) -> [u8; CHECKSUM_SIZE] {
    let mut hasher = Ripemd160::new();
    hasher.update(data);
    hasher.update(suffix);
    let digest = hasher.finalize();
    let mut out = [0u8; CHECKSUM_SIZE];
    out.copy_from_slice(&digest[..CHECKSUM_SIZE]);
    out
}

fn encode_checked(data: &[u8], suffix: &[u8]) -> String {
    let mut raw = data.to_vec();
    raw.extend_from_slice(&checksum(data, suffix));
    bs58::encode(raw).into_string()
}

fn decode_checked<const N: usize>(
    ty: &str,
    text: &str,
    body: &str,
    suffix: &[u8],
) -> ParseResult<[u8; N]> {
    let raw = bs58::decode(body)
        .into_vec()
        .map_err(|e| AbiError::format(ty, text, e.to_string()))?;
    if raw.len() != N + CHECKSUM_SIZE {
        return Err(AbiError::format(
            ty,
            text,
            format!("expected {} bytes, got {}", N + CHECKSUM_SIZE, raw.len()),
        ));
    }
    let (data, check) = raw.split_at(N);
    if check != checksum(data, suffix).as_slice() {
        return Err(AbiError::format(ty, text, "checksum mismatch"));
    }
    let mut out = [0u8; N];
    out.copy_from_slice(data);
    Ok(out)
}

fn deserial_tag<R: ReadBytesExt>(ty: &str, source: &mut R) -> ParseResult<()> {
    let tag: u8 = source.get()?;
    if tag != K1_TAG {
        return Err(AbiError::format(ty, tag.to_string(), "unsupported key type"));
    }
    Ok(())
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey(pub [u8; PUBLIC_KEY_SIZE]);

impl PublicKey {
    /// Parse either the `PUB_K1_` form or the legacy form with the given
    /// prefix.
    pub fn from_text(text: &str, legacy_prefix: &str) -> ParseResult<Self> {
        if let Some(body) = text.strip_prefix(PUB_K1_PREFIX) {
            decode_checked("public_key", text, body, K1_SUFFIX).map(PublicKey)
        } else if let Some(body) = text.strip_prefix(legacy_prefix) {
            decode_checked("public_key", text, body, &[]).map(PublicKey)
        } else {
            Err(AbiError::format("public_key", text, "unrecognized key prefix"))
        }
    }

    pub fn to_legacy_string(&self, prefix: &str) -> String {
        format!("{}{}", prefix, encode_checked(&self.0, &[]))
    }

    pub fn to_k1_string(&self) -> String {
        format!("{}{}", PUB_K1_PREFIX, encode_checked(&self.0, K1_SUFFIX))
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, "PublicKey({})", self) }
}

/// Legacy form with the default prefix.
impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.to_legacy_string(DEFAULT_KEY_PREFIX))
    }
}

impl FromStr for PublicKey {
    type Err = AbiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> { Self::from_text(s, DEFAULT_KEY_PREFIX) }
}

impl Serial for PublicKey {
    fn serial<B: Buffer>(&self, out: &mut B) {
        out.put(&K1_TAG);
        out.put(&self.0);
    }
}

impl Deserial for PublicKey {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        deserial_tag("public_key", source)?;
        Ok(PublicKey(source.get()?))
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature(pub [u8; SIGNATURE_SIZE]);

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, "Signature({})", self) }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", SIG_K1_PREFIX, encode_checked(&self.0, K1_SUFFIX))
    }
}

impl FromStr for Signature {
    type Err = AbiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s
            .strip_prefix(SIG_K1_PREFIX)
            .ok_or_else(|| AbiError::format("signature", s, "unrecognized signature prefix"))?;
        decode_checked("signature", s, body, K1_SUFFIX).map(Signature)
    }
}

impl Serial for Signature {
    fn serial<B: Buffer>(&self, out: &mut B) {
        out.put(&K1_TAG);
        out.put(&self.0);
    }
}

impl Deserial for Signature {
    fn deserial<R: ReadBytesExt>(source: &mut R) -> ParseResult<Self> {
        deserial_tag("signature", source)?;
        Ok(Signature(source.get()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use rand::{rngs::SmallRng, Rng, SeedableRng};

    const LEGACY_KEY: &str = "EOS6AjF6hvF7GSuSd4sCgfPKq5uWaXvGM2aQtEUCwmEHygQaqxBSV";
    const K1_KEY: &str = "PUB_K1_6AjF6hvF7GSuSd4sCgfPKq5uWaXvGM2aQtEUCwmEHygQaVDyzY";
    const RAW_KEY: &str = "02a891e0dd57132ed683bc875dacc961c6fd5dfae6800bc6181ab68bb848251e52";
    const SIGNATURE: &str = "SIG_K1_KbSF8BCNVA95KzR1qLmdn4VnxRoLVFQ1fZ8VV5gVdW1hLfGBdcwEc93hF7FBkWZip1tq2Ps27UZxceaR3hYwAjKL7j59q8";
    const RAW_SIGNATURE: &str = "20331f956b5b344e5d225c857cceac8183a90dd883201510e34b5cd60aac0d7da015f7da1a6a53ef5c6572050826b1d8a70e56abbe815a513d7c796314c59774a7";

    #[test]
    fn test_legacy_and_k1_forms_agree() {
        let legacy: PublicKey = LEGACY_KEY.parse().expect("Valid legacy key.");
        let k1: PublicKey = K1_KEY.parse().expect("Valid K1 key.");
        assert_eq!(legacy, k1);
        assert_eq!(hex::encode(legacy.0), RAW_KEY);
        assert_eq!(legacy.to_string(), LEGACY_KEY);
        assert_eq!(legacy.to_k1_string(), K1_KEY);
    }

    #[test]
    fn test_key_binary_form_is_tagged() {
        let key: PublicKey = LEGACY_KEY.parse().expect("Valid legacy key.");
        let bytes = to_bytes(&key);
        assert_eq!(bytes.len(), 1 + PUBLIC_KEY_SIZE);
        assert_eq!(bytes[0], 0);
        let mut wrong_tag = bytes.clone();
        wrong_tag[0] = 1;
        let err = PublicKey::deserial(&mut std::io::Cursor::new(wrong_tag)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::FormatError);
    }

    #[test]
    fn test_custom_prefix() {
        let key: PublicKey = LEGACY_KEY.parse().expect("Valid legacy key.");
        let text = key.to_legacy_string("FIO");
        assert_eq!(PublicKey::from_text(&text, "FIO").expect("Valid prefixed key."), key);
        assert!(PublicKey::from_text(&text, "EOS").is_err());
    }

    #[test]
    fn test_corrupted_checksum_rejected() {
        let mut corrupted = LEGACY_KEY.to_string();
        corrupted.pop();
        corrupted.push('T');
        assert!(corrupted.parse::<PublicKey>().is_err());
    }

    #[test]
    fn test_signature() {
        let sig: Signature = SIGNATURE.parse().expect("Valid signature.");
        assert_eq!(hex::encode(sig.0), RAW_SIGNATURE);
        assert_eq!(sig.to_string(), SIGNATURE);
        assert!(LEGACY_KEY.parse::<Signature>().is_err());
    }

    #[test]
    fn test_random_keys_round_trip() {
        let mut rng = SmallRng::seed_from_u64(0xabcd);
        for _ in 0..100 {
            let mut raw = [0u8; PUBLIC_KEY_SIZE];
            rng.fill(&mut raw[..]);
            let key = PublicKey(raw);
            assert_eq!(key.to_string().parse::<PublicKey>().expect("Rendered key parses."), key);
            assert_eq!(key.to_k1_string().parse::<PublicKey>().expect("Rendered key parses."), key);
        }
    }
}
