use crate::error::LedgerError;
use curve25519_dalek::edwards::CompressedEdwardsY;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

// Identity is an opaque account handle, 32 bytes long like a public key.
// The all-zero value is the null identity and never owns, mints or administers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Identity([u8; 32]);

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = hex::encode(&self.0[0..6]);
        write!(f, "id:{}", prefix)
    }
}

impl Default for Identity {
    fn default() -> Self {
        Identity::NULL
    }
}

impl Deref for Identity {
    type Target = [u8; 32];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromStr for Identity {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Identity::from_hex(s)
    }
}

impl Identity {
    /// The null identity
    pub const NULL: Identity = Identity([0; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        Identity(bytes)
    }

    /// Get a reference to the internal bytes
    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_null(&self) -> bool {
        self.0 == [0; 32]
    }

    /// Full lowercase hex rendering with a `0x` prefix
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parse 64 hex characters, optionally prefixed with `0x`
    pub fn from_hex(s: &str) -> Result<Self, LedgerError> {
        let trimmed = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(trimmed)
            .map_err(|e| LedgerError::InvalidIdentity(format!("{}: {}", s, e)))?;
        let bytes: [u8; 32] = bytes.try_into().map_err(|v: Vec<u8>| {
            LedgerError::InvalidIdentity(format!("expected 32 bytes, got {}", v.len()))
        })?;
        Ok(Identity(bytes))
    }

    pub fn create_contract_id(seeds: &[&[u8]], bump: u8) -> [u8; 32] {
        let mut hasher = Sha256::new();

        // Domain separator
        hasher.update(b"CHECKS_Contract");

        for seed in seeds {
            hasher.update(seed);
        }

        hasher.update([bump]);

        hasher.finalize().into()
    }

    /// Returns true if the bytes do not decompress to an ed25519 point,
    /// meaning no private key can ever sign for them.
    pub fn is_off_curve(bytes: &[u8; 32]) -> bool {
        let Ok(compressed_edwards_y) = CompressedEdwardsY::from_slice(bytes.as_ref()) else {
            return true;
        };
        compressed_edwards_y.decompress().is_none()
    }

    /// Try to derive a contract identity for the given seeds
    pub fn try_derive_contract(seeds: &[&[u8]]) -> Option<(Identity, u8)> {
        for bump in 0..255 {
            let id = Identity::create_contract_id(seeds, bump);
            if Identity::is_off_curve(&id) && id != [0; 32] {
                return Some((Identity(id), bump));
            }
        }
        None
    }

    /// Derive a contract identity for the given seeds
    pub fn derive_contract(seeds: &[&[u8]]) -> Result<(Identity, u8), LedgerError> {
        Identity::try_derive_contract(seeds).ok_or_else(|| {
            LedgerError::InvalidIdentity("no off-curve contract identity for seeds".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(byte: u8) -> Identity {
        Identity::new([byte; 32])
    }

    #[test]
    fn test_null_identity() {
        assert!(Identity::NULL.is_null());
        assert!(Identity::default().is_null());
        assert_eq!(*Identity::default(), [0u8; 32]);
        assert!(!account(1).is_null());
    }

    #[test]
    fn test_display_uses_prefix() {
        let id = account(0xab);
        assert_eq!(id.to_string(), "id:abababababab");
    }

    #[test]
    fn test_hex_round_trip_and_prefix() {
        let id = account(7);
        let hex = id.to_hex();
        assert!(hex.starts_with("0x"));
        assert_eq!(Identity::from_hex(&hex).unwrap(), id);
        assert_eq!(hex[2..].parse::<Identity>().unwrap(), id);
    }

    #[test]
    fn test_from_hex_rejects_bad_input() {
        assert!(matches!(
            Identity::from_hex("0xzz"),
            Err(LedgerError::InvalidIdentity(_))
        ));
        assert!(matches!(
            Identity::from_hex("0x0102"),
            Err(LedgerError::InvalidIdentity(_))
        ));
    }

    #[test]
    fn test_create_contract_id() {
        let seed1 = b"checks";
        let seed2 = b"deployer";

        let id = Identity::create_contract_id(&[seed1, seed2], 5);
        assert_eq!(id, Identity::create_contract_id(&[seed1, seed2], 5));
        assert_ne!(id, Identity::create_contract_id(&[seed1, seed2], 6));
        assert_ne!(id, Identity::create_contract_id(&[seed2, seed1], 5));
    }

    #[test]
    fn test_derived_contract_is_off_curve() {
        let (id, bump) = Identity::derive_contract(&[b"checks", &[9u8; 32]]).unwrap();

        assert!(Identity::is_off_curve(&id));
        assert!(!id.is_null());
        assert_eq!(*id, Identity::create_contract_id(&[b"checks", &[9u8; 32]], bump));
    }

    #[test]
    fn test_different_deployers_get_different_contracts() {
        let (a, _) = Identity::derive_contract(&[b"checks", account(1).bytes()]).unwrap();
        let (b, _) = Identity::derive_contract(&[b"checks", account(2).bytes()]).unwrap();
        assert_ne!(a, b);
    }
}
