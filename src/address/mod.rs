// Instantiate2 address prediction
//
// Contract addresses on wasmd chains are derived from the creator, the code
// checksum and a salt. This module reproduces that rule so addresses can be
// referenced before the contracts exist.

use common::{Address, AddressError, Checksum, Salt};
use sha2::{Digest, Sha256};

/// Domain tag prefixed to every instantiate2 preimage
const WASM_DOMAIN: &[u8] = b"wasm";

/// Module name whose hash seeds the outer hash
const MODULE_NAME: &[u8] = b"module";

/// Predicts contract addresses for one network prefix
#[derive(Debug, Clone)]
pub struct AddressPredictor {
    prefix: String,
}

impl AddressPredictor {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Predict the address of a contract instantiated without `fix_msg`
    pub fn predict(
        &self,
        creator: &Address,
        checksum: &Checksum,
        salt: &Salt,
    ) -> Result<Address, AddressError> {
        self.predict_with_msg(creator, checksum, salt, &[])
    }

    /// Predict the address of a contract whose init message is part of the
    /// derivation (`fix_msg = true`)
    pub fn predict_with_msg(
        &self,
        creator: &Address,
        checksum: &Checksum,
        salt: &Salt,
        msg: &[u8],
    ) -> Result<Address, AddressError> {
        let payload = instantiate2_payload(creator.payload(), checksum, salt.as_bytes(), msg)?;
        Address::from_payload(&self.prefix, &payload)
    }

    /// Same as [`predict`](Self::predict) but starting from raw strings
    pub fn predict_str(
        &self,
        creator: &str,
        checksum_hex: &str,
        salt: &str,
    ) -> Result<Address, AddressError> {
        let creator = Address::parse(creator)?;
        let checksum = Checksum::from_hex(checksum_hex)?;
        let salt = Salt::new(salt)?;
        self.predict(&creator, &checksum, &salt)
    }
}

/// Compute the 32 byte instantiate2 address payload
pub fn instantiate2_payload(
    creator: &[u8],
    checksum: &Checksum,
    salt: &[u8],
    msg: &[u8],
) -> Result<[u8; 32], AddressError> {
    if creator.is_empty() {
        return Err(AddressError::InvalidCreator("empty creator payload".to_string()));
    }
    if salt.is_empty() || salt.len() > common::MAX_SALT_LEN {
        return Err(AddressError::InvalidSaltLength(salt.len()));
    }

    let mut preimage =
        Vec::with_capacity(WASM_DOMAIN.len() + 1 + 4 * 8 + 32 + creator.len() + salt.len() + msg.len());
    preimage.extend_from_slice(WASM_DOMAIN);
    preimage.push(0);
    push_length_prefixed(&mut preimage, checksum.as_bytes());
    push_length_prefixed(&mut preimage, creator);
    push_length_prefixed(&mut preimage, salt);
    push_length_prefixed(&mut preimage, msg);

    Ok(module_hash(&preimage))
}

fn push_length_prefixed(buf: &mut Vec<u8>, data: &[u8]) {
    buf.extend_from_slice(&(data.len() as u64).to_be_bytes());
    buf.extend_from_slice(data);
}

/// SHA-256(SHA-256("module") || data), the full digest is kept
fn module_hash(data: &[u8]) -> [u8; 32] {
    let type_hash = Sha256::digest(MODULE_NAME);
    let mut hasher = Sha256::new();
    hasher.update(type_hash);
    hasher.update(data);
    hasher.finalize().into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CHECKSUM: &str = "13a1fc994cc6d1c81b746ee0c0ff6f90043875e0bf1d9be6b7d779fc978dc2a5";
    const CREATOR: &str = "9999999999aaaaaaaaaabbbbbbbbbbcccccccccc";

    fn checksum() -> Checksum {
        Checksum::from_hex(CHECKSUM).unwrap()
    }

    #[test]
    fn test_payload_matches_reference() {
        let creator = hex::decode(CREATOR).unwrap();
        let payload = instantiate2_payload(&creator, &checksum(), b"a", &[]).unwrap();
        assert_eq!(
            hex::encode(payload),
            "5e865d3e45ad3e961f77fd77d46543417ced44d924dc3e079b5415ff6775f847"
        );
    }

    #[test]
    fn test_msg_changes_payload() {
        let creator = hex::decode(CREATOR).unwrap();
        let payload = instantiate2_payload(&creator, &checksum(), b"a", b"{}").unwrap();
        assert_eq!(
            hex::encode(payload),
            "0995499608947a5281e2c7ebd71bdb26a1ad981946dad57f6c4d3ee35de77835"
        );
    }

    #[test]
    fn test_payload_is_full_digest() {
        let creator = hex::decode(CREATOR).unwrap();
        let payload = instantiate2_payload(&creator, &checksum(), b"salt", &[]).unwrap();
        assert_eq!(payload.len(), 32);
    }

    #[test]
    fn test_salt_bounds() {
        let creator = hex::decode(CREATOR).unwrap();
        assert_eq!(
            instantiate2_payload(&creator, &checksum(), &[], &[]),
            Err(AddressError::InvalidSaltLength(0))
        );
        assert_eq!(
            instantiate2_payload(&creator, &checksum(), &[7u8; 65], &[]),
            Err(AddressError::InvalidSaltLength(65))
        );
        assert!(instantiate2_payload(&creator, &checksum(), &[7u8; 64], &[]).is_ok());
    }

    #[test]
    fn test_predict_str_rejects_bad_creator() {
        let predictor = AddressPredictor::new("purple");
        let err = predictor.predict_str("garbage", CHECKSUM, "a").unwrap_err();
        assert!(matches!(err, AddressError::InvalidCreator(_)));
    }
}
