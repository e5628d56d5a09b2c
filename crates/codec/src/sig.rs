//! Recoverable-signature helpers shared by the codec operations.

use crate::CodecError;
use alloy::primitives::{keccak256, Address, Signature, B256};
use k256::ecdsa::{RecoveryId, VerifyingKey};

/// Length of a recoverable signature: 32-byte `r`, 32-byte `s`, one recovery
/// byte.
pub const SIGNATURE_LENGTH: usize = 65;

/// Borrow a byte slice as a 65-byte signature, rejecting any other length.
pub(crate) fn check_length(sig: &[u8]) -> Result<&[u8; SIGNATURE_LENGTH], CodecError> {
    sig.try_into().map_err(|_| CodecError::InvalidSignatureLength(sig.len()))
}

/// Normalize a recovery byte to {0, 1}, accepting the legacy {27, 28}
/// convention. Anything else is an error rather than a silent wrong-key
/// recovery.
pub(crate) const fn normalize_recovery_byte(v: u8) -> Result<u8, CodecError> {
    let norm = if v >= 27 { v - 27 } else { v };
    if norm > 1 {
        return Err(CodecError::InvalidRecoveryId(v));
    }
    Ok(norm)
}

/// Recover the signing public key from a prehash and a 65-byte signature.
pub(crate) fn recover_pubkey(
    prehash: B256,
    sig: &[u8; SIGNATURE_LENGTH],
) -> Result<VerifyingKey, CodecError> {
    let recid = RecoveryId::try_from(normalize_recovery_byte(sig[64])?)
        .map_err(|e| CodecError::Crypto(e.to_string()))?;
    let signature = k256::ecdsa::Signature::from_slice(&sig[..64])
        .map_err(|e| CodecError::Crypto(e.to_string()))?;
    VerifyingKey::recover_from_prehash(prehash.as_slice(), &signature, recid)
        .map_err(|e| CodecError::Crypto(e.to_string()))
}

/// The Ethereum-style address of a public key: the low 20 bytes of the
/// keccak hash of the uncompressed point, SEC1 tag dropped.
pub fn pubkey_to_eth(pubkey: &VerifyingKey) -> Address {
    let point = pubkey.to_encoded_point(false);
    let digest = keccak256(&point.as_bytes()[1..]);
    Address::from_slice(&digest[12..])
}

/// Flatten an r/s/parity signature into the 65-byte wire form. The big-endian
/// limbs are always written full width, so short `r`/`s` values stay
/// zero-padded.
pub(crate) fn pack_signature(sig: &Signature) -> [u8; SIGNATURE_LENGTH] {
    let mut out = [0u8; SIGNATURE_LENGTH];
    out[..32].copy_from_slice(&sig.r().to_be_bytes::<32>());
    out[32..64].copy_from_slice(&sig.s().to_be_bytes::<32>());
    out[64] = sig.v() as u8;
    out
}
