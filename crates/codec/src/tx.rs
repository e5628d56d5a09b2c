//! Conversion between native actions and signed Ethereum legacy
//! transactions.
//!
//! The mapping must be bit-exact: external wallets and explorers compute
//! transaction hashes with their own parsers, so the hash of a bridged
//! action has to equal the hash of its wire encoding everywhere.

use crate::{
    sig::{check_length, normalize_recovery_byte, pack_signature, pubkey_to_eth, recover_pubkey},
    CodecError, EthCompat, SIGNATURE_LENGTH,
};
use alloy::{
    consensus::{SignableTransaction, Signed, TxLegacy},
    primitives::{Address, Bytes, ChainId, Signature, TxKind, B256, U256},
};
use k256::ecdsa::{SigningKey, VerifyingKey};
use meridian_types::NativeAddress;

/// Build the unsigned legacy transaction representing an action.
///
/// An empty recipient maps to contract creation; anything else must parse as
/// a native address and becomes the 20-byte `to` field. The chain ID is
/// bound into the transaction so the signing hash is replay-protected.
pub fn to_eth_tx<T: EthCompat + ?Sized>(
    action: &T,
    chain_id: ChainId,
) -> Result<TxLegacy, CodecError> {
    let to = if action.recipient().is_empty() {
        TxKind::Create
    } else {
        let addr = NativeAddress::from_bech32(action.recipient())
            .map_err(|_| CodecError::InvalidRecipient(action.recipient().to_string()))?;
        TxKind::Call(addr.to_eth())
    };

    Ok(TxLegacy {
        chain_id: Some(chain_id),
        nonce: action.nonce(),
        gas_price: action
            .gas_price()
            .try_into()
            .map_err(|_| CodecError::GasPriceOverflow)?,
        gas_limit: action.gas_limit(),
        to,
        value: action.amount(),
        input: Bytes::copy_from_slice(action.payload()),
    })
}

/// The EIP-155 signing hash of an action: what the sender's key actually
/// signs.
pub fn unsigned_hash<T: EthCompat + ?Sized>(
    action: &T,
    chain_id: ChainId,
) -> Result<B256, CodecError> {
    Ok(to_eth_tx(action, chain_id)?.signature_hash())
}

/// The canonical transaction hash of a signed action: keccak of the signed
/// legacy wire encoding.
///
/// The signature must be exactly 65 bytes; a recovery byte of 27/28 is
/// accepted and normalized.
pub fn signed_hash<T: EthCompat + ?Sized>(
    action: &T,
    chain_id: ChainId,
    sig: &[u8],
) -> Result<B256, CodecError> {
    let sig = check_length(sig)?;
    let signed = attach_signature(to_eth_tx(action, chain_id)?, sig)?;
    Ok(*signed.hash())
}

/// Sign an action under the EIP-155 scheme and return the broadcast-ready
/// hex encoding of the signed transaction.
pub fn encode_signed_tx<T: EthCompat + ?Sized>(
    action: &T,
    key: &SigningKey,
    chain_id: ChainId,
) -> Result<String, CodecError> {
    let tx = to_eth_tx(action, chain_id)?;
    let prehash = tx.signature_hash();

    let (sig, recid) = key
        .sign_prehash_recoverable(prehash.as_slice())
        .map_err(|e| CodecError::Crypto(e.to_string()))?;
    let rs = sig.to_bytes();
    let signature = Signature::new(
        U256::from_be_slice(&rs.as_slice()[..32]),
        U256::from_be_slice(&rs.as_slice()[32..]),
        recid.is_y_odd(),
    );

    let signed = tx.into_signed(signature);
    let mut out = Vec::new();
    signed.rlp_encode(&mut out);
    Ok(hex::encode_prefixed(out))
}

/// A raw transaction decoded back into its parts.
#[derive(Debug, Clone)]
pub struct DecodedTx {
    /// The transaction body.
    pub tx: TxLegacy,
    /// The 65-byte recoverable signature, recovery byte normalized to {0,1}.
    pub signature: [u8; SIGNATURE_LENGTH],
    /// The public key recovered from the EIP-155 signing hash.
    pub pubkey: VerifyingKey,
    /// The canonical transaction hash.
    pub hash: B256,
}

impl DecodedTx {
    /// The Ethereum-style sender address.
    pub fn sender(&self) -> Address {
        pubkey_to_eth(&self.pubkey)
    }
}

/// Decode a hex-encoded signed legacy transaction and recover its signer.
///
/// The optional `0x` prefix is accepted. The transaction's EIP-155 chain ID
/// must equal `chain_id`: a missing or different binding means the derived
/// recovery id would fall outside {0, 1}, so it is rejected before recovery
/// instead of yielding a silently wrong key.
pub fn decode_raw_tx(raw: &str, chain_id: ChainId) -> Result<DecodedTx, CodecError> {
    let bytes = hex::decode(raw)?;
    let mut cursor = bytes.as_slice();
    let signed = Signed::<TxLegacy>::rlp_decode(&mut cursor)?;
    if !cursor.is_empty() {
        return Err(CodecError::MalformedRlp(alloy_rlp::Error::Custom(
            "trailing bytes after transaction",
        )));
    }

    if signed.tx().chain_id != Some(chain_id) {
        return Err(CodecError::ChainIdMismatch {
            got: signed.tx().chain_id,
            expected: chain_id,
        });
    }

    let signature = pack_signature(signed.signature());
    let pubkey = recover_pubkey(signed.signature_hash(), &signature)?;
    let hash = *signed.hash();
    let (tx, _, _) = signed.into_parts();

    Ok(DecodedTx { tx, signature, pubkey, hash })
}

/// Rebuild the signed transaction from a 65-byte signature, rebinding the
/// chain ID into `v`.
fn attach_signature(
    tx: TxLegacy,
    sig: &[u8; SIGNATURE_LENGTH],
) -> Result<Signed<TxLegacy>, CodecError> {
    let recid = normalize_recovery_byte(sig[64])?;
    let signature = Signature::new(
        U256::from_be_slice(&sig[..32]),
        U256::from_be_slice(&sig[32..64]),
        recid == 1,
    );
    Ok(tx.into_signed(signature))
}
