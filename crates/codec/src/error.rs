use alloy::primitives::ChainId;

/// Errors raised while converting between actions and Ethereum transactions.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The recipient string is not a parseable native address.
    #[error("invalid recipient address: {0}")]
    InvalidRecipient(String),
    /// The signature is not exactly 65 bytes.
    #[error("invalid signature length = {0}, expecting 65")]
    InvalidSignatureLength(usize),
    /// The recovery byte is outside {0, 1} after legacy normalization.
    #[error("invalid recovery id: {0}")]
    InvalidRecoveryId(u8),
    /// The payload does not RLP-decode into a signed legacy transaction.
    #[error("malformed transaction rlp: {0}")]
    MalformedRlp(#[from] alloy_rlp::Error),
    /// The transaction is bound to a different chain (or carries a pre-155
    /// unprotected signature).
    #[error("chain id mismatch: transaction is bound to {got:?}, expected {expected}")]
    ChainIdMismatch {
        /// Chain ID recovered from the transaction's `v`, if any.
        got: Option<ChainId>,
        /// Chain ID this bridge serves.
        expected: ChainId,
    },
    /// The action's gas price does not fit the legacy transaction field.
    #[error("gas price exceeds 128 bits")]
    GasPriceOverflow,
    /// The raw transaction string is not valid hex.
    #[error("invalid transaction hex: {0}")]
    Hex(#[from] hex::FromHexError),
    /// Signing or recovery failed inside the curve implementation.
    #[error("signature operation failed: {0}")]
    Crypto(String),
}
