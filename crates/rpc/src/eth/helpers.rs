use alloy::primitives::Bytes;

/// Error output of `eth_call` and `eth_estimateGas`.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(untagged)]
pub enum CallErrorData {
    /// Error output is a byte array, usually revert data.
    Bytes(Bytes),
    /// Error message.
    String(String),
}

impl From<Bytes> for CallErrorData {
    fn from(bytes: Bytes) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<String> for CallErrorData {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}
