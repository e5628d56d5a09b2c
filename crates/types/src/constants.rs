//! Chain-level constants shared across the bridge.

use crate::NativeAddress;
use std::sync::OnceLock;

/// Chain ID of the Meridian mainnet.
pub const MAINNET_CHAIN_ID: u64 = 7878;

/// Chain ID of the Meridian public testnet.
pub const TESTNET_CHAIN_ID: u64 = 7879;

/// Identity of a known Meridian network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainInfo {
    chain_id: u64,
    network_name: &'static str,
}

impl ChainInfo {
    /// Instantiate a network identity.
    pub const fn new(chain_id: u64, network_name: &'static str) -> Self {
        Self { chain_id, network_name }
    }

    /// The EIP-155 chain ID.
    pub const fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Human-readable network name.
    pub const fn network_name(&self) -> &'static str {
        self.network_name
    }
}

/// The Meridian mainnet.
pub const MAINNET: ChainInfo = ChainInfo::new(MAINNET_CHAIN_ID, "meridian-mainnet");

/// The Meridian public testnet.
pub const TESTNET: ChainInfo = ChainInfo::new(TESTNET_CHAIN_ID, "meridian-testnet");

/// Look up a known network by chain ID.
pub const fn chain_info(chain_id: u64) -> Option<ChainInfo> {
    match chain_id {
        MAINNET_CHAIN_ID => Some(MAINNET),
        TESTNET_CHAIN_ID => Some(TESTNET),
        _ => None,
    }
}

/// Protocol version string reported by `eth_protocolVersion`.
pub const PROTOCOL_VERSION: &str = "64";

/// Version tag stamped into actions rebuilt from raw Ethereum transactions.
pub const ACTION_VERSION: u32 = 1;

/// Gas charged for a plain value transfer.
pub const BASE_TX_GAS: u64 = 21_000;

/// Gas charged per non-zero calldata byte.
pub const TX_DATA_NONZERO_GAS: u64 = 16;

/// Gas charged per zero calldata byte.
pub const TX_DATA_ZERO_GAS: u64 = 4;

/// Additional gas charged for contract creation.
pub const CREATION_GAS: u64 = 32_000;

/// Base gas the ledger itself charges for any action, before execution.
///
/// Distinct from [`BASE_TX_GAS`]: that is the Ethereum-side cost model used
/// for `eth_estimateGas`, this is the ledger's native admission charge.
pub const TRANSFER_BASE_GAS: u64 = 10_000;

/// Gas the ledger charges per byte of action payload.
pub const TRANSFER_PAYLOAD_GAS: u64 = 100;

/// The minimum gas price accepted by the ledger, in the smallest native
/// denomination. Doubles as the suggested price returned by `eth_gasPrice`.
pub const SUGGESTED_GAS_PRICE: u64 = 1_000_000_000_000;

/// Account that receives staking operations bridged as contract calls.
///
/// Raw transactions addressed here are decoded into staking actions; the
/// calldata is the staking command in its protocol encoding.
pub const STAKING_PROTOCOL_ADDRESS: NativeAddress =
    NativeAddress::new(*b"staking.protocol\0\0\0\0");

/// The bech32 form of [`STAKING_PROTOCOL_ADDRESS`].
pub fn staking_protocol_bech32() -> &'static str {
    static ENCODED: OnceLock<String> = OnceLock::new();
    ENCODED.get_or_init(|| STAKING_PROTOCOL_ADDRESS.to_bech32())
}
