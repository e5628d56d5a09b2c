//! Ethereum-shaped response types.
//!
//! The ledger's native views carry everything these need, but wallets expect
//! the exact field names and hex conventions of the Ethereum JSON-RPC schema:
//! quantities as minimal `0x`-hex, byte strings `0x`-prefixed, absent values
//! as `null`. Everything here serializes to that schema and deserializes back
//! so formatted results can sit in the memo cache.

use alloy::{
    primitives::{b256, Address, Bloom, Bytes, LogData, B256, B64, U256, U64},
    rpc::types::Log,
};
use meridian_types::{
    ActionInfo, AddressError, BlockView, IndexedLog, NativeAddress, ReceiptView, SealedAction,
};
use serde::{Deserialize, Serialize};

/// Keccak of the RLP encoding of an empty list, reported as `sha3Uncles`.
/// The ledger has no uncles, so every block reports this constant.
pub(crate) const EMPTY_UNCLES_HASH: B256 =
    b256!("1dcc4de8dec75d7aab85b567b6ccd41ad312451b948a7413f0a142fd40d49347");

/// A transaction formatted for the `eth_` surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcTransaction {
    /// Canonical transaction hash.
    pub hash: B256,
    /// Sender nonce.
    pub nonce: U64,
    /// Hash of the containing block.
    pub block_hash: Option<B256>,
    /// Height of the containing block.
    pub block_number: Option<U64>,
    /// Position within the block.
    pub transaction_index: Option<U64>,
    /// Sender address.
    pub from: Address,
    /// Recipient address. `null` for contract creation.
    pub to: Option<Address>,
    /// Transferred value.
    pub value: U256,
    /// Gas price offered.
    pub gas_price: U256,
    /// Gas limit.
    pub gas: U64,
    /// Call input or init code.
    pub input: Bytes,
    /// EIP-155 recovery value.
    pub v: U64,
    /// Signature `r`.
    pub r: U256,
    /// Signature `s`.
    pub s: U256,
}

impl RpcTransaction {
    /// Format a sealed action at a known block position.
    pub(crate) fn from_sealed(
        sealed: &SealedAction,
        chain_id: u64,
        block_hash: B256,
        block_number: u64,
        index: u64,
    ) -> Result<Self, AddressError> {
        let recipient = sealed.action.recipient();
        let to = if recipient.is_empty() {
            None
        } else {
            Some(NativeAddress::from_bech32(recipient)?.to_eth())
        };

        let sig = &sealed.signature;
        Ok(Self {
            hash: sealed.hash,
            nonce: U64::from(sealed.action.nonce()),
            block_hash: Some(block_hash),
            block_number: Some(U64::from(block_number)),
            transaction_index: Some(U64::from(index)),
            from: sealed.sender.to_eth(),
            to,
            value: sealed.action.amount(),
            gas_price: sealed.action.gas_price(),
            gas: U64::from(sealed.action.gas_limit()),
            input: Bytes::copy_from_slice(sealed.action.data()),
            v: U64::from(2 * chain_id + 35 + sig[64] as u64),
            r: U256::from_be_slice(&sig[..32]),
            s: U256::from_be_slice(&sig[32..64]),
        })
    }

    /// Format a located action.
    pub(crate) fn from_info(info: &ActionInfo, chain_id: u64) -> Result<Self, AddressError> {
        Self::from_sealed(&info.sealed, chain_id, info.block_hash, info.block_height, info.index)
    }
}

/// The transaction list of a block: hashes only, or fully formatted
/// transactions, depending on the caller's flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockTransactions {
    /// Full transaction objects.
    Full(Vec<RpcTransaction>),
    /// Transaction hashes only.
    Hashes(Vec<B256>),
}

impl BlockTransactions {
    /// Number of transactions, regardless of shape.
    pub fn len(&self) -> usize {
        match self {
            Self::Full(txs) => txs.len(),
            Self::Hashes(hashes) => hashes.len(),
        }
    }

    /// True if the block holds no transactions.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A block formatted for the `eth_` surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcBlock {
    /// Block height.
    pub number: U64,
    /// Block hash.
    pub hash: B256,
    /// Parent block hash.
    pub parent_hash: B256,
    /// Constant [`EMPTY_UNCLES_HASH`]; the ledger has no uncles.
    pub sha3_uncles: B256,
    /// Proof-of-work nonce, always zero.
    pub nonce: B64,
    /// Bloom over the block's logs.
    pub logs_bloom: Bloom,
    /// Root over the block's actions.
    pub transactions_root: B256,
    /// State root after the block.
    pub state_root: B256,
    /// Root over the block's receipts.
    pub receipts_root: B256,
    /// Block producer.
    pub miner: Address,
    /// Always zero; the ledger is not proof-of-work.
    pub difficulty: U256,
    /// Always zero.
    pub total_difficulty: U256,
    /// Always empty.
    pub extra_data: Bytes,
    /// Block gas limit.
    pub gas_limit: U64,
    /// Gas consumed by the block.
    pub gas_used: U64,
    /// Unix timestamp (seconds).
    pub timestamp: U64,
    /// The transaction list, shaped per the request.
    pub transactions: BlockTransactions,
    /// Always empty.
    pub uncles: Vec<B256>,
}

impl RpcBlock {
    /// Format a block view. `full` selects transaction objects over hashes.
    pub(crate) fn from_view(
        view: &BlockView,
        full: bool,
        chain_id: u64,
    ) -> Result<Self, AddressError> {
        let header = &view.header;

        let transactions = if full {
            BlockTransactions::Full(
                view.actions
                    .iter()
                    .enumerate()
                    .map(|(idx, sealed)| {
                        RpcTransaction::from_sealed(
                            sealed,
                            chain_id,
                            header.hash,
                            header.height,
                            idx as u64,
                        )
                    })
                    .collect::<Result<_, _>>()?,
            )
        } else {
            BlockTransactions::Hashes(view.actions.iter().map(|sealed| sealed.hash).collect())
        };

        Ok(Self {
            number: U64::from(header.height),
            hash: header.hash,
            parent_hash: header.parent_hash,
            sha3_uncles: EMPTY_UNCLES_HASH,
            nonce: B64::ZERO,
            logs_bloom: header.logs_bloom,
            transactions_root: header.transactions_root,
            state_root: header.state_root,
            receipts_root: header.receipts_root,
            miner: header.producer.to_eth(),
            difficulty: U256::ZERO,
            total_difficulty: U256::ZERO,
            extra_data: Bytes::new(),
            gas_limit: U64::from(header.gas_limit),
            gas_used: U64::from(header.gas_used),
            timestamp: U64::from(header.timestamp),
            transactions,
            uncles: Vec::new(),
        })
    }
}

/// A receipt formatted for the `eth_` surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcReceipt {
    /// Hash of the transaction this receipt belongs to.
    pub transaction_hash: B256,
    /// Position within the block.
    pub transaction_index: U64,
    /// Hash of the containing block.
    pub block_hash: B256,
    /// Height of the containing block.
    pub block_number: U64,
    /// Sender address.
    pub from: Address,
    /// Recipient address. `null` for contract creation.
    pub to: Option<Address>,
    /// Gas consumed by the block up to and including this transaction.
    pub cumulative_gas_used: U64,
    /// Gas consumed by this transaction.
    pub gas_used: U64,
    /// Created contract address, for creation transactions.
    pub contract_address: Option<Address>,
    /// Logs emitted by this transaction.
    pub logs: Vec<Log>,
    /// Bloom over this receipt's logs.
    pub logs_bloom: Bloom,
    /// `0x1` on success, `0x0` on failure.
    pub status: U64,
}

impl RpcReceipt {
    /// Format a receipt, joining in sender and recipient from the located
    /// action.
    pub(crate) fn from_parts(
        receipt: &ReceiptView,
        info: &ActionInfo,
    ) -> Result<Self, AddressError> {
        let recipient = info.sealed.action.recipient();
        let to = if recipient.is_empty() {
            None
        } else {
            Some(NativeAddress::from_bech32(recipient)?.to_eth())
        };

        let mut logs_bloom = Bloom::default();
        let logs = receipt
            .logs
            .iter()
            .map(|view| {
                let inner = alloy::primitives::Log {
                    address: view.address.to_eth(),
                    data: LogData::new_unchecked(view.topics.clone(), view.data.clone()),
                };
                logs_bloom.accrue_log(&inner);
                Log {
                    inner,
                    block_hash: Some(receipt.block_hash),
                    block_number: Some(receipt.block_height),
                    block_timestamp: None,
                    transaction_hash: Some(receipt.action_hash),
                    transaction_index: Some(receipt.tx_index),
                    log_index: Some(view.log_index),
                    removed: false,
                }
            })
            .collect();

        Ok(Self {
            transaction_hash: receipt.action_hash,
            transaction_index: U64::from(receipt.tx_index),
            block_hash: receipt.block_hash,
            block_number: U64::from(receipt.block_height),
            from: info.sealed.sender.to_eth(),
            to,
            cumulative_gas_used: U64::from(receipt.cumulative_gas_used),
            gas_used: U64::from(receipt.gas_used),
            contract_address: receipt.contract_address.map(NativeAddress::to_eth),
            logs,
            logs_bloom,
            status: U64::from(receipt.status),
        })
    }
}

/// Shape an indexed log record into the wire log type.
pub(crate) fn log_from_indexed(record: &IndexedLog) -> Log {
    Log {
        inner: alloy::primitives::Log {
            address: record.address,
            data: LogData::new_unchecked(record.topics.clone(), record.data.clone()),
        },
        block_hash: Some(record.block_hash),
        block_number: Some(record.block_height),
        block_timestamp: None,
        transaction_hash: Some(record.action_hash),
        transaction_index: Some(record.tx_index),
        log_index: Some(record.log_index),
        removed: false,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use meridian_types::{Action, ActionCore, ActionPayload, HeaderView};

    fn sealed(nonce: u64, recipient: String) -> SealedAction {
        let action = Action::new(
            ActionCore {
                version: 1,
                nonce,
                gas_limit: 21_000,
                gas_price: U256::from(1_000_000_000_000u64),
            },
            ActionPayload::Transfer {
                amount: U256::from(5u64),
                recipient,
                payload: Bytes::new(),
            },
        );
        let mut signature = [0x41_u8; 65];
        signature[64] = 1;
        SealedAction {
            action,
            sender: NativeAddress::new([0xaa; 20]),
            signature,
            hash: B256::repeat_byte(nonce as u8),
        }
    }

    fn header(height: u64) -> HeaderView {
        HeaderView {
            height,
            hash: B256::repeat_byte(0x10),
            parent_hash: B256::repeat_byte(0x0f),
            timestamp: 1_700_000_000,
            producer: NativeAddress::new([0x01; 20]),
            gas_limit: 50_000_000,
            gas_used: 21_000,
            logs_bloom: Bloom::default(),
            state_root: B256::repeat_byte(0x20),
            transactions_root: B256::repeat_byte(0x21),
            receipts_root: B256::repeat_byte(0x22),
        }
    }

    #[test]
    fn test_transaction_shape() {
        let tx = RpcTransaction::from_sealed(
            &sealed(0, NativeAddress::new([0x02; 20]).to_bech32()),
            7878,
            B256::repeat_byte(0x10),
            3,
            0,
        )
        .unwrap();

        let json = serde_json::to_value(&tx).unwrap();
        // Quantities are minimal hex, zero is "0x0".
        assert_eq!(json["nonce"], "0x0");
        assert_eq!(json["blockNumber"], "0x3");
        assert_eq!(json["gas"], "0x5208");
        assert_eq!(json["to"], format!("{:?}", Address::from([0x02; 20])));
        // v binds the chain ID: 2 * 7878 + 35 + 1.
        assert_eq!(json["v"], "0x3da0");
    }

    #[test]
    fn test_creation_transaction_has_null_to() {
        let action = Action::new(
            ActionCore { version: 1, nonce: 1, gas_limit: 100_000, gas_price: U256::ZERO },
            ActionPayload::Execution {
                amount: U256::ZERO,
                contract: String::new(),
                data: Bytes::from(vec![0x60]),
            },
        );
        let sealed = SealedAction {
            action,
            sender: NativeAddress::new([0xbb; 20]),
            signature: [0; 65],
            hash: B256::ZERO,
        };

        let tx =
            RpcTransaction::from_sealed(&sealed, 7878, B256::ZERO, 1, 0).unwrap();
        assert_eq!(tx.to, None);
        assert_eq!(serde_json::to_value(&tx).unwrap()["to"], serde_json::Value::Null);
    }

    #[test]
    fn test_block_transaction_shapes_agree_on_length() {
        let view = BlockView {
            header: header(3),
            actions: vec![
                sealed(0, NativeAddress::new([2; 20]).to_bech32()),
                sealed(1, NativeAddress::new([3; 20]).to_bech32()),
            ],
        };

        let hashes = RpcBlock::from_view(&view, false, 7878).unwrap();
        let full = RpcBlock::from_view(&view, true, 7878).unwrap();

        assert_eq!(hashes.transactions.len(), 2);
        assert_eq!(full.transactions.len(), 2);
        assert!(matches!(hashes.transactions, BlockTransactions::Hashes(_)));
        assert!(matches!(full.transactions, BlockTransactions::Full(_)));

        let json = serde_json::to_value(&hashes).unwrap();
        assert_eq!(json["sha3Uncles"], format!("{EMPTY_UNCLES_HASH:?}"));
        assert_eq!(json["uncles"], serde_json::json!([]));
        assert_eq!(json["difficulty"], "0x0");
    }

    #[test]
    fn test_block_memo_roundtrip() {
        let view =
            BlockView { header: header(9), actions: vec![sealed(4, NativeAddress::new([8; 20]).to_bech32())] };
        let block = RpcBlock::from_view(&view, true, 7878).unwrap();

        let bytes = serde_json::to_vec(&block).unwrap();
        assert_eq!(serde_json::from_slice::<RpcBlock>(&bytes).unwrap(), block);
    }

    #[test]
    fn test_receipt_joins_action_context() {
        let sealed = sealed(2, NativeAddress::new([0x02; 20]).to_bech32());
        let info = ActionInfo {
            sealed: sealed.clone(),
            block_height: 5,
            block_hash: B256::repeat_byte(0x50),
            index: 1,
        };
        let receipt = ReceiptView {
            action_hash: sealed.hash,
            status: 1,
            gas_used: 21_000,
            cumulative_gas_used: 42_000,
            contract_address: None,
            logs: vec![meridian_types::LogView {
                address: NativeAddress::new([0x03; 20]),
                topics: vec![B256::repeat_byte(0x07)],
                data: Bytes::from(vec![1, 2]),
                log_index: 0,
            }],
            block_height: 5,
            block_hash: B256::repeat_byte(0x50),
            tx_index: 1,
        };

        let formatted = RpcReceipt::from_parts(&receipt, &info).unwrap();
        assert_eq!(formatted.from, NativeAddress::new([0xaa; 20]).to_eth());
        assert_eq!(formatted.to, Some(Address::from([0x02; 20])));
        assert_eq!(formatted.logs.len(), 1);
        // The bloom covers the emitting address and topics.
        assert!(formatted.logs_bloom.contains_input(alloy::primitives::BloomInput::Raw(
            Address::from([0x03; 20]).as_slice()
        )));

        let json = serde_json::to_value(&formatted).unwrap();
        assert_eq!(json["status"], "0x1");
        assert_eq!(json["cumulativeGasUsed"], "0xa410");
    }
}
