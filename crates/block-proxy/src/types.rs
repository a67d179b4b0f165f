use serde::{
    Deserialize,
    Serialize,
};
use serde_with::{
    DefaultOnNull,
    serde_as,
};

use crate::identifier::parse_quantity;

/// Header fields shared by [`Block`] and [`BlockSummary`].
///
/// Values are kept as the hex strings the node sent; the proxy never
/// interprets them beyond the block number.
#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlockHeader {
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub difficulty: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub extra_data: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub gas_limit: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub gas_used: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub hash: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub logs_bloom: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub miner: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub mix_hash: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub nonce: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub number: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub parent_hash: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub receipts_root: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub sha3_uncles: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub size: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub state_root: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub timestamp: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub total_difficulty: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub transactions_root: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub uncles: Vec<String>,
}

/// A block as returned by `eth_getBlockByNumber` with full transaction objects.
///
/// Nodes may send `null` for any field; it decodes like an absent one.
#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    #[serde(flatten)]
    pub header: BlockHeader,
    #[serde(default)]
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub transactions: Vec<Transaction>,
}

impl Block {
    pub fn hash(&self) -> &str {
        &self.header.hash
    }

    /// The block number as an integer, if the node sent a well formed quantity.
    pub fn number_u64(&self) -> Option<u64> {
        parse_quantity(&self.header.number)
    }

    /// Collapses the transactions into their hashes, keeping block order.
    pub fn to_summary(&self) -> BlockSummary {
        BlockSummary {
            header: self.header.clone(),
            transactions: self.transactions.iter().map(|tx| tx.hash.clone()).collect(),
        }
    }
}

/// A block whose transactions are listed by hash only.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockSummary {
    #[serde(flatten)]
    pub header: BlockHeader,
    #[serde(default)]
    pub transactions: Vec<String>,
}

#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Transaction {
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub block_hash: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub block_number: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub from: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub gas: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub gas_price: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub hash: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub input: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub nonce: String,
    /// `None` for contract creations.
    pub to: Option<String>,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub transaction_index: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub value: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub v: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub r: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    pub s: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_block_deserializes_from_node_json() {
        let block: Block = serde_json::from_value(json!({
            "number": "0x1b4",
            "hash": "0xdc0818cf78f21a8e70579cb46a43643f78291264dda342ae31049421c82d21ae",
            "parentHash": "0xe99e022112df268087ea7eafaf4790497fd21dbeeb6bd7a1721df161a6657a54",
            "uncles": ["0xaa"],
            "transactions": [{
                "hash": "0x01",
                "transactionIndex": "0x0",
                "to": null
            }]
        }))
        .unwrap();

        assert_eq!(block.number_u64(), Some(0x1b4));
        assert_eq!(block.header.uncles, vec!["0xaa".to_string()]);
        assert_eq!(block.transactions.len(), 1);
        assert_eq!(block.transactions[0].to, None);
        // Fields absent upstream fall back to empty strings.
        assert!(block.header.total_difficulty.is_empty());
    }

    #[test]
    fn test_null_fields_decode_as_defaults() {
        let block: Block = serde_json::from_value(json!({
            "number": "0x10",
            "hash": "0xaa",
            "totalDifficulty": null,
            "mixHash": null,
            "nonce": null,
            "uncles": null,
            "transactions": [{
                "hash": "0x01",
                "transactionIndex": "0x0",
                "gasPrice": null,
                "to": null
            }]
        }))
        .unwrap();

        assert_eq!(block.number_u64(), Some(0x10));
        assert!(block.header.total_difficulty.is_empty());
        assert!(block.header.mix_hash.is_empty());
        assert!(block.header.nonce.is_empty());
        assert!(block.header.uncles.is_empty());
        assert!(block.transactions[0].gas_price.is_empty());
        assert_eq!(block.transactions[0].to, None);

        let empty: Block = serde_json::from_value(json!({
            "number": "0x11",
            "hash": "0xbb",
            "transactions": null
        }))
        .unwrap();
        assert!(empty.transactions.is_empty());
    }

    #[test]
    fn test_summary_keeps_transaction_order() {
        let block = Block {
            header: BlockHeader {
                hash: "0xabc".into(),
                number: "0x1".into(),
                ..Default::default()
            },
            transactions: vec![
                Transaction {
                    hash: "0x02".into(),
                    ..Default::default()
                },
                Transaction {
                    hash: "0x01".into(),
                    ..Default::default()
                },
            ],
        };

        let summary = block.to_summary();
        assert_eq!(summary.header, block.header);
        assert_eq!(summary.transactions, vec!["0x02", "0x01"]);

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["hash"], "0xabc");
        assert_eq!(value["transactions"], json!(["0x02", "0x01"]));
        assert!(value.get("header").is_none());
    }

    #[test]
    fn test_malformed_number() {
        let block = Block {
            header: BlockHeader {
                number: "pending".into(),
                ..Default::default()
            },
            transactions: vec![],
        };
        assert_eq!(block.number_u64(), None);
    }
}
