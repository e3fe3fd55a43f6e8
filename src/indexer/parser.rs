//! Log decoding and event dispatch.
//!
//! The ingestion engine delivers raw logs; this module decodes them into
//! typed events by topic0 signature. The creation event shares one signature
//! across all three initializer contracts, so the pool version is resolved
//! from the emitting address through a dispatch table built from config.

use alloy::{
    primitives::{B256, LogData},
    sol_types::SolEvent,
};
use rustc_hash::FxHashMap;

use crate::abis::{factory, v2, v3, v4};
use crate::config::ChainSettings;
use crate::store::models::PoolType;

/// Raw log as handed over by the ingestion engine.
#[derive(Debug, Clone)]
pub struct RawLog {
    pub block_number: u64,
    pub block_timestamp: u64,
    /// Emitting contract, lowercase hex.
    pub address: String,
    pub topics: Vec<B256>,
    pub data: Vec<u8>,
    pub tx_hash: String,
    pub log_index: u32,
}

/// Typed event plus the per-log metadata every handler needs.
pub enum ParsedEvent {
    PoolCreated {
        pool_type: PoolType,
        event: factory::Create,
        block_number: u64,
        tx_hash: String,
        block_timestamp: u64,
    },
    V2Swap {
        event: v2::Swap,
        log_address: String,
        block_number: u64,
        log_index: u32,
        tx_hash: String,
        block_timestamp: u64,
    },
    V3Swap {
        event: v3::Swap,
        log_address: String,
        block_number: u64,
        log_index: u32,
        tx_hash: String,
        block_timestamp: u64,
    },
    V4Swap {
        event: v4::Swap,
        block_number: u64,
        log_index: u32,
        tx_hash: String,
        block_timestamp: u64,
    },
}

/// Contract-address dispatch table for version resolution.
pub struct EventDispatch {
    initializers: FxHashMap<String, PoolType>,
}

impl EventDispatch {
    pub fn new(chain: &ChainSettings) -> Self {
        let mut initializers = FxHashMap::default();
        initializers.insert(chain.v2_initializer.to_lowercase(), PoolType::V2);
        initializers.insert(chain.v3_initializer.to_lowercase(), PoolType::V3);
        initializers.insert(chain.v4_initializer.to_lowercase(), PoolType::V4);
        Self { initializers }
    }

    fn initializer_pool_type(&self, address: &str) -> Option<PoolType> {
        self.initializers.get(address).copied()
    }
}

/// Decode one raw log. Returns None for topics this core does not handle
/// and for creation events emitted by contracts outside the dispatch table.
pub fn parse_log(raw: RawLog, dispatch: &EventDispatch) -> Option<ParsedEvent> {
    if raw.topics.is_empty() {
        return None;
    }

    let log_data = LogData::new_unchecked(raw.topics, raw.data.into());
    let topic0 = log_data.topics().first()?;

    match topic0 {
        t if t == &factory::Create::SIGNATURE_HASH.0 => {
            let pool_type = dispatch.initializer_pool_type(&raw.address)?;
            let event = factory::Create::decode_log_data(&log_data).ok()?;
            Some(ParsedEvent::PoolCreated {
                pool_type,
                event,
                block_number: raw.block_number,
                tx_hash: raw.tx_hash,
                block_timestamp: raw.block_timestamp,
            })
        },
        t if t == &v2::Swap::SIGNATURE_HASH.0 => {
            let event = v2::Swap::decode_log_data(&log_data).ok()?;
            Some(ParsedEvent::V2Swap {
                event,
                log_address: raw.address,
                block_number: raw.block_number,
                log_index: raw.log_index,
                tx_hash: raw.tx_hash,
                block_timestamp: raw.block_timestamp,
            })
        },
        t if t == &v3::Swap::SIGNATURE_HASH.0 => {
            let event = v3::Swap::decode_log_data(&log_data).ok()?;
            Some(ParsedEvent::V3Swap {
                event,
                log_address: raw.address,
                block_number: raw.block_number,
                log_index: raw.log_index,
                tx_hash: raw.tx_hash,
                block_timestamp: raw.block_timestamp,
            })
        },
        t if t == &v4::Swap::SIGNATURE_HASH.0 => {
            let event = v4::Swap::decode_log_data(&log_data).ok()?;
            Some(ParsedEvent::V4Swap {
                event,
                block_number: raw.block_number,
                log_index: raw.log_index,
                tx_hash: raw.tx_hash,
                block_timestamp: raw.block_timestamp,
            })
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{Address, U256};
    use alloy::sol_types::SolEvent;

    use super::*;

    fn settings() -> ChainSettings {
        ChainSettings {
            chain_id: 8453,
            rpc_url: "http://localhost:8545".to_string(),
            v2_initializer: "0xAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA2".to_string(),
            v3_initializer: "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa3".to_string(),
            v4_initializer: "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa4".to_string(),
            state_view: "0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa5".to_string(),
        }
    }

    fn create_log(address: &str) -> RawLog {
        let event = factory::Create {
            poolOrHook: Address::repeat_byte(0x01),
            asset: Address::repeat_byte(0x02),
            numeraire: Address::repeat_byte(0x03),
        };
        let data = event.encode_log_data();
        RawLog {
            block_number: 100,
            block_timestamp: 1_700_000_000,
            address: address.to_string(),
            topics: data.topics().to_vec(),
            data: data.data.to_vec(),
            tx_hash: "0xtx".to_string(),
            log_index: 0,
        }
    }

    #[test]
    fn test_creation_dispatches_by_initializer_address() {
        let dispatch = EventDispatch::new(&settings());

        // Addresses in config are normalized to lowercase
        let parsed = parse_log(create_log("0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa2"), &dispatch);
        match parsed {
            Some(ParsedEvent::PoolCreated { pool_type, event, .. }) => {
                assert_eq!(pool_type, PoolType::V2);
                assert_eq!(event.asset, Address::repeat_byte(0x02));
            },
            _ => panic!("expected a V2 creation"),
        }

        let parsed = parse_log(create_log("0xaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa4"), &dispatch);
        assert!(matches!(
            parsed,
            Some(ParsedEvent::PoolCreated { pool_type: PoolType::V4, .. })
        ));
    }

    #[test]
    fn test_creation_from_unknown_contract_ignored() {
        let dispatch = EventDispatch::new(&settings());
        let parsed = parse_log(create_log("0xbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb"), &dispatch);
        assert!(parsed.is_none());
    }

    #[test]
    fn test_v2_swap_decodes() {
        let dispatch = EventDispatch::new(&settings());
        let event = v2::Swap {
            sender: Address::repeat_byte(0x01),
            amount0In: U256::from(500u64),
            amount1In: U256::ZERO,
            amount0Out: U256::ZERO,
            amount1Out: U256::from(250u64),
            to: Address::repeat_byte(0x02),
        };
        let data = event.encode_log_data();
        let raw = RawLog {
            block_number: 7,
            block_timestamp: 42,
            address: "0xpair".to_string(),
            topics: data.topics().to_vec(),
            data: data.data.to_vec(),
            tx_hash: "0xtx".to_string(),
            log_index: 3,
        };

        match parse_log(raw, &dispatch) {
            Some(ParsedEvent::V2Swap { event, log_address, log_index, .. }) => {
                assert_eq!(event.amount0In, U256::from(500u64));
                assert_eq!(log_address, "0xpair");
                assert_eq!(log_index, 3);
            },
            _ => panic!("expected a V2 swap"),
        }
    }

    #[test]
    fn test_unknown_topic_ignored() {
        let dispatch = EventDispatch::new(&settings());
        let raw = RawLog {
            block_number: 1,
            block_timestamp: 1,
            address: "0xsomething".to_string(),
            topics: vec![B256::repeat_byte(0x42)],
            data: vec![],
            tx_hash: "0xtx".to_string(),
            log_index: 0,
        };
        assert!(parse_log(raw, &dispatch).is_none());
    }

    #[test]
    fn test_empty_topics_ignored() {
        let dispatch = EventDispatch::new(&settings());
        let raw = RawLog {
            block_number: 1,
            block_timestamp: 1,
            address: "0xsomething".to_string(),
            topics: vec![],
            data: vec![],
            tx_hash: "0xtx".to_string(),
            log_index: 0,
        };
        assert!(parse_log(raw, &dispatch).is_none());
    }
}
