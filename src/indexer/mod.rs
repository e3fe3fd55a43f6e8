//! Event processing core.
//!
//! Raw logs come in from the ingestion engine, get decoded by `parser` and
//! routed to the per-version handlers. The engine is expected to deliver
//! logs in on-chain order per pool; out-of-order delivery within a pool is
//! last-writer-wins on the derived columns.

pub mod handlers;
mod parser;

use std::sync::Arc;

use anyhow::Result;
use log::debug;

use crate::config::ChainSettings;
use crate::reader::ChainReader;
use crate::store::Store;

pub use parser::{parse_log, EventDispatch, ParsedEvent, RawLog};

pub struct Indexer {
    store: Arc<dyn Store>,
    reader: Arc<dyn ChainReader>,
    chain_id: u64,
    dispatch: EventDispatch,
}

impl Indexer {
    pub fn new(store: Arc<dyn Store>, reader: Arc<dyn ChainReader>, chain: &ChainSettings) -> Self {
        Self {
            store,
            reader,
            chain_id: chain.chain_id,
            dispatch: EventDispatch::new(chain),
        }
    }

    /// Decodes and applies one raw log. Logs that are not part of the
    /// tracked event set are skipped silently.
    pub async fn process_log(&self, raw: RawLog) -> Result<()> {
        let Some(event) = parse_log(raw, &self.dispatch) else {
            return Ok(());
        };

        match event {
            ParsedEvent::PoolCreated {
                pool_type,
                event,
                block_number,
                block_timestamp,
                ..
            } => {
                debug!(
                    "Pool creation ({:?}) at block {} for asset {}",
                    pool_type, block_number, event.asset
                );
                handlers::handle_pool_created(
                    self.store.as_ref(),
                    self.reader.as_ref(),
                    self.chain_id,
                    pool_type,
                    &event,
                    block_timestamp,
                )
                .await
            },
            ParsedEvent::V2Swap {
                event,
                log_address,
                log_index,
                tx_hash,
                block_timestamp,
                ..
            } => {
                handlers::handle_v2_swap(
                    self.store.as_ref(),
                    self.reader.as_ref(),
                    self.chain_id,
                    &event,
                    &log_address,
                    &tx_hash,
                    log_index,
                    block_timestamp,
                )
                .await
            },
            ParsedEvent::V3Swap {
                event,
                log_address,
                log_index,
                tx_hash,
                block_timestamp,
                ..
            } => {
                handlers::handle_v3_swap(
                    self.store.as_ref(),
                    self.reader.as_ref(),
                    self.chain_id,
                    &event,
                    &log_address,
                    &tx_hash,
                    log_index,
                    block_timestamp,
                )
                .await
            },
            ParsedEvent::V4Swap {
                event,
                log_index,
                tx_hash,
                block_timestamp,
                ..
            } => {
                handlers::handle_v4_swap(
                    self.store.as_ref(),
                    self.reader.as_ref(),
                    self.chain_id,
                    &event,
                    &tx_hash,
                    log_index,
                    block_timestamp,
                )
                .await
            },
        }
    }
}
