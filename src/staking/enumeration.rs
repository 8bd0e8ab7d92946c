//! Lazy enumeration of the transcoder registry.
//!
//! A registry of `N` transcoders costs `1 + 2N` contract reads plus one block
//! number lookup when enumeration is pinned. Nothing is fetched until the
//! stream is polled, and the stream ends after the first error.

use alloy::eips::BlockId;
use alloy::primitives::U256;
use futures_util::future;
use futures_util::stream::{self, Stream, TryStreamExt};

use crate::blockchain::types::BlockchainResult;
use crate::observability::metrics;
use crate::staking::client::StakingClient;
use crate::staking::ledger::StakingLedger;
use crate::staking::types::{Transcoder, TranscoderRange};

impl<L: StakingLedger + ?Sized> StakingClient<L> {
    /// Stream the transcoders in `range`, reading each one at `block`.
    ///
    /// Yields at most one error, after which the stream is exhausted.
    pub fn iterate(
        &self,
        range: TranscoderRange,
        block: BlockId,
    ) -> impl Stream<Item = BlockchainResult<Transcoder>> + Send + '_ {
        stream::unfold(Some(range.start), move |cursor| async move {
            let index = cursor?;
            if index >= range.end {
                return None;
            }

            match self.transcoder_at_index_in(index, block).await {
                Ok(transcoder) => Some((Ok(transcoder), Some(index + U256::from(1)))),
                Err(e) => {
                    tracing::warn!(index = %index, error = %e, "Transcoder enumeration failed");
                    Some((Err(e), None))
                }
            }
        })
    }

    /// Block the enumeration reads are pinned to.
    pub async fn enumeration_block(&self) -> BlockchainResult<BlockId> {
        if !self.pin_enumeration_block {
            return Ok(BlockId::latest());
        }
        let number = self.ledger.block_number().await?;
        Ok(BlockId::number(number))
    }

    /// Every registered transcoder, in registry order.
    pub async fn all_transcoders(&self) -> BlockchainResult<Vec<Transcoder>> {
        self.collect_transcoders(|_| true).await
    }

    /// Registered transcoders currently in the `Bonded` state.
    pub async fn bonded_transcoders(&self) -> BlockchainResult<Vec<Transcoder>> {
        self.collect_transcoders(Transcoder::is_bonded).await
    }

    async fn collect_transcoders<F>(&self, keep: F) -> BlockchainResult<Vec<Transcoder>>
    where
        F: Fn(&Transcoder) -> bool,
    {
        let block = self.enumeration_block().await?;
        let count = self.ledger.transcoders_count(block).await?;
        let range = TranscoderRange::all(count);
        if range.is_empty() {
            return Ok(Vec::new());
        }

        let transcoders: Vec<Transcoder> = self
            .iterate(range, block)
            .try_filter(|transcoder| future::ready(keep(transcoder)))
            .try_collect()
            .await?;

        metrics::record_enumerated(transcoders.len() as u64);
        tracing::debug!(
            block = ?block,
            registered = %count,
            returned = transcoders.len(),
            "Enumerated transcoders"
        );

        Ok(transcoders)
    }
}
