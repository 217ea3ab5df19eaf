//! Per-attempt validation state.

use crate::domain::{next_work_required, ChainHeaderNode, ConsensusParams, RuleError, TipSnapshot};
use crate::ports::CoinView;
use shared_types::{Block, BlockHeader, CollaboratorError};
use std::sync::Arc;

/// Everything one pipeline run may read, plus the slots rules write into.
///
/// Built fresh for every attempt and dropped afterwards. Never shared between
/// concurrent validations.
pub struct RuleContext {
    pub block: Arc<Block>,
    /// The node the block builds on.
    pub parent: Arc<ChainHeaderNode>,
    /// Best tip when the attempt started.
    pub tip: TipSnapshot,
    pub params: Arc<ConsensusParams>,
    pub check_pow: bool,
    /// Node-adjusted unix time.
    pub now: u64,
    /// Set by the executor when skippable rules are bypassed.
    pub skip_optimizations: bool,
    /// Compact bits the block must declare, filled by the work rule.
    pub next_work_required: Option<u32>,
    /// The error that stopped the pipeline, if any.
    pub error: Option<RuleError>,
    coin_view: Option<Arc<dyn CoinView>>,
}

impl RuleContext {
    pub fn new(
        block: Arc<Block>,
        parent: Arc<ChainHeaderNode>,
        tip: TipSnapshot,
        params: Arc<ConsensusParams>,
        now: u64,
    ) -> Self {
        Self {
            block,
            parent,
            tip,
            params,
            check_pow: true,
            now,
            skip_optimizations: false,
            next_work_required: None,
            error: None,
            coin_view: None,
        }
    }

    pub fn with_check_pow(mut self, check_pow: bool) -> Self {
        self.check_pow = check_pow;
        self
    }

    pub fn with_coin_view(mut self, coin_view: Arc<dyn CoinView>) -> Self {
        self.coin_view = Some(coin_view);
        self
    }

    pub fn header(&self) -> &BlockHeader {
        &self.block.header
    }

    /// Height the candidate would occupy.
    pub fn height(&self) -> u64 {
        self.parent.height() + 1
    }

    /// Required bits, computing and caching them if no rule has yet.
    pub fn required_bits(&mut self) -> u32 {
        if let Some(bits) = self.next_work_required {
            return bits;
        }
        let bits = next_work_required(&self.parent, u64::from(self.header().time), &self.params);
        self.next_work_required = Some(bits);
        bits
    }

    pub fn coin_view(&self) -> Result<Arc<dyn CoinView>, RuleError> {
        self.coin_view.clone().ok_or_else(|| {
            RuleError::Collaborator(CollaboratorError::Unavailable(
                "no coin view attached to rule context".into(),
            ))
        })
    }
}
