//! Ordered, type-keyed rule registry and the pipeline executor.

use super::{
    BlockMerkleRootRule, BlockSizeRule, CalculateWorkRule, CheckTransactionsRule, CoinViewRule,
    CoinbaseHeightRule, ConsensusRule, DifficultyBitsRule, EnsureCoinbaseRule, HeaderContextualRule,
    LegacySigOpsRule, RuleContext, RuleStage, TransactionLocktimeRule,
};
use crate::domain::{Checkpoints, RegistryError, RuleError};
use shared_types::hash_to_hex;
use std::any::TypeId;
use std::collections::HashMap;

/// Rules in execution order, at most one of each kind.
#[derive(Default)]
pub struct RuleRegistry {
    rules: Vec<Box<dyn ConsensusRule>>,
    index: HashMap<TypeId, usize>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The full rule set in its canonical order.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        let registered = [
            registry.register(CalculateWorkRule),
            registry.register(DifficultyBitsRule),
            registry.register(HeaderContextualRule),
            registry.register(BlockMerkleRootRule),
            registry.register(EnsureCoinbaseRule),
            registry.register(BlockSizeRule),
            registry.register(CheckTransactionsRule),
            registry.register(CoinbaseHeightRule),
            registry.register(TransactionLocktimeRule),
            registry.register(LegacySigOpsRule),
            registry.register(CoinViewRule),
        ];
        debug_assert!(
            registered.iter().all(Result::is_ok),
            "standard rule kinds are distinct: {:?}",
            registered
        );
        registry
    }

    /// Append `rule`. Its position is its execution order.
    pub fn register<R: ConsensusRule>(&mut self, rule: R) -> Result<(), RegistryError> {
        let key = TypeId::of::<R>();
        if self.index.contains_key(&key) {
            return Err(RegistryError::DuplicateRule(rule.name()));
        }
        self.index.insert(key, self.rules.len());
        self.rules.push(Box::new(rule));
        Ok(())
    }

    /// The registered rule of kind `R`.
    pub fn get<R: ConsensusRule>(&self) -> Option<&R> {
        let position = *self.index.get(&TypeId::of::<R>())?;
        self.rules[position].as_any().downcast_ref::<R>()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> impl Iterator<Item = &dyn ConsensusRule> {
        self.rules.iter().map(|rule| rule.as_ref())
    }

    /// Run every rule of `stage` against `ctx`, stopping at the first failure.
    ///
    /// The failure is also left in `ctx.error`.
    pub async fn execute(
        &self,
        stage: RuleStage,
        ctx: &mut RuleContext,
        checkpoints: &Checkpoints,
    ) -> Result<(), RuleError> {
        let height = ctx.height();
        ctx.skip_optimizations = height <= checkpoints.last_checkpoint_height();

        for rule in self.rules.iter().filter(|rule| rule.stage() == stage) {
            if ctx.skip_optimizations && rule.can_skip() {
                tracing::trace!(rule = rule.name(), height, "[consensus] Rule skipped below checkpoint");
                continue;
            }

            if let Err(err) = rule.run(ctx).await {
                tracing::debug!(
                    rule = rule.name(),
                    height,
                    block_hash = %hash_to_hex(&ctx.block.hash()),
                    error = %err,
                    "[consensus] Rule failed"
                );
                ctx.error = Some(err.clone());
                return Err(err);
            }
            tracing::trace!(rule = rule.name(), height, "[consensus] Rule passed");
        }
        Ok(())
    }
}

impl std::fmt::Debug for RuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.rules.iter().map(|rule| rule.name())).finish()
    }
}
