// SPDX-FileCopyrightText: 2026 Vitrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Token balance ledger.
//!
//! Wraps the persistence store with a static per-feature cost table and the
//! two operations every paid flow uses: a non-mutating sufficiency check
//! and an atomic deduction.
//!
//! The check and the deduction are deliberately NOT one atomic
//! check-and-deduct: a single chat user cannot issue two concurrent actions
//! through the transport faster than one request-response cycle. If the
//! transport is ever replaced by one that permits concurrent input per
//! user, this pair must be collapsed into a single conditional UPDATE.

use std::sync::Arc;

use tracing::{error, info};
use vitrina_config::model::EconomyConfig;
use vitrina_core::types::{Feature, UserId};
use vitrina_core::{Store, VitrinaError};

/// Immutable per-feature token costs, constructed once at process start.
#[derive(Debug, Clone, Copy)]
pub struct CostTable {
    generation: i64,
    analysis: i64,
}

impl CostTable {
    pub fn new(generation: i64, analysis: i64) -> Self {
        Self {
            generation,
            analysis,
        }
    }

    pub fn from_config(config: &EconomyConfig) -> Self {
        Self::new(config.generation_cost, config.analysis_cost)
    }

    /// Fixed cost of one operation of the given feature.
    ///
    /// Improvement drives the generation backend and bills at its rate.
    pub fn cost(&self, feature: Feature) -> i64 {
        match feature {
            Feature::Generation | Feature::Improvement => self.generation,
            Feature::Analysis => self.analysis,
        }
    }
}

/// Balance ledger over the persistence store.
pub struct BalanceLedger {
    store: Arc<dyn Store>,
    costs: CostTable,
}

impl BalanceLedger {
    pub fn new(store: Arc<dyn Store>, costs: CostTable) -> Self {
        Self { store, costs }
    }

    /// The fixed cost of the given feature.
    pub fn cost(&self, feature: Feature) -> i64 {
        self.costs.cost(feature)
    }

    /// Non-mutating read: can the user afford one operation of `feature`?
    ///
    /// Unknown users cannot afford anything.
    pub async fn check_sufficient(
        &self,
        user_id: UserId,
        feature: Feature,
    ) -> Result<bool, VitrinaError> {
        let required = self.costs.cost(feature);
        let balance = self
            .store
            .get_user(user_id)
            .await?
            .map(|u| u.balance)
            .unwrap_or(0);
        Ok(balance >= required)
    }

    /// Atomically deduct the feature's cost and return the new balance.
    ///
    /// Must only be called after a successful [`check_sufficient`] in the
    /// same handler. A negative post-deduction balance indicates that
    /// contract was violated; it is logged as a defect, never displayed.
    ///
    /// [`check_sufficient`]: BalanceLedger::check_sufficient
    pub async fn deduct(&self, user_id: UserId, feature: Feature) -> Result<i64, VitrinaError> {
        let cost = self.costs.cost(feature);
        let balance = self.store.adjust_balance(user_id, -cost).await?;

        if balance < 0 {
            error!(
                %user_id,
                %feature,
                balance,
                "balance went negative after a guarded deduction; check/deduct contract violated"
            );
        } else {
            info!(%user_id, %feature, cost, balance, "tokens deducted");
        }

        Ok(balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use vitrina_core::types::{ConversationState, InteractionRecord, User, UserProfile};

    /// Minimal in-memory store: only the user/balance operations the
    /// ledger touches are meaningful.
    #[derive(Default)]
    struct MemStore {
        balances: Mutex<HashMap<i64, i64>>,
    }

    #[async_trait]
    impl Store for MemStore {
        async fn upsert_user(
            &self,
            profile: &UserProfile,
            starting_balance: i64,
        ) -> Result<User, VitrinaError> {
            let mut balances = self.balances.lock().unwrap();
            let balance = *balances.entry(profile.id.0).or_insert(starting_balance);
            Ok(User {
                id: profile.id,
                display_name: profile.display_name.clone(),
                username: profile.username.clone(),
                balance,
                created_at: String::new(),
                last_active: String::new(),
            })
        }

        async fn get_user(&self, id: UserId) -> Result<Option<User>, VitrinaError> {
            Ok(self.balances.lock().unwrap().get(&id.0).map(|&balance| User {
                id,
                display_name: None,
                username: None,
                balance,
                created_at: String::new(),
                last_active: String::new(),
            }))
        }

        async fn adjust_balance(&self, id: UserId, delta: i64) -> Result<i64, VitrinaError> {
            let mut balances = self.balances.lock().unwrap();
            let balance = balances
                .get_mut(&id.0)
                .ok_or(VitrinaError::StateNotFound)?;
            *balance += delta;
            Ok(*balance)
        }

        async fn get_state(&self, _id: UserId) -> Result<Option<ConversationState>, VitrinaError> {
            Ok(None)
        }

        async fn set_state(&self, _state: &ConversationState) -> Result<(), VitrinaError> {
            Ok(())
        }

        async fn clear_state(&self, _id: UserId) -> Result<(), VitrinaError> {
            Ok(())
        }

        async fn append_record(&self, _record: &InteractionRecord) -> Result<(), VitrinaError> {
            Ok(())
        }
    }

    fn ledger_with_balance(user: i64, balance: i64) -> BalanceLedger {
        let store = MemStore::default();
        store.balances.lock().unwrap().insert(user, balance);
        BalanceLedger::new(Arc::new(store), CostTable::new(10, 5))
    }

    #[tokio::test]
    async fn check_sufficient_compares_against_feature_cost() {
        let ledger = ledger_with_balance(1, 7);
        assert!(!ledger.check_sufficient(UserId(1), Feature::Generation).await.unwrap());
        assert!(ledger.check_sufficient(UserId(1), Feature::Analysis).await.unwrap());
    }

    #[tokio::test]
    async fn check_sufficient_is_false_for_unknown_user() {
        let ledger = ledger_with_balance(1, 100);
        assert!(!ledger.check_sufficient(UserId(2), Feature::Analysis).await.unwrap());
    }

    #[tokio::test]
    async fn deduct_returns_post_deduction_balance() {
        let ledger = ledger_with_balance(1, 50);
        let balance = ledger.deduct(UserId(1), Feature::Generation).await.unwrap();
        assert_eq!(balance, 40);
    }

    #[tokio::test]
    async fn improvement_bills_at_generation_rate() {
        assert_eq!(CostTable::new(10, 5).cost(Feature::Improvement), 10);
    }

    #[tokio::test]
    async fn guarded_deducts_never_go_negative() {
        let ledger = ledger_with_balance(1, 22);
        for feature in [Feature::Generation, Feature::Generation, Feature::Analysis] {
            if ledger.check_sufficient(UserId(1), feature).await.unwrap() {
                let balance = ledger.deduct(UserId(1), feature).await.unwrap();
                assert!(balance >= 0);
            }
        }
        // 22 - 10 - 10 = 2; the analysis check (cost 5) must have refused.
        let user = ledger.store.get_user(UserId(1)).await.unwrap().unwrap();
        assert_eq!(user.balance, 2);
    }
}
