//! Dual postings: one business action booked on two accounts.
//!
//! Both accounts are locked in ascending id order, the legs are applied
//! dependent-first, and persistence follows the same order. A remote
//! failure between the two legs leaves the dependent row orphaned in the
//! store; the mutation still finishes `Degraded` with a warning and the
//! next refresh reconciles the missing leg. Nothing is compensated or
//! rolled back.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::{info, warn};

use khata_core::posting::{DualPosting, DualPostingPlan, MutationPhase, MutationPipeline};
use khata_shared::types::{AccountId, MutationId};

use crate::engine::Engine;
use crate::error::EngineError;
use crate::mutation::reject;
use crate::outcome::{DualPostingOutcome, PostedLeg, Warning};

impl Engine {
    /// Books an order: a `bill` on the supplier and an `order` on the
    /// customer, cross-linked.
    ///
    /// The same RMB amount prices both legs. The supplier is billed
    /// `rmb_amount / supplier_rate` USD; the customer owes
    /// `rmb_amount * customer_rate` BDT. Both rates are frozen into their
    /// entries.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` for unknown accounts and any plan
    /// validation failure. A failed remote write degrades instead.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_order(
        &self,
        customer_id: AccountId,
        supplier_id: AccountId,
        rmb_amount: Decimal,
        customer_rate: Decimal,
        supplier_rate: Decimal,
        description: String,
        date: NaiveDate,
    ) -> Result<DualPostingOutcome, EngineError> {
        let mutation_id = MutationId::new();
        let customer = self.registry.require(customer_id)?.snapshot().await;
        let supplier = self.registry.require(supplier_id)?.snapshot().await;

        let phase = MutationPipeline::advance(MutationPhase::Pending, MutationPhase::Validating)?;
        let plan = match DualPosting::create_order(
            &customer,
            &supplier,
            rmb_amount,
            customer_rate,
            supplier_rate,
            description,
            date,
        ) {
            Ok(plan) => plan,
            Err(e) => return Err(reject(mutation_id, phase, e)),
        };

        let outcome = self.apply_dual(mutation_id, phase, plan).await?;
        info!(
            mutation_id = %mutation_id,
            customer_id = %customer_id,
            supplier_id = %supplier_id,
            phase = %outcome.phase,
            "Order booked"
        );
        Ok(outcome)
    }

    /// Books a payment receipt: a `credit` on the bank and a `payment` on
    /// the customer, cross-linked, both for the same BDT amount.
    ///
    /// # Errors
    ///
    /// Returns `AccountNotFound` for unknown accounts and any plan
    /// validation failure. A failed remote write degrades instead.
    pub async fn receive_payment(
        &self,
        customer_id: AccountId,
        bank_id: AccountId,
        amount: Decimal,
        description: String,
        date: NaiveDate,
    ) -> Result<DualPostingOutcome, EngineError> {
        let mutation_id = MutationId::new();
        let customer = self.registry.require(customer_id)?.snapshot().await;
        let bank = self.registry.require(bank_id)?.snapshot().await;

        let phase = MutationPipeline::advance(MutationPhase::Pending, MutationPhase::Validating)?;
        let plan =
            match DualPosting::receive_payment(&customer, &bank, amount, description, date) {
                Ok(plan) => plan,
                Err(e) => return Err(reject(mutation_id, phase, e)),
            };

        let outcome = self.apply_dual(mutation_id, phase, plan).await?;
        info!(
            mutation_id = %mutation_id,
            customer_id = %customer_id,
            bank_id = %bank_id,
            phase = %outcome.phase,
            "Payment received"
        );
        Ok(outcome)
    }

    /// Applies and persists a validated dual-posting plan.
    async fn apply_dual(
        &self,
        mutation_id: MutationId,
        phase: MutationPhase,
        plan: DualPostingPlan,
    ) -> Result<DualPostingOutcome, EngineError> {
        let dependent_id = plan.dependent.account_id;
        let primary_id = plan.primary.account_id;
        let dependent_handle = self.registry.require(dependent_id)?;
        let primary_handle = self.registry.require(primary_id)?;

        // Both dual mutations and cascading deletes take their account
        // locks in ascending id order, so they can never deadlock.
        let mut lock_set = vec![
            (dependent_id, dependent_handle.clone()),
            (primary_id, primary_handle.clone()),
        ];
        lock_set.sort_by_key(|(id, _)| *id);
        let mut guards = Vec::with_capacity(lock_set.len());
        for (_, locked) in &lock_set {
            guards.push(locked.begin_mutation().await);
        }

        let posting = plan.materialize();

        let phase = MutationPipeline::advance(phase, MutationPhase::Applying)?;
        let (dependent_account, dependent_balance) = {
            let mut state = dependent_handle.write().await;
            state.apply(posting.dependent.clone())?;
            (state.account().clone(), state.account().balance_money())
        };
        let (primary_account, primary_balance) = {
            let mut state = primary_handle.write().await;
            state.apply(posting.primary.clone())?;
            (state.account().clone(), state.account().balance_money())
        };

        let phase = MutationPipeline::advance(phase, MutationPhase::PersistingRemote)?;
        let mut dependent_persisted = false;
        let mut primary_persisted = false;
        let remote = async {
            self.sync.add_entry(&posting.dependent).await?;
            dependent_persisted = true;
            self.sync.upsert_account(&dependent_account).await?;
            self.sync.add_entry(&posting.primary).await?;
            primary_persisted = true;
            self.sync.upsert_account(&primary_account).await
        }
        .await;

        let mut warnings = Vec::new();
        if dependent_persisted && !primary_persisted {
            warn!(
                mutation_id = %mutation_id,
                dependent_entry_id = %posting.dependent.id,
                primary_entry_id = %posting.primary.id,
                "Dependent leg persisted without its primary, refresh to reconcile"
            );
            warnings.push(Warning::orphaned_counterpart(format!(
                "entry {} was persisted without its counterpart {}; refresh to reconcile",
                posting.dependent.id, posting.primary.id
            )));
        }
        let phase = self
            .finish_mutation(
                mutation_id,
                phase,
                remote,
                &[dependent_id, primary_id],
                &mut warnings,
            )
            .await?;
        drop(guards);

        Ok(DualPostingOutcome {
            mutation_id,
            phase,
            primary: PostedLeg {
                account_id: primary_id,
                entry_id: posting.primary.id,
                balance: primary_balance,
            },
            dependent: PostedLeg {
                account_id: dependent_id,
                entry_id: posting.dependent.id,
                balance: dependent_balance,
            },
            warnings,
        })
    }
}
