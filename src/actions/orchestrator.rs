use alloy_primitives::Address;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use super::plan::{Action, ActionId};
use crate::cache::QueryCache;
use crate::chain::{ChainTransport, TxReceipt};
use crate::error::{CoreError, CoreResult};
use crate::registry::{ContractName, ContractRegistry};
use crate::session::SessionContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ActionStatus {
    #[default]
    Idle,
    Pending,
    Success,
    Failed,
}

/// State of the latest invocation of one action
#[derive(Debug, Clone, Default, Serialize)]
pub struct ActionRecord {
    pub status: ActionStatus,
    pub receipts: Vec<TxReceipt>,
    /// Human-readable cause when `Failed`
    pub error: Option<CoreError>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl ActionRecord {
    fn pending() -> Self {
        Self {
            status: ActionStatus::Pending,
            started_at: Some(Utc::now()),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub enum InvokeOutcome {
    /// Ran to `Success` or `Failed`
    Finished(ActionRecord),
    /// Same action was already pending; nothing was submitted
    AlreadyPending,
}

/// Runs multi-step writes and tracks their state
///
/// No automatic retry. A failed action stays `Failed` until the user invokes
/// it again.
#[derive(Clone)]
pub struct ActionOrchestrator {
    transport: Arc<dyn ChainTransport>,
    registry: Arc<ContractRegistry>,
    cache: QueryCache,
    records: Arc<Mutex<HashMap<ActionId, ActionRecord>>>,
}

impl ActionOrchestrator {
    pub fn new(transport: Arc<dyn ChainTransport>, registry: Arc<ContractRegistry>, cache: QueryCache) -> Self {
        Self {
            transport,
            registry,
            cache,
            records: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub async fn status(&self, id: ActionId) -> ActionRecord {
        self.records.lock().await.get(&id).cloned().unwrap_or_default()
    }

    /// Submit `action` for the session's account
    ///
    /// Configuration problems surface as `Err`; submission problems end in a
    /// `Failed` record.
    pub async fn invoke(&self, ctx: &SessionContext, action: Action) -> CoreResult<InvokeOutcome> {
        let id = action.id();
        let chef = self.registry.resolve(ContractName::MasterChef, ctx.network)?;

        {
            let mut records = self.records.lock().await;
            if records.get(&id).is_some_and(|r| r.status == ActionStatus::Pending) {
                warn!("⏳ {} already pending, ignoring", id);
                return Ok(InvokeOutcome::AlreadyPending);
            }
            records.insert(id, ActionRecord::pending());
        }

        // Runs as its own task so a dropped caller cannot leave the record pending
        let this = self.clone();
        let context = *ctx;
        let task = tokio::spawn(async move {
            let result = this.run(&context, &action, chef.address).await;
            this.finish(&context, &action, result).await
        });

        let record = match task.await {
            Ok(record) => record,
            Err(e) => {
                let mut records = self.records.lock().await;
                let record = records.entry(id).or_default();
                record.status = ActionStatus::Failed;
                record.error = Some(CoreError::rejected(format!("action task aborted: {}", e)));
                record.finished_at = Some(Utc::now());
                error!("❌ {} aborted: {}", id, e);
                record.clone()
            }
        };

        Ok(InvokeOutcome::Finished(record))
    }

    /// Records the outcome and invalidates dependent groups on success
    async fn finish(
        &self,
        ctx: &SessionContext,
        action: &Action,
        result: Result<Vec<TxReceipt>, (Vec<TxReceipt>, CoreError)>,
    ) -> ActionRecord {
        let id = action.id();
        let mut records = self.records.lock().await;
        let record = records.entry(id).or_default();
        record.finished_at = Some(Utc::now());

        match result {
            Ok(receipts) => {
                record.status = ActionStatus::Success;
                record.receipts = receipts;
                info!("✅ {} confirmed ({} tx)", id, record.receipts.len());
            }
            Err((receipts, cause)) => {
                record.status = ActionStatus::Failed;
                record.receipts = receipts;
                error!("❌ {} failed: {}", id, cause);
                record.error = Some(cause);
            }
        }
        let record = record.clone();
        drop(records);

        if record.status == ActionStatus::Success {
            if let Some(account) = ctx.account {
                self.cache.invalidate_groups(&action.invalidates(account)).await;
            }
        }

        record
    }

    /// Sends each step in order, stopping at the first failure
    async fn run(
        &self,
        ctx: &SessionContext,
        action: &Action,
        chef: Address,
    ) -> Result<Vec<TxReceipt>, (Vec<TxReceipt>, CoreError)> {
        let Some(account) = ctx.account else {
            return Err((Vec::new(), CoreError::rejected("no account connected")));
        };
        if let Some(signer) = self.transport.signer() {
            if signer != account {
                return Err((
                    Vec::new(),
                    CoreError::rejected(format!("signer {:?} is not the connected account {:?}", signer, account)),
                ));
            }
        }

        let steps = action.steps(chef);
        let mut receipts = Vec::with_capacity(steps.len());

        for (i, step) in steps.into_iter().enumerate() {
            info!("📤 {} step {}: {}", action.id(), i + 1, step.description);

            let receipt = match self.transport.send(step.to, step.input).await {
                Ok(receipt) => receipt,
                Err(e) => return Err((receipts, e)),
            };

            if !receipt.success {
                let cause = CoreError::rejected(format!("{} reverted in tx {:?}", step.description, receipt.tx_hash));
                receipts.push(receipt);
                return Err((receipts, cause));
            }
            receipts.push(receipt);
        }

        Ok(receipts)
    }
}
