use dashmap::DashMap;
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::dao::StoreResult;

/// Abstraction over permanent account records, used only for report
/// attribution.
pub trait AccountStore: Send + Sync {
    /// Append a report link to an account's history.
    fn link_report(
        &self,
        account_id: Uuid,
        report_id: Uuid,
    ) -> BoxFuture<'static, StoreResult<()>>;

    /// Reports linked to an account, in link order.
    fn linked_reports(&self, account_id: Uuid) -> BoxFuture<'static, StoreResult<Vec<Uuid>>>;
}

/// Account store held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    reports: DashMap<Uuid, Vec<Uuid>>,
}

impl AccountStore for InMemoryAccountStore {
    fn link_report(
        &self,
        account_id: Uuid,
        report_id: Uuid,
    ) -> BoxFuture<'static, StoreResult<()>> {
        self.reports.entry(account_id).or_default().push(report_id);
        Box::pin(async { Ok(()) })
    }

    fn linked_reports(&self, account_id: Uuid) -> BoxFuture<'static, StoreResult<Vec<Uuid>>> {
        let linked = self
            .reports
            .get(&account_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default();
        Box::pin(async move { Ok(linked) })
    }
}
