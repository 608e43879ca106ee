use dashmap::DashMap;
use futures::future::BoxFuture;
use uuid::Uuid;

use crate::{
    dao::StoreResult,
    state::report::GameReport,
};

/// Abstraction over report persistence.
pub trait ReportStore: Send + Sync {
    /// Persist a freshly generated report.
    fn save(&self, report: GameReport) -> BoxFuture<'static, StoreResult<()>>;
    /// Fetch the report for a room's last finished match, if one exists.
    fn find_by_room(&self, room_id: Uuid) -> BoxFuture<'static, StoreResult<Option<GameReport>>>;
}

/// Report store held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryReportStore {
    by_room: DashMap<Uuid, GameReport>,
}

impl ReportStore for InMemoryReportStore {
    fn save(&self, report: GameReport) -> BoxFuture<'static, StoreResult<()>> {
        self.by_room.insert(report.room_id, report);
        Box::pin(async { Ok(()) })
    }

    fn find_by_room(&self, room_id: Uuid) -> BoxFuture<'static, StoreResult<Option<GameReport>>> {
        let report = self.by_room.get(&room_id).map(|entry| entry.value().clone());
        Box::pin(async move { Ok(report) })
    }
}
