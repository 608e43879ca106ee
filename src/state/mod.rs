pub mod broadcast;
pub mod problem;
pub mod registry;
pub mod report;
pub mod room;
pub mod session;
pub mod timer;

use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use crate::{
    catalog::Catalog,
    config::AppConfig,
    dao::{accounts::AccountStore, reports::ReportStore},
    judge::Judge,
    state::{broadcast::Broadcaster, registry::SessionRegistry, room::Room, timer::TimerScheduler},
};

pub use self::registry::SharedSession;

/// Shared handle to the application state; cloning bumps the inner `Arc`.
pub type SharedState = Arc<AppState>;

/// Central application state: the lobby map, the session registry, the
/// per-room broadcaster, and the external collaborators.
pub struct AppState {
    config: AppConfig,
    rooms: DashMap<Uuid, Room>,
    sessions: SessionRegistry,
    broadcaster: Broadcaster,
    scheduler: TimerScheduler,
    catalog: Arc<dyn Catalog>,
    judge: Arc<dyn Judge>,
    accounts: Arc<dyn AccountStore>,
    reports: Arc<dyn ReportStore>,
}

impl AppState {
    /// Construct the shared state from its configuration and collaborators.
    pub fn new(
        config: AppConfig,
        catalog: Arc<dyn Catalog>,
        judge: Arc<dyn Judge>,
        accounts: Arc<dyn AccountStore>,
        reports: Arc<dyn ReportStore>,
    ) -> SharedState {
        let broadcaster = Broadcaster::new(config.sse_capacity);
        Arc::new(Self {
            config,
            rooms: DashMap::new(),
            sessions: SessionRegistry::new(),
            broadcaster,
            scheduler: TimerScheduler,
            catalog,
            judge,
            accounts,
            reports,
        })
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Lobby rooms keyed by their identifier.
    pub fn rooms(&self) -> &DashMap<Uuid, Room> {
        &self.rooms
    }

    /// Registry of active sessions keyed by room id.
    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Per-room push channel to connected clients.
    pub fn broadcaster(&self) -> &Broadcaster {
        &self.broadcaster
    }

    /// One-shot timer scheduler.
    pub fn scheduler(&self) -> TimerScheduler {
        self.scheduler
    }

    /// Problem bank collaborator.
    pub fn catalog(&self) -> &Arc<dyn Catalog> {
        &self.catalog
    }

    /// Code-grading collaborator.
    pub fn judge(&self) -> &Arc<dyn Judge> {
        &self.judge
    }

    /// Permanent account store.
    pub fn accounts(&self) -> &Arc<dyn AccountStore> {
        &self.accounts
    }

    /// Report store.
    pub fn reports(&self) -> &Arc<dyn ReportStore> {
        &self.reports
    }
}
