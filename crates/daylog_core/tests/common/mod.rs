#![allow(dead_code)]

use async_trait::async_trait;
use chrono::NaiveDate;
use daylog_core::db::open_db_in_memory;
use daylog_core::{
    CalendarDate, Entry, GatewayError, JournalConfig, JournalRecord, LoadPath, PersistenceGateway,
    SqliteGateway,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

pub const DELAY: Duration = Duration::from_millis(1000);
pub const TTL: Duration = Duration::from_millis(3000);

pub fn day(day: u32) -> CalendarDate {
    NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
}

pub fn config() -> JournalConfig {
    JournalConfig::default()
}

/// Lets every timer due within the debounce window fire and the spawned
/// saves run to completion.
pub async fn settle() {
    tokio::time::sleep(DELAY + Duration::from_millis(50)).await;
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

/// In-memory SQLite gateway recording every call.
pub struct RecordingGateway {
    inner: SqliteGateway,
    saves: Mutex<Vec<(CalendarDate, Entry)>>,
    loads: Mutex<Vec<(CalendarDate, LoadPath)>>,
}

impl RecordingGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: SqliteGateway::new(open_db_in_memory().unwrap(), None),
            saves: Mutex::new(Vec::new()),
            loads: Mutex::new(Vec::new()),
        })
    }

    pub fn handle(self: &Arc<Self>) -> Arc<dyn PersistenceGateway> {
        self.clone()
    }

    /// Stores `entry` without recording the call.
    pub async fn seed(&self, entry: &Entry) {
        assert!(self.inner.save(entry.date, entry).await.unwrap());
    }

    pub fn saves(&self) -> Vec<(CalendarDate, Entry)> {
        self.saves.lock().unwrap().clone()
    }

    pub fn loads(&self) -> Vec<(CalendarDate, LoadPath)> {
        self.loads.lock().unwrap().clone()
    }
}

#[async_trait]
impl PersistenceGateway for RecordingGateway {
    async fn load(&self, date: CalendarDate, path: LoadPath) -> Option<JournalRecord> {
        self.loads.lock().unwrap().push((date, path));
        self.inner.load(date, path).await
    }

    async fn save(&self, date: CalendarDate, entry: &Entry) -> Result<bool, GatewayError> {
        self.saves.lock().unwrap().push((date, entry.clone()));
        self.inner.save(date, entry).await
    }
}

/// Gateway whose loads find nothing and whose saves always fail.
pub struct FailingGateway;

#[async_trait]
impl PersistenceGateway for FailingGateway {
    async fn load(&self, _date: CalendarDate, _path: LoadPath) -> Option<JournalRecord> {
        None
    }

    async fn save(&self, _date: CalendarDate, _entry: &Entry) -> Result<bool, GatewayError> {
        Err(GatewayError::Unavailable("offline".to_string()))
    }
}

/// Gateway whose saves wait until released.
#[derive(Default)]
pub struct GatedGateway {
    pub release: Notify,
}

#[async_trait]
impl PersistenceGateway for GatedGateway {
    async fn load(&self, _date: CalendarDate, _path: LoadPath) -> Option<JournalRecord> {
        None
    }

    async fn save(&self, _date: CalendarDate, _entry: &Entry) -> Result<bool, GatewayError> {
        self.release.notified().await;
        Ok(true)
    }
}

/// Gateway that completes every save without writing anything.
pub struct RejectingGateway;

#[async_trait]
impl PersistenceGateway for RejectingGateway {
    async fn load(&self, _date: CalendarDate, _path: LoadPath) -> Option<JournalRecord> {
        None
    }

    async fn save(&self, _date: CalendarDate, _entry: &Entry) -> Result<bool, GatewayError> {
        Ok(false)
    }
}
