//! Storage layer for bloodbank.
//!
//! A `SQLite` store for donors and alerts. Donors are the input snapshot for
//! analysis; alerts are the persisted output, with read/active state,
//! expiry cleanup and fingerprint deduplication.

mod alerts;
mod donors;
pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, info};

use crate::alert::Alert;
use crate::donor::DonorRecord;
use crate::error::{Error, Result};
use crate::notify::{AlertSink, NotificationChannel};
use crate::worker::DonorSource;

const MEMORY_PATH: &str = ":memory:";

/// `SQLite`-backed donor and alert store.
#[derive(Debug)]
pub struct Storage {
    path: PathBuf,
    conn: Connection,
}

impl Storage {
    /// Open or create a database at `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or database cannot be created, or
    /// schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        migrations::initialize_schema(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(MEMORY_PATH),
            source,
        })?;
        migrations::initialize_schema(&conn)?;
        Ok(Self {
            path: PathBuf::from(MEMORY_PATH),
            conn,
        })
    }

    /// Path of the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Counts over both tables.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails.
    pub fn stats(&self, now: DateTime<Utc>) -> Result<StorageStats> {
        let total_donors = self.donor_count()?;
        let available_donors: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM donors WHERE available = 1",
            [],
            |row| row.get(0),
        )?;
        let total_alerts: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM alerts", [], |row| row.get(0))?;
        let active_alerts: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM alerts WHERE is_active = 1 AND (expires_at IS NULL OR expires_at > ?1)",
            [encode_time(now)],
            |row| row.get(0),
        )?;
        let unread_alerts = self.unread_count(now)?;

        let db_size_bytes = if self.path.as_os_str() == MEMORY_PATH {
            0
        } else {
            std::fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
        };

        Ok(StorageStats {
            total_donors,
            available_donors,
            total_alerts,
            active_alerts,
            unread_alerts,
            db_size_bytes,
        })
    }
}

/// Counts reported by [`Storage::stats`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageStats {
    /// Registered donors.
    pub total_donors: i64,
    /// Donors marked available.
    pub available_donors: i64,
    /// Stored alerts, in any state.
    pub total_alerts: i64,
    /// Active, unexpired alerts.
    pub active_alerts: i64,
    /// Unread among the active, unexpired alerts.
    pub unread_alerts: i64,
    /// Database file size; 0 in memory.
    pub db_size_bytes: u64,
}

/// Fixed-width UTC timestamp, so text order is time order.
pub(crate) fn encode_time(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub(crate) fn decode_time(table: &'static str, id: i64, raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::CorruptRow {
            table,
            id,
            message: format!("bad timestamp '{raw}': {e}"),
        })
}

#[async_trait]
impl DonorSource for Storage {
    async fn donors(&mut self) -> Result<Vec<DonorRecord>> {
        self.all_donors()
    }
}

/// Persists delivered alerts. Repeats of an alert still live when the new
/// one was created are skipped.
#[async_trait]
impl AlertSink for Storage {
    fn name(&self) -> &'static str {
        "store"
    }

    async fn deliver(&mut self, alert: &Alert, channel: NotificationChannel) -> Result<()> {
        match self.insert_alert(alert, alert.created_at)? {
            Some(id) => debug!(id, channel = channel.id(), "Alert stored"),
            None => debug!(channel = channel.id(), "Duplicate alert not stored"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::{AlertPriority, AlertScope, AlertType};
    use chrono::TimeZone;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_open_in_memory() {
        let storage = Storage::open_in_memory().unwrap();
        assert_eq!(storage.path(), Path::new(MEMORY_PATH));
    }

    #[test]
    fn test_open_creates_parent_directories() {
        let dir = std::env::temp_dir().join(format!("bloodbank-test-{}", std::process::id()));
        let path = dir.join("nested").join("bloodbank.db");
        let storage = Storage::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(storage.path(), path.as_path());
        drop(storage);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_time_encoding_is_fixed_width_and_ordered() {
        let a = encode_time(noon());
        let b = encode_time(noon() + chrono::Duration::microseconds(1));
        assert_eq!(a.len(), b.len());
        assert!(a < b);
        assert_eq!(decode_time("alerts", 1, &a).unwrap(), noon());
        assert!(decode_time("alerts", 1, "yesterday").is_err());
    }

    #[test]
    fn test_stats() {
        let storage = Storage::open_in_memory().unwrap();
        let mut away = DonorRecord::new("B", "O-", "", "");
        away.available = false;
        storage.add_donor(&DonorRecord::new("A", "O+", "", "")).unwrap();
        storage.add_donor(&away).unwrap();

        let alert = Alert::new(
            "t",
            "m",
            AlertScope::All,
            AlertPriority::Low,
            AlertType::HealthTip,
            noon(),
        );
        storage.insert_alert(&alert, noon()).unwrap();

        let stats = storage.stats(noon()).unwrap();
        assert_eq!(stats.total_donors, 2);
        assert_eq!(stats.available_donors, 1);
        assert_eq!(stats.total_alerts, 1);
        assert_eq!(stats.active_alerts, 1);
        assert_eq!(stats.unread_alerts, 1);
        assert_eq!(stats.db_size_bytes, 0);
    }

    #[tokio::test]
    async fn test_storage_as_donor_source() {
        let mut storage = Storage::open_in_memory().unwrap();
        storage.add_donor(&DonorRecord::new("A", "AB+", "", "")).unwrap();
        let donors = storage.donors().await.unwrap();
        assert_eq!(donors.len(), 1);
        assert_eq!(donors[0].blood_group, "AB+");
    }

    #[tokio::test]
    async fn test_storage_as_alert_sink_dedups() {
        let mut storage = Storage::open_in_memory().unwrap();
        let alert = Alert::new(
            "t",
            "m",
            AlertScope::All,
            AlertPriority::Medium,
            AlertType::NearbyDonation,
            Utc::now(),
        );
        storage
            .deliver(&alert, NotificationChannel::Reminders)
            .await
            .unwrap();
        storage
            .deliver(&alert, NotificationChannel::Reminders)
            .await
            .unwrap();
        assert_eq!(storage.recent_alerts(10).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_alert_sink_dedups_at_creation_time() {
        let mut storage = Storage::open_in_memory().unwrap();
        let alert_at = |created_at| {
            Alert::new(
                "Blood drive",
                "Visit the mobile camp",
                AlertScope::All,
                AlertPriority::Medium,
                AlertType::MobileBloodCamp,
                created_at,
            )
            .expires_in(chrono::Duration::hours(2))
        };

        // Long expired by the wall clock, but live relative to its own creation.
        let first = alert_at(noon());
        storage.deliver(&first, NotificationChannel::Reminders).await.unwrap();
        storage.deliver(&first, NotificationChannel::Reminders).await.unwrap();
        assert_eq!(storage.recent_alerts(10).unwrap().len(), 1);

        let later = alert_at(noon() + chrono::Duration::hours(3));
        storage.deliver(&later, NotificationChannel::Reminders).await.unwrap();
        assert_eq!(storage.recent_alerts(10).unwrap().len(), 2);
    }
}
