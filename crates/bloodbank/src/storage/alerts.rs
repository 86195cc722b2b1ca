//! Alert table operations.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use tracing::{debug, info};

use super::{decode_time, encode_time, Storage};
use crate::alert::{Alert, AlertPriority, AlertScope, AlertType};
use crate::error::{Error, Result};

const ALERT_COLUMNS: &str = "id, title, message, scope, priority, alert_type, location, contact, \
                             required_units, expires_at, created_at, is_read, is_active";

/// Live means active and not yet expired at `?1`.
const LIVE: &str = "is_active = 1 AND (expires_at IS NULL OR expires_at > ?1)";

struct AlertRow {
    id: i64,
    title: String,
    message: String,
    scope: String,
    priority: u8,
    alert_type: String,
    location: Option<String>,
    contact: Option<String>,
    required_units: Option<u32>,
    expires_at: Option<String>,
    created_at: String,
    read: bool,
    active: bool,
}

impl AlertRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            message: row.get(2)?,
            scope: row.get(3)?,
            priority: row.get(4)?,
            alert_type: row.get(5)?,
            location: row.get(6)?,
            contact: row.get(7)?,
            required_units: row.get(8)?,
            expires_at: row.get(9)?,
            created_at: row.get(10)?,
            read: row.get(11)?,
            active: row.get(12)?,
        })
    }

    fn into_alert(self) -> Result<Alert> {
        let id = self.id;
        let corrupt = |message: String| Error::CorruptRow {
            table: "alerts",
            id,
            message,
        };

        let scope: AlertScope = self
            .scope
            .parse()
            .map_err(|_| corrupt(format!("unknown scope: {}", self.scope)))?;
        let priority = AlertPriority::from_level(self.priority)
            .ok_or_else(|| corrupt(format!("unknown priority level: {}", self.priority)))?;
        let alert_type: AlertType = self
            .alert_type
            .parse()
            .map_err(|_| corrupt(format!("unknown alert type: {}", self.alert_type)))?;
        let expires_at = self
            .expires_at
            .as_deref()
            .map(|raw| decode_time("alerts", id, raw))
            .transpose()?;
        let created_at = decode_time("alerts", id, &self.created_at)?;

        Ok(Alert {
            id: Some(id),
            title: self.title,
            message: self.message,
            scope,
            priority,
            alert_type,
            location: self.location,
            contact: self.contact,
            required_units: self.required_units,
            expires_at,
            created_at,
            read: self.read,
            active: self.active,
        })
    }
}

impl Storage {
    /// Store an alert unless an identical one is still live at `now`.
    ///
    /// Returns the new id, or `None` when deduplicated.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_alert(&self, alert: &Alert, now: DateTime<Utc>) -> Result<Option<i64>> {
        let fingerprint = alert.fingerprint();
        let duplicates: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM alerts WHERE fingerprint = ?2 AND {LIVE}"),
            params![encode_time(now), fingerprint],
            |row| row.get(0),
        )?;
        if duplicates > 0 {
            debug!(
                fingerprint = &fingerprint[..16],
                "Skipping duplicate of a live alert"
            );
            return Ok(None);
        }

        self.conn.execute(
            r"
            INSERT INTO alerts (title, message, scope, priority, alert_type, location, contact,
                                required_units, expires_at, created_at, is_read, is_active,
                                fingerprint)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            ",
            params![
                alert.title,
                alert.message,
                alert.scope.to_string(),
                alert.priority.level(),
                alert.alert_type.as_str(),
                alert.location,
                alert.contact,
                alert.required_units,
                alert.expires_at.map(encode_time),
                encode_time(alert.created_at),
                alert.read,
                alert.active,
                fingerprint,
            ],
        )?;

        let id = self.conn.last_insert_rowid();
        debug!(id, alert_type = alert.alert_type.as_str(), "Inserted alert");
        Ok(Some(id))
    }

    /// An alert by id, in any state.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or the row is corrupt.
    pub fn get_alert(&self, id: i64) -> Result<Option<Alert>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {ALERT_COLUMNS} FROM alerts WHERE id = ?1"),
                [id],
                AlertRow::from_row,
            )
            .optional()?;
        row.map(AlertRow::into_alert).transpose()
    }

    /// Mark an alert as read.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no alert has this id.
    pub fn mark_alert_read(&self, id: i64) -> Result<()> {
        self.update_flag("is_read = 1", id)
    }

    /// Dismiss an alert; it stays stored but is no longer live.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no alert has this id.
    pub fn mark_alert_inactive(&self, id: i64) -> Result<()> {
        self.update_flag("is_active = 0", id)
    }

    fn update_flag(&self, assignment: &str, id: i64) -> Result<()> {
        let affected = self
            .conn
            .execute(&format!("UPDATE alerts SET {assignment} WHERE id = ?1"), [id])?;
        if affected == 0 {
            return Err(Error::alert_not_found(id));
        }
        Ok(())
    }

    /// Live alerts, highest priority first, newest first within a priority.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row is corrupt.
    pub fn active_alerts(&self, now: DateTime<Utc>) -> Result<Vec<Alert>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ALERT_COLUMNS} FROM alerts WHERE {LIVE} \
             ORDER BY priority DESC, created_at DESC, id DESC"
        ))?;
        let rows = stmt
            .query_map([encode_time(now)], AlertRow::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows.into_iter().map(AlertRow::into_alert).collect()
    }

    /// Most recent alerts in any state, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row is corrupt.
    pub fn recent_alerts(&self, limit: usize) -> Result<Vec<Alert>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ALERT_COLUMNS} FROM alerts ORDER BY created_at DESC, id DESC LIMIT ?1"
        ))?;
        let limit_i64 = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt
            .query_map([limit_i64], AlertRow::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows.into_iter().map(AlertRow::into_alert).collect()
    }

    /// Unread live alerts.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn unread_count(&self, now: DateTime<Utc>) -> Result<i64> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM alerts WHERE is_read = 0 AND {LIVE}"),
            [encode_time(now)],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Delete alerts whose expiry has passed at `now`.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn cleanup_expired_alerts(&self, now: DateTime<Utc>) -> Result<usize> {
        let affected = self.conn.execute(
            "DELETE FROM alerts WHERE expires_at IS NOT NULL AND expires_at <= ?1",
            [encode_time(now)],
        )?;
        if affected > 0 {
            info!("Removed {} expired alerts", affected);
        }
        Ok(affected)
    }

    /// Keep only the `keep` most recent alerts. 0 keeps everything.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn prune_alerts_keep_recent(&self, keep: usize) -> Result<usize> {
        if keep == 0 {
            return Ok(0);
        }
        let keep_i64 = i64::try_from(keep).unwrap_or(i64::MAX);
        let affected = self.conn.execute(
            r"
            DELETE FROM alerts WHERE id NOT IN (
                SELECT id FROM alerts ORDER BY created_at DESC, id DESC LIMIT ?1
            )
            ",
            [keep_i64],
        )?;
        if affected > 0 {
            info!("Pruned {} alerts to keep {} recent", affected, keep);
        }
        Ok(affected)
    }
}
