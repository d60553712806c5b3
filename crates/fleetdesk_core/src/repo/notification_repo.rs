//! Notification persistence contracts and SQLite implementation.
//!
//! # Responsibility
//! - Store notification rows produced by the feed aggregator.
//! - Provide visible-feed reads and read/dismiss flag mutations.
//!
//! # Invariants
//! - `identity_key` is unique; inserts are insert-or-ignore.
//! - Flag mutations only ever set flags; nothing here clears them.
//! - Visible feed is ordered by priority, then due date, then creation time.

use crate::db::ensure_schema_ready;
use crate::engine::due_date::DueStatus;
use crate::model::notification::{IdentityKey, Notification, NotificationId, Priority};
use crate::model::vehicle::{ReminderKind, VehicleId};
use crate::repo::vehicle_repo::{bool_to_int, int_to_bool, RepoError, RepoResult};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, Row, Transaction, TransactionBehavior};
use uuid::Uuid;

const NOTIFICATION_SELECT_SQL: &str = "SELECT
    id,
    identity_key,
    vehicle_id,
    reminder_kind,
    reminder_name,
    due_date,
    days_until_due,
    status,
    priority,
    message,
    is_read,
    is_dismissed,
    created_at
FROM notifications";

const FEED_ORDER_SQL: &str = "ORDER BY
    CASE priority WHEN 'high' THEN 0 WHEN 'normal' THEN 1 ELSE 2 END ASC,
    due_date ASC,
    created_at ASC,
    identity_key ASC";

/// Repository interface for stored notifications.
pub trait NotificationRepository {
    /// Inserts one row unless its identity key already exists.
    ///
    /// Returns whether a row was written.
    fn insert_or_ignore(&self, notification: &Notification) -> RepoResult<bool>;
    /// Inserts many rows in one transaction. Returns the number written.
    fn insert_all(&self, notifications: &[Notification]) -> RepoResult<usize>;
    fn get_notification(&self, id: NotificationId) -> RepoResult<Option<Notification>>;
    /// Every row, dismissed included.
    fn list_all(&self) -> RepoResult<Vec<Notification>>;
    /// Rows that are not dismissed, in feed order.
    fn list_visible(&self) -> RepoResult<Vec<Notification>>;
    fn mark_read(&self, id: NotificationId) -> RepoResult<()>;
    fn mark_all_read(&self) -> RepoResult<usize>;
    fn dismiss(&self, id: NotificationId) -> RepoResult<()>;
    /// Number of visible unread rows.
    fn unread_count(&self) -> RepoResult<u32>;
}

/// SQLite-backed notification repository.
pub struct SqliteNotificationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNotificationRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_schema_ready(conn)?;
        Ok(Self { conn })
    }

    fn list_where(&self, filter: &str) -> RepoResult<Vec<Notification>> {
        let mut stmt = self.conn.prepare(&format!(
            "{NOTIFICATION_SELECT_SQL} {filter} {FEED_ORDER_SQL};"
        ))?;
        let mut rows = stmt.query([])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_notification_row(row)?);
        }
        Ok(items)
    }
}

impl NotificationRepository for SqliteNotificationRepository<'_> {
    fn insert_or_ignore(&self, notification: &Notification) -> RepoResult<bool> {
        insert_row(self.conn, notification)
    }

    fn insert_all(&self, notifications: &[Notification]) -> RepoResult<usize> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let mut written = 0;
        for notification in notifications {
            if insert_row(&tx, notification)? {
                written += 1;
            }
        }
        tx.commit()?;
        Ok(written)
    }

    fn get_notification(&self, id: NotificationId) -> RepoResult<Option<Notification>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{NOTIFICATION_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_notification_row(row)?));
        }
        Ok(None)
    }

    fn list_all(&self) -> RepoResult<Vec<Notification>> {
        self.list_where("")
    }

    fn list_visible(&self) -> RepoResult<Vec<Notification>> {
        self.list_where("WHERE is_dismissed = 0")
    }

    fn mark_read(&self, id: NotificationId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE notifications SET is_read = 1 WHERE id = ?1;",
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn mark_all_read(&self) -> RepoResult<usize> {
        let changed = self.conn.execute(
            "UPDATE notifications SET is_read = 1 WHERE is_read = 0 AND is_dismissed = 0;",
            [],
        )?;
        Ok(changed)
    }

    fn dismiss(&self, id: NotificationId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE notifications SET is_dismissed = 1, is_read = 1 WHERE id = ?1;",
            [id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn unread_count(&self) -> RepoResult<u32> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM notifications WHERE is_read = 0 AND is_dismissed = 0;",
            [],
            |row| row.get::<_, u32>(0),
        )?;
        Ok(count)
    }
}

fn insert_row(conn: &Connection, notification: &Notification) -> RepoResult<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO notifications (
            id,
            identity_key,
            vehicle_id,
            reminder_kind,
            reminder_name,
            due_date,
            days_until_due,
            status,
            priority,
            message,
            is_read,
            is_dismissed,
            created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13);",
        params![
            notification.id.to_string(),
            notification.identity_key.as_str(),
            notification.vehicle_id.as_str(),
            notification.reminder_kind.as_str(),
            notification.reminder_name.as_str(),
            notification.due_date.format("%Y-%m-%d").to_string(),
            notification.days_until_due,
            notification.status.as_str(),
            notification.priority.as_str(),
            notification.message.as_str(),
            bool_to_int(notification.is_read),
            bool_to_int(notification.is_dismissed),
            notification.created_at.timestamp_millis(),
        ],
    )?;
    Ok(changed == 1)
}

fn parse_notification_row(row: &Row<'_>) -> RepoResult<Notification> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{id_text}` in notifications.id"))
    })?;

    let vehicle_text: String = row.get("vehicle_id")?;
    let vehicle_id = VehicleId::parse(&vehicle_text).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid vehicle id `{vehicle_text}` in notifications.vehicle_id"
        ))
    })?;

    let kind_text: String = row.get("reminder_kind")?;
    let reminder_kind = ReminderKind::parse(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid reminder kind `{kind_text}` in notifications.reminder_kind"
        ))
    })?;

    let due_text: String = row.get("due_date")?;
    let due_date = NaiveDate::parse_from_str(&due_text, "%Y-%m-%d").map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid due date `{due_text}` in notifications.due_date"
        ))
    })?;

    let status_text: String = row.get("status")?;
    let status = DueStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid status `{status_text}` in notifications.status"))
    })?;

    let priority_text: String = row.get("priority")?;
    let priority = Priority::parse(&priority_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid priority `{priority_text}` in notifications.priority"
        ))
    })?;

    let created_ms: i64 = row.get("created_at")?;
    let created_at = DateTime::<Utc>::from_timestamp_millis(created_ms).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid timestamp `{created_ms}` in notifications.created_at"
        ))
    })?;

    Ok(Notification {
        id,
        vehicle_id,
        reminder_kind,
        reminder_name: row.get("reminder_name")?,
        due_date,
        days_until_due: row.get("days_until_due")?,
        status,
        priority,
        identity_key: IdentityKey::from_stored(row.get::<_, String>("identity_key")?),
        message: row.get("message")?,
        is_read: int_to_bool(row.get("is_read")?, "notifications.is_read")?,
        is_dismissed: int_to_bool(row.get("is_dismissed")?, "notifications.is_dismissed")?,
        created_at,
    })
}
