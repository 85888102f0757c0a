use chrono::{DateTime, Utc};
use rusqlite::Result as SqliteResult;

use crate::db::Database;
use crate::models::{ChannelKind, Direction, EntryKind, HistoryEntry};

impl Database {
    /// Append one entry to a thread's history.
    ///
    /// This is the single persistence point for the history writer: exactly
    /// one row per successful dispatch, and notes are forced onto the
    /// internal channel no matter what the caller selected.
    #[allow(clippy::too_many_arguments)]
    pub fn append_history(
        &self,
        thread_id: &str,
        direction: Direction,
        kind: EntryKind,
        channel: ChannelKind,
        body: &str,
        subject: Option<&str>,
        author: Option<&str>,
    ) -> SqliteResult<HistoryEntry> {
        // Invariant: kind = note implies channel = internal
        let channel = if kind == EntryKind::Note {
            ChannelKind::Internal
        } else {
            channel
        };
        let subject = if channel == ChannelKind::Email {
            subject
        } else {
            None
        };
        let created_at = Utc::now();

        let id = {
            let conn = self.conn.lock().unwrap();
            conn.execute(
                "INSERT INTO history (thread_id, direction, kind, channel, body, subject, author, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    thread_id,
                    direction.as_str(),
                    kind.as_str(),
                    channel.as_str(),
                    body,
                    subject,
                    author,
                    created_at.to_rfc3339(),
                ],
            )?;
            conn.last_insert_rowid()
        };

        // The row is already committed; a failed updated_at bump must not
        // turn a persisted entry into a reported append failure.
        if let Err(e) = self.touch_thread(thread_id) {
            log::warn!("[DB] failed to bump updated_at for thread {}: {}", thread_id, e);
        }

        Ok(HistoryEntry {
            id,
            thread_id: thread_id.to_string(),
            direction,
            kind,
            channel,
            body: body.to_string(),
            subject: subject.map(String::from),
            author: author.map(String::from),
            created_at,
        })
    }

    /// Record a customer message arriving from the inbound webhook.
    pub fn record_inbound(
        &self,
        thread_id: &str,
        channel: ChannelKind,
        body: &str,
    ) -> SqliteResult<HistoryEntry> {
        self.append_history(
            thread_id,
            Direction::Inbound,
            EntryKind::Message,
            channel,
            body,
            None,
            None,
        )
    }

    /// Full ordered history for a thread: created_at ascending, ties broken
    /// by rowid (insertion order).
    pub fn list_history(&self, thread_id: &str) -> SqliteResult<Vec<HistoryEntry>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, thread_id, direction, kind, channel, body, subject, author, created_at
             FROM history WHERE thread_id = ?1 ORDER BY created_at ASC, id ASC",
        )?;

        let rows = stmt.query_map([thread_id], Self::row_to_history_entry)?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }
        Ok(entries)
    }

    pub fn count_history(&self, thread_id: &str) -> SqliteResult<i64> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT COUNT(*) FROM history WHERE thread_id = ?1",
            [thread_id],
            |row| row.get(0),
        )
    }

    fn row_to_history_entry(row: &rusqlite::Row) -> rusqlite::Result<HistoryEntry> {
        let direction_str: String = row.get(2)?;
        let kind_str: String = row.get(3)?;
        let channel_str: String = row.get(4)?;
        let created_at_str: String = row.get(8)?;

        Ok(HistoryEntry {
            id: row.get(0)?,
            thread_id: row.get(1)?,
            direction: Direction::from_str(&direction_str).unwrap_or(Direction::Outbound),
            kind: EntryKind::from_str(&kind_str).unwrap_or(EntryKind::Message),
            channel: ChannelKind::from_str(&channel_str).unwrap_or(ChannelKind::Internal),
            body: row.get(5)?,
            subject: row.get(6)?,
            author: row.get(7)?,
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .unwrap()
                .with_timezone(&Utc),
        })
    }
}
