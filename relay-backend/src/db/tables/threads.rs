use chrono::{DateTime, Utc};
use rusqlite::Result as SqliteResult;
use uuid::Uuid;

use crate::db::Database;
use crate::models::{Attribution, CreateThreadRequest, Thread};

impl Database {
    pub fn create_thread(&self, req: &CreateThreadRequest) -> SqliteResult<Thread> {
        let conn = self.conn.lock().unwrap();
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let tags_json = serde_json::to_string(&req.tags).unwrap_or_else(|_| "[]".to_string());

        conn.execute(
            "INSERT INTO threads (id, owner, phone, email, source, campaign, term, tags, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            rusqlite::params![
                id,
                req.owner,
                req.phone,
                req.email,
                req.source,
                req.campaign,
                req.term,
                tags_json,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ],
        )?;

        Ok(Thread {
            id,
            owner: req.owner.clone(),
            phone: req.phone.clone(),
            email: req.email.clone(),
            attribution: Attribution {
                source: req.source.clone(),
                campaign: req.campaign.clone(),
                term: req.term.clone(),
                tags: req.tags.clone(),
            },
            created_at: now,
            updated_at: now,
        })
    }

    pub fn get_thread(&self, id: &str) -> SqliteResult<Option<Thread>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, owner, phone, email, source, campaign, term, tags, created_at, updated_at
             FROM threads WHERE id = ?1",
        )?;

        let thread = stmt.query_row([id], Self::row_to_thread).ok();
        Ok(thread)
    }

    /// List threads, optionally restricted to a single owner.
    pub fn list_threads(&self, owner: Option<&str>) -> SqliteResult<Vec<Thread>> {
        let conn = self.conn.lock().unwrap();

        let mut threads = Vec::new();
        match owner {
            Some(owner) => {
                let mut stmt = conn.prepare(
                    "SELECT id, owner, phone, email, source, campaign, term, tags, created_at, updated_at
                     FROM threads WHERE owner = ?1 ORDER BY updated_at DESC",
                )?;
                let rows = stmt.query_map([owner], Self::row_to_thread)?;
                for row in rows {
                    threads.push(row?);
                }
            }
            None => {
                let mut stmt = conn.prepare(
                    "SELECT id, owner, phone, email, source, campaign, term, tags, created_at, updated_at
                     FROM threads ORDER BY updated_at DESC",
                )?;
                let rows = stmt.query_map([], Self::row_to_thread)?;
                for row in rows {
                    threads.push(row?);
                }
            }
        }

        Ok(threads)
    }

    /// Reassign a thread to a different operator. Owner is the only mutable
    /// thread attribute; history is never touched.
    pub fn set_thread_owner(&self, id: &str, owner: Option<&str>) -> SqliteResult<bool> {
        let conn = self.conn.lock().unwrap();
        let rows = conn.execute(
            "UPDATE threads SET owner = ?1, updated_at = ?2 WHERE id = ?3",
            rusqlite::params![owner, Utc::now().to_rfc3339(), id],
        )?;
        Ok(rows > 0)
    }

    pub(crate) fn touch_thread(&self, id: &str) -> SqliteResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "UPDATE threads SET updated_at = ?1 WHERE id = ?2",
            rusqlite::params![Utc::now().to_rfc3339(), id],
        )?;
        Ok(())
    }

    fn row_to_thread(row: &rusqlite::Row) -> rusqlite::Result<Thread> {
        let tags_json: String = row.get(7)?;
        let created_at_str: String = row.get(8)?;
        let updated_at_str: String = row.get(9)?;

        Ok(Thread {
            id: row.get(0)?,
            owner: row.get(1)?,
            phone: row.get(2)?,
            email: row.get(3)?,
            attribution: Attribution {
                source: row.get(4)?,
                campaign: row.get(5)?,
                term: row.get(6)?,
                tags: serde_json::from_str(&tags_json).unwrap_or_default(),
            },
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .unwrap()
                .with_timezone(&Utc),
            updated_at: DateTime::parse_from_rfc3339(&updated_at_str)
                .unwrap()
                .with_timezone(&Utc),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Database;
    use crate::models::CreateThreadRequest;

    fn make_request(owner: Option<&str>, phone: Option<&str>) -> CreateThreadRequest {
        CreateThreadRequest {
            owner: owner.map(String::from),
            phone: phone.map(String::from),
            email: None,
            source: Some("facebook".to_string()),
            campaign: None,
            term: None,
            tags: vec!["lead".to_string()],
        }
    }

    #[test]
    fn create_and_get_thread() {
        let db = Database::new(":memory:").expect("in-memory db");
        let thread = db
            .create_thread(&make_request(Some("ana"), Some("+34 600 11 22 33")))
            .expect("create");

        let loaded = db.get_thread(&thread.id).expect("get").expect("exists");
        assert_eq!(loaded.owner.as_deref(), Some("ana"));
        assert_eq!(loaded.attribution.source.as_deref(), Some("facebook"));
        assert_eq!(loaded.attribution.tags, vec!["lead".to_string()]);
    }

    #[test]
    fn list_threads_filters_by_owner() {
        let db = Database::new(":memory:").expect("in-memory db");
        db.create_thread(&make_request(Some("ana"), None)).unwrap();
        db.create_thread(&make_request(Some("luis"), None)).unwrap();
        db.create_thread(&make_request(Some("ana"), None)).unwrap();

        assert_eq!(db.list_threads(Some("ana")).unwrap().len(), 2);
        assert_eq!(db.list_threads(Some("luis")).unwrap().len(), 1);
        assert_eq!(db.list_threads(None).unwrap().len(), 3);
    }

    #[test]
    fn owner_is_mutable() {
        let db = Database::new(":memory:").expect("in-memory db");
        let thread = db.create_thread(&make_request(Some("ana"), None)).unwrap();

        assert!(db.set_thread_owner(&thread.id, Some("luis")).unwrap());
        let loaded = db.get_thread(&thread.id).unwrap().unwrap();
        assert_eq!(loaded.owner.as_deref(), Some("luis"));
    }
}
