use rusqlite::Result as SqliteResult;

use crate::db::Database;
use crate::models::knowledge::UpsertKnowledgeRequest;
use crate::models::KnowledgeItem;

impl Database {
    /// Read-only catalog snapshot for the draft context builder.
    pub fn list_knowledge_items(&self) -> SqliteResult<Vec<KnowledgeItem>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT id, name, category, price, currency, description
             FROM knowledge_items ORDER BY category ASC, name ASC",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(KnowledgeItem {
                id: row.get(0)?,
                name: row.get(1)?,
                category: row.get(2)?,
                price: row.get(3)?,
                currency: row.get(4)?,
                description: row.get(5)?,
            })
        })?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row?);
        }
        Ok(items)
    }

    pub fn upsert_knowledge_item(&self, req: &UpsertKnowledgeRequest) -> SqliteResult<KnowledgeItem> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO knowledge_items (name, category, price, currency, description)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(name) DO UPDATE SET
                category = excluded.category,
                price = excluded.price,
                currency = excluded.currency,
                description = excluded.description",
            rusqlite::params![req.name, req.category, req.price, req.currency, req.description],
        )?;

        let item = conn.query_row(
            "SELECT id, name, category, price, currency, description
             FROM knowledge_items WHERE name = ?1",
            [&req.name],
            |row| {
                Ok(KnowledgeItem {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    category: row.get(2)?,
                    price: row.get(3)?,
                    currency: row.get(4)?,
                    description: row.get(5)?,
                })
            },
        )?;
        Ok(item)
    }
}
