use std::collections::HashSet;

use super::schema::Database;
use super::types::DatabaseError;

impl Database {
    /// All recorded identifiers in append order, empty ones discarded.
    pub async fn load_seen_ids(&self) -> Result<Vec<String>, DatabaseError> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT id FROM seen_ids ORDER BY row")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(id,)| id)
            .filter(|id| !id.is_empty())
            .collect())
    }

    /// Appends one identifier. Rows are never updated or deleted.
    pub async fn append_seen_id(&self, id: &str) -> Result<(), DatabaseError> {
        let now = chrono::Utc::now().timestamp();
        sqlx::query("INSERT INTO seen_ids (id, recorded_at) VALUES (?, ?)")
            .bind(id)
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

/// The set of entry identifiers already relayed, shared by every feed.
///
/// Loaded once per run. [`SeenSet::commit`] writes through to the database
/// before touching memory, so the in-memory view is never ahead of the
/// durable one.
pub struct SeenSet {
    db: Database,
    ids: HashSet<String>,
}

impl SeenSet {
    pub async fn load(db: Database) -> Result<Self, DatabaseError> {
        let ids: HashSet<String> = db.load_seen_ids().await?.into_iter().collect();
        tracing::debug!(count = ids.len(), "Loaded seen IDs");
        Ok(Self { db, ids })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Records `id` durably, then in memory.
    ///
    /// Already-present identifiers are not appended again. Empty identifiers
    /// are ignored since they could never be read back.
    pub async fn commit(&mut self, id: &str) -> Result<(), DatabaseError> {
        if id.is_empty() || self.ids.contains(id) {
            return Ok(());
        }
        self.db.append_seen_id(id).await?;
        self.ids.insert(id.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> Database {
        Database::open(":memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_commit_persists_and_reloads() {
        let db = test_db().await;
        let mut seen = SeenSet::load(db.clone()).await.unwrap();
        assert!(seen.is_empty());

        seen.commit("https://example.com/1").await.unwrap();
        assert!(seen.contains("https://example.com/1"));

        let reloaded = SeenSet::load(db).await.unwrap();
        assert!(reloaded.contains("https://example.com/1"));
        assert_eq!(reloaded.len(), 1);
    }

    #[tokio::test]
    async fn test_numeric_looking_ids_stay_text() {
        let db = test_db().await;
        let mut seen = SeenSet::load(db.clone()).await.unwrap();
        seen.commit("00123").await.unwrap();
        seen.commit("1e5").await.unwrap();

        let ids = db.load_seen_ids().await.unwrap();
        assert_eq!(ids, vec!["00123".to_string(), "1e5".to_string()]);
    }

    #[tokio::test]
    async fn test_duplicate_commit_not_appended() {
        let db = test_db().await;
        let mut seen = SeenSet::load(db.clone()).await.unwrap();
        seen.commit("a").await.unwrap();
        seen.commit("a").await.unwrap();

        assert_eq!(db.load_seen_ids().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_rows_discarded_on_load() {
        let db = test_db().await;
        db.append_seen_id("").await.unwrap();
        db.append_seen_id("x").await.unwrap();

        let seen = SeenSet::load(db).await.unwrap();
        assert_eq!(seen.len(), 1);
        assert!(!seen.contains(""));
    }

    #[tokio::test]
    async fn test_append_order_preserved() {
        let db = test_db().await;
        for id in ["c", "a", "b"] {
            db.append_seen_id(id).await.unwrap();
        }
        assert_eq!(
            db.load_seen_ids().await.unwrap(),
            vec!["c".to_string(), "a".to_string(), "b".to_string()]
        );
    }
}
