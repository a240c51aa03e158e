//! key-value persistence port
//! session fields, skipped update version and per device icon choice live here

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::OptionalExtension;

use crate::common::error::ClientResult;
use crate::common::sqlite::SqliteConnection;

#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> ClientResult<Option<String>>;

    async fn put(&self, key: &str, value: &str) -> ClientResult<()>;

    /// write several keys in one transaction
    async fn put_all(&self, entries: Vec<(String, String)>) -> ClientResult<()> {
        self.write_batch(entries, Vec::new()).await
    }

    async fn remove(&self, key: &str) -> ClientResult<()>;

    async fn remove_all(&self, keys: Vec<String>) -> ClientResult<()> {
        self.write_batch(Vec::new(), keys).await
    }

    /// `puts` and `removes` applied together in one transaction
    async fn write_batch(&self, puts: Vec<(String, String)>, removes: Vec<String>) -> ClientResult<()>;
}

pub struct SqliteKvStore {
    db: SqliteConnection,
}

impl SqliteKvStore {
    pub async fn open(file_name: &str) -> ClientResult<Self> {
        Ok(SqliteKvStore {
            db: SqliteConnection::open(file_name).await?,
        })
    }

    pub async fn open_in_memory() -> ClientResult<Self> {
        Ok(SqliteKvStore {
            db: SqliteConnection::open_in_memory().await?,
        })
    }
}

#[async_trait]
impl KvStore for SqliteKvStore {
    async fn get(&self, key: &str) -> ClientResult<Option<String>> {
        let key = key.to_string();
        let value = self
            .db
            .conn()
            .call(move |conn| {
                conn.query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get::<usize, String>(0))
                    .optional()
            })
            .await?;
        Ok(value)
    }

    async fn put(&self, key: &str, value: &str) -> ClientResult<()> {
        let key = key.to_string();
        let value = value.to_string();
        self.db
            .conn()
            .call(move |conn| conn.execute("INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)", [key, value]))
            .await?;
        Ok(())
    }


    async fn remove(&self, key: &str) -> ClientResult<()> {
        let key = key.to_string();
        self.db
            .conn()
            .call(move |conn| conn.execute("DELETE FROM kv WHERE key = ?1", [key]))
            .await?;
        Ok(())
    }

    async fn write_batch(&self, puts: Vec<(String, String)>, removes: Vec<String>) -> ClientResult<()> {
        self.db
            .conn()
            .call(move |conn| {
                let tx = conn.transaction()?;
                for key in removes {
                    tx.execute("DELETE FROM kv WHERE key = ?1", [key])?;
                }
                for (key, value) in puts {
                    tx.execute("INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)", [key, value])?;
                }
                tx.commit()
            })
            .await?;
        Ok(())
    }
}

/// process local store, nothing survives a restart
#[derive(Default)]
pub struct MemoryKvStore {
    map: Mutex<HashMap<String, String>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        MemoryKvStore::default()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> ClientResult<Option<String>> {
        Ok(self.map.lock().unwrap().get(key).cloned())
    }

    async fn put(&self, key: &str, value: &str) -> ClientResult<()> {
        self.map.lock().unwrap().insert(key.to_string(), value.to_string());
        Ok(())
    }


    async fn remove(&self, key: &str) -> ClientResult<()> {
        self.map.lock().unwrap().remove(key);
        Ok(())
    }

    async fn write_batch(&self, puts: Vec<(String, String)>, removes: Vec<String>) -> ClientResult<()> {
        let mut map_guard = self.map.lock().unwrap();
        for key in removes {
            map_guard.remove(&key);
        }
        map_guard.extend(puts);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn exercise(store: &dyn KvStore) {
        assert_eq!(store.get("a").await.unwrap(), None);
        store.put("a", "1").await.unwrap();
        store.put("a", "2").await.unwrap();
        assert_eq!(store.get("a").await.unwrap().as_deref(), Some("2"));

        store
            .put_all(vec![("b".to_string(), "x".to_string()), ("c".to_string(), "y".to_string())])
            .await
            .unwrap();
        assert_eq!(store.get("c").await.unwrap().as_deref(), Some("y"));

        store.remove("a").await.unwrap();
        store.remove_all(vec!["b".to_string(), "c".to_string()]).await.unwrap();
        assert_eq!(store.get("a").await.unwrap(), None);
        assert_eq!(store.get("b").await.unwrap(), None);

        store.put("d", "old").await.unwrap();
        store
            .write_batch(vec![("e".to_string(), "1".to_string())], vec!["d".to_string()])
            .await
            .unwrap();
        assert_eq!(store.get("d").await.unwrap(), None);
        assert_eq!(store.get("e").await.unwrap().as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_sqlite_store() {
        let store = SqliteKvStore::open_in_memory().await.unwrap();
        exercise(&store).await;
    }

    #[tokio::test]
    async fn test_memory_store() {
        exercise(&MemoryKvStore::new()).await;
    }

    #[tokio::test]
    async fn test_sqlite_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("client.db");
        let path = path.to_str().unwrap();
        {
            let store = SqliteKvStore::open(path).await.unwrap();
            store.put("session.token", "T1").await.unwrap();
        }
        let store = SqliteKvStore::open(path).await.unwrap();
        assert_eq!(store.get("session.token").await.unwrap().as_deref(), Some("T1"));
    }
}
