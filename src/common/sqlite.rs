use tokio_rusqlite::Connection;

use crate::debug;

const LOG_TAG: &str = "sqlite";

pub struct SqliteConnection {
    conn: Connection,
}

impl SqliteConnection {
    /// open the database file, parent folder is created when missing
    pub async fn open(file_name: &str) -> tokio_rusqlite::Result<Self> {
        if let Some(parent) = std::path::Path::new(file_name).parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    crate::warn!(LOG_TAG, "cannot create database folder {:?}: {}", parent, e);
                }
            }
        }
        let conn = Connection::open(file_name).await?;
        let ret = SqliteConnection { conn };
        ret.init_tables().await?;
        debug!(LOG_TAG, "sqlite 数据库已打开: {}", file_name);
        Ok(ret)
    }

    pub async fn open_in_memory() -> tokio_rusqlite::Result<Self> {
        let conn = Connection::open_in_memory().await?;
        let ret = SqliteConnection { conn };
        ret.init_tables().await?;
        Ok(ret)
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// 创建数据表
    async fn init_tables(&self) -> tokio_rusqlite::Result<()> {
        self.conn
            .call(|conn| {
                conn.execute(
                    "CREATE TABLE IF NOT EXISTS kv (
                        key             TEXT PRIMARY KEY,
                        value           TEXT NOT NULL
                    )",
                    (),
                )
            })
            .await?;
        debug!(LOG_TAG, "sqlite 数据表初始化完成");
        Ok(())
    }
}
