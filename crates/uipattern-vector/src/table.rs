//! LanceDB connection helpers.

use lancedb::{connect, Connection};

use uipattern_core::{Error, Result};

pub async fn open_db(uri: &str) -> Result<Connection> {
    connect(uri)
        .execute()
        .await
        .map_err(|e| Error::IndexUnavailable(format!("cannot connect to {uri}: {e}")))
}

pub async fn table_exists(conn: &Connection, name: &str) -> Result<bool> {
    let names = conn
        .table_names()
        .execute()
        .await
        .map_err(|e| Error::IndexUnavailable(format!("cannot list tables: {e}")))?;
    Ok(names.iter().any(|n| n == name))
}
