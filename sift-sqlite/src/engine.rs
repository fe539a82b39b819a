//! The SQLite backend.
//!
//! All work runs on the `tokio-rusqlite` connection thread. A submitted
//! statement is prepared and bound there; the outcome is reported back
//! before any row is read, so prepare and bind errors come out of
//! [`Backend::submit`] itself. Rows are then stepped one at a time and sent
//! through a bounded channel of [`SqliteConfig::row_buffer`] slots. When the
//! consumer drops the stream the next send fails, stepping stops and the
//! statement is finalized.
//!
//! The connection thread is busy until a running statement is drained or
//! dropped, so a backend serves one execution at a time. While an execution
//! is open every other call on the backend fails with
//! [`SqliteError::Connection`] instead of waiting on the thread.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream;
use rusqlite::types::Value;
use tokio::sync::{mpsc, oneshot};
use tokio_rusqlite::Connection;
use tracing::{debug, instrument, trace};

use sift_query::{
    Backend, QueryError, QueryResult, Row, RowStream, SqlValue, Statement, Table,
    escape_identifier,
};

use crate::config::{DatabasePath, SqliteConfig};
use crate::error::{SqliteError, SqliteResult};
use crate::types::{decode_row, to_sqlite_value};

const BUSY: &str = "connection busy with an open execution";

/// A [`Backend`] over one SQLite connection.
#[derive(Clone)]
pub struct SqliteBackend {
    conn: Connection,
    config: Arc<SqliteConfig>,
    busy: Arc<AtomicBool>,
}

/// Held by the row stream of the open execution.
struct Lease(Arc<AtomicBool>);

impl Drop for Lease {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl SqliteBackend {
    /// Open a connection and apply the configured PRAGMAs.
    #[instrument(skip(config), fields(path = %config.path))]
    pub async fn open(config: SqliteConfig) -> SqliteResult<Self> {
        let conn = match &config.path {
            DatabasePath::Memory => Connection::open_in_memory().await?,
            DatabasePath::File(path) => Connection::open(path).await?,
        };

        let init_sql = config.init_sql();
        debug!(init_sql = %init_sql, "Initializing connection");
        conn.call(move |conn| {
            conn.execute_batch(&init_sql)?;
            Ok(())
        })
        .await?;

        Ok(Self {
            conn,
            config: Arc::new(config),
            busy: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Open a private in-memory database.
    pub async fn memory() -> SqliteResult<Self> {
        Self::open(SqliteConfig::memory()).await
    }

    /// Open the database named by `SIFT_DATABASE_URL`.
    pub async fn from_env() -> SqliteResult<Self> {
        Self::open(SqliteConfig::from_env()?).await
    }

    /// The configuration this backend was opened with.
    pub fn config(&self) -> &SqliteConfig {
        &self.config
    }

    /// Check if an execution is holding the connection.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    fn ensure_idle(&self) -> SqliteResult<()> {
        if self.is_busy() {
            return Err(SqliteError::connection(BUSY));
        }
        Ok(())
    }

    fn lease(&self) -> SqliteResult<Lease> {
        if self.busy.swap(true, Ordering::AcqRel) {
            return Err(SqliteError::connection(BUSY));
        }
        Ok(Lease(Arc::clone(&self.busy)))
    }

    /// Run one or more statements without parameters.
    pub async fn execute_batch(&self, sql: impl Into<String>) -> SqliteResult<()> {
        self.ensure_idle()?;
        let sql = sql.into();
        debug!(sql = %sql, "Executing batch");
        self.conn
            .call(move |conn| {
                conn.execute_batch(&sql)?;
                Ok(())
            })
            .await
            .map_err(SqliteError::from)
    }

    /// Run one statement with parameters, returning the affected row count.
    pub async fn execute(&self, statement: Statement) -> SqliteResult<usize> {
        self.ensure_idle()?;
        let (sql, params) = statement.into_parts();
        let params: Vec<Value> = params.iter().map(to_sqlite_value).collect();
        debug!(sql = %sql, params = params.len(), "Executing statement");
        self.conn
            .call(move |conn| Ok(conn.execute(&sql, rusqlite::params_from_iter(params.iter()))?))
            .await
            .map_err(SqliteError::from)
    }

    /// Create the table for `table` unless it exists.
    ///
    /// One column per field, typed `TEXT`, `REAL` or `INTEGER` by the field
    /// kind and nullable.
    pub async fn create_table<T: 'static>(&self, table: &Table<T>) -> SqliteResult<()> {
        self.execute_batch(create_table_sql(table)?).await
    }

    /// Store one instance.
    pub async fn insert<T: 'static>(&self, table: &Table<T>, instance: &T) -> SqliteResult<()> {
        self.execute(insert_statement(table, table.row(instance)))
            .await
            .map(drop)
    }

    /// Store every instance in one transaction.
    #[instrument(skip_all, fields(table = table.name()))]
    pub async fn insert_all<'a, T: 'static>(
        &self,
        table: &Table<T>,
        instances: impl IntoIterator<Item = &'a T>,
    ) -> SqliteResult<usize> {
        self.ensure_idle()?;
        let sql = insert_statement(table, Vec::new()).into_parts().0;
        let rows: Vec<Vec<Value>> = instances
            .into_iter()
            .map(|instance| table.row(instance).iter().map(to_sqlite_value).collect())
            .collect();
        let count = rows.len();
        debug!(sql = %sql, rows = count, "Inserting rows");

        self.conn
            .call(move |conn| {
                let tx = conn.transaction()?;
                {
                    let mut stmt = tx.prepare(&sql)?;
                    for row in &rows {
                        stmt.execute(rusqlite::params_from_iter(row.iter()))?;
                    }
                }
                tx.commit()?;
                Ok(())
            })
            .await?;
        Ok(count)
    }

    /// Close the connection, waiting for queued work.
    pub async fn close(self) -> SqliteResult<()> {
        self.ensure_idle()?;
        self.conn.close().await.map_err(SqliteError::from)
    }
}

#[async_trait]
impl Backend for SqliteBackend {
    #[instrument(skip_all, fields(sql = %statement.sql()))]
    async fn submit(&self, statement: Statement) -> QueryResult<RowStream> {
        let lease = self.lease()?;
        let (sql, params) = statement.into_parts();
        let params: Vec<Value> = params.iter().map(to_sqlite_value).collect();
        debug!(params = params.len(), "Submitting statement");

        let (ready_tx, ready_rx) = oneshot::channel::<SqliteResult<Arc<[String]>>>();
        let (row_tx, row_rx) = mpsc::channel::<QueryResult<Row>>(self.config.row_buffer.max(1));

        let conn = self.conn.clone();
        tokio::spawn(async move {
            let outcome = conn
                .call(move |conn| {
                    stream_rows(conn, &sql, &params, ready_tx, row_tx);
                    Ok(())
                })
                .await;
            if let Err(e) = outcome {
                debug!(error = %e, "Connection refused statement");
            }
        });

        let columns = match ready_rx.await {
            Ok(Ok(columns)) => columns,
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => return Err(SqliteError::connection("connection thread is closed").into()),
        };
        trace!(columns = columns.len(), "Statement ready");

        // The lease lives as long as the receiver: dropping or draining the
        // stream frees the backend for the next call.
        let rows = stream::unfold((row_rx, lease), |(mut rx, lease)| async move {
            rx.recv().await.map(|row| (row, (rx, lease)))
        });
        Ok(rows.boxed())
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}

/// Prepare, bind and step `sql` on the connection thread.
///
/// Reports the column names (or the prepare/bind error) on `ready`, then
/// sends rows until the statement is done or `rows` is closed.
fn stream_rows(
    conn: &mut rusqlite::Connection,
    sql: &str,
    params: &[Value],
    ready: oneshot::Sender<SqliteResult<Arc<[String]>>>,
    rows: mpsc::Sender<QueryResult<Row>>,
) {
    let mut stmt = match conn.prepare(sql) {
        Ok(stmt) => stmt,
        Err(e) => {
            let _ = ready.send(Err(e.into()));
            return;
        }
    };
    let columns: Arc<[String]> = stmt
        .column_names()
        .into_iter()
        .map(String::from)
        .collect();

    let mut cursor = match stmt.query(rusqlite::params_from_iter(params.iter())) {
        Ok(cursor) => cursor,
        Err(e) => {
            let _ = ready.send(Err(e.into()));
            return;
        }
    };
    if ready.send(Ok(Arc::clone(&columns))).is_err() {
        return;
    }

    let mut sent = 0usize;
    loop {
        let item = match cursor.next() {
            Ok(Some(row)) => decode_row(row, &columns)
                .map(|values| Row::new(Arc::clone(&columns), values))
                .map_err(QueryError::from),
            Ok(None) => break,
            Err(e) => Err(QueryError::from(SqliteError::from(e))),
        };
        let failed = item.is_err();
        if rows.blocking_send(item).is_err() {
            trace!(sent, "Consumer dropped the stream");
            return;
        }
        if failed {
            break;
        }
        sent += 1;
    }
    trace!(sent, "Statement exhausted");
}

/// `CREATE TABLE IF NOT EXISTS` for `table`.
pub fn create_table_sql<T: 'static>(table: &Table<T>) -> SqliteResult<String> {
    if table.fields().is_empty() {
        return Err(SqliteError::query(format!(
            "table '{}' declares no fields",
            table.name()
        )));
    }
    let columns: Vec<String> = table
        .fields()
        .iter()
        .map(|f| format!("{} {}", escape_identifier(f.name()), f.kind().sql_type()))
        .collect();
    Ok(format!(
        "CREATE TABLE IF NOT EXISTS {} ({})",
        escape_identifier(table.name()),
        columns.join(", ")
    ))
}

/// `INSERT INTO` for `table`, binding `values` in field order.
pub fn insert_statement<T: 'static>(table: &Table<T>, values: Vec<SqlValue>) -> Statement {
    let columns: Vec<String> = table
        .fields()
        .iter()
        .map(|f| escape_identifier(f.name()))
        .collect();
    let placeholders = vec!["?"; columns.len()].join(", ");
    Statement::new(
        format!(
            "INSERT INTO {} ({}) VALUES ({})",
            escape_identifier(table.name()),
            columns.join(", "),
            placeholders
        ),
        values,
    )
}
