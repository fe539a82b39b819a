//! Queries: one filter, two evaluation paths.
//!
//! A [`Query`] binds a [`Filter`] to a [`Selector`]. [`Query::get`] decides
//! in memory whether one instance belongs to the result, which is what a
//! live view calls when an instance changes. [`Query::execute`] lowers the
//! same filter to SQL and streams the backend's answer. For a stored
//! instance `x` both paths agree: `query.matches(&x)` holds iff `x` is among
//! the rows `execute` yields.
//!
//! ```rust,ignore
//! let query = Query::new(TrackSelector, TITLE.like("Rhap")?);
//!
//! // Live update: does the changed track enter the view?
//! if let Some(title) = query.get(&changed) { view.insert(title); }
//!
//! // Initial load.
//! let mut rows = query.execute(&backend).await?;
//! while let Some(title) = rows.next().await { view.insert(title?); }
//! ```

use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;
use futures::stream::{BoxStream, Stream, StreamExt, TryStreamExt};
use tracing::{debug, instrument};

use crate::error::{QueryError, QueryResult};
use crate::field::{Field, Table};
use crate::filter::Filter;
use crate::row::Row;
use crate::sql::Statement;

/// Rows produced by a backend for one statement.
pub type RowStream = BoxStream<'static, QueryResult<Row>>;

/// A storage backend that runs lowered statements.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Run `statement` and stream its rows.
    ///
    /// Errors preparing or binding the statement are returned here; errors
    /// while stepping through rows are yielded by the stream.
    async fn submit(&self, statement: Statement) -> QueryResult<RowStream>;

    /// A short name used in logs.
    fn name(&self) -> &'static str {
        "backend"
    }
}

/// Shapes results and maps fields to columns for one record type.
pub trait Selector<T: 'static>: Send + Sync + 'static {
    /// What a query yields per matching record.
    type Output;

    /// The table records of `T` are stored in.
    fn table(&self) -> &'static Table<T>;

    /// Column storing `field`.
    fn column(&self, field: &'static Field<T>) -> &'static str {
        field.name()
    }

    /// Columns to select, in the order `decode` expects.
    fn columns(&self) -> Vec<&'static str> {
        self.table()
            .fields()
            .iter()
            .copied()
            .map(|f| self.column(f))
            .collect()
    }

    /// Shape a matching in-memory instance.
    fn project(&self, instance: &T) -> Self::Output;

    /// Shape a backend row.
    fn decode(&self, row: &Row) -> QueryResult<Self::Output>;
}

/// A filter bound to a selector.
pub struct Query<T: 'static, S> {
    filter: Filter<T>,
    selector: Arc<S>,
}

impl<T: 'static, S: Selector<T>> Query<T, S> {
    /// Bind `filter` to `selector`.
    pub fn new(selector: S, filter: Filter<T>) -> Self {
        Self {
            filter,
            selector: Arc::new(selector),
        }
    }

    /// The filter.
    pub fn filter(&self) -> &Filter<T> {
        &self.filter
    }

    /// The selector.
    pub fn selector(&self) -> &S {
        &self.selector
    }

    /// Check if `instance` belongs to the result.
    pub fn matches(&self, instance: &T) -> bool {
        self.filter.matches(instance)
    }

    /// The projected instance if it belongs to the result.
    pub fn get(&self, instance: &T) -> Option<S::Output> {
        self.matches(instance)
            .then(|| self.selector.project(instance))
    }

    /// The `SELECT` this query runs.
    pub fn statement(&self) -> Statement {
        let selector = &*self.selector;
        let columns = selector.columns();
        Statement::select(
            selector.table().name(),
            &columns,
            &self.filter,
            &|field: &'static Field<T>| selector.column(field),
        )
    }

    /// Run on `backend` and stream the results.
    #[instrument(skip_all, fields(table = self.selector.table().name(), backend = backend.name()))]
    pub async fn execute<B: Backend + ?Sized>(&self, backend: &B) -> QueryResult<Execution<T, S>> {
        let statement = self.statement();
        let sql = statement.sql().to_string();
        debug!(filter = %self.filter, sql = %sql, "Executing query");

        let rows = backend
            .submit(statement)
            .await
            .map_err(|e| self.wrap_error(e, &sql))?;

        Ok(Execution {
            rows: Some(rows),
            selector: Arc::clone(&self.selector),
            context: Arc::new(ExecutionContext {
                table: self.selector.table().name(),
                filter: self.filter.to_string(),
                sql,
            }),
            _marker: PhantomData,
        })
    }

    fn wrap_error(&self, err: QueryError, sql: &str) -> QueryError {
        QueryError::backend(format!("query execution failed: {}", err.message))
            .with_context("execute")
            .with_table(self.selector.table().name())
            .with_filter(self.filter.to_string())
            .with_sql(sql)
            .with_source(err)
    }
}

impl<T: 'static, S> Clone for Query<T, S> {
    fn clone(&self) -> Self {
        Self {
            filter: self.filter.clone(),
            selector: Arc::clone(&self.selector),
        }
    }
}

impl<T: 'static, S> std::fmt::Debug for Query<T, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Query")
            .field("filter", &self.filter.to_string())
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
struct ExecutionContext {
    table: &'static str,
    filter: String,
    sql: String,
}

/// Results of a running query, consumed at the caller's pace.
///
/// Dropping the handle, or calling [`Execution::close`], releases the
/// backend cursor; no further rows are read.
pub struct Execution<T, S> {
    rows: Option<RowStream>,
    selector: Arc<S>,
    context: Arc<ExecutionContext>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: 'static, S: Selector<T>> Execution<T, S> {
    /// The next result, or `None` once the backend is exhausted.
    pub async fn next(&mut self) -> Option<QueryResult<S::Output>> {
        StreamExt::next(self).await
    }

    /// Drain every remaining result, stopping at the first error.
    pub async fn try_collect_all(self) -> QueryResult<Vec<S::Output>> {
        self.try_collect().await
    }

    /// Stop reading and release the backend cursor. Later reads yield
    /// `None`.
    pub fn close(&mut self) {
        self.rows = None;
    }

    /// Check if the backend has been exhausted or released.
    pub fn is_closed(&self) -> bool {
        self.rows.is_none()
    }

    /// The SQL being executed.
    pub fn sql(&self) -> &str {
        &self.context.sql
    }
}

impl<T: 'static, S: Selector<T>> Stream for Execution<T, S> {
    type Item = QueryResult<S::Output>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let Some(rows) = this.rows.as_mut() else {
            return Poll::Ready(None);
        };
        match rows.poll_next_unpin(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Some(Ok(row))) => Poll::Ready(Some(this.selector.decode(&row))),
            Poll::Ready(Some(Err(err))) => {
                let context = &this.context;
                let err = if err.context.sql.is_some() {
                    err
                } else {
                    err.with_table(context.table)
                        .with_filter(context.filter.clone())
                        .with_sql(context.sql.clone())
                };
                Poll::Ready(Some(Err(err)))
            }
            Poll::Ready(None) => {
                this.rows = None;
                Poll::Ready(None)
            }
        }
    }
}

impl<T, S> std::fmt::Debug for Execution<T, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Execution")
            .field("sql", &self.context.sql)
            .field("closed", &self.rows.is_none())
            .finish()
    }
}

/// The projected instance if it satisfies `filter`.
pub fn get<T: 'static, S: Selector<T>>(
    selector: &S,
    filter: &Filter<T>,
    instance: &T,
) -> Option<S::Output> {
    filter
        .matches(instance)
        .then(|| selector.project(instance))
}

/// Run `filter` through `selector` on `backend`.
pub async fn execute<T, S, B>(
    backend: &B,
    selector: S,
    filter: Filter<T>,
) -> QueryResult<Execution<T, S>>
where
    T: 'static,
    S: Selector<T>,
    B: Backend + ?Sized,
{
    Query::new(selector, filter).execute(backend).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::value::SqlValue;
    use futures::stream;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[derive(Debug, Clone, PartialEq)]
    struct Track {
        title: String,
        year: Option<i64>,
    }

    static TITLE: Field<Track> = Field::text("title", |t| Some(t.title.as_str()));
    static YEAR: Field<Track> = Field::integer("year", |t| t.year);
    static TRACKS: Table<Track> = Table::new("tracks", &[&TITLE, &YEAR]);

    struct Titles;

    impl Selector<Track> for Titles {
        type Output = String;

        fn table(&self) -> &'static Table<Track> {
            &TRACKS
        }

        fn column(&self, field: &'static Field<Track>) -> &'static str {
            match field.name() {
                "title" => "track_title",
                other => other,
            }
        }

        fn project(&self, instance: &Track) -> String {
            instance.title.clone()
        }

        fn decode(&self, row: &Row) -> QueryResult<String> {
            row.text("track_title")?
                .ok_or_else(|| QueryError::decode("track_title", "unexpected NULL"))
        }
    }

    /// Replays canned rows and records the statements it was given.
    struct Replay {
        rows: Vec<QueryResult<Vec<SqlValue>>>,
        fail: bool,
        seen: Mutex<Vec<Statement>>,
        released: Arc<AtomicBool>,
    }

    impl Replay {
        fn new(rows: Vec<QueryResult<Vec<SqlValue>>>) -> Self {
            Self {
                rows,
                fail: false,
                seen: Mutex::new(Vec::new()),
                released: Arc::new(AtomicBool::new(false)),
            }
        }

        fn released(&self) -> bool {
            self.released.load(Ordering::SeqCst)
        }
    }

    /// Set when the stream holding it is dropped.
    struct Cursor(Arc<AtomicBool>);

    impl Drop for Cursor {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl Backend for Replay {
        async fn submit(&self, statement: Statement) -> QueryResult<RowStream> {
            self.seen.lock().unwrap().push(statement);
            if self.fail {
                return Err(QueryError::backend("no such table: tracks"));
            }
            let columns: Arc<[String]> = vec!["track_title".to_string(), "year".into()].into();
            let rows: Vec<QueryResult<Row>> = self
                .rows
                .iter()
                .map(|r| match r {
                    Ok(values) => Ok(Row::new(Arc::clone(&columns), values.clone())),
                    Err(e) => Err(QueryError::backend(e.message.clone())),
                })
                .collect();
            let cursor = Cursor(Arc::clone(&self.released));
            let rows = stream::unfold((rows.into_iter(), cursor), |(mut rows, cursor)| async move {
                rows.next().map(|row| (row, (rows, cursor)))
            });
            Ok(rows.boxed())
        }
    }

    fn row(title: &str, year: i64) -> QueryResult<Vec<SqlValue>> {
        Ok(vec![SqlValue::Text(title.into()), SqlValue::Integer(year)])
    }

    #[test]
    fn test_get_projects_matching_instance() {
        let query = Query::new(Titles, YEAR.ge(1970).unwrap());
        let rhapsody = Track {
            title: "Bohemian Rhapsody".into(),
            year: Some(1975),
        };
        let unknown = Track {
            title: "Untitled".into(),
            year: None,
        };
        assert_eq!(query.get(&rhapsody), Some("Bohemian Rhapsody".to_string()));
        assert_eq!(query.get(&unknown), None);
        assert_eq!(get(&Titles, query.filter(), &rhapsody), query.get(&rhapsody));
    }

    #[test]
    fn test_statement_uses_selector_columns() {
        let query = Query::new(Titles, TITLE.like("Rhap").unwrap());
        let statement = query.statement();
        assert_eq!(
            statement.sql(),
            "SELECT \"track_title\", \"year\" FROM \"tracks\" WHERE \
             (\"track_title\" IS NOT NULL AND instr(\"track_title\", ?) > 0)"
        );
        assert_eq!(statement.params(), &[SqlValue::Text("Rhap".into())]);
    }

    #[tokio::test]
    async fn test_execute_streams_decoded_rows() {
        let backend = Replay::new(vec![row("Bohemian Rhapsody", 1975), row("Love of My Life", 1975)]);
        let query = Query::new(Titles, YEAR.eq(1975).unwrap());

        let mut execution = query.execute(&backend).await.unwrap();
        assert_eq!(
            execution.next().await.unwrap().unwrap(),
            "Bohemian Rhapsody"
        );
        assert!(!execution.is_closed());
        let rest = execution.try_collect_all().await.unwrap();
        assert_eq!(rest, vec!["Love of My Life".to_string()]);

        let seen = backend.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].params(), &[SqlValue::Integer(1975)]);
    }

    #[tokio::test]
    async fn test_execute_wraps_backend_errors() {
        let mut backend = Replay::new(Vec::new());
        backend.fail = true;

        let err = execute(&backend, Titles, TITLE.eq("x").unwrap())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::BackendExecution);
        assert_eq!(err.context.table.as_deref(), Some("tracks"));
        assert_eq!(err.context.filter.as_deref(), Some("title = 'x'"));
        assert!(err.context.sql.as_deref().unwrap().starts_with("SELECT"));
        assert!(err.source.is_some());
        assert!(err.display_full().contains("no such table"));
    }

    #[tokio::test]
    async fn test_row_errors_carry_query_context() {
        let backend = Replay::new(vec![
            row("Bohemian Rhapsody", 1975),
            Err(QueryError::backend("disk I/O error")),
        ]);
        let query = Query::new(Titles, Filter::all());
        let mut execution = query.execute(&backend).await.unwrap();
        assert!(execution.next().await.unwrap().is_ok());
        let err = execution.next().await.unwrap().unwrap_err();
        assert_eq!(err.context.filter.as_deref(), Some("TRUE"));
        assert_eq!(err.context.sql.as_deref(), Some(execution.sql()));
    }

    #[tokio::test]
    async fn test_close_releases_backend_stream() {
        let backend = Replay::new(vec![row("a", 1), row("b", 2)]);
        let mut execution = Query::new(Titles, Filter::all())
            .execute(&backend)
            .await
            .unwrap();
        assert_eq!(execution.next().await.unwrap().unwrap(), "a");
        assert!(!execution.is_closed());
        assert!(!backend.released());

        execution.close();
        assert!(execution.is_closed());
        assert!(backend.released());
        assert!(execution.next().await.is_none());
    }

    #[tokio::test]
    async fn test_drop_releases_backend_stream() {
        let backend = Replay::new(vec![row("a", 1), row("b", 2)]);
        let execution = Query::new(Titles, Filter::all())
            .execute(&backend)
            .await
            .unwrap();
        assert!(!backend.released());
        drop(execution);
        assert!(backend.released());
    }

    #[tokio::test]
    async fn test_exhausted_execution_is_closed() {
        let backend = Replay::new(vec![row("a", 1)]);
        let mut execution = Query::new(Titles, Filter::all())
            .execute(&backend)
            .await
            .unwrap();
        assert!(execution.next().await.is_some());
        assert!(execution.next().await.is_none());
        assert!(execution.is_closed());
        assert!(backend.released());
        assert!(execution.next().await.is_none());
    }
}
