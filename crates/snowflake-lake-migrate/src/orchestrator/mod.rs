//! Batch orchestrator - main workflow coordinator.
//!
//! Runs one batch: enumerate tables, then for each table introspect and
//! migrate, strictly sequentially. Per-table failures are caught here and
//! recorded; the batch always continues to the next table. Only an
//! enumeration failure aborts the whole batch, since without a table list
//! there is nothing to iterate.

use crate::config::Config;
use crate::engine::{LakehouseEngine, LakehouseSession};
use crate::error::Result;
use crate::migrate::TableMigrator;
use crate::warehouse::{self, SnowflakeWarehouse, WarehouseClient};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Progress event emitted while a batch runs.
///
/// Delivered through the channel installed with [`Orchestrator::with_events`]
/// so a front end can render progress from its own execution context; the
/// worker never touches front-end state directly.
#[derive(Debug, Clone)]
pub enum MigrationEvent {
    /// A table has entered processing.
    TableStarted { table: String },

    /// A table was migrated successfully.
    TableSucceeded { table: String },

    /// A table failed and was skipped; the batch continues.
    TableFailed { table: String, reason: String },

    /// Enumeration failed before any table was attempted.
    BatchAborted { reason: String },

    /// All tables were attempted and the session was released.
    BatchCompleted {
        attempted: usize,
        succeeded: usize,
        failed: usize,
    },
}

impl fmt::Display for MigrationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationEvent::TableStarted { table } => write!(f, "processing table {}", table),
            MigrationEvent::TableSucceeded { table } => write!(f, "table {} migrated", table),
            MigrationEvent::TableFailed { table, reason } => {
                write!(f, "table {} failed: {}", table, reason)
            }
            MigrationEvent::BatchAborted { reason } => write!(f, "batch aborted: {}", reason),
            MigrationEvent::BatchCompleted {
                attempted,
                succeeded,
                ..
            } => write!(f, "batch complete: {}/{} tables migrated", succeeded, attempted),
        }
    }
}

/// One failed table with its reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableFailure {
    pub table: String,
    pub reason: String,
}

/// Result of a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// Unique run identifier.
    pub run_id: String,

    /// Final status: "completed" or "aborted".
    pub status: String,

    /// When the batch started.
    pub started_at: DateTime<Utc>,

    /// When the batch finished.
    pub completed_at: DateTime<Utc>,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// Tables attempted.
    pub tables_attempted: usize,

    /// Tables migrated successfully.
    pub tables_succeeded: usize,

    /// Tables that failed, with reasons.
    pub tables_failed: Vec<TableFailure>,

    /// Batch-level error, set only when the batch aborted.
    pub error: Option<String>,
}

impl BatchOutcome {
    /// Convert to a pretty JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn aborted(run_id: String, started_at: DateTime<Utc>, error: String) -> Self {
        let completed_at = Utc::now();
        Self {
            run_id,
            status: "aborted".to_string(),
            started_at,
            completed_at,
            duration_seconds: duration_seconds(started_at, completed_at),
            tables_attempted: 0,
            tables_succeeded: 0,
            tables_failed: Vec::new(),
            error: Some(error),
        }
    }
}

fn duration_seconds(started_at: DateTime<Utc>, completed_at: DateTime<Utc>) -> f64 {
    (completed_at - started_at).num_milliseconds() as f64 / 1000.0
}

/// Batch orchestrator.
pub struct Orchestrator {
    config: Config,
    warehouse: Arc<dyn WarehouseClient>,
    engine: Arc<dyn LakehouseEngine>,
    events: Option<mpsc::UnboundedSender<MigrationEvent>>,
}

impl Orchestrator {
    /// Create an orchestrator with the real collaborators: a Snowflake
    /// warehouse client and a lakehouse session initialized once for the
    /// whole batch.
    pub fn new(config: Config) -> Result<Self> {
        let engine = LakehouseSession::open(&config.target)?;
        Ok(Self::with_collaborators(
            config,
            Arc::new(SnowflakeWarehouse::new()),
            Arc::new(engine),
        ))
    }

    /// Create an orchestrator over explicit collaborators.
    pub fn with_collaborators(
        config: Config,
        warehouse: Arc<dyn WarehouseClient>,
        engine: Arc<dyn LakehouseEngine>,
    ) -> Self {
        Self {
            config,
            warehouse,
            engine,
            events: None,
        }
    }

    /// Install an event channel for progress reporting.
    pub fn with_events(mut self, tx: mpsc::UnboundedSender<MigrationEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    fn emit(&self, event: MigrationEvent) {
        match &event {
            MigrationEvent::TableFailed { .. } | MigrationEvent::BatchAborted { .. } => {
                warn!("{}", event)
            }
            _ => info!("{}", event),
        }
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }

    /// Run the batch to completion.
    ///
    /// Per-table state: Pending -> Processing -> Succeeded | Failed, with no
    /// retries and no intermediate states. No cancellation once started: the
    /// only stop conditions are natural completion and an enumeration-phase
    /// abort.
    pub async fn run(self) -> Result<BatchOutcome> {
        let started_at = Utc::now();
        let run_id = uuid::Uuid::new_v4().to_string();

        info!("starting batch run {}", run_id);

        let tables =
            match warehouse::list_tables(self.warehouse.as_ref(), &self.config.source).await {
                Ok(tables) => tables,
                Err(e) => {
                    self.emit(MigrationEvent::BatchAborted {
                        reason: e.to_string(),
                    });
                    if let Err(close_err) = self.engine.close().await {
                        warn!("failed to release engine session: {}", close_err);
                    }
                    return Ok(BatchOutcome::aborted(run_id, started_at, e.to_string()));
                }
            };

        info!("found {} tables to migrate", tables.len());

        let migrator = TableMigrator::new(self.engine.clone(), self.config.target.clone());

        let mut succeeded = 0usize;
        let mut failed: Vec<TableFailure> = Vec::new();

        for table in &tables {
            self.emit(MigrationEvent::TableStarted {
                table: table.clone(),
            });

            match self.migrate_one(&migrator, table).await {
                Ok(()) => {
                    succeeded += 1;
                    self.emit(MigrationEvent::TableSucceeded {
                        table: table.clone(),
                    });
                }
                Err(e) => {
                    // Per-table failure isolation: record and continue.
                    let reason = e.to_string();
                    failed.push(TableFailure {
                        table: table.clone(),
                        reason: reason.clone(),
                    });
                    self.emit(MigrationEvent::TableFailed {
                        table: table.clone(),
                        reason,
                    });
                }
            }
        }

        if let Err(e) = self.engine.close().await {
            warn!("failed to release engine session: {}", e);
        }

        self.emit(MigrationEvent::BatchCompleted {
            attempted: tables.len(),
            succeeded,
            failed: failed.len(),
        });

        let completed_at = Utc::now();
        Ok(BatchOutcome {
            run_id,
            status: "completed".to_string(),
            started_at,
            completed_at,
            duration_seconds: duration_seconds(started_at, completed_at),
            tables_attempted: tables.len(),
            tables_succeeded: succeeded,
            tables_failed: failed,
            error: None,
        })
    }

    async fn migrate_one(&self, migrator: &TableMigrator, table: &str) -> Result<()> {
        let schema =
            warehouse::describe_schema(self.warehouse.as_ref(), &self.config.source, table).await?;
        migrator.migrate(&self.config.source, &schema).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SourceConfig;
    use crate::engine::DataSet;
    use crate::error::MigrateError;
    use crate::schema::TableSchema;
    use crate::warehouse::{DescribedColumn, WarehouseConnection};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;

    struct MockWarehouse {
        tables: Vec<String>,
        fail_list: bool,
        fail_describe: Option<String>,
    }

    impl MockWarehouse {
        fn with_tables(tables: &[&str]) -> Self {
            Self {
                tables: tables.iter().map(|s| s.to_string()).collect(),
                fail_list: false,
                fail_describe: None,
            }
        }
    }

    struct MockConnection {
        tables: Vec<String>,
        fail_list: bool,
        fail_describe: Option<String>,
    }

    #[async_trait]
    impl WarehouseClient for MockWarehouse {
        async fn connect(&self, _conn: &SourceConfig) -> Result<Box<dyn WarehouseConnection>> {
            Ok(Box::new(MockConnection {
                tables: self.tables.clone(),
                fail_list: self.fail_list,
                fail_describe: self.fail_describe.clone(),
            }))
        }
    }

    #[async_trait]
    impl WarehouseConnection for MockConnection {
        async fn describe_table(&mut self, table: &str) -> Result<Vec<DescribedColumn>> {
            if self.fail_describe.as_deref() == Some(table) {
                return Err(MigrateError::Warehouse("describe blew up".into()));
            }
            Ok(vec![DescribedColumn {
                name: "ID".into(),
                data_type: "NUMBER(38,0)".into(),
            }])
        }

        async fn show_tables(&mut self) -> Result<Vec<String>> {
            if self.fail_list {
                return Err(MigrateError::Warehouse("warehouse unreachable".into()));
            }
            Ok(self.tables.clone())
        }

        async fn close(self: Box<Self>) -> Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockEngine {
        ddl: Mutex<Vec<String>>,
        overwrites: Mutex<Vec<String>>,
        closed: AtomicBool,
        fail_read: Option<String>,
    }

    #[async_trait]
    impl LakehouseEngine for MockEngine {
        async fn read_source_table(
            &self,
            _conn: &SourceConfig,
            table: &str,
            _schema: &TableSchema,
        ) -> Result<DataSet> {
            if self.fail_read.as_deref() == Some(table) {
                return Err(MigrateError::Warehouse("bulk read blew up".into()));
            }
            Ok(Vec::new())
        }

        async fn execute_ddl(&self, sql: &str) -> Result<()> {
            self.ddl.lock().unwrap().push(sql.to_string());
            Ok(())
        }

        async fn overwrite_table(
            &self,
            _namespace: &str,
            table: &str,
            _schema: &TableSchema,
            _data: DataSet,
        ) -> Result<()> {
            self.overwrites.lock().unwrap().push(table.to_string());
            Ok(())
        }

        async fn close(&self) -> Result<()> {
            self.closed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    fn config() -> Config {
        Config::from_yaml(
            "source:\n  account: xy12345\n  user: u\n  password: p\n  warehouse: wh\n  database: db\n\
             target:\n  bucket: test-bucket\n  key_file: /dev/null\n",
        )
        .unwrap()
    }

    async fn run_batch(
        warehouse: MockWarehouse,
        engine: Arc<MockEngine>,
    ) -> (BatchOutcome, Vec<MigrationEvent>) {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let orchestrator =
            Orchestrator::with_collaborators(config(), Arc::new(warehouse), engine).with_events(tx);
        let outcome = orchestrator.run().await.unwrap();

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        (outcome, events)
    }

    fn rendered(events: &[MigrationEvent]) -> Vec<String> {
        events.iter().map(|e| e.to_string()).collect()
    }

    #[tokio::test]
    async fn test_all_tables_migrate() {
        let engine = Arc::new(MockEngine::default());
        let (outcome, events) =
            run_batch(MockWarehouse::with_tables(&["A", "B"]), engine.clone()).await;

        assert_eq!(outcome.status, "completed");
        assert_eq!(outcome.tables_attempted, 2);
        assert_eq!(outcome.tables_succeeded, 2);
        assert!(outcome.tables_failed.is_empty());
        assert!(outcome.error.is_none());

        assert_eq!(
            rendered(&events),
            vec![
                "processing table A",
                "table A migrated",
                "processing table B",
                "table B migrated",
                "batch complete: 2/2 tables migrated",
            ]
        );

        assert_eq!(*engine.overwrites.lock().unwrap(), vec!["A", "B"]);
        assert!(engine.closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_failed_describe_is_isolated() {
        let mut warehouse = MockWarehouse::with_tables(&["A", "B", "C"]);
        warehouse.fail_describe = Some("B".to_string());
        let engine = Arc::new(MockEngine::default());

        let (outcome, events) = run_batch(warehouse, engine.clone()).await;

        assert_eq!(outcome.tables_attempted, 3);
        assert_eq!(outcome.tables_succeeded, 2);
        assert_eq!(outcome.tables_failed.len(), 1);
        assert_eq!(outcome.tables_failed[0].table, "B");
        assert!(!outcome.tables_failed[0].reason.is_empty());

        let lines = rendered(&events);
        assert_eq!(lines[0], "processing table A");
        assert_eq!(lines[1], "table A migrated");
        assert_eq!(lines[2], "processing table B");
        assert!(lines[3].starts_with("table B failed: "));
        assert_eq!(lines[4], "processing table C");
        assert_eq!(lines[5], "table C migrated");
        assert_eq!(lines[6], "batch complete: 2/3 tables migrated");

        // B never reached the engine; A and C did.
        assert_eq!(*engine.overwrites.lock().unwrap(), vec!["A", "C"]);
    }

    #[tokio::test]
    async fn test_failed_read_is_isolated() {
        let engine = Arc::new(MockEngine {
            fail_read: Some("A".to_string()),
            ..Default::default()
        });

        let (outcome, _) =
            run_batch(MockWarehouse::with_tables(&["A", "B"]), engine.clone()).await;

        assert_eq!(outcome.tables_succeeded, 1);
        assert_eq!(outcome.tables_failed.len(), 1);
        assert_eq!(outcome.tables_failed[0].table, "A");
        assert_eq!(*engine.overwrites.lock().unwrap(), vec!["B"]);
    }

    #[tokio::test]
    async fn test_enumeration_failure_aborts_batch() {
        let mut warehouse = MockWarehouse::with_tables(&["A", "B"]);
        warehouse.fail_list = true;
        let engine = Arc::new(MockEngine::default());

        let (outcome, events) = run_batch(warehouse, engine.clone()).await;

        assert_eq!(outcome.status, "aborted");
        assert_eq!(outcome.tables_attempted, 0);
        assert_eq!(outcome.tables_succeeded, 0);
        assert!(outcome.tables_failed.is_empty());
        assert!(outcome
            .error
            .as_deref()
            .unwrap()
            .contains("warehouse unreachable"));

        assert_eq!(events.len(), 1);
        assert!(events[0].to_string().starts_with("batch aborted: "));

        // Zero tables were attempted but the session is still released.
        assert!(engine.overwrites.lock().unwrap().is_empty());
        assert!(engine.closed.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent() {
        let engine = Arc::new(MockEngine::default());

        let (first, _) =
            run_batch(MockWarehouse::with_tables(&["A", "B"]), engine.clone()).await;
        let (second, _) =
            run_batch(MockWarehouse::with_tables(&["A", "B"]), engine.clone()).await;

        assert_eq!(first.tables_succeeded, second.tables_succeeded);
        // Each run overwrites every table again.
        assert_eq!(*engine.overwrites.lock().unwrap(), vec!["A", "B", "A", "B"]);
    }

    #[tokio::test]
    async fn test_ddl_uses_stable_type_strings() {
        let engine = Arc::new(MockEngine::default());
        run_batch(MockWarehouse::with_tables(&["ORDERS"]), engine.clone()).await;

        let ddl = engine.ddl.lock().unwrap();
        assert_eq!(ddl.len(), 1);
        assert!(ddl[0].contains("CREATE EXTERNAL TABLE IF NOT EXISTS \"ORDERS\""));
        assert!(ddl[0].contains("\"ID\" DECIMAL(38,10)"));
        assert!(ddl[0].contains("LOCATION 'gs://test-bucket/default/ORDERS/'"));
    }
}
