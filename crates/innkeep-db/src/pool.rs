//! # Database Pool Management
//!
//! Connection pool creation and configuration for SQLite.
//!
//! ## Architecture
//! ```text
//! DbConfig::new(path) ──► Database::new(config).await
//!       │                        │
//!       │                        ├── SqlitePool (WAL, foreign keys on)
//!       │                        ├── embedded migrations
//!       │                        ├── PmsConfig (tax/service/numbering)
//!       │                        └── LockRegistry (property / item locks)
//!       ▼
//! repositories: db.rooms(), db.folios(), ...
//! services:     db.front_desk(), db.stock(), ...
//! ```
//!
//! WAL mode keeps readers and writers from blocking each other; foreign
//! keys are enabled explicitly (SQLite defaults them off).

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use innkeep_core::PmsConfig;

use crate::error::{DbError, DbResult};
use crate::locks::LockRegistry;
use crate::migrations;
use crate::repository::activity::ActivityLogRepository;
use crate::repository::audit::NightAuditRepository;
use crate::repository::catalog::CatalogRepository;
use crate::repository::checkin::CheckInRepository;
use crate::repository::folio::FolioRepository;
use crate::repository::guest::GuestRepository;
use crate::repository::inventory::InventoryRepository;
use crate::repository::pos::PosOrderRepository;
use crate::repository::procurement::{PurchaseOrderRepository, StockTakeRepository};
use crate::repository::reservation::ReservationRepository;
use crate::repository::room::RoomRepository;
use crate::service::booking::BookingService;
use crate::service::folio::FolioService;
use crate::service::front_desk::FrontDeskService;
use crate::service::housekeeping::HousekeepingService;
use crate::service::night_audit::NightAuditService;
use crate::service::pos::PosService;
use crate::service::stock::StockService;

// =============================================================================
// Configuration
// =============================================================================

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/var/lib/innkeep/innkeep.db")
///     .max_connections(5)
///     .min_connections(1);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// Maximum number of connections in the pool. Default: 5.
    pub max_connections: u32,

    /// Minimum number of connections to keep alive. Default: 1.
    pub min_connections: u32,

    /// Connection timeout duration. Default: 30 seconds.
    pub connect_timeout: Duration,

    /// Idle timeout before closing a connection. Default: 10 minutes.
    pub idle_timeout: Duration,

    /// Whether to run migrations on connect. Default: true.
    pub run_migrations: bool,
}

impl DbConfig {
    /// Creates a new database configuration with the given path. The file
    /// is created if it doesn't exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            run_migrations: true,
        }
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the minimum number of connections.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets whether to run migrations on connect.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Creates an in-memory database configuration (for testing).
    /// In-memory databases require a single connection.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            run_migrations: true,
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Main database handle providing repository and service access.
///
/// Cheap to clone: the pool, the PMS configuration, and the lock registry
/// are shared.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    pms: PmsConfig,
    locks: Arc<LockRegistry>,
}

impl Database {
    /// Creates a new database with default PMS configuration.
    ///
    /// 1. Creates the database file if missing
    /// 2. Configures SQLite (WAL, NORMAL synchronous, foreign keys on)
    /// 3. Creates the connection pool
    /// 4. Runs migrations (if enabled)
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        Self::with_pms_config(config, PmsConfig::default()).await
    }

    /// Creates a new database with an explicit PMS configuration
    /// (tax rate, service-charge rate, folio numbering).
    pub async fn with_pms_config(config: DbConfig, pms: PmsConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "initializing database connection"
        );

        let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());

        let connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .create_if_missing(true);

        debug!("connection options configured");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            "database pool created"
        );

        let db = Database {
            pool,
            pms,
            locks: Arc::new(LockRegistry::new()),
        };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Runs database migrations. Idempotent; called automatically by
    /// `new()` unless disabled in the config.
    pub async fn run_migrations(&self) -> DbResult<()> {
        info!("running database migrations");
        migrations::run_migrations(&self.pool).await?;
        info!("migrations complete");
        Ok(())
    }

    /// Returns a reference to the connection pool, for advanced queries
    /// not covered by repositories.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// The active PMS business configuration.
    pub fn pms_config(&self) -> &PmsConfig {
        &self.pms
    }

    /// The advisory lock registry shared by the services.
    pub fn locks(&self) -> Arc<LockRegistry> {
        self.locks.clone()
    }

    // -------------------------------------------------------------------------
    // Repositories
    // -------------------------------------------------------------------------

    pub fn catalog(&self) -> CatalogRepository {
        CatalogRepository::new(self.pool.clone())
    }

    pub fn rooms(&self) -> RoomRepository {
        RoomRepository::new(self.pool.clone())
    }

    pub fn guests(&self) -> GuestRepository {
        GuestRepository::new(self.pool.clone())
    }

    pub fn reservations(&self) -> ReservationRepository {
        ReservationRepository::new(self.pool.clone())
    }

    pub fn checkins(&self) -> CheckInRepository {
        CheckInRepository::new(self.pool.clone())
    }

    pub fn folios(&self) -> FolioRepository {
        FolioRepository::new(self.pool.clone())
    }

    pub fn pos_orders(&self) -> PosOrderRepository {
        PosOrderRepository::new(self.pool.clone())
    }

    pub fn inventory(&self) -> InventoryRepository {
        InventoryRepository::new(self.pool.clone())
    }

    pub fn stock_takes(&self) -> StockTakeRepository {
        StockTakeRepository::new(self.pool.clone())
    }

    pub fn purchase_orders(&self) -> PurchaseOrderRepository {
        PurchaseOrderRepository::new(self.pool.clone())
    }

    pub fn audits(&self) -> NightAuditRepository {
        NightAuditRepository::new(self.pool.clone())
    }

    pub fn activity(&self) -> ActivityLogRepository {
        ActivityLogRepository::new(self.pool.clone())
    }

    // -------------------------------------------------------------------------
    // Services
    // -------------------------------------------------------------------------

    pub fn booking(&self) -> BookingService {
        BookingService::new(self.clone())
    }

    pub fn front_desk(&self) -> FrontDeskService {
        FrontDeskService::new(self.clone())
    }

    pub fn folio_service(&self) -> FolioService {
        FolioService::new(self.clone())
    }

    pub fn pos(&self) -> PosService {
        PosService::new(self.clone())
    }

    pub fn stock(&self) -> StockService {
        StockService::new(self.clone())
    }

    pub fn housekeeping(&self) -> HousekeepingService {
        HousekeepingService::new(self.clone())
    }

    pub fn night_audit(&self) -> NightAuditService {
        NightAuditService::new(self.clone())
    }

    /// Closes the database connection pool. Further operations fail.
    pub async fn close(&self) {
        info!("closing database connection pool");
        self.pool.close().await;
    }

    /// Checks if the database is healthy (can execute queries).
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
