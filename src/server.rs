//! Reusable admission service runtime.
//!
//! [`ServerHandle`] owns the full lifecycle: metrics recorder, database
//! init and migrations, the session engine, the REST API and graceful
//! shutdown. The CLI binary is a thin wrapper around it.

use std::sync::{Arc, OnceLock};

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use sea_orm::DatabaseConnection;
use sea_orm_migration::MigratorTrait;
use tracing::{debug, error, info, warn};

use crate::application::{SessionEngine, SharedEngine, SharedEventBus};
use crate::config::AppConfig;
use crate::domain::RepositoryProvider;
use crate::infrastructure::database::migrator::Migrator;
use crate::infrastructure::{init_database, SeaOrmRepositoryProvider};
use crate::interfaces::http::middleware::ApiKeyState;
use crate::interfaces::http::{create_api_router, ApiContext};
use crate::shared::shutdown::{ShutdownCoordinator, ShutdownSignal};
use crate::shared::SystemClock;

// ── Options ────────────────────────────────────────────────────────

/// Options for starting the admission service.
pub struct ServerOptions {
    /// Application configuration.
    pub config: AppConfig,
    /// Run database migrations on startup (default: true).
    pub auto_migrate: bool,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            auto_migrate: true,
        }
    }
}

// ── ServerHandle ───────────────────────────────────────────────────

/// Handle to a running admission service.
///
/// ```rust,no_run
/// use admission::server::{ServerHandle, ServerOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let handle = ServerHandle::start(ServerOptions::default()).await?;
///     handle.shutdown().await;
///     Ok(())
/// }
/// ```
pub struct ServerHandle {
    /// The engine serving the API; usable directly by embedding code.
    pub engine: SharedEngine,
    /// The configuration the server was started with.
    pub config: AppConfig,
    /// API port the server is listening on.
    pub api_port: u16,

    db: DatabaseConnection,
    shutdown: ShutdownCoordinator,
    api_task: tokio::task::JoinHandle<()>,
}

impl ServerHandle {
    /// Start the service:
    /// 1. Install the Prometheus recorder
    /// 2. Connect to the database and run migrations
    /// 3. Build the session engine over the SeaORM repositories
    /// 4. Serve the REST API (with Swagger UI) until shutdown
    pub async fn start(opts: ServerOptions) -> Result<Self, Box<dyn std::error::Error>> {
        let app_cfg = opts.config;
        app_cfg.validate()?;

        info!("Starting admission service...");

        let prometheus_handle = prometheus_handle()?;
        info!("Prometheus metrics recorder ready");

        // ── Database ───────────────────────────────────────────
        let db_config = app_cfg.database.to_database_config();
        info!("Database: {}", db_config.url);
        let db = init_database(&db_config).await?;

        if opts.auto_migrate {
            info!("Running database migrations...");
            Migrator::up(&db, None).await?;
            info!("Migrations completed");
        }

        // ── Engine ─────────────────────────────────────────────
        let settings = app_cfg.engine_settings()?;
        info!(
            extra_minutes_policy = ?settings.extra_minutes_policy,
            issuance = ?settings.issuance,
            barcode_prefix = %settings.barcode_prefix,
            utc_offset = %settings.utc_offset,
            "Engine settings"
        );
        let repos: Arc<dyn RepositoryProvider> =
            Arc::new(SeaOrmRepositoryProvider::new(db.clone()));
        let engine: SharedEngine =
            Arc::new(SessionEngine::new(repos, Arc::new(SystemClock), settings));

        // ── Shutdown coordinator ───────────────────────────────
        let shutdown = ShutdownCoordinator::new(app_cfg.server.shutdown_timeout);
        let shutdown_signal = shutdown.signal();

        spawn_event_logger(engine.events().clone(), shutdown_signal.clone());

        // ── REST API server ────────────────────────────────────
        let api_keys = ApiKeyState::new(&app_cfg.security.api_key_hashes);
        if api_keys.is_enabled() {
            info!(
                keys = app_cfg.security.api_key_hashes.len(),
                "Staff API key check enabled"
            );
        } else {
            warn!("No API key hashes configured; the API is open");
        }

        let api_router = create_api_router(ApiContext {
            engine: engine.clone(),
            db: Some(db.clone()),
            api_keys,
            metrics: Some(prometheus_handle),
        });

        let api_port = app_cfg.server.api_port;
        let api_addr = format!("{}:{}", app_cfg.server.api_host, api_port);
        let listener = tokio::net::TcpListener::bind(&api_addr).await?;
        info!("REST API server listening on http://{}", api_addr);
        info!("Swagger UI available at http://{}/docs/", api_addr);

        let api_shutdown = shutdown_signal.clone();
        let api_server = axum::serve(listener, api_router).with_graceful_shutdown(async move {
            api_shutdown.wait().await;
            info!("REST API server received shutdown signal");
        });

        let api_task = tokio::spawn(async move {
            if let Err(e) = api_server.await {
                error!("REST API server error: {}", e);
            }
        });

        Ok(Self {
            engine,
            config: app_cfg,
            api_port,
            db,
            shutdown,
            api_task,
        })
    }

    /// Get a cloneable shutdown signal.
    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Install OS signal listeners (SIGTERM, SIGINT) that trigger shutdown.
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    /// Trigger graceful shutdown without waiting for it.
    pub fn trigger_shutdown(&self) {
        self.shutdown.signal().trigger();
    }

    /// Wait for the server to fully stop after shutdown has been triggered.
    pub async fn wait(self) {
        info!("Waiting for server tasks to complete...");

        let timeout = std::time::Duration::from_secs(self.shutdown.timeout_secs());
        match tokio::time::timeout(timeout, self.api_task).await {
            Ok(Ok(())) => info!("REST API server stopped"),
            Ok(Err(e)) => error!("REST API server task panicked: {}", e),
            Err(_) => warn!("REST API server did not stop within {:?}", timeout),
        }

        if let Err(e) = self.db.close().await {
            warn!("Error closing database connection: {}", e);
        } else {
            info!("Database connection closed");
        }

        info!("Admission service shutdown complete");
    }

    /// Trigger shutdown and wait for completion.
    pub async fn shutdown(self) {
        info!("Shutting down admission service...");
        self.trigger_shutdown();
        self.wait().await;
    }

    pub fn is_running(&self) -> bool {
        !self.api_task.is_finished()
    }
}

// ── Helpers ────────────────────────────────────────────────────────

/// The global recorder can only be installed once per process; a restart
/// within the same process reuses it.
fn prometheus_handle() -> Result<PrometheusHandle, Box<dyn std::error::Error>> {
    static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

    if let Some(handle) = PROM_HANDLE.get() {
        return Ok(handle.clone());
    }
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| format!("failed to install Prometheus metrics recorder: {}", e))?;
    Ok(PROM_HANDLE.get_or_init(|| handle).clone())
}

/// Mirror engine events into the log until shutdown.
fn spawn_event_logger(events: SharedEventBus, shutdown: ShutdownSignal) {
    let mut subscriber = events.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown.wait() => break,
                msg = subscriber.recv() => match msg {
                    Some(msg) => debug!(
                        id = %msg.id,
                        event = msg.event.event_type(),
                        reservation_id = msg.event.reservation_id(),
                        "Engine event"
                    ),
                    None => break,
                },
            }
        }
    });
}

/// Initialize tracing from the application config.
///
/// Call once at process startup, before [`ServerHandle::start`].
/// `RUST_LOG` wins over `logging.level`.
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    match config.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}
