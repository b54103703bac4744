//! Wiring & DI. Entry point: bootstrap adapters, inject into services, run UI.
//! No business logic here.

use dotenv::dotenv;
use expense_insights::adapters::clock::SystemClock;
use expense_insights::adapters::import::read_expenses_file;
use expense_insights::adapters::persistence::{MemoryStore, SqliteStore};
use expense_insights::adapters::ui::tui::TuiInputPort;
use expense_insights::ports::{CategoryDirectory, Clock, InputPort, RecordStore, RecordWriter};
use expense_insights::shared::config::AppConfig;
use expense_insights::usecases::{ComparisonService, DirectoryService, ImportService, ReportService};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Store behind all three outbound persistence ports.
struct Stores {
    records: Arc<dyn RecordStore>,
    writer: Arc<dyn RecordWriter>,
    directory: Arc<dyn CategoryDirectory>,
}

async fn open_stores(cfg: &AppConfig) -> anyhow::Result<Stores> {
    if cfg.is_in_memory() {
        info!("using in-memory store");
        let store = Arc::new(MemoryStore::new());
        return Ok(Stores {
            records: Arc::clone(&store) as Arc<dyn RecordStore>,
            writer: Arc::clone(&store) as Arc<dyn RecordWriter>,
            directory: store as Arc<dyn CategoryDirectory>,
        });
    }
    let data_path = PathBuf::from(cfg.data_dir_or_default());
    let store = Arc::new(
        SqliteStore::connect(&data_path)
            .await
            .map_err(|e| anyhow::anyhow!("SQLite connect failed: {}", e))?,
    );
    info!(path = %store.path().display(), "sqlite store ready");
    Ok(Stores {
        records: Arc::clone(&store) as Arc<dyn RecordStore>,
        writer: Arc::clone(&store) as Arc<dyn RecordWriter>,
        directory: store as Arc<dyn CategoryDirectory>,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_loaded = dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!("no .env found (check CWD)"),
    }

    let cfg = AppConfig::load().map_err(|e| anyhow::anyhow!("config: {}", e))?;
    let resolver = cfg.resolver().map_err(|e| anyhow::anyhow!("{}", e))?;
    let plan = cfg.series_plan().map_err(|e| anyhow::anyhow!("{}", e))?;
    let basis = cfg.cost_basis_or_default();
    info!(
        offset = %resolver.offset(),
        cost_basis = ?basis,
        monthly_series = ?plan.policy,
        max_comparison_years = plan.max_years,
        "reporting policy"
    );

    let stores = open_stores(&cfg).await?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    // --- Services ---
    let directory_service = Arc::new(DirectoryService::new(Arc::clone(&stores.directory)));

    if let Some(seed) = cfg.seed_csv.as_deref() {
        let rows = read_expenses_file(seed, &resolver).map_err(|e| anyhow::anyhow!("{}", e))?;
        let importer = ImportService::new(Arc::clone(&directory_service), Arc::clone(&stores.writer));
        let stats = importer
            .import(&rows)
            .await
            .map_err(|e| anyhow::anyhow!("{}", e))?;
        info!(path = seed, records = stats.records, "seed CSV imported");
    }

    let report_service = Arc::new(ReportService::new(
        Arc::clone(&stores.records),
        Arc::clone(&clock),
        resolver,
        basis,
    ));
    let comparison_service = Arc::new(ComparisonService::new(
        Arc::clone(&stores.records),
        Arc::clone(&clock),
        plan,
        basis,
    ));

    let input_port: Arc<dyn InputPort> = Arc::new(TuiInputPort::new(
        report_service,
        comparison_service,
        directory_service,
        cfg.output_or_default(),
    ));

    // --- Run (main menu -> Breakdown / Records / Compare) ---
    input_port
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    Ok(())
}
