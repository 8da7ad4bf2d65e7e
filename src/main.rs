//! Wiring & DI. Entry point: bootstrap adapters, inject into the batch
//! service, run the TUI. No business logic here.

use account_keeper::adapters::api::HttpApiFactory;
use account_keeper::adapters::submit::FormSubmitter;
use account_keeper::adapters::ui::console::ConsoleRunLog;
use account_keeper::adapters::ui::tui::TuiInputPort;
use account_keeper::ports::{ApiFactoryPort, InputPort, RunLogPort, SubmitPort};
use account_keeper::usecases::BatchService;
use dotenv::dotenv;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_loaded = dotenv();
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match &env_loaded {
        Ok(path) => info!(path = %path.display(), "loaded .env"),
        Err(_) => info!("no .env found"),
    }

    account_keeper::adapters::ui::init_ui();

    let cfg = account_keeper::shared::config::AppConfig::load().unwrap_or_default();
    let api_base_url = cfg.api_base_url.clone().unwrap_or_default();
    if api_base_url.is_empty() {
        anyhow::bail!("Set KEEPER_API_BASE_URL (env or .env) to the registry API base URL");
    }
    let submit_base_url = cfg
        .submit_base_url_or_api()
        .unwrap_or_else(|| api_base_url.clone());

    // --- Outbound adapters ---
    let api_factory: Arc<dyn ApiFactoryPort> = Arc::new(HttpApiFactory::new(&api_base_url));
    let submitter: Arc<dyn SubmitPort> = Arc::new(FormSubmitter::new(&submit_base_url));
    let run_log: Arc<dyn RunLogPort> = Arc::new(ConsoleRunLog::new());

    // --- Core service ---
    let service = Arc::new(BatchService::new(api_factory, submitter, run_log));

    // Ctrl-C requests cooperative cancellation; the in-flight account finishes
    // before the run winds down.
    {
        let service = Arc::clone(&service);
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Ctrl-C received, cancelling run");
                service.cancel();
            }
        });
    }

    // --- Run (prompts -> batch) ---
    let input_port: Arc<dyn InputPort> = Arc::new(TuiInputPort::new(service, cfg));
    input_port
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("{}", e))?;

    Ok(())
}
