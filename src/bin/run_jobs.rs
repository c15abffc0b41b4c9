//! Background worker running the scheduled jobs on a fixed interval: due
//! workflow steps and booking reminders. An alternative to calling the cron
//! endpoints from an external scheduler.

use std::time::Duration;

use chrono::Utc;
use dotenvy::dotenv;

use bookflow::build_notifier;
use bookflow::db::open_pool;
use bookflow::models::config::ServerConfig;
use bookflow::repository::DieselRepository;
use bookflow::services::{Notifier, reminders, workflows};

fn run_once(repo: &DieselRepository, notifier: &Notifier) {
    let now = Utc::now();
    if let Err(e) = workflows::process_pending_runs(repo, notifier, now) {
        log::error!("Workflow processing failed: {e}");
    }
    if let Err(e) = reminders::send_due_reminders(repo, notifier, now) {
        log::error!("Reminder processing failed: {e}");
    }
}

fn main() {
    dotenv().ok(); // Load .env file
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let server_config = match ServerConfig::load() {
        Ok(server_config) => server_config,
        Err(err) => {
            log::error!("Error loading server config: {err}");
            std::process::exit(1);
        }
    };

    let pool = match open_pool(&server_config.database_url, server_config.pool_settings()) {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };
    let repo = DieselRepository::new(pool);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            log::error!("Failed to start runtime: {e}");
            std::process::exit(1);
        }
    };

    runtime.block_on(async move {
        let notifier = match build_notifier(&server_config, &repo) {
            Ok(notifier) => notifier,
            Err(e) => {
                log::error!("{e}");
                std::process::exit(1);
            }
        };

        let interval = Duration::from_secs(server_config.jobs_interval_secs.max(1));
        log::info!("Running jobs every {}s", interval.as_secs());
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            // Database work is blocking; keep it off the task delivering webhooks.
            let (jobs_repo, jobs_notifier) = (repo.clone(), notifier.clone());
            if let Err(e) =
                tokio::task::spawn_blocking(move || run_once(&jobs_repo, &jobs_notifier)).await
            {
                log::error!("Job run panicked: {e}");
            }
        }
    });
}
