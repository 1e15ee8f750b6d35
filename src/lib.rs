pub mod api;
pub mod commands;
pub mod config;
pub mod models;
pub mod sync;
mod utils;

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Local;

use api::{HttpMonitorApi, MonitorApi};
use config::ClientConfig;
use sync::{MonitorStore, Poller, StoreSnapshot};

pub use utils::logging::init_logging;

/// The parts of the store worth a log line when they change.
#[derive(Debug, PartialEq, Eq)]
struct Summary {
    paused: bool,
    violations_today: u32,
    recordings: usize,
}

impl From<&StoreSnapshot> for Summary {
    fn from(snapshot: &StoreSnapshot) -> Self {
        Self {
            paused: snapshot.is_paused(),
            violations_today: snapshot.today_violations(Local::now().date_naive()),
            recordings: snapshot.recordings.len(),
        }
    }
}

async fn watch_device(config: ClientConfig) -> Result<()> {
    let api: Arc<dyn MonitorApi> = Arc::new(HttpMonitorApi::new(&config)?);
    let store = MonitorStore::new();
    let mut changes = store.subscribe();
    let mut poller = Poller::new(api, store, config.poll_interval);

    log::info!("watching device at {}", config.base_url);
    poller.start();

    let mut last: Option<Summary> = None;
    loop {
        tokio::select! {
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                let summary = Summary::from(&*changes.borrow_and_update());
                if last.as_ref() != Some(&summary) {
                    log::info!(
                        "recording {} | violations today: {} | recordings: {}",
                        if summary.paused { "PAUSED" } else { "ACTIVE" },
                        summary.violations_today,
                        summary.recordings,
                    );
                    last = Some(summary);
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for Ctrl-C")?;
                log::info!("shutting down");
                break;
            }
        }
    }

    poller.stop().await
}

pub fn run() {
    init_logging();
    log::info!("SmartStudy monitor starting up...");

    let result = ClientConfig::from_env().and_then(|config| {
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("failed to start async runtime")?
            .block_on(watch_device(config))
    });

    if let Err(err) = result {
        log::error!("monitor stopped: {err:?}");
        std::process::exit(1);
    }
}
