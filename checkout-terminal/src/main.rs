use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use checkout_terminal::{BackgroundTasks, Config, TaskKind, Terminal, console, init_logger_with_file};
use clap::Parser;

const HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Parser, Debug)]
#[command(name = "checkout-terminal")]
#[command(about = "Supermarket self-checkout terminal")]
#[command(
    after_help = "Environment:\n  BACKEND_URL, BRIDGE_URL, PAYMENT_URL, WORK_DIR, POLL_INTERVAL_MS, LOG_LEVEL, LOG_DIR"
)]
struct Args {
    /// Directory for the cart snapshot and invoices
    #[arg(long)]
    work_dir: Option<PathBuf>,
    #[arg(long)]
    backend_url: Option<String>,
    #[arg(long)]
    bridge_url: Option<String>,
    #[arg(long)]
    payment_url: Option<String>,
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    fn apply(self, mut config: Config) -> Config {
        if let Some(dir) = self.work_dir {
            config.work_dir = dir;
        }
        if let Some(url) = self.backend_url {
            config.backend_url = url;
        }
        if let Some(url) = self.bridge_url {
            config.bridge_url = url;
        }
        if let Some(url) = self.payment_url {
            config.payment_url = url;
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let args = Args::parse();
    let config = args.apply(Config::from_env());

    init_logger_with_file(Some(config.log_level.as_str()), config.log_dir.as_deref());
    tracing::info!(
        backend = %config.backend_url,
        bridge = %config.bridge_url,
        work_dir = %config.work_dir.display(),
        "Checkout terminal starting"
    );

    std::fs::create_dir_all(&config.work_dir)
        .with_context(|| format!("creating work dir {}", config.work_dir.display()))?;

    let terminal = Terminal::builder(config)
        .build()
        .context("building terminal")?;

    let mut tasks = BackgroundTasks::new();
    terminal.start(&mut tasks);
    let shutdown = tasks.shutdown_token();

    let mut notices = terminal.subscribe();
    let printer_shutdown = shutdown.clone();
    tasks.spawn("notice_printer", TaskKind::Listener, async move {
        loop {
            tokio::select! {
                _ = printer_shutdown.cancelled() => break,
                notice = notices.recv() => match notice {
                    Ok(notice) => println!("{notice}"),
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!(skipped = n, "Notice printer lagged");
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                },
            }
        }
    });

    let console = console::run(&terminal, shutdown.clone());
    tokio::pin!(console);
    let mut watchdog = tokio::time::interval(HEALTH_CHECK_INTERVAL);
    watchdog.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            result = &mut console => {
                result.context("console")?;
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted");
                break;
            }
            _ = watchdog.tick() => {
                let stopped = tasks.stopped();
                if !stopped.is_empty() {
                    tracing::error!(tasks = ?stopped, "Background tasks stopped unexpectedly");
                }
            }
        }
    }

    tasks.shutdown().await;
    tracing::info!("Checkout terminal stopped");
    Ok(())
}
