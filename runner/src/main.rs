/**
 * @file main.rs
 * @date 17/10/2026
 * @brief Main entry point for the runner.
 */
mod config;
mod session;
mod trace;

use avr8::TaskScheduler;
use crate::config::RunnerConfig;
use crate::session::Session;

const CONFIG_PATH: &str = "runner.toml";

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| CONFIG_PATH.to_string());

    let config = RunnerConfig::parse(&path)?;
    log::debug!("Config: {:?}", config);

    // the simulator lives in Rc/RefCell, so everything stays on this thread
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run(config))
}

async fn run(config: RunnerConfig) -> anyhow::Result<()> {
    let session = Session::load(&config).await?;
    let scheduler = TaskScheduler::new();
    let tasks = session.start(&scheduler);

    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);

    while !tasks.is_finished() {
        tokio::select! {
            result = &mut interrupt => {
                result?;
                log::info!("Interrupted, stopping");
                break;
            }
            _ = tokio::task::yield_now() => {
                scheduler.run_round();
            }
        }
    }

    tasks.stop();

    let summary = session.summary();
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
