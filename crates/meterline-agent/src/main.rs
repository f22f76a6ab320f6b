//! meterline agent
//!
//! - Loads `meterline.yaml` (or the path given as the first argument)
//! - Flushes the aggregator to the configured sink every `flush_interval_ms`
//! - Serves `/healthz`, `/v1/flush`, `/v1/observe`
//! - Ctrl-C stops the HTTP server, then the flush loop (no final flush)

use std::process::ExitCode;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tracing_subscriber::{fmt, EnvFilter};

use meterline_agent::{app_state, config, emit, router};
use meterline_core::error::{MeterlineError, Result};

#[tokio::main]
async fn main() -> ExitCode {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(code = e.code().as_str(), error = %e, "meterline-agent failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "meterline.yaml".to_string());
    let cfg = config::load_from_file(&path)?;
    let listen = cfg.agent.listen_addr()?;
    let period = Duration::from_millis(cfg.agent.flush_interval_ms);

    let mut sink: Box<dyn emit::Sink> = match &cfg.sink {
        config::SinkConfig::Stdout => Box::new(emit::WriterSink::new(std::io::stdout())),
        config::SinkConfig::Udp {
            address,
            max_packet_bytes,
        } => Box::new(emit::UdpSink::connect(address, *max_packet_bytes).await?),
    };

    let state = app_state::AppState::new(cfg)?;

    let agg = state.aggregator();
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let flusher = tokio::spawn(async move {
        let shutdown = async move {
            let _ = stop_rx.await;
        };
        emit::run_loop(&agg, ticker, shutdown, sink.as_mut()).await;
    });

    let app = router::build_router(state);

    tracing::info!(%listen, flush_interval_ms = period.as_millis() as u64, "meterline-agent starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| MeterlineError::Internal(format!("bind {listen} failed: {e}")))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .map_err(|e| MeterlineError::Internal(format!("server failed: {e}")))?;

    let _ = stop_tx.send(());
    let _ = flusher.await;
    tracing::info!("meterline-agent stopped");
    Ok(())
}
