use std::future::Future;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::Interval;

use meterline_core::Aggregator;

use super::Sink;

/// Timer signal driving the flush loop.
#[async_trait]
pub trait Tick: Send {
    /// Wait for the next tick. `false` means the source is exhausted.
    async fn tick(&mut self) -> bool;
}

#[async_trait]
impl Tick for Interval {
    async fn tick(&mut self) -> bool {
        Interval::tick(self).await;
        true
    }
}

#[async_trait]
impl Tick for mpsc::Receiver<()> {
    async fn tick(&mut self) -> bool {
        self.recv().await.is_some()
    }
}

/// Flush `agg` into `sink` on every tick until `shutdown` resolves.
///
/// Flush errors are logged and the loop carries on; the next tick works on a
/// fresh generation. Shutdown returns without a final flush.
pub async fn run_loop<T, S, F>(agg: &Aggregator, mut ticker: T, shutdown: F, sink: &mut S)
where
    T: Tick,
    S: Sink + ?Sized,
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => {
                tracing::debug!("flush loop shutting down");
                return;
            }

            more = ticker.tick() => {
                if !more {
                    tracing::debug!("tick source closed; flush loop exiting");
                    return;
                }
                match sink.flush(agg).await {
                    Ok(delivered) => tracing::trace!(delivered, "flush ok"),
                    Err(e) => tracing::warn!(
                        during = "flush",
                        code = e.code().as_str(),
                        error = %e,
                        "flush failed"
                    ),
                }
            }
        }
    }
}
