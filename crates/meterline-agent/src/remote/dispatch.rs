use std::future::Future;

use futures_util::stream::FuturesUnordered;
use futures_util::StreamExt;
use tokio::sync::Semaphore;

use meterline_core::error::{MeterlineError, Result};

/// Split `items` into chunks of `batch_size` and send them with at most
/// `concurrency` sends in flight.
///
/// Every chunk is sent exactly once. A failing chunk does not stop the
/// others; once all sends have finished the first error observed is
/// returned. On success returns the number of chunks sent.
pub async fn dispatch_chunks<T, F, Fut>(
    items: Vec<T>,
    batch_size: usize,
    concurrency: usize,
    send: F,
) -> Result<usize>
where
    F: Fn(Vec<T>) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    if batch_size == 0 || concurrency == 0 {
        return Err(MeterlineError::Config(
            "batch size and concurrency must be at least 1".into(),
        ));
    }

    let chunks = into_chunks(items, batch_size);
    let total = chunks.len();
    let slots = Semaphore::new(concurrency);

    let mut inflight = FuturesUnordered::new();
    for (idx, chunk) in chunks.into_iter().enumerate() {
        let slots = &slots;
        let fut = send(chunk);
        inflight.push(async move {
            let _permit = match slots.acquire().await {
                Ok(permit) => permit,
                Err(e) => {
                    return Err((idx, MeterlineError::Internal(format!("dispatch slots closed: {e}"))))
                }
            };
            fut.await.map_err(|e| (idx, e))
        });
    }

    let mut first_err = None;
    while let Some(res) = inflight.next().await {
        if let Err((chunk, e)) = res {
            tracing::debug!(chunk, code = e.code().as_str(), error = %e, "chunk send failed");
            first_err.get_or_insert(e);
        }
    }

    match first_err {
        Some(e) => Err(e),
        None => Ok(total),
    }
}

/// Deterministic partition preserving item order. Each chunk owns an
/// allocation sized to its own items.
fn into_chunks<T>(items: Vec<T>, batch_size: usize) -> Vec<Vec<T>> {
    let mut chunks = Vec::with_capacity(items.len().div_ceil(batch_size));
    let mut rest = items.into_iter();
    loop {
        let chunk: Vec<T> = rest.by_ref().take(batch_size).collect();
        if chunk.is_empty() {
            break;
        }
        chunks.push(chunk);
    }
    chunks
}
