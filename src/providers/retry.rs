use anyhow::Result;
use std::future::Future;

/// Retry an external capability call once on failure.
///
/// Provider calls (embedding, completion) occasionally fail on transient
/// network or rate-limit errors. A single immediate retry recovers most of
/// them; anything that fails twice is reported to the caller unchanged.
pub async fn with_retry<T, F, Fut>(what: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match op().await {
        Ok(value) => Ok(value),
        Err(first) => {
            log::warn!("{} failed, retrying once: {}", what, first);
            op().await
        }
    }
}
