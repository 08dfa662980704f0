//! Human pacing
//!
//! Timed pauses with jitter, used between navigations and form
//! interactions so the session is not driven at machine speed.

use rand::Rng;
use std::time::Duration;

/// Sleep for a random duration within `[min_ms, max_ms]`.
///
/// `min_ms` greater than `max_ms` is treated as a fixed `min_ms` pause.
pub async fn human_pause(min_ms: u64, max_ms: u64) {
    let millis = if min_ms >= max_ms {
        min_ms
    } else {
        rand::rng().random_range(min_ms..=max_ms)
    };
    tokio::time::sleep(Duration::from_millis(millis)).await;
}
