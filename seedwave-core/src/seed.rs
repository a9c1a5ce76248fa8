//! Random catalogue seeds.
//!
//! A seed is the decimal string of a 63-bit non-negative integer. The service
//! reproduces the same catalogue for the same seed.

use rand::rngs::{OsRng, SmallRng};
use rand::{RngCore, SeedableRng, TryRngCore};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::warn;

const LOG_TARGET: &str = "seedwave::seed";

/// Largest seed value, `2^63 - 1`.
pub const MAX_SEED: u64 = i64::MAX.unsigned_abs();

static FALLBACK_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a new random seed string.
///
/// Draws from the operating system's cryptographic source, falling back to a
/// time-seeded non-cryptographic generator if the OS source is unavailable.
#[must_use]
pub fn generate() -> String {
    generate_with(|| OsRng.try_next_u64().ok())
}

fn generate_with(secure: impl FnOnce() -> Option<u64>) -> String {
    let raw = secure().unwrap_or_else(|| {
        warn!(target: LOG_TARGET, "OS random source unavailable, using fallback generator");
        fallback_u64()
    });
    (raw & MAX_SEED).to_string()
}

fn fallback_u64() -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::from(d.subsec_nanos()) ^ d.as_secs().rotate_left(32));
    let count = FALLBACK_COUNTER.fetch_add(1, Ordering::Relaxed);
    let mut rng = SmallRng::seed_from_u64(nanos ^ count.wrapping_mul(0x9E37_79B9_7F4A_7C15));
    rng.next_u64()
}
