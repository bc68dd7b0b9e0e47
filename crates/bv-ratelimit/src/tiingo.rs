use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use tracing::warn;

use crate::Pacer;

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>;

/// Token-authenticated provider's pacer: a thin wrapper around
/// `governor::RateLimiter`, reused exactly as `AlphaVantageClient` in the
/// teacher stack wraps it, plus a soft log warning as call volume
/// approaches `rpm_warn_threshold`.
pub struct TiingoPacer {
  limiter: DirectLimiter,
  rpm_warn_threshold: u32,
  window: Mutex<Instant>,
  calls_this_window: AtomicU32,
}

impl TiingoPacer {
  /// `rpm` is the provider-documented requests-per-minute tier;
  /// `rpm_warn_threshold` is the call count within a rolling minute at
  /// which a warning is logged (but the call still proceeds).
  pub fn new(rpm: u32, rpm_warn_threshold: u32) -> Self {
    let quota = Quota::per_minute(NonZeroU32::new(rpm).unwrap_or(NonZeroU32::new(1).unwrap()));
    Self {
      limiter: RateLimiter::direct(quota),
      rpm_warn_threshold,
      window: Mutex::new(Instant::now()),
      calls_this_window: AtomicU32::new(0),
    }
  }

  async fn pace(&self) {
    self.limiter.until_ready().await;
    self.note_call_for_warning();
  }

  fn note_call_for_warning(&self) {
    let mut window_start = self.window.lock().unwrap();
    if window_start.elapsed() >= Duration::from_secs(60) {
      *window_start = Instant::now();
      self.calls_this_window.store(0, Ordering::SeqCst);
    }
    drop(window_start);

    let count = self.calls_this_window.fetch_add(1, Ordering::SeqCst) + 1;
    if count >= self.rpm_warn_threshold {
      warn!(count, threshold = self.rpm_warn_threshold, "approaching tiingo rate-limit tier");
    }
  }
}

#[async_trait]
impl Pacer for TiingoPacer {
  async fn note_same_symbol_call(&self) {
    self.pace().await;
  }

  async fn note_new_symbol_call(&self) {
    self.pace().await;
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn pacing_does_not_panic_under_repeated_calls() {
    let pacer = TiingoPacer::new(600, 50);
    for _ in 0..5 {
      pacer.note_new_symbol_call().await;
    }
  }

  #[tokio::test]
  async fn zero_rpm_falls_back_to_one_rather_than_panicking() {
    let pacer = TiingoPacer::new(0, 50);
    pacer.note_new_symbol_call().await;
  }
}
