use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;
use tracing::debug;

use crate::Pacer;

/// Cookie-authenticated provider's pacer: a hand-rolled state machine,
/// since governor has no concept of "zero-cost paired calls, periodic
/// long pause". Tracks the number of *new-symbol* calls issued so far;
/// the adjusted/unadjusted pair within one symbol never touches this
/// counter.
pub struct BarchartPacer {
  inter_request_delay: Duration,
  long_pause_every_n: u32,
  long_pause: Duration,
  distinct_symbol_calls: AtomicU32,
}

impl BarchartPacer {
  pub fn new(inter_request_delay: Duration, long_pause_every_n: u32, long_pause: Duration) -> Self {
    Self {
      inter_request_delay,
      long_pause_every_n: long_pause_every_n.max(1),
      long_pause,
      distinct_symbol_calls: AtomicU32::new(0),
    }
  }
}

#[async_trait]
impl Pacer for BarchartPacer {
  /// No-op: the adjusted/unadjusted pair for one symbol is free.
  async fn note_same_symbol_call(&self) {
    debug!("barchart paired call, no pacing delay");
  }

  async fn note_new_symbol_call(&self) {
    let prior_calls = self.distinct_symbol_calls.fetch_add(1, Ordering::SeqCst);

    if prior_calls > 0 {
      sleep(self.inter_request_delay).await;
      if prior_calls % self.long_pause_every_n == 0 {
        debug!(prior_calls, "barchart long pause");
        sleep(self.long_pause).await;
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tokio::time::Instant;

  #[tokio::test(start_paused = true)]
  async fn first_symbol_incurs_no_delay() {
    let pacer = BarchartPacer::new(Duration::from_secs(2), 10, Duration::from_secs(30));
    let start = Instant::now();
    pacer.note_new_symbol_call().await;
    assert_eq!(start.elapsed(), Duration::ZERO);
  }

  #[tokio::test(start_paused = true)]
  async fn pacing_lower_bound_matches_formula_for_eleven_symbols() {
    let pacer = BarchartPacer::new(Duration::from_secs(2), 10, Duration::from_secs(30));
    let start = Instant::now();
    for _ in 0..11 {
      pacer.note_new_symbol_call().await;
    }
    // N = 11: 2*(N-1) + 30*floor((N-1)/10) = 20 + 30 = 50s
    assert_eq!(start.elapsed(), Duration::from_secs(50));
  }

  #[tokio::test(start_paused = true)]
  async fn paired_call_never_delays() {
    let pacer = BarchartPacer::new(Duration::from_secs(2), 10, Duration::from_secs(30));
    pacer.note_new_symbol_call().await;
    let start = Instant::now();
    pacer.note_same_symbol_call().await;
    assert_eq!(start.elapsed(), Duration::ZERO);
  }

  #[tokio::test(start_paused = true)]
  async fn twenty_one_symbols_trigger_two_long_pauses() {
    let pacer = BarchartPacer::new(Duration::from_secs(2), 10, Duration::from_secs(30));
    let start = Instant::now();
    for _ in 0..21 {
      pacer.note_new_symbol_call().await;
    }
    // N = 21: 2*20 + 30*floor(20/10) = 40 + 60 = 100s
    assert_eq!(start.elapsed(), Duration::from_secs(100));
  }
}
