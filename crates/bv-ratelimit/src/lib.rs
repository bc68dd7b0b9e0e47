/*
 *
 *
 *
 *
 * MIT License
 * Copyright (c) 2025. Dwight J. Browne
 * dwight[-at-]dwightjbrowne[-dot-]com
 *
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy
 * of this software and associated documentation files (the "Software"), to deal
 * in the Software without restriction, including without limitation the rights
 * to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
 * copies of the Software, and to permit persons to whom the Software is
 * furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in all
 * copies or substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
 * FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
 * AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
 * LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
 * SOFTWARE.
 */

//! Per-provider pacing. Two concrete pacers behind one trait, since
//! Barchart's asymmetric "zero delay within a symbol, 2s between symbols,
//! long pause every 10 symbols" shape cannot be expressed as a single
//! `governor::Quota`.

pub mod barchart;
pub mod tiingo;

pub use barchart::BarchartPacer;
pub use tiingo::TiingoPacer;

use async_trait::async_trait;

/// Pacing state machine for one upstream provider, shared across calls in
/// one process lifetime (spec: "Rate Limiter state is process-lifetime;
/// it is not persisted").
#[async_trait]
pub trait Pacer: Send + Sync {
  /// Call this before a second/paired call to the *same* symbol. For
  /// providers without a same-symbol discount this behaves identically to
  /// `note_new_symbol_call`.
  async fn note_same_symbol_call(&self);

  /// Call this before the first call for a new distinct symbol in a
  /// request. Applies the provider's inter-symbol delay and any periodic
  /// long pause.
  async fn note_new_symbol_call(&self);
}
