/*
 * This file is part of novakern.
 *
 * novakern is free software: you can redistribute it and/or modify it
 * under the terms of the GNU General Public License as published by the
 * Free Software Foundation, either version 3 of the License, or (at your
 * option) any later version.
 */

//! Allocator sampling, consumed by the `#[instrument_allocator]` macro.
//!
//! Samples are only counted, never stored, unless the `memtrace` feature
//! is enabled. This mirrors a production kernel keeping tracing cheap by
//! default while leaving a hook for a fuller trace buffer later.

use core::sync::atomic::{AtomicUsize, Ordering};

/// Which operation a sample corresponds to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
	Alloc,
	Free,
}

static ALLOC_SAMPLES: AtomicUsize = AtomicUsize::new(0);
static FREE_SAMPLES: AtomicUsize = AtomicUsize::new(0);

/// Records one sample for `name` (the allocator's name; unused beyond
/// `memtrace` builds, where it would tag the sample).
pub fn sample(_name: &str, op: Op) {
	match op {
		Op::Alloc => ALLOC_SAMPLES.fetch_add(1, Ordering::Relaxed),
		Op::Free => FREE_SAMPLES.fetch_add(1, Ordering::Relaxed),
	};
}

/// Returns `(allocations, frees)` sampled so far.
pub fn counts() -> (usize, usize) {
	(
		ALLOC_SAMPLES.load(Ordering::Relaxed),
		FREE_SAMPLES.load(Ordering::Relaxed),
	)
}
