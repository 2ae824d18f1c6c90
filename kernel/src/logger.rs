/*
 * This file is part of novakern.
 *
 * novakern is free software: you can redistribute it and/or modify it
 * under the terms of the GNU General Public License as published by the
 * Free Software Foundation, either version 3 of the License, or (at your
 * option) any later version.
 */

//! Kernel logging.
//!
//! If the logger is set as silent, logs are kept in the ring buffer but
//! not echoed anywhere; this crate has no console of its own to echo to,
//! so silence is the default and `get_content` is how tests and callers
//! observe what was logged (diagnostics for a fatal page fault, notably).

use core::cmp::{min, Ordering};
use core::fmt;
use core::fmt::Write;
use utils::lock::IntMutex;

/// The size of the kernel logs buffer in bytes.
const LOGS_SIZE: usize = 65536;

/// The kernel's logger.
pub static LOGGER: IntMutex<Logger> = IntMutex::new(Logger::new());

/// Kernel logger, used to record kernel diagnostics.
///
/// Internally, the logger uses a ring buffer for storage.
pub struct Logger {
	/// Tells whether the logger echoes to a console. Always `true` here:
	/// there is no console, only the buffer.
	pub silent: bool,
	buf: [u8; LOGS_SIZE],
	read_head: usize,
	write_head: usize,
}

impl Logger {
	/// Creates a new instance.
	#[allow(clippy::new_without_default)]
	pub const fn new() -> Self {
		Self {
			silent: true,
			buf: [0; LOGS_SIZE],
			read_head: 0,
			write_head: 0,
		}
	}

	fn available_space(&self) -> usize {
		match self.write_head.cmp(&self.read_head) {
			Ordering::Equal => self.buf.len(),
			Ordering::Greater => self.buf.len() - (self.write_head - self.read_head),
			Ordering::Less => self.read_head - self.write_head - 1,
		}
	}

	/// Returns the logs currently stored in the ring buffer, oldest first.
	pub fn get_content(&self) -> &[u8] {
		&self.buf
	}

	/// Pushes `s` onto the ring buffer, evicting the oldest lines if full.
	pub fn push(&mut self, s: &[u8]) {
		if self.available_space() < s.len() {
			self.pop(s.len() - self.available_space());
		}
		let len = min(self.available_space(), s.len());
		let end = (self.write_head + len) % self.buf.len();
		if end < self.write_head {
			self.buf[self.write_head..].copy_from_slice(&s[0..(len - end)]);
			self.buf[0..end].copy_from_slice(&s[(len - end)..]);
		} else {
			self.buf[self.write_head..end].copy_from_slice(&s[0..len]);
		}
		self.write_head = end;
	}

	/// Pops at least `n` bytes from the buffer, rounding up to a full line
	/// so eviction never leaves a truncated line at the front.
	fn pop(&mut self, n: usize) {
		let read_new = (self.read_head + n) % self.buf.len();
		if read_new >= self.write_head && read_new < self.read_head {
			self.read_head = self.write_head;
			return;
		}
		let mut i = 0;
		while i < self.buf.len() {
			let off = (read_new + i) % self.buf.len();
			if off >= self.write_head || self.buf[off] == b'\n' {
				break;
			}
			i += 1;
		}
		self.read_head = (read_new + i) % self.buf.len();
	}
}

impl Write for Logger {
	fn write_str(&mut self, s: &str) -> fmt::Result {
		self.push(s.as_bytes());
		Ok(())
	}
}
