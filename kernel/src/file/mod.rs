/*
 * This file is part of novakern.
 *
 * novakern is free software: you can redistribute it and/or modify it
 * under the terms of the GNU General Public License as published by the
 * Free Software Foundation, either version 3 of the License, or (at your
 * option) any later version.
 */

//! The file interface the mmap manager reads from and writes back to.
//!
//! The filesystem itself (inodes, directories, the journal, the
//! transactional `begin_op`/`end_op` brackets around writeback) is an
//! external collaborator this crate does not implement. What it needs
//! from that collaborator is captured here as a trait: positional reads
//! and writes by offset, independent of any cursor the file object might
//! also carry for unrelated I/O paths. [`RamFile`] is a minimal
//! in-memory implementation of that trait, used by this crate's own
//! tests and suitable as a stand-in wherever a real inode-backed file
//! isn't available.

use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use spin::Mutex;
use utils::errno::{EResult, Errno};

/// A file, as seen by the mmap manager: something that can be read from
/// and written to at an absolute offset.
pub trait FileBackend: Send + Sync {
	/// Whether the file may be read.
	fn readable(&self) -> bool;

	/// Whether the file may be written.
	fn writable(&self) -> bool;

	/// Reads into `buf` starting at `offset`, returning the number of
	/// bytes actually read (short reads happen at end of file).
	fn read_at(&self, offset: u64, buf: &mut [u8]) -> EResult<usize>;

	/// Writes `buf` at `offset`, growing the file if necessary.
	fn write_at(&self, offset: u64, buf: &[u8]) -> EResult<usize>;
}

/// An in-memory file, usable wherever a [`FileBackend`] is required but
/// no real filesystem is wired in.
pub struct RamFile {
	readable: bool,
	writable: bool,
	data: Mutex<Vec<u8>>,
}

impl RamFile {
	/// Creates a file from its initial content.
	pub fn new(content: Vec<u8>, readable: bool, writable: bool) -> Arc<Self> {
		Arc::new(Self {
			readable,
			writable,
			data: Mutex::new(content),
		})
	}

	/// Returns a copy of the file's current content, for tests to assert
	/// writeback actually happened.
	pub fn snapshot(&self) -> Vec<u8> {
		self.data.lock().clone()
	}
}

impl FileBackend for RamFile {
	fn readable(&self) -> bool {
		self.readable
	}

	fn writable(&self) -> bool {
		self.writable
	}

	fn read_at(&self, offset: u64, buf: &mut [u8]) -> EResult<usize> {
		let data = self.data.lock();
		let offset = offset as usize;
		if offset >= data.len() {
			return Ok(0);
		}
		let n = core::cmp::min(buf.len(), data.len() - offset);
		buf[..n].copy_from_slice(&data[offset..offset + n]);
		Ok(n)
	}

	fn write_at(&self, offset: u64, buf: &[u8]) -> EResult<usize> {
		if !self.writable {
			return Err(Errno::EACCES);
		}
		let mut data = self.data.lock();
		let offset = offset as usize;
		if data.len() < offset + buf.len() {
			data.resize(offset + buf.len(), 0);
		}
		data[offset..offset + buf.len()].copy_from_slice(buf);
		Ok(buf.len())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn read_past_end_is_short() {
		let f = RamFile::new(vec![1, 2, 3], true, false);
		let mut buf = [0u8; 8];
		let n = f.read_at(1, &mut buf).unwrap();
		assert_eq!(n, 2);
		assert_eq!(&buf[..2], &[2, 3]);
	}

	#[test]
	fn write_to_read_only_file_fails() {
		let f = RamFile::new(vec![0; 4], true, false);
		assert!(f.write_at(0, &[1]).is_err());
	}
}
