/*
 * This file is part of novakern.
 *
 * novakern is free software: you can redistribute it and/or modify it
 * under the terms of the GNU General Public License as published by the
 * Free Software Foundation, either version 3 of the License, or (at your
 * option) any later version.
 */

//! The swap primitive.
//!
//! This module exposes only the block read/write primitive a page-out
//! path would use; it implements no eviction policy and nothing ever
//! calls it to actually evict a frame. A swap device able to hold
//! `SWAP_BLOCKS` pages is modeled as an in-memory array so the primitive
//! has somewhere to read and write, without pulling in a real block
//! device driver.

use super::PAGE_SIZE;
use utils::lock::IntMutex;

const SWAP_BLOCKS: usize = 64;

static DEVICE: IntMutex<[[u8; PAGE_SIZE]; SWAP_BLOCKS]> =
	IntMutex::new([[0; PAGE_SIZE]; SWAP_BLOCKS]);

/// Reads block `blkno` of the swap device into `buf`.
pub fn read(buf: &mut [u8; PAGE_SIZE], blkno: u32) {
	let device = DEVICE.lock();
	buf.copy_from_slice(&device[blkno as usize % SWAP_BLOCKS]);
}

/// Writes `buf` to block `blkno` of the swap device.
pub fn write(buf: &[u8; PAGE_SIZE], blkno: u32) {
	let mut device = DEVICE.lock();
	device[blkno as usize % SWAP_BLOCKS].copy_from_slice(buf);
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn write_then_read_roundtrip() {
		let mut page = [0u8; PAGE_SIZE];
		page[0] = 42;
		write(&page, 3);
		let mut out = [0u8; PAGE_SIZE];
		read(&mut out, 3);
		assert_eq!(out[0], 42);
	}
}
