/*
 * This file is part of novakern.
 *
 * novakern is free software: you can redistribute it and/or modify it
 * under the terms of the GNU General Public License as published by the
 * Free Software Foundation, either version 3 of the License, or (at your
 * option) any later version.
 */

//! The `frees`, `swapread` and `swapwrite` system calls.
//!
//! These take the allocator they operate on as an explicit argument
//! rather than reaching for a global: this crate has no singleton
//! [`FrameAllocator`], so whatever owns the real one (a boot path
//! outside this crate's scope) passes it in.

use crate::memory::frame::FrameAllocator;
use crate::memory::swap;
use crate::memory::PAGE_SIZE;

/// Returns the current length of `pfa`'s free list.
pub fn sys_frees(pfa: &FrameAllocator) -> i32 {
	pfa.frees_count() as i32
}

/// Reads swap block `blkno` into `buf`. Always succeeds.
pub fn sys_swapread(buf: &mut [u8; PAGE_SIZE], blkno: u32) -> i32 {
	swap::read(buf, blkno);
	0
}

/// Writes `buf` to swap block `blkno`. Always succeeds.
pub fn sys_swapwrite(buf: &[u8; PAGE_SIZE], blkno: u32) -> i32 {
	swap::write(buf, blkno);
	0
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::memory::frame::new_seeded;

	#[test]
	fn frees_reports_free_list_length() {
		let pfa = new_seeded();
		let before = pfa.frees_count() as i32;
		let f = pfa.alloc().unwrap();
		assert_eq!(sys_frees(&pfa), before - 1);
		pfa.free(f);
		assert_eq!(sys_frees(&pfa), before);
	}

	#[test]
	fn swap_roundtrip_through_syscalls() {
		let mut page = [0u8; PAGE_SIZE];
		page[10] = 7;
		assert_eq!(sys_swapwrite(&page, 5), 0);
		let mut out = [0u8; PAGE_SIZE];
		assert_eq!(sys_swapread(&mut out, 5), 0);
		assert_eq!(out[10], 7);
	}
}
