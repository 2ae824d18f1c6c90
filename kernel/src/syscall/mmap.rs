/*
 * This file is part of novakern.
 *
 * novakern is free software: you can redistribute it and/or modify it
 * under the terms of the GNU General Public License as published by the
 * Free Software Foundation, either version 3 of the License, or (at your
 * option) any later version.
 */

//! The `mmap`/`munmap` system calls.

use crate::file::FileBackend;
use crate::memory::VirtAddr;
use crate::process::{mmap as mmap_impl, Process};
use alloc::sync::Arc;

/// The sentinel mmap returns on failure.
pub const MAP_FAILED: i32 = -1;

/// Performs the `mmap` system call: `sys_mmap(fd's file, offset, length, flags)`.
///
/// The file descriptor itself has already been resolved to a
/// [`FileBackend`] by the (unimplemented here) file-descriptor table;
/// this function only validates the memory-management-relevant
/// arguments and delegates to [`mmap_impl::mmap`].
pub fn sys_mmap<'a>(
	proc: &mut Process<'a>,
	file: Arc<dyn FileBackend>,
	offset: i32,
	length: i32,
	flags: i32,
) -> i32 {
	if offset < 0 || length <= 0 {
		return MAP_FAILED;
	}
	match mmap_impl::mmap(proc, file, offset as u64, length as usize, flags as u32) {
		Ok(addr) => addr.0 as i32,
		Err(_) => MAP_FAILED,
	}
}

/// Performs the `munmap` system call.
pub fn sys_munmap<'a>(proc: &mut Process<'a>, addr: i32, length: i32) -> i32 {
	if length <= 0 {
		return -1;
	}
	match mmap_impl::munmap(proc, VirtAddr(addr as usize), length as usize) {
		Ok(v) => v,
		Err(_) => -1,
	}
}
