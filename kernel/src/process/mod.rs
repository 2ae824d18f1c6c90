/*
 * This file is part of novakern.
 *
 * novakern is free software: you can redistribute it and/or modify it
 * under the terms of the GNU General Public License as published by the
 * Free Software Foundation, either version 3 of the License, or (at your
 * option) any later version.
 */

//! Process-level state the virtual memory subsystem operates on.
//!
//! Scheduling, the process table, and everything about how a [`Process`]
//! comes to be running on a CPU are an external collaborator; what this
//! crate needs from "the process" is its address space: a page table, a
//! heap size, a table of mmap'd regions, and a flag it can set to mark
//! the process for death when a fault cannot be resolved.

pub mod fault;
pub mod mmap;

use crate::memory::vmem::PageTable;
use crate::memory::KERNBASE;
use alloc::string::String;
use mmap::MmapTable;

pub use fault::{resolve_page_fault, FaultOutcome};

/// A process, restricted to the state the memory subsystem touches.
pub struct Process<'a> {
	pub pid: u32,
	pub name: String,
	/// Set when a fault this process raised could not be resolved.
	pub killed: bool,
	pub pgdir: PageTable<'a>,
	/// The size of the process's flat heap, in bytes, not counting mmap'd
	/// regions (which live above it, growing down from [`KERNBASE`]).
	pub sz: usize,
	pub mmap: MmapTable,
}

impl<'a> Process<'a> {
	/// Creates a new, empty process with a freshly allocated page table.
	pub fn new(
		pid: u32,
		name: String,
		pgdir: PageTable<'a>,
	) -> Self {
		Self {
			pid,
			name,
			killed: false,
			pgdir,
			sz: 0,
			mmap: MmapTable::new(KERNBASE),
		}
	}

	/// Simulates a user-mode read of one byte at `va`, resolving a page
	/// fault if necessary. Mirrors what the CPU/MMU would do: a present,
	/// readable mapping is read directly; anything else routes through
	/// the fault resolver.
	pub fn read_byte(&mut self, va: crate::memory::VirtAddr) -> Result<u8, utils::errno::Errno> {
		self.ensure_access(va, false)?;
		let mut buf = [0u8; 1];
		self.pgdir.read_bytes(va, &mut buf)?;
		Ok(buf[0])
	}

	/// Simulates a user-mode write of one byte at `va`.
	pub fn write_byte(&mut self, va: crate::memory::VirtAddr, value: u8) -> Result<(), utils::errno::Errno> {
		self.ensure_access(va, true)?;
		self.pgdir.write_bytes(va, &[value])
	}

	fn ensure_access(&mut self, va: crate::memory::VirtAddr, write: bool) -> Result<(), utils::errno::Errno> {
		use crate::memory::vmem::WRITABLE;
		use crate::memory::PAGE_SIZE;
		let page = va.down_align_to(PAGE_SIZE);
		let needs_fault = match self.pgdir.get_pte(page) {
			Some(pte) => write && (pte & WRITABLE == 0),
			None => true,
		};
		if !needs_fault {
			return Ok(());
		}
		match resolve_page_fault(self, va, write) {
			FaultOutcome::Resolved => Ok(()),
			FaultOutcome::Fatal => Err(utils::errno!(EFAULT)),
		}
	}
}

/// Builds a child process sharing every present page of `parent` under
/// copy-on-write: both parent and child PTEs lose `WRITABLE` and gain
/// [`crate::memory::vmem::COW`], and the frame's reference count is
/// incremented once per new sharer. mmap regions are not inherited; a
/// forked process starts with none of its own.
pub fn fork<'a>(parent: &mut Process<'a>, child_pid: u32) -> Result<Process<'a>, utils::errno::Errno> {
	use crate::memory::vmem::{COW, PRESENT, WRITABLE};
	use crate::memory::PAGE_SIZE;

	let pfa = parent_pfa(parent);
	let child_pgdir = PageTable::new(pfa).map_err(|_| utils::errno!(ENOMEM))?;
	let mut page = 0;
	while page < parent.sz {
		let va = crate::memory::VirtAddr(page);
		if let Some(pte) = parent.pgdir.get_pte(va) {
			let frame = crate::memory::vmem::entry_frame_pub(pte);
			let flags = (crate::memory::vmem::entry_flags(pte) & !WRITABLE) | COW | PRESENT;
			let packed = crate::memory::vmem::pack_pub(frame, flags);
			parent.pgdir.set_pte(va, packed, false)?;
			child_pgdir.set_pte(va, packed, true)?;
			pfa.incref(frame);
		}
		page += PAGE_SIZE;
	}
	parent.pgdir.flush();
	let mut child = Process::new(child_pid, parent.name.clone(), child_pgdir);
	child.sz = parent.sz;
	Ok(child)
}

fn parent_pfa<'a>(proc: &Process<'a>) -> &'a crate::memory::frame::FrameAllocator {
	proc.pgdir.pfa()
}
