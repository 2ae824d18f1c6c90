/*
 * This file is part of novakern.
 *
 * novakern is free software: you can redistribute it and/or modify it
 * under the terms of the GNU General Public License as published by the
 * Free Software Foundation, either version 3 of the License, or (at your
 * option) any later version.
 */

//! The page-fault resolver.
//!
//! Dispatches a fault at `fault_addr` to whichever branch can explain it:
//! copy-on-write, a lazily-populated mmap region, or neither, in which
//! case the fault is fatal and the process is marked for death. Nothing
//! here ever panics the kernel over a single process's bad access; the
//! original this is modeled on does, for an out-of-memory mid-fault,
//! which this reimplementation treats as just another fatal fault
//! instead (see `DESIGN.md`).

use super::mmap::MAP_PROT_WRITE;
use super::Process;
use crate::memory::vmem::{entry_flags, entry_frame_pub, pack_pub, COW, PRESENT, USER, WRITABLE};
use crate::memory::{VirtAddr, PAGE_SIZE};

/// The result of attempting to resolve a page fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultOutcome {
	/// The fault was explained and the mapping is now usable.
	Resolved,
	/// The fault could not be explained; the process has been killed.
	Fatal,
}

/// Resolves a page fault at `fault_addr` in `proc`. `write` tells whether
/// the faulting access was a write.
pub fn resolve_page_fault<'a>(
	proc: &mut Process<'a>,
	fault_addr: VirtAddr,
	write: bool,
) -> FaultOutcome {
	let va = fault_addr.down_align_to(PAGE_SIZE);
	let Some(pte) = proc.pgdir.get_pte(va) else {
		return fatal(proc, fault_addr);
	};

	if write && entry_flags(pte) & WRITABLE == 0 && entry_flags(pte) & COW != 0 {
		return resolve_cow(proc, va, pte);
	}

	if let Some(region) = proc.mmap.region_at_base(va) {
		if write && region.flags & MAP_PROT_WRITE != 0 {
			let new_pte = pte | WRITABLE;
			if proc.pgdir.set_pte(va, new_pte, false).is_err() {
				return fatal(proc, fault_addr);
			}
			region.dirty = true;
			return FaultOutcome::Resolved;
		}
	}

	fatal(proc, fault_addr)
}

fn resolve_cow<'a>(proc: &mut Process<'a>, va: VirtAddr, pte: u32) -> FaultOutcome {
	let frame = entry_frame_pub(pte);
	let pfa = proc.pgdir.pfa();
	if pfa.rc(frame) > 1 {
		let Ok(new_frame) = pfa.alloc() else {
			return fatal(proc, va);
		};
		pfa.copy_from(new_frame, frame);
		let new_pte = pack_pub(new_frame, PRESENT | WRITABLE | USER);
		if proc.pgdir.set_pte(va, new_pte, false).is_err() {
			pfa.free(new_frame);
			return fatal(proc, va);
		}
		pfa.free(frame);
	} else {
		let new_pte = pack_pub(frame, PRESENT | WRITABLE | USER);
		if proc.pgdir.set_pte(va, new_pte, false).is_err() {
			return fatal(proc, va);
		}
	}
	proc.pgdir.flush();
	FaultOutcome::Resolved
}

fn fatal<'a>(proc: &mut Process<'a>, addr: VirtAddr) -> FaultOutcome {
	proc.killed = true;
	crate::println!(
		"pid {}: killed, unresolvable page fault at {:?}",
		proc.pid,
		addr
	);
	FaultOutcome::Fatal
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::memory::frame::new_seeded;
	use crate::memory::vmem::PageTable;
	use crate::process::{fork, Process};

	fn new_test_process(pfa: &crate::memory::frame::FrameAllocator) -> Process<'_> {
		let pgdir = PageTable::new(pfa).unwrap();
		let mut proc = Process::new(1, "parent".into(), pgdir);
		proc.sz = PAGE_SIZE;
		proc.pgdir
			.map_range(VirtAddr(0), PAGE_SIZE, WRITABLE | USER)
			.unwrap();
		proc.pgdir.write_bytes(VirtAddr(0), b"abcd").unwrap();
		proc
	}

	#[test]
	fn s5_cow_write_after_fork_is_private_to_each_side() {
		let pfa = new_seeded();
		let mut parent = new_test_process(&pfa);
		let mut child = fork(&mut parent, 2).unwrap();

		let pte = parent.pgdir.get_pte(VirtAddr(0)).unwrap();
		assert_eq!(entry_flags(pte) & WRITABLE, 0);
		assert_eq!(entry_flags(pte) & COW, COW);
		assert_eq!(pfa.rc(entry_frame_pub(pte)), 2);

		parent.write_byte(VirtAddr(0), b'X').unwrap();
		child.write_byte(VirtAddr(0), b'Y').unwrap();

		assert_eq!(parent.read_byte(VirtAddr(0)).unwrap(), b'X');
		assert_eq!(parent.read_byte(VirtAddr(1)).unwrap(), b'b');
		assert_eq!(child.read_byte(VirtAddr(0)).unwrap(), b'Y');
		assert_eq!(child.read_byte(VirtAddr(1)).unwrap(), b'b');
	}

	#[test]
	fn cow_solo_flips_in_place_without_copying() {
		let pfa = new_seeded();
		let mut parent = new_test_process(&pfa);
		let child = fork(&mut parent, 2).unwrap();
		drop(child); // releases the child's reference; rc back to 1
		// The child's pgdir drop doesn't free shared frames in this
		// reference implementation (teardown is out of scope), so mimic
		// the effect directly: free the frame it held explicitly.
		let pte = parent.pgdir.get_pte(VirtAddr(0)).unwrap();
		let frame = entry_frame_pub(pte);
		pfa.free(frame);
		assert_eq!(pfa.rc(frame), 1);

		parent.write_byte(VirtAddr(0), b'Z').unwrap();
		let after = parent.pgdir.get_pte(VirtAddr(0)).unwrap();
		assert_eq!(entry_frame_pub(after), frame, "must not have copied");
		assert_eq!(pfa.rc(frame), 1);
	}

	#[test]
	fn unmapped_access_is_fatal() {
		let pfa = new_seeded();
		let pgdir = PageTable::new(&pfa).unwrap();
		let mut proc = Process::new(3, "lonely".into(), pgdir);
		assert!(proc.read_byte(VirtAddr(0x9999_0000)).is_err());
		assert!(proc.killed);
	}

	#[test]
	fn write_fault_on_non_base_page_of_mmap_region_is_fatal() {
		use crate::file::RamFile;
		use crate::process::mmap::{mmap, MAP_PROT_READ, MAP_PROT_WRITE};
		use alloc::vec;

		let pfa = new_seeded();
		let pgdir = PageTable::new(&pfa).unwrap();
		let mut proc = Process::new(4, "mapper".into(), pgdir);
		let file = RamFile::new(vec![0u8; PAGE_SIZE * 2], true, true);
		let addr = mmap(
			&mut proc,
			file,
			0,
			PAGE_SIZE * 2,
			MAP_PROT_READ | MAP_PROT_WRITE,
		)
		.unwrap();

		// The region's base page is a legitimate first-touch write; its
		// second page is not, even though both pages belong to the same
		// writable region: only the base address is matched.
		let outcome = resolve_page_fault(&mut proc, addr + PAGE_SIZE, true);
		assert_eq!(outcome, FaultOutcome::Fatal);
		assert!(proc.killed);
	}
}
