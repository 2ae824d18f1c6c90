/*
 * This file is part of novakern.
 *
 * novakern is free software: you can redistribute it and/or modify it
 * under the terms of the GNU General Public License as published by the
 * Free Software Foundation, either version 3 of the License, or (at your
 * option) any later version.
 */

//! File-backed `mmap`.
//!
//! Each process holds up to [`MAX_MMAPS_PROC`] regions; the system as a
//! whole allows no more than [`MAX_MMAPS_SYS`] to exist at once. Regions
//! grow downward from [`KERNBASE`], one page-aligned, non-overlapping
//! slab at a time, and are mapped read-only until the first write fault
//! flips the page writable and marks the region dirty. `munmap` requires
//! an exact `(addr, length)` match: there is no partial unmap. An unknown
//! address is treated as a no-op, not an error, matching this subsystem's
//! deliberately non-POSIX `munmap` (it returns `0` rather than `-1` when
//! asked to unmap something that was never mapped).

use crate::file::FileBackend;
use crate::memory::vmem::{PageTable, WRITABLE};
use crate::memory::{VirtAddr, PAGE_SIZE};
use crate::process::Process;
use alloc::sync::Arc;
use core::sync::atomic::{AtomicUsize, Ordering};
use utils::errno;
use utils::errno::EResult;

/// Maximum number of simultaneous mmap regions per process.
pub const MAX_MMAPS_PROC: usize = 4;
/// Maximum number of simultaneous mmap regions system-wide.
pub const MAX_MMAPS_SYS: usize = 16;

/// The mapping may be read.
pub const MAP_PROT_READ: u32 = 0x1;
/// The mapping may be written (first write triggers a fault that flips
/// the page writable and marks the region dirty).
pub const MAP_PROT_WRITE: u32 = 0x2;

static SYSTEM_MMAP_COUNT: AtomicUsize = AtomicUsize::new(0);

/// One process's view of a mapped region.
#[derive(Default)]
pub struct MmapRegion {
	pub addr: VirtAddr,
	pub file: Option<Arc<dyn FileBackend>>,
	pub offset: u64,
	pub length: usize,
	pub flags: u32,
	pub used: bool,
	pub dirty: bool,
}

/// A process's table of mmap regions and the bump pointer they grow
/// downward from.
pub struct MmapTable {
	regions: [MmapRegion; MAX_MMAPS_PROC],
	mmap_sp: VirtAddr,
}

impl MmapTable {
	/// Creates an empty table whose first region will be placed just
	/// below `ceiling`.
	pub fn new(ceiling: usize) -> Self {
		Self {
			regions: Default::default(),
			mmap_sp: VirtAddr(ceiling),
		}
	}

	/// Finds the region, if any, covering virtual address `va`.
	pub fn find_region_by_addr(&mut self, va: VirtAddr) -> Option<&mut MmapRegion> {
		self.regions
			.iter_mut()
			.find(|r| r.used && va.0 >= r.addr.0 && va.0 < r.addr.0 + r.length)
	}

	/// Finds the region, if any, whose *base page* is exactly `va`. Unlike
	/// [`Self::find_region_by_addr`], this never matches an interior page
	/// of a multi-page region: the fault resolver's mmap branch only ever
	/// first-touches a region at its base address.
	pub fn region_at_base(&mut self, va: VirtAddr) -> Option<&mut MmapRegion> {
		self.regions.iter_mut().find(|r| r.used && r.addr == va)
	}
}

fn overlaps(a_addr: VirtAddr, a_len: usize, b_addr: VirtAddr, b_len: usize) -> bool {
	let a_end = a_addr.0 + a_len;
	let b_end = b_addr.0 + b_len;
	a_addr.0 < b_end && b_addr.0 < a_end
}

/// Maps `length` bytes of `file` starting at file offset `offset` into
/// `proc`'s address space, returning the virtual address of the mapping.
///
/// The file is read positionally: reads always start at `offset` plus
/// the running count of bytes already copied in, rather than advancing a
/// shared file cursor as a side effect. A cursor-advancing read would
/// make two mappings of the same open file interfere with each other's
/// placement, which nothing about this interface should do.
pub fn mmap<'a>(
	proc: &mut Process<'a>,
	file: Arc<dyn FileBackend>,
	offset: u64,
	length: usize,
	flags: u32,
) -> EResult<VirtAddr> {
	if !file.readable() {
		return Err(errno!(EACCES));
	}
	if offset as usize % PAGE_SIZE != 0 {
		return Err(errno!(EINVAL));
	}
	if length == 0 || flags & (MAP_PROT_READ | MAP_PROT_WRITE) == 0 {
		return Err(errno!(EINVAL));
	}
	if flags & MAP_PROT_WRITE != 0 && !file.writable() {
		return Err(errno!(EACCES));
	}
	if SYSTEM_MMAP_COUNT.load(Ordering::Relaxed) >= MAX_MMAPS_SYS {
		return Err(errno!(ENOMEM));
	}
	let slot = proc
		.mmap
		.regions
		.iter()
		.position(|r| !r.used)
		.ok_or(errno!(ENOMEM))?;

	let rounded_len = length.div_ceil(PAGE_SIZE) * PAGE_SIZE;
	let addr = VirtAddr(proc.mmap.mmap_sp.0 - rounded_len);
	if proc
		.mmap
		.regions
		.iter()
		.any(|r| r.used && overlaps(addr, rounded_len, r.addr, r.length))
	{
		return Err(errno!(ENOMEM));
	}

	proc.pgdir.map_range(addr, rounded_len, WRITABLE | crate::memory::vmem::USER)?;
	if let Err(e) = populate(&proc.pgdir, &file, addr, offset, length) {
		proc.pgdir.unmap_range(addr, rounded_len);
		return Err(e);
	}
	make_read_only(&proc.pgdir, addr, rounded_len)?;
	proc.pgdir.flush();

	proc.mmap.regions[slot] = MmapRegion {
		addr,
		file: Some(file),
		offset,
		length,
		flags,
		used: true,
		dirty: false,
	};
	proc.mmap.mmap_sp = addr;
	SYSTEM_MMAP_COUNT.fetch_add(1, Ordering::Relaxed);
	Ok(addr)
}

fn populate(
	pgdir: &PageTable,
	file: &Arc<dyn FileBackend>,
	addr: VirtAddr,
	offset: u64,
	length: usize,
) -> EResult<()> {
	let mut buf = [0u8; PAGE_SIZE];
	let mut done = 0;
	while done < length {
		let n = core::cmp::min(PAGE_SIZE, length - done);
		let got = file.read_at(offset + done as u64, &mut buf[..n])?;
		if got > 0 {
			pgdir.write_bytes(addr + done, &buf[..got])?;
		}
		if got < n {
			break;
		}
		done += n;
	}
	Ok(())
}

fn make_read_only(pgdir: &PageTable, addr: VirtAddr, len: usize) -> EResult<()> {
	let pages = len.div_ceil(PAGE_SIZE);
	for i in 0..pages {
		let va = addr + i * PAGE_SIZE;
		if let Some(pte) = pgdir.get_pte(va) {
			pgdir.set_pte(va, pte & !WRITABLE, false)?;
		}
	}
	Ok(())
}

/// Unmaps the region at exactly `(addr, length)`.
///
/// Returns `Ok(0)` both on success and when no region starts at `addr`
/// (an intentional divergence from POSIX `munmap`, which would report an
/// error). A region found at `addr` whose length does not match exactly
/// is an error: shrinking or splitting a mapping in place is not
/// supported, only removing the whole thing.
pub fn munmap<'a>(proc: &mut Process<'a>, addr: VirtAddr, length: usize) -> EResult<i32> {
	if addr.0 % PAGE_SIZE != 0 || length == 0 {
		return Err(errno!(EINVAL));
	}
	let Some(idx) = proc
		.mmap
		.regions
		.iter()
		.position(|r| r.used && r.addr == addr)
	else {
		return Ok(0);
	};
	let rounded_len = proc.mmap.regions[idx]
		.length
		.div_ceil(PAGE_SIZE)
		* PAGE_SIZE;
	if proc.mmap.regions[idx].length != length {
		return Err(errno!(EINVAL));
	}

	if proc.mmap.regions[idx].dirty {
		writeback(&proc.mmap.regions[idx], &proc.pgdir)?;
	}
	proc.pgdir.unmap_range(addr, rounded_len);
	proc.pgdir.flush();

	proc.mmap.regions[idx] = MmapRegion::default();
	proc.mmap.mmap_sp = proc
		.mmap
		.regions
		.iter()
		.filter(|r| r.used)
		.map(|r| r.addr.0)
		.min()
		.map(VirtAddr)
		.unwrap_or(VirtAddr(crate::memory::KERNBASE));
	SYSTEM_MMAP_COUNT.fetch_sub(1, Ordering::Relaxed);
	Ok(0)
}

fn writeback(region: &MmapRegion, pgdir: &PageTable) -> EResult<()> {
	let file = region.file.as_ref().expect("dirty region must have a file");
	let mut buf = [0u8; PAGE_SIZE];
	let mut done = 0;
	while done < region.length {
		let n = core::cmp::min(PAGE_SIZE, region.length - done);
		pgdir.read_bytes(region.addr + done, &mut buf[..n])?;
		file.write_at(region.offset + done as u64, &buf[..n])?;
		done += n;
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::file::RamFile;
	use crate::memory::frame::new_seeded;
	use crate::memory::VirtAddr;
	use crate::process::Process;
	use alloc::vec;

	/// `SYSTEM_MMAP_COUNT` is shared by every test in this binary; tests
	/// that exercise it run one at a time so that its default
	/// multi-threaded execution can't make one test's reservations spill
	/// into another's expectations.
	static TEST_GUARD: std::sync::Mutex<()> = std::sync::Mutex::new(());

	fn new_test_process(pfa: &crate::memory::frame::FrameAllocator) -> Process<'_> {
		let pgdir = PageTable::new(pfa).unwrap();
		Process::new(1, "test".into(), pgdir)
	}

	#[test]
	fn s1_read_only_mapping_sees_file_content() {
		let _guard = TEST_GUARD.lock().unwrap();
		let pfa = new_seeded();
		let mut proc = new_test_process(&pfa);
		let content = b"hello world".to_vec();
		let file = RamFile::new(content.clone(), true, false);
		let len = content.len();
		let addr = mmap(&mut proc, file, 0, len, MAP_PROT_READ).unwrap();
		for (i, byte) in content.iter().enumerate() {
			assert_eq!(proc.read_byte(addr + i).unwrap(), *byte);
		}
		munmap(&mut proc, addr, len).unwrap();
	}

	#[test]
	fn s2_write_fault_marks_dirty_and_writes_back() {
		let _guard = TEST_GUARD.lock().unwrap();
		let pfa = new_seeded();
		let mut proc = new_test_process(&pfa);
		let content = vec![0u8; PAGE_SIZE];
		let file = RamFile::new(content, true, true);
		let addr = mmap(&mut proc, file.clone(), 0, PAGE_SIZE, MAP_PROT_READ | MAP_PROT_WRITE)
			.unwrap();
		proc.write_byte(addr, b'B').unwrap();
		assert!(proc.mmap.find_region_by_addr(addr).unwrap().dirty);
		munmap(&mut proc, addr, PAGE_SIZE).unwrap();
		assert_eq!(file.snapshot()[0], b'B');
	}

	#[test]
	fn s3_munmap_with_wrong_length_is_rejected() {
		let _guard = TEST_GUARD.lock().unwrap();
		let pfa = new_seeded();
		let mut proc = new_test_process(&pfa);
		let file = RamFile::new(vec![0u8; PAGE_SIZE], true, false);
		let addr = mmap(&mut proc, file, 0, PAGE_SIZE, MAP_PROT_READ).unwrap();
		let err = munmap(&mut proc, addr, PAGE_SIZE * 2).unwrap_err();
		assert_eq!(err, errno!(EINVAL));
		// The mismatched-length call must not have touched the region: the
		// correct length still unmaps it cleanly.
		munmap(&mut proc, addr, PAGE_SIZE).unwrap();
	}

	#[test]
	fn s4_munmap_of_unmapped_address_is_a_no_op() {
		let _guard = TEST_GUARD.lock().unwrap();
		let pfa = new_seeded();
		let mut proc = new_test_process(&pfa);
		let result = munmap(&mut proc, VirtAddr(0x1234_0000), PAGE_SIZE).unwrap();
		assert_eq!(result, 0);
	}

	#[test]
	fn system_wide_cap_is_enforced() {
		let _guard = TEST_GUARD.lock().unwrap();
		let pfa = new_seeded();
		let mut procs: alloc::vec::Vec<Process> = (0..MAX_MMAPS_SYS + 1)
			.map(|i| new_test_process_with_pid(&pfa, i as u32))
			.collect();
		let mut mapped = alloc::vec::Vec::new();
		for proc in procs.iter_mut() {
			let file = RamFile::new(vec![0u8; PAGE_SIZE], true, false);
			if let Ok(addr) = mmap(proc, file, 0, PAGE_SIZE, MAP_PROT_READ) {
				mapped.push(addr);
			}
		}
		assert_eq!(mapped.len(), MAX_MMAPS_SYS);
		// Undo every successful mapping so the system-wide counter, shared
		// across every test in this binary, is left exactly as found.
		for (proc, addr) in procs.iter_mut().zip(mapped) {
			munmap(proc, addr, PAGE_SIZE).unwrap();
		}
	}

	fn new_test_process_with_pid(pfa: &crate::memory::frame::FrameAllocator, pid: u32) -> Process<'_> {
		let pgdir = PageTable::new(pfa).unwrap();
		Process::new(pid, "test".into(), pgdir)
	}
}
