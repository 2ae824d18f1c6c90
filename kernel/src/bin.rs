/*
 * This file is part of novakern.
 *
 * novakern is free software: you can redistribute it and/or modify it
 * under the terms of the GNU General Public License as published by the
 * Free Software Foundation, either version 3 of the License, or (at your
 * option) any later version.
 */

//! Boot entry point.
//!
//! There is no real bootloader handoff here: the scheduler, interrupt
//! setup and multiboot parsing that would normally call into this
//! subsystem are the external collaborators described in `kernel.rs`.
//! This binary exists only so the crate has a `[[bin]]` target matching
//! the library's own shape; it seeds the one, system-wide frame
//! allocator and then idles.

#![no_std]
#![no_main]

use kernel::memory::frame::FrameAllocator;
use kernel::memory::NPAGEFRAMES;

/// The system-wide page-frame allocator. Everything in this crate that
/// takes a `&FrameAllocator` elsewhere (tests build their own) is, in a
/// real boot, handed a reference to this one.
static PFA: FrameAllocator = FrameAllocator::new();

// The panic handler lives in `kernel::kernel` (this binary links the
// `kernel` lib, which provides it whenever `test` is not set).

#[no_mangle]
pub extern "C" fn _start() -> ! {
	PFA.kinit1(0..(NPAGEFRAMES / 4) as u32);
	PFA.kinit2((NPAGEFRAMES / 4) as u32..NPAGEFRAMES as u32);
	kernel::println!("novakern: {} frames free", PFA.frees_count());
	loop {}
}
