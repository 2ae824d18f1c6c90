/*
 * This file is part of novakern.
 *
 * novakern is free software: you can redistribute it and/or modify it
 * under the terms of the GNU General Public License as published by the
 * Free Software Foundation, either version 3 of the License, or (at your
 * option) any later version.
 */

//! The system-call surface this subsystem exposes.
//!
//! Register/stack argument marshalling belongs to a collaborator this
//! crate does not implement; what's here are the typed entry points that
//! collaborator would call into once it has decoded a `file descriptor,
//! offset, length, flags`-shaped argument list into Rust values.

pub mod mem;
pub mod mmap;
