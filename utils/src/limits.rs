//! System-wide size constants shared by every crate in the workspace.

/// The size in bytes of a single page / physical frame.
pub const PAGE_SIZE: usize = 4096;
