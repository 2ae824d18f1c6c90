//! Shared primitives for the kernel workspace.
//!
//! This crate has no dependency on any particular kernel subsystem. It
//! exists so that `kernel` and `macros` can agree on a common vocabulary of
//! error codes, locks and limits without creating a circular dependency.

#![cfg_attr(not(feature = "std"), no_std)]

pub mod errno;
pub mod lock;
pub mod limits;

pub use errno::{EResult, Errno};
pub use lock::IntMutex;
