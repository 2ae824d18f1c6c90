//! Kernel error codes.
//!
//! Every fallible kernel-internal operation returns an [`EResult`]. The
//! variant set is intentionally small: it covers the handful of conditions
//! the memory subsystem and its callers actually need to distinguish,
//! not the full POSIX errno table.

use core::fmt;

/// An error code returned by a kernel operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Errno {
	/// Invalid argument.
	EINVAL,
	/// Permission denied.
	EACCES,
	/// Operation not permitted.
	EPERM,
	/// Bad file descriptor / bad file reference.
	EBADF,
	/// I/O error.
	EIO,
	/// Bad address (page not mapped where one was expected).
	EFAULT,
	/// Out of memory / resource exhausted (the PFA has no free frames, or a
	/// process/system mapping table is full).
	ENOMEM,
}

impl fmt::Display for Errno {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let s = match self {
			Self::EINVAL => "invalid argument",
			Self::EACCES => "permission denied",
			Self::EPERM => "operation not permitted",
			Self::EBADF => "bad file reference",
			Self::EIO => "I/O error",
			Self::EFAULT => "bad address",
			Self::ENOMEM => "out of memory",
		};
		write!(f, "{s}")
	}
}

/// Shorthand for a `Result` whose error type is [`Errno`].
pub type EResult<T> = Result<T, Errno>;

/// Builds an [`Errno`] value. Kept as a macro so call sites read the same
/// way regardless of whether more context (messages, logging) is added to
/// the expansion later.
#[macro_export]
macro_rules! errno {
	($variant:ident) => {
		$crate::errno::Errno::$variant
	};
}

/// An allocation failure, distinct from [`Errno`] because it mirrors
/// `core::alloc::AllocError`'s zero-information shape: the PFA has nothing
/// more to say than "no frame available".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocError;

impl fmt::Display for AllocError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "frame allocation failed")
	}
}

impl From<AllocError> for Errno {
	fn from(_: AllocError) -> Self {
		Errno::ENOMEM
	}
}

/// Shorthand for a `Result` whose error type is [`AllocError`].
pub type AllocResult<T> = Result<T, AllocError>;
