//! Interrupt-safe locking.
//!
//! [`IntMutex`] wraps a [`spin::Mutex`]. On real hardware, holding a kernel
//! lock across an interrupt is how deadlocks are born, so the lock would
//! also disable interrupts for the duration of the critical section; this
//! reference implementation never runs with interrupts enabled in the first
//! place (it is exercised entirely from host test code), so the type only
//! carries the name and the API shape forward.

pub use spin::MutexGuard;

/// A mutex intended for data touched from both process context and fault
/// handlers.
pub struct IntMutex<T: ?Sized> {
	inner: spin::Mutex<T>,
}

impl<T> IntMutex<T> {
	/// Creates a new lock around `value`.
	pub const fn new(value: T) -> Self {
		Self {
			inner: spin::Mutex::new(value),
		}
	}
}

impl<T: ?Sized> IntMutex<T> {
	/// Locks the mutex, spinning until it becomes available.
	pub fn lock(&self) -> MutexGuard<'_, T> {
		self.inner.lock()
	}
}
