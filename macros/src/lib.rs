//! Procedural macros used by the kernel crate.

mod allocator;

use proc_macro::TokenStream;

/// Instruments an allocator entry point (the PFA's `alloc`/`free`) with a
/// sample recorded into `memory::stats`.
///
/// ```ignore
/// #[instrument_allocator(name = pfa, op = alloc)]
/// pub fn alloc(&self) -> Option<FrameNo> { ... }
/// ```
#[proc_macro_attribute]
pub fn instrument_allocator(metadata: TokenStream, input: TokenStream) -> TokenStream {
	allocator::instrument_allocator(metadata, input)
}
