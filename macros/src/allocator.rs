//! Implementation of the allocator instrumentation macro.

use proc_macro::TokenStream;
use proc_macro2::TokenTree;
use quote::{quote, ToTokens};
use syn::{parse::Parser, parse_macro_input, Block, ItemFn};

#[derive(Default)]
struct RawMetadata {
	name: Option<String>,
	op: Option<String>,
}

enum MetadataOp {
	Alloc,
	Free,
}

struct Metadata {
	name: String,
	op: MetadataOp,
}

fn parse_metadata(metadata: proc_macro2::TokenStream) -> Metadata {
	let toks: Vec<_> = metadata.into_iter().collect();
	let separator = |t: &TokenTree| matches!(t, TokenTree::Punct(p) if p.as_char() == ',');
	let mut metadata = RawMetadata::default();
	for i in toks.split(separator) {
		if i.is_empty() {
			continue;
		}
		let [TokenTree::Ident(name), TokenTree::Punct(separator), TokenTree::Ident(value)] = i
		else {
			panic!("syntax error");
		};
		if separator.as_char() != '=' {
			panic!("syntax error");
		}
		match name.to_string().as_str() {
			"name" => metadata.name = Some(value.to_string()),
			"op" => metadata.op = Some(value.to_string()),
			n => panic!("unknown metadata key `{n}`"),
		}
	}
	let op = match metadata.op.expect("missing `op`").as_str() {
		"alloc" => MetadataOp::Alloc,
		"free" => MetadataOp::Free,
		n => panic!("invalid operation `{n}`"),
	};
	Metadata {
		name: metadata.name.expect("missing `name`"),
		op,
	}
}

/// Wraps an allocator entry point with a call into the frame-allocator
/// sample counter. Unlike a general-purpose heap allocator there is no
/// pointer or size argument to record: every sample is one frame.
pub fn instrument_allocator(metadata: TokenStream, input: TokenStream) -> TokenStream {
	let metadata = proc_macro2::TokenStream::from(metadata);
	let metadata = parse_metadata(metadata);
	let mut input = parse_macro_input!(input as ItemFn);
	if input.sig.constness.is_some() {
		panic!("an allocator function cannot be `const`");
	}
	let name = metadata.name;
	let stmts = input.block.stmts;
	let stmts = match metadata.op {
		MetadataOp::Alloc => quote! {
			let result = {
				#(#stmts)*
			};
			if result.is_ok() {
				crate::memory::stats::sample(#name, crate::memory::stats::Op::Alloc);
			}
			result
		},
		MetadataOp::Free => quote! {
			crate::memory::stats::sample(#name, crate::memory::stats::Op::Free);
			#(#stmts)*
		},
	};
	input.block.stmts = Block::parse_within.parse(stmts.into()).unwrap();
	input.into_token_stream().into()
}
