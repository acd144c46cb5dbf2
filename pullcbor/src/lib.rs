/***************************************************************************************************
 * Copyright (c) 2020-2023 Qualcomm Innovation Center, Inc. All rights reserved.
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy of this software
 * and associated documentation files (the “Software”), to deal in the Software without
 * restriction, including without limitation the rights to use, copy, modify, merge, publish,
 * distribute, sublicense, and/or sell copies of the Software, and to permit persons to whom the
 * Software is furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice (including the next
 * paragraph) shall be included in all copies or substantial portions of the
 * Software.
 *
 * THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING
 * BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
 * NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
 * DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
 **************************************************************************************************/
/***************************************************************************************************
 * pullcbor module definition
 *
 * A pull-based, zero-allocation deserializer for CBOR (RFC8949).
 * This implementation is designed for use in constrained systems and requires neither the Rust
 * standard library nor an allocator.
 **************************************************************************************************/

// Default configuration
#![no_std]
#![warn(missing_docs)]

//! # PULLCBOR
//!
//! The `pullcbor` crate is a pull decoder for CBOR (RFC8949) aimed at embedded targets where
//! the programmer wants full control over traversal and memory. The decoder is a cursor over
//! a caller supplied byte buffer: each call to [`decoder::CBORDecoder::get_next`] consumes
//! one data item and yields a typed record carrying its value, its label when it was decoded
//! inside a map, its nesting position and the tags that preceded it. Decoded strings are
//! zero-copy slices of the input buffer.
//!
//! The default configuration requires neither an allocator nor the standard library.
//! Indefinite length strings are the one thing that needs scratch memory: hand the decoder a
//! byte buffer via [`decoder::CBORDecoder::set_mem_pool`] and chunks are reassembled there.
//!
//! ## Features
//!
//! - Pre-order traversal over the whole item tree with explicit nesting levels, including
//!   indefinite length arrays, maps and strings.
//! - Map mode: enter a map, fetch entries by integer or text label (with duplicate
//!   detection), rewind and re-scan, then exit to the item after the map. Maps can also be
//!   traversed as plain item sequences for protocols with exotic labels.
//! - The date, bignum, decimal fraction and bigfloat tags fold into specialised item types;
//!   all other tags are reported alongside the item they annotate.
//! - Sticky error discipline: decode operations after a failure are no-ops, so a long
//!   decode sequence can be written straight-line and checked once at
//!   [`decoder::CBORDecoder::finish`].
//!
//! ## Decoding
//!
//! The example below pulls two claims and a nested array out of a small map.
//!
//! ```
//! use pullcbor::decoder::CBORDecoder;
//! use pullcbor::error::CBORError;
//!
//! fn main() -> Result<(), CBORError> {
//!     // {"a": 1, "b": [2, 3]}
//!     let input: &[u8] = &[0xa2, 0x61, 0x61, 0x01, 0x61, 0x62, 0x82, 0x02, 0x03];
//!
//!     let mut decoder = CBORDecoder::from_slice(input);
//!     let mut a = 0i64;
//!     let mut first = 0i64;
//!     let mut second = 0i64;
//!
//!     decoder.enter_map()?;
//!     decoder.get_int64_in_map_text("a", &mut a)?;
//!     decoder.enter_array_from_map_text("b")?;
//!     decoder.get_int64(&mut first)?;
//!     decoder.get_int64(&mut second)?;
//!     decoder.exit_array()?;
//!     decoder.exit_map()?;
//!     decoder.finish()?;
//!
//!     assert_eq!((a, first, second), (1, 2, 3));
//!     Ok(())
//! }
//! ```

// Pull in std if we are testing or if it is defined as a feature (because we run tests on a
// platform supporting I/O and full feature set.
#[cfg(any(feature = "std", test))]
extern crate std;

// If we are really building no_std, pull in core as well. It is aliased as std so that "use"
// statements are always the same
#[cfg(all(not(feature = "std"), not(test)))]
extern crate core as std;

#[cfg(any(feature = "float", test))]
extern crate half;

#[cfg(feature = "full")]
extern crate chrono;

#[cfg(feature = "full")]
mod cbor_diag;
pub(crate) mod constants;
pub(crate) mod convert;
pub(crate) mod decode;
pub(crate) mod item;
pub(crate) mod map;
pub(crate) mod nesting;
pub(crate) mod stralloc;
pub(crate) mod tag;
pub(crate) mod utils;

/// The `error` module contains error definitions used throughout `pullcbor`.
pub mod error;

/// The `types` module exports the [`types::Item`] record produced for each decoded CBOR
/// item, together with the value, label and type-filter enumerations it is built from.
pub mod types {
    pub use super::item::{Item, Label, Mantissa, Value, ValueKind};
}

/// The `decoder` module exports the decoder context and everything needed to drive it:
/// decode modes, map queries, the string storage protocol and the constant tables for
/// conversion options and the folded tag numbers.
pub mod decoder {
    pub use super::decode::{CBORDecoder, DecodeMode};
    pub use super::map::{MapQuery, SearchLabel};
    pub use super::stralloc::{MemPool, StringStorage};

    pub use super::constants::convert;
    pub use super::constants::tags;
    pub use super::constants::{
        INDEFINITE_COUNT, MAX_CALLER_TAGS, MAX_NESTING, MAX_TAGS_PER_ITEM, MEM_POOL_MIN_SIZE,
    };
}

/// Diagnostic-notation output, available with the standard library.
#[cfg(feature = "full")]
pub mod debug {
    pub use super::cbor_diag::print_hex;
    pub use super::cbor_diag::Diag;
}
