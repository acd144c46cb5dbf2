/***************************************************************************************************
 * Copyright (c) 2020-2023 Qualcomm Innovation Center, Inc. All rights reserved.
 *
 * Permission is hereby granted, free of charge, to any person obtaining a copy of this software
 * and associated documentation files (the “Software”), to deal in the Software without
 * restriction, including without limitation the rights to use, copy, modify, merge, publish,
 * distribute, sublicense, and/or sell copies of the Software, and to permit persons to whom the
 * Software is furnished to do so, subject to the following conditions:
 *
 * The above copyright notice and this permission notice shall be included in all copies or
 * substantial portions of the Software.
 *
 * THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR IMPLIED, INCLUDING
 * BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS FOR A PARTICULAR PURPOSE AND
 * NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM,
 * DAMAGES OR OTHER LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
 * OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.
 **************************************************************************************************/
/***************************************************************************************************
 * pullcbor CBOR constants
 *
 * A pull-based, zero-allocation deserializer for CBOR (RFC8949).
 * This implementation is designed for use in constrained systems and requires neither the Rust
 * standard library nor an allocator.
 **************************************************************************************************/
/// Additional Information bitmask
pub const AI_MASK: u8 = 0b000_11111;

/// Major Type 0 (Positive integers)
pub const MT_UINT: u8 = 0;
/// Major Type 1 (Negative integers)
pub const MT_NINT: u8 = 1;
/// Major Type 2 (Byte Strings)
pub const MT_BSTR: u8 = 2;
/// Major Type 3 (Text Strings)
pub const MT_TSTR: u8 = 3;
/// Major Type 4 (Array)
pub const MT_ARRAY: u8 = 4;
/// Major Type 5 (Map)
pub const MT_MAP: u8 = 5;
/// Major Type 6 (Tag)
pub const MT_TAG: u8 = 6;
/// Major Type 7 (Floats, simple types etc.)
pub const MT_SIMPLE: u8 = 7;

/// Maximum value of a "simple" payload mapped on AI bits
pub const PAYLOAD_AI_BITS: u8 = 23;
/// Indicates one byte of length or value information follows MT/AI byte
pub const PAYLOAD_ONE_BYTE: u8 = 24;
/// Indicates two bytes of length or value information follows MT/AI byte
pub const PAYLOAD_TWO_BYTES: u8 = 25;
/// Indicates four bytes of length or value information follows MT/AI byte
pub const PAYLOAD_FOUR_BYTES: u8 = 26;
/// Indicates eight bytes of length or value information follows MT/AI byte
pub const PAYLOAD_EIGHT_BYTES: u8 = 27;
/// Indicates an indefinite length item, or BREAK on Major Type 7
pub const PAYLOAD_INDEFINITE: u8 = 31;

/// The BREAK stop code terminating indefinite length items
pub const BREAK_BYTE: u8 = 0xff;

/// Sentinel count reported for indefinite length arrays and maps. The count field of a
/// definite length container is always below this value.
pub const INDEFINITE_COUNT: u16 = u16::MAX;

/// Largest definite length array or map count that can be decoded
pub const MAX_DEFINITE_COUNT: u64 = (INDEFINITE_COUNT - 1) as u64;

/// Maximum depth of nested arrays and maps
pub const MAX_NESTING: usize = 15;

/// Maximum number of tags that may precede a single data item
pub const MAX_TAGS_PER_ITEM: usize = 4;

/// Number of distinct tag numbers the decoder can map onto tag bits
pub const TAG_TABLE_SIZE: usize = 64;

/// Maximum number of caller configured tag numbers
pub const MAX_CALLER_TAGS: usize = 16;

/// Largest input buffer the decoder accepts
pub const MAX_DECODE_INPUT_SIZE: u64 = u32::MAX as u64;

/// Minimum usable size for a [`crate::stralloc::MemPool`] backing buffer
pub const MEM_POOL_MIN_SIZE: usize = 8;

/// Module defining the tag numbers the decoder folds into specialised item types, plus the
/// self-describe tag it recognises without transformation.
pub mod tags {
    /// Tag 0: RFC3339 date/time string
    pub const TAG_DATE_STRING: u64 = 0;
    /// Tag 1: epoch-based date/time
    pub const TAG_DATE_EPOCH: u64 = 1;
    /// Tag 2: positive bignum
    pub const TAG_POS_BIGNUM: u64 = 2;
    /// Tag 3: negative bignum
    pub const TAG_NEG_BIGNUM: u64 = 3;
    /// Tag 4: decimal fraction
    pub const TAG_DECIMAL_FRACTION: u64 = 4;
    /// Tag 5: bigfloat
    pub const TAG_BIGFLOAT: u64 = 5;
    /// Tag 100: number of days since the epoch
    pub const TAG_DAYS_EPOCH: u64 = 100;
    /// Tag 1004: RFC8943 full-date string
    pub const TAG_DAYS_STRING: u64 = 1004;
    /// Tag 55799: self-described CBOR
    pub const TAG_SELF_DESCRIBED: u64 = 55799;
}

/// Module defining bitfield values selecting the conversions the `_convert` family of getters
/// is allowed to perform. See [`crate::decode::CBORDecoder::get_int64_convert`].
pub mod convert {
    pub const INT64: u32 = 0x01;
    pub const UINT64: u32 = 0x02;
    pub const FLOAT: u32 = 0x04;
    pub const BIGFLOAT: u32 = 0x08;
    pub const DECIMAL_FRACTION: u32 = 0x10;
    pub const BIGNUM: u32 = 0x20;
    pub const DOUBLE: u32 = 0x40;
    /// Both integer representations; the default for the plain integer getters
    pub const XINT64: u32 = INT64 | UINT64;
    /// Everything the `_convert_all` getters understand
    pub const ALL: u32 = INT64 | UINT64 | FLOAT | BIGFLOAT | DECIMAL_FRACTION | BIGNUM | DOUBLE;
}
