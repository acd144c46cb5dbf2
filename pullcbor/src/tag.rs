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
 * pullcbor CBOR tag accumulation API
 *
 * A pull-based, zero-allocation deserializer for CBOR (RFC8949).
 * This implementation is designed for use in constrained systems and requires neither the Rust
 * standard library nor an allocator.
 **************************************************************************************************/
use crate::constants::tags::*;
use crate::constants::{MAX_CALLER_TAGS, MAX_TAGS_PER_ITEM, TAG_TABLE_SIZE};
use crate::error::{CBORError, Result};
use crate::item::Value;

#[cfg(feature = "trace")]
use func_trace::trace;

#[cfg(feature = "trace")]
func_trace::init_depth_var!();

/// The sequence of tag numbers collected in front of one data item, outermost first.
#[derive(Debug, Copy, Clone)]
pub(crate) struct TagChain {
    tags: [u64; MAX_TAGS_PER_ITEM],
    len: usize,
}

impl TagChain {
    pub fn new() -> Self {
        TagChain {
            tags: [0; MAX_TAGS_PER_ITEM],
            len: 0,
        }
    }

    /// Record one more tag. Fails with `TooManyTags` once the per-item limit is reached.
    pub fn push(&mut self, tag: u64) -> Result<()> {
        if self.len == MAX_TAGS_PER_ITEM {
            return Err(CBORError::TooManyTags);
        }
        self.tags[self.len] = tag;
        self.len += 1;
        Ok(())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn as_slice(&self) -> &[u64] {
        &self.tags[..self.len]
    }
}

/// The per-decoder table mapping tag numbers to bits of [`crate::item::Item::tag_bits`].
///
/// Caller configured tag numbers occupy the first slots; every other tag number is added
/// in encounter order until the table fills. A tag seen after that is no longer
/// representable as a bit, though it is still reported by
/// [`crate::decode::CBORDecoder::get_next_with_tags`].
#[derive(Debug, Copy, Clone)]
pub(crate) struct TagSet {
    entries: [u64; TAG_TABLE_SIZE],
    len: usize,
}

impl TagSet {
    pub fn new() -> Self {
        TagSet {
            entries: [0; TAG_TABLE_SIZE],
            len: 0,
        }
    }

    /// Install the caller configured tag list. At most [`MAX_CALLER_TAGS`] numbers are
    /// accepted. Must be called before decoding starts; it resets the table.
    pub fn set_caller_tags(&mut self, tags: &[u64]) -> Result<()> {
        if tags.len() > MAX_CALLER_TAGS {
            return Err(CBORError::TooManyTags);
        }
        self.len = 0;
        for &tag in tags {
            self.entries[self.len] = tag;
            self.len += 1;
        }
        Ok(())
    }

    fn index_of(&self, tag: u64) -> Option<usize> {
        self.entries[..self.len].iter().position(|&t| t == tag)
    }

    /// The bit for `tag`, inserting it into the table if there is room.
    fn bit_for(&mut self, tag: u64) -> Option<u64> {
        match self.index_of(tag) {
            Some(i) => Some(1 << i),
            None if self.len < TAG_TABLE_SIZE => {
                self.entries[self.len] = tag;
                self.len += 1;
                Some(1 << (self.len - 1))
            }
            None => None,
        }
    }

    /// Fold a whole chain into a bitmap.
    pub fn bits_for_chain(&mut self, chain: &TagChain) -> u64 {
        let mut bits = 0;
        for &tag in chain.as_slice() {
            if let Some(bit) = self.bit_for(tag) {
                bits |= bit;
            }
        }
        bits
    }

    /// Return `true` if `bits` records `tag`.
    pub fn is_tagged(&self, bits: u64, tag: u64) -> bool {
        match self.index_of(tag) {
            Some(i) => bits & (1 << i) != 0,
            None => false,
        }
    }
}

/// Return `true` for tag numbers the decoder folds into specialised item types.
pub(crate) fn is_transforming(tag: u64) -> bool {
    matches!(
        tag,
        TAG_DATE_STRING
            | TAG_DATE_EPOCH
            | TAG_POS_BIGNUM
            | TAG_NEG_BIGNUM
            | TAG_DECIMAL_FRACTION
            | TAG_BIGFLOAT
            | TAG_DAYS_EPOCH
            | TAG_DAYS_STRING
    )
}

/// Fold one of the built-in tags that do not consume further input (everything except the
/// decimal fraction and bigfloat tags) into the item type it defines. The content item must
/// already have the type the tag requires.
#[cfg_attr(feature = "trace", trace)]
pub(crate) fn fold_builtin<'buf>(tag: u64, value: Value<'buf>) -> Result<Value<'buf>> {
    match tag {
        TAG_DATE_STRING => match value {
            Value::Tstr(s) => Ok(Value::DateString(s)),
            _ => Err(CBORError::UnrecoverableTagContent),
        },
        TAG_DATE_EPOCH => fold_epoch(value),
        TAG_POS_BIGNUM => match value {
            Value::Bstr(b) => Ok(Value::PosBignum(b)),
            _ => Err(CBORError::UnrecoverableTagContent),
        },
        TAG_NEG_BIGNUM => match value {
            Value::Bstr(b) => Ok(Value::NegBignum(b)),
            _ => Err(CBORError::UnrecoverableTagContent),
        },
        TAG_DAYS_EPOCH => match value {
            Value::UInt(d) if d <= i64::MAX as u64 => Ok(Value::DaysEpoch(d as i64)),
            Value::UInt(_) => Err(CBORError::DateOverflow),
            Value::Int(d) => Ok(Value::DaysEpoch(d)),
            _ => Err(CBORError::UnrecoverableTagContent),
        },
        TAG_DAYS_STRING => match value {
            Value::Tstr(s) => Ok(Value::DaysString(s)),
            _ => Err(CBORError::UnrecoverableTagContent),
        },
        _ => Ok(value),
    }
}

/// Tag 1: epoch dates accept integer and floating point content. Floating point seconds are
/// split into whole seconds and a fraction; values outside the 64 bit second range and
/// non-finite values do not fit the date representation.
fn fold_epoch(value: Value) -> Result<Value> {
    match value {
        Value::UInt(s) if s <= i64::MAX as u64 => Ok(Value::DateEpoch {
            seconds: s as i64,
            fraction: 0.0,
        }),
        Value::UInt(_) => Err(CBORError::DateOverflow),
        Value::Int(s) => Ok(Value::DateEpoch {
            seconds: s,
            fraction: 0.0,
        }),
        Value::Double(d) => fold_float_epoch(d),
        Value::Float(f) => fold_float_epoch(f as f64),
        _ => Err(CBORError::UnrecoverableTagContent),
    }
}

fn fold_float_epoch<'buf>(seconds: f64) -> Result<Value<'buf>> {
    // The f64 comparison bound is the smallest power of two above i64::MAX.
    if !seconds.is_finite() || seconds >= 9.223_372_036_854_776E18 || seconds < -9.223_372_036_854_776E18
    {
        return Err(CBORError::DateOverflow);
    }
    // core has no floor(); truncate toward zero and adjust for negatives. The range
    // guard above keeps the cast in bounds.
    let trunc = seconds as i64 as f64;
    let whole = if seconds < trunc { trunc - 1.0 } else { trunc };
    Ok(Value::DateEpoch {
        seconds: whole as i64,
        fraction: seconds - whole,
    })
}
