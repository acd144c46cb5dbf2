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
 * pullcbor CBOR item record
 *
 * A pull-based, zero-allocation deserializer for CBOR (RFC8949).
 * This implementation is designed for use in constrained systems and requires neither the Rust
 * standard library nor an allocator.
 **************************************************************************************************/
use crate::constants::INDEFINITE_COUNT;
use crate::error::CBORError;

use std::convert::TryFrom;

#[cfg(feature = "full")]
use chrono::{DateTime, FixedOffset, TimeZone, Utc};

#[cfg(feature = "trace")]
use func_trace::trace;

#[cfg(feature = "trace")]
func_trace::init_depth_var!();

/// The mantissa of a decimal fraction or bigfloat. Small mantissas are carried as an `i64`;
/// anything wider stays as a borrowed bignum slice.
#[derive(PartialEq, Debug, Copy, Clone)]
pub enum Mantissa<'buf> {
    Int(i64),
    PosBignum(&'buf [u8]),
    NegBignum(&'buf [u8]),
}

/// The type and value of one decoded CBOR item. Items may borrow immutably from the decode
/// buffer (or from the configured string storage), which must therefore outlive the item
/// itself - this is the `'buf` lifetime.
///
/// Representations:
///
/// - Unsigned integers are a `u64`; negative integers are carried as their `i64` value, so
///   negative values below `i64::MIN` are reported as an overflow rather than decoded.
/// - The bstr and tstr types are immutable borrowed slices.
/// - Arrays and maps carry only their entry count; contents follow in pre-order. Maps count
///   label/value pairs, except in map-as-array mode where the count is the number of items.
///   [`INDEFINITE_COUNT`] stands for an indefinite length container.
/// - The date, bignum, decimal fraction and bigfloat variants are produced by folding the
///   corresponding built-in tags.
#[derive(PartialEq, Debug, Copy, Clone)]
pub enum Value<'buf> {
    /// Produced only for map query entries whose label was not found.
    None,
    UInt(u64),
    Int(i64),
    Bstr(&'buf [u8]),
    Tstr(&'buf str),
    Array(u16),
    Map(u16),
    MapAsArray(u16),
    PosBignum(&'buf [u8]),
    NegBignum(&'buf [u8]),
    DateString(&'buf str),
    DateEpoch { seconds: i64, fraction: f64 },
    DaysEpoch(i64),
    DaysString(&'buf str),
    DecimalFraction { exponent: i64, mantissa: Mantissa<'buf> },
    Bigfloat { exponent: i64, mantissa: Mantissa<'buf> },
    Simple(u8),
    False,
    True,
    Null,
    Undefined,
    Float(f32),
    Double(f64),
}

/// The label attached to an item decoded inside a map. Integer and string labels are the
/// interoperable choices; byte string labels are legal CBOR and surface as `Bstr`.
#[derive(PartialEq, Debug, Copy, Clone)]
pub enum Label<'buf> {
    None,
    Int(i64),
    UInt(u64),
    Bstr(&'buf [u8]),
    Tstr(&'buf str),
}

/// The type of a [`Value`] without its payload, used to express type expectations in map
/// queries. `Any` matches every type.
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub enum ValueKind {
    Any,
    None,
    UInt,
    Int,
    Bstr,
    Tstr,
    Array,
    Map,
    MapAsArray,
    PosBignum,
    NegBignum,
    DateString,
    DateEpoch,
    DaysEpoch,
    DaysString,
    DecimalFraction,
    Bigfloat,
    Simple,
    False,
    True,
    Null,
    Undefined,
    Float,
    Double,
}

impl<'buf> Value<'buf> {
    /// The [`ValueKind`] of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::None => ValueKind::None,
            Value::UInt(_) => ValueKind::UInt,
            Value::Int(_) => ValueKind::Int,
            Value::Bstr(_) => ValueKind::Bstr,
            Value::Tstr(_) => ValueKind::Tstr,
            Value::Array(_) => ValueKind::Array,
            Value::Map(_) => ValueKind::Map,
            Value::MapAsArray(_) => ValueKind::MapAsArray,
            Value::PosBignum(_) => ValueKind::PosBignum,
            Value::NegBignum(_) => ValueKind::NegBignum,
            Value::DateString(_) => ValueKind::DateString,
            Value::DateEpoch { .. } => ValueKind::DateEpoch,
            Value::DaysEpoch(_) => ValueKind::DaysEpoch,
            Value::DaysString(_) => ValueKind::DaysString,
            Value::DecimalFraction { .. } => ValueKind::DecimalFraction,
            Value::Bigfloat { .. } => ValueKind::Bigfloat,
            Value::Simple(_) => ValueKind::Simple,
            Value::False => ValueKind::False,
            Value::True => ValueKind::True,
            Value::Null => ValueKind::Null,
            Value::Undefined => ValueKind::Undefined,
            Value::Float(_) => ValueKind::Float,
            Value::Double(_) => ValueKind::Double,
        }
    }

    /// Return `true` for arrays and maps, whichever way the map is being surfaced.
    #[inline]
    pub fn is_container(&self) -> bool {
        matches!(self, Value::Array(_) | Value::Map(_) | Value::MapAsArray(_))
    }

    /// The entry count of a container value, or `None` for any other type.
    pub fn container_count(&self) -> Option<u16> {
        match self {
            Value::Array(n) | Value::Map(n) | Value::MapAsArray(n) => Some(*n),
            _ => None,
        }
    }

    /// Return `true` for a container value of indefinite length.
    #[inline]
    pub fn is_indefinite(&self) -> bool {
        self.container_count() == Some(INDEFINITE_COUNT)
    }
}

/// One decoded CBOR item: its typed value, the label it carried if it was decoded inside a
/// map, its position in the nesting tree and the tags that preceded it.
///
/// `next_nest_level` is never greater than `nest_level`: when it is lower, this item was the
/// last one in an array or map and closed out at least one nesting level.
#[derive(PartialEq, Debug, Copy, Clone)]
pub struct Item<'buf> {
    /// The type and value of the item.
    pub value: Value<'buf>,
    /// The label the item carried, or `Label::None` outside of maps.
    pub label: Label<'buf>,
    /// Nesting depth of the item. 0 is the top level with no arrays or maps entered.
    pub nest_level: u8,
    /// Nesting depth of the item that follows.
    pub next_nest_level: u8,
    /// Set when the value slice was produced by the string storage rather than borrowed from
    /// the input buffer.
    pub data_allocated: bool,
    /// Like `data_allocated`, but for the label.
    pub label_allocated: bool,
    /// Bitmap over the decoder's tag table recording the tags seen on this item. See
    /// [`crate::decode::CBORDecoder::is_tagged`].
    pub tag_bits: u64,
}

impl<'buf> Item<'buf> {
    /// An item conveying no value; used to pre-fill map query results.
    pub fn none() -> Self {
        Item {
            value: Value::None,
            label: Label::None,
            nest_level: 0,
            next_nest_level: 0,
            data_allocated: false,
            label_allocated: false,
            tag_bits: 0,
        }
    }

    /// The number of nesting levels this item closed.
    #[inline]
    pub fn levels_closed(&self) -> u8 {
        self.nest_level - self.next_nest_level
    }
}

/***************************************************************************************************
 * Standard Trait Implementations: Try to convert an Item into a value. Always fallible
 **************************************************************************************************/

/// Attempt to convert an Item into bool
impl<'buf> TryFrom<&Item<'buf>> for bool {
    type Error = CBORError;

    #[cfg_attr(feature = "trace", trace)]
    fn try_from(item: &Item<'buf>) -> core::result::Result<Self, Self::Error> {
        match item.value {
            Value::True => Ok(true),
            Value::False => Ok(false),
            _ => Err(CBORError::UnexpectedType),
        }
    }
}

/// Attempt to convert an Item into u64
impl<'buf> TryFrom<&Item<'buf>> for u64 {
    type Error = CBORError;

    #[cfg_attr(feature = "trace", trace)]
    fn try_from(item: &Item<'buf>) -> core::result::Result<Self, Self::Error> {
        match item.value {
            Value::UInt(v) => Ok(v),
            Value::Int(v) if v >= 0 => Ok(v as u64),
            Value::Int(_) => Err(CBORError::NumberSignConversion),
            _ => Err(CBORError::UnexpectedType),
        }
    }
}

/// Attempt to convert an Item into i64
///
/// This will fail for unsigned values above `i64::MAX`.
impl<'buf> TryFrom<&Item<'buf>> for i64 {
    type Error = CBORError;

    #[cfg_attr(feature = "trace", trace)]
    fn try_from(item: &Item<'buf>) -> core::result::Result<Self, Self::Error> {
        match item.value {
            Value::Int(v) => Ok(v),
            Value::UInt(v) => {
                if v <= i64::MAX as u64 {
                    Ok(v as i64)
                } else {
                    Err(CBORError::ConversionUnderOverFlow)
                }
            }
            _ => Err(CBORError::UnexpectedType),
        }
    }
}

/// Attempt to convert an Item into f64. Integers widen; this is the one lossy conversion the
/// item record allows directly.
impl<'buf> TryFrom<&Item<'buf>> for f64 {
    type Error = CBORError;

    #[cfg_attr(feature = "trace", trace)]
    fn try_from(item: &Item<'buf>) -> core::result::Result<Self, Self::Error> {
        match item.value {
            Value::Double(v) => Ok(v),
            Value::Float(v) => Ok(v as f64),
            Value::UInt(v) => Ok(v as f64),
            Value::Int(v) => Ok(v as f64),
            _ => Err(CBORError::UnexpectedType),
        }
    }
}

/// Attempt to convert an Item into a &[u8]
///
/// # Lifetime
///
/// The lifetime of the `&[u8]` is that of the underlying buffer the item was decoded from.
impl<'buf> TryFrom<&Item<'buf>> for &'buf [u8] {
    type Error = CBORError;

    #[cfg_attr(feature = "trace", trace)]
    fn try_from(item: &Item<'buf>) -> core::result::Result<Self, Self::Error> {
        match item.value {
            Value::Bstr(bytes) => Ok(bytes),
            _ => Err(CBORError::UnexpectedType),
        }
    }
}

/// Attempt to convert an Item into a &str
///
/// # Lifetime
///
/// The lifetime of the `&str` is that of the underlying buffer the item was decoded from.
impl<'buf> TryFrom<&Item<'buf>> for &'buf str {
    type Error = CBORError;

    #[cfg_attr(feature = "trace", trace)]
    fn try_from(item: &Item<'buf>) -> core::result::Result<Self, Self::Error> {
        match item.value {
            Value::Tstr(s) => Ok(s),
            _ => Err(CBORError::UnexpectedType),
        }
    }
}

/***************************************************************************************************
 * Date handling (std only)
 **************************************************************************************************/

#[cfg(feature = "full")]
impl<'buf> Item<'buf> {
    /// Parse a `DateString` item (tag 0 content) into a `chrono` date/time.
    pub fn as_date_time(&self) -> crate::error::Result<DateTime<FixedOffset>> {
        match self.value {
            Value::DateString(s) => {
                DateTime::parse_from_rfc3339(s).map_err(|_| CBORError::DateOverflow)
            }
            _ => Err(CBORError::UnexpectedType),
        }
    }

    /// Convert a `DateEpoch` item (tag 1 content) into a `chrono` date/time. The fractional
    /// part is carried over at nanosecond granularity.
    pub fn as_epoch_date_time(&self) -> crate::error::Result<DateTime<Utc>> {
        match self.value {
            Value::DateEpoch { seconds, fraction } => {
                let nanos = (fraction * 1_000_000_000.0) as u32;
                Utc.timestamp_opt(seconds, nanos)
                    .single()
                    .ok_or(CBORError::DateOverflow)
            }
            _ => Err(CBORError::UnexpectedType),
        }
    }
}
