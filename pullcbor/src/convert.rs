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
 * pullcbor CBOR typed getter API
 *
 * A pull-based, zero-allocation deserializer for CBOR (RFC8949).
 * This implementation is designed for use in constrained systems and requires neither the Rust
 * standard library nor an allocator.
 **************************************************************************************************/
/// # Typed getters
///
/// These getters fetch the next item (or a labelled item of the entered map) and convert
/// it to the requested Rust type. All of them use the sticky error cell: once any
/// operation on the decoder has failed, they leave their output untouched and return the
/// latched error, which [`CBORDecoder::finish`] reports once at the end. This permits
/// straight-line decoding with a single error check.
///
/// The `_convert` forms take a bitmap from [`crate::constants::convert`] naming the
/// conversions the caller is willing to accept; the `_convert_all` forms additionally fold
/// bignums, decimal fractions and bigfloats.
use crate::constants::convert;
use crate::decode::CBORDecoder;
use crate::error::{CBORError, Result};
use crate::item::{Item, Mantissa, Value, ValueKind};
use crate::map::{MapQuery, SearchLabel};

impl<'buf> CBORDecoder<'buf> {
    /***********************************************************************************************
     * In-order getters
     **********************************************************************************************/

    /// Fetch the next item as an `i64`. Both integer representations are accepted;
    /// unsigned values above `i64::MAX` fail with `ConversionUnderOverFlow`.
    pub fn get_int64(&mut self, value: &mut i64) -> Result<()> {
        self.get_int64_convert(convert::XINT64, value)
    }

    /// Fetch the next item as an `i64`, allowing the conversions named in `options`.
    pub fn get_int64_convert(&mut self, options: u32, value: &mut i64) -> Result<()> {
        self.spiffy_next(value, |item| convert_int64(item, options))
    }

    /// As [`CBORDecoder::get_int64_convert`], additionally folding bignums, decimal
    /// fractions and bigfloats when their option bits are set.
    pub fn get_int64_convert_all(&mut self, options: u32, value: &mut i64) -> Result<()> {
        self.spiffy_next(value, |item| convert_all_int64(item, options))
    }

    /// Fetch the next item as a `u64`. Negative numbers fail with
    /// `NumberSignConversion`.
    pub fn get_uint64(&mut self, value: &mut u64) -> Result<()> {
        self.get_uint64_convert(convert::XINT64, value)
    }

    /// Fetch the next item as a `u64`, allowing the conversions named in `options`.
    pub fn get_uint64_convert(&mut self, options: u32, value: &mut u64) -> Result<()> {
        self.spiffy_next(value, |item| convert_uint64(item, options))
    }

    /// As [`CBORDecoder::get_uint64_convert`] with the additional folds.
    pub fn get_uint64_convert_all(&mut self, options: u32, value: &mut u64) -> Result<()> {
        self.spiffy_next(value, |item| convert_all_uint64(item, options))
    }

    /// Fetch the next item as an `f64`. Only floating point items qualify.
    pub fn get_double(&mut self, value: &mut f64) -> Result<()> {
        self.get_double_convert(0, value)
    }

    /// Fetch the next item as an `f64`, allowing the conversions named in `options`.
    pub fn get_double_convert(&mut self, options: u32, value: &mut f64) -> Result<()> {
        self.spiffy_next(value, |item| convert_double(item, options))
    }

    /// As [`CBORDecoder::get_double_convert`] with the additional folds.
    pub fn get_double_convert_all(&mut self, options: u32, value: &mut f64) -> Result<()> {
        self.spiffy_next(value, |item| convert_all_double(item, options))
    }

    /// Fetch the next item, which must be a byte string.
    pub fn get_bytes(&mut self, value: &mut &'buf [u8]) -> Result<()> {
        self.spiffy_next(value, |item| match item.value {
            Value::Bstr(b) => Ok(b),
            _ => Err(CBORError::UnexpectedType),
        })
    }

    /// Fetch the next item, which must be a text string.
    pub fn get_text(&mut self, value: &mut &'buf str) -> Result<()> {
        self.spiffy_next(value, |item| match item.value {
            Value::Tstr(s) => Ok(s),
            _ => Err(CBORError::UnexpectedType),
        })
    }

    /// Fetch the next item, which must be `true` or `false`.
    pub fn get_bool(&mut self, value: &mut bool) -> Result<()> {
        self.spiffy_next(value, |item| match item.value {
            Value::True => Ok(true),
            Value::False => Ok(false),
            _ => Err(CBORError::UnexpectedType),
        })
    }

    /// Fetch the next item, which must be a positive bignum (tag 2 over a byte string).
    pub fn get_pos_bignum(&mut self, value: &mut &'buf [u8]) -> Result<()> {
        self.spiffy_next(value, |item| match item.value {
            Value::PosBignum(b) => Ok(b),
            _ => Err(CBORError::UnexpectedType),
        })
    }

    /// Fetch the next item, which must be a negative bignum (tag 3 over a byte string).
    pub fn get_neg_bignum(&mut self, value: &mut &'buf [u8]) -> Result<()> {
        self.spiffy_next(value, |item| match item.value {
            Value::NegBignum(b) => Ok(b),
            _ => Err(CBORError::UnexpectedType),
        })
    }

    /***********************************************************************************************
     * By-label getters
     **********************************************************************************************/

    /// Fetch the entry labelled `label` of the entered map as an `i64`.
    pub fn get_int64_in_map_int(&mut self, label: i64, value: &mut i64) -> Result<()> {
        self.spiffy_in_map(SearchLabel::Int(label), value, |item| {
            convert_int64(item, convert::XINT64)
        })
    }

    /// Fetch the entry labelled `label` of the entered map as an `i64`.
    pub fn get_int64_in_map_text(&mut self, label: &str, value: &mut i64) -> Result<()> {
        self.spiffy_in_map(SearchLabel::Text(label), value, |item| {
            convert_int64(item, convert::XINT64)
        })
    }

    /// As [`CBORDecoder::get_int64_convert_all`] for a labelled entry.
    pub fn get_int64_convert_all_in_map_int(
        &mut self,
        label: i64,
        options: u32,
        value: &mut i64,
    ) -> Result<()> {
        self.spiffy_in_map(SearchLabel::Int(label), value, |item| {
            convert_all_int64(item, options)
        })
    }

    /// As [`CBORDecoder::get_int64_convert_all`] for a labelled entry.
    pub fn get_int64_convert_all_in_map_text(
        &mut self,
        label: &str,
        options: u32,
        value: &mut i64,
    ) -> Result<()> {
        self.spiffy_in_map(SearchLabel::Text(label), value, |item| {
            convert_all_int64(item, options)
        })
    }

    /// Fetch the entry labelled `label` of the entered map as a `u64`.
    pub fn get_uint64_in_map_int(&mut self, label: i64, value: &mut u64) -> Result<()> {
        self.spiffy_in_map(SearchLabel::Int(label), value, |item| {
            convert_uint64(item, convert::XINT64)
        })
    }

    /// Fetch the entry labelled `label` of the entered map as a `u64`.
    pub fn get_uint64_in_map_text(&mut self, label: &str, value: &mut u64) -> Result<()> {
        self.spiffy_in_map(SearchLabel::Text(label), value, |item| {
            convert_uint64(item, convert::XINT64)
        })
    }

    /// As [`CBORDecoder::get_uint64_convert_all`] for a labelled entry.
    pub fn get_uint64_convert_all_in_map_int(
        &mut self,
        label: i64,
        options: u32,
        value: &mut u64,
    ) -> Result<()> {
        self.spiffy_in_map(SearchLabel::Int(label), value, |item| {
            convert_all_uint64(item, options)
        })
    }

    /// As [`CBORDecoder::get_uint64_convert_all`] for a labelled entry.
    pub fn get_uint64_convert_all_in_map_text(
        &mut self,
        label: &str,
        options: u32,
        value: &mut u64,
    ) -> Result<()> {
        self.spiffy_in_map(SearchLabel::Text(label), value, |item| {
            convert_all_uint64(item, options)
        })
    }

    /// Fetch the entry labelled `label` of the entered map as an `f64`.
    pub fn get_double_in_map_int(&mut self, label: i64, value: &mut f64) -> Result<()> {
        self.spiffy_in_map(SearchLabel::Int(label), value, |item| convert_double(item, 0))
    }

    /// Fetch the entry labelled `label` of the entered map as an `f64`.
    pub fn get_double_in_map_text(&mut self, label: &str, value: &mut f64) -> Result<()> {
        self.spiffy_in_map(SearchLabel::Text(label), value, |item| convert_double(item, 0))
    }

    /// As [`CBORDecoder::get_double_convert_all`] for a labelled entry.
    pub fn get_double_convert_all_in_map_int(
        &mut self,
        label: i64,
        options: u32,
        value: &mut f64,
    ) -> Result<()> {
        self.spiffy_in_map(SearchLabel::Int(label), value, |item| {
            convert_all_double(item, options)
        })
    }

    /// As [`CBORDecoder::get_double_convert_all`] for a labelled entry.
    pub fn get_double_convert_all_in_map_text(
        &mut self,
        label: &str,
        options: u32,
        value: &mut f64,
    ) -> Result<()> {
        self.spiffy_in_map(SearchLabel::Text(label), value, |item| {
            convert_all_double(item, options)
        })
    }

    /// Fetch the entry labelled `label` of the entered map as a byte string.
    pub fn get_bytes_in_map_int(&mut self, label: i64, value: &mut &'buf [u8]) -> Result<()> {
        self.spiffy_in_map(SearchLabel::Int(label), value, |item| match item.value {
            Value::Bstr(b) => Ok(b),
            _ => Err(CBORError::UnexpectedType),
        })
    }

    /// Fetch the entry labelled `label` of the entered map as a byte string.
    pub fn get_bytes_in_map_text(&mut self, label: &str, value: &mut &'buf [u8]) -> Result<()> {
        self.spiffy_in_map(SearchLabel::Text(label), value, |item| match item.value {
            Value::Bstr(b) => Ok(b),
            _ => Err(CBORError::UnexpectedType),
        })
    }

    /// Fetch the entry labelled `label` of the entered map as a text string.
    pub fn get_text_in_map_int(&mut self, label: i64, value: &mut &'buf str) -> Result<()> {
        self.spiffy_in_map(SearchLabel::Int(label), value, |item| match item.value {
            Value::Tstr(s) => Ok(s),
            _ => Err(CBORError::UnexpectedType),
        })
    }

    /// Fetch the entry labelled `label` of the entered map as a text string.
    pub fn get_text_in_map_text(&mut self, label: &str, value: &mut &'buf str) -> Result<()> {
        self.spiffy_in_map(SearchLabel::Text(label), value, |item| match item.value {
            Value::Tstr(s) => Ok(s),
            _ => Err(CBORError::UnexpectedType),
        })
    }

    /// Fetch the entry labelled `label` of the entered map as a bool.
    pub fn get_bool_in_map_int(&mut self, label: i64, value: &mut bool) -> Result<()> {
        self.spiffy_in_map(SearchLabel::Int(label), value, |item| match item.value {
            Value::True => Ok(true),
            Value::False => Ok(false),
            _ => Err(CBORError::UnexpectedType),
        })
    }

    /// Fetch the entry labelled `label` of the entered map as a bool.
    pub fn get_bool_in_map_text(&mut self, label: &str, value: &mut bool) -> Result<()> {
        self.spiffy_in_map(SearchLabel::Text(label), value, |item| match item.value {
            Value::True => Ok(true),
            Value::False => Ok(false),
            _ => Err(CBORError::UnexpectedType),
        })
    }

    /***********************************************************************************************
     * Getter plumbing
     **********************************************************************************************/

    /// Fetch the next item and convert it, honouring the sticky error discipline: the
    /// output is only written on success.
    fn spiffy_next<T>(
        &mut self,
        out: &mut T,
        convert: impl FnOnce(&Item<'buf>) -> Result<T>,
    ) -> Result<()> {
        self.guard()?;
        let fetched = match self.next_in_order(None) {
            Ok((item, _)) => convert(&item),
            Err(e) => Err(e),
        };
        match fetched {
            Ok(v) => {
                *out = v;
                Ok(())
            }
            Err(e) => Err(self.latch(e)),
        }
    }

    /// Look a label up in the entered map and convert the found item. A missing label is
    /// reported but not latched.
    fn spiffy_in_map<T>(
        &mut self,
        label: SearchLabel<'_>,
        out: &mut T,
        convert: impl FnOnce(&Item<'buf>) -> Result<T>,
    ) -> Result<()> {
        self.guard()?;
        let mut queries = [MapQuery::new(label, ValueKind::Any)];
        let found = match self.search_one(&mut queries) {
            Ok(item) => item,
            Err(e) => return Err(e),
        };
        match convert(&found) {
            Ok(v) => {
                *out = v;
                Ok(())
            }
            Err(e) => Err(self.latch(e)),
        }
    }
}

/***************************************************************************************************
 * Conversion helpers
 **************************************************************************************************/

fn convert_int64(item: &Item, options: u32) -> Result<i64> {
    match item.value {
        Value::Int(v) if options & convert::INT64 != 0 => Ok(v),
        Value::UInt(v) if options & convert::UINT64 != 0 => {
            if v <= i64::MAX as u64 {
                Ok(v as i64)
            } else {
                Err(CBORError::ConversionUnderOverFlow)
            }
        }
        Value::Double(d) if options & convert::FLOAT != 0 => float_to_int64(d),
        Value::Float(f) if options & convert::FLOAT != 0 => float_to_int64(f as f64),
        _ => Err(CBORError::UnexpectedType),
    }
}

fn convert_all_int64(item: &Item, options: u32) -> Result<i64> {
    match convert_int64(item, options) {
        Err(CBORError::UnexpectedType) => {}
        done => return done,
    }
    match item.value {
        Value::PosBignum(b) if options & convert::BIGNUM != 0 => {
            let v = bignum_to_u64(b)?;
            if v <= i64::MAX as u64 {
                Ok(v as i64)
            } else {
                Err(CBORError::ConversionUnderOverFlow)
            }
        }
        Value::NegBignum(b) if options & convert::BIGNUM != 0 => {
            let v = bignum_to_u64(b)?;
            if v <= i64::MAX as u64 {
                Ok(-1 - (v as i64))
            } else {
                Err(CBORError::ConversionUnderOverFlow)
            }
        }
        Value::DecimalFraction { exponent, mantissa }
            if options & convert::DECIMAL_FRACTION != 0 =>
        {
            exponentiate_int(mantissa, exponent, 10)
        }
        Value::Bigfloat { exponent, mantissa } if options & convert::BIGFLOAT != 0 => {
            exponentiate_int(mantissa, exponent, 2)
        }
        _ => Err(CBORError::UnexpectedType),
    }
}

fn convert_uint64(item: &Item, options: u32) -> Result<u64> {
    match item.value {
        Value::UInt(v) if options & convert::UINT64 != 0 => Ok(v),
        Value::Int(v) if options & convert::INT64 != 0 => {
            if v >= 0 {
                Ok(v as u64)
            } else {
                Err(CBORError::NumberSignConversion)
            }
        }
        Value::Double(d) if options & convert::FLOAT != 0 => float_to_uint64(d),
        Value::Float(f) if options & convert::FLOAT != 0 => float_to_uint64(f as f64),
        _ => Err(CBORError::UnexpectedType),
    }
}

fn convert_all_uint64(item: &Item, options: u32) -> Result<u64> {
    match convert_uint64(item, options) {
        Err(CBORError::UnexpectedType) => {}
        done => return done,
    }
    match item.value {
        Value::PosBignum(b) if options & convert::BIGNUM != 0 => bignum_to_u64(b),
        Value::NegBignum(_) if options & convert::BIGNUM != 0 => {
            Err(CBORError::NumberSignConversion)
        }
        Value::DecimalFraction { exponent, mantissa }
            if options & convert::DECIMAL_FRACTION != 0 =>
        {
            let v = exponentiate_int(mantissa, exponent, 10)?;
            if v >= 0 {
                Ok(v as u64)
            } else {
                Err(CBORError::NumberSignConversion)
            }
        }
        Value::Bigfloat { exponent, mantissa } if options & convert::BIGFLOAT != 0 => {
            let v = exponentiate_int(mantissa, exponent, 2)?;
            if v >= 0 {
                Ok(v as u64)
            } else {
                Err(CBORError::NumberSignConversion)
            }
        }
        _ => Err(CBORError::UnexpectedType),
    }
}

fn convert_double(item: &Item, options: u32) -> Result<f64> {
    match item.value {
        Value::Double(d) => Ok(d),
        Value::Float(f) => Ok(f as f64),
        Value::UInt(v) if options & convert::UINT64 != 0 => Ok(v as f64),
        Value::Int(v) if options & convert::INT64 != 0 => Ok(v as f64),
        _ => Err(CBORError::UnexpectedType),
    }
}

fn convert_all_double(item: &Item, options: u32) -> Result<f64> {
    match convert_double(item, options) {
        Err(CBORError::UnexpectedType) => {}
        done => return done,
    }
    match item.value {
        Value::PosBignum(b) if options & convert::BIGNUM != 0 => Ok(bignum_to_f64(b)),
        Value::NegBignum(b) if options & convert::BIGNUM != 0 => Ok(-1.0 - bignum_to_f64(b)),
        Value::DecimalFraction { exponent, mantissa }
            if options & convert::DECIMAL_FRACTION != 0 =>
        {
            Ok(mantissa_to_f64(mantissa) * pow_f64(10.0, exponent))
        }
        Value::Bigfloat { exponent, mantissa } if options & convert::BIGFLOAT != 0 => {
            Ok(mantissa_to_f64(mantissa) * pow_f64(2.0, exponent))
        }
        _ => Err(CBORError::UnexpectedType),
    }
}

// The f64 bound is the smallest power of two above i64::MAX / u64::MAX respectively.
const I64_RANGE: f64 = 9_223_372_036_854_775_808.0;
const U64_RANGE: f64 = 18_446_744_073_709_551_616.0;

fn float_to_int64(v: f64) -> Result<i64> {
    if !v.is_finite() {
        return Err(CBORError::ConversionUnderOverFlow);
    }
    let r = round_half_away(v);
    if r >= I64_RANGE || r < -I64_RANGE {
        Err(CBORError::ConversionUnderOverFlow)
    } else {
        Ok(r as i64)
    }
}

fn float_to_uint64(v: f64) -> Result<u64> {
    if !v.is_finite() {
        return Err(CBORError::ConversionUnderOverFlow);
    }
    let r = round_half_away(v);
    if r < 0.0 {
        Err(CBORError::NumberSignConversion)
    } else if r >= U64_RANGE {
        Err(CBORError::ConversionUnderOverFlow)
    } else {
        Ok(r as u64)
    }
}

/// Round to nearest, halves away from zero. Open coded since `core` has no float rounding;
/// callers bound the magnitude afterwards, and values beyond 2^63 are already integral.
fn round_half_away(v: f64) -> f64 {
    if v >= I64_RANGE || v <= -I64_RANGE {
        return v;
    }
    let adjusted = if v >= 0.0 { v + 0.5 } else { v - 0.5 };
    adjusted as i64 as f64
}

fn mantissa_to_i64(mantissa: Mantissa) -> Result<i64> {
    match mantissa {
        Mantissa::Int(v) => Ok(v),
        Mantissa::PosBignum(b) => {
            let v = bignum_to_u64(b)?;
            if v <= i64::MAX as u64 {
                Ok(v as i64)
            } else {
                Err(CBORError::ConversionUnderOverFlow)
            }
        }
        Mantissa::NegBignum(b) => {
            let v = bignum_to_u64(b)?;
            if v <= i64::MAX as u64 {
                Ok(-1 - (v as i64))
            } else {
                Err(CBORError::ConversionUnderOverFlow)
            }
        }
    }
}

fn mantissa_to_f64(mantissa: Mantissa) -> f64 {
    match mantissa {
        Mantissa::Int(v) => v as f64,
        Mantissa::PosBignum(b) => bignum_to_f64(b),
        Mantissa::NegBignum(b) => -1.0 - bignum_to_f64(b),
    }
}

/// mantissa * base^exponent with overflow checking. Negative exponents divide with
/// truncation.
fn exponentiate_int(mantissa: Mantissa, exponent: i64, base: i64) -> Result<i64> {
    let mut v = mantissa_to_i64(mantissa)?;
    if v == 0 {
        return Ok(0);
    }
    if exponent >= 0 {
        for _ in 0..exponent {
            v = v.checked_mul(base).ok_or(CBORError::ConversionUnderOverFlow)?;
        }
    } else {
        for _ in 0..exponent.unsigned_abs() {
            v /= base;
            if v == 0 {
                break;
            }
        }
    }
    Ok(v)
}

/// Fold a big-endian bignum into a `u64`. Values needing more than eight significant
/// bytes do not fit.
fn bignum_to_u64(bytes: &[u8]) -> Result<u64> {
    let significant = match bytes.iter().position(|&b| b != 0) {
        Some(i) => &bytes[i..],
        None => return Ok(0),
    };
    if significant.len() > 8 {
        return Err(CBORError::ConversionUnderOverFlow);
    }
    let mut v = 0u64;
    for &b in significant {
        v = (v << 8) | b as u64;
    }
    Ok(v)
}

fn bignum_to_f64(bytes: &[u8]) -> f64 {
    let mut v = 0.0f64;
    for &b in bytes {
        v = v * 256.0 + b as f64;
    }
    v
}

/// base^exponent by squaring; `core` has no `powi`.
fn pow_f64(base: f64, exponent: i64) -> f64 {
    let mut result = 1.0f64;
    let mut factor = base;
    let mut n = exponent.unsigned_abs();
    while n > 0 {
        if n & 1 == 1 {
            result *= factor;
        }
        factor *= factor;
        n >>= 1;
    }
    if exponent < 0 {
        1.0 / result
    } else {
        result
    }
}
