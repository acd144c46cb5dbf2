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
/// # diag - CBOR diagnostic style output for decoded items
///
/// A line-per-item dump of a CBOR document in the spirit of the diagnostic notation of
/// RFC8949 section 8: byte strings as h'..', text in double quotes, one level of
/// indentation per nesting level. Intended for tools and "dump to stdout" debugging; the
/// output follows the pre-order item stream rather than reconstructing bracket structure.
use std::boxed::Box;
use std::error::Error;
use std::io::Write;

use crate::decode::CBORDecoder;
use crate::item::{Item, Label, Mantissa, Value};

/// Trait defining a helper for conveniently displaying CBOR encoded data in diagnostic
/// format.
pub trait Diag {
    fn cbor_diag(&self, out: &mut dyn Write) -> Result<(), Box<dyn Error>>;
}

impl Diag for [u8] {
    fn cbor_diag(&self, out: &mut dyn Write) -> Result<(), Box<dyn Error>> {
        let mut decoder = CBORDecoder::from_slice(self);
        while decoder.index < self.len() {
            let item = decoder.get_next()?;
            diag_item(&item, out)?;
        }
        Ok(())
    }
}

fn diag_item(item: &Item, out: &mut dyn Write) -> Result<(), std::io::Error> {
    for _ in 0..item.nest_level {
        write!(out, "  ")?;
    }
    match item.label {
        Label::None => {}
        Label::Int(v) => write!(out, "{}: ", v)?,
        Label::UInt(v) => write!(out, "{}: ", v)?,
        Label::Tstr(s) => write!(out, "\"{}\": ", s)?,
        Label::Bstr(b) => {
            write_hex(b, out)?;
            write!(out, ": ")?;
        }
    }
    diag_value(&item.value, out)?;
    writeln!(out)
}

fn diag_value(value: &Value, out: &mut dyn Write) -> Result<(), std::io::Error> {
    match value {
        Value::None => write!(out, "none"),
        Value::UInt(v) => write!(out, "{}", v),
        Value::Int(v) => write!(out, "{}", v),
        Value::Bstr(b) => write_hex(b, out),
        Value::Tstr(s) => write!(out, "\"{}\"", s),
        Value::Array(n) => write_container(out, "[", *n),
        Value::Map(n) => write_container(out, "{", *n),
        Value::MapAsArray(n) => write_container(out, "{", *n),
        Value::PosBignum(b) => {
            write!(out, "2(")?;
            write_hex(b, out)?;
            write!(out, ")")
        }
        Value::NegBignum(b) => {
            write!(out, "3(")?;
            write_hex(b, out)?;
            write!(out, ")")
        }
        Value::DateString(s) => write!(out, "0(\"{}\")", s),
        Value::DateEpoch { seconds, fraction } => {
            if *fraction == 0.0 {
                write!(out, "1({})", seconds)
            } else {
                write!(out, "1({}.{:09})", seconds, (fraction * 1e9) as u64)
            }
        }
        Value::DaysEpoch(d) => write!(out, "100({})", d),
        Value::DaysString(s) => write!(out, "1004(\"{}\")", s),
        Value::DecimalFraction { exponent, mantissa } => {
            write!(out, "4([{}, ", exponent)?;
            diag_mantissa(mantissa, out)?;
            write!(out, "])")
        }
        Value::Bigfloat { exponent, mantissa } => {
            write!(out, "5([{}, ", exponent)?;
            diag_mantissa(mantissa, out)?;
            write!(out, "])")
        }
        Value::Simple(v) => write!(out, "simple({})", v),
        Value::False => write!(out, "false"),
        Value::True => write!(out, "true"),
        Value::Null => write!(out, "null"),
        Value::Undefined => write!(out, "undefined"),
        Value::Float(v) => write!(out, "{}", v),
        Value::Double(v) => write!(out, "{}", v),
    }
}

fn diag_mantissa(mantissa: &Mantissa, out: &mut dyn Write) -> Result<(), std::io::Error> {
    match mantissa {
        Mantissa::Int(v) => write!(out, "{}", v),
        Mantissa::PosBignum(b) => {
            write!(out, "2(")?;
            write_hex(b, out)?;
            write!(out, ")")
        }
        Mantissa::NegBignum(b) => {
            write!(out, "3(")?;
            write_hex(b, out)?;
            write!(out, ")")
        }
    }
}

fn write_container(out: &mut dyn Write, open: &str, count: u16) -> Result<(), std::io::Error> {
    if count == crate::constants::INDEFINITE_COUNT {
        write!(out, "{}_", open)
    } else {
        write!(out, "{}{}", open, count)
    }
}

fn write_hex(bytes: &[u8], out: &mut dyn Write) -> Result<(), std::io::Error> {
    write!(out, "h'")?;
    for b in bytes {
        write!(out, "{:02x}", b)?;
    }
    write!(out, "'")
}

/// Dump `bytes` as a plain hex string, sixteen bytes to the line.
pub fn print_hex(bytes: &[u8], out: &mut dyn Write) -> Result<(), std::io::Error> {
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 && i % 16 == 0 {
            writeln!(out)?;
        }
        write!(out, "{:02x} ", b)?;
    }
    writeln!(out)
}
