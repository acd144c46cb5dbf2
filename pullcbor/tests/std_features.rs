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
 * Test cases for the std-only extras: chrono date conversion and diagnostic output
 **************************************************************************************************/
#![cfg(feature = "full")]

extern crate pullcbor;

use chrono::{Datelike, Timelike};

use pullcbor::debug::{print_hex, Diag};
use pullcbor::decoder::CBORDecoder;
use pullcbor::error::CBORError;

#[test]
fn date_string_to_chrono() {
    println!("<======================= date_string_to_chrono =====================>");
    let mut bytes = vec![0xc0, 0x74];
    bytes.extend_from_slice(b"2013-03-21T20:04:00Z");
    let mut decoder = CBORDecoder::from_slice(&bytes);
    let item = decoder.get_next().unwrap();
    let date = item.as_date_time().unwrap();
    assert_eq!(date.year(), 2013);
    assert_eq!(date.month(), 3);
    assert_eq!(date.day(), 21);
    assert_eq!(date.hour(), 20);
    assert_eq!(date.minute(), 4);
}

#[test]
fn epoch_date_to_chrono() {
    // 1(1363896240)
    let bytes: &[u8] = &[0xc1, 0x1a, 0x51, 0x4b, 0x67, 0xb0];
    let mut decoder = CBORDecoder::from_slice(bytes);
    let item = decoder.get_next().unwrap();
    let date = item.as_epoch_date_time().unwrap();
    assert_eq!(date.timestamp(), 1363896240);
    assert_eq!(date.year(), 2013);
}

#[test]
fn date_conversion_type_checks() {
    let bytes: &[u8] = &[0x01];
    let mut decoder = CBORDecoder::from_slice(bytes);
    let item = decoder.get_next().unwrap();
    assert_eq!(item.as_date_time(), Err(CBORError::UnexpectedType));
    assert_eq!(item.as_epoch_date_time(), Err(CBORError::UnexpectedType));
}

#[test]
fn diagnostic_dump() {
    println!("<======================= diagnostic_dump =====================>");
    // {"a": 1, "b": [2, h'0304']}
    let bytes: &[u8] = &[
        0xa2, 0x61, 0x61, 0x01, 0x61, 0x62, 0x82, 0x02, 0x42, 0x03, 0x04,
    ];
    let mut out = Vec::new();
    bytes.cbor_diag(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    println!("{}", text);
    assert!(text.contains("{2"));
    assert!(text.contains("\"a\": 1"));
    assert!(text.contains("\"b\": [2"));
    assert!(text.contains("h'0304'"));
}

#[test]
fn diagnostic_dump_tags_and_floats() {
    // [1(1563212431), 4([-2, 27315]), 1.5]
    let bytes: &[u8] = &[
        0x83, 0xc1, 0x1a, 0x5d, 0x2c, 0x4a, 0x8f, 0xc4, 0x82, 0x21, 0x19, 0x6a, 0xb3, 0xf9,
        0x3e, 0x00,
    ];
    let mut out = Vec::new();
    bytes.cbor_diag(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    println!("{}", text);
    assert!(text.contains("1(1563212431)"));
    assert!(text.contains("4([-2, 27315])"));
    assert!(text.contains("1.5"));
}

#[test]
fn hex_dump() {
    let mut out = Vec::new();
    print_hex(&[0x01, 0xab, 0xff], &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.trim(), "01 ab ff");
}
