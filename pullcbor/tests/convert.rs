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
 * Test cases for the typed getters and their numeric conversions
 **************************************************************************************************/

extern crate pullcbor;

use pullcbor::decoder::{convert, CBORDecoder};
use pullcbor::error::CBORError;

#[test]
fn get_integers() {
    println!("<======================= get_integers =====================>");
    let mut v = 0i64;
    let mut decoder = CBORDecoder::from_slice(&[0x01]);
    decoder.get_int64(&mut v).unwrap();
    assert_eq!(v, 1);

    let mut decoder = CBORDecoder::from_slice(&[0x20]);
    decoder.get_int64(&mut v).unwrap();
    assert_eq!(v, -1);

    let mut u = 0u64;
    let mut decoder = CBORDecoder::from_slice(&[0x19, 0x03, 0xe8]);
    decoder.get_uint64(&mut u).unwrap();
    assert_eq!(u, 1000);
}

#[test]
fn integer_range_violations() {
    println!("<======================= integer_range_violations =====================>");
    // u64::MAX does not fit an i64
    let bytes: &[u8] = &[0x1b, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff];
    let mut v = 17i64;
    let mut decoder = CBORDecoder::from_slice(bytes);
    assert_eq!(
        decoder.get_int64(&mut v),
        Err(CBORError::ConversionUnderOverFlow)
    );
    // The output stays untouched and the error sticks
    assert_eq!(v, 17);
    assert_eq!(decoder.get_error(), Some(CBORError::ConversionUnderOverFlow));

    // A negative number has no unsigned representation
    let mut u = 9u64;
    let mut decoder = CBORDecoder::from_slice(&[0x20]);
    assert_eq!(
        decoder.get_uint64(&mut u),
        Err(CBORError::NumberSignConversion)
    );
    assert_eq!(u, 9);
}

#[test]
fn get_int64_from_float() {
    // 3.14 rounds to 3 when float conversion is allowed
    let bytes: &[u8] = &[0xfb, 0x40, 0x09, 0x1e, 0xb8, 0x51, 0xeb, 0x85, 0x1f];
    let mut v = 0i64;
    let mut decoder = CBORDecoder::from_slice(bytes);
    decoder
        .get_int64_convert(convert::XINT64 | convert::FLOAT, &mut v)
        .unwrap();
    assert_eq!(v, 3);

    // Without the float option the type is refused
    let mut decoder = CBORDecoder::from_slice(bytes);
    assert_eq!(
        decoder.get_int64_convert(convert::XINT64, &mut v),
        Err(CBORError::UnexpectedType)
    );

    // -2.5 rounds away from zero
    let bytes: &[u8] = &[0xfb, 0xc0, 0x04, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
    let mut decoder = CBORDecoder::from_slice(bytes);
    decoder
        .get_int64_convert(convert::FLOAT, &mut v)
        .unwrap();
    assert_eq!(v, -3);
}

#[test]
fn convert_all_folds_bignums() {
    println!("<======================= convert_all_folds_bignums =====================>");
    // 2(h'0100') is 256
    let bytes: &[u8] = &[0xc2, 0x42, 0x01, 0x00];
    let mut v = 0i64;
    let mut decoder = CBORDecoder::from_slice(bytes);
    decoder
        .get_int64_convert_all(convert::XINT64 | convert::BIGNUM, &mut v)
        .unwrap();
    assert_eq!(v, 256);

    // 3(h'0100') is -257
    let bytes: &[u8] = &[0xc3, 0x42, 0x01, 0x00];
    let mut decoder = CBORDecoder::from_slice(bytes);
    decoder
        .get_int64_convert_all(convert::XINT64 | convert::BIGNUM, &mut v)
        .unwrap();
    assert_eq!(v, -257);

    // A nine byte bignum with a significant top byte does not fit
    let bytes: &[u8] = &[
        0xc2, 0x49, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ];
    let mut decoder = CBORDecoder::from_slice(bytes);
    assert_eq!(
        decoder.get_int64_convert_all(convert::BIGNUM, &mut v),
        Err(CBORError::ConversionUnderOverFlow)
    );

    // Unsigned: a negative bignum refuses sign conversion
    let bytes: &[u8] = &[0xc3, 0x42, 0x01, 0x00];
    let mut u = 0u64;
    let mut decoder = CBORDecoder::from_slice(bytes);
    assert_eq!(
        decoder.get_uint64_convert_all(convert::BIGNUM, &mut u),
        Err(CBORError::NumberSignConversion)
    );
}

#[test]
fn convert_all_folds_decimal_fractions() {
    println!("<======================= convert_all_folds_decimal_fractions =====================>");
    // 4([2, 3]) is 300
    let bytes: &[u8] = &[0xc4, 0x82, 0x02, 0x03];
    let mut v = 0i64;
    let mut decoder = CBORDecoder::from_slice(bytes);
    decoder
        .get_int64_convert_all(convert::DECIMAL_FRACTION, &mut v)
        .unwrap();
    assert_eq!(v, 300);

    // 5([3, 21]) is 21 * 2^3
    let bytes: &[u8] = &[0xc5, 0x82, 0x03, 0x15];
    let mut decoder = CBORDecoder::from_slice(bytes);
    decoder
        .get_int64_convert_all(convert::BIGFLOAT, &mut v)
        .unwrap();
    assert_eq!(v, 168);

    // Overflow in the exponentiation is caught
    let bytes: &[u8] = &[0xc4, 0x82, 0x18, 0x20, 0x03];
    let mut decoder = CBORDecoder::from_slice(bytes);
    assert_eq!(
        decoder.get_int64_convert_all(convert::DECIMAL_FRACTION, &mut v),
        Err(CBORError::ConversionUnderOverFlow)
    );

    // As a double, 4([-2, 27315]) is 273.15
    let bytes: &[u8] = &[0xc4, 0x82, 0x21, 0x19, 0x6a, 0xb3];
    let mut d = 0.0f64;
    let mut decoder = CBORDecoder::from_slice(bytes);
    decoder
        .get_double_convert_all(convert::DECIMAL_FRACTION, &mut d)
        .unwrap();
    assert!((d - 273.15).abs() < 1e-9);
}

#[test]
fn get_double_conversions() {
    let mut d = 0.0f64;
    let bytes: &[u8] = &[0xfb, 0x3f, 0xf1, 0x99, 0x99, 0x99, 0x99, 0x99, 0x9a];
    let mut decoder = CBORDecoder::from_slice(bytes);
    decoder.get_double(&mut d).unwrap();
    assert_eq!(d, 1.1);

    // Integers only widen when asked to
    let mut decoder = CBORDecoder::from_slice(&[0x0a]);
    assert_eq!(decoder.get_double(&mut d), Err(CBORError::UnexpectedType));
    let mut decoder = CBORDecoder::from_slice(&[0x0a]);
    decoder
        .get_double_convert(convert::XINT64, &mut d)
        .unwrap();
    assert_eq!(d, 10.0);

    // Half precision arrives as a double
    let mut decoder = CBORDecoder::from_slice(&[0xf9, 0x3e, 0x00]);
    decoder.get_double(&mut d).unwrap();
    assert_eq!(d, 1.5);
}

#[test]
fn get_strings_and_bools() {
    println!("<======================= get_strings_and_bools =====================>");
    let mut bytes_out: &[u8] = &[];
    let mut decoder = CBORDecoder::from_slice(&[0x44, 0x01, 0x02, 0x03, 0x04]);
    decoder.get_bytes(&mut bytes_out).unwrap();
    assert_eq!(bytes_out, &[1, 2, 3, 4]);

    let mut text: &str = "";
    let mut decoder = CBORDecoder::from_slice(&[0x64, 0x49, 0x45, 0x54, 0x46]);
    decoder.get_text(&mut text).unwrap();
    assert_eq!(text, "IETF");

    let mut flag = false;
    let mut decoder = CBORDecoder::from_slice(&[0xf5]);
    decoder.get_bool(&mut flag).unwrap();
    assert!(flag);

    // Type confusion is refused
    let mut decoder = CBORDecoder::from_slice(&[0x64, 0x49, 0x45, 0x54, 0x46]);
    assert_eq!(
        decoder.get_bytes(&mut bytes_out),
        Err(CBORError::UnexpectedType)
    );
}

#[test]
fn get_bignum_slices() {
    let bytes: &[u8] = &[0xc2, 0x42, 0x01, 0x00];
    let mut big: &[u8] = &[];
    let mut decoder = CBORDecoder::from_slice(bytes);
    decoder.get_pos_bignum(&mut big).unwrap();
    assert_eq!(big, &[0x01, 0x00]);

    let bytes: &[u8] = &[0xc3, 0x42, 0x01, 0x00];
    let mut decoder = CBORDecoder::from_slice(bytes);
    decoder.get_neg_bignum(&mut big).unwrap();
    assert_eq!(big, &[0x01, 0x00]);

    // A plain byte string is not a bignum
    let mut decoder = CBORDecoder::from_slice(&[0x42, 0x01, 0x00]);
    assert_eq!(
        decoder.get_pos_bignum(&mut big),
        Err(CBORError::UnexpectedType)
    );
}

// The straight-line decode pattern: getters by label, one check at the end.
#[test]
fn straight_line_in_map_getters() {
    println!("<======================= straight_line_in_map_getters =====================>");
    // {1: 42, "name": "cbor", 3: h'ff', "ok": true, "temp": 4([-2, 27315])}
    let bytes: &[u8] = &[
        0xa5, 0x01, 0x18, 0x2a, 0x64, 0x6e, 0x61, 0x6d, 0x65, 0x64, 0x63, 0x62, 0x6f, 0x72,
        0x03, 0x41, 0xff, 0x62, 0x6f, 0x6b, 0xf5, 0x64, 0x74, 0x65, 0x6d, 0x70, 0xc4, 0x82,
        0x21, 0x19, 0x6a, 0xb3,
    ];
    let mut id = 0i64;
    let mut name: &str = "";
    let mut blob: &[u8] = &[];
    let mut ok = false;
    let mut temp = 0.0f64;

    let mut decoder = CBORDecoder::from_slice(bytes);
    let _ = decoder.enter_map();
    let _ = decoder.get_int64_in_map_int(1, &mut id);
    let _ = decoder.get_text_in_map_text("name", &mut name);
    let _ = decoder.get_bytes_in_map_int(3, &mut blob);
    let _ = decoder.get_bool_in_map_text("ok", &mut ok);
    let _ = decoder.get_double_convert_all_in_map_text("temp", convert::ALL, &mut temp);
    let _ = decoder.exit_map();
    assert!(decoder.finish().is_ok());

    assert_eq!(id, 42);
    assert_eq!(name, "cbor");
    assert_eq!(blob, &[0xff]);
    assert!(ok);
    assert!((temp - 273.15).abs() < 1e-9);
}
