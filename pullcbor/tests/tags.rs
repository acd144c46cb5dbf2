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
 * Test cases for tag accumulation and the built-in tag transformations
 **************************************************************************************************/

extern crate pullcbor;

use pullcbor::decoder::{tags, CBORDecoder};
use pullcbor::error::CBORError;
use pullcbor::types::{Mantissa, Value};

// Tag 1 over an unsigned integer.
#[test]
fn epoch_date_from_integer() {
    println!("<======================= epoch_date_from_integer =====================>");
    let bytes: &[u8] = &[0xc1, 0x1a, 0x5d, 0x2c, 0x4a, 0x8f];
    let mut decoder = CBORDecoder::from_slice(bytes);
    let item = decoder.get_next().unwrap();
    assert_eq!(
        item.value,
        Value::DateEpoch {
            seconds: 1563212431,
            fraction: 0.0
        }
    );
    assert!(decoder.is_tagged(&item, tags::TAG_DATE_EPOCH));
    assert!(decoder.finish().is_ok());
}

// RFC8949: 1(1363896240.5)
#[test]
fn epoch_date_from_float() {
    let bytes: &[u8] = &[0xc1, 0xfb, 0x41, 0xd4, 0x52, 0xd9, 0xec, 0x20, 0x00, 0x00];
    let mut decoder = CBORDecoder::from_slice(bytes);
    let item = decoder.get_next().unwrap();
    match item.value {
        Value::DateEpoch { seconds, fraction } => {
            assert_eq!(seconds, 1363896240);
            assert!((fraction - 0.5).abs() < 1e-9);
        }
        v => panic!("expected an epoch date, got {:?}", v),
    }
}

#[test]
fn epoch_date_from_negative_integer() {
    // 1(-100)
    let bytes: &[u8] = &[0xc1, 0x38, 0x63];
    let mut decoder = CBORDecoder::from_slice(bytes);
    let item = decoder.get_next().unwrap();
    assert_eq!(
        item.value,
        Value::DateEpoch {
            seconds: -100,
            fraction: 0.0
        }
    );
}

#[test]
fn epoch_date_overflow() {
    // Seconds beyond the signed 64 bit range
    let bytes: &[u8] = &[0xc1, 0x1b, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff];
    let mut decoder = CBORDecoder::from_slice(bytes);
    assert_eq!(decoder.get_next(), Err(CBORError::DateOverflow));

    // Non-finite seconds do not fit either
    let bytes: &[u8] = &[0xc1, 0xf9, 0x7c, 0x00];
    let mut decoder = CBORDecoder::from_slice(bytes);
    assert_eq!(decoder.get_next(), Err(CBORError::DateOverflow));
}

// RFC8949: 0("2013-03-21T20:04:00Z")
#[test]
fn date_string() {
    println!("<======================= date_string =====================>");
    let mut bytes = vec![0xc0, 0x74];
    bytes.extend_from_slice(b"2013-03-21T20:04:00Z");
    let mut decoder = CBORDecoder::from_slice(&bytes);
    let item = decoder.get_next().unwrap();
    assert_eq!(item.value, Value::DateString("2013-03-21T20:04:00Z"));
    assert!(decoder.is_tagged(&item, tags::TAG_DATE_STRING));
    assert!(decoder.finish().is_ok());
}

// RFC8949: 2(h'010000000000000000') and the tag 3 counterpart
#[test]
fn bignums() {
    println!("<======================= bignums =====================>");
    let bytes: &[u8] = &[
        0xc2, 0x49, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ];
    let mut decoder = CBORDecoder::from_slice(bytes);
    let item = decoder.get_next().unwrap();
    assert_eq!(
        item.value,
        Value::PosBignum(&[0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00])
    );

    let bytes: &[u8] = &[
        0xc3, 0x49, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ];
    let mut decoder = CBORDecoder::from_slice(bytes);
    let item = decoder.get_next().unwrap();
    assert_eq!(
        item.value,
        Value::NegBignum(&[0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00])
    );
    assert!(decoder.is_tagged(&item, tags::TAG_NEG_BIGNUM));
}

// RFC8949: 4([-2, 27315]) is 273.15
#[test]
fn decimal_fraction() {
    println!("<======================= decimal_fraction =====================>");
    let bytes: &[u8] = &[0xc4, 0x82, 0x21, 0x19, 0x6a, 0xb3];
    let mut decoder = CBORDecoder::from_slice(bytes);
    let item = decoder.get_next().unwrap();
    assert_eq!(
        item.value,
        Value::DecimalFraction {
            exponent: -2,
            mantissa: Mantissa::Int(27315)
        }
    );
    assert!(decoder.finish().is_ok());
}

#[test]
fn decimal_fraction_bignum_mantissa() {
    // 4([-2, 2(h'6ab3')])
    let bytes: &[u8] = &[0xc4, 0x82, 0x21, 0xc2, 0x42, 0x6a, 0xb3];
    let mut decoder = CBORDecoder::from_slice(bytes);
    let item = decoder.get_next().unwrap();
    assert_eq!(
        item.value,
        Value::DecimalFraction {
            exponent: -2,
            mantissa: Mantissa::PosBignum(&[0x6a, 0xb3])
        }
    );
    assert!(decoder.finish().is_ok());
}

// RFC8949: 5([1, 3]) is 1.5 * 2^2
#[test]
fn bigfloat() {
    let bytes: &[u8] = &[0xc5, 0x82, 0x01, 0x03];
    let mut decoder = CBORDecoder::from_slice(bytes);
    let item = decoder.get_next().unwrap();
    assert_eq!(
        item.value,
        Value::Bigfloat {
            exponent: 1,
            mantissa: Mantissa::Int(3)
        }
    );
    assert!(decoder.finish().is_ok());
}

#[test]
fn days_tags() {
    // 100(12676) is 2004-09-21
    let bytes: &[u8] = &[0xd8, 0x64, 0x19, 0x31, 0x84];
    let mut decoder = CBORDecoder::from_slice(bytes);
    let item = decoder.get_next().unwrap();
    assert_eq!(item.value, Value::DaysEpoch(12676));

    // 1004("2023-01-01")
    let mut bytes = vec![0xd9, 0x03, 0xec, 0x6a];
    bytes.extend_from_slice(b"2023-01-01");
    let mut decoder = CBORDecoder::from_slice(&bytes);
    let item = decoder.get_next().unwrap();
    assert_eq!(item.value, Value::DaysString("2023-01-01"));
}

// Tag 55799 marks self-described CBOR and changes nothing else.
#[test]
fn self_described_cbor() {
    println!("<======================= self_described_cbor =====================>");
    let bytes: &[u8] = &[0xd9, 0xd9, 0xf7, 0x01];
    let mut decoder = CBORDecoder::from_slice(bytes);
    let item = decoder.get_next().unwrap();
    assert_eq!(item.value, Value::UInt(1));
    assert!(decoder.is_tagged(&item, tags::TAG_SELF_DESCRIBED));
    assert!(decoder.finish().is_ok());
}

// Unknown tags leave the item alone but are reported.
#[test]
fn unknown_tags_reported() {
    // 32("a")
    let bytes: &[u8] = &[0xd8, 0x20, 0x61, 0x61];
    let mut decoder = CBORDecoder::from_slice(bytes);
    let item = decoder.get_next().unwrap();
    assert_eq!(item.value, Value::Tstr("a"));
    assert!(decoder.is_tagged(&item, 32));
    assert!(!decoder.is_tagged(&item, 33));

    // The same tag on a later item reuses its table slot
    let bytes: &[u8] = &[0x82, 0xd8, 0x20, 0x01, 0xd8, 0x20, 0x02];
    let mut decoder = CBORDecoder::from_slice(bytes);
    decoder.get_next().unwrap();
    let first = decoder.get_next().unwrap();
    let second = decoder.get_next().unwrap();
    assert_eq!(first.tag_bits, second.tag_bits);
    assert!(decoder.is_tagged(&second, 32));
}

#[test]
fn nested_tags_all_reported() {
    // 33(34(1))
    let bytes: &[u8] = &[0xd8, 0x21, 0xd8, 0x22, 0x01];
    let mut decoder = CBORDecoder::from_slice(bytes);
    let mut tag_numbers = [0u64; 4];
    let (item, n) = decoder.get_next_with_tags(&mut tag_numbers).unwrap();
    assert_eq!(item.value, Value::UInt(1));
    assert_eq!(n, 2);
    assert_eq!(&tag_numbers[..n], &[33, 34]);
    assert!(decoder.is_tagged(&item, 33));
    assert!(decoder.is_tagged(&item, 34));
}

#[test]
fn too_many_tags() {
    println!("<======================= too_many_tags =====================>");
    // Five nested tags exceed the per-item limit of four
    let bytes: &[u8] = &[0xc6, 0xc7, 0xc8, 0xc9, 0xca, 0x01];
    let mut decoder = CBORDecoder::from_slice(bytes);
    assert_eq!(decoder.get_next(), Err(CBORError::TooManyTags));
}

#[test]
fn tag_list_out_capacity() {
    // 33(34(1)) into a single element list
    let bytes: &[u8] = &[0xd8, 0x21, 0xd8, 0x22, 0x01];
    let mut decoder = CBORDecoder::from_slice(bytes);
    let mut tag_numbers = [0u64; 1];
    assert_eq!(
        decoder.get_next_with_tags(&mut tag_numbers),
        Err(CBORError::TooManyTags)
    );
}

// A built-in tag over content of the wrong type cannot be decoded past.
#[test]
fn bad_builtin_tag_content() {
    println!("<======================= bad_builtin_tag_content =====================>");
    // 0(1): the date string tag requires text
    let bytes: &[u8] = &[0xc0, 0x01];
    let mut decoder = CBORDecoder::from_slice(bytes);
    assert_eq!(
        decoder.get_next(),
        Err(CBORError::UnrecoverableTagContent)
    );
    // The failure is terminal
    assert_eq!(decoder.get_next(), Err(CBORError::UnrecoverableTagContent));

    // 2("a"): bignums require a byte string
    let bytes: &[u8] = &[0xc2, 0x61, 0x61];
    let mut decoder = CBORDecoder::from_slice(bytes);
    assert_eq!(
        decoder.get_next(),
        Err(CBORError::UnrecoverableTagContent)
    );
}

#[test]
fn bad_exp_mantissa_structure() {
    // 4(1): not an array at all
    let bytes: &[u8] = &[0xc4, 0x01];
    let mut decoder = CBORDecoder::from_slice(bytes);
    assert_eq!(decoder.get_next(), Err(CBORError::BadExpMantissa));

    // 4([1, 2, 3]): wrong arity
    let bytes: &[u8] = &[0xc4, 0x83, 0x01, 0x02, 0x03];
    let mut decoder = CBORDecoder::from_slice(bytes);
    assert_eq!(decoder.get_next(), Err(CBORError::BadExpMantissa));

    // 4(["a", 2]): exponent must be an integer
    let bytes: &[u8] = &[0xc4, 0x82, 0x61, 0x61, 0x02];
    let mut decoder = CBORDecoder::from_slice(bytes);
    assert_eq!(decoder.get_next(), Err(CBORError::BadExpMantissa));
}

// Caller configured tags get stable bit positions regardless of encounter order.
#[test]
fn caller_configured_tag_list() {
    println!("<======================= caller_configured_tag_list =====================>");
    let bytes: &[u8] = &[0x82, 0xd8, 0x20, 0x01, 0xd8, 0x21, 0x02];
    let mut decoder = CBORDecoder::from_slice(bytes);
    decoder.set_tag_list(&[33, 32]).unwrap();
    decoder.get_next().unwrap();
    let first = decoder.get_next().unwrap();
    assert!(decoder.is_tagged(&first, 32));
    assert!(!decoder.is_tagged(&first, 33));
    let second = decoder.get_next().unwrap();
    assert!(decoder.is_tagged(&second, 33));
    assert!(decoder.finish().is_ok());

    // More than sixteen caller tags are rejected
    let mut decoder = CBORDecoder::from_slice(&[0x01]);
    assert_eq!(
        decoder.set_tag_list(&[0; 17]),
        Err(CBORError::TooManyTags)
    );
}

// Tagged values work as map entries, searchable by label.
#[test]
fn tagged_items_in_maps() {
    use pullcbor::types::ValueKind;
    // {"t": 1(1563212431)}
    let bytes: &[u8] = &[0xa1, 0x61, 0x74, 0xc1, 0x1a, 0x5d, 0x2c, 0x4a, 0x8f];
    let mut decoder = CBORDecoder::from_slice(bytes);
    decoder.enter_map().unwrap();
    let item = decoder
        .get_item_in_map_text("t", ValueKind::DateEpoch)
        .unwrap();
    assert_eq!(
        item.value,
        Value::DateEpoch {
            seconds: 1563212431,
            fraction: 0.0
        }
    );
    assert!(decoder.is_tagged(&item, tags::TAG_DATE_EPOCH));
    decoder.exit_map().unwrap();
    assert!(decoder.finish().is_ok());
}
