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
 * pullcbor CBOR Error API
 *
 * A pull-based, zero-allocation deserializer for CBOR (RFC8949).
 * This implementation is designed for use in constrained systems and requires neither the Rust
 * standard library nor an allocator.
 **************************************************************************************************/
use std::result;

#[cfg(any(feature = "full", test))]
use thiserror::Error;

/// An alias for Result<T, CBORError> used throughout this crate.
pub type Result<T> = result::Result<T, CBORError>;

/// `CBORError` provides information about decoding failures. Errors fall into three tiers:
///
/// 1. *Not well-formed*: the bytes are not legal CBOR. Decoding cannot continue.
/// 2. *Unrecoverable*: the bytes may be legal but an implementation limit was hit or a
///    structural problem prevents further progress.
/// 3. *Recoverable*: a semantic problem confined to one item. The caller may reset the
///    error latch and continue decoding.
///
/// The classification is exposed through [`CBORError::is_not_well_formed`],
/// [`CBORError::is_unrecoverable`] and [`CBORError::is_recoverable`].
#[cfg_attr(any(feature = "full", test), derive(Copy, Clone, Error, Debug, PartialEq, Eq))]
#[cfg_attr(all(not(feature = "full"), not(test)), derive(Copy, Clone, Debug, PartialEq, Eq))]
pub enum CBORError {
    /// Input ended part way through a head, string or container.
    #[cfg_attr(any(feature = "full", test), error("Input ended in the middle of an item"))]
    HitEnd,
    /// A BREAK stop code appeared where no indefinite length item is open.
    #[cfg_attr(any(feature = "full", test), error("BREAK outside an indefinite length item"))]
    BadBreak,
    /// Additional information values 28..30 are reserved.
    #[cfg_attr(any(feature = "full", test), error("Reserved additional information value"))]
    Unsupported,
    /// Indefinite length is not allowed for integer and tag major types.
    #[cfg_attr(any(feature = "full", test), error("Illegal integer or tag encoding"))]
    BadInt,
    /// Major type 7 additional byte below 32 duplicates a one byte encoding.
    #[cfg_attr(any(feature = "full", test), error("Illegal major type 7 encoding"))]
    BadType7,
    /// A chunk of an indefinite length string was not a definite length string of the
    /// same major type.
    #[cfg_attr(any(feature = "full", test), error("Bad chunk in indefinite length string"))]
    IndefiniteStringChunk,
    /// Bytes remain in the buffer after the last item closed.
    #[cfg_attr(any(feature = "full", test), error("Input continues after the decoded item"))]
    ExtraBytes,

    /// The input buffer is larger than the decoder can address.
    #[cfg_attr(any(feature = "full", test), error("Input buffer too large"))]
    InputTooLarge,
    /// Arrays and maps are nested deeper than the fixed nesting stack.
    #[cfg_attr(any(feature = "full", test), error("Arrays and maps nested too deeply"))]
    NestingTooDeep,
    /// A definite length array or map declares more entries than the count field can hold.
    #[cfg_attr(any(feature = "full", test), error("Array or map too long"))]
    ArrayTooLong,
    /// A string is too long to be represented on this target.
    #[cfg_attr(any(feature = "full", test), error("String too long"))]
    StringTooLong,
    /// A decimal fraction or bigfloat is not a two element array of exponent and mantissa.
    #[cfg_attr(any(feature = "full", test), error("Bad exponent and mantissa structure"))]
    BadExpMantissa,
    /// An indefinite length string was encountered with no string storage configured.
    #[cfg_attr(any(feature = "full", test), error("No string storage configured"))]
    NoStringAllocator,
    /// The string storage could not satisfy an allocation.
    #[cfg_attr(any(feature = "full", test), error("String storage exhausted"))]
    StringAllocate,
    /// A map label has a type the current decode mode forbids.
    #[cfg_attr(any(feature = "full", test), error("Map label of forbidden type"))]
    MapLabelType,
    /// The content of a built-in tag has the wrong type and the cursor cannot be rewound
    /// past it.
    #[cfg_attr(any(feature = "full", test), error("Bad content for built-in tag"))]
    UnrecoverableTagContent,
    /// A floating point item was encountered but float support is not compiled in.
    #[cfg_attr(any(feature = "full", test), error("Floating point support disabled"))]
    AllFloatDisabled,

    /// More tags precede an item than the decoder can record.
    #[cfg_attr(any(feature = "full", test), error("Too many tags on one item"))]
    TooManyTags,
    /// The item does not have the requested type.
    #[cfg_attr(any(feature = "full", test), error("Item is not of the expected type"))]
    UnexpectedType,
    /// Two entries of the entered map carry the same label.
    #[cfg_attr(any(feature = "full", test), error("Duplicate label in map"))]
    DuplicateLabel,
    /// The buffer handed to the memory pool is below the minimum size.
    #[cfg_attr(any(feature = "full", test), error("Memory pool buffer too small"))]
    MemPoolSize,
    /// A negative integer is too small for a 64 bit signed representation.
    #[cfg_attr(any(feature = "full", test), error("Integer outside the 64 bit range"))]
    IntOverflow,
    /// An epoch date does not fit the date representation.
    #[cfg_attr(any(feature = "full", test), error("Date outside the representable range"))]
    DateOverflow,
    /// exit_map / exit_array does not match the kind of the entered container.
    #[cfg_attr(any(feature = "full", test), error("Exit does not match the entered container"))]
    ExitMismatch,
    /// Traversal reached the end of the entered map or array.
    #[cfg_attr(any(feature = "full", test), error("No more items in the entered container"))]
    NoMoreItems,
    /// The requested label is not present in the entered map.
    #[cfg_attr(any(feature = "full", test), error("Label not found in map"))]
    LabelNotFound,
    /// A negative number cannot be converted to an unsigned representation.
    #[cfg_attr(any(feature = "full", test), error("Sign conversion of a negative number"))]
    NumberSignConversion,
    /// A numeric conversion overflowed or underflowed the target type.
    #[cfg_attr(any(feature = "full", test), error("Overflow or underflow in number conversion"))]
    ConversionUnderOverFlow,
    /// A by-label operation was attempted with no map entered.
    #[cfg_attr(any(feature = "full", test), error("No map entered"))]
    MapNotEntered,
    /// A caller supplied scan callback asked to abort.
    #[cfg_attr(any(feature = "full", test), error("Scan aborted by callback"))]
    CallbackFail,
    /// A text string contains an invalid UTF8 sequence.
    #[cfg_attr(any(feature = "full", test), error("A text string contains an invalid UTF8 sequence"))]
    Utf8,
    /// finish was called while arrays or maps are still open.
    #[cfg_attr(any(feature = "full", test), error("Array or map still open at finish"))]
    ArrayOrMapStillOpen,
}

impl CBORError {
    /// Return `true` if the error means the input is not legal CBOR. Decoding cannot
    /// continue once such an error is reported.
    pub fn is_not_well_formed(&self) -> bool {
        matches!(
            self,
            CBORError::HitEnd
                | CBORError::BadBreak
                | CBORError::Unsupported
                | CBORError::BadInt
                | CBORError::BadType7
                | CBORError::IndefiniteStringChunk
                | CBORError::ExtraBytes
        )
    }

    /// Return `true` if the error stops decoding: either the input is not well-formed or
    /// an implementation limit or structural problem prevents further progress.
    pub fn is_unrecoverable(&self) -> bool {
        self.is_not_well_formed()
            || matches!(
                self,
                CBORError::InputTooLarge
                    | CBORError::NestingTooDeep
                    | CBORError::ArrayTooLong
                    | CBORError::StringTooLong
                    | CBORError::BadExpMantissa
                    | CBORError::NoStringAllocator
                    | CBORError::StringAllocate
                    | CBORError::MapLabelType
                    | CBORError::UnrecoverableTagContent
                    | CBORError::AllFloatDisabled
            )
    }

    /// Return `true` if decoding may continue after the error is reset.
    pub fn is_recoverable(&self) -> bool {
        !self.is_unrecoverable()
    }
}
