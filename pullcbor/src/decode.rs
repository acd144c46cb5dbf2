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
 * pullcbor CBOR Decoder
 *
 * A pull-based, zero-allocation deserializer for CBOR (RFC8949).
 * This implementation is designed for use in constrained systems and requires neither the Rust
 * standard library nor an allocator.
 **************************************************************************************************/
/// # Pre-order CBOR decoding
///
/// This module contains the decoder context and the pre-order traversal engine. A
/// [`CBORDecoder`] is constructed over a byte slice and keeps track of the parse position,
/// the open arrays and maps and the sticky error state. Each call to
/// [`CBORDecoder::get_next`] consumes one data item, attaching the tags and (inside maps)
/// the label that precede it on the wire.
///
/// ## Example
///
/// ```
///# use pullcbor::decoder::CBORDecoder;
///# use pullcbor::types::Value;
/// let b = [0x18u8, 0x18];
/// let mut decoder = CBORDecoder::from_slice(&b);
/// let item = decoder.get_next().unwrap();
/// assert_eq!(Value::UInt(24), item.value);
/// assert!(decoder.finish().is_ok());
/// ```
use crate::constants::tags::*;
use crate::constants::*;
use crate::error::{CBORError, Result};
use crate::item::{Item, Label, Mantissa, Value};
use crate::nesting::{Frame, FrameKind, Nesting};
use crate::stralloc::{MemPool, StringStorage};
use crate::tag::{fold_builtin, is_transforming, TagChain, TagSet};
use crate::utils::within;

use std::cmp::min;
use std::convert::TryInto;
use std::str::from_utf8;

#[cfg(feature = "float")]
use half::f16;

#[cfg(feature = "trace")]
use func_trace::trace;

#[cfg(feature = "trace")]
func_trace::init_depth_var!();

/***************************************************************************************************
 * Head parsing
 **************************************************************************************************/

/// The first byte of an item, split into major type and additional information, together
/// with the argument carried inline or in the following 1, 2, 4 or 8 bytes.
#[derive(Debug, Copy, Clone)]
struct Head {
    major: u8,
    ainfo: u8,
    arg: u64,
}

impl Head {
    #[inline]
    fn is_indefinite(&self) -> bool {
        self.ainfo == PAYLOAD_INDEFINITE
    }
}

/// Parse one head starting at `start_index` in `buf`.
///
/// On return we have the decoded head and the index within `buf` of the byte that follows
/// it. This function does bounds checking, so it is safe to call with any index.
#[cfg_attr(feature = "trace", trace)]
fn read_head(buf: &[u8], start_index: usize) -> Result<(usize, Head)> {
    if !within(buf, start_index, 1) {
        return Err(CBORError::HitEnd);
    }
    let initial = buf[start_index];
    let major = initial >> 5;
    let ainfo = initial & AI_MASK;
    let mut index = start_index + 1;
    let arg = match ainfo {
        0..=PAYLOAD_AI_BITS => ainfo as u64,
        PAYLOAD_ONE_BYTE => {
            if !within(buf, index, 1) {
                return Err(CBORError::HitEnd);
            }
            index += 1;
            buf[index - 1] as u64
        }
        PAYLOAD_TWO_BYTES => {
            if !within(buf, index, 2) {
                return Err(CBORError::HitEnd);
            }
            let bytes: [u8; 2] = buf[index..index + 2].try_into().map_err(|_| CBORError::HitEnd)?;
            index += 2;
            u16::from_be_bytes(bytes) as u64
        }
        PAYLOAD_FOUR_BYTES => {
            if !within(buf, index, 4) {
                return Err(CBORError::HitEnd);
            }
            let bytes: [u8; 4] = buf[index..index + 4].try_into().map_err(|_| CBORError::HitEnd)?;
            index += 4;
            u32::from_be_bytes(bytes) as u64
        }
        PAYLOAD_EIGHT_BYTES => {
            if !within(buf, index, 8) {
                return Err(CBORError::HitEnd);
            }
            let bytes: [u8; 8] = buf[index..index + 8].try_into().map_err(|_| CBORError::HitEnd)?;
            index += 8;
            u64::from_be_bytes(bytes)
        }
        PAYLOAD_INDEFINITE => match major {
            // Indefinite length has no meaning for integers and tags
            MT_UINT | MT_NINT | MT_TAG => return Err(CBORError::BadInt),
            _ => 0,
        },
        // 28..30 are reserved
        _ => return Err(CBORError::Unsupported),
    };
    Ok((index, Head { major, ainfo, arg }))
}

/***************************************************************************************************
 * Decoder context
 **************************************************************************************************/

/// Decode mode, fixed at construction.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DecodeMode {
    /// Maps are decoded as label/value pairs; integer, string and byte string labels are
    /// accepted.
    Normal,
    /// As `Normal`, but only text string labels are accepted. Any other label type fails
    /// with `MapLabelType`.
    MapStringsOnly,
    /// Maps are surfaced as item sequences of alternating labels and values with no label
    /// processing at all; the reported count is the number of items, twice the pair count.
    MapAsArray,
}

/// The string storage in use: either the built-in bump pool or a caller supplied
/// implementation.
enum Storage<'buf> {
    Pool(MemPool<'buf>),
    Custom(&'buf mut dyn StringStorage<'buf>),
}

/// A saved traversal position: byte offset plus the open frame stack. Restoring one puts
/// the decoder back exactly where it was, which is how map searches leave the cursor
/// unmoved.
#[derive(Copy, Clone)]
pub(crate) struct Cursor {
    index: usize,
    nesting: Nesting,
}

/// Outcome of fetching one raw item (tags folded, nesting untouched).
enum Fetched<'buf> {
    Break,
    Item {
        value: Value<'buf>,
        allocated: bool,
        chain: TagChain,
    },
}

/// Outcome of decoding the payload of one head.
enum Payload<'buf> {
    Break,
    Value { value: Value<'buf>, allocated: bool },
}

impl<'buf> Payload<'buf> {
    #[inline]
    fn val(value: Value<'buf>) -> Self {
        Payload::Value {
            value,
            allocated: false,
        }
    }
}

/// A CBOR decoder over a borrowed byte buffer.
///
/// The decoder is a cursor: [`CBORDecoder::get_next`] yields items in pre-order, and the
/// map mode operations in the [`crate::map`] module bound the traversal inside an entered
/// container and find items by label.
///
/// Most operations use the sticky error cell: once any of them fails, the rest turn into
/// no-ops and [`CBORDecoder::finish`] reports the first error. This permits straight-line
/// decoding code with a single error check at the end.
pub struct CBORDecoder<'buf> {
    pub(crate) buf: &'buf [u8],
    pub(crate) index: usize,
    pub(crate) mode: DecodeMode,
    preferred_float: bool,
    all_strings: bool,
    pub(crate) nesting: Nesting,
    pub(crate) tags: TagSet,
    storage: Option<Storage<'buf>>,
    pub(crate) last_error: Option<CBORError>,
}

// The string storage is a trait object, so Debug is spelled out by hand.
impl<'buf> core::fmt::Debug for CBORDecoder<'buf> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CBORDecoder")
            .field("len", &self.buf.len())
            .field("index", &self.index)
            .field("mode", &self.mode)
            .field("nesting", &self.nesting)
            .field("storage", &self.storage.is_some())
            .field("last_error", &self.last_error)
            .finish()
    }
}

impl<'buf> CBORDecoder<'buf> {
    /// Construct a decoder over `buf` in the given mode.
    #[cfg_attr(feature = "trace", trace)]
    pub fn new(buf: &'buf [u8], mode: DecodeMode) -> CBORDecoder<'buf> {
        let last_error = if buf.len() as u64 > MAX_DECODE_INPUT_SIZE {
            Some(CBORError::InputTooLarge)
        } else {
            None
        };
        CBORDecoder {
            buf,
            index: 0,
            mode,
            preferred_float: false,
            all_strings: false,
            nesting: Nesting::new(),
            tags: TagSet::new(),
            storage: None,
            last_error,
        }
    }

    /// Construct a decoder over `buf` in [`DecodeMode::Normal`].
    #[inline]
    pub fn from_slice(buf: &'buf [u8]) -> CBORDecoder<'buf> {
        Self::new(buf, DecodeMode::Normal)
    }

    /// Configure the built-in bump pool over `pool_buf` as string storage. Required before
    /// any indefinite length string can be decoded. With `all_strings` set, every returned
    /// string is copied into the pool, so items survive reuse of the input buffer.
    pub fn set_mem_pool(&mut self, pool_buf: &'buf mut [u8], all_strings: bool) -> Result<()> {
        let pool = MemPool::new(pool_buf)?;
        self.storage = Some(Storage::Pool(pool));
        self.all_strings = all_strings;
        Ok(())
    }

    /// Configure a caller supplied string storage. See [`StringStorage`] for the protocol
    /// the implementation must honour.
    pub fn set_string_storage(
        &mut self,
        storage: &'buf mut dyn StringStorage<'buf>,
        all_strings: bool,
    ) {
        self.storage = Some(Storage::Custom(storage));
        self.all_strings = all_strings;
    }

    /// Install the caller configured tag list. These tag numbers get stable positions in
    /// the tag table so [`CBORDecoder::is_tagged`] can always answer for them.
    pub fn set_tag_list(&mut self, tags: &[u64]) -> Result<()> {
        self.tags.set_caller_tags(tags)
    }

    /// Keep single precision floats (and widened halves) at 32 bits instead of widening
    /// everything to `Value::Double`.
    pub fn set_preferred_float(&mut self, preferred: bool) {
        self.preferred_float = preferred;
    }

    /// Return `true` if `item` carried the tag number `tag`.
    pub fn is_tagged(&self, item: &Item<'buf>, tag: u64) -> bool {
        self.tags.is_tagged(item.tag_bits, tag)
    }

    /// Return `true` while a map or array is entered.
    pub fn in_map_mode(&self) -> bool {
        self.nesting.bounded_depth().is_some()
    }

    /// The byte offset of the traversal cursor. Offset equal to the input length means the
    /// whole buffer has been consumed.
    pub fn position(&self) -> usize {
        self.index
    }

    /// The sticky error, if any operation has failed.
    pub fn get_error(&self) -> Option<CBORError> {
        self.last_error
    }

    /// Return the sticky error and clear it, so that decoding of recoverable problems can
    /// continue.
    pub fn get_and_reset_error(&mut self) -> Option<CBORError> {
        self.last_error.take()
    }

    /// Validate the end state: the sticky error wins, then any still-open array or map,
    /// then unconsumed input. The string storage destructor runs in every case.
    #[cfg_attr(feature = "trace", trace)]
    pub fn finish(&mut self) -> Result<()> {
        let result = if let Some(e) = self.last_error {
            Err(e)
        } else if !self.nesting.is_empty() {
            Err(CBORError::ArrayOrMapStillOpen)
        } else if self.index < self.buf.len() {
            Err(CBORError::ExtraBytes)
        } else {
            Ok(())
        };
        match &mut self.storage {
            Some(Storage::Pool(p)) => p.destruct(),
            Some(Storage::Custom(c)) => c.destruct(),
            None => {}
        }
        result
    }

    /***********************************************************************************************
     * Pre-order traversal
     **********************************************************************************************/

    /// Fetch the next item in pre-order. Inside an entered map or array the traversal is
    /// clamped to the container and the end is reported as `NoMoreItems`.
    ///
    /// Errors are returned directly and also latched; decoding continues only while the
    /// latched error is recoverable.
    #[cfg_attr(feature = "trace", trace)]
    pub fn get_next(&mut self) -> Result<Item<'buf>> {
        match self.next_in_order(None) {
            Ok((item, _)) => Ok(item),
            Err(e) => Err(self.latch(e)),
        }
    }

    /// As [`CBORDecoder::get_next`], but also writes the full list of tag numbers seen on
    /// the item (outermost first) to `tags_out`, returning how many there were. Fails with
    /// `TooManyTags` if `tags_out` cannot hold them all.
    pub fn get_next_with_tags(&mut self, tags_out: &mut [u64]) -> Result<(Item<'buf>, usize)> {
        match self.next_in_order(None) {
            Ok((item, chain)) => {
                let tags = chain.as_slice();
                if tags.len() > tags_out.len() {
                    return Err(self.latch(CBORError::TooManyTags));
                }
                tags_out[..tags.len()].copy_from_slice(tags);
                Ok((item, tags.len()))
            }
            Err(e) => Err(self.latch(e)),
        }
    }

    /// Latch `e` unless an earlier error already stuck.
    pub(crate) fn latch(&mut self, e: CBORError) -> CBORError {
        if self.last_error.is_none() {
            self.last_error = Some(e);
        }
        e
    }

    /// Save the traversal position.
    pub(crate) fn mark(&self) -> Cursor {
        Cursor {
            index: self.index,
            nesting: self.nesting,
        }
    }

    /// Restore a previously saved traversal position.
    pub(crate) fn seek(&mut self, cursor: Cursor) {
        self.index = cursor.index;
        self.nesting = cursor.nesting;
    }

    /// The engine behind `get_next` and the map mode operations. With `enter` set, a
    /// container item of the requested kind is left open and bounded instead of being
    /// traversed through.
    pub(crate) fn next_in_order(
        &mut self,
        enter: Option<FrameKind>,
    ) -> Result<(Item<'buf>, TagChain)> {
        if let Some(e) = self.last_error {
            if !e.is_recoverable() {
                return Err(e);
            }
        }
        if self.at_bounded_end()? {
            return Err(CBORError::NoMoreItems);
        }

        let nest_level = self.nesting.depth() as u8;

        let (mut value, mut allocated, mut chain) = match self.decode_item()? {
            Fetched::Break => return Err(CBORError::BadBreak),
            Fetched::Item {
                value,
                allocated,
                chain,
            } => (value, allocated, chain),
        };

        // Directly inside a map frame every fetch is a label followed by its value
        let mut label = Label::None;
        let mut label_allocated = false;
        if self.nesting.innermost().map(|f| f.kind) == Some(FrameKind::Map) {
            label = self.fold_label(value)?;
            label_allocated = allocated;
            match self.decode_item()? {
                Fetched::Break => return Err(CBORError::BadBreak),
                Fetched::Item {
                    value: v,
                    allocated: a,
                    chain: c,
                } => {
                    value = v;
                    allocated = a;
                    chain = c;
                }
            }
        }

        let tag_bits = self.tags.bits_for_chain(&chain);
        let mut item = Item {
            value,
            label,
            nest_level,
            next_nest_level: nest_level,
            data_allocated: allocated,
            label_allocated,
            tag_bits,
        };

        match enter {
            Some(kind) => {
                let matches = match (kind, &value) {
                    (FrameKind::Map, Value::Map(_)) => true,
                    (FrameKind::Array, Value::Array(_)) => true,
                    (FrameKind::Array, Value::MapAsArray(_)) => true,
                    _ => false,
                };
                let count = match value.container_count() {
                    Some(c) if matches => c,
                    _ => return Err(CBORError::UnexpectedType),
                };
                self.nesting.push(Frame {
                    kind,
                    count,
                    remaining: count,
                    start_offset: self.index as u32,
                    bounded: true,
                })?;
            }
            None => {
                let count = value.container_count();
                if value.is_container() && count != Some(0) {
                    self.nesting.push(Frame {
                        kind: frame_kind(&value),
                        count: count.unwrap_or(0),
                        remaining: count.unwrap_or(0),
                        start_offset: self.index as u32,
                        bounded: false,
                    })?;
                    if value.is_indefinite()
                        && within(self.buf, self.index, 1)
                        && self.buf[self.index] == BREAK_BYTE
                    {
                        // The container is empty; it closes before the next item
                        self.index += 1;
                        self.nesting.pop();
                        let depth = self.complete_one();
                        item.next_nest_level = min(nest_level, depth as u8);
                    }
                } else {
                    let depth = self.complete_one();
                    item.next_nest_level = min(nest_level, depth as u8);
                }
            }
        }
        Ok((item, chain))
    }

    /// One complete item (or fully consumed container) has been taken off the current
    /// level: update the remaining counts, consume BREAKs of indefinite containers that
    /// close here and pop every frame the item closed out. Bounded frames always stay
    /// open. Returns the depth after the item.
    pub(crate) fn complete_one(&mut self) -> usize {
        loop {
            let depth = self.nesting.depth();
            let (is_indef, bounded, remaining) = match self.nesting.innermost() {
                None => return 0,
                Some(f) => (f.is_indefinite(), f.bounded, f.remaining),
            };
            if is_indef {
                if bounded
                    || !within(self.buf, self.index, 1)
                    || self.buf[self.index] != BREAK_BYTE
                {
                    return depth;
                }
                self.index += 1;
                self.nesting.pop();
            } else {
                let left = remaining.saturating_sub(1);
                if let Some(f) = self.nesting.innermost_mut() {
                    f.remaining = left;
                }
                if left > 0 || bounded {
                    return depth;
                }
                self.nesting.pop();
            }
        }
    }

    /// Return `true` when the traversal cursor stands at the end of the innermost bounded
    /// frame, i.e. the next fetch inside an entered container would leave it.
    pub(crate) fn at_bounded_end(&self) -> Result<bool> {
        match self.nesting.innermost() {
            Some(f) if f.bounded => {
                if f.is_indefinite() {
                    if !within(self.buf, self.index, 1) {
                        return Err(CBORError::HitEnd);
                    }
                    Ok(self.buf[self.index] == BREAK_BYTE)
                } else {
                    Ok(f.remaining == 0)
                }
            }
            _ => Ok(false),
        }
    }

    /// Map a decoded label item onto the label record, enforcing the decode mode's label
    /// policy.
    fn fold_label(&self, value: Value<'buf>) -> Result<Label<'buf>> {
        match self.mode {
            DecodeMode::MapStringsOnly => match value {
                Value::Tstr(s) => Ok(Label::Tstr(s)),
                _ => Err(CBORError::MapLabelType),
            },
            _ => match value {
                Value::UInt(v) => Ok(Label::UInt(v)),
                Value::Int(v) => Ok(Label::Int(v)),
                Value::Tstr(s) => Ok(Label::Tstr(s)),
                Value::Bstr(b) => Ok(Label::Bstr(b)),
                _ => Err(CBORError::MapLabelType),
            },
        }
    }

    /***********************************************************************************************
     * Item assembly
     **********************************************************************************************/

    /// Fetch one raw item: collect the tag chain, decode the payload and fold the built-in
    /// tags. The nesting tracker is not touched.
    #[cfg_attr(feature = "trace", trace)]
    fn decode_item(&mut self) -> Result<Fetched<'buf>> {
        let mut chain = TagChain::new();
        loop {
            let (next, head) = read_head(self.buf, self.index)?;
            self.index = next;
            if head.major == MT_TAG {
                chain.push(head.arg)?;
                continue;
            }
            let payload = self.decode_payload(&head)?;
            return match payload {
                Payload::Break => {
                    if chain.is_empty() {
                        Ok(Fetched::Break)
                    } else {
                        Err(CBORError::BadBreak)
                    }
                }
                Payload::Value { value, allocated } => {
                    let value = self.fold_tags(&chain, value)?;
                    Ok(Fetched::Item {
                        value,
                        allocated,
                        chain,
                    })
                }
            };
        }
    }

    /// Decode the payload selected by one head. The cursor stands just past the head.
    fn decode_payload(&mut self, head: &Head) -> Result<Payload<'buf>> {
        match head.major {
            MT_UINT => Ok(Payload::val(Value::UInt(head.arg))),
            MT_NINT => {
                if head.arg > i64::MAX as u64 {
                    // -1 - n is below what an i64 can hold
                    Err(CBORError::IntOverflow)
                } else {
                    Ok(Payload::val(Value::Int(-1 - (head.arg as i64))))
                }
            }
            MT_BSTR | MT_TSTR => self.decode_string(head),
            MT_ARRAY => {
                let count = self.container_count(head, false)?;
                Ok(Payload::val(Value::Array(count)))
            }
            MT_MAP => {
                let count = self.container_count(head, true)?;
                if self.mode == DecodeMode::MapAsArray {
                    Ok(Payload::val(Value::MapAsArray(count)))
                } else {
                    Ok(Payload::val(Value::Map(count)))
                }
            }
            MT_SIMPLE => self.decode_simple(head),
            _ => Err(CBORError::Unsupported),
        }
    }

    fn container_count(&self, head: &Head, is_map: bool) -> Result<u16> {
        if head.is_indefinite() {
            return Ok(INDEFINITE_COUNT);
        }
        if is_map && self.mode == DecodeMode::MapAsArray {
            if head.arg > MAX_DEFINITE_COUNT / 2 {
                return Err(CBORError::ArrayTooLong);
            }
            Ok((head.arg * 2) as u16)
        } else if head.arg > MAX_DEFINITE_COUNT {
            Err(CBORError::ArrayTooLong)
        } else {
            Ok(head.arg as u16)
        }
    }

    /// Slice `len` bytes off the input at the cursor.
    fn read_extent(&mut self, len: u64) -> Result<&'buf [u8]> {
        if len > (usize::MAX - 4) as u64 {
            return Err(CBORError::StringTooLong);
        }
        let len = len as usize;
        if !within(self.buf, self.index, len) {
            return Err(CBORError::HitEnd);
        }
        let bytes = &self.buf[self.index..self.index + len];
        self.index += len;
        Ok(bytes)
    }

    fn decode_string(&mut self, head: &Head) -> Result<Payload<'buf>> {
        let (bytes, allocated) = if head.is_indefinite() {
            (self.assemble_string(head.major)?, true)
        } else {
            let bytes = self.read_extent(head.arg)?;
            if self.all_strings {
                (self.store_copy(bytes)?, true)
            } else {
                (bytes, false)
            }
        };
        let value = if head.major == MT_TSTR {
            match from_utf8(bytes) {
                Ok(s) => Value::Tstr(s),
                Err(_) => return Err(CBORError::Utf8),
            }
        } else {
            Value::Bstr(bytes)
        };
        Ok(Payload::Value { value, allocated })
    }

    /// Concatenate the chunks of an indefinite length string through the string storage.
    /// Chunks must be definite length strings of the same major type; the BREAK stop code
    /// ends the sequence.
    #[cfg_attr(feature = "trace", trace)]
    fn assemble_string(&mut self, major: u8) -> Result<&'buf [u8]> {
        let buf = self.buf;
        let mut index = self.index;
        let storage: &mut dyn StringStorage<'buf> = match &mut self.storage {
            Some(Storage::Pool(p)) => p,
            Some(Storage::Custom(c)) => &mut **c,
            None => return Err(CBORError::NoStringAllocator),
        };
        storage.open()?;
        let scanned = loop {
            if !within(buf, index, 1) {
                break Err(CBORError::HitEnd);
            }
            if buf[index] == BREAK_BYTE {
                index += 1;
                break Ok(());
            }
            match read_head(buf, index) {
                Err(e) => break Err(e),
                Ok((next, head)) => {
                    if head.major != major || head.is_indefinite() {
                        break Err(CBORError::IndefiniteStringChunk);
                    }
                    if head.arg > (usize::MAX - 4) as u64 {
                        break Err(CBORError::StringTooLong);
                    }
                    let len = head.arg as usize;
                    if !within(buf, next, len) {
                        break Err(CBORError::HitEnd);
                    }
                    if let Err(e) = storage.extend(&buf[next..next + len]) {
                        break Err(e);
                    }
                    index = next + len;
                }
            }
        };
        match scanned {
            Ok(()) => {
                let bytes = storage.take()?;
                self.index = index;
                Ok(bytes)
            }
            Err(e) => {
                storage.reset();
                Err(e)
            }
        }
    }

    /// Copy one definite length string through the storage (all-strings mode).
    fn store_copy(&mut self, bytes: &[u8]) -> Result<&'buf [u8]> {
        let storage: &mut dyn StringStorage<'buf> = match &mut self.storage {
            Some(Storage::Pool(p)) => p,
            Some(Storage::Custom(c)) => &mut **c,
            None => return Err(CBORError::NoStringAllocator),
        };
        storage.open()?;
        if let Err(e) = storage.extend(bytes) {
            storage.reset();
            return Err(e);
        }
        storage.take()
    }

    fn decode_simple(&mut self, head: &Head) -> Result<Payload<'buf>> {
        let value = match head.ainfo {
            0..=19 => Value::Simple(head.ainfo),
            20 => Value::False,
            21 => Value::True,
            22 => Value::Null,
            23 => Value::Undefined,
            PAYLOAD_ONE_BYTE => {
                if head.arg < 32 {
                    // Two byte encodings of the one byte simple values are not legal
                    return Err(CBORError::BadType7);
                }
                Value::Simple(head.arg as u8)
            }
            PAYLOAD_TWO_BYTES => self.decode_half(head.arg as u16)?,
            PAYLOAD_FOUR_BYTES => self.decode_single(head.arg as u32)?,
            PAYLOAD_EIGHT_BYTES => self.decode_double(head.arg)?,
            PAYLOAD_INDEFINITE => return Ok(Payload::Break),
            _ => return Err(CBORError::Unsupported),
        };
        Ok(Payload::val(value))
    }

    #[cfg(feature = "float")]
    fn decode_half(&self, bits: u16) -> Result<Value<'buf>> {
        let v = f16::from_bits(bits);
        Ok(if self.preferred_float {
            Value::Float(v.to_f32())
        } else {
            Value::Double(v.to_f64())
        })
    }

    #[cfg(not(feature = "float"))]
    fn decode_half(&self, _bits: u16) -> Result<Value<'buf>> {
        Err(CBORError::AllFloatDisabled)
    }

    #[cfg(feature = "float")]
    fn decode_single(&self, bits: u32) -> Result<Value<'buf>> {
        let v = f32::from_bits(bits);
        Ok(if self.preferred_float {
            Value::Float(v)
        } else {
            Value::Double(v as f64)
        })
    }

    #[cfg(not(feature = "float"))]
    fn decode_single(&self, _bits: u32) -> Result<Value<'buf>> {
        Err(CBORError::AllFloatDisabled)
    }

    #[cfg(feature = "float")]
    fn decode_double(&self, bits: u64) -> Result<Value<'buf>> {
        Ok(Value::Double(f64::from_bits(bits)))
    }

    #[cfg(not(feature = "float"))]
    fn decode_double(&self, _bits: u64) -> Result<Value<'buf>> {
        Err(CBORError::AllFloatDisabled)
    }

    /***********************************************************************************************
     * Built-in tag folding
     **********************************************************************************************/

    /// Fold the collected tag chain into the item. The tag nearest the content defines the
    /// item type; transforming tags further out then see the transformed content and fail
    /// its type check. Tags with no built-in meaning leave the item alone.
    fn fold_tags(&mut self, chain: &TagChain, value: Value<'buf>) -> Result<Value<'buf>> {
        let mut value = value;
        for &tag in chain.as_slice().iter().rev() {
            if tag == TAG_DECIMAL_FRACTION || tag == TAG_BIGFLOAT {
                value = self.decode_exp_mantissa(tag, value)?;
            } else if is_transforming(tag) {
                value = fold_builtin(tag, value)?;
            }
        }
        Ok(value)
    }

    /// Tags 4 and 5 wrap a two element array of exponent and mantissa. The array contents
    /// have not been consumed yet, so this reads them off the stream: a plain integer
    /// exponent, then an integer mantissa or a bignum under tag 2 or 3.
    fn decode_exp_mantissa(&mut self, tag: u64, value: Value<'buf>) -> Result<Value<'buf>> {
        match value {
            Value::Array(2) => {}
            _ => return Err(CBORError::BadExpMantissa),
        }
        let (next, head) = read_head(self.buf, self.index)?;
        self.index = next;
        let exponent = match head.major {
            MT_UINT if head.arg <= i64::MAX as u64 => head.arg as i64,
            MT_NINT if head.arg <= i64::MAX as u64 => -1 - (head.arg as i64),
            _ => return Err(CBORError::BadExpMantissa),
        };
        let (next, head) = read_head(self.buf, self.index)?;
        self.index = next;
        let mantissa = match head.major {
            MT_UINT if head.arg <= i64::MAX as u64 => Mantissa::Int(head.arg as i64),
            MT_NINT if head.arg <= i64::MAX as u64 => Mantissa::Int(-1 - (head.arg as i64)),
            MT_TAG if head.arg == TAG_POS_BIGNUM || head.arg == TAG_NEG_BIGNUM => {
                let negative = head.arg == TAG_NEG_BIGNUM;
                let (next, inner) = read_head(self.buf, self.index)?;
                if inner.major != MT_BSTR || inner.is_indefinite() {
                    return Err(CBORError::BadExpMantissa);
                }
                self.index = next;
                let bytes = self.read_extent(inner.arg)?;
                if negative {
                    Mantissa::NegBignum(bytes)
                } else {
                    Mantissa::PosBignum(bytes)
                }
            }
            _ => return Err(CBORError::BadExpMantissa),
        };
        Ok(if tag == TAG_DECIMAL_FRACTION {
            Value::DecimalFraction { exponent, mantissa }
        } else {
            Value::Bigfloat { exponent, mantissa }
        })
    }
}

/// The frame kind opened by a container value. Maps surfaced in map-as-array mode traverse
/// as arrays.
fn frame_kind(value: &Value) -> FrameKind {
    match value {
        Value::Map(_) => FrameKind::Map,
        _ => FrameKind::Array,
    }
}
