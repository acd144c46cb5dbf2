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
 * pullcbor CBOR Map mode API
 *
 * A pull-based, zero-allocation deserializer for CBOR (RFC8949).
 * This implementation is designed for use in constrained systems and requires neither the Rust
 * standard library nor an allocator.
 **************************************************************************************************/
/// # Map mode
///
/// Entering a map or array bounds the pre-order traversal inside it and enables access by
/// label: [`CBORDecoder::get_item_in_map_int`] and friends rescan the container on every
/// call, always walking it to the end so duplicated labels are caught. Bulk lookup via
/// [`CBORDecoder::get_items_in_map`] fetches several labels in the same single rescan and
/// is what callers should reach for when decoding record-like maps.
use crate::decode::CBORDecoder;
use crate::error::{CBORError, Result};
use crate::item::{Item, Label, Value, ValueKind};
use crate::nesting::FrameKind;

#[cfg(feature = "trace")]
use func_trace::trace;

#[cfg(feature = "trace")]
func_trace::init_depth_var!();

/// A label to search an entered map for. Integer labels match both integer
/// representations; text labels match text strings only.
#[derive(Debug, Copy, Clone)]
pub enum SearchLabel<'q> {
    Int(i64),
    Text(&'q str),
}

/// One entry of a bulk map query: the label to find, the item type it is required to have
/// (or [`ValueKind::Any`]), and the found item. Labels that were not present leave
/// `item.value` as [`Value::None`].
#[derive(Debug, Copy, Clone)]
pub struct MapQuery<'q, 'buf> {
    pub label: SearchLabel<'q>,
    pub expected: ValueKind,
    pub item: Item<'buf>,
}

impl<'q, 'buf> MapQuery<'q, 'buf> {
    pub fn new(label: SearchLabel<'q>, expected: ValueKind) -> Self {
        MapQuery {
            label,
            expected,
            item: Item::none(),
        }
    }
}

/// Return `true` if `label` is the one `search` asks for.
fn label_matches(search: &SearchLabel, label: &Label) -> bool {
    match (search, label) {
        (SearchLabel::Int(n), Label::Int(v)) => n == v,
        (SearchLabel::Int(n), Label::UInt(v)) => *n >= 0 && (*n as u64) == *v,
        (SearchLabel::Text(s), Label::Tstr(t)) => s == t,
        _ => false,
    }
}

/// Label equality for duplicate detection. The two integer representations compare
/// numerically; strings compare bytewise.
fn labels_equal(a: &Label, b: &Label) -> bool {
    match (a, b) {
        (Label::Int(x), Label::Int(y)) => x == y,
        (Label::UInt(x), Label::UInt(y)) => x == y,
        (Label::Int(x), Label::UInt(y)) | (Label::UInt(y), Label::Int(x)) => {
            *x >= 0 && (*x as u64) == *y
        }
        (Label::Tstr(x), Label::Tstr(y)) => x == y,
        (Label::Bstr(x), Label::Bstr(y)) => x == y,
        _ => false,
    }
}

impl<'buf> CBORDecoder<'buf> {
    /// Abort if an earlier operation already latched an error.
    pub(crate) fn guard(&self) -> Result<()> {
        match self.last_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /***********************************************************************************************
     * Entering and leaving containers
     **********************************************************************************************/

    /// Consume the next item, which must be a map, and bound the traversal inside it.
    #[cfg_attr(feature = "trace", trace)]
    pub fn enter_map(&mut self) -> Result<()> {
        self.guard()?;
        match self.next_in_order(Some(FrameKind::Map)) {
            Ok(_) => Ok(()),
            Err(e) => Err(self.latch(e)),
        }
    }

    /// Consume the next item, which must be an array (or a map surfaced in map-as-array
    /// mode), and bound the traversal inside it.
    #[cfg_attr(feature = "trace", trace)]
    pub fn enter_array(&mut self) -> Result<()> {
        self.guard()?;
        match self.next_in_order(Some(FrameKind::Array)) {
            Ok(_) => Ok(()),
            Err(e) => Err(self.latch(e)),
        }
    }

    /// Leave the entered map, consuming whatever of it remains untraversed. The cursor ends
    /// up on the first item after the map.
    pub fn exit_map(&mut self) -> Result<()> {
        self.exit_bounded(FrameKind::Map)
    }

    /// Leave the entered array, consuming whatever of it remains untraversed.
    pub fn exit_array(&mut self) -> Result<()> {
        self.exit_bounded(FrameKind::Array)
    }

    fn exit_bounded(&mut self, kind: FrameKind) -> Result<()> {
        self.guard()?;
        match self.exit_bounded_inner(kind) {
            Ok(()) => Ok(()),
            Err(e) => Err(self.latch(e)),
        }
    }

    #[cfg_attr(feature = "trace", trace)]
    fn exit_bounded_inner(&mut self, kind: FrameKind) -> Result<()> {
        let frame = match self.nesting.bounded_innermost() {
            Some(f) => *f,
            None => return Err(CBORError::MapNotEntered),
        };
        if frame.kind != kind {
            return Err(CBORError::ExitMismatch);
        }
        // Scan forward over the unconsumed remainder of the container
        loop {
            match self.next_in_order(None) {
                Ok(_) => continue,
                Err(CBORError::NoMoreItems) => break,
                Err(e) => return Err(e),
            }
        }
        if frame.is_indefinite() {
            // at_bounded_end left the cursor on the BREAK stop code
            self.index += 1;
        }
        self.nesting.pop();
        // The container as a whole is one consumed entry of its parent
        self.complete_one();
        Ok(())
    }

    /// Reset the traversal to the first entry of the entered container. The frame stays
    /// entered.
    pub fn rewind_map(&mut self) -> Result<()> {
        self.guard()?;
        match self.rewind_inner() {
            Ok(()) => Ok(()),
            Err(e) => Err(self.latch(e)),
        }
    }

    pub(crate) fn rewind_inner(&mut self) -> Result<()> {
        let depth = match self.nesting.bounded_depth() {
            Some(d) => d,
            None => return Err(CBORError::MapNotEntered),
        };
        self.nesting.truncate(depth);
        let start = match self.nesting.innermost_mut() {
            Some(f) => {
                f.remaining = f.count;
                f.start_offset as usize
            }
            None => return Err(CBORError::MapNotEntered),
        };
        self.index = start;
        Ok(())
    }

    /***********************************************************************************************
     * Access by label
     **********************************************************************************************/

    /// Find the entry labelled with the integer `label` in the entered map. The whole map
    /// is scanned on every call: duplicated labels anywhere in it fail with
    /// `DuplicateLabel`, and the traversal cursor is back where it started when the call
    /// returns. `expected` asserts the type of the found item.
    ///
    /// A missing label reports `LabelNotFound` without latching it, so decoding of
    /// optional entries can carry on.
    #[cfg_attr(feature = "trace", trace)]
    pub fn get_item_in_map_int(&mut self, label: i64, expected: ValueKind) -> Result<Item<'buf>> {
        self.guard()?;
        let mut queries = [MapQuery::new(SearchLabel::Int(label), expected)];
        self.search_one(&mut queries)
    }

    /// As [`CBORDecoder::get_item_in_map_int`] for a text string label.
    #[cfg_attr(feature = "trace", trace)]
    pub fn get_item_in_map_text(
        &mut self,
        label: &str,
        expected: ValueKind,
    ) -> Result<Item<'buf>> {
        self.guard()?;
        let mut queries = [MapQuery::new(SearchLabel::Text(label), expected)];
        self.search_one(&mut queries)
    }

    /// Fetch several labelled entries in one rescan of the entered map. Entries whose
    /// label is absent come back with `Value::None`; duplicated labels anywhere in the map
    /// fail with `DuplicateLabel`.
    pub fn get_items_in_map(&mut self, queries: &mut [MapQuery<'_, 'buf>]) -> Result<()> {
        self.guard()?;
        match self.map_scan(queries, None) {
            Ok(()) => Ok(()),
            Err(e) => Err(self.latch(e)),
        }
    }

    /// As [`CBORDecoder::get_items_in_map`], additionally handing every entry that matches
    /// none of the queries to `callback`. An error from the callback aborts the scan with
    /// `CallbackFail`.
    pub fn get_items_in_map_with_callback(
        &mut self,
        queries: &mut [MapQuery<'_, 'buf>],
        callback: &mut dyn FnMut(&Item<'buf>) -> Result<()>,
    ) -> Result<()> {
        self.guard()?;
        match self.map_scan(queries, Some(callback)) {
            Ok(()) => Ok(()),
            Err(e) => Err(self.latch(e)),
        }
    }

    /// Find the map labelled `label` in the entered map and enter it.
    pub fn enter_map_from_map_int(&mut self, label: i64) -> Result<()> {
        self.enter_from_map(SearchLabel::Int(label), FrameKind::Map)
    }

    /// Find the map labelled `label` in the entered map and enter it.
    pub fn enter_map_from_map_text(&mut self, label: &str) -> Result<()> {
        self.enter_from_map(SearchLabel::Text(label), FrameKind::Map)
    }

    /// Find the array labelled `label` in the entered map and enter it.
    pub fn enter_array_from_map_int(&mut self, label: i64) -> Result<()> {
        self.enter_from_map(SearchLabel::Int(label), FrameKind::Array)
    }

    /// Find the array labelled `label` in the entered map and enter it.
    pub fn enter_array_from_map_text(&mut self, label: &str) -> Result<()> {
        self.enter_from_map(SearchLabel::Text(label), FrameKind::Array)
    }

    /***********************************************************************************************
     * Search internals
     **********************************************************************************************/

    /// Run a single-label search, reporting a latched error for everything except a plain
    /// missing label.
    pub(crate) fn search_one(
        &mut self,
        queries: &mut [MapQuery<'_, 'buf>; 1],
    ) -> Result<Item<'buf>> {
        match self.map_scan(queries, None) {
            Ok(()) => {}
            Err(e) => return Err(self.latch(e)),
        }
        if queries[0].item.value == Value::None {
            return Err(CBORError::LabelNotFound);
        }
        Ok(queries[0].item)
    }

    /// One full scan of the entered map. Matches are written into `queries`; entries
    /// matching no query go to `callback` when one is given. The traversal cursor is
    /// restored afterwards whatever happens.
    fn map_scan(
        &mut self,
        queries: &mut [MapQuery<'_, 'buf>],
        mut callback: Option<&mut dyn FnMut(&Item<'buf>) -> Result<()>>,
    ) -> Result<()> {
        let bound_depth = match self.nesting.bounded_depth() {
            Some(d) => d,
            None => return Err(CBORError::MapNotEntered),
        };
        // Labels are only parsed for true map frames
        if self.nesting.bounded_innermost().map(|f| f.kind) != Some(FrameKind::Map) {
            return Err(CBORError::MapNotEntered);
        }
        let origin = self.mark();
        let result = self.map_scan_inner(bound_depth, queries, &mut callback);
        self.seek(origin);
        result
    }

    fn map_scan_inner(
        &mut self,
        bound_depth: usize,
        queries: &mut [MapQuery<'_, 'buf>],
        callback: &mut Option<&mut dyn FnMut(&Item<'buf>) -> Result<()>>,
    ) -> Result<()> {
        self.rewind_inner()?;
        for q in queries.iter_mut() {
            q.item = Item::none();
        }
        loop {
            if self.at_bounded_end()? {
                break;
            }
            let entry = self.next_entry(bound_depth)?;
            // Compare against every later entry so duplicates are caught whichever label
            // is being asked for
            let here = self.mark();
            loop {
                if self.at_bounded_end()? {
                    break;
                }
                let other = self.next_entry(bound_depth)?;
                if labels_equal(&entry.label, &other.label) {
                    return Err(CBORError::DuplicateLabel);
                }
            }
            self.seek(here);
            let mut claimed = false;
            for q in queries.iter_mut() {
                if label_matches(&q.label, &entry.label) {
                    if q.expected != ValueKind::Any && q.expected != entry.value.kind() {
                        return Err(CBORError::UnexpectedType);
                    }
                    q.item = entry;
                    claimed = true;
                }
            }
            if !claimed {
                if let Some(cb) = callback {
                    if cb(&entry).is_err() {
                        return Err(CBORError::CallbackFail);
                    }
                }
            }
        }
        Ok(())
    }

    /// Consume one entry at the bounded level, including the whole subtree of a container
    /// entry, and return it.
    fn next_entry(&mut self, bound_depth: usize) -> Result<Item<'buf>> {
        let (item, _) = self.next_in_order(None)?;
        while self.nesting.depth() > bound_depth {
            self.next_in_order(None)?;
        }
        Ok(item)
    }

    fn enter_from_map(&mut self, label: SearchLabel<'_>, kind: FrameKind) -> Result<()> {
        self.guard()?;
        match self.enter_from_map_inner(label, kind) {
            Ok(()) => Ok(()),
            Err(CBORError::LabelNotFound) => Err(CBORError::LabelNotFound),
            Err(e) => Err(self.latch(e)),
        }
    }

    #[cfg_attr(feature = "trace", trace)]
    fn enter_from_map_inner(&mut self, label: SearchLabel<'_>, kind: FrameKind) -> Result<()> {
        let expected = match kind {
            FrameKind::Map => ValueKind::Map,
            FrameKind::Array => ValueKind::Array,
        };
        let mut queries = [MapQuery::new(label, expected)];
        self.map_scan(&mut queries, None)?;
        if queries[0].item.value == Value::None {
            return Err(CBORError::LabelNotFound);
        }
        // Position on the matching entry and enter its value
        let bound_depth = match self.nesting.bounded_depth() {
            Some(d) => d,
            None => return Err(CBORError::MapNotEntered),
        };
        self.rewind_inner()?;
        loop {
            let start = self.mark();
            if self.at_bounded_end()? {
                return Err(CBORError::LabelNotFound);
            }
            let entry = self.next_entry(bound_depth)?;
            if label_matches(&queries[0].label, &entry.label) {
                self.seek(start);
                self.next_in_order(Some(kind))?;
                return Ok(());
            }
        }
    }
}
