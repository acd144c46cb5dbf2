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
 * pullcbor CBOR nesting tracker
 *
 * A pull-based, zero-allocation deserializer for CBOR (RFC8949).
 * This implementation is designed for use in constrained systems and requires neither the Rust
 * standard library nor an allocator.
 **************************************************************************************************/
use crate::constants::{INDEFINITE_COUNT, MAX_NESTING};
use crate::error::{CBORError, Result};

/// The kind of an open container. Maps surfaced in map-as-array mode open `Array` frames
/// since they are traversed as plain item sequences.
#[derive(PartialEq, Eq, Debug, Copy, Clone)]
pub(crate) enum FrameKind {
    Array,
    Map,
}

/// One open nesting level: the container kind, its declared count, how many entries remain
/// unconsumed, the input offset of its first entry (for rewind) and whether map mode has
/// been entered at this level.
///
/// `count` and `remaining` are in entries as traversed: label/value pairs for maps, items
/// for arrays and for maps surfaced in map-as-array mode. `remaining` is meaningless for
/// indefinite length frames, whose end is found by the BREAK stop code instead.
#[derive(Debug, Copy, Clone)]
pub(crate) struct Frame {
    pub kind: FrameKind,
    pub count: u16,
    pub remaining: u16,
    pub start_offset: u32,
    pub bounded: bool,
}

impl Frame {
    #[inline]
    pub fn is_indefinite(&self) -> bool {
        self.count == INDEFINITE_COUNT
    }
}

const UNUSED_FRAME: Frame = Frame {
    kind: FrameKind::Array,
    count: 0,
    remaining: 0,
    start_offset: 0,
    bounded: false,
};

/// A fixed depth stack of open containers. Depth 0 is the top level with no frame open;
/// the item count of the stack bounds how deeply arrays and maps may nest.
#[derive(Debug, Copy, Clone)]
pub(crate) struct Nesting {
    frames: [Frame; MAX_NESTING],
    depth: usize,
}

impl Nesting {
    pub fn new() -> Self {
        Nesting {
            frames: [UNUSED_FRAME; MAX_NESTING],
            depth: 0,
        }
    }

    /// Current depth: the number of open frames.
    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.depth == 0
    }

    /// Open a new level. Fails with `NestingTooDeep` when the stack is full.
    pub fn push(&mut self, frame: Frame) -> Result<()> {
        if self.depth == MAX_NESTING {
            return Err(CBORError::NestingTooDeep);
        }
        self.frames[self.depth] = frame;
        self.depth += 1;
        Ok(())
    }

    /// Close the innermost level.
    pub fn pop(&mut self) {
        debug_assert!(self.depth > 0);
        if self.depth > 0 {
            self.depth -= 1;
        }
    }

    #[inline]
    pub fn innermost(&self) -> Option<&Frame> {
        if self.depth == 0 {
            None
        } else {
            Some(&self.frames[self.depth - 1])
        }
    }

    #[inline]
    pub fn innermost_mut(&mut self) -> Option<&mut Frame> {
        if self.depth == 0 {
            None
        } else {
            Some(&mut self.frames[self.depth - 1])
        }
    }

    /// Depth of the innermost bounded (map mode) frame, if any. Frames above it are
    /// transient traversal frames.
    pub fn bounded_depth(&self) -> Option<usize> {
        (0..self.depth).rev().find(|&i| self.frames[i].bounded).map(|i| i + 1)
    }

    /// The innermost bounded frame, if any.
    pub fn bounded_innermost(&self) -> Option<&Frame> {
        self.bounded_depth().map(|d| &self.frames[d - 1])
    }

    /// Drop all frames deeper than `depth`.
    pub fn truncate(&mut self, depth: usize) {
        debug_assert!(depth <= self.depth);
        if depth < self.depth {
            self.depth = depth;
        }
    }
}
