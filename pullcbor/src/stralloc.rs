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
 * pullcbor CBOR string storage API
 *
 * A pull-based, zero-allocation deserializer for CBOR (RFC8949).
 * This implementation is designed for use in constrained systems and requires neither the Rust
 * standard library nor an allocator.
 **************************************************************************************************/
use crate::constants::MEM_POOL_MIN_SIZE;
use crate::error::{CBORError, Result};

use std::mem;

#[cfg(feature = "trace")]
use func_trace::trace;

#[cfg(feature = "trace")]
func_trace::init_depth_var!();

/// Storage used to reassemble the chunks of an indefinite length string into one contiguous
/// slice (and, in all-strings mode, to copy every string out of the input buffer).
///
/// The decoder drives the storage strictly last-in-first-out: at most one allocation is ever
/// being built, it only grows, and once taken it is never touched again. A bump allocator
/// over a single fixed buffer therefore satisfies the protocol; [`MemPool`] is exactly that.
///
/// Committed slices carry the `'pool` lifetime of the backing buffer, which must outlive
/// every item decoded from them.
pub trait StringStorage<'pool> {
    /// Start building a new string. Fails if one is already being built.
    fn open(&mut self) -> Result<()>;

    /// Append `bytes` to the string being built.
    fn extend(&mut self, bytes: &[u8]) -> Result<()>;

    /// Finish the string being built and return it. The storage must not reuse the
    /// returned region afterwards.
    fn take(&mut self) -> Result<&'pool [u8]>;

    /// Discard the string being built, releasing its space.
    fn reset(&mut self);

    /// Tear the storage down. Called once from `finish`; the default does nothing.
    fn destruct(&mut self) {}
}

/// A bump allocator over a caller supplied buffer, sufficient for the decoder's
/// last-in-first-out storage protocol. Committed strings are carved off the front of the
/// buffer and stay valid for the buffer's lifetime; the remainder is reused for the next
/// string.
#[derive(Debug)]
pub struct MemPool<'pool> {
    free: &'pool mut [u8],
    pending: usize,
    building: bool,
}

impl<'pool> MemPool<'pool> {
    /// Construct a pool over `buf`. Buffers below [`MEM_POOL_MIN_SIZE`] bytes are rejected
    /// with `MemPoolSize`.
    #[cfg_attr(feature = "trace", trace)]
    pub fn new(buf: &'pool mut [u8]) -> Result<MemPool<'pool>> {
        if buf.len() < MEM_POOL_MIN_SIZE {
            Err(CBORError::MemPoolSize)
        } else {
            Ok(MemPool {
                free: buf,
                pending: 0,
                building: false,
            })
        }
    }

    /// Bytes still available for strings.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.free.len() - self.pending
    }
}

impl<'pool> StringStorage<'pool> for MemPool<'pool> {
    #[cfg_attr(feature = "trace", trace)]
    fn open(&mut self) -> Result<()> {
        if self.building {
            Err(CBORError::StringAllocate)
        } else {
            self.building = true;
            self.pending = 0;
            Ok(())
        }
    }

    #[cfg_attr(feature = "trace", trace)]
    fn extend(&mut self, bytes: &[u8]) -> Result<()> {
        if !self.building || bytes.len() > self.remaining() {
            return Err(CBORError::StringAllocate);
        }
        self.free[self.pending..self.pending + bytes.len()].copy_from_slice(bytes);
        self.pending += bytes.len();
        Ok(())
    }

    #[cfg_attr(feature = "trace", trace)]
    fn take(&mut self) -> Result<&'pool [u8]> {
        if !self.building {
            return Err(CBORError::StringAllocate);
        }
        let buf = mem::take(&mut self.free);
        let (done, rest) = buf.split_at_mut(self.pending);
        self.free = rest;
        self.pending = 0;
        self.building = false;
        Ok(done)
    }

    #[cfg_attr(feature = "trace", trace)]
    fn reset(&mut self) {
        self.pending = 0;
        self.building = false;
    }

    #[cfg_attr(feature = "trace", trace)]
    fn destruct(&mut self) {
        self.reset();
        self.free = &mut [];
    }
}
