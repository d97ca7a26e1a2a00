// ttfautohint/src/memory.rs
//
// Copyright © 2018 The Pathfinder Project Developers.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Memory shared with the hinting engine.
//!
//! The engine allocates its output and the name table strings it hands to callbacks with the
//! allocator it was given. Everything that frees or resizes that memory on this side must go
//! through the same allocator.

use libc::{c_void, size_t};
use std::alloc::{self, Layout};
use std::cmp;
use std::fmt::{self, Debug, Formatter};
use std::marker::PhantomData;
use std::ptr;
use std::slice;

use crate::error::Overflow;

/// The largest string a name record can hold. Its length field is 16 bits wide.
pub const MAX_STRING_LENGTH: usize = 0xFFFF;

/// The signature of the `alloc-func` option.
pub type AllocFunc = unsafe extern "C" fn(size: size_t) -> *mut c_void;

/// The signature of the `free-func` option.
pub type FreeFunc = unsafe extern "C" fn(ptr: *mut c_void);

/// The allocator shared by this crate and the hinting engine.
pub trait Allocator {
    /// The function passed to the engine as `alloc-func`.
    fn alloc_func(&self) -> AllocFunc;

    /// The function passed to the engine as `free-func`.
    fn free_func(&self) -> FreeFunc;

    /// Resizes a block to exactly `size` bytes, returning null on failure.
    unsafe fn realloc(&self, ptr: *mut c_void, size: usize) -> *mut c_void;

    /// Allocates `size` bytes, returning null on failure.
    #[inline]
    unsafe fn alloc(&self, size: usize) -> *mut c_void {
        (self.alloc_func())(size)
    }

    /// Releases a block previously returned by this allocator or by the engine.
    #[inline]
    unsafe fn free(&self, ptr: *mut c_void) {
        (self.free_func())(ptr)
    }
}

/// The C runtime's `malloc`, `realloc` and `free`.
///
/// This is what the engine uses when no allocator is passed, and what it is linked against.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemAllocator;

impl Allocator for SystemAllocator {
    #[inline]
    fn alloc_func(&self) -> AllocFunc {
        libc::malloc
    }

    #[inline]
    fn free_func(&self) -> FreeFunc {
        libc::free
    }

    #[inline]
    unsafe fn realloc(&self, ptr: *mut c_void, size: usize) -> *mut c_void {
        libc::realloc(ptr, size)
    }
}

/// A native byte string whose buffer and length are both reached through pointers, so that it
/// can be reallocated in place on behalf of the engine.
///
/// The length stored behind the length pointer always equals the size of the buffer.
pub struct MutableByteString<'a> {
    string: *mut *mut u8,
    len: *mut u16,
    allocator: &'a dyn Allocator,
    phantom: PhantomData<&'a mut u8>,
}

impl<'a> MutableByteString<'a> {
    /// Wraps a string owned by native code.
    ///
    /// # Safety
    ///
    /// `string` and `len` must be valid for reads and writes for `'a`, and `*string` must point
    /// to `*len` initialized bytes allocated by `allocator` (or be null if `*len` is 0).
    pub unsafe fn from_raw(string: *mut *mut u8, len: *mut u16, allocator: &'a dyn Allocator)
                           -> MutableByteString<'a> {
        MutableByteString {
            string,
            len,
            allocator,
            phantom: PhantomData,
        }
    }

    /// Returns the current length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        unsafe { *self.len as usize }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the current contents.
    pub fn as_bytes(&self) -> &[u8] {
        unsafe {
            let string = *self.string;
            if string.is_null() || self.is_empty() {
                &[]
            } else {
                slice::from_raw_parts(string, self.len())
            }
        }
    }

    /// Returns a copy of the current contents.
    #[inline]
    pub fn to_bytes(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }

    /// Replaces the contents, reallocating the native buffer to exactly the new size.
    ///
    /// If `bytes` does not fit in a name record the string is left unchanged.
    pub fn replace(&mut self, bytes: &[u8]) -> Result<(), Overflow> {
        let new_len = bytes.len();
        if new_len > MAX_STRING_LENGTH {
            return Err(Overflow { len: new_len });
        }

        unsafe {
            // A zero-sized `realloc` may free the block and return null.
            let size = cmp::max(new_len, 1);
            let new_string = self.allocator.realloc(*self.string as *mut c_void, size) as *mut u8;
            if new_string.is_null() {
                alloc::handle_alloc_error(Layout::from_size_align_unchecked(size, 1));
            }
            ptr::copy_nonoverlapping(bytes.as_ptr(), new_string, new_len);
            *self.string = new_string;
            *self.len = new_len as u16;
        }
        Ok(())
    }
}

impl<'a> Debug for MutableByteString<'a> {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        fmt.debug_struct("MutableByteString")
           .field("bytes", &self.as_bytes())
           .finish()
    }
}

/// A byte string allocated through an `Allocator` and owned by this side.
///
/// This is how strings are prepared for code that expects engine-owned name records.
pub struct NativeString<'a> {
    string: *mut u8,
    len: u16,
    allocator: &'a dyn Allocator,
}

impl<'a> NativeString<'a> {
    /// Copies `bytes` into a new native allocation.
    pub fn new(bytes: &[u8], allocator: &'a dyn Allocator) -> Result<NativeString<'a>, Overflow> {
        if bytes.len() > MAX_STRING_LENGTH {
            return Err(Overflow { len: bytes.len() });
        }
        unsafe {
            let size = cmp::max(bytes.len(), 1);
            let string = allocator.alloc(size) as *mut u8;
            if string.is_null() {
                alloc::handle_alloc_error(Layout::from_size_align_unchecked(size, 1));
            }
            ptr::copy_nonoverlapping(bytes.as_ptr(), string, bytes.len());
            Ok(NativeString {
                string,
                len: bytes.len() as u16,
                allocator,
            })
        }
    }

    /// Returns the pointer-to-pointer and pointer-to-length pair that native callbacks receive.
    ///
    /// The pointers stay valid as long as this string is neither moved nor dropped.
    #[inline]
    pub fn as_raw_parts(&mut self) -> (*mut *mut u8, *mut u16) {
        (&mut self.string as *mut *mut u8, &mut self.len as *mut u16)
    }

    /// Borrows the string as a `MutableByteString`.
    pub fn as_mutable(&mut self) -> MutableByteString<'_> {
        let allocator = self.allocator;
        unsafe { MutableByteString::from_raw(&mut self.string, &mut self.len, allocator) }
    }

    pub fn as_bytes(&self) -> &[u8] {
        unsafe { slice::from_raw_parts(self.string, self.len as usize) }
    }
}

impl<'a> Drop for NativeString<'a> {
    fn drop(&mut self) {
        unsafe { self.allocator.free(self.string as *mut c_void) }
    }
}

/// A buffer allocated by the engine and handed over to this side.
///
/// It is released through the allocator exactly once, when dropped.
pub(crate) struct NativeBuffer<'a> {
    buffer: *mut u8,
    len: usize,
    allocator: &'a dyn Allocator,
}

impl<'a> NativeBuffer<'a> {
    /// Takes ownership of `len` bytes at `buffer`.
    ///
    /// # Safety
    ///
    /// `buffer` must be null or a block of at least `len` bytes allocated by `allocator`, and
    /// nothing else may free it.
    pub(crate) unsafe fn from_raw(buffer: *mut u8, len: usize, allocator: &'a dyn Allocator)
                                  -> NativeBuffer<'a> {
        NativeBuffer {
            buffer,
            len,
            allocator,
        }
    }

    pub(crate) fn is_null(&self) -> bool {
        self.buffer.is_null()
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        if self.buffer.is_null() {
            &[]
        } else {
            unsafe { slice::from_raw_parts(self.buffer, self.len) }
        }
    }
}

impl<'a> Drop for NativeBuffer<'a> {
    fn drop(&mut self) {
        if !self.buffer.is_null() {
            unsafe { self.allocator.free(self.buffer as *mut c_void) }
            self.buffer = ptr::null_mut();
        }
    }
}
