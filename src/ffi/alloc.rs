//! The only allocation paths used for memory handed across the boundary

use std::ffi::{c_char, c_int, CString};
use std::ptr;

/// Longest array the boundary can describe with a `c_int` count
pub(crate) const MAX_LEN: usize = c_int::MAX as usize;

/// Copy `s` into a fresh NUL-terminated allocation owned by the caller.
///
/// An empty string still yields a valid one byte allocation. Anything after
/// an interior NUL is dropped, since a C reader would stop there anyway.
pub fn copy_string(s: &str) -> *mut c_char {
    let text = match s.find('\0') {
        Some(end) => &s[..end],
        None => s,
    };
    CString::new(text).unwrap_or_default().into_raw()
}

/// Release a string made by [`copy_string`]. Null is a no-op.
///
/// # Safety
/// `ptr` must be null or come from [`copy_string`], and must not be used
/// afterwards.
pub unsafe fn free_string(ptr: *mut c_char) {
    if ptr.is_null() {
        return;
    }
    unsafe {
        drop(CString::from_raw(ptr));
    }
}

/// Hand `items` over as one contiguous allocation.
///
/// The returned pointer is never null, even for an empty `Vec`, and the
/// count always equals the allocation length.
pub fn leak_array<T>(mut items: Vec<T>) -> (*mut T, c_int) {
    items.truncate(MAX_LEN);
    let boxed = items.into_boxed_slice();
    let count = boxed.len() as c_int;
    (Box::into_raw(boxed).cast::<T>(), count)
}

/// Take back an allocation made by [`leak_array`]. Null yields an empty
/// `Vec`; a negative count is read as zero.
///
/// # Safety
/// `ptr` must be null or the pointer [`leak_array`] returned together with
/// exactly `count`.
pub unsafe fn reclaim_array<T>(ptr: *mut T, count: c_int) -> Vec<T> {
    if ptr.is_null() {
        return Vec::new();
    }
    let len = usize::try_from(count).unwrap_or(0);
    unsafe { Box::from_raw(ptr::slice_from_raw_parts_mut(ptr, len)).into_vec() }
}

pub fn leak_boxed<T>(value: T) -> *mut T {
    Box::into_raw(Box::new(value))
}

/// # Safety
/// `ptr` must be null or come from [`leak_boxed`] with the same `T`.
pub unsafe fn reclaim_boxed<T>(ptr: *mut T) -> Option<Box<T>> {
    if ptr.is_null() {
        None
    } else {
        Some(unsafe { Box::from_raw(ptr) })
    }
}
