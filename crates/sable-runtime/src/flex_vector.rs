//! Growable typed numeric buffer
//!
//! Backing store of the specialized numeric vectors. Capacity is always at
//! least the length; it doubles on overflow, shrinks to the exact length
//! when the length is reduced, and resets to [`INITIAL_CAPACITY`] when the
//! length becomes zero. A fixed buffer rejects every length change.

use crate::error::{RtResult, RuntimeError};
use std::cmp::Ordering;
use std::fmt;

/// Capacity of an empty buffer
pub const INITIAL_CAPACITY: usize = 3;

/// Longest buffer [`FlexVector::set_len`] will materialize
pub const MAX_LENGTH: usize = 1 << 26;

/// Element kinds a [`FlexVector`] can hold
pub trait FlexElement: Copy + Default + PartialOrd + fmt::Debug + 'static {
    /// Total order used by [`FlexVector::sort`]: NaN after every number
    fn total_cmp(&self, other: &Self) -> Ordering;
}

impl FlexElement for i32 {
    fn total_cmp(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

impl FlexElement for u32 {
    fn total_cmp(&self, other: &Self) -> Ordering {
        self.cmp(other)
    }
}

macro_rules! float_element {
    ($t:ty) => {
        impl FlexElement for $t {
            fn total_cmp(&self, other: &Self) -> Ordering {
                match (self.is_nan(), other.is_nan()) {
                    (true, true) => Ordering::Equal,
                    (true, false) => Ordering::Greater,
                    (false, true) => Ordering::Less,
                    (false, false) => <$t>::total_cmp(self, other),
                }
            }
        }
    };
}

float_element!(f32);
float_element!(f64);

/// Resizable sequence of one numeric element kind
#[derive(Clone)]
pub struct FlexVector<T: FlexElement> {
    /// Allocated storage; `buf.len()` is the capacity
    buf: Vec<T>,
    length: usize,
    fixed: bool,
}

impl<T: FlexElement> FlexVector<T> {
    /// Buffer of `length` zero elements
    pub fn new(length: usize, fixed: bool) -> Self {
        Self {
            buf: vec![T::default(); length.max(INITIAL_CAPACITY)],
            length,
            fixed,
        }
    }

    /// Buffer holding a copy of `items`
    pub fn from_slice(items: &[T], fixed: bool) -> Self {
        if items.is_empty() {
            return Self::new(0, fixed);
        }
        Self {
            buf: items.to_vec(),
            length: items.len(),
            fixed,
        }
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.length
    }

    /// Whether the buffer has no elements
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Allocated capacity
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Whether length changes are rejected
    pub fn fixed(&self) -> bool {
        self.fixed
    }

    /// Allow or reject length changes
    pub fn set_fixed(&mut self, fixed: bool) {
        self.fixed = fixed;
    }

    /// Change the length. New elements are zero; lengths past
    /// [`MAX_LENGTH`] are a range error.
    pub fn set_len(&mut self, length: usize) -> RtResult<()> {
        if length == self.length {
            return Ok(());
        }
        self.check_not_fixed()?;
        if length > MAX_LENGTH {
            return Err(RuntimeError::RangeError(format!(
                "Vector length {} exceeds {}",
                length, MAX_LENGTH
            )));
        }
        if length == 0 {
            self.buf = vec![T::default(); INITIAL_CAPACITY];
        } else if length > self.buf.len() {
            self.buf[self.length..].fill(T::default());
            self.buf.resize(length, T::default());
        } else if length < self.length {
            self.buf.truncate(length);
            self.buf.shrink_to_fit();
        } else {
            self.buf[self.length..length].fill(T::default());
        }
        self.length = length;
        Ok(())
    }

    /// Whether `index` addresses an element
    pub fn has_index(&self, index: usize) -> bool {
        index < self.length
    }

    /// Element at `index`, or zero when out of range
    pub fn get(&self, index: usize) -> T {
        if index < self.length {
            self.buf[index]
        } else {
            T::default()
        }
    }

    /// Store at `index`. Storing exactly at the length appends.
    pub fn set(&mut self, index: usize, value: T) -> RtResult<()> {
        if index == self.length {
            self.push(value)?;
            return Ok(());
        }
        if index > self.length {
            return Err(RuntimeError::IndexOutOfRange {
                index: index as u64,
                length: self.length,
            });
        }
        self.buf[index] = value;
        Ok(())
    }

    /// Append an element, returning the new length
    pub fn push(&mut self, value: T) -> RtResult<usize> {
        self.check_not_fixed()?;
        self.reserve_for(self.length + 1);
        self.buf[self.length] = value;
        self.length += 1;
        Ok(self.length)
    }

    /// Remove the last element; zero when empty
    pub fn pop(&mut self) -> RtResult<T> {
        self.check_not_fixed()?;
        if self.length == 0 {
            return Ok(T::default());
        }
        self.length -= 1;
        Ok(self.buf[self.length])
    }

    /// Prepend elements, returning the new length
    pub fn unshift(&mut self, items: &[T]) -> RtResult<usize> {
        self.check_not_fixed()?;
        let count = items.len();
        self.reserve_for(self.length + count);
        self.buf.copy_within(0..self.length, count);
        self.buf[..count].copy_from_slice(items);
        self.length += count;
        Ok(self.length)
    }

    /// Insert an element; indices past the end append
    pub fn insert_at(&mut self, index: usize, value: T) -> RtResult<()> {
        self.check_not_fixed()?;
        let index = index.min(self.length);
        self.reserve_for(self.length + 1);
        self.buf.copy_within(index..self.length, index + 1);
        self.buf[index] = value;
        self.length += 1;
        Ok(())
    }

    /// Remove and return the element at `index`
    pub fn remove_at(&mut self, index: usize) -> RtResult<T> {
        self.check_not_fixed()?;
        if index >= self.length {
            return Err(RuntimeError::IndexOutOfRange {
                index: index as u64,
                length: self.length,
            });
        }
        let removed = self.buf[index];
        self.buf.copy_within(index + 1..self.length, index);
        self.length -= 1;
        Ok(removed)
    }

    /// Remove `delete_count` elements at `start` (negative counts from the
    /// end; `None` removes through the end), insert `items` in their place,
    /// and return the removed elements.
    pub fn splice(
        &mut self,
        start: i64,
        delete_count: Option<usize>,
        items: &[T],
    ) -> RtResult<FlexVector<T>> {
        let start = relative_index(start, self.length);
        let delete_count = delete_count
            .unwrap_or(self.length - start)
            .min(self.length - start);
        if delete_count != items.len() {
            self.check_not_fixed()?;
        }

        let mut elements = self.to_vec();
        let removed: Vec<T> = elements
            .splice(start..start + delete_count, items.iter().copied())
            .collect();
        self.replace_contents(elements);
        Ok(FlexVector::from_slice(&removed, false))
    }

    /// Copy of the elements in `start..end` (negative indices count from
    /// the end)
    pub fn slice(&self, start: i64, end: i64) -> FlexVector<T> {
        let start = relative_index(start, self.length);
        let end = relative_index(end, self.length);
        if start >= end {
            return FlexVector::new(0, false);
        }
        FlexVector::from_slice(&self.buf[start..end], false)
    }

    /// Sort in place with a comparator
    pub fn sort_by<F>(&mut self, compare: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        self.buf[..self.length].sort_by(compare);
    }

    /// Sort ascending. NaN sorts last and `-0` before `0`.
    pub fn sort(&mut self) {
        self.sort_by(T::total_cmp);
    }

    /// Elements as a slice
    pub fn as_slice(&self) -> &[T] {
        &self.buf[..self.length]
    }

    /// Iterate over the elements
    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.as_slice().iter().copied()
    }

    /// Copy of the elements
    pub fn to_vec(&self) -> Vec<T> {
        self.as_slice().to_vec()
    }

    fn check_not_fixed(&self) -> RtResult<()> {
        if self.fixed {
            Err(RuntimeError::FixedSizeViolation)
        } else {
            Ok(())
        }
    }

    /// Double the capacity until `needed` elements fit
    fn reserve_for(&mut self, needed: usize) {
        let mut capacity = self.buf.len().max(1);
        while capacity < needed {
            capacity *= 2;
        }
        if capacity > self.buf.len() {
            self.buf.resize(capacity, T::default());
        }
    }

    fn replace_contents(&mut self, elements: Vec<T>) {
        let length = elements.len();
        let capacity = self.buf.len();
        self.buf = elements;
        self.length = length;
        if length == 0 {
            self.buf = vec![T::default(); INITIAL_CAPACITY];
        } else if length < capacity {
            self.buf.resize(capacity, T::default());
        } else {
            self.reserve_for(length);
        }
    }
}

impl<T: FlexElement> fmt::Debug for FlexVector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlexVector")
            .field("items", &self.as_slice())
            .field("capacity", &self.capacity())
            .field("fixed", &self.fixed)
            .finish()
    }
}

impl<T: FlexElement> Default for FlexVector<T> {
    fn default() -> Self {
        Self::new(0, false)
    }
}

fn relative_index(index: i64, length: usize) -> usize {
    if index < 0 {
        let back = index.unsigned_abs() as usize;
        length.saturating_sub(back)
    } else {
        (index as usize).min(length)
    }
}
