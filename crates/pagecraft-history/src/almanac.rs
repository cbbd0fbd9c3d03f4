#![forbid(unsafe_code)]

//! Fixed-capacity, pointer-addressed action log.
//!
//! The [`Almanac`] keeps a constant number of slots. The newest entry sits in
//! the last slot and the pointer marks the entry that undo would revert next.
//!
//! ```text
//! commit(a4)                       size = 5
//! ┌──────┬──────┬──────┬──────┬──────┐
//! │  ·   │  a1  │  a2  │  a3  │  a4  │   pointer = 4 (head)
//! └──────┴──────┴──────┴──────┴──────┘
//!
//! back() x2  -> returns a4, then a3
//! ┌──────┬──────┬──────┬──────┬──────┐
//! │  ·   │  a1  │  a2  │  a3  │  a4  │   pointer = 2
//! └──────┴──────┴──────┴──────┴──────┘
//!
//! commit(a5) <-- new branch: a3, a4 pruned, buffer left-padded
//! ┌──────┬──────┬──────┬──────┬──────┐
//! │  ·   │  ·   │  a1  │  a2  │  a5  │   pointer = 4 (head)
//! └──────┴──────┴──────┴──────┴──────┘
//! ```
//!
//! # Invariants
//!
//! 1. `entries.len() == size` after every operation
//! 2. `pointer <= size - 1`; `pointer == size - 1` means "at the head"
//! 3. Every slot after the pointer holds an undone (redoable) entry
//! 4. Slot 0 is the floor: the entry there can never be stepped back over,
//!    so an almanac of size N retains N - 1 undoable steps

use std::collections::VecDeque;
use std::fmt;

use crate::error::IntegrityError;

/// Ring buffer of committed entries with an undo/redo pointer.
pub struct Almanac<T> {
    size: usize,
    entries: VecDeque<Option<T>>,
    pointer: usize,
}

impl<T> fmt::Debug for Almanac<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Almanac")
            .field("size", &self.size)
            .field("retained", &self.len())
            .field("pointer", &self.pointer)
            .finish()
    }
}

impl<T> Almanac<T> {
    /// Create an almanac with `size` slots (at least one).
    #[must_use]
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            size,
            entries: Self::empty_slots(size),
            pointer: size - 1,
        }
    }

    fn empty_slots(count: usize) -> VecDeque<Option<T>> {
        (0..count).map(|_| None).collect()
    }

    /// Commit a new entry, pruning any redo branch and evicting the oldest
    /// entry to keep the length constant.
    ///
    /// # Panics
    ///
    /// Panics if the size invariant has been violated.
    pub fn commit(&mut self, entry: T) {
        if let Err(err) = self.size_invariant_check() {
            panic!("[Almanac] {err}");
        }

        if !self.is_at_head() {
            self.prune_branch();
        }

        self.entries.push_back(Some(entry));
        self.entries.pop_front();
    }

    /// Drop everything after the pointer and left-pad back to `size`.
    fn prune_branch(&mut self) {
        self.entries.truncate(self.pointer + 1);
        while self.entries.len() < self.size {
            self.entries.push_front(None);
        }
        self.pointer = self.size - 1;
    }

    /// Step back: return the entry at the pointer and move below it.
    ///
    /// Returns `None` at the oldest retained entry.
    pub fn back(&mut self) -> Option<&T> {
        if self.pointer == 0 || self.entries[self.pointer].is_none() {
            return None;
        }
        let index = self.pointer;
        self.pointer -= 1;
        self.entries[index].as_ref()
    }

    /// Step forward: move the pointer up and return the entry now in scope.
    ///
    /// Returns `None` at the head.
    pub fn forward(&mut self) -> Option<&T> {
        let next = self.pointer + 1;
        if next >= self.size || self.entries[next].is_none() {
            return None;
        }
        self.pointer = next;
        self.entries[next].as_ref()
    }

    /// Entry at the pointer (the one undo would revert next).
    #[must_use]
    pub fn current(&self) -> Option<&T> {
        self.entries[self.pointer].as_ref()
    }

    #[must_use]
    pub fn can_back(&self) -> bool {
        self.pointer > 0 && self.entries[self.pointer].is_some()
    }

    #[must_use]
    pub fn can_forward(&self) -> bool {
        self.pointer + 1 < self.size && self.entries[self.pointer + 1].is_some()
    }

    #[must_use]
    pub fn is_at_head(&self) -> bool {
        self.pointer == self.size - 1
    }

    /// Configured slot count.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    #[must_use]
    pub fn pointer(&self) -> usize {
        self.pointer
    }

    /// Number of occupied slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.is_some()).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(Option::is_none)
    }

    /// Forget all entries.
    pub fn clear(&mut self) {
        self.entries = Self::empty_slots(self.size);
        self.pointer = self.size - 1;
    }

    /// Verify the slot count still matches the configured size.
    pub fn size_invariant_check(&self) -> Result<(), IntegrityError> {
        if self.entries.len() == self.size {
            Ok(())
        } else {
            Err(IntegrityError::AlmanacSize {
                configured: self.size,
                actual: self.entries.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(size: usize, count: u32) -> Almanac<u32> {
        let mut almanac = Almanac::new(size);
        for i in 1..=count {
            almanac.commit(i);
        }
        almanac
    }

    #[test]
    fn new_is_empty_at_head() {
        let almanac: Almanac<u32> = Almanac::new(4);
        assert!(almanac.is_at_head());
        assert!(almanac.is_empty());
        assert_eq!(almanac.pointer(), 3);
        assert!(!almanac.can_back());
        assert!(!almanac.can_forward());
    }

    #[test]
    fn back_returns_newest_first() {
        let mut almanac = filled(5, 3);
        assert_eq!(almanac.back(), Some(&3));
        assert_eq!(almanac.back(), Some(&2));
        assert_eq!(almanac.back(), Some(&1));
        assert_eq!(almanac.back(), None);
    }

    #[test]
    fn forward_replays_in_order() {
        let mut almanac = filled(5, 3);
        almanac.back();
        almanac.back();
        assert_eq!(almanac.forward(), Some(&2));
        assert_eq!(almanac.forward(), Some(&3));
        assert_eq!(almanac.forward(), None);
        assert!(almanac.is_at_head());
    }

    #[test]
    fn commit_after_back_prunes_branch() {
        let mut almanac = filled(5, 4);
        almanac.back();
        almanac.back();
        almanac.commit(9);

        assert!(almanac.is_at_head());
        assert!(!almanac.can_forward());
        assert_eq!(almanac.len(), 3);
        assert_eq!(almanac.back(), Some(&9));
        assert_eq!(almanac.back(), Some(&2));
        assert_eq!(almanac.back(), Some(&1));
        assert_eq!(almanac.back(), None);
        assert!(almanac.size_invariant_check().is_ok());
    }

    #[test]
    fn overflow_evicts_oldest_and_floor_is_kept() {
        let mut almanac = filled(3, 10);
        assert_eq!(almanac.len(), 3);
        assert_eq!(almanac.back(), Some(&10));
        assert_eq!(almanac.back(), Some(&9));
        // Slot 0 (entry 8) is the floor.
        assert_eq!(almanac.back(), None);
        assert_eq!(almanac.current(), Some(&8));
    }

    #[test]
    fn zero_size_is_clamped() {
        let mut almanac = Almanac::new(0);
        almanac.commit(1u32);
        assert_eq!(almanac.size(), 1);
        assert_eq!(almanac.back(), None);
    }

    #[test]
    fn clear_resets() {
        let mut almanac = filled(4, 2);
        almanac.back();
        almanac.clear();
        assert!(almanac.is_empty());
        assert!(almanac.is_at_head());
    }

    #[test]
    fn debug_impl() {
        let almanac = filled(4, 2);
        let text = format!("{almanac:?}");
        assert!(text.contains("Almanac"));
        assert!(text.contains("retained: 2"));
    }
}
