#![forbid(unsafe_code)]

//! Recording, grouping, and replay of [`Action`]s.
//!
//! The [`Historian`] is the single entry point for every tracked mutation:
//! [`perform`](Historian::perform) applies an action and records it, so the
//! effect and the way to undo it cannot drift apart.
//!
//! # Recording modes
//!
//! ```text
//!             begin / transaction()            end (outermost)
//!   ┌──────┐ ─────────────────────────► ┌────────────────────┐ ──► almanac
//!   │ Idle │                            │ InTransaction(n)   │
//!   └──────┘ ◄───────────────────────── └────────────────────┘
//!       │       end / rollback (n == 1)        ▲   │ begin: n + 1
//!       │ record()                             │   │ end:   n - 1, group nested
//!       ▼                                      └───┘        into parent level
//!    almanac
//! ```
//!
//! With an epoch configured, the first action recorded while Idle opens an
//! implicit bottom level that collects every action until the window
//! elapses (observed by [`poll_epoch`](Historian::poll_epoch) or the next
//! recording), or until [`undo`](Historian::undo)/[`redo`](Historian::redo)
//! force it closed.
//!
//! # Failure semantics
//!
//! - A transaction body returning `Err` has this level's effects reverted in
//!   reverse order before the error is handed back unchanged; enclosing
//!   levels keep what they recorded and decide for themselves.
//! - A body that panics is unwound the same way by a scope guard.
//! - `undo`/`redo` at a history boundary return `false`.
//! - Unbalanced manual bracketing inside a transaction body is an engine
//!   integrity failure and panics.

use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

use tracing::{debug, trace, warn};
use web_time::Instant;

use crate::action::Action;
use crate::almanac::Almanac;
use crate::config::HistoryConfig;
use crate::error::HistoryError;

const TARGET: &str = "pagecraft.history";

/// Observable recording state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingMode {
    /// No explicit transaction open (an epoch may still be collecting).
    Idle,
    /// Number of explicit transactions currently open.
    InTransaction(usize),
}

struct State {
    config: HistoryConfig,
    almanac: Almanac<Action>,
    /// Open levels, innermost last. When an epoch is open it owns `open[0]`.
    open: Vec<Vec<Action>>,
    /// Start of the open epoch.
    epoch_started: Option<Instant>,
    recording: bool,
}

impl State {
    fn explicit_depth(&self) -> usize {
        self.open.len() - usize::from(self.epoch_started.is_some())
    }

    fn commit(&mut self, action: Action) {
        debug!(
            target: TARGET,
            kind = action.kind(),
            leaves = action.leaf_count(),
            "commit"
        );
        self.almanac.commit(action);
    }

    fn commit_group(&mut self, stack: Vec<Action>) {
        if !stack.is_empty() {
            self.commit(Action::Transaction { stack });
        }
    }

    /// Close the innermost level: nest it into its parent, or commit it.
    fn close_innermost(&mut self) {
        let Some(stack) = self.open.pop() else {
            return;
        };
        match self.open.last_mut() {
            Some(parent) => {
                if !stack.is_empty() {
                    parent.push(Action::Transaction { stack });
                }
            }
            None => self.commit_group(stack),
        }
    }

    /// Revert and discard the innermost level.
    fn revert_innermost(&mut self) {
        let Some(stack) = self.open.pop() else {
            return;
        };
        debug!(target: TARGET, actions = stack.len(), "transaction rolled back");
        for action in stack.iter().rev() {
            action.revert();
        }
        if self.open.is_empty() {
            self.epoch_started = None;
        }
    }

    fn open_epoch(&mut self, now: Instant) {
        trace!(target: TARGET, "epoch opened");
        self.open.push(Vec::new());
        self.epoch_started = Some(now);
    }

    /// Commit the epoch level if it is the only open level.
    fn close_epoch(&mut self) -> bool {
        if self.epoch_started.is_none() || self.open.len() != 1 {
            return false;
        }
        self.epoch_started = None;
        let stack = self.open.pop().unwrap_or_default();
        debug!(target: TARGET, actions = stack.len(), "epoch closed");
        self.commit_group(stack);
        true
    }

    fn epoch_expired(&self, now: Instant) -> bool {
        match (self.epoch_started, self.config.epoch) {
            (Some(started), Some(window)) => now.saturating_duration_since(started) >= window,
            _ => false,
        }
    }

    fn epoch_pending(&self) -> bool {
        self.epoch_started.is_some() && self.open.first().is_some_and(|level| !level.is_empty())
    }
}

/// Shared recorder and replayer of tracked mutations.
///
/// Cloning a `Historian` yields another handle to the **same** history, so a
/// model subtree built from one handle undoes as a single document.
#[derive(Clone)]
pub struct Historian {
    inner: Rc<RefCell<State>>,
}

impl fmt::Debug for Historian {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.borrow();
        f.debug_struct("Historian")
            .field("almanac", &state.almanac)
            .field("open_levels", &state.open.len())
            .field("epoch_open", &state.epoch_started.is_some())
            .field("recording", &state.recording)
            .finish()
    }
}

impl Default for Historian {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}

impl Historian {
    #[must_use]
    pub fn new(config: HistoryConfig) -> Self {
        Self {
            inner: Rc::new(RefCell::new(State {
                almanac: Almanac::new(config.size),
                config,
                open: Vec::new(),
                epoch_started: None,
                recording: true,
            })),
        }
    }

    /// Historian with an almanac of `size` slots and no epoch.
    #[must_use]
    pub fn with_size(size: usize) -> Self {
        Self::new(HistoryConfig::new(size))
    }

    #[must_use]
    pub fn config(&self) -> HistoryConfig {
        self.inner.borrow().config.clone()
    }

    /// True if both handles share one history.
    #[must_use]
    pub fn ptr_eq(&self, other: &Historian) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // ========================================================================
    // Recording
    // ========================================================================

    /// Remember an action that has already been applied.
    ///
    /// Idle: committed to the almanac (or to a fresh epoch when configured).
    /// In a transaction: appended to the innermost level.
    pub fn record(&self, action: Action) {
        self.record_at(action, Instant::now());
    }

    fn record_at(&self, action: Action, now: Instant) {
        let mut state = self.inner.borrow_mut();
        if !state.recording {
            trace!(target: TARGET, kind = action.kind(), "dropped off the record");
            return;
        }

        if state.epoch_expired(now) {
            state.close_epoch();
        }
        if state.open.is_empty() && state.config.epoch.is_some() {
            state.open_epoch(now);
        }

        match state.open.last_mut() {
            Some(level) => level.push(action),
            None => state.commit(action),
        }
    }

    /// Apply `action`, then record it.
    pub fn perform(&self, action: Action) {
        action.apply();
        self.record(action);
    }

    #[must_use]
    pub fn is_recording(&self) -> bool {
        self.inner.borrow().recording
    }

    pub fn disable_recording(&self) {
        self.inner.borrow_mut().recording = false;
    }

    pub fn enable_recording(&self) {
        self.inner.borrow_mut().recording = true;
    }

    /// Run `f` with recording suppressed. The previous recording state is
    /// restored afterwards, also when `f` panics.
    pub fn off_the_record<T>(&self, f: impl FnOnce() -> T) -> T {
        let _guard = RecordingGuard::suspend(self);
        f()
    }

    // ========================================================================
    // Transactions
    // ========================================================================

    /// Open a transaction level manually. Returns the explicit depth.
    pub fn begin_transaction(&self) -> usize {
        let mut state = self.inner.borrow_mut();
        state.open.push(Vec::new());
        state.explicit_depth()
    }

    /// Close the innermost explicit level.
    pub fn end_transaction(&self) -> Result<(), HistoryError> {
        let mut state = self.inner.borrow_mut();
        if state.explicit_depth() == 0 {
            return Err(HistoryError::NoOpenTransaction);
        }
        state.close_innermost();
        Ok(())
    }

    /// Revert and discard the innermost explicit level.
    pub fn rollback_transaction(&self) -> Result<(), HistoryError> {
        let mut state = self.inner.borrow_mut();
        if state.explicit_depth() == 0 {
            return Err(HistoryError::NoOpenTransaction);
        }
        state.revert_innermost();
        Ok(())
    }

    /// Run `f` as one undoable unit.
    ///
    /// On `Err`, everything `f` recorded at this level is reverted and the
    /// error is returned unchanged.
    pub fn transaction<T, E>(&self, f: impl FnOnce() -> Result<T, E>) -> Result<T, E> {
        let level = LevelGuard::open(self);
        match f() {
            Ok(value) => {
                level.close();
                Ok(value)
            }
            Err(err) => {
                level.rollback();
                Err(err)
            }
        }
    }

    /// Infallible [`transaction`](Self::transaction).
    pub fn batch<T>(&self, f: impl FnOnce() -> T) -> T {
        let level = LevelGuard::open(self);
        let value = f();
        level.close();
        value
    }

    /// [`transaction`](Self::transaction) around an awaited body.
    ///
    /// Bracketing is identical to the synchronous form. Dropping the future
    /// before it completes reverts the level.
    pub async fn async_transaction<T, E, F, Fut>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let level = LevelGuard::open(self);
        match f().await {
            Ok(value) => {
                level.close();
                Ok(value)
            }
            Err(err) => {
                level.rollback();
                Err(err)
            }
        }
    }

    #[must_use]
    pub fn mode(&self) -> RecordingMode {
        match self.inner.borrow().explicit_depth() {
            0 => RecordingMode::Idle,
            depth => RecordingMode::InTransaction(depth),
        }
    }

    #[must_use]
    pub fn transaction_depth(&self) -> usize {
        self.inner.borrow().explicit_depth()
    }

    // ========================================================================
    // Epochs
    // ========================================================================

    #[must_use]
    pub fn is_epoch_open(&self) -> bool {
        self.inner.borrow().epoch_started.is_some()
    }

    /// Commit the open epoch if its window has elapsed. Hosts call this from
    /// their tick or idle handler.
    pub fn poll_epoch(&self) -> bool {
        self.poll_epoch_at(Instant::now())
    }

    pub fn poll_epoch_at(&self, now: Instant) -> bool {
        let mut state = self.inner.borrow_mut();
        state.epoch_expired(now) && state.close_epoch()
    }

    /// Commit the open epoch now, regardless of its window.
    pub fn end_epoch(&self) -> bool {
        self.inner.borrow_mut().close_epoch()
    }

    /// Time left in the open epoch's window.
    #[must_use]
    pub fn epoch_remaining(&self) -> Option<Duration> {
        let state = self.inner.borrow();
        let started = state.epoch_started?;
        let window = state.config.epoch?;
        Some(window.saturating_sub(started.elapsed()))
    }

    // ========================================================================
    // Replay
    // ========================================================================

    /// Revert the newest committed step. Returns `false` at the oldest
    /// retained step or while an explicit transaction is open.
    pub fn undo(&self) -> bool {
        let mut state = self.inner.borrow_mut();
        state.close_epoch();
        if state.explicit_depth() > 0 {
            warn!(target: TARGET, "undo refused while a transaction is open");
            return false;
        }
        match state.almanac.back() {
            Some(action) => {
                action.revert();
                debug!(target: TARGET, kind = action.kind(), "undo");
                true
            }
            None => false,
        }
    }

    /// Re-apply the most recently undone step. Returns `false` at the head
    /// or while an explicit transaction is open.
    pub fn redo(&self) -> bool {
        let mut state = self.inner.borrow_mut();
        state.close_epoch();
        if state.explicit_depth() > 0 {
            warn!(target: TARGET, "redo refused while a transaction is open");
            return false;
        }
        match state.almanac.forward() {
            Some(action) => {
                action.apply();
                debug!(target: TARGET, kind = action.kind(), "redo");
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        let state = self.inner.borrow();
        state.almanac.can_back() || state.epoch_pending()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        let state = self.inner.borrow();
        state.almanac.can_forward() && !state.epoch_pending()
    }

    /// Forget all committed steps. Open levels are untouched.
    pub fn clear(&self) {
        self.inner.borrow_mut().almanac.clear();
    }
}

/// Restores the recording flag on drop.
struct RecordingGuard<'a> {
    historian: &'a Historian,
    previous: bool,
}

impl<'a> RecordingGuard<'a> {
    fn suspend(historian: &'a Historian) -> Self {
        let mut state = historian.inner.borrow_mut();
        let previous = std::mem::replace(&mut state.recording, false);
        Self {
            historian,
            previous,
        }
    }
}

impl Drop for RecordingGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.historian.inner.try_borrow_mut() {
            state.recording = self.previous;
        }
    }
}

/// One open transaction level. Reverted on drop unless closed.
struct LevelGuard<'a> {
    historian: &'a Historian,
    depth: usize,
    settled: bool,
}

impl<'a> LevelGuard<'a> {
    fn open(historian: &'a Historian) -> Self {
        let mut state = historian.inner.borrow_mut();
        state.open.push(Vec::new());
        let depth = state.open.len();
        Self {
            historian,
            depth,
            settled: false,
        }
    }

    fn close(mut self) {
        self.settled = true;
        let mut state = self.historian.inner.borrow_mut();
        assert_eq!(
            state.open.len(),
            self.depth,
            "transaction body left {} level(s) unbalanced",
            state.open.len().abs_diff(self.depth)
        );
        state.close_innermost();
    }

    fn rollback(mut self) {
        self.settled = true;
        self.unwind();
    }

    /// Revert this level and anything the body left open above it.
    fn unwind(&self) {
        if let Ok(mut state) = self.historian.inner.try_borrow_mut() {
            while state.open.len() >= self.depth && !state.open.is_empty() {
                state.revert_innermost();
            }
        }
    }
}

impl Drop for LevelGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.unwind();
        }
    }
}
