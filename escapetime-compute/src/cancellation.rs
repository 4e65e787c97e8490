use std::cell::Cell;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Interrupt source polled at the engine's poll points.
pub trait CancellationChecker: Clone {
    /// True when the run should stop at this poll point.
    fn is_cancelled(&self) -> bool;
}

/// For runs nothing can interrupt.
#[derive(Clone, Copy, Debug, Default)]
pub struct NeverCancel;

impl CancellationChecker for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Interrupt raised from outside the run, typically another thread
/// handling input.
///
/// Clones share one flag. A raised flag stays raised until cleared, so every
/// later poll point sees it too.
#[derive(Clone, Debug, Default)]
pub struct InterruptFlag {
    raised: Arc<AtomicBool>,
}

impl InterruptFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.raised.store(true, Ordering::Release);
    }

    /// Lower the flag before resuming.
    pub fn clear(&self) {
        self.raised.store(false, Ordering::Release);
    }
}

impl CancellationChecker for InterruptFlag {
    fn is_cancelled(&self) -> bool {
        self.raised.load(Ordering::Acquire)
    }
}

/// Reports cancellation once a fixed number of polls has passed.
///
/// The first `polls` checks return false, every later check returns true.
/// Clones share the counter. Used to interrupt a run at a reproducible
/// point, e.g. a keypress replayed from a recording.
#[derive(Clone, Debug)]
pub struct CancelAfter {
    remaining: Rc<Cell<u64>>,
}

impl CancelAfter {
    pub fn new(polls: u64) -> Self {
        Self {
            remaining: Rc::new(Cell::new(polls)),
        }
    }

    /// Polls still allowed before cancellation.
    pub fn remaining(&self) -> u64 {
        self.remaining.get()
    }
}

impl CancellationChecker for CancelAfter {
    fn is_cancelled(&self) -> bool {
        let left = self.remaining.get();
        if left == 0 {
            return true;
        }
        self.remaining.set(left - 1);
        false
    }
}
