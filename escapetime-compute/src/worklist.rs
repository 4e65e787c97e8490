//! Suspend/resume bookkeeping.
//!
//! An interrupted tesseral run does not save its box stack. It records only
//! the box that was on top, as a [`ResumeToken`]: the box's left/top corner
//! plus a size class for each axis. Because bisection is deterministic
//! (always at the midpoint of the longer side, left/top half processed
//! first), replaying the bisection from the full rectangle and stopping at
//! the recorded box rebuilds exactly the stack that was live.

use crate::TessBox;
use escapetime_core::{ConfigError, PixelRect};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Position of the top tesseral box at the moment of interruption.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResumeToken {
    /// Smallest `k` with `2^k > width - 2`, where width is `x2 - x1`.
    pub x_class: u32,
    /// Same for the vertical extent.
    pub y_class: u32,
    pub x: u32,
    pub y: u32,
}

impl ResumeToken {
    pub fn encode(b: &TessBox) -> Self {
        Self {
            x_class: size_class(b.x2 - b.x1),
            y_class: size_class(b.y2 - b.y1),
            x: b.x1,
            y: b.y1,
        }
    }

    /// Rebuild the box stack for `root`, top of stack last.
    ///
    /// Every rebuilt box has all four edges unknown. Returns `None` when the
    /// token does not describe a box reachable from `root`.
    pub fn replay(&self, root: TessBox) -> Option<Vec<TessBox>> {
        let x_size = 1u32.checked_shl(self.x_class).unwrap_or(u32::MAX);
        let y_size = 1u32.checked_shl(self.y_class).unwrap_or(u32::MAX);
        let mut stack = vec![root.with_unknown_edges()];

        loop {
            let top = stack.last_mut()?;
            if top.is_wide() {
                if top.x1 == self.x && top.x2 - top.x1 < x_size.saturating_add(2) {
                    break;
                }
                if top.x2 - top.x1 < 2 {
                    return None;
                }
                let mid = (top.x1 + top.x2) >> 1;
                if mid > self.x {
                    let mut left = *top;
                    left.x2 = mid;
                    top.x1 = mid;
                    stack.push(left);
                } else {
                    top.x1 = mid;
                }
            } else {
                if top.y1 == self.y && top.y2 - top.y1 < y_size.saturating_add(2) {
                    break;
                }
                if top.y2 - top.y1 < 2 {
                    return None;
                }
                let mid = (top.y1 + top.y2) >> 1;
                if mid > self.y {
                    let mut upper = *top;
                    upper.y2 = mid;
                    top.y1 = mid;
                    stack.push(upper);
                } else {
                    top.y1 = mid;
                }
            }
        }
        Some(stack)
    }
}

fn size_class(extent: u32) -> u32 {
    let mut class = 1;
    let mut i: u64 = 2;
    while u64::from(extent) >= i + 2 {
        i <<= 1;
        class += 1;
    }
    class
}

/// A unit of remaining work.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WorkItem {
    /// A tesseral rectangle, continued from `resume` or started fresh.
    Tesseral {
        rect: PixelRect,
        resume: Option<ResumeToken>,
    },
    /// A Julibrot plane, continued from scanline `row` (counting down).
    JulibrotPlane { row: u32 },
}

/// How a run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompletionStatus {
    Complete,
    /// Stopped at a poll point; the item describes what is left.
    Interrupted(WorkItem),
}

impl CompletionStatus {
    pub fn is_complete(&self) -> bool {
        matches!(self, CompletionStatus::Complete)
    }

    pub fn remaining(&self) -> Option<&WorkItem> {
        match self {
            CompletionStatus::Complete => None,
            CompletionStatus::Interrupted(item) => Some(item),
        }
    }
}

/// Ordered queue of pending work that survives serialization.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worklist {
    items: VecDeque<WorkItem>,
}

impl Worklist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, item: WorkItem) {
        self.items.push_back(item);
    }

    /// Put an interrupted item back so it is the next one taken.
    pub fn push_front(&mut self, item: WorkItem) {
        self.items.push_front(item);
    }

    pub fn pop(&mut self) -> Option<WorkItem> {
        self.items.pop_front()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorkItem> {
        self.items.iter()
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

impl FromIterator<WorkItem> for Worklist {
    fn from_iter<I: IntoIterator<Item = WorkItem>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}
