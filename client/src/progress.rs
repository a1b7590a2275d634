//! Cosmetic progress value.
//!
//! The value only reflects elapsed time, never real backend progress. It
//! climbs in fixed steps up to a cap below 100 and jumps to 100 when the
//! notebook URL arrives, after which it is frozen.

#[cfg(test)]
#[path = "progress_test.rs"]
mod progress_test;

pub const COMPLETE: u8 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    value: u8,
    complete: bool,
}

impl Progress {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn value(self) -> u8 {
        self.value
    }

    #[must_use]
    pub fn is_complete(self) -> bool {
        self.complete
    }

    /// Back to 0, not complete.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Move up by `step`, clamped to `cap`. Returns the new value when it
    /// changed, `None` once the cap is reached or after completion.
    pub fn advance(&mut self, step: u8, cap: u8) -> Option<u8> {
        if self.complete || self.value >= cap {
            return None;
        }
        self.value = self.value.saturating_add(step).min(cap);
        Some(self.value)
    }

    /// Force 100 and freeze. Returns `true` only on the first call.
    pub fn complete(&mut self) -> bool {
        if self.complete {
            return false;
        }
        self.value = COMPLETE;
        self.complete = true;
        true
    }
}
