//! Step timer abstraction.

use crate::config::TimerTicks;

/// One-shot hardware timer that triggers the step handler.
///
/// Both handlers arm it, so it takes `&self`; implementations provide their
/// own interior mutability (usually a peripheral register write).
pub trait StepTimer {
    /// Fire the step handler `ticks` from now, replacing any pending expiry.
    fn arm(&self, ticks: TimerTicks);

    /// Cancel any pending expiry.
    fn disarm(&self);
}

impl<T: StepTimer + ?Sized> StepTimer for &T {
    fn arm(&self, ticks: TimerTicks) {
        (**self).arm(ticks)
    }

    fn disarm(&self) {
        (**self).disarm()
    }
}
