//! State shared between the step and clock contexts.
//!
//! Every value either context reads while the other may write lives in a
//! `critical_section::Mutex<Cell<_>>` and is only touched inside a short
//! critical section. A [`MotionShared`] is meant to sit in a `static` and be
//! passed by reference into both handlers.

use core::cell::Cell;
use core::sync::atomic::{AtomicBool, Ordering};

use critical_section::Mutex;

use crate::config::{AxisMask, ClockTicks};
use crate::motion::{ClockPlan, MoveId};

/// What the clock handler needs to know about the current move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveMove {
    /// Move id.
    pub id: MoveId,
    /// Axes whose endstops end the move.
    pub endstops: AxisMask,
    /// Velocity law, for clock-synchronous moves.
    pub clock: Option<ClockPlan>,
}

/// Best-effort event counters.
///
/// Not part of the motion state: updating a counter never changes what
/// either handler does next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Diagnostics {
    /// Clock handler invocations rejected by the busy guard.
    pub reentries: u32,
    /// Moves finished more than a tick before plan.
    pub undershoots: u32,
    /// Moves finished more than a tick after plan.
    pub overshoots: u32,
    /// Step timer rearms by stall compensation.
    pub lag_rearms: u32,
    /// Rearms that had to be clamped to the minimum interval.
    pub lag_clamped: u32,
    /// Moves cut short by an endstop.
    pub endstop_stops: u32,
    /// Moves aborted on a ramp fault.
    pub ramp_faults: u32,
    /// Moves finished, truncated or not.
    pub moves_completed: u32,
}

/// Copy of every motion field, for comparison in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotionSnapshot {
    /// Current step interval.
    pub interval: u32,
    /// Clock ticks since the last step.
    pub since_step: u32,
    /// Elapsed clock ticks, tagged with the move they belong to.
    pub elapsed: (MoveId, u32),
    /// Pending endstop stop.
    pub stop: Option<MoveId>,
    /// Current move.
    pub active: Option<ActiveMove>,
    /// Clock handler busy flag.
    pub busy: bool,
}

/// Step pacing as the clock handler sees it in one critical section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// Interval the step handler arms after each step.
    pub interval: u32,
    /// Clock ticks since the last step; 0 if a step landed during the
    /// current clock invocation.
    pub since_step: u32,
}

/// Platform hooks that open and close the nested-interrupt window of the
/// clock handler.
#[derive(Debug, Clone, Copy)]
pub struct NestingHooks {
    /// Let the step context preempt the clock handler.
    pub enable: fn(),
    /// Stop letting it.
    pub disable: fn(),
}

/// Shared motion state.
pub struct MotionShared {
    interval: Mutex<Cell<u32>>,
    since_step: Mutex<Cell<u32>>,
    elapsed: Mutex<Cell<(MoveId, u32)>>,
    stop: Mutex<Cell<Option<MoveId>>>,
    active: Mutex<Cell<Option<ActiveMove>>>,
    busy: Mutex<Cell<bool>>,
    diagnostics: Mutex<Cell<Diagnostics>>,
    debug: AtomicBool,
    nesting: Option<NestingHooks>,
}

impl Default for MotionShared {
    fn default() -> Self {
        Self::new()
    }
}

impl MotionShared {
    /// Idle shared state without nesting hooks.
    pub const fn new() -> Self {
        Self {
            interval: Mutex::new(Cell::new(0)),
            since_step: Mutex::new(Cell::new(0)),
            elapsed: Mutex::new(Cell::new((MoveId(0), 0))),
            stop: Mutex::new(Cell::new(None)),
            active: Mutex::new(Cell::new(None)),
            busy: Mutex::new(Cell::new(false)),
            diagnostics: Mutex::new(Cell::new(Diagnostics {
                reentries: 0,
                undershoots: 0,
                overshoots: 0,
                lag_rearms: 0,
                lag_clamped: 0,
                endstop_stops: 0,
                ramp_faults: 0,
                moves_completed: 0,
            })),
            debug: AtomicBool::new(false),
            nesting: None,
        }
    }

    /// Idle shared state that calls `hooks` around the clock handler's
    /// preemptible window.
    pub const fn with_nesting(hooks: NestingHooks) -> Self {
        let mut shared = Self::new();
        shared.nesting = Some(hooks);
        shared
    }

    /// Turn trace output on or off.
    pub fn set_debug(&self, enabled: bool) {
        self.debug.store(enabled, Ordering::Relaxed);
    }

    /// Whether trace output is on.
    #[inline]
    pub fn debug(&self) -> bool {
        self.debug.load(Ordering::Relaxed)
    }

    /// Try to take the clock handler's busy flag.
    ///
    /// Returns `None` if a previous invocation still holds it.
    pub fn try_enter_clock(&self) -> Option<BusyGuard<'_>> {
        critical_section::with(|cs| {
            let busy = self.busy.borrow(cs);
            if busy.get() {
                None
            } else {
                busy.set(true);
                Some(BusyGuard { shared: self })
            }
        })
    }

    /// Current step interval.
    pub fn interval(&self) -> u32 {
        critical_section::with(|cs| self.interval.borrow(cs).get())
    }

    pub(crate) fn set_interval(&self, ticks: u32) {
        critical_section::with(|cs| self.interval.borrow(cs).set(ticks));
    }

    /// Current move, if any.
    pub fn active(&self) -> Option<ActiveMove> {
        critical_section::with(|cs| self.active.borrow(cs).get())
    }

    pub(crate) fn begin_move(&self, active: ActiveMove, interval: u32) {
        critical_section::with(|cs| {
            self.active.borrow(cs).set(Some(active));
            self.elapsed.borrow(cs).set((active.id, 0));
            self.interval.borrow(cs).set(interval);
            self.since_step.borrow(cs).set(0);
            self.stop.borrow(cs).set(None);
        });
    }

    pub(crate) fn end_move(&self) {
        critical_section::with(|cs| {
            self.active.borrow(cs).set(None);
            self.stop.borrow(cs).set(None);
        });
    }

    pub(crate) fn mark_step(&self) {
        critical_section::with(|cs| self.since_step.borrow(cs).set(0));
    }

    /// Advance the clock of move `id` and the ticks since its last step;
    /// returns the elapsed ticks.
    pub(crate) fn advance_clock(&self, id: MoveId) -> u32 {
        critical_section::with(|cs| {
            let elapsed = self.elapsed.borrow(cs);
            let (owner, ticks) = elapsed.get();
            let ticks = if owner == id { ticks.saturating_add(1) } else { 1 };
            elapsed.set((id, ticks));

            let since = self.since_step.borrow(cs);
            since.set(since.get().saturating_add(1));

            ticks
        })
    }

    /// Run `f` over the step pacing in a single critical section and store
    /// the interval it leaves behind.
    ///
    /// The step handler cannot run between the read and the write, so a
    /// decision taken in `f` always sees its latest step. `f` runs with
    /// interrupts masked and must not call back into `MotionShared`.
    pub(crate) fn with_pacing<R>(&self, f: impl FnOnce(&mut Pacing) -> R) -> R {
        critical_section::with(|cs| {
            let interval = self.interval.borrow(cs);
            let mut pacing = Pacing {
                interval: interval.get(),
                since_step: self.since_step.borrow(cs).get(),
            };
            let result = f(&mut pacing);
            interval.set(pacing.interval);
            result
        })
    }

    /// Clock ticks elapsed since move `id` started.
    pub fn elapsed(&self, id: MoveId) -> ClockTicks {
        critical_section::with(|cs| match self.elapsed.borrow(cs).get() {
            (owner, ticks) if owner == id => ClockTicks(ticks),
            _ => ClockTicks(0),
        })
    }

    pub(crate) fn request_stop(&self, id: MoveId) {
        critical_section::with(|cs| self.stop.borrow(cs).set(Some(id)));
    }

    pub(crate) fn stop_requested(&self, id: MoveId) -> bool {
        critical_section::with(|cs| self.stop.borrow(cs).get() == Some(id))
    }

    /// Event counters.
    pub fn diagnostics(&self) -> Diagnostics {
        critical_section::with(|cs| self.diagnostics.borrow(cs).get())
    }

    pub(crate) fn count(&self, update: impl FnOnce(&mut Diagnostics)) {
        critical_section::with(|cs| {
            let cell = self.diagnostics.borrow(cs);
            let mut d = cell.get();
            update(&mut d);
            cell.set(d);
        });
    }

    /// Copy of every motion field.
    pub fn snapshot(&self) -> MotionSnapshot {
        critical_section::with(|cs| MotionSnapshot {
            interval: self.interval.borrow(cs).get(),
            since_step: self.since_step.borrow(cs).get(),
            elapsed: self.elapsed.borrow(cs).get(),
            stop: self.stop.borrow(cs).get(),
            active: self.active.borrow(cs).get(),
            busy: self.busy.borrow(cs).get(),
        })
    }
}

/// Holds the clock handler's busy flag; dropping it releases the flag.
pub struct BusyGuard<'a> {
    shared: &'a MotionShared,
}

impl BusyGuard<'_> {
    /// Run `f` with nested interrupts enabled.
    ///
    /// `f` must not write shared state except through the critical-section
    /// accessors of [`MotionShared`].
    pub fn preemptible<R>(&self, f: impl FnOnce() -> R) -> R {
        match self.shared.nesting {
            Some(hooks) => {
                (hooks.enable)();
                let result = f();
                (hooks.disable)();
                result
            }
            None => f(),
        }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        critical_section::with(|cs| self.shared.busy.borrow(cs).set(false));
    }
}
