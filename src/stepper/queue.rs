//! Move queue between planning and the step handler.

use heapless::Deque;

use crate::config::{MachineConstraints, MmPerMinute};
use crate::error::{QueueError, Result};
use crate::motion::{Dda, MoveId};

/// Source of moves for the step handler.
pub trait MoveQueue {
    /// Take the next move to execute.
    fn next_move(&mut self) -> Option<Dda>;

    /// Called once the move `id` has finished executing.
    fn on_complete(&mut self, _id: MoveId) {}
}

/// Bounded FIFO of planned moves.
///
/// Applies look-ahead joins on the way in: a join only takes effect if the
/// move it was computed against is still waiting at the back of the ring.
pub struct MoveRing<const N: usize> {
    moves: Deque<Dda, N>,
    constraints: MachineConstraints,
    completed: Option<MoveId>,
}

impl<const N: usize> MoveRing<N> {
    /// Empty ring.
    pub fn new(constraints: MachineConstraints) -> Self {
        Self {
            moves: Deque::new(),
            constraints,
            completed: None,
        }
    }

    /// Queue a planned move.
    ///
    /// # Errors
    ///
    /// Returns [`QueueError::Full`] if the ring has no free slot; the move is
    /// dropped and nothing queued changes.
    pub fn enqueue(&mut self, mut dda: Dda) -> Result<()> {
        if self.moves.is_full() {
            return Err(QueueError::Full.into());
        }

        if let Some(join) = dda.join {
            match self.moves.back_mut() {
                Some(prev) if prev.id == join.prev_id => {
                    prev.set_end_rate(join.speed, &self.constraints);
                }
                _ => {
                    log::debug!("discarding stale join with move {}", join.prev_id.0);
                    dda.join = None;
                    dda.set_start_rate(MmPerMinute(0), &self.constraints);
                }
            }
        }

        self.moves
            .push_back(dda)
            .map_err(|_| QueueError::Full.into())
    }

    /// Last queued move, the `previous` for the next plan.
    pub fn last(&self) -> Option<&Dda> {
        self.moves.back()
    }

    /// Number of queued moves.
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    /// Whether no move is queued.
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Whether another move can be queued.
    pub fn is_full(&self) -> bool {
        self.moves.is_full()
    }

    /// Id of the most recently completed move.
    pub fn last_completed(&self) -> Option<MoveId> {
        self.completed
    }
}

impl<const N: usize> MoveQueue for MoveRing<N> {
    fn next_move(&mut self) -> Option<Dda> {
        self.moves.pop_front()
    }

    fn on_complete(&mut self, id: MoveId) {
        self.completed = Some(id);
    }
}
