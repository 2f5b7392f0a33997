use bevy::prelude::*;

use crate::error::PuzzleError;

/// Number of animations currently playing. Input and the shuffle only
/// advance while it is zero; other systems may read it to know whether
/// the board is busy.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BlockingCounter(u32);

impl BlockingCounter {
    pub const fn increment(&mut self) {
        self.0 += 1;
    }

    /// Fails without touching the count when nothing is outstanding.
    pub fn decrement(&mut self) -> Result<(), PuzzleError> {
        match self.0.checked_sub(1) {
            Some(count) => {
                self.0 = count;
                Ok(())
            }
            None => Err(PuzzleError::CounterUnderflow),
        }
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub const fn count(&self) -> u32 {
        self.0
    }
}
