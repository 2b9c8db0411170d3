//! Register pool used by the semantic analyzer.
//!
//! Slots are interchangeable; the backend maps each slot index to a physical
//! register. There is no spilling: running out of slots is fatal.

use std::fmt;

use serde::Serialize;

use crate::utils::{Error, Result, Span};

/// Number of allocatable register slots
pub const POOL_SIZE: usize = 7;

/// Number of calling-convention argument slots; calls and declarations with
/// more positional parameters are rejected
pub const MAX_ARGS: usize = 6;

/// Set of register slots, one bit per slot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct RegMask(u32);

impl RegMask {
    pub const EMPTY: RegMask = RegMask(0);

    pub fn contains(self, slot: usize) -> bool {
        self.0 & (1 << slot) != 0
    }

    pub fn with(self, slot: usize) -> Self {
        RegMask(self.0 | (1 << slot))
    }

    pub fn without(self, slot: usize) -> Self {
        RegMask(self.0 & !(1 << slot))
    }

    pub fn count(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Slots in ascending order
    pub fn slots(self) -> impl DoubleEndedIterator<Item = usize> {
        (0..POOL_SIZE).filter(move |&slot| self.contains(slot))
    }
}

impl fmt::Display for RegMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#09b}", self.0)
    }
}

/// An acquired register slot.
///
/// Neither `Copy` nor `Clone`: the only way to give a slot back
/// is [`RegisterPool::release`], which consumes the guard.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "an acquired register must be released"]
pub struct Reg(usize);

impl Reg {
    pub fn slot(&self) -> usize {
        self.0
    }
}

/// Fixed-size register pool tracked as an in-use bitmask
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterPool {
    in_use: RegMask,
    /// Every slot handed out since the pool was created
    touched: RegMask,
}

impl RegisterPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lowest free slot
    pub fn acquire(&mut self, span: Span) -> Result<Reg> {
        let slot = (0..POOL_SIZE)
            .find(|&slot| !self.in_use.contains(slot))
            .ok_or(Error::RegisterExhaustion {
                capacity: POOL_SIZE,
                span,
            })?;
        self.in_use = self.in_use.with(slot);
        self.touched = self.touched.with(slot);
        log::trace!("acquire r{} -> {}", slot, self.in_use);
        Ok(Reg(slot))
    }

    /// Return a slot to the pool
    pub fn release(&mut self, reg: Reg) {
        debug_assert!(self.in_use.contains(reg.0), "slot {} released twice", reg.0);
        self.in_use = self.in_use.without(reg.0);
        log::trace!("release r{} -> {}", reg.0, self.in_use);
    }

    /// Slots currently held; these are the values live at this point
    pub fn live(&self) -> RegMask {
        self.in_use
    }

    /// Slots used at any point, live or not
    pub fn touched(&self) -> RegMask {
        self.touched
    }

    /// Fail with `RegisterLeak` unless the pool is back to `expected`
    pub fn check_balanced(&self, expected: RegMask, span: Span) -> Result<()> {
        match self.in_use.slots().find(|&slot| !expected.contains(slot)) {
            Some(slot) => Err(Error::RegisterLeak { slot, span }),
            None => Ok(()),
        }
    }
}
