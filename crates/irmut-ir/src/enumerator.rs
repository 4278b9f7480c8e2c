//! Flattens a function into one samplable space of mutation sites.

use crate::function::Function;
use crate::instruction::Inst;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

/// A place an operator may edit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Site {
    /// Function argument by position
    Argument(usize),
    Instruction(Inst),
}

/// Arguments first, then instructions of each block in layout order.
///
/// Operators insert and erase instructions, so collect a fresh set per attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidates {
    sites: Vec<Site>,
}

impl Candidates {
    pub fn collect(func: &Function) -> Self {
        let mut sites = Vec::with_capacity(func.num_params() + func.instruction_count());
        sites.extend((0..func.num_params()).map(Site::Argument));
        sites.extend(func.instructions().map(Site::Instruction));
        Self { sites }
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Site> {
        self.sites.get(index).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = Site> + '_ {
        self.sites.iter().copied()
    }

    /// Uniform sample, `None` for an empty space
    pub fn sample(&self, rng: &mut ChaCha8Rng) -> Option<Site> {
        if self.sites.is_empty() {
            return None;
        }
        self.get(rng.gen_range(0..self.sites.len()))
    }
}
