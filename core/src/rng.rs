//! Park-Miller Linear Congruential Generator (MINSTD)
//!
//! Drives every random draw the generator makes, so a seed fully determines
//! the carved layout on every platform.
//!
//! Constants:
//! - Multiplier (a): 48271
//! - Modulus (m): 2^31 - 1 = 2147483647
//!
//! Reference: https://en.wikipedia.org/wiki/Lehmer_random_number_generator

const A: u64 = 48271;
const M: u64 = 2147483647; // 2^31 - 1

/// Park-Miller Linear Congruential Generator
///
/// Generates a deterministic sequence of pseudo-random numbers from a seed.
/// Same seed always produces the same sequence.
#[derive(Debug, Clone)]
pub struct SimpleLCG {
    state: u32,
}

impl SimpleLCG {
    /// Create a new LCG with the given seed
    ///
    /// Seeds are reduced modulo 2^31 - 1; a seed that reduces to 0 is
    /// replaced with 1 to avoid the degenerate all-zero sequence.
    pub fn new(seed: u32) -> Self {
        let reduced = (seed as u64 % M) as u32;
        Self {
            state: if reduced == 0 { 1 } else { reduced },
        }
    }

    fn advance(&mut self) {
        // u64 avoids overflow during multiplication
        self.state = ((self.state as u64 * A) % M) as u32;
    }

    /// Raw next value in `[1, 2^31 - 1)`.
    pub fn next_u32(&mut self) -> u32 {
        self.advance();
        self.state
    }

    /// Generate random integer in range [a, b] (inclusive)
    ///
    /// Pure integer arithmetic, no floating point.
    pub fn randint(&mut self, a: usize, b: usize) -> usize {
        self.advance();
        let range = (b - a + 1) as u64;
        let scaled = (self.state as u64 * range) / M;
        a + scaled as usize
    }

    /// Choose random index from a range [0, len)
    pub fn choice_index(&mut self, len: usize) -> usize {
        self.advance();
        let scaled = (self.state as u64 * len as u64) / M;
        scaled as usize
    }

    /// Returns true with probability `permille / 1000`.
    pub fn chance(&mut self, permille: u16) -> bool {
        self.randint(0, 999) < permille as usize
    }
}
