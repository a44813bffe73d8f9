//! Light sequences and their packed radix-4 form.

use memgame_hal::traits::NUM_LIGHTS;
use rand::Rng;

/// Index of a light/button pair, in `0..NUM_LIGHTS`.
pub type Symbol = u8;

const RADIX: u32 = NUM_LIGHTS as u32;

/// Longest sequence whose packed form fits in a `u32`.
pub const MAX_SYMBOLS: usize = 15;

/// Shifts `packed` up one digit and stores `symbol` as the newest digit.
pub fn append_symbol(packed: u32, symbol: Symbol) -> u32 {
    debug_assert!((symbol as u32) < RADIX);
    packed * RADIX + symbol as u32
}

/// Symbol at `position` of a packed sequence of `length` symbols.
///
/// Positions count down from `length` (oldest symbol) to 1 (newest).
pub fn symbol_at(packed: u32, length: usize, position: usize) -> Symbol {
    debug_assert!(position >= 1 && position <= length);
    let mut value = packed;
    for _ in 1..position {
        value /= RADIX;
    }
    (value % RADIX) as Symbol
}

/// Ordered symbols of one game, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sequence {
    symbols: Vec<Symbol>,
}

impl Sequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, symbol: Symbol) {
        debug_assert!((symbol as usize) < NUM_LIGHTS);
        self.symbols.push(symbol);
    }

    /// Appends a uniformly drawn symbol and returns it.
    pub fn extend_random<R: Rng>(&mut self, rng: &mut R) -> Symbol {
        let symbol = rng.random_range(0..NUM_LIGHTS as Symbol);
        self.push(symbol);
        symbol
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Symbol> + '_ {
        self.symbols.iter().copied()
    }

    pub fn as_slice(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn last(&self) -> Option<Symbol> {
        self.symbols.last().copied()
    }

    /// Packed radix-4 form, or `None` past `MAX_SYMBOLS`.
    pub fn to_packed(&self) -> Option<u32> {
        if self.symbols.len() > MAX_SYMBOLS {
            return None;
        }
        Some(self.iter().fold(0, append_symbol))
    }

    pub fn from_packed(packed: u32, length: usize) -> Self {
        let symbols = (1..=length)
            .rev()
            .map(|position| symbol_at(packed, length, position))
            .collect();
        Self { symbols }
    }
}

impl From<Vec<Symbol>> for Sequence {
    fn from(symbols: Vec<Symbol>) -> Self {
        debug_assert!(symbols.iter().all(|&s| (s as usize) < NUM_LIGHTS));
        Self { symbols }
    }
}
