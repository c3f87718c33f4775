//! Key generation for blocks and children.
//!
//! Every addressable node carries a `_key` assigned once at creation time.
//! The generator is pluggable so hosts can supply deterministic keys in
//! tests or collaborative setups.

use std::cell::Cell;

use smol_str::{SmolStr, format_smolstr};
use uuid::Uuid;

/// Length of generated keys. Matches the compact hex keys used on the wire.
const KEY_LEN: usize = 12;

/// Produces a process-unique string key on each call.
pub trait KeyGenerator {
    /// Generate the next key. Never returns an empty string.
    fn next_key(&self) -> SmolStr;
}

/// Default generator: truncated v4 uuid hex.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidKeyGenerator;

impl KeyGenerator for UuidKeyGenerator {
    fn next_key(&self) -> SmolStr {
        let hex = Uuid::new_v4().simple().to_string();
        SmolStr::new(&hex[..KEY_LEN])
    }
}

/// Deterministic generator for tests: `k0`, `k1`, `k2`, ...
#[derive(Debug, Default)]
pub struct SequentialKeyGenerator {
    counter: Cell<u64>,
}

impl SequentialKeyGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start counting from a given value.
    pub fn starting_at(n: u64) -> Self {
        Self {
            counter: Cell::new(n),
        }
    }
}

impl KeyGenerator for SequentialKeyGenerator {
    fn next_key(&self) -> SmolStr {
        let n = self.counter.get();
        self.counter.set(n + 1);
        format_smolstr!("k{n}")
    }
}
