//! Exponential cooldown for a tripped circuit.

use std::time::Duration;

/// Cooldown after `overflow` failures past the threshold: `unit * 2^(overflow + 1)`.
///
/// Saturates instead of overflowing, so a long failure streak yields a very
/// long (but finite) cooldown.
pub fn cooldown(overflow: u32, unit: Duration) -> Duration {
    let factor = 2u32.saturating_pow(overflow.saturating_add(1));
    unit.saturating_mul(factor)
}
