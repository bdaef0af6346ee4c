//! Proof-of-work engine.
//!
//! Searches for a nonce whose SHA-256 digest satisfies a fractional
//! difficulty: the integer part fixes how many leading zero hex digits are
//! required, the fractional part subdivides the next digit's 16 values into
//! a pass region, giving a continuous difficulty scale between integers.

use sha2::{Digest, Sha256};
use std::time::Instant;

/// A winning nonce together with its digest and how long the search took.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    pub nonce: u64,
    /// Hex-encoded SHA-256 digest, 64 characters.
    pub hash: String,
    pub elapsed_ms: u64,
}

/// Walks nonces from zero until one hashes under the target.
///
/// Pure CPU with no suspension points; callers run it on a blocking thread.
/// The caller supplies a seed prefix combining host, device, and a fresh
/// timestamp so repeated searches do not walk an identical input space.
pub fn search(difficulty: f64, seed_prefix: &str) -> Solution {
    let started = Instant::now();
    let mut nonce: u64 = 0;
    loop {
        let digest = Sha256::digest(format!("{seed_prefix}-{nonce}").as_bytes());
        let hash = hex::encode(digest);
        if meets_difficulty(&hash, difficulty) {
            return Solution {
                nonce,
                hash,
                elapsed_ms: started.elapsed().as_millis() as u64,
            };
        }
        nonce += 1;
    }
}

/// The accept/reject predicate for one hex digest.
///
/// For difficulty `d + f` (`d` integer, `0 <= f < 1`): the first `d` hex
/// characters must be `'0'`, and when `f > 0` the digit at index `d` must
/// fall in the lowest `floor(16 * (1 - f))` of its 16 possible values.
pub fn meets_difficulty(hash: &str, difficulty: f64) -> bool {
    let difficulty = difficulty.max(0.0);
    let zeros = difficulty.trunc() as usize;
    let fraction = difficulty.fract();

    let bytes = hash.as_bytes();
    if bytes.len() < zeros {
        return false;
    }
    if !bytes[..zeros].iter().all(|&b| b == b'0') {
        return false;
    }
    if fraction > 0.0 {
        let digit = match bytes.get(zeros).and_then(|&b| (b as char).to_digit(16)) {
            Some(digit) => digit,
            None => return false,
        };
        return digit < fractional_bound(fraction);
    }
    true
}

/// `floor(16 * (1 - f))`: how many of the next digit's values pass.
fn fractional_bound(fraction: f64) -> u32 {
    (16.0 * (1.0 - fraction)).floor() as u32
}
