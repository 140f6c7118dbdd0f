/*
 * RNG Module
 *
 * Reproducible randomness for population generation. One ChaCha key comes
 * from the configured seed; work split across threads draws from separate
 * ChaCha streams of that key, so the output depends on how work is chunked,
 * never on which thread runs a chunk.
 */

use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;

pub fn seeded_rng(seed: u64) -> ChaCha12Rng {
    ChaCha12Rng::seed_from_u64(seed)
}

/// Generator for one chunk of work: same key as [`seeded_rng`], stream `chunk`.
pub fn chunk_rng(seed: u64, chunk: usize) -> ChaCha12Rng {
    let mut rng = seeded_rng(seed);
    rng.set_stream(chunk as u64);
    rng
}
