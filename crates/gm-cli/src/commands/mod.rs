pub mod roll;
pub mod tracker;

use rand::SeedableRng;
use rand::rngs::StdRng;

/// A seeded RNG when a seed is given, otherwise one seeded from the OS.
fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}
