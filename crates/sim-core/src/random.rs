//! Stochastic primitives
//!
//! Every random decision in the simulation goes through these helpers with
//! the rng passed in explicitly, so a fixed seed replays a run exactly.

use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::Rng;

/// True with probability `p`. Values outside `[0, 1]` saturate.
pub fn chance<R: Rng + ?Sized>(rng: &mut R, p: f64) -> bool {
    rng.gen::<f64>() < p
}

/// Uniformly random element, or `None` for an empty slice.
pub fn pick<'a, T, R: Rng + ?Sized>(rng: &mut R, items: &'a [T]) -> Option<&'a T> {
    items.choose(rng)
}

/// Shuffles in place.
pub fn shuffle<T, R: Rng + ?Sized>(rng: &mut R, items: &mut [T]) {
    items.shuffle(rng);
}

/// Picks an item with probability proportional to its weight.
///
/// Returns `None` when the slice is empty or every weight is zero.
pub fn weighted_choice<'a, T, R: Rng + ?Sized>(
    rng: &mut R,
    items: &'a [(T, u32)],
) -> Option<&'a T> {
    let dist = WeightedIndex::<u32>::new(items.iter().map(|(_, w)| *w)).ok()?;
    items.get(dist.sample(rng)).map(|(item, _)| item)
}

/// Picks from a ranked slice, favouring the front.
///
/// The first item gets weight `bias`, falling linearly to weight 1 for the
/// last item. With `bias <= 1` every item is equally likely.
pub fn biased_pick<'a, T, R: Rng + ?Sized>(
    rng: &mut R,
    ranked: &'a [T],
    bias: u32,
) -> Option<&'a T> {
    match ranked.len() {
        0 => None,
        1 => ranked.first(),
        n => {
            let top = bias.max(1) as f64;
            let weights = (0..n).map(|i| {
                let t = i as f64 / (n - 1) as f64;
                top - (top - 1.0) * t
            });
            let dist = WeightedIndex::<f64>::new(weights).ok()?;
            ranked.get(dist.sample(rng))
        }
    }
}
