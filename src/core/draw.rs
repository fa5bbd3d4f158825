use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;

/// Pick one item proportionally to its weight.
///
/// Non-positive and non-finite weights are dropped first; `None` if nothing
/// drawable remains. Weights are scaled by the largest one so their sum stays
/// finite however large the configured values are.
pub fn weighted_pick<T: Copy>(options: &[(T, f64)], rng: &mut StdRng) -> Option<T> {
    let live: Vec<(T, f64)> = options
        .iter()
        .copied()
        .filter(|(_, weight)| weight.is_finite() && *weight > 0.0)
        .collect();
    let largest = live.iter().map(|(_, weight)| *weight).fold(0.0, f64::max);
    if live.is_empty() || largest <= 0.0 {
        return None;
    }
    let weights: Vec<f64> = live.iter().map(|(_, weight)| *weight / largest).collect();
    let dist = WeightedIndex::new(&weights).ok()?;
    Some(live[dist.sample(rng)].0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn empty_or_weightless_pools_yield_nothing() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(weighted_pick::<i32>(&[], &mut rng), None);
        assert_eq!(
            weighted_pick(&[(1, 0.0), (2, -3.0), (3, f64::NAN)], &mut rng),
            None
        );
    }

    #[test]
    fn zero_weights_are_never_drawn() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            assert_eq!(weighted_pick(&[(1, 0.0), (2, 1.0)], &mut rng), Some(2));
        }
    }

    #[test]
    fn huge_weights_still_draw() {
        let mut rng = StdRng::seed_from_u64(3);
        let options = [(1, 1e308), (2, 1e308), (3, f64::MAX)];
        let mut seen = [false; 3];
        for _ in 0..200 {
            let picked = weighted_pick(&options, &mut rng).unwrap();
            seen[picked as usize - 1] = true;
        }
        assert_eq!(seen, [true; 3]);
    }

    #[test]
    fn tiny_weights_beside_huge_ones_do_not_break_the_draw() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..50 {
            let picked = weighted_pick(&[(1, 1e308), (2, 1e-300)], &mut rng);
            assert_eq!(picked, Some(1));
        }
    }

    #[test]
    fn same_seed_same_draws() {
        let options = [(1, 1.0), (2, 2.0), (3, 3.0)];
        let mut a = StdRng::seed_from_u64(9);
        let mut b = StdRng::seed_from_u64(9);
        for _ in 0..50 {
            assert_eq!(weighted_pick(&options, &mut a), weighted_pick(&options, &mut b));
        }
    }
}
