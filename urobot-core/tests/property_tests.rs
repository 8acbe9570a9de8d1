//! Property tests for random projections

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use urobot_core::projection;

fn assert_rows_sum_to_one(dimension: usize, stddev: f64, seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    let t = projection::sample(&mut rng, dimension, stddev);
    assert_eq!(t.rows, dimension);
    assert_eq!(t.cols, dimension);
    assert!(t.is_populated());
    for (k, sum) in t.row_sums().iter().enumerate() {
        assert!(
            (sum - 1.0).abs() < 1e-9,
            "row {} of {}x{} (stddev {}) sums to {}",
            k,
            dimension,
            dimension,
            stddev,
            sum
        );
    }
}

#[test]
fn test_row_sums_grid() {
    for dimension in [1, 8, 256] {
        for stddev in [0.0, 0.1, 1.0] {
            assert_rows_sum_to_one(dimension, stddev, 1);
        }
    }
}

proptest! {
    #[test]
    fn test_row_sums_property(dimension in 1usize..48, stddev in 0.0f64..2.0, seed in any::<u64>()) {
        assert_rows_sum_to_one(dimension, stddev, seed);
    }

    #[test]
    fn test_perturbation_is_bounded(values in prop::collection::vec(0.0f64..1.0, 1..32), seed in any::<u64>()) {
        // With row sums of one, |Tx - x| is bounded by the off-diagonal mass times the spread of x.
        let mut rng = StdRng::seed_from_u64(seed);
        let t = projection::sample(&mut rng, values.len(), 0.1);
        let out = projection::apply(&t, &values).unwrap();
        for (k, (o, x)) in out.iter().zip(values.iter()).enumerate() {
            let off_mass: f64 = t
                .row(k)
                .iter()
                .enumerate()
                .filter(|(l, _)| *l != k)
                .map(|(_, w)| w.abs())
                .sum();
            prop_assert!((o - x).abs() <= off_mass + 1e-9);
        }
    }
}
