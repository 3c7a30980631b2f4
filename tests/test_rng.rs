// Tests for RNG reproducibility and distribution of random policy actions.

use resnet_prune_env::utils::rng::SimpleRng;

mod rng_tests {
    use super::*;

    #[test]
    fn test_rng_same_seed_produces_same_sequence() {
        let seed = 42u64;
        let mut rng1 = SimpleRng::new(seed);
        let mut rng2 = SimpleRng::new(seed);

        for _ in 0..100 {
            assert_eq!(rng1.next_u32(), rng2.next_u32());
        }
    }

    #[test]
    fn test_rng_different_seeds_produce_different_sequences() {
        let mut rng1 = SimpleRng::new(12345);
        let mut rng2 = SimpleRng::new(54321);

        let mut different = false;
        for _ in 0..10 {
            if rng1.next_u32() != rng2.next_u32() {
                different = true;
                break;
            }
        }
        assert!(
            different,
            "Different seeds should produce different sequences"
        );
    }

    #[test]
    fn test_rng_zero_seed_uses_default() {
        let mut rng1 = SimpleRng::new(0);
        let mut rng2 = SimpleRng::new(0);

        for _ in 0..10 {
            assert_eq!(rng1.next_u32(), rng2.next_u32());
        }
    }

    #[test]
    fn test_rng_clone_continues_identically() {
        let mut rng = SimpleRng::new(7);
        rng.next_u32();
        let mut copy = rng.clone();

        for _ in 0..10 {
            assert_eq!(rng.next_u32(), copy.next_u32());
        }
    }
}

mod action_distribution_tests {
    use super::*;

    #[test]
    fn test_gen_action_range() {
        let mut rng = SimpleRng::new(42);
        for _ in 0..1000 {
            let action = rng.gen_action();
            assert!(action >= 0.0, "Action should be >= 0.0");
            assert!(action < 1.0, "Action should be < 1.0");
        }
    }

    #[test]
    fn test_gen_action_distribution() {
        let mut rng = SimpleRng::new(42);
        let n = 10000;
        let mut count_low = 0;

        for _ in 0..n {
            if rng.gen_action() < 0.5 {
                count_low += 1;
            }
        }

        // With uniform distribution, expect roughly 50/50 split
        let low_ratio = count_low as f64 / n as f64;
        assert!(
            low_ratio > 0.45 && low_ratio < 0.55,
            "Low ratio {} should be close to 0.5",
            low_ratio
        );
    }

    #[test]
    fn test_gen_range_f64_within_bounds() {
        let mut rng = SimpleRng::new(99);
        for _ in 0..1000 {
            let value = rng.gen_range_f64(-0.25, 1.25);
            assert!((-0.25..1.25).contains(&value));
        }
    }

    #[test]
    fn test_gen_action_is_unit_range_draw() {
        let mut actions = SimpleRng::new(5);
        let mut ranged = SimpleRng::new(5);
        for _ in 0..100 {
            assert_eq!(actions.gen_action(), ranged.gen_range_f64(0.0, 1.0));
        }
    }

    #[test]
    fn test_gen_action_mean_convergence() {
        let mut rng = SimpleRng::new(2024);
        let n = 20000;
        let mean: f64 = (0..n).map(|_| rng.gen_action()).sum::<f64>() / n as f64;
        assert!((mean - 0.5).abs() < 0.02, "Mean {} should be close to 0.5", mean);
    }
}
