#[cfg(test)]
mod property_tests {
    use lander::device::Device;
    use lander::network::{interpolate, soft_update, QNetwork};
    use lander::replay_buffer::{ReplayBuffer, Transition};
    use lander::trainer::EpsilonSchedule;
    use ndarray::Array1;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn transition(i: usize) -> Transition {
        Transition::new(Array1::from_elem(2, i as f32), 0, i as f32, Array1::from_elem(2, 0.0), false)
    }

    proptest! {
        #[test]
        fn test_buffer_never_exceeds_capacity(capacity in 1usize..64, pushes in 0usize..200) {
            let mut buffer = ReplayBuffer::new(capacity, 2).unwrap();
            for i in 0..pushes {
                buffer.push(transition(i)).unwrap();
                prop_assert!(buffer.len() <= capacity);
            }
            prop_assert_eq!(buffer.len(), pushes.min(capacity));
            if pushes > 0 {
                let oldest = pushes.saturating_sub(capacity);
                prop_assert_eq!(buffer.get(0).unwrap().reward, oldest as f32);
            }
        }

        #[test]
        fn test_sample_indices_distinct(len in 1usize..100, seed in any::<u64>(), k_frac in 0.0f64..=1.0) {
            let mut buffer = ReplayBuffer::new(len, 2).unwrap();
            for i in 0..len {
                buffer.push(transition(i)).unwrap();
            }
            let k = ((len as f64) * k_frac) as usize;
            let mut rng = StdRng::seed_from_u64(seed);
            let indices = buffer.sample_indices(k, &mut rng).unwrap();
            let unique: HashSet<usize> = indices.iter().copied().collect();
            prop_assert_eq!(unique.len(), k);
            prop_assert!(buffer.sample_indices(len + 1, &mut rng).is_err());
        }

        #[test]
        fn test_interpolate_stays_between(
            pairs in prop::collection::vec((-100.0f32..100.0, -100.0f32..100.0), 1..32),
            tau in 0.0f32..=1.0,
        ) {
            let online: Array1<f32> = pairs.iter().map(|p| p.0).collect();
            let target: Array1<f32> = pairs.iter().map(|p| p.1).collect();
            let mixed = interpolate(&online.view(), &target.view(), tau);
            for ((&m, &o), &t) in mixed.iter().zip(online.iter()).zip(target.iter()) {
                prop_assert!((m - t).abs() <= tau * (o - t).abs() + 1e-4);
                prop_assert!(m >= o.min(t) - 1e-4 && m <= o.max(t) + 1e-4);
            }
        }

        #[test]
        fn test_soft_update_bound(seed_a in any::<u64>(), seed_b in any::<u64>(), tau in 0.0f32..=1.0) {
            let online = QNetwork::new(4, 2, Device::Cpu, &mut StdRng::seed_from_u64(seed_a)).unwrap();
            let mut target = QNetwork::new(4, 2, Device::Cpu, &mut StdRng::seed_from_u64(seed_b)).unwrap();
            let before = target.clone();
            soft_update(&mut target, &online, tau).unwrap();
            for ((after, before), online) in target.layers.iter().zip(&before.layers).zip(&online.layers) {
                for ((&ta, &tb), &o) in after.weights.iter().zip(before.weights.iter()).zip(online.weights.iter()) {
                    prop_assert!((ta - tb).abs() <= tau * (o - tb).abs() + 1e-6);
                }
            }
        }

        #[test]
        fn test_epsilon_monotone(start in 0.01f32..=1.0, min in 0.0f32..0.01, decay in 0.5f32..=1.0, steps in 1usize..500) {
            let mut schedule = EpsilonSchedule::new(start, min, decay);
            let mut previous = schedule.value();
            for _ in 0..steps {
                let next = schedule.step();
                prop_assert!(next <= previous);
                prop_assert!(next >= min);
                previous = next;
            }
        }
    }
}
