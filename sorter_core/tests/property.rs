use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use proptest::prelude::*;
use sorter_core::{
    Classification, SortingLoop, TickStatus, TimingCfg, WeightBand, classify, median_in_place,
};
use sorter_traits::clock::test_clock::TestClock;
use sorter_traits::{Actuator, BoxError, WeightSensor};

#[derive(Clone)]
struct Scale(Rc<Cell<f32>>);

impl WeightSensor for Scale {
    fn read(&mut self, _samples: u8) -> Result<f32, BoxError> {
        Ok(self.0.get())
    }
    fn is_ready(&mut self) -> bool {
        true
    }
    fn tare(&mut self) -> Result<(), BoxError> {
        Ok(())
    }
    fn set_calibration(&mut self, _factor: f32) -> Result<(), BoxError> {
        Ok(())
    }
}

struct Servo;
impl Actuator for Servo {
    fn set_angle(&mut self, _degrees: u8) -> Result<(), BoxError> {
        Ok(())
    }
}

prop_compose! {
    fn band_strategy()(min in 0.0f32..500.0, width in 0.0f32..200.0) -> (f32, f32) {
        (min, min + width)
    }
}

proptest! {
    #[test]
    fn median_is_middle_of_sorted_window(mut window in prop::collection::vec(-1e6f32..1e6, 3..=7)) {
        let mut sorted = window.clone();
        sorted.sort_by(f32::total_cmp);
        let (lo, hi) = (sorted[0], sorted[sorted.len() - 1]);
        let m = median_in_place(&mut window).unwrap();
        prop_assert!(lo <= m && m <= hi);
        prop_assert_eq!(m, sorted[sorted.len() / 2]);
    }

    #[test]
    fn single_spike_never_reaches_median(
        base in 20.0f32..400.0,
        jitter in prop::collection::vec(0.0f32..1.0, 3..=7),
        spike_at in 0usize..7,
        spike in prop_oneof![Just(-1e4f32), Just(1e4f32)],
    ) {
        let mut window: Vec<f32> = jitter.iter().map(|j| base + j).collect();
        let idx = spike_at % window.len();
        window[idx] = base + spike;
        let m = median_in_place(&mut window).unwrap();
        prop_assert!(m >= base && m <= base + 1.0);
    }

    #[test]
    fn classify_partitions_finite_weights((min, max) in band_strategy(), w in -100.0f32..1000.0) {
        let band = WeightBand::new(min, max).unwrap();
        let expected = if w < min {
            Classification::RejectLight
        } else if w > max {
            Classification::RejectHeavy
        } else {
            Classification::Accept
        };
        prop_assert_eq!(classify(w, &band), expected);
    }

    #[test]
    fn counts_sum_to_completed_cycles(weights in prop::collection::vec(10.0f32..200.0, 1..20)) {
        let clock = TestClock::new();
        let scale = Scale(Rc::new(Cell::new(0.0)));
        let mut sorter = SortingLoop::builder()
            .with_sensor(scale.clone())
            .with_pusher(Servo)
            .with_ejector(Servo)
            .with_band_grams(50.0, 120.0)
            .unwrap()
            .with_timing(TimingCfg::immediate())
            .with_clock(Box::new(clock.clone()))
            .build()
            .unwrap();

        let mut completed = 0u64;
        for &w in &weights {
            scale.0.set(w);
            for _ in 0..10 {
                let status = sorter.tick();
                clock.advance(Duration::from_millis(1));
                if let TickStatus::Completed(_) = status {
                    completed += 1;
                    break;
                }
            }
        }

        let expected_pass = weights.iter().filter(|&&w| (50.0..=120.0).contains(&w)).count() as u64;
        let counts = sorter.counters();
        prop_assert_eq!(completed, weights.len() as u64);
        prop_assert_eq!(counts.total(), completed);
        prop_assert_eq!(counts.pass(), expected_pass);
    }
}
