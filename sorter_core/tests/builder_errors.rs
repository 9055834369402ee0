use rstest::rstest;
use std::cell::Cell;
use std::rc::Rc;
use sorter_core::error::BuildError;
use sorter_core::{SamplingCfg, SortingLoop, StartupCfg, WeightBand};
use sorter_traits::{Actuator, BoxError, WeightSensor};

struct Scale;
impl WeightSensor for Scale {
    fn read(&mut self, _samples: u8) -> Result<f32, BoxError> {
        Ok(0.0)
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

/// Empty scale that counts conversions.
struct CountingScale(Rc<Cell<usize>>);
impl WeightSensor for CountingScale {
    fn read(&mut self, _samples: u8) -> Result<f32, BoxError> {
        self.0.set(self.0.get() + 1);
        Ok(0.0)
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

fn band() -> WeightBand {
    WeightBand::new(40.0, 60.0).unwrap()
}

fn build_error(err: &eyre::Report) -> BuildError {
    err.downcast_ref::<BuildError>()
        .cloned()
        .unwrap_or_else(|| panic!("expected BuildError, got: {err:?}"))
}

#[rstest]
fn missing_sensor_yields_typed_build_error() {
    let err = SortingLoop::builder()
        .with_pusher(Servo)
        .with_ejector(Servo)
        .with_band(band())
        .try_build()
        .expect_err("should fail with MissingSensor");
    assert_eq!(build_error(&err), BuildError::MissingSensor);
}

#[rstest]
fn missing_ejector_yields_typed_build_error() {
    let err = SortingLoop::builder()
        .with_sensor(Scale)
        .with_pusher(Servo)
        .with_band(band())
        .try_build()
        .expect_err("should fail with MissingEjector");
    assert_eq!(build_error(&err), BuildError::MissingEjector);
}

#[rstest]
fn missing_band_yields_typed_build_error() {
    let err = SortingLoop::builder()
        .with_sensor(Scale)
        .with_pusher(Servo)
        .with_ejector(Servo)
        .build()
        .expect_err("should fail with MissingBand");
    assert_eq!(build_error(&err), BuildError::MissingBand);
}

#[rstest]
#[case(60.0, 40.0)]
#[case(f32::NAN, 40.0)]
#[case(10.0, f32::INFINITY)]
fn invalid_band_is_rejected(#[case] min: f32, #[case] max: f32) {
    let err = SortingLoop::builder()
        .with_band_grams(min, max)
        .map(|_| ())
        .expect_err("band must be rejected");
    assert!(matches!(build_error(&err), BuildError::InvalidBand { .. }));
}

#[rstest]
fn degenerate_band_is_allowed() {
    let band = WeightBand::new(50.0, 50.0).unwrap();
    assert!(band.contains(50.0));
    assert!(!band.contains(50.01));
}

#[rstest]
#[case(-1.0)]
#[case(f32::NAN)]
fn bad_presence_threshold_is_rejected(#[case] threshold: f32) {
    let err = SortingLoop::builder()
        .with_sensor(Scale)
        .with_pusher(Servo)
        .with_ejector(Servo)
        .with_band(band())
        .with_sampling(SamplingCfg {
            sample_count: 5,
            presence_threshold_g: threshold,
        })
        .build()
        .expect_err("threshold must be rejected");
    assert!(matches!(build_error(&err), BuildError::InvalidConfig(_)));
}

#[rstest]
fn zero_calibration_factor_is_rejected() {
    let err = SortingLoop::builder()
        .with_sensor(Scale)
        .with_pusher(Servo)
        .with_ejector(Servo)
        .with_band(band())
        .with_startup(StartupCfg {
            calibration_factor: Some(0.0),
            ..StartupCfg::default()
        })
        .build()
        .expect_err("factor must be rejected");
    assert!(matches!(build_error(&err), BuildError::InvalidConfig(_)));
}

#[rstest]
#[case(0)]
#[case(2)]
#[case(12)]
#[case(usize::MAX)]
fn out_of_range_sample_count_is_clamped_not_rejected(#[case] n: usize) {
    let reads = Rc::new(Cell::new(0));
    let mut sorter = SortingLoop::builder()
        .with_sensor(CountingScale(reads.clone()))
        .with_pusher(Servo)
        .with_ejector(Servo)
        .with_band(band())
        .with_sampling(SamplingCfg {
            sample_count: n,
            presence_threshold_g: 10.0,
        })
        .build()
        .expect("out-of-range window still builds");
    sorter.tick();
    let expected = if n < 3 { 3 } else { 7 };
    assert_eq!(reads.get(), expected);
}
