use rstest::rstest;
use sorter_hardware::error::HwError;
use sorter_hardware::{SimCfg, SimLine};
use sorter_traits::{Actuator, PresenceSensor, WeightSensor};

fn line(transit_polls: u32, pulse_polls: u32) -> SimLine {
    SimLine::new(SimCfg {
        transit_polls,
        pulse_polls,
        ..SimCfg::default()
    })
}

#[rstest]
fn accepted_item_pulls_presence_low_for_pulse_width() {
    let line = line(3, 2);
    line.place(100.0);
    line.pusher().set_angle(180).unwrap();

    let mut presence = line.presence();
    let levels: Vec<bool> = (0..6).map(|_| presence.is_high().unwrap()).collect();
    assert_eq!(levels, vec![true, true, false, false, true, true]);
    assert_eq!(line.stats().exited, 1);
}

#[rstest]
fn ejected_item_never_reaches_exit() {
    let line = line(10, 2);
    line.place(30.0);
    line.pusher().set_angle(180).unwrap();
    line.pusher().set_angle(0).unwrap();
    line.ejector().set_angle(145).unwrap();

    let mut presence = line.presence();
    assert!((0..20).all(|_| presence.is_high().unwrap()));
    let st = line.stats();
    assert_eq!(st.ejected, 1);
    assert_eq!(st.exited, 0);
}

#[rstest]
fn not_ready_sensor_errors_with_typed_hw_error() {
    let line = SimLine::default();
    line.set_ready(false);
    let mut sensor = line.sensor();
    assert!(!sensor.is_ready());
    let err = sensor.read(1).expect_err("not ready");
    assert!(matches!(err.downcast_ref::<HwError>(), Some(HwError::NotReady)));
}

#[rstest]
fn spike_lands_on_every_nth_read() {
    let line = SimLine::new(SimCfg {
        spike_every: Some(3),
        spike_g: 400.0,
        ..SimCfg::default()
    });
    line.place(50.0);
    let mut sensor = line.sensor();
    let reads: Vec<f32> = (0..6).map(|_| sensor.read(1).unwrap()).collect();
    assert_eq!(reads, vec![50.0, 50.0, 450.0, 50.0, 50.0, 450.0]);
}

#[rstest]
fn queued_items_arrive_one_at_a_time() {
    let line = SimLine::default();
    line.enqueue_all([60.0, 70.0]);
    let mut sensor = line.sensor();
    assert_eq!(sensor.read(1).unwrap(), 60.0);
    assert_eq!(sensor.read(1).unwrap(), 60.0);
    line.pusher().set_angle(180).unwrap();
    assert_eq!(sensor.read(1).unwrap(), 70.0);
    assert_eq!(line.stats().remaining, 0);
}

#[rstest]
#[case(0.0)]
#[case(f32::NAN)]
fn rejects_degenerate_calibration(#[case] factor: f32) {
    let line = SimLine::default();
    let mut sensor = line.sensor();
    assert!(sensor.set_calibration(factor).is_err());
    sensor.set_calibration(420.0).unwrap();
    assert_eq!(line.calibration(), 420.0);
}

#[rstest]
fn actuator_rejects_out_of_range_angle() {
    let line = SimLine::default();
    assert!(line.pusher().set_angle(181).is_err());
    assert!(line.pusher_angles().is_empty());
}
