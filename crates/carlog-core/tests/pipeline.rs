//! End-to-end analysis of a synthetic pull

use carlog_core::analysis::channel_stats;
use carlog_core::demo::DemoLogGenerator;
use carlog_core::events::EventMarker;
use carlog_core::prelude::*;
use pretty_assertions::assert_eq;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn demo_session() -> AnalysisSession {
    let log = DemoLogGenerator::new(11)
        .with_knock_probability(0.05)
        .pull(2500.0, 6800.0, 8.0);
    AnalysisSession::new(log)
}

#[test]
fn test_full_pull_analysis() {
    init_tracing();
    let config = AnalysisConfig::default();
    let wot = RangeFilter::rpm(3000.0, 6500.0).with_throttle(90.0, 100.0);

    let mut session = demo_session().filtered(&wot).unwrap();
    let peak = session.compute_horsepower().unwrap();

    let hp = session.dataset().numeric("Estimated Horsepower").unwrap();
    let max_hp = hp.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    assert_eq!(peak.hp, max_hp);
    assert!((3000.0..=6500.0).contains(&peak.rpm));

    let sea_level = session
        .performance(&config.estimator(), &VehicleProfile::new(3200.0, 0.0))
        .unwrap();
    let mountain = session
        .performance(&config.estimator(), &VehicleProfile::new(3200.0, 7300.0))
        .unwrap();

    assert_eq!(sea_level.peak_hp, peak.hp);
    assert!(mountain.corrected_hp < sea_level.corrected_hp);
    assert!(mountain.zero_to_sixty.seconds >= sea_level.zero_to_sixty.seconds);
    assert!(mountain.quarter_mile.seconds > sea_level.quarter_mile.seconds);
    assert!(sea_level.zero_to_sixty.seconds >= 2.5);
    assert!(sea_level.quarter_mile.seconds >= 9.5);
}

#[test]
fn test_performance_before_horsepower_is_prerequisite_error() {
    let session = demo_session();
    let err = session
        .performance(&PerformanceEstimator::default(), &VehicleProfile::default())
        .unwrap_err();
    assert!(err.is_prerequisite());
}

#[test]
fn test_smoothed_boost_curve() {
    init_tracing();
    let session = demo_session();
    let config = SmoothingPreset::Light.config();

    let raw = session.dataset().numeric("Boost (psi)").unwrap().to_vec();
    let smoothed = session.smoothed("Boost (psi)", &config).unwrap();
    assert_eq!(smoothed.len(), raw.len());

    let curve = session.boost_vs_rpm(&config).unwrap();
    assert_eq!(curve.len(), raw.len());
    for ((rpm, boost), expected) in curve.iter().zip(&smoothed) {
        assert!(rpm.is_finite());
        assert_eq!(boost, expected);
    }
}

#[test]
fn test_missing_channels_reported_by_name() {
    let log = Dataset::new(vec![Channel::numeric("Time (sec)", vec![0.0, 0.1])]).unwrap();
    let mut session = AnalysisSession::new(log);

    let err = session.compute_horsepower().unwrap_err();
    assert_eq!(
        err.missing_columns(),
        Some(&["RPM (RPM)".to_string(), "Req Torque (Nm)".to_string()][..])
    );
    assert!(err.to_string().contains("RPM (RPM), Req Torque (Nm)"));

    let err = session.boost_vs_rpm(&SmoothingConfig::default()).unwrap_err();
    assert!(err.missing_columns().is_some());
}

#[test]
fn test_knock_and_stats() {
    let session = demo_session();

    let events = session.knock_events(0.5).unwrap();
    for event in &events {
        assert!(event.start_row <= event.end_row);
        assert!(event.peak > 0.5);
        assert!(event.rpm_at_peak.is_some());
    }

    let stats = session.channel_stats("RPM (RPM)").unwrap();
    assert_eq!(stats.count, session.dataset().len());
    assert!(stats.min < 2600.0 && stats.max > 6700.0);
    assert_eq!(stats, channel_stats(session.dataset(), "RPM (RPM)").unwrap());
}

#[test]
fn test_event_markers() {
    init_tracing();
    let session = demo_session();

    let placement = session
        .place_events(&[
            EventMarker::new("launch", 1.0),
            EventMarker::new("2-3 shift", 4.02),
            EventMarker::new("after log", 30.0),
        ])
        .unwrap();

    assert_eq!(placement.placed.len(), 2);
    assert_eq!(placement.placed[0].row, 20);
    assert!(placement.placed[1].row_time_secs >= 4.02);
    assert_eq!(placement.warnings.len(), 1);
    assert_eq!(placement.warnings[0].marker.label, "after log");
}
