//! Tests for the 0-60 and quarter-mile estimators

use carlog_core::performance::{AltitudeCorrection, ElapsedTime};
use carlog_core::prelude::*;

fn simple() -> PerformanceEstimator {
    PerformanceEstimator::default()
}

#[test]
fn test_altitude_correction_monotonic_and_floored() {
    let correction = AltitudeCorrection::default();
    let max_hp = 300.0;
    let mut previous = f64::INFINITY;

    for altitude in (0..=40_000).step_by(500) {
        let corrected = correction.apply(max_hp, altitude as f64);
        assert!(corrected <= previous, "not monotonic at {altitude} ft");
        assert!(corrected >= max_hp * 0.5);
        previous = corrected;
    }
}

#[test]
fn test_simple_zero_to_sixty_never_below_floor() {
    let estimator = simple();
    for hp in [50.0, 150.0, 400.0, 1200.0, 5000.0] {
        for weight in [1000.0, 2500.0, 4500.0] {
            let t = estimator
                .zero_to_sixty(hp, &VehicleProfile::new(weight, 0.0))
                .unwrap();
            assert!(t.seconds >= 2.5, "{hp} hp / {weight} lbs gave {}", t.seconds);
        }
    }
}

#[test]
fn test_light_powerful_car_hits_floor() {
    let t = simple()
        .zero_to_sixty(1000.0, &VehicleProfile::new(2000.0, 0.0))
        .unwrap();
    assert_eq!(t.seconds, 2.5);
    assert!(t.is_floored());
    assert!(t.raw_seconds < 0.1);
}

#[test]
fn test_end_to_end_altitude_scenario() {
    let log = Dataset::new(vec![
        Channel::numeric("RPM (RPM)", vec![5252.0]),
        Channel::numeric("Req Torque (Nm)", vec![135.64]),
    ])
    .unwrap();

    let estimate = estimate_horsepower(&log).unwrap();
    let hp = estimate.dataset.numeric("Estimated Horsepower").unwrap();
    assert!((hp[0] - 100.0).abs() < 0.05);
    assert!((estimate.peak.hp - 100.0).abs() < 0.05);

    let at_altitude = simple()
        .zero_to_sixty(100.0, &VehicleProfile::new(3200.0, 7300.0))
        .unwrap();
    let at_sea_level = simple()
        .zero_to_sixty(100.0, &VehicleProfile::new(3200.0, 0.0))
        .unwrap();

    assert!(at_altitude.seconds > 0.0);
    assert!(at_altitude.seconds >= 2.5);
    // Both sit on the floor at this power-to-weight; the formula itself
    // still shows the altitude penalty
    assert!(at_altitude.raw_seconds > at_sea_level.raw_seconds);
    assert!(at_altitude.seconds >= at_sea_level.seconds);
}

#[test]
fn test_altitude_slows_unfloored_estimate() {
    let at_altitude = simple()
        .zero_to_sixty(40.0, &VehicleProfile::new(3200.0, 7300.0))
        .unwrap();
    let at_sea_level = simple()
        .zero_to_sixty(40.0, &VehicleProfile::new(3200.0, 0.0))
        .unwrap();

    assert!(!at_sea_level.is_floored());
    assert!(at_altitude.seconds > at_sea_level.seconds);
}

#[test]
fn test_modes_are_distinct() {
    let profile = VehicleProfile::new(3200.0, 0.0);
    let modes = [
        ZeroToSixtyMode::default(),
        ZeroToSixtyMode::PhysicsStyle,
        ZeroToSixtyMode::DrivetrainAdjusted,
    ];

    let results: Vec<ElapsedTime> = modes
        .iter()
        .map(|&mode| {
            PerformanceEstimator::new(mode, QuarterMileMode::default())
                .zero_to_sixty(100.0, &profile)
                .unwrap()
        })
        .collect();

    assert!((results[0].seconds - 2.5).abs() < 1e-12);
    assert!((results[1].seconds - 5.825 * 3200.0 / 85.0).abs() < 1e-6);
    assert!((results[2].seconds - 3.3).abs() < 1e-12);
}

#[test]
fn test_drivetrain_adjusted_factors() {
    let estimator = PerformanceEstimator::new(
        ZeroToSixtyMode::DrivetrainAdjusted,
        QuarterMileMode::default(),
    );
    let base = 0.023 * (3200.0_f64 / 30.0).powf(1.12);

    let rwd_v8 = estimator
        .zero_to_sixty(30.0, &VehicleProfile::new(3200.0, 0.0))
        .unwrap();
    assert!((rwd_v8.seconds - base).abs() < 1e-9);

    let fwd_i4 = estimator
        .zero_to_sixty(
            30.0,
            &VehicleProfile::new(3200.0, 0.0)
                .with_drivetrain(Drivetrain::Fwd)
                .with_cylinders(4),
        )
        .unwrap();
    assert!((fwd_i4.seconds - base * 1.10 * 1.12).abs() < 1e-9);

    // AWD floor is lower than the others
    let awd = estimator
        .zero_to_sixty(
            1000.0,
            &VehicleProfile::new(3000.0, 0.0).with_drivetrain(Drivetrain::Awd),
        )
        .unwrap();
    assert_eq!(awd.seconds, 2.7);
}

#[test]
fn test_quarter_mile_modes() {
    let profile = VehicleProfile::new(3200.0, 0.0);

    let simple_et = simple().quarter_mile(100.0, &profile).unwrap();
    assert!((simple_et.seconds - 5.9 * 32.0_f64.powf(0.36)).abs() < 1e-9);

    let cube_root = PerformanceEstimator::new(ZeroToSixtyMode::default(), QuarterMileMode::CubeRoot)
        .quarter_mile(100.0, &profile)
        .unwrap();
    assert!((cube_root.seconds - 6.29 * 32.0_f64.cbrt()).abs() < 1e-9);

    let floored = simple()
        .quarter_mile(2000.0, &VehicleProfile::new(1500.0, 0.0))
        .unwrap();
    assert_eq!(floored.seconds, 9.5);
}

#[test]
fn test_estimate_requires_horsepower_first() {
    let err = simple()
        .estimate(None, &VehicleProfile::default())
        .unwrap_err();
    assert!(err.is_prerequisite());
    assert!(matches!(err, AnalysisError::PrerequisiteNotMet { .. }));
}

#[test]
fn test_report_display_two_decimals() {
    let peak = PeakHorsepower {
        hp: 100.0,
        rpm: 5252.0,
        row: 0,
    };
    let report = simple()
        .estimate(Some(&peak), &VehicleProfile::new(3200.0, 0.0))
        .unwrap();

    let text = report.to_string();
    assert!(text.contains("0-60 mph: 2.50 s [simple]"), "{text}");
    assert!(text.contains("1/4 mile: 20.54 s [simple]"), "{text}");
}

#[test]
fn test_non_positive_peak_rejected() {
    let profile = VehicleProfile::new(3200.0, 0.0);
    for estimator in [
        simple(),
        PerformanceEstimator::new(ZeroToSixtyMode::PhysicsStyle, QuarterMileMode::CubeRoot),
    ] {
        for max_hp in [0.0, -50.0, f64::NEG_INFINITY] {
            assert!(matches!(
                estimator.zero_to_sixty(max_hp, &profile),
                Err(AnalysisError::InvalidParameter(_))
            ));
            assert!(matches!(
                estimator.quarter_mile(max_hp, &profile),
                Err(AnalysisError::InvalidParameter(_))
            ));
        }
    }

    let idle = PeakHorsepower {
        hp: 0.0,
        rpm: 800.0,
        row: 0,
    };
    assert!(simple().estimate(Some(&idle), &profile).is_err());
}
