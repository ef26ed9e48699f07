use carlog_core::demo::DemoLogGenerator;
use carlog_core::prelude::*;
use std::env;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    let log = match args.get(1) {
        Some(path) => {
            println!("Loading: {}", path);
            match read_log_file(path) {
                Ok(log) => log,
                Err(e) => {
                    println!("Failed to load log: {}", e);
                    return;
                }
            }
        }
        None => {
            println!("Usage: analyze_log [csv_file] [weight_lbs] [altitude_ft]");
            println!("No log given, using a generated pull\n");
            DemoLogGenerator::new(1).pull(2500.0, 6800.0, 8.0)
        }
    };

    let weight = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(3200.0);
    let altitude = args.get(3).and_then(|s| s.parse().ok()).unwrap_or(0.0);

    let config = AnalysisConfig::default();
    let session = AnalysisSession::new(log);
    println!("Rows: {}", session.dataset().len());
    println!("Channels: {}", session.dataset().channel_names().join(", "));

    let mut wot = match session.filtered(&config.filter.clone().with_throttle(90.0, 100.0)) {
        Ok(session) => session,
        Err(e) => {
            println!("Cannot filter log: {}", e);
            return;
        }
    };
    println!("Wide open throttle rows: {}", wot.dataset().len());

    match wot.compute_horsepower() {
        Ok(peak) => println!("Peak: {:.1} hp at {:.0} RPM", peak.hp, peak.rpm),
        Err(e) => {
            println!("Cannot estimate horsepower: {}", e);
            return;
        }
    }

    let profile = VehicleProfile::new(weight, altitude);
    for (z, q) in [
        (ZeroToSixtyMode::default(), QuarterMileMode::default()),
        (ZeroToSixtyMode::PhysicsStyle, QuarterMileMode::CubeRoot),
        (ZeroToSixtyMode::DrivetrainAdjusted, QuarterMileMode::default()),
    ] {
        match wot.performance(&PerformanceEstimator::new(z, q), &profile) {
            Ok(report) => println!("\n{}", report),
            Err(e) => println!("\nEstimate failed: {}", e),
        }
    }

    if let Ok(events) = wot.knock_events(config.knock_threshold) {
        println!("\nKnock events: {}", events.len());
        for event in events.iter().take(5) {
            println!(
                "  rows {}-{}: {:.1}° at {:?} RPM",
                event.start_row, event.end_row, event.peak, event.rpm_at_peak
            );
        }
    }
}
