//! Demo Mode - Synthetic datalog generator
//!
//! Generates a realistic, noisy wide-open-throttle pull for examples and
//! tests without a real log file. Seeded, so the same seed always produces
//! the same log.

use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;

use crate::datalog::{CanonicalChannel, Channel, Dataset};
use crate::unit_conversion::kpa_to_psi;

const ATMOSPHERIC_KPA: f64 = 101.325;

/// Synthetic turbocharged engine pulling through the rev range
pub struct DemoLogGenerator {
    rng: StdRng,
    /// Samples per second
    sample_rate_hz: f64,
    /// Peak requested torque (N·m)
    peak_torque_nm: f64,
    /// RPM at peak torque
    peak_torque_rpm: f64,
    /// Target boost (kPa above atmospheric)
    boost_target_kpa: f64,
    /// Chance per sample of a knock retard event
    knock_probability: f64,
}

impl DemoLogGenerator {
    /// Create a generator with a fixed seed
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            sample_rate_hz: 20.0,
            peak_torque_nm: 380.0,
            peak_torque_rpm: 4000.0,
            boost_target_kpa: 110.0,
            knock_probability: 0.01,
        }
    }

    /// Samples per second, clamped to 1-1000 Hz
    pub fn with_sample_rate(mut self, hz: f64) -> Self {
        self.sample_rate_hz = hz.clamp(1.0, 1000.0);
        self
    }

    /// Peak torque (N·m) and the RPM it occurs at
    pub fn with_peak_torque(mut self, torque_nm: f64, at_rpm: f64) -> Self {
        self.peak_torque_nm = torque_nm;
        self.peak_torque_rpm = at_rpm;
        self
    }

    /// Chance per wide-open-throttle sample of a knock event
    pub fn with_knock_probability(mut self, probability: f64) -> Self {
        self.knock_probability = probability.clamp(0.0, 1.0);
        self
    }

    /// Uniform noise in `[-amplitude, amplitude]`
    fn noise(&mut self, amplitude: f64) -> f64 {
        (self.rng.gen::<f64>() * 2.0 - 1.0) * amplitude
    }

    /// Noise-free torque curve: quadratic fall-off either side of the peak
    fn torque_at(&self, rpm: f64) -> f64 {
        let spread = (rpm - self.peak_torque_rpm) / 4000.0;
        (self.peak_torque_nm * (1.0 - spread * spread)).max(0.0)
    }

    /// Generate one pull from `start_rpm` to `end_rpm` over `duration_secs`.
    ///
    /// The first 10% of the log is part throttle before the driver goes to
    /// wide open throttle.
    pub fn pull(&mut self, start_rpm: f64, end_rpm: f64, duration_secs: f64) -> Dataset {
        let samples = ((duration_secs * self.sample_rate_hz).round() as usize).max(2);
        let tip_in = samples / 10;

        let mut time = Vec::with_capacity(samples);
        let mut rpm = Vec::with_capacity(samples);
        let mut throttle = Vec::with_capacity(samples);
        let mut boost = Vec::with_capacity(samples);
        let mut torque = Vec::with_capacity(samples);
        let mut load = Vec::with_capacity(samples);
        let mut timing = Vec::with_capacity(samples);
        let mut knock = Vec::with_capacity(samples);
        let mut afr = Vec::with_capacity(samples);

        for i in 0..samples {
            let progress = i as f64 / (samples - 1) as f64;
            let wot = i >= tip_in;
            let engine_rpm = start_rpm + (end_rpm - start_rpm) * progress + self.noise(15.0);

            // Turbo spools over the first ~1500 RPM of the pull
            let spool = if wot {
                ((engine_rpm - start_rpm) / 1500.0).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let map_kpa = if wot {
                ATMOSPHERIC_KPA + self.boost_target_kpa * spool + self.noise(4.0)
            } else {
                60.0 + self.noise(3.0)
            };

            let throttle_pct = if wot {
                100.0 - self.noise(1.0).abs()
            } else {
                25.0 + self.noise(2.0)
            };
            let torque_scale = if wot { 0.55 + 0.45 * spool } else { 0.3 };
            let knock_retard = if wot && self.rng.gen_bool(self.knock_probability) {
                1.0 + self.rng.gen::<f64>() * 3.0
            } else {
                0.0
            };

            time.push(i as f64 / self.sample_rate_hz);
            rpm.push(engine_rpm);
            throttle.push(throttle_pct);
            boost.push(kpa_to_psi(map_kpa - ATMOSPHERIC_KPA));
            torque.push(self.torque_at(engine_rpm) * torque_scale + self.noise(6.0));
            load.push(map_kpa / ATMOSPHERIC_KPA * 1.1 + self.noise(0.03));
            timing.push(12.0 + 8.0 * (1.0 - spool) - knock_retard + self.noise(0.5));
            knock.push(knock_retard);
            let target_afr = if wot { 11.6 } else { 14.7 };
            afr.push(target_afr + self.noise(0.2));
        }

        let channels = vec![
            Channel::numeric(CanonicalChannel::Time.column(), time),
            Channel::numeric(CanonicalChannel::Rpm.column(), rpm),
            Channel::numeric(CanonicalChannel::Throttle.column(), throttle),
            Channel::numeric(CanonicalChannel::Boost.column(), boost),
            Channel::numeric(CanonicalChannel::RequestedTorque.column(), torque),
            Channel::numeric(CanonicalChannel::CalculatedLoad.column(), load),
            Channel::numeric(CanonicalChannel::IgnitionTiming.column(), timing),
            Channel::numeric(CanonicalChannel::Knock.column(), knock),
            Channel::numeric(CanonicalChannel::AirFuelRatio.column(), afr),
        ];

        Dataset::new(channels).unwrap_or_default()
    }
}
