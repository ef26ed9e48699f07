//! Unit conversions used by the analysis
//!
//! Logs and vehicle data arrive in a mix of metric and imperial units; the
//! estimators work in lb-ft, horsepower, psi, pounds and feet.

/// Pound-feet per newton-meter, as used for horsepower estimates
pub const NM_TO_LBFT: f64 = 0.73756;

/// PSI per kilopascal
pub const PSI_PER_KPA: f64 = 0.14503773773020923;

/// Kilograms per pound (exact)
pub const KG_PER_LB: f64 = 0.45359237;

/// Meters per foot (exact)
pub const M_PER_FT: f64 = 0.3048;

/// Convert newton-meters to pound-feet
pub fn nm_to_lbft(nm: f64) -> f64 {
    nm * NM_TO_LBFT
}

/// Convert pound-feet to newton-meters
pub fn lbft_to_nm(lbft: f64) -> f64 {
    lbft / NM_TO_LBFT
}

/// Convert gauge pressure in kPa to boost in PSI
pub fn kpa_to_psi(kpa: f64) -> f64 {
    kpa * PSI_PER_KPA
}

/// Convert kilograms to pounds
pub fn kg_to_lbs(kg: f64) -> f64 {
    kg / KG_PER_LB
}

/// Convert meters to feet
pub fn meters_to_feet(meters: f64) -> f64 {
    meters / M_PER_FT
}
