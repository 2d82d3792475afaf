//! Constants module for astronomical calculations

use std::f64::consts::PI;

// Time constants
/// Seconds in a day
pub const DAY_S: f64 = 86_400.0;
/// Seconds in a day, integral form for epoch-second splitting
pub const DAY_S_I64: i64 = 86_400;
/// J2000.0 epoch as Julian date
pub const J2000: f64 = 2_451_545.0;
/// Julian date of the Unix epoch (1970-01-01T00:00:00Z)
pub const JD_UNIX_EPOCH: f64 = 2_440_587.5;
/// Days in a Julian century
pub const DAYS_PER_JULIAN_CENTURY: f64 = 36_525.0;
/// Julian date of 2000 January 0.0 UT, day zero of the low-order orbital elements
pub const JD_2000_JAN_0: f64 = 2_451_543.5;

// Angles
/// Degrees to radians conversion factor
pub const DEG2RAD: f64 = PI / 180.0;
/// Radians to degrees conversion factor
pub const RAD2DEG: f64 = 180.0 / PI;
/// Degrees of right ascension per hour
pub const DEG_PER_HOUR: f64 = 15.0;

// Sidereal time (IAU 1982, Meeus 12.4)
/// GMST at J2000.0 in degrees
pub const GMST_AT_J2000_DEG: f64 = 280.460_618_37;
/// GMST rate in degrees per day
pub const GMST_RATE_DEG_PER_DAY: f64 = 360.985_647_366_29;
/// Quadratic GMST coefficient
pub const GMST_T2_COEFF: f64 = 0.000_387_933;
/// Divisor of the cubic GMST term
pub const GMST_T3_DIVISOR: f64 = 38_710_000.0;

// Distances
/// Astronomical Unit in kilometers
pub const AU_KM: f64 = 149_597_870.700;
/// Earth's equatorial radius expressed in AU (6378.14 km)
pub const EARTH_RADIUS_AU: f64 = 6_378.14 / AU_KM;
