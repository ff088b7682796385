use hifitime::{Duration, Epoch};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::cfg::{BearingMode, UnitMode};
use crate::geo::GeoPoint;
use crate::waypoint::Waypoint;

/// Owned copy of the navigation state at one instant.
///
/// Every measured field is an Option: `None` means "never observed" (or
/// cleared by a reset), not zero. Speeds are knots unless the snapshot
/// was taken under [UnitMode::Metric], in which case wind speeds are
/// m.s⁻¹; `units` records which applies. Angles are degrees [0, 360),
/// depth meters, temperature Celsius, log distances nautical miles.
#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NavigationSnapshot {
    /// Unit mode the wind speeds below are expressed in
    pub units: UnitMode,
    /// Configured heading reference for display
    pub bearing: BearingMode,

    /// Boat position (GPS)
    pub position: Option<GeoPoint>,
    /// Speed over ground (knots)
    pub sog_kts: Option<f64>,
    /// Course over ground (degrees true)
    pub cog_deg: Option<f64>,

    /// Smoothed magnetic heading
    pub heading_mag_deg: Option<f64>,
    /// Smoothed true heading (variation-corrected or from HDT)
    pub heading_true_deg: Option<f64>,

    /// Smoothed speed through water (knots)
    pub stw_kts: Option<f64>,
    /// Smoothed depth below transducer (meters)
    pub depth_m: Option<f64>,
    /// Sea water temperature (Celsius), unfiltered
    pub water_temp_c: Option<f64>,
    /// Cumulative log distance (nautical miles), unfiltered
    pub total_log_nm: Option<f64>,
    /// Log distance since reset (nautical miles), unfiltered
    pub trip_log_nm: Option<f64>,

    /// Smoothed apparent wind angle, relative to the bow
    pub awa_deg: Option<f64>,
    /// Smoothed apparent wind speed
    pub aws: Option<f64>,
    /// Apparent wind direction (compass), needs a heading
    pub awd_deg: Option<f64>,
    /// Smoothed true wind angle, relative to the bow
    pub twa_deg: Option<f64>,
    /// Smoothed true wind speed
    pub tws: Option<f64>,
    /// True wind direction (compass), needs a heading
    pub twd_deg: Option<f64>,
    /// When the wind instruments last reported
    pub wind_updated_at: Option<Epoch>,

    /// Active waypoint target, if one is selected
    pub target: Option<Waypoint>,
}

impl NavigationSnapshot {
    /// Heading in the requested reference, when observed.
    pub fn heading(&self, mode: BearingMode) -> Option<f64> {
        match mode {
            BearingMode::True => self.heading_true_deg,
            BearingMode::Magnetic => self.heading_mag_deg,
        }
    }

    /// Heading in the configured display reference.
    pub fn display_heading_deg(&self) -> Option<f64> {
        self.heading(self.bearing)
    }

    /// Course used for mark-relative geometry: true heading when the
    /// compass provides one, COG otherwise.
    pub fn effective_course_deg(&self) -> Option<f64> {
        self.heading_true_deg
            .or(self.heading_mag_deg)
            .or(self.cog_deg)
    }

    /// True wind speed in knots regardless of the snapshot's unit mode.
    pub fn tws_kts(&self) -> Option<f64> {
        self.wind_speed_kts(self.tws)
    }

    /// Apparent wind speed in knots regardless of the snapshot's unit
    /// mode.
    pub fn aws_kts(&self) -> Option<f64> {
        self.wind_speed_kts(self.aws)
    }

    fn wind_speed_kts(&self, speed: Option<f64>) -> Option<f64> {
        match self.units {
            UnitMode::Imperial => speed,
            UnitMode::Metric => speed.map(crate::units::mps_to_knots),
        }
    }

    /// Age of the wind data at `now`. None before the first wind
    /// sentence.
    pub fn wind_age(&self, now: Epoch) -> Option<Duration> {
        self.wind_updated_at.map(|at| now - at)
    }

    /// True when the wind data is older than `timeout` at `now` (or was
    /// never received).
    pub fn wind_is_stale(&self, now: Epoch, timeout: Duration) -> bool {
        match self.wind_age(now) {
            Some(age) => age > timeout,
            None => true,
        }
    }
}
