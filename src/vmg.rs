//! Mark-relative performance: bearing, distance and ETA to the active
//! waypoint, velocity made good against the polar model, and tack
//! geometry (laylines, tack point, opposite-tack projection).
use hifitime::{Duration, Epoch};
use log::{debug, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::angle::{fold_90, normalize_180, normalize_360};
use crate::cfg::{Config, TackPolicy};
use crate::error::Error;
use crate::geo::{destination, distance_m, initial_bearing_deg, segment_intersection, GeoPoint};
use crate::navigation::NavigationSnapshot;
use crate::polar::{PolarTable, SailingState, TackSolution, TackTable};
use crate::units::{convert_distance, knots_to_mps};
use crate::waypoint::Waypoint;

/// Boat laylines at the current tack angle, for chart display.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Laylines {
    pub starboard_end: GeoPoint,
    pub port_end: GeoPoint,
}

/// Derived performance metrics for one computation cycle.
///
/// Recomputed from scratch every cycle, never partially mutated. Every
/// field is an Option: with no active target, or with position/course
/// unknown, the whole snapshot is `None` across the board (placeholders
/// downstream, never stale numbers).
#[derive(Debug, Default, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VmgSnapshot {
    /// Bearing to the mark (degrees true)
    pub bearing_deg: Option<f64>,
    /// Bearing to the mark relative to the course, (-180, 180]
    pub relative_bearing_deg: Option<f64>,
    /// Great-circle distance to the mark (meters)
    pub distance_m: Option<f64>,
    /// Distance in the configured display unit
    pub distance_display: Option<f64>,
    /// Time to the mark at current SOG; None when not moving
    pub eta: Option<Duration>,
    /// Speed component along the bearing to the mark (knots, signed)
    pub vmc_kts: Option<f64>,

    /// Position where the advantageous course change begins
    pub tack_point: Option<GeoPoint>,
    /// Distance along the current tack to the tack point (meters)
    pub tack_distance_m: Option<f64>,
    /// Time to the tack point at current SOG
    pub tack_eta: Option<Duration>,
    /// Distance to the layline crossing on the other tack (meters)
    pub opposite_tack_distance_m: Option<f64>,
    /// Time to that crossing at current SOG
    pub opposite_tack_eta: Option<Duration>,
    /// VMC the boat would make on the opposite tack (knots, signed)
    pub opposite_tack_vmc_kts: Option<f64>,
    /// Boat laylines at the current optimal tack angle
    pub laylines: Option<Laylines>,
    /// Signed offset from the nearer optimal tack heading, (-180, 180]
    pub tack_offset_deg: Option<f64>,
    /// True when that offset is within the configured tack tolerance
    pub on_optimal_tack: Option<bool>,

    /// Best achievable boat speed from the polar table (knots)
    pub polar_speed_kts: Option<f64>,
    /// Best achievable VMG at the current wind angle (knots)
    pub polar_vmg_kts: Option<f64>,
    /// VMG over ground at the current wind angle (knots)
    pub vmg_over_ground_kts: Option<f64>,
    /// VMG through water at the current wind angle (knots)
    pub vmg_through_water_kts: Option<f64>,
    /// SOG as a percentage of polar speed, capped at 100
    pub sog_performance_pct: Option<f64>,
    /// STW as a percentage of polar speed, capped at 100
    pub stw_performance_pct: Option<f64>,
    /// Ground VMG as a percentage of polar VMG, capped at 100
    pub vmg_performance_pct: Option<f64>,

    /// Upwind or downwind, against the tack table threshold
    pub sailing_state: Option<SailingState>,
    /// Optimal upwind true wind angle (degrees)
    pub optimal_up_twa_deg: Option<f64>,
    /// Optimal downwind true wind angle (degrees)
    pub optimal_dn_twa_deg: Option<f64>,
    /// Best upwind VMG from the tack table (knots)
    pub max_up_vmg_kts: Option<f64>,
    /// Best downwind VMG from the tack table (knots)
    pub max_dn_vmg_kts: Option<f64>,
}

/// `current` as a percentage of `max`, capped at 100. Zero when the
/// reference itself is zero.
fn performance_ratio(max: f64, current: f64) -> f64 {
    if max > 0.0 {
        (current / max * 100.0).min(100.0)
    } else {
        0.0
    }
}

/// VMG/performance processor.
///
/// Stateless between cycles except for the last snapshot (for
/// [VmgProcessor::poll] cadence throttling): every [VmgProcessor::process]
/// call rebuilds the full [VmgSnapshot] from the navigation state it is
/// given, so reactive and cadence triggering give identical results
/// modulo staleness.
pub struct VmgProcessor {
    cfg: Config,
    polar: Option<PolarTable>,
    tack_table: Option<TackTable>,
    last: VmgSnapshot,
    last_run: Option<Epoch>,
    /// Target the last snapshot was computed against; a target change
    /// always forces a recomputation, cadence notwithstanding
    last_target: Option<Waypoint>,
}

impl VmgProcessor {
    /// Build a processor. Fails on invalid configuration.
    pub fn new(cfg: Config) -> Result<Self, Error> {
        cfg.validate()?;
        Ok(Self {
            cfg,
            polar: None,
            tack_table: None,
            last: VmgSnapshot::default(),
            last_run: None,
            last_target: None,
        })
    }

    /// Attach a polar diagram (enables polar speed/VMG and performance
    /// ratios).
    pub fn with_polar(mut self, polar: PolarTable) -> Self {
        self.polar = Some(polar);
        self
    }

    /// Attach a tack table (enables optimal angles and tack geometry).
    pub fn with_tack_table(mut self, table: TackTable) -> Self {
        self.tack_table = Some(table);
        self
    }

    /// Last computed snapshot without recomputing.
    pub fn last(&self) -> &VmgSnapshot {
        &self.last
    }

    /// Cadence-throttled recomputation: recompute when at least the
    /// configured minimal interval has passed since the last run,
    /// otherwise return the previous snapshot.
    pub fn poll(&mut self, nav: &NavigationSnapshot, now: Epoch) -> VmgSnapshot {
        if let Some(last_run) = self.last_run {
            if now - last_run < self.cfg.min_interval && nav.target == self.last_target {
                return self.last.clone();
            }
        }
        self.last_run = Some(now);
        self.process(nav)
    }

    /// Clear all derived fields back to the unavailable state. The
    /// navigation state and its filters are untouched.
    pub fn reset(&mut self) {
        self.last = VmgSnapshot::default();
        self.last_run = None;
        self.last_target = None;
    }

    /// Recompute the full snapshot from `nav`.
    pub fn process(&mut self, nav: &NavigationSnapshot) -> VmgSnapshot {
        let out = match self.compute(nav) {
            Ok(out) => out,
            Err(e) => {
                debug!("vmg cycle degraded: {}", e);
                VmgSnapshot::default()
            },
        };
        self.last = out.clone();
        self.last_target = nav.target.clone();
        out
    }

    fn compute(&self, nav: &NavigationSnapshot) -> Result<VmgSnapshot, Error> {
        let target = nav.target.as_ref().ok_or(Error::NoActiveTarget)?;
        let position = nav.position.ok_or(Error::InsufficientData)?;
        let course = nav.effective_course_deg().ok_or(Error::InsufficientData)?;

        let mut out = VmgSnapshot::default();

        // mark geometry
        let mark = target.position;
        let bearing = initial_bearing_deg(position, mark);
        let relative = normalize_180(bearing - course);
        let distance = distance_m(position, mark);
        out.bearing_deg = Some(bearing);
        out.relative_bearing_deg = Some(relative);
        out.distance_m = Some(distance);
        out.distance_display =
            match convert_distance(distance, self.cfg.distance_unit, self.cfg.hull_length_m) {
                Ok(d) => Some(d),
                Err(e) => {
                    warn!("distance display unavailable: {}", e);
                    None
                },
            };
        out.eta = self.eta(distance, nav.sog_kts);
        out.vmc_kts = nav
            .sog_kts
            .map(|sog| sog * relative.to_radians().cos());

        // polar metrics
        let wind = match (nav.tws_kts(), nav.twa_deg) {
            (Some(tws), Some(twa)) => Some((tws, twa)),
            _ => None,
        };
        if let (Some(polar), Some((tws, twa))) = (&self.polar, wind) {
            let polar_speed = polar.evaluate(tws, twa);
            let polar_vmg = (polar_speed * twa.to_radians().cos()).abs();
            out.polar_speed_kts = Some(polar_speed);
            out.polar_vmg_kts = Some(polar_vmg);
            if let Some(sog) = nav.sog_kts {
                let vmg_ground = (sog * twa.to_radians().cos()).abs();
                out.vmg_over_ground_kts = Some(vmg_ground);
                out.sog_performance_pct = Some(performance_ratio(polar_speed, sog));
                out.vmg_performance_pct = Some(performance_ratio(polar_vmg, vmg_ground));
            }
            if let Some(stw) = nav.stw_kts {
                out.vmg_through_water_kts = Some((stw * twa.to_radians().cos()).abs());
                out.stw_performance_pct = Some(performance_ratio(polar_speed, stw));
            }
        }

        // tack table and layline geometry
        if let (Some(table), Some((tws, twa))) = (&self.tack_table, wind) {
            let sol = table.interpolate(tws, twa);
            out.sailing_state = Some(sol.state);
            out.optimal_up_twa_deg = Some(sol.up_twa);
            out.optimal_dn_twa_deg = Some(sol.dn_twa);
            out.max_up_vmg_kts = Some(sol.up_vmg);
            out.max_dn_vmg_kts = Some(sol.dn_vmg);

            let twd = normalize_360(twa + course);
            self.tack_geometry(
                &mut out, &sol, position, mark, course, bearing, distance, twd, nav.sog_kts,
            );
        }

        Ok(out)
    }

    /// Layline diamond between the boat and the mark: boat laylines run
    /// downwind of the tack angle, mark laylines run the reciprocal.
    /// The crossing closer to the current course is the tack point.
    #[allow(clippy::too_many_arguments)]
    fn tack_geometry(
        &self,
        out: &mut VmgSnapshot,
        sol: &TackSolution,
        position: GeoPoint,
        mark: GeoPoint,
        course: f64,
        bearing: f64,
        distance: f64,
        twd: f64,
        sog_kts: Option<f64>,
    ) {
        let tack_angle = match sol.state {
            SailingState::Upwind => sol.up_twa,
            SailingState::Downwind => sol.dn_twa,
        };
        let reach = distance * 1.5;

        // alignment against the nearer of the two optimal tack headings
        let off_sb = normalize_180(course - normalize_360(twd - tack_angle));
        let off_pt = normalize_180(course - normalize_360(twd + tack_angle));
        let offset = if off_pt.abs() < off_sb.abs() { off_pt } else { off_sb };
        out.tack_offset_deg = Some(offset);
        out.on_optimal_tack = Some(offset.abs() <= self.cfg.tack_tolerance_deg);

        let sb_boat = destination(position, normalize_360(twd + tack_angle), reach);
        let pt_boat = destination(position, normalize_360(twd - tack_angle), reach);
        let sb_mark = destination(mark, normalize_360(twd + tack_angle + 180.0), reach);
        let pt_mark = destination(mark, normalize_360(twd - tack_angle + 180.0), reach);
        out.laylines = Some(Laylines {
            starboard_end: sb_boat,
            port_end: pt_boat,
        });

        // starboard boat layline meets the port mark layline and vice
        // versa, forming the diamond
        let starboard = segment_intersection(position, sb_boat, mark, pt_mark);
        let port = segment_intersection(position, pt_boat, mark, sb_mark);

        let (near, far) = match (starboard, port) {
            (Some(sb), Some(pt)) => {
                let off_sb = fold_90(normalize_180(initial_bearing_deg(position, sb) - course));
                let off_pt = fold_90(normalize_180(initial_bearing_deg(position, pt) - course));
                if (off_sb.abs() - off_pt.abs()).abs() < 1e-9 {
                    // exactly on the boundary: configured side wins
                    match self.cfg.tack_policy {
                        TackPolicy::Starboard => (Some(sb), Some(pt)),
                        TackPolicy::Port => (Some(pt), Some(sb)),
                    }
                } else if off_sb.abs() < off_pt.abs() {
                    (Some(sb), Some(pt))
                } else {
                    (Some(pt), Some(sb))
                }
            },
            (Some(sb), None) => (Some(sb), None),
            (None, Some(pt)) => (Some(pt), None),
            (None, None) => {
                debug!("laylines do not cross inside the diamond");
                (None, None)
            },
        };

        if let Some(point) = near {
            let leg = distance_m(position, point);
            out.tack_point = Some(point);
            out.tack_distance_m = Some(leg);
            out.tack_eta = self.eta(leg, sog_kts);
        }
        if let Some(point) = far {
            let leg = distance_m(position, point);
            out.opposite_tack_distance_m = Some(leg);
            out.opposite_tack_eta = self.eta(leg, sog_kts);
        }

        // VMC the boat would make after tacking onto the other board
        if let Some(sog) = sog_kts {
            let offset = normalize_180(course - normalize_180(twd));
            let opposite_angle = if offset > 0.0 { -tack_angle } else { tack_angle };
            let opposite_course = normalize_180(twd + opposite_angle);
            let opposite_relative = normalize_180(bearing - opposite_course);
            out.opposite_tack_vmc_kts = Some(sog * opposite_relative.to_radians().cos());
        }
    }

    /// Travel time for `distance` meters at `sog` knots. None when the
    /// boat is at or below the standstill threshold: "not available",
    /// never infinity.
    fn eta(&self, distance: f64, sog_kts: Option<f64>) -> Option<Duration> {
        let sog = sog_kts?;
        if sog <= self.cfg.min_sog_kts {
            return None;
        }
        Some(Duration::from_seconds(distance / knots_to_mps(sog)))
    }
}
