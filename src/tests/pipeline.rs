//! End-to-end: raw NMEA burst -> smoothed navigation state -> waypoint
//! performance metrics -> sync frames.
use rstest::rstest;

use crate::cfg::Config;
use crate::constants::NAUTICAL_MILE_M;
use crate::geo::destination;
use crate::navigation::Navigator;
use crate::polar::{PolarTable, SailingState, TackTable};
use crate::sync::MetricsPublisher;
use crate::tests::init_logger;
use crate::vmg::VmgProcessor;
use crate::waypoint::Waypoint;

const POLAR_DIAGRAM: &str = "\
0    4    8    12   16   20
30   2.1  3.4  4.2  4.6  4.8
60   3.6  5.4  6.3  6.8  7.0
90   4.0  6.0  6.9  7.4  7.6
120  3.8  5.9  7.0  7.8  8.2
150  2.9  4.8  6.2  7.3  8.0
180  2.4  4.1  5.5  6.7  7.6
";

const TACK_TABLE: &str = "\
ws   upTWA dnTWA upSpd dnSpd upVMG dnVMG limit
6    44.0  148.0 4.1   4.6   2.9   3.9   95.0
10   42.0  152.0 5.6   6.2   4.1   5.5   100.0
14   40.0  158.0 6.4   7.4   4.9   6.8   105.0
20   38.0  165.0 6.9   8.2   5.4   7.9   110.0
";

/// Instrument burst: fix north of Burgas, heading due north, true wind
/// ten degrees off the port bow.
const BURST: &[&str] = &[
    "$GPRMC,110135,A,4217.90,N,02707.50,E,5.0,0.0,250723,3.1,W*6B",
    "$IIHDT,0.0,T*22",
    "$IIDPT,12.3,0.0*70",
    "$IIVHW,245.0,T,232.0,M,6.2,N,11.5,K*64",
    "$IIMWV,350.0,T,12.0,N,A*0E",
    "$IIMWV,44.0,R,14.5,N,A*3D",
];

fn fed_navigator() -> Navigator {
    let mut nav = Navigator::new(Config::default()).unwrap();
    for line in BURST {
        nav.feed_line(line).unwrap();
    }
    nav
}

fn processor() -> VmgProcessor {
    VmgProcessor::new(Config::default())
        .unwrap()
        .with_polar(PolarTable::parse(POLAR_DIAGRAM).unwrap())
        .with_tack_table(TackTable::parse(TACK_TABLE).unwrap())
}

#[test]
fn burst_to_waypoint_metrics() {
    init_logger();

    let mut nav = fed_navigator();
    let fix = nav.snapshot().position.expect("position from RMC");

    // windward mark five miles due north of the fix
    let mark = destination(fix, 0.0, 5.0 * NAUTICAL_MILE_M);
    nav.set_target(Some(Waypoint::new("windward", mark.lat_deg, mark.lon_deg)));

    let snapshot = nav.snapshot();
    assert_eq!(nav.stats().accepted, BURST.len() as u64);
    assert!((snapshot.heading_true_deg.unwrap() - 0.0).abs() < 1e-6);
    assert!((snapshot.stw_kts.unwrap() - 6.2).abs() < 1e-6);

    let mut vmg = processor();
    let out = vmg.process(&snapshot);

    // straight upwind leg: bearing ~000, 5 nmi, one hour at 5 knots
    assert!(out.bearing_deg.unwrap().abs() < 0.1);
    assert!((out.distance_m.unwrap() - 5.0 * NAUTICAL_MILE_M).abs() < 10.0);
    assert!((out.distance_display.unwrap() - 5.0).abs() < 0.01);
    let eta_hours = out.eta.unwrap().to_seconds() / 3600.0;
    assert!((eta_hours - 1.0).abs() < 0.01, "eta {eta_hours} h");
    assert!((out.vmc_kts.unwrap() - 5.0).abs() < 0.01);

    // wind ten degrees off the bow: upwind state, tack geometry present.
    // Ten degrees is inside the no-go zone, so the polar target is zero.
    assert_eq!(out.sailing_state, Some(SailingState::Upwind));
    assert_eq!(out.polar_speed_kts, Some(0.0));
    assert!(out.optimal_up_twa_deg.unwrap() > 38.0);
    assert!(out.tack_point.is_some());
    assert!(out.tack_distance_m.unwrap() < out.distance_m.unwrap() * 1.5);
    assert!(out.opposite_tack_distance_m.is_some());
}

#[test]
fn clearing_the_target_nulls_the_next_snapshot() {
    init_logger();

    let mut nav = fed_navigator();
    let fix = nav.snapshot().position.unwrap();
    let mark = destination(fix, 0.0, 5.0 * NAUTICAL_MILE_M);
    nav.set_target(Some(Waypoint::new("windward", mark.lat_deg, mark.lon_deg)));

    let mut vmg = processor();
    assert!(vmg.process(&nav.snapshot()).distance_m.is_some());

    nav.clear_target();
    let cleared = vmg.process(&nav.snapshot());
    assert_eq!(cleared, Default::default());
}

#[test]
fn sync_frames_follow_the_instruments() {
    init_logger();

    let mut nav = fed_navigator();
    let mut publisher = MetricsPublisher::new();

    publisher.update_from(&nav.snapshot());
    let frame = publisher.take_changed().expect("first frame");
    assert_eq!(frame.depth_m, Some(12.3));
    assert_eq!(frame.boat_speed_kts, Some(6.2));
    assert_eq!(frame.sog_kts, Some(5.0));
    assert!(frame.true_wind_speed.is_some());
    assert!(frame.apparent_wind_speed.is_some());

    // identical state: nothing new to send
    publisher.update_from(&nav.snapshot());
    assert_eq!(publisher.take_changed(), None);

    // depth changes past the rounding precision
    nav.feed_line("$IIDPT,12.3,0.0*70").unwrap();
    publisher.update_from(&nav.snapshot());
    assert_eq!(publisher.take_changed(), None);
}

#[rstest]
#[case::no_prefix("IIDPT,12.3,0.0*70")]
#[case::bad_checksum("$IIDPT,12.3,0.0*71")]
#[case::truncated("$IIMWV,45.0,R*01")]
#[case::void_fix("$GPRMC,110135,V,4217.90,N,02707.50,E,5.0,0.0,250723,3.1,W*7C")]
fn rejected_lines_do_not_disturb_the_state(#[case] line: &str) {
    init_logger();

    let mut nav = fed_navigator();
    let before = nav.snapshot();
    assert!(nav.feed_line(line).is_err());
    let after = nav.snapshot();
    assert_eq!(before.position, after.position);
    assert_eq!(before.depth_m, after.depth_m);
    assert_eq!(before.twa_deg, after.twa_deg);
}
