//! Polar performance data: boat speed targets from a polar diagram, and
//! optimal tack angles from a tack table, both interpolated with cubic
//! B-splines.
//!
//! Both tables are whitespace-separated text grids. The polar diagram has
//! wind speeds (knots) across the first row, true wind angles (degrees)
//! down the first column, and target boat speeds in the body. The tack
//! table has one row per wind speed with at least eight columns:
//! wind speed, upwind TWA, downwind TWA, upwind speed, downwind speed,
//! upwind VMG, downwind VMG, and the TWA threshold separating upwind from
//! downwind sailing.
use itertools::Itertools;
use log::warn;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::angle::normalize_180;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    /// The table text contained no usable rows.
    #[error("table is empty")]
    EmptyTable,
    /// A grid line contained a token that does not parse as a number.
    #[error("invalid number on line {0}")]
    InvalidNumber(usize),
    /// A diagram row does not have the same width as the header row.
    #[error("ragged grid on line {0}")]
    RaggedGrid(usize),
    /// The diagram needs at least two wind columns and two angle rows to
    /// interpolate.
    #[error("grid too small to interpolate")]
    GridTooSmall,
}

/// Point of sail relative to the tack table threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SailingState {
    Upwind,
    Downwind,
}

impl std::fmt::Display for SailingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Upwind => write!(f, "upwind"),
            Self::Downwind => write!(f, "downwind"),
        }
    }
}

/// Uniform cubic B-spline basis over four control points, u in [0, 1].
/// Values outside [0, 1] evaluate to 0.0 (out of the table).
fn cubic_spline(u: f64, xa: f64, xb: f64, xc: f64, xd: f64) -> f64 {
    if !(0.0..=1.0).contains(&u) {
        return 0.0;
    }
    let c = u * u * u * (-xa + 3.0 * xb - 3.0 * xc + xd)
        + u * u * (3.0 * xa - 6.0 * xb + 3.0 * xc)
        + u * (-3.0 * xa + 3.0 * xc)
        + (xa + 4.0 * xb + xc);
    c / 6.0
}

fn parse_grid(text: &str) -> Result<Vec<Vec<f64>>, Error> {
    let mut rows = Vec::new();
    for (lineno, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let row: Result<Vec<f64>, _> = line.split_whitespace().map(str::parse::<f64>).collect();
        match row {
            Ok(row) if !row.is_empty() => rows.push(row),
            _ => return Err(Error::InvalidNumber(lineno + 1)),
        }
    }
    if rows.is_empty() {
        return Err(Error::EmptyTable);
    }
    Ok(rows)
}

/// Polar diagram: target boat speed as a function of true wind speed and
/// true wind angle.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PolarTable {
    /// Wind speeds (knots), ascending
    wind: Vec<f64>,
    /// True wind angles (degrees), ascending in [0, 180]
    angles: Vec<f64>,
    /// Target speeds, angles x winds
    grid: Vec<Vec<f64>>,
}

impl PolarTable {
    /// Parse a polar diagram text grid.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let rows = parse_grid(text)?;
        let width = rows[0].len();
        if rows.len() < 3 || width < 3 {
            return Err(Error::GridTooSmall);
        }
        if let Some((bad, _)) = rows.iter().find_position(|r| r.len() != width) {
            return Err(Error::RaggedGrid(bad + 1));
        }

        let wind = rows[0][1..].to_vec();
        let angles = rows[1..].iter().map(|r| r[0]).collect();
        let grid = rows[1..].iter().map(|r| r[1..].to_vec()).collect();
        Ok(Self { wind, angles, grid })
    }

    /// Target boat speed (knots) for the given true wind speed (knots)
    /// and true wind angle (degrees, any sign or wrap; folded into
    /// [0, 180]). Returns 0.0 outside the tabulated range.
    pub fn evaluate(&self, wind_kts: f64, angle_deg: f64) -> f64 {
        let mut angle = angle_deg.abs();
        if wind_kts <= self.wind[0] {
            return 0.0;
        }
        if angle > 360.0 {
            angle -= 360.0;
        }
        if angle > 180.0 {
            angle = 360.0 - angle;
        }

        let Some(j) = self.wind.iter().position(|w| *w > wind_kts).filter(|j| *j > 0) else {
            return 0.0;
        };
        let wind_u = (wind_kts - self.wind[j - 1]) / (self.wind[j] - self.wind[j - 1]);

        let Some(i) = self.angles.iter().position(|g| *g > angle).filter(|i| *i > 0) else {
            return 0.0;
        };
        let angle_u = (angle - self.angles[i - 1]) / (self.angles[i] - self.angles[i - 1]);

        self.interpolate(j, i, wind_u, angle_u)
    }

    /// Bicubic interpolation around cell (j, i), with edge rows and
    /// columns clamped.
    fn interpolate(&self, j: usize, i: usize, wind_u: f64, angle_u: f64) -> f64 {
        let last_i = self.angles.len() - 1;
        let last_j = self.wind.len() - 1;
        let ii = [i.saturating_sub(1), i, (i + 1).min(last_i), (i + 2).min(last_i)];
        let jj = [j.saturating_sub(1), j, (j + 1).min(last_j), (j + 2).min(last_j)];

        let mut along_wind = [0.0; 4];
        for (k, row) in ii.iter().enumerate() {
            let g = &self.grid[*row];
            along_wind[k] = cubic_spline(wind_u, g[jj[0]], g[jj[1]], g[jj[2]], g[jj[3]]);
        }
        cubic_spline(
            angle_u,
            along_wind[0],
            along_wind[1],
            along_wind[2],
            along_wind[3],
        )
    }

    /// Tabulated wind speed range (knots).
    pub fn wind_range(&self) -> (f64, f64) {
        (self.wind[0], self.wind[self.wind.len() - 1])
    }
}

/// One interpolated tack table row.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TackSolution {
    /// Wind speed (knots) this row was interpolated for
    pub wind_kts: f64,
    /// Optimal upwind true wind angle (degrees)
    pub up_twa: f64,
    /// Optimal downwind true wind angle (degrees)
    pub dn_twa: f64,
    /// Boat speed at the optimal upwind angle (knots)
    pub up_speed: f64,
    /// Boat speed at the optimal downwind angle (knots)
    pub dn_speed: f64,
    /// Best achievable upwind VMG (knots)
    pub up_vmg: f64,
    /// Best achievable downwind VMG (knots)
    pub dn_vmg: f64,
    /// TWA threshold separating upwind from downwind (degrees)
    pub limit: f64,
    /// Point of sail for the queried TWA against `limit`
    pub state: SailingState,
}

impl TackSolution {
    fn from_row(row: &[f64], twa_deg: f64) -> Self {
        let limit = row[7];
        Self {
            wind_kts: row[0],
            up_twa: row[1],
            dn_twa: row[2],
            up_speed: row[3],
            dn_speed: row[4],
            up_vmg: row[5],
            dn_vmg: row[6],
            limit,
            state: sailing_state(twa_deg, limit),
        }
    }
}

fn sailing_state(twa_deg: f64, limit: f64) -> SailingState {
    if normalize_180(twa_deg).abs() <= limit {
        SailingState::Upwind
    } else {
        SailingState::Downwind
    }
}

/// Optimal tack table: one row per wind speed, interpolated column-wise
/// with cubic splines. Queries outside the tabulated wind range clamp to
/// the edge rows.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TackTable {
    /// Rows of exactly 8 columns, ascending wind speed in column 0
    rows: Vec<Vec<f64>>,
}

impl TackTable {
    /// Parse a tack table text grid. The first non-empty line is a header
    /// and is skipped; body rows with fewer than eight numeric columns
    /// are dropped with a warning, columns beyond the eighth are ignored.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let mut rows = Vec::new();
        let mut body = false;
        for (lineno, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            if !body {
                body = true; // header
                continue;
            }
            let mut row: Vec<f64> = line
                .split_whitespace()
                .filter_map(|tok| tok.parse().ok())
                .collect();
            if row.len() >= 8 {
                row.truncate(8);
                rows.push(row);
            } else {
                warn!("tack table: dropping malformed row at line {}", lineno + 1);
            }
        }
        if rows.is_empty() {
            return Err(Error::EmptyTable);
        }
        rows.sort_by(|a, b| a[0].total_cmp(&b[0]));
        Ok(Self { rows })
    }

    /// Interpolated row for the given true wind speed (knots). The TWA
    /// (degrees) only determines the reported [SailingState].
    pub fn interpolate(&self, wind_kts: f64, twa_deg: f64) -> TackSolution {
        let first = &self.rows[0];
        let last = &self.rows[self.rows.len() - 1];
        if wind_kts <= first[0] {
            return TackSolution::from_row(first, twa_deg);
        }
        if wind_kts >= last[0] {
            return TackSolution::from_row(last, twa_deg);
        }

        // first[0] < wind_kts < last[0], so a bracketing pair exists
        let lower = self
            .rows
            .iter()
            .rposition(|r| r[0] <= wind_kts)
            .unwrap_or(0);
        let upper = lower + 1;
        let u = (wind_kts - self.rows[lower][0]) / (self.rows[upper][0] - self.rows[lower][0]);

        let columns = self.rows[0].len();
        let mut row = vec![wind_kts];
        for col in 1..columns {
            let xa = self.rows[lower.saturating_sub(1)][col];
            let xb = self.rows[lower][col];
            let xc = self.rows[upper][col];
            let xd = self.rows[(upper + 1).min(self.rows.len() - 1)][col];
            row.push(cubic_spline(u, xa, xb, xc, xd));
        }
        TackSolution::from_row(&row, twa_deg)
    }
}

#[cfg(test)]
mod test {
    use super::{cubic_spline, Error, PolarTable, SailingState, TackTable};

    const DIAGRAM: &str = "\
0    4    8    12   16   20
30   2.1  3.4  4.2  4.6  4.8
60   3.6  5.4  6.3  6.8  7.0
90   4.0  6.0  6.9  7.4  7.6
120  3.8  5.9  7.0  7.8  8.2
150  2.9  4.8  6.2  7.3  8.0
180  2.4  4.1  5.5  6.7  7.6
";

    const TACK: &str = "\
ws   upTWA dnTWA upSpd dnSpd upVMG dnVMG limit
6    44.0  148.0 4.1   4.6   2.9   3.9   95.0
10   42.0  152.0 5.6   6.2   4.1   5.5   100.0
14   40.0  158.0 6.4   7.4   4.9   6.8   105.0
20   38.0  165.0 6.9   8.2   5.4   7.9   110.0
";

    #[test]
    fn spline_reproduces_flat_data() {
        for u in [0.0, 0.25, 0.5, 1.0] {
            assert!((cubic_spline(u, 5.0, 5.0, 5.0, 5.0) - 5.0).abs() < 1e-12);
        }
        // outside [0, 1] the basis is not evaluated
        assert_eq!(cubic_spline(1.5, 5.0, 5.0, 5.0, 5.0), 0.0);
    }

    #[test]
    fn parses_diagram_dimensions() {
        let polar = PolarTable::parse(DIAGRAM).unwrap();
        assert_eq!(polar.wind, vec![4.0, 8.0, 12.0, 16.0, 20.0]);
        assert_eq!(polar.angles.len(), 6);
        assert_eq!(polar.grid.len(), 6);
        assert_eq!(polar.wind_range(), (4.0, 20.0));
    }

    #[test]
    fn rejects_bad_grids() {
        assert_eq!(PolarTable::parse(""), Err(Error::EmptyTable));
        assert_eq!(
            PolarTable::parse("0 4\n30 x\n"),
            Err(Error::InvalidNumber(2))
        );
        assert_eq!(
            PolarTable::parse("0 4 8\n30 2 3\n60 3\n"),
            Err(Error::RaggedGrid(3))
        );
        assert_eq!(PolarTable::parse("0 4\n30 2\n"), Err(Error::GridTooSmall));
    }

    #[test]
    fn evaluate_is_zero_outside_range() {
        let polar = PolarTable::parse(DIAGRAM).unwrap();
        assert_eq!(polar.evaluate(3.0, 90.0), 0.0); // below lightest wind
        assert_eq!(polar.evaluate(25.0, 90.0), 0.0); // above heaviest wind
        assert_eq!(polar.evaluate(10.0, 20.0), 0.0); // closer to wind than table
    }

    #[test]
    fn evaluate_interpolates_inside_range() {
        let polar = PolarTable::parse(DIAGRAM).unwrap();
        let v = polar.evaluate(10.0, 90.0);
        // between the 8 kn (6.0) and 12 kn (6.9) columns at 90 degrees
        assert!(v > 5.5 && v < 7.5, "target speed {v} out of band");
    }

    #[test]
    fn evaluate_folds_angles() {
        let polar = PolarTable::parse(DIAGRAM).unwrap();
        let port = polar.evaluate(10.0, -90.0);
        let starboard = polar.evaluate(10.0, 90.0);
        let wrapped = polar.evaluate(10.0, 270.0);
        assert!((port - starboard).abs() < 1e-12);
        assert!((wrapped - starboard).abs() < 1e-12);
    }

    #[test]
    fn tack_table_clamps_to_edge_rows() {
        let tack = TackTable::parse(TACK).unwrap();
        let calm = tack.interpolate(3.0, 45.0);
        assert_eq!(calm.up_twa, 44.0);
        assert_eq!(calm.limit, 95.0);
        let gale = tack.interpolate(30.0, 45.0);
        assert_eq!(gale.up_twa, 38.0);
    }

    #[test]
    fn tack_table_interpolates_between_rows() {
        let tack = TackTable::parse(TACK).unwrap();
        let sol = tack.interpolate(12.0, 45.0);
        assert!((sol.wind_kts - 12.0).abs() < 1e-12);
        assert!(sol.up_twa > 39.0 && sol.up_twa < 43.0);
        assert!(sol.dn_twa > 150.0 && sol.dn_twa < 160.0);
        assert!(sol.up_vmg > 4.0 && sol.up_vmg < 5.5);
    }

    #[test]
    fn sailing_state_follows_limit() {
        let tack = TackTable::parse(TACK).unwrap();
        assert_eq!(tack.interpolate(10.0, 60.0).state, SailingState::Upwind);
        assert_eq!(tack.interpolate(10.0, 140.0).state, SailingState::Downwind);
        // negative (port) angles fold before the comparison
        assert_eq!(tack.interpolate(10.0, -60.0).state, SailingState::Upwind);
    }

    #[test]
    fn tack_table_ignores_extra_columns() {
        // rows of uneven width: the first carries a ninth column
        let text = "\
ws upTWA dnTWA upSpd dnSpd upVMG dnVMG limit note
6  44.0  148.0 4.1   4.6   2.9   3.9   95.0  1.0
10 42.0  152.0 5.6   6.2   4.1   5.5   100.0
";
        let tack = TackTable::parse(text).unwrap();
        let sol = tack.interpolate(8.0, 45.0);
        assert!(sol.up_twa > 42.0 && sol.up_twa < 44.0);
        assert!((sol.limit - 97.5).abs() < 1.0);
    }

    #[test]
    fn tack_table_drops_short_rows() {
        let text = "header\n6 44 148 4.1 4.6 2.9 3.9 95\nbad row\n";
        let tack = TackTable::parse(text).unwrap();
        assert_eq!(tack.rows.len(), 1);
        assert_eq!(TackTable::parse("header only\n"), Err(Error::EmptyTable));
    }
}
