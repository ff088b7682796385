//! NMEA 0183 sentence decoding.
//!
//! One text line in, one [DecodedReading] out. The decoder validates the
//! `$` prefix, the XOR checksum between `$` and `*`, the character set,
//! the talker identifier and the sentence format before touching any
//! field, so downstream consumers only ever see physically plausible
//! readings from instruments that actually exist on the bus.
use thiserror::Error;

use crate::geo::GeoPoint;
use crate::units::{kmh_to_knots, mps_to_knots};

/// Talker identifiers of NMEA 0183 v3.01.
const TALKER_IDS: &[&str] = &[
    "AG", "AP", "AI", "CD", "CR", "CS", "CT", "CV", "CX", "DE", "DF", "EC", "EI", "EP", "ER",
    "GL", "GN", "GP", "HC", "HE", "HN", "II", "IN", "LC", "RA", "SD", "SN", "SS", "TI", "VD",
    "VM", "VW", "VR", "YX", "ZA", "ZC", "ZQ", "ZV", "WI",
];

/// Errors from [decode]. Per-line only: a bad line never poisons the
/// decoder for the next one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Framing, checksum, character set or field-level failure.
    #[error("malformed sentence: {0}")]
    MalformedSentence(&'static str),
    /// Valid frame from a talker or of a format we do not decode.
    #[error("unsupported sentence type: {0}")]
    UnsupportedSentenceType(String),
}

use DecodeError::MalformedSentence;

/// Position fix with the ground-track values that ride along in RMC.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionFix {
    pub position: GeoPoint,
    /// Speed over ground (knots), when the sentence carries it
    pub sog_kts: Option<f64>,
    /// Course over ground (degrees true), when the sentence carries it
    pub cog_deg: Option<f64>,
}

/// One successfully decoded sentence, reduced to the values the
/// navigation state consumes. All speeds are knots, angles degrees,
/// depths meters, temperatures Celsius, distances nautical miles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DecodedReading {
    /// DPT: water depth below transducer (meters)
    Depth(f64),
    /// MTW: sea water temperature (Celsius)
    WaterTemperature(f64),
    /// VHW: speed through water (knots)
    SpeedThroughWater(f64),
    /// VLW: cumulative log distances (nautical miles)
    DistanceLog { total_nm: f64, since_reset_nm: f64 },
    /// HDG: magnetic heading with signed variation (east positive),
    /// when the compass reports one
    MagneticHeading {
        heading_deg: f64,
        variation_deg: Option<f64>,
    },
    /// HDT: true heading (degrees)
    TrueHeading(f64),
    /// MWV (R): apparent wind, angle relative to the bow
    ApparentWind { angle_deg: f64, speed_kts: f64 },
    /// MWV (T): true wind, angle relative to the bow
    TrueWind { angle_deg: f64, speed_kts: f64 },
    /// RMC / GLL / GGA: position fix
    Position(PositionFix),
    /// VTG: ground track without a position
    GroundTrack {
        cog_deg: Option<f64>,
        sog_kts: Option<f64>,
    },
}

/// Decode one NMEA 0183 line.
pub fn decode(line: &str) -> Result<DecodedReading, DecodeError> {
    let line = line.trim_end_matches(['\r', '\n']);
    let body = line
        .strip_prefix('$')
        .ok_or(MalformedSentence("missing $ prefix"))?;

    let (data, trailer) = body
        .rsplit_once('*')
        .ok_or(MalformedSentence("missing checksum delimiter"))?;
    if trailer.len() != 2 {
        return Err(MalformedSentence("checksum is not two hex digits"));
    }
    let declared =
        u8::from_str_radix(trailer, 16).map_err(|_| MalformedSentence("invalid checksum digits"))?;
    let computed = data.bytes().fold(0u8, |acc, b| acc ^ b);
    if computed != declared {
        return Err(MalformedSentence("checksum mismatch"));
    }

    if !data.bytes().all(|b| (0x20..0x7f).contains(&b)) {
        return Err(MalformedSentence("non-printable character"));
    }

    let mut fields = data.split(',');
    let address = fields
        .next()
        .ok_or(MalformedSentence("empty sentence body"))?;
    if address.len() != 5 {
        return Err(MalformedSentence("address field is not five characters"));
    }
    let (talker, format) = address.split_at(2);
    if !TALKER_IDS.contains(&talker) {
        return Err(DecodeError::UnsupportedSentenceType(address.to_string()));
    }

    let fields: Vec<&str> = fields.collect();
    match format {
        "DPT" => Ok(DecodedReading::Depth(parse_f64(&fields, 0, "depth")?)),
        "MTW" => Ok(DecodedReading::WaterTemperature(parse_f64(
            &fields,
            0,
            "water temperature",
        )?)),
        "VHW" => Ok(DecodedReading::SpeedThroughWater(parse_f64(
            &fields,
            4,
            "speed through water",
        )?)),
        "VLW" => Ok(DecodedReading::DistanceLog {
            total_nm: parse_f64(&fields, 0, "total distance")?,
            since_reset_nm: parse_f64(&fields, 2, "distance since reset")?,
        }),
        "HDG" => decode_hdg(&fields),
        "HDT" => Ok(DecodedReading::TrueHeading(parse_f64(
            &fields,
            0,
            "true heading",
        )?)),
        "MWV" => decode_mwv(&fields),
        "RMC" => decode_rmc(&fields),
        "GLL" => Ok(DecodedReading::Position(PositionFix {
            position: parse_position(&fields, 0)?,
            sog_kts: None,
            cog_deg: None,
        })),
        "GGA" => Ok(DecodedReading::Position(PositionFix {
            // field 0 is the UTC timestamp, the fix starts at field 1
            position: parse_position(&fields, 1)?,
            sog_kts: None,
            cog_deg: None,
        })),
        "VTG" => Ok(DecodedReading::GroundTrack {
            cog_deg: parse_opt_f64(&fields, 0),
            sog_kts: parse_opt_f64(&fields, 4),
        }),
        _ => Err(DecodeError::UnsupportedSentenceType(address.to_string())),
    }
}

fn field<'a>(fields: &[&'a str], idx: usize) -> Result<&'a str, DecodeError> {
    fields
        .get(idx)
        .copied()
        .ok_or(MalformedSentence("missing field"))
}

fn parse_f64(fields: &[&str], idx: usize, what: &'static str) -> Result<f64, DecodeError> {
    field(fields, idx)?
        .parse()
        .map_err(|_| MalformedSentence(what))
}

/// Optional numeric field: absent or empty is None, anything present
/// must still parse (but this path tolerates garbage as None too, the
/// sentence as a whole was already checksum-verified).
fn parse_opt_f64(fields: &[&str], idx: usize) -> Option<f64> {
    fields.get(idx).and_then(|f| f.parse().ok())
}

/// `(d)ddmm.mmmm` sexagesimal coordinate to signed decimal degrees.
/// Latitude has two degree digits, longitude three; south and west are
/// negative.
fn parse_coordinate(value: &str, hemisphere: &str) -> Result<f64, DecodeError> {
    let split = match hemisphere {
        "N" | "S" => 2,
        "E" | "W" => 3,
        _ => return Err(MalformedSentence("invalid hemisphere")),
    };
    if value.len() < split + 2 {
        return Err(MalformedSentence("coordinate too short"));
    }
    let degrees: f64 = value[..split]
        .parse()
        .map_err(|_| MalformedSentence("coordinate degrees"))?;
    let minutes: f64 = value[split..]
        .parse()
        .map_err(|_| MalformedSentence("coordinate minutes"))?;
    let decimal = degrees + minutes / 60.0;
    match hemisphere {
        "N" | "E" => Ok(decimal),
        _ => Ok(-decimal),
    }
}

fn parse_position(fields: &[&str], start: usize) -> Result<GeoPoint, DecodeError> {
    let lat = parse_coordinate(field(fields, start)?, field(fields, start + 1)?)?;
    let lon = parse_coordinate(field(fields, start + 2)?, field(fields, start + 3)?)?;
    Ok(GeoPoint::new(lat, lon))
}

/// HDG: magnetic heading [0], deviation [1..2] (ignored), variation
/// [3..4]. An empty variation pair is a compass without a configured
/// variation, not an error.
fn decode_hdg(fields: &[&str]) -> Result<DecodedReading, DecodeError> {
    let heading_deg = parse_f64(fields, 0, "magnetic heading")?;
    let variation_deg = match (field(fields, 3)?, field(fields, 4)?) {
        ("", _) => None,
        (value, sense) => {
            let magnitude: f64 = value.parse().map_err(|_| MalformedSentence("variation"))?;
            match sense {
                "E" => Some(magnitude),
                "W" => Some(-magnitude),
                _ => return Err(MalformedSentence("variation sense")),
            }
        }
    };
    Ok(DecodedReading::MagneticHeading {
        heading_deg,
        variation_deg,
    })
}

/// MWV: angle [0], reference R/T [1], speed [2], speed unit [3],
/// status [4]. Speeds normalize to knots.
fn decode_mwv(fields: &[&str]) -> Result<DecodedReading, DecodeError> {
    if field(fields, 4)? != "A" {
        return Err(MalformedSentence("wind sensor reports invalid data"));
    }
    let angle_deg = parse_f64(fields, 0, "wind angle")?;
    let raw_speed = parse_f64(fields, 2, "wind speed")?;
    let speed_kts = match field(fields, 3)? {
        "N" => raw_speed,
        "K" => kmh_to_knots(raw_speed),
        "M" => mps_to_knots(raw_speed),
        _ => return Err(MalformedSentence("wind speed unit")),
    };
    match field(fields, 1)? {
        "R" => Ok(DecodedReading::ApparentWind {
            angle_deg,
            speed_kts,
        }),
        "T" => Ok(DecodedReading::TrueWind {
            angle_deg,
            speed_kts,
        }),
        _ => Err(MalformedSentence("wind reference")),
    }
}

/// RMC: UTC [0], status [1], fix [2..5], SOG [6], COG [7].
fn decode_rmc(fields: &[&str]) -> Result<DecodedReading, DecodeError> {
    if field(fields, 1)? != "A" {
        return Err(MalformedSentence("fix not valid"));
    }
    Ok(DecodedReading::Position(PositionFix {
        position: parse_position(fields, 2)?,
        sog_kts: parse_opt_f64(fields, 6),
        cog_deg: parse_opt_f64(fields, 7),
    }))
}

#[cfg(test)]
mod test {
    use super::{decode, DecodeError, DecodedReading};

    fn assert_malformed(line: &str) {
        match decode(line) {
            Err(DecodeError::MalformedSentence(_)) => {},
            other => panic!("{line}: expected malformed, got {other:?}"),
        }
    }

    #[test]
    fn depth_and_temperature() {
        assert_eq!(
            decode("$IIDPT,12.3,0.0*70"),
            Ok(DecodedReading::Depth(12.3))
        );
        assert_eq!(
            decode("$IIMTW,18.5,C*1F"),
            Ok(DecodedReading::WaterTemperature(18.5))
        );
    }

    #[test]
    fn speed_and_distance_log() {
        assert_eq!(
            decode("$IIVHW,245.0,T,232.0,M,6.2,N,11.5,K*64"),
            Ok(DecodedReading::SpeedThroughWater(6.2))
        );
        assert_eq!(
            decode("$IIVLW,123.4,N,12.3,N*79"),
            Ok(DecodedReading::DistanceLog {
                total_nm: 123.4,
                since_reset_nm: 12.3
            })
        );
    }

    #[test]
    fn heading_variation_is_signed() {
        assert_eq!(
            decode("$IIHDG,243.0,,,5.0,E*22"),
            Ok(DecodedReading::MagneticHeading {
                heading_deg: 243.0,
                variation_deg: Some(5.0)
            })
        );
        assert_eq!(
            decode("$IIHDG,243.0,,,5.0,W*30"),
            Ok(DecodedReading::MagneticHeading {
                heading_deg: 243.0,
                variation_deg: Some(-5.0)
            })
        );
        // compass with no variation configured
        assert_eq!(
            decode("$IIHDG,243.0,,,,*4C"),
            Ok(DecodedReading::MagneticHeading {
                heading_deg: 243.0,
                variation_deg: None
            })
        );
        assert_eq!(
            decode("$IIHDT,248.0,T*2C"),
            Ok(DecodedReading::TrueHeading(248.0))
        );
    }

    #[test]
    fn wind_references_and_units() {
        assert_eq!(
            decode("$IIMWV,45.0,R,12.5,N,A*3A"),
            Ok(DecodedReading::ApparentWind {
                angle_deg: 45.0,
                speed_kts: 12.5
            })
        );
        assert_eq!(
            decode("$IIMWV,52.0,T,14.0,N,A*39"),
            Ok(DecodedReading::TrueWind {
                angle_deg: 52.0,
                speed_kts: 14.0
            })
        );
        // m/s and km/h normalize to knots
        match decode("$IIMWV,52.0,T,7.2,M,A*0A") {
            Ok(DecodedReading::TrueWind { speed_kts, .. }) => {
                assert!((speed_kts - 13.9957).abs() < 1e-3)
            },
            other => panic!("unexpected {other:?}"),
        }
        match decode("$IIMWV,52.0,T,25.9,K,A*37") {
            Ok(DecodedReading::TrueWind { speed_kts, .. }) => {
                assert!((speed_kts - 13.9849).abs() < 1e-3)
            },
            other => panic!("unexpected {other:?}"),
        }
        // sensor flags the reading invalid
        assert_malformed("$IIMWV,45.0,R,12.5,N,V*2D");
    }

    #[test]
    fn rmc_carries_fix_and_ground_track() {
        match decode("$GPRMC,110135,A,4217.90,N,02707.50,E,5.0,0.0,250723,3.1,W*6B") {
            Ok(DecodedReading::Position(fix)) => {
                assert!((fix.position.lat_deg - 42.298333).abs() < 1e-6);
                assert!((fix.position.lon_deg - 27.125).abs() < 1e-6);
                assert_eq!(fix.sog_kts, Some(5.0));
                assert_eq!(fix.cog_deg, Some(0.0));
            },
            other => panic!("unexpected {other:?}"),
        }
        // void fix is rejected
        assert_malformed("$GPRMC,110135,V,4217.90,N,02707.50,E,5.0,0.0,250723,3.1,W*7C");
    }

    #[test]
    fn southern_western_hemispheres_are_negative() {
        match decode("$GPRMC,110135,A,4217.90,S,02707.50,W,5.0,0.0,250723,3.1,W*64") {
            Ok(DecodedReading::Position(fix)) => {
                assert!(fix.position.lat_deg < 0.0);
                assert!(fix.position.lon_deg < 0.0);
            },
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn gll_and_gga_positions() {
        match decode("$GPGLL,4217.90,N,02707.50,E,110135,A*23") {
            Ok(DecodedReading::Position(fix)) => {
                assert!((fix.position.lat_deg - 42.298333).abs() < 1e-6);
                assert_eq!(fix.sog_kts, None);
            },
            other => panic!("unexpected {other:?}"),
        }
        // GGA leads with the UTC timestamp, the fix starts one field later
        match decode("$GPGGA,110135,4217.90,N,02707.50,E,1,08,0.9,5.0,M,34.0,M,,*48") {
            Ok(DecodedReading::Position(fix)) => {
                assert!((fix.position.lon_deg - 27.125).abs() < 1e-6);
            },
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn vtg_ground_track() {
        assert_eq!(
            decode("$GPVTG,12.0,T,8.9,M,5.5,N,10.2,K*4F"),
            Ok(DecodedReading::GroundTrack {
                cog_deg: Some(12.0),
                sog_kts: Some(5.5)
            })
        );
    }

    #[test]
    fn framing_failures() {
        assert_malformed("IIDPT,12.3,0.0*70"); // no $
        assert_malformed("$IIDPT,12.3,0.0"); // no checksum
        assert_malformed("$IIDPT,12.3,0.0*71"); // wrong checksum
        assert_malformed("$IIDPT,12.3,0.0*7"); // short checksum
        assert_malformed("$IIDPT,abc,0.0*0E"); // non-numeric depth
        assert_malformed("$IIMWV,45.0,R*01"); // truncated sentence
    }

    #[test]
    fn unsupported_sentences() {
        // unknown talker
        assert_eq!(
            decode("$XXDPT,12.3,0.0*70"),
            Err(DecodeError::UnsupportedSentenceType("XXDPT".to_string()))
        );
        // known talker, format we do not decode
        assert_eq!(
            decode("$GPZDA,110135,25,07,2023,00,00*4C"),
            Err(DecodeError::UnsupportedSentenceType("GPZDA".to_string()))
        );
    }

    #[test]
    fn trailing_newline_is_tolerated() {
        assert_eq!(
            decode("$IIDPT,12.3,0.0*70\r\n"),
            Ok(DecodedReading::Depth(12.3))
        );
    }
}
