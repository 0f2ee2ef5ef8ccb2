//! Display formatting for lengths, areas and coordinates.
//!
//! Quantities are shown with at most four significant digits and `,` as the
//! thousands separator.

use geo::Coord;

const SIGNIFICANT_DIGITS: i32 = 4;
const FEET_PER_METER: f64 = 3.28084;
const SQ_FEET_PER_SQ_METER: f64 = 10.763_911_105_6;
/// Decimal places of an OSM coordinate
const OSM_PRECISION: usize = 7;

fn group_thousands(text: &str) -> String {
    let (sign, rest) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text),
    };
    let (int_part, frac_part) = match rest.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (rest, None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(f) => format!("{sign}{grouped}.{f}"),
        None => format!("{sign}{grouped}"),
    }
}

/// Rounds to four significant digits and drops trailing zeros.
pub fn format_quantity(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }
    let magnitude = value.abs().log10().floor() as i32;
    let shift = SIGNIFICANT_DIGITS - 1 - magnitude;
    let factor = 10f64.powi(shift);
    let rounded = (value * factor).round() / factor;

    let mut text = format!("{:.*}", shift.max(0) as usize, rounded);
    if text.contains('.') {
        text = text.trim_end_matches('0').trim_end_matches('.').to_string();
    }
    group_thousands(&text)
}

pub fn display_length(meters: f64, imperial: bool) -> String {
    let (value, unit) = if imperial {
        let feet = meters * FEET_PER_METER;
        if feet >= 5280.0 {
            (feet / 5280.0, "mi")
        } else {
            (feet, "ft")
        }
    } else if meters >= 1000.0 {
        (meters / 1000.0, "km")
    } else {
        (meters, "m")
    };
    format!("{} {}", format_quantity(value), unit)
}

/// Primary unit, plus hectares or acres in parentheses for mid-sized areas.
pub fn display_area(square_meters: f64, imperial: bool) -> String {
    let (primary, secondary) = if imperial {
        let sq_feet = square_meters * SQ_FEET_PER_SQ_METER;
        let primary = if sq_feet >= 6_969_600.0 {
            (sq_feet / 27_878_400.0, "mi²")
        } else {
            (sq_feet, "ft²")
        };
        let secondary =
            (sq_feet > 4_356.0 && sq_feet < 43_560_000.0).then(|| (sq_feet / 43_560.0, "ac"));
        (primary, secondary)
    } else {
        let primary = if square_meters >= 250_000.0 {
            (square_meters / 1_000_000.0, "km²")
        } else {
            (square_meters, "m²")
        };
        let secondary = (square_meters > 1_000.0 && square_meters < 10_000_000.0)
            .then(|| (square_meters / 10_000.0, "ha"));
        (primary, secondary)
    };

    let area = format!("{} {}", format_quantity(primary.0), primary.1);
    match secondary {
        Some((value, unit)) => format!("{} ({} {})", area, format_quantity(value), unit),
        None => area,
    }
}

fn clamp_lat(lat: f64) -> f64 {
    lat.clamp(-90.0, 90.0)
}

fn wrap_lon(lon: f64) -> f64 {
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

fn display_coordinate(deg: f64, positive: char, negative: char) -> String {
    let abs = deg.abs();
    let min = (abs - abs.floor()) * 60.0;
    let sec = (min - min.floor()) * 60.0;

    let degrees = format!("{}°", abs.floor() as i64);
    let coordinate = if sec.floor() > 0.0 {
        format!("{}{}′{}″", degrees, min.floor() as i64, sec.round() as i64)
    } else if min.floor() > 0.0 {
        format!("{}{}′", degrees, min.round() as i64)
    } else {
        degrees
    };

    if deg == 0.0 {
        coordinate
    } else {
        let direction = if deg > 0.0 { positive } else { negative };
        format!("{} {}", coordinate, direction)
    }
}

/// `"lat, lon"` in degrees, minutes and seconds
pub fn dms_coordinate_pair(coord: Coord<f64>) -> String {
    format!(
        "{}, {}",
        display_coordinate(clamp_lat(coord.y), 'N', 'S'),
        display_coordinate(wrap_lon(coord.x), 'E', 'W')
    )
}

/// `"lat, lon"` in decimal degrees at OSM precision
pub fn decimal_coordinate_pair(coord: Coord<f64>) -> String {
    format!(
        "{:.*}, {:.*}",
        OSM_PRECISION,
        clamp_lat(coord.y),
        OSM_PRECISION,
        wrap_lon(coord.x)
    )
}
