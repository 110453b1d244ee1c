//! Row to entity decoding.
//!
//! Static datasets are large and partially dirty, so a single bad field never
//! fails a row. Every numeric column goes through one of the named policy
//! functions below, which resolve malformed input to a fixed default.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::model::{Route, Shape, Stop, StopTime, Trip};
use crate::table::Table;

/// The only route type kept distinct; every other code folds to 0.
pub const BUS_ROUTE_TYPE: i32 = 3;

/// A static entity that can be decoded from a table row.
pub trait StaticEntity: Serialize + DeserializeOwned + Send + Sync + 'static {
    const TABLE: Table;

    fn decode(row: &[String]) -> Self;
}

impl StaticEntity for Trip {
    const TABLE: Table = Table::Trips;

    fn decode(row: &[String]) -> Self {
        decode_trip(row)
    }
}

impl StaticEntity for Route {
    const TABLE: Table = Table::Routes;

    fn decode(row: &[String]) -> Self {
        decode_route(row)
    }
}

impl StaticEntity for Shape {
    const TABLE: Table = Table::Shapes;

    fn decode(row: &[String]) -> Self {
        decode_shape(row)
    }
}

impl StaticEntity for StopTime {
    const TABLE: Table = Table::StopTimes;

    fn decode(row: &[String]) -> Self {
        decode_stop_time(row)
    }
}

impl StaticEntity for Stop {
    const TABLE: Table = Table::Stops;

    fn decode(row: &[String]) -> Self {
        decode_stop(row)
    }
}

/// Decodes every data row of a table, skipping the header at index 0.
pub fn decode_rows<T: StaticEntity>(rows: &[Vec<String>]) -> Vec<T> {
    rows.iter().skip(1).map(|row| T::decode(row)).collect()
}

/// Best-effort integer scan: skips leading whitespace, reads an optional sign
/// and the leading run of digits. Yields 0 when no digit is found or the value
/// overflows.
pub fn int_or_zero(raw: &str) -> i32 {
    let s = raw.trim_start();
    let sign = usize::from(matches!(s.as_bytes().first(), Some(b'-' | b'+')));
    let digits = s[sign..].bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return 0;
    }
    s[..sign + digits].parse().unwrap_or(0)
}

/// Trimmed float parse. Empty, malformed and non-finite values yield 0.0.
pub fn float_or_zero(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// `"3"` is a bus route; every other raw value, valid GTFS code or not, is 0.
pub fn route_type_code(raw: &str) -> i32 {
    if raw.trim() == "3" { BUS_ROUTE_TYPE } else { 0 }
}

pub fn trimmed(raw: &str) -> String {
    raw.trim().to_string()
}

/// `None` for a missing or blank column.
pub fn optional(raw: Option<&String>) -> Option<String> {
    raw.map(|s| s.trim()).filter(|s| !s.is_empty()).map(str::to_string)
}

pub fn optional_int(raw: Option<&String>) -> Option<i32> {
    optional(raw).map(|s| int_or_zero(&s))
}

// Columns past the end of a short row read as empty.
fn field(row: &[String], i: usize) -> &str {
    row.get(i).map(String::as_str).unwrap_or("")
}

fn text(row: &[String], i: usize) -> String {
    field(row, i).to_string()
}

pub fn decode_trip(row: &[String]) -> Trip {
    Trip {
        route_id: text(row, 0),
        service_id: text(row, 1),
        trip_id: text(row, 2),
        trip_headsign: text(row, 3),
        direction_id: int_or_zero(field(row, 4)),
        block_id: trimmed(field(row, 5)),
        shape_id: text(row, 6),
    }
}

pub fn decode_route(row: &[String]) -> Route {
    Route {
        route_id: text(row, 0),
        agency_id: text(row, 1),
        route_short_name: text(row, 2),
        route_long_name: text(row, 3),
        route_desc: text(row, 4),
        route_type: route_type_code(field(row, 5)),
        route_url: text(row, 6),
        route_color: text(row, 7),
        route_text_color: text(row, 8),
    }
}

pub fn decode_shape(row: &[String]) -> Shape {
    Shape {
        shape_id: text(row, 0),
        shape_pt_lat: float_or_zero(field(row, 1)),
        shape_pt_lon: float_or_zero(field(row, 2)),
        shape_pt_sequence: int_or_zero(field(row, 3)),
        shape_dist_traveled: float_or_zero(field(row, 4)),
    }
}

/// Column 5 (`stop_headsign`) is not kept.
pub fn decode_stop_time(row: &[String]) -> StopTime {
    StopTime {
        trip_id: text(row, 0),
        arrival_time: trimmed(field(row, 1)),
        departure_time: trimmed(field(row, 2)),
        stop_id: text(row, 3),
        stop_sequence: int_or_zero(field(row, 4)),
        pickup_type: int_or_zero(field(row, 6)),
        drop_off_type: int_or_zero(field(row, 7)),
    }
}

pub fn decode_stop(row: &[String]) -> Stop {
    Stop {
        stop_id: text(row, 0),
        stop_code: text(row, 1),
        stop_name: text(row, 2),
        stop_desc: text(row, 3),
        stop_lat: float_or_zero(field(row, 4)),
        stop_lon: float_or_zero(field(row, 5)),
        zone_id: optional(row.get(6)),
        stop_url: optional(row.get(7)),
        location_type: optional_int(row.get(8)),
        parent_station: optional(row.get(9)),
        stop_timezone: optional(row.get(10)),
        wheelchair_boarding: optional_int(row.get(11)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_decode_trip_trims_block_id() {
        let trip = decode_trip(&row(&["1", "wd", "t1", "Downtown", "1", " b1 ", "s1"]));
        assert_eq!(
            trip,
            Trip {
                route_id: "1".to_string(),
                service_id: "wd".to_string(),
                trip_id: "t1".to_string(),
                trip_headsign: "Downtown".to_string(),
                direction_id: 1,
                block_id: "b1".to_string(),
                shape_id: "s1".to_string(),
            }
        );
    }

    #[test]
    fn test_decode_shape_empty_distance_is_zero() {
        let shape = decode_shape(&row(&["s1", "39.75", "-104.99", "4", ""]));
        assert_eq!(shape.shape_dist_traveled, 0.0);
        assert_eq!(shape.shape_pt_sequence, 4);
        assert_eq!(shape.shape_pt_lat, 39.75);
        assert_eq!(shape.shape_pt_lon, -104.99);
    }

    #[test]
    fn test_route_type_only_bus_is_kept() {
        assert_eq!(route_type_code("3"), 3);
        assert_eq!(route_type_code(" 3 "), 3);
        assert_eq!(route_type_code("2"), 0);
        assert_eq!(route_type_code(""), 0);
        assert_eq!(route_type_code("bus"), 0);
        assert_eq!(route_type_code("700"), 0);

        let route = decode_route(&row(&[
            "15", "RTD", "15", "East Colfax", "", "3", "", "0076CE", "FFFFFF",
        ]));
        assert_eq!(route.route_type, 3);
        assert_eq!(route.route_text_color, "FFFFFF");
    }

    #[test]
    fn test_int_scan_policy() {
        assert_eq!(int_or_zero("12"), 12);
        assert_eq!(int_or_zero("  7"), 7);
        assert_eq!(int_or_zero("12abc"), 12);
        assert_eq!(int_or_zero("1.5"), 1);
        assert_eq!(int_or_zero("-4"), -4);
        assert_eq!(int_or_zero(""), 0);
        assert_eq!(int_or_zero("bus"), 0);
        assert_eq!(int_or_zero("-"), 0);
        assert_eq!(int_or_zero("99999999999"), 0);
        assert_eq!(int_or_zero("+3"), 3);
        assert_eq!(int_or_zero("-2147483648"), i32::MIN);
        assert_eq!(int_or_zero("2147483647"), i32::MAX);
        assert_eq!(int_or_zero("2147483648"), 0);
    }

    #[test]
    fn test_float_policy() {
        assert_eq!(float_or_zero("1.25"), 1.25);
        assert_eq!(float_or_zero(" 2.5 "), 2.5);
        assert_eq!(float_or_zero(""), 0.0);
        assert_eq!(float_or_zero("n/a"), 0.0);
        assert_eq!(float_or_zero("inf"), 0.0);
        assert_eq!(float_or_zero("NaN"), 0.0);
    }

    #[test]
    fn test_decode_stop_time_skips_headsign_column() {
        let st = decode_stop_time(&row(&[
            "t1", "25:10:00", "25:11:00", "s9", "3", "Airport", "1", "x",
        ]));
        assert_eq!(st.arrival_time, "25:10:00");
        assert_eq!(st.stop_id, "s9");
        assert_eq!(st.stop_sequence, 3);
        assert_eq!(st.pickup_type, 1);
        assert_eq!(st.drop_off_type, 0);
    }

    #[test]
    fn test_decode_stop_with_and_without_optionals() {
        let bare = decode_stop(&row(&["s1", "101", "Union Station", "", "39.75", "bad"]));
        assert_eq!(bare.stop_lon, 0.0);
        assert_eq!(bare.zone_id, None);
        assert_eq!(bare.wheelchair_boarding, None);

        let full = decode_stop(&row(&[
            "s2",
            "102",
            "Civic Center",
            "Bay 4",
            "39.74",
            "-104.98",
            "A",
            "",
            "0",
            "station-1",
            "America/Denver",
            "1",
        ]));
        assert_eq!(full.zone_id.as_deref(), Some("A"));
        assert_eq!(full.stop_url, None);
        assert_eq!(full.location_type, Some(0));
        assert_eq!(full.parent_station.as_deref(), Some("station-1"));
        assert_eq!(full.stop_timezone.as_deref(), Some("America/Denver"));
        assert_eq!(full.wheelchair_boarding, Some(1));
    }

    #[test]
    fn test_short_rows_take_defaults() {
        let trip = decode_trip(&row(&["1", "wd", "t1"]));
        assert_eq!(trip.trip_id, "t1");
        assert_eq!(trip.direction_id, 0);
        assert_eq!(trip.shape_id, "");
    }

    #[test]
    fn test_decode_rows_skips_header() {
        let rows = vec![
            row(&["route_id", "service_id", "trip_id", "trip_headsign", "direction_id"]),
            row(&["1", "wd", "t1", "Downtown", "direction"]),
        ];
        let trips: Vec<Trip> = decode_rows(&rows);
        assert_eq!(trips.len(), 1);
        assert_eq!(trips[0].direction_id, 0);
    }
}
