use crate::types::NOT_AVAILABLE;
use chrono::{DateTime, Local, NaiveDateTime};
use serde_json::{Map, Value};

/// Full parking state from one poll, keyed by record id, in delivery order.
pub type ParkingSnapshot = Map<String, Value>;

const TIMESTAMP_FORMAT: &str = "%d/%m/%Y, %H.%M.%S";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentRow {
    pub plate: String,
    pub vehicle_type: String,
    pub entry_time: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRow {
    pub plate: String,
    pub vehicle_type: String,
    pub entry_time: String,
    pub exit_time: String,
    pub duration_minutes: String,
    pub fee: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParkingTables {
    pub current: Vec<CurrentRow>,
    pub history: Vec<HistoryRow>,
}

/// A vehicle is still parked exactly when its `exit_time` is an explicit
/// null. A missing `exit_time` is unknown, not parked.
pub fn is_parked(record: &Value) -> bool {
    matches!(record.get("exit_time"), Some(Value::Null))
}

pub fn render(snapshot: &ParkingSnapshot) -> ParkingTables {
    let mut tables = ParkingTables::default();
    for (id, record) in snapshot {
        let plate = display_plate(id, record);
        let vehicle_type = match record["vehicle_type"].as_str() {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => NOT_AVAILABLE.to_string(),
        };
        let entry_time = format_timestamp(&record["entry_time"]);
        if is_parked(record) {
            tables.current.push(CurrentRow {
                plate,
                vehicle_type,
                entry_time,
            });
        } else {
            tables.history.push(HistoryRow {
                plate,
                vehicle_type,
                entry_time,
                exit_time: format_timestamp(&record["exit_time"]),
                duration_minutes: format_duration(&record["duration_minutes"]),
                fee: format_fee(&record["fee"]),
            });
        }
    }
    tables
}

/// `original_plat` when the backend kept one, else the normalized plate. The
/// backend keys records by normalized plate, so the id stands in when the
/// record itself omits it.
fn display_plate(id: &str, record: &Value) -> String {
    [&record["original_plat"], &record["plat_nomor"]]
        .iter()
        .filter_map(|v| v.as_str())
        .find(|s| !s.is_empty())
        .unwrap_or(id)
        .to_string()
}

pub fn format_timestamp(value: &Value) -> String {
    match value {
        Value::String(s) if !s.is_empty() => {
            if let Ok(t) = DateTime::parse_from_rfc3339(s) {
                return t.with_timezone(&Local).format(TIMESTAMP_FORMAT).to_string();
            }
            // The backend writes naive local time.
            match NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
                Ok(t) => t.format(TIMESTAMP_FORMAT).to_string(),
                Err(_) => s.clone(),
            }
        }
        Value::Number(n) => match n.as_i64().and_then(DateTime::from_timestamp_millis) {
            Some(t) => t.with_timezone(&Local).format(TIMESTAMP_FORMAT).to_string(),
            None => n.to_string(),
        },
        _ => NOT_AVAILABLE.to_string(),
    }
}

fn format_duration(value: &Value) -> String {
    match value {
        Value::Null => NOT_AVAILABLE.to_string(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn format_fee(value: &Value) -> String {
    if let Some(n) = value.as_i64() {
        let grouped = group_thousands(&n.unsigned_abs().to_string());
        return if n < 0 { format!("-{}", grouped) } else { grouped };
    }
    match value.as_f64() {
        Some(n) => format_decimal(n),
        None => NOT_AVAILABLE.to_string(),
    }
}

/// Indonesian grouping: `.` between thousands, `,` before at most three
/// fraction digits.
fn format_decimal(n: f64) -> String {
    let rounded = format!("{:.3}", n.abs());
    let (int_part, frac_part) = rounded.split_once('.').unwrap_or((&rounded, ""));
    let frac_part = frac_part.trim_end_matches('0');
    let mut out = String::new();
    if n < 0.0 && (int_part != "0" || !frac_part.is_empty()) {
        out.push('-');
    }
    out.push_str(&group_thousands(int_part));
    if !frac_part.is_empty() {
        out.push(',');
        out.push_str(frac_part);
    }
    out
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(value: Value) -> ParkingSnapshot {
        match value {
            Value::Object(map) => map,
            _ => panic!("snapshot must be an object"),
        }
    }

    #[test]
    fn null_exit_time_is_current() {
        let tables = render(&snapshot(json!({
            "B1234ABC": {
                "vehicle_type": "Mobil",
                "entry_time": "2024-05-01T10:20:30.123456",
                "exit_time": null,
                "fee": null,
                "original_plat": "B 1234 ABC"
            },
            "D55X": {"exit_time": null}
        })));
        assert!(tables.history.is_empty());
        assert_eq!(
            tables.current,
            vec![
                CurrentRow {
                    plate: "B 1234 ABC".to_string(),
                    vehicle_type: "Mobil".to_string(),
                    entry_time: "01/05/2024, 10.20.30".to_string(),
                },
                CurrentRow {
                    plate: "D55X".to_string(),
                    vehicle_type: NOT_AVAILABLE.to_string(),
                    entry_time: NOT_AVAILABLE.to_string(),
                },
            ]
        );
    }

    #[test]
    fn missing_exit_time_is_history() {
        let tables = render(&snapshot(json!({
            "AB1": {"vehicle_type": "Motor", "entry_time": "2024-05-01T08:00:00"}
        })));
        assert!(tables.current.is_empty());
        assert_eq!(
            tables.history,
            vec![HistoryRow {
                plate: "AB1".to_string(),
                vehicle_type: "Motor".to_string(),
                entry_time: "01/05/2024, 08.00.00".to_string(),
                exit_time: NOT_AVAILABLE.to_string(),
                duration_minutes: NOT_AVAILABLE.to_string(),
                fee: NOT_AVAILABLE.to_string(),
            }]
        );
    }

    #[test]
    fn exited_record_fields() {
        let tables = render(&snapshot(json!({
            "B1234ABC": {
                "plat_nomor": "B1234ABC",
                "vehicle_type": "Mobil",
                "entry_time": "2024-05-01T08:00:00",
                "exit_time": "2024-05-01T13:05:00",
                "duration_minutes": 305,
                "fee": 15000
            }
        })));
        let row = &tables.history[0];
        assert_eq!(row.plate, "B1234ABC");
        assert_eq!(row.exit_time, "01/05/2024, 13.05.00");
        assert_eq!(row.duration_minutes, "305");
        assert_eq!(row.fee, "15.000");
    }

    #[test]
    fn original_plate_takes_precedence() {
        let record = json!({"plat_nomor": "B1234ABC", "original_plat": "B 1234 ABC"});
        assert_eq!(display_plate("id", &record), "B 1234 ABC");
        let record = json!({"plat_nomor": "B1234ABC", "original_plat": ""});
        assert_eq!(display_plate("id", &record), "B1234ABC");
    }

    #[test]
    fn keeps_delivery_order() {
        let tables = render(&snapshot(json!({
            "Z9": {"exit_time": null},
            "A1": {"exit_time": null},
            "M5": {"exit_time": null}
        })));
        let plates: Vec<_> = tables.current.iter().map(|r| r.plate.as_str()).collect();
        assert_eq!(plates, vec!["Z9", "A1", "M5"]);
    }

    #[test]
    fn render_is_idempotent() {
        let snap = snapshot(json!({
            "A": {"exit_time": null, "entry_time": "2024-05-01T08:00:00"},
            "B": {"exit_time": "2024-05-01T09:00:00", "fee": 2000, "duration_minutes": 60}
        }));
        assert_eq!(render(&snap), render(&snap));
    }

    #[test]
    fn fee_grouping() {
        assert_eq!(format_fee(&json!(15000)), "15.000");
        assert_eq!(format_fee(&json!(5000)), "5.000");
        assert_eq!(format_fee(&json!(999)), "999");
        assert_eq!(format_fee(&json!(1234567)), "1.234.567");
        assert_eq!(format_fee(&json!(0)), "0");
        assert_eq!(format_fee(&json!(-2000)), "-2.000");
        assert_eq!(format_fee(&json!(1500.5)), "1.500,5");
        assert_eq!(format_fee(&json!(0.1234)), "0,123");
        assert_eq!(format_fee(&Value::Null), NOT_AVAILABLE);
        assert_eq!(format_fee(&json!("gratis")), NOT_AVAILABLE);
    }

    #[test]
    fn timestamp_fallbacks() {
        assert_eq!(format_timestamp(&Value::Null), NOT_AVAILABLE);
        assert_eq!(format_timestamp(&json!("")), NOT_AVAILABLE);
        assert_eq!(format_timestamp(&json!("kemarin")), "kemarin");
        assert_eq!(
            format_timestamp(&json!("2024-12-31T23:59:59")),
            "31/12/2024, 23.59.59"
        );
    }
}
