//! Source records as delivered by the data service.
//!
//! Records are opaque field-value mappings. The timeline only reads the
//! handful of named fields it understands and ignores everything else.

use serde_json::{Map, Value};

use super::calendar::CalendarDate;

/// A single record from the store: field name to JSON value.
pub type Record = Map<String, Value>;

/// Collection holding story events.
pub const STORY_EVENTS: &str = "story_events";

/// Collection holding non-player characters.
pub const NSCS: &str = "nscs";

/// Collection holding campaign objects (items, artifacts).
pub const OBJECTS: &str = "objects";

/// Collection holding the single campaign state record.
pub const CAMPAIGN: &str = "campaign";

/// Field on the campaign record holding the current in-game date.
pub const CURRENT_DATE_FIELD: &str = "current_date";

/// Records fetched for one render pass, grouped by collection.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    pub story_events: Vec<Record>,
    pub nscs: Vec<Record>,
    pub objects: Vec<Record>,
    /// Current campaign date, if the store provides one
    pub reference_date: Option<CalendarDate>,
}

impl RecordSet {
    /// Total number of source records (excluding campaign state).
    pub fn len(&self) -> usize {
        self.story_events.len() + self.nscs.len() + self.objects.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Read a date field.
///
/// Accepts an object `{"year": .., "month": .., "day": ..}` or a string in
/// `YYYY-MM-DD` / `DD.MM.YYYY` form. Anything else (including out-of-range
/// components) reads as missing.
pub fn read_date(record: &Record, field: &str) -> Option<CalendarDate> {
    match record.get(field)? {
        Value::Object(obj) => {
            let year = obj.get("year")?.as_i64()?;
            let month = u8::try_from(obj.get("month")?.as_u64()?).ok()?;
            let day = u8::try_from(obj.get("day")?.as_u64()?).ok()?;
            CalendarDate::new(year, month, day)
        }
        Value::String(s) if !s.trim().is_empty() => s.parse().ok(),
        _ => None,
    }
}

/// Read a non-empty string field.
pub fn read_str<'a>(record: &'a Record, field: &str) -> Option<&'a str> {
    record
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Read a boolean flag; missing or non-boolean values read as false.
pub fn read_flag(record: &Record, field: &str) -> bool {
    record.get(field).and_then(Value::as_bool).unwrap_or(false)
}

/// Read the record's identifier as a string, whether stored as text or number.
pub fn read_id(record: &Record) -> Option<String> {
    match record.get("id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Encode a date as the object form understood by [`read_date`].
pub fn date_value(date: CalendarDate) -> Value {
    serde_json::json!({
        "year": date.year,
        "month": date.month,
        "day": date.day,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("test record must be an object"),
        }
    }

    #[test]
    fn test_read_date_object_form() {
        let r = record(json!({ "start_date": { "year": 1027, "month": 6, "day": 15 } }));
        assert_eq!(
            read_date(&r, "start_date"),
            CalendarDate::new(1027, 6, 15)
        );
    }

    #[test]
    fn test_read_date_string_forms() {
        let r = record(json!({ "a": "1027-06-15", "b": "15.06.1027" }));
        assert_eq!(read_date(&r, "a"), CalendarDate::new(1027, 6, 15));
        assert_eq!(read_date(&r, "b"), CalendarDate::new(1027, 6, 15));
    }

    #[test]
    fn test_read_date_missing_or_invalid() {
        let r = record(json!({
            "null": null,
            "empty": "",
            "bad_month": { "year": 1027, "month": 13, "day": 1 },
            "no_day": { "year": 1027, "month": 1 },
            "number": 12
        }));
        assert_eq!(read_date(&r, "absent"), None);
        assert_eq!(read_date(&r, "null"), None);
        assert_eq!(read_date(&r, "empty"), None);
        assert_eq!(read_date(&r, "bad_month"), None);
        assert_eq!(read_date(&r, "no_day"), None);
        assert_eq!(read_date(&r, "number"), None);
    }

    #[test]
    fn test_read_date_rejects_huge_years() {
        let r = record(json!({
            "object": { "year": 100_000_000_000_000_000i64, "month": 1, "day": 1 },
            "iso": "100000000000000000-01-01",
            "dotted": "01.01.-100000000000000000"
        }));
        assert_eq!(read_date(&r, "object"), None);
        assert_eq!(read_date(&r, "iso"), None);
        assert_eq!(read_date(&r, "dotted"), None);
    }

    #[test]
    fn test_read_flag_and_str() {
        let r = record(json!({ "is_active": true, "name": "  Alrik ", "blank": " " }));
        assert!(read_flag(&r, "is_active"));
        assert!(!read_flag(&r, "missing"));
        assert_eq!(read_str(&r, "name"), Some("Alrik"));
        assert_eq!(read_str(&r, "blank"), None);
    }

    #[test]
    fn test_read_id_accepts_numbers() {
        assert_eq!(read_id(&record(json!({ "id": 7 }))), Some("7".to_string()));
        assert_eq!(
            read_id(&record(json!({ "id": "evt-1" }))),
            Some("evt-1".to_string())
        );
        assert_eq!(read_id(&record(json!({}))), None);
    }

    #[test]
    fn test_date_value_round_trips() {
        let d = CalendarDate::new(1027, 2, 3).unwrap();
        let r = record(json!({ "d": date_value(d) }));
        assert_eq!(read_date(&r, "d"), Some(d));
    }
}
