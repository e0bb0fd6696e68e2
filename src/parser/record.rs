use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

/// An opaque row: field name to value, in the order the fields were seen
pub type Row = IndexMap<String, FieldValue>;

/// A single field of a row
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(from = "Value")]
pub enum FieldValue {
    Null,
    Bool(bool),
    Integer(i64),
    Real(f64),
    Text(String),
    /// A nested array or object (jsonb and array columns), kept as-is
    Json(Value),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Convert a float into an integer when it carries no fraction.
    /// Spreadsheets store every number as a float, including ids.
    pub fn from_f64(f: f64) -> Self {
        if f.fract() == 0.0 && f.abs() < 9_007_199_254_740_992.0 {
            FieldValue::Integer(f as i64)
        } else {
            FieldValue::Real(f)
        }
    }

    pub fn bind_to(&self, idx: usize, stmt: &mut rusqlite::Statement) -> rusqlite::Result<()> {
        match self {
            FieldValue::Null => stmt.raw_bind_parameter(idx, rusqlite::types::Null)?,
            FieldValue::Bool(b) => stmt.raw_bind_parameter(idx, b)?,
            FieldValue::Integer(i) => stmt.raw_bind_parameter(idx, i)?,
            FieldValue::Real(f) => stmt.raw_bind_parameter(idx, f)?,
            FieldValue::Text(s) => stmt.raw_bind_parameter(idx, s.as_str())?,
            FieldValue::Json(v) => stmt.raw_bind_parameter(idx, v.to_string())?,
        }
        Ok(())
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Integer(i),
                None => FieldValue::Real(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => FieldValue::Text(s),
            nested @ (Value::Array(_) | Value::Object(_)) => FieldValue::Json(nested),
        }
    }
}

impl From<rusqlite::types::ValueRef<'_>> for FieldValue {
    fn from(value: rusqlite::types::ValueRef<'_>) -> Self {
        use rusqlite::types::ValueRef;
        match value {
            ValueRef::Null => FieldValue::Null,
            ValueRef::Integer(i) => FieldValue::Integer(i),
            ValueRef::Real(f) => FieldValue::Real(f),
            ValueRef::Text(t) => FieldValue::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => FieldValue::Text(String::from_utf8_lossy(b).into_owned()),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Null => serializer.serialize_unit(),
            FieldValue::Bool(b) => serializer.serialize_bool(*b),
            FieldValue::Integer(i) => serializer.serialize_i64(*i),
            FieldValue::Real(f) => serializer.serialize_f64(*f),
            FieldValue::Text(s) => serializer.serialize_str(s),
            FieldValue::Json(v) => v.serialize(serializer),
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Real(r) => write!(f, "{}", r),
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Json(v) => write!(f, "{}", v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_conversion() {
        assert_eq!(FieldValue::from(json!(null)), FieldValue::Null);
        assert_eq!(FieldValue::from(json!(true)), FieldValue::Bool(true));
        assert_eq!(FieldValue::from(json!(42)), FieldValue::Integer(42));
        assert_eq!(FieldValue::from(json!(1.5)), FieldValue::Real(1.5));
        assert_eq!(FieldValue::from(json!("نص")), FieldValue::Text("نص".into()));
    }

    #[test]
    fn test_nested_values_stay_nested() {
        let value = FieldValue::from(json!({"a": [1, 2]}));
        assert_eq!(value, FieldValue::Json(json!({"a": [1, 2]})));
        assert_eq!(value.to_string(), r#"{"a":[1,2]}"#);
    }

    #[test]
    fn test_row_with_array_and_object_round_trips() {
        let text = r#"{"id":1,"الإنجازات":["a","b"],"meta":{"k":1}}"#;
        let row: Row = serde_json::from_str(text).unwrap();
        assert_eq!(row["الإنجازات"], FieldValue::Json(json!(["a", "b"])));
        assert_eq!(serde_json::to_string(&row).unwrap(), text);
    }

    #[test]
    fn test_nested_values_bind_as_json_text() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let mut stmt = conn.prepare("SELECT ?1").unwrap();
        FieldValue::Json(json!(["a", "b"])).bind_to(1, &mut stmt).unwrap();
        let mut rows = stmt.raw_query();
        let text: String = rows.next().unwrap().unwrap().get(0).unwrap();
        assert_eq!(text, r#"["a","b"]"#);
    }

    #[test]
    fn test_from_f64_keeps_whole_numbers_integral() {
        assert_eq!(FieldValue::from_f64(7.0), FieldValue::Integer(7));
        assert_eq!(FieldValue::from_f64(7.25), FieldValue::Real(7.25));
    }

    #[test]
    fn test_row_serializes_in_field_order() {
        let row: Row = serde_json::from_value(json!({"id": 1, "الاسم": "سعد", "حي": null})).unwrap();
        let text = serde_json::to_string(&row).unwrap();
        assert_eq!(text, r#"{"id":1,"الاسم":"سعد","حي":null}"#);
    }

    #[test]
    fn test_row_deserializes() {
        let row: Row = serde_json::from_str(r#"{"b": 2, "a": "x"}"#).unwrap();
        let keys: Vec<_> = row.keys().cloned().collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(row["a"], FieldValue::Text("x".into()));
    }
}
