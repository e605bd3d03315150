use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};

/// Label substituted for a missing x-axis value
pub const UNCATEGORIZED: &str = "uncategorized";
/// Label substituted for a missing group value
pub const UNGROUPED: &str = "ungrouped";

static MISSING: FieldValue = FieldValue::Missing;

/// A single cell of a record
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Missing,
}

impl FieldValue {
    fn from_json(value: &Value) -> Self {
        match value {
            Value::String(s) => FieldValue::Text(s.clone()),
            Value::Number(n) => n.as_f64().map(FieldValue::Number).unwrap_or(FieldValue::Missing),
            Value::Bool(b) => FieldValue::Bool(*b),
            // Nested values never come out of the spreadsheet export
            Value::Null | Value::Array(_) | Value::Object(_) => FieldValue::Missing,
        }
    }

    /// Label used when this value buckets records.
    /// Missing values and blank text yield `None`.
    pub fn as_label(&self) -> Option<String> {
        match self {
            FieldValue::Text(s) if s.trim().is_empty() => None,
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Number(n) => Some(format_number(*n)),
            FieldValue::Bool(b) => Some(b.to_string()),
            FieldValue::Missing => None,
        }
    }

    /// Numeric reading of this value. Text is parsed after trimming;
    /// anything that is not a finite number yields `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) if n.is_finite() => Some(*n),
            FieldValue::Text(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
            _ => None,
        }
    }
}

/// Integral numbers print without a fractional part so that `3` and `3.0`
/// bucket together.
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// A flat key-value row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(field.into(), value);
        self
    }

    pub fn from_json_object(obj: &Map<String, Value>) -> Self {
        let fields = obj
            .iter()
            .map(|(k, v)| (k.clone(), FieldValue::from_json(v)))
            .collect();
        Self { fields }
    }

    /// Absent keys read as `Missing`
    pub fn get(&self, field: &str) -> &FieldValue {
        self.fields.get(field).unwrap_or(&MISSING)
    }

    /// Bucket label for `field`, falling back to `sentinel`
    pub fn label(&self, field: &str, sentinel: &str) -> String {
        self.get(field)
            .as_label()
            .unwrap_or_else(|| sentinel.to_string())
    }

    pub fn number(&self, field: &str) -> Option<f64> {
        self.get(field).as_number()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

/// Metadata block written alongside the records.
///
/// Off-type entries are coerced rather than rejected: numeric field names are
/// stringified, nulls are skipped and counts that are not non-negative
/// integers read as absent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    pub total_records: Option<usize>,
    pub fields: Vec<String>,
    pub field_count: Option<usize>,
}

impl Metadata {
    pub fn from_json_object(obj: &Map<String, Value>) -> Self {
        let count = |key: &str| {
            obj.get(key)
                .and_then(Value::as_u64)
                .and_then(|n| usize::try_from(n).ok())
        };
        let fields = obj
            .get("fields")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(field_name).collect())
            .unwrap_or_default();

        Self {
            total_records: count("total_records"),
            fields,
            field_count: count("field_count"),
        }
    }
}

fn field_name(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => n.as_f64().map(format_number),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Records plus the field names they were exported with
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub fields: Vec<String>,
    pub records: Vec<Record>,
}

impl Dataset {
    pub fn new(fields: Vec<String>, records: Vec<Record>) -> Self {
        Self { fields, records }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Field names of all records: sorted within each record, first-seen
    /// across records
    pub fn fields_from_records(records: &[Record]) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut fields = Vec::new();
        for record in records {
            for key in record.keys() {
                if seen.insert(key.to_string()) {
                    fields.push(key.to_string());
                }
            }
        }
        fields
    }
}
