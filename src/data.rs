use std::fmt;

use anyhow::{Context, Result, bail};
use duckdb::types::{Value as SqlValue, ValueRef};
use serde::{Deserialize, Serialize};

use crate::schema::ColumnType;

/// A typed cell. Nulls are represented as `None` around this type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Value {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
}

impl Value {
    pub fn as_display(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Integer(i) => i.to_string(),
            Value::Float(f) => {
                if f.fract() == 0.0 && f.abs() < 1e15 {
                    (*f as i64).to_string()
                } else {
                    f.to_string()
                }
            }
            Value::Boolean(b) => b.to_string(),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::String(s) => s.trim().parse().ok(),
            Value::Boolean(_) => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            Value::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_display())
    }
}

/// Renders an optional cell, leaving nulls blank.
pub fn display_cell(value: Option<&Value>) -> String {
    value.map(Value::as_display).unwrap_or_default()
}

pub fn parse_typed_value(value: &str, ty: &ColumnType) -> Result<Option<Value>> {
    if value.is_empty() {
        return Ok(None);
    }
    let parsed = match ty {
        ColumnType::String => Value::String(value.to_string()),
        ColumnType::Integer => {
            let parsed: i64 = value
                .parse()
                .with_context(|| format!("Failed to parse '{value}' as integer"))?;
            Value::Integer(parsed)
        }
        ColumnType::Float => {
            let parsed: f64 = value
                .parse()
                .with_context(|| format!("Failed to parse '{value}' as float"))?;
            Value::Float(parsed)
        }
        ColumnType::Boolean => {
            let parsed = match value.to_ascii_lowercase().as_str() {
                "true" => true,
                "false" => false,
                _ => bail!("Failed to parse '{value}' as boolean"),
            };
            Value::Boolean(parsed)
        }
    };
    Ok(Some(parsed))
}

pub fn to_sql_value(value: Option<&Value>) -> SqlValue {
    match value {
        None => SqlValue::Null,
        Some(Value::Boolean(b)) => SqlValue::Boolean(*b),
        Some(Value::Integer(i)) => SqlValue::BigInt(*i),
        Some(Value::Float(f)) => SqlValue::Double(*f),
        Some(Value::String(s)) => SqlValue::Text(s.clone()),
    }
}

/// Converts an engine cell into a crate value. Types the loader never creates
/// fall back to their debug rendering.
pub fn from_value_ref(value: ValueRef<'_>) -> Option<Value> {
    let converted = match value {
        ValueRef::Null => return None,
        ValueRef::Boolean(b) => Value::Boolean(b),
        ValueRef::TinyInt(i) => Value::Integer(i64::from(i)),
        ValueRef::SmallInt(i) => Value::Integer(i64::from(i)),
        ValueRef::Int(i) => Value::Integer(i64::from(i)),
        ValueRef::BigInt(i) => Value::Integer(i),
        ValueRef::HugeInt(i) => match i64::try_from(i) {
            Ok(narrow) => Value::Integer(narrow),
            Err(_) => Value::Float(i as f64),
        },
        ValueRef::UTinyInt(i) => Value::Integer(i64::from(i)),
        ValueRef::USmallInt(i) => Value::Integer(i64::from(i)),
        ValueRef::UInt(i) => Value::Integer(i64::from(i)),
        ValueRef::UBigInt(i) => match i64::try_from(i) {
            Ok(narrow) => Value::Integer(narrow),
            Err(_) => Value::Float(i as f64),
        },
        ValueRef::Float(f) => Value::Float(f64::from(f)),
        ValueRef::Double(f) => Value::Float(f),
        ValueRef::Decimal(d) => {
            let rendered = d.to_string();
            match rendered.parse::<f64>() {
                Ok(parsed) => Value::Float(parsed),
                Err(_) => Value::String(rendered),
            }
        }
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        other => Value::String(format!("{other:?}")),
    };
    Some(converted)
}
