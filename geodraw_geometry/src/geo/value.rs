use serde_json::{Number, Value};
use std::{collections::BTreeMap, fmt::Debug, fmt::Display};

/// A property value of a feature. Mirrors the JSON value space so that arbitrary
/// caller-supplied properties survive a round trip through the store.
#[derive(Clone, PartialEq)]
pub enum GeoValue {
	Bool(bool),
	Double(f64),
	Int(i64),
	UInt(u64),
	Null,
	String(String),
	Array(Vec<GeoValue>),
	Object(BTreeMap<String, GeoValue>),
}

impl Debug for GeoValue {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::String(v) => f.debug_tuple("String").field(v).finish(),
			Self::Double(v) => f.debug_tuple("Double").field(v).finish(),
			Self::Int(v) => f.debug_tuple("Int").field(v).finish(),
			Self::UInt(v) => f.debug_tuple("UInt").field(v).finish(),
			Self::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
			Self::Array(v) => f.debug_tuple("Array").field(v).finish(),
			Self::Object(v) => f.debug_tuple("Object").field(v).finish(),
			Self::Null => f.debug_tuple("Null").finish(),
		}
	}
}

impl Display for GeoValue {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			GeoValue::Bool(v) => write!(f, "{v}"),
			GeoValue::Double(v) => write!(f, "{v}"),
			GeoValue::Int(v) => write!(f, "{v}"),
			GeoValue::UInt(v) => write!(f, "{v}"),
			GeoValue::Null => f.write_str("null"),
			GeoValue::String(v) => f.write_str(v),
			GeoValue::Array(_) | GeoValue::Object(_) => write!(f, "{}", self.to_json()),
		}
	}
}

impl GeoValue {
	#[must_use]
	pub fn as_str(&self) -> Option<&str> {
		match self {
			GeoValue::String(v) => Some(v),
			_ => None,
		}
	}

	#[must_use]
	pub fn as_f64(&self) -> Option<f64> {
		match self {
			GeoValue::Double(v) => Some(*v),
			#[allow(clippy::cast_precision_loss)]
			GeoValue::Int(v) => Some(*v as f64),
			#[allow(clippy::cast_precision_loss)]
			GeoValue::UInt(v) => Some(*v as f64),
			_ => None,
		}
	}

	#[must_use]
	pub fn as_bool(&self) -> Option<bool> {
		match self {
			GeoValue::Bool(v) => Some(*v),
			_ => None,
		}
	}

	#[must_use]
	pub fn to_json(&self) -> Value {
		match self {
			GeoValue::Bool(v) => Value::Bool(*v),
			GeoValue::Double(v) => Number::from_f64(*v).map_or(Value::Null, Value::Number),
			GeoValue::Int(v) => Value::from(*v),
			GeoValue::UInt(v) => Value::from(*v),
			GeoValue::Null => Value::Null,
			GeoValue::String(v) => Value::String(v.clone()),
			GeoValue::Array(v) => Value::Array(v.iter().map(GeoValue::to_json).collect()),
			GeoValue::Object(v) => Value::Object(v.iter().map(|(k, v)| (k.clone(), v.to_json())).collect()),
		}
	}
}

impl From<&Value> for GeoValue {
	fn from(value: &Value) -> Self {
		match value {
			Value::Null => GeoValue::Null,
			Value::Bool(v) => GeoValue::Bool(*v),
			Value::Number(n) => {
				if let Some(v) = n.as_u64() {
					GeoValue::UInt(v)
				} else if let Some(v) = n.as_i64() {
					GeoValue::Int(v)
				} else {
					GeoValue::Double(n.as_f64().unwrap_or(f64::NAN))
				}
			}
			Value::String(v) => GeoValue::String(v.clone()),
			Value::Array(v) => GeoValue::Array(v.iter().map(GeoValue::from).collect()),
			Value::Object(v) => GeoValue::Object(v.iter().map(|(k, v)| (k.clone(), GeoValue::from(v))).collect()),
		}
	}
}

impl From<&str> for GeoValue {
	fn from(value: &str) -> Self {
		GeoValue::String(value.to_string())
	}
}

impl From<&String> for GeoValue {
	fn from(value: &String) -> Self {
		GeoValue::String(value.clone())
	}
}

impl From<String> for GeoValue {
	fn from(value: String) -> Self {
		GeoValue::String(value)
	}
}

impl From<i32> for GeoValue {
	fn from(value: i32) -> Self {
		if value < 0 {
			GeoValue::Int(i64::from(value))
		} else {
			GeoValue::UInt(u64::from(value.unsigned_abs()))
		}
	}
}

impl From<u32> for GeoValue {
	fn from(value: u32) -> Self {
		GeoValue::UInt(u64::from(value))
	}
}

impl From<i64> for GeoValue {
	fn from(value: i64) -> Self {
		GeoValue::Int(value)
	}
}

impl From<u64> for GeoValue {
	fn from(value: u64) -> Self {
		GeoValue::UInt(value)
	}
}

impl From<usize> for GeoValue {
	fn from(value: usize) -> Self {
		GeoValue::UInt(value as u64)
	}
}

impl From<f64> for GeoValue {
	fn from(value: f64) -> Self {
		GeoValue::Double(value)
	}
}

impl From<bool> for GeoValue {
	fn from(value: bool) -> Self {
		GeoValue::Bool(value)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use pretty_assertions::assert_eq;
	use serde_json::json;

	#[test]
	fn from_json_keeps_number_kinds() {
		assert_eq!(GeoValue::from(&json!(3)), GeoValue::UInt(3));
		assert_eq!(GeoValue::from(&json!(-3)), GeoValue::Int(-3));
		assert_eq!(GeoValue::from(&json!(1.5)), GeoValue::Double(1.5));
	}

	#[test]
	fn nested_values_round_trip() {
		let input = json!({"tags": ["a", "b"], "meta": {"z": null, "ok": true}});
		let value = GeoValue::from(&input);
		assert_eq!(value.to_json(), input);
	}

	#[test]
	fn display() {
		assert_eq!(GeoValue::from("abc").to_string(), "abc");
		assert_eq!(GeoValue::from(-7).to_string(), "-7");
		assert_eq!(GeoValue::Null.to_string(), "null");
		assert_eq!(GeoValue::from(&json!([1, 2])).to_string(), "[1,2]");
	}

	#[test]
	fn accessors() {
		assert_eq!(GeoValue::from(4u32).as_f64(), Some(4.0));
		assert_eq!(GeoValue::from(true).as_bool(), Some(true));
		assert_eq!(GeoValue::from("x").as_str(), Some("x"));
		assert_eq!(GeoValue::from(1.0).as_str(), None);
	}
}
