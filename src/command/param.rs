//! Parameter schema and values
//!
//! A parameter value is extracted from speech as a raw string and typed on
//! demand through the accessors, so the NLU never needs to know the schema's
//! types while extracting.

use crate::error::{VoxError, VoxResult};
use serde::{Deserialize, Serialize};

/// Supported parameter types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    #[default]
    String,
    Integer,
    Double,
    Bool,
    /// String constrained to a set of allowed values
    Enum,
}

/// Schema for a single command parameter
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamDescriptor {
    /// Parameter name, e.g. "level". Unique within a command, used as the
    /// context key (case-sensitive); matched against speech case-insensitively.
    pub name: String,

    /// Value type
    pub param_type: ParamType,

    /// Human-readable description, available to NLU engines
    pub description: String,

    /// Whether the parameter must be present after extraction/defaulting
    pub required: bool,

    /// Inserted when the parameter was not extracted (empty = no default)
    pub default_value: String,

    /// Allowed values for `ParamType::Enum`, in declared order
    pub enum_values: Vec<String>,

    /// Lower bound for integer/double parameters
    pub min_value: Option<f64>,

    /// Upper bound for integer/double parameters
    pub max_value: Option<f64>,
}

impl ParamDescriptor {
    /// Convenience constructor for the common fields
    pub fn new(name: impl Into<String>, param_type: ParamType) -> Self {
        Self {
            name: name.into(),
            param_type,
            ..Self::default()
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = value.into();
        self
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min_value = Some(min);
        self.max_value = Some(max);
        self
    }

    pub fn with_enum_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enum_values = values.into_iter().map(Into::into).collect();
        self
    }
}

/// One extracted parameter value, stored as the raw string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamValue {
    raw: String,
}

impl ParamValue {
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// The raw string as extracted
    pub fn as_string(&self) -> String {
        self.raw.clone()
    }

    /// The raw string, borrowed
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Parse as an integer. The entire string must be a valid integer.
    pub fn as_int(&self) -> VoxResult<i64> {
        self.raw
            .trim()
            .parse::<i64>()
            .map_err(|e| VoxError::ValueConversion(format!("'{}' as integer: {e}", self.raw)))
    }

    /// Parse as a double. The entire string must be a valid number.
    pub fn as_double(&self) -> VoxResult<f64> {
        self.raw
            .trim()
            .parse::<f64>()
            .map_err(|e| VoxError::ValueConversion(format!("'{}' as double: {e}", self.raw)))
    }

    /// Parse as a boolean. Accepts true/false/yes/no/1/0, case-insensitive.
    pub fn as_bool(&self) -> VoxResult<bool> {
        match self.raw.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Ok(true),
            "false" | "no" | "0" => Ok(false),
            _ => Err(VoxError::ValueConversion(format!(
                "'{}' is not a boolean",
                self.raw
            ))),
        }
    }

    /// True when no value was extracted. Distinct from "0" or "false".
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}

impl From<&str> for ParamValue {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for ParamValue {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}
