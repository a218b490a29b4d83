//! Declared task parameters and their validation.

use crate::TaskError;
use alloy_primitives::{Address, TxHash};
use std::{collections::BTreeMap, fmt};

/// Raw parameter values as supplied by the operator, keyed by name.
pub type TaskArgs = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Int,
    String,
    Bool,
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Int => "int",
            Self::String => "string",
            Self::Bool => "boolean",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Int(u64),
    String(String),
    Bool(bool),
}

/// A parameter a task declares.
///
/// Defaults are written in the same textual form an operator would pass, and
/// go through the same parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskParameter {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: ParamType,
    pub default: Option<&'static str>,
    pub optional: bool,
}

impl TaskParameter {
    fn parse(&self, raw: &str) -> Result<ParamValue, TaskError> {
        let raw = raw.trim();
        let invalid = |reason: String| TaskError::InvalidParameter {
            name: self.name.to_string(),
            reason,
        };

        match self.kind {
            ParamType::Int => raw
                .replace('_', "")
                .parse::<u64>()
                .map(ParamValue::Int)
                .map_err(|e| invalid(format!("expected an unsigned integer, got `{raw}`: {e}"))),
            ParamType::Bool => match raw.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" => Ok(ParamValue::Bool(true)),
                "false" | "0" | "no" => Ok(ParamValue::Bool(false)),
                _ => Err(invalid(format!("expected a boolean, got `{raw}`"))),
            },
            ParamType::String => Ok(ParamValue::String(raw.to_string())),
        }
    }
}

impl fmt::Display for TaskParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.kind)?;
        match (self.optional, self.default) {
            (_, Some(default)) => write!(f, " [default: {default}]")?,
            (true, None) => f.write_str(" [optional]")?,
            (false, None) => f.write_str(" [required]")?,
        }
        write!(f, "  {}", self.description)
    }
}

/// Parameter values after validation.
#[derive(Debug, Clone, Default)]
pub struct ResolvedParams {
    values: BTreeMap<&'static str, ParamValue>,
}

/// Check `args` against `declared`.
///
/// Supplied values are parsed to their declared type, missing ones fall back
/// to the default. A parameter without value or default is an error unless it
/// is optional. Names that are not declared are rejected.
pub fn validate(declared: &[TaskParameter], args: &TaskArgs) -> Result<ResolvedParams, TaskError> {
    if let Some(unknown) = args
        .keys()
        .find(|name| !declared.iter().any(|p| p.name == name.as_str()))
    {
        return Err(TaskError::InvalidParameter {
            name: unknown.clone(),
            reason: "not a parameter of this task".to_string(),
        });
    }

    let mut values = BTreeMap::new();
    for param in declared {
        let raw = args.get(param.name).map(String::as_str).or(param.default);
        match raw {
            Some(raw) => {
                values.insert(param.name, param.parse(raw)?);
            }
            None if param.optional => {}
            None => {
                return Err(TaskError::MissingRequiredParameter {
                    name: param.name.to_string(),
                })
            }
        }
    }

    Ok(ResolvedParams { values })
}

impl ResolvedParams {
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.values.get(name)
    }

    pub fn int(&self, name: &str) -> Result<Option<u64>, TaskError> {
        match self.get(name) {
            None => Ok(None),
            Some(ParamValue::Int(v)) => Ok(Some(*v)),
            Some(other) => Err(type_mismatch(name, ParamType::Int, other)),
        }
    }

    pub fn bool(&self, name: &str) -> Result<Option<bool>, TaskError> {
        match self.get(name) {
            None => Ok(None),
            Some(ParamValue::Bool(v)) => Ok(Some(*v)),
            Some(other) => Err(type_mismatch(name, ParamType::Bool, other)),
        }
    }

    pub fn string(&self, name: &str) -> Result<Option<&str>, TaskError> {
        match self.get(name) {
            None => Ok(None),
            Some(ParamValue::String(v)) => Ok(Some(v)),
            Some(other) => Err(type_mismatch(name, ParamType::String, other)),
        }
    }

    pub fn require_int(&self, name: &str) -> Result<u64, TaskError> {
        self.int(name)?.ok_or_else(|| missing(name))
    }

    pub fn require_bool(&self, name: &str) -> Result<bool, TaskError> {
        self.bool(name)?.ok_or_else(|| missing(name))
    }

    /// A string parameter holding an address.
    pub fn address(&self, name: &str) -> Result<Option<Address>, TaskError> {
        self.string(name)?
            .map(|raw| {
                raw.parse().map_err(|e| TaskError::InvalidParameter {
                    name: name.to_string(),
                    reason: format!("not an address: {e}"),
                })
            })
            .transpose()
    }

    /// A string parameter holding a transaction hash.
    pub fn tx_hash(&self, name: &str) -> Result<Option<TxHash>, TaskError> {
        self.string(name)?
            .map(|raw| {
                raw.parse().map_err(|e| TaskError::InvalidParameter {
                    name: name.to_string(),
                    reason: format!("not a transaction hash: {e}"),
                })
            })
            .transpose()
    }
}

fn missing(name: &str) -> TaskError {
    TaskError::MissingRequiredParameter {
        name: name.to_string(),
    }
}

fn type_mismatch(name: &str, expected: ParamType, got: &ParamValue) -> TaskError {
    TaskError::InvalidParameter {
        name: name.to_string(),
        reason: format!("declared as {expected}, holds {got:?}"),
    }
}
