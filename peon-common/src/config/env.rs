//! Environment variable parsing with type safety.
//!
//! Provides a type-safe parser for `PEON_*` environment variables that
//! collects every error so they can all be reported at once.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur during environment variable parsing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvError {
    /// Invalid value for a variable.
    #[error("Invalid value for {var}: expected {expected}, got '{value}'")]
    InvalidValue {
        var: String,
        expected: String,
        value: String,
    },

    /// Value out of valid range.
    #[error("Value out of range for {var}: {value} (valid: {min}..={max})")]
    OutOfRange {
        var: String,
        value: String,
        min: String,
        max: String,
    },

    /// Invalid log level.
    #[error("Invalid log level for {var}: {value}")]
    InvalidLogLevel { var: String, value: String },
}

type Lookup = Box<dyn Fn(&str) -> Option<String>>;

/// Type-safe environment variable parser.
///
/// Collects errors during parsing so all issues can be reported at once.
pub struct EnvParser {
    prefix: &'static str,
    lookup: Lookup,
    errors: Vec<EnvError>,
}

impl EnvParser {
    /// Create a parser over the process environment with the `PEON_` prefix.
    pub fn new() -> Self {
        Self::with_lookup(|name| env::var(name).ok())
    }

    /// Create a parser reading variables through `lookup` instead of the
    /// process environment.
    pub fn with_lookup(lookup: impl Fn(&str) -> Option<String> + 'static) -> Self {
        Self {
            prefix: "PEON_",
            lookup: Box::new(lookup),
            errors: Vec::new(),
        }
    }

    /// Get all accumulated errors.
    pub fn errors(&self) -> &[EnvError] {
        &self.errors
    }

    /// Check if any errors occurred.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Take ownership of errors.
    pub fn take_errors(&mut self) -> Vec<EnvError> {
        std::mem::take(&mut self.errors)
    }

    fn var_name(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }

    fn raw(&self, var_name: &str) -> Option<String> {
        (self.lookup)(var_name)
    }

    /// Get a string value with default.
    pub fn get_string(&mut self, name: &str, default: &str) -> String {
        let var_name = self.var_name(name);
        self.raw(&var_name).unwrap_or_else(|| default.to_string())
    }

    /// Get a boolean value with default.
    ///
    /// Accepts: 1, true, yes, on (for true)
    ///          0, false, no, off, "" (for false)
    pub fn get_bool(&mut self, name: &str, default: bool) -> bool {
        let var_name = self.var_name(name);
        match self.raw(&var_name) {
            Some(value) => match value.to_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" | "" => false,
                _ => {
                    self.errors.push(EnvError::InvalidValue {
                        var: var_name,
                        expected: "boolean (true/false/1/0/yes/no)".to_string(),
                        value,
                    });
                    default
                }
            },
            None => default,
        }
    }

    /// Get a u32 value with default and range validation.
    pub fn get_u32_range(&mut self, name: &str, default: u32, min: u32, max: u32) -> u32 {
        let var_name = self.var_name(name);
        match self.raw(&var_name) {
            Some(value) => match value.trim().parse::<u32>() {
                Ok(n) if n >= min && n <= max => n,
                Ok(n) => {
                    self.errors.push(EnvError::OutOfRange {
                        var: var_name,
                        value: n.to_string(),
                        min: min.to_string(),
                        max: max.to_string(),
                    });
                    default
                }
                Err(_) => {
                    self.errors.push(EnvError::InvalidValue {
                        var: var_name,
                        expected: "unsigned 32-bit integer".to_string(),
                        value,
                    });
                    default
                }
            },
            None => default,
        }
    }

    /// Get an optional path with `~` and `$VAR` expansion (None if unset or empty).
    pub fn get_optional_path(&mut self, name: &str) -> Option<PathBuf> {
        let var_name = self.var_name(name);
        match self.raw(&var_name) {
            Some(value) if value.trim().is_empty() => None,
            Some(value) => Some(expand_path(&value)),
            None => None,
        }
    }

    /// Get a value parsed with its `FromStr` implementation.
    pub fn get_parsed<T>(&mut self, name: &str, default: T, expected: &str) -> T
    where
        T: FromStr,
    {
        let var_name = self.var_name(name);
        match self.raw(&var_name) {
            Some(value) => match value.trim().parse::<T>() {
                Ok(parsed) => parsed,
                Err(_) => {
                    self.errors.push(EnvError::InvalidValue {
                        var: var_name,
                        expected: expected.to_string(),
                        value,
                    });
                    default
                }
            },
            None => default,
        }
    }

    /// Get a log level value with validation.
    pub fn get_log_level(&mut self, name: &str, default: &str) -> String {
        let var_name = self.var_name(name);
        match self.raw(&var_name) {
            Some(value) => {
                let lower = value.to_lowercase();
                match lower.as_str() {
                    "trace" | "debug" | "info" | "warn" | "error" | "off" => lower,
                    _ => {
                        self.errors.push(EnvError::InvalidLogLevel {
                            var: var_name,
                            value,
                        });
                        default.to_string()
                    }
                }
            }
            None => default.to_string(),
        }
    }
}

impl Default for EnvParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Expand `~` and environment variables in a user-supplied path.
pub fn expand_path(value: &str) -> PathBuf {
    match shellexpand::full(value) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(shellexpand::tilde(value).as_ref()),
    }
}
