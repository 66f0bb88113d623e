//! Converter options.

use crate::backend::AcceptanceLevel;
use crate::constraints::ConKind;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Errors raised while setting options by name.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionError {
    UnknownOption { name: String },
    InvalidValue { name: String, value: String },
}

impl OptionError {
    /// Returns a semantic error code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            OptionError::UnknownOption { .. } => "OPTION_UNKNOWN",
            OptionError::InvalidValue { .. } => "OPTION_INVALID_VALUE",
        }
    }
}

impl std::fmt::Display for OptionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionError::UnknownOption { name } => {
                write!(f, "[{}] Unknown option '{}'", self.code(), name)
            }
            OptionError::InvalidValue { name, value } => write!(
                f,
                "[{}] Invalid value '{}' for option '{}'",
                self.code(),
                value,
                name
            ),
        }
    }
}

impl std::error::Error for OptionError {}

/// Options controlling preprocessing, relaxation, export and acceptance.
#[derive(Debug, Clone)]
pub struct ConverterOptions {
    /// `cvt:pre:all`: master preprocessing switch.
    pub preprocess: bool,
    /// `cvt:pre:eqresult`: fix results of decided reified equalities.
    pub pre_eq_result: bool,
    /// `cvt:pre:eqbinary`: rewrite reified `b == 0/1` on binaries.
    pub pre_eq_binary: bool,
    /// `alg:relax`: push every variable as continuous.
    pub relax: bool,
    /// `tech:writegraph`: JSON-lines link graph destination.
    pub write_graph: Option<PathBuf>,
    /// `acc:<kind>`: acceptance overrides.
    pub acceptance: BTreeMap<ConKind, AcceptanceLevel>,
}

impl Default for ConverterOptions {
    fn default() -> Self {
        Self {
            preprocess: true,
            pre_eq_result: true,
            pre_eq_binary: true,
            relax: false,
            write_graph: None,
            acceptance: BTreeMap::new(),
        }
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool, OptionError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(OptionError::InvalidValue {
            name: name.to_string(),
            value: value.to_string(),
        }),
    }
}

impl ConverterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_preprocess(mut self, enabled: bool) -> Self {
        self.preprocess = enabled;
        self
    }

    pub fn with_pre_eq_result(mut self, enabled: bool) -> Self {
        self.pre_eq_result = enabled;
        self
    }

    pub fn with_pre_eq_binary(mut self, enabled: bool) -> Self {
        self.pre_eq_binary = enabled;
        self
    }

    pub fn with_relax(mut self, enabled: bool) -> Self {
        self.relax = enabled;
        self
    }

    pub fn with_write_graph(mut self, path: impl Into<PathBuf>) -> Self {
        self.write_graph = Some(path.into());
        self
    }

    pub fn with_acceptance(mut self, kind: ConKind, level: AcceptanceLevel) -> Self {
        self.acceptance.insert(kind, level);
        self
    }

    pub fn eq_result_enabled(&self) -> bool {
        self.preprocess && self.pre_eq_result
    }

    pub fn eq_binary_enabled(&self) -> bool {
        self.preprocess && self.pre_eq_binary
    }

    pub fn acceptance_override(&self, kind: ConKind) -> Option<AcceptanceLevel> {
        self.acceptance.get(&kind).copied()
    }

    /// Set an option by its string name.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), OptionError> {
        match name {
            "cvt:pre:all" => self.preprocess = parse_bool(name, value)?,
            "cvt:pre:eqresult" => self.pre_eq_result = parse_bool(name, value)?,
            "cvt:pre:eqbinary" => self.pre_eq_binary = parse_bool(name, value)?,
            "alg:relax" | "relax" => self.relax = parse_bool(name, value)?,
            "tech:writegraph" | "writegraph" | "exportgraph" => {
                self.write_graph = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
            _ => {
                let Some(kind) = ConKind::from_option_name(name) else {
                    return Err(OptionError::UnknownOption {
                        name: name.to_string(),
                    });
                };
                let level = value
                    .trim()
                    .parse::<i64>()
                    .ok()
                    .and_then(AcceptanceLevel::from_option_value)
                    .ok_or_else(|| OptionError::InvalidValue {
                        name: name.to_string(),
                        value: value.to_string(),
                    })?;
                self.acceptance.insert(kind, level);
            }
        }
        Ok(())
    }
}
