//! core::options
//!
//! Typed, constrained conversion options.
//!
//! # Overview
//!
//! A transcoder declares, for each conversion it offers, a list of option
//! descriptors implementing [`BaseOption`]. Raw `name → string` pairs coming
//! from the command line are turned into typed [`OptionValue`]s with
//! [`parse_options`]; entries that no descriptor claims are ignored.
//!
//! # Descriptors
//!
//! - [`VectorOption`] - fixed-size, comma-separated numbers within `[min, max]`
//!   ([`IntVectorOption`], [`FloatOption`])
//! - [`StringOption`] - free text, optionally restricted to a set of choices
//! - [`ArrayOption`] - `;`-separated list of another descriptor's values; an
//!   "array option" expands into one output path per element
//!
//! # Example
//!
//! ```
//! use damn::core::options::{BaseOption, IntVectorOption, OptionValue};
//!
//! let color = IntVectorOption::new("color", "RGB color").with_range(0, 255);
//! assert_eq!(
//!     color.parse_from_string("1,2,3").unwrap(),
//!     OptionValue::List(vec![OptionValue::Int(1), OptionValue::Int(2), OptionValue::Int(3)])
//! );
//! assert!(color.parse_from_string("1,2").is_err());
//! assert!(color.parse_from_string("1,2,300").is_err());
//! ```

pub mod template;

pub use template::{
    asset_uuid, expand_path_template, options_to_template, PathTemplate, Segment,
};

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;

/// Errors from option parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionError {
    /// The raw string does not have the expected shape.
    #[error("cannot parse option '{name}': {message}")]
    Parse { name: String, message: String },

    /// The value parsed but violates the declared bound.
    #[error("option '{name}' out of bounds: {message}")]
    Constraint { name: String, message: String },
}

/// A parsed option value.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<OptionValue>),
}

impl OptionValue {
    /// Elements of a list value.
    pub fn as_list(&self) -> Option<&[OptionValue]> {
        match self {
            OptionValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            OptionValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Int(v) => write!(f, "{}", v),
            OptionValue::Float(v) => write!(f, "{}", v),
            OptionValue::Text(v) => write!(f, "{}", v),
            OptionValue::List(items) => {
                let joined = items
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join(",");
                write!(f, "{}", joined)
            }
        }
    }
}

/// Typed options keyed by option name.
pub type Options = BTreeMap<String, OptionValue>;

/// Shared handle to an option descriptor.
pub type OptionDescriptor = Arc<dyn BaseOption>;

/// Capability set of an option descriptor.
pub trait BaseOption: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Parse a raw command-line string into a typed value.
    ///
    /// # Errors
    ///
    /// - [`OptionError::Parse`] if the string is malformed
    /// - [`OptionError::Constraint`] if a value is out of bounds
    fn parse_from_string(&self, raw: &str) -> Result<OptionValue, OptionError>;

    /// Short type name, e.g. `int3` or `float`.
    fn type_description(&self) -> String;

    /// Human-readable bound, e.g. `Value needs to be between 0 and 255`.
    fn constraint_description(&self) -> String;

    /// Value used when the option is not given.
    fn default_value(&self) -> OptionValue;

    fn default_description(&self) -> String {
        self.default_value().to_string()
    }

    /// Whether each element of this option's value yields its own output path.
    fn is_array(&self) -> bool {
        false
    }
}

/// Numeric element type of a [`VectorOption`].
pub trait VectorElement:
    Copy + PartialOrd + fmt::Display + fmt::Debug + FromStr + Send + Sync + 'static
{
    const TYPE_NAME: &'static str;
    const DEFAULT_SIZE: usize;
    const ZERO: Self;
    const MIN: Self;
    const MAX: Self;

    fn into_value(self) -> OptionValue;
}

impl VectorElement for i64 {
    const TYPE_NAME: &'static str = "int";
    const DEFAULT_SIZE: usize = 3;
    const ZERO: Self = 0;
    const MIN: Self = i64::MIN;
    const MAX: Self = i64::MAX;

    fn into_value(self) -> OptionValue {
        OptionValue::Int(self)
    }
}

impl VectorElement for f64 {
    const TYPE_NAME: &'static str = "float";
    const DEFAULT_SIZE: usize = 1;
    const ZERO: Self = 0.0;
    const MIN: Self = f64::MIN;
    const MAX: Self = f64::MAX;

    fn into_value(self) -> OptionValue {
        OptionValue::Float(self)
    }
}

/// A fixed-size vector of numbers, written `a,b,c`.
///
/// Parses to a scalar when `size == 1`, otherwise to a list of `size`
/// elements.
#[derive(Debug, Clone)]
pub struct VectorOption<T: VectorElement> {
    name: String,
    description: String,
    default: Vec<T>,
    min: T,
    max: T,
    size: usize,
}

/// Integer vector, three elements over the full `i64` range by default.
pub type IntVectorOption = VectorOption<i64>;

/// Single float over the full `f64` range.
pub type FloatOption = VectorOption<f64>;

impl<T: VectorElement> VectorOption<T> {
    /// Create a descriptor with the element type's default size and full range.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            default: vec![T::ZERO; T::DEFAULT_SIZE],
            min: T::MIN,
            max: T::MAX,
            size: T::DEFAULT_SIZE,
        }
    }

    /// Set the element count; resets the default to zeros.
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = size;
        self.default = vec![T::ZERO; size];
        self
    }

    /// Set the inclusive bounds applied to every element.
    pub fn with_range(mut self, min: T, max: T) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Set the default elements.
    pub fn with_default(mut self, default: Vec<T>) -> Self {
        self.default = default;
        self
    }

    pub fn size(&self) -> usize {
        self.size
    }

    fn to_value(&self, mut elements: Vec<T>) -> OptionValue {
        if self.size == 1 && elements.len() == 1 {
            return elements.remove(0).into_value();
        }
        OptionValue::List(elements.into_iter().map(T::into_value).collect())
    }
}

impl<T: VectorElement> BaseOption for VectorOption<T> {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parse_from_string(&self, raw: &str) -> Result<OptionValue, OptionError> {
        let splits: Vec<&str> = raw.split(',').collect();
        if splits.len() != self.size {
            return Err(OptionError::Parse {
                name: self.name.clone(),
                message: format!("'{}' not of size {}", raw, self.size),
            });
        }

        let mut elements = Vec::with_capacity(self.size);
        for split in splits {
            let value: T = split.trim().parse().map_err(|_| OptionError::Parse {
                name: self.name.clone(),
                message: format!("'{}' is not a valid {}", split.trim(), T::TYPE_NAME),
            })?;
            // Written so that NaN fails the check.
            if !(value >= self.min && value <= self.max) {
                return Err(OptionError::Constraint {
                    name: self.name.clone(),
                    message: format!("{} <= {} <= {} failed", self.min, value, self.max),
                });
            }
            elements.push(value);
        }

        Ok(self.to_value(elements))
    }

    fn type_description(&self) -> String {
        if self.size > 1 {
            format!("{}{}", T::TYPE_NAME, self.size)
        } else {
            T::TYPE_NAME.to_string()
        }
    }

    fn constraint_description(&self) -> String {
        format!("Value needs to be between {} and {}", self.min, self.max)
    }

    fn default_value(&self) -> OptionValue {
        self.to_value(self.default.clone())
    }
}

/// Free text, optionally restricted to a fixed set of choices.
#[derive(Debug, Clone)]
pub struct StringOption {
    name: String,
    description: String,
    default: String,
    choices: Vec<String>,
}

impl StringOption {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            default: String::new(),
            choices: Vec::new(),
        }
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = default.into();
        self
    }

    pub fn with_choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }
}

impl BaseOption for StringOption {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parse_from_string(&self, raw: &str) -> Result<OptionValue, OptionError> {
        if !self.choices.is_empty() && !self.choices.iter().any(|c| c == raw) {
            return Err(OptionError::Constraint {
                name: self.name.clone(),
                message: format!("'{}' is not one of: {}", raw, self.choices.join(", ")),
            });
        }
        Ok(OptionValue::Text(raw.to_string()))
    }

    fn type_description(&self) -> String {
        "string".to_string()
    }

    fn constraint_description(&self) -> String {
        if self.choices.is_empty() {
            "Any text".to_string()
        } else {
            format!("One of: {}", self.choices.join(", "))
        }
    }

    fn default_value(&self) -> OptionValue {
        OptionValue::Text(self.default.clone())
    }
}

/// A `;`-separated list of values of another descriptor.
///
/// Array options drive path expansion: each element produces its own output
/// path.
#[derive(Debug, Clone)]
pub struct ArrayOption {
    element: OptionDescriptor,
}

impl ArrayOption {
    /// Wrap `element`; name and description are taken from it.
    pub fn new(element: OptionDescriptor) -> Self {
        Self { element }
    }
}

impl BaseOption for ArrayOption {
    fn name(&self) -> &str {
        self.element.name()
    }

    fn description(&self) -> &str {
        self.element.description()
    }

    fn parse_from_string(&self, raw: &str) -> Result<OptionValue, OptionError> {
        if raw.is_empty() {
            return Err(OptionError::Parse {
                name: self.name().to_string(),
                message: "empty list".to_string(),
            });
        }
        let items = raw
            .split(';')
            .map(|item| self.element.parse_from_string(item))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(OptionValue::List(items))
    }

    fn type_description(&self) -> String {
        format!("list of {}", self.element.type_description())
    }

    fn constraint_description(&self) -> String {
        self.element.constraint_description()
    }

    fn default_value(&self) -> OptionValue {
        OptionValue::List(vec![self.element.default_value()])
    }

    fn is_array(&self) -> bool {
        true
    }
}

/// Parse raw `name → string` pairs with the matching descriptors.
///
/// Raw entries without a descriptor are ignored; descriptors without a raw
/// entry are left out of the result.
pub fn parse_options(
    descriptors: &[OptionDescriptor],
    raw: &BTreeMap<String, String>,
) -> Result<Options, OptionError> {
    let mut parsed = Options::new();
    for (name, value) in raw {
        match descriptors.iter().find(|d| d.name() == name) {
            Some(descriptor) => {
                parsed.insert(name.clone(), descriptor.parse_from_string(value)?);
            }
            None => tracing::debug!(option = %name, "ignoring undeclared option"),
        }
    }
    Ok(parsed)
}

/// Fill in default values for descriptors missing from `parsed`.
pub fn with_defaults(descriptors: &[OptionDescriptor], mut parsed: Options) -> Options {
    for descriptor in descriptors {
        parsed
            .entry(descriptor.name().to_string())
            .or_insert_with(|| descriptor.default_value());
    }
    parsed
}
