//! Scalar variables available to templates
//!
//! Variables come from three places: the `[special_variables]` table of the
//! template file, the calendar date of the run, and the module and output
//! file currently being generated.

use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::Deserialize;

/// A scalar variable value
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// TOML date, time or date-time
    Datetime(toml::value::Datetime),
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(x) => write!(f, "{}", x),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Datetime(dt) => write_datetime(f, dt),
        }
    }
}

/// `YYYY-MM-DD HH:MM:SS[.ffffff][+HH:MM]`, any part may be absent
fn write_datetime(f: &mut fmt::Formatter<'_>, dt: &toml::value::Datetime) -> fmt::Result {
    use toml::value::Offset;

    if let Some(date) = &dt.date {
        write!(f, "{:04}-{:02}-{:02}", date.year, date.month, date.day)?;
        if dt.time.is_some() {
            f.write_str(" ")?;
        }
    }
    if let Some(time) = &dt.time {
        write!(f, "{:02}:{:02}:{:02}", time.hour, time.minute, time.second)?;
        let micros = time.nanosecond / 1_000;
        if micros != 0 {
            write!(f, ".{:06}", micros)?;
        }
    }
    match dt.offset {
        Some(Offset::Z) => f.write_str("+00:00"),
        Some(Offset::Custom { minutes }) => {
            let sign = if minutes < 0 { '-' } else { '+' };
            let minutes = minutes.unsigned_abs();
            write!(f, "{}{:02}:{:02}", sign, minutes / 60, minutes % 60)
        }
        None => Ok(()),
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

/// Anything placeholders can be looked up in
pub trait Bindings {
    fn binding(&self, name: &str) -> Option<Cow<'_, str>>;
}

impl Bindings for HashMap<String, String> {
    fn binding(&self, name: &str) -> Option<Cow<'_, str>> {
        self.get(name).map(|s| Cow::Borrowed(s.as_str()))
    }
}

impl Bindings for BTreeMap<String, String> {
    fn binding(&self, name: &str) -> Option<Cow<'_, str>> {
        self.get(name).map(|s| Cow::Borrowed(s.as_str()))
    }
}

/// Flat name -> scalar mapping
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Variables {
    values: BTreeMap<String, Value>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    /// Builder form of [`Variables::insert`]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Copy every entry of `other` into `self`, overwriting existing names
    pub fn extend(&mut self, other: &Variables) {
        for (name, value) in &other.values {
            self.values.insert(name.clone(), value.clone());
        }
    }

    /// A fresh copy with `module_name` rebound
    pub fn with_module(&self, module_name: &str) -> Self {
        self.clone().with("module_name", module_name)
    }
}

impl Bindings for Variables {
    fn binding(&self, name: &str) -> Option<Cow<'_, str>> {
        self.values.get(name).map(|v| match v {
            Value::Str(s) => Cow::Borrowed(s.as_str()),
            other => Cow::Owned(other.to_string()),
        })
    }
}

/// Calendar variables for the given day (weeks start on Monday)
pub fn date_variables(date: NaiveDate) -> Variables {
    Variables::new()
        .with("day", date.day())
        .with("day_abbr", date.format("%a").to_string())
        .with("day_name", date.format("%A").to_string())
        .with("month", date.month())
        .with("month_abbr", date.format("%b").to_string())
        .with("month_name", date.format("%B").to_string())
        .with("year", date.year())
        .with("date", date.format("%Y/%m/%d").to_string())
}

/// Variables describing one output file
pub fn file_variables(module_name: &str, base_name: &str, ext: &str) -> Variables {
    Variables::new()
        .with("module_name", module_name)
        .with("file_name", format!("{}{}", base_name, ext))
        .with("ext", ext)
        .with("base_name", base_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_display() {
        assert_eq!(Value::from("x").to_string(), "x");
        assert_eq!(Value::from(42i64).to_string(), "42");
        assert_eq!(Value::from(1.5).to_string(), "1.5");
        assert_eq!(Value::from(true).to_string(), "true");
    }

    #[test]
    fn test_date_variables() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).expect("valid date");
        let vars = date_variables(date);
        assert_eq!(vars.binding("day").as_deref(), Some("5"));
        assert_eq!(vars.binding("day_abbr").as_deref(), Some("Tue"));
        assert_eq!(vars.binding("day_name").as_deref(), Some("Tuesday"));
        assert_eq!(vars.binding("month").as_deref(), Some("3"));
        assert_eq!(vars.binding("month_abbr").as_deref(), Some("Mar"));
        assert_eq!(vars.binding("month_name").as_deref(), Some("March"));
        assert_eq!(vars.binding("year").as_deref(), Some("2024"));
        assert_eq!(vars.binding("date").as_deref(), Some("2024/03/05"));
    }

    #[test]
    fn test_with_module_does_not_touch_original() {
        let base = Variables::new().with("author", "me");
        let foo = base.with_module("foo");
        let bar = base.with_module("bar");
        assert!(!base.contains("module_name"));
        assert_eq!(foo.binding("module_name").as_deref(), Some("foo"));
        assert_eq!(bar.binding("module_name").as_deref(), Some("bar"));
        assert_eq!(bar.binding("author").as_deref(), Some("me"));
    }

    #[test]
    fn test_file_variables() {
        let vars = file_variables("uart", "uart_driver", ".c");
        assert_eq!(vars.binding("file_name").as_deref(), Some("uart_driver.c"));
        assert_eq!(vars.binding("base_name").as_deref(), Some("uart_driver"));
        assert_eq!(vars.binding("ext").as_deref(), Some(".c"));
        assert_eq!(vars.binding("module_name").as_deref(), Some("uart"));
    }

    #[test]
    fn test_deserialize_scalars_from_toml() {
        #[derive(Deserialize)]
        struct Doc {
            vars: Variables,
        }
        let doc: Doc = toml::from_str(
            r#"
[vars]
author = "Ada"
revision = 3
ratio = 0.5
draft = false
"#,
        )
        .expect("Should parse");
        assert_eq!(doc.vars.get("author"), Some(&Value::from("Ada")));
        assert_eq!(doc.vars.get("revision"), Some(&Value::Int(3)));
        assert_eq!(doc.vars.get("ratio"), Some(&Value::Float(0.5)));
        assert_eq!(doc.vars.get("draft"), Some(&Value::Bool(false)));
    }

    #[test]
    fn test_datetimes_from_toml() {
        #[derive(Deserialize)]
        struct Doc {
            vars: Variables,
        }
        let doc: Doc = toml::from_str(
            r#"
[vars]
released = 1979-05-27
alarm = 07:32:00.5
local = 1979-05-27T07:32:00
pacific = 1979-05-27T07:32:00-08:00
utc = 1979-05-27T07:32:00Z
"#,
        )
        .expect("Should parse");
        let text = |name: &str| doc.vars.binding(name).map(|v| v.into_owned());
        assert_eq!(text("released").as_deref(), Some("1979-05-27"));
        assert_eq!(text("alarm").as_deref(), Some("07:32:00.500000"));
        assert_eq!(text("local").as_deref(), Some("1979-05-27 07:32:00"));
        assert_eq!(text("pacific").as_deref(), Some("1979-05-27 07:32:00-08:00"));
        assert_eq!(text("utc").as_deref(), Some("1979-05-27 07:32:00+00:00"));
    }
}
