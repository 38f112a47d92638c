//! Bundled setters for [`Target`] objects.

use crate::callbacks::Setter;
use crate::definition::PropertyConfig;
use crate::error::{CallbackError, CallbackResult};
use crate::target::Target;
use crate::value::{Value, ValueKind};

/// Write the value unchanged.
pub fn set_prop(target: &mut dyn Target, name: &str, value: Value, _prop: &PropertyConfig) -> CallbackResult<()> {
    target.set_property(name, value)
}

/// Write `"{value}{unit}"` as text; no unit writes the value's text form.
pub fn set_prop_unit(target: &mut dyn Target, name: &str, value: Value, prop: &PropertyConfig) -> CallbackResult<()> {
    let unit = prop.unit.as_deref().unwrap_or("");
    target.set_property(name, Value::Text(format!("{value}{unit}")))
}

/// Round half up, then append the unit when one is configured.
pub fn set_prop_round(target: &mut dyn Target, name: &str, value: Value, prop: &PropertyConfig) -> CallbackResult<()> {
    let n = value.as_number().ok_or(CallbackError::ValueKind {
        expected: ValueKind::Number,
        actual: value.kind(),
    })?;
    let rounded = (n + 0.5).floor();
    let out = match prop.unit.as_deref() {
        Some(unit) => Value::Text(format!("{}{unit}", Value::Number(rounded))),
        None => Value::Number(rounded),
    };
    target.set_property(name, out)
}

pub fn prop() -> Setter {
    Setter::new(set_prop)
}

pub fn prop_unit() -> Setter {
    Setter::new(set_prop_unit)
}

pub fn prop_round() -> Setter {
    Setter::new(set_prop_round)
}
