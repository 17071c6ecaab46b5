//! Unit conversion functions exposed through the plugin registry

use std::collections::HashMap;
use unitkit_plugin::prelude::*;

use crate::convert::convert_with_decimals;
use crate::helpers::{extract_text, require_args};
use crate::registry::{Category, RegistryError, REGISTRY};
use crate::ConversionError;

fn registry_error(e: RegistryError) -> Value {
    Value::Error(UnitError::from(ConversionError::from(e)))
}

fn category_to_value(category: &Category) -> Value {
    let mut obj = HashMap::new();
    obj.insert("id".to_string(), Value::Text(category.id.to_string()));
    obj.insert("name".to_string(), Value::Text(category.name.to_string()));
    obj.insert("base_unit".to_string(), Value::Text(category.base_unit.to_string()));
    Value::Object(obj)
}

// ============ convert ============

pub struct Convert;

static CONVERT_ARGS: [ArgMeta; 4] = [
    ArgMeta::required("value", "Number", "Value to convert (Number or numeric Text)"),
    ArgMeta::required("category", "Text", "Category id (e.g., \"length\")"),
    ArgMeta::required("from_unit", "Text", "Source unit code (e.g., \"m\")"),
    ArgMeta::required("to_unit", "Text", "Target unit code (e.g., \"km\")"),
];

static CONVERT_EXAMPLES: [&str; 3] = [
    "convert(1000, \"length\", \"m\", \"km\") → {toValue: 1}",
    "convert(0, \"temperature\", \"c\", \"f\") → {toValue: 32}",
    "convert(1, \"weight\", \"kg\", \"lb\") → {toValue: 2.20462}",
];

static CONVERT_RELATED: [&str; 3] = ["categories", "units", "default_units"];

impl FunctionPlugin for Convert {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "convert",
            description: "Convert a value between two units of the same category",
            usage: "convert(value, category, from_unit, to_unit)",
            args: &CONVERT_ARGS,
            returns: "Object {category, fromUnit, toUnit, fromValue, toValue, fromUnitName, toUnitName}",
            examples: &CONVERT_EXAMPLES,
            category: "units",
            related: &CONVERT_RELATED,
        }
    }

    fn call(&self, args: &[Value], ctx: &EvalContext) -> Value {
        if let Err(e) = require_args(args, 4, "convert") {
            return Value::Error(e);
        }

        let category = match extract_text(&args[1], "convert", "category") {
            Ok(s) => s,
            Err(e) => return Value::Error(e),
        };
        let from_unit = match extract_text(&args[2], "convert", "from_unit") {
            Ok(s) => s,
            Err(e) => return Value::Error(e),
        };
        let to_unit = match extract_text(&args[3], "convert", "to_unit") {
            Ok(s) => s,
            Err(e) => return Value::Error(e),
        };

        match convert_with_decimals(&category, &from_unit, &to_unit, &args[0], ctx.decimals) {
            Ok(result) => result.to_value(),
            Err(e) => Value::Error(e.into()),
        }
    }
}

// ============ categories ============

pub struct Categories;

static CATEGORIES_EXAMPLES: [&str; 1] = [
    "categories() → [{id: \"length\", name: \"Length\", base_unit: \"m\"}, ...]",
];

static CATEGORIES_RELATED: [&str; 2] = ["units", "convert"];

impl FunctionPlugin for Categories {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "categories",
            description: "List measurement categories in declaration order",
            usage: "categories()",
            args: &[],
            returns: "List of Object {id, name, base_unit}",
            examples: &CATEGORIES_EXAMPLES,
            category: "units",
            related: &CATEGORIES_RELATED,
        }
    }

    fn call(&self, _args: &[Value], _ctx: &EvalContext) -> Value {
        Value::List(REGISTRY.categories().iter().map(category_to_value).collect())
    }
}

// ============ units ============

pub struct Units;

static UNITS_ARGS: [ArgMeta; 1] = [
    ArgMeta::required("category", "Text", "Category id"),
];

static UNITS_EXAMPLES: [&str; 1] = [
    "units(\"temperature\") → [{code: \"c\", name: \"Celsius\"}, ...]",
];

static UNITS_RELATED: [&str; 2] = ["categories", "default_units"];

impl FunctionPlugin for Units {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "units",
            description: "List the units of a category in declaration order",
            usage: "units(category)",
            args: &UNITS_ARGS,
            returns: "List of Object {code, name}",
            examples: &UNITS_EXAMPLES,
            category: "units",
            related: &UNITS_RELATED,
        }
    }

    fn call(&self, args: &[Value], _ctx: &EvalContext) -> Value {
        if let Err(e) = require_args(args, 1, "units") {
            return Value::Error(e);
        }
        let category = match extract_text(&args[0], "units", "category") {
            Ok(s) => s,
            Err(e) => return Value::Error(e),
        };

        match REGISTRY.get_category(&category) {
            Ok(cat) => Value::List(cat.units.iter().map(|u| {
                let mut obj = HashMap::new();
                obj.insert("code".to_string(), Value::Text(u.code.to_string()));
                obj.insert("name".to_string(), Value::Text(u.name.to_string()));
                Value::Object(obj)
            }).collect()),
            Err(e) => registry_error(e),
        }
    }
}

// ============ default_units ============

pub struct DefaultUnits;

static DEFAULT_UNITS_ARGS: [ArgMeta; 1] = [
    ArgMeta::required("category", "Text", "Category id"),
];

static DEFAULT_UNITS_EXAMPLES: [&str; 1] = [
    "default_units(\"length\") → {from_unit: \"km\", to_unit: \"m\"}",
];

static DEFAULT_UNITS_RELATED: [&str; 1] = ["units"];

impl FunctionPlugin for DefaultUnits {
    fn meta(&self) -> FunctionMeta {
        FunctionMeta {
            name: "default_units",
            description: "The first two units of a category, used when it is newly selected",
            usage: "default_units(category)",
            args: &DEFAULT_UNITS_ARGS,
            returns: "Object {from_unit, to_unit}",
            examples: &DEFAULT_UNITS_EXAMPLES,
            category: "units",
            related: &DEFAULT_UNITS_RELATED,
        }
    }

    fn call(&self, args: &[Value], _ctx: &EvalContext) -> Value {
        if let Err(e) = require_args(args, 1, "default_units") {
            return Value::Error(e);
        }
        let category = match extract_text(&args[0], "default_units", "category") {
            Ok(s) => s,
            Err(e) => return Value::Error(e),
        };

        match REGISTRY.default_pair(&category) {
            Ok((from, to)) => {
                let mut obj = HashMap::new();
                obj.insert("from_unit".to_string(), Value::Text(from.to_string()));
                obj.insert("to_unit".to_string(), Value::Text(to.to_string()));
                Value::Object(obj)
            }
            Err(e) => registry_error(e),
        }
    }
}
