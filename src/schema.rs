// (c) Copyright 2025 Helsing GmbH. All rights reserved.
//! # Model partitioning
//!
//! The meditor renders a model with two kinds of forms. Fields whose schema is
//! *basic* (a scalar, an enum, or an array of scalars or enum values) are
//! edited together in one flat form; every other field is *complex* (nested
//! objects, arrays of objects) and gets a dedicated editor. This module splits
//! a draft-7 JSON Schema into those two halves, filters models accordingly,
//! and writes edited sub-models back into the full model.
//!
//! Schemas are plain [`serde_json::Value`]s. A schema *definition* may be a
//! schema object, a boolean schema, or (for tuple-style `items`) an array of
//! definitions; only schema objects are ever classified as basic.
//!
//! ```
//! use meditor::schema::{compute_basic_schema, compute_complex_schema};
//! use serde_json::json;
//!
//! let schema = json!({
//!     "title": "Dandiset",
//!     "type": "object",
//!     "required": ["name", "contributor"],
//!     "properties": {
//!         "name": {"type": "string"},
//!         "keywords": {"type": "array", "items": {"type": "string"}},
//!         "contributor": {"type": "array", "items": {"type": "object", "properties": {}}},
//!     },
//! });
//!
//! let basic = compute_basic_schema(&schema);
//! assert_eq!(basic["required"], json!(["name"]));
//! assert!(basic.get("title").is_none());
//!
//! let complex = compute_complex_schema(&schema);
//! assert_eq!(complex["required"], json!(["contributor"]));
//! assert_eq!(complex["title"], "Dandiset");
//! ```

use crate::Model;
use serde_json::{Map, Value};

/// Type names that make a schema basic.
pub const BASIC_TYPES: [&str; 5] = ["number", "integer", "string", "boolean", "null"];

/// True for a single basic type name; a list of types is never basic.
pub fn is_basic_type(type_name: Option<&Value>) -> bool {
    type_name
        .and_then(Value::as_str)
        .is_some_and(|name| BASIC_TYPES.contains(&name))
}

/// True if the definition is a schema object rather than a boolean schema or a
/// list of definitions.
pub fn is_json_schema(schema: &Value) -> bool {
    schema.is_object()
}

fn type_is(schema: &Value, name: &str) -> bool {
    schema.get("type").and_then(Value::as_str) == Some(name)
}

pub fn is_basic_schema(schema: &Value) -> bool {
    is_json_schema(schema) && is_basic_type(schema.get("type"))
}

/// An `object` schema declaring its `properties`.
pub fn is_object_schema(schema: &Value) -> bool {
    is_json_schema(schema) && schema.get("properties").is_some() && type_is(schema, "object")
}

/// An `array` schema declaring its `items`.
pub fn is_array_schema(schema: &Value) -> bool {
    is_json_schema(schema) && schema.get("items").is_some() && type_is(schema, "array")
}

pub fn is_basic_array_schema(schema: &Value) -> bool {
    is_array_schema(schema) && schema.get("items").is_some_and(is_basic_schema)
}

pub fn is_enum(schema: &Value) -> bool {
    is_basic_schema(schema) && schema.get("enum").is_some()
}

pub fn is_array_enum(schema: &Value) -> bool {
    is_array_schema(schema)
        && schema
            .get("items")
            .and_then(|items| items.get("enum"))
            .is_some()
}

/// True if the field is edited in the flat, basic form.
pub fn is_basic_editor_schema(schema: &Value) -> bool {
    is_basic_schema(schema) || is_basic_array_schema(schema) || is_array_enum(schema)
}

/// True if the field needs a dedicated editor.
pub fn is_complex_editor_schema(schema: &Value) -> bool {
    !is_basic_editor_schema(schema)
}

/// True for a JSON object.
pub fn is_record(value: &Value) -> bool {
    value.is_object()
}

/// True for an array whose entries are all objects.
pub fn is_model_array(value: &Value) -> bool {
    value
        .as_array()
        .is_some_and(|entries| entries.iter().all(is_record))
}

/// True for a model or an array of models.
pub fn is_model_union(value: &Value) -> bool {
    is_record(value) || is_model_array(value)
}

/// Keeps the properties accepted by `keep`, narrowing `required` to them.
fn split_schema(schema: &Value, keep: fn(&Value) -> bool) -> Value {
    let mut split = schema.as_object().cloned().unwrap_or_default();

    let properties: Map<String, Value> = schema
        .get("properties")
        .and_then(Value::as_object)
        .map(|properties| {
            properties
                .iter()
                .filter(|(_, definition)| keep(definition))
                .map(|(key, definition)| (key.clone(), definition.clone()))
                .collect()
        })
        .unwrap_or_default();

    let required: Vec<Value> = schema
        .get("required")
        .and_then(Value::as_array)
        .map(|required| {
            required
                .iter()
                .filter(|key| key.as_str().is_some_and(|key| properties.contains_key(key)))
                .cloned()
                .collect()
        })
        .unwrap_or_default();

    split.insert("properties".into(), Value::Object(properties));
    split.insert("required".into(), Value::Array(required));
    Value::Object(split)
}

/// The schema of the basic sub-model.
///
/// `title` and `description` are dropped since the basic form is rendered
/// without a heading, and so is `$schema`, which validators reject on
/// sub-schemas.
pub fn compute_basic_schema(schema: &Value) -> Value {
    let mut basic = split_schema(schema, is_basic_editor_schema);
    if let Some(basic) = basic.as_object_mut() {
        basic.shift_remove("title");
        basic.shift_remove("description");
        basic.shift_remove("$schema");
    }
    basic
}

/// The schema of the complex sub-model.
///
/// Only `description` is dropped.
pub fn compute_complex_schema(schema: &Value) -> Value {
    let mut complex = split_schema(schema, is_complex_editor_schema);
    if let Some(complex) = complex.as_object_mut() {
        complex.shift_remove("description");
    }
    complex
}

/// Sets every array field of `model` that is missing or `null` to `[]`.
pub fn populate_empty_arrays(schema: &Value, model: &mut Model) {
    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return;
    };

    for (key, definition) in properties {
        if !is_array_schema(definition) {
            continue;
        }
        if matches!(model.get(key), None | Some(Value::Null)) {
            model.insert(key.clone(), Value::Array(Vec::new()));
        }
    }
}

/// A copy of `model` restricted to the properties declared by `schema`.
///
/// The result keeps the key order of `model`.
pub fn filter_model_with_schema(model: &Model, schema: &Value) -> Model {
    let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
        return Model::new();
    };

    model
        .iter()
        .filter(|(key, _)| properties.contains_key(*key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Copies every property declared by `sub_schema` from `sub_model` into
/// `master`.
///
/// Properties missing from `sub_model` are removed from `master`.
pub fn write_sub_model_to_master(sub_model: &Model, sub_schema: &Value, master: &mut Model) {
    let Some(properties) = sub_schema.get("properties").and_then(Value::as_object) else {
        return;
    };

    for key in properties.keys() {
        match sub_model.get(key) {
            Some(value) => {
                master.insert(key.clone(), value.clone());
            }
            None => {
                master.shift_remove(key);
            }
        }
    }
}
