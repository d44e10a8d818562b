use crate::ast::EnumValue;
use crate::types::{Type, TypeKind};
use serde::Serialize;
use std::collections::BTreeMap;

/// A generic serializable rendering of an instantiated type, for tooling
/// that wants machine-readable output rather than the in-memory model.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    String(String),
    Number(f64),
    Boolean(bool),
    Null,
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
}

fn object(kind: &str) -> BTreeMap<String, Value> {
    let mut map = BTreeMap::new();
    map.insert("kind".to_string(), Value::String(kind.to_string()));
    map
}

fn range_value(range: &crate::ast::Range) -> Value {
    Value::String(range.to_string())
}

pub(crate) fn to_value(ty: &Type) -> Value {
    let mut map = match &ty.kind {
        TypeKind::Any => object("any"),
        TypeKind::Unsafe => object("unsafe"),
        TypeKind::Boolean => object("boolean"),
        TypeKind::Error => object("error"),
        TypeKind::Bottom => {
            let mut map = object("union");
            map.insert("members".to_string(), Value::Array(Vec::new()));
            map
        }
        TypeKind::String { len_range } => {
            let mut map = object("string");
            if let Some(range) = len_range {
                map.insert("lengthRange".to_string(), range_value(range));
            }
            map
        }
        TypeKind::LiteralBool(b) => {
            let mut map = object("literal");
            map.insert("value".to_string(), Value::Boolean(*b));
            map
        }
        TypeKind::LiteralString(s) => {
            let mut map = object("literal");
            map.insert("value".to_string(), Value::String(s.clone()));
            map
        }
        TypeKind::LiteralNumber(n) => {
            let mut map = object("literal");
            map.insert("value".to_string(), Value::Number(n.value.as_f64()));
            map.insert(
                "numericKind".to_string(),
                Value::String(n.kind.as_str().to_string()),
            );
            map
        }
        TypeKind::Numeric { kind, value_range } => {
            let mut map = object(kind.as_str());
            if let Some(range) = value_range {
                map.insert("valueRange".to_string(), range_value(range));
            }
            map
        }
        TypeKind::PrimArray {
            kind,
            elem_range,
            len_range,
        } => {
            let mut map = object(&format!("{}_array", kind.elem_kind().as_str()));
            if let Some(range) = elem_range {
                map.insert("valueRange".to_string(), range_value(range));
            }
            if let Some(range) = len_range {
                map.insert("lengthRange".to_string(), range_value(range));
            }
            map
        }
        TypeKind::List { elem, len_range } => {
            let mut map = object("list");
            map.insert("element".to_string(), Value::String(elem.to_string()));
            if let Some(range) = len_range {
                map.insert("lengthRange".to_string(), range_value(range));
            }
            map
        }
        TypeKind::Tuple { elems } => {
            let mut map = object("tuple");
            map.insert(
                "elements".to_string(),
                Value::Array(elems.iter().map(|e| Value::String(e.to_string())).collect()),
            );
            map
        }
        TypeKind::Struct { fields } => {
            let mut map = object("struct");
            let rendered = fields
                .iter()
                .map(|field| {
                    let mut entry = BTreeMap::new();
                    entry.insert("key".to_string(), Value::String(field.key.to_string()));
                    entry.insert("optional".to_string(), Value::Boolean(field.optional));
                    entry.insert("type".to_string(), Value::String(field.ty.to_string()));
                    if let Some(doc) = &field.doc {
                        entry.insert("doc".to_string(), Value::String(doc.clone()));
                    }
                    Value::Object(entry)
                })
                .collect();
            map.insert("fields".to_string(), Value::Array(rendered));
            map
        }
        TypeKind::Enum { base, variants } => {
            let mut map = object("enum");
            map.insert(
                "base".to_string(),
                Value::String(base.as_str().to_string()),
            );
            let mut values = BTreeMap::new();
            for variant in variants {
                let value = match &variant.value {
                    EnumValue::Number(n) => Value::Number(n.value.as_f64()),
                    EnumValue::String(s) => Value::String(s.clone()),
                };
                values.insert(variant.name.clone(), value);
            }
            map.insert("values".to_string(), Value::Object(values));
            map
        }
        TypeKind::Union { members } => {
            let mut map = object("union");
            map.insert(
                "members".to_string(),
                Value::Array(members.iter().map(to_value).collect()),
            );
            map
        }
        TypeKind::Handle { key, .. } => {
            let mut map = object("reference");
            map.insert("target".to_string(), Value::String(key.clone()));
            map
        }
    };
    if !ty.attributes.is_empty() {
        map.insert(
            "attributes".to_string(),
            Value::Array(
                ty.attributes
                    .iter()
                    .map(|a| Value::String(a.to_string()))
                    .collect(),
            ),
        );
    }
    if !ty.shadowed.is_empty() {
        map.insert(
            "shadowedTypes".to_string(),
            Value::Array(ty.shadowed.iter().map(to_value).collect()),
        );
    }
    Value::Object(map)
}

impl Type {
    /// Renders the type as a generic serializable [`Value`]. Lazy container
    /// children appear as their printed source form.
    #[must_use]
    pub fn to_value(&self) -> Value {
        to_value(self)
    }

    /// Pretty-printed JSON rendering of [`Type::to_value`].
    ///
    /// # Errors
    /// Returns a `serde_json::Error` if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.to_value())
    }

    /// YAML rendering of [`Type::to_value`].
    ///
    /// # Errors
    /// Returns a `serde_yaml::Error` if serialization fails.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(&self.to_value())
    }
}
