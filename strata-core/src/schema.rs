//! Per-type field registries.
//!
//! An [`EntitySchema`] is built once per entity type (typically in a
//! `once_cell` static) and holds the ordered field table: logical name,
//! optional storage column name, declared kind, and accessor functions.
//! All runtime predicate and sort construction resolves against this
//! registry instead of reflecting per call.

use std::collections::HashMap;

use crate::error::SchemaError;
use crate::value::{FieldKind, FieldValue};

/// Reads one field of an entity as a tagged value.
pub type Getter<T> = fn(&T) -> FieldValue;

/// Writes one field of an entity from an already-coerced value.
/// Returns `false` when the value variant does not match the field.
pub type Setter<T> = fn(&mut T, FieldValue) -> bool;

/// One field in an entity's registry.
#[derive(Debug)]
pub struct FieldDef<T> {
    name: &'static str,
    column: Option<&'static str>,
    kind: FieldKind,
    get: Getter<T>,
    set: Option<Setter<T>>,
}

impl<T> FieldDef<T> {
    /// Logical (property) name, e.g. `UserName`.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Storage column name, when it differs from the logical name.
    pub fn column(&self) -> Option<&'static str> {
        self.column
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Read this field from an entity.
    pub fn value_of(&self, entity: &T) -> FieldValue {
        (self.get)(entity)
    }

    /// Coerce and assign a value to this field.
    ///
    /// Returns `Ok(false)` for fields without a setter (identity and audit
    /// fields stay read-only by not registering one).
    pub fn assign(&self, entity: &mut T, value: FieldValue) -> Result<bool, SchemaError> {
        let Some(set) = self.set else {
            return Ok(false);
        };
        let coerced = value.coerce(self.kind)?;
        let display = coerced.to_string();
        if set(entity, coerced) {
            Ok(true)
        } else {
            Err(SchemaError::Coerce {
                kind: self.kind,
                value: display,
            })
        }
    }
}

/// Ordered field registry for one entity type.
pub struct EntitySchema<T> {
    type_name: &'static str,
    fields: Vec<FieldDef<T>>,
    by_name: HashMap<&'static str, usize>,
    by_column: HashMap<&'static str, usize>,
    identity: Vec<usize>,
}

impl<T> EntitySchema<T> {
    pub fn builder(type_name: &'static str) -> SchemaBuilder<T> {
        SchemaBuilder {
            type_name,
            fields: Vec::new(),
            identity: Vec::new(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldDef<T>> {
        self.fields.iter()
    }

    /// Look up a field by its exact logical name.
    pub fn field(&self, name: &str) -> Option<&FieldDef<T>> {
        self.by_name.get(name).map(|&i| &self.fields[i])
    }

    /// Resolve a raw token to a field: storage column name first, then the
    /// pascal-case conversion of the token, then the token as given.
    pub fn resolve(&self, raw: &str) -> Option<&FieldDef<T>> {
        self.resolve_index(raw).map(|i| &self.fields[i])
    }

    /// Resolve a raw token, keeping only declared identity fields.
    pub fn resolve_identity(&self, raw: &str) -> Option<&FieldDef<T>> {
        self.resolve_index(raw)
            .filter(|i| self.identity.contains(i))
            .map(|i| &self.fields[i])
    }

    fn resolve_index(&self, raw: &str) -> Option<usize> {
        if let Some(&i) = self.by_column.get(raw) {
            return Some(i);
        }
        let pascal = pascal_case(raw);
        if let Some(&i) = self.by_name.get(pascal.as_str()) {
            return Some(i);
        }
        self.by_name.get(raw).copied()
    }

    /// Resolve a raw token and assign a value to the matching field.
    ///
    /// Unknown and read-only fields are skipped (`Ok(false)`), tolerating
    /// foreign names in patch bags; coercion failures are errors.
    pub fn set_field(
        &self,
        entity: &mut T,
        raw: &str,
        value: FieldValue,
    ) -> Result<bool, SchemaError> {
        match self.resolve(raw) {
            Some(def) => def.assign(entity, value),
            None => Ok(false),
        }
    }

    pub fn identity_len(&self) -> usize {
        self.identity.len()
    }

    pub fn has_identity(&self) -> bool {
        !self.identity.is_empty()
    }

    /// Declared identity fields, in declaration order.
    pub fn identity_fields(&self) -> impl Iterator<Item = &FieldDef<T>> {
        self.identity.iter().map(|&i| &self.fields[i])
    }

    /// Identity values of an entity, in declaration order.
    pub fn identity_values(&self, entity: &T) -> Vec<FieldValue> {
        self.identity_fields().map(|f| f.value_of(entity)).collect()
    }
}

/// Builder for [`EntitySchema`]. Declaration mistakes (duplicate names,
/// unknown identity fields) panic: schemas are static program structure,
/// not runtime input.
pub struct SchemaBuilder<T> {
    type_name: &'static str,
    fields: Vec<FieldDef<T>>,
    identity: Vec<&'static str>,
}

impl<T> SchemaBuilder<T> {
    /// Declare a read-only field.
    pub fn field(mut self, name: &'static str, kind: FieldKind, get: Getter<T>) -> Self {
        self.fields.push(FieldDef {
            name,
            column: None,
            kind,
            get,
            set: None,
        });
        self
    }

    /// Declare a writable field.
    pub fn writable(
        mut self,
        name: &'static str,
        kind: FieldKind,
        get: Getter<T>,
        set: Setter<T>,
    ) -> Self {
        self.fields.push(FieldDef {
            name,
            column: None,
            kind,
            get,
            set: Some(set),
        });
        self
    }

    /// Attach a storage column name to the most recently declared field.
    pub fn column(mut self, column: &'static str) -> Self {
        let def = self
            .fields
            .last_mut()
            .unwrap_or_else(|| panic!("column('{column}') before any field"));
        def.column = Some(column);
        self
    }

    /// Declare the ordered identity fields.
    pub fn identity(mut self, names: &[&'static str]) -> Self {
        self.identity = names.to_vec();
        self
    }

    pub fn build(self) -> EntitySchema<T> {
        let mut by_name = HashMap::new();
        let mut by_column = HashMap::new();
        for (i, def) in self.fields.iter().enumerate() {
            if by_name.insert(def.name, i).is_some() {
                panic!("{}: duplicate field '{}'", self.type_name, def.name);
            }
            if let Some(column) = def.column {
                if by_column.insert(column, i).is_some() {
                    panic!("{}: duplicate column '{}'", self.type_name, column);
                }
            }
        }
        let identity = self
            .identity
            .iter()
            .map(|name| {
                *by_name
                    .get(name)
                    .unwrap_or_else(|| panic!("{}: unknown identity field '{name}'", self.type_name))
            })
            .collect();
        EntitySchema {
            type_name: self.type_name,
            fields: self.fields,
            by_name,
            by_column,
            identity,
        }
    }
}

/// Pascal-case conversion used as the fallback when a token matches no
/// storage column: `user_name` and `userName` both become `UserName`.
pub fn pascal_case(raw: &str) -> String {
    raw.split(['_', ' '])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Default)]
    struct Widget {
        id: i64,
        user_name: String,
        weight: i32,
    }

    fn widget_schema() -> EntitySchema<Widget> {
        EntitySchema::builder("Widget")
            .field("Id", FieldKind::I64, |w: &Widget| w.id.into())
            .writable(
                "UserName",
                FieldKind::Text,
                |w: &Widget| w.user_name.clone().into(),
                |w, v| match v {
                    FieldValue::Text(s) => {
                        w.user_name = s;
                        true
                    }
                    _ => false,
                },
            )
            .column("user_name")
            .writable(
                "Weight",
                FieldKind::I32,
                |w: &Widget| w.weight.into(),
                |w, v| match v {
                    FieldValue::I32(n) => {
                        w.weight = n;
                        true
                    }
                    _ => false,
                },
            )
            .identity(&["Id"])
            .build()
    }

    #[test]
    fn pascal_case_conversion() {
        assert_eq!(pascal_case("user_name"), "UserName");
        assert_eq!(pascal_case("userName"), "UserName");
        assert_eq!(pascal_case("UserName"), "UserName");
        assert_eq!(pascal_case("order number"), "OrderNumber");
    }

    #[test]
    fn resolve_prefers_column_then_pascal() {
        let schema = widget_schema();
        assert_eq!(schema.resolve("user_name").map(|f| f.name()), Some("UserName"));
        assert_eq!(schema.resolve("userName").map(|f| f.name()), Some("UserName"));
        assert_eq!(schema.resolve("Weight").map(|f| f.name()), Some("Weight"));
        assert!(schema.resolve("missing_field").is_none());
    }

    #[test]
    fn set_field_coerces_to_declared_kind() {
        let schema = widget_schema();
        let mut widget = Widget::default();
        assert!(schema
            .set_field(&mut widget, "weight", FieldValue::I64(12))
            .unwrap());
        assert_eq!(widget.weight, 12);
        assert!(schema
            .set_field(&mut widget, "user_name", FieldValue::Text("alice".into()))
            .unwrap());
        assert_eq!(widget.user_name, "alice");
    }

    #[test]
    fn set_field_skips_unknown_and_read_only() {
        let schema = widget_schema();
        let mut widget = Widget::default();
        assert!(!schema
            .set_field(&mut widget, "nope", FieldValue::I64(1))
            .unwrap());
        assert!(!schema
            .set_field(&mut widget, "Id", FieldValue::I64(9))
            .unwrap());
        assert_eq!(widget.id, 0);
    }

    #[test]
    fn identity_values_follow_declaration_order() {
        let schema = widget_schema();
        let widget = Widget {
            id: 5,
            ..Default::default()
        };
        assert_eq!(schema.identity_values(&widget), vec![FieldValue::I64(5)]);
    }
}
