//! Equality and identity predicates over runtime field names.
//!
//! Predicates are plain closures over the entity's static schema; building
//! one resolves and coerces everything up front, so evaluation is just
//! field reads and comparisons.

use std::sync::Arc;

use strata_core::{FieldDef, FieldValue, Record, SchemaError};

/// A boolean predicate over one entity type.
pub type Predicate<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// Predicate matching everything.
pub fn always<E>() -> Predicate<E> {
    Arc::new(|_| true)
}

/// Predicate matching nothing.
pub fn never<E>() -> Predicate<E> {
    Arc::new(|_| false)
}

/// Conjunction of per-field equality tests.
///
/// Unknown field names are silently skipped, tolerating foreign filter
/// shapes. When the same field appears more than once the last occurrence
/// wins, so no field is tested twice. A null filter value turns the whole
/// predicate into constant false. Values are coerced to the field's
/// declared kind before comparison.
pub fn equality<E: Record>(pairs: &[(String, FieldValue)]) -> Result<Predicate<E>, SchemaError> {
    let schema = E::schema();
    let mut terms: Vec<(&'static FieldDef<E>, FieldValue)> = Vec::new();
    for (name, value) in pairs {
        let Some(def) = schema.resolve(name) else {
            continue;
        };
        let coerced = if value.is_null() {
            FieldValue::Null
        } else {
            value.clone().coerce(def.kind())?
        };
        match terms.iter_mut().find(|(known, _)| known.name() == def.name()) {
            Some(term) => term.1 = coerced,
            None => terms.push((def, coerced)),
        }
    }
    if terms.iter().any(|(_, value)| value.is_null()) {
        return Ok(never());
    }
    Ok(Arc::new(move |entity: &E| {
        terms
            .iter()
            .all(|(def, value)| def.value_of(entity) == *value)
    }))
}

/// Conjunction of the declared identity fields against a positional value
/// tuple. The tuple length must match the declared identity exactly.
pub fn identity<E: Record>(values: &[FieldValue]) -> Result<Predicate<E>, SchemaError> {
    let schema = E::schema();
    if values.len() != schema.identity_len() {
        return Err(SchemaError::IdentityArity {
            type_name: schema.type_name(),
            expected: schema.identity_len(),
            got: values.len(),
        });
    }
    let terms: Vec<(&'static FieldDef<E>, FieldValue)> = schema
        .identity_fields()
        .zip(values)
        .map(|(def, value)| Ok((def, value.clone().coerce(def.kind())?)))
        .collect::<Result<_, SchemaError>>()?;
    Ok(Arc::new(move |entity: &E| {
        terms
            .iter()
            .all(|(def, value)| def.value_of(entity) == *value)
    }))
}

/// Resolve an arbitrary name→value query against the declared identity.
///
/// Names that resolve to anything other than an identity field are silently
/// dropped; surviving values are coerced to their field's kind. The result
/// feeds [`equality`] and cache-key construction.
pub fn identity_from_query<E: Record>(
    query: &[(String, String)],
) -> Result<Vec<(String, FieldValue)>, SchemaError> {
    let schema = E::schema();
    let mut pairs = Vec::new();
    for (name, value) in query {
        let Some(def) = schema.resolve_identity(name) else {
            continue;
        };
        let coerced = FieldValue::Text(value.clone()).coerce(def.kind())?;
        pairs.push((def.name().to_string(), coerced));
    }
    Ok(pairs)
}
