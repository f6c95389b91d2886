//! Sort-spec parsing and multi-key ordering.
//!
//! A sort spec is a comma-separated list of `"field [asc|desc]"` tokens.
//! Field tokens resolve through the schema (storage column name first,
//! pascal-case fallback), so `"user_name desc, created_date"` works against
//! an entity whose logical properties are `UserName` and `CreatedDate`.

use std::cmp::Ordering;

use strata_core::{FieldDef, Record, SchemaError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    fn parse(token: &str) -> Result<Self, SchemaError> {
        match token.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Ascending),
            "desc" => Ok(SortDirection::Descending),
            _ => Err(SchemaError::InvalidSortDirection {
                token: token.to_string(),
            }),
        }
    }

    fn apply(self, ord: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    }
}

/// A parsed multi-key ordering over one entity type.
///
/// Keys apply left to right; ties on the first key fall through to the
/// next. Sorting is stable, so rows equal under every key keep their scan
/// order.
#[derive(Debug)]
pub struct SortPlan<E: Record> {
    keys: Vec<(&'static FieldDef<E>, SortDirection)>,
}

impl<E: Record> SortPlan<E> {
    pub fn parse(spec: &str) -> Result<Self, SchemaError> {
        let schema = E::schema();
        let mut keys = Vec::new();
        for token in spec.split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            let mut words = token.split_whitespace();
            let Some(raw) = words.next() else {
                continue;
            };
            let def = schema
                .resolve(raw)
                .ok_or_else(|| SchemaError::UnknownSortField {
                    token: raw.to_string(),
                })?;
            let direction = match words.next() {
                Some(word) => SortDirection::parse(word)?,
                None => SortDirection::Ascending,
            };
            if words.next().is_some() {
                return Err(SchemaError::InvalidSortDirection {
                    token: token.to_string(),
                });
            }
            keys.push((def, direction));
        }
        Ok(Self { keys })
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn compare(&self, a: &E, b: &E) -> Ordering {
        for (def, direction) in &self.keys {
            let ord = direction.apply(def.value_of(a).compare(&def.value_of(b)));
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    }

    pub fn sort(&self, rows: &mut [E]) {
        rows.sort_by(|a, b| self.compare(a, b));
    }

    fn tokens(&self) -> impl Iterator<Item = String> + '_ {
        self.keys.iter().map(|(def, direction)| match direction {
            SortDirection::Ascending => def.name().to_string(),
            SortDirection::Descending => format!("{} desc", def.name()),
        })
    }
}

/// Normalize a raw sort spec to resolved logical field names, for reuse by
/// custom queries: `"user_name desc,id"` becomes `"UserName desc, Id"`.
pub fn normalize_spec<E: Record>(spec: &str) -> Result<String, SchemaError> {
    let plan = SortPlan::<E>::parse(spec)?;
    Ok(plan.tokens().collect::<Vec<_>>().join(", "))
}
