//! Mapping seams between entities and their input/output shapes.
//!
//! The mapping DSL itself is an external collaborator; these traits are the
//! points where it plugs in. Each role shape of a service names one of
//! them: list/detail projections implement [`ProjectFrom`], create inputs
//! [`IntoRecord`], update inputs [`MergeInto`].

/// An output shape constructed from an entity.
pub trait ProjectFrom<E>: Sized {
    fn project_from(entity: &E) -> Self;
}

/// Every entity projects to itself; the default list/detail shape.
impl<E: Clone> ProjectFrom<E> for E {
    fn project_from(entity: &E) -> Self {
        entity.clone()
    }
}

/// A create input mapped into a fresh entity.
pub trait IntoRecord<E> {
    fn into_record(self) -> E;
}

impl<E> IntoRecord<E> for E {
    fn into_record(self) -> E {
        self
    }
}

/// An update input merged onto a loaded entity. Implementations decide
/// which fields participate; absent optionals leave the target untouched.
pub trait MergeInto<E> {
    fn merge_into(&self, entity: &mut E);
}
