//! The read pipeline: filter, date range, order, page, project.
//!
//! A [`ListQuery`] runs over a scanned snapshot of the entity collection.
//! Stages apply in a fixed order: the caller's filter, then the inclusive
//! creation-date range, then ordering (explicit sort spec or newest first),
//! then skip/take paging. Projection is a separate step so the same
//! pipeline serves any output shape.

use strata_core::{AuditedRecord, PageRequest, ProjectFrom, SchemaError};

use crate::predicate::{always, Predicate};
use crate::sort::SortPlan;

/// One configured pass of the read pipeline.
pub struct ListQuery<E: AuditedRecord> {
    filter: Predicate<E>,
    request: PageRequest,
}

impl<E: AuditedRecord> ListQuery<E> {
    pub fn new(request: &PageRequest) -> Self {
        Self {
            filter: always(),
            request: request.clone(),
        }
    }

    /// Replace the identity filter with an entity-specific one.
    pub fn filtered(mut self, filter: Predicate<E>) -> Self {
        self.filter = filter;
        self
    }

    /// Run filter, date range, order, and paging over a snapshot.
    pub fn run(&self, rows: Vec<E>) -> Result<Vec<E>, SchemaError> {
        let mut rows = self.survivors(rows);
        match self.request.sort_spec() {
            Some(spec) => SortPlan::<E>::parse(spec)?.sort(&mut rows),
            None => newest_first(&mut rows),
        }
        let (skip, take) = self.request.skip_take();
        Ok(rows.into_iter().skip(skip).take(take).collect())
    }

    /// Rows surviving filter and date range. Ordering and paging never
    /// change a count.
    pub fn count(&self, rows: Vec<E>) -> usize {
        self.survivors(rows).len()
    }

    fn survivors(&self, rows: Vec<E>) -> Vec<E> {
        rows.into_iter()
            .filter(|row| (self.filter)(row))
            .filter(|row| {
                let created = row.created_at();
                self.request.from_date.map_or(true, |from| created >= from)
                    && self.request.to_date.map_or(true, |to| created <= to)
            })
            .collect()
    }
}

/// Descending by creation timestamp; the default ordering of every read.
pub fn newest_first<E: AuditedRecord>(rows: &mut [E]) {
    rows.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
}

/// Project every row to the requested output shape.
pub fn project_all<E, P: ProjectFrom<E>>(rows: &[E]) -> Vec<P> {
    rows.iter().map(P::project_from).collect()
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::predicate::equality;
    use crate::testing::{ticket, Ticket};

    fn tickets(n: i64) -> Vec<Ticket> {
        (1..=n).map(|i| ticket(i, "t", 1, i)).collect()
    }

    #[test]
    fn second_page_of_1500_returns_oldest_500_newest_first() {
        let request = PageRequest {
            page_index: 2,
            page_size: 1000,
            ..Default::default()
        };
        let page = ListQuery::new(&request).run(tickets(1500)).unwrap();

        // Newest-first puts ids 1500..501 on page one; page two holds the
        // remaining 500..1.
        assert_eq!(page.len(), 500);
        assert_eq!(page.first().map(|t| t.id), Some(500));
        assert_eq!(page.last().map(|t| t.id), Some(1));
    }

    #[test]
    fn date_range_bounds_are_inclusive() {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let request = PageRequest {
            from_date: Some(base + Duration::minutes(2)),
            to_date: Some(base + Duration::minutes(4)),
            ..Default::default()
        };
        let page = ListQuery::new(&request).run(tickets(6)).unwrap();
        let mut ids: Vec<i64> = page.iter().map(|t| t.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![2, 3, 4]);
    }

    #[test]
    fn explicit_sort_spec_overrides_newest_first() {
        let request = PageRequest {
            sorting: Some("Priority desc, Id asc".into()),
            ..Default::default()
        };
        let rows = vec![
            ticket(1, "a", 1, 0),
            ticket(2, "b", 9, 1),
            ticket(3, "c", 9, 2),
        ];
        let page = ListQuery::new(&request).run(rows).unwrap();
        let ids: Vec<i64> = page.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn filter_applies_before_paging() {
        let request = PageRequest {
            page_size: 2,
            ..Default::default()
        };
        let rows = vec![
            ticket(1, "keep", 1, 0),
            ticket(2, "drop", 1, 1),
            ticket(3, "keep", 1, 2),
            ticket(4, "keep", 1, 3),
        ];
        let filter = equality::<Ticket>(&[("Title".into(), "keep".into())]).unwrap();
        let page = ListQuery::new(&request).filtered(filter).run(rows).unwrap();
        let ids: Vec<i64> = page.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![4, 3]);
    }

    #[test]
    fn count_ignores_paging() {
        let request = PageRequest {
            page_index: 7,
            page_size: 10,
            ..Default::default()
        };
        assert_eq!(ListQuery::new(&request).count(tickets(35)), 35);
    }

    #[test]
    fn bad_sort_spec_surfaces_schema_error() {
        let request = PageRequest {
            sorting: Some("Bogus asc".into()),
            ..Default::default()
        };
        assert!(ListQuery::new(&request).run(tickets(3)).is_err());
    }

    #[test]
    fn projection_maps_every_row() {
        let rows = tickets(3);
        let projected: Vec<Ticket> = project_all(&rows);
        assert_eq!(projected, rows);
    }
}
