use serde::Serialize;

use crate::pagination::Pagination;

/// Ordering by creation timestamp, the only ordering the site needs.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Ordering {
    pub ascending: bool,
}

impl Ordering {
    pub fn newest_first() -> Self {
        Self { ascending: false }
    }

    pub fn oldest_first() -> Self {
        Self { ascending: true }
    }

    pub fn to_sql(&self) -> &'static str {
        if self.ascending {
            "created_at ASC"
        } else {
            "created_at DESC"
        }
    }
}

impl Default for Ordering {
    fn default() -> Self {
        Self::newest_first()
    }
}

/// A select/update/delete description for one table. `F` is the table's
/// equality filter type; all filters must match.
#[derive(Debug, Clone)]
pub struct Query<F> {
    filters: Vec<F>,
    ordering: Ordering,
    pagination: Option<Pagination>,
    count_exact: bool,
}

impl<F> Default for Query<F> {
    fn default() -> Self {
        Self {
            filters: Vec::new(),
            ordering: Ordering::default(),
            pagination: None,
            count_exact: false,
        }
    }
}

impl<F> Query<F> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, filter: F) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, ordering: Ordering) -> Self {
        self.ordering = ordering;
        self
    }

    pub fn paginate(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }

    pub fn limit(self, limit: usize) -> Self {
        self.paginate(Pagination {
            page_size: limit,
            start_at: 0,
        })
    }

    /// Requests the total number of matching rows, ignoring pagination.
    pub fn count_exact(mut self) -> Self {
        self.count_exact = true;
        self
    }

    pub fn filters(&self) -> &[F] {
        &self.filters
    }

    pub fn ordering(&self) -> Ordering {
        self.ordering
    }

    pub fn pagination(&self) -> Option<Pagination> {
        self.pagination
    }

    pub fn is_count_exact(&self) -> bool {
        self.count_exact
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryResults<T> {
    pub records: Vec<T>,
    /// Present when the query asked for an exact count.
    pub total_count: Option<usize>,
    pub start_at: usize,
}

impl<T> Default for QueryResults<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            total_count: None,
            start_at: 0,
        }
    }
}

impl<T> QueryResults<T> {
    pub fn into_records(self) -> Vec<T> {
        self.records
    }

    pub fn first(self) -> Option<T> {
        self.records.into_iter().next()
    }
}
