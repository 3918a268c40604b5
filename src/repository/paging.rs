use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::sql_generator::{FilterCriterion, PageSpec, SqlGenError, SortDirection};

/// Caller-facing paged query request
#[derive(Debug, Clone, PartialEq, Validate, Serialize, Deserialize)]
#[serde(default)]
pub struct PagedRequest {
    /// Page number starting from 1
    #[validate(range(min = 1, message = "Page number must be at least 1"))]
    pub page_number: u32,

    #[validate(range(min = 1, message = "Page size must be at least 1"))]
    pub page_size: u32,

    pub order_by: Option<String>,

    pub sort_direction: SortDirection,

    /// Unset values are dropped before the query is built
    pub filters: Vec<FilterCriterion>,
}

impl Default for PagedRequest {
    fn default() -> Self {
        PagedRequest {
            page_number: 1,
            page_size: 10,
            order_by: None,
            sort_direction: SortDirection::Asc,
            filters: Vec::new(),
        }
    }
}

impl PagedRequest {
    pub fn new(page_number: u32, page_size: u32) -> Self {
        PagedRequest {
            page_number,
            page_size,
            ..Default::default()
        }
    }

    pub fn filter(mut self, filter: FilterCriterion) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: SortDirection) -> Self {
        self.order_by = Some(column.into());
        self.sort_direction = direction;
        self
    }

    pub fn page_spec(&self) -> Result<PageSpec, SqlGenError> {
        self.validate()?;
        let mut page = PageSpec::new(self.page_number, self.page_size);
        if let Some(column) = &self.order_by {
            page = page.order_by(column.as_str(), self.sort_direction);
        } else {
            page.sort_direction = self.sort_direction;
        }
        Ok(page)
    }
}

/// One page of records plus the total number of matches
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub page_number: u32,
    pub page_size: u32,
    pub total_records: u64,
}

impl<T> PagedResult<T> {
    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            return 0;
        }
        self.total_records.div_ceil(u64::from(self.page_size))
    }

    pub fn has_next_page(&self) -> bool {
        u64::from(self.page_number) < self.total_pages()
    }
}
