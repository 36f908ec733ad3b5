use std::fmt::Display;

use greenlight_types::{ValidationError, Validator, validator::permitted};
use serde::Serialize;

use crate::error::{Error, Result};

pub const MAX_PAGE: i64 = 10_000_000;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Asc,
    Desc,
}

impl Display for Order {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Order::Asc => write!(f, "ASC"),
            Order::Desc => write!(f, "DESC"),
        }
    }
}

/// Paging and sorting of a listing.
///
/// `sort` is a column name, optionally prefixed with `-` for descending order,
/// and must be one of `sort_safelist`, because it ends up in the SQL text.
#[derive(Debug, Clone)]
pub struct Filters {
    pub page: i64,
    pub page_size: i64,
    pub sort: String,
    pub sort_safelist: &'static [&'static str],
}

impl Filters {
    pub fn new(
        page: i64,
        page_size: i64,
        sort: impl Into<String>,
        sort_safelist: &'static [&'static str],
    ) -> Self {
        Filters {
            page,
            page_size,
            sort: sort.into(),
            sort_safelist,
        }
    }

    pub fn sort_column(&self) -> Result<&str> {
        if permitted(&self.sort.as_str(), self.sort_safelist) {
            Ok(self.sort.trim_start_matches('-'))
        } else {
            Err(Error::InvalidOrderByField(self.sort.clone()))
        }
    }

    pub fn sort_direction(&self) -> Order {
        if self.sort.starts_with('-') {
            Order::Desc
        } else {
            Order::Asc
        }
    }

    pub fn ordering(&self) -> Result<String> {
        Ok(format!("{} {}", self.sort_column()?, self.sort_direction()))
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }

    pub fn offset(&self) -> i64 {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }

    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        let mut v = Validator::new();
        validate_filters(&mut v, self);
        v.into_result()
    }
}

pub fn validate_filters(v: &mut Validator, f: &Filters) {
    v.check(f.page > 0, "page", "must be greater than zero");
    v.check(f.page <= MAX_PAGE, "page", "must be a maximum of 10 million");
    v.check(f.page_size > 0, "page_size", "must be greater than zero");
    v.check(f.page_size <= MAX_PAGE_SIZE, "page_size", "must be a maximum of 100");

    v.check(
        permitted(&f.sort.as_str(), f.sort_safelist),
        "sort",
        "invalid sort value",
    );
}

/// Pagination summary returned along with a page of records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Metadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_records: Option<u64>,
}

impl Metadata {
    pub fn calculate(total_records: u64, page: i64, page_size: i64) -> Self {
        if total_records == 0 || page_size < 1 {
            return Metadata::default();
        }
        let total = total_records as i64;
        Metadata {
            current_page: Some(page),
            page_size: Some(page_size),
            first_page: Some(1),
            last_page: Some((total + page_size - 1) / page_size),
            total_records: Some(total_records),
        }
    }
}
