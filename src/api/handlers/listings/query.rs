//! Query-string validation and pagination metadata for listing pages.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    api::{error::ApiError, handlers::validate},
    store::{DeliveryType, ListingSort, PageRequest, StockType},
};

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 20;
pub const MAX_LIMIT: i64 = 100;

pub const DELIVERY_TYPES: [&str; 2] = ["INSTANT", "MANUAL"];
pub const STOCK_TYPES: [&str; 2] = ["LIMITED", "UNLIMITED"];

/// Raw query string; every value arrives as text and is checked in [`ListingQuery::parse`].
#[derive(Deserialize, IntoParams, Debug, Default)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListingsQuery {
    /// 1-based page number (default 1)
    pub page: Option<String>,
    /// Page size (default 20, capped at 100)
    pub limit: Option<String>,
    /// One of `price_asc`, `price_desc`, `newest`, `oldest`
    pub sort: Option<String>,
    /// `INSTANT` or `MANUAL`
    pub delivery_type: Option<String>,
    /// `LIMITED` or `UNLIMITED`
    pub stock_type: Option<String>,
    /// Case-insensitive match on title or description
    pub search: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListingQuery {
    pub page: i64,
    pub limit: i64,
    pub sort: ListingSort,
    pub delivery_type: Option<DeliveryType>,
    pub stock_type: Option<StockType>,
    pub search: Option<String>,
}

fn positive_int(raw: Option<&str>, default: i64, message: &str) -> Result<i64, ApiError> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    match raw.trim().parse::<i64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => validate::fail(message),
    }
}

impl ListingQuery {
    /// Validates the raw query; the first invalid parameter wins.
    ///
    /// # Errors
    /// Returns [`ApiError::Validation`] naming the offending parameter.
    pub fn parse(raw: ListingsQuery) -> Result<Self, ApiError> {
        let page = positive_int(raw.page.as_deref(), DEFAULT_PAGE, "Page must be a positive integer")?;
        let limit = positive_int(
            raw.limit.as_deref(),
            DEFAULT_LIMIT,
            "Limit must be a positive integer",
        )?
        .min(MAX_LIMIT);
        let sort = raw
            .sort
            .as_deref()
            .map(|value| validate::one_of(value, &ListingSort::VALUES, ListingSort::parse))
            .transpose()?
            .unwrap_or_default();
        let delivery_type = raw
            .delivery_type
            .as_deref()
            .map(|value| validate::one_of(value, &DELIVERY_TYPES, DeliveryType::parse))
            .transpose()?;
        let stock_type = raw
            .stock_type
            .as_deref()
            .map(|value| validate::one_of(value, &STOCK_TYPES, StockType::parse))
            .transpose()?;
        let search = raw.search.filter(|term| !term.is_empty());

        Ok(Self {
            page,
            limit,
            sort,
            delivery_type,
            stock_type,
            search,
        })
    }

    #[must_use]
    pub fn page_request(&self) -> PageRequest {
        PageRequest {
            skip: (self.page - 1).saturating_mul(self.limit),
            take: self.limit,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
    pub has_next: bool,
    pub has_prev: bool,
}

impl Pagination {
    #[must_use]
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let total_pages = if limit > 0 { (total + limit - 1) / limit } else { 0 };
        Self {
            page,
            limit,
            total,
            total_pages,
            has_next: page < total_pages,
            has_prev: page > 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pairs: &[(&str, &str)]) -> ListingsQuery {
        let mut query = ListingsQuery::default();
        for (key, value) in pairs {
            let value = Some((*value).to_string());
            match *key {
                "page" => query.page = value,
                "limit" => query.limit = value,
                "sort" => query.sort = value,
                "deliveryType" => query.delivery_type = value,
                "stockType" => query.stock_type = value,
                "search" => query.search = value,
                other => panic!("unknown key {other}"),
            }
        }
        query
    }

    #[test]
    fn defaults() {
        let query = ListingQuery::parse(ListingsQuery::default()).unwrap();
        assert_eq!(query.page, 1);
        assert_eq!(query.limit, 20);
        assert_eq!(query.sort, ListingSort::Newest);
        assert_eq!(query.page_request(), PageRequest { skip: 0, take: 20 });
    }

    #[test]
    fn skip_follows_page_and_limit() {
        let query = ListingQuery::parse(raw(&[("page", "3"), ("limit", "15")])).unwrap();
        assert_eq!(query.page_request(), PageRequest { skip: 30, take: 15 });
    }

    #[test]
    fn limit_is_capped() {
        let query = ListingQuery::parse(raw(&[("limit", "500")])).unwrap();
        assert_eq!(query.limit, MAX_LIMIT);
    }

    #[test]
    fn rejects_non_positive_numbers() {
        for pairs in [[("page", "0")], [("page", "abc")], [("limit", "-5")]] {
            let err = ListingQuery::parse(raw(&pairs)).unwrap_err();
            assert!(matches!(err, ApiError::Validation(_)));
        }
    }

    #[test]
    fn rejects_unknown_sort_and_enums() {
        let err = ListingQuery::parse(raw(&[("sort", "cheapest")])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid enum value. Expected 'price_asc' | 'price_desc' | 'newest' | 'oldest', received 'cheapest'"
        );
        assert!(ListingQuery::parse(raw(&[("deliveryType", "instant")])).is_err());
        assert!(ListingQuery::parse(raw(&[("stockType", "NONE")])).is_err());
    }

    #[test]
    fn empty_search_is_ignored() {
        let query = ListingQuery::parse(raw(&[("search", "")])).unwrap();
        assert_eq!(query.search, None);
    }

    #[test]
    fn pagination_metadata() {
        let meta = Pagination::new(2, 20, 45);
        assert_eq!(meta.total_pages, 3);
        assert!(meta.has_next);
        assert!(meta.has_prev);

        let last = Pagination::new(3, 20, 45);
        assert!(!last.has_next);

        let empty = Pagination::new(1, 20, 0);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next);
        assert!(!empty.has_prev);
    }
}
