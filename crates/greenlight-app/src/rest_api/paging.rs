use garde::Validate;
use greenlight_dal::{filters::validate_filters, movie::SORT_SAFELIST, Filters};
use greenlight_types::Validator;
use serde::Deserialize;

use crate::error::ApiResult;

/// Raw query string of the movie listing, values are parsed in [`MovieQuery::into_listing`].
#[derive(Debug, Clone, Default, Validate, Deserialize)]
pub struct MovieQuery {
    #[garde(length(max = 500))]
    pub title: Option<String>,
    /// Comma separated list of genres
    #[garde(length(max = 1000))]
    pub genres: Option<String>,
    #[garde(length(max = 20))]
    pub page: Option<String>,
    #[garde(length(max = 20))]
    pub page_size: Option<String>,
    #[garde(length(max = 255))]
    pub sort: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Listing {
    pub title: String,
    pub genres: Vec<String>,
    pub filters: Filters,
}

fn read_int(v: &mut Validator, value: Option<&str>, key: &str, default: i64) -> i64 {
    match value.filter(|s| !s.is_empty()) {
        None => default,
        Some(s) => s.parse().unwrap_or_else(|_| {
            v.add_error(key, "must be an integer value");
            default
        }),
    }
}

fn read_csv(value: Option<&str>) -> Vec<String> {
    value
        .map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|g| !g.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

impl MovieQuery {
    pub fn into_listing(self, default_page_size: i64) -> ApiResult<Listing> {
        let mut v = Validator::new();

        let page = read_int(&mut v, self.page.as_deref(), "page", 1);
        let page_size = read_int(
            &mut v,
            self.page_size.as_deref(),
            "page_size",
            default_page_size,
        );
        let sort = self
            .sort
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "id".to_string());

        let filters = Filters::new(page, page_size, sort, SORT_SAFELIST);
        validate_filters(&mut v, &filters);
        v.into_result()?;

        Ok(Listing {
            title: self.title.unwrap_or_default(),
            genres: read_csv(self.genres.as_deref()),
            filters,
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ApiError;

    use super::*;

    fn query(pairs: &[(&str, &str)]) -> MovieQuery {
        let mut q = MovieQuery::default();
        for (k, val) in pairs {
            let val = Some(val.to_string());
            match *k {
                "title" => q.title = val,
                "genres" => q.genres = val,
                "page" => q.page = val,
                "page_size" => q.page_size = val,
                "sort" => q.sort = val,
                _ => unreachable!(),
            }
        }
        q
    }

    #[test]
    fn test_defaults() {
        let listing = MovieQuery::default().into_listing(20).unwrap();
        assert_eq!("", listing.title);
        assert!(listing.genres.is_empty());
        assert_eq!(1, listing.filters.page);
        assert_eq!(20, listing.filters.page_size);
        assert_eq!("id", listing.filters.sort);
    }

    #[test]
    fn test_parse_values() {
        let listing = query(&[
            ("title", "black panther"),
            ("genres", "action, adventure,"),
            ("page", "2"),
            ("page_size", "5"),
            ("sort", "-year"),
        ])
        .into_listing(20)
        .unwrap();
        assert_eq!("black panther", listing.title);
        assert_eq!(vec!["action", "adventure"], listing.genres);
        assert_eq!(5, listing.filters.offset());
        assert_eq!("year DESC", listing.filters.ordering().unwrap());
    }

    #[test]
    fn test_invalid_values() {
        let res = query(&[("page", "abc"), ("page_size", "1000"), ("sort", "bogus")])
            .into_listing(20);
        match res {
            Err(ApiError::Validation(e)) => {
                assert_eq!(Some("must be an integer value"), e.get("page"));
                assert_eq!(Some("must be a maximum of 100"), e.get("page_size"));
                assert_eq!(Some("invalid sort value"), e.get("sort"));
            }
            other => panic!("Unexpected result {other:?}"),
        }

        let res = query(&[("page", "0")]).into_listing(20);
        match res {
            Err(ApiError::Validation(e)) => {
                assert_eq!(Some("must be greater than zero"), e.get("page"))
            }
            other => panic!("Unexpected result {other:?}"),
        }
    }

    #[test]
    fn test_shape_limits() {
        assert!(query(&[("title", "x".repeat(501).as_str())]).validate().is_err());
        assert!(query(&[("page", "1".repeat(21).as_str())]).validate().is_err());
        assert!(query(&[("sort", "-year"), ("genres", "drama,war")])
            .validate()
            .is_ok());
    }
}
