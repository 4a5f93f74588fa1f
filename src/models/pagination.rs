use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

use super::{Product, SortOrder};

pub const DEFAULT_PAGE_LIMIT: u32 = 10;
pub const MAX_PAGE_LIMIT: u32 = 100;
pub const DEFAULT_PAGE: u32 = 1;

const LISTING_PATH: &str = "/api/products";

const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Raw listing parameters exactly as they arrive in the query string
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductListParams {
    pub limit: Option<String>,
    pub page: Option<String>,
    pub sort: Option<String>,
    pub query: Option<String>,
}

/// Normalized listing request
#[derive(Debug, Clone, PartialEq)]
pub struct ProductQuery {
    pub limit: u32,
    pub page: u32,
    pub sort: SortOrder,
    /// Sort value as supplied, echoed back in navigation links
    pub raw_sort: String,
    pub query: String,
}

/// One page of the product listing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPage {
    pub status: String,
    pub payload: Vec<Product>,
    pub total_count: usize,
    pub total_pages: u32,
    pub prev_page: Option<u32>,
    pub next_page: Option<u32>,
    pub page: u32,
    pub has_prev_page: bool,
    pub has_next_page: bool,
    pub prev_link: Option<String>,
    pub next_link: Option<String>,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            page: DEFAULT_PAGE,
            sort: SortOrder::Unsorted,
            raw_sort: String::new(),
            query: String::new(),
        }
    }
}

impl ProductQuery {
    /// Coerce raw parameters. Non-numeric or non-positive `limit`/`page`
    /// fall back to their defaults; `limit` is capped at [`MAX_PAGE_LIMIT`].
    pub fn from_params(params: &ProductListParams) -> Self {
        let limit = parse_positive(params.limit.as_deref())
            .unwrap_or(DEFAULT_PAGE_LIMIT)
            .min(MAX_PAGE_LIMIT);
        let page = parse_positive(params.page.as_deref()).unwrap_or(DEFAULT_PAGE);
        let raw_sort = params.sort.clone().unwrap_or_default();

        Self {
            limit,
            page,
            sort: SortOrder::parse_lenient(&raw_sort),
            raw_sort,
            query: params.query.clone().unwrap_or_default(),
        }
    }

    /// Filter, sort and paginate `products`, which must be in store order.
    pub fn apply(&self, mut products: Vec<Product>) -> ProductPage {
        if !self.query.is_empty() {
            let needle = self.query.to_lowercase();
            products.retain(|product| product.matches_query(&needle));
        }

        match self.sort {
            SortOrder::Asc => products.sort_by(|a, b| a.price.cmp(&b.price)),
            SortOrder::Desc => products.sort_by(|a, b| b.price.cmp(&a.price)),
            SortOrder::Unsorted => {}
        }

        let total_count = products.len();
        let total_pages = total_pages(total_count, self.limit);
        let skip = (self.page as usize - 1).saturating_mul(self.limit as usize);

        let payload: Vec<Product> = products
            .into_iter()
            .skip(skip)
            .take(self.limit as usize)
            .collect();

        let has_prev_page = self.page > 1;
        let has_next_page = self.page < total_pages;
        let prev_page = has_prev_page.then(|| self.page - 1);
        let next_page = has_next_page.then(|| self.page + 1);

        ProductPage {
            status: "success".to_string(),
            payload,
            total_count,
            total_pages,
            prev_page,
            next_page,
            page: self.page,
            has_prev_page,
            has_next_page,
            prev_link: prev_page.map(|page| self.link_to(page)),
            next_link: next_page.map(|page| self.link_to(page)),
        }
    }

    /// Listing URL for `page` that keeps the current limit, sort and query
    pub fn link_to(&self, page: u32) -> String {
        format!(
            "{}?limit={}&page={}&sort={}&query={}",
            LISTING_PATH,
            self.limit,
            page,
            utf8_percent_encode(&self.raw_sort, QUERY_VALUE),
            utf8_percent_encode(&self.query, QUERY_VALUE),
        )
    }
}

/// `ceil(total / limit)`
pub fn total_pages(total: usize, limit: u32) -> u32 {
    let limit = limit.max(1) as usize;
    u32::try_from(total.div_ceil(limit)).unwrap_or(u32::MAX)
}

fn parse_positive(raw: Option<&str>) -> Option<u32> {
    raw.and_then(|value| value.trim().parse::<u32>().ok())
        .filter(|value| *value >= 1)
}
