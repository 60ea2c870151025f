use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::ad::Ad;
use crate::domain::types::{
    AdId, AdStatus, AttributeName, CategoryId, CurrencyCode, Language, TypeConstraintError,
};

/// Page size used when the request does not specify one (or asks for zero).
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Largest page a client may request.
pub const MAX_PAGE_SIZE: usize = 100;

/// Ordering applied to filtered ads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    PriceAsc,
    PriceDesc,
    #[default]
    DateDesc,
}

impl SortOrder {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
            Self::DateDesc => "date_desc",
        }
    }
}

impl Display for SortOrder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = TypeConstraintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "price_asc" => Ok(Self::PriceAsc),
            "price_desc" => Ok(Self::PriceDesc),
            "date_desc" | "" => Ok(Self::DateDesc),
            other => Err(TypeConstraintError::UnknownVariant {
                field: "sort",
                value: other.to_string(),
            }),
        }
    }
}

/// Exact-match constraint on a single dynamic attribute: the ad's value must
/// equal one of `values`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeFilter {
    pub name: AttributeName,
    pub values: Vec<String>,
}

/// Read-only descriptor of an ad listing query.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterRequest {
    /// Ads matching any of these categories.
    pub category_ids: Vec<CategoryId>,
    /// Plain-text query matched against the search index.
    pub query: Option<String>,
    pub status: Option<AdStatus>,
    /// Applied in request order; all must match.
    pub attributes: Vec<AttributeFilter>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub currency: Option<CurrencyCode>,
    pub sort: SortOrder,
    /// Zero means [`DEFAULT_PAGE_SIZE`].
    pub page_size: usize,
    /// Id of the last ad on the previous page.
    pub page_token: Option<AdId>,
    pub language: Language,
}

impl FilterRequest {
    pub fn new(language: Language) -> Self {
        Self {
            category_ids: Vec::new(),
            query: None,
            status: None,
            attributes: Vec::new(),
            min_price: None,
            max_price: None,
            currency: None,
            sort: SortOrder::default(),
            page_size: 0,
            page_token: None,
            language,
        }
    }

    pub fn categories(mut self, category_ids: impl IntoIterator<Item = CategoryId>) -> Self {
        self.category_ids = category_ids.into_iter().collect();
        self
    }

    pub fn search(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    pub fn status(mut self, status: AdStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn attribute(mut self, name: AttributeName, values: Vec<String>) -> Self {
        self.attributes.push(AttributeFilter { name, values });
        self
    }

    pub fn price_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    pub fn currency(mut self, currency: CurrencyCode) -> Self {
        self.currency = Some(currency);
        self
    }

    pub fn sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn after(mut self, page_token: AdId) -> Self {
        self.page_token = Some(page_token);
        self
    }

    /// Requested page size with the default applied, capped at
    /// [`MAX_PAGE_SIZE`].
    pub fn effective_page_size(&self) -> usize {
        if self.page_size == 0 {
            DEFAULT_PAGE_SIZE
        } else {
            self.page_size.min(MAX_PAGE_SIZE)
        }
    }
}

/// One page of filtered ads.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PaginatedResponse {
    pub items: Vec<Ad>,
    /// Decimal id of the last item when more pages follow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_page: Option<String>,
    /// Number of ads matching the filter, independent of pagination.
    pub total_count: i64,
}
