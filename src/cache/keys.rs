//! Cache key construction for ad listings.
//!
//! Keys embed the current `ads` namespace generation. Writers bump the
//! generation, which makes every previously stored listing unreachable.


use serde_json::Value;

use crate::domain::filter::FilterRequest;

/// Counter holding the current generation of the `ads` namespace.
pub const ADS_GENERATION_KEY: &str = "ads:generation";

fn quoted(value: &str) -> String {
    Value::from(value).to_string()
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

/// Deterministic key for a listing under `generation`.
///
/// Components appear in a fixed order and attribute constraints keep their
/// request order, so filters that differ only in attribute order get
/// different keys. String parts are JSON encoded to keep distinct filters
/// apart.
pub fn ads_filter_key(generation: u64, filter: &FilterRequest) -> String {
    let categories = filter
        .category_ids
        .iter()
        .map(|c| c.get().to_string())
        .collect::<Vec<_>>()
        .join(",");

    let mut key = format!(
        "ads:v{generation}:filter:[{categories}]:{}:{}:{}:{}",
        optional(filter.query.as_deref().map(quoted)),
        filter.sort,
        optional(filter.page_token),
        filter.page_size,
    );

    for attribute in &filter.attributes {
        let values = attribute
            .values
            .iter()
            .map(|v| quoted(v))
            .collect::<Vec<_>>()
            .join(",");
        key.push_str(&format!(":{}=[{values}]", quoted(attribute.name.as_str())));
    }

    key.push_str(&format!(
        ":status={}:min={}:max={}:currency={}",
        optional(filter.status.map(|s| s.ordinal())),
        optional(filter.min_price),
        optional(filter.max_price),
        optional(filter.currency.map(|c| c.get())),
    ));

    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::filter::SortOrder;
    use crate::domain::types::{AdId, AdStatus, AttributeName, CategoryId, Language};

    fn base() -> FilterRequest {
        FilterRequest::new(Language::English)
    }

    fn name(value: &str) -> AttributeName {
        AttributeName::new(value).unwrap()
    }

    #[test]
    fn same_filter_same_key() {
        let filter = base()
            .categories([CategoryId::new(5).unwrap()])
            .search("bike")
            .sort(SortOrder::PriceAsc)
            .page_size(10)
            .after(AdId::new(7).unwrap());
        assert_eq!(ads_filter_key(0, &filter), ads_filter_key(0, &filter.clone()));
        assert_eq!(
            ads_filter_key(0, &filter),
            "ads:v0:filter:[5]:\"bike\":price_asc:7:10:status=-:min=-:max=-:currency=-"
        );
    }

    #[test]
    fn generation_changes_key() {
        assert_ne!(ads_filter_key(1, &base()), ads_filter_key(2, &base()));
    }

    #[test]
    fn attribute_order_is_significant() {
        let a = base()
            .attribute(name("color"), vec!["red".into()])
            .attribute(name("size"), vec!["l".into()]);
        let b = base()
            .attribute(name("size"), vec!["l".into()])
            .attribute(name("color"), vec!["red".into()]);
        assert_ne!(ads_filter_key(0, &a), ads_filter_key(0, &b));
    }

    #[test]
    fn result_shaping_fields_are_part_of_key() {
        let plain = ads_filter_key(0, &base());
        assert_ne!(plain, ads_filter_key(0, &base().status(AdStatus::Active)));
        assert_ne!(plain, ads_filter_key(0, &base().price_range(Some(1.0), None)));
    }

    #[test]
    fn separators_inside_values_do_not_collide() {
        let a = base().search("a:b");
        let b = base().search("a").page_size(0);
        assert_ne!(ads_filter_key(0, &a), ads_filter_key(0, &b));

        let c = base().attribute(name("k"), vec!["x,y".into()]);
        let d = base().attribute(name("k"), vec!["x".into(), "y".into()]);
        assert_ne!(ads_filter_key(0, &c), ads_filter_key(0, &d));
    }
}
