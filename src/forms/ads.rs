use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::domain::ad::{LocalizedText, NewAd, Price, Translation};
use crate::domain::filter::{FilterRequest, MAX_PAGE_SIZE, SortOrder};
use crate::domain::types::{
    AdId, AdStatus, AttributeName, CategoryId, CurrencyCode, Language, PriceAmount,
    TranslationText, TypeConstraintError,
};

const PROPERTIES_PREFIX: &str = "properties[";

/// Raw query string of `GET /v3/ads`, collected from repeated key/value
/// pairs.
///
/// `categories` may repeat or hold comma separated ids. Each
/// `properties[<name>]` key adds one accepted value for that attribute;
/// attributes keep the order in which they first appear.
#[derive(Debug, Default, Validate)]
pub struct AdsQueryForm {
    pub categories: Vec<String>,
    pub properties: Vec<(String, Vec<String>)>,
    pub q: Option<String>,
    pub sort: Option<String>,
    pub next_page: Option<String>,
    pub page_size: Option<String>,
    #[validate(required(message = "lang is required"))]
    pub lang: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
    pub currency: Option<String>,
    pub status: Option<String>,
}

impl AdsQueryForm {
    /// Collect query pairs; unknown keys are ignored and blank scalars count
    /// as absent.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut form = Self::default();

        for (key, value) in pairs {
            if let Some(name) = key
                .strip_prefix(PROPERTIES_PREFIX)
                .and_then(|rest| rest.strip_suffix(']'))
            {
                match form.properties.iter_mut().find(|(n, _)| n == name) {
                    Some((_, values)) => values.push(value),
                    None => form.properties.push((name.to_string(), vec![value])),
                }
                continue;
            }

            let slot = match key.as_str() {
                "categories" | "categories[]" => {
                    form.categories.push(value);
                    continue;
                }
                "q" => &mut form.q,
                "sort" => &mut form.sort,
                "next_page" => &mut form.next_page,
                "page_size" => &mut form.page_size,
                "lang" => &mut form.lang,
                "min_price" => &mut form.min_price,
                "max_price" => &mut form.max_price,
                "currency" => &mut form.currency,
                "status" => &mut form.status,
                _ => continue,
            };
            let value = value.trim();
            if !value.is_empty() {
                *slot = Some(value.to_string());
            }
        }

        form
    }
}

#[derive(Debug, Error)]
pub enum AdsQueryFormError {
    #[error("Ads query validation failed: {0}")]
    Validation(String),
    #[error("Ads query contains invalid data: {0}")]
    TypeConstraint(String),
}

impl From<ValidationErrors> for AdsQueryFormError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value.to_string())
    }
}

impl From<TypeConstraintError> for AdsQueryFormError {
    fn from(value: TypeConstraintError) -> Self {
        Self::TypeConstraint(value.to_string())
    }
}

fn parse_number<T: FromStr>(field: &str, value: &str) -> Result<T, TypeConstraintError> {
    value
        .parse::<T>()
        .map_err(|_| TypeConstraintError::InvalidValue(format!("{field}: {value}")))
}

fn price_bound(field: &str, value: Option<&str>) -> Result<Option<f64>, TypeConstraintError> {
    value
        .map(|v| parse_number::<f64>(field, v).and_then(PriceAmount::new).map(PriceAmount::get))
        .transpose()
}

impl TryFrom<AdsQueryForm> for FilterRequest {
    type Error = AdsQueryFormError;

    fn try_from(value: AdsQueryForm) -> Result<Self, Self::Error> {
        value.validate()?;

        let language = value
            .lang
            .as_deref()
            .map(Language::from_str)
            .transpose()?
            .ok_or(TypeConstraintError::EmptyString("lang"))?;
        let mut filter = FilterRequest::new(language);

        let mut category_ids = Vec::new();
        for raw in &value.categories {
            for part in raw.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                category_ids.push(CategoryId::from_str(part)?);
            }
        }
        filter = filter.categories(category_ids);

        for (name, values) in value.properties {
            let values: Vec<String> = values.into_iter().filter(|v| !v.is_empty()).collect();
            if !values.is_empty() {
                filter = filter.attribute(AttributeName::new(name)?, values);
            }
        }

        if let Some(q) = value.q {
            filter = filter.search(q);
        }
        if let Some(sort) = value.sort.as_deref() {
            filter = filter.sort(SortOrder::from_str(sort)?);
        }
        if let Some(token) = value.next_page.as_deref() {
            filter = filter.after(AdId::from_str(token)?);
        }
        if let Some(page_size) = value.page_size.as_deref() {
            let page_size: usize = parse_number("page_size", page_size)?;
            if page_size > MAX_PAGE_SIZE {
                return Err(TypeConstraintError::InvalidValue(format!(
                    "page_size must be at most {MAX_PAGE_SIZE}"
                ))
                .into());
            }
            filter = filter.page_size(page_size);
        }
        if let Some(status) = value.status.as_deref() {
            filter = filter.status(AdStatus::try_from(parse_number::<i32>("status", status)?)?);
        }
        if let Some(currency) = value.currency.as_deref() {
            filter = filter.currency(CurrencyCode::from_str(currency)?);
        }

        let min_price = price_bound("min_price", value.min_price.as_deref())?;
        let max_price = price_bound("max_price", value.max_price.as_deref())?;
        if let (Some(min), Some(max)) = (min_price, max_price) {
            if min > max {
                return Err(TypeConstraintError::InvalidValue(format!(
                    "min_price {min} exceeds max_price {max}"
                ))
                .into());
            }
        }

        Ok(filter.price_range(min_price, max_price))
    }
}

/// Language or currency given either as its numeric code or as text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CodeOrText {
    Code(i64),
    Text(String),
}

impl CodeOrText {
    fn language(&self) -> Result<Language, TypeConstraintError> {
        match self {
            Self::Code(code) => i32::try_from(*code)
                .map_err(|_| TypeConstraintError::InvalidValue(format!("language: {code}")))
                .and_then(Language::try_from),
            Self::Text(text) => text.parse(),
        }
    }

    fn currency(&self) -> Result<CurrencyCode, TypeConstraintError> {
        match self {
            Self::Code(code) => i32::try_from(*code)
                .map_err(|_| TypeConstraintError::InvalidValue(format!("currency code: {code}")))
                .and_then(CurrencyCode::new),
            Self::Text(text) => text.parse(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TranslationForm {
    pub lang: CodeOrText,
    #[validate(length(min = 1))]
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PriceForm {
    #[serde(alias = "value")]
    pub amount: f64,
    pub currency: CodeOrText,
}

/// JSON body of `POST /v3/ads` and `PUT /v3/ads/{id}`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AdForm {
    #[serde(alias = "title_multi")]
    #[validate(length(min = 1), nested)]
    pub title: Vec<TranslationForm>,
    #[serde(default, alias = "body_multi")]
    #[validate(nested)]
    pub description: Option<Vec<TranslationForm>>,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default)]
    pub category_ids: Vec<i32>,
    #[serde(default)]
    pub status: i32,
    #[serde(default)]
    pub price: Option<PriceForm>,
}

#[derive(Debug, Error)]
pub enum AdFormError {
    #[error("Ad form validation failed: {0}")]
    Validation(String),
    #[error("Ad form contains invalid data: {0}")]
    TypeConstraint(String),
}

impl From<ValidationErrors> for AdFormError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value.to_string())
    }
}

impl From<TypeConstraintError> for AdFormError {
    fn from(value: TypeConstraintError) -> Self {
        Self::TypeConstraint(value.to_string())
    }
}

fn localized(entries: Vec<TranslationForm>) -> Result<LocalizedText, TypeConstraintError> {
    let entries = entries
        .into_iter()
        .map(|entry| {
            Ok(Translation {
                lang: entry.lang.language()?,
                text: TranslationText::new(entry.text)?,
            })
        })
        .collect::<Result<Vec<_>, TypeConstraintError>>()?;
    LocalizedText::new(entries)
}

impl TryFrom<AdForm> for NewAd {
    type Error = AdFormError;

    fn try_from(value: AdForm) -> Result<Self, Self::Error> {
        value.validate()?;

        let category_ids = value
            .category_ids
            .into_iter()
            .map(CategoryId::new)
            .collect::<Result<Vec<_>, _>>()?;

        let mut ad = NewAd::new(localized(value.title)?)
            .categories(category_ids)
            .status(AdStatus::try_from(value.status)?);
        for (name, attribute) in value.attributes {
            ad.attributes
                .insert(AttributeName::new(name)?.into_inner(), attribute);
        }

        if let Some(description) = value.description.filter(|d| !d.is_empty()) {
            ad = ad.description(localized(description)?);
        }

        if let Some(price) = value.price {
            ad = ad.price(Price {
                amount: PriceAmount::new(price.amount)?,
                currency: price.currency.currency()?,
            });
        }

        Ok(ad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pairs(raw: &[(&str, &str)]) -> Vec<(String, String)> {
        raw.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn query_form_builds_filter() {
        let form = AdsQueryForm::from_pairs(pairs(&[
            ("lang", "en"),
            ("categories", "5,6"),
            ("categories", "7"),
            ("properties[color]", "red"),
            ("properties[size]", "L"),
            ("properties[color]", "blue"),
            ("q", "bike"),
            ("sort", "price_desc"),
            ("next_page", "12"),
            ("page_size", "10"),
            ("status", "3"),
            ("min_price", "10"),
            ("max_price", "99.5"),
            ("currency", "USD"),
            ("utm_source", "ignored"),
        ]));

        let filter = FilterRequest::try_from(form).unwrap();

        assert_eq!(filter.language, Language::English);
        assert_eq!(filter.category_ids, vec![5, 6, 7]);
        assert_eq!(filter.attributes.len(), 2);
        assert_eq!(filter.attributes[0].name, "color");
        assert_eq!(filter.attributes[0].values, vec!["red", "blue"]);
        assert_eq!(filter.attributes[1].name, "size");
        assert_eq!(filter.query.as_deref(), Some("bike"));
        assert_eq!(filter.sort, SortOrder::PriceDesc);
        assert_eq!(filter.page_token, Some(AdId::new(12).unwrap()));
        assert_eq!(filter.page_size, 10);
        assert_eq!(filter.status, Some(AdStatus::Active));
        assert_eq!(filter.min_price, Some(10.0));
        assert_eq!(filter.max_price, Some(99.5));
        assert_eq!(filter.currency, Some(CurrencyCode::USD));
    }

    #[test]
    fn query_form_requires_language() {
        let form = AdsQueryForm::from_pairs(pairs(&[("q", "bike"), ("lang", " ")]));
        assert!(matches!(
            FilterRequest::try_from(form),
            Err(AdsQueryFormError::Validation(_))
        ));
    }

    #[test]
    fn query_form_rejects_malformed_values() {
        for bad in [
            ("categories", "abc"),
            ("categories", "0"),
            ("next_page", "x"),
            ("page_size", "-1"),
            ("page_size", "101"),
            ("page_size", "9223372036854775807"),
            ("status", "42"),
            ("sort", "name"),
            ("min_price", "-5"),
            ("currency", "XYZ"),
        ] {
            let form = AdsQueryForm::from_pairs(pairs(&[("lang", "ru"), bad]));
            assert!(
                matches!(
                    FilterRequest::try_from(form),
                    Err(AdsQueryFormError::TypeConstraint(_))
                ),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn query_form_rejects_inverted_price_range() {
        let form = AdsQueryForm::from_pairs(pairs(&[
            ("lang", "tr"),
            ("min_price", "100"),
            ("max_price", "1"),
        ]));
        assert!(FilterRequest::try_from(form).is_err());
    }

    #[test]
    fn ad_form_accepts_legacy_field_names() {
        let form: AdForm = serde_json::from_value(json!({
            "title_multi": [{"lang": "en", "text": "Bike"}, {"lang": 1, "text": "Велосипед"}],
            "body_multi": [],
            "attributes": {"color": "red", "gears": 21},
            "category_ids": [6, 5, 6],
            "status": 3,
            "price": {"value": 100.0, "currency": "USD"}
        }))
        .unwrap();

        let ad = NewAd::try_from(form).unwrap();

        assert_eq!(ad.title.text_for(Language::Russian), "Велосипед");
        assert_eq!(ad.description, None);
        assert_eq!(ad.attributes["gears"], json!(21));
        assert_eq!(ad.category_ids, vec![5, 6]);
        assert_eq!(ad.status, AdStatus::Active);
        let price = ad.price.unwrap();
        assert_eq!(price.amount, 100.0);
        assert_eq!(price.currency, CurrencyCode::USD);
    }

    #[test]
    fn ad_form_requires_a_title() {
        let form: AdForm = serde_json::from_value(json!({"title": []})).unwrap();
        assert!(matches!(
            NewAd::try_from(form),
            Err(AdFormError::Validation(_))
        ));
    }

    #[test]
    fn ad_form_trims_attribute_names() {
        let form: AdForm = serde_json::from_value(json!({
            "title": [{"lang": "en", "text": "Bike"}],
            "attributes": {" color ": "red", "gears": 21}
        }))
        .unwrap();

        let ad = NewAd::try_from(form).unwrap();

        let names: Vec<&str> = ad.attributes.keys().map(String::as_str).collect();
        assert_eq!(names, ["color", "gears"]);
        assert_eq!(ad.attributes["color"], json!("red"));
    }

    #[test]
    fn ad_form_rejects_invalid_values() {
        for body in [
            json!({"title": [{"lang": "en", "text": "Bike"}], "status": 9}),
            json!({"title": [{"lang": "xx", "text": "Bike"}]}),
            json!({"title": [{"lang": "en", "text": "Bike"}, {"lang": 2, "text": "Cycle"}]}),
            json!({"title": [{"lang": "en", "text": "Bike"}], "category_ids": [0]}),
            json!({"title": [{"lang": "en", "text": "Bike"}], "price": {"amount": -1, "currency": 840}}),
            json!({"title": [{"lang": "en", "text": "Bike"}], "attributes": {"  ": "red"}}),
        ] {
            let form: AdForm = serde_json::from_value(body.clone()).unwrap();
            assert!(
                matches!(NewAd::try_from(form), Err(AdFormError::TypeConstraint(_))),
                "{body} should be rejected"
            );
        }
    }
}
