use std::collections::HashSet;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::types::{
    AdId, AdStatus, CategoryId, CurrencyCode, Language, PriceAmount, TranslationText,
    TypeConstraintError,
};

/// Free-form attribute name to value mapping attached to an ad.
pub type Attributes = Map<String, Value>;

/// Text in a single language.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Translation {
    pub lang: Language,
    pub text: TranslationText,
}

/// Ordered list of translations holding at most one entry per language.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "Vec<Translation>", into = "Vec<Translation>")]
pub struct LocalizedText(Vec<Translation>);

impl LocalizedText {
    /// Requires at least one entry and unique languages.
    pub fn new(entries: Vec<Translation>) -> Result<Self, TypeConstraintError> {
        if entries.is_empty() {
            return Err(TypeConstraintError::EmptyString("localized text"));
        }
        let mut seen = HashSet::new();
        for entry in &entries {
            if !seen.insert(entry.lang) {
                return Err(TypeConstraintError::InvalidValue(format!(
                    "duplicate language entry: {}",
                    entry.lang
                )));
            }
        }
        Ok(Self(entries))
    }

    pub fn entries(&self) -> &[Translation] {
        &self.0
    }

    /// Text for `lang`, falling back to English and then to the first entry.
    pub fn text_for(&self, lang: Language) -> &str {
        self.0
            .iter()
            .find(|t| t.lang == lang)
            .or_else(|| self.0.iter().find(|t| t.lang == Language::English))
            .unwrap_or(&self.0[0])
            .text
            .as_str()
    }
}

impl TryFrom<Vec<Translation>> for LocalizedText {
    type Error = TypeConstraintError;

    fn try_from(value: Vec<Translation>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LocalizedText> for Vec<Translation> {
    fn from(value: LocalizedText) -> Self {
        value.0
    }
}

/// Monetary value with its currency.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Price {
    #[serde(alias = "value")]
    pub amount: PriceAmount,
    pub currency: CurrencyCode,
}

/// A classified advertisement.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ad {
    pub id: AdId,
    pub title: LocalizedText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedText>,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default)]
    pub category_ids: Vec<CategoryId>,
    pub status: AdStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Information required to create an [`Ad`] or fully replace an existing one.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAd {
    pub title: LocalizedText,
    pub description: Option<LocalizedText>,
    pub attributes: Attributes,
    pub category_ids: Vec<CategoryId>,
    pub status: AdStatus,
    pub price: Option<Price>,
}

impl NewAd {
    pub fn new(title: LocalizedText) -> Self {
        Self {
            title,
            description: None,
            attributes: Attributes::new(),
            category_ids: Vec::new(),
            status: AdStatus::default(),
            price: None,
        }
    }

    pub fn description(mut self, description: LocalizedText) -> Self {
        self.description = Some(description);
        self
    }

    pub fn attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Replaces the category set; duplicates are dropped and ids sorted.
    pub fn categories(mut self, category_ids: impl IntoIterator<Item = CategoryId>) -> Self {
        let mut ids: Vec<CategoryId> = category_ids.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();
        self.category_ids = ids;
        self
    }

    pub fn status(mut self, status: AdStatus) -> Self {
        self.status = status;
        self
    }

    pub fn price(mut self, price: Price) -> Self {
        self.price = Some(price);
        self
    }

    /// Text fed into the full-text index: every title and description entry.
    pub fn search_text(&self) -> String {
        self.title
            .entries()
            .iter()
            .chain(self.description.iter().flat_map(|d| d.entries()))
            .map(|t| t.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// String form of an attribute value used for exact-match filtering.
///
/// Mirrors a JSON `->>` lookup: strings verbatim, other scalars and
/// containers as JSON text, nulls yield nothing.
pub fn attribute_index_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text(lang: Language, value: &str) -> Translation {
        Translation {
            lang,
            text: TranslationText::new(value).unwrap(),
        }
    }

    #[test]
    fn localized_text_requires_an_entry() {
        assert!(LocalizedText::new(vec![]).is_err());
    }

    #[test]
    fn localized_text_rejects_duplicate_languages() {
        let err = LocalizedText::new(vec![
            text(Language::English, "Bike"),
            text(Language::English, "Bicycle"),
        ])
        .unwrap_err();
        assert!(matches!(err, TypeConstraintError::InvalidValue(_)));
    }

    #[test]
    fn text_for_falls_back_to_english_then_first() {
        let title = LocalizedText::new(vec![
            text(Language::Russian, "Велосипед"),
            text(Language::English, "Bike"),
        ])
        .unwrap();
        assert_eq!(title.text_for(Language::Russian), "Велосипед");
        assert_eq!(title.text_for(Language::Turkish), "Bike");

        let only_turkish = LocalizedText::new(vec![text(Language::Turkish, "Bisiklet")]).unwrap();
        assert_eq!(only_turkish.text_for(Language::English), "Bisiklet");
    }

    #[test]
    fn search_text_joins_title_and_description() {
        let ad = NewAd::new(LocalizedText::new(vec![text(Language::English, "Red bike")]).unwrap())
            .description(LocalizedText::new(vec![text(Language::English, "Barely used")]).unwrap());
        assert_eq!(ad.search_text(), "Red bike Barely used");
    }

    #[test]
    fn categories_are_deduplicated_and_sorted() {
        let ids = [3, 1, 3, 2].map(|id| CategoryId::new(id).unwrap());
        let ad = NewAd::new(LocalizedText::new(vec![text(Language::English, "x")]).unwrap())
            .categories(ids);
        let raw: Vec<i32> = ad.category_ids.iter().map(|c| c.get()).collect();
        assert_eq!(raw, vec![1, 2, 3]);
    }

    #[test]
    fn price_accepts_legacy_value_field() {
        let price: Price = serde_json::from_value(json!({"value": 10.5, "currency": "840"})).unwrap();
        assert_eq!(price.amount, 10.5);
        assert_eq!(price.currency, CurrencyCode::USD);
    }

    #[test]
    fn attribute_values_follow_text_extraction() {
        assert_eq!(attribute_index_value(&json!("red")).as_deref(), Some("red"));
        assert_eq!(attribute_index_value(&json!(3)).as_deref(), Some("3"));
        assert_eq!(attribute_index_value(&json!(true)).as_deref(), Some("true"));
        assert_eq!(attribute_index_value(&json!(null)), None);
    }
}
