use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::ad::{
    Ad as DomainAd, Attributes, LocalizedText, NewAd as DomainNewAd, Price,
    attribute_index_value,
};
use crate::domain::types::{
    AdId, AdStatus, CategoryId, CurrencyCode, PriceAmount, TypeConstraintError,
};

/// Diesel model representing the `ads` table.
#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::ads)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Ad {
    pub id: i32,
    /// JSON encoded list of translations.
    pub title: String,
    pub description: Option<String>,
    /// JSON encoded attribute object.
    pub attributes: String,
    pub status: i32,
    pub price_amount: Option<f64>,
    pub price_currency: Option<i32>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Insertable/patchable form of [`Ad`].
///
/// `created_at` is skipped on update so the original timestamp survives a
/// full replace.
#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = crate::schema::ads)]
#[diesel(treat_none_as_null = true)]
pub struct NewAd {
    pub title: String,
    pub description: Option<String>,
    pub attributes: String,
    pub status: i32,
    pub price_amount: Option<f64>,
    pub price_currency: Option<i32>,
    #[diesel(skip_update)]
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::ad_categories)]
pub struct NewAdCategory {
    pub ad_id: i32,
    pub category_id: i32,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::ad_attributes)]
pub struct NewAdAttribute {
    pub ad_id: i32,
    pub name: String,
    pub value: String,
}

fn decode_json<T: serde::de::DeserializeOwned>(
    raw: &str,
    field: &'static str,
) -> Result<T, TypeConstraintError> {
    serde_json::from_str(raw)
        .map_err(|e| TypeConstraintError::InvalidValue(format!("stored {field}: {e}")))
}

fn encode_json<T: serde::Serialize>(
    value: &T,
    field: &'static str,
) -> Result<String, TypeConstraintError> {
    serde_json::to_string(value)
        .map_err(|e| TypeConstraintError::InvalidValue(format!("encoding {field}: {e}")))
}

impl Ad {
    /// Converts the row into a domain ad, attaching its category set.
    pub fn into_domain(self, category_ids: Vec<i32>) -> Result<DomainAd, TypeConstraintError> {
        let price = match (self.price_amount, self.price_currency) {
            (Some(amount), Some(currency)) => Some(Price {
                amount: PriceAmount::new(amount)?,
                currency: CurrencyCode::new(currency)?,
            }),
            (None, None) => None,
            (amount, currency) => {
                return Err(TypeConstraintError::InvalidValue(format!(
                    "stored price of ad {}: amount {amount:?} with currency {currency:?}",
                    self.id
                )));
            }
        };

        Ok(DomainAd {
            id: AdId::new(self.id)?,
            title: decode_json::<LocalizedText>(&self.title, "title")?,
            description: self
                .description
                .as_deref()
                .map(|raw| decode_json::<LocalizedText>(raw, "description"))
                .transpose()?,
            attributes: decode_json::<Attributes>(&self.attributes, "attributes")?,
            category_ids: category_ids
                .into_iter()
                .map(CategoryId::new)
                .collect::<Result<_, _>>()?,
            status: AdStatus::try_from(self.status)?,
            price,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl NewAd {
    pub fn from_domain(ad: &DomainNewAd, now: NaiveDateTime) -> Result<Self, TypeConstraintError> {
        Ok(Self {
            title: encode_json(&ad.title, "title")?,
            description: ad
                .description
                .as_ref()
                .map(|d| encode_json(d, "description"))
                .transpose()?,
            attributes: encode_json(&ad.attributes, "attributes")?,
            status: ad.status.ordinal(),
            price_amount: ad.price.map(|p| p.amount.get()),
            price_currency: ad.price.map(|p| p.currency.get()),
            created_at: now,
            updated_at: now,
        })
    }
}

impl NewAdCategory {
    pub fn for_ad(ad_id: i32, ad: &DomainNewAd) -> Vec<Self> {
        ad.category_ids
            .iter()
            .map(|category_id| Self {
                ad_id,
                category_id: category_id.get(),
            })
            .collect()
    }
}

impl NewAdAttribute {
    pub fn for_ad(ad_id: i32, ad: &DomainNewAd) -> Vec<Self> {
        ad.attributes
            .iter()
            .filter_map(|(name, value)| {
                attribute_index_value(value).map(|value| Self {
                    ad_id,
                    name: name.clone(),
                    value,
                })
            })
            .collect()
    }
}
