use std::collections::HashMap;

use chrono::{NaiveDateTime, Utc};
use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::sql_types::{Bool, Integer, Text};
use diesel::sqlite::{Sqlite, SqliteConnection};

use crate::domain::ad::{Ad, NewAd};
use crate::domain::filter::{FilterRequest, PaginatedResponse, SortOrder};
use crate::domain::types::AdId;
use crate::models::ad::{Ad as DbAd, NewAd as DbNewAd, NewAdAttribute, NewAdCategory};
use crate::repository::{AdReader, AdWriter, DieselRepository, RepositoryError, RepositoryResult};

/// Sort key of the ad a page token points at.
struct Cursor {
    id: i32,
    price_amount: Option<f64>,
    created_at: NaiveDateTime,
}

/// Turn free text into an FTS5 expression requiring every term.
///
/// Terms are quoted so user input never reaches the FTS5 query grammar.
fn fts_query(text: &str) -> Option<String> {
    let terms: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|term| !term.is_empty())
        .map(|term| format!("\"{term}\""))
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" "))
    }
}

fn load_categories(
    conn: &mut SqliteConnection,
    ad_ids: &[i32],
) -> RepositoryResult<HashMap<i32, Vec<i32>>> {
    use crate::schema::ad_categories;

    let rows: Vec<(i32, i32)> = ad_categories::table
        .filter(ad_categories::ad_id.eq_any(ad_ids.to_vec()))
        .select((ad_categories::ad_id, ad_categories::category_id))
        .order((ad_categories::ad_id.asc(), ad_categories::category_id.asc()))
        .load(conn)?;

    let mut categories: HashMap<i32, Vec<i32>> = HashMap::new();
    for (ad_id, category_id) in rows {
        categories.entry(ad_id).or_default().push(category_id);
    }
    Ok(categories)
}

/// Map rows onto domain ads, preserving row order.
fn hydrate(conn: &mut SqliteConnection, rows: Vec<DbAd>) -> RepositoryResult<Vec<Ad>> {
    let ids: Vec<i32> = rows.iter().map(|row| row.id).collect();
    let mut categories = load_categories(conn, &ids)?;

    rows.into_iter()
        .map(|row| {
            let category_ids = categories.remove(&row.id).unwrap_or_default();
            row.into_domain(category_ids).map_err(RepositoryError::from)
        })
        .collect()
}

fn hydrate_one(conn: &mut SqliteConnection, row: DbAd) -> RepositoryResult<Ad> {
    hydrate(conn, vec![row])?
        .pop()
        .ok_or_else(|| RepositoryError::NotFound("ad vanished while loading".to_string()))
}

/// Insert category membership, attribute index and search index rows.
fn write_dependents(conn: &mut SqliteConnection, ad_id: i32, ad: &NewAd) -> RepositoryResult<()> {
    use crate::schema::{ad_attributes, ad_categories};

    let categories = NewAdCategory::for_ad(ad_id, ad);
    if !categories.is_empty() {
        diesel::insert_into(ad_categories::table)
            .values(&categories)
            .execute(conn)?;
    }

    let attributes = NewAdAttribute::for_ad(ad_id, ad);
    if !attributes.is_empty() {
        diesel::insert_into(ad_attributes::table)
            .values(&attributes)
            .execute(conn)?;
    }

    diesel::sql_query("INSERT INTO ads_search (rowid, content) VALUES (?, ?)")
        .bind::<Integer, _>(ad_id)
        .bind::<Text, _>(ad.search_text())
        .execute(conn)?;

    Ok(())
}

fn clear_dependents(conn: &mut SqliteConnection, ad_id: i32) -> RepositoryResult<()> {
    use crate::schema::{ad_attributes, ad_categories};

    diesel::delete(ad_categories::table.filter(ad_categories::ad_id.eq(ad_id))).execute(conn)?;
    diesel::delete(ad_attributes::table.filter(ad_attributes::ad_id.eq(ad_id))).execute(conn)?;
    diesel::sql_query("DELETE FROM ads_search WHERE rowid = ?")
        .bind::<Integer, _>(ad_id)
        .execute(conn)?;

    Ok(())
}

impl AdReader for DieselRepository {
    fn list_ads(&self, filter: &FilterRequest) -> RepositoryResult<PaginatedResponse> {
        use crate::schema::{ad_attributes, ad_categories, ads};

        let mut conn = self.conn()?;
        let text_query = filter.query.as_deref().and_then(fts_query);

        let query_builder = || {
            let mut items = ads::table.into_boxed::<Sqlite>();

            if !filter.category_ids.is_empty() {
                let category_ids: Vec<i32> = filter.category_ids.iter().map(|c| c.get()).collect();
                items = items.filter(
                    ads::id.eq_any(
                        ad_categories::table
                            .filter(ad_categories::category_id.eq_any(category_ids))
                            .select(ad_categories::ad_id),
                    ),
                );
            }

            if let Some(text) = &text_query {
                items = items.filter(
                    sql::<Bool>("ads.id IN (SELECT rowid FROM ads_search WHERE ads_search MATCH ")
                        .bind::<Text, _>(text.clone())
                        .sql(")"),
                );
            }

            if let Some(status) = filter.status {
                items = items.filter(ads::status.eq(status.ordinal()));
            }

            for attribute in filter.attributes.iter().filter(|a| !a.values.is_empty()) {
                items = items.filter(
                    ads::id.eq_any(
                        ad_attributes::table
                            .filter(ad_attributes::name.eq(attribute.name.as_str().to_string()))
                            .filter(ad_attributes::value.eq_any(attribute.values.clone()))
                            .select(ad_attributes::ad_id),
                    ),
                );
            }

            if let Some(currency) = filter.currency {
                items = items.filter(ads::price_currency.eq(currency.get()));
            }
            if let Some(min_price) = filter.min_price {
                items = items.filter(ads::price_amount.ge(min_price));
            }
            if let Some(max_price) = filter.max_price {
                items = items.filter(ads::price_amount.le(max_price));
            }

            items
        };

        let total_count = query_builder().count().get_result::<i64>(&mut conn)?;

        let cursor = match filter.page_token {
            Some(token) => {
                let (id, price_amount, created_at) = ads::table
                    .find(token.get())
                    .select((ads::id, ads::price_amount, ads::created_at))
                    .first::<(i32, Option<f64>, NaiveDateTime)>(&mut conn)
                    .optional()?
                    .ok_or_else(|| RepositoryError::NotFound(format!("page token {token}")))?;
                Some(Cursor {
                    id,
                    price_amount,
                    created_at,
                })
            }
            None => None,
        };

        let mut items = query_builder();

        // Keyset seek past the cursor row; every order ends with an id
        // tie-break so the seek is exact.
        items = match filter.sort {
            SortOrder::DateDesc => {
                if let Some(cursor) = &cursor {
                    items = items.filter(
                        ads::created_at.lt(cursor.created_at).or(ads::created_at
                            .eq(cursor.created_at)
                            .and(ads::id.lt(cursor.id))),
                    );
                }
                items
                    .order_by(ads::created_at.desc())
                    .then_order_by(ads::id.desc())
            }
            SortOrder::PriceAsc => {
                if let Some(cursor) = &cursor {
                    items = match cursor.price_amount {
                        Some(price) => items.filter(
                            ads::price_amount
                                .is_null()
                                .or(ads::price_amount.assume_not_null().gt(price))
                                .or(ads::price_amount
                                    .assume_not_null()
                                    .eq(price)
                                    .and(ads::id.gt(cursor.id))),
                        ),
                        None => items.filter(ads::price_amount.is_null().and(ads::id.gt(cursor.id))),
                    };
                }
                items
                    .order_by(ads::price_amount.is_null().asc())
                    .then_order_by(ads::price_amount.asc())
                    .then_order_by(ads::id.asc())
            }
            SortOrder::PriceDesc => {
                if let Some(cursor) = &cursor {
                    items = match cursor.price_amount {
                        Some(price) => items.filter(
                            ads::price_amount
                                .is_null()
                                .or(ads::price_amount.assume_not_null().lt(price))
                                .or(ads::price_amount
                                    .assume_not_null()
                                    .eq(price)
                                    .and(ads::id.gt(cursor.id))),
                        ),
                        None => items.filter(ads::price_amount.is_null().and(ads::id.gt(cursor.id))),
                    };
                }
                items
                    .order_by(ads::price_amount.is_null().asc())
                    .then_order_by(ads::price_amount.desc())
                    .then_order_by(ads::id.asc())
            }
        };

        // One extra row tells whether another page follows.
        let page_size = filter.effective_page_size();
        let limit = i64::try_from(page_size + 1).map_err(|_| {
            RepositoryError::ValidationError(format!("page size {page_size} is out of range"))
        })?;
        let mut rows = items.limit(limit).load::<DbAd>(&mut conn)?;

        let next_page = if rows.len() > page_size {
            rows.truncate(page_size);
            rows.last().map(|row| row.id.to_string())
        } else {
            None
        };

        let items = hydrate(&mut conn, rows)?;

        Ok(PaginatedResponse {
            items,
            next_page,
            total_count,
        })
    }

    fn get_ad_by_id(&self, id: AdId) -> RepositoryResult<Option<Ad>> {
        use crate::schema::ads;

        let mut conn = self.conn()?;

        let row = ads::table
            .find(id.get())
            .first::<DbAd>(&mut conn)
            .optional()?;

        row.map(|row| hydrate_one(&mut conn, row)).transpose()
    }
}

impl AdWriter for DieselRepository {
    fn create_ad(&self, ad: &NewAd) -> RepositoryResult<Ad> {
        use crate::schema::ads;

        let mut conn = self.conn()?;
        let db_ad = DbNewAd::from_domain(ad, Utc::now().naive_utc())?;

        let inserted = conn.transaction::<_, RepositoryError, _>(|conn| {
            let inserted = diesel::insert_into(ads::table)
                .values(&db_ad)
                .returning(DbAd::as_returning())
                .get_result(conn)?;
            write_dependents(conn, inserted.id, ad)?;
            Ok(inserted)
        })?;

        hydrate_one(&mut conn, inserted)
    }

    fn update_ad(&self, id: AdId, ad: &NewAd) -> RepositoryResult<Option<Ad>> {
        use crate::schema::ads;

        let mut conn = self.conn()?;
        let db_ad = DbNewAd::from_domain(ad, Utc::now().naive_utc())?;

        let updated = conn.transaction::<_, RepositoryError, _>(|conn| {
            let updated = diesel::update(ads::table.find(id.get()))
                .set(&db_ad)
                .returning(DbAd::as_returning())
                .get_result(conn)
                .optional()?;

            if let Some(updated) = &updated {
                clear_dependents(conn, updated.id)?;
                write_dependents(conn, updated.id, ad)?;
            }
            Ok(updated)
        })?;

        updated.map(|row| hydrate_one(&mut conn, row)).transpose()
    }

    fn delete_ad(&self, id: AdId) -> RepositoryResult<usize> {
        use crate::schema::ads;

        let mut conn = self.conn()?;

        let affected = conn.transaction::<_, RepositoryError, _>(|conn| {
            clear_dependents(conn, id.get())?;
            Ok(diesel::delete(ads::table.find(id.get())).execute(conn)?)
        })?;

        Ok(affected)
    }
}
