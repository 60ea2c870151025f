//! Ad use cases: cached listing and cache-invalidating writes.

use std::time::Duration;

use crate::cache::keys::{ADS_GENERATION_KEY, ads_filter_key};
use crate::cache::{CacheError, CacheStore};
use crate::domain::ad::{Ad, NewAd};
use crate::domain::filter::{FilterRequest, PaginatedResponse};
use crate::domain::types::{AdId, Language};
use crate::repository::{AdReader, AdWriter, RepositoryError};

use super::{ServiceError, ServiceResult};

/// How long a cached listing stays valid when no write intervenes.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Current generation of the `ads` cache namespace.
///
/// Returns `None` when the cache cannot tell, in which case callers bypass
/// the cache entirely.
fn current_generation<C>(cache: &C) -> Option<u64>
where
    C: CacheStore + ?Sized,
{
    match cache.get(ADS_GENERATION_KEY) {
        Ok(None) => Some(0),
        Ok(Some(raw)) => match raw.parse::<u64>() {
            Ok(generation) => Some(generation),
            Err(e) => {
                log::warn!("Ignoring unreadable ads cache generation {raw:?}: {e}");
                None
            }
        },
        Err(e) => {
            log::warn!("Failed to read ads cache generation: {e}");
            None
        }
    }
}

fn read_cached<C>(cache: &C, key: &str) -> Option<PaginatedResponse>
where
    C: CacheStore + ?Sized,
{
    let payload = match cache.get(key) {
        Ok(Some(payload)) => payload,
        Ok(None) => return None,
        Err(e) => {
            log::warn!("Failed to read cached ads: {e}");
            return None;
        }
    };

    match serde_json::from_str(&payload) {
        Ok(response) => Some(response),
        Err(e) => {
            let corrupt = CacheError::Corrupt {
                key: key.to_string(),
                detail: e.to_string(),
            };
            log::warn!("{corrupt}");
            if let Err(e) = cache.delete(key) {
                log::warn!("Failed to drop corrupt cache entry: {e}");
            }
            None
        }
    }
}

fn store_cached<C>(cache: &C, key: &str, response: &PaginatedResponse, ttl: Duration)
where
    C: CacheStore + ?Sized,
{
    let payload = match serde_json::to_string(response) {
        Ok(payload) => payload,
        Err(e) => {
            log::warn!("Failed to encode ads for caching: {e}");
            return;
        }
    };

    if let Err(e) = cache.set(key, payload, Some(ttl)) {
        log::warn!("Failed to cache ads: {e}");
    }
}

/// Make every cached listing unreachable by moving to a new generation.
fn invalidate_ads<C>(cache: &C)
where
    C: CacheStore + ?Sized,
{
    match cache.increment(ADS_GENERATION_KEY) {
        Ok(generation) => log::debug!("Ads cache moved to generation {generation}"),
        Err(e) => log::warn!("Failed to invalidate ads cache: {e}"),
    }
}

/// Return one page of ads matching `filter`, served from the cache when a
/// fresh entry exists.
///
/// Cache failures never fail the request: the repository answers instead.
/// A page token that does not refer to an existing ad yields
/// [`ServiceError::InvalidPageToken`].
pub fn get_ads<R, C>(
    filter: &FilterRequest,
    repo: &R,
    cache: &C,
    ttl: Duration,
) -> ServiceResult<PaginatedResponse>
where
    R: AdReader,
    C: CacheStore + ?Sized,
{
    let key = current_generation(cache).map(|generation| ads_filter_key(generation, filter));

    if let Some(key) = &key {
        if let Some(response) = read_cached(cache, key) {
            log::debug!("Serving ads from cache: {key}");
            return Ok(response);
        }
    }

    let response = match repo.list_ads(filter) {
        Ok(response) => response,
        Err(RepositoryError::NotFound(e)) => {
            log::debug!("Rejecting ads listing: {e}");
            return Err(ServiceError::InvalidPageToken);
        }
        Err(e) => {
            log::error!("Failed to list ads: {e}");
            return Err(ServiceError::Internal(e.to_string()));
        }
    };

    if let Some(key) = &key {
        store_cached(cache, key, &response, ttl);
    }

    Ok(response)
}

/// Fetch a single ad. Not cached.
pub fn get_ad<R>(id: AdId, repo: &R) -> ServiceResult<Ad>
where
    R: AdReader,
{
    match repo.get_ad_by_id(id) {
        Ok(Some(ad)) => Ok(ad),
        Ok(None) => Err(ServiceError::NotFound),
        Err(e) => {
            log::error!("Failed to get ad {id}: {e}");
            Err(ServiceError::Internal(e.to_string()))
        }
    }
}

/// Persist a new ad and invalidate cached listings.
pub fn create_ad<R, C>(ad: NewAd, repo: &R, cache: &C) -> ServiceResult<Ad>
where
    R: AdWriter,
    C: CacheStore + ?Sized,
{
    let created = match repo.create_ad(&ad) {
        Ok(created) => created,
        Err(e) => {
            log::error!("Failed to create ad: {e}");
            return Err(ServiceError::Internal(e.to_string()));
        }
    };

    log::info!(
        "Created ad {} \"{}\"",
        created.id,
        created.title.text_for(Language::English)
    );
    invalidate_ads(cache);
    Ok(created)
}

/// Replace an existing ad and invalidate cached listings.
pub fn update_ad<R, C>(id: AdId, ad: NewAd, repo: &R, cache: &C) -> ServiceResult<Ad>
where
    R: AdWriter,
    C: CacheStore + ?Sized,
{
    let updated = match repo.update_ad(id, &ad) {
        Ok(Some(updated)) => updated,
        Ok(None) => return Err(ServiceError::NotFound),
        Err(e) => {
            log::error!("Failed to update ad {id}: {e}");
            return Err(ServiceError::Internal(e.to_string()));
        }
    };

    log::info!(
        "Updated ad {} \"{}\"",
        updated.id,
        updated.title.text_for(Language::English)
    );
    invalidate_ads(cache);
    Ok(updated)
}

/// Delete an ad and invalidate cached listings.
pub fn delete_ad<R, C>(id: AdId, repo: &R, cache: &C) -> ServiceResult<()>
where
    R: AdWriter,
    C: CacheStore + ?Sized,
{
    match repo.delete_ad(id) {
        Ok(0) => Err(ServiceError::NotFound),
        Ok(_) => {
            log::info!("Deleted ad {id}");
            invalidate_ads(cache);
            Ok(())
        }
        Err(e) => {
            log::error!("Failed to delete ad {id}: {e}");
            Err(ServiceError::Internal(e.to_string()))
        }
    }
}
