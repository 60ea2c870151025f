use crate::db::{DbConnection, DbPool};
use crate::domain::ad::{Ad, NewAd};
use crate::domain::filter::{FilterRequest, PaginatedResponse};
use crate::domain::types::AdId;

pub mod ad;
pub mod errors;

pub use errors::{RepositoryError, RepositoryResult};

/// Repository implementation backed by Diesel and SQLite.
///
/// The underlying `r2d2::Pool` is cheap to clone, allowing the repository to
/// be passed around freely between handlers.
#[derive(Clone)]
pub struct DieselRepository {
    pool: DbPool, // r2d2::Pool is cheap to clone
}

impl DieselRepository {
    /// Create a new repository from an established database pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get a pooled database connection.
    fn conn(&self) -> RepositoryResult<DbConnection> {
        Ok(self.pool.get()?)
    }
}

/// Read-only operations for ad entities.
pub trait AdReader {
    /// Return one page of ads matching the filter together with the total
    /// number of matches and a continuation token.
    ///
    /// A page token that refers to a missing ad yields
    /// [`RepositoryError::NotFound`].
    fn list_ads(&self, filter: &FilterRequest) -> RepositoryResult<PaginatedResponse>;
    /// Retrieve an ad by its identifier.
    fn get_ad_by_id(&self, id: AdId) -> RepositoryResult<Option<Ad>>;
}

/// Write operations for ad entities.
pub trait AdWriter {
    /// Persist a new ad, returning it with its assigned id and timestamps.
    fn create_ad(&self, ad: &NewAd) -> RepositoryResult<Ad>;
    /// Fully replace an existing ad. Returns `None` when no such ad exists.
    fn update_ad(&self, id: AdId, ad: &NewAd) -> RepositoryResult<Option<Ad>>;
    /// Delete an ad, returning the number of deleted ads.
    fn delete_ad(&self, id: AdId) -> RepositoryResult<usize>;
}
