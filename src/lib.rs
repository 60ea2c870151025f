//! Core library exports for the adverts service.
//!
//! The `data` feature exposes the persistence layer (domain types, Diesel
//! models, schema, database setup and repositories). The `server` feature
//! adds the cache, forms, services and Actix-web routes on top of it.

pub mod db;
pub mod domain;
pub mod error_conversions;
pub mod models;
pub mod repository;
pub mod schema;

#[cfg(feature = "server")]
pub mod cache;
#[cfg(feature = "server")]
pub mod forms;
#[cfg(feature = "server")]
pub mod routes;
#[cfg(feature = "server")]
pub mod services;
