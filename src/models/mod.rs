pub mod ad;
#[cfg(feature = "server")]
pub mod config;
