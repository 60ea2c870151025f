pub mod ad;
pub mod filter;
pub mod types;
