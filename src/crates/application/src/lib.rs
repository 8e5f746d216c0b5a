pub mod config;
pub mod error;
pub mod history;
pub mod image;
pub mod rate_limit;
pub mod shared;
pub mod streak;

#[cfg(test)]
pub(crate) mod testing;
