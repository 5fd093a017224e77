//! Read-only administrative API.

mod admin;

#[cfg(test)]
mod admin_tests;

pub use admin::router;
