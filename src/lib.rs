//! Ledgerly data portability.
//!
//! Exports the business data kept in a document store (students, invoices,
//! monthly attendance and the business profile) to a single JSON artifact,
//! re-imports such artifacts with merge semantics, and erases all managed
//! collections.

pub mod backup;
pub mod commands;
pub mod config;
pub mod db;
pub mod models;
pub mod store;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
