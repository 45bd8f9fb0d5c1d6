//! CLI subcommands.

pub mod admin;
pub mod migrate;

/// Database URL from `INSTASHOP_DATABASE_URL`, falling back to `DATABASE_URL`.
pub fn database_url() -> Option<String> {
    std::env::var("INSTASHOP_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
}
