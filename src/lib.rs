pub mod api;
pub mod auth;
pub mod error;
pub mod list;
pub mod scrape;
pub mod search;
pub mod tracing;

pub mod util {
    pub mod db;
    pub mod env;
}
