//! Blog API: REST resources for posts and their categories on PostgreSQL.

pub mod case;
pub mod config;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod migration;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod store;

pub use config::{BlogModel, Settings};
pub use error::{AppError, SettingsError};
pub use gateway::{Gateway, MemoryGateway, PgGateway};
pub use migration::apply_migrations;
pub use routes::{app, blog_routes, common_routes, API_PREFIX};
pub use service::{CategoryService, PostService};
pub use state::AppState;
pub use store::{connect, ensure_database_exists};
