pub mod api;
pub mod config;
pub mod db;
pub mod editor;
pub mod error;
pub mod models;
pub mod service;

pub use api::{build_router, AppState};
pub use config::AppConfig;
pub use db::create_pool;
pub use editor::{EditMode, EditorSession, SessionRegistry};
pub use service::{LookupService, PersistenceAdapter};
