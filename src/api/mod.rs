pub mod handlers;

pub use handlers::*;

use axum::{
    routing::{get, post, put},
    Router,
};

/// 构建路由
pub fn build_router(state: AppState) -> Router {
    let sessions = Router::new()
        .route("/", post(open_session))
        .route("/:id", get(get_session).delete(close_session))
        .route("/:id/header", put(set_header))
        .route("/:id/reset", post(reset_session))
        .route("/:id/form", put(set_form))
        .route("/:id/lines", post(add_line))
        .route("/:id/lines.csv", get(export_lines))
        .route("/:id/lines/:index", put(update_line).delete(delete_line))
        .route("/:id/lines/:index/edit", post(begin_edit))
        .route("/:id/edit/cancel", post(cancel_edit))
        .route("/:id/save", post(save_line))
        .route("/:id/products", get(search_products))
        .route("/:id/customers", get(search_customers))
        .route("/:id/submit", post(submit));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/sessions", sessions)
        .route("/api/collections/footer", post(collection_footer))
        .with_state(state)
}
