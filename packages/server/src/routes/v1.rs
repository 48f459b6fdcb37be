use axum::{
    Router,
    routing::{get, post},
};

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(handlers::auth::login))
        .merge(result_routes())
}

fn result_routes() -> Router<AppState> {
    let collection = get(handlers::results::list_results)
        .post(handlers::results::create_result)
        .options(handlers::results::collection_options);

    Router::new()
        .route("/results", collection.clone())
        .route("/results.json", collection.clone())
        .route("/results.xml", collection)
        .route(
            "/results/{id}",
            get(handlers::results::get_result)
                .put(handlers::results::update_result)
                .delete(handlers::results::delete_result)
                .options(handlers::results::item_options),
        )
}
