use axum::{
    Router,
    http::Method,
    routing::{get, post, put},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::web::auth::{create_user, healthcheck, issue_token};
use crate::web::records::{
    create_record, delete_record, get_record, list_records, record_history, update_record,
};
use crate::web::schemas::{
    declare_schema, get_schema, list_permissions, list_schemas, list_versions, revise_schema,
    rollback_schema, set_permissions,
};
use crate::web::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/auth/token", post(issue_token))
        .route("/auth/users", post(create_user))
        .route("/schemas", post(declare_schema).get(list_schemas))
        .route("/schemas/:entity", get(get_schema).put(revise_schema))
        .route("/schemas/:entity/versions", get(list_versions))
        .route("/schemas/:entity/rollback/:version", post(rollback_schema))
        .route("/schemas/:entity/permissions", get(list_permissions))
        .route("/schemas/:entity/permissions/:role", put(set_permissions))
        // Entity routes last; static segments above take priority.
        .route("/:entity", post(create_record).get(list_records))
        .route(
            "/:entity/:id",
            get(get_record).put(update_record).delete(delete_record),
        )
        .route("/:entity/:id/history", get(record_history))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ]),
        )
        .with_state(state)
}
