use axum::{
    Router,
    routing::{get, post, put},
};

pub mod courses;
pub mod system;
pub mod users;

/// Endpoints readable without a token.
pub fn public_router() -> Router {
    Router::new()
        .route("/courses", get(courses::list_courses))
        .route("/courses/:id", get(courses::get_course))
}

/// Endpoints that require an authenticated caller.
pub fn protected_router() -> Router {
    Router::new()
        .route("/courses", post(courses::create_course))
        .route(
            "/courses/:id",
            put(courses::update_course).delete(courses::delete_course),
        )
        .route("/courses/:id/enroll", post(courses::enroll))
        .route("/courses/:id/lessons", post(courses::add_lesson))
        .route(
            "/courses/:id/lessons/:lesson_id",
            put(courses::update_lesson).delete(courses::remove_lesson),
        )
        .nest("/users", users::router())
}
