use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;

use eduhub_core::{CourseId, LessonId};

use crate::app::dto;
use crate::app::errors::{ApiError, json_body};
use crate::app::services::{AppServices, run_blocking};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/profile", get(profile).put(update_profile))
        .route("/enrolled-courses", get(enrolled_courses))
        .route("/created-courses", get(created_courses))
        .route("/unenroll/:course_id", post(unenroll))
        .route(
            "/complete-lesson/:course_id/:lesson_id",
            post(complete_lesson),
        )
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    payload: Result<Json<dto::RegisterRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let input = json_body(payload)?;
    let user = run_blocking(move || {
        services
            .domain
            .users
            .register(principal.principal(), input.into())
    })
    .await?;
    Ok((StatusCode::CREATED, Json(user)).into_response())
}

pub async fn profile(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<Response, ApiError> {
    let user = run_blocking(move || services.domain.users.profile(principal.user_id())).await?;
    Ok(Json(user).into_response())
}

pub async fn update_profile(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    payload: Result<Json<dto::UpdateProfileRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let patch = json_body(payload)?;
    let user = run_blocking(move || {
        services
            .domain
            .users
            .update_profile(principal.principal(), patch.into())
    })
    .await?;
    Ok(Json(user).into_response())
}

pub async fn enrolled_courses(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<Response, ApiError> {
    let courses =
        run_blocking(move || services.domain.users.enrolled_courses(principal.user_id())).await?;
    Ok(Json(courses).into_response())
}

pub async fn created_courses(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<Response, ApiError> {
    let courses =
        run_blocking(move || services.domain.courses.created_by(principal.user_id())).await?;
    Ok(Json(courses).into_response())
}

pub async fn unenroll(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(course_id): Path<String>,
) -> Result<Response, ApiError> {
    let course_id: CourseId = course_id.parse()?;
    run_blocking(move || {
        services
            .domain
            .enrollments
            .unenroll(principal.principal(), course_id)
    })
    .await?;
    Ok(Json(json!({ "message": "Successfully unenrolled from course" })).into_response())
}

pub async fn complete_lesson(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path((course_id, lesson_id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let course_id: CourseId = course_id.parse()?;
    let lesson_id: LessonId = lesson_id.parse()?;
    let progress = run_blocking(move || {
        services
            .domain
            .enrollments
            .complete_lesson(principal.principal(), course_id, lesson_id)
    })
    .await?;
    Ok(Json(json!({
        "message": "Lesson marked as completed",
        "progress": progress,
    }))
    .into_response())
}
