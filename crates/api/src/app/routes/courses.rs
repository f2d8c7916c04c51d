use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Extension, Path, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use eduhub_catalog::{LessonPatch, NewLesson};
use eduhub_core::{CourseId, LessonId};

use crate::app::dto;
use crate::app::errors::{ApiError, json_body, query_params};
use crate::app::services::{AppServices, run_blocking};
use crate::context::PrincipalContext;

pub async fn list_courses(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<dto::ListCoursesQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let (filter, request) = query_params(query)?.into_domain(services.paging)?;
    let page =
        run_blocking(move || services.domain.courses.list_published(&filter, request)).await?;
    Ok(Json(dto::CourseListResponse::from(page)).into_response())
}

pub async fn get_course(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let course_id: CourseId = id.parse()?;
    let course = run_blocking(move || services.domain.courses.get_detail(course_id)).await?;
    Ok(Json(course).into_response())
}

pub async fn create_course(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    payload: Result<Json<dto::CreateCourseRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let (input, is_published) = json_body(payload)?.into_domain()?;
    let course = run_blocking(move || {
        services
            .domain
            .courses
            .create(principal.principal(), input, is_published)
    })
    .await?;
    Ok((StatusCode::CREATED, Json(course)).into_response())
}

pub async fn update_course(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    payload: Result<Json<dto::UpdateCourseRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let course_id: CourseId = id.parse()?;
    let patch = json_body(payload)?.into_domain()?;
    let course = run_blocking(move || {
        services
            .domain
            .courses
            .update(principal.principal(), course_id, patch)
    })
    .await?;
    Ok(Json(course).into_response())
}

pub async fn delete_course(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let course_id: CourseId = id.parse()?;
    run_blocking(move || {
        services
            .domain
            .courses
            .delete(principal.principal(), course_id)
    })
    .await?;
    Ok(Json(json!({ "message": "Course deleted successfully" })).into_response())
}

pub async fn enroll(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let course_id: CourseId = id.parse()?;
    let enrollment = run_blocking(move || {
        services
            .domain
            .enrollments
            .enroll(principal.principal(), course_id)
    })
    .await?;
    Ok(Json(json!({
        "message": "Successfully enrolled in course",
        "enrollment": enrollment,
    }))
    .into_response())
}

pub async fn add_lesson(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    payload: Result<Json<NewLesson>, JsonRejection>,
) -> Result<Response, ApiError> {
    let course_id: CourseId = id.parse()?;
    let input = json_body(payload)?;
    let (lesson_id, course) = run_blocking(move || {
        services
            .domain
            .courses
            .add_lesson(principal.principal(), course_id, input)
    })
    .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "lessonId": lesson_id, "course": course })),
    )
        .into_response())
}

pub async fn update_lesson(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path((id, lesson_id)): Path<(String, String)>,
    payload: Result<Json<LessonPatch>, JsonRejection>,
) -> Result<Response, ApiError> {
    let course_id: CourseId = id.parse()?;
    let lesson_id: LessonId = lesson_id.parse()?;
    let patch = json_body(payload)?;
    let course = run_blocking(move || {
        services
            .domain
            .courses
            .update_lesson(principal.principal(), course_id, lesson_id, patch)
    })
    .await?;
    Ok(Json(course).into_response())
}

pub async fn remove_lesson(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path((id, lesson_id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let course_id: CourseId = id.parse()?;
    let lesson_id: LessonId = lesson_id.parse()?;
    let course = run_blocking(move || {
        services
            .domain
            .courses
            .remove_lesson(principal.principal(), course_id, lesson_id)
    })
    .await?;
    Ok(Json(course).into_response())
}
