use std::collections::BTreeSet;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query};
use axum::{Router, extract::State, http::StatusCode, routing::get};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::AppError;
use crate::models::enrollment::EnrollRequest;
use crate::models::*;
use crate::state::AppState;
use crate::store::StoreError;

#[derive(Deserialize)]
struct CourseQueryParams {
    category: Option<String>,
}

/// A saved record echoed back with a confirmation message.
#[derive(Serialize)]
struct Saved<T> {
    #[serde(flatten)]
    record: T,
    message: String,
}

#[derive(Serialize)]
struct Message {
    message: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/categories", get(list_categories))
        .route("/courses", get(list_courses).post(create::<Course>))
        .route(
            "/courses/{id}",
            get(get_one::<Course>)
                .put(update::<Course>)
                .delete(delete_course),
        )
        .route("/courses/{id}/lessons", get(list_for_course::<Lesson>))
        .route("/courses/{id}/assignments", get(list_for_course::<Assignment>))
        .route("/lessons", get(list::<Lesson>).post(create::<Lesson>))
        .route(
            "/lessons/{id}",
            get(get_one::<Lesson>)
                .put(update::<Lesson>)
                .delete(delete::<Lesson>),
        )
        .route("/assignments", get(list::<Assignment>).post(create::<Assignment>))
        .route(
            "/assignments/{id}",
            get(get_one::<Assignment>)
                .put(update::<Assignment>)
                .delete(delete::<Assignment>),
        )
        .route("/users/{user_id}", get(get_profile).put(update_profile))
        .route(
            "/users/{user_id}/enrollments",
            get(list_enrollments).post(enroll),
        )
        .fallback(not_found)
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    state.store.ping().await?;
    Ok(Json(serde_json::json!({ "status": "ok" })))
}

async fn not_found() -> AppError {
    AppError::NotFound("Route")
}

async fn list<E: Entity>(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let records = state.repository::<E>().list().await?;
    collection_body(records)
}

async fn list_courses(
    State(state): State<AppState>,
    Query(params): Query<CourseQueryParams>,
) -> Result<Json<Value>, AppError> {
    let mut courses = state.repository::<Course>().list().await?;
    if let Some(category) = params.category.filter(|c| c != "All") {
        courses.retain(|course| course.fields.category == category);
    }
    collection_body(courses)
}

async fn list_categories(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let categories: BTreeSet<String> = state
        .repository::<Course>()
        .list()
        .await?
        .into_iter()
        .map(|course| course.fields.category)
        .collect();
    Ok(Json(serde_json::json!({ "categories": categories })))
}

async fn list_for_course<E: CourseScoped>(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    state.repository::<Course>().get(&course_id).await?;
    let records = state.repository::<E>().list_by_course(&course_id).await?;
    collection_body(records)
}

async fn get_one<E: Entity>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Record<E>>, AppError> {
    let record = state.repository::<E>().get(&id).await?;
    Ok(Json(record))
}

async fn create<E: Entity>(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Saved<Record<E>>>), AppError> {
    let input = object_body(body)?;
    let record = state.repository::<E>().create(&input).await?;
    Ok((
        StatusCode::CREATED,
        Json(Saved {
            record,
            message: format!("{} created successfully", E::NAME),
        }),
    ))
}

async fn update<E: Entity>(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Saved<Record<E>>>, AppError> {
    let input = object_body(body)?;
    let record = state.repository::<E>().update(&id, &input).await?;
    Ok(Json(Saved {
        record,
        message: format!("{} updated successfully", E::NAME),
    }))
}

async fn delete<E: Entity>(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Message>, AppError> {
    state.repository::<E>().delete(&id).await?;
    Ok(Json(Message {
        message: format!("{} deleted successfully", E::NAME),
    }))
}

async fn delete_course(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Message>, AppError> {
    state.cascade().delete_course(&id).await?;
    Ok(Json(Message {
        message: "Course and related content deleted successfully".to_string(),
    }))
}

async fn list_enrollments(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Enrollment>, AppError> {
    let enrollment = state.enrollments().enrollments(&user_id).await?;
    Ok(Json(enrollment))
}

async fn enroll(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Saved<Enrollment>>, AppError> {
    let input = object_body(body)?;
    let req = EnrollRequest::from_input(&input)?;
    let enrollment = state.enrollments().enroll(&user_id, &req.course_id).await?;
    Ok(Json(Saved {
        record: enrollment,
        message: "Enrolled successfully".to_string(),
    }))
}

async fn get_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Profile>, AppError> {
    Ok(Json(state.profiles().profile(&user_id).await?))
}

async fn update_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Saved<Profile>>, AppError> {
    let input = object_body(body)?;
    let update = ProfileUpdate::from_input(&input)?;
    let profile = state.profiles().update_profile(&user_id, update).await?;
    Ok(Json(Saved {
        record: profile,
        message: "Profile updated successfully".to_string(),
    }))
}

fn object_body(body: Result<Json<Value>, JsonRejection>) -> Result<Map<String, Value>, AppError> {
    match body {
        Ok(Json(Value::Object(map))) => Ok(map),
        Ok(Json(_)) => Err(AppError::BadRequest(
            "Request body must be a JSON object".to_string(),
        )),
        Err(rejection) => Err(AppError::BadRequest(rejection.body_text())),
    }
}

fn collection_body<E: Entity>(records: Vec<Record<E>>) -> Result<Json<Value>, AppError> {
    let records = serde_json::to_value(records).map_err(StoreError::from)?;
    let mut body = Map::new();
    body.insert(E::COLLECTION.to_string(), records);
    Ok(Json(Value::Object(body)))
}
