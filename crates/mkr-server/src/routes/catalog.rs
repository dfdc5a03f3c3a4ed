//! Catalog endpoints: the selectable hierarchy of structures, chairs,
//! faculties, courses, groups, and teachers.

use axum::{
    Json,
    extract::{Path, State},
};

use mkr_api::KeyValuePair;

use crate::error::ServerError;
use crate::state::AppState;

/// GET /structures - List educational structures.
pub async fn list_structures_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<KeyValuePair>>, ServerError> {
    Ok(Json(state.api.load_structures().await?))
}

/// GET /structures/{structureId}/chairs - List the chairs of a structure.
pub async fn list_chairs_handler(
    State(state): State<AppState>,
    Path(structure_id): Path<i64>,
) -> Result<Json<Vec<KeyValuePair>>, ServerError> {
    Ok(Json(state.api.load_chairs(structure_id).await?))
}

/// GET /structures/{structureId}/faculties - List the faculties of a structure.
pub async fn list_faculties_handler(
    State(state): State<AppState>,
    Path(structure_id): Path<i64>,
) -> Result<Json<Vec<KeyValuePair>>, ServerError> {
    Ok(Json(state.api.load_faculties(structure_id).await?))
}

/// GET /structures/{structureId}/faculties/{facultyId}/courses - List course
/// numbers of a faculty.
pub async fn list_courses_handler(
    State(state): State<AppState>,
    Path((structure_id, faculty_id)): Path<(i64, i64)>,
) -> Result<Json<Vec<KeyValuePair>>, ServerError> {
    Ok(Json(state.api.load_courses(structure_id, faculty_id).await?))
}

/// GET /structures/{structureId}/faculties/{facultyId}/courses/{course}/groups
/// - List the groups of a faculty in one course.
pub async fn list_groups_handler(
    State(state): State<AppState>,
    Path((structure_id, faculty_id, course)): Path<(i64, i64, i64)>,
) -> Result<Json<Vec<KeyValuePair>>, ServerError> {
    Ok(Json(
        state.api.load_groups(structure_id, faculty_id, course).await?,
    ))
}

/// GET /structures/{structureId}/faculties/{facultyId}/groups - List every
/// group of a faculty across all courses.
pub async fn list_faculty_groups_handler(
    State(state): State<AppState>,
    Path((structure_id, faculty_id)): Path<(i64, i64)>,
) -> Result<Json<Vec<KeyValuePair>>, ServerError> {
    Ok(Json(
        state.api.load_faculty_groups(structure_id, faculty_id).await?,
    ))
}

/// GET /structures/{structureId}/chairs/{chairId}/teachers - List the
/// teachers of a chair.
pub async fn list_teachers_handler(
    State(state): State<AppState>,
    Path((structure_id, chair_id)): Path<(i64, i64)>,
) -> Result<Json<Vec<KeyValuePair>>, ServerError> {
    Ok(Json(state.api.load_teachers(structure_id, chair_id).await?))
}
