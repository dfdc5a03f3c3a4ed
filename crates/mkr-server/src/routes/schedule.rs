//! Schedule endpoints for groups and teachers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::NaiveDate;
use serde::Deserialize;

use mkr_api::{GroupScheduleRequest, ScheduleEvent, TeacherScheduleRequest};

use crate::error::ServerError;
use crate::state::AppState;

/// Optional date window on schedule queries. Absent bounds fall back to a
/// one-week window starting today.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleWindow {
    /// Window start, ISO 8601 (`2025-05-05`).
    pub start_date: Option<NaiveDate>,
    /// Window end, ISO 8601.
    pub end_date: Option<NaiveDate>,
}

/// GET .../groups/{groupId}/schedule - Load the schedule of a group.
pub async fn group_schedule_handler(
    State(state): State<AppState>,
    Path((structure_id, faculty_id, course, group_id)): Path<(i64, i64, i64, i64)>,
    Query(window): Query<ScheduleWindow>,
) -> Result<Json<Vec<ScheduleEvent>>, ServerError> {
    let request = GroupScheduleRequest {
        structure_id,
        faculty_id,
        course,
        group_id,
        start_date: window.start_date,
        end_date: window.end_date,
    };

    Ok(Json(state.api.load_group_schedule(request).await?))
}

/// GET .../teachers/{teacherId}/schedule - Load the schedule of a teacher.
pub async fn teacher_schedule_handler(
    State(state): State<AppState>,
    Path((structure_id, chair_id, teacher_id)): Path<(i64, i64, i64)>,
    Query(window): Query<ScheduleWindow>,
) -> Result<Json<Vec<ScheduleEvent>>, ServerError> {
    let request = TeacherScheduleRequest {
        structure_id,
        chair_id,
        teacher_id,
        start_date: window.start_date,
        end_date: window.end_date,
    };

    Ok(Json(state.api.load_teacher_schedule(request).await?))
}
