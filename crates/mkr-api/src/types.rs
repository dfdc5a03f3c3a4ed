//! Domain types returned by the timetable facade.
//!
//! These mirror what the backend's forms and embedded calendar expose.

use chrono::{Days, Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// One selectable option scraped from a timetable form: a structure, chair,
/// faculty, group, teacher, or course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyValuePair {
    /// Backend identifier, verbatim from the option's `value` attribute.
    pub id: String,
    /// Display name, verbatim from the option's text.
    pub name: String,
}

/// A single lesson in a loaded schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEvent {
    /// Subject name.
    pub name: String,
    /// Room / location line. Empty when the backend omits it.
    #[serde(default)]
    pub place: String,
    /// Lesson kind (`lecture`, `practice`, ...). Unrecognized backend codes
    /// pass through unchanged.
    #[serde(rename = "type")]
    pub kind: String,
    /// Start timestamp as the backend emits it.
    pub start: String,
    /// End timestamp as the backend emits it.
    pub end: String,
    /// Marks a last-minute schedule change.
    pub updated: bool,
    /// Teacher name; present on group-schedule results only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teacher: Option<String>,
    /// Group name(s); present on teacher-schedule results only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

/// Parameters for a group schedule query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupScheduleRequest {
    /// Structure the group belongs to.
    pub structure_id: i64,
    /// Faculty the group belongs to.
    pub faculty_id: i64,
    /// Course (year of study) the group belongs to.
    pub course: i64,
    /// The group to load the schedule for.
    pub group_id: i64,
    /// Window start; defaults to today when absent.
    pub start_date: Option<NaiveDate>,
    /// Window end; defaults to one week after the start when absent.
    pub end_date: Option<NaiveDate>,
}

/// Parameters for a teacher schedule query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeacherScheduleRequest {
    /// Structure the chair belongs to.
    pub structure_id: i64,
    /// Chair the teacher belongs to.
    pub chair_id: i64,
    /// The teacher to load the schedule for.
    pub teacher_id: i64,
    /// Window start; defaults to today when absent.
    pub start_date: Option<NaiveDate>,
    /// Window end; defaults to one week after the start when absent.
    pub end_date: Option<NaiveDate>,
}

impl GroupScheduleRequest {
    /// Resolve the requested window to concrete dates.
    pub fn window(&self) -> (NaiveDate, NaiveDate) {
        resolve_window(self.start_date, self.end_date)
    }
}

impl TeacherScheduleRequest {
    /// Resolve the requested window to concrete dates.
    pub fn window(&self) -> (NaiveDate, NaiveDate) {
        resolve_window(self.start_date, self.end_date)
    }
}

/// Default an absent start to today and an absent end to start + 7 days.
fn resolve_window(start: Option<NaiveDate>, end: Option<NaiveDate>) -> (NaiveDate, NaiveDate) {
    let start = start.unwrap_or_else(|| Local::now().date_naive());
    let end = end
        .unwrap_or_else(|| start.checked_add_days(Days::new(7)).unwrap_or(NaiveDate::MAX));
    (start, end)
}
