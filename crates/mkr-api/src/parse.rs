//! Parsers for the backend's server-rendered responses.
//!
//! Two shapes come back from the timetable forms: `<select>` option lists for
//! the catalog queries, and a JSON array of calendar events embedded in the
//! page script for schedule queries.

use regex::Regex;
use scraper::{Html, Selector};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::types::{KeyValuePair, ScheduleEvent};

/// Marker pattern for the embedded events payload. Non-greedy and single
/// line: the backend serializes the array without newlines and event objects
/// are flat, so the first `}]` closes the array.
const EVENTS_PATTERN: &str = r#""events":(\[\{.*?\}\])"#;

/// Substring in `className` marking a last-minute change.
const UPDATED_MARKER: &str = "lesson-updated";

/// Which side of the timetable a query addresses. Selects the backend
/// endpoint and decides the meaning of the third title line in events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum QuerySide {
    /// Group timetable: the third title line names the teacher.
    Group,
    /// Teacher timetable: the third title line names the group(s).
    Teacher,
}

impl QuerySide {
    /// Path segment of the backend endpoint serving this side.
    pub(crate) fn path(self) -> &'static str {
        match self {
            QuerySide::Group => "group",
            QuerySide::Teacher => "teacher",
        }
    }
}

/// Collect the options of the named form select into id/name pairs.
///
/// The first option is always a disabled placeholder and is skipped. Zero
/// remaining options mean an empty list, not a failure. Values and names are
/// taken verbatim.
pub(crate) fn parse_select_options(html: &str, field: &str) -> Result<Vec<KeyValuePair>> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(&format!(r#"select[name="{}"] option"#, field))
        .map_err(|e| Error::Parse(e.to_string()))?;

    Ok(document
        .select(&selector)
        .skip(1)
        .map(|option| KeyValuePair {
            id: option.value().attr("value").unwrap_or_default().to_string(),
            name: option.text().collect(),
        })
        .collect())
}

/// Event record as the backend embeds it.
#[derive(Debug, Deserialize)]
struct RawEvent {
    title: String,
    #[serde(rename = "className")]
    class_name: String,
    start: String,
    end: String,
}

/// Extract and map the embedded events payload of a schedule response.
///
/// Two phases: bound the array literal in the raw document with
/// [`EVENTS_PATTERN`], then parse it strictly as JSON. A document without the
/// marker (including `"events":[]` for an empty window) is an error, never an
/// empty list: it usually means the date range or filter was off.
pub(crate) fn parse_schedule_events(html: &str, side: QuerySide) -> Result<Vec<ScheduleEvent>> {
    let pattern = Regex::new(EVENTS_PATTERN).map_err(|e| Error::Parse(e.to_string()))?;
    let raw = pattern
        .captures(html)
        .and_then(|captures| captures.get(1))
        .ok_or(Error::NoScheduleData)?;

    let records: Vec<RawEvent> = serde_json::from_str(raw.as_str())?;
    Ok(records
        .into_iter()
        .map(|record| map_event(record, side))
        .collect())
}

/// Map one raw record into a typed event.
///
/// Titles look like `"ООП [Лк]\n ауд. 302\n Шевченко Т.Г."`: subject, place,
/// then the teacher (group timetable) or the group list (teacher timetable).
/// Shorter titles leave the trailing fields empty rather than failing.
fn map_event(record: RawEvent, side: QuerySide) -> ScheduleEvent {
    let RawEvent {
        title,
        class_name,
        start,
        end,
    } = record;

    let updated = class_name.contains(UPDATED_MARKER);
    let kind = lesson_kind(&class_name);

    let mut lines = title
        .split('\n')
        .map(|line| line.trim().replacen("&lt;", "", 1));
    let name = lines.next().unwrap_or_default();
    let place = lines.next().unwrap_or_default();
    let third = lines.next();

    let (teacher, group) = match side {
        QuerySide::Group => (third, None),
        QuerySide::Teacher => (None, third),
    };

    ScheduleEvent {
        name,
        place,
        kind,
        start,
        end,
        updated,
        teacher,
        group,
    }
}

/// Resolve a backend `className` into a lesson kind.
///
/// The update marker is stripped and the remainder trimmed before lookup, so
/// `"lesson-1 lesson-updated"` still resolves. Codes outside the table pass
/// through verbatim.
fn lesson_kind(class_name: &str) -> String {
    let code = class_name.replace(UPDATED_MARKER, "");
    let kind = match code.trim() {
        "lesson-1" => "lecture",
        "lesson-2" => "practice",
        "lesson-5" => "exam",
        "lesson-9" => "lecture_in_absentia",
        "lesson-10" => "practice_in_absentia",
        _ => return class_name.to_string(),
    };
    kind.to_string()
}
