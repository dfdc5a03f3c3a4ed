//! Typed facade over the timetable backend.
//!
//! [`MkrApi`] is a cheaply cloneable handle. Every operation resolves from
//! its cache first and only talks to the backend on a miss; listings and
//! schedules that come back empty are never cached, so transient gaps get
//! retried on the next call.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tokio::sync::RwLock;
use tracing::{debug, info};
use url::Url;

use crate::cache::TtlCache;
use crate::error::{Error, Result};
use crate::parse::{QuerySide, parse_schedule_events, parse_select_options};
use crate::transport::Transport;
use crate::types::{GroupScheduleRequest, KeyValuePair, ScheduleEvent, TeacherScheduleRequest};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Date format the timetable forms expect.
const DATE_FORMAT: &str = "%d.%m.%Y";

/// Course numbers offered across the university.
const COURSES: std::ops::RangeInclusive<i64> = 1..=7;

struct ApiInner {
    transport: Transport,
    /// Structures never change within a deployment, so they memoize forever.
    structures: RwLock<Option<Vec<KeyValuePair>>>,
    chairs: TtlCache<Vec<KeyValuePair>>,
    faculties: TtlCache<Vec<KeyValuePair>>,
    groups: TtlCache<Vec<KeyValuePair>>,
    teachers: TtlCache<Vec<KeyValuePair>>,
    group_schedules: TtlCache<Vec<ScheduleEvent>>,
    teacher_schedules: TtlCache<Vec<ScheduleEvent>>,
}

/// Client for the timetable backend.
///
/// # Example
///
/// ```no_run
/// use mkr_api::MkrApi;
///
/// # async fn example() -> mkr_api::Result<()> {
/// let api = MkrApi::builder()
///     .base_url("https://vnz.mkr.org.ua")
///     .build()?;
///
/// for structure in api.load_structures().await? {
///     println!("{}: {}", structure.id, structure.name);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct MkrApi {
    inner: Arc<ApiInner>,
}

impl MkrApi {
    /// Start building a client.
    pub fn builder() -> ApiBuilder {
        ApiBuilder::new()
    }

    /// Base URL this client talks to.
    pub fn base_url(&self) -> &Url {
        self.inner.transport.base_url()
    }

    /// Lists the educational structures (campuses and institutes).
    ///
    /// The backend renders these into its bootstrap page, so the first call
    /// does a plain GET and every later call is served from memory.
    pub async fn load_structures(&self) -> Result<Vec<KeyValuePair>> {
        {
            let memo = self.inner.structures.read().await;
            if let Some(structures) = memo.as_ref() {
                debug!("structures served from memo");
                return Ok(structures.clone());
            }
        }

        let body = self.inner.transport.get(QuerySide::Teacher).await?;
        let structures = parse_select_options(&body, "TimeTableForm[structureId]")?;
        info!(count = structures.len(), "loaded structures");

        if !structures.is_empty() {
            *self.inner.structures.write().await = Some(structures.clone());
        }
        Ok(structures)
    }

    /// Lists the chairs of a structure.
    pub async fn load_chairs(&self, structure_id: i64) -> Result<Vec<KeyValuePair>> {
        self.load_select_list(
            &self.inner.chairs,
            structure_id.to_string(),
            QuerySide::Teacher,
            vec![("TimeTableForm[structureId]", structure_id.to_string())],
            "TimeTableForm[chairId]",
        )
        .await
    }

    /// Lists the faculties of a structure.
    pub async fn load_faculties(&self, structure_id: i64) -> Result<Vec<KeyValuePair>> {
        self.load_select_list(
            &self.inner.faculties,
            structure_id.to_string(),
            QuerySide::Group,
            vec![("TimeTableForm[structureId]", structure_id.to_string())],
            "TimeTableForm[facultyId]",
        )
        .await
    }

    /// Lists the course numbers of a faculty.
    ///
    /// The backend offers the same fixed range everywhere, so this is
    /// answered locally.
    pub async fn load_courses(
        &self,
        _structure_id: i64,
        _faculty_id: i64,
    ) -> Result<Vec<KeyValuePair>> {
        Ok(COURSES
            .map(|course| KeyValuePair {
                id: course.to_string(),
                name: format!("{} Курс", course),
            })
            .collect())
    }

    /// Lists the groups of a faculty studying in one course.
    pub async fn load_groups(
        &self,
        structure_id: i64,
        faculty_id: i64,
        course: i64,
    ) -> Result<Vec<KeyValuePair>> {
        self.load_select_list(
            &self.inner.groups,
            format!("{}_{}_{}", structure_id, faculty_id, course),
            QuerySide::Group,
            vec![
                ("TimeTableForm[structureId]", structure_id.to_string()),
                ("TimeTableForm[facultyId]", faculty_id.to_string()),
                ("TimeTableForm[course]", course.to_string()),
            ],
            "TimeTableForm[groupId]",
        )
        .await
    }

    /// Lists every group of a faculty across all courses.
    pub async fn load_faculty_groups(
        &self,
        structure_id: i64,
        faculty_id: i64,
    ) -> Result<Vec<KeyValuePair>> {
        let mut groups = Vec::new();
        for course in COURSES {
            groups.extend(self.load_groups(structure_id, faculty_id, course).await?);
        }
        Ok(groups)
    }

    /// Lists the teachers of a chair.
    pub async fn load_teachers(
        &self,
        structure_id: i64,
        chair_id: i64,
    ) -> Result<Vec<KeyValuePair>> {
        self.load_select_list(
            &self.inner.teachers,
            format!("{}_{}", structure_id, chair_id),
            QuerySide::Teacher,
            vec![
                ("TimeTableForm[structureId]", structure_id.to_string()),
                ("TimeTableForm[chairId]", chair_id.to_string()),
            ],
            "TimeTableForm[teacherId]",
        )
        .await
    }

    /// Loads the schedule of a group over the request's date window.
    pub async fn load_group_schedule(
        &self,
        request: GroupScheduleRequest,
    ) -> Result<Vec<ScheduleEvent>> {
        let (start, end) = request.window();
        let key = format!(
            "{}_{}_{}_{}_{}_{}",
            request.structure_id,
            request.faculty_id,
            request.course,
            request.group_id,
            start.format(DATE_FORMAT),
            end.format(DATE_FORMAT),
        );
        if let Some(events) = self.inner.group_schedules.get(&key).await {
            debug!(key, "group schedule served from cache");
            return Ok(events);
        }

        let mut fields = vec![
            ("TimeTableForm[structureId]", request.structure_id.to_string()),
            ("TimeTableForm[facultyId]", request.faculty_id.to_string()),
            ("TimeTableForm[course]", request.course.to_string()),
            ("TimeTableForm[groupId]", request.group_id.to_string()),
        ];
        fields.extend(window_fields(start, end));

        let body = self.inner.transport.submit(QuerySide::Group, &fields).await?;
        let events = parse_schedule_events(&body, QuerySide::Group)?;
        info!(
            group_id = request.group_id,
            count = events.len(),
            "loaded group schedule"
        );

        if !events.is_empty() {
            self.inner.group_schedules.insert(key, events.clone()).await;
        }
        Ok(events)
    }

    /// Loads the schedule of a teacher over the request's date window.
    pub async fn load_teacher_schedule(
        &self,
        request: TeacherScheduleRequest,
    ) -> Result<Vec<ScheduleEvent>> {
        let (start, end) = request.window();
        let key = format!(
            "{}_{}_{}_{}_{}",
            request.structure_id,
            request.chair_id,
            request.teacher_id,
            start.format(DATE_FORMAT),
            end.format(DATE_FORMAT),
        );
        if let Some(events) = self.inner.teacher_schedules.get(&key).await {
            debug!(key, "teacher schedule served from cache");
            return Ok(events);
        }

        let mut fields = vec![
            ("TimeTableForm[structureId]", request.structure_id.to_string()),
            ("TimeTableForm[chairId]", request.chair_id.to_string()),
            ("TimeTableForm[teacherId]", request.teacher_id.to_string()),
        ];
        fields.extend(window_fields(start, end));

        let body = self.inner.transport.submit(QuerySide::Teacher, &fields).await?;
        let events = parse_schedule_events(&body, QuerySide::Teacher)?;
        info!(
            teacher_id = request.teacher_id,
            count = events.len(),
            "loaded teacher schedule"
        );

        if !events.is_empty() {
            self.inner
                .teacher_schedules
                .insert(key, events.clone())
                .await;
        }
        Ok(events)
    }

    /// Shared path for the select-backed listings: cache lookup, form
    /// submission, option scrape, cache fill on non-empty results.
    async fn load_select_list(
        &self,
        cache: &TtlCache<Vec<KeyValuePair>>,
        key: String,
        side: QuerySide,
        fields: Vec<(&'static str, String)>,
        select_field: &str,
    ) -> Result<Vec<KeyValuePair>> {
        if let Some(items) = cache.get(&key).await {
            debug!(key, select_field, "listing served from cache");
            return Ok(items);
        }

        let body = self.inner.transport.submit(side, &fields).await?;
        let items = parse_select_options(&body, select_field)?;
        info!(key, select_field, count = items.len(), "loaded listing");

        if !items.is_empty() {
            cache.insert(key, items.clone()).await;
        }
        Ok(items)
    }
}

/// Date-window fields shared by both schedule forms.
fn window_fields(start: NaiveDate, end: NaiveDate) -> Vec<(&'static str, String)> {
    let start = start.format(DATE_FORMAT).to_string();
    let end = end.format(DATE_FORMAT).to_string();
    vec![
        ("date-picker", format!("{} - {}", start, end)),
        ("TimeTableForm[dateStart]", start),
        ("TimeTableForm[dateEnd]", end),
        ("TimeTableForm[indicationDays]", "5".to_string()),
    ]
}

/// Builder for [`MkrApi`].
pub struct ApiBuilder {
    base_url: Option<String>,
    timeout: Duration,
    cache_ttl: Duration,
}

impl ApiBuilder {
    pub fn new() -> Self {
        Self {
            base_url: None,
            timeout: DEFAULT_TIMEOUT,
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }

    /// Root URL of the timetable deployment, e.g. `https://vnz.mkr.org.ua`.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Per-request timeout. Defaults to 30 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Lifetime of cached listings and schedules. Defaults to one hour.
    pub fn cache_ttl(mut self, cache_ttl: Duration) -> Self {
        self.cache_ttl = cache_ttl;
        self
    }

    pub fn build(self) -> Result<MkrApi> {
        let base_url = self
            .base_url
            .ok_or_else(|| Error::Config("base_url is required".to_string()))?;
        // A trailing slash keeps Url::join from eating the last path segment.
        let base_url = if base_url.ends_with('/') {
            Url::parse(&base_url)?
        } else {
            Url::parse(&format!("{}/", base_url))?
        };

        let http = reqwest::Client::builder()
            .user_agent(concat!("mkr-api/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(MkrApi {
            inner: Arc::new(ApiInner {
                transport: Transport::new(http, base_url, self.timeout),
                structures: RwLock::new(None),
                chairs: TtlCache::new(self.cache_ttl),
                faculties: TtlCache::new(self.cache_ttl),
                groups: TtlCache::new(self.cache_ttl),
                teachers: TtlCache::new(self.cache_ttl),
                group_schedules: TtlCache::new(self.cache_ttl),
                teacher_schedules: TtlCache::new(self.cache_ttl),
            }),
        })
    }
}

impl Default for ApiBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn select_document(field: &str, options: &[(&str, &str)]) -> String {
        let options: String = options
            .iter()
            .map(|(value, name)| format!(r#"<option value="{}">{}</option>"#, value, name))
            .collect();
        format!(
            r#"<html><head><meta name="csrf-token" content="tok"></head>
            <body><select name="{}"><option value="">Оберіть</option>{}</select></body></html>"#,
            field, options
        )
    }

    fn schedule_document(events_json: &str) -> String {
        format!(
            r#"<html><head><meta name="csrf-token" content="tok"></head>
            <body><script>"events":{},"eventsURL":"x"</script></body></html>"#,
            events_json
        )
    }

    async fn api_for(server: &MockServer) -> MkrApi {
        MkrApi::builder().base_url(server.uri()).build().unwrap()
    }

    #[test]
    fn test_build_requires_base_url() {
        let error = MkrApi::builder().build().err();
        assert!(matches!(error, Some(Error::Config(_))));
    }

    #[test]
    fn test_build_normalizes_trailing_slash() {
        let api = MkrApi::builder()
            .base_url("https://vnz.mkr.org.ua")
            .build()
            .unwrap();
        assert_eq!(api.base_url().as_str(), "https://vnz.mkr.org.ua/");

        let api = MkrApi::builder()
            .base_url("https://vnz.mkr.org.ua/")
            .build()
            .unwrap();
        assert_eq!(api.base_url().as_str(), "https://vnz.mkr.org.ua/");
    }

    #[tokio::test]
    async fn test_load_courses_is_local_and_fixed() {
        let api = MkrApi::builder()
            .base_url("https://unreachable.invalid")
            .build()
            .unwrap();

        let courses = api.load_courses(486, 3).await.unwrap();
        assert_eq!(courses.len(), 7);
        assert_eq!(courses[0].id, "1");
        assert_eq!(courses[0].name, "1 Курс");
        assert_eq!(courses[6].id, "7");
    }

    #[tokio::test]
    async fn test_load_structures_memoizes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/teacher"))
            .and(query_param("type", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(select_document(
                "TimeTableForm[structureId]",
                &[("486", "Коледж")],
            )))
            .mount(&server)
            .await;

        let api = api_for(&server).await;
        let first = api.load_structures().await.unwrap();
        let second = api.load_structures().await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first[0].id, "486");
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_load_chairs_caches_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/teacher"))
            .and(body_string_contains("TimeTableForm%5BstructureId%5D=486"))
            .respond_with(ResponseTemplate::new(200).set_body_string(select_document(
                "TimeTableForm[chairId]",
                &[("11", "Кафедра математики"), ("12", "Кафедра фізики")],
            )))
            .mount(&server)
            .await;

        let api = api_for(&server).await;
        let first = api.load_chairs(486).await.unwrap();
        let second = api.load_chairs(486).await.unwrap();

        assert_eq!(first.len(), 2);
        assert_eq!(first, second);
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_listing_not_cached() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/group"))
            .respond_with(ResponseTemplate::new(200).set_body_string(select_document(
                "TimeTableForm[facultyId]",
                &[],
            )))
            .mount(&server)
            .await;

        let api = api_for(&server).await;
        assert!(api.load_faculties(486).await.unwrap().is_empty());
        assert!(api.load_faculties(486).await.unwrap().is_empty());
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_cached_listing_expires() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/teacher"))
            .respond_with(ResponseTemplate::new(200).set_body_string(select_document(
                "TimeTableForm[teacherId]",
                &[("207", "Берегун Т.О.")],
            )))
            .mount(&server)
            .await;

        let api = MkrApi::builder()
            .base_url(server.uri())
            .cache_ttl(Duration::from_millis(40))
            .build()
            .unwrap();

        api.load_teachers(486, 11).await.unwrap();
        api.load_teachers(486, 11).await.unwrap();
        assert_eq!(server.received_requests().await.unwrap().len(), 1);

        tokio::time::sleep(Duration::from_millis(60)).await;
        api.load_teachers(486, 11).await.unwrap();
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_group_schedule_submits_window_fields() {
        let server = MockServer::start().await;
        let events = r#"[{"title":"Алгебра\nауд. 14\nБерегун Т.О.","className":"lesson-1","start":"2025-05-05 08:30","end":"2025-05-05 09:50"}]"#;
        Mock::given(method("POST"))
            .and(path("/group"))
            .and(body_string_contains("TimeTableForm%5BdateStart%5D=05.05.2025"))
            .and(body_string_contains("TimeTableForm%5BdateEnd%5D=12.05.2025"))
            .and(body_string_contains("TimeTableForm%5BindicationDays%5D=5"))
            .respond_with(ResponseTemplate::new(200).set_body_string(schedule_document(events)))
            .mount(&server)
            .await;

        let api = api_for(&server).await;
        let request = GroupScheduleRequest {
            structure_id: 486,
            faculty_id: 3,
            course: 2,
            group_id: 17,
            start_date: NaiveDate::from_ymd_opt(2025, 5, 5),
            end_date: NaiveDate::from_ymd_opt(2025, 5, 12),
        };

        let first = api.load_group_schedule(request.clone()).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].name, "Алгебра");
        assert_eq!(first[0].teacher.as_deref(), Some("Берегун Т.О."));

        // Same window resolves from cache.
        api.load_group_schedule(request).await.unwrap();
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_defaulted_window_shares_cache_entry() {
        let server = MockServer::start().await;
        let events = r#"[{"title":"Історія\nауд. 7\nКоваль О.В.","className":"lesson-1","start":"S","end":"E"}]"#;
        Mock::given(method("POST"))
            .and(path("/group"))
            .respond_with(ResponseTemplate::new(200).set_body_string(schedule_document(events)))
            .mount(&server)
            .await;

        let api = api_for(&server).await;
        let request = GroupScheduleRequest {
            structure_id: 486,
            faculty_id: 3,
            course: 2,
            group_id: 17,
            start_date: None,
            end_date: None,
        };

        // Both calls resolve to today + 7 days, so they share one entry.
        let first = api.load_group_schedule(request.clone()).await.unwrap();
        let second = api.load_group_schedule(request).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_structures_not_memoized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/teacher"))
            .respond_with(ResponseTemplate::new(200).set_body_string(select_document(
                "TimeTableForm[structureId]",
                &[],
            )))
            .mount(&server)
            .await;

        let api = api_for(&server).await;
        assert!(api.load_structures().await.unwrap().is_empty());
        assert!(api.load_structures().await.unwrap().is_empty());
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_teacher_schedule_maps_group_member() {
        let server = MockServer::start().await;
        let events = r#"[{"title":"Фізика\nауд. 2\nКН-22-1","className":"lesson-2 lesson-updated","start":"2025-05-05 10:00","end":"2025-05-05 11:20"}]"#;
        Mock::given(method("POST"))
            .and(path("/teacher"))
            .respond_with(ResponseTemplate::new(200).set_body_string(schedule_document(events)))
            .mount(&server)
            .await;

        let api = api_for(&server).await;
        let request = TeacherScheduleRequest {
            structure_id: 486,
            chair_id: 11,
            teacher_id: 207,
            start_date: NaiveDate::from_ymd_opt(2025, 5, 5),
            end_date: NaiveDate::from_ymd_opt(2025, 5, 9),
        };

        let events = api.load_teacher_schedule(request).await.unwrap();
        assert_eq!(events[0].group.as_deref(), Some("КН-22-1"));
        assert!(events[0].teacher.is_none());
        assert_eq!(events[0].kind, "practice");
        assert!(events[0].updated);
    }

    #[tokio::test]
    async fn test_missing_events_not_cached() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/group"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("<html><body>порожній тиждень</body></html>"),
            )
            .mount(&server)
            .await;

        let api = api_for(&server).await;
        let request = GroupScheduleRequest {
            structure_id: 486,
            faculty_id: 3,
            course: 2,
            group_id: 17,
            start_date: NaiveDate::from_ymd_opt(2025, 5, 5),
            end_date: NaiveDate::from_ymd_opt(2025, 5, 12),
        };

        let error = api.load_group_schedule(request.clone()).await.unwrap_err();
        assert!(error.is_no_schedule_data());

        let error = api.load_group_schedule(request).await.unwrap_err();
        assert!(error.is_no_schedule_data());
        assert_eq!(server.received_requests().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_bootstrap_token_flows_into_submission() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/teacher"))
            .respond_with(ResponseTemplate::new(200).set_body_string(select_document(
                "TimeTableForm[structureId]",
                &[("486", "Коледж")],
            )))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/teacher"))
            .respond_with(ResponseTemplate::new(200).set_body_string(select_document(
                "TimeTableForm[chairId]",
                &[("11", "Кафедра математики")],
            )))
            .mount(&server)
            .await;

        let api = api_for(&server).await;
        api.load_structures().await.unwrap();
        api.load_chairs(486).await.unwrap();

        let requests = server.received_requests().await.unwrap();
        let submission = String::from_utf8_lossy(&requests[1].body).into_owned();
        assert!(submission.contains("_csrf-frontend=tok"));
        assert_eq!(requests[1].headers.get("X-CSRF-Token").unwrap(), "tok");
    }

    #[tokio::test]
    async fn test_faculty_groups_walk_every_course() {
        let server = MockServer::start().await;
        // Courses 1 and 3 have groups, the rest come back empty.
        for (course, options) in [
            ("1", r#"<option value="17">КН-24-1</option>"#),
            ("3", r#"<option value="19">КН-22-1</option>"#),
        ] {
            Mock::given(method("POST"))
                .and(path("/group"))
                .and(body_string_contains(format!(
                    "TimeTableForm%5Bcourse%5D={}",
                    course
                )))
                .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                    r#"<html><body><select name="TimeTableForm[groupId]">
                    <option value="">Оберіть</option>{}</select></body></html>"#,
                    options
                )))
                .mount(&server)
                .await;
        }
        Mock::given(method("POST"))
            .and(path("/group"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"<html><body><select name="TimeTableForm[groupId]"><option value="">Оберіть</option></select></body></html>"#),
            )
            .mount(&server)
            .await;

        let api = api_for(&server).await;
        let groups = api.load_faculty_groups(486, 3).await.unwrap();

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].name, "КН-24-1");
        assert_eq!(groups[1].name, "КН-22-1");
        assert_eq!(server.received_requests().await.unwrap().len(), 7);
    }
}
