//! HTTP exchange layer.
//!
//! Carries the session headers on every request, captures rotated cookies
//! and tokens from every response, and runs the stale-token submission
//! protocol for form posts.

use std::time::Duration;

use parking_lot::Mutex;
use reqwest::{StatusCode, header};
use tracing::{debug, trace};
use url::Url;

use crate::error::Result;
use crate::parse::QuerySide;
use crate::session::{SessionState, extract_token};

/// Form field carrying the anti-forgery token.
const TOKEN_FIELD: &str = "_csrf-frontend";

/// Header carrying the anti-forgery token.
const TOKEN_HEADER: &str = "X-CSRF-Token";

/// HTTP exchange state shared by all facade operations.
pub(crate) struct Transport {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
    session: Mutex<SessionState>,
}

impl Transport {
    pub(crate) fn new(http: reqwest::Client, base_url: Url, timeout: Duration) -> Self {
        Self {
            http,
            base_url,
            timeout,
            session: Mutex::new(SessionState::new()),
        }
    }

    pub(crate) fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Endpoint for one side of the timetable, always `?type=1`.
    fn endpoint(&self, side: QuerySide) -> Result<Url> {
        let mut url = self.base_url.join(side.path())?;
        url.set_query(Some("type=1"));
        Ok(url)
    }

    /// Snapshot the session headers for an outgoing request. The lock is
    /// never held across a network await.
    fn session_headers(&self) -> (Option<String>, String) {
        let session = self.session.lock();
        (session.token.clone(), session.cookie.clone())
    }

    /// Absorb one response: replace the cookie if the backend sent one,
    /// rotate the token from the body, and hand back status and body.
    async fn absorb_response(&self, response: reqwest::Response) -> Result<(StatusCode, String)> {
        let status = response.status();
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let body = response.text().await?;
        let token = extract_token(&body);

        {
            let mut session = self.session.lock();
            if let Some(cookie) = cookie {
                trace!(status = %status, "session cookie replaced");
                session.replace_cookie(cookie);
            }
            session.rotate_token(token);
        }

        Ok((status, body))
    }

    /// Fetch one side's bootstrap document.
    pub(crate) async fn get(&self, side: QuerySide) -> Result<String> {
        let url = self.endpoint(side)?;
        let (token, cookie) = self.session_headers();

        let mut request = self.http.get(url).timeout(self.timeout);
        if !cookie.is_empty() {
            request = request.header(header::COOKIE, cookie);
        }
        if let Some(token) = token {
            request = request.header(TOKEN_HEADER, token);
        }

        let response = request.send().await?;
        let (_, body) = self.absorb_response(response).await?;
        Ok(body)
    }

    /// One POST attempt with the current session state spliced in.
    async fn post_once(
        &self,
        url: &Url,
        fields: &[(&'static str, String)],
    ) -> Result<(StatusCode, String)> {
        let (token, cookie) = self.session_headers();

        let mut form: Vec<(&str, String)> = Vec::with_capacity(fields.len() + 1);
        form.push((TOKEN_FIELD, token.clone().unwrap_or_default()));
        form.extend(fields.iter().map(|(key, value)| (*key, value.clone())));

        let mut request = self
            .http
            .post(url.clone())
            .timeout(self.timeout)
            .form(&form);
        if !cookie.is_empty() {
            request = request.header(header::COOKIE, cookie);
        }
        if let Some(token) = token {
            request = request.header(TOKEN_HEADER, token);
        }

        let response = request.send().await?;
        self.absorb_response(response).await
    }

    /// Submit a timetable form, retrying while the backend rejects the token.
    ///
    /// A 400 means the token went stale. The rejection page itself carries
    /// the replacement, which [`Self::absorb_response`] has already stored,
    /// so the next attempt picks it up in both the form field and the header.
    /// Repeats until any other status and returns that body untouched for the
    /// parsers to judge. There is no attempt cap: stale-token rejections
    /// stop as soon as one attempt carries the current token.
    pub(crate) async fn submit(
        &self,
        side: QuerySide,
        fields: &[(&'static str, String)],
    ) -> Result<String> {
        let url = self.endpoint(side)?;

        loop {
            let (status, body) = self.post_once(&url, fields).await?;
            if status != StatusCode::BAD_REQUEST {
                return Ok(body);
            }
            debug!(endpoint = side.path(), "stale anti-forgery token, resubmitting");
        }
    }
}
