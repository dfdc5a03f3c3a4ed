//! Session bookkeeping: cookie continuity and anti-forgery token rotation.

use scraper::{Html, Selector};

/// Mutable backend session state.
///
/// The backend rotates the anti-forgery token on every exchange and tracks
/// the caller through a single session cookie. Both live here, behind the
/// transport's lock; nothing else touches them.
#[derive(Debug, Default)]
pub(crate) struct SessionState {
    /// Current anti-forgery token, if one has been seen yet.
    pub(crate) token: Option<String>,
    /// Raw `Set-Cookie` value from the last response that carried one.
    pub(crate) cookie: String,
}

impl SessionState {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Store the token scraped from a response body. The previous value is
    /// overwritten unconditionally, including with `None`: a document without
    /// the meta element means the backend no longer honors the old token.
    pub(crate) fn rotate_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    /// Replace the stored cookie wholesale. The backend runs a single-cookie
    /// session model, so there is nothing to merge.
    pub(crate) fn replace_cookie(&mut self, cookie: String) {
        self.cookie = cookie;
    }
}

/// Pull the anti-forgery token out of a markup document.
///
/// The backend publishes it as `<meta name="csrf-token" content="...">` on
/// every page, rejection pages included.
pub(crate) fn extract_token(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(r#"meta[name="csrf-token"]"#).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|meta| meta.value().attr("content"))
        .map(str::to_string)
}
