//! Blocking HTTP adapter for the iGEM wiki.
//!
//! Login goes through the iGEM account page; everything else goes through
//! the year's MediaWiki API with a cached CSRF token. Cookies are shared by
//! both hosts and persisted with [`crate::session`].

use std::path::PathBuf;
use std::time::Duration;

use percent_encoding::percent_decode_str;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;
use wikisync_core::{AssetUpload, Credentials, RemoteError, RemoteSite, SiteLayout, UploadedFile};

use crate::error::from_ureq;
use crate::multipart::{content_type_for, Multipart};
use crate::session;

pub const LOGIN_URL: &str = "https://igem.org/Login2";

/// Text the login page shows on success.
const LOGIN_MARKER: &str = "successfully logged in";

const TIMEOUT: Duration = Duration::from_secs(60);

const EDIT_SUMMARY: &str = "Uploaded with wikisync";

/// [`RemoteSite`] backed by ureq.
pub struct WikiClient {
    agent: ureq::Agent,
    cookie_path: PathBuf,
    login_url: String,
    api_url: String,
    csrf_token: Option<String>,
}

impl WikiClient {
    /// Build a client for `layout`'s wiki, resuming the cookie session at
    /// `cookie_path` if there is one.
    pub fn new(layout: &SiteLayout, cookie_path: impl Into<PathBuf>) -> Self {
        let cookie_path = cookie_path.into();
        let agent = ureq::AgentBuilder::new()
            .timeout(TIMEOUT)
            .cookie_store(session::load_or_default(&cookie_path))
            .build();
        Self {
            agent,
            cookie_path,
            login_url: LOGIN_URL.to_owned(),
            api_url: layout.api_url(),
            csrf_token: None,
        }
    }

    /// Use other endpoints than the public iGEM ones.
    pub fn with_endpoints(mut self, login_url: impl Into<String>, api_url: impl Into<String>) -> Self {
        self.login_url = login_url.into();
        self.api_url = api_url.into();
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn save_session(&self) {
        let store = self.agent.cookie_store();
        match session::save_at(&self.cookie_path, &store) {
            Ok(()) => tracing::debug!("saved cookies to {}", self.cookie_path.display()),
            Err(e) => tracing::warn!("could not save cookies: {e}"),
        }
    }

    fn csrf_token(&mut self) -> Result<String, RemoteError> {
        if let Some(token) = &self.csrf_token {
            return Ok(token.clone());
        }
        let response = self
            .agent
            .get(&self.api_url)
            .query("action", "query")
            .query("meta", "tokens")
            .query("type", "csrf")
            .query("format", "json")
            .call()
            .map_err(from_ureq)?;
        let token = read_json::<TokenResponse>(response, &self.api_url)?.into_token()?;
        self.csrf_token = Some(token.clone());
        Ok(token)
    }

    /// URL of a file that already exists on the wiki.
    fn existing_file_url(&self, filename: &str) -> Result<String, RemoteError> {
        let title = format!("File:{filename}");
        let response = self
            .agent
            .get(&self.api_url)
            .query("action", "query")
            .query("titles", &title)
            .query("prop", "imageinfo")
            .query("iiprop", "url")
            .query("format", "json")
            .call()
            .map_err(from_ureq)?;
        read_json::<ImageInfoResponse>(response, &self.api_url)?.into_url(&title)
    }

    /// Drop the cached token when the server says it is stale.
    fn forget_stale_token(&mut self, err: &RemoteError) {
        if matches!(err, RemoteError::Rejected(msg) if msg.starts_with("badtoken")) {
            self.csrf_token = None;
        }
    }
}

impl RemoteSite for WikiClient {
    fn login(&mut self, credentials: &Credentials) -> Result<(), RemoteError> {
        self.csrf_token = None;
        let body = self
            .agent
            .post(&self.login_url)
            .send_form(&[
                ("return_to", ""),
                ("username", credentials.username.as_str()),
                ("password", credentials.password.as_str()),
                ("Login", "Login"),
            ])
            .map_err(from_ureq)?
            .into_string()
            .map_err(|e| RemoteError::Protocol {
                url: self.login_url.clone(),
                message: e.to_string(),
            })?;

        if !body.contains(LOGIN_MARKER) {
            return Err(RemoteError::Rejected(
                "the login page did not confirm the login; check your username and password".into(),
            ));
        }
        self.save_session();
        Ok(())
    }

    fn upload_file(&mut self, file: &AssetUpload<'_>) -> Result<UploadedFile, RemoteError> {
        let token = self.csrf_token()?;
        let (content_type, body) = Multipart::new(format!("wikisync-{}", file.content_hash))
            .text("action", "upload")
            .text("filename", file.filename)
            .text("comment", EDIT_SUMMARY)
            .text("ignorewarnings", "1")
            .text("format", "json")
            .text("token", &token)
            .file(
                "file",
                file.filename,
                content_type_for(file.filename),
                file.bytes,
            )
            .finish();

        let response = self
            .agent
            .post(&self.api_url)
            .set("Content-Type", &content_type)
            .send_bytes(&body)
            .map_err(from_ureq)?;
        let outcome = read_json::<UploadResponse>(response, &self.api_url)?.into_uploaded();

        match outcome {
            Ok(uploaded) => Ok(uploaded),
            Err(UploadFailure::Unchanged) => {
                tracing::debug!("{} is already on the wiki; reusing its URL", file.filename);
                Ok(UploadedFile {
                    url: self.existing_file_url(file.filename)?,
                    filename: file.filename.to_owned(),
                })
            }
            Err(UploadFailure::Remote(e)) => {
                self.forget_stale_token(&e);
                Err(e)
            }
        }
    }

    fn upload_page(&mut self, content: &str, target_url: &str) -> Result<(), RemoteError> {
        let title = page_title(target_url)?;
        let token = self.csrf_token()?;
        let response = self
            .agent
            .post(&self.api_url)
            .send_form(&[
                ("action", "edit"),
                ("title", title.as_str()),
                ("text", content),
                ("summary", EDIT_SUMMARY),
                ("format", "json"),
                ("token", token.as_str()),
            ])
            .map_err(from_ureq)?;
        let result = read_json::<EditResponse>(response, &self.api_url)?.into_result();
        if let Err(e) = &result {
            self.forget_stale_token(e);
        }
        result
    }
}

/// Wiki page title addressed by a link URL: its decoded path without the
/// leading slash.
pub fn page_title(target_url: &str) -> Result<String, RemoteError> {
    let url = Url::parse(target_url).map_err(|e| RemoteError::Protocol {
        url: target_url.to_owned(),
        message: format!("not a valid URL: {e}"),
    })?;
    let path = url.path().trim_start_matches('/');
    if path.is_empty() {
        return Err(RemoteError::Protocol {
            url: target_url.to_owned(),
            message: "URL has no page title".into(),
        });
    }
    Ok(percent_decode_str(path).decode_utf8_lossy().into_owned())
}

fn read_json<T: DeserializeOwned>(response: ureq::Response, url: &str) -> Result<T, RemoteError> {
    response.into_json().map_err(|e| RemoteError::Protocol {
        url: url.to_owned(),
        message: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// API responses
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ApiError {
    code: String,
    #[serde(default)]
    info: String,
}

impl From<ApiError> for RemoteError {
    fn from(e: ApiError) -> Self {
        RemoteError::Rejected(format!("{}: {}", e.code, e.info))
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    query: Option<TokenQuery>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    tokens: Tokens,
}

#[derive(Debug, Deserialize)]
struct Tokens {
    csrftoken: String,
}

impl TokenResponse {
    fn into_token(self) -> Result<String, RemoteError> {
        if let Some(e) = self.error {
            return Err(e.into());
        }
        match self.query {
            // MediaWiki hands anonymous sessions this placeholder token.
            Some(q) if q.tokens.csrftoken != "+\\" => Ok(q.tokens.csrftoken),
            Some(_) => Err(RemoteError::Rejected(
                "not logged in: the wiki returned an anonymous edit token".into(),
            )),
            None => Err(RemoteError::Rejected("no token in response".into())),
        }
    }
}

#[derive(Debug, Deserialize)]
struct EditResponse {
    edit: Option<EditResult>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct EditResult {
    result: String,
}

impl EditResponse {
    fn into_result(self) -> Result<(), RemoteError> {
        if let Some(e) = self.error {
            return Err(e.into());
        }
        match self.edit {
            Some(edit) if edit.result == "Success" => Ok(()),
            Some(edit) => Err(RemoteError::Rejected(format!("edit result: {}", edit.result))),
            None => Err(RemoteError::Rejected("no edit result in response".into())),
        }
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    upload: Option<UploadResult>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct UploadResult {
    result: String,
    filename: Option<String>,
    imageinfo: Option<ImageInfo>,
    warnings: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ImageInfo {
    url: String,
}

#[derive(Debug)]
enum UploadFailure {
    /// Same bytes as the current revision; the wiki refuses a no-op upload.
    Unchanged,
    Remote(RemoteError),
}

impl UploadResponse {
    fn into_uploaded(self) -> Result<UploadedFile, UploadFailure> {
        if let Some(e) = self.error {
            if e.code == "fileexists-no-change" {
                return Err(UploadFailure::Unchanged);
            }
            return Err(UploadFailure::Remote(e.into()));
        }
        let Some(upload) = self.upload else {
            return Err(UploadFailure::Remote(RemoteError::Rejected(
                "no upload result in response".into(),
            )));
        };
        match upload {
            UploadResult {
                result,
                filename: Some(filename),
                imageinfo: Some(info),
                ..
            } if result == "Success" => Ok(UploadedFile {
                url: info.url,
                filename,
            }),
            UploadResult {
                result, warnings, ..
            } => Err(UploadFailure::Remote(RemoteError::Rejected(match warnings {
                Some(w) => format!("upload result: {result} ({w})"),
                None => format!("upload result: {result}"),
            }))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ImageInfoResponse {
    query: Option<ImageInfoQuery>,
}

#[derive(Debug, Deserialize)]
struct ImageInfoQuery {
    #[serde(default)]
    pages: serde_json::Map<String, serde_json::Value>,
}

impl ImageInfoResponse {
    fn into_url(self, title: &str) -> Result<String, RemoteError> {
        self.query
            .into_iter()
            .flat_map(|q| q.pages.into_iter().map(|(_, page)| page))
            .find_map(|page| {
                page.get("imageinfo")?
                    .get(0)?
                    .get("url")?
                    .as_str()
                    .map(str::to_owned)
            })
            .ok_or_else(|| RemoteError::Rejected(format!("{title} has no file URL")))
    }
}
