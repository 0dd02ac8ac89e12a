/*!
 * SubDB wire protocol.
 *
 * This module knows how each action is shaped on the wire and how the
 * service's status codes map back to results. It performs no I/O: requests
 * are plain values handed to a transport, and responses are plain values
 * handed back for interpretation.
 */

use std::fmt;

use bytes::Bytes;
use log::warn;

use crate::errors::{SubDbError, TransportError};

/// Protocol name advertised in the User-Agent
pub const PROTOCOL_NAME: &str = "SubDB";

/// Protocol version advertised in the User-Agent
pub const PROTOCOL_VERSION: &str = "1.0";

/// File name the service expects for uploaded subtitles
pub const UPLOAD_FILE_NAME: &str = "subtitle.srt";

/// Content type of the uploaded subtitle part
pub const UPLOAD_CONTENT_TYPE: &str = "application/octet-stream";

/// Response header carrying the language of a downloaded subtitle
pub const CONTENT_LANGUAGE_HEADER: &str = "Content-Language";

/// The four server operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Languages,
    Search,
    Download,
    Upload,
}

impl Action {
    /// Lowercase name used as the `action` parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Languages => "languages",
            Self::Search => "search",
            Self::Download => "download",
            Self::Upload => "upload",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HTTP method of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// A named parameter; `value` is `None` for bare flags such as `versions`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: String,
    pub value: Option<String>,
}

impl Param {
    fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }

    fn flag(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: None,
        }
    }
}

/// Binary part of a multipart upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    /// Form field name
    pub name: String,
    /// File name reported to the server
    pub file_name: String,
    /// MIME type of the part
    pub content_type: String,
    /// Raw part contents
    pub data: Bytes,
}

/// A transport-agnostic request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubDbRequest {
    pub method: HttpMethod,
    pub action: Action,
    pub query_params: Vec<Param>,
    pub body_params: Vec<Param>,
    pub headers: Vec<(String, String)>,
    pub file_part: Option<FilePart>,
}

impl SubDbRequest {
    fn new(method: HttpMethod, action: Action) -> Self {
        Self {
            method,
            action,
            query_params: vec![Param::new("action", action.as_str())],
            body_params: Vec::new(),
            headers: Vec::new(),
            file_part: None,
        }
    }

    /// Value of a query parameter; flags yield `Some(None)`
    pub fn query_param(&self, name: &str) -> Option<Option<&str>> {
        self.query_params
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_deref())
    }

    /// Value of a body parameter
    pub fn body_param(&self, name: &str) -> Option<&str> {
        self.body_params
            .iter()
            .find(|p| p.name == name)
            .and_then(|p| p.value.as_deref())
    }

    /// Value of a header, matched case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Attach a header, replacing any existing value of the same name
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
    }
}

/// A transport-agnostic response
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubDbResponse {
    pub status: u16,
    pub content: String,
    pub headers: Vec<(String, String)>,
}

impl SubDbResponse {
    /// Create a response with the given status and body
    pub fn new(status: u16, content: impl Into<String>) -> Self {
        Self {
            status,
            content: content.into(),
            headers: Vec::new(),
        }
    }

    /// Add a header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Value of a header, matched case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Why a lookup produced no result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceFailure {
    /// The server answered with a status the action does not expect
    UnexpectedStatus(u16),
    /// The transport could not produce a response
    Transport(TransportError),
}

impl fmt::Display for ServiceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedStatus(status) => write!(f, "unexpected status {}", status),
            Self::Transport(e) => write!(f, "{}", e),
        }
    }
}

/// Outcome of a lookup-style action
///
/// Keeps "nothing stored for this hash" apart from "the call failed".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    Found(T),
    NotFound,
    Failed(ServiceFailure),
}

impl<T> Lookup<T> {
    /// The found value, if any
    pub fn found(self) -> Option<T> {
        match self {
            Self::Found(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// The failure, if the lookup failed
    pub fn failure(&self) -> Option<&ServiceFailure> {
        match self {
            Self::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

impl Lookup<Vec<String>> {
    /// Language list view: not-found is an empty list, failure is `None`
    pub fn languages(self) -> Option<Vec<String>> {
        match self {
            Self::Found(languages) => Some(languages),
            Self::NotFound => Some(Vec::new()),
            Self::Failed(_) => None,
        }
    }
}

impl Lookup<Subtitle> {
    /// Subtitle view: not-found is a `Subtitle` flagged `not_found`, failure is `None`
    pub fn subtitle(self) -> Option<Subtitle> {
        match self {
            Self::Found(subtitle) => Some(subtitle),
            Self::NotFound => Some(Subtitle::not_found()),
            Self::Failed(_) => None,
        }
    }
}

/// A downloaded subtitle
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Subtitle {
    /// Subtitle text
    pub content: Option<String>,
    /// Language reported by the server
    pub language: Option<String>,
    /// Set when the server had no subtitle for the hash
    pub not_found: bool,
}

impl Subtitle {
    pub(crate) fn found(content: String, language: Option<String>) -> Self {
        Self {
            content: Some(content),
            language,
            not_found: false,
        }
    }

    pub(crate) fn not_found() -> Self {
        Self {
            content: None,
            language: None,
            not_found: true,
        }
    }
}

/// Result of an upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    /// 201 Created
    Uploaded,
    /// 403 Forbidden: the subtitle already exists
    Duplicated,
    /// 415 Unsupported Media Type: the subtitle was rejected
    Invalid,
    /// Any other status, or no response at all
    Error,
}

/// Language and number of stored versions from a versioned search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageVersions {
    pub language: String,
    pub count: u32,
}

/// Parse versioned search entries of the form `<LANGUAGE>:<COUNT>`
pub fn parse_language_versions<S: AsRef<str>>(
    entries: &[S],
) -> Result<Vec<LanguageVersions>, SubDbError> {
    entries
        .iter()
        .map(|entry| {
            let entry = entry.as_ref().trim();
            let (language, count) = entry
                .split_once(':')
                .ok_or_else(|| SubDbError::InvalidResponse(format!("missing version count in '{}'", entry)))?;
            let count = count.trim().parse::<u32>().map_err(|e| {
                SubDbError::InvalidResponse(format!("bad version count in '{}': {}", entry, e))
            })?;
            Ok(LanguageVersions {
                language: language.trim().to_string(),
                count,
            })
        })
        .collect()
}

/// Build the User-Agent value sent with every request
pub fn user_agent(client_name: &str, client_version: &str, client_url: &str) -> String {
    format!(
        "{}/{} ({}/{}; {})",
        PROTOCOL_NAME, PROTOCOL_VERSION, client_name, client_version, client_url
    )
}

pub fn languages_request() -> SubDbRequest {
    SubDbRequest::new(HttpMethod::Get, Action::Languages)
}

pub fn search_request(hash: &str, versions: bool) -> SubDbRequest {
    let mut request = SubDbRequest::new(HttpMethod::Get, Action::Search);
    request.query_params.push(Param::new("hash", hash));
    if versions {
        request.query_params.push(Param::flag("versions"));
    }
    request
}

pub fn download_request(hash: &str, languages: &str) -> SubDbRequest {
    let mut request = SubDbRequest::new(HttpMethod::Get, Action::Download);
    request.query_params.push(Param::new("hash", hash));
    request.query_params.push(Param::new("language", languages));
    request
}

pub fn upload_request(hash: &str, subtitle: &[u8]) -> SubDbRequest {
    let mut request = SubDbRequest::new(HttpMethod::Post, Action::Upload);
    request.body_params.push(Param::new("hash", hash));
    request.file_part = Some(FilePart {
        name: "file".to_string(),
        file_name: UPLOAD_FILE_NAME.to_string(),
        content_type: UPLOAD_CONTENT_TYPE.to_string(),
        data: Bytes::copy_from_slice(subtitle),
    });
    request
}

/// Split a comma-separated body, keeping empty entries
fn split_list(content: &str) -> Vec<String> {
    content.split(',').map(str::to_string).collect()
}

fn unexpected<T>(action: Action, status: u16) -> Lookup<T> {
    warn!("SubDB {} returned unexpected status {}", action, status);
    Lookup::Failed(ServiceFailure::UnexpectedStatus(status))
}

pub fn interpret_languages(response: &SubDbResponse) -> Lookup<Vec<String>> {
    match response.status {
        200 => Lookup::Found(split_list(&response.content)),
        status => unexpected(Action::Languages, status),
    }
}

pub fn interpret_search(response: &SubDbResponse) -> Lookup<Vec<String>> {
    match response.status {
        200 => Lookup::Found(split_list(&response.content)),
        404 => Lookup::NotFound,
        status => unexpected(Action::Search, status),
    }
}

pub fn interpret_download(response: &SubDbResponse) -> Lookup<Subtitle> {
    match response.status {
        200 => {
            let language = response
                .header(CONTENT_LANGUAGE_HEADER)
                .filter(|value| !value.is_empty())
                .map(str::to_string);
            Lookup::Found(Subtitle::found(response.content.clone(), language))
        }
        404 => Lookup::NotFound,
        status => unexpected(Action::Download, status),
    }
}

pub fn interpret_upload(response: &SubDbResponse) -> UploadOutcome {
    match response.status {
        201 => UploadOutcome::Uploaded,
        403 => UploadOutcome::Duplicated,
        415 => UploadOutcome::Invalid,
        status => {
            warn!("SubDB upload returned unexpected status {}", status);
            UploadOutcome::Error
        }
    }
}
