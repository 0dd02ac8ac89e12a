use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use once_cell::sync::OnceCell;
use reqwest::header::HeaderMap;
use url::Url;

use crate::app_config::ClientConfig;
use crate::errors::{SubDbError, TransportError};
use crate::protocol::{HttpMethod, SubDbRequest, SubDbResponse};
use crate::transport::Transport;

/// reqwest-backed transport
///
/// The async and blocking reqwest clients are each built on first use, so a
/// caller that only uses one flavour never pays for the other. The blocking
/// entry point must not be called from inside an async runtime.
#[derive(Debug)]
pub struct HttpTransport {
    /// Base URL every request is sent to
    base_url: Url,
    /// Per-request timeout
    timeout: Duration,
    /// Async client, built lazily
    client: OnceCell<reqwest::Client>,
    /// Blocking client, built lazily
    blocking_client: OnceCell<reqwest::blocking::Client>,
}

impl HttpTransport {
    /// Create a transport for the given endpoint
    pub fn new(base_url: Url, timeout: Duration) -> Self {
        Self {
            base_url,
            timeout,
            client: OnceCell::new(),
            blocking_client: OnceCell::new(),
        }
    }

    /// Create a transport from a client configuration
    pub fn from_config(config: &ClientConfig) -> Result<Self, SubDbError> {
        let base_url = config.parsed_base_url()?;
        Ok(Self::new(base_url, Duration::from_secs(config.timeout_secs)))
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Full URL of a request: the base URL plus its query parameters
    pub fn request_url(&self, request: &SubDbRequest) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut pairs = url.query_pairs_mut();
            for param in &request.query_params {
                match &param.value {
                    Some(value) => pairs.append_pair(&param.name, value),
                    None => pairs.append_key_only(&param.name),
                };
            }
        }
        url
    }

    fn client(&self) -> Result<&reqwest::Client, TransportError> {
        self.client.get_or_try_init(|| {
            reqwest::Client::builder()
                .timeout(self.timeout)
                .build()
                .map_err(|e| TransportError::InvalidRequest(e.to_string()))
        })
    }

    fn blocking_client(&self) -> Result<&reqwest::blocking::Client, TransportError> {
        self.blocking_client.get_or_try_init(|| {
            reqwest::blocking::Client::builder()
                .timeout(self.timeout)
                .build()
                .map_err(|e| TransportError::InvalidRequest(e.to_string()))
        })
    }
}

/// Whether a request needs a multipart body
fn has_form(request: &SubDbRequest) -> bool {
    request.method == HttpMethod::Post
        && (!request.body_params.is_empty() || request.file_part.is_some())
}

fn async_form(request: &SubDbRequest) -> Result<reqwest::multipart::Form, TransportError> {
    let mut form = reqwest::multipart::Form::new();
    for param in &request.body_params {
        form = form.text(param.name.clone(), param.value.clone().unwrap_or_default());
    }
    if let Some(file) = &request.file_part {
        let part = reqwest::multipart::Part::bytes(file.data.to_vec())
            .file_name(file.file_name.clone())
            .mime_str(&file.content_type)
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        form = form.part(file.name.clone(), part);
    }
    Ok(form)
}

fn blocking_form(
    request: &SubDbRequest,
) -> Result<reqwest::blocking::multipart::Form, TransportError> {
    let mut form = reqwest::blocking::multipart::Form::new();
    for param in &request.body_params {
        form = form.text(param.name.clone(), param.value.clone().unwrap_or_default());
    }
    if let Some(file) = &request.file_part {
        let part = reqwest::blocking::multipart::Part::bytes(file.data.to_vec())
            .file_name(file.file_name.clone())
            .mime_str(&file.content_type)
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        form = form.part(file.name.clone(), part);
    }
    Ok(form)
}

fn collect_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect()
}

fn map_reqwest_error(e: reqwest::Error) -> TransportError {
    let error = if e.is_timeout() {
        TransportError::Timeout(e.to_string())
    } else if e.is_connect() {
        TransportError::ConnectionError(e.to_string())
    } else if e.is_builder() {
        TransportError::InvalidRequest(e.to_string())
    } else {
        TransportError::RequestFailed(e.to_string())
    };
    debug!("reqwest error mapped to {:?}", error);
    error
}

#[async_trait]
impl Transport for HttpTransport {
    fn execute(&self, request: &SubDbRequest) -> Result<SubDbResponse, TransportError> {
        let client = self.blocking_client()?;
        let url = self.request_url(request);
        debug!("{:?} {}", request.method, url);

        let mut builder = match request.method {
            HttpMethod::Get => client.get(url),
            HttpMethod::Post => client.post(url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if has_form(request) {
            builder = builder.multipart(blocking_form(request)?);
        }

        let response = builder.send().map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let headers = collect_headers(response.headers());
        let content = response
            .text()
            .map_err(|e| TransportError::BodyError(e.to_string()))?;

        Ok(SubDbResponse {
            status,
            content,
            headers,
        })
    }

    async fn execute_async(&self, request: &SubDbRequest) -> Result<SubDbResponse, TransportError> {
        let client = self.client()?;
        let url = self.request_url(request);
        debug!("{:?} {}", request.method, url);

        let mut builder = match request.method {
            HttpMethod::Get => client.get(url),
            HttpMethod::Post => client.post(url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if has_form(request) {
            builder = builder.multipart(async_form(request)?);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let headers = collect_headers(response.headers());
        let content = response
            .text()
            .await
            .map_err(|e| TransportError::BodyError(e.to_string()))?;

        Ok(SubDbResponse {
            status,
            content,
            headers,
        })
    }
}
