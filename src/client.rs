/*!
 * SubDB client.
 *
 * `SubDbClient` validates arguments, builds protocol requests, dispatches
 * them through its transport and interprets the responses. Each action has
 * three entry points differing only in how the hash is obtained (given
 * directly, from a byte buffer, or from a seekable reader), plus an async
 * counterpart of each that goes through `Transport::execute_async`. Upload
 * also accepts the subtitle itself as a reader, consumed to the end.
 *
 * Entry points taking a media reader leave it rewound to the start.
 */

use std::io::{Read, Seek, SeekFrom};

use log::{debug, error};

use crate::app_config::ClientConfig;
use crate::errors::{SubDbError, TransportError};
use crate::fingerprint::{self, Fingerprint};
use crate::protocol::{
    self, Action, Lookup, ServiceFailure, SubDbRequest, SubDbResponse, Subtitle, UploadOutcome,
};
use crate::transport::{HttpTransport, Transport};

/// Client for the SubDB API
#[derive(Debug)]
pub struct SubDbClient<T: Transport = HttpTransport> {
    /// Transport every request goes through
    transport: T,
    /// User-Agent attached to each request, if the client owns its identity
    user_agent: Option<String>,
}

impl SubDbClient<HttpTransport> {
    /// Create a client talking HTTP to the configured endpoint
    pub fn new(config: ClientConfig) -> Result<Self, SubDbError> {
        config.validate()?;
        let transport = HttpTransport::from_config(&config)?;
        Ok(Self::with_config_and_transport(&config, transport))
    }
}

impl<T: Transport> SubDbClient<T> {
    /// Create a client around a pre-configured transport
    ///
    /// No User-Agent is added; the transport is expected to send its own.
    pub fn with_transport(transport: T) -> Self {
        Self {
            transport,
            user_agent: None,
        }
    }

    /// Create a client around a transport, identifying itself with `config`
    pub fn with_config_and_transport(config: &ClientConfig, transport: T) -> Self {
        Self {
            transport,
            user_agent: Some(config.user_agent()),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }

    // =========================================================================
    // Languages
    // =========================================================================

    /// List the languages the service has subtitles for
    pub fn list_languages(&self) -> Lookup<Vec<String>> {
        let request = self.prepare(protocol::languages_request());
        self.lookup(request, protocol::interpret_languages)
    }

    pub async fn list_languages_async(&self) -> Lookup<Vec<String>> {
        let request = self.prepare(protocol::languages_request());
        self.lookup_async(request, protocol::interpret_languages).await
    }

    // =========================================================================
    // Search
    // =========================================================================

    /// Search for the languages available for a hash
    ///
    /// With `versions` set, each entry has the form `<LANGUAGE>:<COUNT>`; see
    /// `protocol::parse_language_versions`.
    pub fn search(&self, hash: &str, versions: bool) -> Result<Lookup<Vec<String>>, SubDbError> {
        let request = self.search_request(hash, versions)?;
        Ok(self.lookup(request, protocol::interpret_search))
    }

    /// Search using the fingerprint of an in-memory media file
    pub fn search_bytes(
        &self,
        file_bytes: &[u8],
        versions: bool,
    ) -> Result<Lookup<Vec<String>>, SubDbError> {
        let hash = hash_bytes(file_bytes)?;
        self.search(hash.as_str(), versions)
    }

    /// Search using the fingerprint of a seekable media source
    ///
    /// The source is rewound to the start before the request is sent.
    pub fn search_reader<R: Read + Seek + ?Sized>(
        &self,
        source: &mut R,
        versions: bool,
    ) -> Result<Lookup<Vec<String>>, SubDbError> {
        let hash = hash_reader(source)?;
        self.search(hash.as_str(), versions)
    }

    pub async fn search_async(
        &self,
        hash: &str,
        versions: bool,
    ) -> Result<Lookup<Vec<String>>, SubDbError> {
        let request = self.search_request(hash, versions)?;
        Ok(self.lookup_async(request, protocol::interpret_search).await)
    }

    pub async fn search_bytes_async(
        &self,
        file_bytes: &[u8],
        versions: bool,
    ) -> Result<Lookup<Vec<String>>, SubDbError> {
        let hash = hash_bytes(file_bytes)?;
        self.search_async(hash.as_str(), versions).await
    }

    pub async fn search_reader_async<R: Read + Seek + ?Sized>(
        &self,
        source: &mut R,
        versions: bool,
    ) -> Result<Lookup<Vec<String>>, SubDbError> {
        let hash = hash_reader(source)?;
        self.search_async(hash.as_str(), versions).await
    }

    // =========================================================================
    // Download
    // =========================================================================

    /// Download the subtitle for a hash
    ///
    /// `languages` is a single code (`en`) or a comma-separated list in
    /// priority order (`en,pt`); the first language found is returned.
    pub fn download(&self, hash: &str, languages: &str) -> Result<Lookup<Subtitle>, SubDbError> {
        let request = self.download_request(hash, languages)?;
        Ok(self.lookup(request, protocol::interpret_download))
    }

    pub fn download_bytes(
        &self,
        file_bytes: &[u8],
        languages: &str,
    ) -> Result<Lookup<Subtitle>, SubDbError> {
        let hash = hash_bytes(file_bytes)?;
        self.download(hash.as_str(), languages)
    }

    /// Download using the fingerprint of a seekable media source
    ///
    /// The source is rewound to the start before the request is sent.
    pub fn download_reader<R: Read + Seek + ?Sized>(
        &self,
        source: &mut R,
        languages: &str,
    ) -> Result<Lookup<Subtitle>, SubDbError> {
        let hash = hash_reader(source)?;
        self.download(hash.as_str(), languages)
    }

    pub async fn download_async(
        &self,
        hash: &str,
        languages: &str,
    ) -> Result<Lookup<Subtitle>, SubDbError> {
        let request = self.download_request(hash, languages)?;
        Ok(self.lookup_async(request, protocol::interpret_download).await)
    }

    pub async fn download_bytes_async(
        &self,
        file_bytes: &[u8],
        languages: &str,
    ) -> Result<Lookup<Subtitle>, SubDbError> {
        let hash = hash_bytes(file_bytes)?;
        self.download_async(hash.as_str(), languages).await
    }

    pub async fn download_reader_async<R: Read + Seek + ?Sized>(
        &self,
        source: &mut R,
        languages: &str,
    ) -> Result<Lookup<Subtitle>, SubDbError> {
        let hash = hash_reader(source)?;
        self.download_async(hash.as_str(), languages).await
    }

    // =========================================================================
    // Upload
    // =========================================================================

    /// Upload a subtitle for a hash
    ///
    /// Server failures are reported as `UploadOutcome::Error`; only argument
    /// validation produces an `Err`.
    pub fn upload(&self, hash: &str, subtitle: &[u8]) -> Result<UploadOutcome, SubDbError> {
        let request = self.upload_request(hash, subtitle)?;
        Ok(match self.dispatch(&request) {
            Ok(response) => protocol::interpret_upload(&response),
            Err(e) => upload_failure(e),
        })
    }

    pub fn upload_bytes(
        &self,
        file_bytes: &[u8],
        subtitle: &[u8],
    ) -> Result<UploadOutcome, SubDbError> {
        ensure_subtitle(subtitle)?;
        let hash = hash_bytes(file_bytes)?;
        self.upload(hash.as_str(), subtitle)
    }

    /// Upload a subtitle, hashing the media in `source`
    ///
    /// The source is rewound to the start before the request is sent.
    pub fn upload_reader<R: Read + Seek + ?Sized>(
        &self,
        source: &mut R,
        subtitle: &[u8],
    ) -> Result<UploadOutcome, SubDbError> {
        ensure_subtitle(subtitle)?;
        let hash = hash_reader(source)?;
        self.upload(hash.as_str(), subtitle)
    }

    pub async fn upload_async(
        &self,
        hash: &str,
        subtitle: &[u8],
    ) -> Result<UploadOutcome, SubDbError> {
        let request = self.upload_request(hash, subtitle)?;
        Ok(match self.dispatch_async(&request).await {
            Ok(response) => protocol::interpret_upload(&response),
            Err(e) => upload_failure(e),
        })
    }

    pub async fn upload_bytes_async(
        &self,
        file_bytes: &[u8],
        subtitle: &[u8],
    ) -> Result<UploadOutcome, SubDbError> {
        ensure_subtitle(subtitle)?;
        let hash = hash_bytes(file_bytes)?;
        self.upload_async(hash.as_str(), subtitle).await
    }

    pub async fn upload_reader_async<R: Read + Seek + ?Sized>(
        &self,
        source: &mut R,
        subtitle: &[u8],
    ) -> Result<UploadOutcome, SubDbError> {
        ensure_subtitle(subtitle)?;
        let hash = hash_reader(source)?;
        self.upload_async(hash.as_str(), subtitle).await
    }

    /// Upload a subtitle read to the end from `subtitle`, for a hash
    pub fn upload_subtitle_reader<S: Read + ?Sized>(
        &self,
        hash: &str,
        subtitle: &mut S,
    ) -> Result<UploadOutcome, SubDbError> {
        ensure_hash(hash)?;
        let subtitle = read_subtitle(subtitle)?;
        self.upload(hash, &subtitle)
    }

    /// Upload a subtitle read from `subtitle`, hashing the media in `source`
    pub fn upload_reader_with_subtitle_reader<R, S>(
        &self,
        source: &mut R,
        subtitle: &mut S,
    ) -> Result<UploadOutcome, SubDbError>
    where
        R: Read + Seek + ?Sized,
        S: Read + ?Sized,
    {
        let subtitle = read_subtitle(subtitle)?;
        self.upload_reader(source, &subtitle)
    }

    pub async fn upload_subtitle_reader_async<S: Read + ?Sized>(
        &self,
        hash: &str,
        subtitle: &mut S,
    ) -> Result<UploadOutcome, SubDbError> {
        ensure_hash(hash)?;
        let subtitle = read_subtitle(subtitle)?;
        self.upload_async(hash, &subtitle).await
    }

    pub async fn upload_reader_with_subtitle_reader_async<R, S>(
        &self,
        source: &mut R,
        subtitle: &mut S,
    ) -> Result<UploadOutcome, SubDbError>
    where
        R: Read + Seek + ?Sized,
        S: Read + ?Sized,
    {
        let subtitle = read_subtitle(subtitle)?;
        self.upload_reader_async(source, &subtitle).await
    }

    // =========================================================================
    // Request building and dispatch
    // =========================================================================

    fn search_request(&self, hash: &str, versions: bool) -> Result<SubDbRequest, SubDbError> {
        ensure_hash(hash)?;
        Ok(self.prepare(protocol::search_request(hash, versions)))
    }

    fn download_request(&self, hash: &str, languages: &str) -> Result<SubDbRequest, SubDbError> {
        ensure_hash(hash)?;
        if languages.trim().is_empty() {
            return Err(SubDbError::InvalidLanguages);
        }
        Ok(self.prepare(protocol::download_request(hash, languages)))
    }

    fn upload_request(&self, hash: &str, subtitle: &[u8]) -> Result<SubDbRequest, SubDbError> {
        ensure_hash(hash)?;
        ensure_subtitle(subtitle)?;
        Ok(self.prepare(protocol::upload_request(hash, subtitle)))
    }

    /// Attach the client identity to a request
    fn prepare(&self, mut request: SubDbRequest) -> SubDbRequest {
        if let Some(user_agent) = &self.user_agent {
            request.set_header("User-Agent", user_agent.as_str());
        }
        request
    }

    fn dispatch(&self, request: &SubDbRequest) -> Result<SubDbResponse, TransportError> {
        debug!("Dispatching SubDB {} request", request.action);
        self.transport.execute(request)
    }

    async fn dispatch_async(&self, request: &SubDbRequest) -> Result<SubDbResponse, TransportError> {
        debug!("Dispatching SubDB {} request (async)", request.action);
        self.transport.execute_async(request).await
    }

    fn lookup<V>(
        &self,
        request: SubDbRequest,
        interpret: fn(&SubDbResponse) -> Lookup<V>,
    ) -> Lookup<V> {
        match self.dispatch(&request) {
            Ok(response) => interpret(&response),
            Err(e) => lookup_failure(request.action, e),
        }
    }

    async fn lookup_async<V>(
        &self,
        request: SubDbRequest,
        interpret: fn(&SubDbResponse) -> Lookup<V>,
    ) -> Lookup<V> {
        match self.dispatch_async(&request).await {
            Ok(response) => interpret(&response),
            Err(e) => lookup_failure(request.action, e),
        }
    }
}

fn ensure_hash(hash: &str) -> Result<(), SubDbError> {
    if hash.trim().is_empty() {
        return Err(SubDbError::InvalidHash);
    }
    Ok(())
}

fn ensure_subtitle(subtitle: &[u8]) -> Result<(), SubDbError> {
    if subtitle.is_empty() {
        return Err(SubDbError::EmptySource {
            argument: "subtitle",
        });
    }
    Ok(())
}

fn hash_bytes(file_bytes: &[u8]) -> Result<Fingerprint, SubDbError> {
    if file_bytes.is_empty() {
        return Err(SubDbError::EmptySource {
            argument: "file_bytes",
        });
    }
    fingerprint::fingerprint_bytes(file_bytes)
}

/// Fingerprint a reader, leaving it rewound to the start
fn hash_reader<R: Read + Seek + ?Sized>(source: &mut R) -> Result<Fingerprint, SubDbError> {
    fingerprint::inspect_source(source)?;
    let hash = fingerprint::fingerprint(source)?;
    source
        .seek(SeekFrom::Start(0))
        .map_err(SubDbError::UnseekableSource)?;
    Ok(hash)
}

/// Read a subtitle payload to the end
fn read_subtitle<S: Read + ?Sized>(subtitle: &mut S) -> Result<Vec<u8>, SubDbError> {
    let mut content = Vec::new();
    subtitle
        .read_to_end(&mut content)
        .map_err(SubDbError::UnreadableSource)?;
    Ok(content)
}

fn lookup_failure<V>(action: Action, e: TransportError) -> Lookup<V> {
    error!("SubDB {} request failed: {}", action, e);
    Lookup::Failed(ServiceFailure::Transport(e))
}

fn upload_failure(e: TransportError) -> UploadOutcome {
    error!("SubDB upload request failed: {}", e);
    UploadOutcome::Error
}
