/*!
 * # subdb - SubDB subtitle database client
 *
 * A Rust library for looking up, downloading and uploading subtitles on
 * SubDB, a service that keys subtitles by a hash of the media file.
 *
 * ## Features
 *
 * - Fingerprint media files the way SubDB expects (MD5 over the first and
 *   last 64 KiB)
 * - List languages, search, download and upload subtitles
 * - Hash given directly, or computed from a byte buffer or a seekable reader
 * - Blocking and async entry points over a pluggable transport
 * - ISO 639-1 and ISO 639-2 language code support
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `fingerprint`: Content hash computation
 * - `protocol`: Request shapes and status-code interpretation
 * - `client`: The `SubDbClient` protocol adapter
 * - `transport`: Transport trait and implementations:
 *   - `transport::http`: reqwest-backed HTTP transport
 *   - `transport::mock`: In-memory transport for tests
 * - `app_config`: Client configuration
 * - `language_utils`: ISO language code utilities
 * - `errors`: Custom error types for the library
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
// These lints will be allowed but not auto-fixed
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::redundant_closure_for_method_calls)]

// Public modules
pub mod app_config;
pub mod client;
pub mod errors;
pub mod fingerprint;
pub mod language_utils;
pub mod protocol;
pub mod transport;

// Re-export main types for easier usage
pub use app_config::ClientConfig;
pub use client::SubDbClient;
pub use errors::{SubDbError, TransportError};
pub use fingerprint::{CHUNK_SIZE, Fingerprint, HASH_SIZE, fingerprint, fingerprint_bytes, fingerprint_file};
pub use language_utils::{get_language_name, language_priority_list, normalize_to_part1};
pub use protocol::{LanguageVersions, Lookup, ServiceFailure, Subtitle, UploadOutcome, parse_language_versions};
pub use transport::{HttpTransport, MockTransport, Transport};
