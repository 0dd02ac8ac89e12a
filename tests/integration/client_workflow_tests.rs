/*!
 * Client operations against the mock transport
 *
 * Every test here goes through `SubDbClient` exactly as a caller would and
 * inspects both the result and the request the transport received.
 */

use std::io::Cursor;
use anyhow::Result;
use subdb::errors::{SubDbError, TransportError};
use subdb::fingerprint::{self, HASH_SIZE};
use subdb::protocol::{HttpMethod, Lookup, ServiceFailure, SubDbResponse, Subtitle, UploadOutcome};
use subdb::{MockTransport, SubDbClient};
use crate::common::{self, SAMPLE_HASH};

// =========================================================================
// Languages
// =========================================================================

#[test]
fn test_listLanguages_ok_shouldReturnServerOrder() {
    let client = common::mock_client(200, "en,es,fr,it,nl,pl,pt,ro,sv,tr");

    let languages = client.list_languages().found().unwrap();

    assert_eq!(languages, vec!["en", "es", "fr", "it", "nl", "pl", "pt", "ro", "sv", "tr"]);
    let request = client.transport().last_request().unwrap();
    assert_eq!(request.method, HttpMethod::Get);
    assert_eq!(request.query_param("action"), Some(Some("languages")));
    assert_eq!(request.header("User-Agent"), Some("SubDB/1.0 (subdb-tests/0.1; http://tests.example)"));
}

#[test]
fn test_listLanguages_serverError_shouldBeAbsentNotEmpty() {
    let client = common::mock_client(500, "");

    let result = client.list_languages();

    assert!(result.is_failure());
    assert_eq!(result.languages(), None);
}

// =========================================================================
// Search
// =========================================================================

#[test]
fn test_search_ok_shouldSplitLanguages() -> Result<()> {
    let client = common::mock_client(200, "en,pt,es");

    let result = client.search(SAMPLE_HASH, false)?;

    assert_eq!(result.languages(), Some(vec!["en".to_string(), "pt".to_string(), "es".to_string()]));
    let request = client.transport().last_request().unwrap();
    assert_eq!(request.query_param("action"), Some(Some("search")));
    assert_eq!(request.query_param("hash"), Some(Some(SAMPLE_HASH)));
    Ok(())
}

#[test]
fn test_search_notFound_shouldReturnEmptyList() -> Result<()> {
    let client = common::mock_client(404, "");

    let result = client.search(SAMPLE_HASH, false)?;

    assert_eq!(result, Lookup::NotFound);
    assert_eq!(result.languages(), Some(Vec::new()));
    Ok(())
}

#[test]
fn test_search_badRequest_shouldBeAbsent() -> Result<()> {
    let client = common::mock_client(400, "");

    let result = client.search(SAMPLE_HASH, false)?;

    assert_eq!(result.failure(), Some(&ServiceFailure::UnexpectedStatus(400)));
    assert_eq!(result.languages(), None);
    Ok(())
}

#[test]
fn test_search_withVersions_shouldSendFlagAndParseCounts() -> Result<()> {
    let client = common::mock_client(200, "en:2,pt:1");

    let entries = client.search(SAMPLE_HASH, true)?.languages().unwrap();
    let versions = subdb::parse_language_versions(&entries)?;

    assert_eq!(client.transport().last_request().unwrap().query_param("versions"), Some(None));
    assert_eq!(versions.len(), 2);
    assert_eq!(versions[0].language, "en");
    assert_eq!(versions[0].count, 2);
    Ok(())
}

#[test]
fn test_search_withEmptyHash_shouldFailWithoutCallingTransport() {
    let client = common::mock_client(200, "en");

    for hash in ["", "   ", "\t\n"] {
        let result = client.search(hash, false);
        assert!(matches!(result, Err(SubDbError::InvalidHash)));
    }

    assert_eq!(client.transport().call_count(), 0);
}

#[test]
fn test_searchBytes_shouldSendFingerprint() -> Result<()> {
    let client = common::mock_client(200, "en");
    let media = common::sample_media(HASH_SIZE * 2);
    let expected = fingerprint::fingerprint_bytes(&media)?;

    client.search_bytes(&media, false)?;

    let request = client.transport().last_request().unwrap();
    assert_eq!(request.query_param("hash"), Some(Some(expected.as_str())));
    Ok(())
}

#[test]
fn test_searchBytes_withShortBuffer_shouldFailValidation() {
    let client = common::mock_client(200, "en");

    let result = client.search_bytes(&common::sample_media(HASH_SIZE - 1), false);

    assert!(matches!(result, Err(SubDbError::SourceTooShort { .. })));
    assert_eq!(client.transport().call_count(), 0);
}

#[test]
fn test_searchBytes_withEmptyBuffer_shouldReportEmptySource() {
    let client = common::mock_client(200, "en");

    let result = client.search_bytes(&[], false);

    assert!(matches!(result, Err(SubDbError::EmptySource { argument: "file_bytes" })));
    assert_eq!(client.transport().call_count(), 0);
}

#[test]
fn test_searchReader_shouldMatchBytesFingerprint() -> Result<()> {
    let client = common::mock_client(200, "en");
    let media = common::sample_media(HASH_SIZE + 4096);
    let expected = fingerprint::fingerprint_bytes(&media)?;

    client.search_reader(&mut Cursor::new(media), false)?;

    let request = client.transport().last_request().unwrap();
    assert_eq!(request.query_param("hash"), Some(Some(expected.as_str())));
    Ok(())
}

#[test]
fn test_searchReader_shouldLeaveSourceRewound() -> Result<()> {
    let client = common::mock_client(200, "en");
    let mut source = Cursor::new(common::sample_media(HASH_SIZE * 2));

    client.search_reader(&mut source, false)?;
    assert_eq!(source.position(), 0);

    client.download_reader(&mut source, "en")?;
    assert_eq!(source.position(), 0);
    Ok(())
}

#[test]
fn test_searchReader_withShortUnreadableSource_shouldReportUnreadable() {
    let client = common::mock_client(200, "en");
    let mut source = common::UnreadableSource::new(10);

    let result = client.search_reader(&mut source, false);

    assert!(matches!(result, Err(SubDbError::UnreadableSource(_))));
    assert_eq!(client.transport().call_count(), 0);
}

#[test]
fn test_searchReader_withPipe_shouldReportUnseekable() {
    let client = common::mock_client(200, "en");
    let mut source = common::PipeSource::new(common::sample_media(HASH_SIZE));

    let result = client.search_reader(&mut source, false);

    assert!(matches!(result, Err(SubDbError::UnseekableSource(_))));
    assert_eq!(client.transport().call_count(), 0);
}

#[test]
fn test_searchReader_withShortSource_shouldFailOnLength() {
    let client = common::mock_client(200, "en");

    let result = client.search_reader(&mut Cursor::new(common::sample_media(1024)), false);

    assert!(matches!(result, Err(SubDbError::SourceTooShort { length: 1024, .. })));
}

#[test]
fn test_searchFile_throughReader_shouldWork() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let media = common::sample_media(HASH_SIZE * 2);
    let path = common::create_test_file(temp_dir.path(), "movie.avi", &media)?;
    let client = common::mock_client(404, "");

    let mut file = std::fs::File::open(&path)?;
    let result = client.search_reader(&mut file, false)?;

    assert!(result.is_not_found());
    let expected = fingerprint::fingerprint_file(&path)?;
    assert_eq!(
        client.transport().last_request().unwrap().query_param("hash"),
        Some(Some(expected.as_str()))
    );
    Ok(())
}

// =========================================================================
// Download
// =========================================================================

#[test]
fn test_download_ok_shouldReturnContentAndLanguage() -> Result<()> {
    let client = common::mock_client_with(
        SubDbResponse::new(200, "subtitle content").with_header("Content-Language", "pt"),
    );

    let subtitle = client.download(SAMPLE_HASH, "en,pt,es")?.subtitle().unwrap();

    assert_eq!(
        subtitle,
        Subtitle {
            content: Some("subtitle content".to_string()),
            language: Some("pt".to_string()),
            not_found: false,
        }
    );
    let request = client.transport().last_request().unwrap();
    assert_eq!(request.query_param("action"), Some(Some("download")));
    assert_eq!(request.query_param("hash"), Some(Some(SAMPLE_HASH)));
    assert_eq!(request.query_param("language"), Some(Some("en,pt,es")));
    assert!(request.header("User-Agent").is_none());
    Ok(())
}

#[test]
fn test_download_withoutLanguageHeader_shouldLeaveLanguageAbsent() -> Result<()> {
    let responses = [
        SubDbResponse::new(200, "subtitle content"),
        SubDbResponse::new(200, "subtitle content").with_header("Content-Language", ""),
    ];

    for response in responses {
        let client = common::mock_client_with(response);
        let subtitle = client.download(SAMPLE_HASH, "en")?.subtitle().unwrap();
        assert_eq!(subtitle.language, None);
        assert!(!subtitle.not_found);
        assert_eq!(subtitle.content.as_deref(), Some("subtitle content"));
    }
    Ok(())
}

#[test]
fn test_download_notFound_shouldFlagNotFound() -> Result<()> {
    let client = common::mock_client(404, "");

    let subtitle = client.download(SAMPLE_HASH, "en")?.subtitle().unwrap();

    assert!(subtitle.not_found);
    assert_eq!(subtitle.content, None);
    Ok(())
}

#[test]
fn test_download_badRequest_shouldBeAbsent() -> Result<()> {
    let client = common::mock_client(400, "");

    let result = client.download(SAMPLE_HASH, "en")?;

    assert!(result.is_failure());
    assert_eq!(result.subtitle(), None);
    Ok(())
}

#[test]
fn test_download_withBlankArguments_shouldFailBeforeRequest() {
    let client = common::mock_client(200, "x");

    assert!(matches!(client.download("", "en"), Err(SubDbError::InvalidHash)));
    assert!(matches!(client.download(SAMPLE_HASH, " "), Err(SubDbError::InvalidLanguages)));
    assert_eq!(client.transport().call_count(), 0);
}

#[test]
fn test_downloadBytes_withPriorityList_shouldSendFingerprint() -> Result<()> {
    let client = common::mock_client(200, "text");
    let media = common::sample_media(HASH_SIZE * 3);
    let languages = subdb::language_priority_list(&["eng", "por"])?;

    client.download_bytes(&media, &languages)?;

    let request = client.transport().last_request().unwrap();
    assert_eq!(request.query_param("language"), Some(Some("en,pt")));
    assert_eq!(
        request.query_param("hash"),
        Some(Some(fingerprint::fingerprint_bytes(&media)?.as_str()))
    );
    Ok(())
}

#[test]
fn test_downloadReader_withShortSource_shouldFailValidation() {
    let client = common::mock_client(200, "text");

    let result = client.download_reader(&mut Cursor::new(vec![0u8; 16]), "en");

    assert!(matches!(result, Err(SubDbError::SourceTooShort { .. })));
}

// =========================================================================
// Upload
// =========================================================================

#[test]
fn test_upload_shouldMapStatusToOutcome() -> Result<()> {
    let cases = [
        (201, UploadOutcome::Uploaded),
        (403, UploadOutcome::Duplicated),
        (415, UploadOutcome::Invalid),
        (500, UploadOutcome::Error),
        (400, UploadOutcome::Error),
    ];

    for (status, expected) in cases {
        let client = common::mock_client(status, "");
        assert_eq!(client.upload(SAMPLE_HASH, b"subtitle")?, expected, "status {}", status);
    }
    Ok(())
}

#[test]
fn test_upload_shouldPostHashAndSubtitlePart() -> Result<()> {
    let client = common::mock_client(201, "");

    client.upload(SAMPLE_HASH, b"1\n00:00:01,000 --> 00:00:02,000\nHello\n")?;

    let request = client.transport().last_request().unwrap();
    assert_eq!(request.method, HttpMethod::Post);
    assert_eq!(request.query_param("action"), Some(Some("upload")));
    assert_eq!(request.body_param("hash"), Some(SAMPLE_HASH));
    let part = request.file_part.unwrap();
    assert_eq!(part.file_name, "subtitle.srt");
    assert_eq!(part.content_type, "application/octet-stream");
    Ok(())
}

#[test]
fn test_upload_shortSubtitle_shouldBeAccepted() -> Result<()> {
    let client = common::mock_client(201, "");

    assert_eq!(client.upload(SAMPLE_HASH, b"x")?, UploadOutcome::Uploaded);
    Ok(())
}

#[test]
fn test_upload_emptySubtitle_shouldFailValidation() {
    let client = common::mock_client(201, "");

    let result = client.upload(SAMPLE_HASH, b"");

    assert!(matches!(result, Err(SubDbError::EmptySource { argument: "subtitle" })));
    assert_eq!(client.transport().call_count(), 0);
}

#[test]
fn test_uploadBytes_withShortMedia_shouldFailValidation() {
    let client = common::mock_client(201, "");

    let result = client.upload_bytes(&common::sample_media(100), b"subtitle");

    assert!(matches!(result, Err(SubDbError::SourceTooShort { .. })));
    assert_eq!(client.transport().call_count(), 0);
}

#[test]
fn test_uploadReader_shouldHashMedia() -> Result<()> {
    let client = common::mock_client(403, "");
    let media = common::sample_media(HASH_SIZE);

    let outcome = client.upload_reader(&mut Cursor::new(media.clone()), b"subtitle")?;

    assert_eq!(outcome, UploadOutcome::Duplicated);
    assert_eq!(
        client.transport().last_request().unwrap().body_param("hash"),
        Some(fingerprint::fingerprint_bytes(&media)?.as_str())
    );
    Ok(())
}

#[test]
fn test_uploadReader_shouldLeaveMediaRewound() -> Result<()> {
    let client = common::mock_client(201, "");
    let mut media = Cursor::new(common::sample_media(HASH_SIZE + 10));

    client.upload_reader(&mut media, b"subtitle")?;

    assert_eq!(media.position(), 0);
    Ok(())
}

#[test]
fn test_uploadSubtitleReader_withHash_shouldSendStreamContents() -> Result<()> {
    let client = common::mock_client(201, "");
    let content = b"1\n00:00:01,000 --> 00:00:02,000\nHello\n".to_vec();

    let outcome = client.upload_subtitle_reader(SAMPLE_HASH, &mut Cursor::new(content.clone()))?;

    assert_eq!(outcome, UploadOutcome::Uploaded);
    let request = client.transport().last_request().unwrap();
    assert_eq!(request.method, HttpMethod::Post);
    assert_eq!(request.body_param("hash"), Some(SAMPLE_HASH));
    assert_eq!(&request.file_part.unwrap().data[..], &content[..]);
    Ok(())
}

#[test]
fn test_uploadSubtitleReader_withBothReaders_shouldHashMediaAndSendSubtitle() -> Result<()> {
    let client = common::mock_client(201, "");
    let media = common::sample_media(HASH_SIZE * 3);
    let mut media_source = Cursor::new(media.clone());

    let outcome = client
        .upload_reader_with_subtitle_reader(&mut media_source, &mut Cursor::new(b"subtitle".to_vec()))?;

    assert_eq!(outcome, UploadOutcome::Uploaded);
    assert_eq!(media_source.position(), 0);
    let request = client.transport().last_request().unwrap();
    assert_eq!(
        request.body_param("hash"),
        Some(fingerprint::fingerprint_bytes(&media)?.as_str())
    );
    assert_eq!(&request.file_part.unwrap().data[..], b"subtitle");
    Ok(())
}

#[test]
fn test_uploadSubtitleReader_withUnreadableSubtitle_shouldFailBeforeRequest() {
    let client = common::mock_client(201, "");

    let result = client.upload_subtitle_reader(SAMPLE_HASH, &mut common::UnreadableSource::new(64));

    assert!(matches!(result, Err(SubDbError::UnreadableSource(_))));
    assert_eq!(client.transport().call_count(), 0);
}

#[test]
fn test_uploadSubtitleReader_withEmptySubtitle_shouldReportEmptySource() {
    let client = common::mock_client(201, "");

    let result = client.upload_subtitle_reader(SAMPLE_HASH, &mut Cursor::new(Vec::new()));

    assert!(matches!(result, Err(SubDbError::EmptySource { argument: "subtitle" })));
    assert_eq!(client.transport().call_count(), 0);
}

#[test]
fn test_uploadSubtitleReader_withEmptyHash_shouldNotReadSubtitle() {
    let client = common::mock_client(201, "");
    let mut subtitle = Cursor::new(b"subtitle".to_vec());

    let result = client.upload_subtitle_reader("", &mut subtitle);

    assert!(matches!(result, Err(SubDbError::InvalidHash)));
    assert_eq!(subtitle.position(), 0);
}

// =========================================================================
// Transport failures
// =========================================================================

#[test]
fn test_transportFailure_shouldBeAbsentForLookupsAndErrorForUpload() -> Result<()> {
    common::init_logging();
    let client = SubDbClient::with_transport(MockTransport::failing(TransportError::ConnectionError(
        "refused".to_string(),
    )));

    assert_eq!(client.list_languages().languages(), None);
    assert_eq!(client.search(SAMPLE_HASH, false)?.languages(), None);
    assert_eq!(client.download(SAMPLE_HASH, "en")?.subtitle(), None);
    assert_eq!(client.upload(SAMPLE_HASH, b"subtitle")?, UploadOutcome::Error);

    let failure = client.search(SAMPLE_HASH, false)?;
    assert!(matches!(
        failure.failure(),
        Some(ServiceFailure::Transport(TransportError::ConnectionError(_)))
    ));
    Ok(())
}

#[test]
fn test_calls_shouldBeIndependent() -> Result<()> {
    common::init_logging();
    let client = SubDbClient::with_transport(MockTransport::sequence(vec![
        SubDbResponse::new(404, ""),
        SubDbResponse::new(200, "en"),
    ]));

    assert!(client.search(SAMPLE_HASH, false)?.is_not_found());
    assert_eq!(client.search(SAMPLE_HASH, false)?.languages(), Some(vec!["en".to_string()]));
    assert_eq!(client.transport().requests().len(), 2);
    Ok(())
}
