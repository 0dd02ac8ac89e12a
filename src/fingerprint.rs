/*!
 * Content fingerprinting for media files.
 *
 * SubDB identifies a media file by the MD5 digest of its first and last
 * 64 KiB. The digest is rendered as 32 lowercase hex characters and used as
 * the `hash` parameter for search, download and upload.
 */

use std::fmt;
use std::fs::File;
use std::io::{self, Cursor, ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;

use log::debug;
use md5::{Digest, Md5};

use crate::errors::SubDbError;

/// Size of each sampled chunk (64 KiB)
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Size of the hashed buffer: the first and the last chunk
pub const HASH_SIZE: usize = 2 * CHUNK_SIZE;

/// A SubDB content hash
///
/// Only the generator functions in this module produce a `Fingerprint`, so
/// a value of this type is always 32 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// The hash as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the fingerprint, returning the hash string
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Fingerprint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Compute the fingerprint of a seekable byte source
///
/// The source position is left at the end of the last chunk.
///
/// # Errors
/// * `SubDbError::UnseekableSource` if the length cannot be determined
/// * `SubDbError::SourceTooShort` if the source is shorter than `HASH_SIZE`;
///   nothing is read in that case
/// * `SubDbError::UnreadableSource` if reading a chunk fails
pub fn fingerprint<R: Read + Seek + ?Sized>(source: &mut R) -> Result<Fingerprint, SubDbError> {
    let length = source
        .seek(SeekFrom::End(0))
        .map_err(SubDbError::UnseekableSource)?;
    ensure_min_length(length)?;

    let mut buffer = vec![0u8; HASH_SIZE];

    source
        .seek(SeekFrom::Start(0))
        .map_err(SubDbError::UnseekableSource)?;
    let head = read_up_to(source, &mut buffer[..CHUNK_SIZE]).map_err(SubDbError::UnreadableSource)?;

    // The tail goes right after what the first read actually produced.
    source
        .seek(SeekFrom::Start(length - CHUNK_SIZE as u64))
        .map_err(SubDbError::UnseekableSource)?;
    let tail = read_up_to(source, &mut buffer[head..head + CHUNK_SIZE])
        .map_err(SubDbError::UnreadableSource)?;

    debug!(
        "Fingerprinting {} byte source: read {} head bytes and {} tail bytes",
        length, head, tail
    );

    let mut hasher = Md5::new();
    hasher.update(&buffer);
    Ok(Fingerprint(format!("{:x}", hasher.finalize())))
}

/// Compute the fingerprint of an in-memory buffer
pub fn fingerprint_bytes(bytes: &[u8]) -> Result<Fingerprint, SubDbError> {
    ensure_min_length(bytes.len() as u64)?;
    fingerprint(&mut Cursor::new(bytes))
}

/// Compute the fingerprint of a file on disk
///
/// The file is opened read-only and closed before returning.
pub fn fingerprint_file<P: AsRef<Path>>(path: P) -> Result<Fingerprint, SubDbError> {
    let mut file = File::open(path.as_ref())?;
    fingerprint(&mut file)
}

/// Check that a source supports random access and reading, returning its length
///
/// Both capabilities are checked before the length is looked at, so a short
/// unreadable source reports as unreadable. The source is rewound afterwards.
pub fn inspect_source<R: Read + Seek + ?Sized>(source: &mut R) -> Result<u64, SubDbError> {
    let length = source
        .seek(SeekFrom::End(0))
        .map_err(SubDbError::UnseekableSource)?;
    source
        .seek(SeekFrom::Start(0))
        .map_err(SubDbError::UnseekableSource)?;

    let mut first = [0u8; 1];
    read_up_to(source, &mut first).map_err(SubDbError::UnreadableSource)?;
    source
        .seek(SeekFrom::Start(0))
        .map_err(SubDbError::UnseekableSource)?;

    Ok(length)
}

/// Fail with `SourceTooShort` when `length` cannot hold both chunks
pub(crate) fn ensure_min_length(length: u64) -> Result<(), SubDbError> {
    if length < HASH_SIZE as u64 {
        return Err(SubDbError::SourceTooShort {
            length,
            required: HASH_SIZE as u64,
        });
    }
    Ok(())
}

/// Read until `buf` is full or the source is exhausted, returning the count
fn read_up_to<R: Read + ?Sized>(source: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
