//! Streaming checksum computation
//!
//! Digests are computed chunk by chunk so package files of any size are never
//! loaded into memory at once. Every function reads through a handle it owns
//! (or a duplicate of the caller's descriptor) except `checksum_reader`, which
//! rewinds the caller's handle before and after hashing.

use md5::Md5;
use rayon::prelude::*;
use sha1::Sha1;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use shelf_core::error::ShelfError;
use shelf_core::types::HashAlgorithm;
use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::fd::BorrowedFd;

use crate::StoreResult;

/// Default read size for streaming digests (64 KiB)
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Running digest for one of the supported algorithms
enum DigestState {
    Md5(Md5),
    Sha1(Sha1),
    Sha224(Sha224),
    Sha256(Sha256),
    Sha384(Sha384),
    Sha512(Sha512),
}

impl DigestState {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Md5 => DigestState::Md5(Md5::new()),
            HashAlgorithm::Sha1 => DigestState::Sha1(Sha1::new()),
            HashAlgorithm::Sha224 => DigestState::Sha224(Sha224::new()),
            HashAlgorithm::Sha256 => DigestState::Sha256(Sha256::new()),
            HashAlgorithm::Sha384 => DigestState::Sha384(Sha384::new()),
            HashAlgorithm::Sha512 => DigestState::Sha512(Sha512::new()),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            DigestState::Md5(h) => h.update(data),
            DigestState::Sha1(h) => h.update(data),
            DigestState::Sha224(h) => h.update(data),
            DigestState::Sha256(h) => h.update(data),
            DigestState::Sha384(h) => h.update(data),
            DigestState::Sha512(h) => h.update(data),
        }
    }

    fn finalize_hex(self) -> String {
        match self {
            DigestState::Md5(h) => hex::encode(h.finalize()),
            DigestState::Sha1(h) => hex::encode(h.finalize()),
            DigestState::Sha224(h) => hex::encode(h.finalize()),
            DigestState::Sha256(h) => hex::encode(h.finalize()),
            DigestState::Sha384(h) => hex::encode(h.finalize()),
            DigestState::Sha512(h) => hex::encode(h.finalize()),
        }
    }
}

/// Compute the hex digest of an in-memory buffer
pub fn checksum_bytes(algorithm: HashAlgorithm, data: &[u8]) -> String {
    let mut state = DigestState::new(algorithm);
    state.update(data);
    state.finalize_hex()
}

/// Digest everything from the reader's current position to end of stream
pub fn checksum_stream<R: Read + ?Sized>(
    reader: &mut R,
    algorithm: HashAlgorithm,
    chunk_size: usize,
) -> StoreResult<String> {
    let chunk_size = if chunk_size == 0 { DEFAULT_CHUNK_SIZE } else { chunk_size };
    let mut buffer = vec![0u8; chunk_size];
    let mut state = DigestState::new(algorithm);

    loop {
        let read = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(ShelfError::io("Failed to read checksum source".to_string(), e)),
        };
        state.update(&buffer[..read]);
    }

    Ok(state.finalize_hex())
}

/// Digest a seekable handle from its start.
///
/// The handle is rewound to the start again once the digest is complete.
pub fn checksum_reader<R: Read + Seek + ?Sized>(
    reader: &mut R,
    algorithm: HashAlgorithm,
    chunk_size: usize,
) -> StoreResult<String> {
    reader
        .seek(SeekFrom::Start(0))
        .map_err(|e| ShelfError::io("Failed to rewind checksum source".to_string(), e))?;

    let digest = checksum_stream(reader, algorithm, chunk_size)?;

    reader
        .seek(SeekFrom::Start(0))
        .map_err(|e| ShelfError::io("Failed to rewind checksum source".to_string(), e))?;

    Ok(digest)
}

/// Digest a file through a private handle
pub fn checksum_file<P: AsRef<Path>>(
    path: P,
    algorithm: HashAlgorithm,
    chunk_size: usize,
) -> StoreResult<String> {
    let path = path.as_ref();
    let mut file = File::open(path).map_err(|e| {
        ShelfError::io(format!("Failed to open {} for hashing", path.display()), e)
    })?;
    checksum_stream(&mut file, algorithm, chunk_size)
}

/// Digest an open descriptor through a duplicate of it.
///
/// The duplicate shares the file offset with `fd`; it is left at the start.
#[cfg(unix)]
pub fn checksum_fd(
    fd: BorrowedFd<'_>,
    algorithm: HashAlgorithm,
    chunk_size: usize,
) -> StoreResult<String> {
    let owned = fd
        .try_clone_to_owned()
        .map_err(|e| ShelfError::io("Failed to duplicate file descriptor".to_string(), e))?;
    let mut file = File::from(owned);
    checksum_reader(&mut file, algorithm, chunk_size)
}

/// Hash multiple files in parallel, keeping input order
pub fn checksum_files_parallel(
    paths: &[PathBuf],
    algorithm: HashAlgorithm,
    chunk_size: usize,
) -> StoreResult<Vec<(PathBuf, String)>> {
    paths
        .par_iter()
        .map(|path| {
            let digest = checksum_file(path, algorithm, chunk_size)?;
            Ok((path.clone(), digest))
        })
        .collect()
}

/// Modification time of a file as Unix seconds
pub fn file_timestamp<P: AsRef<Path>>(path: P) -> StoreResult<i64> {
    let path = path.as_ref();
    let modified = fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(|e| ShelfError::io(format!("Failed to stat {}", path.display()), e))?;
    Ok(chrono::DateTime::<chrono::Utc>::from(modified).timestamp())
}

/// Seekable byte source accepted by `ChecksumRequest`
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek> ReadSeek for T {}

/// Checksum request naming its algorithm and exactly one source.
///
/// ```no_run
/// use shelf_store::ChecksumRequest;
///
/// let digest = ChecksumRequest::new("sha256")
///     .filename("/srv/shelf/packages/foo.rpm")
///     .compute()?;
/// # Ok::<(), shelf_core::ShelfError>(())
/// ```
pub struct ChecksumRequest<'a> {
    hashtype: String,
    filename: Option<&'a Path>,
    handle: Option<&'a mut dyn ReadSeek>,
    #[cfg(unix)]
    fd: Option<BorrowedFd<'a>>,
    chunk_size: usize,
}

impl<'a> ChecksumRequest<'a> {
    /// Start a request for the named algorithm (`sha` means sha1)
    pub fn new(hashtype: impl Into<String>) -> Self {
        Self {
            hashtype: hashtype.into(),
            filename: None,
            handle: None,
            #[cfg(unix)]
            fd: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    pub fn filename<P: AsRef<Path> + ?Sized>(mut self, path: &'a P) -> Self {
        self.filename = Some(path.as_ref());
        self
    }

    pub fn handle(mut self, handle: &'a mut dyn ReadSeek) -> Self {
        self.handle = Some(handle);
        self
    }

    #[cfg(unix)]
    pub fn fd(mut self, fd: BorrowedFd<'a>) -> Self {
        self.fd = Some(fd);
        self
    }

    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    fn source_count(&self) -> usize {
        #[cfg(unix)]
        let fd = usize::from(self.fd.is_some());
        #[cfg(not(unix))]
        let fd = 0;

        usize::from(self.filename.is_some()) + usize::from(self.handle.is_some()) + fd
    }

    /// Compute the digest of the single configured source
    pub fn compute(self) -> StoreResult<String> {
        match self.source_count() {
            0 => return Err(ShelfError::InvalidSource),
            1 => {},
            given => return Err(ShelfError::AmbiguousSource { given }),
        }

        let algorithm: HashAlgorithm = self.hashtype.parse()?;

        if let Some(handle) = self.handle {
            return checksum_reader(handle, algorithm, self.chunk_size);
        }

        #[cfg(unix)]
        if let Some(fd) = self.fd {
            return checksum_fd(fd, algorithm, self.chunk_size);
        }

        match self.filename {
            Some(path) => checksum_file(path, algorithm, self.chunk_size),
            None => Err(ShelfError::InvalidSource),
        }
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;
    use proptest::test_runner::Config as ProptestConfig;
    use std::io::Cursor;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]
        /// The digest never depends on how the stream is chunked
        #[test]
        fn chunk_size_independence(
            content in prop::collection::vec(any::<u8>(), 0..2048),
            chunk_size in 1usize..300,
        ) {
            let expected = checksum_bytes(HashAlgorithm::Sha256, &content);
            let mut cursor = Cursor::new(content);
            let streamed = checksum_reader(&mut cursor, HashAlgorithm::Sha256, chunk_size).unwrap();
            prop_assert_eq!(expected, streamed);
        }
    }
}
