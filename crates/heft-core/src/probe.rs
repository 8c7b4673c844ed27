//! Streaming archive size probe.
//!
//! Computes the total uncompressed content size of a gzip-compressed tar
//! archive from a byte stream, without buffering the whole archive in memory
//! and without writing anything to disk.

use crate::error::CostError;
use flate2::read::GzDecoder;
use futures::TryStreamExt;
use std::fmt;
use std::io::{self, Read};
use tar::Archive;
use tokio_util::io::{StreamReader, SyncIoBridge};

/// Bytes per megabyte.
pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Marks an error as originating in the transport stream rather than the
/// archive payload, so it survives the trip through the decompressor.
#[derive(Debug)]
struct TransportError(String);

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for TransportError {}

/// Map a read failure to `NETWORK_FAILURE` when a [`TransportError`] sits in
/// its source chain, otherwise to `ARCHIVE_CORRUPT`.
fn classify_read_error(context: &str, e: &io::Error) -> CostError {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(e);
    while let Some(err) = source {
        if err.downcast_ref::<TransportError>().is_some() {
            return CostError::network(format!("{context}: {e}"));
        }
        source = err.source();
    }
    CostError::archive_corrupt(format!("{context}: {e}"))
}

/// Sum the uncompressed entry sizes of a gzip-compressed tar archive.
///
/// Each entry's data stream is drained into `io::sink` while the byte count
/// accumulates; entries are never held in memory whole.
///
/// # Errors
/// Returns `ARCHIVE_CORRUPT` if decompression or tar iteration fails, or
/// `NETWORK_FAILURE` when the underlying reader reported a transport fault.
/// The caller decides the fallback policy; this function never substitutes
/// zero.
pub fn probe_tgz<R: Read>(reader: R) -> Result<u64, CostError> {
    let gz = GzDecoder::new(reader);
    let mut archive = Archive::new(gz);
    let mut total: u64 = 0;

    let entries = archive
        .entries()
        .map_err(|e| classify_read_error("Failed to read tar entries", &e))?;

    for entry in entries {
        let mut entry = entry.map_err(|e| classify_read_error("Failed to read tar entry", &e))?;
        total += io::copy(&mut entry, &mut io::sink())
            .map_err(|e| classify_read_error("Failed to drain tar entry", &e))?;
    }

    Ok(total)
}

/// Like [`probe_tgz`], converted to megabytes.
pub fn probe_tgz_mb<R: Read>(reader: R) -> Result<f64, CostError> {
    Ok(probe_tgz(reader)? as f64 / BYTES_PER_MB)
}

/// Probe a streaming HTTP tarball response.
///
/// The response body is bridged into the blocking decompression pipeline on a
/// dedicated blocking thread, so memory usage stays constant relative to the
/// archive size and the async executor is never blocked.
pub async fn probe_tarball_response(response: reqwest::Response) -> Result<f64, CostError> {
    let stream = response
        .bytes_stream()
        .map_err(|e| io::Error::other(TransportError(e.to_string())));
    let reader = SyncIoBridge::new(StreamReader::new(stream));

    tokio::task::spawn_blocking(move || probe_tgz_mb(reader))
        .await
        .map_err(|e| CostError::unexpected(format!("Probe task failed: {e}")))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::codes;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tar::Builder;

    fn tgz_with_entries(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut tar_bytes = Vec::new();
        {
            let mut builder = Builder::new(&mut tar_bytes);
            for (path, data) in entries {
                let mut header = tar::Header::new_gnu();
                header.set_path(path).unwrap();
                header.set_size(data.len() as u64);
                header.set_mode(0o644);
                header.set_cksum();
                builder.append(&header, *data).unwrap();
            }
            builder.finish().unwrap();
        }

        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&tar_bytes).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_probe_sums_entry_sizes() {
        let payload = vec![b'x'; 10_000];
        let tgz = tgz_with_entries(&[
            ("package/package.json", br#"{"name":"t","version":"1.0.0"}"#),
            ("package/index.js", b"module.exports = 42;"),
            ("package/blob.bin", payload.as_slice()),
        ]);

        let total = probe_tgz(tgz.as_slice()).unwrap();
        assert_eq!(total, 30 + 20 + 10_000);
    }

    #[test]
    fn test_probe_empty_archive_is_zero() {
        let tgz = tgz_with_entries(&[]);
        assert_eq!(probe_tgz(tgz.as_slice()).unwrap(), 0);
    }

    #[test]
    fn test_probe_megabytes_conversion() {
        let payload = vec![0u8; 524_288];
        let tgz = tgz_with_entries(&[("package/half.bin", payload.as_slice())]);

        let mb = probe_tgz_mb(tgz.as_slice()).unwrap();
        assert!((mb - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_probe_rejects_garbage() {
        let err = probe_tgz(&b"definitely not a gzip stream"[..]).unwrap_err();
        assert_eq!(err.code(), codes::ARCHIVE_CORRUPT);
    }

    #[test]
    fn test_probe_rejects_truncated_archive() {
        let payload = vec![b'y'; 50_000];
        let tgz = tgz_with_entries(&[("package/big.bin", payload.as_slice())]);

        let err = probe_tgz(&tgz[..tgz.len() / 2]).unwrap_err();
        assert_eq!(err.code(), codes::ARCHIVE_CORRUPT);
    }

    /// Serves a prefix of a valid archive, then fails like a dropped
    /// connection.
    struct FaultyReader {
        data: std::io::Cursor<Vec<u8>>,
    }

    impl Read for FaultyReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = self.data.read(buf)?;
            if n == 0 {
                return Err(io::Error::other(TransportError(
                    "connection reset by peer".to_string(),
                )));
            }
            Ok(n)
        }
    }

    #[test]
    fn test_probe_reports_transport_fault_as_network_failure() {
        let payload = vec![b'z'; 50_000];
        let tgz = tgz_with_entries(&[("package/big.bin", payload.as_slice())]);

        let reader = FaultyReader {
            data: std::io::Cursor::new(tgz[..tgz.len() / 2].to_vec()),
        };

        let err = probe_tgz(reader).unwrap_err();
        assert_eq!(err.code(), codes::NETWORK_FAILURE);
    }
}
