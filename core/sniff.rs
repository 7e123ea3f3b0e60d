use log;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Bytes inspected from the start of a file.
pub const SAMPLE_SIZE: usize = 8000;
/// Share of suspicious control bytes above which a sample is binary.
pub const BINARY_THRESHOLD: f64 = 0.30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Text,
    Binary,
}

/// Statistical text/binary heuristic over the leading bytes of a file.
pub struct BinarySniffer;

impl BinarySniffer {
    pub fn classify(bytes: &[u8]) -> ContentKind {
        let sample = &bytes[..bytes.len().min(SAMPLE_SIZE)];
        if sample.is_empty() {
            return ContentKind::Text;
        }
        if sample.starts_with(&[0xFF, 0xFE]) || sample.starts_with(&[0xFE, 0xFF]) {
            return ContentKind::Text;
        }

        let suspicious = sample.iter().filter(|&&b| is_suspicious(b)).count();
        let ratio = suspicious as f64 / sample.len() as f64;
        if ratio > BINARY_THRESHOLD {
            ContentKind::Binary
        } else {
            ContentKind::Text
        }
    }

    /// Reads up to [`SAMPLE_SIZE`] bytes and classifies them. Unreadable files
    /// count as text so the later content read reports the real error.
    pub fn classify_path(path: &Path) -> ContentKind {
        match read_sample(path) {
            Ok(sample) => Self::classify(&sample),
            Err(e) => {
                log::debug!(
                    "Could not sample {} for binary check, treating as text: {}",
                    path.display(),
                    e
                );
                ContentKind::Text
            }
        }
    }
}

// NUL, 1..=8 and 14..=31; tab, LF, VT, FF and CR are left alone.
fn is_suspicious(b: u8) -> bool {
    b == 0 || (1..=8).contains(&b) || (14..=31).contains(&b)
}

fn read_sample(path: &Path) -> std::io::Result<Vec<u8>> {
    let file = File::open(path)?;
    let mut sample = Vec::with_capacity(SAMPLE_SIZE);
    file.take(SAMPLE_SIZE as u64).read_to_end(&mut sample)?;
    Ok(sample)
}
