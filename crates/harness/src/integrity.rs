//! Upload/download integrity

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{HarnessError, HarnessResult};

const READ_CHUNK: usize = 4096;

/// Hex SHA-256 of a file, read in chunks.
pub fn sha256_file(path: &Path) -> HarnessResult<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; READ_CHUNK];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Compare the local original with its downloaded copy.
pub fn verify_round_trip(original: &Path, downloaded: &Path) -> HarnessResult<String> {
    if !downloaded.exists() {
        return Err(HarnessError::Verification(format!(
            "downloaded copy {} does not exist",
            downloaded.display()
        )));
    }

    let expected = sha256_file(original)?;
    let actual = sha256_file(downloaded)?;
    debug!(%expected, %actual, "compared digests");

    if expected == actual {
        Ok(format!("sha256 {} matches", expected))
    } else {
        Err(HarnessError::Verification(format!(
            "sha256 mismatch: uploaded {} but downloaded {}",
            expected, actual
        )))
    }
}
