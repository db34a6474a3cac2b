//! Per-run test entities: generated users and sized files

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use rand::distributions::{Alphanumeric, Uniform};
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::HarnessResult;

/// Prefix shared by every generated user and file name
pub const TEST_PREFIX: &str = "test_";

const EMAIL_DOMAINS: [&str; 3] = ["example.com", "test.org", "sample.net"];
const PASSWORD_SYMBOLS: &[u8] = b"!@#$%^&*()";
const WRITE_CHUNK: usize = 64 * 1024;

#[derive(Clone, Serialize, Deserialize)]
pub struct TestUser {
    pub username: String,
    pub display_name: String,
    pub password: String,
    pub email: String,
    pub group: String,
    pub quota: String,
    pub manager: String,
}

impl std::fmt::Debug for TestUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestUser")
            .field("username", &self.username)
            .field("display_name", &self.display_name)
            .field("email", &self.email)
            .field("group", &self.group)
            .field("quota", &self.quota)
            .field("manager", &self.manager)
            .finish_non_exhaustive()
    }
}

impl TestUser {
    pub fn generate(group: &str, quota: &str, manager: &str) -> Self {
        Self::generate_with(&mut rand::thread_rng(), group, quota, manager)
    }

    pub fn generate_with<R: Rng + ?Sized>(
        rng: &mut R,
        group: &str,
        quota: &str,
        manager: &str,
    ) -> Self {
        let first = name_part(rng);
        let last = name_part(rng);
        let username = format!("{}{}{}", TEST_PREFIX, first.to_lowercase(), rng.gen_range(10..100));
        let domain = EMAIL_DOMAINS.choose(rng).copied().unwrap_or(EMAIL_DOMAINS[0]);

        Self {
            display_name: format!("{} {}", first, last),
            email: format!("{}@{}", username, domain),
            password: password(rng),
            username,
            group: group.to_string(),
            quota: quota.to_string(),
            manager: manager.to_string(),
        }
    }
}

/// One capital letter followed by 3-5 lowercase letters
fn name_part<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut part = String::new();
    part.push(rng.sample(Uniform::new_inclusive(b'A', b'Z')) as char);
    let tail = rng.gen_range(3..=5);
    for _ in 0..tail {
        part.push(rng.sample(Uniform::new_inclusive(b'a', b'z')) as char);
    }
    part
}

/// Twelve characters, always containing a digit and a symbol
fn password<R: Rng + ?Sized>(rng: &mut R) -> String {
    let mut chars: Vec<char> = (0..10).map(|_| rng.sample(Alphanumeric) as char).collect();
    chars.push(rng.sample(Uniform::new_inclusive(b'0', b'9')) as char);
    chars.push(PASSWORD_SYMBOLS[rng.gen_range(0..PASSWORD_SYMBOLS.len())] as char);
    chars.shuffle(rng);
    chars.into_iter().collect()
}

/// A locally generated file destined for upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestFile {
    pub path: PathBuf,
    pub name: String,
    pub size_bytes: u64,
}

impl TestFile {
    /// Write `size_mb` MiB of random bytes to a uniquely named file in `dir`.
    pub fn create(
        dir: &Path,
        base_name: &str,
        extension: &str,
        size_mb: u64,
    ) -> HarnessResult<Self> {
        std::fs::create_dir_all(dir)?;

        let mut rng = rand::thread_rng();
        let name = format!(
            "{}_{}_{:04x}{}",
            base_name,
            Utc::now().format("%Y%m%d%H%M%S%6f"),
            rng.gen::<u16>(),
            extension
        );
        let path = dir.join(&name);
        let size_bytes = size_mb * 1024 * 1024;

        let mut writer = BufWriter::new(File::create(&path)?);
        let mut chunk = vec![0u8; WRITE_CHUNK];
        let mut remaining = size_bytes;
        while remaining > 0 {
            let n = remaining.min(WRITE_CHUNK as u64) as usize;
            rng.fill_bytes(&mut chunk[..n]);
            writer.write_all(&chunk[..n])?;
            remaining -= n as u64;
        }
        writer.flush()?;

        debug!(file = %path.display(), size_bytes, "created test file");
        Ok(Self { path, name, size_bytes })
    }

    pub fn remove(&self) -> HarnessResult<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

/// Delete files directly under `dir` whose name starts with `prefix`.
/// A missing directory is not an error.
pub fn cleanup_prefixed(dir: &Path, prefix: &str) -> HarnessResult<Vec<String>> {
    let mut deleted = Vec::new();
    if !dir.exists() {
        return Ok(deleted);
    }

    for entry in walkdir::WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
    {
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with(prefix) {
            std::fs::remove_file(entry.path())?;
            deleted.push(name);
        }
    }

    deleted.sort();
    info!(dir = %dir.display(), count = deleted.len(), "removed test files");
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generated_user_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let user = TestUser::generate_with(&mut rng, "admin", "1 GB", "admin");

        assert!(user.username.starts_with(TEST_PREFIX));
        assert!(user
            .username
            .chars()
            .skip(TEST_PREFIX.len())
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        assert!(user.email.starts_with(&user.username));
        assert!(EMAIL_DOMAINS.iter().any(|d| user.email.ends_with(d)));
        assert_eq!(user.password.chars().count(), 12);
        assert!(user.password.chars().any(|c| c.is_ascii_digit()));
        assert!(user.password.bytes().any(|b| PASSWORD_SYMBOLS.contains(&b)));
        assert_eq!(user.display_name.split(' ').count(), 2);
        assert!(!format!("{:?}", user).contains(&user.password));
    }

    #[test]
    fn test_generated_users_differ() {
        let a = TestUser::generate("admin", "1 GB", "admin");
        let b = TestUser::generate("admin", "1 GB", "admin");
        assert!(a.username != b.username || a.password != b.password);
    }

    #[test]
    fn test_create_sized_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = TestFile::create(dir.path(), "test_medium_file", ".txt", 1).unwrap();

        assert!(file.name.starts_with("test_medium_file_"));
        assert!(file.name.ends_with(".txt"));
        assert_eq!(std::fs::metadata(&file.path).unwrap().len(), 1024 * 1024);
        assert_eq!(file.size_bytes, 1024 * 1024);

        let other = TestFile::create(dir.path(), "test_medium_file", ".txt", 1).unwrap();
        assert_ne!(file.name, other.name);

        file.remove().unwrap();
        assert!(!file.path.exists());
    }

    #[test]
    fn test_cleanup_prefixed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("test_a.txt"), b"a").unwrap();
        std::fs::write(dir.path().join("test_b.txt"), b"b").unwrap();
        std::fs::write(dir.path().join("keep.txt"), b"k").unwrap();
        std::fs::create_dir(dir.path().join("test_dir")).unwrap();

        let deleted = cleanup_prefixed(dir.path(), TEST_PREFIX).unwrap();
        assert_eq!(deleted, vec!["test_a.txt".to_string(), "test_b.txt".to_string()]);
        assert!(dir.path().join("keep.txt").exists());
        assert!(dir.path().join("test_dir").exists());

        let missing = cleanup_prefixed(&dir.path().join("nope"), TEST_PREFIX).unwrap();
        assert!(missing.is_empty());
    }
}
