use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use md5::Md5;
use sha2::{Digest, Sha256};

/// Digest algorithms a catalog checksum may be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumKind {
    Md5,
    Sha256,
}

impl ChecksumKind {
    /// Picks the algorithm from the length of an expected hex digest.
    pub fn for_expected(expected: &str) -> Option<Self> {
        let expected = expected.trim();
        if !expected.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        match expected.len() {
            32 => Some(Self::Md5),
            64 => Some(Self::Sha256),
            _ => None,
        }
    }
}

/// Lowercase hex digest of the file at `path`.
pub fn checksum(path: &Path, kind: ChecksumKind) -> io::Result<String> {
    match kind {
        ChecksumKind::Md5 => digest_file::<Md5>(path),
        ChecksumKind::Sha256 => digest_file::<Sha256>(path),
    }
}

/// True when the file's digest equals `expected`, ignoring hex case.
/// An unreadable file or an expected value in no known format never verifies.
pub fn verify(path: &Path, expected: &str) -> bool {
    let Some(kind) = ChecksumKind::for_expected(expected) else {
        tracing::warn!("unrecognised checksum format: {expected:?}");
        return false;
    };

    match checksum(path, kind) {
        Ok(actual) => actual.eq_ignore_ascii_case(expected.trim()),
        Err(err) => {
            tracing::warn!("checksum of {} failed: {err}", path.display());
            false
        }
    }
}

fn digest_file<D: Digest>(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = D::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hasher
        .finalize()
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    // md5("hello world\n") and sha256("hello world\n")
    const HELLO_MD5: &str = "6f5902ac237024bdd0c176cb93063dc4";
    const HELLO_SHA256: &str = "a948904f2f0f479b8f8197694b30184b0d2ed1c1cd2a1ec0fb85d299a192a447";

    fn hello_file() -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("payload");
        fs::write(&path, b"hello world\n").unwrap();
        (dir, path)
    }

    #[test]
    fn computes_known_digests() {
        let (_dir, path) = hello_file();
        assert_eq!(checksum(&path, ChecksumKind::Md5).unwrap(), HELLO_MD5);
        assert_eq!(checksum(&path, ChecksumKind::Sha256).unwrap(), HELLO_SHA256);
    }

    #[test]
    fn verify_ignores_hex_case() {
        let (_dir, path) = hello_file();
        assert!(verify(&path, HELLO_MD5));
        assert!(verify(&path, &HELLO_MD5.to_uppercase()));
        assert!(verify(&path, &HELLO_SHA256.to_uppercase()));
    }

    #[test]
    fn any_single_byte_mutation_fails_verification() {
        let (_dir, path) = hello_file();
        let original = fs::read(&path).unwrap();

        for idx in 0..original.len() {
            let mut mutated = original.clone();
            mutated[idx] ^= 0x01;
            fs::write(&path, &mutated).unwrap();
            assert!(!verify(&path, HELLO_MD5), "mutation at byte {idx} verified");
        }
    }

    #[test]
    fn verify_leaves_the_file_untouched() {
        let (_dir, path) = hello_file();
        assert!(!verify(&path, "0".repeat(32).as_str()));
        assert_eq!(fs::read(&path).unwrap(), b"hello world\n");
    }

    #[test]
    fn unknown_formats_and_missing_files_never_verify() {
        let (dir, path) = hello_file();
        assert!(!verify(&path, "abc123"));
        assert!(!verify(&path, &"z".repeat(32)));
        assert!(!verify(&dir.path().join("missing"), HELLO_MD5));
    }

    #[test]
    fn kind_follows_digest_length() {
        assert_eq!(ChecksumKind::for_expected(HELLO_MD5), Some(ChecksumKind::Md5));
        assert_eq!(
            ChecksumKind::for_expected(HELLO_SHA256),
            Some(ChecksumKind::Sha256)
        );
        assert_eq!(ChecksumKind::for_expected("abc123"), None);
    }
}
