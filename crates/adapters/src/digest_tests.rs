// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tempfile::TempDir;

#[test]
fn known_sha256_value() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("abc.txt");
    std::fs::write(&path, b"abc").unwrap();

    assert_eq!(
        file_sha256(&path).unwrap(),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}

#[test]
fn identical_bytes_identical_digest() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    std::fs::write(&a, b"same contents").unwrap();
    std::fs::write(&b, b"same contents").unwrap();

    assert_eq!(file_sha256(&a).unwrap(), file_sha256(&b).unwrap());
}

#[test]
fn different_bytes_different_digest() {
    let dir = TempDir::new().unwrap();
    let a = dir.path().join("a");
    let b = dir.path().join("b");
    std::fs::write(&a, b"one").unwrap();
    std::fs::write(&b, b"two").unwrap();

    assert_ne!(file_sha256(&a).unwrap(), file_sha256(&b).unwrap());
}

#[test]
fn missing_file_reports_path() {
    let err = file_sha256(Path::new("/nonexistent/artifact.tar")).unwrap_err();
    let DigestError::Read { path, .. } = err;
    assert_eq!(path, "/nonexistent/artifact.tar");
}
