//! Integration tests for reading CMakeCache.txt from disk
//!
//! These tests verify that the cache reader:
//! - Keeps only Qt5*/Qt6*/CMAKE_PROJECT_NAME entries
//! - Treats a missing or unreadable file as an empty cache
//! - Keeps values verbatim, including '=' and trailing whitespace

use camino::Utf8PathBuf;
use proptest::prelude::*;
use qttools::services::cmake_cache::{get_cmake_cache_value, parse_cache};
use qttools::services::{CMAKE_CACHE_FILENAME, CMakeCache, QtVersionFamily};
use tempfile::TempDir;

fn write_cache(contents: &str) -> (TempDir, Utf8PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let path = Utf8PathBuf::try_from(temp_dir.path().join(CMAKE_CACHE_FILENAME)).unwrap();
    std::fs::write(&path, contents).unwrap();
    (temp_dir, path)
}

#[tokio::test]
async fn test_read_recognized_entries() {
    let (_temp_dir, path) = write_cache(
        "# This is the CMakeCache file.\n\
         CMAKE_BUILD_TYPE:STRING=Debug\n\
         CMAKE_PROJECT_NAME:STATIC=calculator\n\
         Qt5_DIR:PATH=/opt/Qt/5.15.2/gcc_64/lib/cmake/Qt5\n\
         Qt5Core_DIR:PATH=/opt/Qt/5.15.2/gcc_64/lib/cmake/Qt5Core\n\
         //Path to a program.\n\
         CMAKE_AR:FILEPATH=/usr/bin/ar\n",
    );

    let cache = CMakeCache::read(&path).await;

    assert_eq!(cache.len(), 3);
    assert_eq!(cache.filename(), Some(path.as_path()));
    assert_eq!(cache.project_name(), Some("calculator"));
    assert!(cache.get("CMAKE_BUILD_TYPE").is_none());

    let hint = cache.qt_dir_hint().unwrap();
    assert_eq!(hint.key, "Qt5_DIR");
    assert_eq!(hint.family, QtVersionFamily::Qt5);
}

#[tokio::test]
async fn test_missing_file_is_empty_cache() {
    let temp_dir = TempDir::new().unwrap();
    let path = Utf8PathBuf::try_from(temp_dir.path().join("nope").join(CMAKE_CACHE_FILENAME)).unwrap();

    let cache = CMakeCache::read(&path).await;
    assert!(cache.is_empty());
    assert!(cache.qt_dir_hint().is_none());
    assert_eq!(get_cmake_cache_value("Qt5_DIR", &path).await, "");
}

#[tokio::test]
async fn test_qt6_hint_when_no_qt5() {
    let (_temp_dir, path) = write_cache(
        "Qt6_DIR:PATH=C:/Qt/6.5.0/msvc2019_64/lib/cmake/Qt6\r\n\
         Qt6Core_DIR:PATH=C:/Qt/6.5.0/msvc2019_64/lib/cmake/Qt6Core\r\n",
    );

    let hint = CMakeCache::read(&path).await.qt_dir_hint().unwrap();
    assert_eq!(hint.key, "Qt6_DIR");
    assert_eq!(hint.value, "C:/Qt/6.5.0/msvc2019_64/lib/cmake/Qt6");
    assert_eq!(hint.family, QtVersionFamily::Qt6);
}

#[tokio::test]
async fn test_value_kept_verbatim() {
    let (_temp_dir, path) = write_cache("Qt5_DIR:PATH=/a=b/c  \n");
    assert_eq!(get_cmake_cache_value("Qt5_DIR", &path).await, "/a=b/c  ");
}

#[tokio::test]
async fn test_invalid_utf8_is_tolerated() {
    let temp_dir = TempDir::new().unwrap();
    let path = Utf8PathBuf::try_from(temp_dir.path().join(CMAKE_CACHE_FILENAME)).unwrap();
    let mut bytes = b"CMAKE_PROJECT_NAME:STATIC=demo\n".to_vec();
    bytes.extend_from_slice(&[0xff, 0xfe, b'\n']);
    std::fs::write(&path, bytes).unwrap();

    let cache = CMakeCache::read(&path).await;
    assert_eq!(cache.project_name(), Some("demo"));
}

#[tokio::test]
async fn test_reread_picks_up_changes() {
    let (_temp_dir, path) = write_cache("CMAKE_PROJECT_NAME:STATIC=first\n");
    assert_eq!(CMakeCache::read(&path).await.project_name(), Some("first"));

    std::fs::write(&path, "CMAKE_PROJECT_NAME:STATIC=second\n").unwrap();
    assert_eq!(CMakeCache::read(&path).await.project_name(), Some("second"));
}

proptest! {
    #[test]
    fn unrecognized_keys_are_dropped(
        name in "[A-PR-Z_][A-Z0-9_]{0,20}",
        kind in "[A-Z]{1,10}",
        value in "[a-zA-Z0-9/._-]{1,30}",
    ) {
        prop_assume!(!name.starts_with("CMAKE_PROJECT_NAME"));
        let store = parse_cache(&format!("{name}:{kind}={value}\n"));
        prop_assert!(store.is_empty());
    }

    #[test]
    fn qt_keys_are_kept(
        suffix in "[A-Za-z0-9_]{0,15}",
        value in "[a-zA-Z0-9/._-]{1,30}",
    ) {
        let name = format!("Qt5{suffix}");
        let store = parse_cache(&format!("{name}:PATH={value}\n"));
        prop_assert_eq!(store.get(&name).map(String::as_str), Some(value.as_str()));
    }
}
