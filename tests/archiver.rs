// tests/archiver.rs

mod common;
use crate::common::init_tracing;

use std::error::Error;
use std::fs;
use std::io::Cursor;
use std::path::Path;

use simjob::archive::{ArchiveOptions, archive_dir, write_archive};
use simjob::errors::WorkerError;
use simjob::fs::RealFileSystem;
use simjob::fs::mock::MockFileSystem;
use simjob_test_utils::zip_reader::{
    file_compression_methods, read_zip, read_zip_file, top_level_names,
};
use zip::CompressionMethod;

type TestResult = Result<(), Box<dyn Error>>;

#[test]
fn round_trip_reproduces_top_level_files() -> TestResult {
    init_tracing();

    let tmp = tempfile::tempdir()?;
    let src = tmp.path().join("work");
    fs::create_dir(&src)?;
    fs::write(src.join("a"), b"alpha")?;
    fs::write(src.join("b"), b"")?;
    fs::write(src.join("c"), vec![0u8, 1, 2, 255, 254])?;

    let dest = tmp.path().join("out").join("job.zip");
    archive_dir(&RealFileSystem, &src, &dest, ArchiveOptions::default())?;

    let contents = read_zip_file(&dest)?;
    assert_eq!(top_level_names(&contents), vec!["a", "b", "c"]);
    assert_eq!(contents["a"], b"alpha");
    assert_eq!(contents["b"], b"");
    assert_eq!(contents["c"], vec![0u8, 1, 2, 255, 254]);

    // Source is left alone.
    assert!(src.join("a").is_file());
    Ok(())
}

#[test]
fn recursive_archive_includes_subdirectory_contents() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let src = tmp.path().join("work");
    fs::create_dir_all(src.join("20230101-000000").join("nested"))?;
    fs::write(src.join("run1.wxc"), b"input")?;
    fs::write(src.join("20230101-000000").join("result.dat"), b"1 2 3")?;
    fs::write(
        src.join("20230101-000000").join("nested").join("deep.txt"),
        b"deep",
    )?;

    let dest = tmp.path().join("run1.zip");
    archive_dir(&RealFileSystem, &src, &dest, ArchiveOptions { recursive: true })?;

    let contents = read_zip_file(&dest)?;
    let names: Vec<&str> = contents.keys().map(String::as_str).collect();
    assert_eq!(
        names,
        vec![
            "20230101-000000/",
            "20230101-000000/nested/",
            "20230101-000000/nested/deep.txt",
            "20230101-000000/result.dat",
            "run1.wxc",
        ]
    );
    assert_eq!(contents["20230101-000000/result.dat"], b"1 2 3");
    assert_eq!(contents["20230101-000000/nested/deep.txt"], b"deep");
    Ok(())
}

#[test]
fn top_level_only_archive_keeps_bare_directory_entries() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let src = tmp.path().join("work");
    fs::create_dir_all(src.join("results"))?;
    fs::write(src.join("results").join("inner.dat"), b"x")?;
    fs::write(src.join("input.wxc"), b"in")?;

    let dest = tmp.path().join("flat.zip");
    archive_dir(&RealFileSystem, &src, &dest, ArchiveOptions { recursive: false })?;

    let contents = read_zip_file(&dest)?;
    let names: Vec<&str> = contents.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["input.wxc", "results/"]);
    Ok(())
}

#[test]
fn entries_are_deflated() -> TestResult {
    let fs = MockFileSystem::new();
    fs.add_file("/work/a.txt", "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
    fs.add_file("/work/sub/b.txt", "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb");

    let cursor = write_archive(
        &fs,
        Path::new("/work"),
        Cursor::new(Vec::new()),
        ArchiveOptions::default(),
    )?;

    let methods = file_compression_methods(Cursor::new(cursor.into_inner()))?;
    assert_eq!(methods.len(), 2);
    assert!(methods.iter().all(|m| *m == CompressionMethod::Deflated));
    Ok(())
}

#[test]
fn archive_from_mock_filesystem() -> TestResult {
    init_tracing();

    let fs = MockFileSystem::new();
    fs.add_file("/work/run1.in", "job = run1");
    fs.add_dir("/work/B");
    fs.add_file("/work/A/out.dat", "old");

    let cursor = write_archive(
        &fs,
        Path::new("/work"),
        Cursor::new(Vec::new()),
        ArchiveOptions::default(),
    )?;
    let contents = read_zip(Cursor::new(cursor.into_inner()))?;

    assert_eq!(top_level_names(&contents), vec!["A", "B", "run1.in"]);
    assert_eq!(contents["A/out.dat"], b"old");
    assert_eq!(contents["run1.in"], b"job = run1");
    assert!(contents.contains_key("B/"));
    Ok(())
}

#[test]
fn existing_archive_is_overwritten() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let src = tmp.path().join("work");
    fs::create_dir(&src)?;
    fs::write(src.join("new.txt"), b"new")?;

    let dest = tmp.path().join("job.zip");
    fs::write(&dest, b"not a zip at all")?;

    archive_dir(&RealFileSystem, &src, &dest, ArchiveOptions::default())?;

    let contents = read_zip_file(&dest)?;
    assert_eq!(top_level_names(&contents), vec!["new.txt"]);
    Ok(())
}

#[test]
fn unwritable_destination_is_archive_error() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let src = tmp.path().join("work");
    fs::create_dir(&src)?;
    fs::write(src.join("a"), b"a")?;

    // Parent of the destination is a regular file.
    let blocker = tmp.path().join("blocker");
    fs::write(&blocker, b"")?;
    let dest = blocker.join("job.zip");

    match archive_dir(&RealFileSystem, &src, &dest, ArchiveOptions::default()) {
        Err(WorkerError::Archive { path, .. }) => assert_eq!(path, dest),
        other => panic!("Expected Archive error, got: {:?}", other),
    }
    Ok(())
}

#[test]
fn missing_source_is_archive_error() -> TestResult {
    let tmp = tempfile::tempdir()?;
    let dest = tmp.path().join("job.zip");

    let result = archive_dir(
        &RealFileSystem,
        &tmp.path().join("does-not-exist"),
        &dest,
        ArchiveOptions::default(),
    );
    assert!(matches!(result, Err(WorkerError::Archive { .. })));
    Ok(())
}

#[cfg(unix)]
#[test]
fn symlinked_directories_are_skipped() -> TestResult {
    use std::os::unix::fs::symlink;

    let tmp = tempfile::tempdir()?;
    let outside = tmp.path().join("outside");
    fs::create_dir(&outside)?;
    fs::write(outside.join("secret.dat"), b"not ours")?;

    let src = tmp.path().join("work");
    fs::create_dir_all(src.join("results"))?;
    fs::write(src.join("results").join("r.dat"), b"r")?;
    fs::write(src.join("input.wxc"), b"in")?;
    symlink(&outside, src.join("elsewhere"))?;
    symlink(&src, src.join("results").join("loop"))?;
    symlink(src.join("input.wxc"), src.join("input-link.wxc"))?;

    let dest = tmp.path().join("job.zip");
    archive_dir(&RealFileSystem, &src, &dest, ArchiveOptions::default())?;

    let contents = read_zip_file(&dest)?;
    let names: Vec<&str> = contents.keys().map(String::as_str).collect();
    assert_eq!(
        names,
        vec!["input-link.wxc", "input.wxc", "results/", "results/r.dat"]
    );
    assert_eq!(contents["input-link.wxc"], b"in");
    Ok(())
}
