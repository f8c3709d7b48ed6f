// tests/config_env_override.rs
//
// Kept in its own test binary: it mutates the process environment.

use std::io::Write;
use std::path::Path;

use simjob::config::{ENGINE_EXE_ENV, load_and_validate};
use tempfile::NamedTempFile;

#[test]
fn engine_executable_env_var_replaces_file_value() {
    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[engine]
executable = "/opt/from-file/engine"
"#
    )
    .unwrap();

    // SAFETY: the only test in this binary, so no other thread reads the
    // environment concurrently.
    unsafe { std::env::set_var(ENGINE_EXE_ENV, "/opt/from-env/engine") };
    let overridden = load_and_validate(file.path()).unwrap();

    unsafe { std::env::set_var(ENGINE_EXE_ENV, "") };
    let empty_ignored = load_and_validate(file.path()).unwrap();

    unsafe { std::env::remove_var(ENGINE_EXE_ENV) };
    let from_file = load_and_validate(file.path()).unwrap();

    assert_eq!(
        overridden.location.executable(),
        Path::new("/opt/from-env/engine")
    );
    assert_eq!(
        empty_ignored.location.executable(),
        Path::new("/opt/from-file/engine")
    );
    assert_eq!(from_file.location.directory(), Path::new("/opt/from-file"));
}
