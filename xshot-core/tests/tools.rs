//! End-to-end runs of the window selector and capture invoker against fake
//! `xwininfo` / `import` scripts.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use xshot_core::{
    CaptureInvoker, ExitKind, FileNamer, NamingSettings, ProcessRunner, SelectionMode,
    WindowSelector, XshotError,
};

fn script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Echoes its arguments to stderr and replies like xwininfo.
fn fake_xwininfo(dir: &Path) -> PathBuf {
    script(
        dir,
        "xwininfo",
        r#"echo "args: $*" >&2
case "$1" in
  -root) id=0x2ab ;;
  -id) id=$2 ;;
  -name) [ "$2" = "missing" ] && { echo "xwininfo: error: No window with name $2 exists!" >&2; exit 1; }; id=0x44 ;;
  "") id=0x3a00007 ;;
  *) echo "no idea"; exit 0 ;;
esac
echo
echo "xwininfo: Window id: $id \"fake\""
echo "  Width: 640""#,
    )
}

/// Records its arguments and writes the last one as the output file.
fn fake_import(dir: &Path, log: &Path) -> PathBuf {
    script(
        dir,
        "import",
        &format!(
            r#"echo "$*" > "{}"
for last; do :; done
echo captured > "$last""#,
            log.display()
        ),
    )
}

#[test]
fn test_selector_modes() {
    let tools = tempfile::tempdir().unwrap();
    let xwininfo = fake_xwininfo(tools.path());
    let runner = ProcessRunner::new();
    let selector = WindowSelector::new(&runner).with_program(xwininfo.to_str().unwrap());

    assert_eq!(selector.fetch_window().unwrap().as_str(), "0x3a00007");
    assert_eq!(selector.window_root().unwrap().as_str(), "0x2ab");
    assert_eq!(selector.window_by_id(26).unwrap().as_str(), "0x1a");
    assert_eq!(selector.window_by_name("term").unwrap().as_str(), "0x44");
}

#[test]
fn test_selector_tool_failure_propagates() {
    let tools = tempfile::tempdir().unwrap();
    let xwininfo = fake_xwininfo(tools.path());
    let runner = ProcessRunner::new();
    let selector = WindowSelector::new(&runner).with_program(xwininfo.to_str().unwrap());

    let err = selector.window_by_name("missing").unwrap_err();
    match err {
        XshotError::CommandFailed { status, stderr, .. } => {
            assert_eq!(status, ExitKind::Exited(1));
            assert!(stderr.contains("No window with name missing"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_selector_without_window_line() {
    let tools = tempfile::tempdir().unwrap();
    let tool = script(tools.path(), "silent", "echo nothing here");
    let runner = ProcessRunner::new();
    let selector = WindowSelector::new(&runner).with_program(tool.to_str().unwrap());

    let err = selector.select(&SelectionMode::Root).unwrap_err();
    assert!(matches!(err, XshotError::WindowNotFound(_)));
}

#[test]
fn test_full_pipeline_writes_numbered_file() {
    let tools = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let log = tools.path().join("import.args");
    let xwininfo = fake_xwininfo(tools.path());
    let import = fake_import(tools.path(), &log);

    let mut namer = FileNamer::new(
        NamingSettings::builder()
            .directory(out.path())
            .prefix("shot_")
            .build()
            .unwrap(),
    );
    let runner = ProcessRunner::new();
    let selector = WindowSelector::new(&runner).with_program(xwininfo.to_str().unwrap());
    let invoker = CaptureInvoker::new(&runner).with_program(import.to_str().unwrap());

    let dest = namer.resolve(None).unwrap();
    let window = selector.window_by_id(0x1a).unwrap();
    invoker.capture(&dest, Some(&window), true).unwrap();

    assert!(dest.exists());
    let args = fs::read_to_string(&log).unwrap();
    assert_eq!(
        args.trim_end(),
        format!("-window 0x1a -frame {}", dest.display())
    );
    let name = dest.file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with("shot_0001_"), "got {name}");

    // The written file now occupies number 1.
    let next = namer.resolve(None).unwrap();
    let name = next.file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with("shot_0002_"), "got {name}");
}

#[test]
fn test_full_screen_capture_omits_window_args() {
    let tools = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    let log = tools.path().join("import.args");
    let import = fake_import(tools.path(), &log);

    let runner = ProcessRunner::new();
    let invoker = CaptureInvoker::new(&runner).with_program(import.to_str().unwrap());
    let dest = out.path().join("screen.png");
    invoker.capture(&dest, None, true).unwrap();

    let args = fs::read_to_string(&log).unwrap();
    assert_eq!(args.trim_end(), dest.display().to_string());
}
