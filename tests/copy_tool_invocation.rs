// tests/copy_tool_invocation.rs

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use espsync::exec::{CopyBackend, CopyOutcome, CopyRequest, CopySettings, ProcessCopyBackend};
use espsync::sync::{NotifyDecision, SyncSet, SyncSpec};
use espsync::types::ToolCommand;
use espsync_test_utils::builders::timing;
use espsync_test_utils::{init_tracing, with_timeout, write_script};
use tempfile::tempdir;

/// Stub copy tool: appends its argument line to `log`; fails with exit 23
/// when the last argument contains "bad".
fn recording_tool(dir: &Path, log: &Path) -> ToolCommand {
    let body = format!(
        r#"for last; do :; done
printf '%s\n' "$*" >> {log}
case "$last" in
  *bad*) echo "write error on $last" >&2; exit 23 ;;
esac
exit 0
"#,
        log = log.display()
    );
    write_script(dir, "fake-rsync.sh", &body).unwrap()
}

fn logged_lines(log: &Path) -> Vec<String> {
    std::fs::read_to_string(log)
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn one_change_runs_one_copy_with_fixed_flags() {
    init_tracing();
    let dir = tempdir().unwrap();
    let log = dir.path().join("calls.log");
    let tool = recording_tool(dir.path(), &log);

    let backend = ProcessCopyBackend::new(CopySettings::new(tool, vec!["-x".to_string()]));
    let specs = vec![SyncSpec::new("/efi0/", ["/efi1/"], Vec::<String>::new())];
    let mut jobs = SyncSet::new(&specs, Arc::new(backend), &timing(Duration::from_secs(300)));

    assert_eq!(jobs.notify(0), Some(NotifyDecision::LaunchNow));
    with_timeout(jobs.wait_all()).await;

    assert_eq!(
        logged_lines(&log),
        vec!["-aHAX -x --exclude=/lost+found/ --delete /efi0/ /efi1/".to_string()]
    );
}

#[tokio::test]
async fn failing_destination_does_not_stop_the_next_one() {
    init_tracing();
    let dir = tempdir().unwrap();
    let log = dir.path().join("calls.log");
    let tool = recording_tool(dir.path(), &log);

    let backend = ProcessCopyBackend::new(CopySettings::new(tool, Vec::new()));
    let specs = vec![SyncSpec::new("/efi0", ["/mnt/bad", "/mnt/good"], ["*.bak"])];
    let mut jobs = SyncSet::new(&specs, Arc::new(backend), &timing(Duration::from_secs(300)));

    jobs.notify(0);
    with_timeout(jobs.wait_all()).await;

    let lines = logged_lines(&log);
    assert_eq!(lines.len(), 2, "{lines:?}");
    assert!(lines[0].ends_with("--exclude=*.bak /efi0/ /mnt/bad/"));
    assert!(lines[1].ends_with("/efi0/ /mnt/good/"));
    assert!(!jobs.get(0).unwrap().is_running());
}

#[tokio::test]
async fn nonzero_exit_is_reported_with_stderr() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("calls.log");
    let backend = ProcessCopyBackend::new(CopySettings::new(
        recording_tool(dir.path(), &log),
        Vec::new(),
    ));

    let request = CopyRequest {
        job: 0,
        source: "/efi0".into(),
        destination: "/bad".into(),
        exclusions: Vec::new(),
    };
    match backend.copy(&request).await {
        CopyOutcome::Failed { exit_code, stderr } => {
            assert_eq!(exit_code, 23);
            assert_eq!(stderr, "write error on /bad/");
        }
        other => panic!("expected Failed, got {other:?}"),
    }
}

#[tokio::test]
async fn missing_copy_tool_is_a_spawn_failure() {
    let tool = ToolCommand {
        program: "/nonexistent/espsync-copy-tool".into(),
        args: Vec::new(),
    };
    let backend = ProcessCopyBackend::new(CopySettings::new(tool, Vec::new()));

    let request = CopyRequest {
        job: 0,
        source: "/efi0".into(),
        destination: "/efi1".into(),
        exclusions: Vec::new(),
    };
    assert!(matches!(
        backend.copy(&request).await,
        CopyOutcome::SpawnFailed(_)
    ));
}

#[tokio::test]
async fn test_mode_adds_dry_run_flags() {
    let dir = tempdir().unwrap();
    let log = dir.path().join("calls.log");
    let mut settings = CopySettings::new(recording_tool(dir.path(), &log), vec!["-x".to_string()]);
    settings.test_mode = true;
    let backend = ProcessCopyBackend::new(settings);

    let request = CopyRequest {
        job: 0,
        source: "/efi0".into(),
        destination: "/efi1".into(),
        exclusions: Vec::new(),
    };
    assert!(backend.copy(&request).await.is_success());
    assert_eq!(
        logged_lines(&log),
        vec!["-n -v -aHAX -x --exclude=/lost+found/ --delete /efi0/ /efi1/".to_string()]
    );
}
