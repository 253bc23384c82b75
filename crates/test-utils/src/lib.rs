pub mod builders;
pub mod fake_backend;

use std::path::Path;
use std::sync::Once;

use espsync::types::ToolCommand;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// Run a future with a 5-second timeout.
#[allow(dead_code)]
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}

/// Write a shell script into `dir` and return a tool command that runs it
/// through `sh`, so no exec bit is needed.
pub fn write_script(dir: &Path, name: &str, body: &str) -> anyhow::Result<ToolCommand> {
    let path = dir.join(name);
    std::fs::write(&path, body)?;
    Ok(ToolCommand {
        program: "sh".into(),
        args: vec![path.display().to_string()],
    })
}
