//! Command-line behaviour of the compiled binary
//!
//! No cluster is needed: these cases either fail before any cluster access
//! or talk to a local socket that never answers.

use std::process::{Command, Output};

fn watchhook(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_watchhook"))
        .args(args)
        // Never pick up a real kubeconfig
        .env("KUBECONFIG", "/nonexistent/watchhook-kubeconfig")
        .env("RUST_LOG", "error")
        .output()
        .expect("failed to run watchhook")
}

#[test]
fn test_missing_marker_is_fatal() {
    let output = watchhook(&["pod", "my-pod"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("-- arg is required"), "stderr: {stderr}");
    assert_eq!(stderr.trim_end().lines().count(), 1, "stderr: {stderr}");
}

#[test]
fn test_missing_command_is_fatal() {
    let output = watchhook(&["pod", "--"]);
    assert!(!output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("<command> is required"), "stderr: {stderr}");
}

#[test]
fn test_missing_resource_is_fatal() {
    let output = watchhook(&["--", "cat"]);
    assert!(!output.status.success());
    assert!(!output.stderr.is_empty());
}

#[test]
fn test_help_succeeds() {
    let output = watchhook(&["--help"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--hook-timeout"), "stdout: {stdout}");
    assert!(stdout.contains("kind[.version][.group]"), "stdout: {stdout}");
}

/// Interrupt while discovery is stuck on an API server that never answers.
#[cfg(unix)]
#[test]
fn test_interrupt_during_startup_exits_cleanly() {
    use std::net::TcpListener;
    use std::process::Stdio;
    use std::time::{Duration, Instant};

    // Connections are queued by the kernel but never served
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let server = format!("http://{}", listener.local_addr().unwrap());

    let kubeconfig = std::env::temp_dir().join(format!(
        "watchhook-stalled-kubeconfig-{}",
        std::process::id()
    ));
    std::fs::write(
        &kubeconfig,
        format!(
            "apiVersion: v1
kind: Config
clusters:
- name: stalled
  cluster:
    server: {server}
contexts:
- name: stalled
  context:
    cluster: stalled
    user: stalled
    namespace: default
current-context: stalled
users:
- name: stalled
  user: {{}}
"
        ),
    )
    .unwrap();

    let mut child = Command::new(env!("CARGO_BIN_EXE_watchhook"))
        .arg("--kubeconfig")
        .arg(&kubeconfig)
        .args(["configmap", "--", "cat"])
        .env("RUST_LOG", "error")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    std::thread::sleep(Duration::from_millis(500));
    let sent = Command::new("sh")
        .arg("-c")
        .arg(format!("kill -INT {}", child.id()))
        .status()
        .unwrap();
    assert!(sent.success());

    let deadline = Instant::now() + Duration::from_secs(10);
    let status = loop {
        if let Some(status) = child.try_wait().unwrap() {
            break status;
        }
        if Instant::now() > deadline {
            let _ = child.kill();
            panic!("watchhook did not exit after SIGINT");
        }
        std::thread::sleep(Duration::from_millis(50));
    };

    let _ = std::fs::remove_file(&kubeconfig);
    drop(listener);
    assert!(status.success(), "status: {status}");
}
