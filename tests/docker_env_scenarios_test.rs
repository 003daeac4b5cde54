#![cfg(unix)]

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use minikube_env::process::Interrupt;
use minikube_env::{
    ExtensionConfig, MemoryLogger, MinikubeExtension, ParticipantManager, PropertyStore, Session,
};
use tempfile::{tempdir, TempDir};

/// Writes `body` to a shell script and returns the command that runs it.
fn script(dir: &TempDir, name: &str, body: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, body).unwrap();
    format!("sh {}", path.display())
}

fn extension(command: &str, timeout: &str, kill_on_timeout: bool) -> (MinikubeExtension, MemoryLogger) {
    let logger = MemoryLogger::new();
    let config = ExtensionConfig {
        command: command.to_string(),
        timeout: timeout.to_string(),
        kill_on_timeout,
    };
    let ext = MinikubeExtension::with_config(Arc::new(logger.clone()), &config).unwrap();
    (ext, logger)
}

const DOCKER_ENV: &str = r#"printf 'export DOCKER_HOST="tcp://192.168.49.2:2376"\n'
printf 'export DOCKER_TLS_VERIFY="1"\n'
printf '# comment\n'
"#;

#[test]
fn test_successful_command_populates_map() {
    let dir = tempdir().unwrap();
    let (ext, logger) = extension(&script(&dir, "env.sh", DOCKER_ENV), "5s", true);

    let env = ext.get_docker_env(&Interrupt::new());

    assert_eq!(env.len(), 2);
    assert_eq!(env["DOCKER_HOST"], "tcp://192.168.49.2:2376");
    assert_eq!(env["DOCKER_TLS_VERIFY"], "1");
    assert!(logger.warnings().is_empty());
}

#[test]
fn test_minikube_style_output_with_comments() {
    let dir = tempdir().unwrap();
    let body = r#"cat <<'EOF'
export DOCKER_TLS_VERIFY="1"
export DOCKER_HOST="tcp://192.168.49.2:2376"
export DOCKER_CERT_PATH="/home/dev/.minikube/certs"
export MINIKUBE_ACTIVE_DOCKERD="minikube"

# To point your shell to minikube's docker-daemon, run:
# eval $(minikube -p minikube docker-env)
EOF
"#;
    let (ext, _logger) = extension(&script(&dir, "env.sh", body), "5s", true);

    let env = ext.get_docker_env(&Interrupt::new());

    assert_eq!(env.len(), 4);
    assert_eq!(env["DOCKER_CERT_PATH"], "/home/dev/.minikube/certs");
    assert_eq!(env["MINIKUBE_ACTIVE_DOCKERD"], "minikube");
}

#[test]
fn test_failing_command_logs_stdout_then_stderr() {
    let dir = tempdir().unwrap();
    let command = script(
        &dir,
        "fail.sh",
        "echo 'export DOCKER_HOST=ignored'\necho 'Minikube not running' >&2\nexit 1\n",
    );
    let (ext, logger) = extension(&command, "5s", true);

    let env = ext.get_docker_env(&Interrupt::new());

    assert!(env.is_empty());
    assert_eq!(
        logger.warnings(),
        vec![
            format!("the command [{}] exit with code: 1", command),
            "export DOCKER_HOST=ignored".to_string(),
            "Minikube not running".to_string(),
        ]
    );
}

#[test]
fn test_missing_executable_logs_spawn_failure() {
    let (ext, logger) = extension("/nonexistent/minikube docker-env", "5s", true);

    let env = ext.get_docker_env(&Interrupt::new());

    assert!(env.is_empty());
    let warnings = logger.warnings();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0]
        .starts_with("Failed to get docker env from running /nonexistent/minikube docker-env due to"));
}

#[test]
fn test_slow_command_times_out_without_parsing() {
    let dir = tempdir().unwrap();
    let command = script(&dir, "slow.sh", "echo 'export A=1'\nsleep 5\n");
    let (ext, logger) = extension(&command, "200ms", true);

    let started = Instant::now();
    let env = ext.get_docker_env(&Interrupt::new());

    assert!(env.is_empty());
    assert!(started.elapsed() < Duration::from_secs(4));
    assert_eq!(logger.warnings(), vec![format!("Timeout when running {}", command)]);
}

#[test]
fn test_default_timeout_is_five_seconds() {
    let dir = tempdir().unwrap();
    let command = script(&dir, "slower.sh", "sleep 8\n");
    let logger = MemoryLogger::new();
    let config = ExtensionConfig {
        command: command.clone(),
        kill_on_timeout: true,
        ..Default::default()
    };
    let ext = MinikubeExtension::with_config(Arc::new(logger.clone()), &config).unwrap();

    let started = Instant::now();
    let env = ext.get_docker_env(&Interrupt::new());
    let elapsed = started.elapsed();

    assert!(env.is_empty());
    assert!(elapsed >= Duration::from_secs(5), "gave up after {:?}", elapsed);
    assert!(elapsed < Duration::from_secs(8), "waited {:?}", elapsed);
}

fn wait_for(path: &Path, within: Duration) -> bool {
    let deadline = Instant::now() + within;
    while Instant::now() < deadline {
        if path.exists() {
            return true;
        }
        thread::sleep(Duration::from_millis(50));
    }
    path.exists()
}

#[test]
fn test_timed_out_command_keeps_running_by_default() {
    let dir = tempdir().unwrap();
    let marker = dir.path().join("done");
    let body = format!("sleep 1\ntouch {}\n", marker.display());
    let (ext, _logger) = extension(&script(&dir, "late.sh", &body), "100ms", false);

    assert!(ext.get_docker_env(&Interrupt::new()).is_empty());
    assert!(wait_for(&marker, Duration::from_secs(5)));
}

#[test]
fn test_timed_out_command_is_killed_when_configured() {
    let dir = tempdir().unwrap();
    let marker = dir.path().join("done");
    let body = format!("sleep 1\ntouch {}\n", marker.display());
    let (ext, _logger) = extension(&script(&dir, "late.sh", &body), "100ms", true);

    assert!(ext.get_docker_env(&Interrupt::new()).is_empty());
    assert!(!wait_for(&marker, Duration::from_secs(2)));
}

#[test]
fn test_interrupt_from_host_cancels_wait() {
    let dir = tempdir().unwrap();
    let command = script(&dir, "slow.sh", "sleep 3\n");
    let (ext, logger) = extension(&command, "5s", true);

    let interrupt = Interrupt::new();
    let remote = interrupt.clone();
    let raiser = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        remote.raise();
    });

    let started = Instant::now();
    let env = ext.get_docker_env(&interrupt);
    raiser.join().unwrap();

    assert!(env.is_empty());
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(logger.warnings(), vec![format!("Interrupted when running {}", command)]);
}

#[test]
fn test_lifecycle_injects_same_values_twice() {
    let dir = tempdir().unwrap();
    let (ext, logger) = extension(&script(&dir, "env.sh", DOCKER_ENV), "5s", true);

    let mut manager = ParticipantManager::new();
    manager.register(Box::new(ext));
    let mut session = Session::new();
    manager.run_lifecycle(&mut session).unwrap();

    let props = session.system_properties();
    assert_eq!(props.len(), 2);
    assert_eq!(props.get("DOCKER_HOST"), Some("tcp://192.168.49.2:2376"));
    assert_eq!(props.get("DOCKER_TLS_VERIFY"), Some("1"));

    let infos = logger.infos();
    let banners = infos
        .iter()
        .filter(|l| l.contains("Trying to get minikube docker env"))
        .count();
    assert_eq!(banners, 2);
    assert_eq!(
        infos.iter().filter(|l| *l == "DOCKER_TLS_VERIFY: 1").count(),
        2
    );
}

#[test]
fn test_failure_leaves_existing_properties_alone() {
    let mut manager = ParticipantManager::new();
    let (ext, _logger) = extension("/nonexistent/minikube docker-env", "1s", true);
    manager.register(Box::new(ext));

    let mut session = Session::new();
    session
        .system_properties_mut()
        .set_property("DOCKER_HOST", "unix:///var/run/docker.sock");
    manager.run_lifecycle(&mut session).unwrap();

    assert_eq!(
        session.system_properties().get("DOCKER_HOST"),
        Some("unix:///var/run/docker.sock")
    );
}

#[test]
fn test_invalid_utf8_in_stdout_keeps_later_exports() {
    let dir = tempdir().unwrap();
    let body = "printf 'export A=1\\n# caf\\351\\nexport DOCKER_HOST=\"tcp://x:2376\"\\n'\n";
    let (ext, logger) = extension(&script(&dir, "latin1.sh", body), "5s", true);

    let env = ext.get_docker_env(&Interrupt::new());

    assert_eq!(env.len(), 2);
    assert_eq!(env["A"], "1");
    assert_eq!(env["DOCKER_HOST"], "tcp://x:2376");
    assert!(logger.warnings().is_empty());
}

#[test]
fn test_invalid_utf8_in_stderr_keeps_draining() {
    let dir = tempdir().unwrap();
    let command = script(
        &dir,
        "latin1_fail.sh",
        "printf 'bad \\351 byte\\nMinikube not running\\n' >&2\nexit 1\n",
    );
    let (ext, logger) = extension(&command, "5s", true);

    let env = ext.get_docker_env(&Interrupt::new());

    assert!(env.is_empty());
    assert_eq!(
        logger.warnings(),
        vec![
            format!("the command [{}] exit with code: 1", command),
            "bad \u{FFFD} byte".to_string(),
            "Minikube not running".to_string(),
        ]
    );
}

#[test]
fn test_session_interrupt_cancels_lifecycle() {
    let dir = tempdir().unwrap();
    let command = script(&dir, "slow.sh", "sleep 3\n");
    let (ext, logger) = extension(&command, "5s", true);

    let mut manager = ParticipantManager::new();
    manager.register(Box::new(ext));

    let interrupt = Interrupt::new();
    let mut session = Session::with_interrupt(interrupt.clone());
    let raiser = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        interrupt.raise();
    });

    let started = Instant::now();
    manager.run_lifecycle(&mut session).unwrap();
    raiser.join().unwrap();

    assert!(session.system_properties().is_empty());
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(
        logger.warnings(),
        vec![
            format!("Interrupted when running {}", command),
            format!("Interrupted when running {}", command),
        ]
    );
}
