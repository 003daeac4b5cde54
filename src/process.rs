use std::io;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// How often a running child is polled while waiting on it.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// A command string split into program and arguments.
///
/// Splitting happens on whitespace only. Quotes, pipes and other shell
/// syntax are passed through to the program untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandLine {
    pub fn parse(command: &str) -> Option<Self> {
        let mut tokens = command.split_whitespace().map(str::to_string);
        let program = tokens.next()?;
        Some(Self {
            program,
            args: tokens.collect(),
        })
    }

    /// Starts the program with piped stdout/stderr and a null stdin.
    pub fn spawn(&self) -> io::Result<Child> {
        Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
    }
}

/// Cancellation flag shared between a host and whatever is waiting on a
/// child process. Once raised it stays raised.
#[derive(Debug, Default, Clone)]
pub struct Interrupt {
    flag: Arc<AtomicBool>,
}

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub enum WaitOutcome {
    Exited(ExitStatus),
    TimedOut,
    Interrupted,
}

/// Waits at most `timeout` for `child` to exit.
///
/// A child still running once the deadline is reached counts as timed out.
/// The child is not killed here; callers decide what to do with it.
pub fn wait_with_timeout(child: &mut Child, timeout: Duration, interrupt: &Interrupt) -> WaitOutcome {
    let deadline = Instant::now() + timeout;
    loop {
        if interrupt.is_raised() {
            return WaitOutcome::Interrupted;
        }
        match child.try_wait() {
            Ok(Some(status)) => return WaitOutcome::Exited(status),
            Ok(None) => {}
            Err(e) => {
                tracing::debug!(error = %e, "try_wait failed");
                return WaitOutcome::Interrupted;
            }
        }

        let now = Instant::now();
        if now >= deadline {
            return WaitOutcome::TimedOut;
        }
        thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
}

/// Exit code as reported to users. Signal deaths have no code and map to -1.
pub fn exit_code(status: &ExitStatus) -> i32 {
    status.code().unwrap_or(-1)
}
