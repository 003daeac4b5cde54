use std::io::{BufReader, Read};
use std::process::Child;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    config::{ExtensionConfig, DEFAULT_TIMEOUT},
    env::{parse_docker_env, read_lossy_line, EnvironmentMap},
    errors::{EnvError, Result},
    logger::{Logger, TracingLogger},
    plugin::LifecycleParticipant,
    process::{exit_code, wait_with_timeout, CommandLine, Interrupt, WaitOutcome},
    session::{PropertyStore, Session},
};

const RULE: &str = "------------------------------------------------------------------------";

/// Runs `minikube docker-env` (or the configured replacement) and copies the
/// exported variables into the session's system properties.
///
/// Nothing here fails the build: every problem is logged as a warning and
/// leaves the properties untouched.
pub struct MinikubeExtension {
    logger: Arc<dyn Logger>,
    command: String,
    timeout: Duration,
    kill_on_timeout: bool,
}

impl MinikubeExtension {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        let config = ExtensionConfig::default();
        Self {
            logger,
            timeout: config.timeout_duration().unwrap_or(DEFAULT_TIMEOUT),
            command: config.command,
            kill_on_timeout: config.kill_on_timeout,
        }
    }

    pub fn with_config(logger: Arc<dyn Logger>, config: &ExtensionConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            logger,
            command: config.command.clone(),
            timeout: config.timeout_duration()?,
            kill_on_timeout: config.kill_on_timeout,
        })
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetches the docker env and writes every variable into `store`.
    pub fn inject_properties(&self, store: &mut dyn PropertyStore, interrupt: &Interrupt) {
        self.logger.info(RULE);
        self.logger
            .info("[minikube-maven-extension] Trying to get minikube docker env");
        self.logger.info(RULE);

        for (key, value) in self.get_docker_env(interrupt) {
            self.logger.info(&format!("{}: {}", key, value));
            store.set_property(&key, &value);
        }
    }

    /// Runs the command and returns the variables it exported, or an empty
    /// map if anything went wrong.
    pub fn get_docker_env(&self, interrupt: &Interrupt) -> EnvironmentMap {
        match self.try_get_docker_env(interrupt) {
            Ok(env) => env,
            Err(err) => {
                tracing::debug!(command = err.command(), error = ?err, "docker env unavailable");
                EnvironmentMap::new()
            }
        }
    }

    fn try_get_docker_env(&self, interrupt: &Interrupt) -> Result<EnvironmentMap, EnvError> {
        let child = CommandLine::parse(&self.command)
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty command"))
            .and_then(|cmd| cmd.spawn())
            .map_err(|source| {
                self.report(EnvError::Spawn {
                    command: self.command.clone(),
                    source,
                })
            })?;
        self.analyze_output(child, interrupt)
    }

    fn analyze_output(
        &self,
        mut child: Child,
        interrupt: &Interrupt,
    ) -> Result<EnvironmentMap, EnvError> {
        let status = match wait_with_timeout(&mut child, self.timeout, interrupt) {
            WaitOutcome::Exited(status) => status,
            WaitOutcome::TimedOut => {
                if self.kill_on_timeout {
                    if let Err(e) = child.kill() {
                        tracing::debug!(error = %e, "failed to kill timed out command");
                    }
                    let _ = child.wait();
                }
                return Err(self.report(EnvError::Timeout {
                    command: self.command.clone(),
                    waited: self.timeout,
                }));
            }
            WaitOutcome::Interrupted => {
                return Err(self.report(EnvError::WaitInterrupted {
                    command: self.command.clone(),
                }));
            }
        };

        let code = exit_code(&status);
        if code == 0 {
            let Some(stdout) = child.stdout.take() else {
                return Ok(EnvironmentMap::new());
            };
            return match parse_docker_env(BufReader::new(stdout)) {
                Ok(env) => Ok(env),
                Err(partial) => {
                    self.logger.warn(
                        &EnvError::OutputRead {
                            command: self.command.clone(),
                            source: partial.error,
                        }
                        .to_string(),
                    );
                    Ok(partial.partial)
                }
            };
        }

        let err = self.report(EnvError::NonZeroExit {
            command: self.command.clone(),
            code,
        });
        if let Some(stdout) = child.stdout.take() {
            self.drain_to_warnings(stdout);
        }
        if let Some(stderr) = child.stderr.take() {
            self.drain_to_warnings(stderr);
        }
        Err(err)
    }

    /// Logs every line of `stream` as a warning. The reader owns the pipe
    /// and closes it when this returns.
    fn drain_to_warnings<R: Read>(&self, stream: R) {
        let mut reader = BufReader::new(stream);
        loop {
            match read_lossy_line(&mut reader) {
                Ok(Some(line)) => self.logger.warn(&line),
                Ok(None) => return,
                Err(source) => {
                    self.report(EnvError::OutputRead {
                        command: self.command.clone(),
                        source,
                    });
                    return;
                }
            }
        }
    }

    fn report(&self, err: EnvError) -> EnvError {
        self.logger.warn(&err.to_string());
        err
    }
}

impl Default for MinikubeExtension {
    fn default() -> Self {
        Self::new(Arc::new(TracingLogger))
    }
}

impl LifecycleParticipant for MinikubeExtension {
    fn hint(&self) -> &'static str {
        "minikube"
    }

    fn after_session_start(&mut self, session: &mut Session) -> Result<()> {
        let interrupt = session.interrupt().clone();
        self.inject_properties(session.system_properties_mut(), &interrupt);
        Ok(())
    }

    fn after_projects_read(&mut self, session: &mut Session) -> Result<()> {
        let interrupt = session.interrupt().clone();
        self.inject_properties(session.system_properties_mut(), &interrupt);
        Ok(())
    }
}
