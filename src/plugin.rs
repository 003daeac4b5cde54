use crate::errors::{HostError, Result};
use crate::session::Session;

/// Lifecycle participant. Each participant can tap into the build session
/// at two points; both hooks default to doing nothing.
pub trait LifecycleParticipant {
    /// Registration hint, unique per participant kind.
    fn hint(&self) -> &'static str;

    /// Called once the session exists, before any project is loaded.
    fn after_session_start(&mut self, _session: &mut Session) -> Result<()> {
        Ok(())
    }

    /// Called after project metadata has been read.
    fn after_projects_read(&mut self, _session: &mut Session) -> Result<()> {
        Ok(())
    }
}

/// Holds registered participants and runs their hooks in registration order.
#[derive(Default)]
pub struct ParticipantManager {
    participants: Vec<Box<dyn LifecycleParticipant>>,
}

impl ParticipantManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `participant`, replacing an earlier one with the same hint.
    pub fn register(&mut self, participant: Box<dyn LifecycleParticipant>) {
        let hint = participant.hint();
        tracing::debug!(hint, "registering lifecycle participant");
        self.participants.retain(|p| p.hint() != hint);
        self.participants.push(participant);
    }

    pub fn hints(&self) -> Vec<&'static str> {
        self.participants.iter().map(|p| p.hint()).collect()
    }

    pub fn session_started(&mut self, session: &mut Session) -> Result<()> {
        for participant in &mut self.participants {
            participant
                .after_session_start(session)
                .map_err(|e| wrap(participant.hint(), "afterSessionStart", e))?;
        }
        Ok(())
    }

    pub fn projects_read(&mut self, session: &mut Session) -> Result<()> {
        for participant in &mut self.participants {
            participant
                .after_projects_read(session)
                .map_err(|e| wrap(participant.hint(), "afterProjectsRead", e))?;
        }
        Ok(())
    }

    /// Runs both hooks in lifecycle order.
    pub fn run_lifecycle(&mut self, session: &mut Session) -> Result<()> {
        self.session_started(session)?;
        self.projects_read(session)
    }
}

fn wrap(name: &str, hook: &'static str, err: HostError) -> HostError {
    match err {
        HostError::Participant { .. } => err,
        other => HostError::Participant {
            name: name.to_string(),
            hook,
            message: other.to_string(),
        },
    }
}
