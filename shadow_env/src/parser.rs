//! Scenario parser abstraction.

use crate::action::ActionQueue;
use crate::error::EnvError;
use std::path::Path;

/// Turns scenario text into setup actions.
///
/// # Atomicity
///
/// A call either appends every action described by its input or appends
/// nothing and returns an error. Callers parsing several files rely on this
/// to abort cleanly on the first bad file.
pub trait ScenarioParser<Ctx: ?Sized> {
    /// Parses scenario text held in memory.
    fn parse_contents(
        &mut self,
        contents: &str,
        actions: &mut ActionQueue<Ctx>,
    ) -> Result<(), EnvError>;

    /// Reads and parses a scenario file.
    fn parse_file(&mut self, path: &Path, actions: &mut ActionQueue<Ctx>) -> Result<(), EnvError> {
        let contents = std::fs::read_to_string(path).map_err(|e| EnvError::io(path, e))?;
        self.parse_contents(&contents, actions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Rejecting;

    impl ScenarioParser<()> for Rejecting {
        fn parse_contents(&mut self, _: &str, _: &mut ActionQueue<()>) -> Result<(), EnvError> {
            Err(EnvError::parse("always"))
        }
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let mut actions = ActionQueue::new();
        let err = Rejecting
            .parse_file(Path::new("/nonexistent/shadow/scenario.json"), &mut actions)
            .unwrap_err();

        assert!(matches!(err, EnvError::Io { .. }));
        assert!(err.to_string().contains("scenario.json"));
    }
}
