//! JSON scenario parser.
//!
//! A scenario document is an object with an ordered `actions` array:
//!
//! ```json
//! {
//!   "actions": [
//!     { "action": "create_network", "id": 1 },
//!     { "action": "connect_network", "src": 1, "dst": 1, "latency_ms": 10.0 },
//!     { "action": "create_node", "name": "server", "network": 1 },
//!     { "action": "kill", "time_ms": 1000 }
//!   ]
//! }
//! ```

use crate::actions::ActionSpec;
use crate::worker_pool::WorkerPool;
use serde::Deserialize;
use shadow_env::{ActionQueue, EnvError, ScenarioParser};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScenarioDocument {
    actions: Vec<ActionSpec>,
}

/// Parses JSON scenario documents into [`ActionSpec`] actions.
#[derive(Debug, Default)]
pub struct JsonScenarioParser {
    documents: usize,
}

impl JsonScenarioParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents parsed successfully so far.
    pub fn documents_parsed(&self) -> usize {
        self.documents
    }

    /// Parses and validates a document without queueing anything.
    pub fn parse_str(contents: &str) -> Result<Vec<ActionSpec>, EnvError> {
        let document: ScenarioDocument =
            serde_json::from_str(contents).map_err(|e| EnvError::parse(e.to_string()))?;

        for (index, spec) in document.actions.iter().enumerate() {
            spec.validate()
                .map_err(|msg| EnvError::parse(format!("action #{}: {}", index, msg)))?;
        }
        Ok(document.actions)
    }
}

impl ScenarioParser<WorkerPool> for JsonScenarioParser {
    fn parse_contents(
        &mut self,
        contents: &str,
        actions: &mut ActionQueue<WorkerPool>,
    ) -> Result<(), EnvError> {
        // Fully parsed before anything is queued
        let mut parsed = ActionQueue::new();
        for spec in Self::parse_str(contents)? {
            parsed.push(Box::new(spec));
        }
        actions.append(&mut parsed);
        self.documents += 1;
        Ok(())
    }
}
