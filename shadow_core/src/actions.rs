//! Setup actions understood by the worker pool.

use crate::error::SetupError;
use crate::path::Path;
use crate::worker_pool::{ApplicationSpec, WorkerPool};
use serde::{Deserialize, Serialize};
use shadow_env::{millis_to_simtime, Action, VertexId};
use tracing::{debug, error};

fn default_reliability() -> f64 {
    1.0
}

fn default_quantity() -> u32 {
    1
}

/// One setup instruction, as it appears in a scenario document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionSpec {
    /// Adds a virtual network (topology vertex)
    CreateNetwork { id: VertexId },

    /// Links two networks; both directions unless `directed`
    ConnectNetwork {
        src: VertexId,
        dst: VertexId,
        latency_ms: f64,
        #[serde(default = "default_reliability")]
        reliability: f64,
        #[serde(default)]
        directed: bool,
    },

    /// Creates `quantity` nodes attached to `network`
    ///
    /// A single node takes `name`; several are named `name1..nameN`.
    CreateNode {
        name: String,
        network: VertexId,
        #[serde(default = "default_quantity")]
        quantity: u32,
    },

    /// Attaches a traffic generator to `node`, sending to `peer`
    CreateApplication {
        node: String,
        peer: String,
        #[serde(default)]
        start_ms: u64,
        packets: u64,
        #[serde(default)]
        interval_ms: u64,
        #[serde(default)]
        echo: bool,
    },

    /// Ends the simulation at the given time
    Kill { time_ms: u64 },
}

impl ActionSpec {
    /// Checks values that can be validated without the rest of the scenario.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            ActionSpec::ConnectNetwork {
                latency_ms,
                reliability,
                ..
            } => Path::check(*latency_ms, *reliability).map_err(|e| e.to_string()),
            ActionSpec::CreateNode { name, quantity, .. } => {
                if name.is_empty() {
                    Err("node name must not be empty".to_string())
                } else if *quantity == 0 {
                    Err(format!("node '{}' has quantity 0", name))
                } else {
                    Ok(())
                }
            }
            _ => Ok(()),
        }
    }

    fn apply(self, pool: &mut WorkerPool) -> Result<(), SetupError> {
        match self {
            ActionSpec::CreateNetwork { id } => {
                if !pool.create_network(id) {
                    debug!(network = id, "network already exists");
                }
            }
            ActionSpec::ConnectNetwork {
                src,
                dst,
                latency_ms,
                reliability,
                directed,
            } => {
                pool.connect(src, dst, latency_ms, reliability)?;
                if !directed && src != dst {
                    pool.connect(dst, src, latency_ms, reliability)?;
                }
            }
            ActionSpec::CreateNode {
                name,
                network,
                quantity,
            } => {
                if quantity == 1 {
                    pool.create_node(&name, network)?;
                } else {
                    for i in 1..=quantity {
                        pool.create_node(&format!("{}{}", name, i), network)?;
                    }
                }
            }
            ActionSpec::CreateApplication {
                node,
                peer,
                start_ms,
                packets,
                interval_ms,
                echo,
            } => {
                pool.create_application(
                    &node,
                    ApplicationSpec {
                        peer,
                        start_time: millis_to_simtime(start_ms),
                        packets,
                        interval: millis_to_simtime(interval_ms),
                        echo,
                    },
                )?;
            }
            ActionSpec::Kill { time_ms } => {
                pool.set_kill_time(millis_to_simtime(time_ms));
            }
        }
        Ok(())
    }
}

impl Action<WorkerPool> for ActionSpec {
    fn run(self: Box<Self>, pool: &mut WorkerPool) {
        let name = self.name();
        if let Err(err) = self.apply(pool) {
            error!("failed to run {} action: {}", name, err);
        }
    }

    fn name(&self) -> &'static str {
        match self {
            ActionSpec::CreateNetwork { .. } => "create_network",
            ActionSpec::ConnectNetwork { .. } => "connect_network",
            ActionSpec::CreateNode { .. } => "create_node",
            ActionSpec::CreateApplication { .. } => "create_application",
            ActionSpec::Kill { .. } => "kill",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shadow_env::{ActionQueue, SIMTIME_ONE_MILLISECOND};

    fn setup() -> Vec<ActionSpec> {
        vec![
            ActionSpec::CreateNetwork { id: 1 },
            ActionSpec::CreateNetwork { id: 2 },
            ActionSpec::ConnectNetwork {
                src: 1,
                dst: 2,
                latency_ms: 25.0,
                reliability: 1.0,
                directed: false,
            },
            ActionSpec::CreateNode {
                name: "server".to_string(),
                network: 1,
                quantity: 1,
            },
            ActionSpec::CreateNode {
                name: "client".to_string(),
                network: 2,
                quantity: 3,
            },
            ActionSpec::CreateApplication {
                node: "client2".to_string(),
                peer: "server".to_string(),
                start_ms: 100,
                packets: 5,
                interval_ms: 10,
                echo: true,
            },
            ActionSpec::Kill { time_ms: 2000 },
        ]
    }

    #[test]
    fn test_actions_build_pool() {
        let mut pool = WorkerPool::new(7);
        let mut queue = ActionQueue::new();
        for spec in setup() {
            queue.push(Box::new(spec));
        }

        assert_eq!(queue.run_all(&mut pool), 7);

        assert_eq!(pool.topology().vertex_count(), 2);
        assert_eq!(pool.topology().path_count(), 2);
        assert_eq!(pool.node_count(), 4);
        assert!(pool.node_id("client1").is_some());
        assert!(pool.node_id("client3").is_some());
        assert!(pool.node_id("client").is_none());
        assert_eq!(pool.kill_time(), Some(2000 * SIMTIME_ONE_MILLISECOND));
    }

    #[test]
    fn test_failed_action_does_not_stop_setup() {
        let mut pool = WorkerPool::new(7);
        let mut queue = ActionQueue::new();
        // Network 5 was never created
        queue.push(Box::new(ActionSpec::CreateNode {
            name: "orphan".to_string(),
            network: 5,
            quantity: 1,
        }));
        queue.push(Box::new(ActionSpec::CreateNetwork { id: 5 }));

        assert_eq!(queue.run_all(&mut pool), 2);
        assert_eq!(pool.node_count(), 0);
        assert!(pool.topology().contains_vertex(5));
    }

    #[test]
    fn test_directed_connect() {
        let mut pool = WorkerPool::new(7);
        let mut queue: ActionQueue<WorkerPool> = ActionQueue::new();
        queue.push(Box::new(ActionSpec::CreateNetwork { id: 1 }));
        queue.push(Box::new(ActionSpec::CreateNetwork { id: 2 }));
        queue.push(Box::new(ActionSpec::ConnectNetwork {
            src: 1,
            dst: 2,
            latency_ms: 5.0,
            reliability: 0.9,
            directed: true,
        }));
        queue.run_all(&mut pool);

        assert!(pool.topology().path(1, 2).is_some());
        assert!(pool.topology().path(2, 1).is_none());
    }

    #[test]
    fn test_validate() {
        let bad_latency = ActionSpec::ConnectNetwork {
            src: 1,
            dst: 2,
            latency_ms: -1.0,
            reliability: 1.0,
            directed: false,
        };
        assert!(bad_latency.validate().is_err());

        let empty_group = ActionSpec::CreateNode {
            name: "n".to_string(),
            network: 1,
            quantity: 0,
        };
        assert!(empty_group.validate().is_err());

        assert!(ActionSpec::Kill { time_ms: 1 }.validate().is_ok());
    }
}
