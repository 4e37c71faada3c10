//! Built-in example scenario.

/// Two networks 25ms apart, a server, and four clients echoing traffic.
/// Ends after 2 simulated seconds.
const FILE_EXAMPLE: &str = r#"{
  "actions": [
    { "action": "create_network", "id": 1 },
    { "action": "create_network", "id": 2 },
    { "action": "connect_network", "src": 1, "dst": 1, "latency_ms": 10.0, "reliability": 1.0 },
    { "action": "connect_network", "src": 2, "dst": 2, "latency_ms": 12.5, "reliability": 0.995 },
    { "action": "connect_network", "src": 1, "dst": 2, "latency_ms": 25.0, "reliability": 0.98 },

    { "action": "create_node", "name": "server", "network": 1 },
    { "action": "create_node", "name": "client", "network": 2, "quantity": 4 },

    { "action": "create_application", "node": "client1", "peer": "server", "start_ms": 0, "packets": 200, "interval_ms": 5, "echo": true },
    { "action": "create_application", "node": "client2", "peer": "server", "start_ms": 3, "packets": 200, "interval_ms": 7, "echo": true },
    { "action": "create_application", "node": "client3", "peer": "client4", "start_ms": 10, "packets": 150, "interval_ms": 4, "echo": false },
    { "action": "create_application", "node": "client4", "peer": "client3", "start_ms": 10, "packets": 150, "interval_ms": 4, "echo": true },
    { "action": "create_application", "node": "server", "peer": "client1", "start_ms": 500, "packets": 50, "interval_ms": 20, "echo": false },

    { "action": "kill", "time_ms": 2000 }
  ]
}"#;

/// Returns the example scenario document.
pub fn file_example_contents() -> &'static str {
    FILE_EXAMPLE
}
