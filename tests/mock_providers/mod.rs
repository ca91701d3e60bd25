//! Mock Provider Servers
//!
//! Real WebSocket servers on loopback ports that stand in for remote
//! synthesis services.

// Allow dead code in test infrastructure - not every test binary uses every helper
#![allow(dead_code)]

pub mod seedtts_mock;

pub use seedtts_mock::{MockFrame, SeedTtsMockServer, abcd_script};

use seedtts_gateway::SeedTtsConfig;

/// Client configuration pointing at a mock server
pub fn mock_config(server: &SeedTtsMockServer) -> SeedTtsConfig {
    SeedTtsConfig::new("test-app", "test-token").with_endpoint(server.url())
}
