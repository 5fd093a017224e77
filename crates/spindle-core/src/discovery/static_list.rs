//! Fixed backend list from configuration.

use super::ServerDiscovery;

pub struct StaticDiscovery {
    servers: Vec<String>,
}

impl StaticDiscovery {
    pub fn new(servers: Vec<String>) -> Self {
        Self { servers }
    }
}

impl ServerDiscovery for StaticDiscovery {
    fn servers(&self) -> Vec<String> {
        self.servers.clone()
    }

    fn name(&self) -> &str {
        "Static Configuration"
    }

    fn supports_dynamic_updates(&self) -> bool {
        false
    }
}
