//! Backend discovery sources.

use std::sync::Arc;

use crate::config::BalancerConfig;

mod file;
mod static_list;


pub use file::FileDiscovery;
pub use static_list::StaticDiscovery;

/// Supplies the current set of backend URLs.
pub trait ServerDiscovery: Send + Sync {
    /// Current backend URL list. Hard errors degrade to an empty list.
    fn servers(&self) -> Vec<String>;

    /// Human-readable name of this discovery source.
    fn name(&self) -> &str;

    /// Whether the set can change without a restart. When true, the
    /// registry removes records whose URL disappears from the set.
    fn supports_dynamic_updates(&self) -> bool;
}

/// Pick the discovery source named by the config; unknown names fall back
/// to static.
pub fn from_config(config: &BalancerConfig) -> Arc<dyn ServerDiscovery> {
    match config.server_discovery_strategy.to_lowercase().as_str() {
        "file" => {
            tracing::info!(
                "Configured file-based server discovery with path: {}",
                config.server_discovery_file_path
            );
            Arc::new(FileDiscovery::new(config.server_discovery_file_path.clone()))
        }
        "static" => {
            tracing::info!(
                "Configured static server discovery with {} servers",
                config.servers.len()
            );
            Arc::new(StaticDiscovery::new(config.servers.clone()))
        }
        other => {
            tracing::warn!(
                "Unknown server discovery strategy '{}', falling back to static",
                other
            );
            Arc::new(StaticDiscovery::new(config.servers.clone()))
        }
    }
}
