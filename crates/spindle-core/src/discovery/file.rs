//! File-backed backend list, reloaded when the file changes.

use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use std::time::SystemTime;

use super::ServerDiscovery;

#[derive(Debug, Default)]
struct CacheState {
    servers: Vec<String>,
    last_modified: Option<SystemTime>,
}

/// Reads one URL per line from a UTF-8 text file. Lines are trimmed, a
/// leading BOM is stripped, empty lines and `#` comments are skipped,
/// input order is preserved, and duplicates are kept verbatim (the
/// registry collapses them by key). The parsed result is cached and only
/// re-read when the file's modification time advances; a missing file or
/// I/O error degrades to an empty list.
pub struct FileDiscovery {
    path: PathBuf,
    cache: Mutex<CacheState>,
}

impl FileDiscovery {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Mutex::new(CacheState::default()),
        }
    }

    fn refresh_if_needed(&self, cache: &mut CacheState) {
        let metadata = match fs::metadata(&self.path) {
            Ok(metadata) => metadata,
            Err(_) => {
                if !cache.servers.is_empty() {
                    tracing::warn!(
                        "Server file {} does not exist, using empty server list",
                        self.path.display()
                    );
                }
                cache.servers.clear();
                return;
            }
        };

        let modified = match metadata.modified() {
            Ok(modified) => modified,
            Err(e) => {
                tracing::error!(
                    "Error checking server file {}: {}",
                    self.path.display(),
                    e
                );
                return;
            }
        };

        let stale = match cache.last_modified {
            Some(last) => modified > last,
            None => true,
        };
        if !stale {
            return;
        }

        match fs::read_to_string(&self.path) {
            Ok(content) => {
                let servers = parse_server_list(&content);
                tracing::info!(
                    "Loaded {} servers from file {}: {:?}",
                    servers.len(),
                    self.path.display(),
                    servers
                );
                cache.servers = servers;
                cache.last_modified = Some(modified);
            }
            Err(e) => {
                // Keep the previous cache; a transient read error should
                // not empty the pool.
                tracing::error!(
                    "Error reading server file {}: {}",
                    self.path.display(),
                    e
                );
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ServerDiscovery for FileDiscovery {
    fn servers(&self) -> Vec<String> {
        let mut cache = self.lock();
        self.refresh_if_needed(&mut cache);
        cache.servers.clone()
    }

    fn name(&self) -> &str {
        "File-based Discovery"
    }

    fn supports_dynamic_updates(&self) -> bool {
        true
    }
}

fn parse_server_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| line.strip_prefix('\u{feff}').unwrap_or(line))
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}
