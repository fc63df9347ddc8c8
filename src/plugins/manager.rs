//! Plugin lifecycle supervision
//!
//! The manager turns a directory of candidate artifacts into a set of live,
//! supervised plugin handles, hands the router a routing table derived from
//! them, and tears everything down on shutdown within a fixed grace period.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::application::errors::PluginError;
use crate::application::routing::Route;
use crate::domain::entities::{Command, OutboundMessage, ParsedCommand};
use crate::plugins::loader;
use crate::plugins::unit::{PluginLogger, PluginUnit};

/// Bookkeeping record for one live plugin unit.
///
/// Created at load time, lives for the process lifetime, destroyed during
/// coordinated shutdown.
pub struct PluginHandle {
    /// File or registration name the unit came from.
    pub source: String,
    /// Command table advertised by the unit at load time.
    pub commands: Vec<Command>,
    /// Send end of the unit's private command channel.
    pub sender: mpsc::Sender<ParsedCommand>,
    unit: Arc<dyn PluginUnit>,
}

/// Loads, starts, and supervises plugin units.
pub struct PluginManager {
    handles: Vec<PluginHandle>,
    outbound: mpsc::Sender<OutboundMessage>,
    grace: Duration,
}

impl PluginManager {
    pub fn new(outbound: mpsc::Sender<OutboundMessage>, grace: Duration) -> Self {
        Self {
            handles: Vec::new(),
            outbound,
            grace,
        }
    }

    /// Scan `dir` (non-recursive) for files with the given extension and load
    /// each candidate, in file-name order.
    ///
    /// An artifact that fails to open is logged and skipped; a loadable
    /// artifact that violates the plugin contract aborts the whole load, as
    /// does an unreadable directory. Returns the number of units loaded.
    pub fn load_directory(&mut self, dir: &Path, extension: &str) -> Result<usize, PluginError> {
        let wanted = extension.trim_start_matches('.');

        let mut candidates: Vec<PathBuf> = Vec::new();
        let entries = std::fs::read_dir(dir).map_err(|source| PluginError::Directory {
            dir: dir.display().to_string(),
            source,
        })?;
        for entry in entries {
            let path = entry
                .map_err(|source| PluginError::Directory {
                    dir: dir.display().to_string(),
                    source,
                })?
                .path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|ext| ext.to_str()) == Some(wanted) {
                candidates.push(path);
            }
        }
        // read_dir order is platform-dependent; keep load order deterministic.
        candidates.sort();

        let mut loaded = 0;
        for path in candidates {
            let file = path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or_default()
                .to_string();
            info!(plugin = %file, "loading plugin");
            let unit = match loader::load(&path) {
                Ok(unit) => unit,
                Err(err @ PluginError::Contract { .. }) => return Err(err),
                Err(err) => {
                    warn!(plugin = %file, error = %err, "skipping plugin");
                    continue;
                }
            };
            self.install(file, unit);
            loaded += 1;
        }
        Ok(loaded)
    }

    /// Bring an already constructed unit under supervision: read its command
    /// table, allocate its private channel, and start its receive loop.
    ///
    /// Used by `load_directory` for dynamically loaded units and directly by
    /// in-process units; the manager does not care where a unit came from.
    pub fn install(&mut self, source: impl Into<String>, unit: Arc<dyn PluginUnit>) {
        let source = source.into();
        let commands = unit.commands();
        debug!(plugin = %source, commands = commands.len(), "commands advertised");

        // Capacity 1 keeps the router's hand-off blocking: a unit that is not
        // receiving stalls dispatch to it rather than queueing work.
        let (sender, receiver) = mpsc::channel(1);
        unit.start(
            receiver,
            self.outbound.clone(),
            PluginLogger::new(source.clone()),
        );
        info!(plugin = %source, "plugin started");

        self.handles.push(PluginHandle {
            source,
            commands,
            sender,
            unit,
        });
    }

    pub fn handles(&self) -> &[PluginHandle] {
        &self.handles
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Routing table for the router, in load order.
    pub fn routes(&self) -> Vec<Route> {
        self.handles
            .iter()
            .map(|handle| Route {
                source: handle.source.clone(),
                commands: handle.commands.clone(),
                sender: handle.sender.clone(),
            })
            .collect()
    }

    /// Stop every unit and wait out the grace period.
    ///
    /// Stops are fired concurrently and never individually awaited; after the
    /// single fixed sleep the handles (and any loaded libraries inside them)
    /// are dropped whether or not the units actually exited. Time-boxed
    /// best-effort, not confirmed completion.
    pub async fn shutdown(self) {
        info!(
            plugins = self.handles.len(),
            grace_seconds = self.grace.as_secs(),
            "stopping plugins"
        );
        for handle in &self.handles {
            let unit = Arc::clone(&handle.unit);
            let source = handle.source.clone();
            tokio::spawn(async move {
                debug!(plugin = %source, "stop requested");
                unit.stop();
            });
        }
        tokio::time::sleep(self.grace).await;
        debug!("grace period elapsed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct TestUnit {
        commands: Vec<Command>,
        started: Arc<AtomicBool>,
        stopped: Arc<AtomicBool>,
    }

    impl TestUnit {
        fn new(keyword: &str) -> (Arc<Self>, Arc<AtomicBool>, Arc<AtomicBool>) {
            let started = Arc::new(AtomicBool::new(false));
            let stopped = Arc::new(AtomicBool::new(false));
            let unit = Arc::new(Self {
                commands: vec![Command::new(keyword)],
                started: started.clone(),
                stopped: stopped.clone(),
            });
            (unit, started, stopped)
        }
    }

    impl PluginUnit for TestUnit {
        fn commands(&self) -> Vec<Command> {
            self.commands.clone()
        }

        fn start(
            &self,
            _inbound: mpsc::Receiver<ParsedCommand>,
            _outbound: mpsc::Sender<OutboundMessage>,
            _logger: PluginLogger,
        ) {
            self.started.store(true, Ordering::SeqCst);
        }

        fn stop(&self) {
            self.stopped.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn install_starts_unit_and_records_handle() {
        let (outbound, _outbound_rx) = mpsc::channel(1);
        let mut manager = PluginManager::new(outbound, Duration::from_secs(5));
        let (unit, started, _) = TestUnit::new("deploy");

        manager.install("test.so", unit);

        assert!(started.load(Ordering::SeqCst));
        assert_eq!(manager.len(), 1);
        let routes = manager.routes();
        assert_eq!(routes[0].source, "test.so");
        assert_eq!(routes[0].commands[0].keyword, "deploy");
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_all_units_within_grace_period() {
        let (outbound, _outbound_rx) = mpsc::channel(1);
        let grace = Duration::from_secs(5);
        let mut manager = PluginManager::new(outbound, grace);
        let (first, _, first_stopped) = TestUnit::new("one");
        let (second, _, second_stopped) = TestUnit::new("two");
        manager.install("one.so", first);
        manager.install("two.so", second);

        let before = tokio::time::Instant::now();
        manager.shutdown().await;
        let waited = tokio::time::Instant::now() - before;

        assert!(first_stopped.load(Ordering::SeqCst));
        assert!(second_stopped.load(Ordering::SeqCst));
        assert_eq!(waited, grace);
    }

    #[tokio::test]
    async fn load_directory_fails_on_missing_directory() {
        let (outbound, _outbound_rx) = mpsc::channel(1);
        let mut manager = PluginManager::new(outbound, Duration::from_secs(1));

        let result = manager.load_directory(Path::new("/nonexistent/plugins"), ".so");

        assert!(matches!(result, Err(PluginError::Directory { .. })));
    }

    #[tokio::test]
    async fn load_directory_skips_unloadable_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.so"), b"not a shared object").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();

        let (outbound, _outbound_rx) = mpsc::channel(1);
        let mut manager = PluginManager::new(outbound, Duration::from_secs(1));
        let (unit, _, _) = TestUnit::new("status");
        manager.install("builtin", unit);

        let loaded = manager.load_directory(dir.path(), ".so").unwrap();

        assert_eq!(loaded, 0);
        assert_eq!(manager.len(), 1);
    }
}
