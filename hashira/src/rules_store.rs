use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::mpsc as std_mpsc;
use std::thread::JoinHandle;
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::event::Event;
use hashira_ipc::WindowRule;

/// Editors often emit several events per save (temp file, rename, chmod).
const RULES_DEBOUNCE_MS: u64 = 200;

#[derive(Debug, Error)]
pub enum RulesStoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// The ordered rule list persisted as a JSON array.
#[derive(Debug, Clone)]
pub struct RulesStore {
    path: PathBuf,
}

impl RulesStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is an empty rule list.
    pub fn load(&self) -> Result<Vec<WindowRule>, RulesStoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(RulesStoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&content).map_err(|source| RulesStoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Writes to a sibling temporary file and renames it into place so a
    /// watcher never sees a half-written file.
    pub fn save(&self, rules: &[WindowRule]) -> Result<(), RulesStoreError> {
        let io_error = |source| RulesStoreError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(io_error)?;
        }

        let content = serde_json::to_string_pretty(rules).map_err(|source| {
            RulesStoreError::Parse {
                path: self.path.clone(),
                source,
            }
        })?;

        let mut tmp_name = self.path.file_name().map(OsString::from).unwrap_or_default();
        tmp_name.push(".tmp");
        let tmp_path = self.path.with_file_name(tmp_name);

        std::fs::write(&tmp_path, content + "\n").map_err(io_error)?;
        std::fs::rename(&tmp_path, &self.path).map_err(io_error)?;
        tracing::debug!("Saved {} rules to {}", rules.len(), self.path.display());
        Ok(())
    }
}

/// Watches the rules file and sends `RulesChanged` after each burst of
/// modifications. A file that fails to parse is reported and skipped.
pub fn watch_rules_file(
    store: RulesStore,
    event_tx: mpsc::UnboundedSender<Event>,
) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("rules-watcher".to_string())
        .spawn(move || run_watcher(store, event_tx))
}

fn run_watcher(store: RulesStore, event_tx: mpsc::UnboundedSender<Event>) {
    let Some(file_name) = store.path().file_name().map(OsString::from) else {
        tracing::warn!("Rules path {} has no file name", store.path().display());
        return;
    };
    let watch_dir = match store.path().parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    if let Err(e) = std::fs::create_dir_all(&watch_dir) {
        tracing::warn!("Failed to create {}: {}", watch_dir.display(), e);
        return;
    }

    let (tx, rx) = std_mpsc::channel();
    let mut watcher: RecommendedWatcher = match notify::recommended_watcher(tx) {
        Ok(watcher) => watcher,
        Err(e) => {
            tracing::warn!("Failed to create rules watcher: {}", e);
            return;
        }
    };
    // Watch the directory so replacing the file by rename is seen
    if let Err(e) = watcher.watch(&watch_dir, RecursiveMode::NonRecursive) {
        tracing::warn!("Failed to watch {}: {}", watch_dir.display(), e);
        return;
    }
    tracing::info!("Watching {} for rule changes", store.path().display());

    let debounce = Duration::from_millis(RULES_DEBOUNCE_MS);
    let affects_rules = |event: &notify::Event| {
        event
            .paths
            .iter()
            .any(|p| p.file_name().is_some_and(|name| name == file_name))
    };

    loop {
        match rx.recv() {
            Ok(Ok(event)) if affects_rules(&event) => {}
            Ok(Ok(_)) => continue,
            Ok(Err(e)) => {
                tracing::warn!("Rules watch error: {}", e);
                continue;
            }
            Err(_) => break,
        }

        // Wait for the burst to settle
        loop {
            match rx.recv_timeout(debounce) {
                Ok(_) => continue,
                Err(std_mpsc::RecvTimeoutError::Timeout) => break,
                Err(std_mpsc::RecvTimeoutError::Disconnected) => return,
            }
        }

        match store.load() {
            Ok(rules) => {
                tracing::info!("Rules file changed, reloading");
                if event_tx.send(Event::RulesChanged { rules }).is_err() {
                    break;
                }
            }
            Err(e) => tracing::warn!("Keeping current rules: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashira_ipc::MatchField;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = RulesStore::new(dir.path().join("rules.json"));
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = RulesStore::new(dir.path().join("nested").join("rules.json"));
        let rules = vec![
            WindowRule::new(".*", MatchField::Title, false, true),
            WindowRule::new("Terminal", MatchField::Title, true, false),
        ];

        store.save(&rules).unwrap();

        assert_eq!(store.load().unwrap(), rules);
        assert!(!dir.path().join("nested").join("rules.json.tmp").exists());
    }

    #[test]
    fn test_load_fills_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        std::fs::write(&path, r#"[{"pattern": "Firefox", "type": "class", "sticky": true}, {}]"#)
            .unwrap();

        let rules = RulesStore::new(&path).load().unwrap();

        assert_eq!(
            rules,
            vec![
                WindowRule::new("Firefox", MatchField::Class, true, false),
                WindowRule::new("", MatchField::Title, false, false),
            ]
        );
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        std::fs::write(&path, "[{").unwrap();

        let err = RulesStore::new(&path).load().unwrap_err();
        assert!(matches!(err, RulesStoreError::Parse { .. }));
    }

    fn next_event(rx: &mut mpsc::UnboundedReceiver<Event>, within: Duration) -> Option<Event> {
        let deadline = std::time::Instant::now() + within;
        while std::time::Instant::now() < deadline {
            if let Ok(event) = rx.try_recv() {
                return Some(event);
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        None
    }

    #[test]
    fn test_watcher_reloads_saved_rules_and_ignores_broken_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = RulesStore::new(dir.path().join("rules.json"));
        let (event_tx, mut event_rx) = mpsc::unbounded_channel();

        watch_rules_file(store.clone(), event_tx).unwrap();
        std::thread::sleep(Duration::from_millis(300));

        let rules = vec![WindowRule::new("Firefox", MatchField::Class, true, false)];
        store.save(&rules).unwrap();
        assert_eq!(
            next_event(&mut event_rx, Duration::from_secs(5)),
            Some(Event::RulesChanged { rules })
        );

        // Unrelated files in the same directory are ignored
        std::fs::write(dir.path().join("notes.txt"), "hello").unwrap();
        assert_eq!(next_event(&mut event_rx, Duration::from_secs(1)), None);

        // A file that does not parse keeps the current rules in effect
        std::fs::write(store.path(), "[{").unwrap();
        assert_eq!(next_event(&mut event_rx, Duration::from_secs(1)), None);

        let rules = vec![WindowRule::new("^Calculator$", MatchField::Title, false, true)];
        store.save(&rules).unwrap();
        assert_eq!(
            next_event(&mut event_rx, Duration::from_secs(5)),
            Some(Event::RulesChanged { rules })
        );
    }

    #[test]
    fn test_blank_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.json");
        std::fs::write(&path, "\n").unwrap();

        assert!(RulesStore::new(&path).load().unwrap().is_empty());
    }
}
