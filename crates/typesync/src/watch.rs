//! Watch mode: rerun on changes to the input file.

use anyhow::{Context, Result};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{RecvTimeoutError, channel};
use std::time::Duration;

/// Block forever, calling `on_change` once per burst of events touching
/// `path`. A burst ends after `debounce` with no new events. Failed runs are
/// logged and watching continues.
pub fn watch<F>(path: &Path, debounce: Duration, mut on_change: F) -> Result<()>
where
    F: FnMut() -> Result<()>,
{
    let target = path
        .canonicalize()
        .with_context(|| format!("failed to resolve {}", path.display()))?;
    // Editors replace files on save, so watch the directory and filter.
    let dir = target
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    let (tx, rx) = channel();
    let mut watcher =
        RecommendedWatcher::new(tx, Config::default()).context("failed to start file watcher")?;
    watcher
        .watch(&dir, RecursiveMode::NonRecursive)
        .with_context(|| format!("failed to watch {}", dir.display()))?;
    tracing::info!(path = %target.display(), "watching for changes");

    while let Ok(first) = rx.recv() {
        let mut touched = is_relevant(&first, &target);
        loop {
            match rx.recv_timeout(debounce) {
                Ok(event) => touched |= is_relevant(&event, &target),
                Err(RecvTimeoutError::Timeout) => break,
                Err(RecvTimeoutError::Disconnected) => return Ok(()),
            }
        }
        if !touched {
            continue;
        }
        tracing::debug!("change detected, regenerating");
        if let Err(e) = on_change() {
            tracing::error!("{:#}", e);
        }
    }
    Ok(())
}

fn is_relevant(event: &notify::Result<Event>, target: &Path) -> bool {
    match event {
        Ok(event) => {
            matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
                && event.paths.iter().any(|p| same_file(p, target))
        }
        Err(e) => {
            tracing::warn!("watch error: {}", e);
            false
        }
    }
}

fn same_file(candidate: &Path, target: &Path) -> bool {
    candidate == target || candidate.canonicalize().is_ok_and(|p| p == target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind, RemoveKind};

    fn event(kind: EventKind, path: &str) -> notify::Result<Event> {
        Ok(Event::new(kind).add_path(PathBuf::from(path)))
    }

    #[test]
    fn writes_to_target_are_relevant() {
        let target = Path::new("/work/api.yaml");
        assert!(is_relevant(
            &event(EventKind::Modify(ModifyKind::Any), "/work/api.yaml"),
            target
        ));
        assert!(is_relevant(
            &event(EventKind::Create(CreateKind::File), "/work/api.yaml"),
            target
        ));
    }

    #[test]
    fn other_files_and_removals_are_ignored() {
        let target = Path::new("/work/api.yaml");
        assert!(!is_relevant(
            &event(EventKind::Modify(ModifyKind::Any), "/work/types.ts"),
            target
        ));
        assert!(!is_relevant(
            &event(EventKind::Remove(RemoveKind::File), "/work/api.yaml"),
            target
        ));
        assert!(!is_relevant(
            &Err(notify::Error::generic("boom")),
            target
        ));
    }
}
