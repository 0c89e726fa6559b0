//! Stylesheet change detection.
//!
//! Created and modified files under the workspace root are turned into
//! [`ChangeEvent`]s and handed to [`ClassService::handle_change`], which
//! invalidates the class index when the path matches the watch pattern.

use crate::error::Result;
use crate::service::ClassService;
use log::{debug, error, info};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Changed,
    Created,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub kind: ChangeKind,
    pub path: PathBuf,
}

/// The change events carried by a notify event. Removals and metadata-only
/// events are not reported.
pub fn change_events(event: &Event) -> Vec<ChangeEvent> {
    let kind = match event.kind {
        EventKind::Create(_) => ChangeKind::Created,
        EventKind::Modify(notify::event::ModifyKind::Metadata(_)) => return Vec::new(),
        EventKind::Modify(_) => ChangeKind::Changed,
        _ => return Vec::new(),
    };
    event
        .paths
        .iter()
        .map(|path| ChangeEvent {
            kind,
            path: path.clone(),
        })
        .collect()
}

/// Keeps a recursive watch on the workspace alive for as long as it is held.
pub struct StylesheetWatcher {
    _watcher: RecommendedWatcher,
}

impl StylesheetWatcher {
    pub fn start(service: Arc<ClassService>) -> Result<Self> {
        let root = service.workspace_root().to_path_buf();
        let handler = Arc::clone(&service);
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                for change in change_events(&event) {
                    if handler.handle_change(&change) {
                        debug!("Stylesheet {:?}: {}", change.kind, change.path.display());
                    }
                }
            }
            Err(e) => error!("File watcher error: {}", e),
        })?;
        watcher.watch(&root, RecursiveMode::Recursive)?;

        info!("Watching {} for stylesheet changes", root.display());
        Ok(StylesheetWatcher { _watcher: watcher })
    }
}
