//! Request-facing side of BlazeCSS.
//!
//! A [`ClassService`] owns the cached class index of one workspace and
//! answers completion, hover and panel requests from it. Interactive
//! requests never fail: configuration and I/O problems are reported through
//! a [`Notifier`] and the request gets an empty (or last-good) answer.

use crate::blaze_generate::blaze_index;
use crate::cache::{ClassCache, DEFAULT_TTL};
use crate::config::{
    locate_workspace_root, ConfigProvider, CACHE_TTL_SECS, DEFAULT_DEPENDENCY_ROOT, DEFAULT_WATCH_PATTERN, DEPENDENCY_ROOT,
    ENTRY_STYLESHEET, WATCH_PATTERN,
};
use crate::error::{BlazeCssError, Result};
use crate::fs::{DiskReader, FileReader};
use crate::index::ClassIndex;
use crate::parser::cursor_context::{detect, word_at, SourceKind};
use crate::watcher::ChangeEvent;
use globset::{Glob, GlobMatcher};
use log::{debug, error, warn};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Something the user should be told about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// No entry stylesheet configured. Sent once per service.
    MissingEntryStylesheet,
    /// Resolving or reading the stylesheet failed.
    ResolutionFailed(String),
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Routes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: Notification) {
        match notification {
            Notification::MissingEntryStylesheet => warn!(
                "No entry stylesheet configured; set `{}` to enable global class completion",
                ENTRY_STYLESHEET
            ),
            Notification::ResolutionFailed(message) => error!("{}", message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionItem {
    pub label: String,
    pub insert_text: String,
    /// The class's property block.
    pub documentation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoverInfo {
    pub class_name: String,
    pub css: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelEntry {
    pub class_name: String,
    pub properties_text: String,
}

pub struct ClassService {
    workspace_root: PathBuf,
    config: Box<dyn ConfigProvider>,
    reader: Box<dyn FileReader>,
    notifier: Box<dyn Notifier>,
    cache: ClassCache,
    watch_matcher: Option<GlobMatcher>,
    config_reported: AtomicBool,
}

impl ClassService {
    pub fn new(workspace_root: impl Into<PathBuf>, config: impl ConfigProvider + 'static) -> Self {
        let ttl = config
            .get_string(CACHE_TTL_SECS)
            .and_then(|secs| secs.trim().parse::<u64>().ok())
            .map_or(DEFAULT_TTL, Duration::from_secs);
        let pattern = config
            .get_string(WATCH_PATTERN)
            .unwrap_or_else(|| DEFAULT_WATCH_PATTERN.to_string());
        let watch_matcher = match Glob::new(&pattern) {
            Ok(glob) => Some(glob.compile_matcher()),
            Err(e) => {
                warn!("Invalid watch pattern {:?}: {}", pattern, e);
                None
            }
        };

        ClassService {
            workspace_root: workspace_root.into(),
            config: Box::new(config),
            reader: Box::new(DiskReader),
            notifier: Box::new(LogNotifier),
            cache: ClassCache::new(ttl),
            watch_matcher,
            config_reported: AtomicBool::new(false),
        }
    }

    pub fn with_reader(mut self, reader: impl FileReader + 'static) -> Self {
        self.reader = Box::new(reader);
        self
    }

    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Box::new(notifier);
        self
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn cache(&self) -> &ClassCache {
        &self.cache
    }

    /// Absolute path of the configured entry stylesheet.
    pub fn entry_stylesheet(&self) -> Result<PathBuf> {
        self.config
            .get_string(ENTRY_STYLESHEET)
            .filter(|entry| !entry.trim().is_empty())
            .map(|entry| self.workspace_root.join(entry.trim()))
            .ok_or(BlazeCssError::Config {
                key: ENTRY_STYLESHEET,
            })
    }

    pub fn dependency_root(&self) -> PathBuf {
        let configured = self
            .config
            .get_string(DEPENDENCY_ROOT)
            .unwrap_or_else(|| DEFAULT_DEPENDENCY_ROOT.to_string());
        self.workspace_root.join(configured)
    }

    /// The class index, rebuilt first when stale. Errors are returned, not reported.
    pub fn class_index(&self) -> Result<Arc<ClassIndex>> {
        self.cache.rebuild_if_stale(|| {
            let entry = self.entry_stylesheet()?;
            blaze_index::resolve_classes(&entry, self.reader.as_ref(), &self.dependency_root())
        })
    }

    /// Drop the cached index and build a fresh one.
    pub fn rebuild(&self) -> Result<Arc<ClassIndex>> {
        self.cache.invalidate();
        self.class_index()
    }

    /// Completion candidates for a cursor in `line`, or nothing when the
    /// cursor is not in a class list.
    pub fn complete(&self, line: &str, cursor: usize, source_kind: SourceKind) -> Vec<CompletionItem> {
        let Some(context) = detect(line, cursor, source_kind) else {
            return Vec::new();
        };
        let Some(index) = self.index_for_request() else {
            return Vec::new();
        };

        index
            .entries()
            .filter(|(name, _)| !context.existing_classes.contains(*name))
            .map(|(name, entry)| CompletionItem {
                label: name.to_string(),
                insert_text: context.insert_text(name),
                documentation: (!entry.css.is_empty()).then(|| entry.css.clone()),
            })
            .collect()
    }

    /// Like [`ClassService::complete`], with the source kind taken from the
    /// document's file type. Fails when `document` is outside this workspace.
    pub fn complete_in(&self, document: &Path, line: &str, cursor: usize) -> Result<Vec<CompletionItem>> {
        locate_workspace_root(document, std::slice::from_ref(&self.workspace_root))?;
        Ok(self.complete(line, cursor, SourceKind::from_path(document)))
    }

    pub fn hover(&self, line: &str, cursor: usize) -> Option<HoverInfo> {
        let word = word_at(line, cursor)?;
        let index = self.index_for_request()?;
        let css = index.css_block(word)?;
        Some(HoverInfo {
            class_name: word.to_string(),
            css: css.to_string(),
        })
    }

    /// All classes, filtered case-insensitively by `filter`.
    pub fn panel(&self, filter: &str) -> Vec<PanelEntry> {
        let Some(index) = self.index_for_request() else {
            return Vec::new();
        };
        index
            .containing(filter.trim())
            .map(|(name, entry)| PanelEntry {
                class_name: name.to_string(),
                properties_text: entry.css.clone(),
            })
            .collect()
    }

    /// Invalidate the index when a watched stylesheet changed.
    pub fn handle_change(&self, event: &ChangeEvent) -> bool {
        let Some(matcher) = &self.watch_matcher else {
            return false;
        };
        let relative = event
            .path
            .strip_prefix(&self.workspace_root)
            .unwrap_or(&event.path);
        if !matcher.is_match(relative) {
            return false;
        }
        debug!("{:?} {}, invalidating class index", event.kind, event.path.display());
        self.cache.invalidate();
        true
    }

    fn index_for_request(&self) -> Option<Arc<ClassIndex>> {
        match self.class_index() {
            Ok(index) => Some(index),
            Err(err) => {
                self.report(err);
                let stale = self.cache.get();
                (!stale.is_empty()).then_some(stale)
            }
        }
    }

    fn report(&self, err: BlazeCssError) {
        match err {
            BlazeCssError::Config { .. } => {
                if !self.config_reported.swap(true, Ordering::SeqCst) {
                    self.notifier.notify(Notification::MissingEntryStylesheet);
                }
            }
            other => self
                .notifier
                .notify(Notification::ResolutionFailed(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryReader;
    use crate::watcher::ChangeKind;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct Recorder(Arc<Mutex<Vec<Notification>>>);

    impl Notifier for Recorder {
        fn notify(&self, notification: Notification) {
            self.0.lock().unwrap().push(notification);
        }
    }

    fn config(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn service(reader: MemoryReader) -> ClassService {
        ClassService::new("/ws", config(&[(ENTRY_STYLESHEET, "styles/global.css")])).with_reader(reader)
    }

    fn reader() -> MemoryReader {
        MemoryReader::new().with_file(
            "/ws/styles/global.css",
            ".global(btn-primary) { color: red; } .global(layout-flex) { display: flex; } :global(.card) { padding: 4px; }",
        )
    }

    fn labels(items: &[CompletionItem]) -> Vec<&str> {
        items.iter().map(|item| item.label.as_str()).collect()
    }

    #[test]
    fn test_completion_excludes_existing_classes() {
        let service = service(reader());
        let line = "composes: btn-primary layout-flex from global;";
        let items = service.complete(line, "composes: btn-primary ".len(), SourceKind::Stylesheet);
        assert_eq!(labels(&items), vec!["card", "layout-flex"]);
        assert_eq!(items[0].insert_text, "card");
        assert_eq!(items[0].documentation.as_deref(), Some("padding: 4px;"));
    }

    #[test]
    fn test_completion_outside_class_context_is_empty() {
        let service = service(reader());
        assert!(service.complete("<div id=\"", 9, SourceKind::Markup).is_empty());
    }

    #[test]
    fn test_completion_uses_document_kind() {
        let service = service(reader());
        let items = service
            .complete_in(Path::new("/ws/src/App.jsx"), "<div className=\"card", 20)
            .unwrap();
        assert_eq!(labels(&items), vec!["btn-primary", "layout-flex"]);
        assert_eq!(items[0].insert_text, " btn-primary");
    }

    #[test]
    fn test_completion_outside_workspace_fails() {
        let service = service(reader());
        let err = service
            .complete_in(Path::new("/elsewhere/App.jsx"), "<div className=\"", 16)
            .unwrap_err();
        assert!(matches!(err, BlazeCssError::Workspace(path) if path == Path::new("/elsewhere/App.jsx")));
    }

    #[test]
    fn test_hover_returns_block_for_word() {
        let service = service(reader());
        let hover = service.hover("<div class=\"card big\">", 13).unwrap();
        assert_eq!(hover.class_name, "card");
        assert_eq!(hover.css, "padding: 4px;");
        assert!(service.hover("<div class=\"card big\">", 18).is_none());
    }

    #[test]
    fn test_hover_finds_escaped_class_names() {
        let reader = MemoryReader::new().with_file("/ws/styles/global.css", r".sm\:flex { display: flex; }");
        let service = service(reader);
        let hover = service.hover(r#"<div class="sm:flex">"#, 14).unwrap();
        assert_eq!(hover.class_name, "sm:flex");
        assert_eq!(hover.css, "display: flex;");
    }

    #[test]
    fn test_panel_filter_is_case_insensitive() {
        let service = service(reader());
        let entries = service.panel("BTN");
        assert_eq!(
            entries,
            vec![PanelEntry {
                class_name: "btn-primary".into(),
                properties_text: "color: red;".into()
            }]
        );
        assert_eq!(service.panel("").len(), 3);
    }

    #[test]
    fn test_missing_config_reported_once() {
        let recorder = Recorder::default();
        let service = ClassService::new("/ws", config(&[]))
            .with_reader(reader())
            .with_notifier(recorder.clone());

        assert!(service.complete("<div class=\"", 12, SourceKind::Markup).is_empty());
        assert!(service.panel("").is_empty());
        assert_eq!(*recorder.0.lock().unwrap(), vec![Notification::MissingEntryStylesheet]);
        assert!(matches!(service.class_index(), Err(BlazeCssError::Config { .. })));
    }

    #[test]
    fn test_io_failure_keeps_last_good_index() {
        let recorder = Recorder::default();
        let service = ClassService::new(
            "/ws",
            config(&[(ENTRY_STYLESHEET, "styles/global.css"), (CACHE_TTL_SECS, "0")]),
        )
        .with_reader(reader())
        .with_notifier(recorder.clone());
        assert_eq!(service.panel("").len(), 3);

        let service = service.with_reader(MemoryReader::new());
        assert_eq!(service.panel("").len(), 3);
        let notifications = recorder.0.lock().unwrap();
        assert_eq!(notifications.len(), 1);
        assert!(matches!(&notifications[0], Notification::ResolutionFailed(msg) if msg.contains("global.css")));
    }

    #[test]
    fn test_change_events_invalidate_matching_files_only() {
        let service = service(reader());
        service.class_index().unwrap();
        assert!(!service.cache().is_stale());

        let ignored = ChangeEvent {
            kind: ChangeKind::Changed,
            path: PathBuf::from("/ws/src/App.tsx"),
        };
        assert!(!service.handle_change(&ignored));
        assert!(!service.cache().is_stale());

        let matching = ChangeEvent {
            kind: ChangeKind::Created,
            path: PathBuf::from("/ws/styles/new.css"),
        };
        assert!(service.handle_change(&matching));
        assert!(service.cache().is_stale());
    }

    #[test]
    fn test_paths_come_from_configuration() {
        let service = ClassService::new(
            "/ws",
            config(&[(ENTRY_STYLESHEET, " a/b.css "), (DEPENDENCY_ROOT, "vendor")]),
        );
        assert_eq!(service.entry_stylesheet().unwrap(), PathBuf::from("/ws/a/b.css"));
        assert_eq!(service.dependency_root(), PathBuf::from("/ws/vendor"));
        assert_eq!(service.cache().ttl(), DEFAULT_TTL);
    }
}
