//! `@import` expansion.
//!
//! | Specifier | Kind | Resolves to |
//! |-----------|------|-------------|
//! | `./a.css`, `../b.css` | Relative | importing file's directory |
//! | `@scope/pkg.css`, `~pkg/a.css`, `pkg/a.css` | Package | dependency root, `~`/`@` stripped |
//!
//! Imports are inlined depth-first in place of their statement, so later
//! rules still override earlier ones after merging. Each file is inlined at
//! most once; a repeated or cyclic import is replaced by nothing. A missing
//! import target fails the whole resolution.

use crate::error::{BlazeCssError, Result};
use crate::fs::{normalize_path, FileReader};
use crate::style::blaze_css::scan_imports;
use log::{debug, warn};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportSpecifier {
    Package(String),
    Relative(String),
}

impl ImportSpecifier {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.starts_with('@') || raw.starts_with('~') || !raw.starts_with('.') {
            ImportSpecifier::Package(raw.to_string())
        } else {
            ImportSpecifier::Relative(raw.to_string())
        }
    }

    /// Path the specifier points at, before any extension fallback.
    pub fn target(&self, importing_dir: &Path, dependency_root: &Path) -> PathBuf {
        match self {
            ImportSpecifier::Package(spec) => {
                let stripped = spec.trim_start_matches('~');
                let stripped = stripped.strip_prefix('@').unwrap_or(stripped);
                normalize_path(&dependency_root.join(stripped))
            }
            ImportSpecifier::Relative(spec) => normalize_path(&importing_dir.join(spec)),
        }
    }

    fn raw(&self) -> &str {
        match self {
            ImportSpecifier::Package(spec) | ImportSpecifier::Relative(spec) => spec,
        }
    }
}

/// One logical stylesheet built from an entry file and everything it imports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedStylesheet {
    pub text: String,
    /// Every file that was read, in the order it was first visited.
    pub sources: Vec<PathBuf>,
}

pub struct ImportResolver<'a> {
    reader: &'a dyn FileReader,
    dependency_root: PathBuf,
}

impl<'a> ImportResolver<'a> {
    pub fn new(reader: &'a dyn FileReader, dependency_root: impl Into<PathBuf>) -> Self {
        ImportResolver {
            reader,
            dependency_root: dependency_root.into(),
        }
    }

    pub fn resolve(&self, entry: &Path) -> Result<MergedStylesheet> {
        let mut visited = HashSet::new();
        let mut sources = Vec::new();
        let text = self.inline(&normalize_path(entry), &mut visited, &mut sources)?;
        debug!(
            "Resolved {} into {} file(s), {} bytes",
            entry.display(),
            sources.len(),
            text.len()
        );
        Ok(MergedStylesheet { text, sources })
    }

    fn inline(
        &self,
        path: &Path,
        visited: &mut HashSet<PathBuf>,
        sources: &mut Vec<PathBuf>,
    ) -> Result<String> {
        visited.insert(path.to_path_buf());
        sources.push(path.to_path_buf());

        let text = self
            .reader
            .read_text(path)
            .map_err(|source| BlazeCssError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        let imports = scan_imports(&text);
        if imports.is_empty() {
            return Ok(text);
        }

        let importing_dir = path.parent().unwrap_or_else(|| Path::new(""));
        let mut merged = String::with_capacity(text.len());
        let mut cursor = 0;

        for import in imports {
            merged.push_str(&text[cursor..import.range.start]);
            cursor = import.range.end;

            if is_remote(&import.specifier) {
                warn!(
                    "Skipping remote @import {:?} in {}",
                    import.specifier,
                    path.display()
                );
                continue;
            }

            let specifier = ImportSpecifier::parse(&import.specifier);
            let target = self.locate(&specifier, importing_dir);
            if visited.contains(&target) {
                debug!(
                    "Skipping repeated @import {:?} in {}",
                    specifier.raw(),
                    path.display()
                );
                continue;
            }

            let imported = self.inline(&target, visited, sources)?;
            merged.push_str(&imported);
            merged.push('\n');
        }

        merged.push_str(&text[cursor..]);
        Ok(merged)
    }

    /// `@import "./vars"` falls back to `vars.css` when no extension-less file exists.
    fn locate(&self, specifier: &ImportSpecifier, importing_dir: &Path) -> PathBuf {
        let target = specifier.target(importing_dir, &self.dependency_root);
        if target.extension().is_none() && !self.reader.exists(&target) {
            let with_extension = target.with_extension("css");
            if self.reader.exists(&with_extension) {
                return with_extension;
            }
        }
        target
    }
}

fn is_remote(specifier: &str) -> bool {
    let lowered = specifier.trim().to_ascii_lowercase();
    lowered.starts_with("http://") || lowered.starts_with("https://") || lowered.starts_with("//")
}
