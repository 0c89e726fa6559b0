use crate::imports::{ImportResolver, MergedStylesheet};
use crate::index::ClassIndex;
use crate::style::{aggregate, blaze_css};

pub mod blaze_index {
    use super::*;
    use crate::error::Result;
    use crate::fs::FileReader;
    use log::info;
    use std::path::Path;

    /// Parse an already merged stylesheet and index its global classes.
    pub fn generate(merged: &MergedStylesheet) -> ClassIndex {
        let sheet = blaze_css::parse_stylesheet(&merged.text);
        ClassIndex::from_records(aggregate::aggregate(&sheet))
    }

    /// Resolve `entry` with all of its imports and index the result.
    pub fn resolve_classes(
        entry: &Path,
        reader: &dyn FileReader,
        dependency_root: &Path,
    ) -> Result<ClassIndex> {
        let merged = ImportResolver::new(reader, dependency_root).resolve(entry)?;
        let index = generate(&merged);
        info!(
            "Indexed {} global classes from {} stylesheet(s)",
            index.len(),
            merged.sources.len()
        );
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemoryReader;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    #[test]
    fn test_resolve_classes_across_imports() {
        let reader = MemoryReader::new()
            .with_file(
                "/ws/src/app.css",
                r#"
                @import "@ui/kit.css";
                @import "./layout.css";
                .global(btn-primary) { color: red; }
            "#,
            )
            .with_file(
                "/ws/node_modules/ui/kit.css",
                ":global(.card) { padding: 4px; } .global(btn-primary) { color: gray; margin: 0 }",
            )
            .with_file(
                "/ws/src/layout.css",
                "@media (min-width: 600px) { :global(.card) { padding: 8px; } }",
            );

        let index = blaze_index::resolve_classes(
            Path::new("/ws/src/app.css"),
            &reader,
            Path::new("/ws/node_modules"),
        )
        .unwrap();

        assert_eq!(index.names().collect::<Vec<_>>(), vec!["btn-primary", "card"]);
        // the entry file's rule comes last, so its value wins
        assert_eq!(index.css_block("btn-primary"), Some("color: red;\nmargin: 0;"));
        assert_eq!(
            index.css_block("card"),
            Some("padding: 4px;\n@media (min-width: 600px) {\n  padding: 8px;\n}")
        );
    }
}
