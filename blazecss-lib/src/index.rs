use crate::style::aggregate::ClassRecord;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::ops::Bound;

/// Read-side view of the aggregated classes: name -> record + rendered block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassIndex {
    entries: BTreeMap<String, ClassEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassEntry {
    pub record: ClassRecord,
    /// `ClassRecord::render` output, computed once at build time.
    pub css: String,
}

impl ClassIndex {
    /// Build the index, rendering every record's property block in parallel.
    pub fn from_records(records: BTreeMap<String, ClassRecord>) -> Self {
        let entries = records
            .into_par_iter()
            .map(|(name, record)| {
                let css = record.render();
                (name, ClassEntry { record, css })
            })
            .collect();
        ClassIndex { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, class_name: &str) -> bool {
        self.entries.contains_key(class_name)
    }

    pub fn get(&self, class_name: &str) -> Option<&ClassEntry> {
        self.entries.get(class_name)
    }

    pub fn css_block(&self, class_name: &str) -> Option<&str> {
        self.entries.get(class_name).map(|entry| entry.css.as_str())
    }

    /// Class names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &ClassEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn with_prefix<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = (&'a str, &'a ClassEntry)> {
        self.entries
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(move |(name, _)| name.starts_with(prefix))
            .map(|(name, entry)| (name.as_str(), entry))
    }

    /// Case-insensitive substring match on the class name.
    pub fn containing<'a>(&'a self, needle: &str) -> impl Iterator<Item = (&'a str, &'a ClassEntry)> {
        let needle = needle.to_lowercase();
        self.entries
            .iter()
            .filter(move |(name, _)| name.to_lowercase().contains(&needle))
            .map(|(name, entry)| (name.as_str(), entry))
    }
}
