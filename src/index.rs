//! Derived language/tag buckets over the cache contents, maintained
//! incrementally so every keystroke-driven cache change stays cheap.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::model::{GistId, GistRecord};

#[derive(Debug, Default)]
pub struct LangTagIndex {
    by_language: HashMap<String, HashSet<GistId>>,
    by_tag: HashMap<String, HashSet<GistId>>,
}

impl LangTagIndex {
    /// Record an upsert. Only buckets whose membership actually changes are
    /// touched: cost is O(changed buckets), never O(total gists).
    pub fn apply_upsert(&mut self, old: Option<&GistRecord>, new: &GistRecord) {
        let id = &new.id;

        let old_lang = old.map(|r| r.primary_language().to_string());
        let new_lang = new.primary_language().to_string();
        if old_lang.as_deref() != Some(new_lang.as_str()) {
            if let Some(lang) = old_lang {
                remove_from_bucket(&mut self.by_language, &lang, id);
            }
            self.by_language
                .entry(new_lang)
                .or_default()
                .insert(id.clone());
        }

        let empty = BTreeSet::new();
        let old_tags = old.map(|r| &r.tags).unwrap_or(&empty);
        for tag in old_tags.difference(&new.tags) {
            remove_from_bucket(&mut self.by_tag, tag, id);
        }
        for tag in new.tags.difference(old_tags) {
            self.by_tag.entry(tag.clone()).or_default().insert(id.clone());
        }
    }

    /// Strip a removed record's id from the buckets it occupied.
    pub fn apply_remove(&mut self, record: &GistRecord) {
        remove_from_bucket(&mut self.by_language, record.primary_language(), &record.id);
        for tag in &record.tags {
            remove_from_bucket(&mut self.by_tag, tag, &record.id);
        }
    }

    /// Rewrite an identity in place (create confirmation swaps the temp id
    /// for the remote one without the record leaving its buckets).
    pub fn apply_replace_id(&mut self, old: &GistId, new: &GistId) {
        for bucket in self.by_language.values_mut().chain(self.by_tag.values_mut()) {
            if bucket.remove(old) {
                bucket.insert(new.clone());
            }
        }
    }

    pub fn by_language(&self, language: &str) -> HashSet<GistId> {
        self.by_language.get(language).cloned().unwrap_or_default()
    }

    pub fn by_tag(&self, tag: &str) -> HashSet<GistId> {
        self.by_tag.get(tag).cloned().unwrap_or_default()
    }

    /// Non-empty language buckets with counts, count descending then name
    /// ascending.
    pub fn all_languages(&self) -> Vec<(String, usize)> {
        sorted_counts(&self.by_language)
    }

    pub fn all_tags(&self) -> Vec<(String, usize)> {
        sorted_counts(&self.by_tag)
    }

    pub fn clear(&mut self) {
        self.by_language.clear();
        self.by_tag.clear();
    }
}

fn remove_from_bucket(buckets: &mut HashMap<String, HashSet<GistId>>, key: &str, id: &GistId) {
    if let Some(bucket) = buckets.get_mut(key) {
        bucket.remove(id);
        if bucket.is_empty() {
            buckets.remove(key);
        }
    }
}

fn sorted_counts(buckets: &HashMap<String, HashSet<GistId>>) -> Vec<(String, usize)> {
    let mut out: Vec<(String, usize)> = buckets
        .iter()
        .filter(|(_, ids)| !ids.is_empty())
        .map(|(k, ids)| (k.clone(), ids.len()))
        .collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out
}
