use crate::content::{Topic, normalize_title};
use crate::store::artifact_stem;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::warn;

// Keys owned by WorkItem; a topic's free-form extras must not shadow them.
const RESERVED_KEYS: [&str; 8] = [
    "guideline_done",
    "article_done",
    "images_done",
    "guideline_path",
    "article_path",
    "images",
    "stem",
    "updated_at",
];

/// A topic plus its three-stage completion state and artifact references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    #[serde(flatten)]
    pub topic: Topic,
    #[serde(default)]
    pub guideline_done: bool,
    #[serde(default)]
    pub article_done: bool,
    #[serde(default)]
    pub images_done: bool,
    #[serde(default)]
    pub guideline_path: Option<PathBuf>,
    #[serde(default)]
    pub article_path: Option<PathBuf>,
    #[serde(default)]
    pub images: Vec<PathBuf>,
    /// File stem shared by every artifact of this item.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stem: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl WorkItem {
    /// A fully incomplete item.
    pub fn new(mut topic: Topic) -> Self {
        topic.title = topic.title.trim().to_string();
        topic.extra.retain(|k, _| !RESERVED_KEYS.contains(&k.as_str()));
        Self {
            topic,
            guideline_done: false,
            article_done: false,
            images_done: false,
            guideline_path: None,
            article_path: None,
            images: Vec::new(),
            stem: None,
            updated_at: None,
        }
    }

    pub fn title(&self) -> &str {
        &self.topic.title
    }

    pub fn normalized_title(&self) -> String {
        self.topic.normalized_title()
    }

    pub fn is_complete(&self) -> bool {
        self.guideline_done && self.article_done && self.images_done
    }

    /// Later flags never run ahead of earlier ones.
    pub fn is_consistent(&self) -> bool {
        (!self.article_done || self.guideline_done) && (!self.images_done || self.article_done)
    }

    /// Clear any flag whose predecessor is unset. Returns true if anything
    /// changed.
    fn repair(&mut self) -> bool {
        let before = (self.article_done, self.images_done);
        if !self.guideline_done {
            self.article_done = false;
        }
        if !self.article_done {
            self.images_done = false;
        }
        before != (self.article_done, self.images_done)
    }

    pub(crate) fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }
}

/// Ordered work items, unique by normalized title.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TrackerState {
    items: Vec<WorkItem>,
}

impl TrackerState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build state from persisted items: duplicate or untitled items are
    /// dropped (first occurrence wins), inconsistent flags are repaired and
    /// missing artifact stems are assigned.
    pub fn from_items(items: Vec<WorkItem>) -> Self {
        let mut state = Self::new();
        let mut seen = HashSet::new();
        for mut item in items {
            let key = item.normalized_title();
            if key.is_empty() || !seen.insert(key) {
                warn!("dropping duplicate or untitled work item '{}'", item.title());
                continue;
            }
            if item.repair() {
                warn!("repaired out-of-order completion flags for '{}'", item.title());
            }
            state.items.push(item);
        }
        for idx in 0..state.items.len() {
            if state.items[idx].stem.is_none() {
                let stem = state.stem_for(&state.items[idx].normalized_title());
                state.items[idx].stem = Some(stem);
            }
        }
        state
    }

    pub fn items(&self) -> &[WorkItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<&WorkItem> {
        self.items.get(idx)
    }

    pub(crate) fn get_mut(&mut self, idx: usize) -> Option<&mut WorkItem> {
        self.items.get_mut(idx)
    }

    pub fn contains(&self, title: &str) -> bool {
        let key = normalize_title(title);
        self.items.iter().any(|i| i.normalized_title() == key)
    }

    pub fn normalized_titles(&self) -> Vec<String> {
        self.items.iter().map(WorkItem::normalized_title).collect()
    }

    /// Indices of items with at least one stage outstanding, in order.
    pub fn incomplete(&self) -> Vec<usize> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, item)| !item.is_complete())
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Append a fresh, fully incomplete item. `None` when the title is blank
    /// or already tracked.
    pub fn push(&mut self, topic: Topic) -> Option<usize> {
        let key = topic.normalized_title();
        if key.is_empty() || self.contains(&key) {
            return None;
        }
        let mut item = WorkItem::new(topic);
        item.stem = Some(self.stem_for(&key));
        item.touch();
        self.items.push(item);
        Some(self.items.len() - 1)
    }

    fn stem_for(&self, normalized_title: &str) -> String {
        artifact_stem(normalized_title, |candidate| {
            self.items
                .iter()
                .any(|i| i.stem.as_deref() == Some(candidate))
        })
    }
}

impl<'de> Deserialize<'de> for TrackerState {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        Vec::<WorkItem>::deserialize(d).map(Self::from_items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn push_rejects_blank_and_duplicate_titles() {
        let mut state = TrackerState::new();
        assert_eq!(state.push(Topic::new("Top 5 Solar Myths", "solar myths")), Some(0));
        assert_eq!(state.push(Topic::new("  top 5 solar MYTHS ", "")), None);
        assert_eq!(state.push(Topic::new("   ", "")), None);
        assert_eq!(state.len(), 1);
        assert_eq!(state.incomplete(), vec![0]);
    }

    #[test]
    fn stems_are_unique() {
        let mut state = TrackerState::new();
        state.push(Topic::new("Solar", "")).unwrap();
        state.push(Topic::new("Solar!", "")).unwrap();

        let stems: Vec<_> = state.items().iter().map(|i| i.stem.clone().unwrap()).collect();
        assert_eq!(stems[0], "solar");
        assert_ne!(stems[0], stems[1]);
    }

    #[test]
    fn serializes_flat() {
        let mut state = TrackerState::new();
        state.push(Topic::new("Top 5 Solar Myths", "solar myths")).unwrap();
        let value = serde_json::to_value(&state).unwrap();

        let item = &value[0];
        assert_eq!(item["title"], "Top 5 Solar Myths");
        assert_eq!(item["keyword"], "solar myths");
        assert_eq!(item["guideline_done"], false);
        assert_eq!(item["images"], json!([]));
        assert_eq!(item["stem"], "top_5_solar_myths");
    }

    #[test]
    fn load_repairs_and_dedupes() {
        let state: TrackerState = serde_json::from_value(json!([
            {"title": "A", "guideline_done": false, "article_done": true, "images_done": true},
            {"title": "a", "guideline_done": true},
            {"title": "B", "primary_keyword": "b", "guideline_done": true, "article_done": true,
             "images_done": true, "priority_note": "keep me"}
        ]))
        .unwrap();

        assert_eq!(state.len(), 2);
        let a = state.get(0).unwrap();
        assert!(!a.guideline_done && !a.article_done && !a.images_done);
        assert_eq!(a.stem.as_deref(), Some("a"));

        let b = state.get(1).unwrap();
        assert!(b.is_complete());
        assert_eq!(b.topic.keyword, "b");
        assert_eq!(b.topic.extra["priority_note"], "keep me");
        assert!(!b.topic.extra.contains_key("guideline_done"));
        assert_eq!(state.incomplete(), vec![0]);
    }

    #[test]
    fn reserved_keys_are_stripped_from_topics() {
        let mut topic = Topic::new("T", "");
        topic.extra.insert("images_done".into(), json!(true));
        let item = WorkItem::new(topic);
        assert!(item.topic.extra.is_empty());
        assert!(!item.images_done);
    }

    #[test]
    fn consistency() {
        let mut item = WorkItem::new(Topic::new("T", ""));
        assert!(item.is_consistent());
        item.images_done = true;
        assert!(!item.is_consistent());
        assert!(item.repair());
        assert!(item.is_consistent());
    }
}
