use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::VideoId;
use crate::summarize::DetailLevel;

/// Maximum number of entries kept; the oldest fall off the end
pub const HISTORY_CAP: usize = 20;

/// One completed summarization
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub video_id: VideoId,
    pub url: String,
    pub timestamp: DateTime<Utc>,
    pub level: DetailLevel,
    pub title: String,
    pub is_favorite: bool,
}

/// Session history, newest first. Eviction is purely positional, favorites included.
#[derive(Debug, Clone, Default)]
pub struct HistoryStore {
    entries: VecDeque<HistoryEntry>,
}

impl HistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: HistoryEntry) {
        self.entries.push_front(entry);
        self.entries.truncate(HISTORY_CAP);
    }

    pub fn toggle_favorite(&mut self, index: usize) {
        if let Some(entry) = self.entries.get_mut(index) {
            entry.is_favorite = !entry.is_favorite;
        }
    }

    pub fn remove(&mut self, index: usize) {
        self.entries.remove(index);
    }

    /// Callers are expected to have confirmed with the user first
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn get(&self, index: usize) -> Option<&HistoryEntry> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
