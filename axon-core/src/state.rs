//! The State — the working set a handler reads and mutates during a run.

use crate::event::Event;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The handler-visible working set: a payload map and a string meta map.
///
/// A `State` has a single owner at any moment. The framework hands each
/// handler its own instance (cloned when handlers run in parallel) and
/// captures the returned state as the canonical post-run state for that
/// step. `Clone` is the deep-copy operation: `serde_json::Value` clones own
/// their entire tree, so mutations of a clone never leak into the original.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    data: HashMap<String, serde_json::Value>,
    meta: HashMap<String, String>,
}

impl State {
    /// Create an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a state seeded with the event's payload. Meta starts empty;
    /// routing headers belong to the event until a handler writes new ones.
    pub fn from_event(event: &Event) -> Self {
        Self {
            data: event.data.clone(),
            meta: HashMap::new(),
        }
    }

    // ── data map ─────────────────────────────────────────────────────────

    /// Read a payload value.
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// Write a payload value, overwriting any previous entry.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
        self.data.insert(key.into(), value.into());
    }

    /// Remove a payload value, returning it when present.
    pub fn remove(&mut self, key: &str) -> Option<serde_json::Value> {
        self.data.remove(key)
    }

    /// Payload keys, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    /// Borrow the whole payload map.
    pub fn data(&self) -> &HashMap<String, serde_json::Value> {
        &self.data
    }

    // ── meta map ─────────────────────────────────────────────────────────

    /// Read a meta header.
    pub fn get_meta(&self, key: &str) -> Option<&str> {
        self.meta.get(key).map(String::as_str)
    }

    /// Write a meta header, overwriting any previous entry.
    pub fn set_meta(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.meta.insert(key.into(), value.into());
    }

    /// Remove a meta header, returning it when present.
    pub fn remove_meta(&mut self, key: &str) -> Option<String> {
        self.meta.remove(key)
    }

    /// Meta keys, in no particular order.
    pub fn meta_keys(&self) -> impl Iterator<Item = &str> {
        self.meta.keys().map(String::as_str)
    }

    /// Borrow the whole meta map.
    pub fn meta(&self) -> &HashMap<String, String> {
        &self.meta
    }

    /// The `route` meta header, when present and non-empty.
    pub fn route(&self) -> Option<&str> {
        self.get_meta(crate::event::ROUTE_KEY).filter(|r| !r.is_empty())
    }

    // ── composition ──────────────────────────────────────────────────────

    /// Union another state into this one. Keys present in `other` win
    /// (last-writer-wins); both maps are merged.
    pub fn merge_from(&mut self, other: &State) {
        for (k, v) in &other.data {
            self.data.insert(k.clone(), v.clone());
        }
        for (k, v) in &other.meta {
            self.meta.insert(k.clone(), v.clone());
        }
    }

    /// Whether both maps are empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty() && self.meta.is_empty()
    }
}
