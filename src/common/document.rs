// src/common/document.rs

use alloc::borrow::ToOwned;
use alloc::string::String;
use alloc::vec::Vec;
use serde_json::{Map, Value};

/// A key path into the document, at most two levels of nesting deep.
///
/// Implemented for `&str`, `(&str, &str)` and `(&str, &str, &str)` only, so
/// the nesting depth is fixed by the call site instead of checked at
/// runtime. Writing through a path creates (or overwrites) intermediate
/// objects as needed.
pub trait EntryPath {
    fn lookup<'a>(&self, root: &'a Map<String, Value>) -> Option<&'a Value>;
    fn insert(&self, root: &mut Map<String, Value>, value: Value);
}

/// Returns the object stored under `key`, replacing any non-object value.
fn nested_object<'a>(root: &'a mut Map<String, Value>, key: &str) -> &'a mut Map<String, Value> {
    let slot = root
        .entry(key.to_owned())
        .or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    match slot {
        Value::Object(map) => map,
        _ => unreachable!(),
    }
}

impl<'p> EntryPath for &'p str {
    fn lookup<'a>(&self, root: &'a Map<String, Value>) -> Option<&'a Value> {
        root.get(*self)
    }

    fn insert(&self, root: &mut Map<String, Value>, value: Value) {
        root.insert((*self).to_owned(), value);
    }
}

impl<'p> EntryPath for (&'p str, &'p str) {
    fn lookup<'a>(&self, root: &'a Map<String, Value>) -> Option<&'a Value> {
        root.get(self.0)?.as_object()?.get(self.1)
    }

    fn insert(&self, root: &mut Map<String, Value>, value: Value) {
        nested_object(root, self.0).insert(self.1.to_owned(), value);
    }
}

impl<'p> EntryPath for (&'p str, &'p str, &'p str) {
    fn lookup<'a>(&self, root: &'a Map<String, Value>) -> Option<&'a Value> {
        root.get(self.0)?.as_object()?.get(self.1)?.as_object()?.get(self.2)
    }

    fn insert(&self, root: &mut Map<String, Value>, value: Value) {
        let inner = nested_object(root, self.0);
        nested_object(inner, self.1).insert(self.2.to_owned(), value);
    }
}

/// The structured request/response document.
///
/// One instance lives inside the driver and is reused for every exchange:
/// cleared when a request is started, populated by the caller, then replaced
/// wholesale by the deserialized response. Wire form is compact JSON.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NoteDocument {
    root: Map<String, Value>,
}

impl NoteDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empties the whole document.
    pub fn clear(&mut self) {
        self.root.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    pub fn set_str(&mut self, path: impl EntryPath, value: &str) {
        path.insert(&mut self.root, Value::String(value.to_owned()));
    }

    pub fn set_bool(&mut self, path: impl EntryPath, value: bool) {
        path.insert(&mut self.root, Value::Bool(value));
    }

    pub fn set_i32(&mut self, path: impl EntryPath, value: i32) {
        path.insert(&mut self.root, Value::from(i64::from(value)));
    }

    pub fn set_u32(&mut self, path: impl EntryPath, value: u32) {
        path.insert(&mut self.root, Value::from(u64::from(value)));
    }

    /// Non-finite values serialize as JSON `null`.
    pub fn set_f32(&mut self, path: impl EntryPath, value: f32) {
        path.insert(&mut self.root, Value::from(f64::from(value)));
    }

    pub fn has(&self, path: impl EntryPath) -> bool {
        path.lookup(&self.root).is_some()
    }

    /// Copies the string at `path` into `out`, NUL-terminated within
    /// capacity and truncated as needed. Returns the number of content bytes
    /// copied, or `None` (leaving `out` untouched) if the entry is absent or
    /// not a string.
    pub fn get_str(&self, path: impl EntryPath, out: &mut [u8]) -> Option<usize> {
        let text = path.lookup(&self.root)?.as_str()?;
        if out.is_empty() {
            return Some(0);
        }
        let copy = text.len().min(out.len() - 1);
        out[..copy].copy_from_slice(&text.as_bytes()[..copy]);
        out[copy] = 0;
        Some(copy)
    }

    pub fn get_bool(&self, path: impl EntryPath) -> Option<bool> {
        path.lookup(&self.root)?.as_bool()
    }

    pub fn get_i32(&self, path: impl EntryPath) -> Option<i32> {
        i32::try_from(path.lookup(&self.root)?.as_i64()?).ok()
    }

    pub fn get_u32(&self, path: impl EntryPath) -> Option<u32> {
        u32::try_from(path.lookup(&self.root)?.as_u64()?).ok()
    }

    pub fn get_f32(&self, path: impl EntryPath) -> Option<f32> {
        path.lookup(&self.root)?.as_f64().map(|v| v as f32)
    }

    /// Serializes the document as compact JSON.
    pub(crate) fn to_json(&self) -> Vec<u8> {
        serde_json::to_vec(&self.root).unwrap_or_default()
    }

    /// Replaces the document with the parse of `bytes`. A parse failure
    /// leaves the document empty and returns false.
    pub(crate) fn replace_from_json(&mut self, bytes: &[u8]) -> bool {
        match serde_json::from_slice::<Map<String, Value>>(bytes) {
            Ok(root) => {
                self.root = root;
                true
            }
            Err(_) => {
                self.root.clear();
                false
            }
        }
    }
}
