//! String-keyed, type-erased shared data.
//!
//! # Design
//!
//! Each entry is a `Box<dyn Any>` in a `BTreeMap<String, …>`.  Keys are
//! unique and writes are last-write-wins, replacing the value and its type.
//! A `BTreeMap` keeps [`SharedData::keys`] in a stable order so anything that
//! iterates it (debug dumps, statistics) is reproducible between runs.
//!
//! Reads with the wrong type return `None` rather than panicking: providers
//! written by different authors must not be able to crash each other through a
//! key collision.
//!
//! # Usage
//!
//! ```rust
//! use ac_context::SharedData;
//!
//! let mut data = SharedData::new();
//! data.set("target_distance", 4.5_f32);
//! assert_eq!(data.get::<f32>("target_distance"), Some(&4.5));
//! assert_eq!(data.get::<u32>("target_distance"), None);
//! ```

use std::any::Any;
use std::collections::BTreeMap;

#[derive(Default)]
pub struct SharedData {
    values: BTreeMap<String, Box<dyn Any>>,
}

impl SharedData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under `key`, replacing any previous entry of any type.
    pub fn set<T: 'static>(&mut self, key: impl Into<String>, value: T) {
        self.values.insert(key.into(), Box::new(value));
    }

    /// Shared reference to the value under `key` if it exists and is a `T`.
    pub fn get<T: 'static>(&self, key: &str) -> Option<&T> {
        self.values.get(key)?.downcast_ref::<T>()
    }

    /// Mutable reference to the value under `key` if it exists and is a `T`.
    pub fn get_mut<T: 'static>(&mut self, key: &str) -> Option<&mut T> {
        self.values.get_mut(key)?.downcast_mut::<T>()
    }

    /// Copy out the value under `key`, or `default` if absent or mistyped.
    pub fn get_or<T: Copy + 'static>(&self, key: &str, default: T) -> T {
        self.get::<T>(key).copied().unwrap_or(default)
    }

    /// Remove and return the value under `key`.
    ///
    /// If the stored value is not a `T` the entry is left in place and `None`
    /// is returned.
    pub fn remove<T: 'static>(&mut self, key: &str) -> Option<T> {
        if !self.contains_typed::<T>(key) {
            return None;
        }
        self.values
            .remove(key)
            .and_then(|b| b.downcast::<T>().ok())
            .map(|b| *b)
    }

    /// `true` if any value is stored under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// `true` if a `T` is stored under `key`.
    pub fn contains_typed<T: 'static>(&self, key: &str) -> bool {
        self.values.get(key).is_some_and(|v| v.is::<T>())
    }

    /// Keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}
