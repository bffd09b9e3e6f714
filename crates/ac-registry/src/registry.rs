//! `Registry<P>` — the ordered provider list every coordinator is built on.
//!
//! # Ordering
//!
//! Entries are kept sorted by `(priority desc, name asc, registration seq)`.
//! The sort runs whenever a provider is added; removal preserves the
//! relative order of the rest.  Priority and name are captured at
//! registration, so a provider changing its `priority()` later does not
//! reorder a live registry.
//!
//! # Isolation
//!
//! Every provider call goes through [`Registry::call`], which catches both
//! `Err` results and panics, logs them with the provider's identity, bumps the
//! entry's failure counter, and reports `None` to the caller.  No provider
//! failure escapes a registry.
//!
//! # Snapshots
//!
//! A dispatch pass first takes [`Registry::active_indices`] — a snapshot of
//! the dispatchable entries — and iterates that.  The pass holds `&mut self`
//! throughout, so the provider list cannot change underneath it; providers
//! that want to change it post a request on the context instead.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};

use ac_context::AgentContext;
use ac_core::{EpisodeEndReason, ProviderKind, ProviderSeq};
use ac_provider::{Provider, ProviderError, ProviderResult};
use tracing::{debug, warn};

use crate::{RegistryError, RegistryResult};

// ── Entry ─────────────────────────────────────────────────────────────────────

/// Initialization state of one registered provider.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum InitState {
    Uninitialized,
    Initialized,
    /// `validate` or `initialize` failed; skipped until retried.
    Failed,
}

struct Entry<P: ?Sized> {
    provider: Box<P>,
    name:     String,
    priority: i32,
    seq:      ProviderSeq,
    state:    InitState,
    /// Registry-level switch, independent of the provider's own `is_active`.
    enabled:  bool,
    failures: u32,
}

// ── Registry ──────────────────────────────────────────────────────────────────

pub struct Registry<P: ?Sized + Provider> {
    kind:        ProviderKind,
    entries:     Vec<Entry<P>>,
    next_seq:    ProviderSeq,
    initialized: bool,
}

impl<P: ?Sized + Provider> Registry<P> {
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            entries:     Vec::new(),
            next_seq:    ProviderSeq(0),
            initialized: false,
        }
    }

    pub fn kind(&self) -> ProviderKind {
        self.kind
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    // ── Registration ──────────────────────────────────────────────────────

    /// Add `provider`.  Duplicate names are rejected with a warning.
    ///
    /// If the registry has already been initialized, the newcomer is
    /// validated and initialized immediately (late joiner).
    pub fn register(&mut self, provider: Box<P>, ctx: &mut AgentContext) -> RegistryResult<()> {
        let name = provider.name().to_string();
        if self.contains(&name) {
            warn!(kind = %self.kind, provider = %name, "duplicate provider ignored");
            return Err(RegistryError::Duplicate { kind: self.kind, name });
        }

        let seq = self.next_seq;
        self.next_seq = seq.next();
        self.entries.push(Entry {
            priority: provider.priority(),
            provider,
            name,
            seq,
            state:    InitState::Uninitialized,
            enabled:  true,
            failures: 0,
        });
        self.sort();

        if self.initialized {
            if let Some(idx) = self.entries.iter().position(|e| e.seq == seq) {
                self.initialize_entry(idx, ctx);
            }
        }
        Ok(())
    }

    /// Remove the provider named `name`, returning it.  `None` if absent.
    pub fn unregister(&mut self, name: &str) -> Option<Box<P>> {
        let idx = self.index_of(name)?;
        let entry = self.entries.remove(idx);
        debug!(kind = %self.kind, provider = %entry.name, "provider unregistered");
        Some(entry.provider)
    }

    fn sort(&mut self) {
        self.entries.sort_by(|a, b| {
            b.priority
                .cmp(&a.priority)
                .then_with(|| a.name.cmp(&b.name))
                .then_with(|| a.seq.cmp(&b.seq))
        });
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    /// Validate and initialize every provider once.  Idempotent: a second
    /// call is a no-op.
    pub fn initialize(&mut self, ctx: &mut AgentContext) {
        if self.initialized {
            return;
        }
        for idx in 0..self.entries.len() {
            if self.entries[idx].state == InitState::Uninitialized {
                self.initialize_entry(idx, ctx);
            }
        }
        self.initialized = true;
        debug!(kind = %self.kind, providers = self.entries.len(), "registry initialized");
    }

    /// Give every `Failed` provider another validate + initialize attempt.
    /// Returns how many are now initialized.
    pub fn retry_failed(&mut self, ctx: &mut AgentContext) -> usize {
        let mut recovered = 0;
        for idx in 0..self.entries.len() {
            if self.entries[idx].state == InitState::Failed {
                self.initialize_entry(idx, ctx);
                if self.entries[idx].state == InitState::Initialized {
                    recovered += 1;
                }
            }
        }
        recovered
    }

    fn initialize_entry(&mut self, idx: usize, ctx: &mut AgentContext) {
        let validated = self.call(idx, "validate", |p| p.validate(ctx)).is_some();
        let ok = validated && self.call(idx, "initialize", |p| p.initialize(ctx)).is_some();
        self.entries[idx].state = if ok { InitState::Initialized } else { InitState::Failed };
    }

    /// Fan out `on_episode_begin` to every dispatchable provider.
    pub fn episode_begin(&mut self, ctx: &mut AgentContext) -> usize {
        self.dispatch("on_episode_begin", |p| p.on_episode_begin(ctx))
            .into_iter()
            .filter(|(_, r)| r.is_some())
            .count()
    }

    /// Fan out `on_episode_end` to every dispatchable provider.
    pub fn episode_end(&mut self, ctx: &mut AgentContext, reason: EpisodeEndReason) -> usize {
        self.dispatch("on_episode_end", |p| p.on_episode_end(ctx, reason))
            .into_iter()
            .filter(|(_, r)| r.is_some())
            .count()
    }

    /// Fan out `update` to every dispatchable provider.
    pub fn update(&mut self, ctx: &mut AgentContext, delta_secs: f32) -> usize {
        self.dispatch("update", |p| p.update(ctx, delta_secs))
            .into_iter()
            .filter(|(_, r)| r.is_some())
            .count()
    }

    // ── Dispatch ──────────────────────────────────────────────────────────

    /// `true` if the entry at `idx` takes part in dispatch: initialized,
    /// enabled at registry level, and reporting itself active.
    pub fn is_dispatchable(&self, idx: usize) -> bool {
        self.entries.get(idx).is_some_and(|e| {
            e.state == InitState::Initialized && e.enabled && e.provider.is_active()
        })
    }

    /// Snapshot of dispatchable entry indices, in dispatch order.
    pub fn active_indices(&self) -> Vec<usize> {
        (0..self.entries.len()).filter(|&i| self.is_dispatchable(i)).collect()
    }

    /// Invoke `f` on the provider at `idx`, isolating errors and panics.
    ///
    /// Returns `None` if the index is out of range or the call failed; the
    /// failure is logged with the provider's name and counted.
    pub fn call<T>(
        &mut self,
        idx: usize,
        op:  &'static str,
        f:   impl FnOnce(&mut P) -> ProviderResult<T>,
    ) -> Option<T> {
        let kind = self.kind;
        let entry = self.entries.get_mut(idx)?;
        let provider = &mut *entry.provider;
        let result = match catch_unwind(AssertUnwindSafe(|| f(provider))) {
            Ok(r) => r,
            Err(payload) => Err(ProviderError::Panicked(panic_message(payload.as_ref()))),
        };
        match result {
            Ok(value) => Some(value),
            Err(error) => {
                entry.failures += 1;
                warn!(%kind, provider = %entry.name, op, %error, "provider call failed");
                None
            }
        }
    }

    /// Call `f` on every dispatchable provider in order.
    ///
    /// Returns `(index, result)` pairs; `None` marks a failed call.
    pub fn dispatch<T>(
        &mut self,
        op:    &'static str,
        mut f: impl FnMut(&mut P) -> ProviderResult<T>,
    ) -> Vec<(usize, Option<T>)> {
        self.active_indices()
            .into_iter()
            .map(|idx| (idx, self.call(idx, op, &mut f)))
            .collect()
    }

    // ── Introspection ─────────────────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index_of(name).is_some()
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.name == name)
    }

    /// Provider names in dispatch order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn name_at(&self, idx: usize) -> Option<&str> {
        self.entries.get(idx).map(|e| e.name.as_str())
    }

    pub fn priority_at(&self, idx: usize) -> Option<i32> {
        self.entries.get(idx).map(|e| e.priority)
    }

    pub fn seq_at(&self, idx: usize) -> Option<ProviderSeq> {
        self.entries.get(idx).map(|e| e.seq)
    }

    pub fn provider_at(&self, idx: usize) -> Option<&P> {
        self.entries.get(idx).map(|e| &*e.provider)
    }

    pub fn get(&self, name: &str) -> Option<&P> {
        self.index_of(name).and_then(|i| self.provider_at(i))
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut P> {
        let idx = self.index_of(name)?;
        Some(&mut *self.entries[idx].provider)
    }

    pub fn state(&self, name: &str) -> Option<InitState> {
        self.index_of(name).map(|i| self.entries[i].state)
    }

    /// Number of failed calls recorded for `name` since registration.
    pub fn failure_count(&self, name: &str) -> Option<u32> {
        self.index_of(name).map(|i| self.entries[i].failures)
    }

    /// Switch a provider on or off at registry level.  Returns `false` if
    /// `name` is not registered.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> bool {
        match self.index_of(name) {
            Some(i) => {
                self.entries[i].enabled = enabled;
                true
            }
            None => false,
        }
    }

    pub fn is_enabled(&self, name: &str) -> Option<bool> {
        self.index_of(name).map(|i| self.entries[i].enabled)
    }
}

/// Best-effort text from a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
