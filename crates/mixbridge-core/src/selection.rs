//! Selection state tracker.
//!
//! Records which strip/plugin is the addressee of selected-strip
//! commands. Two selection flavors exist: GUI selection (the
//! workstation's own selected strip) and local expansion (a
//! surface-side override). GUI selection always wins; disabling an
//! expansion reverts to GUI selection.
//!
//! One mutex guards both the state and listener dispatch; listener
//! callbacks run synchronously under the lock and must not re-enter
//! the tracker.

use std::sync::Mutex;
use std::time::SystemTime;

use crate::error::{Error, Result};
use crate::model::Ssid;

/// How the current strip came to be selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionMode {
    /// Selected in the workstation GUI (or via `select/strip`).
    GuiSelection,
    /// Expanded locally on the surface, overriding nothing in the GUI.
    LocalExpansion,
}

impl SelectionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SelectionMode::GuiSelection => "gui_selection",
            SelectionMode::LocalExpansion => "local_expansion",
        }
    }
}

/// The tracked selection state.
///
/// `plugin_id` is only meaningful while `strip_id` is set; any strip
/// change clears it.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionState {
    pub strip_id: Option<Ssid>,
    pub plugin_id: Option<usize>,
    pub mode: SelectionMode,
    pub expanded: bool,
    pub last_updated: SystemTime,
}

impl SelectionState {
    fn initial() -> Self {
        Self {
            strip_id: None,
            plugin_id: None,
            mode: SelectionMode::GuiSelection,
            expanded: false,
            last_updated: SystemTime::now(),
        }
    }

    /// A selection is valid once a strip is set.
    pub fn is_valid(&self) -> bool {
        self.strip_id.is_some()
    }
}

impl Default for SelectionState {
    fn default() -> Self {
        Self::initial()
    }
}

/// Callback receiving (old state, new state) on every change.
pub type SelectionListener = Box<dyn Fn(&SelectionState, &SelectionState) + Send>;

struct TrackerInner {
    state: SelectionState,
    listeners: Vec<SelectionListener>,
}

/// Mutex-guarded selection state machine with synchronous listener
/// fan-out.
pub struct SelectionTracker {
    inner: Mutex<TrackerInner>,
}

impl Default for SelectionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(TrackerInner {
                state: SelectionState::initial(),
                listeners: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TrackerInner> {
        self.inner.lock().expect("selection tracker lock poisoned")
    }

    /// Apply a mutation and fan out to listeners before returning.
    fn mutate<F>(&self, f: F) -> Result<SelectionState>
    where
        F: FnOnce(&mut SelectionState) -> Result<()>,
    {
        let mut inner = self.lock();
        let old = inner.state.clone();
        f(&mut inner.state)?;
        inner.state.last_updated = SystemTime::now();
        let new = inner.state.clone();
        for listener in &inner.listeners {
            listener(&old, &new);
        }
        Ok(new)
    }

    /// GUI-select a strip. Always wins over local expansion; clears
    /// the plugin selection iff the strip changed.
    pub fn select_strip(&self, ssid: Ssid) -> Result<SelectionState> {
        self.mutate(|state| {
            if state.strip_id != Some(ssid) {
                state.plugin_id = None;
            }
            state.strip_id = Some(ssid);
            state.mode = SelectionMode::GuiSelection;
            state.expanded = true;
            log::debug!("strip {} selected (gui)", ssid);
            Ok(())
        })
    }

    /// Locally expand a strip, or revert to GUI selection when
    /// `expanded` is false (the strip id is ignored on contraction).
    pub fn expand_strip(&self, ssid: Ssid, expanded: bool) -> Result<SelectionState> {
        self.mutate(|state| {
            if expanded {
                if state.strip_id != Some(ssid) {
                    state.plugin_id = None;
                }
                state.strip_id = Some(ssid);
                state.mode = SelectionMode::LocalExpansion;
                state.expanded = true;
                log::debug!("strip {} expanded (local)", ssid);
            } else {
                state.mode = SelectionMode::GuiSelection;
                state.expanded = false;
                log::debug!("expansion disabled, reverting to gui selection");
            }
            Ok(())
        })
    }

    /// Select a plugin on the current strip, or on an explicitly given
    /// one. Fails with [`Error::NoStripSelected`] when neither yields
    /// a strip, leaving the state untouched.
    pub fn select_plugin(&self, plugin_id: usize, strip: Option<Ssid>) -> Result<SelectionState> {
        self.mutate(|state| {
            let target = strip.or(state.strip_id).ok_or(Error::NoStripSelected)?;
            if state.strip_id != Some(target) {
                // Adopting a new strip is a GUI selection.
                state.strip_id = Some(target);
                state.mode = SelectionMode::GuiSelection;
                state.expanded = true;
            }
            state.plugin_id = Some(plugin_id);
            log::debug!("plugin {} selected on strip {}", plugin_id, target);
            Ok(())
        })
    }

    /// Move the plugin selection by a delta, floored at 0. Fails if
    /// no strip is selected.
    pub fn select_plugin_delta(&self, delta: i32) -> Result<SelectionState> {
        self.mutate(|state| {
            if state.strip_id.is_none() {
                return Err(Error::NoStripSelected);
            }
            let current = state.plugin_id.unwrap_or(0) as i32;
            state.plugin_id = Some((current + delta).max(0) as usize);
            Ok(())
        })
    }

    /// Back to the initial state.
    pub fn clear(&self) -> SelectionState {
        self.mutate(|state| {
            *state = SelectionState::initial();
            Ok(())
        })
        .expect("clear cannot fail")
    }

    /// Current state snapshot.
    pub fn snapshot(&self) -> SelectionState {
        self.lock().state.clone()
    }

    /// Register a change listener. Callbacks run under the tracker's
    /// lock and must not call back into it.
    pub fn add_listener(&self, listener: SelectionListener) {
        self.lock().listeners.push(listener);
    }
}

impl std::fmt::Debug for SelectionTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("SelectionTracker")
            .field("state", &inner.state)
            .field("listeners", &inner.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_gui_selection_overrides_expansion() {
        let tracker = SelectionTracker::new();
        tracker.expand_strip(Ssid::new(5), true).unwrap();
        let state = tracker.select_strip(Ssid::new(7)).unwrap();
        assert_eq!(state.strip_id, Some(Ssid::new(7)));
        assert_eq!(state.mode, SelectionMode::GuiSelection);
        assert!(state.expanded);
    }

    #[test]
    fn test_strip_change_clears_plugin() {
        let tracker = SelectionTracker::new();
        tracker.select_strip(Ssid::new(2)).unwrap();
        tracker.select_plugin(3, None).unwrap();
        assert_eq!(tracker.snapshot().plugin_id, Some(3));

        // Re-selecting the same strip keeps the plugin.
        tracker.select_strip(Ssid::new(2)).unwrap();
        assert_eq!(tracker.snapshot().plugin_id, Some(3));

        // A different strip clears it.
        let state = tracker.select_strip(Ssid::new(4)).unwrap();
        assert_eq!(state.plugin_id, None);
    }

    #[test]
    fn test_contract_reverts_to_gui_selection() {
        let tracker = SelectionTracker::new();
        tracker.expand_strip(Ssid::new(5), true).unwrap();
        // The id on contraction is irrelevant.
        let state = tracker.expand_strip(Ssid::new(99), false).unwrap();
        assert_eq!(state.mode, SelectionMode::GuiSelection);
        assert!(!state.expanded);
        // The strip itself stays.
        assert_eq!(state.strip_id, Some(Ssid::new(5)));
    }

    #[test]
    fn test_plugin_guard_without_strip() {
        let tracker = SelectionTracker::new();
        assert!(matches!(
            tracker.select_plugin(0, None),
            Err(Error::NoStripSelected)
        ));
        assert!(matches!(
            tracker.select_plugin_delta(1),
            Err(Error::NoStripSelected)
        ));
        // Failed transitions leave the state untouched.
        let state = tracker.snapshot();
        assert_eq!(state.strip_id, None);
        assert_eq!(state.plugin_id, None);
        assert!(!state.expanded);
    }

    #[test]
    fn test_plugin_delta_floors_at_zero() {
        let tracker = SelectionTracker::new();
        tracker.select_strip(Ssid::new(2)).unwrap();
        let state = tracker.select_plugin_delta(-5).unwrap();
        assert_eq!(state.plugin_id, Some(0));
        let state = tracker.select_plugin_delta(3).unwrap();
        assert_eq!(state.plugin_id, Some(3));
    }

    #[test]
    fn test_select_plugin_with_explicit_strip() {
        let tracker = SelectionTracker::new();
        let state = tracker.select_plugin(1, Some(Ssid::new(9))).unwrap();
        assert_eq!(state.strip_id, Some(Ssid::new(9)));
        assert_eq!(state.plugin_id, Some(1));
        assert_eq!(state.mode, SelectionMode::GuiSelection);
    }

    #[test]
    fn test_listeners_fire_synchronously() {
        let tracker = SelectionTracker::new();
        let count = Arc::new(AtomicUsize::new(0));
        let listener_count = Arc::clone(&count);
        tracker.add_listener(Box::new(move |_old, _new| {
            listener_count.fetch_add(1, Ordering::SeqCst);
        }));

        tracker.select_strip(Ssid::new(1)).unwrap();
        tracker.clear();
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_clear_resets() {
        let tracker = SelectionTracker::new();
        tracker.select_strip(Ssid::new(3)).unwrap();
        tracker.select_plugin(1, None).unwrap();
        let state = tracker.clear();
        assert!(!state.is_valid());
        assert_eq!(state.plugin_id, None);
    }
}
