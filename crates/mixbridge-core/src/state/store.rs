//! The feedback store: everything the listener has learned from the
//! surface, behind one mutex.
//!
//! The listener thread is the sole writer; discovery and HTTP callers
//! only read, except for the explicit clears before a discovery pass.
//! A condvar is notified on every write so waiters can re-check their
//! predicate as soon as data (or the end-of-list sentinel) arrives
//! instead of sleeping out a fixed poll window.
//!
//! "Done enough to answer" is a quiescence heuristic: a bucket is
//! settled once it is non-empty and a quiet window has elapsed since
//! its FIRST write after the last clear. This is a fixed settle time,
//! not an idle debounce; the strip enumeration additionally has an
//! explicit terminator that completes it immediately.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

use rosc::OscType;

use crate::classify::{Classified, SelectionEvent};
use crate::model::{PluginInfo, PluginParameter, Ssid, StripInfo, StripSummary};

/// Condvar re-check granularity for waiters.
const WAIT_TICK: Duration = Duration::from_millis(100);

/// First/last write timestamps for one feedback bucket.
#[derive(Debug, Clone, Copy, Default)]
struct BucketClock {
    first_write: Option<Instant>,
    last_write: Option<Instant>,
}

impl BucketClock {
    fn touch(&mut self) {
        let now = Instant::now();
        self.first_write.get_or_insert(now);
        self.last_write = Some(now);
    }

    fn clear(&mut self) {
        self.first_write = None;
        self.last_write = None;
    }

    /// Quiet window elapsed since the first write.
    fn settled(&self, quiet: Duration) -> bool {
        match self.first_write {
            Some(first) => first.elapsed() >= quiet,
            None => false,
        }
    }
}

/// Which (strip, plugin) the selected-plugin feedback applies to.
///
/// Parameter descriptors arrive on `select/plugin/parameter` with no
/// embedded strip or plugin id; they describe whatever was selected
/// when the query went out. Discovery pins this before emitting, and
/// selection feedback keeps it current in between.
#[derive(Debug, Clone, Copy, Default)]
struct FeedbackTarget {
    ssid: Option<Ssid>,
    plugin: Option<usize>,
}

#[derive(Debug, Default)]
struct StoreInner {
    strips: BTreeMap<Ssid, StripInfo>,
    plugins: HashMap<Ssid, Vec<PluginInfo>>,
    target: FeedbackTarget,
    strips_clock: BucketClock,
    plugins_clock: BucketClock,
    params_clock: BucketClock,
    enumeration_complete: bool,
}

impl StoreInner {
    fn plugin_mut(&mut self, ssid: Ssid, plugin_id: usize) -> &mut PluginInfo {
        let chain = self.plugins.entry(ssid).or_default();
        while chain.len() <= plugin_id {
            let id = chain.len();
            chain.push(PluginInfo::new(ssid, id));
        }
        &mut chain[plugin_id]
    }

    fn target_ids(&self) -> Option<(Ssid, usize)> {
        Some((self.target.ssid?, self.target.plugin?))
    }

    fn apply_strip_property(&mut self, ssid: Ssid, property: &str, value: &OscType) {
        let strip = self
            .strips
            .entry(ssid)
            .or_insert_with(|| StripInfo::placeholder(ssid));
        match property {
            "name" => {
                if let Some(name) = value_as_string(value) {
                    strip.name = name;
                }
            }
            "mute" => {
                if let Some(v) = value_as_f64(value) {
                    strip.muted = v != 0.0;
                }
            }
            "solo" => {
                if let Some(v) = value_as_f64(value) {
                    strip.soloed = v != 0.0;
                }
            }
            // Gain, fader, pan, sends, monitoring and the rest of the
            // per-strip controls are acknowledged but not modeled; the
            // write still counts for the settle clock.
            other => {
                log::debug!("[FEEDBACK] strip {} property {} = {:?}", ssid, other, value);
            }
        }
        self.strips_clock.touch();
    }

    fn apply(&mut self, event: &Classified) {
        match event {
            Classified::StripProperty { ssid, property, value } => {
                self.apply_strip_property(*ssid, property, value);
            }
            Classified::StripDescriptor(strip) => {
                // Descriptors are complete, so replace wholesale.
                self.strips.insert(strip.id, strip.clone());
                self.strips_clock.touch();
            }
            Classified::PluginEntry { ssid, plugin_id, name, enabled } => {
                let plugin = self.plugin_mut(*ssid, *plugin_id);
                plugin.name = name.clone();
                plugin.enabled = *enabled;
                self.plugins_clock.touch();
            }
            Classified::PluginParamDescriptor { param_id, name, value, min, max, unit } => {
                let Some((ssid, plugin_id)) = self.target_ids() else {
                    log::debug!("[FEEDBACK] parameter {} with no selection target", param_id);
                    return;
                };
                let param = PluginParameter::from_feedback(
                    *param_id,
                    name.clone(),
                    *value,
                    *min,
                    *max,
                    unit.clone(),
                );
                let plugin = self.plugin_mut(ssid, plugin_id);
                match plugin.parameters.iter_mut().find(|p| p.id == *param_id) {
                    Some(existing) => *existing = param,
                    None => plugin.parameters.push(param),
                }
                self.params_clock.touch();
            }
            Classified::PluginParamValue { param_id, value } => {
                let Some((ssid, plugin_id)) = self.target_ids() else {
                    return;
                };
                let mut touched = false;
                let plugin = self.plugin_mut(ssid, plugin_id);
                if let Some(param) = plugin.parameters.iter_mut().find(|p| p.id == *param_id) {
                    param.value = *value;
                    touched = true;
                }
                if touched {
                    self.params_clock.touch();
                }
            }
            Classified::Selection(sel) => self.apply_selection(sel),
            Classified::EndOfList { framerate, frames } => {
                log::debug!(
                    "[FEEDBACK] end of strip list (framerate={:?}, frames={:?})",
                    framerate,
                    frames
                );
                self.enumeration_complete = true;
            }
            Classified::Unclassified => {}
        }
    }

    fn apply_selection(&mut self, sel: &SelectionEvent) {
        match sel {
            SelectionEvent::StripSelected(ssid) => {
                if self.target.ssid != Some(*ssid) {
                    self.target.plugin = None;
                }
                self.target.ssid = Some(*ssid);
            }
            SelectionEvent::PluginSelected(id) => {
                self.target.plugin = Some(*id);
            }
            SelectionEvent::PluginName(name) => {
                if let Some((ssid, plugin_id)) = self.target_ids() {
                    self.plugin_mut(ssid, plugin_id).name = name.clone();
                    self.plugins_clock.touch();
                }
            }
            SelectionEvent::PluginActivated(on) => {
                if let Some((ssid, plugin_id)) = self.target_ids() {
                    self.plugin_mut(ssid, plugin_id).enabled = *on;
                    self.plugins_clock.touch();
                }
            }
        }
    }
}

fn value_as_f64(value: &OscType) -> Option<f64> {
    match value {
        OscType::Float(v) => Some(*v as f64),
        OscType::Double(v) => Some(*v),
        OscType::Int(v) => Some(*v as f64),
        OscType::Long(v) => Some(*v as f64),
        OscType::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn value_as_string(value: &OscType) -> Option<String> {
    match value {
        OscType::String(s) => Some(s.clone()),
        _ => None,
    }
}

/// Lock-protected store of everything learned from feedback.
///
/// Clone shares the underlying state; hand one to the listener and
/// keep another for readers. (Internally it is the usual Arc-wrapped
/// mutex-and-condvar pair.)
#[derive(Clone)]
pub struct FeedbackStore {
    shared: std::sync::Arc<Shared>,
}

struct Shared {
    inner: Mutex<StoreInner>,
    cond: Condvar,
}

impl Default for FeedbackStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedbackStore {
    pub fn new() -> Self {
        Self {
            shared: std::sync::Arc::new(Shared {
                inner: Mutex::new(StoreInner::default()),
                cond: Condvar::new(),
            }),
        }
    }

    /// Fold one classified event into the store and wake waiters.
    /// Called from the listener thread only.
    pub fn apply(&self, event: &Classified) {
        let mut inner = self.lock();
        inner.apply(event);
        drop(inner);
        self.shared.cond.notify_all();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreInner> {
        self.shared.inner.lock().expect("feedback store lock poisoned")
    }

    /// Pin which (strip, plugin) subsequent selected-plugin feedback
    /// belongs to. Discovery calls this before emitting a parameter
    /// query.
    pub fn set_target(&self, ssid: Ssid, plugin: usize) {
        let mut inner = self.lock();
        inner.target.ssid = Some(ssid);
        inner.target.plugin = Some(plugin);
    }

    // ---- reads ----

    pub fn has_strips(&self) -> bool {
        !self.lock().strips.is_empty()
    }

    pub fn enumeration_complete(&self) -> bool {
        self.lock().enumeration_complete
    }

    pub fn all_strip_summaries(&self) -> Vec<StripSummary> {
        self.lock().strips.values().map(StripInfo::summary).collect()
    }

    pub fn strip_summary(&self, ssid: Ssid) -> Option<StripSummary> {
        self.lock().strips.get(&ssid).map(StripInfo::summary)
    }

    pub fn strip_details(&self, ssid: Ssid) -> Option<StripInfo> {
        self.lock().strips.get(&ssid).cloned()
    }

    /// Strips that count as tracks, ascending by surface id. The Nth
    /// entry here is logical track N+1.
    pub fn track_ssids(&self) -> Vec<Ssid> {
        self.lock()
            .strips
            .values()
            .filter(|s| s.kind.is_track())
            .map(|s| s.id)
            .collect()
    }

    pub fn plugins_for(&self, ssid: Ssid) -> Vec<PluginInfo> {
        self.lock().plugins.get(&ssid).cloned().unwrap_or_default()
    }

    pub fn parameters_for(&self, ssid: Ssid, plugin_id: usize) -> Vec<PluginParameter> {
        self.lock()
            .plugins
            .get(&ssid)
            .and_then(|chain| chain.get(plugin_id))
            .map(|p| p.parameters.clone())
            .unwrap_or_default()
    }

    // ---- clears (the readers' only writes) ----

    /// Drop all strip knowledge ahead of a fresh enumeration.
    pub fn clear_strips(&self) {
        let mut inner = self.lock();
        inner.strips.clear();
        inner.strips_clock.clear();
        inner.enumeration_complete = false;
    }

    /// Drop the plugin chain for one strip ahead of a list query.
    pub fn clear_plugins(&self, ssid: Ssid) {
        let mut inner = self.lock();
        inner.plugins.remove(&ssid);
        inner.plugins_clock.clear();
    }

    /// Drop one plugin's parameters ahead of a parameter query.
    pub fn clear_parameters(&self, ssid: Ssid, plugin_id: usize) {
        let mut inner = self.lock();
        if let Some(chain) = inner.plugins.get_mut(&ssid) {
            if let Some(plugin) = chain.get_mut(plugin_id) {
                plugin.parameters.clear();
            }
        }
        inner.params_clock.clear();
    }

    /// Back to empty. Test isolation and session-change recovery.
    pub fn reset(&self) {
        let mut inner = self.lock();
        *inner = StoreInner::default();
        drop(inner);
        self.shared.cond.notify_all();
    }

    // ---- waits ----

    fn wait_until<F>(&self, timeout: Duration, mut pred: F) -> bool
    where
        F: FnMut(&StoreInner) -> bool,
    {
        let deadline = Instant::now() + timeout;
        let mut inner = self.lock();
        loop {
            if pred(&inner) {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            let tick = (deadline - now).min(WAIT_TICK);
            let (guard, _) = self
                .shared
                .cond
                .wait_timeout(inner, tick)
                .expect("feedback store lock poisoned");
            inner = guard;
        }
    }

    /// Wait for the strip enumeration to settle: the terminator
    /// arrived, or at least one track strip is known and the quiet
    /// window has elapsed since the first write. Returns false on a
    /// bare timeout (callers still read whatever accumulated).
    pub fn wait_strips(&self, timeout: Duration, quiet: Duration) -> bool {
        self.wait_until(timeout, |inner| {
            inner.enumeration_complete
                || (inner.strips.values().any(|s| s.kind.is_track())
                    && inner.strips_clock.settled(quiet))
        })
    }

    /// Wait for a strip's plugin list to settle.
    pub fn wait_plugins(&self, ssid: Ssid, timeout: Duration, quiet: Duration) -> bool {
        self.wait_until(timeout, |inner| {
            inner
                .plugins
                .get(&ssid)
                .map(|chain| !chain.is_empty())
                .unwrap_or(false)
                && inner.plugins_clock.settled(quiet)
        })
    }

    /// Wait for a plugin's parameter bucket to settle.
    pub fn wait_parameters(&self, ssid: Ssid, plugin_id: usize, timeout: Duration, quiet: Duration) -> bool {
        self.wait_until(timeout, |inner| {
            inner
                .plugins
                .get(&ssid)
                .and_then(|chain| chain.get(plugin_id))
                .map(|p| !p.parameters.is_empty())
                .unwrap_or(false)
                && inner.params_clock.settled(quiet)
        })
    }
}

impl std::fmt::Debug for FeedbackStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("FeedbackStore")
            .field("strips", &inner.strips.len())
            .field("enumeration_complete", &inner.enumeration_complete)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StripKind;

    fn descriptor(id: i32, kind: &str, name: &str) -> Classified {
        Classified::StripDescriptor(StripInfo {
            id: Ssid::new(id),
            kind: StripKind::parse(kind),
            name: name.to_string(),
            inputs: 2,
            outputs: 2,
            muted: false,
            soloed: false,
        })
    }

    #[test]
    fn test_strip_property_materializes_placeholder() {
        let store = FeedbackStore::new();
        store.apply(&Classified::StripProperty {
            ssid: Ssid::new(2),
            property: "name".to_string(),
            value: OscType::String("Kick".into()),
        });
        store.apply(&Classified::StripProperty {
            ssid: Ssid::new(2),
            property: "mute".to_string(),
            value: OscType::Int(1),
        });

        let summary = store.strip_summary(Ssid::new(2)).unwrap();
        assert_eq!(summary.name, "Kick");
        assert!(summary.muted);
        assert!(!summary.soloed);
    }

    #[test]
    fn test_descriptor_replaces_wholesale() {
        let store = FeedbackStore::new();
        store.apply(&Classified::StripProperty {
            ssid: Ssid::new(3),
            property: "mute".to_string(),
            value: OscType::Int(1),
        });
        store.apply(&descriptor(3, "AT", "Snare"));

        let strip = store.strip_details(Ssid::new(3)).unwrap();
        assert_eq!(strip.name, "Snare");
        // The descriptor said unmuted; the earlier property write is gone.
        assert!(!strip.muted);
    }

    #[test]
    fn test_track_ssids_ordered_and_filtered() {
        let store = FeedbackStore::new();
        store.apply(&descriptor(9, "AT", "Gtr"));
        store.apply(&descriptor(2, "MT", "Keys"));
        store.apply(&descriptor(5, "B", "Bus"));
        assert_eq!(store.track_ssids(), vec![Ssid::new(2), Ssid::new(9)]);
    }

    #[test]
    fn test_sentinel_short_circuits_wait() {
        let store = FeedbackStore::new();
        store.apply(&descriptor(2, "AT", "Kick"));

        let writer = store.clone();
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(30));
            writer.apply(&Classified::EndOfList { framerate: None, frames: None });
        });

        let start = Instant::now();
        // Quiet window of 10s would dominate without the sentinel.
        let settled = store.wait_strips(Duration::from_secs(5), Duration::from_secs(10));
        handle.join().unwrap();
        assert!(settled);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_wait_times_out_empty() {
        let store = FeedbackStore::new();
        let start = Instant::now();
        let settled = store.wait_plugins(Ssid::new(1), Duration::from_millis(200), Duration::from_millis(50));
        assert!(!settled);
        assert!(start.elapsed() >= Duration::from_millis(200));
        assert!(store.plugins_for(Ssid::new(1)).is_empty());
    }

    #[test]
    fn test_parameter_fold_needs_target() {
        let store = FeedbackStore::new();
        let param = Classified::PluginParamDescriptor {
            param_id: 1,
            name: "Threshold".to_string(),
            value: 0.5,
            min: 0.0,
            max: 1.0,
            unit: "dB".to_string(),
        };

        // No target yet: dropped.
        store.apply(&param);
        assert!(store.parameters_for(Ssid::new(2), 0).is_empty());

        store.set_target(Ssid::new(2), 0);
        store.apply(&param);
        let params = store.parameters_for(Ssid::new(2), 0);
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].name, "Threshold");

        // Short-form update changes only the value.
        store.apply(&Classified::PluginParamValue { param_id: 1, value: 0.9 });
        let params = store.parameters_for(Ssid::new(2), 0);
        assert!((params[0].value - 0.9).abs() < 1e-9);
    }

    #[test]
    fn test_selection_feedback_moves_target() {
        let store = FeedbackStore::new();
        store.set_target(Ssid::new(2), 1);
        store.apply(&Classified::Selection(SelectionEvent::StripSelected(Ssid::new(4))));
        store.apply(&Classified::Selection(SelectionEvent::PluginSelected(0)));
        store.apply(&Classified::Selection(SelectionEvent::PluginName("a-EQ".to_string())));

        let plugins = store.plugins_for(Ssid::new(4));
        assert_eq!(plugins.len(), 1);
        assert_eq!(plugins[0].name, "a-EQ");
        // The old target was untouched.
        assert!(store.plugins_for(Ssid::new(2)).is_empty());
    }

    #[test]
    fn test_clear_strips_resets_enumeration() {
        let store = FeedbackStore::new();
        store.apply(&descriptor(1, "AT", "Kick"));
        store.apply(&Classified::EndOfList { framerate: None, frames: None });
        assert!(store.enumeration_complete());

        store.clear_strips();
        assert!(!store.enumeration_complete());
        assert!(!store.has_strips());
    }

    #[test]
    fn test_clone_shares_state() {
        let a = FeedbackStore::new();
        let b = a.clone();
        a.apply(&descriptor(1, "AT", "Kick"));
        assert!(b.has_strips());
    }
}
