//! Name-based plugin parameter access.
//!
//! The surface only addresses parameters by position, so this module
//! maintains a per-(track, plugin) cache of lower-cased name → parameter
//! snapshot, populated by one discovery pass on first miss. Lookups
//! after a populated miss return not-found rather than re-discovering;
//! invalidation is explicit only (per-plugin, per-track, or global),
//! never time-based.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::discovery::DiscoveryOrchestrator;
use crate::error::{Error, Result};
use crate::model::PluginParameter;

/// Domain synonym groups for suggestion matching. An input that is a
/// member of a group matches any parameter whose name contains any
/// member of the same group.
const SYNONYM_GROUPS: &[&[&str]] = &[
    &["threshold", "thresh", "thr"],
    &["ratio", "comp_ratio", "compression"],
    &["attack", "att", "attack_time"],
    &["release", "rel", "release_time"],
    &["gain", "vol", "volume", "level", "makeup", "output"],
    &["freq", "frequency", "hz", "cutoff", "center", "corner"],
    &["q", "quality", "resonance", "res", "bandwidth"],
    &["low", "bass", "lf", "low_freq", "low_gain"],
    &["mid", "middle", "mf", "mid_freq", "mid_gain"],
    &["high", "treble", "hf", "high_freq", "high_gain"],
    &["wet", "mix", "blend", "depth"],
    &["dry", "original", "direct"],
    &["time", "delay", "dly", "predelay", "length"],
    &["feedback", "fb", "regen", "regeneration"],
    &["pan", "panorama", "balance", "position"],
];

type CacheKey = (usize, usize);

/// Cached name → id mapping for plugin parameters.
pub struct ParamMapper {
    discovery: DiscoveryOrchestrator,
    cache: Mutex<HashMap<CacheKey, HashMap<String, PluginParameter>>>,
}

impl ParamMapper {
    pub fn new(discovery: DiscoveryOrchestrator) -> Self {
        Self {
            discovery,
            cache: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<CacheKey, HashMap<String, PluginParameter>>> {
        self.cache.lock().expect("parameter cache lock poisoned")
    }

    /// Populate the cache for (track, plugin) if it has no entry,
    /// running at most one discovery pass. An empty discovery result
    /// is not cached, so a later call can try again.
    ///
    /// The discovery runs outside the cache lock; two concurrent
    /// callers may both discover, which is wasteful but idempotent.
    fn ensure(&self, track: usize, plugin: usize, timeout: Duration) -> Result<()> {
        if self.lock().contains_key(&(track, plugin)) {
            return Ok(());
        }

        let params = self
            .discovery
            .discover_plugin_parameters(track, plugin, timeout)?;
        if params.is_empty() {
            log::warn!(
                "[PARAMS] no parameters discovered for track {} plugin {}",
                track,
                plugin
            );
            return Ok(());
        }

        let mapping: HashMap<String, PluginParameter> = params
            .into_iter()
            .map(|p| (p.name.to_lowercase(), p))
            .collect();
        log::info!(
            "[PARAMS] mapped {} parameters for track {} plugin {}",
            mapping.len(),
            track,
            plugin
        );
        self.lock().insert((track, plugin), mapping);
        Ok(())
    }

    /// Resolve a parameter name (case-insensitive) to its 1-based
    /// positional id.
    pub fn parameter_id(&self, track: usize, plugin: usize, name: &str) -> Result<i32> {
        Ok(self.parameter_info(track, plugin, name)?.id)
    }

    /// Full cached snapshot for a parameter name.
    pub fn parameter_info(&self, track: usize, plugin: usize, name: &str) -> Result<PluginParameter> {
        self.ensure(track, plugin, self.discovery.default_timeout())?;
        self.lock()
            .get(&(track, plugin))
            .and_then(|m| m.get(&name.to_lowercase()))
            .cloned()
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "parameter '{}' on track {} plugin {}",
                    name, track, plugin
                ))
            })
    }

    /// Discovered parameter names, in positional order.
    pub fn list_parameter_names(&self, track: usize, plugin: usize) -> Result<Vec<String>> {
        self.ensure(track, plugin, self.discovery.default_timeout())?;
        let cache = self.lock();
        let mut params: Vec<&PluginParameter> = cache
            .get(&(track, plugin))
            .map(|m| m.values().collect())
            .unwrap_or_default();
        params.sort_by_key(|p| p.id);
        Ok(params.into_iter().map(|p| p.name.clone()).collect())
    }

    /// Update only the cached snapshot's value. By contract this never
    /// sends anything to the surface.
    pub fn update_value(&self, track: usize, plugin: usize, name: &str, value: f64) -> Result<()> {
        let mut cache = self.lock();
        let param = cache
            .get_mut(&(track, plugin))
            .and_then(|m| m.get_mut(&name.to_lowercase()))
            .ok_or_else(|| {
                Error::NotFound(format!(
                    "parameter '{}' on track {} plugin {}",
                    name, track, plugin
                ))
            })?;
        param.value = value.clamp(0.0, 1.0);
        log::debug!("[PARAMS] cached value for '{}' set to {}", name, param.value);
        Ok(())
    }

    /// Up to 5 parameter names likely meant by `input`: substring
    /// containment first, then synonym-group membership.
    pub fn suggest(&self, track: usize, plugin: usize, input: &str) -> Result<Vec<String>> {
        let names = self.list_parameter_names(track, plugin)?;
        let input = input.to_lowercase();
        let mut suggestions: Vec<String> = Vec::new();

        for name in &names {
            if name.to_lowercase().contains(&input) {
                suggestions.push(name.clone());
            }
        }

        for group in SYNONYM_GROUPS {
            if !group.contains(&input.as_str()) {
                continue;
            }
            for name in &names {
                let lower = name.to_lowercase();
                if group.iter().any(|alt| lower.contains(alt)) && !suggestions.contains(name) {
                    suggestions.push(name.clone());
                }
            }
        }

        suggestions.truncate(5);
        Ok(suggestions)
    }

    /// Invalidate one plugin's mapping.
    pub fn clear_plugin(&self, track: usize, plugin: usize) {
        if self.lock().remove(&(track, plugin)).is_some() {
            log::info!("[PARAMS] cleared cache for track {} plugin {}", track, plugin);
        }
    }

    /// Invalidate every plugin mapping on a track.
    pub fn clear_track(&self, track: usize) {
        self.lock().retain(|(t, _), _| *t != track);
        log::info!("[PARAMS] cleared cache for track {}", track);
    }

    /// Drop the entire cache.
    pub fn clear_all(&self) {
        self.lock().clear();
        log::info!("[PARAMS] cleared all cached parameter mappings");
    }
}

impl std::fmt::Debug for ParamMapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParamMapper")
            .field("cached_plugins", &self.lock().len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Classified;
    use crate::config::Config;
    use crate::model::{Ssid, StripInfo, StripKind};
    use crate::state::FeedbackStore;
    use crate::surface::SurfaceClient;

    /// A mapper over a store with one audio track, plus a feeder
    /// thread standing in for the surface: it re-sends the parameter
    /// descriptors every few milliseconds (discovery clears the bucket
    /// before waiting, so a one-shot preload would be wiped).
    fn mapper_with_params(names: &[&str]) -> ParamMapper {
        let store = FeedbackStore::new();
        store.apply(&Classified::StripDescriptor(StripInfo {
            id: Ssid::new(2),
            kind: StripKind::AudioTrack,
            name: "Kick".to_string(),
            inputs: 2,
            outputs: 2,
            muted: false,
            soloed: false,
        }));
        store.apply(&Classified::EndOfList { framerate: None, frames: None });

        let feeder_store = store.clone();
        let params: Vec<Classified> = names
            .iter()
            .enumerate()
            .map(|(i, name)| Classified::PluginParamDescriptor {
                param_id: (i + 1) as i32,
                name: name.to_string(),
                value: 0.5,
                min: 0.0,
                max: 1.0,
                unit: String::new(),
            })
            .collect();
        std::thread::spawn(move || {
            for _ in 0..400 {
                for p in &params {
                    feeder_store.apply(p);
                }
                std::thread::sleep(Duration::from_millis(5));
            }
        });

        let mut config = Config::default();
        config.discovery.quiet_window_ms = 20;
        config.discovery.timeout_ms = 1_000;
        let discovery = DiscoveryOrchestrator::new(SurfaceClient::noop(), store, &config);
        ParamMapper::new(discovery)
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let mapper = mapper_with_params(&["Threshold", "Attack", "Release"]);
        assert_eq!(mapper.parameter_id(1, 0, "THRESHOLD").unwrap(), 1);
        assert_eq!(mapper.parameter_id(1, 0, "attack").unwrap(), 2);
    }

    #[test]
    fn test_miss_is_not_found() {
        let mapper = mapper_with_params(&["Threshold"]);
        assert!(matches!(
            mapper.parameter_id(1, 0, "nonsense"),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_list_names_in_positional_order() {
        let mapper = mapper_with_params(&["Threshold", "Attack", "Release"]);
        assert_eq!(
            mapper.list_parameter_names(1, 0).unwrap(),
            vec!["Threshold", "Attack", "Release"]
        );
    }

    #[test]
    fn test_suggest_substring_before_synonyms() {
        let mapper = mapper_with_params(&["Threshold", "Attack", "Release"]);
        let suggestions = mapper.suggest(1, 0, "thresh").unwrap();
        assert_eq!(suggestions, vec!["Threshold"]);
    }

    #[test]
    fn test_suggest_via_synonym_group() {
        let mapper = mapper_with_params(&["Makeup Gain", "Output Level", "Attack"]);
        // "vol" is not a substring of any name, but shares a synonym
        // group with gain and level.
        let suggestions = mapper.suggest(1, 0, "vol").unwrap();
        assert_eq!(suggestions.len(), 2);
        assert!(suggestions.contains(&"Makeup Gain".to_string()));
        assert!(suggestions.contains(&"Output Level".to_string()));
    }

    #[test]
    fn test_update_value_is_cache_only() {
        let mapper = mapper_with_params(&["Threshold"]);
        // Populate the cache.
        mapper.parameter_id(1, 0, "threshold").unwrap();
        mapper.update_value(1, 0, "Threshold", 0.8).unwrap();
        let info = mapper.parameter_info(1, 0, "threshold").unwrap();
        assert!((info.value - 0.8).abs() < 1e-9);
        // The store's copy is untouched.
        let store = mapper.discovery.store();
        let stored = &store.parameters_for(Ssid::new(2), 0)[0];
        assert!((stored.value - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_explicit_invalidation_scopes() {
        let mapper = mapper_with_params(&["Threshold"]);
        mapper.parameter_id(1, 0, "threshold").unwrap();
        assert_eq!(mapper.lock().len(), 1);

        mapper.clear_plugin(1, 0);
        assert!(mapper.lock().is_empty());

        mapper.parameter_id(1, 0, "threshold").unwrap();
        mapper.clear_track(1);
        assert!(mapper.lock().is_empty());

        mapper.parameter_id(1, 0, "threshold").unwrap();
        mapper.clear_all();
        assert!(mapper.lock().is_empty());
    }
}
