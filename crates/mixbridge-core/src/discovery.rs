//! Discovery orchestration: emit a query, wait for the store to
//! settle, return a snapshot.
//!
//! Timeouts are not errors here. A discovery pass that sees nothing
//! returns an empty snapshot; the caller decides what that means.
//! The only hard failure is a logical track index that exceeds what
//! the enumeration produced.

use std::time::Duration;

use crate::config::{Config, DiscoverySettings, OscSettings};
use crate::error::{Error, Result};
use crate::model::{PluginInfo, PluginParameter, Ssid, StripSummary};
use crate::state::FeedbackStore;
use crate::surface::SurfaceClient;

/// Drives setup, enumeration and query cycles against the surface.
#[derive(Clone)]
pub struct DiscoveryOrchestrator {
    surface: SurfaceClient,
    store: FeedbackStore,
    osc: OscSettings,
    settings: DiscoverySettings,
}

impl DiscoveryOrchestrator {
    pub fn new(surface: SurfaceClient, store: FeedbackStore, config: &Config) -> Self {
        Self {
            surface,
            store,
            osc: config.osc.clone(),
            settings: config.discovery.clone(),
        }
    }

    /// Default per-pass wait budget from configuration.
    pub fn default_timeout(&self) -> Duration {
        self.settings.timeout()
    }

    fn quiet(&self) -> Duration {
        self.settings.quiet_window()
    }

    /// One-time surface setup + strip enumeration, skipped when strips
    /// are already known.
    pub fn ensure_strips(&self, timeout: Duration) -> Result<()> {
        if self.store.has_strips() {
            return Ok(());
        }
        log::info!("[DISCOVERY] no strips known, running surface setup");
        self.surface
            .set_surface(0, self.osc.strip_types, self.osc.feedback)?;
        self.surface.strip_list()?;
        if !self.store.wait_strips(timeout, self.quiet()) {
            log::warn!("[DISCOVERY] strip enumeration timed out after {:?}", timeout);
        }
        Ok(())
    }

    /// Re-run setup + enumeration from scratch and return the result.
    pub fn refresh_strips(&self, timeout: Duration) -> Result<Vec<StripSummary>> {
        self.store.clear_strips();
        self.ensure_strips(timeout)?;
        Ok(self.store.all_strip_summaries())
    }

    /// Map a 1-based logical track index to a surface strip id.
    ///
    /// Logical track N is the Nth audio/MIDI strip ordered by
    /// ascending ssid; the surface's ids are neither contiguous nor
    /// 1-based.
    pub fn resolve_track(&self, track: usize) -> Result<Ssid> {
        let tracks = self.store.track_ssids();
        if track == 0 || track > tracks.len() {
            return Err(Error::NotFound(format!(
                "track {} (have {} tracks)",
                track,
                tracks.len()
            )));
        }
        Ok(tracks[track - 1])
    }

    /// Discover the plugin chain on a logical track.
    ///
    /// An empty result after the timeout is success with zero
    /// plugins, not an error.
    pub fn discover_plugins(&self, track: usize, timeout: Duration) -> Result<Vec<PluginInfo>> {
        self.ensure_strips(timeout)?;
        let ssid = self.resolve_track(track)?;

        log::info!("[DISCOVERY] listing plugins for track {} (ssid {})", track, ssid);
        self.store.clear_plugins(ssid);
        self.surface.plugin_list(ssid)?;
        if !self.store.wait_plugins(ssid, timeout, self.quiet()) {
            log::debug!("[DISCOVERY] plugin list for ssid {} timed out", ssid);
        }
        Ok(self.store.plugins_for(ssid))
    }

    /// Discover the parameters of one plugin on a logical track.
    ///
    /// Parameter descriptors arrive against the surface's current
    /// selection, so the strip and plugin are selected first and the
    /// store's feedback target pinned before the query goes out.
    pub fn discover_plugin_parameters(
        &self,
        track: usize,
        plugin: usize,
        timeout: Duration,
    ) -> Result<Vec<PluginParameter>> {
        self.ensure_strips(timeout)?;
        let ssid = self.resolve_track(track)?;

        log::info!(
            "[DISCOVERY] listing parameters for track {} plugin {} (ssid {})",
            track,
            plugin,
            ssid
        );
        self.store.set_target(ssid, plugin);
        self.store.clear_parameters(ssid, plugin);

        // Selecting the strip resets the plugin page to the head of
        // the chain; the delta then walks to the wanted position.
        self.surface.select_strip(ssid)?;
        self.surface.select_plugin_delta(plugin as i32)?;

        if !self.store.wait_parameters(ssid, plugin, timeout, self.quiet()) {
            log::debug!(
                "[DISCOVERY] parameters for ssid {} plugin {} timed out",
                ssid,
                plugin
            );
        }
        Ok(self.store.parameters_for(ssid, plugin))
    }

    pub fn store(&self) -> &FeedbackStore {
        &self.store
    }
}

impl std::fmt::Debug for DiscoveryOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoveryOrchestrator")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Classified;
    use crate::model::{StripInfo, StripKind};
    use std::time::Instant;

    fn orchestrator_with(strips: &[(i32, &str, &str)]) -> DiscoveryOrchestrator {
        let store = FeedbackStore::new();
        for (id, kind, name) in strips {
            store.apply(&Classified::StripDescriptor(StripInfo {
                id: Ssid::new(*id),
                kind: StripKind::parse(kind),
                name: name.to_string(),
                inputs: 2,
                outputs: 2,
                muted: false,
                soloed: false,
            }));
        }
        store.apply(&Classified::EndOfList { framerate: None, frames: None });
        DiscoveryOrchestrator::new(SurfaceClient::noop(), store, &Config::default())
    }

    #[test]
    fn test_resolve_track_orders_by_ssid() {
        let orch = orchestrator_with(&[(9, "AT", "Gtr"), (2, "MT", "Keys"), (5, "B", "Bus")]);
        assert_eq!(orch.resolve_track(1).unwrap(), Ssid::new(2));
        assert_eq!(orch.resolve_track(2).unwrap(), Ssid::new(9));
    }

    #[test]
    fn test_resolve_track_out_of_range() {
        let orch = orchestrator_with(&[(2, "AT", "Kick")]);
        assert!(matches!(orch.resolve_track(0), Err(Error::NotFound(_))));
        assert!(matches!(orch.resolve_track(2), Err(Error::NotFound(_))));
        // Buses never count as tracks.
        let orch = orchestrator_with(&[(1, "B", "Master")]);
        assert!(matches!(orch.resolve_track(1), Err(Error::NotFound(_))));
    }

    #[test]
    fn test_empty_plugin_discovery_is_success() {
        let orch = orchestrator_with(&[(2, "AT", "Kick")]);
        let start = Instant::now();
        let plugins = orch.discover_plugins(1, Duration::from_millis(200)).unwrap();
        assert!(plugins.is_empty());
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(200));
        assert!(elapsed < Duration::from_secs(1));
    }

    #[test]
    fn test_empty_parameter_discovery_is_success() {
        let orch = orchestrator_with(&[(2, "AT", "Kick")]);
        let params = orch
            .discover_plugin_parameters(1, 0, Duration::from_millis(200))
            .unwrap();
        assert!(params.is_empty());
    }

    #[test]
    fn test_parameters_fold_once_target_is_pinned() {
        let orch = orchestrator_with(&[(2, "AT", "Kick")]);
        let store = orch.store().clone();

        // Feedback races in while the orchestrator waits.
        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            store.apply(&Classified::PluginParamDescriptor {
                param_id: 1,
                name: "Threshold".to_string(),
                value: 0.5,
                min: 0.0,
                max: 1.0,
                unit: "dB".to_string(),
            });
        });

        let params = orch
            .discover_plugin_parameters(1, 0, Duration::from_millis(400))
            .unwrap();
        handle.join().unwrap();
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].name, "Threshold");
    }
}
