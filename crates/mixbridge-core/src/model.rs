//! Data model for the aggregated surface state.
//!
//! These types mirror what the workstation reports over its feedback
//! channel: mixer strips, the plugins loaded on them, and each
//! plugin's parameters. They are owned by the feedback store and
//! handed out as clones.

use crate::convert::ParamKind;

/// Surface strip ID, assigned by the workstation when the session is
/// built. Not guaranteed contiguous, 1-based, or stable across
/// sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ssid(pub i32);

impl Ssid {
    /// Create a new strip ID.
    pub fn new(id: i32) -> Self {
        Self(id)
    }

    /// Get the inner i32 value.
    pub fn as_i32(self) -> i32 {
        self.0
    }
}

impl From<i32> for Ssid {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

impl From<Ssid> for i32 {
    fn from(ssid: Ssid) -> Self {
        ssid.0
    }
}

impl std::fmt::Display for Ssid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Strip kind as reported in the surface's short descriptor strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StripKind {
    /// Audio track ("AT")
    AudioTrack,
    /// MIDI track ("MT")
    MidiTrack,
    /// Audio bus ("B")
    Bus,
    /// MIDI bus ("MB")
    MidiBus,
    /// VCA master ("V")
    Vca,
    /// Foldback bus ("FB")
    Foldback,
    /// Anything the surface reports that we do not know about
    Other(String),
}

impl StripKind {
    /// Parse the surface's short kind string.
    pub fn parse(s: &str) -> Self {
        match s {
            "AT" => StripKind::AudioTrack,
            "MT" => StripKind::MidiTrack,
            "B" => StripKind::Bus,
            "MB" => StripKind::MidiBus,
            "V" => StripKind::Vca,
            "FB" => StripKind::Foldback,
            other => StripKind::Other(other.to_string()),
        }
    }

    /// The surface's short string for this kind.
    pub fn as_str(&self) -> &str {
        match self {
            StripKind::AudioTrack => "AT",
            StripKind::MidiTrack => "MT",
            StripKind::Bus => "B",
            StripKind::MidiBus => "MB",
            StripKind::Vca => "V",
            StripKind::Foldback => "FB",
            StripKind::Other(s) => s,
        }
    }

    /// Whether this strip counts as a track for logical track
    /// numbering (audio and MIDI tracks do; buses and VCAs do not).
    pub fn is_track(&self) -> bool {
        matches!(self, StripKind::AudioTrack | StripKind::MidiTrack)
    }
}

impl std::fmt::Display for StripKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One mixer strip as known from feedback.
///
/// Strip descriptors arrive as complete tuples, so this entry is
/// replaced wholesale whenever a new descriptor comes in; per-property
/// feedback (`strip/mute/<ssid>` and friends) updates single fields.
#[derive(Debug, Clone, PartialEq)]
pub struct StripInfo {
    /// Surface strip ID
    pub id: Ssid,
    /// Kind reported by the surface
    pub kind: StripKind,
    /// Strip name
    pub name: String,
    /// Input channel count
    pub inputs: i32,
    /// Output channel count
    pub outputs: i32,
    /// Mute state
    pub muted: bool,
    /// Solo state
    pub soloed: bool,
}

impl StripInfo {
    /// A placeholder entry for a strip we have only seen property
    /// feedback for (no descriptor yet).
    pub fn placeholder(id: Ssid) -> Self {
        Self {
            id,
            kind: StripKind::Other(String::new()),
            name: format!("Strip {}", id),
            inputs: 0,
            outputs: 0,
            muted: false,
            soloed: false,
        }
    }

    /// Reduce to the summary shape.
    pub fn summary(&self) -> StripSummary {
        StripSummary {
            id: self.id,
            name: self.name.clone(),
            muted: self.muted,
            soloed: self.soloed,
        }
    }
}

/// The compact strip view callers usually want.
#[derive(Debug, Clone, PartialEq)]
pub struct StripSummary {
    pub id: Ssid,
    pub name: String,
    pub muted: bool,
    pub soloed: bool,
}

/// One plugin in a strip's processing chain.
///
/// `id` is the 0-based chain position. The surface has no stable
/// plugin identity, so reordering the chain renumbers everything;
/// callers that cache by id must invalidate after edits.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginInfo {
    /// 0-based position in the strip's plugin chain
    pub id: usize,
    /// Owning strip
    pub strip: Ssid,
    /// Plugin display name
    pub name: String,
    /// Active (not bypassed)
    pub enabled: bool,
    /// Parameters in surface order
    pub parameters: Vec<PluginParameter>,
}

impl PluginInfo {
    /// A fresh entry for a plugin we have just learned about.
    pub fn new(strip: Ssid, id: usize) -> Self {
        Self {
            id,
            strip,
            name: format!("Plugin {}", id),
            enabled: true,
            parameters: Vec::new(),
        }
    }

    /// Best-effort plugin category from the display name.
    pub fn kind(&self) -> PluginKind {
        PluginKind::infer(&self.name)
    }
}

/// One plugin parameter as reported by the surface.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginParameter {
    /// 1-based positional index, stable for a given plugin load
    pub id: i32,
    /// Parameter display name
    pub name: String,
    /// Current value, normalized 0..1
    pub value: f64,
    /// Lower bound reported by the surface
    pub min: f64,
    /// Upper bound reported by the surface
    pub max: f64,
    /// Unit hint string reported by the surface (often empty)
    pub unit: String,
    /// Semantic classification inferred from name + unit
    pub kind: ParamKind,
    /// Whether the parameter can be changed
    pub controllable: bool,
}

impl PluginParameter {
    /// Build a parameter from wire fields, inferring the semantic kind
    /// and deriving controllability from the reported bounds.
    pub fn from_feedback(id: i32, name: String, value: f64, min: f64, max: f64, unit: String) -> Self {
        let kind = ParamKind::infer(&name, &unit);
        Self {
            id,
            value,
            min,
            max,
            controllable: max > min,
            kind,
            name,
            unit,
        }
    }

    /// Current value in real-world units for this parameter's kind.
    pub fn real_value(&self) -> f64 {
        self.kind.from_normalized(self.value)
    }

    /// Human-readable rendering of the current value.
    ///
    /// Gain renders as "-12.5 dB", frequencies above 1 kHz as "1.2 kHz",
    /// ratios as "4.0:1", raw values as a bare 3-decimal float.
    pub fn format_value(&self) -> String {
        let real = self.real_value();
        match self.kind {
            ParamKind::DbGain | ParamKind::DbThreshold => format!("{:.1} dB", real),
            ParamKind::Frequency => {
                if real >= 1_000.0 {
                    format!("{:.1} kHz", real / 1_000.0)
                } else {
                    format!("{:.0} Hz", real)
                }
            }
            ParamKind::Ratio => format!("{:.1}:1", real),
            ParamKind::Percent => format!("{:.0} %", real),
            ParamKind::TimeMs => format!("{:.1} ms", real),
            ParamKind::TimeSec => format!("{:.3} s", real),
            ParamKind::QFactor => format!("{:.2} Q", real),
            ParamKind::Raw => format!("{:.3}", self.value),
        }
    }
}

/// Best-effort plugin category, inferred from the plugin name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginKind {
    Compressor,
    Equalizer,
    Reverb,
    Delay,
    Limiter,
    Gate,
    Distortion,
    Modulation,
    Filter,
    Instrument,
    Unknown,
}

impl PluginKind {
    /// Infer a category from a plugin display name.
    pub fn infer(name: &str) -> Self {
        let name = name.to_lowercase();
        if name.contains("comp") {
            PluginKind::Compressor
        } else if name.contains("eq") || name.contains("equal") {
            PluginKind::Equalizer
        } else if name.contains("reverb") || name.contains("verb") {
            PluginKind::Reverb
        } else if name.contains("delay") || name.contains("echo") {
            PluginKind::Delay
        } else if name.contains("limit") {
            PluginKind::Limiter
        } else if name.contains("gate") {
            PluginKind::Gate
        } else if name.contains("dist") || name.contains("drive") || name.contains("saturat") {
            PluginKind::Distortion
        } else if name.contains("chorus") || name.contains("flange") || name.contains("phaser") {
            PluginKind::Modulation
        } else if name.contains("filter") {
            PluginKind::Filter
        } else if name.contains("synth") || name.contains("piano") || name.contains("organ") {
            PluginKind::Instrument
        } else {
            PluginKind::Unknown
        }
    }

    /// Lower-case label for API payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            PluginKind::Compressor => "compressor",
            PluginKind::Equalizer => "equalizer",
            PluginKind::Reverb => "reverb",
            PluginKind::Delay => "delay",
            PluginKind::Limiter => "limiter",
            PluginKind::Gate => "gate",
            PluginKind::Distortion => "distortion",
            PluginKind::Modulation => "modulation",
            PluginKind::Filter => "filter",
            PluginKind::Instrument => "instrument",
            PluginKind::Unknown => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_kind_parse() {
        assert_eq!(StripKind::parse("AT"), StripKind::AudioTrack);
        assert_eq!(StripKind::parse("MT"), StripKind::MidiTrack);
        assert_eq!(StripKind::parse("V"), StripKind::Vca);
        assert_eq!(StripKind::parse("XY"), StripKind::Other("XY".to_string()));
        assert!(StripKind::AudioTrack.is_track());
        assert!(StripKind::MidiTrack.is_track());
        assert!(!StripKind::Bus.is_track());
    }

    #[test]
    fn test_strip_placeholder_summary() {
        let strip = StripInfo::placeholder(Ssid::new(4));
        let summary = strip.summary();
        assert_eq!(summary.id, Ssid::new(4));
        assert_eq!(summary.name, "Strip 4");
        assert!(!summary.muted);
        assert!(!summary.soloed);
    }

    #[test]
    fn test_parameter_from_feedback() {
        let p = PluginParameter::from_feedback(1, "Threshold".to_string(), 0.5, 0.0, 1.0, "dB".to_string());
        assert_eq!(p.kind, ParamKind::DbThreshold);
        assert!(p.controllable);

        let fixed = PluginParameter::from_feedback(2, "Meter".to_string(), 0.3, 0.5, 0.5, String::new());
        assert!(!fixed.controllable);
    }

    #[test]
    fn test_format_value() {
        let gain = PluginParameter::from_feedback(1, "Gain".to_string(), 0.5, 0.0, 1.0, "dB".to_string());
        // Midpoint of -60..+12 is -24 dB
        assert_eq!(gain.format_value(), "-24.0 dB");

        let freq = PluginParameter::from_feedback(2, "Frequency".to_string(), 1.0, 0.0, 1.0, "Hz".to_string());
        assert_eq!(freq.format_value(), "20.0 kHz");

        let raw = PluginParameter::from_feedback(3, "Drive".to_string(), 0.25, 0.0, 1.0, String::new());
        assert_eq!(raw.format_value(), "0.250");
    }

    #[test]
    fn test_plugin_kind_infer() {
        assert_eq!(PluginKind::infer("ACE Compressor"), PluginKind::Compressor);
        assert_eq!(PluginKind::infer("a-EQ"), PluginKind::Equalizer);
        assert_eq!(PluginKind::infer("Dragonfly Reverb"), PluginKind::Reverb);
        assert_eq!(PluginKind::infer("Calf Vintage Delay"), PluginKind::Delay);
        assert_eq!(PluginKind::infer("Mystery Box"), PluginKind::Unknown);
    }
}
