//! Value conversion between real-world units and the surface's
//! normalized [0,1] parameter range.
//!
//! The surface exposes every plugin parameter as a normalized float.
//! Callers think in engineering units (dB, Hz, ratios, milliseconds),
//! so each semantic kind carries a default real-world range and a
//! scale (linear or logarithmic). Both directions clamp to the domain
//! instead of erroring; out-of-range input is a caller convenience,
//! not a fault.

use crate::error::{Error, Result};

/// Semantic classification of a plugin parameter.
///
/// Determines which conversion range and scale apply, and which unit
/// label the parameter renders with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamKind {
    /// Gain in dB, linear scale
    DbGain,
    /// Threshold in dB, linear scale (compressors, gates)
    DbThreshold,
    /// Frequency in Hz, log scale
    Frequency,
    /// Compression ratio, linear scale
    Ratio,
    /// Percentage, linear scale
    Percent,
    /// Time in milliseconds, log scale
    TimeMs,
    /// Time in seconds, log scale (converted via milliseconds)
    TimeSec,
    /// Filter Q factor, log scale
    QFactor,
    /// Already-normalized value, identity
    Raw,
}

impl ParamKind {
    /// Default real-world range for this kind.
    pub fn default_range(self) -> (f64, f64) {
        match self {
            ParamKind::DbGain => (-60.0, 12.0),
            ParamKind::DbThreshold => (-60.0, 0.0),
            ParamKind::Frequency => (20.0, 20_000.0),
            ParamKind::Ratio => (1.0, 20.0),
            ParamKind::Percent => (0.0, 100.0),
            ParamKind::TimeMs => (0.1, 1_000.0),
            ParamKind::TimeSec => (0.001, 10.0),
            ParamKind::QFactor => (0.1, 30.0),
            ParamKind::Raw => (0.0, 1.0),
        }
    }

    /// Whether this kind converts on a log10 scale.
    pub fn is_logarithmic(self) -> bool {
        matches!(
            self,
            ParamKind::Frequency | ParamKind::TimeMs | ParamKind::TimeSec | ParamKind::QFactor
        )
    }

    /// Lower-case label for API payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            ParamKind::DbGain => "gain",
            ParamKind::DbThreshold => "threshold",
            ParamKind::Frequency => "frequency",
            ParamKind::Ratio => "ratio",
            ParamKind::Percent => "percent",
            ParamKind::TimeMs => "time_ms",
            ParamKind::TimeSec => "time_sec",
            ParamKind::QFactor => "q",
            ParamKind::Raw => "raw",
        }
    }

    /// Unit label for display ("" for raw values).
    pub fn unit_label(self) -> &'static str {
        match self {
            ParamKind::DbGain | ParamKind::DbThreshold => "dB",
            ParamKind::Frequency => "Hz",
            ParamKind::Ratio => ":1",
            ParamKind::Percent => "%",
            ParamKind::TimeMs => "ms",
            ParamKind::TimeSec => "s",
            ParamKind::QFactor => "Q",
            ParamKind::Raw => "",
        }
    }

    /// Classify a parameter from its reported name and unit hint.
    ///
    /// The unit hint wins when present; the name breaks ties (a dB
    /// parameter named "Threshold" is a threshold, not a gain) and
    /// fills in when the surface reports no unit at all.
    pub fn infer(name: &str, unit: &str) -> Self {
        let name = name.to_lowercase();
        let unit = unit.to_lowercase();

        if unit.contains("db") {
            if name.contains("thresh") {
                return ParamKind::DbThreshold;
            }
            return ParamKind::DbGain;
        }
        if unit.contains("hz") {
            return ParamKind::Frequency;
        }
        if unit.contains("ms") {
            return ParamKind::TimeMs;
        }
        if unit.contains("s") && (name.contains("time") || name.contains("attack") || name.contains("release")) {
            return ParamKind::TimeSec;
        }
        if unit.contains('%') {
            return ParamKind::Percent;
        }
        if unit == "q" {
            return ParamKind::QFactor;
        }

        if name.contains("thresh") {
            return ParamKind::DbThreshold;
        }
        if name.contains("gain") || name.contains("volume") || name.contains("level") {
            return ParamKind::DbGain;
        }
        if name.contains("freq") || name.contains("cutoff") {
            return ParamKind::Frequency;
        }
        if name.contains("ratio") {
            return ParamKind::Ratio;
        }
        if name.contains("attack") || name.contains("release") {
            return ParamKind::TimeMs;
        }
        if name.contains("mix") || name.contains("wet") || name.contains("dry") {
            return ParamKind::Percent;
        }
        if name == "q" || name.contains("resonance") {
            return ParamKind::QFactor;
        }
        ParamKind::Raw
    }

    /// Convert a real-world value to the normalized [0,1] range using
    /// this kind's default range.
    pub fn to_normalized(self, real: f64) -> f64 {
        let (min, max) = self.default_range();
        self.to_normalized_in(real, min, max)
    }

    /// Convert a real-world value to [0,1] within an explicit range.
    ///
    /// Values outside the range are clamped first; this never fails.
    pub fn to_normalized_in(self, real: f64, min: f64, max: f64) -> f64 {
        if self == ParamKind::TimeSec {
            // Seconds convert through the millisecond path.
            return ParamKind::TimeMs.to_normalized_in(real * 1_000.0, min * 1_000.0, max * 1_000.0);
        }
        let real = real.clamp(min, max);
        if self.is_logarithmic() {
            let log_min = min.log10();
            let log_max = max.log10();
            (real.log10() - log_min) / (log_max - log_min)
        } else {
            (real - min) / (max - min)
        }
    }

    /// Convert a normalized [0,1] value back to this kind's real-world
    /// unit using the default range.
    pub fn from_normalized(self, norm: f64) -> f64 {
        let (min, max) = self.default_range();
        self.from_normalized_in(norm, min, max)
    }

    /// Convert a normalized value back to a real-world value within an
    /// explicit range. The normalized input is clamped to [0,1].
    pub fn from_normalized_in(self, norm: f64, min: f64, max: f64) -> f64 {
        if self == ParamKind::TimeSec {
            return ParamKind::TimeMs.from_normalized_in(norm, min * 1_000.0, max * 1_000.0) / 1_000.0;
        }
        let norm = norm.clamp(0.0, 1.0);
        if self.is_logarithmic() {
            let log_min = min.log10();
            let log_max = max.log10();
            10f64.powf(log_min + norm * (log_max - log_min))
        } else {
            min + norm * (max - min)
        }
    }
}

/// A real-world value tagged by unit, as accepted from callers.
///
/// Exactly one field should be set; the populated field selects the
/// conversion. `value` is the raw passthrough used when a caller
/// already has a normalized number.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RealValue {
    pub db: Option<f64>,
    pub hz: Option<f64>,
    pub ratio: Option<f64>,
    pub percent: Option<f64>,
    pub ms: Option<f64>,
    pub sec: Option<f64>,
    pub q: Option<f64>,
    pub value: Option<f64>,
}

impl RealValue {
    /// A dB-tagged value.
    pub fn db(v: f64) -> Self {
        Self { db: Some(v), ..Default::default() }
    }

    /// A Hz-tagged value.
    pub fn hz(v: f64) -> Self {
        Self { hz: Some(v), ..Default::default() }
    }

    /// A ratio-tagged value.
    pub fn ratio(v: f64) -> Self {
        Self { ratio: Some(v), ..Default::default() }
    }

    /// A percent-tagged value.
    pub fn percent(v: f64) -> Self {
        Self { percent: Some(v), ..Default::default() }
    }

    /// A milliseconds-tagged value.
    pub fn ms(v: f64) -> Self {
        Self { ms: Some(v), ..Default::default() }
    }

    /// A seconds-tagged value.
    pub fn sec(v: f64) -> Self {
        Self { sec: Some(v), ..Default::default() }
    }

    /// A Q-factor-tagged value.
    pub fn q(v: f64) -> Self {
        Self { q: Some(v), ..Default::default() }
    }

    /// A raw normalized value.
    pub fn raw(v: f64) -> Self {
        Self { value: Some(v), ..Default::default() }
    }

    /// True if no field is populated.
    pub fn is_empty(&self) -> bool {
        self.db.is_none()
            && self.hz.is_none()
            && self.ratio.is_none()
            && self.percent.is_none()
            && self.ms.is_none()
            && self.sec.is_none()
            && self.q.is_none()
            && self.value.is_none()
    }

    /// Convert to the normalized range.
    ///
    /// The populated unit field selects the conversion; `kind` only
    /// disambiguates the dB flavor (gain vs. threshold). When no unit
    /// field matches, a populated `value` passes through clamped, and
    /// an empty payload is an [`Error::InvalidValue`].
    pub fn to_normalized(&self, kind: ParamKind) -> Result<f64> {
        if let Some(db) = self.db {
            let db_kind = if kind == ParamKind::DbThreshold {
                ParamKind::DbThreshold
            } else {
                ParamKind::DbGain
            };
            return Ok(db_kind.to_normalized(db));
        }
        if let Some(hz) = self.hz {
            return Ok(ParamKind::Frequency.to_normalized(hz));
        }
        if let Some(ratio) = self.ratio {
            return Ok(ParamKind::Ratio.to_normalized(ratio));
        }
        if let Some(percent) = self.percent {
            return Ok(ParamKind::Percent.to_normalized(percent));
        }
        if let Some(ms) = self.ms {
            return Ok(ParamKind::TimeMs.to_normalized(ms));
        }
        if let Some(sec) = self.sec {
            return Ok(ParamKind::TimeSec.to_normalized(sec));
        }
        if let Some(q) = self.q {
            return Ok(ParamKind::QFactor.to_normalized(q));
        }
        if let Some(value) = self.value {
            return Ok(value.clamp(0.0, 1.0));
        }
        Err(Error::InvalidValue(format!(
            "no recognized unit field for {:?} (expected one of db/hz/ratio/percent/ms/sec/q/value)",
            kind
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() < tol
    }

    fn relative_close(a: f64, b: f64, rel: f64) -> bool {
        (a - b).abs() <= b.abs() * rel
    }

    #[test]
    fn test_db_gain_linear() {
        // -60..+12 over 72 dB total
        assert!(close(ParamKind::DbGain.to_normalized(-60.0), 0.0, 1e-9));
        assert!(close(ParamKind::DbGain.to_normalized(12.0), 1.0, 1e-9));
        assert!(close(ParamKind::DbGain.to_normalized(0.0), 60.0 / 72.0, 1e-9));
    }

    #[test]
    fn test_frequency_log_formula() {
        // 1 kHz sits at (log10(1000)-log10(20)) / (log10(20000)-log10(20))
        let expected = (1000f64.log10() - 20f64.log10()) / (20_000f64.log10() - 20f64.log10());
        assert!(close(ParamKind::Frequency.to_normalized(1_000.0), expected, 1e-9));
    }

    #[test]
    fn test_round_trip_linear() {
        for kind in [ParamKind::DbGain, ParamKind::DbThreshold, ParamKind::Ratio, ParamKind::Percent] {
            let (min, max) = kind.default_range();
            for step in 0..=10 {
                let x = min + (max - min) * (step as f64 / 10.0);
                let back = kind.from_normalized(kind.to_normalized(x));
                assert!(close(back, x, 1e-6), "{:?} {} -> {}", kind, x, back);
            }
        }
    }

    #[test]
    fn test_round_trip_log_within_one_percent() {
        let cases = [
            (ParamKind::Frequency, 1_000.0),
            (ParamKind::Frequency, 440.0),
            (ParamKind::TimeMs, 250.0),
            (ParamKind::TimeSec, 0.5),
            (ParamKind::QFactor, 0.7),
        ];
        for (kind, x) in cases {
            let back = kind.from_normalized(kind.to_normalized(x));
            assert!(relative_close(back, x, 0.01), "{:?} {} -> {}", kind, x, back);
        }
    }

    #[test]
    fn test_clamping_is_the_contract() {
        let clamped = ParamKind::DbGain.to_normalized(-1_000.0);
        let floor = ParamKind::DbGain.to_normalized(-60.0);
        assert!(close(clamped, floor, 1e-9));

        let high = ParamKind::Frequency.to_normalized(99_999.0);
        assert!(close(high, 1.0, 1e-9));

        // Reverse direction clamps the normalized input
        let real = ParamKind::Percent.from_normalized(2.0);
        assert!(close(real, 100.0, 1e-9));
    }

    #[test]
    fn test_range_override() {
        // A plugin reporting its own gain range of -12..0 dB
        let n = ParamKind::DbGain.to_normalized_in(-6.0, -12.0, 0.0);
        assert!(close(n, 0.5, 1e-9));
    }

    #[test]
    fn test_real_value_unit_selection() {
        let n = RealValue::db(-60.0).to_normalized(ParamKind::DbGain).unwrap();
        assert!(close(n, 0.0, 1e-9));

        // The db field against a threshold parameter uses the threshold range
        let n = RealValue::db(0.0).to_normalized(ParamKind::DbThreshold).unwrap();
        assert!(close(n, 1.0, 1e-9));

        let n = RealValue::hz(20.0).to_normalized(ParamKind::Frequency).unwrap();
        assert!(close(n, 0.0, 1e-9));
    }

    #[test]
    fn test_real_value_raw_fallback() {
        // A raw value against any kind passes through clamped
        let n = RealValue::raw(0.75).to_normalized(ParamKind::Frequency).unwrap();
        assert!(close(n, 0.75, 1e-9));
        let n = RealValue::raw(7.5).to_normalized(ParamKind::Raw).unwrap();
        assert!(close(n, 1.0, 1e-9));
    }

    #[test]
    fn test_real_value_empty_is_invalid() {
        let err = RealValue::default().to_normalized(ParamKind::DbGain);
        assert!(matches!(err, Err(Error::InvalidValue(_))));
    }

    #[test]
    fn test_infer_from_unit() {
        assert_eq!(ParamKind::infer("Threshold", "dB"), ParamKind::DbThreshold);
        assert_eq!(ParamKind::infer("Makeup Gain", "dB"), ParamKind::DbGain);
        assert_eq!(ParamKind::infer("Frequency", "Hz"), ParamKind::Frequency);
        assert_eq!(ParamKind::infer("Attack", "ms"), ParamKind::TimeMs);
        assert_eq!(ParamKind::infer("Mix", "%"), ParamKind::Percent);
    }

    #[test]
    fn test_infer_from_name() {
        assert_eq!(ParamKind::infer("Output Gain", ""), ParamKind::DbGain);
        assert_eq!(ParamKind::infer("Cutoff", ""), ParamKind::Frequency);
        assert_eq!(ParamKind::infer("Ratio", ""), ParamKind::Ratio);
        assert_eq!(ParamKind::infer("Release", ""), ParamKind::TimeMs);
        assert_eq!(ParamKind::infer("Drive", ""), ParamKind::Raw);
    }
}
