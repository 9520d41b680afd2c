//! Address classification for inbound feedback datagrams.
//!
//! The surface's feedback is a flat stream of OSC messages with no
//! framing or correlation; the only structure is the address path.
//! Classification is an ordered table of (prefix matcher, parser)
//! pairs evaluated top-down. Whatever falls through is handed to a
//! content-sniffing heuristic and, failing that, logged at debug
//! level and dropped. Nothing here is ever fatal.

use rosc::{OscMessage, OscType};

use crate::model::{Ssid, StripInfo, StripKind};

/// Sentinel carried in reply payloads and as its own address when a
/// strip enumeration is complete.
pub const END_ROUTE_LIST: &str = "end_route_list";

/// A feedback message after classification.
#[derive(Debug, Clone, PartialEq)]
pub enum Classified {
    /// Per-strip property feedback, e.g. `strip/mute/2` or
    /// `strip/2/send/1/gain`. `property` is the interior path with the
    /// strip id removed; `value` is the single positional argument.
    StripProperty {
        ssid: Ssid,
        property: String,
        value: OscType,
    },
    /// A complete strip descriptor tuple (from a reply payload).
    StripDescriptor(StripInfo),
    /// One entry of a strip's plugin chain.
    PluginEntry {
        ssid: Ssid,
        plugin_id: usize,
        name: String,
        enabled: bool,
    },
    /// Full parameter descriptor for the selected plugin.
    PluginParamDescriptor {
        param_id: i32,
        name: String,
        value: f64,
        min: f64,
        max: f64,
        unit: String,
    },
    /// Short-form value update for a parameter of the selected plugin.
    PluginParamValue { param_id: i32, value: f64 },
    /// Selection feedback from the surface.
    Selection(SelectionEvent),
    /// End of a strip enumeration, with optional session timing args.
    EndOfList {
        framerate: Option<f64>,
        frames: Option<i64>,
    },
    /// Anything we do not understand. Logged, never propagated.
    Unclassified,
}

/// Selection-related feedback events.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionEvent {
    StripSelected(Ssid),
    PluginSelected(usize),
    PluginActivated(bool),
    PluginName(String),
}

/// Classify one feedback message.
///
/// Leading `/` and `#` are stripped first (the surface's non-standard
/// reply address is `#reply`). The content sniff only runs on
/// messages the primary table could not place.
pub fn classify(msg: &OscMessage) -> Classified {
    let addr = msg.addr.trim_start_matches(['/', '#']);

    for (matcher, parser) in TABLE {
        if matcher(addr) {
            if let Some(c) = parser(addr, &msg.args) {
                return c;
            }
            // Matched the family but not the shape; fall on through to
            // the sniff like any other unknown message.
            break;
        }
    }

    if let Some(c) = sniff_strip_descriptor(&msg.args) {
        return c;
    }
    log::debug!("[FEEDBACK] unclassified: {} {:?}", msg.addr, msg.args);
    Classified::Unclassified
}

type Matcher = fn(&str) -> bool;
type Parser = fn(&str, &[OscType]) -> Option<Classified>;

/// The dispatch table, most specific prefixes first.
const TABLE: &[(Matcher, Parser)] = &[
    (|a| a == END_ROUTE_LIST, parse_end_of_list),
    (|a| a == "reply", parse_reply),
    (|a| a.starts_with("select/"), parse_selection),
    (|a| a == "strip/pluginlist" || a == "strip/plugin/list", parse_plugin_entry),
    (|a| a.starts_with("strip/"), parse_strip_property),
];

fn parse_end_of_list(_addr: &str, args: &[OscType]) -> Option<Classified> {
    Some(end_of_list_from(args))
}

fn end_of_list_from(args: &[OscType]) -> Classified {
    Classified::EndOfList {
        framerate: args.first().and_then(as_f64),
        frames: args.get(1).and_then(as_i64),
    }
}

/// `reply` carries heterogeneous payloads: the `end_route_list`
/// sentinel as the first argument, or a strip-descriptor tuple.
fn parse_reply(_addr: &str, args: &[OscType]) -> Option<Classified> {
    if let Some(OscType::String(s)) = args.first() {
        if s == END_ROUTE_LIST {
            return Some(end_of_list_from(&args[1..]));
        }
    }
    sniff_strip_descriptor(args)
}

fn parse_selection(addr: &str, args: &[OscType]) -> Option<Classified> {
    match addr {
        "select/strip" => {
            let ssid = args.first().and_then(as_i64)?;
            Some(Classified::Selection(SelectionEvent::StripSelected(Ssid::new(ssid as i32))))
        }
        "select/plugin" => {
            let id = args.first().and_then(as_i64)?;
            Some(Classified::Selection(SelectionEvent::PluginSelected(id.max(0) as usize)))
        }
        "select/plugin/activate" => {
            let on = args.first().and_then(as_i64)?;
            Some(Classified::Selection(SelectionEvent::PluginActivated(on != 0)))
        }
        "select/plugin/name" => {
            let name = args.first().and_then(as_string)?;
            Some(Classified::Selection(SelectionEvent::PluginName(name)))
        }
        "select/plugin/parameter" => parse_parameter(args),
        _ => None,
    }
}

/// Parameter feedback: the full six-field descriptor, or the compact
/// (id, value) update the surface sends on later changes.
fn parse_parameter(args: &[OscType]) -> Option<Classified> {
    if args.len() >= 5 {
        return Some(Classified::PluginParamDescriptor {
            param_id: args.first().and_then(as_i64)? as i32,
            name: args.get(1).and_then(as_string)?,
            value: args.get(2).and_then(as_f64)?,
            min: args.get(3).and_then(as_f64)?,
            max: args.get(4).and_then(as_f64)?,
            unit: args.get(5).and_then(as_string).unwrap_or_default(),
        });
    }
    if args.len() >= 2 {
        return Some(Classified::PluginParamValue {
            param_id: args.first().and_then(as_i64)? as i32,
            value: args.get(1).and_then(as_f64)?,
        });
    }
    None
}

/// Plugin chain entry: (ssid, 0-based chain position, name[, active]).
fn parse_plugin_entry(_addr: &str, args: &[OscType]) -> Option<Classified> {
    if args.len() < 3 {
        return None;
    }
    Some(Classified::PluginEntry {
        ssid: Ssid::new(args.first().and_then(as_i64)? as i32),
        plugin_id: args.get(1).and_then(as_i64)?.max(0) as usize,
        name: args.get(2).and_then(as_string)?,
        enabled: args.get(3).and_then(as_i64).map(|v| v != 0).unwrap_or(true),
    })
}

/// Strip property addresses come in two orderings:
/// `strip/<property...>/<ssid>` (trailing id, the feedback ordering)
/// and `strip/<ssid>/<property...>` (leading id, the command echo
/// ordering). Both map to the same classification. Fewer than three
/// segments, or no integer where the id should be, is unclassified.
fn parse_strip_property(addr: &str, args: &[OscType]) -> Option<Classified> {
    let segments: Vec<&str> = addr.split('/').collect();
    if segments.len() < 3 {
        return None;
    }
    let value = args.first().cloned()?;

    // Trailing id wins when both ends parse (a property path never
    // starts with a number in this dialect).
    if let Ok(id) = segments[segments.len() - 1].parse::<i32>() {
        return Some(Classified::StripProperty {
            ssid: Ssid::new(id),
            property: segments[1..segments.len() - 1].join("/"),
            value,
        });
    }
    if let Ok(id) = segments[1].parse::<i32>() {
        return Some(Classified::StripProperty {
            ssid: Ssid::new(id),
            property: segments[2..].join("/"),
            value,
        });
    }
    None
}

/// Best-effort sniff of unclassified payloads with a strip-descriptor
/// shape: (id:int, kind:str of at most 4 chars, name:str, in:int,
/// out:int, mute, solo). A protocol ambiguity inherited from the
/// surface, not a guarantee; kept separate from the table so it can
/// be disabled without touching the primary classifier.
fn sniff_strip_descriptor(args: &[OscType]) -> Option<Classified> {
    if args.len() < 7 {
        return None;
    }
    let id = as_i64(args.first()?)?;
    let kind = as_string(args.get(1)?)?;
    if kind.is_empty() || kind.len() > 4 {
        return None;
    }
    let name = as_string(args.get(2)?)?;
    let inputs = as_i64(args.get(3)?)? as i32;
    let outputs = as_i64(args.get(4)?)? as i32;
    let muted = as_i64(args.get(5)?)? != 0;
    let soloed = as_i64(args.get(6)?)? != 0;

    Some(Classified::StripDescriptor(StripInfo {
        id: Ssid::new(id as i32),
        kind: StripKind::parse(&kind),
        name,
        inputs,
        outputs,
        muted,
        soloed,
    }))
}

// The surface is loose about argument types (ints arrive as floats
// and vice versa), so extraction is tolerant.

fn as_i64(arg: &OscType) -> Option<i64> {
    match arg {
        OscType::Int(v) => Some(*v as i64),
        OscType::Long(v) => Some(*v),
        OscType::Float(v) => Some(*v as i64),
        OscType::Double(v) => Some(*v as i64),
        _ => None,
    }
}

fn as_f64(arg: &OscType) -> Option<f64> {
    match arg {
        OscType::Float(v) => Some(*v as f64),
        OscType::Double(v) => Some(*v),
        OscType::Int(v) => Some(*v as f64),
        OscType::Long(v) => Some(*v as f64),
        _ => None,
    }
}

fn as_string(arg: &OscType) -> Option<String> {
    match arg {
        OscType::String(s) => Some(s.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(addr: &str, args: Vec<OscType>) -> OscMessage {
        OscMessage {
            addr: addr.to_string(),
            args,
        }
    }

    #[test]
    fn test_strip_property_trailing_id() {
        let c = classify(&msg("/strip/name/3", vec![OscType::String("Kick".into())]));
        assert_eq!(
            c,
            Classified::StripProperty {
                ssid: Ssid::new(3),
                property: "name".to_string(),
                value: OscType::String("Kick".into()),
            }
        );
    }

    #[test]
    fn test_strip_property_nested_path() {
        let c = classify(&msg("/strip/send/gain/fader/2", vec![OscType::Float(0.5)]));
        assert_eq!(
            c,
            Classified::StripProperty {
                ssid: Ssid::new(2),
                property: "send/gain/fader".to_string(),
                value: OscType::Float(0.5),
            }
        );
    }

    #[test]
    fn test_strip_property_leading_id() {
        let c = classify(&msg("/strip/2/mute", vec![OscType::Int(1)]));
        assert_eq!(
            c,
            Classified::StripProperty {
                ssid: Ssid::new(2),
                property: "mute".to_string(),
                value: OscType::Int(1),
            }
        );
    }

    #[test]
    fn test_both_orderings_agree() {
        let a = classify(&msg("/strip/gain/7", vec![OscType::Float(-3.0)]));
        let b = classify(&msg("/strip/7/gain", vec![OscType::Float(-3.0)]));
        assert_eq!(a, b);
    }

    #[test]
    fn test_unknown_address_is_unclassified() {
        assert_eq!(classify(&msg("/foo", vec![])), Classified::Unclassified);
        // Two segments only
        assert_eq!(
            classify(&msg("/strip/name", vec![OscType::String("x".into())])),
            Classified::Unclassified
        );
        // Non-integer where the id should be
        assert_eq!(
            classify(&msg("/strip/name/banana", vec![OscType::Int(1)])),
            Classified::Unclassified
        );
    }

    #[test]
    fn test_selection_events() {
        assert_eq!(
            classify(&msg("/select/strip", vec![OscType::Int(4)])),
            Classified::Selection(SelectionEvent::StripSelected(Ssid::new(4)))
        );
        assert_eq!(
            classify(&msg("/select/plugin", vec![OscType::Int(1)])),
            Classified::Selection(SelectionEvent::PluginSelected(1))
        );
        assert_eq!(
            classify(&msg("/select/plugin/activate", vec![OscType::Int(0)])),
            Classified::Selection(SelectionEvent::PluginActivated(false))
        );
        assert_eq!(
            classify(&msg("/select/plugin/name", vec![OscType::String("a-EQ".into())])),
            Classified::Selection(SelectionEvent::PluginName("a-EQ".into()))
        );
    }

    #[test]
    fn test_parameter_descriptor_and_value() {
        let c = classify(&msg(
            "/select/plugin/parameter",
            vec![
                OscType::Int(1),
                OscType::String("Threshold".into()),
                OscType::Float(0.5),
                OscType::Float(0.0),
                OscType::Float(1.0),
                OscType::String("dB".into()),
            ],
        ));
        assert_eq!(
            c,
            Classified::PluginParamDescriptor {
                param_id: 1,
                name: "Threshold".to_string(),
                value: 0.5,
                min: 0.0,
                max: 1.0,
                unit: "dB".to_string(),
            }
        );

        let c = classify(&msg(
            "/select/plugin/parameter",
            vec![OscType::Int(1), OscType::Float(0.75)],
        ));
        assert_eq!(c, Classified::PluginParamValue { param_id: 1, value: 0.75 });
    }

    #[test]
    fn test_end_of_list_address() {
        let c = classify(&msg(
            "/end_route_list",
            vec![OscType::Float(30.0), OscType::Long(48_000)],
        ));
        assert_eq!(
            c,
            Classified::EndOfList {
                framerate: Some(30.0),
                frames: Some(48_000),
            }
        );
    }

    #[test]
    fn test_reply_sentinel() {
        let c = classify(&msg("#reply", vec![OscType::String(END_ROUTE_LIST.into())]));
        assert!(matches!(c, Classified::EndOfList { .. }));
    }

    #[test]
    fn test_reply_strip_descriptor() {
        let c = classify(&msg(
            "/reply",
            vec![
                OscType::Int(2),
                OscType::String("AT".into()),
                OscType::String("Kick".into()),
                OscType::Int(1),
                OscType::Int(2),
                OscType::Int(0),
                OscType::Int(1),
            ],
        ));
        match c {
            Classified::StripDescriptor(strip) => {
                assert_eq!(strip.id, Ssid::new(2));
                assert_eq!(strip.kind, StripKind::AudioTrack);
                assert_eq!(strip.name, "Kick");
                assert!(!strip.muted);
                assert!(strip.soloed);
            }
            other => panic!("expected StripDescriptor, got {:?}", other),
        }
    }

    #[test]
    fn test_sniff_rejects_long_kind_string() {
        let c = classify(&msg(
            "/something/odd",
            vec![
                OscType::Int(2),
                OscType::String("NOTAKIND".into()),
                OscType::String("Kick".into()),
                OscType::Int(1),
                OscType::Int(2),
                OscType::Int(0),
                OscType::Int(0),
            ],
        ));
        assert_eq!(c, Classified::Unclassified);
    }

    #[test]
    fn test_plugin_entry() {
        let c = classify(&msg(
            "/strip/pluginlist",
            vec![
                OscType::Int(3),
                OscType::Int(0),
                OscType::String("ACE Compressor".into()),
                OscType::Int(1),
            ],
        ));
        assert_eq!(
            c,
            Classified::PluginEntry {
                ssid: Ssid::new(3),
                plugin_id: 0,
                name: "ACE Compressor".to_string(),
                enabled: true,
            }
        );
    }

    #[test]
    fn test_tolerant_numeric_extraction() {
        // Ints arriving as floats still classify
        let c = classify(&msg("/select/strip", vec![OscType::Float(4.0)]));
        assert_eq!(
            c,
            Classified::Selection(SelectionEvent::StripSelected(Ssid::new(4)))
        );
    }
}
