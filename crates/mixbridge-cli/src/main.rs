//! mixbridge CLI - The `mixbridge` command.
//!
//! Entry point for running the bridge daemon and its diagnostic
//! subcommands:
//!
//! - **serve**: feedback listener + HTTP REST API, the normal mode
//! - **monitor**: print classified feedback traffic as it arrives
//! - **strips**: one-shot strip discovery, printed as a table
//! - **send**: transmit a single raw OSC message

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use mixbridge_core::{
    Classified, Config, DiscoveryOrchestrator, FeedbackListener, FeedbackStore, OscClient,
    ParamMapper, SelectionEvent, SelectionTracker, SurfaceClient,
};
use mixbridge_http::AppState;

/// mixbridge - OSC bridge for DAW control surfaces
#[derive(Parser, Debug)]
#[command(name = "mixbridge")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Semantic OSC bridge for DAW control surfaces", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the bridge: feedback listener plus HTTP REST API
    Serve {
        /// Workstation OSC address (host:port)
        #[arg(long)]
        target: Option<String>,

        /// Local port for inbound feedback
        #[arg(long)]
        listen_port: Option<u16>,

        /// HTTP bind address (host:port)
        #[arg(long)]
        http_addr: Option<String>,

        /// Settle window for feedback bursts (e.g. "2s", "500ms")
        #[arg(long)]
        quiet: Option<humantime::Duration>,

        /// Per-query discovery wait budget
        #[arg(long)]
        timeout: Option<humantime::Duration>,
    },

    /// Print classified feedback traffic until Ctrl+C
    Monitor {
        /// Workstation OSC address (host:port)
        #[arg(long)]
        target: Option<String>,

        /// Local port for inbound feedback
        #[arg(long)]
        listen_port: Option<u16>,

        /// Also print traffic the classifier does not understand
        #[arg(long)]
        raw: bool,
    },

    /// One-shot strip discovery, printed as a table
    Strips {
        /// Workstation OSC address (host:port)
        #[arg(long)]
        target: Option<String>,

        /// Local port for inbound feedback
        #[arg(long)]
        listen_port: Option<u16>,

        /// Wait budget for the enumeration
        #[arg(long, default_value = "5s")]
        timeout: humantime::Duration,
    },

    /// Send a single OSC message (diagnostic)
    Send {
        /// Workstation OSC address (host:port)
        #[arg(long)]
        target: Option<String>,

        /// OSC address, e.g. /transport_play
        address: String,

        /// Arguments, parsed as int, float, or string in that order
        args: Vec<String>,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = Args::parse();
    match args.command {
        Commands::Serve {
            target,
            listen_port,
            http_addr,
            quiet,
            timeout,
        } => {
            let mut config = Config::from_env();
            if let Some(target) = target {
                config.osc.target = target;
            }
            if let Some(port) = listen_port {
                config.osc.listen_port = port;
            }
            if let Some(addr) = http_addr {
                config.http.bind = addr;
            }
            if let Some(quiet) = quiet {
                config.discovery.quiet_window_ms = Duration::from(quiet).as_millis() as u64;
            }
            if let Some(timeout) = timeout {
                config.discovery.timeout_ms = Duration::from(timeout).as_millis() as u64;
            }
            serve(config)
        }
        Commands::Monitor {
            target,
            listen_port,
            raw,
        } => {
            let mut config = Config::from_env();
            if let Some(target) = target {
                config.osc.target = target;
            }
            if let Some(port) = listen_port {
                config.osc.listen_port = port;
            }
            monitor(config, raw)
        }
        Commands::Strips {
            target,
            listen_port,
            timeout,
        } => {
            let mut config = Config::from_env();
            if let Some(target) = target {
                config.osc.target = target;
            }
            if let Some(port) = listen_port {
                config.osc.listen_port = port;
            }
            strips(config, timeout.into())
        }
        Commands::Send {
            target,
            address,
            args,
        } => {
            let mut config = Config::from_env();
            if let Some(target) = target {
                config.osc.target = target;
            }
            send(&config, &address, &args)
        }
    }
}

/// Run the bridge daemon until Ctrl+C.
fn serve(config: Config) -> Result<()> {
    log::info!("mixbridge {} starting", env!("CARGO_PKG_VERSION"));
    log::info!("  target:   {}", config.osc.target);
    log::info!("  feedback: {}", config.osc.listen_addr());
    log::info!("  http:     {}", config.http.bind);

    let store = FeedbackStore::new();
    let listener = FeedbackListener::bind(config.osc.listen_addr(), store.clone())
        .with_context(|| format!("failed to bind feedback port {}", config.osc.listen_port))?;

    let surface = SurfaceClient::new(&config.osc.target)
        .with_context(|| format!("failed to open command socket to {}", config.osc.target))?;
    let discovery = DiscoveryOrchestrator::new(surface.clone(), store.clone(), &config);
    let mapper = ParamMapper::new(discovery.clone());
    let selection = SelectionTracker::new();

    let state = Arc::new(AppState {
        surface,
        store,
        discovery,
        mapper,
        selection,
        config: config.clone(),
    });

    // Mirror the surface's own selection feedback into the tracker so
    // GET /selection reflects GUI-side changes too.
    let events = listener.subscribe();
    let tracker_state = Arc::clone(&state);
    std::thread::spawn(move || {
        for event in events {
            match event.classified {
                Classified::Selection(SelectionEvent::StripSelected(ssid)) => {
                    let _ = tracker_state.selection.select_strip(ssid);
                }
                Classified::Selection(SelectionEvent::PluginSelected(id)) => {
                    let _ = tracker_state.selection.select_plugin(id, None);
                }
                _ => {}
            }
        }
    });

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let bind = config.http.bind.clone();
    runtime.block_on(async move {
        tokio::select! {
            result = mixbridge_http::start_server(state, &bind) => {
                result.with_context(|| format!("HTTP server failed on {}", bind))
            }
            _ = tokio::signal::ctrl_c() => {
                log::info!("interrupted, shutting down");
                Ok(())
            }
        }
    })?;

    drop(listener);
    Ok(())
}

/// Print classified feedback traffic until Ctrl+C.
fn monitor(config: Config, raw: bool) -> Result<()> {
    let store = FeedbackStore::new();
    let listener = FeedbackListener::bind(config.osc.listen_addr(), store)
        .with_context(|| format!("failed to bind feedback port {}", config.osc.listen_port))?;
    let events = listener.subscribe();

    // Announce ourselves so the workstation starts sending feedback.
    let surface = SurfaceClient::new(&config.osc.target)?;
    surface.set_surface(0, config.osc.strip_types, config.osc.feedback)?;

    let term = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&term))
        .context("failed to register signal handler")?;
    signal_hook::flag::register(signal_hook::consts::SIGTERM, Arc::clone(&term))
        .context("failed to register signal handler")?;

    println!("monitoring feedback from {} (Ctrl+C to stop)", config.osc.target);
    while !term.load(Ordering::Relaxed) {
        match events.recv_timeout(Duration::from_millis(200)) {
            Ok(event) => {
                if !raw && event.classified == Classified::Unclassified {
                    continue;
                }
                println!("{:40} {}", event.addr, summarize(&event.classified));
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => continue,
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
        }
    }
    Ok(())
}

/// One-line rendering of a classified event.
fn summarize(classified: &Classified) -> String {
    match classified {
        Classified::StripProperty {
            ssid,
            property,
            value,
        } => format!("strip {} {} = {:?}", ssid, property, value),
        Classified::StripDescriptor(info) => format!(
            "descriptor: {} \"{}\" ({}) {}x{}",
            info.id, info.name, info.kind, info.inputs, info.outputs
        ),
        Classified::PluginEntry {
            ssid,
            plugin_id,
            name,
            enabled,
        } => format!(
            "plugin {} on strip {}: \"{}\"{}",
            plugin_id,
            ssid,
            name,
            if *enabled { "" } else { " (bypassed)" }
        ),
        Classified::PluginParamDescriptor {
            param_id,
            name,
            value,
            min,
            max,
            ..
        } => format!(
            "param {} \"{}\" = {:.3} [{:.3}..{:.3}]",
            param_id, name, value, min, max
        ),
        Classified::PluginParamValue { param_id, value } => {
            format!("param {} = {:.3}", param_id, value)
        }
        Classified::Selection(event) => format!("selection: {:?}", event),
        Classified::EndOfList { .. } => "end of enumeration".to_string(),
        Classified::Unclassified => "(unclassified)".to_string(),
    }
}

/// One-shot strip discovery.
fn strips(config: Config, timeout: Duration) -> Result<()> {
    let store = FeedbackStore::new();
    let listener = FeedbackListener::bind(config.osc.listen_addr(), store.clone())
        .with_context(|| format!("failed to bind feedback port {}", config.osc.listen_port))?;

    let surface = SurfaceClient::new(&config.osc.target)?;
    let discovery = DiscoveryOrchestrator::new(surface, store.clone(), &config);
    let summaries = discovery.refresh_strips(timeout)?;

    if summaries.is_empty() {
        println!("no strips discovered (is the workstation running at {}?)", config.osc.target);
    } else {
        println!("{:>5}  {:4}  {:24}  {:>3} {:>3}  {:4} {:4}", "SSID", "KIND", "NAME", "IN", "OUT", "MUTE", "SOLO");
        for summary in &summaries {
            let details = store.strip_details(summary.id);
            let (kind, inputs, outputs) = details
                .map(|d| (d.kind.as_str().to_string(), d.inputs, d.outputs))
                .unwrap_or_else(|| ("?".to_string(), 0, 0));
            println!(
                "{:>5}  {:4}  {:24}  {:>3} {:>3}  {:4} {:4}",
                summary.id.as_i32(),
                kind,
                summary.name,
                inputs,
                outputs,
                if summary.muted { "yes" } else { "-" },
                if summary.soloed { "yes" } else { "-" },
            );
        }
    }

    drop(listener);
    Ok(())
}

/// Send one raw OSC message.
fn send(config: &Config, address: &str, args: &[String]) -> Result<()> {
    let address = if address.starts_with('/') {
        address.to_string()
    } else {
        format!("/{}", address)
    };
    let osc_args: Vec<rosc::OscType> = args.iter().map(|a| parse_arg(a)).collect();

    let client = OscClient::new(&config.osc.target)?;
    client.send_msg(&address, osc_args.clone())?;
    println!("sent {} {:?} to {}", address, osc_args, config.osc.target);
    Ok(())
}

/// Parse a CLI argument into an OSC value: int first, then float,
/// then string.
fn parse_arg(arg: &str) -> rosc::OscType {
    if let Ok(i) = arg.parse::<i32>() {
        return rosc::OscType::Int(i);
    }
    if let Ok(f) = arg.parse::<f32>() {
        return rosc::OscType::Float(f);
    }
    rosc::OscType::String(arg.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_arg_precedence() {
        assert_eq!(parse_arg("3"), rosc::OscType::Int(3));
        assert_eq!(parse_arg("-6.5"), rosc::OscType::Float(-6.5));
        assert_eq!(
            parse_arg("Main/Save"),
            rosc::OscType::String("Main/Save".to_string())
        );
    }

    #[test]
    fn test_summarize_end_of_list() {
        let text = summarize(&Classified::EndOfList {
            framerate: None,
            frames: None,
        });
        assert_eq!(text, "end of enumeration");
    }
}
