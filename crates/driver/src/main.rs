mod controller;
mod engine;
mod event;
mod logging;
mod osc;
mod render;
mod self_test;
mod sessions;
mod settings;
mod state;
mod store;
mod submodes;

use crate::controller::Controller;
use crate::engine::EngineLink;
use crate::event::Event;
use crate::osc::UdpTransport;
use crate::self_test::self_test;
use crate::sessions::SessionDir;
use crate::settings::Settings;
use anyhow::{Context, anyhow};
use apc_library::lights::{LedProtocol, Mk1, Mk2};
use apc_library::surface::{LedSurface, MidiSink};
use clap::Parser;
use config::Config;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use log::{info, trace, warn};
use midir::{MidiInput, MidiInputConnection, MidiOutput, MidiOutputConnection};
use std::net::{SocketAddr, ToSocketAddrs};
use std::thread;
use std::time::{Duration, Instant};

/// How often the controller's ports are checked for a disconnect.
const PORT_WATCH_INTERVAL: Duration = Duration::from_secs(2);

#[derive(Parser, Debug)]
#[clap(
    name = "APC Key 25 SooperLooper remote",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
)]
struct Args {
    #[clap(short, long, help = "Config file (TOML, YAML or JSON)")]
    config: Option<String>,

    #[clap(short, long, help = "Looper engine OSC port, overrides the config file")]
    engine_port: Option<u16>,

    #[clap(long, help = "Skip the LED sweep on startup")]
    no_self_test: bool,
}

struct MidiOut(MidiOutputConnection);

impl MidiSink for MidiOut {
    fn send(&mut self, bytes: &[u8]) -> anyhow::Result<()> {
        self.0.send(bytes).context("MIDI send failed")
    }
}

fn load_settings(args: &Args) -> anyhow::Result<Settings> {
    let mut cfg = Config::builder();
    if let Some(config_fn) = &args.config {
        cfg = cfg.add_source(config::File::with_name(config_fn));
    }
    let mut settings: Settings = cfg
        .build()
        .context("Can't read settings")?
        .try_deserialize()
        .context("Can't parse settings")?;

    if let Some(port) = args.engine_port {
        settings.engine_port = port;
    }
    if args.no_self_test {
        settings.self_test = false;
    }
    settings.validate().map_err(|e| anyhow!(e))?;
    Ok(settings)
}

fn find_port<T>(ports: Vec<T>, name: impl Fn(&T) -> Option<String>, wanted: &str) -> Option<(T, String)> {
    ports.into_iter().find_map(|port| {
        let port_name = name(&port)?;
        port_name.contains(wanted).then_some((port, port_name))
    })
}

fn open_input(settings: &Settings, events: Sender<Event>) -> anyhow::Result<MidiInputConnection<()>> {
    let input = MidiInput::new(&format!("{} In", settings.client_name))
        .map_err(|e| anyhow!("Couldn't open MIDI input: {e}"))?;
    let (port, name) = find_port(input.ports(), |p| input.port_name(p).ok(), &settings.port_name_in)
        .ok_or_else(|| anyhow!("No MIDI input matching {:?}", settings.port_name_in))?;
    info!("Reading from {name}");

    input
        .connect(
            &port,
            &settings.port_name_in,
            move |_timestamp, message, _| {
                // fails only once the dispatch loop is gone
                let _ = events.send(Event::Midi(message.to_vec()));
            },
            (),
        )
        .map_err(|e| anyhow!("Couldn't connect to {name}: {e}"))
}

fn open_output(settings: &Settings) -> anyhow::Result<MidiOut> {
    let output = MidiOutput::new(&format!("{} Out", settings.client_name))
        .map_err(|e| anyhow!("Couldn't open MIDI output: {e}"))?;
    let (port, name) = find_port(output.ports(), |p| output.port_name(p).ok(), &settings.port_name_out)
        .ok_or_else(|| anyhow!("No MIDI output matching {:?}", settings.port_name_out))?;
    info!("Writing to {name}");

    let conn = output
        .connect(&port, &settings.port_name_out)
        .map_err(|e| anyhow!("Couldn't connect to {name}: {e}"))?;
    Ok(MidiOut(conn))
}

/// Asks the loop to stop once the controller's input port goes away.
fn spawn_port_watch(settings: &Settings, events: Sender<Event>) -> anyhow::Result<()> {
    let client = format!("{} Watch", settings.client_name);
    let wanted = settings.port_name_in.clone();
    thread::Builder::new()
        .name("midi-watch".to_string())
        .spawn(move || {
            loop {
                thread::sleep(PORT_WATCH_INTERVAL);
                let present = match MidiInput::new(&client) {
                    Ok(input) => find_port(input.ports(), |p| input.port_name(p).ok(), &wanted).is_some(),
                    Err(e) => {
                        warn!("Can't enumerate MIDI ports: {e}");
                        true
                    }
                };
                if !present {
                    warn!("Controller disconnected");
                    let _ = events.send(Event::Shutdown);
                    return;
                }
            }
        })?;
    Ok(())
}

fn engine_addr(settings: &Settings) -> anyhow::Result<SocketAddr> {
    (settings.engine_host.as_str(), settings.engine_port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| anyhow!("Can't resolve {}", settings.engine_host))
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    logging::init_logger();

    let settings = load_settings(&args)?;
    info!("Running with settings:");
    info!("{settings:?}");

    let (tx, rx) = crossbeam_channel::unbounded();

    let protocol: Box<dyn LedProtocol> = if settings.is_mk1() {
        Box::new(Mk1)
    } else {
        Box::new(Mk2)
    };
    let mut surface = LedSurface::new(Box::new(open_output(&settings)?), protocol);
    if settings.self_test {
        self_test(&mut surface)?;
    }

    let transport = UdpTransport::bind(engine_addr(&settings)?)?;
    transport.spawn_listener(tx.clone())?;
    let engine = EngineLink::new(
        Box::new(transport),
        settings.timings(),
        settings.auto_update_interval_ms,
    );
    let sessions = SessionDir::new(&settings.session_path, &settings.session_extension);

    let mut controller = Controller::new(engine, surface, Box::new(sessions), settings.timings());

    let _input = open_input(&settings, tx.clone())?;
    spawn_port_watch(&settings, tx)?;

    controller.start(Instant::now());
    main_loop(&mut controller, &rx);

    info!("Shutting down");
    controller.shutdown();
    Ok(())
}

/// Runs until a shutdown event arrives or every producer is gone.
fn main_loop(controller: &mut Controller, events: &Receiver<Event>) {
    loop {
        let first = match controller.next_deadline() {
            Some(deadline) => {
                let timeout = deadline.saturating_duration_since(Instant::now());
                match events.recv_timeout(timeout) {
                    Ok(event) => Some(event),
                    Err(RecvTimeoutError::Timeout) => None,
                    Err(RecvTimeoutError::Disconnected) => return,
                }
            }
            None => match events.recv() {
                Ok(event) => Some(event),
                Err(_) => return,
            },
        };

        let mut pending = first.into_iter().collect::<Vec<_>>();
        loop {
            match events.try_recv() {
                Ok(event) => pending.push(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return,
            }
        }

        for event in pending {
            let now = Instant::now();
            match event {
                Event::Midi(bytes) => controller.handle_midi(&bytes, now),
                Event::Osc(msg) => controller.handle_osc(msg, now),
                Event::Shutdown => return,
            }
        }

        controller.fire_due(Instant::now());
        controller.render();
        trace!("Next wakeup {:?}", controller.next_deadline());
    }
}
