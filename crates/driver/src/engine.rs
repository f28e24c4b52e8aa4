use crate::osc::OscTransport;
use crate::settings::Timings;
use crate::state::{GlobCtrl, TrackCtrl};
use log::{debug, info, warn};
use rosc::{OscMessage, OscType};
use std::fmt;
use std::time::{Duration, Instant};

/// How a command addresses loops on the engine side.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum LoopAddr {
    Loop(i32),
    /// Inclusive range.
    Range(i32, i32),
    All,
    Selected,
}

impl LoopAddr {
    /// `-1` and `-3` are the engine's own codes for all and selected loops.
    pub fn from_track(track: i32) -> LoopAddr {
        match track {
            -1 => LoopAddr::All,
            -3 => LoopAddr::Selected,
            n => LoopAddr::Loop(n),
        }
    }
}

impl fmt::Display for LoopAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoopAddr::Loop(n) => write!(f, "{n}"),
            LoopAddr::Range(a, b) => write!(f, "[{a}-{b}]"),
            LoopAddr::All => f.write_str("-1"),
            LoopAddr::Selected => f.write_str("-3"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Info {
    pub host: String,
    pub version: String,
    pub loop_count: i32,
}

/// Messages the engine sends back, decoded.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Inbound {
    Pong(Info),
    Info(Info),
    Update { lp: i32, ctrl: String, value: f32 },
    Glob { ctrl: String, value: f32 },
    Error(Vec<OscType>),
    Unhandled(String),
}

impl Inbound {
    /// `None` when a known path carries unexpected arguments.
    pub fn decode(msg: OscMessage) -> Option<Inbound> {
        let OscMessage { addr, args } = msg;
        match addr.as_str() {
            "/pong" => Some(Inbound::Pong(info(&args)?)),
            "/info" => Some(Inbound::Info(info(&args)?)),
            "/update" => Some(Inbound::Update {
                lp: int(args.first()?)?,
                ctrl: string(args.get(1)?)?,
                value: float(args.get(2)?)?,
            }),
            "/glob" => Some(Inbound::Glob {
                ctrl: string(args.get(1)?)?,
                value: float(args.get(2)?)?,
            }),
            "/error" => Some(Inbound::Error(args)),
            _ => Some(Inbound::Unhandled(addr.clone())),
        }
    }
}

fn info(args: &[OscType]) -> Option<Info> {
    Some(Info {
        host: string(args.first()?)?,
        version: string(args.get(1)?)?,
        loop_count: int(args.get(2)?)?,
    })
}

fn string(arg: &OscType) -> Option<String> {
    match arg {
        OscType::String(s) => Some(s.clone()),
        _ => None,
    }
}

fn int(arg: &OscType) -> Option<i32> {
    match arg {
        OscType::Int(v) => Some(*v),
        OscType::Long(v) => i32::try_from(*v).ok(),
        OscType::Float(v) => Some(*v as i32),
        OscType::Double(v) => Some(*v as i32),
        _ => None,
    }
}

fn float(arg: &OscType) -> Option<f32> {
    match arg {
        OscType::Float(v) => Some(*v),
        OscType::Double(v) => Some(*v as f32),
        OscType::Int(v) => Some(*v as f32),
        OscType::Long(v) => Some(*v as f32),
        _ => None,
    }
}

fn s(v: &str) -> OscType {
    OscType::String(v.to_string())
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Phase {
    Probing { since: Instant },
    Connected,
}

/// OSC client for the looper engine. Probes until the first `/pong`, then
/// stays connected for good.
pub(crate) struct EngineLink {
    transport: Box<dyn OscTransport>,
    reply_url: String,
    phase: Phase,
    timings: Timings,
    auto_update_ms: i32,
}

impl EngineLink {
    pub fn new(transport: Box<dyn OscTransport>, timings: Timings, auto_update_ms: i32) -> Self {
        let reply_url = format!("osc.udp://localhost:{}/", transport.reply_port());
        Self {
            transport,
            reply_url,
            phase: Phase::Probing { since: Instant::now() },
            timings,
            auto_update_ms,
        }
    }

    pub fn start(&mut self, now: Instant) {
        info!("Waiting for the looper engine, replies go to {}", self.reply_url);
        self.phase = Phase::Probing { since: now };
    }

    pub fn is_connected(&self) -> bool {
        self.phase == Phase::Connected
    }

    /// One probe step. Returns when to run the next one, `None` once connected.
    pub fn on_probe_timer(&mut self, now: Instant) -> Option<Duration> {
        let Phase::Probing { since } = self.phase else {
            return None;
        };
        let elapsed = now.saturating_duration_since(since);
        if elapsed < self.timings.warmup {
            debug!("Waiting for the looper engine to start ({:.1}s)", elapsed.as_secs_f32());
            return Some(self.timings.warmup_poll);
        }
        debug!("Pinging the looper engine");
        self.ping();
        Some(self.timings.probe_interval)
    }

    /// Returns true on the first pong only.
    pub fn on_pong(&mut self) -> bool {
        if self.is_connected() {
            return false;
        }
        self.phase = Phase::Connected;
        true
    }

    pub fn ping(&mut self) {
        self.request("/ping", vec![], "/pong");
    }

    pub fn register(&mut self) {
        self.request("/register", vec![], "/info");
    }

    /// Asks for pushed updates of every loop control on `addr`.
    pub fn register_loops(&mut self, addr: LoopAddr) {
        let path = format!("/sl/{addr}/register_update");
        for ctrl in TrackCtrl::PUSHED {
            self.request(&path, vec![s(ctrl.as_str())], "/update");
        }
        let path = format!("/sl/{addr}/register_auto_update");
        for ctrl in TrackCtrl::POLLED {
            self.request(
                &path,
                vec![s(ctrl.as_str()), OscType::Int(self.auto_update_ms)],
                "/update",
            );
        }
    }

    pub fn register_globs(&mut self) {
        for ctrl in GlobCtrl::ALL {
            self.request("/register_update", vec![s(ctrl.as_str())], "/glob");
        }
    }

    /// Pulls current values for everything `register_loops` covers.
    pub fn get_loops(&mut self, addr: LoopAddr) {
        let path = format!("/sl/{addr}/get");
        for ctrl in TrackCtrl::PUSHED.into_iter().chain(TrackCtrl::POLLED) {
            self.request(&path, vec![s(ctrl.as_str())], "/update");
        }
    }

    pub fn get_globs(&mut self) {
        for ctrl in GlobCtrl::ALL {
            self.request("/get", vec![s(ctrl.as_str())], "/glob");
        }
    }

    /// Polled updates for whichever loop is selected at the time.
    pub fn register_selected(&mut self, ctrl: TrackCtrl) {
        self.request(
            "/sl/-3/register_auto_update",
            vec![s(ctrl.as_str()), OscType::Int(self.auto_update_ms)],
            "/update",
        );
    }

    pub fn unregister_selected(&mut self, ctrl: TrackCtrl) {
        self.request("/sl/-3/unregister_auto_update", vec![s(ctrl.as_str())], "/update");
    }

    pub fn hit(&mut self, addr: LoopAddr, cmd: &str) {
        self.send(&format!("/sl/{addr}/hit"), vec![s(cmd)]);
    }

    /// Press or release of a sustained command.
    pub fn press(&mut self, addr: LoopAddr, cmd: &str, down: bool) {
        let dir = if down { "down" } else { "up" };
        self.send(&format!("/sl/{addr}/{dir}"), vec![s(cmd)]);
    }

    pub fn set(&mut self, addr: LoopAddr, ctrl: &str, value: f32) {
        self.send(&format!("/sl/{addr}/set"), vec![s(ctrl), OscType::Float(value)]);
    }

    pub fn set_glob(&mut self, ctrl: &str, value: f32) {
        self.send("/set", vec![s(ctrl), OscType::Float(value)]);
    }

    pub fn loop_add(&mut self, channels: i32, seconds: f32) {
        self.send("/loop_add", vec![OscType::Int(channels), OscType::Float(seconds)]);
    }

    /// The engine only supports removing the last loop.
    pub fn loop_del(&mut self) {
        self.send("/loop_del", vec![OscType::Int(-1)]);
    }

    pub fn save_session(&mut self, path: &str) {
        let url = self.reply_url.clone();
        self.send("/save_session", vec![s(path), s(&url), s("/error"), OscType::Int(1)]);
    }

    pub fn load_session(&mut self, path: &str) {
        let url = self.reply_url.clone();
        self.send("/load_session", vec![s(path), s(&url), s("/error")]);
    }

    /// Sends with our reply-to address and path appended.
    fn request(&mut self, addr: &str, mut args: Vec<OscType>, reply_path: &str) {
        args.push(s(&self.reply_url));
        args.push(s(reply_path));
        self.send(addr, args);
    }

    fn send(&mut self, addr: &str, args: Vec<OscType>) {
        let msg = OscMessage { addr: addr.to_string(), args };
        if let Err(e) = self.transport.send(msg) {
            warn!("Sending {addr} failed: {e}");
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    pub(crate) struct RecordingTransport(pub Rc<RefCell<Vec<OscMessage>>>);

    impl OscTransport for RecordingTransport {
        fn send(&mut self, msg: OscMessage) -> anyhow::Result<()> {
            self.0.borrow_mut().push(msg);
            Ok(())
        }

        fn reply_port(&self) -> u16 {
            9000
        }
    }

    pub(crate) fn link() -> (EngineLink, Rc<RefCell<Vec<OscMessage>>>) {
        let transport = RecordingTransport::default();
        let sent = transport.0.clone();
        (EngineLink::new(Box::new(transport), Timings::default(), 100), sent)
    }

    #[test]
    fn formats_loop_addresses() {
        assert_eq!(LoopAddr::Loop(3).to_string(), "3");
        assert_eq!(LoopAddr::Range(0, 4).to_string(), "[0-4]");
        assert_eq!(LoopAddr::from_track(-1).to_string(), "-1");
        assert_eq!(LoopAddr::Selected.to_string(), "-3");
    }

    #[test]
    fn probes_only_after_warmup() {
        let (mut engine, sent) = link();
        let t0 = Instant::now();
        engine.start(t0);

        let mut at = t0;
        let mut pings = Vec::new();
        while at <= t0 + Duration::from_secs(15) {
            let before = sent.borrow().len();
            let next = engine.on_probe_timer(at).unwrap();
            if sent.borrow().len() > before {
                pings.push(at - t0);
            }
            at += next;
        }

        assert!(!engine.is_connected());
        assert_eq!(
            pings,
            vec![Duration::from_secs(10), Duration::from_secs(12), Duration::from_secs(14)]
        );
        let ping = &sent.borrow()[0];
        assert_eq!(ping.addr, "/ping");
        assert_eq!(ping.args, vec![s("osc.udp://localhost:9000/"), s("/pong")]);
    }

    #[test]
    fn stops_probing_once_connected() {
        let (mut engine, sent) = link();
        let t0 = Instant::now();
        engine.start(t0);
        assert!(engine.on_pong());
        assert!(!engine.on_pong());
        assert_eq!(engine.on_probe_timer(t0 + Duration::from_secs(20)), None);
        assert!(sent.borrow().is_empty());
    }

    #[test]
    fn registration_carries_reply_address() {
        let (mut engine, sent) = link();
        engine.register_loops(LoopAddr::Range(0, 1));
        let sent = sent.borrow();
        assert_eq!(sent.len(), TrackCtrl::PUSHED.len() + TrackCtrl::POLLED.len());
        assert_eq!(sent[0].addr, "/sl/[0-1]/register_update");
        let auto = sent.iter().find(|m| m.addr.ends_with("register_auto_update")).unwrap();
        assert_eq!(
            auto.args,
            vec![s("state"), OscType::Int(100), s("osc.udp://localhost:9000/"), s("/update")]
        );
    }

    #[test]
    fn decodes_engine_replies() {
        let msg = OscMessage {
            addr: "/info".to_string(),
            args: vec![s("osc.udp://host:9951/"), s("1.7.9"), OscType::Int(2)],
        };
        assert_eq!(
            Inbound::decode(msg),
            Some(Inbound::Info(Info {
                host: "osc.udp://host:9951/".to_string(),
                version: "1.7.9".to_string(),
                loop_count: 2,
            }))
        );

        let msg = OscMessage {
            addr: "/update".to_string(),
            args: vec![OscType::Int(0), s("state"), OscType::Float(2.0)],
        };
        assert_eq!(
            Inbound::decode(msg),
            Some(Inbound::Update { lp: 0, ctrl: "state".to_string(), value: 2.0 })
        );

        let short = OscMessage { addr: "/glob".to_string(), args: vec![OscType::Int(0)] };
        assert_eq!(Inbound::decode(short), None);

        let other = OscMessage { addr: "/sessions".to_string(), args: vec![] };
        assert_eq!(Inbound::decode(other), Some(Inbound::Unhandled("/sessions".to_string())));
    }
}
