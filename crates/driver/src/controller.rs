use crate::engine::{EngineLink, Inbound, Info, LoopAddr};
use crate::render::{TRACK_LEVELS, diff, render};
use crate::sessions::SessionStore;
use crate::settings::Timings;
use crate::state::{EngineState, GlobCtrl, Submode, TrackCtrl, TrackState};
use crate::store::{Action, DeviceSetting, Store};
use crate::submodes::{Context, PadArgs, SubmodeHandler, Submodes};
use apc_library::colors::SoftKey;
use apc_library::controls::{Buttons, EventType, KNOB_CC_START, KNOBS, KNOBS_PER_ROW, MidiEvent};
use apc_library::inputs::{AutoLatch, KnobEase};
use apc_library::lights::{LedInstruction, LedMode};
use apc_library::surface::LedSurface;
use apc_library::timer::Scheduler;
use log::{debug, info, trace, warn};
use rosc::OscMessage;
use std::time::{Duration, Instant};

/// How long a scroll button lights up after a press.
const SCROLL_FLASH: Duration = Duration::from_millis(150);

/// Deferred work owned by the dispatch loop.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) enum Timer {
    Probe,
    /// Pulls current values after registering. `None` only pulls globals.
    InitialSweep(Option<LoopAddr>),
    RefreshSessions,
    Reping,
}

/// Mode a mode-select button switches to. Button `n` (counted from the
/// volume button) owns submodes `3n+1` and `3n+2`.
pub(crate) fn next_submode(current: Submode, button: Buttons) -> Submode {
    let index = 3 * (button as i32 - Buttons::KnobCtrlVolume as i32);
    let current_num = current as i32;
    let next = if current == Submode::Default {
        index + 1
    } else if current_num == index + 1 {
        current_num + 1
    } else if current_num == index + 2 || index == Submode::SessionSave as i32 - 1 {
        Submode::Default as i32
    } else {
        index + 1
    };
    Submode::from_num(next).unwrap_or_default()
}

/// New value of `ctrl` after a knob turn, `None` while the engine has not
/// reported it yet.
fn increased(track: &TrackState, ctrl: TrackCtrl, delta: f32) -> Option<f32> {
    let current = track.get(ctrl)?;
    Some(if ctrl == TrackCtrl::PitchShift {
        (current + delta).clamp(-12.0, 12.0)
    } else {
        (current + delta * 0.1).clamp(0.0, 1.0)
    })
}

/// Engine writes for a knob turn: `(loop, control, value)`.
fn knob_sets(state: &EngineState, knob: usize, delta: f32, shifted: bool) -> Vec<(i32, TrackCtrl, f32)> {
    let mut out = Vec::new();

    if state.device.submode == Submode::Level2 {
        let Some(ctrl) = TRACK_LEVELS[knob].filter(|_| knob > 0) else {
            return out;
        };
        let Some(lp) = state.selected_loop().filter(|lp| *lp >= 0) else {
            return out;
        };
        if let Some(value) = state.track(lp).and_then(|t| increased(t, ctrl, delta)) {
            out.push((lp, ctrl, value));
        }
        return out;
    }

    let lp = (knob % KNOBS_PER_ROW) as i32 - (state.device.loop_offset - 1);
    let Some(track) = state.track(lp) else {
        return out;
    };
    if knob / KNOBS_PER_ROW == 0 {
        out.extend(increased(track, TrackCtrl::Wet, delta).map(|v| (lp, TrackCtrl::Wet, v)));
        return out;
    }

    let channels = track.get(TrackCtrl::ChannelCount).unwrap_or(0.0) as usize;
    let pan = |c: usize| TrackCtrl::pan(c).and_then(|p| track.get(p)).unwrap_or(0.0);
    for channel in 1..=channels {
        let Some(ctrl) = TrackCtrl::pan(channel) else {
            break;
        };
        // stereo loops keep left and right from crossing unless shifted
        let step = match (shifted, channels, channel) {
            (true, 2, 2) => Some(-delta),
            (true, _, _) => Some(delta),
            (false, 2, 1) => (delta < 0.0 || pan(2) >= 0.5).then_some(delta),
            (false, 2, 2) => (delta > 0.0 || pan(1) <= 0.5).then_some(delta),
            _ => Some(delta),
        };
        if let Some(value) = step.and_then(|d| increased(track, ctrl, d)) {
            out.push((lp, ctrl, value));
        }
    }
    out
}

/// Owns the state and every device-facing component. All events are fed
/// in from a single thread.
pub(crate) struct Controller {
    store: Store,
    engine: EngineLink,
    surface: LedSurface,
    sessions: Box<dyn SessionStore>,
    timings: Timings,
    timers: Scheduler<Timer>,
    submodes: Submodes,
    shift: AutoLatch,
    knobs: KnobEase,
    frame: Vec<LedInstruction>,
}

impl Controller {
    pub fn new(engine: EngineLink, surface: LedSurface, sessions: Box<dyn SessionStore>, timings: Timings) -> Self {
        Self {
            store: Store::new(),
            engine,
            surface,
            sessions,
            timings,
            timers: Scheduler::new(),
            submodes: Submodes::default(),
            shift: AutoLatch::new(),
            knobs: KnobEase::new(),
            frame: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> &EngineState {
        self.store.state()
    }

    pub fn start(&mut self, now: Instant) {
        if let Err(e) = self.surface.all_off() {
            warn!("Can't clear LEDs: {e:#}");
        }
        self.frame.clear();
        let submode = self.submode();
        self.with_handler(submode, now, |h, cx| h.set_active(true, cx));
        self.engine.start(now);
        self.timers.add(Timer::Probe, now);
        self.render();
    }

    /// Leaves the controller dark.
    pub fn shutdown(&mut self) {
        if let Err(e) = self.surface.all_off() {
            warn!("Can't clear LEDs: {e:#}");
        }
        self.surface.reset();
        self.frame.clear();
    }

    fn submode(&self) -> Submode {
        self.store.state().device.submode
    }

    fn with_handler<R>(
        &mut self,
        submode: Submode,
        now: Instant,
        f: impl FnOnce(&mut dyn SubmodeHandler, &mut Context<'_>) -> R,
    ) -> R {
        let mut cx = Context {
            store: &mut self.store,
            engine: &mut self.engine,
            timers: &mut self.timers,
            sessions: self.sessions.as_ref(),
            timings: self.timings,
            now,
        };
        f(self.submodes.get_mut(submode), &mut cx)
    }

    pub fn handle_midi(&mut self, bytes: &[u8], now: Instant) {
        let Some(event) = MidiEvent::parse(bytes) else {
            trace!("Ignoring MIDI message {bytes:02x?}");
            return;
        };
        match event.kind {
            EventType::ControlChange => self.on_knob(event.data1, event.data2, now),
            kind if event.is_pad() => {
                let args = PadArgs::new(self.store.state(), event.data1, kind);
                let submode = self.submode();
                self.with_handler(submode, now, |h, cx| h.on_pad(&args, cx));
            }
            kind => match Buttons::from_note(event.data1) {
                Some(button) => self.on_button(button, kind, now),
                None => trace!("Ignoring note {}", event.data1),
            },
        }
    }

    fn on_button(&mut self, button: Buttons, kind: EventType, now: Instant) {
        let pressed = kind == EventType::NoteOn;
        let shifted = self.store.state().device.shifted;

        if button.is_mode_select() {
            if pressed {
                let next = next_submode(self.submode(), button);
                self.switch_submode(next, now);
            }
            return;
        }

        if shifted && button.is_soft_key() {
            if pressed {
                self.select_loop(button);
            }
            return;
        }

        let submode = self.submode();
        if self.with_handler(submode, now, |h, cx| h.on_button(button, kind, shifted, cx)) {
            return;
        }

        match button {
            Buttons::StopAllClips if pressed => {
                let cmd = if shifted { "mute_off" } else { "mute_on" };
                self.engine.hit(LoopAddr::All, cmd);
            }
            Buttons::StopAllClips => self.engine.ping(),
            Buttons::Shift => {
                let held = self.shift.feed_at(button as u8, kind, now);
                self.store.dispatch(Action::Device(DeviceSetting::Shifted(held)));
            }
            Buttons::Track1 | Buttons::Track2 if shifted && pressed => {
                let action = if button == Buttons::Track1 {
                    Action::OffsetUp
                } else {
                    Action::OffsetDown
                };
                self.store.dispatch(action);
                let flashed = self.surface.flash(
                    button as u8,
                    SoftKey::On as u8,
                    LedMode::BUTTON,
                    SCROLL_FLASH,
                    now,
                );
                if let Err(e) = flashed {
                    warn!("Can't light {button:?}: {e:#}");
                }
            }
            _ => trace!("Unhandled {button:?} {kind:?}"),
        }
    }

    /// The new handler is activated before the old one lets go.
    fn switch_submode(&mut self, next: Submode, now: Instant) {
        let current = self.submode();
        debug!("Submode {current:?} -> {next:?}");
        self.with_handler(next, now, |h, cx| h.set_active(true, cx));
        self.with_handler(current, now, |h, cx| h.set_active(false, cx));
        self.store.dispatch(Action::Device(DeviceSetting::Submode(next)));
    }

    fn select_loop(&mut self, button: Buttons) {
        let state = self.store.state();
        let row = (button as u8 - Buttons::SoftKeyClipStop as u8) as usize;
        let lp = state.row_loop(row);
        if lp >= state.loop_count {
            return;
        }
        let ctrl = GlobCtrl::SelectedLoopNum;
        self.store.dispatch(Action::glob(ctrl, lp as f32));
        self.engine.set_glob(ctrl.as_str(), lp as f32);
    }

    fn on_knob(&mut self, cc: u8, value: u8, now: Instant) {
        let Some(knob) = cc.checked_sub(KNOB_CC_START).filter(|k| *k < KNOBS) else {
            trace!("Ignoring CC {cc}");
            return;
        };
        let state = self.store.state();
        let shifted = state.device.shifted;
        let Some(delta) = self.knobs.feed_at(cc, value, shifted, now) else {
            return;
        };
        for (lp, ctrl, value) in knob_sets(state, knob as usize, delta, shifted) {
            self.engine.set(LoopAddr::Loop(lp), ctrl.as_str(), value);
        }
    }

    pub fn handle_osc(&mut self, msg: OscMessage, now: Instant) {
        let path = msg.addr.clone();
        let Some(inbound) = Inbound::decode(msg) else {
            debug!("Dropping malformed {path} message");
            return;
        };
        match inbound {
            Inbound::Pong(info) => self.on_pong(info, now),
            Inbound::Info(info) => self.on_info(info, now),
            Inbound::Update { lp, ctrl, value } => self.on_update(lp, &ctrl, value),
            Inbound::Glob { ctrl, value } => match ctrl.parse::<GlobCtrl>() {
                Ok(ctrl) => {
                    self.store.dispatch(Action::glob(ctrl, value));
                }
                Err(e) => debug!("Ignoring update: {e}"),
            },
            Inbound::Error(args) => warn!("Engine reported an error: {args:?}"),
            Inbound::Unhandled(path) => {
                self.store.dispatch(Action::Unknown { tag: path });
            }
        }
    }

    fn on_pong(&mut self, info: Info, now: Instant) {
        if self.engine.on_pong() {
            info!(
                "Connected to looper engine {} at {} with {} loops",
                info.version, info.host, info.loop_count
            );
        }
        self.timers.remove(&Timer::Probe);
        self.engine.register();
        self.set_loop_count(info.loop_count);
        self.engine.register_globs();

        let loops = (info.loop_count > 0).then(|| LoopAddr::Range(0, info.loop_count - 1));
        if let Some(addr) = loops {
            self.engine.register_loops(addr);
        }
        self.timers.add_after(Timer::InitialSweep(loops), self.timings.initial_sweep, now);
        self.engine.set_glob("smart_eighths", 0.0);
    }

    fn on_info(&mut self, info: Info, now: Instant) {
        let old = self.set_loop_count(info.loop_count);
        let new = info.loop_count;
        debug!("Loop count {old} -> {new}");
        if new <= old {
            return;
        }
        for lp in old..new {
            self.engine.register_loops(LoopAddr::Loop(lp));
            self.engine.set(LoopAddr::Loop(lp), TrackCtrl::Sync.as_str(), 1.0);
        }
        self.timers.add_after(
            Timer::InitialSweep(Some(LoopAddr::Range(old, new - 1))),
            self.timings.initial_sweep,
            now,
        );
    }

    /// Returns the previous count. Loops that went away are emptied.
    fn set_loop_count(&mut self, count: i32) -> i32 {
        let old = self.store.state().loop_count;
        let mut actions = vec![Action::LoopCount(count)];
        actions.extend((count.max(0)..old).map(Action::EmptyTrack));
        self.store.dispatch(Action::Batch(actions));
        old
    }

    fn on_update(&mut self, lp: i32, ctrl: &str, value: f32) {
        let ctrl = match ctrl.parse::<TrackCtrl>() {
            Ok(ctrl) => ctrl,
            Err(e) => {
                debug!("Ignoring update for loop {lp}: {e}");
                return;
            }
        };
        if ctrl == TrackCtrl::InPeakMeter {
            // the meter is registered on the selected loop, not the reporting one
            let selected = self.store.state().selected_loop();
            match selected {
                Some(selected) if selected >= 0 => {
                    self.store.dispatch(Action::track(selected, ctrl, value * 2.0));
                }
                _ => trace!("No loop selected for the input meter"),
            }
            return;
        }
        self.store.dispatch(Action::track(lp, ctrl, value));
    }

    pub fn fire_due(&mut self, now: Instant) {
        self.surface.fire_due(now);
        for timer in self.timers.take_due(now) {
            match timer {
                Timer::Probe => {
                    if let Some(delay) = self.engine.on_probe_timer(now) {
                        self.timers.add_after(Timer::Probe, delay, now);
                    }
                }
                Timer::InitialSweep(loops) => {
                    if let Some(addr) = loops {
                        self.engine.get_loops(addr);
                    }
                    self.engine.get_globs();
                }
                Timer::RefreshSessions => match self.sessions.list() {
                    Ok(names) => {
                        self.store.dispatch(Action::Device(DeviceSetting::Sessions(names)));
                    }
                    Err(e) => warn!("Can't list sessions: {e:#}"),
                },
                Timer::Reping => self.engine.ping(),
            }
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        [self.timers.next_deadline(), self.surface.next_deadline()]
            .into_iter()
            .flatten()
            .min()
    }

    /// Sends the LED writes that bring the device up to date with the state.
    pub fn render(&mut self) {
        let frame = render(self.store.state());
        for led in diff(&self.frame, &frame) {
            if let Err(e) = self.surface.write(&led) {
                warn!("LED write failed: {e:#}");
            }
        }
        self.frame = frame;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tests::RecordingTransport;
    use crate::sessions::tests::FakeSessions;
    use crate::state::LoopState;
    use apc_library::colors::Color;
    use apc_library::lights::Mk2;
    use apc_library::surface::MidiSink;
    use rosc::OscType;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct Wire(Rc<RefCell<Vec<Vec<u8>>>>);

    impl MidiSink for Wire {
        fn send(&mut self, bytes: &[u8]) -> anyhow::Result<()> {
            self.0.borrow_mut().push(bytes.to_vec());
            Ok(())
        }
    }

    struct Rig {
        ctl: Controller,
        wire: Rc<RefCell<Vec<Vec<u8>>>>,
        osc: Rc<RefCell<Vec<OscMessage>>>,
        now: Instant,
    }

    impl Rig {
        fn new() -> Self {
            let transport = RecordingTransport::default();
            let osc = transport.0.clone();
            let engine = EngineLink::new(Box::new(transport), Timings::default(), 100);
            let wire = Wire::default();
            let bytes = wire.0.clone();
            let surface = LedSurface::new(Box::new(wire), Box::new(Mk2));
            let sessions = Box::new(FakeSessions(vec!["02.slsess".to_string()]));
            let mut ctl = Controller::new(engine, surface, sessions, Timings::default());
            let now = Instant::now();
            ctl.start(now);
            Self { ctl, wire: bytes, osc, now }
        }

        fn osc(&mut self, addr: &str, args: Vec<OscType>) {
            let msg = OscMessage { addr: addr.to_string(), args };
            self.ctl.handle_osc(msg, self.now);
        }

        fn note(&mut self, note: u8, on: bool) {
            let status = if on { 0x90 } else { 0x80 };
            self.ctl.handle_midi(&[status, note, if on { 127 } else { 0 }], self.now);
        }

        fn sent_paths(&self) -> Vec<String> {
            self.osc.borrow_mut().drain(..).map(|m| m.addr).collect()
        }
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    fn info(addr: &str, loops: i32) -> (String, Vec<OscType>) {
        (
            addr.to_string(),
            vec![
                OscType::String("osc.udp://localhost:9951/".into()),
                OscType::String("v1".into()),
                OscType::Int(loops),
            ],
        )
    }

    #[test]
    fn mode_buttons_cycle_through_their_submodes() {
        use Submode::*;
        let vol = Buttons::KnobCtrlVolume;
        assert_eq!(next_submode(Default, vol), Level1);
        assert_eq!(next_submode(Level1, vol), Level2);
        assert_eq!(next_submode(Level2, vol), Default);
        assert_eq!(next_submode(Default, Buttons::KnobCtrlPan), Pan);
        assert_eq!(next_submode(Pan, Buttons::KnobCtrlPan), Default);
        assert_eq!(next_submode(Level2, Buttons::KnobCtrlSend), Sync);
        assert_eq!(next_submode(Sync, Buttons::KnobCtrlSend), Default);
        assert_eq!(next_submode(Default, Buttons::KnobCtrlDevice), SessionSave);
        assert_eq!(next_submode(SessionSave, Buttons::KnobCtrlDevice), SessionLoad);
        assert_eq!(next_submode(SessionLoad, Buttons::KnobCtrlDevice), Default);
        assert_eq!(next_submode(Pan, Buttons::KnobCtrlDevice), Default);
    }

    #[test]
    fn engine_info_and_update_reach_the_pads() {
        let mut rig = Rig::new();
        let (addr, args) = info("/info", 2);
        rig.osc(&addr, args);
        rig.osc(
            "/update",
            vec![OscType::Int(0), OscType::String("state".into()), OscType::Float(2.0)],
        );
        assert_eq!(rig.ctl.state().loop_count, 2);

        let frame = render(rig.ctl.state());
        let at = |pad: u8| *frame.iter().find(|l| l.index == pad).unwrap();
        let red = Color::Red as u8;
        // loop 0 is recording, the playhead rests on the first column
        assert_eq!(at(24), LedInstruction::new(LedMode::Bright100, 24, red));
        assert!((25..32).all(|p| at(p) == LedInstruction::new(LedMode::Bright25, p, red)));
        // loop 1 has not reported anything yet
        assert!((16..24).all(|p| at(p).mode == LedMode::Off));
        // command row in the default submode
        assert!((32..37).all(|p| at(p).mode == LedMode::Bright100));
        assert_eq!(at(37), LedInstruction::new(LedMode::Bright90, 37, LoopState::PlayingOnce.color() as u8));
        assert_eq!(at(39), LedInstruction::new(LedMode::Bright90, 39, LoopState::Paused.color() as u8));
    }

    #[test]
    fn render_only_writes_changes() {
        let mut rig = Rig::new();
        rig.wire.borrow_mut().clear();
        rig.ctl.render();
        assert!(rig.wire.borrow().is_empty());

        let (addr, args) = info("/info", 1);
        rig.osc(&addr, args);
        rig.osc(
            "/update",
            vec![OscType::Int(0), OscType::String("state".into()), OscType::Float(4.0)],
        );
        rig.ctl.render();
        // only the loop's own row changed
        let wire = rig.wire.borrow();
        assert!(!wire.is_empty());
        assert!(wire.iter().all(|msg| (24..32).contains(&msg[1])));
    }

    #[test]
    fn pong_registers_and_schedules_sweep() {
        let mut rig = Rig::new();
        let (addr, args) = info("/pong", 2);
        rig.osc(&addr, args);
        let paths = rig.sent_paths();
        assert_eq!(paths[0], "/register");
        assert!(paths.contains(&"/sl/[0-1]/register_update".to_string()));
        assert_eq!(paths.last().map(String::as_str), Some("/set"));

        rig.ctl.fire_due(rig.now + Duration::from_secs(2));
        let paths = rig.sent_paths();
        assert!(paths.contains(&"/sl/[0-1]/get".to_string()));
        assert!(paths.contains(&"/get".to_string()));
        // connected: no more probes
        rig.ctl.fire_due(rig.now + Duration::from_secs(30));
        assert!(rig.sent_paths().is_empty());
    }

    #[test]
    fn new_loops_get_registered_and_synced() {
        let mut rig = Rig::new();
        let (addr, args) = info("/info", 1);
        rig.osc(&addr, args);
        rig.sent_paths();

        let (addr, args) = info("/info", 2);
        rig.osc(&addr, args);
        let paths = rig.sent_paths();
        assert!(paths.contains(&"/sl/1/register_update".to_string()));
        assert!(paths.contains(&"/sl/1/set".to_string()));
        assert!(!paths.iter().any(|p| p.starts_with("/sl/0/")));

        rig.osc(
            "/update",
            vec![OscType::Int(1), OscType::String("wet".into()), OscType::Float(0.5)],
        );
        let (addr, args) = info("/info", 1);
        rig.osc(&addr, args);
        assert!(rig.ctl.state().track(1).is_some_and(TrackState::is_empty));
    }

    #[test]
    fn input_meter_lands_on_selected_loop() {
        let mut rig = Rig::new();
        let meter = |lp: i32| vec![OscType::Int(lp), OscType::String("in_peak_meter".into()), OscType::Float(0.25)];
        rig.osc("/update", meter(3));
        assert!(rig.ctl.state().tracks.is_empty());

        rig.osc(
            "/glob",
            vec![OscType::Int(0), OscType::String("selected_loop_num".into()), OscType::Float(1.0)],
        );
        rig.osc("/update", meter(3));
        let level = rig.ctl.state().track(1).and_then(|t| t.get(TrackCtrl::InPeakMeter));
        assert_eq!(level, Some(0.5));
    }

    #[test]
    fn shift_scrolls_and_selects_loops() {
        let mut rig = Rig::new();
        let (addr, args) = info("/info", 6);
        rig.osc(&addr, args);
        rig.sent_paths();

        rig.note(Buttons::Shift as u8, true);
        assert!(rig.ctl.state().device.shifted);
        rig.note(Buttons::Track2 as u8, true);
        assert_eq!(rig.ctl.state().device.loop_offset, 0);
        assert!(rig.ctl.next_deadline().is_some());

        // soft key 2 now shows loop 2
        rig.note(Buttons::SoftKeyMute as u8, true);
        assert_eq!(rig.ctl.state().selected_loop(), Some(2));
        assert_eq!(rig.sent_paths(), vec!["/set".to_string()]);

        // a quick tap latched shift; tapping again releases it
        rig.note(Buttons::Shift as u8, false);
        rig.note(Buttons::Shift as u8, true);
        assert!(!rig.ctl.state().device.shifted);
    }

    #[test]
    fn shutdown_drops_pending_flashes() {
        let mut rig = Rig::new();
        rig.note(Buttons::Shift as u8, true);
        rig.note(Buttons::Track2 as u8, true);
        assert!(rig.ctl.surface.next_deadline().is_some());

        rig.ctl.shutdown();
        assert_eq!(rig.ctl.surface.next_deadline(), None);
        assert_eq!(rig.ctl.surface.get(Buttons::Track2 as u8), None);

        rig.wire.borrow_mut().clear();
        rig.ctl.surface.fire_due(rig.now + Duration::from_secs(5));
        assert!(rig.wire.borrow().is_empty());
    }

    #[test]
    fn knobs_adjust_wet_and_pan() {
        let mut rig = Rig::new();
        let (addr, args) = info("/info", 1);
        rig.osc(&addr, args);
        for (ctrl, value) in [("wet", 0.5), ("channel_count", 2.0), ("pan_1", 0.0), ("pan_2", 1.0)] {
            rig.osc(
                "/update",
                vec![OscType::Int(0), OscType::String(ctrl.into()), OscType::Float(value)],
            );
        }
        rig.osc.borrow_mut().clear();

        // knob 1 is wet of the first loop in view
        rig.ctl.handle_midi(&[0xB0, 0x30, 1], rig.now);
        let sent = rig.osc.borrow_mut().drain(..).collect::<Vec<_>>();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].addr, "/sl/0/set");
        assert_eq!(sent[0].args[0], OscType::String("wet".into()));
        assert!(matches!(sent[0].args[1], OscType::Float(v) if close(v, 0.51)));

        // turning pan left moves the left channel to the edge and the right one inward
        let sets = knob_sets(rig.ctl.state(), 4, -0.1, false);
        assert_eq!(sets.len(), 2);
        assert_eq!((sets[0].1, sets[1].1), (TrackCtrl::Pan1, TrackCtrl::Pan2));
        assert!(close(sets[0].2, 0.0) && close(sets[1].2, 0.99));
        // right channel pinned at the edge
        let sets = knob_sets(rig.ctl.state(), 4, 0.1, false);
        assert!(close(sets[0].2, 0.01) && close(sets[1].2, 1.0));
        // shifted spreads the channels apart
        let sets = knob_sets(rig.ctl.state(), 4, 0.1, true);
        assert!(close(sets[0].2, 0.01) && close(sets[1].2, 0.99));
    }

    #[test]
    fn switching_submodes_activates_handlers() {
        let mut rig = Rig::new();
        rig.note(Buttons::KnobCtrlDevice as u8, true);
        assert_eq!(rig.ctl.state().device.submode, Submode::SessionSave);
        assert_eq!(rig.ctl.state().device.sessions, vec!["02.slsess".to_string()]);

        rig.note(Buttons::KnobCtrlVolume as u8, true);
        rig.note(Buttons::KnobCtrlVolume as u8, true);
        assert_eq!(rig.ctl.state().device.submode, Submode::Level2);
        assert!(rig.sent_paths().contains(&"/sl/-3/register_auto_update".to_string()));
    }
}
