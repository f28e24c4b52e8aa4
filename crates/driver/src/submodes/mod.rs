//! Pad and button interpretation per submode.

mod default;
mod groups;
mod levels;
mod pan;
mod sessions;
mod sync;

use crate::controller::Timer;
use crate::engine::EngineLink;
use crate::sessions::SessionStore;
use crate::settings::Timings;
use crate::state::{EngineState, Submode, TrackState};
use crate::store::{Action, DeviceSetting, Store};
use apc_library::controls::{Buttons, EventType, pad_col, pad_row};
use apc_library::timer::Scheduler;
use log::warn;
use std::time::Instant;

pub(crate) use default::DefaultMode;
pub(crate) use levels::{Level1, Level2};
pub(crate) use pan::PanMode;
pub(crate) use sessions::{SessionLoad, SessionSave};
pub(crate) use sync::SyncMode;

/// Everything a handler may touch while reacting to one input event.
pub(crate) struct Context<'a> {
    pub store: &'a mut Store,
    pub engine: &'a mut EngineLink,
    pub timers: &'a mut Scheduler<Timer>,
    pub sessions: &'a dyn SessionStore,
    pub timings: Timings,
    pub now: Instant,
}

impl Context<'_> {
    pub fn state(&self) -> &EngineState {
        self.store.state()
    }

    pub fn dispatch(&mut self, action: Action) {
        self.store.dispatch(action);
    }

    pub fn set_device(&mut self, setting: DeviceSetting) {
        self.dispatch(Action::Device(setting));
    }

    /// Re-reads the session directory into the state.
    pub fn refresh_sessions(&mut self) {
        match self.sessions.list() {
            Ok(names) => self.set_device(DeviceSetting::Sessions(names)),
            Err(e) => warn!("Can't list sessions: {e:#}"),
        }
    }
}

/// A pad event resolved against the current loop offset.
#[derive(Clone, Debug)]
pub(crate) struct PadArgs {
    pub pad: u8,
    pub row: usize,
    pub col: usize,
    /// Loop shown on the pad's row, `-1` for the top row.
    pub track: i32,
    /// State of that loop. The top row borrows loop 0.
    pub state_track: Option<TrackState>,
    pub kind: EventType,
}

impl PadArgs {
    pub fn new(state: &EngineState, pad: u8, kind: EventType) -> Self {
        let row = pad_row(pad);
        let track = state.row_loop(row);
        let state_track = state.track(track.max(0)).cloned();
        Self {
            pad,
            row,
            col: pad_col(pad),
            track,
            state_track,
            kind,
        }
    }

    pub fn pressed(&self) -> bool {
        self.kind == EventType::NoteOn
    }
}

pub(crate) trait SubmodeHandler {
    fn set_active(&mut self, _active: bool, _cx: &mut Context) {}

    /// Returns true when the event was consumed.
    fn on_pad(&mut self, args: &PadArgs, cx: &mut Context) -> bool;

    fn on_button(&mut self, _button: Buttons, _kind: EventType, _shifted: bool, _cx: &mut Context) -> bool {
        false
    }
}

/// One handler per submode, kept alive across switches so held modifiers
/// survive.
#[derive(Default)]
pub(crate) struct Submodes {
    default: DefaultMode,
    level1: Level1,
    level2: Level2,
    pan: PanMode,
    sync: SyncMode,
    session_save: SessionSave,
    session_load: SessionLoad,
}

impl Submodes {
    pub fn get_mut(&mut self, submode: Submode) -> &mut dyn SubmodeHandler {
        match submode {
            Submode::Default => &mut self.default,
            Submode::Level1 => &mut self.level1,
            Submode::Level2 => &mut self.level2,
            Submode::Pan => &mut self.pan,
            Submode::Sync => &mut self.sync,
            Submode::SessionSave => &mut self.session_save,
            Submode::SessionLoad => &mut self.session_load,
        }
    }
}
