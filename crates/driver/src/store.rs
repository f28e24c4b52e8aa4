use crate::state::{EngineState, GlobCtrl, Group, Submode, TrackCtrl, TrackState};
use log::trace;

/// Settings local to the controller, mirrored nowhere else.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum DeviceSetting {
    Submode(Submode),
    Shifted(bool),
    Sessions(Vec<String>),
    SessionsLast(Option<u8>),
    ConfirmSave(Option<u8>),
    GroupSelected(usize),
    GroupSelecting(bool),
    GroupSolo(Option<usize>),
    PrevLoopSelection(Option<Vec<i32>>),
    Show8ths(bool),
    ShowSource(bool),
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Action {
    Track { track: i32, ctrl: TrackCtrl, value: f32 },
    EmptyTrack(i32),
    Device(DeviceSetting),
    Glob { ctrl: GlobCtrl, value: f32 },
    /// Replaces a whole group entry.
    AssocGroup(Group),
    OffsetUp,
    OffsetDown,
    LoopCount(i32),
    Batch(Vec<Action>),
    /// Anything this driver does not understand yet. Leaves the state alone.
    Unknown { tag: String },
}

impl Action {
    pub fn track(track: i32, ctrl: TrackCtrl, value: f32) -> Self {
        Action::Track { track, ctrl, value }
    }

    pub fn glob(ctrl: GlobCtrl, value: f32) -> Self {
        Action::Glob { ctrl, value }
    }
}

pub(crate) fn reduce(mut state: EngineState, action: &Action) -> EngineState {
    match action {
        Action::Track { track, ctrl, value } => {
            state.tracks.entry(*track).or_default().set(*ctrl, *value);
        }
        Action::EmptyTrack(lp) => {
            state.tracks.insert(*lp, TrackState::default());
        }
        Action::Device(setting) => apply_device(&mut state, setting.clone()),
        Action::Glob { ctrl, value } => state.glob.set(*ctrl, *value),
        Action::AssocGroup(group) => {
            state.device.groups.insert(group.num, group.clone());
        }
        Action::OffsetUp => {
            state.device.loop_offset = (state.device.loop_offset + 1).min(1);
        }
        Action::OffsetDown => {
            state.device.loop_offset = (state.device.loop_offset - 1).max(state.min_offset());
        }
        Action::LoopCount(count) => state.loop_count = (*count).max(0),
        Action::Batch(actions) => {
            for action in actions {
                state = reduce(state, action);
            }
        }
        Action::Unknown { tag } => trace!("Ignoring unknown action {tag}"),
    }
    state
}

fn apply_device(state: &mut EngineState, setting: DeviceSetting) {
    let device = &mut state.device;
    match setting {
        DeviceSetting::Submode(submode) => device.submode = submode,
        DeviceSetting::Shifted(v) => device.shifted = v,
        DeviceSetting::Sessions(v) => device.sessions = v,
        DeviceSetting::SessionsLast(v) => device.sessions_last = v,
        DeviceSetting::ConfirmSave(v) => device.confirm_save = v,
        DeviceSetting::GroupSelected(v) => device.group_selected = v,
        DeviceSetting::GroupSelecting(v) => device.group_selecting = v,
        DeviceSetting::GroupSolo(v) => device.group_solo = v,
        DeviceSetting::PrevLoopSelection(v) => device.prev_loop_selection = v,
        DeviceSetting::Show8ths(v) => device.show8ths = v,
        DeviceSetting::ShowSource(v) => device.showsource = v,
    }
}

/// Owns the state tree. The only way to change it is `dispatch`.
#[derive(Debug, Default)]
pub(crate) struct Store {
    state: EngineState,
}

impl Store {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn dispatch(&mut self, action: Action) -> &EngineState {
        let state = std::mem::take(&mut self.state);
        self.state = reduce(state, &action);
        &self.state
    }
}
