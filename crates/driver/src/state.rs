use apc_library::colors::Color;
use apc_library::lights::LedMode;
use num_derive::FromPrimitive;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Per-loop engine controls this driver mirrors.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) enum TrackCtrl {
    State,
    NextState,
    LoopPos,
    LoopLen,
    Wet,
    Dry,
    Pan1,
    Pan2,
    Pan3,
    Pan4,
    ChannelCount,
    Feedback,
    InputGain,
    RecThresh,
    Sync,
    RelativeSync,
    Quantize,
    PlaybackSync,
    MuteQuantized,
    OverdubQuantized,
    ReplaceQuantized,
    Reverse,
    PitchShift,
    InPeakMeter,
}

impl TrackCtrl {
    pub const ALL: [TrackCtrl; 24] = [
        TrackCtrl::State,
        TrackCtrl::NextState,
        TrackCtrl::LoopPos,
        TrackCtrl::LoopLen,
        TrackCtrl::Wet,
        TrackCtrl::Dry,
        TrackCtrl::Pan1,
        TrackCtrl::Pan2,
        TrackCtrl::Pan3,
        TrackCtrl::Pan4,
        TrackCtrl::ChannelCount,
        TrackCtrl::Feedback,
        TrackCtrl::InputGain,
        TrackCtrl::RecThresh,
        TrackCtrl::Sync,
        TrackCtrl::RelativeSync,
        TrackCtrl::Quantize,
        TrackCtrl::PlaybackSync,
        TrackCtrl::MuteQuantized,
        TrackCtrl::OverdubQuantized,
        TrackCtrl::ReplaceQuantized,
        TrackCtrl::Reverse,
        TrackCtrl::PitchShift,
        TrackCtrl::InPeakMeter,
    ];

    /// Registered for change notifications only.
    pub const PUSHED: [TrackCtrl; 19] = [
        TrackCtrl::ChannelCount,
        TrackCtrl::Wet,
        TrackCtrl::Dry,
        TrackCtrl::Pan1,
        TrackCtrl::Pan2,
        TrackCtrl::Pan3,
        TrackCtrl::Pan4,
        TrackCtrl::Feedback,
        TrackCtrl::InputGain,
        TrackCtrl::RecThresh,
        TrackCtrl::Sync,
        TrackCtrl::RelativeSync,
        TrackCtrl::Quantize,
        TrackCtrl::PlaybackSync,
        TrackCtrl::MuteQuantized,
        TrackCtrl::OverdubQuantized,
        TrackCtrl::ReplaceQuantized,
        TrackCtrl::Reverse,
        TrackCtrl::PitchShift,
    ];

    /// Polled by the engine at a fixed interval.
    pub const POLLED: [TrackCtrl; 4] = [
        TrackCtrl::State,
        TrackCtrl::NextState,
        TrackCtrl::LoopPos,
        TrackCtrl::LoopLen,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TrackCtrl::State => "state",
            TrackCtrl::NextState => "next_state",
            TrackCtrl::LoopPos => "loop_pos",
            TrackCtrl::LoopLen => "loop_len",
            TrackCtrl::Wet => "wet",
            TrackCtrl::Dry => "dry",
            TrackCtrl::Pan1 => "pan_1",
            TrackCtrl::Pan2 => "pan_2",
            TrackCtrl::Pan3 => "pan_3",
            TrackCtrl::Pan4 => "pan_4",
            TrackCtrl::ChannelCount => "channel_count",
            TrackCtrl::Feedback => "feedback",
            TrackCtrl::InputGain => "input_gain",
            TrackCtrl::RecThresh => "rec_thresh",
            TrackCtrl::Sync => "sync",
            TrackCtrl::RelativeSync => "relative_sync",
            TrackCtrl::Quantize => "quantize",
            TrackCtrl::PlaybackSync => "playback_sync",
            TrackCtrl::MuteQuantized => "mute_quantized",
            TrackCtrl::OverdubQuantized => "overdub_quantized",
            TrackCtrl::ReplaceQuantized => "replace_quantized",
            TrackCtrl::Reverse => "reverse",
            TrackCtrl::PitchShift => "pitch_shift",
            TrackCtrl::InPeakMeter => "in_peak_meter",
        }
    }

    /// Pan control of channel `n` (1-based).
    pub fn pan(n: usize) -> Option<TrackCtrl> {
        match n {
            1 => Some(TrackCtrl::Pan1),
            2 => Some(TrackCtrl::Pan2),
            3 => Some(TrackCtrl::Pan3),
            4 => Some(TrackCtrl::Pan4),
            _ => None,
        }
    }

    /// Value range shown by the level bars.
    pub fn bounds(self) -> (f32, f32) {
        match self {
            TrackCtrl::PitchShift => (-12.0, 12.0),
            _ => (0.0, 1.0),
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for TrackCtrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrackCtrl {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TrackCtrl::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown loop control {s:?}"))
    }
}

/// Global engine controls this driver mirrors.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub(crate) enum GlobCtrl {
    SyncSource,
    SelectedLoopNum,
    EighthPerCycle,
    Wet,
    Dry,
    InputGain,
}

impl GlobCtrl {
    pub const ALL: [GlobCtrl; 6] = [
        GlobCtrl::SyncSource,
        GlobCtrl::SelectedLoopNum,
        GlobCtrl::EighthPerCycle,
        GlobCtrl::Wet,
        GlobCtrl::Dry,
        GlobCtrl::InputGain,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            GlobCtrl::SyncSource => "sync_source",
            GlobCtrl::SelectedLoopNum => "selected_loop_num",
            GlobCtrl::EighthPerCycle => "eighth_per_cycle",
            GlobCtrl::Wet => "wet",
            GlobCtrl::Dry => "dry",
            GlobCtrl::InputGain => "input_gain",
        }
    }

    /// The global counterpart of a per-loop level, if the engine has one.
    pub fn from_track(ctrl: TrackCtrl) -> Option<GlobCtrl> {
        match ctrl {
            TrackCtrl::Wet => Some(GlobCtrl::Wet),
            TrackCtrl::Dry => Some(GlobCtrl::Dry),
            TrackCtrl::InputGain => Some(GlobCtrl::InputGain),
            _ => None,
        }
    }
}

impl fmt::Display for GlobCtrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GlobCtrl {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GlobCtrl::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown global control {s:?}"))
    }
}

/// Loop state codes reported by the engine.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, FromPrimitive)]
#[repr(i8)]
pub(crate) enum LoopState {
    Unknown = -1,
    Off = 0,
    RecStarting = 1,
    Recording = 2,
    RecStopping = 3,
    Playing = 4,
    Overdubbing = 5,
    Multiplying = 6,
    Inserting = 7,
    Replacing = 8,
    Delaying = 9,
    Muted = 10,
    Scratching = 11,
    PlayingOnce = 12,
    Substituting = 13,
    Paused = 14,
    UndoAll = 15,
    TriggerPlay = 16,
    Undo = 17,
    Redo = 18,
    RedoAll = 19,
    OffMuted = 20,
}

impl LoopState {
    pub fn from_value(value: f32) -> LoopState {
        num::FromPrimitive::from_i32(value as i32).unwrap_or(LoopState::Unknown)
    }

    /// How a loop in this state is drawn: `(color, mode)`.
    pub fn led(self) -> (Color, LedMode) {
        match self {
            LoopState::Unknown => (Color::Black, LedMode::Off),
            LoopState::Off => (Color::White, LedMode::Bright100),
            LoopState::RecStarting => (Color::Red, LedMode::Pulsing16),
            LoopState::Recording => (Color::Red, LedMode::Bright100),
            LoopState::RecStopping => (Color::Red, LedMode::Pulsing8),
            LoopState::Playing => (Color::Green, LedMode::Bright100),
            LoopState::Overdubbing => (Color::Purple, LedMode::Bright100),
            LoopState::Multiplying => (Color::Amber, LedMode::Bright100),
            LoopState::Inserting => (Color::PinkWarm, LedMode::Bright100),
            LoopState::Replacing => (Color::PinkLight, LedMode::Bright100),
            LoopState::Substituting => (Color::Pink, LedMode::Bright100),
            LoopState::Delaying => (Color::Red, LedMode::Bright10),
            LoopState::Muted => (Color::DarkGreen, LedMode::Bright100),
            LoopState::Scratching => (Color::Blue, LedMode::Bright100),
            LoopState::PlayingOnce => (Color::LimeDark, LedMode::Pulsing8),
            LoopState::Paused => (Color::GreenYellow, LedMode::Bright100),
            LoopState::UndoAll => (Color::DarkGrey, LedMode::Bright100),
            LoopState::Undo => (Color::DarkGrey, LedMode::Bright50),
            LoopState::Redo => (Color::DarkGrey, LedMode::Bright50),
            LoopState::RedoAll => (Color::DarkGrey, LedMode::Bright100),
            LoopState::OffMuted => (Color::Red, LedMode::Bright100),
            LoopState::TriggerPlay => (Color::Green, LedMode::Bright100),
        }
    }

    pub fn color(self) -> Color {
        self.led().0
    }
}

/// Mirror of one engine loop. Unset controls have never been reported.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct TrackState {
    values: [Option<f32>; TrackCtrl::ALL.len()],
}

impl TrackState {
    pub fn get(&self, ctrl: TrackCtrl) -> Option<f32> {
        self.values[ctrl.index()]
    }

    pub fn set(&mut self, ctrl: TrackCtrl, value: f32) {
        self.values[ctrl.index()] = Some(value);
    }

    pub fn state(&self) -> LoopState {
        self.get(TrackCtrl::State)
            .map(LoopState::from_value)
            .unwrap_or(LoopState::Unknown)
    }

    pub fn is_set(&self, ctrl: TrackCtrl) -> bool {
        self.get(ctrl).is_some_and(|v| v != 0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct GlobState {
    /// -3 internal, -2 midi, -1 jack, 0 none, > 0 loop number (1-based).
    pub sync_source: Option<i32>,
    /// -1 addresses all loops.
    pub selected_loop_num: Option<i32>,
    pub eighth_per_cycle: Option<i32>,
    pub wet: Option<f32>,
    pub dry: Option<f32>,
    pub input_gain: Option<f32>,
}

impl GlobState {
    pub fn get(&self, ctrl: GlobCtrl) -> Option<f32> {
        match ctrl {
            GlobCtrl::SyncSource => self.sync_source.map(|v| v as f32),
            GlobCtrl::SelectedLoopNum => self.selected_loop_num.map(|v| v as f32),
            GlobCtrl::EighthPerCycle => self.eighth_per_cycle.map(|v| v as f32),
            GlobCtrl::Wet => self.wet,
            GlobCtrl::Dry => self.dry,
            GlobCtrl::InputGain => self.input_gain,
        }
    }

    /// Integer controls are truncated.
    pub fn set(&mut self, ctrl: GlobCtrl, value: f32) {
        match ctrl {
            GlobCtrl::SyncSource => self.sync_source = Some(value as i32),
            GlobCtrl::SelectedLoopNum => self.selected_loop_num = Some(value as i32),
            GlobCtrl::EighthPerCycle => self.eighth_per_cycle = Some(value as i32),
            GlobCtrl::Wet => self.wet = Some(value),
            GlobCtrl::Dry => self.dry = Some(value),
            GlobCtrl::InputGain => self.input_gain = Some(value),
        }
    }

    /// Per-loop level lookup against the global pseudo-loop.
    pub fn level(&self, ctrl: TrackCtrl) -> Option<f32> {
        GlobCtrl::from_track(ctrl).and_then(|g| self.get(g))
    }
}

/// Which interpretation the pads currently have. The numbering follows
/// the mode-select arithmetic: button `n` owns modes `3n+1` and `3n+2`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, FromPrimitive)]
#[repr(u8)]
pub(crate) enum Submode {
    #[default]
    Default = 0,
    Level1 = 1,
    Level2 = 2,
    Pan = 4,
    Sync = 7,
    SessionSave = 10,
    SessionLoad = 11,
}

impl Submode {
    pub fn from_num(num: i32) -> Option<Submode> {
        num::FromPrimitive::from_i32(num)
    }

    pub fn is_session(self) -> bool {
        matches!(self, Submode::SessionSave | Submode::SessionLoad)
    }
}

/// A set of loops muted and unmuted together.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Group {
    pub num: usize,
    pub loops: Vec<i32>,
}

impl Group {
    pub fn new(num: usize) -> Self {
        Self { num, ..Self::default() }
    }

    pub fn toggle(&mut self, lp: i32) {
        match self.loops.iter().position(|l| *l == lp) {
            Some(i) => {
                self.loops.remove(i);
            }
            None => self.loops.push(lp),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct DeviceState {
    pub submode: Submode,
    pub shifted: bool,
    /// Row 1 shows loop `1 - loop_offset`.
    pub loop_offset: i32,
    /// Session file names, unsorted.
    pub sessions: Vec<String>,
    pub sessions_last: Option<u8>,
    pub confirm_save: Option<u8>,
    pub group_selected: usize,
    pub group_selecting: bool,
    pub group_solo: Option<usize>,
    pub groups: BTreeMap<usize, Group>,
    pub prev_loop_selection: Option<Vec<i32>>,
    pub show8ths: bool,
    pub showsource: bool,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            submode: Submode::Default,
            shifted: false,
            loop_offset: 1,
            sessions: Vec::new(),
            sessions_last: None,
            confirm_save: None,
            group_selected: 0,
            group_selecting: false,
            group_solo: None,
            groups: BTreeMap::new(),
            prev_loop_selection: None,
            show8ths: false,
            showsource: false,
        }
    }
}

impl DeviceState {
    pub fn group(&self, num: usize) -> Group {
        self.groups.get(&num).cloned().unwrap_or_else(|| Group::new(num))
    }
}

/// Everything the driver knows about the engine and its own UI.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct EngineState {
    pub device: DeviceState,
    pub glob: GlobState,
    pub tracks: BTreeMap<i32, TrackState>,
    pub loop_count: i32,
}

impl EngineState {
    pub fn track(&self, lp: i32) -> Option<&TrackState> {
        self.tracks.get(&lp)
    }

    pub fn selected_loop(&self) -> Option<i32> {
        self.glob.selected_loop_num
    }

    /// Lowest allowed scroll offset: the last row stays free for adding loops.
    pub fn min_offset(&self) -> i32 {
        0.min(4 - self.loop_count)
    }

    /// Loop shown on a pad row. Row 0 addresses all loops.
    pub fn row_loop(&self, row: usize) -> i32 {
        if row == 0 { -1 } else { row as i32 - self.device.loop_offset }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_names_round_trip() {
        for ctrl in TrackCtrl::ALL {
            assert_eq!(ctrl.as_str().parse::<TrackCtrl>(), Ok(ctrl));
        }
        assert!("delay_trigger".parse::<TrackCtrl>().is_err());
        assert_eq!("eighth_per_cycle".parse::<GlobCtrl>(), Ok(GlobCtrl::EighthPerCycle));
    }

    #[test]
    fn unrecognized_state_codes_are_unknown() {
        assert_eq!(LoopState::from_value(2.0), LoopState::Recording);
        assert_eq!(LoopState::from_value(20.0), LoopState::OffMuted);
        assert_eq!(LoopState::from_value(42.0), LoopState::Unknown);
        assert_eq!(TrackState::default().state(), LoopState::Unknown);
    }

    #[test]
    fn glob_integers_are_truncated() {
        let mut glob = GlobState::default();
        glob.set(GlobCtrl::SelectedLoopNum, 2.0);
        glob.set(GlobCtrl::SyncSource, -3.0);
        glob.set(GlobCtrl::Wet, 0.25);
        assert_eq!(glob.selected_loop_num, Some(2));
        assert_eq!(glob.sync_source, Some(-3));
        assert_eq!(glob.level(TrackCtrl::Wet), Some(0.25));
        assert_eq!(glob.level(TrackCtrl::Feedback), None);
    }

    #[test]
    fn group_toggle_adds_then_removes() {
        let mut group = Group::new(1);
        group.toggle(3);
        group.toggle(0);
        assert_eq!(group.loops, vec![3, 0]);
        group.toggle(3);
        assert_eq!(group.loops, vec![0]);
    }
}
