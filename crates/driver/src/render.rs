//! State to LED frame. Everything here is a pure function of [`EngineState`].

use crate::sessions::session_pad;
use crate::state::{EngineState, LoopState, Submode, TrackCtrl, TrackState};
use apc_library::colors::{Color, SoftKey};
use apc_library::controls::{Buttons, COLS, ROWS, get_pad, pad_row, row_pads, row_start_pad};
use apc_library::font::{Font, GlyphStyle};
use apc_library::lights::{LED_BRIGHTS, LedInstruction, LedMode};
use std::collections::{BTreeMap, HashSet};

/// States whose colors label the command row in the default view, by column.
const TRACK_COMMANDS: [LoopState; COLS] = [
    LoopState::Recording,
    LoopState::Multiplying,
    LoopState::Inserting,
    LoopState::Replacing,
    LoopState::Substituting,
    LoopState::PlayingOnce,
    LoopState::TriggerPlay,
    LoopState::Paused,
];

/// Level columns of the selected loop view.
pub(crate) const TRACK_LEVELS: [Option<TrackCtrl>; COLS] = [
    Some(TrackCtrl::InPeakMeter),
    Some(TrackCtrl::RecThresh),
    Some(TrackCtrl::InputGain),
    Some(TrackCtrl::Wet),
    Some(TrackCtrl::Dry),
    Some(TrackCtrl::Feedback),
    Some(TrackCtrl::PitchShift),
    None,
];

const LEVEL_COLORS: [Color; COLS] = [
    Color::Red,
    Color::Red,
    Color::Lime,
    Color::Blue,
    Color::DarkGrey,
    Color::Purple,
    Color::White,
    Color::White,
];

/// Boolean loop settings toggled in the sync view, by column.
pub(crate) const SYNC_SETTINGS: [Option<TrackCtrl>; COLS] = [
    Some(TrackCtrl::Sync),
    Some(TrackCtrl::RelativeSync),
    Some(TrackCtrl::PlaybackSync),
    Some(TrackCtrl::MuteQuantized),
    Some(TrackCtrl::OverdubQuantized),
    Some(TrackCtrl::ReplaceQuantized),
    None,
    None,
];

const SETTING_COLORS: [Color; 6] = [
    Color::Blue,
    Color::Lime,
    Color::Green,
    Color::DarkGreen,
    Color::Purple,
    Color::PinkLight,
];

/// Indexed by `sync_source + 3`.
const SYNC_SOURCE_COLORS: [Color; 6] = [
    Color::White,
    Color::Orange,
    Color::Red,
    Color::DarkGrey,
    Color::Blue,
    Color::BlueDark,
];

const QUANTIZE_COLORS: [Color; 4] = [Color::White, Color::Orange, Color::BrownishRed, Color::Blue];

/// Pads of the eighths steppers in the sync view.
pub(crate) const EIGHTHS_UP_PAD: u8 = 30;
pub(crate) const EIGHTHS_DOWN_PAD: u8 = 22;

const SYNC_SOURCE_PAD: u8 = 38;
const QUANTIZE_PAD: u8 = 39;

/// Groups are picked from the first five pads of the command row.
pub(crate) const GROUPS: usize = 5;

/// Stable merge of LED layers: the first instruction for an index wins and
/// the result is ordered by index.
pub(crate) fn overlay(layers: &[&[LedInstruction]]) -> Vec<LedInstruction> {
    let mut seen = HashSet::new();
    let mut out: Vec<LedInstruction> = layers
        .iter()
        .flat_map(|layer| layer.iter())
        .filter(|led| seen.insert(led.index))
        .copied()
        .collect();
    out.sort_by_key(|led| led.index);
    out
}

/// LED writes needed to go from `prev` to `next`. LEDs missing from `next`
/// are switched off.
pub(crate) fn diff(prev: &[LedInstruction], next: &[LedInstruction]) -> Vec<LedInstruction> {
    let old: BTreeMap<u8, &LedInstruction> = prev.iter().map(|l| (l.index, l)).collect();
    let new: HashSet<u8> = next.iter().map(|l| l.index).collect();

    let mut out: Vec<LedInstruction> = next
        .iter()
        .filter(|l| old.get(&l.index) != Some(l))
        .copied()
        .collect();
    out.extend(
        old.keys()
            .filter(|i| !new.contains(i))
            .map(|i| LedInstruction::off(*i)),
    );
    out.sort_by_key(|l| l.index);
    out
}

/// Full frame for the pad matrix and the lit buttons.
pub(crate) fn render(state: &EngineState) -> Vec<LedInstruction> {
    let device = &state.device;
    let ctrl = ctrl_keys(device.submode);

    if device.submode.is_session() {
        let pads = session_pads(state);
        return overlay(&[&pads, &ctrl]);
    }

    let matrix = matrix(state);
    let soft = soft_keys(state);
    let pads = overlay(&[&matrix, &soft, &ctrl]);

    if device.submode != Submode::Pan && device.shifted {
        let glyphs = loop_number_glyphs(2 - device.loop_offset);
        overlay(&[&glyphs, &pads])
    } else if device.showsource {
        let mut glyphs = Vec::new();
        if let Some(ch) = device_source_char(state.glob.sync_source) {
            Font::write_char(&mut glyphs, 1, ch, GlyphStyle::default());
        }
        overlay(&[&glyphs, &pads])
    } else if device.group_selecting {
        group_selection(state, pads)
    } else if device.submode == Submode::Default {
        pads.into_iter()
            .map(|mut led| {
                if let Some(group) = group_pad(led.index) {
                    led.mode = if device.group_solo == Some(group) {
                        LedMode::Blinking4
                    } else {
                        LedMode::Bright100
                    };
                }
                led
            })
            .collect()
    } else {
        overlay(&[&eighths(state), &pads])
    }
}

fn group_pad(index: u8) -> Option<usize> {
    let first = row_start_pad(0);
    (first..first + GROUPS as u8)
        .contains(&index)
        .then(|| (index - first) as usize)
}

fn group_selection(state: &EngineState, pads: Vec<LedInstruction>) -> Vec<LedInstruction> {
    let device = &state.device;
    let loops = device.group(device.group_selected).loops;
    pads.into_iter()
        .map(|mut led| {
            if led.index == Buttons::SoftKeySelect as u8 {
                led = LedInstruction::button(led.index, SoftKey::Blink);
            } else if led.index < row_start_pad(0) {
                let lp = state.row_loop(pad_row(led.index));
                led.mode = if loops.contains(&lp) {
                    LedMode::Bright100
                } else {
                    LedMode::Bright10
                };
            } else if let Some(group) = group_pad(led.index) {
                led.mode = if group == device.group_selected {
                    LedMode::Pulsing8
                } else {
                    LedMode::Bright50
                };
            }
            led
        })
        .collect()
}

fn device_source_char(source: Option<i32>) -> Option<char> {
    match source? {
        -3 => Some('I'),
        -2 => Some('M'),
        -1 => Some('J'),
        0 => Some('-'),
        n @ 1..=9 => char::from_digit(n as u32, 10),
        _ => None,
    }
}

/// First visible loop number, one or two digits wide.
fn loop_number_glyphs(first_loop: i32) -> Vec<LedInstruction> {
    let mut out = Vec::new();
    let style = GlyphStyle::default();
    match first_loop {
        0..=9 => Font::write_digit(&mut out, 5, first_loop as usize, style),
        10..=99 => {
            Font::write_digit(&mut out, 2, (first_loop / 10) as usize, style);
            Font::write_digit(&mut out, 5, (first_loop % 10) as usize, style);
        }
        _ => {}
    }
    out
}

fn ctrl_keys(submode: Submode) -> Vec<LedInstruction> {
    let key = |button: Buttons, value: SoftKey| LedInstruction::button(button as u8, value);
    let on_for = |m: Submode| if submode == m { SoftKey::On } else { SoftKey::Off };
    vec![
        key(
            Buttons::KnobCtrlVolume,
            match submode {
                Submode::Level1 => SoftKey::On,
                Submode::Level2 => SoftKey::Blink,
                _ => SoftKey::Off,
            },
        ),
        key(Buttons::KnobCtrlPan, on_for(Submode::Pan)),
        key(Buttons::KnobCtrlSend, on_for(Submode::Sync)),
        key(
            Buttons::KnobCtrlDevice,
            match submode {
                Submode::SessionSave => SoftKey::On,
                Submode::SessionLoad => SoftKey::Blink,
                _ => SoftKey::Off,
            },
        ),
    ]
}

fn soft_keys(state: &EngineState) -> Vec<LedInstruction> {
    let selected = state.selected_loop();
    (0..ROWS)
        .map(|row| {
            let value = if selected != Some(state.row_loop(row)) {
                SoftKey::Off
            } else if state.device.submode == Submode::Level2 {
                SoftKey::Blink
            } else {
                SoftKey::On
            };
            LedInstruction::button(Buttons::SoftKeyClipStop as u8 + row as u8, value)
        })
        .collect()
}

fn eighths(state: &EngineState) -> Vec<LedInstruction> {
    if !state.device.show8ths {
        return Vec::new();
    }
    let count = state.glob.eighth_per_cycle.unwrap_or(0).clamp(0, (ROWS * COLS) as i32);
    (0..count as u8)
        .map(|pad| LedInstruction::pad(LedMode::Bright100, pad, Color::BrownishRed))
        .collect()
}

fn matrix(state: &EngineState) -> Vec<LedInstruction> {
    let submode = state.device.submode;
    let empty = TrackState::default();
    let mut out = Vec::with_capacity(ROWS * COLS + 2 * ROWS);

    for row in 0..ROWS {
        let track = state
            .track(row as i32 - state.device.loop_offset)
            .unwrap_or(&empty);

        match (submode, row) {
            (Submode::Default, 0) => {
                for (pad, cmd) in row_pads(0).zip(TRACK_COMMANDS) {
                    out.push(LedInstruction::pad(LedMode::Bright90, pad, cmd.color()));
                }
            }
            (Submode::Sync, 0) => sync_command_row(state, &mut out),
            (Submode::Sync, _) => sync_row(track, row, &mut out),
            _ => {
                for (col, pad) in row_pads(row).enumerate() {
                    let (mode, color) = cell(state, track, row, col);
                    out.push(LedInstruction::pad(mode, pad, color));
                }
            }
        }
    }
    out
}

fn cell(state: &EngineState, track: &TrackState, row: usize, col: usize) -> (LedMode, Color) {
    match state.device.submode {
        Submode::Pan => pan_cell(track, col),
        Submode::Level1 if row == 0 => (
            level_brightness(COLS, state.glob.wet.unwrap_or(0.0), (0.0, 1.0), col),
            Color::BlueDark,
        ),
        Submode::Level1 => {
            let color = match track.state() {
                LoopState::Unknown => Color::Black,
                LoopState::Off => Color::BlueLight,
                _ => Color::Blue,
            };
            let wet = track.get(TrackCtrl::Wet).unwrap_or(0.0);
            (level_brightness(COLS, wet, (0.0, 1.0), col), color)
        }
        Submode::Level2 => {
            let (value, bounds) = match TRACK_LEVELS[col] {
                Some(ctrl) => (selected_level(state, ctrl), ctrl.bounds()),
                None => (0.0, (0.0, 1.0)),
            };
            (
                level_brightness(ROWS, value, bounds, ROWS - 1 - row),
                LEVEL_COLORS[col],
            )
        }
        _ => loop_cell(track, col),
    }
}

/// Level of the selected loop, or of the global pseudo-loop when all
/// loops are selected.
fn selected_level(state: &EngineState, ctrl: TrackCtrl) -> f32 {
    match state.selected_loop() {
        Some(-1) => state.glob.level(ctrl),
        Some(lp) => state.track(lp).and_then(|t| t.get(ctrl)),
        None => None,
    }
    .unwrap_or(0.0)
}

fn loop_cell(track: &TrackState, col: usize) -> (LedMode, Color) {
    let (color, mode) = track.state().led();
    if mode != LedMode::Bright100 {
        return (mode, color);
    }
    let playhead = playhead(track);
    let mode = if col == playhead {
        LedMode::Bright100
    } else {
        LedMode::Bright25
    };
    (mode, color)
}

/// Column the loop position falls into.
fn playhead(track: &TrackState) -> usize {
    let len = track.get(TrackCtrl::LoopLen).unwrap_or(0.0);
    if len <= 0.0 {
        return 0;
    }
    let pos = track.get(TrackCtrl::LoopPos).unwrap_or(0.0);
    (COLS as f32 * pos / len).floor().clamp(0.0, (COLS - 1) as f32) as usize
}

/// One or two adjacent columns for a pan position in `[0, 1]`.
pub(crate) fn pan_pads(value: f32) -> Vec<usize> {
    let pos = 2.0 * (COLS - 1) as f32 * value.clamp(0.0, 1.0);
    let rounded = pos.floor() as usize;
    let first = rounded / 2;
    if rounded % 2 == 0 {
        vec![first]
    } else {
        vec![first, first + 1]
    }
}

fn pan_cell(track: &TrackState, col: usize) -> (LedMode, Color) {
    let state_color = track.state().color();
    match track.get(TrackCtrl::ChannelCount).map(|c| c as i32) {
        None => (LedMode::Off, state_color),
        Some(2) => {
            let left = pan_pads(track.get(TrackCtrl::Pan1).unwrap_or(0.0));
            let right = pan_pads(track.get(TrackCtrl::Pan2).unwrap_or(0.0));
            let (l, r) = (left.contains(&col), right.contains(&col));
            match (l, r) {
                (true, true) => (LedMode::Bright100, Color::Purple),
                (true, false) => (LedMode::Bright75, Color::Red),
                (false, true) => (LedMode::Bright75, Color::Blue),
                (false, false) => (LedMode::Bright25, state_color),
            }
        }
        Some(_) => {
            let pads = pan_pads(track.get(TrackCtrl::Pan1).unwrap_or(0.0));
            let mode = if pads.contains(&col) {
                LedMode::Bright100
            } else {
                LedMode::Bright25
            };
            (mode, state_color)
        }
    }
}

/// Brightness of column `x` of a bar showing `level` over `num` pads. The
/// partially filled pad uses a finer ramp.
pub(crate) fn level_brightness(num: usize, level: f32, (lo, hi): (f32, f32), x: usize) -> LedMode {
    let level = ((level - lo) / (hi - lo)).clamp(0.0, 1.0);
    let pos = num as f32 * level;
    let rounded = pos.floor();
    let idx = ((num - 1) as f32 * (pos - rounded)).floor() as usize;
    let last = LED_BRIGHTS[idx.min(LED_BRIGHTS.len() - 1)];
    let rounded = rounded as usize;
    if x < rounded {
        LedMode::Bright100
    } else if x == rounded {
        last
    } else {
        LedMode::Bright10
    }
}

fn sync_command_row(state: &EngineState, out: &mut Vec<LedInstruction>) {
    let source = state.glob.sync_source.unwrap_or(0);
    let source_color = SYNC_SOURCE_COLORS[(source + 3).clamp(0, 5) as usize];
    out.push(LedInstruction::pad(LedMode::Bright100, SYNC_SOURCE_PAD, source_color));

    let quantize = state
        .track(0)
        .and_then(|t| t.get(TrackCtrl::Quantize))
        .unwrap_or(0.0) as usize;
    let mode = if quantize != 0 {
        LedMode::Bright100
    } else {
        LedMode::Bright10
    };
    let color = QUANTIZE_COLORS.get(quantize).copied().unwrap_or(QUANTIZE_COLORS[0]);
    out.push(LedInstruction::pad(mode, QUANTIZE_PAD, color));

    for (pad, color) in row_pads(0).zip(SETTING_COLORS) {
        out.push(LedInstruction::pad(LedMode::Bright50, pad, color));
    }
}

fn sync_row(track: &TrackState, row: usize, out: &mut Vec<LedInstruction>) {
    out.push(LedInstruction::pad(LedMode::Bright75, EIGHTHS_UP_PAD, Color::BrownLight));
    out.push(LedInstruction::pad(LedMode::Bright75, EIGHTHS_DOWN_PAD, Color::BrownLight));

    for (col, pad) in row_pads(row).enumerate() {
        let (mode, color) = match SYNC_SETTINGS[col] {
            Some(ctrl) if track.is_set(ctrl) => (LedMode::Bright100, SETTING_COLORS[col]),
            Some(_) => (LedMode::Bright10, SETTING_COLORS[col]),
            None => (LedMode::Bright10, Color::White),
        };
        out.push(LedInstruction::pad(mode, pad, color));
    }
}

/// Cancel and confirm pads shown next to a session awaiting overwrite.
pub(crate) fn confirmers(pad: u8, cols: usize) -> [u8; 2] {
    let pad = pad as usize;
    let row = if pad < cols { 1 } else { pad / cols - 1 };
    let col = pad % cols;
    let (no, yes) = if col == 0 {
        (0, 1)
    } else if col == cols - 1 {
        (cols - 2, cols - 1)
    } else {
        (col - 1, col + 1)
    };
    [get_pad(cols, no, row), get_pad(cols, yes, row)]
}

fn session_pads(state: &EngineState) -> Vec<LedInstruction> {
    let device = &state.device;
    let color = if device.submode == Submode::SessionLoad {
        Color::DarkGreen
    } else {
        Color::Orange
    };

    let mut confirm = Vec::new();
    if let Some(pad) = device.confirm_save {
        let [no, yes] = confirmers(pad, COLS);
        confirm.push(LedInstruction::pad(LedMode::Bright100, no, Color::Red));
        confirm.push(LedInstruction::pad(LedMode::Bright100, yes, Color::Green));
    }

    let sessions: Vec<LedInstruction> = device
        .sessions
        .iter()
        .filter_map(|name| session_pad(name))
        .map(|pad| {
            let mode = if device.sessions_last == Some(pad) {
                LedMode::Pulsing8
            } else {
                LedMode::Bright100
            };
            LedInstruction::pad(mode, pad, color)
        })
        .collect();

    let empty: Vec<LedInstruction> = (0..ROWS)
        .flat_map(row_pads)
        .map(|pad| LedInstruction::pad(LedMode::Bright25, pad, color))
        .collect();

    overlay(&[&confirm, &sessions, &empty])
}
