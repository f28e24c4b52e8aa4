use super::{Context, PadArgs, SubmodeHandler};
use crate::engine::LoopAddr;
use crate::render::TRACK_LEVELS;
use crate::state::{GlobCtrl, TrackCtrl};
use crate::store::Action;
use apc_library::controls::{COLS, ROWS};

/// Wet level of every loop in view, one loop per row, the top row for the
/// global wet.
#[derive(Default)]
pub(crate) struct Level1;

/// Levels of the selected loop, one control per column.
#[derive(Default)]
pub(crate) struct Level2;

fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-4
}

/// Pressing the pad that is already the top of the bar takes half a step
/// back; pressing the first pad at half a step clears the bar.
fn wet_for_column(col: usize, stored: f32) -> f32 {
    let step = 1.0 / COLS as f32;
    let mut value = (col + 1) as f32 * step;
    if approx_eq(stored, value) {
        value -= step / 2.0;
    }
    if approx_eq(stored, step / 2.0) && col == 0 {
        value = 0.0;
    }
    value
}

impl SubmodeHandler for Level1 {
    fn on_pad(&mut self, args: &PadArgs, cx: &mut Context) -> bool {
        if !args.pressed() {
            return true;
        }
        if args.row > 0 {
            let Some(stored) = args.state_track.as_ref().and_then(|t| t.get(TrackCtrl::Wet)) else {
                return true;
            };
            let value = wet_for_column(args.col, stored);
            cx.dispatch(Action::track(args.track, TrackCtrl::Wet, value));
            cx.engine.set(LoopAddr::Loop(args.track), TrackCtrl::Wet.as_str(), value);
        } else {
            let stored = cx.state().glob.wet.unwrap_or(0.0);
            let value = wet_for_column(args.col, stored);
            cx.dispatch(Action::glob(GlobCtrl::Wet, value));
            cx.engine.set_glob(GlobCtrl::Wet.as_str(), value);
        }
        true
    }
}

/// Pitch column rows: up an octave, up a semitone, reset, down a semitone,
/// down an octave.
fn pitch_for_row(row: usize, stored: f32) -> f32 {
    let value = match row {
        0 => 12.0,
        1 => stored + 1.0,
        2 => 0.0,
        3 => stored - 1.0,
        _ => -12.0,
    };
    value.clamp(-12.0, 12.0)
}

fn level_for_row(row: usize, stored: f32) -> f32 {
    let rows = ROWS as f32;
    let mut value = (ROWS - row) as f32 / rows;
    if (stored * rows).round() == (value * rows).round() {
        value -= 0.1;
    }
    if (stored * 100.0).round() == 10.0 && row == ROWS - 1 {
        value = 0.0;
    }
    value
}

impl SubmodeHandler for Level2 {
    fn set_active(&mut self, active: bool, cx: &mut Context) {
        if active {
            cx.engine.register_selected(TrackCtrl::InPeakMeter);
        } else {
            cx.engine.unregister_selected(TrackCtrl::InPeakMeter);
        }
    }

    fn on_pad(&mut self, args: &PadArgs, cx: &mut Context) -> bool {
        if !args.pressed() {
            return true;
        }
        let Some(selected) = cx.state().selected_loop() else {
            return true;
        };
        let is_glob = selected == -1;
        if is_glob && !(2..=4).contains(&args.col) {
            return true;
        }
        // the input meter is read-only
        let Some(ctrl) = TRACK_LEVELS[args.col].filter(|c| *c != TrackCtrl::InPeakMeter) else {
            return true;
        };

        let state = cx.state();
        let stored = if is_glob {
            state.glob.level(ctrl)
        } else {
            let Some(track) = state.track(selected) else {
                return true;
            };
            track.get(ctrl)
        }
        .unwrap_or(0.0);

        let value = if ctrl == TrackCtrl::PitchShift {
            pitch_for_row(args.row, stored)
        } else {
            level_for_row(args.row, stored)
        };

        match GlobCtrl::from_track(ctrl).filter(|_| is_glob) {
            Some(glob) => {
                cx.dispatch(Action::glob(glob, value));
                cx.engine.set_glob(glob.as_str(), value);
            }
            None => {
                cx.dispatch(Action::track(selected, ctrl, value));
                cx.engine.set(LoopAddr::Loop(selected), ctrl.as_str(), value);
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::submodes::tests::Harness;
    use apc_library::controls::EventType;
    use rosc::OscType;

    fn sent_value(h: &mut Harness) -> (String, Vec<OscType>) {
        let mut sent = h.take_sent();
        assert_eq!(sent.len(), 1);
        sent.remove(0)
    }

    #[test]
    fn wet_column_steps_back_on_repress() {
        assert_eq!(wet_for_column(3, 0.2), 0.5);
        assert_eq!(wet_for_column(3, 0.5), 0.4375);
        assert_eq!(wet_for_column(0, 0.0625), 0.0);
    }

    #[test]
    fn level1_sets_loop_wet() {
        let mut h = Harness::with(vec![
            Action::LoopCount(1),
            Action::track(0, TrackCtrl::Wet, 1.0),
        ]);
        let mut mode = Level1;
        h.tap(&mut mode, 25);
        assert_eq!(
            sent_value(&mut h),
            ("/sl/0/set".to_string(), vec![OscType::String("wet".into()), OscType::Float(0.25)])
        );
        assert_eq!(h.state().track(0).and_then(|t| t.get(TrackCtrl::Wet)), Some(0.25));
    }

    #[test]
    fn level1_ignores_loops_without_wet() {
        let mut h = Harness::with(vec![Action::LoopCount(2)]);
        let mut mode = Level1;
        h.tap(&mut mode, 17);
        assert!(h.take_sent().is_empty());
    }

    #[test]
    fn level1_top_row_sets_global_wet() {
        let mut h = Harness::new();
        let mut mode = Level1;
        h.pad(&mut mode, 39, EventType::NoteOn);
        assert_eq!(
            sent_value(&mut h),
            ("/set".to_string(), vec![OscType::String("wet".into()), OscType::Float(1.0)])
        );
        assert_eq!(h.state().glob.wet, Some(1.0));
    }

    #[test]
    fn level2_row_maps_to_value() {
        assert_eq!(level_for_row(0, 0.0), 1.0);
        assert!((level_for_row(2, 0.6) - 0.5).abs() < 1e-6);
        assert_eq!(level_for_row(4, 0.1), 0.0);
    }

    #[test]
    fn level2_pitch_rows_step_and_clamp() {
        assert_eq!(pitch_for_row(1, 3.0), 4.0);
        assert_eq!(pitch_for_row(1, 12.0), 12.0);
        assert_eq!(pitch_for_row(3, -12.0), -12.0);
        assert_eq!(pitch_for_row(2, 7.0), 0.0);
    }

    #[test]
    fn level2_targets_selected_loop() {
        let mut h = Harness::with(vec![
            Action::LoopCount(2),
            Action::glob(GlobCtrl::SelectedLoopNum, 1.0),
            Action::track(1, TrackCtrl::Feedback, 0.0),
        ]);
        let mut mode = Level2;
        // column 5 is feedback, row 1 is 80 %
        h.pad(&mut mode, 29, EventType::NoteOn);
        let (addr, args) = sent_value(&mut h);
        assert_eq!(addr, "/sl/1/set");
        assert_eq!(args[0], OscType::String("feedback".into()));
        assert_eq!(h.state().track(1).and_then(|t| t.get(TrackCtrl::Feedback)), Some(0.8));
    }

    #[test]
    fn level2_global_only_has_shared_levels() {
        let mut h = Harness::with(vec![Action::glob(GlobCtrl::SelectedLoopNum, -1.0)]);
        let mut mode = Level2;
        h.pad(&mut mode, 33, EventType::NoteOn);
        h.pad(&mut mode, 37, EventType::NoteOn);
        assert!(h.take_sent().is_empty());

        // column 4 is dry
        h.pad(&mut mode, 36, EventType::NoteOn);
        let (addr, _) = sent_value(&mut h);
        assert_eq!(addr, "/set");
        assert_eq!(h.state().glob.dry, Some(1.0));
    }

    #[test]
    fn level2_registers_meter_while_active() {
        let mut h = Harness::new();
        let mut mode = Level2;
        mode.set_active(true, &mut h.cx());
        mode.set_active(false, &mut h.cx());
        let paths: Vec<String> = h.take_sent().into_iter().map(|(a, _)| a).collect();
        assert_eq!(paths, vec!["/sl/-3/register_auto_update", "/sl/-3/unregister_auto_update"]);
    }
}
