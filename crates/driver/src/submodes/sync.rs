use super::{Context, PadArgs, SubmodeHandler};
use crate::engine::LoopAddr;
use crate::render::SYNC_SETTINGS;
use crate::state::{GlobCtrl, TrackCtrl};
use crate::store::{Action, DeviceSetting};

/// Sync and quantize settings of the loops in view. The top row holds the
/// global sync source and quantize.
#[derive(Default)]
pub(crate) struct SyncMode;

const EIGHTHS_COL: usize = 6;
const SOURCE_COL: usize = 6;
const QUANTIZE_COL: usize = 7;

/// Steps `cur` forward through `from..=to`, wrapping around.
fn cycle(from: i32, to: i32, cur: i32) -> i32 {
    (cur - from + 1).rem_euclid(to - from + 1) + from
}

impl SyncMode {
    fn set_eighths(value: i32, cx: &mut Context) {
        let ctrl = GlobCtrl::EighthPerCycle;
        cx.engine.set_glob(ctrl.as_str(), value as f32);
        cx.dispatch(Action::glob(ctrl, value as f32));
    }
}

impl SubmodeHandler for SyncMode {
    fn set_active(&mut self, _active: bool, cx: &mut Context) {
        cx.set_device(DeviceSetting::ShowSource(false));
    }

    fn on_pad(&mut self, args: &PadArgs, cx: &mut Context) -> bool {
        let pressed = args.pressed();

        if matches!(args.row, 1 | 2) && args.col == EIGHTHS_COL {
            cx.set_device(DeviceSetting::Show8ths(pressed));
            if pressed {
                let old = cx.state().glob.eighth_per_cycle.unwrap_or(16);
                let value = if args.row == 2 { (old - 1).max(2) } else { old + 1 };
                Self::set_eighths(value, cx);
            }
            return true;
        }

        if cx.state().device.show8ths {
            if pressed {
                Self::set_eighths(args.pad as i32 + 1, cx);
            }
            return true;
        }

        if !pressed {
            if args.track == -1 && args.col == SOURCE_COL {
                cx.set_device(DeviceSetting::ShowSource(false));
            }
            return true;
        }

        if let Some(ctrl) = SYNC_SETTINGS[args.col] {
            let Some(track) = &args.state_track else {
                return true;
            };
            let value = if track.is_set(ctrl) { 0.0 } else { 1.0 };
            cx.engine.set(LoopAddr::from_track(args.track), ctrl.as_str(), value);
            return true;
        }

        if args.track != -1 {
            return true;
        }
        if args.col == QUANTIZE_COL {
            // every loop follows loop 0's quantize setting
            let quantize = cx
                .state()
                .track(0)
                .and_then(|t| t.get(TrackCtrl::Quantize))
                .map_or(-1, |q| q as i32);
            cx.engine.set(LoopAddr::All, TrackCtrl::Quantize.as_str(), ((quantize + 1) % 4) as f32);
        } else if args.col == SOURCE_COL {
            let state = cx.state();
            let current = state.glob.sync_source.unwrap_or(-3);
            let value = cycle(-3, state.loop_count, current);
            let ctrl = GlobCtrl::SyncSource;
            cx.engine.set_glob(ctrl.as_str(), value as f32);
            cx.dispatch(Action::Batch(vec![
                Action::glob(ctrl, value as f32),
                Action::Device(DeviceSetting::ShowSource(true)),
            ]));
        }
        true
    }
}
