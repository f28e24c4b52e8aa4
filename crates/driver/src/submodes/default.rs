use super::groups::Groups;
use super::{Context, PadArgs, SubmodeHandler};
use crate::engine::LoopAddr;
use crate::state::LoopState;
use apc_library::controls::{Buttons, EventType};

/// Buttons held down while pads are played.
#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct Modifiers {
    pub undoing: bool,
    pub redoing: bool,
    /// Track 1 held: alternate column functions.
    pub alt: bool,
    pub solo: bool,
    pub mute: bool,
}

/// Transport commands for the loops in view, with groups on the top row.
#[derive(Default)]
pub(crate) struct DefaultMode {
    held: Modifiers,
    groups: Groups,
}

impl SubmodeHandler for DefaultMode {
    fn set_active(&mut self, active: bool, cx: &mut Context) {
        self.groups.set_active(active, cx);
    }

    fn on_pad(&mut self, args: &PadArgs, cx: &mut Context) -> bool {
        self.groups.on_pad(args, &self.held, cx) || self.loop_pad(args, cx)
    }

    fn on_button(&mut self, button: Buttons, kind: EventType, shifted: bool, cx: &mut Context) -> bool {
        let down = kind == EventType::NoteOn;
        match button {
            Buttons::Undo => self.held.undoing = down,
            Buttons::Redo => self.held.redoing = down,
            Buttons::Track1 if shifted => return false,
            Buttons::Track1 => self.held.alt = down,
            Buttons::SoftKeySolo => self.held.solo = down,
            Buttons::SoftKeyMute => self.held.mute = down,
            _ => return self.groups.on_button(button, kind, cx),
        }
        true
    }
}

impl DefaultMode {
    fn loop_pad(&mut self, args: &PadArgs, cx: &mut Context) -> bool {
        let held = self.held;
        let addr = LoopAddr::from_track(args.track);
        let missing = args.track >= cx.state().loop_count;

        if args.pressed() {
            if missing {
                if args.col <= 3 {
                    cx.engine.loop_add(((args.col + 1) % 4) as i32, 40.0);
                } else {
                    cx.engine.loop_del();
                }
                return true;
            }
            let hit = if held.solo {
                Some("solo")
            } else if held.mute {
                Some("mute")
            } else if held.undoing && args.col <= 1 {
                Some("undo_all")
            } else if held.redoing && args.col >= 4 {
                Some("redo_all")
            } else {
                None
            };
            if let Some(cmd) = hit {
                cx.engine.hit(addr, cmd);
                return true;
            }
        } else if missing || held.solo || held.mute {
            return true;
        }

        if (!held.undoing || held.redoing) && args.col == 0 {
            self.rec_or_overdub(args, cx);
            return true;
        }

        let down = args.pressed();
        let cmd = match args.col {
            1 => "multiply",
            2 if held.undoing => "undo",
            2 if held.alt => "reverse",
            2 => "insert",
            3 if held.redoing => "redo",
            3 if held.alt => {
                if down {
                    cx.engine.set(addr, "delay_trigger", rand::random::<f32>());
                }
                return true;
            }
            3 => "replace",
            4 => "substitute",
            5 => "oneshot",
            6 => "trigger",
            7 => "pause",
            _ => return false,
        };
        cx.engine.press(addr, cmd, down);
        true
    }

    fn rec_or_overdub(&self, args: &PadArgs, cx: &mut Context) {
        let down = args.pressed();
        if args.track == -1 {
            cx.engine.press(LoopAddr::All, "record_or_overdub", down);
            return;
        }
        let Some(track) = &args.state_track else {
            return;
        };
        let state = track.state();
        let alt = self.held.alt;
        let record = state < LoopState::Recording
            || (!alt && state == LoopState::Recording)
            || (alt && state != LoopState::Recording);
        let cmd = if record { "record" } else { "overdub" };
        cx.engine.press(LoopAddr::Loop(args.track), cmd, down);
    }
}
