use super::{Context, PadArgs, SubmodeHandler};
use crate::controller::Timer;
use crate::render::confirmers;
use crate::sessions::session_pad;
use crate::store::DeviceSetting;
use apc_library::controls::COLS;
use log::info;

/// Saves the engine session to the pad's slot. Occupied slots ask for
/// confirmation first.
#[derive(Default)]
pub(crate) struct SessionSave;

/// Loads the session stored on the pad's slot.
#[derive(Default)]
pub(crate) struct SessionLoad;

impl SessionSave {
    fn save(pad: u8, cx: &mut Context) {
        let path = cx.sessions.path_for(pad);
        info!("Saving session {path}");
        cx.set_device(DeviceSetting::SessionsLast(Some(pad)));
        cx.engine.save_session(&path);
        cx.timers.add_after(Timer::RefreshSessions, cx.timings.session_settle, cx.now);
    }
}

impl SubmodeHandler for SessionSave {
    fn set_active(&mut self, active: bool, cx: &mut Context) {
        if active {
            cx.refresh_sessions();
        } else {
            cx.set_device(DeviceSetting::ConfirmSave(None));
        }
    }

    fn on_pad(&mut self, args: &PadArgs, cx: &mut Context) -> bool {
        if !args.pressed() {
            return true;
        }

        if let Some(pending) = cx.state().device.confirm_save {
            let [no, yes] = confirmers(pending, COLS);
            if args.pad == no {
                cx.set_device(DeviceSetting::ConfirmSave(None));
            } else if args.pad == yes {
                cx.set_device(DeviceSetting::ConfirmSave(None));
                Self::save(pending, cx);
            }
            return true;
        }

        let taken = cx
            .state()
            .device
            .sessions
            .iter()
            .any(|name| session_pad(name) == Some(args.pad));
        if taken {
            cx.set_device(DeviceSetting::ConfirmSave(Some(args.pad)));
        } else {
            Self::save(args.pad, cx);
        }
        true
    }
}

impl SubmodeHandler for SessionLoad {
    fn set_active(&mut self, active: bool, cx: &mut Context) {
        if active {
            cx.refresh_sessions();
        }
    }

    fn on_pad(&mut self, args: &PadArgs, cx: &mut Context) -> bool {
        if !args.pressed() {
            return true;
        }
        let path = cx.sessions.path_for(args.pad);
        info!("Loading session {path}");
        cx.set_device(DeviceSetting::SessionsLast(Some(args.pad)));
        cx.engine.load_session(&path);
        let settle = cx.timings.session_settle;
        cx.timers.add_after(Timer::RefreshSessions, settle, cx.now);
        cx.timers.add_after(Timer::Reping, settle, cx.now);
        true
    }
}
