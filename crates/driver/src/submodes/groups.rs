use super::default::Modifiers;
use super::{Context, PadArgs};
use crate::engine::LoopAddr;
use crate::render::GROUPS;
use crate::state::LoopState;
use crate::store::{Action, DeviceSetting};
use apc_library::controls::{Buttons, EventType};
use std::collections::BTreeSet;

/// Loop groups on the top-row pads. A group solos its loops; pressing it
/// again restores whatever was playing before.
#[derive(Default)]
pub(crate) struct Groups;

impl Groups {
    pub fn set_active(&mut self, active: bool, cx: &mut Context) {
        if active {
            cx.set_device(DeviceSetting::GroupSelected(0));
        } else {
            cx.set_device(DeviceSetting::GroupSelecting(false));
        }
    }

    pub fn on_button(&mut self, button: Buttons, kind: EventType, cx: &mut Context) -> bool {
        if kind != EventType::NoteOn || button != Buttons::SoftKeySelect {
            return false;
        }
        let selecting = cx.state().device.group_selecting;
        cx.set_device(DeviceSetting::GroupSelecting(!selecting));
        true
    }

    pub fn on_pad(&mut self, args: &PadArgs, held: &Modifiers, cx: &mut Context) -> bool {
        if !args.pressed() {
            return false;
        }
        let selecting = cx.state().device.group_selecting;

        if args.row == 0 && args.col < GROUPS {
            if selecting {
                cx.set_device(DeviceSetting::GroupSelected(args.col));
                return true;
            }
            if !held.undoing && !held.redoing {
                toggle_group(args.col, cx);
                return true;
            }
        }

        if selecting && args.row > 0 {
            let device = &cx.state().device;
            let mut group = device.group(device.group_selected);
            group.toggle(args.track);
            cx.dispatch(Action::AssocGroup(group));
            return true;
        }
        false
    }
}

fn toggle_group(num: usize, cx: &mut Context) {
    let state = cx.state();
    let group = state.device.group(num);
    if group.loops.is_empty() {
        return;
    }

    let count = state.loop_count;
    let previous: BTreeSet<i32> = match &state.device.prev_loop_selection {
        Some(loops) => loops.iter().copied().collect(),
        None => (0..count).collect(),
    };
    let current: Vec<i32> = (0..count)
        .filter(|lp| {
            state
                .track(*lp)
                .is_some_and(|t| t.state() != LoopState::Muted)
        })
        .collect();
    let members: BTreeSet<i32> = group.loops.iter().copied().collect();
    let loops: Vec<i32> = (0..count).filter(|lp| state.track(*lp).is_some()).collect();

    let active = current.iter().copied().collect::<BTreeSet<_>>() == members;
    let audible = if active { &previous } else { &members };
    for lp in loops {
        let cmd = if audible.contains(&lp) { "mute_off" } else { "mute_on" };
        cx.engine.hit(LoopAddr::Loop(lp), cmd);
    }

    if active {
        cx.set_device(DeviceSetting::GroupSolo(None));
    } else {
        cx.dispatch(Action::Batch(vec![
            Action::Device(DeviceSetting::PrevLoopSelection(Some(current))),
            Action::Device(DeviceSetting::GroupSolo(Some(num))),
        ]));
    }
}
