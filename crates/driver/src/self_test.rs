use apc_library::colors::{Color, SoftKey};
use apc_library::controls::{LIT_BUTTONS, ROWS, row_pads};
use apc_library::lights::{LED_BRIGHTS, LedInstruction, LedMode};
use apc_library::surface::LedSurface;
use std::{thread, time};

const SWEEP: [Color; ROWS] = [Color::Red, Color::Amber, Color::Yellow, Color::Green, Color::Blue];

/// Lights every LED once so dead pads stand out, then leaves the device dark.
pub(crate) fn self_test(surface: &mut LedSurface) -> anyhow::Result<()> {
    // rows bottom to top, fading in
    for (row, color) in (0..ROWS).rev().zip(SWEEP) {
        for (col, pad) in row_pads(row).enumerate() {
            let mode = LED_BRIGHTS[col.min(LED_BRIGHTS.len() - 1)];
            surface.write(&LedInstruction::pad(mode, pad, color))?;
        }
        thread::sleep(time::Duration::from_millis(60));
    }

    for button in LIT_BUTTONS {
        surface.write(&LedInstruction::button(button as u8, SoftKey::On))?;
        thread::sleep(time::Duration::from_millis(15));
    }

    // final flash, all pads full
    for (row, color) in (0..ROWS).zip(SWEEP) {
        for pad in row_pads(row) {
            surface.write(&LedInstruction::pad(LedMode::Bright100, pad, color))?;
        }
    }
    thread::sleep(time::Duration::from_millis(200));

    surface.all_off()
}
