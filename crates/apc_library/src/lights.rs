use crate::colors::{Color, Mk1Color, SoftKey};
use crate::controls::is_pad;
use num_derive::FromPrimitive;

/// Pad LED brightness and animation. The mk2 encodes the mode in the
/// status byte: `0x90 | n` lights a pad at the n-th level.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, FromPrimitive)]
#[repr(u8)]
pub enum LedMode {
    Off = 0x80,
    Bright10 = 0x90,
    Bright25 = 0x91,
    Bright50 = 0x92,
    Bright65 = 0x93,
    Bright75 = 0x94,
    Bright90 = 0x95,
    Bright100 = 0x96,
    Pulsing16 = 0x97,
    Pulsing8 = 0x98,
    Pulsing4 = 0x99,
    Pulsing2 = 0x9A,
    Blinking24 = 0x9B,
    Blinking16 = 0x9C,
    Blinking8 = 0x9D,
    Blinking4 = 0x9E,
    Blinking2 = 0x9F,
}

impl LedMode {
    /// Buttons ignore brightness; they are driven with a plain channel 0 note on.
    pub const BUTTON: LedMode = LedMode::Bright10;

    pub fn channel(self) -> u8 {
        self as u8 & 0x0f
    }

    pub fn is_off(self) -> bool {
        self == LedMode::Off
    }

    pub fn is_animated(self) -> bool {
        self > LedMode::Bright100
    }
}

/// Sub-pad brightness ramp for the partially lit pad of a level bar.
pub const LED_BRIGHTS: [LedMode; 7] = [
    LedMode::Bright10,
    LedMode::Bright25,
    LedMode::Bright50,
    LedMode::Bright65,
    LedMode::Bright75,
    LedMode::Bright90,
    LedMode::Bright100,
];

/// One rendered LED: `(mode, pad or button, color)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct LedInstruction {
    pub mode: LedMode,
    pub index: u8,
    pub color: u8,
}

impl LedInstruction {
    pub fn new(mode: LedMode, index: u8, color: u8) -> Self {
        Self { mode, index, color }
    }

    pub fn pad(mode: LedMode, index: u8, color: Color) -> Self {
        Self::new(mode, index, color as u8)
    }

    pub fn button(index: u8, value: SoftKey) -> Self {
        Self::new(LedMode::BUTTON, index, value as u8)
    }

    pub fn off(index: u8) -> Self {
        Self::new(LedMode::Off, index, Color::Black as u8)
    }
}

/// Raw note on sent to the device.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct NoteOn {
    pub channel: u8,
    pub key: u8,
    pub velocity: u8,
}

/// Maps an LED instruction onto the bytes a particular device generation expects.
pub trait LedProtocol {
    fn encode(&self, led: u8, color: u8, mode: LedMode) -> NoteOn;
}

/// APC Key 25 mk2: RGB palette, brightness as channel.
#[derive(Debug, Default)]
pub struct Mk2;

impl LedProtocol for Mk2 {
    fn encode(&self, led: u8, color: u8, mode: LedMode) -> NoteOn {
        if mode.is_off() {
            return NoteOn { channel: 0, key: led, velocity: 0 };
        }
        NoteOn {
            channel: mode.channel(),
            key: led,
            velocity: color,
        }
    }
}

/// First generation APC Key 25: green/red/yellow pads, no dimming.
#[derive(Debug, Default)]
pub struct Mk1;

impl LedProtocol for Mk1 {
    fn encode(&self, led: u8, color: u8, mode: LedMode) -> NoteOn {
        let off = NoteOn { channel: 0, key: led, velocity: 0 };
        if mode.is_off() {
            return off;
        }
        if !is_pad(led) {
            return NoteOn { channel: 0, key: led, velocity: color };
        }
        // Dim pads would be indistinguishable from lit ones.
        if mode < LedMode::Bright50 {
            return off;
        }
        let base = num::FromPrimitive::from_u8(color)
            .map(Color::mk1)
            .unwrap_or(Mk1Color::Off);
        let velocity = match base {
            Mk1Color::Off => 0,
            c if mode.is_animated() => c as u8 + 1,
            c => c as u8,
        };
        NoteOn { channel: 0, key: led, velocity }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mk2_puts_brightness_on_channel() {
        let n = Mk2.encode(5, Color::Red as u8, LedMode::Bright100);
        assert_eq!(n, NoteOn { channel: 6, key: 5, velocity: 5 });
        let off = Mk2.encode(5, Color::Red as u8, LedMode::Off);
        assert_eq!(off.velocity, 0);
    }

    #[test]
    fn mk1_collapses_brightness() {
        assert_eq!(Mk1.encode(3, Color::Green as u8, LedMode::Bright25).velocity, 0);
        assert_eq!(Mk1.encode(3, Color::Green as u8, LedMode::Bright75).velocity, 1);
        assert_eq!(Mk1.encode(3, Color::Red as u8, LedMode::Pulsing8).velocity, 4);
        // buttons pass through untouched
        assert_eq!(Mk1.encode(0x52, 2, LedMode::BUTTON).velocity, 2);
    }
}
