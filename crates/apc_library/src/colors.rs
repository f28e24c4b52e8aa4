use num_derive::FromPrimitive;

/// Pad colors as indices into the APC Key 25 mk2 velocity palette.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, FromPrimitive)]
#[repr(u8)]
pub enum Color {
    Black = 0,
    DarkGrey = 1,
    Grey = 2,
    White = 3,
    Red = 5,
    BrownishRed = 7,
    Orange = 9,
    BrownLight = 11,
    Yellow = 13,
    Lime = 17,
    LimeDark = 19,
    Green = 21,
    DarkGreen = 23,
    BlueLight = 41,
    Blue = 45,
    BlueDark = 47,
    Purple = 49,
    Pink = 53,
    PinkLight = 56,
    PinkWarm = 57,
    Amber = 61,
    GreenYellow = 62,
}

impl Color {
    /// Closest match on the first generation's three-color pads.
    pub fn mk1(self) -> Mk1Color {
        match self {
            Color::Black => Mk1Color::Off,
            Color::Green
            | Color::DarkGreen
            | Color::Lime
            | Color::LimeDark
            | Color::GreenYellow
            | Color::BlueLight
            | Color::Blue
            | Color::BlueDark => Mk1Color::Green,
            Color::Red
            | Color::BrownishRed
            | Color::Pink
            | Color::PinkLight
            | Color::PinkWarm
            | Color::Purple => Mk1Color::Red,
            Color::DarkGrey
            | Color::Grey
            | Color::White
            | Color::Orange
            | Color::BrownLight
            | Color::Yellow
            | Color::Amber => Mk1Color::Yellow,
        }
    }
}

/// Pad velocities understood by the first generation APC Key 25. Blinking is `color + 1`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Mk1Color {
    Off = 0,
    Green = 1,
    Red = 3,
    Yellow = 5,
}

/// Single-color buttons (soft keys, knob-control row).
#[derive(Copy, Clone, Debug, PartialEq, Eq, FromPrimitive)]
#[repr(u8)]
pub enum SoftKey {
    Off = 0,
    On = 1,
    Blink = 2,
}
