use midly::MidiMessage;
use midly::live::LiveEvent;
use num_derive::FromPrimitive;

pub const COLS: usize = 8;
pub const ROWS: usize = 5;
pub const PAD_START: u8 = 0x00;
pub const PAD_END: u8 = 0x27;
pub const KNOB_CC_START: u8 = 0x30;
pub const KNOBS: u8 = 8;
pub const KNOBS_PER_ROW: usize = 4;

/// Buttons outside the pad matrix. The lower row doubles as the knob-control
/// selector (volume/pan/send/device) on the right half.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, FromPrimitive)]
#[repr(u8)]
pub enum Buttons {
    Track1 = 0x40,
    Track2 = 0x41,
    Undo = 0x42,
    Redo = 0x43,
    KnobCtrlVolume = 0x44,
    KnobCtrlPan = 0x45,
    KnobCtrlSend = 0x46,
    KnobCtrlDevice = 0x47,
    StopAllClips = 0x51,
    SoftKeyClipStop = 0x52,
    SoftKeySolo = 0x53,
    SoftKeyMute = 0x54,
    SoftKeyRecArm = 0x55,
    SoftKeySelect = 0x56,
    Play = 0x5B,
    Record = 0x5D,
    Shift = 0x62,
}

impl Buttons {
    pub fn from_note(note: u8) -> Option<Buttons> {
        num::FromPrimitive::from_u8(note)
    }

    pub fn is_mode_select(self) -> bool {
        (Buttons::KnobCtrlVolume as u8..=Buttons::KnobCtrlDevice as u8).contains(&(self as u8))
    }

    pub fn is_soft_key(self) -> bool {
        (Buttons::SoftKeyClipStop as u8..=Buttons::SoftKeySelect as u8).contains(&(self as u8))
    }
}

pub const LIT_BUTTONS: [Buttons; 13] = [
    Buttons::Track1,
    Buttons::Track2,
    Buttons::Undo,
    Buttons::Redo,
    Buttons::KnobCtrlVolume,
    Buttons::KnobCtrlPan,
    Buttons::KnobCtrlSend,
    Buttons::KnobCtrlDevice,
    Buttons::SoftKeyClipStop,
    Buttons::SoftKeySolo,
    Buttons::SoftKeyMute,
    Buttons::SoftKeyRecArm,
    Buttons::SoftKeySelect,
];

/// High nibble of the status byte.
#[derive(Copy, Clone, Debug, PartialEq, Eq, FromPrimitive)]
#[repr(u8)]
pub enum EventType {
    NoteOff = 0x8,
    NoteOn = 0x9,
    ControlChange = 0xB,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MidiEvent {
    pub kind: EventType,
    pub data1: u8,
    pub data2: u8,
}

impl MidiEvent {
    pub fn new(kind: EventType, data1: u8, data2: u8) -> Self {
        Self { kind, data1, data2 }
    }

    /// Parses a raw message from the controller. Only channel 0 carries the
    /// pads and buttons; the keybed on channel 1 is not ours.
    pub fn parse(bytes: &[u8]) -> Option<MidiEvent> {
        let LiveEvent::Midi { channel, message } = LiveEvent::parse(bytes).ok()? else {
            return None;
        };
        if channel.as_int() != 0 {
            return None;
        }
        match message {
            MidiMessage::NoteOn { key, vel } => {
                Some(Self::new(EventType::NoteOn, key.as_int(), vel.as_int()))
            }
            MidiMessage::NoteOff { key, vel } => {
                Some(Self::new(EventType::NoteOff, key.as_int(), vel.as_int()))
            }
            MidiMessage::Controller { controller, value } => Some(Self::new(
                EventType::ControlChange,
                controller.as_int(),
                value.as_int(),
            )),
            _ => None,
        }
    }

    pub fn is_pad(&self) -> bool {
        self.kind != EventType::ControlChange && is_pad(self.data1)
    }
}

pub fn is_pad(note: u8) -> bool {
    (PAD_START..=PAD_END).contains(&note)
}

/// First pad of a row, counted from the top. Pad 0 is bottom left.
pub fn row_start_pad(row: usize) -> u8 {
    ((ROWS - 1 - row) * COLS) as u8
}

pub fn row_pads(row: usize) -> impl Iterator<Item = u8> {
    let start = row_start_pad(row);
    (0..COLS as u8).map(move |x| start + x)
}

pub fn pad_row(pad: u8) -> usize {
    ROWS - 1 - (pad as usize / COLS)
}

pub fn pad_col(pad: u8) -> usize {
    pad as usize % COLS
}

/// Pad at a column of a bottom-up row index.
pub fn get_pad(cols: usize, col: usize, row: usize) -> u8 {
    (row * cols + col) as u8
}
