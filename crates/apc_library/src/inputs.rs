use crate::controls::EventType;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Turns press/release pairs into a held flag. A quick tap latches the
/// button on until the next press; holding it longer than the bold-press
/// window makes it momentary.
#[derive(Debug, Default)]
pub struct AutoLatch {
    hits: HashMap<u8, Instant>,
}

impl AutoLatch {
    pub const BOLD_TIME: Duration = Duration::from_millis(300);

    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed_at(&mut self, note: u8, kind: EventType, now: Instant) -> bool {
        match kind {
            EventType::NoteOn => {
                if self.hits.remove(&note).is_some() {
                    return false;
                }
                self.hits.insert(note, now);
                true
            }
            EventType::NoteOff => match self.hits.get(&note) {
                None => false,
                Some(pressed) if now.duration_since(*pressed) < Self::BOLD_TIME => true,
                Some(_) => {
                    self.hits.remove(&note);
                    false
                }
            },
            EventType::ControlChange => self.hits.contains_key(&note),
        }
    }
}

/// Decodes relative knob values (1..=63 clockwise, 65..=127 counter-clockwise)
/// into a signed delta that grows while the knob keeps turning quickly in
/// one direction. Shifted turns are fine-grained and never accelerate.
#[derive(Debug, Default)]
pub struct KnobEase {
    last: HashMap<u8, (Instant, i8, u8)>,
}

impl KnobEase {
    pub const STEP: f32 = 0.1;
    pub const FINE_STEP: f32 = 0.025;
    pub const FAST_WINDOW: Duration = Duration::from_millis(60);
    pub const MAX_SPEED: u8 = 8;

    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed_at(&mut self, cc: u8, value: u8, shifted: bool, now: Instant) -> Option<f32> {
        let ticks: i8 = match value {
            1..=63 => value as i8,
            65..=127 => -((128 - value as i16) as i8),
            _ => return None,
        };
        let direction = ticks.signum();

        if shifted {
            self.last.remove(&cc);
            return Some(ticks as f32 * Self::FINE_STEP);
        }

        let speed = match self.last.get(&cc) {
            Some((at, dir, speed))
                if *dir == direction && now.duration_since(*at) < Self::FAST_WINDOW =>
            {
                (*speed * 2).min(Self::MAX_SPEED)
            }
            _ => 1,
        };
        self.last.insert(cc, (now, direction, speed));
        Some(ticks as f32 * Self::STEP * speed as f32)
    }
}
