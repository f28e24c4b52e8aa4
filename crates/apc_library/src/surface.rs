use crate::colors::Color;
use crate::controls::{LIT_BUTTONS, PAD_END, PAD_START};
use crate::lights::{LedInstruction, LedMode, LedProtocol, NoteOn};
use crate::timer::Scheduler;
use log::warn;
use midly::MidiMessage;
use midly::live::LiveEvent;
use midly::num::{u4, u7};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Raw byte output towards the controller.
pub trait MidiSink {
    fn send(&mut self, bytes: &[u8]) -> anyhow::Result<()>;
}

type DelayedAction = Box<dyn FnOnce(&mut LedSurface) -> anyhow::Result<()>>;

/// LED writer that remembers the last steady value of every LED, so a
/// temporary overlay can be reverted, and runs delayed LED actions.
pub struct LedSurface {
    sink: Box<dyn MidiSink>,
    protocol: Box<dyn LedProtocol>,
    state: [Option<(u8, LedMode)>; 128],
    timer: Scheduler<u8>,
    actions: HashMap<u8, DelayedAction>,
}

impl LedSurface {
    pub fn new(sink: Box<dyn MidiSink>, protocol: Box<dyn LedProtocol>) -> Self {
        Self {
            sink,
            protocol,
            state: [None; 128],
            timer: Scheduler::new(),
            actions: HashMap::new(),
        }
    }

    pub fn reset(&mut self) {
        self.state.fill(None);
        self.timer = Scheduler::new();
        self.actions.clear();
    }

    /// Last steady `(color, mode)` written to `led`.
    pub fn get(&self, led: u8) -> Option<(u8, LedMode)> {
        self.state[led as usize & 0x7f]
    }

    pub fn all_off(&mut self) -> anyhow::Result<()> {
        self.control_leds_off()?;
        self.pad_leds_off()
    }

    pub fn control_leds_off(&mut self) -> anyhow::Result<()> {
        for btn in LIT_BUTTONS {
            self.led_off(btn as u8, false)?;
        }
        Ok(())
    }

    pub fn pad_leds_off(&mut self) -> anyhow::Result<()> {
        for pad in PAD_START..=PAD_END {
            self.led_off(pad, false)?;
        }
        Ok(())
    }

    pub fn led_off(&mut self, led: u8, overlay: bool) -> anyhow::Result<()> {
        self.clear_delayed(led);
        self.send_note(self.protocol.encode(led, 0, LedMode::Off))?;
        if !overlay {
            self.state[led as usize & 0x7f] = Some((Color::Black as u8, LedMode::Off));
        }
        Ok(())
    }

    pub fn led_on(&mut self, led: u8, color: u8, mode: LedMode, overlay: bool) -> anyhow::Result<()> {
        self.clear_delayed(led);
        self.send_note(self.protocol.encode(led, color, mode))?;
        if !overlay {
            self.state[led as usize & 0x7f] = Some((color, mode));
        }
        Ok(())
    }

    /// Writes a rendered instruction as the LED's new steady value.
    pub fn write(&mut self, led: &LedInstruction) -> anyhow::Result<()> {
        if led.mode.is_off() {
            self.led_off(led.index, false)
        } else {
            self.led_on(led.index, led.color, led.mode, false)
        }
    }

    /// Restores the steady value that an overlay covered.
    pub fn remove_overlay(&mut self, led: u8) -> anyhow::Result<()> {
        match self.get(led) {
            Some((color, mode)) => self.led_on(led, color, mode, false),
            None => {
                self.clear_delayed(led);
                self.send_note(self.protocol.encode(led, 0, LedMode::Off))
            }
        }
    }

    /// Runs `action` once `timeout` has passed. Any new write to the same LED
    /// before then cancels it.
    pub fn delayed<F>(&mut self, led: u8, timeout: Duration, now: Instant, action: F)
    where
        F: FnOnce(&mut LedSurface) -> anyhow::Result<()> + 'static,
    {
        self.timer.add_after(led, timeout, now);
        self.actions.insert(led, Box::new(action));
    }

    pub fn clear_delayed(&mut self, led: u8) {
        self.timer.remove(&led);
        self.actions.remove(&led);
    }

    /// Shows a transient value and reverts to the steady one after `duration`.
    pub fn flash(
        &mut self,
        led: u8,
        color: u8,
        mode: LedMode,
        duration: Duration,
        now: Instant,
    ) -> anyhow::Result<()> {
        self.led_on(led, color, mode, true)?;
        self.delayed(led, duration, now, move |s| s.remove_overlay(led));
        Ok(())
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.timer.next_deadline()
    }

    pub fn fire_due(&mut self, now: Instant) {
        for led in self.timer.take_due(now) {
            if let Some(action) = self.actions.remove(&led) {
                if let Err(e) = action(self) {
                    warn!("Delayed LED action for {led} failed: {e}");
                }
            }
        }
    }

    fn send_note(&mut self, note: NoteOn) -> anyhow::Result<()> {
        let ev = LiveEvent::Midi {
            channel: u4::new(note.channel),
            message: MidiMessage::NoteOn {
                key: u7::new(note.key),
                vel: u7::new(note.velocity),
            },
        };
        let mut buf = Vec::with_capacity(3);
        ev.write_std(&mut buf)?;
        self.sink.send(&buf)
    }
}
