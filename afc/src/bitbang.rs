//! Signal primitives and framing on top of a [`DataLine`]
//!
//! Nothing in here knows about the handshake; it only produces and measures pulses. Callers
//! must hold exclusive access to the line for the whole exchange, see [`crate::handshake`].

use {
    crate::{
        error::{Error, Result},
        frame::{self, Segment},
        line::DataLine,
        timing::Timing,
    },
    embedded_hal::{delay::DelayNs, digital::PinState},
    fugit::MicrosDurationU32,
};

/// Which side currently owns the line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// We drive the line
    Output,
    /// The charger drives the line
    Input,
}

/// Result of waiting for a response pulse
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PulseCheck {
    /// Pulse seen with an acceptable width (in UI)
    Valid { width: u32 },
    /// No rising edge in the wait window
    Timeout,
    /// Line still high after the maximum width
    TooLong,
    /// Line fell before the minimum width
    TooShort { width: u32 },
}

impl PulseCheck {
    pub const fn is_valid(self) -> bool {
        matches!(self, Self::Valid { .. })
    }
}

/// Bit-banged AFC signaling engine
pub struct Bitbang<LINE, DELAY> {
    line: LINE,
    delay: DELAY,
    timing: Timing,
    direction: Direction,
}

impl<LINE: DataLine, DELAY: DelayNs> Bitbang<LINE, DELAY> {
    /// Take the line and drive it low, so its direction is known from the start
    pub fn new(mut line: LINE, delay: DELAY, timing: Timing) -> Result<Self> {
        line.drive(PinState::Low).map_err(|_| Error::Line)?;

        Ok(Self {
            line,
            delay,
            timing,
            direction: Direction::Output,
        })
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn free(self) -> (LINE, DELAY) {
        (self.line, self.delay)
    }

    /// Drive the line to `state` and keep it there for `ticks` spin ticks
    pub fn drive(&mut self, state: PinState, ticks: u32) -> Result<()> {
        self.line.drive(state).map_err(|_| Error::Line)?;
        self.direction = Direction::Output;
        self.hold(ticks);

        Ok(())
    }

    /// High for `half` ticks, then low for `half` ticks
    pub fn cycle(&mut self, half: u32) -> Result<()> {
        self.drive(PinState::High, half)?;
        self.drive(PinState::Low, half)
    }

    /// Spin for `ticks` ticks without touching the line
    pub fn hold(&mut self, ticks: u32) {
        let spin = self.timing.tick_spin.ticks();
        for _ in 0..ticks {
            self.delay.delay_ns(spin);
        }
    }

    /// Uncalibrated wait for gaps that are not part of a pulse
    pub fn pause(&mut self, duration: MicrosDurationU32) {
        self.delay.delay_us(duration.ticks());
    }

    /// Hand the line to the charger
    pub fn release(&mut self) -> Result<()> {
        self.line.release().map_err(|_| Error::Line)?;
        self.direction = Direction::Input;

        Ok(())
    }

    /// Read the line, releasing it first if we were driving it
    pub fn sample(&mut self) -> Result<bool> {
        if self.direction == Direction::Output {
            self.release()?;
        }

        self.line.is_high().map_err(|_| Error::Line)
    }

    /// Sync pulse ("Mping"): 16 UI high, then low
    pub fn send_sync(&mut self) -> Result<()> {
        let ticks = self.timing.sync_ticks();
        self.drive(PinState::High, ticks)?;
        self.drive(PinState::Low, 0)
    }

    /// Wait for a response pulse ("Sping") and check its width.
    ///
    /// The line is sampled once per UI: up to `max_wait + 1` samples for the rising edge,
    /// then until it falls. Every loop is bounded.
    pub fn receive_pulse(
        &mut self,
        max_wait: u32,
        min_width: u32,
        max_width: u32,
    ) -> Result<PulseCheck> {
        let ui = self.timing.ui_ticks();
        self.release()?;

        let mut rose = false;
        for _ in 0..=max_wait {
            self.hold(ui);
            if self.sample()? {
                rose = true;
                break;
            }
        }

        if !rose {
            trace!("no response within {} UI", max_wait);
            return Ok(PulseCheck::Timeout);
        }

        let mut width = 1;
        loop {
            if width > max_width {
                return Ok(PulseCheck::TooLong);
            }

            self.hold(ui);
            if !self.sample()? {
                break;
            }
            width += 1;
        }

        if width < min_width {
            return Ok(PulseCheck::TooShort { width });
        }

        Ok(PulseCheck::Valid { width })
    }

    /// Response pulse with the bounds from [`Timing`]
    pub fn receive_response(&mut self) -> Result<PulseCheck> {
        let Timing {
            response_wait_ui,
            response_min_ui,
            response_max_ui,
            ..
        } = self.timing;

        self.receive_pulse(response_wait_ui, response_min_ui, response_max_ui)
    }

    /// Send one byte, MSB first, with parity and framing edges
    pub fn send_byte(&mut self, value: u8) -> Result<()> {
        for Segment { state, ticks } in frame::encode(value, &self.timing) {
            self.drive(state, ticks)?;
        }

        Ok(())
    }

    /// Long high pulse that returns a confused charger to idle
    pub fn reset(&mut self) -> Result<()> {
        let width = MicrosDurationU32::from_ticks(self.timing.reset_micros());

        self.drive(PinState::High, 0)?;
        self.pause(width);
        self.drive(PinState::Low, 0)
    }
}
