//! Protocol timing
//!
//! Every pulse width is a multiple of the unit interval (UI). Line holds are produced by a
//! calibrated spin: each tick nominally lasts [`Timing::tick`] but only spins for
//! [`Timing::tick_spin`], leaving the remainder to the pin and loop overhead.

use fugit::{MicrosDurationU32, MillisDurationU32, NanosDurationU32};

/// Sync pulse width in UI
pub const SYNC_UI: u32 = 16;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timing {
    /// Nominal period of one spin tick
    pub tick: MicrosDurationU32,
    /// Time actually spent spinning per tick
    pub tick_spin: NanosDurationU32,
    /// Unit interval
    pub ui: MicrosDurationU32,
    /// UI to wait for the rising edge of a response pulse
    pub response_wait_ui: u32,
    /// Shortest accepted response pulse, in UI
    pub response_min_ui: u32,
    /// Longest accepted response pulse, in UI
    pub response_max_ui: u32,
    /// Gap between the two responses that follow the data byte
    pub ack_gap: MillisDurationU32,
    /// Settle time before the closing sync pulse
    pub confirm_gap: MicrosDurationU32,
    /// Width of the line reset pulse, in UI
    pub reset_ui: u32,
}

impl Timing {
    pub const DEFAULT: Self = Self {
        tick: MicrosDurationU32::from_ticks(10),
        tick_spin: NanosDurationU32::from_ticks(9_000),
        ui: MicrosDurationU32::from_ticks(160),
        response_wait_ui: 10,
        response_min_ui: 10,
        response_max_ui: 20,
        ack_gap: MillisDurationU32::from_ticks(2),
        confirm_gap: MicrosDurationU32::from_ticks(200),
        reset_ui: 100,
    };

    /// Number of spin ticks covering `duration`, rounded down
    pub const fn ticks(&self, duration: MicrosDurationU32) -> u32 {
        match duration.ticks().checked_div(self.tick.ticks()) {
            Some(ticks) => ticks,
            None => 0,
        }
    }

    pub const fn ui_ticks(&self) -> u32 {
        self.ticks(self.ui)
    }

    /// Quarter UI, the width of the framing edges around a byte
    pub const fn quarter_ui_ticks(&self) -> u32 {
        self.ui_ticks() / 4
    }

    pub const fn sync_ticks(&self) -> u32 {
        self.ui_ticks().saturating_mul(SYNC_UI)
    }

    pub const fn confirm_gap_ticks(&self) -> u32 {
        self.ticks(self.confirm_gap)
    }

    /// Reset pulse width in microseconds
    pub const fn reset_micros(&self) -> u32 {
        self.ui.ticks().saturating_mul(self.reset_ui)
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self::DEFAULT
    }
}
