//! Byte framing
//!
//! A byte goes out as a train of fixed-width line holds:
//!
//! ```text
//!  lead   preamble      data (MSB first)     parity  tail
//!  ____   _    (_)    ______ ... ______      ______  _  _
//!      |_| |__|   |__|                  |___|      |_| |_|
//! ```
//!
//! The preamble and tail edges are a quarter UI wide. When the MSB is 0 the preamble gets an
//! extra high quarter so the first data bit still starts with an edge.

use {crate::timing::Timing, embedded_hal::digital::PinState, heapless::Vec};

/// Upper bound on the number of segments in a byte frame
pub const MAX_SEGMENTS: usize = 16;

/// Drive the line to `state` for `ticks` spin ticks
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Segment {
    pub state: PinState,
    pub ticks: u32,
}

impl Segment {
    pub const fn new(state: PinState, ticks: u32) -> Self {
        Self { state, ticks }
    }
}

pub type Frame = Vec<Segment, MAX_SEGMENTS>;

/// Parity bit level: high when `value` has an even number of set bits
pub const fn parity(value: u8) -> PinState {
    if value.count_ones() % 2 == 0 {
        PinState::High
    } else {
        PinState::Low
    }
}

/// Build the waveform for one byte
pub fn encode(value: u8, timing: &Timing) -> Frame {
    let ui = timing.ui_ticks();
    let quarter = timing.quarter_ui_ticks();
    let parity = parity(value);

    let mut frame = Frame::new();
    let mut push = |state, ticks| {
        // never more than MAX_SEGMENTS by construction
        let _ = frame.push(Segment::new(state, ticks));
    };

    push(PinState::Low, ui);

    push(PinState::High, quarter);
    push(PinState::Low, quarter);
    if value & 0x80 == 0 {
        push(PinState::High, quarter);
    }

    for bit in (0..8).rev() {
        push(PinState::from(value & (1 << bit) != 0), ui);
    }

    push(parity, ui);
    push(parity, quarter);

    push(PinState::High, quarter);
    push(PinState::Low, quarter);

    frame
}

/// Index of the parity segment in a frame produced by [`encode`]
pub const fn parity_index(value: u8) -> usize {
    if value & 0x80 == 0 {
        12
    } else {
        11
    }
}
