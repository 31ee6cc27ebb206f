#![cfg_attr(not(test), no_std)]

//! Adaptive Fast Charging (AFC) over a single bit-banged data line.
//!
//! The sink talks to the charger by toggling the USB D- line with software timing:
//! a long sync pulse ("Mping") from us, a response pulse ("Sping") from the charger,
//! and a single parity-protected byte selecting the requested voltage.

#[macro_use]
mod fmt;

pub mod bitbang;
pub mod error;
pub mod frame;
pub mod handshake;
pub mod line;
pub mod timing;

pub use {
    bitbang::Bitbang,
    error::{Error, Result},
    handshake::Step,
    timing::Timing,
};

/// Bus voltage below which no source is considered attached (in mV)
pub const PRESENCE_FLOOR_MV: u32 = 3500;

/// Bus voltage under which a 5V request counts as satisfied (in mV)
pub const V5_CEILING_MV: u32 = 5500;

/// Bus voltage over which a 9V request counts as satisfied (in mV)
pub const V9_FLOOR_MV: u32 = 7500;

/// Voltage levels a charger can be asked for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Voltage {
    V5,
    V9,
}

impl Voltage {
    /// Byte sent to the charger to request this voltage
    pub const fn code(self) -> u8 {
        match self {
            Self::V5 => 0x08,
            Self::V9 => 0x46,
        }
    }

    /// Whether a measured bus voltage lies in this level's acceptance band
    pub const fn accepts(self, millivolts: u32) -> bool {
        match self {
            Self::V5 => millivolts < V5_CEILING_MV,
            Self::V9 => millivolts > V9_FLOOR_MV,
        }
    }
}

/// Outcome of a negotiation, as handed to the power supply
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Classification {
    Fail,
    V5,
    V9,
}

impl Classification {
    /// Classify a negotiation for `target` from the last measured bus voltage.
    ///
    /// Only the measurement counts: a charger that acknowledged the request but never
    /// moved its output is still a failure.
    pub const fn measure(target: Voltage, millivolts: u32) -> Self {
        match target {
            Voltage::V5 if target.accepts(millivolts) => Self::V5,
            Voltage::V9 if target.accepts(millivolts) => Self::V9,
            _ => Self::Fail,
        }
    }

    pub const fn is_fast_charge(self) -> bool {
        !matches!(self, Self::Fail)
    }
}

impl From<Voltage> for Classification {
    fn from(voltage: Voltage) -> Self {
        match voltage {
            Voltage::V5 => Self::V5,
            Voltage::V9 => Self::V9,
        }
    }
}
