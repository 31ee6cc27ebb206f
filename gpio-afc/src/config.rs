//! Driver configuration
//!
//! Defaults match the charger behaviour observed in the field; boards only need to override
//! what their supply does differently.

use {
    afc::{Timing, PRESENCE_FLOOR_MV},
    fugit::MillisDurationU32,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Line timing
    pub timing: Timing,
    /// Start with negotiation disabled
    pub disabled: bool,
    /// Consecutive successful handshakes needed before checking the bus
    pub handshake_rounds: u8,
    /// Handshake failures tolerated before giving up
    pub retry_max: u8,
    /// Extra bus samples while waiting for the voltage to settle
    pub settle_retry_max: u8,
    /// Bus voltage under which no charger is attached (in mV)
    pub presence_floor_mv: u32,
    /// Wait after attach before the first negotiation
    pub first_attach_delay: MillisDurationU32,
    /// Wait after every handshake
    pub post_handshake_delay: MillisDurationU32,
    /// Wait between a failed handshake and the next attempt
    pub retry_backoff: MillisDurationU32,
    /// Wait between bus samples while settling
    pub settle_interval: MillisDurationU32,
}

impl Config {
    pub const DEFAULT: Self = Self {
        timing: Timing::DEFAULT,
        disabled: false,
        handshake_rounds: 1,
        retry_max: 5,
        settle_retry_max: 10,
        presence_floor_mv: PRESENCE_FLOOR_MV,
        first_attach_delay: MillisDurationU32::from_ticks(1500),
        post_handshake_delay: MillisDurationU32::from_ticks(38),
        retry_backoff: MillisDurationU32::from_ticks(300),
        settle_interval: MillisDurationU32::from_ticks(20),
    };

    pub const fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    pub const fn with_boot_mode(mut self, mode: BootMode) -> Self {
        self.disabled = mode.is_disabled();
        self
    }

    pub const fn with_handshake_rounds(mut self, rounds: u8) -> Self {
        self.handshake_rounds = rounds;
        self
    }

    pub const fn with_retry_max(mut self, retry_max: u8) -> Self {
        self.retry_max = retry_max;
        self
    }

    pub const fn with_settle_retry_max(mut self, settle_retry_max: u8) -> Self {
        self.settle_retry_max = settle_retry_max;
        self
    }

    /// Whether a bus voltage shows a charger attached
    pub const fn is_present(&self, millivolts: u32) -> bool {
        millivolts >= self.presence_floor_mv
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Boot-time AFC mode, passed as an integer parameter (`0x31` disables, `0x30` enables)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BootMode(pub u32);

impl BootMode {
    /// Parse a decimal or `0x` prefixed hexadecimal value
    pub fn parse(param: &str) -> Option<Self> {
        let param = param.trim();

        let value = match param
            .strip_prefix("0x")
            .or_else(|| param.strip_prefix("0X"))
        {
            Some(hex) => u32::from_str_radix(hex, 16),
            None => param.parse(),
        };

        match value {
            Ok(value) => {
                debug!("boot mode {:#x}", value);
                Some(Self(value))
            }
            Err(_) => {
                warn!("invalid boot mode");
                None
            }
        }
    }

    pub const fn is_disabled(self) -> bool {
        self.0 & 1 != 0
    }
}
