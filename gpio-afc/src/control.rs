//! Operator control: the `afc_disable` attribute

use {
    crate::{reporter::Reporter, Afc},
    afc::line::DataLine,
    embassy_sync::blocking_mutex::raw::RawMutex,
    embedded_hal::{delay::DelayNs, digital::OutputPin},
    embedded_hal_async::delay::DelayNs as Sleep,
};

pub const ENABLED_TEXT: &str = "AFC is enabled";
pub const DISABLED_TEXT: &str = "AFC is disabled";

impl<M, LINE, DELAY, SWITCH, SLEEP, REPORTER> Afc<M, LINE, DELAY, SWITCH, SLEEP, REPORTER>
where
    M: RawMutex,
    LINE: DataLine,
    DELAY: DelayNs,
    SWITCH: OutputPin,
    SLEEP: Sleep,
    REPORTER: Reporter,
{
    pub fn disable_show(&self) -> &'static str {
        if self.is_disabled() {
            DISABLED_TEXT
        } else {
            ENABLED_TEXT
        }
    }

    /// `"1"` disables, `"0"` enables, only the first character counts. Anything else is
    /// ignored.
    pub fn disable_store(&self, input: &str) {
        let disabled = match input.as_bytes().first() {
            Some(b'1') => true,
            Some(b'0') => false,
            _ => {
                warn!("afc_disable: invalid value");
                return;
            }
        };

        info!("afc_disable: {}", disabled);
        self.set_disabled(disabled);
        self.reporter().set_enable_flag(!disabled);
    }
}
