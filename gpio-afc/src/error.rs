use derive_more::{Display, Error};

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Failures taking ownership of the hardware, fatal to the device
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    #[display("data line unavailable")]
    Line,
    #[display("switch line unavailable")]
    Switch,
}
