use derive_more::{Display, Error};

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Handshake failures, tagged by the step that failed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// No response to the opening sync pulse
    #[display("sync response not detected")]
    SyncNotDetected,
    /// No response to the sync pulse following the data byte
    #[display("response not detected after data")]
    ResponseNotDetected,
    /// Second response after the data byte missing or out of bounds
    #[display("response malformed after data")]
    ResponseMalformed,
    /// No response to the closing sync pulse
    #[display("final confirmation failed")]
    ConfirmFailed,
    /// The data line could not be driven or read
    #[display("data line fault")]
    Line,
}

impl Error {
    /// Numeric failure code, 1 to 4 for timing failures
    pub const fn code(self) -> u8 {
        match self {
            Self::SyncNotDetected => 1,
            Self::ResponseNotDetected => 2,
            Self::ResponseMalformed => 3,
            Self::ConfirmFailed => 4,
            Self::Line => 0xff,
        }
    }

    /// Whether the failure came from the protocol timing rather than the pin driver
    pub const fn is_timing(self) -> bool {
        !matches!(self, Self::Line)
    }
}
