//! AFC handshake
//!
//! ```text
//!  us:      Mping        byte  Mping              Mping
//!  charger:       Sping              Sping  Sping        Sping
//!          SYNC_OUT/WAIT DATA_OUT    MPING2 CONFIRM      DONE
//! ```
//!
//! The whole exchange runs inside a critical section: the pulse widths are a few hundred
//! microseconds and an interrupt in the middle of one desynchronises the charger.

use {
    crate::{
        bitbang::Bitbang,
        error::{Error, Result},
        line::DataLine,
        Voltage,
    },
    embedded_hal::delay::DelayNs,
};

/// Handshake steps, in order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Step {
    /// Send the opening sync pulse
    SyncOut,
    /// Wait for the charger to answer it
    SyncWait,
    /// Send the request byte followed by a sync pulse
    DataOut,
    /// First response after the byte: the charger received it
    Mping2,
    /// Second response after the byte: the charger accepted it
    Confirm,
    /// Closing sync pulse and its response
    Done,
}

impl Step {
    /// Error reported when this step fails
    pub const fn error(self) -> Error {
        match self {
            Self::SyncOut | Self::SyncWait => Error::SyncNotDetected,
            Self::DataOut | Self::Mping2 => Error::ResponseNotDetected,
            Self::Confirm => Error::ResponseMalformed,
            Self::Done => Error::ConfirmFailed,
        }
    }
}

/// Run a complete handshake requesting `voltage`.
///
/// Interrupts are masked for the duration, so this must never be called with anything
/// that needs to run in the meantime.
pub fn run<LINE: DataLine, DELAY: DelayNs>(
    bitbang: &mut Bitbang<LINE, DELAY>,
    voltage: Voltage,
) -> Result<()> {
    critical_section::with(|_| exchange(bitbang, voltage))
}

fn exchange<LINE: DataLine, DELAY: DelayNs>(
    bitbang: &mut Bitbang<LINE, DELAY>,
    voltage: Voltage,
) -> Result<()> {
    let mut step = Step::SyncOut;

    loop {
        let next = advance(bitbang, step, voltage).map_err(|e| {
            debug!("handshake failed at {:?}: {:?}", step, e);
            e
        })?;

        match next {
            Some(next) => step = next,
            None => return Ok(()),
        }
    }
}

/// Perform `step`, returning the step that follows it
fn advance<LINE: DataLine, DELAY: DelayNs>(
    bitbang: &mut Bitbang<LINE, DELAY>,
    step: Step,
    voltage: Voltage,
) -> Result<Option<Step>> {
    let timing = *bitbang.timing();

    let next = match step {
        Step::SyncOut => {
            bitbang.send_sync()?;
            Step::SyncWait
        }
        Step::SyncWait => {
            expect_response(bitbang, step)?;
            Step::DataOut
        }
        Step::DataOut => {
            bitbang.send_byte(voltage.code())?;
            bitbang.send_sync()?;
            Step::Mping2
        }
        Step::Mping2 => {
            expect_response(bitbang, step)?;
            Step::Confirm
        }
        Step::Confirm => {
            bitbang.pause(timing.ack_gap.convert());
            expect_response(bitbang, step)?;

            bitbang.hold(timing.confirm_gap_ticks());
            bitbang.send_sync()?;
            Step::Done
        }
        Step::Done => {
            expect_response(bitbang, step)?;
            return Ok(None);
        }
    };

    Ok(Some(next))
}

fn expect_response<LINE: DataLine, DELAY: DelayNs>(
    bitbang: &mut Bitbang<LINE, DELAY>,
    step: Step,
) -> Result<()> {
    let check = bitbang.receive_response()?;
    if check.is_valid() {
        Ok(())
    } else {
        trace!("{:?}: {:?}", step, check);
        Err(step.error())
    }
}
