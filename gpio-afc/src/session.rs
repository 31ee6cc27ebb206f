use afc::{Error, Voltage};

/// Bookkeeping for one negotiation, owned by whoever holds the hardware
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Session {
    /// Requested voltage
    pub target: Option<Voltage>,
    /// Failure of the most recent handshake, cleared by a success
    pub last_error: Option<Error>,
    /// Failed handshakes so far
    pub retries: u8,
    /// Consecutive successful handshakes
    pub successes: u8,
    /// A negotiation is running
    pub in_progress: bool,
}

impl Session {
    pub fn start(&mut self, target: Voltage) {
        *self = Self {
            target: Some(target),
            in_progress: true,
            ..Self::default()
        };
    }

    pub fn record_success(&mut self) {
        self.last_error = None;
        self.successes = self.successes.saturating_add(1);
    }

    pub fn record_failure(&mut self, error: Error) {
        self.last_error = Some(error);
        self.retries = self.retries.saturating_add(1);
        self.successes = 0;
    }

    pub fn finish(&mut self) {
        self.in_progress = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_resets_previous_attempt() {
        let mut session = Session::default();
        session.start(Voltage::V5);
        session.record_failure(Error::ResponseNotDetected);
        session.finish();

        session.start(Voltage::V9);
        assert_eq!(session.target, Some(Voltage::V9));
        assert_eq!(session.retries, 0);
        assert_eq!(session.last_error, None);
        assert!(session.in_progress);
    }

    #[test]
    fn failure_breaks_success_streak() {
        let mut session = Session::default();
        session.start(Voltage::V9);

        session.record_success();
        session.record_success();
        session.record_failure(Error::ConfirmFailed);
        assert_eq!(session.successes, 0);
        assert_eq!(session.last_error, Some(Error::ConfirmFailed));

        session.record_success();
        assert_eq!(session.successes, 1);
        assert_eq!(session.last_error, None);
        assert_eq!(session.retries, 1);
    }
}
