use afc::Classification;

/// Power supply side of the driver
///
/// Every method takes `&self`: the supply is shared with the rest of the charging stack and
/// is expected to synchronise internally.
pub trait Reporter {
    type Error;

    /// Current bus voltage in mV, read fresh on every call
    fn read_bus_voltage(&self) -> Result<u32, Self::Error>;

    /// Final result of a negotiation.
    ///
    /// Anything other than [`Classification::Fail`] should raise the supply's own fast
    /// charge notification.
    fn report_negotiation_result(&self, classification: Classification);

    /// Allow or forbid the higher charging current
    fn set_fast_charge(&self, enabled: bool);

    /// Operator enable switch, forwarded from [`crate::Afc::disable_store`]
    fn set_enable_flag(&self, enabled: bool);
}

impl<R: Reporter> Reporter for &R {
    type Error = R::Error;

    fn read_bus_voltage(&self) -> Result<u32, Self::Error> {
        R::read_bus_voltage(self)
    }

    fn report_negotiation_result(&self, classification: Classification) {
        R::report_negotiation_result(self, classification)
    }

    fn set_fast_charge(&self, enabled: bool) {
        R::set_fast_charge(self, enabled)
    }

    fn set_enable_flag(&self, enabled: bool) {
        R::set_enable_flag(self, enabled)
    }
}
