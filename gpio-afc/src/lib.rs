#![cfg_attr(not(test), no_std)]

//! GPIO AFC driver
//!
//! Negotiates 9V (or back to 5V) with an AFC charger over a bit-banged data line. A switch
//! line connects the data line to the USB connector for the duration of a negotiation.
//!
//! The result is judged by the bus voltage only, after the handshake: a charger that
//! acknowledges the request but never raises its output is reported as a failure.

#[macro_use]
mod fmt;

pub mod config;
pub mod control;
pub mod error;
pub mod reporter;
pub mod session;
pub mod slot;

use {
    crate::{config::Config, reporter::Reporter, session::Session, slot::TaskSlot},
    afc::{handshake, line::DataLine, Bitbang, Classification, Voltage},
    core::{
        ops::{Deref, DerefMut},
        sync::atomic::{AtomicBool, Ordering},
    },
    embassy_sync::blocking_mutex::raw::RawMutex,
    embedded_hal::{delay::DelayNs, digital::OutputPin},
    embedded_hal_async::delay::DelayNs as Sleep,
};

pub use {
    config::BootMode,
    error::{Error, Result},
};

/// What became of a negotiation request
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    /// Negotiation ran and its result was reported
    Reported(Classification),
    /// Bus already at the requested voltage, nothing done
    Duplicate,
    /// Negotiation is disabled, nothing done
    Disabled,
    /// Replaced by another request or a detach before reporting
    Cancelled,
}

/// Everything the negotiation task owns exclusively
pub struct Hardware<LINE, DELAY, SWITCH, SLEEP> {
    bitbang: Bitbang<LINE, DELAY>,
    switch: SWITCH,
    sleep: SLEEP,
    session: Session,
}

impl<LINE, DELAY, SWITCH: OutputPin, SLEEP> Hardware<LINE, DELAY, SWITCH, SLEEP> {
    fn switch_on(&mut self) -> Result<()> {
        self.switch.set_high().map_err(|_| Error::Switch)
    }

    fn switch_off(&mut self) {
        if self.switch.set_low().is_err() {
            error!("failed to turn off AFC switch");
        }
    }
}

/// Hardware with the switch turned on, turned off again when dropped
struct Armed<'a, LINE, DELAY, SWITCH: OutputPin, SLEEP> {
    hardware: &'a mut Hardware<LINE, DELAY, SWITCH, SLEEP>,
}

impl<'a, LINE, DELAY, SWITCH: OutputPin, SLEEP> Armed<'a, LINE, DELAY, SWITCH, SLEEP> {
    fn new(hardware: &'a mut Hardware<LINE, DELAY, SWITCH, SLEEP>) -> Result<Self> {
        hardware.switch_on()?;
        Ok(Self { hardware })
    }
}

impl<LINE, DELAY, SWITCH: OutputPin, SLEEP> Deref for Armed<'_, LINE, DELAY, SWITCH, SLEEP> {
    type Target = Hardware<LINE, DELAY, SWITCH, SLEEP>;

    fn deref(&self) -> &Self::Target {
        self.hardware
    }
}

impl<LINE, DELAY, SWITCH: OutputPin, SLEEP> DerefMut for Armed<'_, LINE, DELAY, SWITCH, SLEEP> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.hardware
    }
}

impl<LINE, DELAY, SWITCH: OutputPin, SLEEP> Drop for Armed<'_, LINE, DELAY, SWITCH, SLEEP> {
    fn drop(&mut self) {
        self.hardware.switch_off();
    }
}

/// Why the handshake loop stopped early
enum Abort {
    /// Too many failed handshakes, the bus is still checked
    Exhausted,
    /// Charger unplugged
    PresenceLost,
}

/// AFC device
pub struct Afc<M: RawMutex, LINE, DELAY, SWITCH, SLEEP, REPORTER> {
    config: Config,
    reporter: REPORTER,
    slot: TaskSlot<M, Hardware<LINE, DELAY, SWITCH, SLEEP>>,
    disabled: AtomicBool,
    /// A negotiation has switched the line on since the last detach
    attached: AtomicBool,
}

impl<M, LINE, DELAY, SWITCH, SLEEP, REPORTER> Afc<M, LINE, DELAY, SWITCH, SLEEP, REPORTER>
where
    M: RawMutex,
    LINE: DataLine,
    DELAY: DelayNs,
    SWITCH: OutputPin,
    SLEEP: Sleep,
    REPORTER: Reporter,
{
    /// Take ownership of the lines, leaving the switch off and the data line low
    pub fn new(
        line: LINE,
        delay: DELAY,
        mut switch: SWITCH,
        sleep: SLEEP,
        reporter: REPORTER,
        config: Config,
    ) -> Result<Self> {
        switch.set_low().map_err(|_| Error::Switch)?;
        let bitbang = Bitbang::new(line, delay, config.timing).map_err(|_| Error::Line)?;

        if config.disabled {
            info!("AFC disabled at boot");
        }

        Ok(Self {
            config,
            reporter,
            slot: TaskSlot::new(Hardware {
                bitbang,
                switch,
                sleep,
                session: Session::default(),
            }),
            disabled: AtomicBool::new(config.disabled),
            attached: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn reporter(&self) -> &REPORTER {
        &self.reporter
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::Relaxed)
    }

    /// Suppress or allow future negotiations, one already running is left alone
    pub fn set_disabled(&self, disabled: bool) {
        self.disabled.store(disabled, Ordering::Relaxed);
    }

    /// Negotiate `target` with the attached charger.
    ///
    /// Replaces any negotiation still in flight. Resolves once the result has been reported,
    /// or with [`Outcome::Cancelled`] if this request is itself replaced or detached.
    pub async fn set_voltage(&self, target: Voltage) -> Outcome {
        info!("set voltage {:?}", target);

        if self.is_disabled() {
            info!("AFC disabled, ignoring request");
            return Outcome::Disabled;
        }

        let mut hardware = self.slot.claim().await;
        let ticket = hardware.ticket();
        match self.slot.run(ticket, self.negotiate(&mut hardware, target)).await {
            Some(outcome) => outcome,
            None => {
                info!("negotiation for {:?} cancelled", target);
                Outcome::Cancelled
            }
        }
    }

    /// Charger unplugged: stop any negotiation and forget the attach.
    ///
    /// Runs to completion even when a newer request was made meanwhile, which then starts
    /// from a fresh attach.
    pub async fn detach(&self) {
        info!("detach");

        let mut hardware = self.slot.claim().await;
        hardware.switch_off();
        hardware.session.finish();
        self.attached.store(false, Ordering::Relaxed);
    }

    /// Leave high voltage charging: stop any negotiation but keep the attach, so the next
    /// request checks the bus before talking to the charger again
    pub async fn detach_hv_charge(&self) {
        info!("detach high voltage charging");

        let mut hardware = self.slot.claim().await;
        hardware.switch_off();
        hardware.session.finish();
    }

    /// Return a desynchronised charger to idle with a long high pulse
    pub async fn reset_line(&self) -> afc::Result<()> {
        let mut hardware = self.slot.claim().await;
        hardware.bitbang.reset()
    }

    /// Snapshot of the last negotiation's bookkeeping, waits for a running one to finish
    pub async fn session(&self) -> Session {
        self.slot.lock().await.session
    }

    async fn negotiate(
        &self,
        hardware: &mut Hardware<LINE, DELAY, SWITCH, SLEEP>,
        target: Voltage,
    ) -> Outcome {
        if self.attached.load(Ordering::Relaxed) {
            let vbus = self.bus_voltage();
            if target.accepts(vbus) {
                info!("bus already at {} mV, duplicate request", vbus);
                return Outcome::Duplicate;
            }
        } else {
            hardware
                .sleep
                .delay_ms(self.config.first_attach_delay.ticks())
                .await;
        }

        let mut armed = match Armed::new(hardware) {
            Ok(armed) => armed,
            Err(e) => {
                error!("{}", e);
                self.report(Classification::Fail);
                return Outcome::Reported(Classification::Fail);
            }
        };
        self.attached.store(true, Ordering::Relaxed);
        armed.session.start(target);

        let classification = match self.attempt(&mut armed, target).await {
            Ok(()) => self.settle(&mut armed, target).await,
            Err(Abort::Exhausted) => {
                warn!("retry count is over");
                self.settle(&mut armed, target).await
            }
            Err(Abort::PresenceLost) => Classification::Fail,
        };

        armed.session.finish();
        self.report(classification);
        drop(armed);

        Outcome::Reported(classification)
    }

    /// Run handshakes until enough consecutive ones succeed
    async fn attempt(
        &self,
        hardware: &mut Hardware<LINE, DELAY, SWITCH, SLEEP>,
        target: Voltage,
    ) -> core::result::Result<(), Abort> {
        let config = &self.config;

        while hardware.session.successes < config.handshake_rounds {
            if hardware.session.retries >= config.retry_max {
                return Err(Abort::Exhausted);
            }

            let result = handshake::run(&mut hardware.bitbang, target);
            hardware
                .sleep
                .delay_ms(config.post_handshake_delay.ticks())
                .await;

            match result {
                Ok(()) => hardware.session.record_success(),
                Err(e) => {
                    let vbus = self.bus_voltage();
                    if !config.is_present(vbus) {
                        info!("no vbus after {:?}", e);
                        return Err(Abort::PresenceLost);
                    }

                    hardware.session.record_failure(e);
                    warn!(
                        "handshake failed: {:?} (code {}), retry {}",
                        e,
                        e.code(),
                        hardware.session.retries
                    );
                    hardware
                        .sleep
                        .delay_ms(config.retry_backoff.ticks())
                        .await;
                }
            }
        }

        Ok(())
    }

    /// Poll the bus until it reaches the requested band, then classify the last sample
    async fn settle(
        &self,
        hardware: &mut Hardware<LINE, DELAY, SWITCH, SLEEP>,
        target: Voltage,
    ) -> Classification {
        let mut vbus = 0;

        for sample in 0..=self.config.settle_retry_max {
            vbus = self.bus_voltage();
            debug!("settling: {} mV, sample {}", vbus, sample);

            if !self.config.is_present(vbus) {
                info!("no vbus while settling");
                return Classification::Fail;
            }

            if target.accepts(vbus) || sample == self.config.settle_retry_max {
                break;
            }

            hardware
                .sleep
                .delay_ms(self.config.settle_interval.ticks())
                .await;
        }

        Classification::measure(target, vbus)
    }

    fn bus_voltage(&self) -> u32 {
        match self.reporter.read_bus_voltage() {
            Ok(millivolts) => millivolts,
            Err(_) => {
                warn!("failed to read bus voltage");
                0
            }
        }
    }

    fn report(&self, classification: Classification) {
        info!("AFC result: {:?}", classification);
        self.reporter.report_negotiation_result(classification);
        self.reporter
            .set_fast_charge(classification.is_fast_charge());
    }
}
