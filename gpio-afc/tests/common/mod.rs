#![allow(dead_code)]

use {
    afc::{line::DataLine, Classification},
    core::convert::Infallible,
    embassy_sync::blocking_mutex::raw::NoopRawMutex,
    embedded_hal::digital::{ErrorType, OutputPin, PinState},
    embedded_hal_mock::eh1::delay::NoopDelay,
    gpio_afc::{config::Config, reporter::Reporter, Afc},
    std::{
        cell::{Cell, RefCell},
        collections::VecDeque,
        rc::Rc,
    },
};

/// What the charger does in one listen window
#[derive(Clone, Copy, Debug)]
pub enum Window {
    /// High after `delay` UI for `width` UI
    Pulse { delay: u32, width: u32 },
    Silent,
}

pub const GOOD: Window = Window::Pulse { delay: 1, width: 16 };

#[derive(Default)]
struct ChargerState {
    script: VecDeque<Window>,
    current: Option<Window>,
    index: u32,
    drives: usize,
    windows: usize,
}

/// Data line with a scripted charger behind it, valid responses once the script runs out
#[derive(Clone, Default)]
pub struct Charger(Rc<RefCell<ChargerState>>);

impl Charger {
    pub fn scripted(windows: &[Window]) -> Self {
        let charger = Self::default();
        charger.0.borrow_mut().script = windows.iter().copied().collect();
        charger
    }

    /// Number of times the line was driven
    pub fn drives(&self) -> usize {
        self.0.borrow().drives
    }

    /// Number of response windows opened
    pub fn windows(&self) -> usize {
        self.0.borrow().windows
    }
}

impl DataLine for Charger {
    type Error = Infallible;

    fn drive(&mut self, _state: PinState) -> Result<(), Infallible> {
        self.0.borrow_mut().drives += 1;
        Ok(())
    }

    fn release(&mut self) -> Result<(), Infallible> {
        let mut state = self.0.borrow_mut();
        state.windows += 1;
        state.index = 0;
        state.current = Some(state.script.pop_front().unwrap_or(GOOD));
        Ok(())
    }

    fn is_high(&mut self) -> Result<bool, Infallible> {
        let mut state = self.0.borrow_mut();
        let high = match state.current {
            Some(Window::Pulse { delay, width }) => {
                state.index >= delay && state.index < delay + width
            }
            _ => false,
        };
        state.index += 1;
        Ok(high)
    }
}

/// Switch line recording every level it was set to
#[derive(Clone, Default)]
pub struct Switch(Rc<RefCell<Vec<bool>>>);

impl Switch {
    pub fn is_on(&self) -> bool {
        self.0.borrow().last().copied().unwrap_or(false)
    }

    pub fn history(&self) -> Vec<bool> {
        self.0.borrow().clone()
    }
}

impl ErrorType for Switch {
    type Error = Infallible;
}

impl OutputPin for Switch {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.0.borrow_mut().push(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.0.borrow_mut().push(true);
        Ok(())
    }
}

/// Async delay that yields once per call and records what was asked for
#[derive(Clone, Default)]
pub struct Sleeper(Rc<RefCell<Vec<u32>>>);

impl Sleeper {
    pub fn millis(&self) -> Vec<u32> {
        self.0.borrow().clone()
    }
}

impl embedded_hal_async::delay::DelayNs for Sleeper {
    async fn delay_ns(&mut self, _ns: u32) {
        embassy_futures::yield_now().await;
    }

    async fn delay_us(&mut self, _us: u32) {
        embassy_futures::yield_now().await;
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.0.borrow_mut().push(ms);
        embassy_futures::yield_now().await;
    }
}

/// Power supply: bus voltage from a script (last value repeats), results recorded
#[derive(Default)]
pub struct Supply {
    voltages: RefCell<VecDeque<u32>>,
    last: Cell<u32>,
    pub reads: Cell<usize>,
    pub reports: RefCell<Vec<Classification>>,
    pub fast_charge: RefCell<Vec<bool>>,
    pub enable_flags: RefCell<Vec<bool>>,
    /// Switch state seen by each report
    pub switch_at_report: RefCell<Vec<bool>>,
    switch: RefCell<Option<Switch>>,
}

impl Supply {
    pub fn new(voltages: &[u32]) -> Self {
        Self {
            voltages: RefCell::new(voltages.iter().copied().collect()),
            last: Cell::new(voltages.last().copied().unwrap_or(0)),
            ..Default::default()
        }
    }

    pub fn watch(&self, switch: &Switch) {
        *self.switch.borrow_mut() = Some(switch.clone());
    }

    pub fn set_voltage(&self, millivolts: u32) {
        self.voltages.borrow_mut().clear();
        self.last.set(millivolts);
    }

    pub fn reports(&self) -> Vec<Classification> {
        self.reports.borrow().clone()
    }
}

impl Reporter for Supply {
    type Error = ();

    fn read_bus_voltage(&self) -> Result<u32, ()> {
        self.reads.set(self.reads.get() + 1);
        Ok(self
            .voltages
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| self.last.get()))
    }

    fn report_negotiation_result(&self, classification: Classification) {
        self.reports.borrow_mut().push(classification);
        if let Some(switch) = self.switch.borrow().as_ref() {
            self.switch_at_report.borrow_mut().push(switch.is_on());
        }
    }

    fn set_fast_charge(&self, enabled: bool) {
        self.fast_charge.borrow_mut().push(enabled);
    }

    fn set_enable_flag(&self, enabled: bool) {
        self.enable_flags.borrow_mut().push(enabled);
    }
}

pub type TestAfc<'a> = Afc<NoopRawMutex, Charger, NoopDelay, Switch, Sleeper, &'a Supply>;

pub struct Bench<'a> {
    pub afc: TestAfc<'a>,
    pub charger: Charger,
    pub switch: Switch,
    pub sleeper: Sleeper,
}

pub fn bench<'a>(charger: Charger, supply: &'a Supply, config: Config) -> Bench<'a> {
    let switch = Switch::default();
    let sleeper = Sleeper::default();
    supply.watch(&switch);

    let afc = Afc::new(
        charger.clone(),
        NoopDelay::new(),
        switch.clone(),
        sleeper.clone(),
        supply,
        config,
    )
    .unwrap();

    Bench {
        afc,
        charger,
        switch,
        sleeper,
    }
}
