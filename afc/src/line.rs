//! Data line access
//!
//! The AFC data line is shared with the charger: we drive it to send, then release it and
//! let the charger drive it to answer.

use embedded_hal::digital::{InputPin, OutputPin, PinState};

/// Bidirectional data line
pub trait DataLine {
    type Error;

    /// Switch the line to output and drive `state`
    fn drive(&mut self, state: PinState) -> Result<(), Self::Error>;

    /// Switch the line to input, handing it to the charger
    fn release(&mut self) -> Result<(), Self::Error>;

    /// Read the line level, only meaningful after [`DataLine::release`]
    fn is_high(&mut self) -> Result<bool, Self::Error>;
}

/// Open-drain pin with an external pull-down
///
/// Releasing the line leaves the output transistor off, so the level read back is whatever
/// the charger drives.
pub struct OpenDrain<P> {
    pin: P,
}

impl<P: InputPin + OutputPin> OpenDrain<P> {
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    pub fn free(self) -> P {
        self.pin
    }
}

impl<P: InputPin + OutputPin> DataLine for OpenDrain<P> {
    type Error = P::Error;

    fn drive(&mut self, state: PinState) -> Result<(), Self::Error> {
        self.pin.set_state(state)
    }

    fn release(&mut self) -> Result<(), Self::Error> {
        self.pin.set_high()
    }

    fn is_high(&mut self) -> Result<bool, Self::Error> {
        InputPin::is_high(&mut self.pin)
    }
}
