use embedded_hal::digital::OutputPin;

/// The two supplies feeding the measurement front-end.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rail {
    Digital,
    Analog,
}

pub trait PowerControl {
    fn enable(&mut self, rail: Rail) -> Result<(), Rail>;
    fn disable(&mut self, rail: Rail) -> Result<(), Rail>;
}

/// Supply enables wired straight to two GPIOs, active high.
pub struct PowerRails<D, A> {
    digital: D,
    analog: A,
}

impl<D: OutputPin, A: OutputPin> PowerRails<D, A> {
    pub fn new(digital: D, analog: A) -> Self {
        PowerRails { digital, analog }
    }

    pub fn release(self) -> (D, A) {
        (self.digital, self.analog)
    }
}

impl<D: OutputPin, A: OutputPin> PowerControl for PowerRails<D, A> {
    fn enable(&mut self, rail: Rail) -> Result<(), Rail> {
        let res = match rail {
            Rail::Digital => self.digital.set_high().is_ok(),
            Rail::Analog => self.analog.set_high().is_ok(),
        };
        if res { Ok(()) } else { Err(rail) }
    }

    fn disable(&mut self, rail: Rail) -> Result<(), Rail> {
        let res = match rail {
            Rail::Digital => self.digital.set_low().is_ok(),
            Rail::Analog => self.analog.set_low().is_ok(),
        };
        if res { Ok(()) } else { Err(rail) }
    }
}
