/*
 * Register level view of the HY3131 measurement front-end.
 *
 * The transport (SPI bit-banging, reset sequencing, ...) lives in the board
 * firmware and is handed to the engine through `ChipDriver`.
 */

use core::ops::{BitAnd, BitOr, Not};

#[allow(dead_code)]
pub mod regs {
    /// Interrupt flags. Reading this register clears the pending flags.
    pub const INTF: u8 = 0x00;
    /// Interrupt enables.
    pub const INTE: u8 = 0x01;
    pub const AD1_DATA: u8 = 0x02;
    pub const AD2_DATA: u8 = 0x05;
    pub const LPF_DATA: u8 = 0x08;

    pub const INT_AD1: u8 = 0x01;
    pub const INT_AD2: u8 = 0x02;
    pub const INT_LPF: u8 = 0x04;
}

/// Byte oriented register access to the chip.
pub trait ChipDriver {
    type Error;

    fn init(&mut self) -> Result<(), Self::Error>;
    fn deinit(&mut self) -> Result<(), Self::Error>;
    /// Read `buf.len()` consecutive registers starting at `addr`.
    fn read_regs(&mut self, addr: u8, buf: &mut [u8]) -> Result<(), Self::Error>;
    /// Write `data.len()` consecutive registers starting at `addr`.
    fn write_regs(&mut self, addr: u8, data: &[u8]) -> Result<(), Self::Error>;
}

impl<C: ChipDriver + ?Sized> ChipDriver for &mut C {
    type Error = C::Error;

    fn init(&mut self) -> Result<(), Self::Error> {
        (**self).init()
    }

    fn deinit(&mut self) -> Result<(), Self::Error> {
        (**self).deinit()
    }

    fn read_regs(&mut self, addr: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        (**self).read_regs(addr, buf)
    }

    fn write_regs(&mut self, addr: u8, data: &[u8]) -> Result<(), Self::Error> {
        (**self).write_regs(addr, data)
    }
}

/// Interrupt sources the acquisition job knows how to decode.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Source {
    Ad1,
    Ad2,
    Lpf,
}

impl Source {
    /// Order in which pending sources are delivered within one job run.
    pub const ALL: [Source; 3] = [Source::Ad1, Source::Ad2, Source::Lpf];

    pub const fn mask(self) -> InterruptMask {
        match self {
            Source::Ad1 => InterruptMask(regs::INT_AD1),
            Source::Ad2 => InterruptMask(regs::INT_AD2),
            Source::Lpf => InterruptMask(regs::INT_LPF),
        }
    }

    pub const fn data_register(self) -> u8 {
        match self {
            Source::Ad1 => regs::AD1_DATA,
            Source::Ad2 => regs::AD2_DATA,
            Source::Lpf => regs::LPF_DATA,
        }
    }
}

/// Set of chip interrupt sources, in the chip's INTE/INTF bit layout.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InterruptMask(u8);

impl InterruptMask {
    pub const NONE: InterruptMask = InterruptMask(0);
    pub const AD1: InterruptMask = Source::Ad1.mask();
    pub const AD2: InterruptMask = Source::Ad2.mask();
    pub const LPF: InterruptMask = Source::Lpf.mask();

    pub const fn from_bits(bits: u8) -> Self {
        InterruptMask(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, source: Source) -> bool {
        self.0 & source.mask().0 != 0
    }

    pub const fn with(self, source: Source) -> Self {
        InterruptMask(self.0 | source.mask().0)
    }

    pub const fn without(self, source: Source) -> Self {
        InterruptMask(self.0 & !source.mask().0)
    }
}

impl From<Source> for InterruptMask {
    fn from(source: Source) -> Self {
        source.mask()
    }
}

impl BitOr for InterruptMask {
    type Output = InterruptMask;

    fn bitor(self, rhs: Self) -> Self {
        InterruptMask(self.0 | rhs.0)
    }
}

impl BitAnd for InterruptMask {
    type Output = InterruptMask;

    fn bitand(self, rhs: Self) -> Self {
        InterruptMask(self.0 & rhs.0)
    }
}

impl Not for InterruptMask {
    type Output = InterruptMask;

    fn not(self) -> Self {
        InterruptMask(!self.0)
    }
}

/// Decode a 24 bit little endian two's complement sample.
pub const fn sign_extend_24(raw: [u8; 3]) -> i32 {
    let val = (raw[2] as i32) << 16 | (raw[1] as i32) << 8 | raw[0] as i32;
    // shift the sign bit up to bit 31 and back down arithmetically
    (val << 8) >> 8
}
