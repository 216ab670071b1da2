use crate::power::Rail;

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// The register transport to the chip failed.
    Chip(E),
    /// A supply enable line could not be driven.
    Power(Rail),
    /// The operation needs an active mode, call `init` first.
    NotInitialized,
    /// `init` was called on an engine that is already running.
    AlreadyInitialized,
}

impl<E> Error<E> {
    pub fn is_chip_error(&self) -> bool {
        matches!(self, Error::Chip(_))
    }
}
