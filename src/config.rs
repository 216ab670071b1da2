// Depth of the readings queue. Must be a power of two, one slot always stays
// empty so at most READING_QUEUE_SIZE - 1 readings are buffered.
pub const READING_QUEUE_SIZE: usize = 8;

// The HY3131 probably doesn't need this long to come up after the rails are
// switched on, but it's cheap at startup.
pub const DEFAULT_POWER_SETTLE_MS: u32 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AcquisitionConfig {
    /// Time to wait after enabling both supplies before talking to the chip.
    pub power_settle_ms: u32,
}

impl AcquisitionConfig {
    pub const DEFAULT: AcquisitionConfig = AcquisitionConfig {
        power_settle_ms: DEFAULT_POWER_SETTLE_MS,
    };

    pub const fn with_power_settle_ms(self, power_settle_ms: u32) -> Self {
        AcquisitionConfig { power_settle_ms }
    }
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
