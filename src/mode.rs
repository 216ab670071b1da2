use core::fmt::Debug;

use crate::{
    chip::{ChipDriver, InterruptMask, Source},
    engine::Controls,
    error::Error,
    scheduler::Scheduler,
};

/// Refinement within a mode, e.g. a measurement range.
pub type Submode = u8;

pub const MISC_SUBMODE_OFF: Submode = 0;

/// What a mode handler gets told.
///
/// A handler sees `Start` before anything else, and `Stop` before the next
/// handler gets its `Start`.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    Start(Submode),
    Stop,
    SetSubmode(Submode),
    /// A sample was decoded from `source`.
    NewData { source: Source, value: i32 },
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EventKind {
    Start,
    Stop,
    SetSubmode,
    NewData,
}

impl Event {
    pub const fn kind(&self) -> EventKind {
        match self {
            Event::Start(_) => EventKind::Start,
            Event::Stop => EventKind::Stop,
            Event::SetSubmode(_) => EventKind::SetSubmode,
            Event::NewData { .. } => EventKind::NewData,
        }
    }

    /// The event payload widened to 64 bits, 0 for `Stop`.
    pub const fn value(&self) -> i64 {
        match *self {
            Event::Start(submode) | Event::SetSubmode(submode) => submode as i64,
            Event::Stop => 0,
            Event::NewData { value, .. } => value as i64,
        }
    }
}

pub trait ModeHandler<C: ChipDriver, S: Scheduler> {
    fn handle(&mut self, event: Event, ctl: &mut Controls<'_, C, S>) -> Result<(), Error<C::Error>>;
}

/// The closed set of modes known to the firmware and the handler behind each.
pub trait ModeRegistry<C: ChipDriver, S: Scheduler> {
    type Mode: Copy + PartialEq + Debug;

    /// Quiescent mode used on init and deinit.
    const BASELINE: Self::Mode;
    const BASELINE_SUBMODE: Submode;

    fn handler(&mut self, mode: Self::Mode) -> &mut dyn ModeHandler<C, S>;
}

/// The "off" handler. Whatever it is told, it masks every chip interrupt and
/// drops buffered readings, so it never produces anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct MiscMode;

impl<C: ChipDriver, S: Scheduler> ModeHandler<C, S> for MiscMode {
    fn handle(
        &mut self,
        _event: Event,
        ctl: &mut Controls<'_, C, S>,
    ) -> Result<(), Error<C::Error>> {
        ctl.set_interrupt_mask(InterruptMask::NONE)?;
        ctl.clear_readings();
        Ok(())
    }
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BaselineMode {
    Misc,
}

/// Registry holding only the misc mode, for bring-up and hardware tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct BaselineModes {
    misc: MiscMode,
}

impl<C: ChipDriver, S: Scheduler> ModeRegistry<C, S> for BaselineModes {
    type Mode = BaselineMode;

    const BASELINE: BaselineMode = BaselineMode::Misc;
    const BASELINE_SUBMODE: Submode = MISC_SUBMODE_OFF;

    fn handler(&mut self, mode: BaselineMode) -> &mut dyn ModeHandler<C, S> {
        match mode {
            BaselineMode::Misc => &mut self.misc,
        }
    }
}
