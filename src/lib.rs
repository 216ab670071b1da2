//! Acquisition engine for the HY3131 multimeter front-end.
//!
//! The chip raises an interrupt whenever a conversion finishes. The IRQ only
//! marks the acquisition job runnable; the job then calls
//! [`Engine::run_acquisition_job`], which decodes the pending samples and
//! hands them to the active mode. Modes turn samples into [`Reading`]s and
//! park them in a [`ReadingQueue`] until the measurement job drains it.
//!
//! Mode and mask changes keep the acquisition job disabled while they run,
//! the readings queue protects itself with short critical sections.

#![cfg_attr(not(test), no_std)]

#[macro_use]
pub(crate) mod fmt;

pub mod chip;
pub mod config;
pub mod engine;
pub mod error;
pub mod mode;
pub mod power;
pub mod queue;
pub mod scheduler;

pub use chip::{ChipDriver, InterruptMask, Source};
pub use config::AcquisitionConfig;
pub use engine::{Controls, Engine};
pub use error::Error;
pub use mode::{
    BaselineMode, BaselineModes, Event, EventKind, MiscMode, ModeHandler, ModeRegistry, Submode,
};
pub use power::{PowerControl, PowerRails, Rail};
pub use queue::{Reading, ReadingQueue};
pub use scheduler::{JobId, JobSuspend, Scheduler};
