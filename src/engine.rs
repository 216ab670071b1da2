/*
 * The acquisition engine.
 *
 * Owns the active mode and the mirrored interrupt mask, and serializes every
 * change to them against the acquisition job by keeping that job disabled
 * for the duration of the change. The hardware IRQ only ever marks the job
 * runnable, so suspending the job is enough to keep it from observing a half
 * finished mode switch, while unrelated interrupts stay live.
 */

use embedded_hal::delay::DelayNs;

use crate::{
    chip::{regs, sign_extend_24, ChipDriver, InterruptMask, Source},
    config::AcquisitionConfig,
    error::Error,
    mode::{Event, ModeRegistry, Submode},
    power::{PowerControl, Rail},
    queue::{Reading, ReadingQueue},
    scheduler::{JobId, JobSuspend, Scheduler},
};

/// What a mode handler may touch while it handles an event.
pub struct Controls<'a, C, S> {
    chip: &'a mut C,
    int_mask: &'a mut InterruptMask,
    readings: &'a ReadingQueue,
    scheduler: &'a S,
}

impl<'a, C: ChipDriver, S: Scheduler> Controls<'a, C, S> {
    pub fn new(
        chip: &'a mut C,
        int_mask: &'a mut InterruptMask,
        readings: &'a ReadingQueue,
        scheduler: &'a S,
    ) -> Self {
        Controls {
            chip,
            int_mask,
            readings,
            scheduler,
        }
    }

    pub fn interrupt_mask(&self) -> InterruptMask {
        *self.int_mask
    }

    pub fn set_interrupt_mask(&mut self, mask: InterruptMask) -> Result<(), Error<C::Error>> {
        apply_interrupt_mask(self.chip, self.scheduler, self.int_mask, mask)
    }

    /// Queue a reading for the measurement job. Returns `false` if it was dropped.
    pub fn push_reading(&self, reading: Reading) -> bool {
        enqueue(self.readings, self.scheduler, reading)
    }

    pub fn clear_readings(&self) {
        self.readings.clear();
    }

    /// Raw register access, e.g. to configure the chip for a mode.
    pub fn chip(&mut self) -> &mut C {
        self.chip
    }
}

fn apply_interrupt_mask<C: ChipDriver, S: Scheduler>(
    chip: &mut C,
    scheduler: &S,
    int_mask: &mut InterruptMask,
    mask: InterruptMask,
) -> Result<(), Error<C::Error>> {
    let _suspend = JobSuspend::new(scheduler, JobId::Acquisition);

    // callers usually change the mask right after reconfiguring the chip,
    // flags latched before that must not reach the new mask
    if !mask.is_empty() {
        let mut stale = [0u8; 1];
        chip.read_regs(regs::INTF, &mut stale).map_err(Error::Chip)?;
    }

    chip.write_regs(regs::INTE, &[mask.bits()]).map_err(Error::Chip)?;
    *int_mask = mask;
    trace!("acquisition: interrupt mask 0x{:x}", mask.bits());
    Ok(())
}

fn enqueue<S: Scheduler>(readings: &ReadingQueue, scheduler: &S, reading: Reading) -> bool {
    if readings.push(reading) {
        scheduler.schedule(JobId::Measurement);
        true
    } else {
        trace!("acquisition: reading queue full, dropped reading");
        false
    }
}

pub struct Engine<'q, C, S, M, P, D>
where
    C: ChipDriver,
    S: Scheduler,
    M: ModeRegistry<C, S>,
{
    chip: C,
    scheduler: S,
    modes: M,
    power: P,
    delay: D,
    config: AcquisitionConfig,
    readings: &'q ReadingQueue,

    int_mask: InterruptMask,
    active: Option<M::Mode>,
}

impl<'q, C, S, M, P, D> Engine<'q, C, S, M, P, D>
where
    C: ChipDriver,
    S: Scheduler,
    M: ModeRegistry<C, S>,
    P: PowerControl,
    D: DelayNs,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        chip: C,
        scheduler: S,
        modes: M,
        power: P,
        delay: D,
        readings: &'q ReadingQueue,
        config: AcquisitionConfig,
    ) -> Self {
        Engine {
            chip,
            scheduler,
            modes,
            power,
            delay,
            config,
            readings,
            int_mask: InterruptMask::NONE,
            active: None,
        }
    }

    /// Power up the chip and park it in the baseline mode.
    ///
    /// On return the chip is initialized but has every interrupt masked. If
    /// any step fails the rails are switched off again and the engine stays
    /// stopped.
    pub fn init(&mut self) -> Result<(), Error<C::Error>> {
        if self.active.is_some() {
            return Err(Error::AlreadyInitialized);
        }

        if let Err(err) = self.bring_up() {
            self.active = None;
            if self.power_down().is_err() {
                warn!("acquisition: rails stuck while backing out of init");
            }
            return Err(err);
        }

        debug!("acquisition: engine up");
        Ok(())
    }

    fn bring_up(&mut self) -> Result<(), Error<C::Error>> {
        self.power.enable(Rail::Digital).map_err(Error::Power)?;
        self.power.enable(Rail::Analog).map_err(Error::Power)?;
        self.delay.delay_ms(self.config.power_settle_ms);

        self.int_mask = InterruptMask::NONE;
        self.chip.init().map_err(Error::Chip)?;

        // nothing to stop yet, so start the baseline handler by hand
        let baseline = M::BASELINE;
        self.active = Some(baseline);
        let mut ctl =
            Controls::new(&mut self.chip, &mut self.int_mask, self.readings, &self.scheduler);
        let started = self
            .modes
            .handler(baseline)
            .handle(Event::Start(M::BASELINE_SUBMODE), &mut ctl);

        if started.is_err() && self.chip.deinit().is_err() {
            warn!("acquisition: chip deinit failed while backing out of init");
        }
        started
    }

    // reverse order of init, both rails are attempted even if one fails
    fn power_down(&mut self) -> Result<(), Error<C::Error>> {
        let analog = self.power.disable(Rail::Analog);
        let digital = self.power.disable(Rail::Digital);
        analog.and(digital).map_err(Error::Power)
    }

    /// Stop the active mode and power the chip down.
    ///
    /// Calling this on an engine that isn't running does nothing. Once the
    /// baseline mode is back in place the rails are switched off even if the
    /// chip refuses to deinit, and the engine counts as stopped.
    pub fn deinit(&mut self) -> Result<(), Error<C::Error>> {
        if self.active.is_none() {
            warn!("acquisition: deinit on stopped engine ignored");
            return Ok(());
        }

        self.set_mode(M::BASELINE, M::BASELINE_SUBMODE)?;
        let chip = self.chip.deinit().map_err(Error::Chip);
        let power = self.power_down();
        self.active = None;

        debug!("acquisition: engine down");
        chip.and(power)
    }

    /// Stop the active handler and start the one registered for `mode`.
    ///
    /// Readings left behind by the old mode are dropped before the new one
    /// starts. If the old handler fails to stop it stays active. If the new handler
    /// fails to start it is active regardless and the error is returned.
    pub fn set_mode(&mut self, mode: M::Mode, submode: Submode) -> Result<(), Error<C::Error>> {
        let current = self.active.ok_or(Error::NotInitialized)?;

        let _suspend = JobSuspend::new(&self.scheduler, JobId::Acquisition);
        let mut ctl =
            Controls::new(&mut self.chip, &mut self.int_mask, self.readings, &self.scheduler);

        self.modes.handler(current).handle(Event::Stop, &mut ctl)?;
        ctl.clear_readings();
        self.active = Some(mode);
        debug!("acquisition: switching mode, submode {}", submode);
        self.modes.handler(mode).handle(Event::Start(submode), &mut ctl)?;
        Ok(())
    }

    pub fn set_submode(&mut self, submode: Submode) -> Result<(), Error<C::Error>> {
        let current = self.active.ok_or(Error::NotInitialized)?;

        let _suspend = JobSuspend::new(&self.scheduler, JobId::Acquisition);
        let mut ctl =
            Controls::new(&mut self.chip, &mut self.int_mask, self.readings, &self.scheduler);
        self.modes.handler(current).handle(Event::SetSubmode(submode), &mut ctl)?;
        Ok(())
    }

    pub fn set_interrupt_mask(&mut self, mask: InterruptMask) -> Result<(), Error<C::Error>> {
        if self.active.is_none() {
            return Err(Error::NotInitialized);
        }
        apply_interrupt_mask(&mut self.chip, &self.scheduler, &mut self.int_mask, mask)
    }

    /// Body of the acquisition job, run by the scheduler after the chip IRQ.
    ///
    /// Every source that is both pending on the chip and enabled in the mask
    /// is decoded and handed to the active mode, in `Source::ALL` order.
    /// Returns how many samples were delivered.
    pub fn run_acquisition_job(&mut self) -> Result<usize, Error<C::Error>> {
        let mode = self.active.ok_or(Error::NotInitialized)?;

        // reading INTF also clears the pending flags on the chip
        let mut flags = [0u8; 1];
        self.chip.read_regs(regs::INTF, &mut flags).map_err(Error::Chip)?;
        let pending = InterruptMask::from_bits(flags[0]) & self.int_mask;

        let mut delivered = 0;
        for source in Source::ALL {
            // the handler may have narrowed the mask while handling an earlier source
            if !pending.contains(source) || !self.int_mask.contains(source) {
                continue;
            }

            let mut raw = [0u8; 3];
            self.chip
                .read_regs(source.data_register(), &mut raw)
                .map_err(Error::Chip)?;
            let value = sign_extend_24(raw);

            let mut ctl =
            Controls::new(&mut self.chip, &mut self.int_mask, self.readings, &self.scheduler);
            self.modes
                .handler(mode)
                .handle(Event::NewData { source, value }, &mut ctl)?;
            delivered += 1;
        }

        Ok(delivered)
    }

    pub fn push_reading(&self, reading: Reading) -> bool {
        enqueue(self.readings, &self.scheduler, reading)
    }

    pub fn pop_reading(&self) -> Option<Reading> {
        self.readings.pop()
    }

    pub fn clear_readings(&self) {
        self.readings.clear();
    }

    pub fn is_initialized(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_mode(&self) -> Option<M::Mode> {
        self.active
    }

    pub fn interrupt_mask(&self) -> InterruptMask {
        self.int_mask
    }

    pub fn config(&self) -> AcquisitionConfig {
        self.config
    }

    pub fn readings(&self) -> &'q ReadingQueue {
        self.readings
    }

    pub fn chip(&self) -> &C {
        &self.chip
    }

    pub fn chip_mut(&mut self) -> &mut C {
        &mut self.chip
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn modes(&self) -> &M {
        &self.modes
    }

    pub fn modes_mut(&mut self) -> &mut M {
        &mut self.modes
    }

    pub fn power(&self) -> &P {
        &self.power
    }

    pub fn delay(&self) -> &D {
        &self.delay
    }
}
