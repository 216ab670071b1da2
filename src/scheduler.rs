/// Jobs of the surrounding cooperative scheduler that the engine drives.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum JobId {
    /// Runs `Engine::run_acquisition_job`, made runnable by the chip IRQ.
    Acquisition,
    /// Consumes readings, scheduled whenever one is queued.
    Measurement,
}

/// Cooperative job control provided by the firmware.
///
/// `disable` and `resume` must nest: `resume(job, was_enabled)` puts the job
/// back into exactly the state `disable` found it in.
pub trait Scheduler {
    /// Stop `job` from running. Returns whether it was enabled before.
    fn disable(&self, job: JobId) -> bool;
    fn resume(&self, job: JobId, was_enabled: bool);
    /// Mark `job` runnable.
    fn schedule(&self, job: JobId);
}

impl<S: Scheduler + ?Sized> Scheduler for &S {
    fn disable(&self, job: JobId) -> bool {
        (**self).disable(job)
    }

    fn resume(&self, job: JobId, was_enabled: bool) {
        (**self).resume(job, was_enabled)
    }

    fn schedule(&self, job: JobId) {
        (**self).schedule(job)
    }
}

/// Keeps a job disabled while alive and restores its previous state on drop.
pub struct JobSuspend<'a, S: Scheduler + ?Sized> {
    scheduler: &'a S,
    job: JobId,
    was_enabled: bool,
}

impl<'a, S: Scheduler + ?Sized> JobSuspend<'a, S> {
    pub fn new(scheduler: &'a S, job: JobId) -> Self {
        let was_enabled = scheduler.disable(job);
        JobSuspend {
            scheduler,
            job,
            was_enabled,
        }
    }

    pub fn was_enabled(&self) -> bool {
        self.was_enabled
    }
}

impl<S: Scheduler + ?Sized> Drop for JobSuspend<'_, S> {
    fn drop(&mut self) {
        self.scheduler.resume(self.job, self.was_enabled);
    }
}
