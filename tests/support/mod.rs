#![allow(dead_code)]

use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

use embedded_hal::delay::DelayNs;
use mph_acquisition::{
    chip::regs, AcquisitionConfig, ChipDriver, Controls, Engine, Event, InterruptMask, JobId,
    MiscMode, ModeHandler, ModeRegistry, PowerControl, Rail, Reading, ReadingQueue, Scheduler,
    Submode,
};

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct ChipFault;

/// Register file standing in for the HY3131.
pub struct MockChip {
    regs: [u8; 32],
    pub initialized: bool,
    pub init_calls: u32,
    pub deinit_calls: u32,
    pub writes: Vec<(u8, Vec<u8>)>,
    pub reads: Vec<u8>,
    pub fail_reads: bool,
    pub fail_writes: bool,
    pub fail_init: bool,
    pub fail_deinit: bool,
}

impl MockChip {
    pub fn new() -> Self {
        MockChip {
            regs: [0; 32],
            initialized: false,
            init_calls: 0,
            deinit_calls: 0,
            writes: Vec::new(),
            reads: Vec::new(),
            fail_reads: false,
            fail_writes: false,
            fail_init: false,
            fail_deinit: false,
        }
    }

    /// Latch interrupt flags as the chip would on conversion complete.
    pub fn raise(&mut self, flags: u8) {
        self.regs[regs::INTF as usize] |= flags;
    }

    pub fn load(&mut self, addr: u8, data: &[u8]) {
        let start = addr as usize;
        self.regs[start..start + data.len()].copy_from_slice(data);
    }

    pub fn reg(&self, addr: u8) -> u8 {
        self.regs[addr as usize]
    }

    pub fn pending(&self) -> u8 {
        self.regs[regs::INTF as usize]
    }
}

impl ChipDriver for MockChip {
    type Error = ChipFault;

    fn init(&mut self) -> Result<(), ChipFault> {
        self.init_calls += 1;
        if self.fail_init {
            return Err(ChipFault);
        }
        self.initialized = true;
        Ok(())
    }

    fn deinit(&mut self) -> Result<(), ChipFault> {
        self.deinit_calls += 1;
        if self.fail_deinit {
            return Err(ChipFault);
        }
        self.initialized = false;
        Ok(())
    }

    fn read_regs(&mut self, addr: u8, buf: &mut [u8]) -> Result<(), ChipFault> {
        if self.fail_reads {
            return Err(ChipFault);
        }
        self.reads.push(addr);
        let start = addr as usize;
        buf.copy_from_slice(&self.regs[start..start + buf.len()]);
        if addr == regs::INTF {
            self.regs[regs::INTF as usize] = 0;
        }
        Ok(())
    }

    fn write_regs(&mut self, addr: u8, data: &[u8]) -> Result<(), ChipFault> {
        if self.fail_writes {
            return Err(ChipFault);
        }
        self.writes.push((addr, data.to_vec()));
        let start = addr as usize;
        self.regs[start..start + data.len()].copy_from_slice(data);
        Ok(())
    }
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum SchedCall {
    Disable(JobId),
    Resume(JobId, bool),
    Schedule(JobId),
}

pub struct SchedState {
    pub acquisition_enabled: Cell<bool>,
    pub measurement_runs: Cell<u32>,
    pub calls: RefCell<Vec<SchedCall>>,
}

#[derive(Clone)]
pub struct MockScheduler(pub Rc<SchedState>);

impl MockScheduler {
    pub fn new() -> Self {
        MockScheduler(Rc::new(SchedState {
            acquisition_enabled: Cell::new(true),
            measurement_runs: Cell::new(0),
            calls: RefCell::new(Vec::new()),
        }))
    }

    pub fn acquisition_enabled(&self) -> bool {
        self.0.acquisition_enabled.get()
    }

    pub fn measurement_runs(&self) -> u32 {
        self.0.measurement_runs.get()
    }

    pub fn calls(&self) -> Vec<SchedCall> {
        self.0.calls.borrow().clone()
    }
}

impl Scheduler for MockScheduler {
    fn disable(&self, job: JobId) -> bool {
        self.0.calls.borrow_mut().push(SchedCall::Disable(job));
        match job {
            JobId::Acquisition => self.0.acquisition_enabled.replace(false),
            JobId::Measurement => true,
        }
    }

    fn resume(&self, job: JobId, was_enabled: bool) {
        self.0.calls.borrow_mut().push(SchedCall::Resume(job, was_enabled));
        if job == JobId::Acquisition && was_enabled {
            self.0.acquisition_enabled.set(true);
        }
    }

    fn schedule(&self, job: JobId) {
        self.0.calls.borrow_mut().push(SchedCall::Schedule(job));
        if job == JobId::Measurement {
            self.0.measurement_runs.set(self.0.measurement_runs.get() + 1);
        }
    }
}

#[derive(Default)]
pub struct MockPower {
    pub ops: Vec<(Rail, bool)>,
    pub digital: bool,
    pub analog: bool,
}

impl PowerControl for MockPower {
    fn enable(&mut self, rail: Rail) -> Result<(), Rail> {
        self.ops.push((rail, true));
        match rail {
            Rail::Digital => self.digital = true,
            Rail::Analog => self.analog = true,
        }
        Ok(())
    }

    fn disable(&mut self, rail: Rail) -> Result<(), Rail> {
        self.ops.push((rail, false));
        match rail {
            Rail::Digital => self.digital = false,
            Rail::Analog => self.analog = false,
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MockDelay {
    pub total_ns: u64,
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
    }
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum TestMode {
    Misc,
    Measure,
    Alt,
}

/// One delivered event: who got it, what it was, and whether the
/// acquisition job was runnable at the time.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Delivery {
    pub mode: TestMode,
    pub event: Event,
    pub job_enabled: bool,
}

pub type EventLog = Rc<RefCell<Vec<Delivery>>>;

/// Queues every sample it is given as a reading.
#[derive(Default)]
pub struct Measure {
    pub submode: Submode,
    /// Applied as the new interrupt mask after the first sample.
    pub narrow_to: Option<InterruptMask>,
}

impl ModeHandler<MockChip, MockScheduler> for Measure {
    fn handle(
        &mut self,
        event: Event,
        ctl: &mut Controls<'_, MockChip, MockScheduler>,
    ) -> Result<(), mph_acquisition::Error<ChipFault>> {
        match event {
            Event::Start(submode) | Event::SetSubmode(submode) => self.submode = submode,
            Event::Stop => {}
            Event::NewData { value, .. } => {
                ctl.push_reading(Reading::new(i64::from(value), self.submode));
                if let Some(mask) = self.narrow_to.take() {
                    ctl.set_interrupt_mask(mask)?;
                }
            }
        }
        Ok(())
    }
}

pub struct Logged<H> {
    mode: TestMode,
    log: EventLog,
    sched: Rc<SchedState>,
    pub inner: H,
}

impl<H: ModeHandler<MockChip, MockScheduler>> ModeHandler<MockChip, MockScheduler> for Logged<H> {
    fn handle(
        &mut self,
        event: Event,
        ctl: &mut Controls<'_, MockChip, MockScheduler>,
    ) -> Result<(), mph_acquisition::Error<ChipFault>> {
        self.log.borrow_mut().push(Delivery {
            mode: self.mode,
            event,
            job_enabled: self.sched.acquisition_enabled.get(),
        });
        self.inner.handle(event, ctl)
    }
}

pub struct TestModes {
    pub misc: Logged<MiscMode>,
    pub measure: Logged<Measure>,
    pub alt: Logged<Measure>,
}

impl TestModes {
    pub fn new(log: &EventLog, sched: &MockScheduler) -> Self {
        TestModes {
            misc: logged(TestMode::Misc, log, sched, MiscMode),
            measure: logged(TestMode::Measure, log, sched, Measure::default()),
            alt: logged(TestMode::Alt, log, sched, Measure::default()),
        }
    }
}

fn logged<H>(mode: TestMode, log: &EventLog, sched: &MockScheduler, inner: H) -> Logged<H> {
    Logged {
        mode,
        log: log.clone(),
        sched: sched.0.clone(),
        inner,
    }
}

impl ModeRegistry<MockChip, MockScheduler> for TestModes {
    type Mode = TestMode;

    const BASELINE: TestMode = TestMode::Misc;
    const BASELINE_SUBMODE: Submode = 0;

    fn handler(&mut self, mode: TestMode) -> &mut dyn ModeHandler<MockChip, MockScheduler> {
        match mode {
            TestMode::Misc => &mut self.misc,
            TestMode::Measure => &mut self.measure,
            TestMode::Alt => &mut self.alt,
        }
    }
}

pub type TestEngine<'q> = Engine<'q, MockChip, MockScheduler, TestModes, MockPower, MockDelay>;

pub struct Rig {
    pub log: EventLog,
    pub sched: MockScheduler,
}

impl Rig {
    pub fn new() -> Self {
        Rig {
            log: Rc::new(RefCell::new(Vec::new())),
            sched: MockScheduler::new(),
        }
    }

    pub fn engine<'q>(&self, readings: &'q ReadingQueue) -> TestEngine<'q> {
        self.engine_with(readings, AcquisitionConfig::DEFAULT)
    }

    pub fn engine_with<'q>(
        &self,
        readings: &'q ReadingQueue,
        config: AcquisitionConfig,
    ) -> TestEngine<'q> {
        Engine::new(
            MockChip::new(),
            self.sched.clone(),
            TestModes::new(&self.log, &self.sched),
            MockPower::default(),
            MockDelay::default(),
            readings,
            config,
        )
    }

    pub fn deliveries(&self) -> Vec<Delivery> {
        self.log.borrow().clone()
    }

    pub fn clear_log(&self) {
        self.log.borrow_mut().clear();
    }
}
