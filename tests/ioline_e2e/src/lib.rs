// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Simulated machine for end-to-end runs of the interrupt layer against a real
//! mailbox pool. Device consumers may run on other threads.

#![forbid(unsafe_code)]

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use ioline::{Dispatch, InitError, InterruptDispatcher, IoSubsystem, IrqConfig, IrqContext, TimeSlice};
use ioline_hal::{Console, DeviceClass, DeviceError, DeviceRegisters, InterruptState, Machine, Psr};
use ioline_mbox::{MailboxPool, MboxId};
use parking_lot::Mutex;

/// Device registers, console, halt latch and PSR of the simulated CPU.
pub struct SimMachine {
    statuses: Mutex<HashMap<(DeviceClass, u32), VecDeque<Result<i32, DeviceError>>>>,
    console: Mutex<Vec<String>>,
    halted: Mutex<Option<i32>>,
    psr: Mutex<Psr>,
}

impl SimMachine {
    pub fn new() -> Self {
        Self {
            statuses: Mutex::new(HashMap::new()),
            console: Mutex::new(Vec::new()),
            halted: Mutex::new(None),
            psr: Mutex::new(Psr::CURRENT_MODE),
        }
    }

    /// Latches `status` as the next completion of `class`/`unit`.
    pub fn complete(&self, class: DeviceClass, unit: u32, status: i32) {
        self.statuses.lock().entry((class, unit)).or_default().push_back(Ok(status));
    }

    /// Makes the next status read of `class`/`unit` fail.
    pub fn fail(&self, class: DeviceClass, unit: u32) {
        self.statuses
            .lock()
            .entry((class, unit))
            .or_default()
            .push_back(Err(DeviceError::Fault { class, unit }));
    }

    pub fn console(&self) -> Vec<String> {
        self.console.lock().clone()
    }
}

impl Default for SimMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceRegisters for SimMachine {
    fn device_input(&self, class: DeviceClass, unit: u32) -> Result<i32, DeviceError> {
        if !class.has_unit(unit) {
            return Err(DeviceError::Invalid { class, unit });
        }
        self.statuses.lock().get_mut(&(class, unit)).and_then(VecDeque::pop_front).unwrap_or(Ok(0))
    }
}

impl Console for SimMachine {
    fn write_line(&self, args: fmt::Arguments<'_>) {
        self.console.lock().push(args.to_string());
    }
}

impl Machine for SimMachine {
    fn halt(&self, code: i32) {
        self.halted.lock().get_or_insert(code);
    }

    fn halted(&self) -> Option<i32> {
        *self.halted.lock()
    }
}

impl InterruptState for SimMachine {
    fn psr(&self) -> Psr {
        *self.psr.lock()
    }

    fn set_psr(&self, psr: Psr) {
        *self.psr.lock() = psr;
    }
}

/// Counts scheduler slice checks.
#[derive(Default)]
pub struct SliceCounter(AtomicUsize);

impl SliceCounter {
    pub fn calls(&self) -> usize {
        self.0.load(Ordering::Acquire)
    }
}

impl TimeSlice for SliceCounter {
    fn time_slice_check(&self) {
        self.0.fetch_add(1, Ordering::AcqRel);
    }
}

/// Booted machine: pool, I/O subsystem and the dispatcher on the "CPU".
pub struct Sim {
    pub machine: Arc<SimMachine>,
    pub pool: Arc<MailboxPool>,
    pub io: Arc<IoSubsystem>,
    pub scheduler: SliceCounter,
    pub dispatcher: InterruptDispatcher,
}

impl Sim {
    pub fn boot(config: IrqConfig) -> Result<Self, InitError> {
        let pool = Arc::new(MailboxPool::default());
        let io = Arc::new(IoSubsystem::init(pool.as_ref(), config)?);
        Ok(Self {
            machine: Arc::new(SimMachine::new()),
            pool,
            dispatcher: InterruptDispatcher::new(Arc::clone(&io)),
            io,
            scheduler: SliceCounter::default(),
        })
    }

    /// Raises an interrupt on `class` reporting its own identity.
    pub fn raise(&mut self, class: DeviceClass, arg: usize) -> Dispatch {
        self.raise_as(class, class.id(), arg)
    }

    pub fn raise_as(&mut self, line: DeviceClass, class_id: u32, arg: usize) -> Dispatch {
        let ctx = IrqContext {
            platform: self.machine.as_ref(),
            mailboxes: self.pool.as_ref(),
            scheduler: &self.scheduler,
        };
        self.dispatcher.dispatch(&ctx, line, class_id, arg)
    }

    /// Mailbox of `class`/`unit`; panics for unrouted devices.
    pub fn mailbox(&self, class: DeviceClass, unit: u32) -> MboxId {
        self.io.mailbox_for(class, unit).expect("routed device")
    }

    /// Messages queued across every I/O mailbox.
    pub fn queued_total(&self) -> usize {
        self.io.routes().slots().iter().map(|&mbox| self.pool.queued(mbox).unwrap_or(0)).sum()
    }
}

/// Polls `cond` until it holds; panics after five seconds.
pub fn wait_until(what: &str, cond: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        thread::sleep(Duration::from_millis(1));
    }
}
