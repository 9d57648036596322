// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Single-threaded doubles for the platform, the mailbox capability and the scheduler.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex, Once};
use std::thread::{self, ThreadId};

use ioline_hal::{Console, DeviceClass, DeviceError, DeviceRegisters, Machine};
use ioline_mbox::{CondSend, MboxError, MboxId, SendOutcome};

use crate::config::IrqConfig;
use crate::irq::{Dispatch, InterruptDispatcher, IrqContext, TimeSlice};
use crate::route::{RoutingTable, IO_MAILBOX_COUNT};
use crate::status::StatusWord;
use crate::subsystem::IoSubsystem;

/// Scripted status registers; unscripted reads return status 0.
#[derive(Default)]
pub(crate) struct MockPlatform {
    statuses: RefCell<HashMap<(DeviceClass, u32), VecDeque<Result<i32, DeviceError>>>>,
    reads: RefCell<Vec<(DeviceClass, u32)>>,
    console: RefCell<Vec<String>>,
    halted: Cell<Option<i32>>,
}

impl MockPlatform {
    pub(crate) fn push_status(&self, class: DeviceClass, unit: u32, status: i32) {
        self.statuses.borrow_mut().entry((class, unit)).or_default().push_back(Ok(status));
    }

    pub(crate) fn push_fault(&self, class: DeviceClass, unit: u32) {
        self.statuses
            .borrow_mut()
            .entry((class, unit))
            .or_default()
            .push_back(Err(DeviceError::Fault { class, unit }));
    }

    pub(crate) fn reads(&self) -> Vec<(DeviceClass, u32)> {
        self.reads.borrow().clone()
    }

    pub(crate) fn console(&self) -> Vec<String> {
        self.console.borrow().clone()
    }
}

impl DeviceRegisters for MockPlatform {
    fn device_input(&self, class: DeviceClass, unit: u32) -> Result<i32, DeviceError> {
        self.reads.borrow_mut().push((class, unit));
        self.statuses
            .borrow_mut()
            .get_mut(&(class, unit))
            .and_then(VecDeque::pop_front)
            .unwrap_or(Ok(0))
    }
}

impl Console for MockPlatform {
    fn write_line(&self, args: fmt::Arguments<'_>) {
        self.console.borrow_mut().push(args.to_string());
    }
}

impl Machine for MockPlatform {
    fn halt(&self, code: i32) {
        if self.halted.get().is_none() {
            self.halted.set(Some(code));
        }
    }

    fn halted(&self) -> Option<i32> {
        self.halted.get()
    }
}

/// Records every conditional send and answers with a scripted outcome.
pub(crate) struct RecordingMailboxes {
    sent: RefCell<Vec<(MboxId, Vec<u8>)>>,
    answer: Cell<Result<SendOutcome, MboxError>>,
}

impl RecordingMailboxes {
    pub(crate) fn answer_with(&self, answer: Result<SendOutcome, MboxError>) {
        self.answer.set(answer);
    }

    /// Decoded `(mailbox, status)` pairs in send order.
    pub(crate) fn sent(&self) -> Vec<(MboxId, StatusWord)> {
        self.sent
            .borrow()
            .iter()
            .map(|(mbox, bytes)| (*mbox, StatusWord::from_payload(bytes).expect("status payload")))
            .collect()
    }
}

impl Default for RecordingMailboxes {
    fn default() -> Self {
        Self { sent: RefCell::new(Vec::new()), answer: Cell::new(Ok(SendOutcome::Delivered)) }
    }
}

impl CondSend for RecordingMailboxes {
    fn cond_send(&self, id: MboxId, payload: &[u8]) -> ioline_mbox::Result<SendOutcome> {
        self.sent.borrow_mut().push((id, payload.to_vec()));
        self.answer.get()
    }
}

#[derive(Default)]
pub(crate) struct SliceCounter(Cell<usize>);

impl SliceCounter {
    pub(crate) fn calls(&self) -> usize {
        self.0.get()
    }
}

impl TimeSlice for SliceCounter {
    fn time_slice_check(&self) {
        self.0.set(self.0.get() + 1);
    }
}

/// Mailbox ids used by [`routes`]: slot `i` is `mbox#(100 + i)`.
pub(crate) const FIRST_TEST_MBOX: u32 = 100;

pub(crate) fn routes() -> RoutingTable {
    let mut slots = [MboxId::from_raw(0); IO_MAILBOX_COUNT];
    for (raw, slot) in (FIRST_TEST_MBOX..).zip(slots.iter_mut()) {
        *slot = MboxId::from_raw(raw);
    }
    RoutingTable::from_slots(slots)
}

/// Dispatcher wired to the doubles above.
pub(crate) struct Rig {
    pub(crate) platform: MockPlatform,
    pub(crate) mailboxes: RecordingMailboxes,
    pub(crate) scheduler: SliceCounter,
    pub(crate) dispatcher: InterruptDispatcher,
}

impl Rig {
    pub(crate) fn new() -> Self {
        Self::with_config(IrqConfig::default())
    }

    pub(crate) fn with_config(config: IrqConfig) -> Self {
        let io = Arc::new(IoSubsystem::with_routes(routes(), config));
        Self {
            platform: MockPlatform::default(),
            mailboxes: RecordingMailboxes::default(),
            scheduler: SliceCounter::default(),
            dispatcher: InterruptDispatcher::new(io),
        }
    }

    /// Raises `class` with its own identity as `class_id`.
    pub(crate) fn fire(&mut self, class: DeviceClass, arg: usize) -> Dispatch {
        self.fire_as(class, class.id(), arg)
    }

    /// Raises interrupt line `line` reporting `class_id`.
    pub(crate) fn fire_as(&mut self, line: DeviceClass, class_id: u32, arg: usize) -> Dispatch {
        let ctx = IrqContext {
            platform: &self.platform,
            mailboxes: &self.mailboxes,
            scheduler: &self.scheduler,
        };
        self.dispatcher.dispatch(&ctx, line, class_id, arg)
    }

    pub(crate) fn mailbox(&self, class: DeviceClass, unit: u32) -> MboxId {
        self.dispatcher.io().mailbox_for(class, unit).expect("routed device")
    }
}

/// Log record seen by [`captured_logs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Captured {
    pub(crate) level: log::Level,
    pub(crate) target: String,
    pub(crate) message: String,
}

struct CaptureLogger {
    records: Mutex<Vec<(ThreadId, Captured)>>,
}

impl log::Log for CaptureLogger {
    fn enabled(&self, _: &log::Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &log::Record<'_>) {
        let captured = Captured {
            level: record.level(),
            target: record.target().to_string(),
            message: record.args().to_string(),
        };
        if let Ok(mut records) = self.records.lock() {
            records.push((thread::current().id(), captured));
        }
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger { records: Mutex::new(Vec::new()) };
static INSTALL: Once = Once::new();

/// Routes every log record of the test binary into memory.
pub(crate) fn capture_logs() {
    INSTALL.call_once(|| {
        log::set_logger(&LOGGER).expect("logger installed once");
        log::set_max_level(log::LevelFilter::Trace);
    });
}

/// Records emitted on the calling thread with `target`.
pub(crate) fn captured_logs(target: &str) -> Vec<Captured> {
    let me = thread::current().id();
    LOGGER
        .records
        .lock()
        .expect("log capture")
        .iter()
        .filter(|(thread, record)| *thread == me && record.target == target)
        .map(|(_, record)| record.clone())
        .collect()
}
