// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Interrupt dispatch from the platform to the device handlers
//! OWNERS: @kernel-team
//! PUBLIC API: InterruptDispatcher, IrqContext, TimeSlice, Delivery, Dispatch
//! DEPENDS_ON: subsystem::IoSubsystem, tick, fatal, status, ioline_mbox::CondSend
//! INVARIANTS: Handlers never block (only CondSend is reachable); at most one status read per
//!             interrupt; a fault halts the machine and latches the dispatcher

mod clock;
mod device;
mod syscall;

use std::sync::Arc;

use ioline_hal::{DeviceClass, Platform};
use ioline_mbox::{CondSend, MboxError, MboxId, SendOutcome};

use crate::fatal::{self, IrqFault};
use crate::status::StatusWord;
use crate::subsystem::IoSubsystem;
use crate::tick::TickAggregator;

const LOG_TARGET: &str = "ioline::irq";

/// Scheduler hook invoked on every slice boundary.
///
/// May request a context switch that takes effect when the interrupt returns.
pub trait TimeSlice {
    /// Lets the scheduler decide whether the running process is preempted.
    fn time_slice_check(&self);
}

/// Capabilities handed to a handler for one interrupt.
///
/// `mailboxes` is deliberately the conditional-send capability only.
#[derive(Clone, Copy)]
pub struct IrqContext<'a> {
    /// Device registers, console and halt.
    pub platform: &'a dyn Platform,
    /// Non-blocking send into the I/O mailboxes.
    pub mailboxes: &'a dyn CondSend,
    /// Slice-boundary hook.
    pub scheduler: &'a dyn TimeSlice,
}

/// What a handler did with the interrupt.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Status offered to its mailbox; `outcome` tells whether it was kept.
    Sent {
        /// Target mailbox.
        mbox: MboxId,
        /// Status read from the device.
        status: StatusWord,
        /// Whether the mailbox kept the word.
        outcome: SendOutcome,
    },
    /// Messaging layer rejected the send outright.
    Lost {
        /// Target mailbox.
        mbox: MboxId,
        /// Status read from the device.
        status: StatusWord,
        /// Rejection reason.
        error: MboxError,
    },
    /// Clock tick below the slice boundary; nothing sent.
    Counted {
        /// Ticks since the last boundary.
        count: u32,
    },
    /// Syscall trap validated; dispatch belongs to a later phase.
    Deferred,
}

/// Result of [`InterruptDispatcher::dispatch`].
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// The handler ran to completion.
    Handled(Delivery),
    /// The machine is halted with `code`; nothing was touched.
    Halted {
        /// Halt exit code.
        code: i32,
    },
}

type Handler =
    fn(&mut InterruptDispatcher, &IrqContext<'_>, u32, usize) -> Result<Delivery, IrqFault>;

/// Handler installed on each interrupt line.
fn vector(line: DeviceClass) -> Handler {
    match line {
        DeviceClass::Clock => clock::clock_handler,
        DeviceClass::Disk => device::disk_handler,
        DeviceClass::Terminal => device::term_handler,
        DeviceClass::Syscall => syscall::syscall_handler,
    }
}

/// Owns the handler state (tick counter, halt latch) and routes interrupts.
pub struct InterruptDispatcher {
    io: Arc<IoSubsystem>,
    ticks: TickAggregator,
    halted: Option<i32>,
}

impl InterruptDispatcher {
    /// Creates a dispatcher with the tick threshold from `io`'s config.
    pub fn new(io: Arc<IoSubsystem>) -> Self {
        let ticks = TickAggregator::new(io.config().tick_threshold);
        Self { io, ticks, halted: None }
    }

    /// Runs the handler installed on `line` with the platform's `(class_id, arg)`.
    ///
    /// A fault is reported on the console, halts the machine, and makes every
    /// later call return [`Dispatch::Halted`].
    pub fn dispatch(
        &mut self,
        ctx: &IrqContext<'_>,
        line: DeviceClass,
        class_id: u32,
        arg: usize,
    ) -> Dispatch {
        if let Some(code) = self.halted.or_else(|| ctx.platform.halted()) {
            self.halted = Some(code);
            return Dispatch::Halted { code };
        }
        if self.io.config().debug {
            log::trace!(target: LOG_TARGET, "irq line={line} class_id={class_id} arg={arg}");
        }
        match vector(line)(self, ctx, class_id, arg) {
            Ok(delivery) => Dispatch::Handled(delivery),
            Err(fault) => {
                let code = fatal::report(ctx.platform, &fault);
                self.halted = Some(code);
                Dispatch::Halted { code }
            }
        }
    }

    /// Clock tick accounting.
    pub fn ticks(&self) -> &TickAggregator {
        &self.ticks
    }

    /// Shared I/O subsystem.
    pub fn io(&self) -> &Arc<IoSubsystem> {
        &self.io
    }

    /// Exit code of the fault that stopped this dispatcher, if any.
    pub fn halted(&self) -> Option<i32> {
        self.halted
    }
}

fn expect_class(
    handler: &'static str,
    expected: DeviceClass,
    class_id: u32,
) -> Result<(), IrqFault> {
    if class_id == expected.id() {
        Ok(())
    } else {
        Err(IrqFault::ClassMismatch { handler, expected, class_id })
    }
}

/// Offers `status` to `mbox` without blocking. Saturation is not a fault.
fn send_status(
    io: &IoSubsystem,
    ctx: &IrqContext<'_>,
    handler: &'static str,
    mbox: MboxId,
    status: StatusWord,
) -> Delivery {
    match ctx.mailboxes.cond_send(mbox, &status.to_payload()) {
        Ok(outcome) => {
            if outcome == SendOutcome::NoCapacity {
                log::debug!(target: LOG_TARGET, "{handler}(): status {status} dropped, {mbox} full");
            } else if io.config().debug {
                log::trace!(target: LOG_TARGET, "{handler}(): status {status} -> {mbox}");
            }
            Delivery::Sent { mbox, status, outcome }
        }
        Err(error) => {
            log::warn!(target: LOG_TARGET, "{handler}(): status {status} lost on {mbox}: {error}");
            Delivery::Lost { mbox, status, error }
        }
    }
}
