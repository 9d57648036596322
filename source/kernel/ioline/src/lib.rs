// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Interrupt-to-mailbox delivery layer of the kernel
//! OWNERS: @kernel-team
//! STATUS: Functional (syscall dispatch deferred)
//! API_STABILITY: Unstable
//! TEST_COVERAGE: unit tests + proptest per module; end-to-end in tests/ioline_e2e
//!
//! PUBLIC API:
//!   - IoSubsystem: routing table, config and blocked-I/O counter, built once at boot
//!   - InterruptDispatcher: clock/disk/terminal/syscall handlers behind one vector
//!   - RoutingTable, StatusWord, TickAggregator, IrqFault, SyscallTable, IrqConfig
//!
//! INVARIANTS:
//!   - Handlers never block; only `CondSend` is reachable from interrupt context
//!   - One mailbox per device instance; routing is read-only after init
//!   - Every fault halts the whole machine with a console diagnostic

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

pub mod config;
pub mod fatal;
pub mod irq;
pub mod route;
pub mod status;
pub mod subsystem;
pub mod syscall;
pub mod tick;

#[cfg(test)]
mod testing;

pub use config::{ConfigError, IrqConfig};
pub use fatal::{IrqFault, FATAL_EXIT_CODE};
pub use irq::{Delivery, Dispatch, InterruptDispatcher, IrqContext, TimeSlice};
pub use route::{RouteError, RoutingTable, DEVICE_UNITS, IO_MAILBOX_COUNT};
pub use status::{read_status, StatusWord};
pub use subsystem::{InitError, IoSubsystem, WaitError};
pub use syscall::{nullsys, SyscallError, SyscallHandler, SyscallTable, Sysargs, MAX_SYSCALLS};
pub use tick::{Tick, TickAggregator, DEFAULT_TICK_THRESHOLD};
