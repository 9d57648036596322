// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Fatal fault taxonomy of the interrupt layer and the halt path
//! OWNERS: @kernel-team
//! PUBLIC API: IrqFault, fatal(), report(), FATAL_EXIT_CODE
//! DEPENDS_ON: ioline_hal::Machine
//! INVARIANTS: Every fault is terminal for the whole machine; no retry path

use core::fmt;

use ioline_hal::{DeviceClass, DeviceError, Machine};

use crate::route::RouteError;

const LOG_TARGET: &str = "ioline::fatal";

/// Exit code used for every interrupt-layer fault.
pub const FATAL_EXIT_CODE: i32 = 1;

/// Platform or routing invariant violated inside an interrupt handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum IrqFault {
    /// Interrupt delivered with a class the handler does not serve.
    #[error("{handler}(): device type error {class_id}")]
    ClassMismatch {
        /// Faulting handler.
        handler: &'static str,
        /// Class the handler serves.
        expected: DeviceClass,
        /// Class identity the platform reported.
        class_id: u32,
    },
    /// Unit outside the class range.
    #[error("{handler}(): device unit number error {unit}")]
    UnitOutOfRange {
        /// Faulting handler.
        handler: &'static str,
        /// Device class.
        class: DeviceClass,
        /// Raw unit argument.
        unit: usize,
    },
    /// Class has no mailbox route.
    #[error("{handler}(): no mailbox route for {class}")]
    Unrouted {
        /// Faulting handler.
        handler: &'static str,
        /// Unrouted class.
        class: DeviceClass,
    },
    /// Status register read failed.
    #[error("{handler}(): device input error: {source}")]
    DeviceRead {
        /// Faulting handler.
        handler: &'static str,
        /// Register error.
        #[source]
        source: DeviceError,
    },
}

impl IrqFault {
    pub(crate) fn route(handler: &'static str, err: RouteError) -> Self {
        match err {
            RouteError::NoRoute { class } => Self::Unrouted { handler, class },
            RouteError::UnitOutOfRange { class, unit } => Self::UnitOutOfRange { handler, class, unit },
        }
    }

    /// Name of the handler that raised the fault.
    pub fn handler(&self) -> &'static str {
        match self {
            Self::ClassMismatch { handler, .. }
            | Self::UnitOutOfRange { handler, .. }
            | Self::Unrouted { handler, .. }
            | Self::DeviceRead { handler, .. } => *handler,
        }
    }

    /// Exit code the machine halts with.
    pub const fn exit_code(&self) -> i32 {
        FATAL_EXIT_CODE
    }
}

/// Writes `diagnostic` to the operator console and halts the machine.
pub fn fatal<M>(machine: &M, code: i32, diagnostic: fmt::Arguments<'_>)
where
    M: Machine + ?Sized,
{
    log::error!(target: LOG_TARGET, "{diagnostic}; halting with code {code}");
    machine.write_line(diagnostic);
    machine.halt(code);
}

/// Reports `fault` and halts; returns the exit code used.
pub fn report<M>(machine: &M, fault: &IrqFault) -> i32
where
    M: Machine + ?Sized,
{
    let code = fault.exit_code();
    fatal(machine, code, format_args!("{fault}"));
    code
}
