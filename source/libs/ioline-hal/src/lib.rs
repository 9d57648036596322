// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), no_std)]
#![forbid(unsafe_code)]
#![deny(clippy::all, missing_docs)]

//! CONTEXT: Platform seams of the simulated machine (device registers, console, halt, PSR)
//! OWNERS: @kernel-team
//! PUBLIC API: DeviceClass, DeviceError, DeviceRegisters, Console, Machine, InterruptState, Psr, Platform
//! DEPENDS_ON: bitflags, thiserror (no_std)
//! INVARIANTS: Device identities are fixed; unit ranges are closed per class

use core::fmt;

/// Device classes that raise interrupts on the simulated machine.
///
/// Discriminants are the simulator's interrupt/device numbers and are what the
/// platform hands to a handler as `class_id`.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DeviceClass {
    /// Periodic clock, single implicit unit.
    Clock = 0,
    /// Disk drives 0 and 1.
    Disk = 2,
    /// Terminals 0 to 3.
    Terminal = 3,
    /// System-call trap.
    Syscall = 5,
}

impl DeviceClass {
    /// All classes, in routing order.
    pub const ALL: [DeviceClass; 4] =
        [DeviceClass::Clock, DeviceClass::Disk, DeviceClass::Terminal, DeviceClass::Syscall];

    /// Returns the platform identity of the class.
    #[inline]
    pub const fn id(self) -> u32 {
        self as u32
    }

    /// Decodes a platform identity.
    pub const fn from_id(id: u32) -> Option<Self> {
        match id {
            0 => Some(Self::Clock),
            2 => Some(Self::Disk),
            3 => Some(Self::Terminal),
            5 => Some(Self::Syscall),
            _ => None,
        }
    }

    /// Number of device instances of this class that own a status register.
    ///
    /// The syscall "device" has none: it never produces a status word.
    pub const fn unit_count(self) -> u32 {
        match self {
            Self::Clock => 1,
            Self::Disk => 2,
            Self::Terminal => 4,
            Self::Syscall => 0,
        }
    }

    /// Returns `true` when `unit` names an instance of this class.
    #[inline]
    pub const fn has_unit(self, unit: u32) -> bool {
        unit < self.unit_count()
    }

    /// Short lowercase name used in diagnostics.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Clock => "clock",
            Self::Disk => "disk",
            Self::Terminal => "term",
            Self::Syscall => "syscall",
        }
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Failure reported by the status register interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    /// The simulator does not know the addressed device/unit.
    #[error("invalid device {class} unit {unit}")]
    Invalid {
        /// Addressed class.
        class: DeviceClass,
        /// Addressed unit.
        unit: u32,
    },
    /// The device reported a communication fault while reading status.
    #[error("communication fault on {class} unit {unit}")]
    Fault {
        /// Addressed class.
        class: DeviceClass,
        /// Addressed unit.
        unit: u32,
    },
}

/// Status register access.
pub trait DeviceRegisters {
    /// Consumes the pending status word of `class`/`unit`.
    ///
    /// Only called once per interrupt; reading with nothing pending is
    /// undefined by the device model.
    fn device_input(&self, class: DeviceClass, unit: u32) -> Result<i32, DeviceError>;
}

/// Operator console. Output is best-effort.
pub trait Console {
    /// Writes one diagnostic line (the newline is appended by the console).
    fn write_line(&self, args: fmt::Arguments<'_>);
}

/// Whole-machine control.
pub trait Machine: Console {
    /// Stops the simulated machine with `code`.
    ///
    /// A hosted simulator that cannot terminate the process latches the halt;
    /// callers must not touch devices afterwards.
    fn halt(&self, code: i32);

    /// Returns the halt code once the machine stopped.
    fn halted(&self) -> Option<i32>;
}

bitflags::bitflags! {
    /// Processor status register bits of the simulated CPU.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Psr: u32 {
        /// Current mode is kernel mode.
        const CURRENT_MODE = 1 << 0;
        /// Interrupts enabled in the current mode.
        const CURRENT_INT = 1 << 1;
        /// Mode before the last interrupt.
        const PREV_MODE = 1 << 2;
        /// Interrupt enable before the last interrupt.
        const PREV_INT = 1 << 3;
    }
}

/// Interrupt-enable state of the current CPU.
pub trait InterruptState {
    /// Reads the processor status register.
    fn psr(&self) -> Psr;
    /// Writes the processor status register.
    fn set_psr(&self, psr: Psr);
}

/// Everything an interrupt handler may touch on the platform side.
pub trait Platform: DeviceRegisters + Machine {}

impl<T: DeviceRegisters + Machine> Platform for T {}
