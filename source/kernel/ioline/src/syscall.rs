// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Syscall vector (registered for later phases; not dispatched from the trap yet)
//! OWNERS: @kernel-team
//! PUBLIC API: SyscallTable (new/register/invoke/is_registered), Sysargs, SyscallHandler, nullsys
//! DEPENDS_ON: ioline_hal::{InterruptState, Machine, Psr}, fatal
//! INVARIANTS: Fixed MAX_SYSCALLS window; handlers run with interrupts enabled, PSR restored after;
//!             an invalid syscall halts the machine

use ioline_hal::{InterruptState, Machine, Psr};

use crate::fatal::{self, FATAL_EXIT_CODE};

/// Size of the syscall vector.
pub const MAX_SYSCALLS: usize = 50;

/// Errors produced by the syscall vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SyscallError {
    /// No handler registered for the number.
    #[error("invalid syscall {0}")]
    Invalid(usize),
    /// Number outside the vector.
    #[error("syscall {0} outside the vector")]
    OutOfRange(usize),
}

/// Arguments of one system call as trapped from a process.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sysargs {
    /// Syscall number.
    pub number: usize,
    /// Argument words; handlers write results back in place.
    pub args: [usize; 5],
}

/// Handler type stored in the vector.
pub type SyscallHandler = fn(&mut Sysargs) -> Result<(), SyscallError>;

/// Handler of every unregistered number. [`SyscallTable::invoke`] halts the
/// machine on the error it returns.
pub fn nullsys(args: &mut Sysargs) -> Result<(), SyscallError> {
    Err(SyscallError::Invalid(args.number))
}

/// Dispatch table storing handlers by syscall number.
pub struct SyscallTable {
    handlers: [Option<SyscallHandler>; MAX_SYSCALLS],
}

impl SyscallTable {
    /// Creates a vector where every entry is `nullsys`.
    pub const fn new() -> Self {
        const NONE: Option<SyscallHandler> = None;
        Self { handlers: [NONE; MAX_SYSCALLS] }
    }

    /// Registers `handler` for `number`, replacing any previous entry.
    pub fn register(&mut self, number: usize, handler: SyscallHandler) -> Result<(), SyscallError> {
        let entry = self.handlers.get_mut(number).ok_or(SyscallError::OutOfRange(number))?;
        *entry = Some(handler);
        Ok(())
    }

    /// Returns `true` when `number` has a handler other than `nullsys`.
    pub fn is_registered(&self, number: usize) -> bool {
        self.handlers.get(number).is_some_and(Option::is_some)
    }

    /// Runs the handler for `args.number` with interrupts enabled and restores
    /// the previous processor status afterwards.
    ///
    /// An invalid syscall is fatal: the console gets a diagnostic and the
    /// machine halts with [`FATAL_EXIT_CODE`]; the error is still returned.
    pub fn invoke<S>(&self, cpu: &S, args: &mut Sysargs) -> Result<(), SyscallError>
    where
        S: InterruptState + Machine + ?Sized,
    {
        let handler = self
            .handlers
            .get(args.number)
            .ok_or(SyscallError::OutOfRange(args.number))?
            .unwrap_or(nullsys);
        let old = cpu.psr();
        cpu.set_psr(old | Psr::CURRENT_INT);
        let result = handler(args);
        cpu.set_psr(old);
        if let Err(SyscallError::Invalid(number)) = result {
            fatal::fatal(
                cpu,
                FATAL_EXIT_CODE,
                format_args!("nullsys(): invalid syscall {number}. Halting..."),
            );
        }
        result
    }
}

impl Default for SyscallTable {
    fn default() -> Self {
        Self::new()
    }
}
