// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Device status words and the status register adapter
//! OWNERS: @kernel-team
//! PUBLIC API: StatusWord, read_status()
//! DEPENDS_ON: ioline_hal::DeviceRegisters
//! INVARIANTS: One register read per interrupt; payload is 4 bytes little-endian

use core::fmt;

use ioline_hal::{DeviceClass, DeviceError, DeviceRegisters};

/// Completion/error code reported by a device, copied by value into a mailbox.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct StatusWord(i32);

impl StatusWord {
    /// Size of the encoded payload in bytes.
    pub const SIZE: usize = core::mem::size_of::<i32>();

    /// Wraps a raw register value.
    #[inline]
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// Returns the raw register value.
    #[inline]
    pub const fn as_raw(self) -> i32 {
        self.0
    }

    /// Encodes the word as a mailbox payload.
    #[inline]
    pub fn to_payload(self) -> [u8; Self::SIZE] {
        self.0.to_le_bytes()
    }

    /// Decodes a payload received from an I/O mailbox.
    pub fn from_payload(bytes: &[u8]) -> Option<Self> {
        <[u8; Self::SIZE]>::try_from(bytes).ok().map(|raw| Self(i32::from_le_bytes(raw)))
    }
}

impl fmt::Display for StatusWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Consumes the pending status register of `class`/`unit`.
///
/// The platform guarantees an interrupt implies a pending status, so this is
/// called exactly once, at the top of handling. Errors are never retried.
pub fn read_status<R>(regs: &R, class: DeviceClass, unit: u32) -> Result<StatusWord, DeviceError>
where
    R: DeviceRegisters + ?Sized,
{
    regs.device_input(class, unit).map(StatusWord::from_raw)
}
