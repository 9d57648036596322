// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

use ioline_hal::DeviceClass;

use super::{expect_class, Delivery, InterruptDispatcher, IrqContext};
use crate::fatal::IrqFault;

/// Syscall trap. Only the class is checked; dispatch through
/// [`crate::SyscallTable`] is not wired to the trap yet.
pub(super) fn syscall_handler(
    _irq: &mut InterruptDispatcher,
    _ctx: &IrqContext<'_>,
    class_id: u32,
    _arg: usize,
) -> Result<Delivery, IrqFault> {
    expect_class("syscall_handler", DeviceClass::Syscall, class_id)?;
    Ok(Delivery::Deferred)
}
