// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Disk and terminal completion interrupts.

use ioline_hal::DeviceClass;

use super::{expect_class, send_status, Delivery, InterruptDispatcher, IrqContext};
use crate::fatal::IrqFault;
use crate::status::read_status;

pub(super) fn disk_handler(
    irq: &mut InterruptDispatcher,
    ctx: &IrqContext<'_>,
    class_id: u32,
    arg: usize,
) -> Result<Delivery, IrqFault> {
    forward_status(irq, ctx, "disk_handler", DeviceClass::Disk, class_id, arg)
}

pub(super) fn term_handler(
    irq: &mut InterruptDispatcher,
    ctx: &IrqContext<'_>,
    class_id: u32,
    arg: usize,
) -> Result<Delivery, IrqFault> {
    forward_status(irq, ctx, "term_handler", DeviceClass::Terminal, class_id, arg)
}

/// Validates class and unit, consumes the status register, and offers the
/// word to the unit's mailbox. The register is never read for a bad unit.
fn forward_status(
    irq: &InterruptDispatcher,
    ctx: &IrqContext<'_>,
    handler: &'static str,
    class: DeviceClass,
    class_id: u32,
    arg: usize,
) -> Result<Delivery, IrqFault> {
    expect_class(handler, class, class_id)?;
    let (unit, mbox) =
        irq.io.routes().resolve(class, arg).map_err(|err| IrqFault::route(handler, err))?;
    let status = read_status(ctx.platform, class, unit)
        .map_err(|source| IrqFault::DeviceRead { handler, source })?;
    Ok(send_status(&irq.io, ctx, handler, mbox, status))
}
