// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Clock interrupt: tick accounting, slice boundary, clock mailbox.

use ioline_hal::DeviceClass;

use super::{expect_class, send_status, Delivery, InterruptDispatcher, IrqContext};
use crate::fatal::IrqFault;
use crate::status::read_status;
use crate::tick::Tick;

const NAME: &str = "clock_handler";

/// The unit argument is ignored; the clock has one implicit unit.
pub(super) fn clock_handler(
    irq: &mut InterruptDispatcher,
    ctx: &IrqContext<'_>,
    class_id: u32,
    _arg: usize,
) -> Result<Delivery, IrqFault> {
    expect_class(NAME, DeviceClass::Clock, class_id)?;
    let (unit, mbox) =
        irq.io.routes().resolve(DeviceClass::Clock, 0).map_err(|err| IrqFault::route(NAME, err))?;
    let status = read_status(ctx.platform, DeviceClass::Clock, unit)
        .map_err(|source| IrqFault::DeviceRead { handler: NAME, source })?;

    match irq.ticks.tick() {
        Tick::Counted { count } => Ok(Delivery::Counted { count }),
        Tick::SliceBoundary => {
            if irq.io.config().debug {
                log::trace!(target: "ioline::tick", "slice boundary after {} ticks", irq.ticks.total());
            }
            ctx.scheduler.time_slice_check();
            Ok(send_status(&irq.io, ctx, NAME, mbox, status))
        }
    }
}
