// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Static (device class, unit) -> mailbox routing
//! OWNERS: @kernel-team
//! PUBLIC API: RoutingTable (build/lookup/resolve), RouteError, DEVICE_UNITS, IO_MAILBOX_COUNT
//! DEPENDS_ON: ioline_hal::DeviceClass, ioline_mbox::MboxId
//! INVARIANTS: index = base(class) + unit; one slot per device instance; immutable after build
//!
//! Slot layout, contiguous by class:
//!
//! ```text
//!   0        1      2      3      4      5      6
//! [clock] [disk0][disk1][term0][term1][term2][term3]
//! ```

use ioline_hal::DeviceClass;
use ioline_mbox::MboxId;

/// Number of routed device instances.
pub const IO_MAILBOX_COUNT: usize = 7;

const CLOCK_BASE: usize = 0;
const DISK_BASE: usize = CLOCK_BASE + DeviceClass::Clock.unit_count() as usize;
const TERM_BASE: usize = DISK_BASE + DeviceClass::Disk.unit_count() as usize;

static_assertions::const_assert_eq!(
    TERM_BASE + DeviceClass::Terminal.unit_count() as usize,
    IO_MAILBOX_COUNT
);

/// Routed device instances in slot order.
pub const DEVICE_UNITS: [(DeviceClass, u32); IO_MAILBOX_COUNT] = [
    (DeviceClass::Clock, 0),
    (DeviceClass::Disk, 0),
    (DeviceClass::Disk, 1),
    (DeviceClass::Terminal, 0),
    (DeviceClass::Terminal, 1),
    (DeviceClass::Terminal, 2),
    (DeviceClass::Terminal, 3),
];

/// Routing failures. Raised to interrupt handlers as fatal faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    /// The class never produces status words.
    #[error("{class} has no mailbox route")]
    NoRoute {
        /// Requested class.
        class: DeviceClass,
    },
    /// The unit does not name an instance of the class.
    #[error("{class} unit {unit} out of range")]
    UnitOutOfRange {
        /// Requested class.
        class: DeviceClass,
        /// Requested unit.
        unit: usize,
    },
}

const fn base_offset(class: DeviceClass) -> Option<usize> {
    match class {
        DeviceClass::Clock => Some(CLOCK_BASE),
        DeviceClass::Disk => Some(DISK_BASE),
        DeviceClass::Terminal => Some(TERM_BASE),
        DeviceClass::Syscall => None,
    }
}

/// Validates `unit` for `class` and returns its slot index.
pub fn slot_index(class: DeviceClass, unit: usize) -> Result<usize, RouteError> {
    let base = base_offset(class).ok_or(RouteError::NoRoute { class })?;
    match u32::try_from(unit) {
        Ok(u) if class.has_unit(u) => Ok(base + unit),
        _ => Err(RouteError::UnitOutOfRange { class, unit }),
    }
}

/// Mailbox of every routed device instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingTable {
    slots: [MboxId; IO_MAILBOX_COUNT],
}

impl RoutingTable {
    /// Wraps mailbox ids given in [`DEVICE_UNITS`] order.
    pub const fn from_slots(slots: [MboxId; IO_MAILBOX_COUNT]) -> Self {
        Self { slots }
    }

    /// Builds the table by asking `make` for one mailbox per device instance,
    /// in slot order.
    pub fn build<E>(
        mut make: impl FnMut(DeviceClass, u32) -> Result<MboxId, E>,
    ) -> Result<Self, E> {
        let mut slots = [MboxId::from_raw(0); IO_MAILBOX_COUNT];
        for (slot, (class, unit)) in slots.iter_mut().zip(DEVICE_UNITS) {
            *slot = make(class, unit)?;
        }
        Ok(Self { slots })
    }

    /// Returns the mailbox dedicated to `class`/`unit`.
    pub fn lookup(&self, class: DeviceClass, unit: u32) -> Result<MboxId, RouteError> {
        self.resolve(class, unit as usize).map(|(_, mbox)| mbox)
    }

    /// Decodes a raw unit argument and returns it together with its mailbox.
    ///
    /// This is the single place where unit ranges are enforced.
    pub fn resolve(&self, class: DeviceClass, unit: usize) -> Result<(u32, MboxId), RouteError> {
        let index = slot_index(class, unit)?;
        // slot_index already proved the unit fits the class range
        Ok((unit as u32, self.slots[index]))
    }

    /// Iterates over `(class, unit, mailbox)` in slot order.
    pub fn routes(&self) -> impl Iterator<Item = (DeviceClass, u32, MboxId)> + '_ {
        DEVICE_UNITS.iter().zip(self.slots.iter()).map(|(&(class, unit), &mbox)| (class, unit, mbox))
    }

    /// Mailbox ids in slot order.
    pub fn slots(&self) -> &[MboxId; IO_MAILBOX_COUNT] {
        &self.slots
    }
}
