// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Process-wide state of the interrupt layer, built once at boot
//! OWNERS: @kernel-team
//! PUBLIC API: IoSubsystem (init/with_routes/mailbox_for/wait_device/blocked_io), InitError, WaitError
//! DEPENDS_ON: route, status, config, ioline_mbox::Mailboxes
//! INVARIANTS: Routing table fully populated before the dispatcher exists; read-only afterwards;
//!             blocked-I/O counter covers exactly the span of a consumer's blocking receive

use core::sync::atomic::{AtomicUsize, Ordering};

use ioline_hal::DeviceClass;
use ioline_mbox::{Mailboxes, MboxError, MboxId};

use crate::config::IrqConfig;
use crate::route::{RouteError, RoutingTable, IO_MAILBOX_COUNT};
use crate::status::StatusWord;

const LOG_TARGET: &str = "ioline::io";

/// Failure while creating the I/O mailboxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InitError {
    /// The mailbox of `class`/`unit` could not be created.
    #[error("creating mailbox for {class} unit {unit}: {source}")]
    Mailbox {
        /// Device class of the failed route.
        class: DeviceClass,
        /// Unit of the failed route.
        unit: u32,
        /// Mailbox layer error.
        #[source]
        source: MboxError,
    },
}

/// Failure on the consumer side of a device mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum WaitError {
    /// The device has no mailbox.
    #[error(transparent)]
    Route(#[from] RouteError),
    /// The receive itself failed.
    #[error(transparent)]
    Mailbox(#[from] MboxError),
    /// Message on an I/O mailbox was not a status word.
    #[error("malformed status message of {len} bytes")]
    Malformed {
        /// Received length.
        len: usize,
    },
}

/// Routing table, configuration and blocked-I/O bookkeeping.
///
/// Shared by handle between the interrupt dispatcher and device consumers.
#[derive(Debug)]
pub struct IoSubsystem {
    routes: RoutingTable,
    config: IrqConfig,
    blocked_io: AtomicUsize,
}

static_assertions::assert_impl_all!(IoSubsystem: Send, Sync);

impl IoSubsystem {
    /// Creates one mailbox per device instance and builds the routing table.
    ///
    /// Mailboxes created before a failure are released again.
    pub fn init<M>(mailboxes: &M, config: IrqConfig) -> Result<Self, InitError>
    where
        M: Mailboxes + ?Sized,
    {
        let mut created = Vec::with_capacity(IO_MAILBOX_COUNT);
        let built = RoutingTable::build(|class, unit| {
            let id = mailboxes
                .create(config.io_mailbox_slots, StatusWord::SIZE)
                .map_err(|source| InitError::Mailbox { class, unit, source })?;
            created.push(id);
            Ok(id)
        });
        let routes = match built {
            Ok(routes) => routes,
            Err(err) => {
                for id in created {
                    if let Err(release) = mailboxes.release(id) {
                        log::warn!(target: LOG_TARGET, "releasing {id} after failed init: {release}");
                    }
                }
                return Err(err);
            }
        };
        for (class, unit, mbox) in routes.routes() {
            log::debug!(target: LOG_TARGET, "route {class}{unit} -> {mbox}");
        }
        log::info!(
            target: LOG_TARGET,
            "io mailboxes ready: {IO_MAILBOX_COUNT} routes, {} slot(s) each",
            config.io_mailbox_slots
        );
        Ok(Self::with_routes(routes, config))
    }

    /// Wraps an already populated routing table.
    pub fn with_routes(routes: RoutingTable, config: IrqConfig) -> Self {
        Self { routes, config, blocked_io: AtomicUsize::new(0) }
    }

    /// Device routes built at init.
    pub fn routes(&self) -> &RoutingTable {
        &self.routes
    }

    /// Configuration the subsystem was built with.
    pub fn config(&self) -> &IrqConfig {
        &self.config
    }

    /// Well-known mailbox of `class`/`unit` for consumers.
    pub fn mailbox_for(&self, class: DeviceClass, unit: u32) -> Result<MboxId, RouteError> {
        self.routes.lookup(class, unit)
    }

    /// Consumers currently blocked on an I/O mailbox.
    pub fn blocked_io(&self) -> usize {
        self.blocked_io.load(Ordering::Acquire)
    }

    /// Blocks until `class`/`unit` delivers its next status word.
    pub fn wait_device<M>(
        &self,
        mailboxes: &M,
        class: DeviceClass,
        unit: u32,
    ) -> Result<StatusWord, WaitError>
    where
        M: Mailboxes + ?Sized,
    {
        let mbox = self.mailbox_for(class, unit)?;
        let mut buf = [0u8; StatusWord::SIZE];
        let len = {
            let _blocked = BlockedGuard::enter(&self.blocked_io);
            mailboxes.receive(mbox, &mut buf)?
        };
        StatusWord::from_payload(&buf[..len]).ok_or(WaitError::Malformed { len })
    }
}

/// Keeps the blocked-I/O counter raised while alive.
struct BlockedGuard<'a>(&'a AtomicUsize);

impl<'a> BlockedGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }
}

impl Drop for BlockedGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}
