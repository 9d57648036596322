// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! CONTEXT: Kernel mailboxes used by the interrupt layer and its consumers
//! OWNERS: @kernel-ipc-team
//! STATUS: Functional
//! API_STABILITY: Unstable
//! TEST_COVERAGE: unit tests + proptest (pool.rs)
//!
//! PUBLIC API:
//!   - MailboxPool: fixed pool of bounded mailboxes (host backend)
//!   - CondSend: the only capability handed to interrupt handlers
//!   - Mailboxes: full API (create/release/send/receive/cond_*) for processes
//!   - SendOutcome, MboxError, MboxId, PoolConfig
//!
//! INVARIANTS:
//!   - `CondSend::cond_send` never blocks
//!   - Per-mailbox FIFO delivery
//!   - A mailbox accepts a message while `queued < slots + waiting receivers`

#![forbid(unsafe_code)]
#![deny(clippy::all, missing_docs)]

mod pool;

pub use pool::MailboxPool;

use core::fmt;

/// Result type returned by mailbox operations.
pub type Result<T> = core::result::Result<T, MboxError>;

/// Identifier of a mailbox in the pool.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct MboxId(u32);

impl MboxId {
    /// Creates an id from its raw value.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Returns the raw id.
    #[inline]
    pub const fn as_raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub(crate) const fn as_index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for MboxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mbox#{}", self.0)
    }
}

/// Errors produced by the mailbox pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MboxError {
    /// The id does not name a live mailbox.
    #[error("no such mailbox {0}")]
    NoSuchMailbox(MboxId),
    /// Every mailbox in the pool is in use.
    #[error("mailbox pool exhausted")]
    NoFreeMailbox,
    /// Payload (or requested slot size) exceeds the mailbox slot size.
    #[error("message of {len} bytes exceeds limit of {limit}")]
    MessageTooLarge {
        /// Offending length.
        len: usize,
        /// Applicable limit.
        limit: usize,
    },
    /// Requested slot count exceeds the pool limit.
    #[error("{slots} slots exceed limit of {limit}")]
    TooManySlots {
        /// Requested slot count.
        slots: usize,
        /// Pool limit.
        limit: usize,
    },
    /// The mailbox was released while the caller was waiting on it.
    #[error("mailbox {0} released")]
    Released(MboxId),
}

/// Result of a conditional send.
///
/// Both variants are successful calls: `NoCapacity` only states that nothing
/// was queued and no receiver was waiting.
#[must_use = "conditional send outcomes must be handled"]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Message queued or handed to a waiting receiver.
    Delivered,
    /// No slot and no waiting receiver; message dropped.
    NoCapacity,
}

/// Non-blocking send capability.
///
/// Interrupt handlers only ever see this trait so that no blocking operation
/// is reachable from interrupt context.
pub trait CondSend {
    /// Attempts to deliver `payload` without blocking.
    fn cond_send(&self, id: MboxId, payload: &[u8]) -> Result<SendOutcome>;
}

/// Full mailbox API for normal processes and system initialization.
pub trait Mailboxes: CondSend {
    /// Creates a mailbox with `slots` buffered messages of at most `slot_size` bytes.
    fn create(&self, slots: usize, slot_size: usize) -> Result<MboxId>;
    /// Releases `id`, waking every blocked sender and receiver.
    fn release(&self, id: MboxId) -> Result<()>;
    /// Sends `payload`, blocking while the mailbox is full.
    fn send(&self, id: MboxId, payload: &[u8]) -> Result<()>;
    /// Receives into `buf`, blocking while the mailbox is empty; returns the length.
    fn receive(&self, id: MboxId, buf: &mut [u8]) -> Result<usize>;
    /// Receives into `buf` if a message is queued.
    fn cond_receive(&self, id: MboxId, buf: &mut [u8]) -> Result<Option<usize>>;
}

/// Pool sizing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of mailboxes that may exist at once.
    pub max_mailboxes: usize,
    /// Largest slot size a mailbox may be created with.
    pub max_message: usize,
    /// Largest slot count a mailbox may be created with.
    pub max_slots: usize,
}

impl PoolConfig {
    /// Default number of mailboxes.
    pub const DEFAULT_MAX_MAILBOXES: usize = 64;
    /// Default maximum message size in bytes.
    pub const DEFAULT_MAX_MESSAGE: usize = 64;
    /// Default maximum slot count per mailbox.
    pub const DEFAULT_MAX_SLOTS: usize = 64;
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_mailboxes: Self::DEFAULT_MAX_MAILBOXES,
            max_message: Self::DEFAULT_MAX_MESSAGE,
            max_slots: Self::DEFAULT_MAX_SLOTS,
        }
    }
}
