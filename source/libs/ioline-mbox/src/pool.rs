// Copyright 2025 Open Nexus OS Contributors
// SPDX-License-Identifier: Apache-2.0

//! Host backend of the mailbox pool.
//!
//! Every mailbox lives in a fixed cell guarded by a `parking_lot` mutex with two
//! condition variables: `items` wakes receivers, `space` wakes blocked senders.
//! Releasing a mailbox bumps the cell generation so that waiters parked on the
//! old mailbox observe `Released` even if the cell is reused right away.

use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};

use crate::{CondSend, Mailboxes, MboxError, MboxId, PoolConfig, Result, SendOutcome};

const LOG_TARGET: &str = "ioline-mbox";

struct Mailbox {
    slots: usize,
    slot_size: usize,
    queue: VecDeque<Vec<u8>>,
    waiting_receivers: usize,
}

impl Mailbox {
    fn with_slots(slots: usize, slot_size: usize) -> Self {
        Self { slots, slot_size, queue: VecDeque::new(), waiting_receivers: 0 }
    }

    fn check_len(&self, len: usize) -> Result<()> {
        if len > self.slot_size {
            return Err(MboxError::MessageTooLarge { len, limit: self.slot_size });
        }
        Ok(())
    }

    /// Zero-slot mailboxes only accept a message when a receiver is parked.
    fn has_room(&self) -> bool {
        self.queue.len() < self.slots.saturating_add(self.waiting_receivers)
    }

    fn take_into(&mut self, buf: &mut [u8]) -> Result<Option<usize>> {
        let Some(len) = self.queue.front().map(Vec::len) else {
            return Ok(None);
        };
        if len > buf.len() {
            return Err(MboxError::MessageTooLarge { len, limit: buf.len() });
        }
        if let Some(msg) = self.queue.pop_front() {
            buf[..len].copy_from_slice(&msg);
        }
        Ok(Some(len))
    }
}

#[derive(Default)]
struct Slot {
    generation: u64,
    mailbox: Option<Mailbox>,
}

#[derive(Default)]
struct Cell {
    state: Mutex<Slot>,
    items: Condvar,
    space: Condvar,
}

fn current(slot: &mut Slot, id: MboxId, generation: u64) -> Result<&mut Mailbox> {
    if slot.generation != generation {
        return Err(MboxError::Released(id));
    }
    slot.mailbox.as_mut().ok_or(MboxError::Released(id))
}

/// Fixed-size pool of bounded mailboxes.
pub struct MailboxPool {
    cells: Vec<Cell>,
    config: PoolConfig,
}

impl MailboxPool {
    /// Creates an empty pool sized by `config`.
    pub fn new(config: PoolConfig) -> Self {
        let mut cells = Vec::with_capacity(config.max_mailboxes);
        cells.resize_with(config.max_mailboxes, Cell::default);
        Self { cells, config }
    }

    /// Returns the sizing this pool was created with.
    pub fn config(&self) -> PoolConfig {
        self.config
    }

    /// Number of messages currently queued in `id`.
    pub fn queued(&self, id: MboxId) -> Result<usize> {
        let slot = self.cell(id)?.state.lock();
        slot.mailbox.as_ref().map(|m| m.queue.len()).ok_or(MboxError::NoSuchMailbox(id))
    }

    /// Number of receivers currently parked on `id`.
    pub fn waiting_receivers(&self, id: MboxId) -> Result<usize> {
        let slot = self.cell(id)?.state.lock();
        slot.mailbox.as_ref().map(|m| m.waiting_receivers).ok_or(MboxError::NoSuchMailbox(id))
    }

    fn cell(&self, id: MboxId) -> Result<&Cell> {
        self.cells.get(id.as_index()).ok_or(MboxError::NoSuchMailbox(id))
    }
}

impl Default for MailboxPool {
    fn default() -> Self {
        Self::new(PoolConfig::default())
    }
}

impl CondSend for MailboxPool {
    fn cond_send(&self, id: MboxId, payload: &[u8]) -> Result<SendOutcome> {
        let cell = self.cell(id)?;
        let mut slot = cell.state.lock();
        let mbox = slot.mailbox.as_mut().ok_or(MboxError::NoSuchMailbox(id))?;
        mbox.check_len(payload.len())?;
        if !mbox.has_room() {
            log::debug!(target: LOG_TARGET, "cond_send {id}: no capacity ({} queued)", mbox.queue.len());
            return Ok(SendOutcome::NoCapacity);
        }
        mbox.queue.push_back(payload.to_vec());
        cell.items.notify_one();
        Ok(SendOutcome::Delivered)
    }
}

impl Mailboxes for MailboxPool {
    fn create(&self, slots: usize, slot_size: usize) -> Result<MboxId> {
        if slot_size > self.config.max_message {
            return Err(MboxError::MessageTooLarge { len: slot_size, limit: self.config.max_message });
        }
        if slots > self.config.max_slots {
            return Err(MboxError::TooManySlots { slots, limit: self.config.max_slots });
        }
        let index = self
            .cells
            .iter()
            .position(|cell| {
                let mut slot = cell.state.lock();
                if slot.mailbox.is_some() {
                    return false;
                }
                slot.mailbox = Some(Mailbox::with_slots(slots, slot_size));
                true
            })
            .ok_or(MboxError::NoFreeMailbox)?;
        let id = MboxId::from_raw(index as u32);
        log::trace!(target: LOG_TARGET, "create {id}: slots={slots} slot_size={slot_size}");
        Ok(id)
    }

    fn release(&self, id: MboxId) -> Result<()> {
        let cell = self.cell(id)?;
        let mut slot = cell.state.lock();
        if slot.mailbox.take().is_none() {
            return Err(MboxError::NoSuchMailbox(id));
        }
        slot.generation = slot.generation.wrapping_add(1);
        cell.items.notify_all();
        cell.space.notify_all();
        log::trace!(target: LOG_TARGET, "release {id}");
        Ok(())
    }

    fn send(&self, id: MboxId, payload: &[u8]) -> Result<()> {
        let cell = self.cell(id)?;
        let mut slot = cell.state.lock();
        let generation = slot.generation;
        slot.mailbox.as_ref().ok_or(MboxError::NoSuchMailbox(id))?.check_len(payload.len())?;
        loop {
            let mbox = current(&mut slot, id, generation)?;
            if mbox.has_room() {
                mbox.queue.push_back(payload.to_vec());
                cell.items.notify_one();
                return Ok(());
            }
            cell.space.wait(&mut slot);
        }
    }

    fn receive(&self, id: MboxId, buf: &mut [u8]) -> Result<usize> {
        let cell = self.cell(id)?;
        let mut slot = cell.state.lock();
        let generation = slot.generation;
        slot.mailbox.as_mut().ok_or(MboxError::NoSuchMailbox(id))?.waiting_receivers += 1;
        // A parked receiver is capacity for zero-slot hand-off.
        cell.space.notify_one();

        let result = loop {
            let mbox = match current(&mut slot, id, generation) {
                Ok(mbox) => mbox,
                Err(err) => break Err(err),
            };
            match mbox.take_into(buf) {
                Ok(Some(len)) => break Ok(len),
                Ok(None) => cell.items.wait(&mut slot),
                Err(err) => break Err(err),
            }
        };

        if let Ok(mbox) = current(&mut slot, id, generation) {
            mbox.waiting_receivers -= 1;
        }
        if result.is_ok() {
            cell.space.notify_one();
        }
        result
    }

    fn cond_receive(&self, id: MboxId, buf: &mut [u8]) -> Result<Option<usize>> {
        let cell = self.cell(id)?;
        let mut slot = cell.state.lock();
        let mbox = slot.mailbox.as_mut().ok_or(MboxError::NoSuchMailbox(id))?;
        let taken = mbox.take_into(buf)?;
        if taken.is_some() {
            cell.space.notify_one();
        }
        Ok(taken)
    }
}
