//! Anti-replay tracking of issued resume-ticket indices.
//!
//! Indices are handed out strictly sequentially. The allocator remembers the
//! last `capacity` of them in a ring of bits indexed by `index mod capacity`:
//!
//! ```text
//!            window_base                      next_index
//!                 │◄──────── capacity ────────►│
//!   ... forgotten │ issued / redeemed bits     │ not yet issued ...
//! ```
//!
//! A bit is set exactly for indices inside the window that were issued and
//! have not been redeemed. Issuing index `n` reuses the slot of `n - capacity`,
//! which leaves the window at the same moment, so aging needs no extra pass.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::{ProtocolError, Result};

/// Upper bound on the number of tracked indices (2 MiB of bitmap).
pub const MAX_TICKET_CAPACITY: usize = 1 << 24;

const WORD_BITS: usize = u64::BITS as usize;

/// Issues ticket indices and redeems each of them at most once.
///
/// All operations take `&self`; a mutex serialises every read-modify-write of
/// the bitmap and counters, so one allocator can be shared by all handshake
/// sessions of a host.
pub struct TicketIndexAllocator {
    window: Mutex<Window>,
}

#[derive(Debug)]
struct Window {
    first_index: i64,
    next_index: i64,
    capacity: usize,
    bits: Vec<u64>,
}

impl Window {
    fn base(&self) -> i64 {
        self.next_index.saturating_sub(self.capacity as i64)
    }

    fn contains(&self, index: i64) -> bool {
        index >= self.base() && index < self.next_index
    }

    fn slot(&self, index: i64) -> (usize, u64) {
        let slot = index.rem_euclid(self.capacity as i64) as usize;
        (slot / WORD_BITS, 1u64 << (slot % WORD_BITS))
    }

    fn is_outstanding(&self, index: i64) -> bool {
        if !self.contains(index) {
            return false;
        }
        let (word, mask) = self.slot(index);
        self.bits[word] & mask != 0
    }

    fn mark(&mut self, index: i64) {
        let (word, mask) = self.slot(index);
        self.bits[word] |= mask;
    }

    fn clear(&mut self, index: i64) {
        let (word, mask) = self.slot(index);
        self.bits[word] &= !mask;
    }
}

impl TicketIndexAllocator {
    /// Creates an allocator whose first issued index is `first_ticket_index`.
    ///
    /// `capacity` bounds both memory (one bit per index) and how many issued
    /// tickets can be outstanding before the oldest become unredeemable.
    pub fn new(first_ticket_index: i64, capacity: usize) -> Result<Self> {
        if capacity == 0 || capacity > MAX_TICKET_CAPACITY {
            return Err(ProtocolError::InvalidConfig(format!(
                "ticket capacity must be between 1 and {}, got {}",
                MAX_TICKET_CAPACITY, capacity
            )));
        }

        let words = capacity.div_ceil(WORD_BITS);
        Ok(Self {
            window: Mutex::new(Window {
                first_index: first_ticket_index,
                next_index: first_ticket_index,
                capacity,
                bits: vec![0u64; words],
            }),
        })
    }

    // Every mutation commits only after its guarded closure succeeded, so a
    // panic while the lock was held cannot leave a half-applied update.
    fn lock(&self) -> MutexGuard<'_, Window> {
        self.window.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Issues the next index and marks it outstanding.
    pub fn issue(&self) -> Result<i64> {
        self.issue_with(Ok)
    }

    /// Issues the next index, committing only if `f` succeeds.
    ///
    /// `f` runs inside the critical section with the index about to be issued.
    /// If it fails, the error is returned and the allocator is unchanged.
    pub fn issue_with<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(i64) -> Result<T>,
    {
        let mut window = self.lock();
        let index = window.next_index;
        // i64::MAX itself is never issued, so next_index cannot overflow
        if index == i64::MAX {
            tracing::warn!("ticket index space exhausted");
            return Err(ProtocolError::TicketIndexExhausted);
        }

        let value = f(index)?;

        window.mark(index);
        window.next_index = index + 1;
        tracing::trace!(index, "issued ticket index");
        Ok(value)
    }

    /// Returns whether `index` was issued, is inside the window and has not
    /// been redeemed. Does not change any state.
    pub fn is_valid(&self, index: i64) -> bool {
        self.lock().is_outstanding(index)
    }

    /// Redeems `index` if it is currently valid.
    ///
    /// Returns `true` exactly once per issued index.
    pub fn redeem(&self, index: i64) -> bool {
        self.redeem_with(index, || Ok(())).is_ok()
    }

    /// Redeems `index`, committing only if `f` succeeds.
    ///
    /// Fails with `InvalidTicket` when the index is not outstanding. `f` runs
    /// inside the critical section; if it fails the index stays outstanding.
    pub fn redeem_with<T, F>(&self, index: i64, f: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        let mut window = self.lock();
        if !window.is_outstanding(index) {
            tracing::debug!(
                index,
                window_base = window.base(),
                next_index = window.next_index,
                "ticket index not outstanding"
            );
            return Err(ProtocolError::InvalidTicket);
        }

        let value = f()?;

        window.clear(index);
        Ok(value)
    }

    /// The index the next call to `issue` will return.
    pub fn next_index(&self) -> i64 {
        self.lock().next_index
    }

    /// Lowest index that can still be valid.
    pub fn window_base(&self) -> i64 {
        self.lock().base()
    }

    /// The index this allocator started from.
    pub fn first_index(&self) -> i64 {
        self.lock().first_index
    }

    /// Number of tracked indices.
    pub fn capacity(&self) -> usize {
        self.lock().capacity
    }

    /// Number of issued indices still awaiting redemption inside the window.
    pub fn outstanding(&self) -> usize {
        self.lock()
            .bits
            .iter()
            .map(|word| word.count_ones() as usize)
            .sum()
    }
}

impl std::fmt::Debug for TicketIndexAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let window = self.lock();
        f.debug_struct("TicketIndexAllocator")
            .field("first_index", &window.first_index)
            .field("next_index", &window.next_index)
            .field("window_base", &window.base())
            .field("capacity", &window.capacity)
            .finish()
    }
}
