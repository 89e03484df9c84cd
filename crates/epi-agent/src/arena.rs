//! `AgentArena` — index-stable slot storage with free-index recycling.
//!
//! # Storage model
//!
//! Slots are stored structure-of-arrays: the agent records themselves in one
//! `Vec<T>`, with parallel `Vec`s for the liveness flag, the mask bitset,
//! and the slot generation.  A freed slot's index goes onto a recycling
//! stack and is handed out again by the next [`AgentArena::allocate`]; the
//! slot's memory is reset to `T::default()` before the caller sees it, and
//! the generation counter is bumped so stale [`AgentHandle`]s from the
//! previous occupant are detectable.
//!
//! # Concurrency contract
//!
//! Bulk passes ([`apply`][AgentArena::apply] and friends) borrow the arena
//! mutably, so structural mutation (allocate/free) during a pass is
//! impossible by construction.  [`parallel_masked_apply`]
//! [AgentArena::parallel_masked_apply] partitions the index range across
//! Rayon workers with no ordering guarantee between agents; the closure must
//! touch only the receiving agent's own exclusive state and shared
//! structures that are internally synchronised (mutex-guarded queues,
//! atomic counters).

use epi_core::{AgentId, EpiError, EpiResult};

use crate::mask::{Mask, MaskLayout};

/// A store index paired with the slot generation observed at allocation.
///
/// Resolving a handle after the slot has been freed (and possibly reused)
/// fails with [`EpiError::StaleHandle`] instead of silently reading the new
/// occupant.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct AgentHandle {
    pub id: AgentId,
    pub generation: u32,
}

/// Index-stable, growable arena of agent slots.
pub struct AgentArena<T> {
    items: Vec<T>,
    valid: Vec<bool>,
    masks: Vec<u32>,
    generation: Vec<u32>,
    /// Recycling stack of freed indices.
    free: Vec<AgentId>,
    /// Number of currently-valid slots.
    live: usize,
    layout: MaskLayout,
}

impl<T: Default> AgentArena<T> {
    /// Create an empty arena with the given (fixed) mask layout.
    pub fn new(layout: MaskLayout) -> Self {
        Self::with_capacity(layout, 0)
    }

    /// Create an empty arena pre-reserving space for `capacity` slots.
    pub fn with_capacity(layout: MaskLayout, capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            valid: Vec::with_capacity(capacity),
            masks: Vec::with_capacity(capacity),
            generation: Vec::with_capacity(capacity),
            free: Vec::new(),
            live: 0,
            layout,
        }
    }

    /// The mask layout this arena was built with.
    pub fn layout(&self) -> &MaskLayout {
        &self.layout
    }

    // ── Allocation ────────────────────────────────────────────────────────

    /// Claim a slot: pops the free stack or extends the arrays.  Amortised
    /// O(1).  The slot is reset to `T::default()` and marked valid before
    /// the handle is returned; the caller then initialises the agent through
    /// [`get_mut`][Self::get_mut].
    ///
    /// Must only be called from a serial phase — never while a bulk pass is
    /// in flight (enforced by the `&mut self` borrow).
    pub fn allocate(&mut self) -> AgentHandle {
        let id = match self.free.pop() {
            Some(id) => {
                let i = id.index();
                self.items[i] = T::default();
                self.valid[i] = true;
                // masks were cleared by free(); generation was bumped there too.
                debug_assert_eq!(self.masks[i], 0);
                id
            }
            None => {
                let id = AgentId(self.items.len() as u32);
                self.items.push(T::default());
                self.valid.push(true);
                self.masks.push(0);
                self.generation.push(0);
                id
            }
        };
        self.live += 1;
        AgentHandle {
            id,
            generation: self.generation[id.index()],
        }
    }

    /// Release a slot: marks it invalid, clears every mask bit, bumps the
    /// generation, and pushes the index onto the recycling stack.  The
    /// agent's own teardown must already have run.
    ///
    /// # Panics
    /// Panics if the slot is not valid — freeing twice is a programming
    /// error, not a runtime condition.
    pub fn free(&mut self, id: AgentId) {
        let i = id.index();
        assert!(
            i < self.valid.len() && self.valid[i],
            "free of invalid slot {id}"
        );
        self.valid[i] = false;
        self.masks[i] = 0;
        self.generation[i] = self.generation[i].wrapping_add(1);
        self.items[i] = T::default();
        self.free.push(id);
        self.live -= 1;
    }

    // ── Access ────────────────────────────────────────────────────────────

    /// `true` if `id` currently names a valid slot.
    #[inline]
    pub fn is_valid(&self, id: AgentId) -> bool {
        id.index() < self.valid.len() && self.valid[id.index()]
    }

    /// Shared access to a valid slot.
    pub fn get(&self, id: AgentId) -> EpiResult<&T> {
        if self.is_valid(id) {
            Ok(&self.items[id.index()])
        } else {
            Err(EpiError::AgentNotFound(id))
        }
    }

    /// Exclusive access to a valid slot.
    pub fn get_mut(&mut self, id: AgentId) -> EpiResult<&mut T> {
        if self.is_valid(id) {
            Ok(&mut self.items[id.index()])
        } else {
            Err(EpiError::AgentNotFound(id))
        }
    }

    /// Resolve a handle, additionally rejecting handles whose generation no
    /// longer matches the slot (use-after-free of a recycled index).
    pub fn resolve(&self, handle: AgentHandle) -> EpiResult<&T> {
        self.check_generation(handle)?;
        self.get(handle.id)
    }

    /// Like [`resolve`][Self::resolve] with exclusive access.
    pub fn resolve_mut(&mut self, handle: AgentHandle) -> EpiResult<&mut T> {
        self.check_generation(handle)?;
        self.get_mut(handle.id)
    }

    fn check_generation(&self, handle: AgentHandle) -> EpiResult<()> {
        let i = handle.id.index();
        if i < self.generation.len() && self.generation[i] != handle.generation {
            return Err(EpiError::StaleHandle {
                id: handle.id,
                held: handle.generation,
                current: self.generation[i],
            });
        }
        Ok(())
    }

    /// The generation currently recorded for a slot.
    pub fn generation(&self, id: AgentId) -> u32 {
        self.generation[id.index()]
    }

    /// Number of valid slots.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Total number of slots ever created, valid or not.  Index iteration
    /// bounds, not a population count.
    pub fn index_size(&self) -> usize {
        self.items.len()
    }

    // ── Masks ─────────────────────────────────────────────────────────────

    /// Set a mask bit on a valid slot.  Idempotent.
    ///
    /// # Panics
    /// Panics if the slot is invalid.
    pub fn set_mask(&mut self, mask: Mask, id: AgentId) {
        assert!(self.is_valid(id), "set_mask on invalid slot {id}");
        self.masks[id.index()] |= mask.bit();
    }

    /// Clear a mask bit on a valid slot.  Idempotent.
    ///
    /// # Panics
    /// Panics if the slot is invalid.
    pub fn clear_mask(&mut self, mask: Mask, id: AgentId) {
        assert!(self.is_valid(id), "clear_mask on invalid slot {id}");
        self.masks[id.index()] &= !mask.bit();
    }

    /// `true` if the slot is valid and carries the mask bit.
    pub fn has_mask(&self, mask: Mask, id: AgentId) -> bool {
        self.is_valid(id) && self.masks[id.index()] & mask.bit() != 0
    }

    /// Number of valid slots carrying the mask bit.
    pub fn mask_count(&self, mask: Mask) -> usize {
        let bit = mask.bit();
        self.masks
            .iter()
            .zip(&self.valid)
            .filter(|&(m, &v)| v && m & bit != 0)
            .count()
    }

    // ── Bulk passes ───────────────────────────────────────────────────────

    /// Invoke `f` once per valid slot, in ascending index order.
    pub fn apply(&mut self, mut f: impl FnMut(AgentId, &mut T)) {
        for (i, item) in self.items.iter_mut().enumerate() {
            if self.valid[i] {
                f(AgentId(i as u32), item);
            }
        }
    }

    /// Invoke `f` once per valid slot carrying `mask`, in ascending index
    /// order.
    pub fn masked_apply(&mut self, mask: Mask, mut f: impl FnMut(AgentId, &mut T)) {
        let bit = mask.bit();
        for (i, item) in self.items.iter_mut().enumerate() {
            if self.valid[i] && self.masks[i] & bit != 0 {
                f(AgentId(i as u32), item);
            }
        }
    }

    /// Clear `mask` on every slot that carries it but no longer satisfies
    /// `keep`.  Serial; used between passes to retire agents from an
    /// operation category.
    pub fn prune_mask(&mut self, mask: Mask, keep: impl Fn(AgentId, &T) -> bool) {
        let bit = mask.bit();
        for i in 0..self.items.len() {
            if self.valid[i] && self.masks[i] & bit != 0 && !keep(AgentId(i as u32), &self.items[i])
            {
                self.masks[i] &= !bit;
            }
        }
    }

    /// Like [`masked_apply`][Self::masked_apply], but partitions the index
    /// range across Rayon workers.  No ordering guarantee between agents.
    ///
    /// `f` must confine itself to the receiving agent's exclusive state plus
    /// internally-synchronised shared structures; the masked slot set is
    /// frozen for the duration of the pass (the `&mut self` borrow forbids
    /// allocate/free).
    ///
    /// Without the `parallel` Cargo feature this degrades to the serial
    /// masked pass.
    pub fn parallel_masked_apply(&mut self, mask: Mask, f: impl Fn(AgentId, &mut T) + Sync)
    where
        T: Send,
    {
        let bit = mask.bit();

        #[cfg(not(feature = "parallel"))]
        {
            for (i, item) in self.items.iter_mut().enumerate() {
                if self.valid[i] && self.masks[i] & bit != 0 {
                    f(AgentId(i as u32), item);
                }
            }
        }

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            self.items
                .par_iter_mut()
                .zip(self.valid.par_iter())
                .zip(self.masks.par_iter())
                .enumerate()
                .for_each(|(i, ((item, &valid), &mask_bits))| {
                    if valid && mask_bits & bit != 0 {
                        f(AgentId(i as u32), item);
                    }
                });
        }
    }
}
