//! Unit tests for epi-agent.

use epi_core::{AgentId, EpiError};

use crate::{AgentArena, MaskLayout};

#[derive(Default, Debug, PartialEq)]
struct Record {
    value: u32,
}

fn layout() -> MaskLayout {
    MaskLayout::new(&["susceptible", "update-health", "travel"])
}

fn arena() -> AgentArena<Record> {
    AgentArena::new(layout())
}

#[cfg(test)]
mod allocation {
    use super::*;

    #[test]
    fn allocate_returns_default_constructed_slot() {
        let mut a = arena();
        let h = a.allocate();
        assert_eq!(h.id, AgentId(0));
        assert_eq!(*a.get(h.id).unwrap(), Record::default());
        assert_eq!(a.len(), 1);
        assert_eq!(a.index_size(), 1);
    }

    #[test]
    fn freed_index_is_recycled() {
        let mut a = arena();
        let h0 = a.allocate();
        let _h1 = a.allocate();
        a.get_mut(h0.id).unwrap().value = 99;
        a.free(h0.id);
        assert_eq!(a.len(), 1);

        let h2 = a.allocate();
        // Same index comes back, reset to defaults, with a new generation.
        assert_eq!(h2.id, h0.id);
        assert_ne!(h2.generation, h0.generation);
        assert_eq!(a.get(h2.id).unwrap().value, 0);
        assert_eq!(a.index_size(), 2);
    }

    #[test]
    fn get_on_freed_slot_is_not_found() {
        let mut a = arena();
        let h = a.allocate();
        a.free(h.id);
        assert!(matches!(a.get(h.id), Err(EpiError::AgentNotFound(_))));
        assert!(!a.is_valid(h.id));
    }

    #[test]
    fn get_out_of_range_is_not_found() {
        let a = arena();
        assert!(matches!(a.get(AgentId(5)), Err(EpiError::AgentNotFound(_))));
    }

    #[test]
    fn stale_handle_is_detected() {
        let mut a = arena();
        let h = a.allocate();
        a.free(h.id);
        let _reborn = a.allocate();
        // Slot is valid again, but the old handle must not resolve to it.
        assert!(a.is_valid(h.id));
        assert!(matches!(a.resolve(h), Err(EpiError::StaleHandle { .. })));
    }

    #[test]
    #[should_panic(expected = "free of invalid slot")]
    fn double_free_panics() {
        let mut a = arena();
        let h = a.allocate();
        a.free(h.id);
        a.free(h.id);
    }
}

#[cfg(test)]
mod masks {
    use super::*;

    #[test]
    fn layout_rejects_duplicates() {
        let result = std::panic::catch_unwind(|| MaskLayout::new(&["a", "a"]));
        assert!(result.is_err());
    }

    #[test]
    fn set_and_clear_are_idempotent() {
        let mut a = arena();
        let travel = a.layout().mask("travel").unwrap();
        let h = a.allocate();

        assert!(!a.has_mask(travel, h.id));
        a.set_mask(travel, h.id);
        a.set_mask(travel, h.id);
        assert!(a.has_mask(travel, h.id));
        assert_eq!(a.mask_count(travel), 1);

        a.clear_mask(travel, h.id);
        a.clear_mask(travel, h.id);
        assert!(!a.has_mask(travel, h.id));
    }

    #[test]
    fn free_clears_all_masks() {
        let mut a = arena();
        let travel = a.layout().mask("travel").unwrap();
        let health = a.layout().mask("update-health").unwrap();
        let h = a.allocate();
        a.set_mask(travel, h.id);
        a.set_mask(health, h.id);
        a.free(h.id);

        let reborn = a.allocate();
        assert_eq!(reborn.id, h.id);
        assert!(!a.has_mask(travel, reborn.id));
        assert!(!a.has_mask(health, reborn.id));
    }

    #[test]
    fn unknown_mask_name_is_none() {
        let a = arena();
        assert!(a.layout().mask("no-such-mask").is_none());
    }
}

#[cfg(test)]
mod passes {
    use super::*;

    #[test]
    fn apply_visits_only_valid_slots_in_index_order() {
        let mut a = arena();
        let h0 = a.allocate();
        let h1 = a.allocate();
        let h2 = a.allocate();
        a.free(h1.id);

        let mut seen = Vec::new();
        a.apply(|id, _| seen.push(id));
        assert_eq!(seen, vec![h0.id, h2.id]);
    }

    #[test]
    fn masked_apply_respects_mask() {
        let mut a = arena();
        let health = a.layout().mask("update-health").unwrap();
        let _h0 = a.allocate();
        let h1 = a.allocate();
        let h2 = a.allocate();
        a.set_mask(health, h1.id);
        a.set_mask(health, h2.id);

        a.masked_apply(health, |_, r| r.value += 1);
        assert_eq!(a.get(AgentId(0)).unwrap().value, 0);
        assert_eq!(a.get(h1.id).unwrap().value, 1);
        assert_eq!(a.get(h2.id).unwrap().value, 1);
    }

    #[test]
    fn parallel_masked_apply_matches_serial_semantics() {
        let mut a = arena();
        let health = a.layout().mask("update-health").unwrap();
        let mut masked = Vec::new();
        for i in 0..100u32 {
            let h = a.allocate();
            if i % 3 == 0 {
                a.set_mask(health, h.id);
                masked.push(h.id);
            }
        }

        a.parallel_masked_apply(health, |_, r| r.value = 7);

        for id in (0..100).map(AgentId) {
            let expected = if masked.contains(&id) { 7 } else { 0 };
            assert_eq!(a.get(id).unwrap().value, expected);
        }
    }

    #[test]
    fn prune_mask_retires_slots_that_no_longer_qualify() {
        let mut a = arena();
        let health = a.layout().mask("update-health").unwrap();
        let h0 = a.allocate();
        let h1 = a.allocate();
        a.set_mask(health, h0.id);
        a.set_mask(health, h1.id);
        a.get_mut(h1.id).unwrap().value = 1;

        a.prune_mask(health, |_, r| r.value > 0);
        assert!(!a.has_mask(health, h0.id));
        assert!(a.has_mask(health, h1.id));
    }
}
