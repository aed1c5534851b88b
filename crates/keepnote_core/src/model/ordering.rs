//! Drag-and-drop reorder plan.
//!
//! Clients submit the visual order of the pinned and unpinned partitions as
//! two id lists. Position in a list is the new `order`; the list decides
//! `is_pinned`. When an id occurs more than once (within one list or across
//! both) the last occurrence wins, scanning `pinned_ids` before `other_ids`.

use crate::model::note::NoteId;
use std::collections::HashMap;

/// Target placement for one note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub note_id: NoteId,
    pub is_pinned: bool,
    pub order: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReorderPlan {
    placements: Vec<Placement>,
}

impl ReorderPlan {
    pub fn from_lists(pinned_ids: &[NoteId], other_ids: &[NoteId]) -> Self {
        let mut by_id: HashMap<NoteId, (bool, u32)> = HashMap::new();
        let tagged = pinned_ids
            .iter()
            .enumerate()
            .map(|(position, id)| (id, true, position))
            .chain(
                other_ids
                    .iter()
                    .enumerate()
                    .map(|(position, id)| (id, false, position)),
            );
        for (id, is_pinned, position) in tagged {
            let order = u32::try_from(position).unwrap_or(u32::MAX);
            by_id.insert(*id, (is_pinned, order));
        }

        let mut placements: Vec<Placement> = by_id
            .into_iter()
            .map(|(note_id, (is_pinned, order))| Placement {
                note_id,
                is_pinned,
                order,
            })
            .collect();
        placements.sort_by(|left, right| {
            right
                .is_pinned
                .cmp(&left.is_pinned)
                .then(left.order.cmp(&right.order))
        });

        Self { placements }
    }

    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::ReorderPlan;
    use uuid::Uuid;

    #[test]
    fn positions_become_orders_per_partition() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let plan = ReorderPlan::from_lists(&[b, a], &[c]);
        let placements = plan.placements();

        assert_eq!(placements.len(), 3);
        assert_eq!((placements[0].note_id, placements[0].order), (b, 0));
        assert!(placements[0].is_pinned);
        assert_eq!((placements[1].note_id, placements[1].order), (a, 1));
        assert_eq!((placements[2].note_id, placements[2].order), (c, 0));
        assert!(!placements[2].is_pinned);
    }

    #[test]
    fn last_occurrence_wins() {
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let plan = ReorderPlan::from_lists(&[a, b, a], &[]);
        let placed_a = plan
            .placements()
            .iter()
            .find(|placement| placement.note_id == a)
            .unwrap();
        assert_eq!(placed_a.order, 2);

        let across = ReorderPlan::from_lists(&[a], &[b, a]);
        let placed_a = across
            .placements()
            .iter()
            .find(|placement| placement.note_id == a)
            .unwrap();
        assert!(!placed_a.is_pinned);
        assert_eq!(placed_a.order, 1);
    }

    #[test]
    fn empty_lists_make_an_empty_plan() {
        assert!(ReorderPlan::from_lists(&[], &[]).is_empty());
    }
}
