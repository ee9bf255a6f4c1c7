//! The append-only list of loaded slots.

use cgmath::Vector3;

use crate::{
    camera::{Camera, Projection},
    config::TiltConfig,
    data_structures::{
        instance::Instance,
        scene_graph::{ContainerNode, SceneNode},
    },
    showcase::{
        animator::{self, Tilt},
        cursor::Cursor,
        layout::slot_position_x,
        viewport::Viewport,
    },
};

/// One loaded asset and the state the animator keeps for it.
#[derive(Debug)]
pub struct Slot<T> {
    /// Position of the asset in the requested list.
    pub request_index: usize,
    pub position_x: f32,
    pub tilt: Tilt,
    pub content: T,
}

/// Slots in completion order.
///
/// Slots are only ever pushed. Their x position depends on the request index,
/// never on when they arrived.
#[derive(Debug)]
pub struct Gallery<T> {
    slots: Vec<Slot<T>>,
    requested: usize,
    spacing: f32,
    gap: usize,
}

impl<T> Gallery<T> {
    pub fn new(requested: usize, spacing: f32, gap: usize) -> Self {
        Self {
            slots: Vec::with_capacity(requested),
            requested,
            spacing,
            gap,
        }
    }

    /// Append a finished load and return the slot.
    pub fn push(&mut self, request_index: usize, content: T) -> &mut Slot<T> {
        let position_x = slot_position_x(request_index, self.requested, self.spacing, self.gap);
        self.slots.push(Slot {
            request_index,
            position_x,
            tilt: Tilt::default(),
            content,
        });
        let last = self.slots.len() - 1;
        &mut self.slots[last]
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn requested(&self) -> usize {
        self.requested
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Slot<T>> {
        self.slots.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Slot<T>> {
        self.slots.iter_mut()
    }
}

impl Gallery<ContainerNode> {
    /// Append an empty positioning group standing on its slot.
    pub fn push_container(&mut self, request_index: usize) -> &mut Slot<ContainerNode> {
        let slot = self.push(request_index, ContainerNode::new(Instance::new()));
        slot.content
            .set_local_transform(Instance::from(Vector3::new(slot.position_x, 0.0, 0.0)));
        slot
    }

    /// Advance every slot by one frame.
    ///
    /// Each group is projected from its own local position, eases toward the
    /// cursor with the delay of its gallery position, and gets the resulting
    /// tilt as its rotation. World transforms are refreshed; uploading them is
    /// left to the caller.
    pub fn animate(
        &mut self,
        camera: &Camera,
        projection: &Projection,
        cursor: &Cursor,
        viewport: &Viewport,
        gains: &TiltConfig,
    ) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            let position = slot.content.get_local_transform().position;
            let ndc = camera.project(projection, position);
            let target = animator::target_for((ndc.x, ndc.y), cursor, viewport, gains);
            slot.tilt = animator::ease(slot.tilt, target, gains.delay(index));

            let (pitch, yaw) = (slot.tilt.pitch, slot.tilt.yaw);
            slot.content
                .set_local_transform_with(&mut |local| local.set_euler_xy(pitch, yaw));
            slot.content.update_world_transform_all();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn position_ignores_arrival_order() {
        let mut gallery = Gallery::new(4, 10.0, 1);
        for index in [3, 0, 2, 1] {
            gallery.push(index, ());
        }
        let positions: Vec<(usize, f32)> = gallery
            .iter()
            .map(|slot| (slot.request_index, slot.position_x))
            .collect();
        assert_eq!(
            positions,
            vec![(3, 20.0), (0, -20.0), (2, 10.0), (1, 0.0)]
        );
    }

    #[test]
    fn new_slots_start_untilted() {
        let mut gallery = Gallery::new(1, 10.0, 1);
        let slot = gallery.push(0, "chair");
        assert_eq!(slot.tilt, Tilt::default());
        assert_eq!(slot.content, "chair");
        assert_eq!(gallery.len(), 1);
    }

    #[test]
    fn containers_stand_on_their_slot() {
        let mut gallery = Gallery::new(3, 10.0, 1);
        let slot = gallery.push_container(2);
        assert_eq!(slot.content.get_local_transform().position, Vector3::new(15.0, 0.0, 0.0));
        assert!(slot.content.get_children().is_empty());
    }
}
