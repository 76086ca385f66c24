//! Groups: transient multi-selections of containers.
//!
//! A group does not own its members and is never part of the tiling structure. Members are
//! plain keys; a member that leaves the arena simply stops resolving and is pruned lazily.

use tracing::trace;

use super::container::{Container, ContainerKey, ContainerMap};
use super::Options;
use crate::geometry::Rectangle;

#[derive(Debug, Default)]
pub struct ContainerGroupContainer {
    members: Vec<ContainerKey>,
}

impl ContainerGroupContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Member keys as stored, including ones that may no longer resolve.
    pub fn members(&self) -> &[ContainerKey] {
        &self.members
    }

    pub fn contains(&self, key: ContainerKey) -> bool {
        self.members.contains(&key)
    }

    pub(crate) fn add(&mut self, key: ContainerKey) -> bool {
        if self.contains(key) {
            return false;
        }
        self.members.push(key);
        true
    }

    pub(crate) fn remove(&mut self, key: ContainerKey) -> bool {
        let len = self.members.len();
        self.members.retain(|member| *member != key);
        self.members.len() != len
    }
}

impl<W> ContainerMap<W> {
    pub(crate) fn new_group(&mut self) -> ContainerKey {
        self.insert(Container::Group(ContainerGroupContainer::new()))
    }

    /// Adds `member` to `group`. Groups cannot contain groups.
    pub(crate) fn group_add(&mut self, group: ContainerKey, member: ContainerKey) -> bool {
        match self.get(member) {
            Some(Container::Leaf(_) | Container::Parent(_) | Container::Floating(_)) => (),
            Some(Container::Group(_)) | None => return false,
        }

        self.group_mut(group).is_some_and(|group| group.add(member))
    }

    /// Members of `group` that still exist.
    pub fn group_members(&self, group: ContainerKey) -> Vec<ContainerKey> {
        let Some(group) = self.group(group) else {
            return Vec::new();
        };
        group
            .members
            .iter()
            .copied()
            .filter(|member| self.contains(*member))
            .collect()
    }

    /// Forgets members that no longer exist.
    pub(crate) fn prune_group(&mut self, group: ContainerKey) {
        let live = self.group_members(group);
        if let Some(group) = self.group_mut(group) {
            if group.members.len() != live.len() {
                trace!("pruning {} dead group members", group.members.len() - live.len());
            }
            group.members = live;
        }
    }

    /// Bounding box of the live members.
    pub(super) fn group_area(&self, group: ContainerKey, options: &Options) -> Rectangle {
        self.group_members(group)
            .into_iter()
            .map(|member| self.logical_area(member, options))
            .reduce(Rectangle::merge)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Point, Size};
    use crate::layout::{LayoutScheme, LeafContainer};

    type Map = ContainerMap<u32>;

    fn rect(x: i32, y: i32, w: i32, h: i32) -> Rectangle {
        Rectangle::new(Point::from((x, y)), Size::from((w, h)))
    }

    #[test]
    fn members_are_unique_and_never_groups() {
        let mut map = Map::new();
        let group = map.new_group();
        let other = map.new_group();
        let leaf = map.insert(Container::Leaf(LeafContainer::new(rect(0, 0, 10, 10), None)));

        assert!(map.group_add(group, leaf));
        assert!(!map.group_add(group, leaf));
        assert!(!map.group_add(group, other));
        assert!(!map.group_add(group, group));
        assert_eq!(map.group_members(group), [leaf]);

        assert!(map.group_mut(group).unwrap().remove(leaf));
        assert!(!map.group_mut(group).unwrap().remove(leaf));
        assert!(map.group_members(group).is_empty());
    }

    #[test]
    fn destroyed_members_stop_resolving() {
        let mut map = Map::new();
        let group = map.new_group();
        let a = map.insert(Container::Leaf(LeafContainer::new(rect(0, 0, 100, 100), None)));
        let b = map.insert(Container::Leaf(LeafContainer::new(rect(100, 50, 100, 100), None)));
        map.group_add(group, a);
        map.group_add(group, b);

        assert_eq!(map.group_area(group, &Options::default()), rect(0, 0, 200, 150));

        map.destroy(b);
        assert_eq!(map.group_members(group), [a]);
        assert_eq!(map.group(group).unwrap().members().len(), 2);
        assert_eq!(map.group_area(group, &Options::default()), rect(0, 0, 100, 100));

        map.prune_group(group);
        assert_eq!(map.group(group).unwrap().members(), [a]);
    }

    #[test]
    fn lanes_can_be_members() {
        let mut map = Map::new();
        let group = map.new_group();
        let lane = map.new_lane(rect(0, 0, 10, 10), LayoutScheme::Vertical, None);
        assert!(map.group_add(group, lane));
        assert!(!map.is_focused(lane, Some(group)));
    }
}
