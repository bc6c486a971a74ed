use std::collections::{BTreeMap, BTreeSet};

use model::GeometryStore;

/// Filter group that owns every line, keyed by each line's style tag.
pub const LINE_GROUP: &str = "Lines";

/// Filter group that owns every point of interest, keyed by category.
pub const POI_GROUP: &str = "Points of Interest";

/// Rendered state of a checkbox, for both leaves and groups.
///
/// `Partial` is functionally "at least one child visible"; only groups can
/// be partial, and only as a derived state — it is never stored.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CheckState {
    Checked,
    Unchecked,
    Partial,
}

/// A single (group, value) filter bound to the annotations bearing that pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterLeaf {
    checked: bool,
    entity_ids: BTreeSet<String>,
}

impl FilterLeaf {
    pub fn checked(&self) -> bool {
        self.checked
    }

    pub fn entity_ids(&self) -> impl Iterator<Item = &str> {
        self.entity_ids.iter().map(String::as_str)
    }
}

/// One level-one node of the filter tree: a named group of value leaves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterGroup {
    leaves: BTreeMap<String, FilterLeaf>,
}

impl FilterGroup {
    /// Tri-state derived by scanning the leaves, never cached.
    pub fn state(&self) -> CheckState {
        state_over(self.leaves.values().map(|leaf| leaf.checked))
    }

    pub fn leaves(&self) -> impl Iterator<Item = (&str, &FilterLeaf)> {
        self.leaves.iter().map(|(value, leaf)| (value.as_str(), leaf))
    }

    pub fn leaf(&self, value: &str) -> Option<&FilterLeaf> {
        self.leaves.get(value)
    }
}

/// Two-level hierarchical show/hide filter derived from the geometry store.
///
/// A pure derivation: rebuild with [`FilterTree::from_store`] whenever the
/// store's entity set changes. Groups and values iterate in lexicographic
/// order, so UI construction and export are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterTree {
    groups: BTreeMap<String, FilterGroup>,
}

impl FilterTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derives the tree from the current annotation set.
    ///
    /// Regions contribute a `(kind, value)` leaf, lines a
    /// `(Lines, style)` leaf, and points a `(Points of Interest, category)`
    /// leaf. Every leaf starts checked.
    pub fn from_store(store: &GeometryStore) -> Self {
        let mut tree = Self::new();
        for region in store.regions() {
            tree.bind(&region.kind, &region.value, &region.name);
        }
        for line in store.lines() {
            tree.bind(LINE_GROUP, &line.style, &line.name);
        }
        for point in store.points() {
            tree.bind(POI_GROUP, &point.category, &point.id);
        }
        tree
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn groups(&self) -> impl Iterator<Item = (&str, &FilterGroup)> {
        self.groups.iter().map(|(name, group)| (name.as_str(), group))
    }

    pub fn group(&self, name: &str) -> Option<&FilterGroup> {
        self.groups.get(name)
    }

    /// Tri-state of a group's checkbox, recomputed from its leaves.
    pub fn group_state(&self, name: &str) -> Option<CheckState> {
        self.groups.get(name).map(FilterGroup::state)
    }

    /// Tri-state of the master "Show All / Hide All" checkbox, recomputed
    /// over every leaf in the tree.
    pub fn master_state(&self) -> CheckState {
        state_over(
            self.groups
                .values()
                .flat_map(|g| g.leaves.values())
                .map(|leaf| leaf.checked),
        )
    }

    /// Sets a single leaf checkbox. The parent group's tri-state follows on
    /// the next read; siblings are never touched.
    ///
    /// Returns `true` if the leaf existed and changed.
    pub fn set_leaf(&mut self, group: &str, value: &str, checked: bool) -> bool {
        match self
            .groups
            .get_mut(group)
            .and_then(|g| g.leaves.get_mut(value))
        {
            Some(leaf) if leaf.checked != checked => {
                leaf.checked = checked;
                true
            }
            _ => false,
        }
    }

    /// Toggles a group checkbox: every leaf under it takes the given state,
    /// so the group's derived state becomes the matching pure state.
    pub fn set_group(&mut self, group: &str, checked: bool) -> bool {
        let Some(g) = self.groups.get_mut(group) else {
            return false;
        };
        let mut changed = false;
        for leaf in g.leaves.values_mut() {
            changed |= leaf.checked != checked;
            leaf.checked = checked;
        }
        changed
    }

    /// The master control: sets every leaf in the tree, forcing every group
    /// to the matching pure state. Partial never survives this.
    pub fn set_all(&mut self, checked: bool) {
        for group in self.groups.values_mut() {
            for leaf in group.leaves.values_mut() {
                leaf.checked = checked;
            }
        }
    }

    /// Visibility query for the rendering surface: an annotation is drawn
    /// iff its (group, value) leaf is checked. A pair the tree has no leaf
    /// for renders as visible (unfiltered default).
    pub fn is_checked(&self, group: &str, value: &str) -> bool {
        self.groups
            .get(group)
            .and_then(|g| g.leaves.get(value))
            .map(|leaf| leaf.checked)
            .unwrap_or(true)
    }

    /// Resolves an annotation id through the leaf that binds it.
    pub fn is_entity_visible(&self, id: &str) -> bool {
        for group in self.groups.values() {
            for leaf in group.leaves.values() {
                if leaf.entity_ids.contains(id) {
                    return leaf.checked;
                }
            }
        }
        true
    }

    fn bind(&mut self, group: &str, value: &str, id: &str) {
        let leaf = self
            .groups
            .entry(group.to_string())
            .or_default()
            .leaves
            .entry(value.to_string())
            .or_insert_with(|| FilterLeaf {
                checked: true,
                entity_ids: BTreeSet::new(),
            });
        leaf.entity_ids.insert(id.to_string());
    }
}

fn state_over(mut checks: impl Iterator<Item = bool>) -> CheckState {
    let Some(first) = checks.next() else {
        return CheckState::Checked;
    };
    if checks.all(|c| c == first) {
        if first {
            CheckState::Checked
        } else {
            CheckState::Unchecked
        }
    } else {
        CheckState::Partial
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::{Line, MapPoint, PointOfInterest, Region};
    use pretty_assertions::assert_eq;

    fn sample_store() -> GeometryStore {
        let mut store = GeometryStore::new();
        for (name, value) in [
            ("Avaria", "Kingdom"),
            ("Belmont", "Kingdom"),
            ("Cascara", "Empire"),
        ] {
            store
                .add_region(Region {
                    name: name.to_string(),
                    kind: "Political".to_string(),
                    value: value.to_string(),
                    vertices: vec![
                        MapPoint::new(0.0, 0.0),
                        MapPoint::new(4.0, 0.0),
                        MapPoint::new(2.0, 3.0),
                    ],
                })
                .unwrap();
        }
        store
            .add_line(Line {
                name: "King's Road".to_string(),
                style: "road".to_string(),
                vertices: vec![MapPoint::new(0.0, 0.0), MapPoint::new(9.0, 9.0)],
            })
            .unwrap();
        store
            .add_point(PointOfInterest {
                id: "castle".to_string(),
                name: "Castle".to_string(),
                category: "City".to_string(),
                summary: "Seat of the crown.".to_string(),
                description: None,
                position: MapPoint::new(2.0, 2.0),
            })
            .unwrap();
        store
    }

    #[test]
    fn derives_groups_and_values_from_store() {
        let tree = FilterTree::from_store(&sample_store());
        let groups: Vec<&str> = tree.groups().map(|(name, _)| name).collect();
        assert_eq!(groups, vec!["Lines", "Points of Interest", "Political"]);

        let political = tree.group("Political").unwrap();
        let values: Vec<&str> = political.leaves().map(|(value, _)| value).collect();
        assert_eq!(values, vec!["Empire", "Kingdom"]);

        let kingdom_ids: Vec<&str> = political
            .leaf("Kingdom")
            .unwrap()
            .entity_ids()
            .collect();
        assert_eq!(kingdom_ids, vec!["Avaria", "Belmont"]);
    }

    #[test]
    fn group_state_truth_table() {
        let mut tree = FilterTree::from_store(&sample_store());
        assert_eq!(tree.group_state("Political"), Some(CheckState::Checked));

        // One value off among two: partial, siblings untouched.
        assert!(tree.set_leaf("Political", "Kingdom", false));
        assert_eq!(tree.group_state("Political"), Some(CheckState::Partial));
        assert!(tree.is_checked("Political", "Empire"));

        assert!(tree.set_leaf("Political", "Empire", false));
        assert_eq!(tree.group_state("Political"), Some(CheckState::Unchecked));

        // Re-checking every child restores the pure checked state.
        tree.set_leaf("Political", "Kingdom", true);
        tree.set_leaf("Political", "Empire", true);
        assert_eq!(tree.group_state("Political"), Some(CheckState::Checked));
    }

    #[test]
    fn group_toggle_sets_every_leaf() {
        let mut tree = FilterTree::from_store(&sample_store());
        assert!(tree.set_group("Political", false));
        assert_eq!(tree.group_state("Political"), Some(CheckState::Unchecked));
        assert!(!tree.is_checked("Political", "Kingdom"));
        assert!(!tree.is_checked("Political", "Empire"));
        // Other groups are not affected.
        assert_eq!(tree.group_state(LINE_GROUP), Some(CheckState::Checked));

        assert!(tree.set_group("Political", true));
        assert_eq!(tree.group_state("Political"), Some(CheckState::Checked));
    }

    #[test]
    fn show_all_and_hide_all_bypass_partial() {
        let mut tree = FilterTree::from_store(&sample_store());
        tree.set_leaf("Political", "Kingdom", false);
        assert_eq!(tree.master_state(), CheckState::Partial);

        tree.set_all(true);
        assert_eq!(tree.master_state(), CheckState::Checked);
        for (name, group) in tree.groups() {
            assert_eq!(group.state(), CheckState::Checked, "group {name}");
        }

        tree.set_all(false);
        assert_eq!(tree.master_state(), CheckState::Unchecked);
        for (name, group) in tree.groups() {
            assert_eq!(group.state(), CheckState::Unchecked, "group {name}");
        }
    }

    #[test]
    fn entity_visibility_follows_its_leaf() {
        let mut tree = FilterTree::from_store(&sample_store());
        assert!(tree.is_entity_visible("Avaria"));
        tree.set_leaf("Political", "Kingdom", false);
        assert!(!tree.is_entity_visible("Avaria"));
        assert!(!tree.is_entity_visible("Belmont"));
        assert!(tree.is_entity_visible("Cascara"));
        // Ids the tree never saw render by default.
        assert!(tree.is_entity_visible("uncharted"));
    }

    #[test]
    fn rebuild_reflects_store_changes() {
        let mut store = sample_store();
        store.remove("Cascara");
        let tree = FilterTree::from_store(&store);
        assert!(tree.group("Political").unwrap().leaf("Empire").is_none());
    }

    #[test]
    fn unknown_targets_are_no_ops() {
        let mut tree = FilterTree::from_store(&sample_store());
        assert!(!tree.set_leaf("Political", "Duchy", true));
        assert!(!tree.set_group("Climate", false));
        assert!(tree.is_checked("Climate", "Arid"));
    }
}
