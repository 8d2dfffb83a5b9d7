//! Selection resolver (§4.5): propagates profile selects and benchmark
//! default-selected flags through the group tree into a flat selection map.

use std::collections::HashMap;

use crate::model::{Benchmark, Item, ItemId, Profile};

/// The authoritative, per-item effective selection for one policy (§3).
///
/// A flat mapping with insertion order preserved so iteration over the policy's
/// rules is deterministic; built once at policy construction and read-only after.
#[derive(Debug, Default, Clone)]
pub struct SelectionMap {
    order: Vec<ItemId>,
    effective: HashMap<ItemId, bool>,
}

impl SelectionMap {
    pub fn is_selected(&self, id: &ItemId) -> bool {
        self.effective.get(id).copied().unwrap_or(false)
    }

    /// Iterate in insertion (depth-first benchmark) order.
    pub fn iter(&self) -> impl Iterator<Item = (&ItemId, bool)> {
        self.order.iter().map(move |id| (id, self.effective[id]))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    fn upsert(&mut self, id: ItemId, value: bool) {
        match self.effective.get_mut(&id) {
            Some(existing) => *existing = value,
            None => {
                self.order.push(id.clone());
                self.effective.insert(id, value);
            }
        }
    }
}

/// Build the selection map for `benchmark` under `profile` (or the benchmark's own
/// defaults when `profile` is `None`).
pub fn resolve(benchmark: &Benchmark, profile: Option<&Profile>) -> SelectionMap {
    let mut map = SelectionMap::default();
    resolve_items(&benchmark.children, true, profile, &mut map);
    map
}

fn resolve_items(items: &[Item], ancestor_selected: bool, profile: Option<&Profile>, map: &mut SelectionMap) {
    for item in items {
        let id = item.id();
        // Values are parameters, not selectable tree nodes (§3).
        if matches!(item, Item::Value(_)) {
            continue;
        }
        let profile_override = profile.and_then(|p| p.select_for(id));
        let effective = ancestor_selected && profile_override.unwrap_or_else(|| item.default_selected());
        map.upsert(id.clone(), effective);

        if let Item::Group(group) = item {
            resolve_items(&group.children, effective, profile, map);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::*;
    use std::collections::HashMap as Map;

    fn benchmark_g1_r1(group_default: bool, rule_default: bool) -> Benchmark {
        let rule = Rule {
            id: ItemId::from("R1"),
            version: None,
            severity: Severity::Unknown,
            role: Role::Full,
            weight: 1.0,
            default_selected: rule_default,
            idents: vec![],
            fixes: vec![],
            platforms: vec![],
            checks: vec![],
            complex_checks: vec![],
        };
        let group = Group {
            id: ItemId::from("G1"),
            weight: 1.0,
            default_selected: group_default,
            platforms: vec![],
            children: vec![Item::Rule(rule)],
        };
        Benchmark::new("B", SchemaVersion::V1_2OrLater, vec![Item::Group(group)], Map::new(), None, None)
    }

    #[test]
    fn no_profile_uses_defaults() {
        let benchmark = benchmark_g1_r1(false, true);
        let map = resolve(&benchmark, None);
        assert!(!map.is_selected(&ItemId::from("R1")));
    }

    #[test]
    fn profile_select_on_group_propagates_to_rule() {
        let benchmark = benchmark_g1_r1(false, true);
        let profile = Profile {
            id: None,
            selects: vec![Select { item_id: ItemId::from("G1"), selected: true }],
            ..Default::default()
        };
        let map = resolve(&benchmark, Some(&profile));
        assert!(map.is_selected(&ItemId::from("R1")));
    }

    #[test]
    fn explicit_rule_select_overrides_default() {
        let benchmark = benchmark_g1_r1(true, false);
        let profile = Profile {
            id: None,
            selects: vec![Select { item_id: ItemId::from("R1"), selected: true }],
            ..Default::default()
        };
        let map = resolve(&benchmark, Some(&profile));
        assert!(map.is_selected(&ItemId::from("R1")));
    }

    #[test]
    fn group_deselect_overrides_rule_default_selected() {
        let benchmark = benchmark_g1_r1(true, true);
        let profile = Profile {
            id: None,
            selects: vec![Select { item_id: ItemId::from("G1"), selected: false }],
            ..Default::default()
        };
        let map = resolve(&benchmark, Some(&profile));
        assert!(!map.is_selected(&ItemId::from("R1")));
    }

    #[test]
    fn selection_map_preserves_insertion_order() {
        let benchmark = benchmark_g1_r1(true, true);
        let map = resolve(&benchmark, None);
        let ids: Vec<_> = map.iter().map(|(id, _)| id.clone()).collect();
        assert_eq!(ids, vec![ItemId::from("G1"), ItemId::from("R1")]);
    }
}
