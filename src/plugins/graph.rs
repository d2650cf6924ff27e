//! Dependency resolution between plugins.
//!
//! Edges point from a plugin to the plugins it depends on. Failure is decided
//! per weakly connected component: a missing dependency or a cycle anywhere in
//! a component fails every plugin in it, while other components still load.

use std::collections::{HashMap, VecDeque};

use crate::application::errors::PluginError;
use crate::infrastructure::plugins::PluginManifest;

/// Outcome of resolving a set of manifests
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Loadable plugins, dependencies before dependents
    pub order: Vec<String>,
    /// Plugins that cannot load, with the reason
    pub failed: Vec<(String, PluginError)>,
}

impl Resolution {
    pub fn is_failed(&self, name: &str) -> bool {
        self.failed.iter().any(|(n, _)| n == name)
    }
}

/// Resolve the load order of `manifests`, which must have unique names.
///
/// Ties in the order are broken by position in `manifests`.
pub fn resolve(manifests: &[PluginManifest]) -> Resolution {
    let count = manifests.len();
    let index: HashMap<&str, usize> = manifests
        .iter()
        .enumerate()
        .map(|(i, m)| (m.name.as_str(), i))
        .collect();

    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); count];
    let mut in_degree = vec![0usize; count];
    let mut depends_on: Vec<Vec<usize>> = vec![Vec::new(); count];
    let mut neighbours: Vec<Vec<usize>> = vec![Vec::new(); count];
    let mut missing: Vec<Option<String>> = vec![None; count];

    for (i, manifest) in manifests.iter().enumerate() {
        let mut seen = Vec::new();
        for dependency in &manifest.dependencies {
            if seen.contains(&dependency) {
                continue;
            }
            seen.push(dependency);

            match index.get(dependency.as_str()) {
                Some(&d) => {
                    dependents[d].push(i);
                    in_degree[i] += 1;
                    depends_on[i].push(d);
                    neighbours[i].push(d);
                    neighbours[d].push(i);
                }
                None => {
                    missing[i].get_or_insert_with(|| dependency.clone());
                }
            }
        }
    }

    // Kahn's algorithm; whatever is left over sits on or behind a cycle
    let mut order = Vec::with_capacity(count);
    let mut queue: VecDeque<usize> = (0..count).filter(|&i| in_degree[i] == 0).collect();
    while let Some(node) = queue.pop_front() {
        order.push(node);
        for &dependent in &dependents[node] {
            in_degree[dependent] -= 1;
            if in_degree[dependent] == 0 {
                queue.push_back(dependent);
            }
        }
    }
    let mut sorted = vec![false; count];
    for &node in &order {
        sorted[node] = true;
    }

    // Left over nodes either sit on a cycle or only depend on one
    let on_cycle: Vec<bool> = (0..count)
        .map(|start| {
            if sorted[start] {
                return false;
            }
            let mut seen = vec![false; count];
            let mut stack = depends_on[start].clone();
            while let Some(node) = stack.pop() {
                if node == start {
                    return true;
                }
                if !sorted[node] && !seen[node] {
                    seen[node] = true;
                    stack.extend(&depends_on[node]);
                }
            }
            false
        })
        .collect();

    // Weakly connected components, numbered in discovery order
    let mut component = vec![usize::MAX; count];
    let mut components: Vec<Vec<usize>> = Vec::new();
    for start in 0..count {
        if component[start] != usize::MAX {
            continue;
        }
        let id = components.len();
        let mut members = Vec::new();
        let mut stack = vec![start];
        component[start] = id;
        while let Some(node) = stack.pop() {
            members.push(node);
            for &next in &neighbours[node] {
                if component[next] == usize::MAX {
                    component[next] = id;
                    stack.push(next);
                }
            }
        }
        members.sort_unstable();
        components.push(members);
    }

    let mut failed_component = vec![false; components.len()];
    let mut failed = Vec::new();
    for (id, members) in components.iter().enumerate() {
        let cyclic: Vec<&str> = members
            .iter()
            .filter(|&&m| on_cycle[m])
            .map(|&m| manifests[m].name.as_str())
            .collect();
        let broken = members.iter().find(|&&m| missing[m].is_some());

        let culprit = match (broken, cyclic.first()) {
            (Some(&m), _) => manifests[m].name.clone(),
            (None, Some(&name)) => name.to_string(),
            (None, None) => continue,
        };
        failed_component[id] = true;

        for &m in members {
            let name = manifests[m].name.clone();
            let error = if let Some(dependency) = &missing[m] {
                PluginError::MissingDependency {
                    plugin: name.clone(),
                    dependency: dependency.clone(),
                }
            } else if on_cycle[m] {
                PluginError::Cycle(cyclic.join(", "))
            } else {
                PluginError::DependencyGroup(culprit.clone())
            };
            failed.push((name, error));
        }
    }

    Resolution {
        order: order
            .into_iter()
            .filter(|&i| !failed_component[component[i]])
            .map(|i| manifests[i].name.clone())
            .collect(),
        failed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(name: &str, deps: &[&str]) -> PluginManifest {
        PluginManifest::new(name).with_dependencies(deps.iter().copied())
    }

    #[test]
    fn dependencies_come_first() {
        let resolution = resolve(&[
            manifest("app", &["db", "log"]),
            manifest("db", &["log"]),
            manifest("log", &[]),
        ]);
        assert_eq!(resolution.order, vec!["log", "db", "app"]);
        assert!(resolution.failed.is_empty());
    }

    #[test]
    fn independent_plugins_keep_discovery_order() {
        let resolution = resolve(&[manifest("b", &[]), manifest("a", &[]), manifest("c", &[])]);
        assert_eq!(resolution.order, vec!["b", "a", "c"]);
    }

    #[test]
    fn cycle_fails_its_component_only() {
        let resolution = resolve(&[
            manifest("a", &["b"]),
            manifest("b", &["a"]),
            manifest("c", &[]),
        ]);
        assert_eq!(resolution.order, vec!["c"]);
        assert!(resolution.is_failed("a"));
        assert!(resolution.is_failed("b"));
        assert!(!resolution.is_failed("c"));
        assert!(matches!(resolution.failed[0].1, PluginError::Cycle(_)));
    }

    #[test]
    fn plugins_attached_to_a_cycle_fail_too() {
        let resolution = resolve(&[
            manifest("base", &[]),
            manifest("a", &["b", "base"]),
            manifest("b", &["a"]),
            manifest("leaf", &["a"]),
        ]);
        assert!(resolution.order.is_empty());
        let reasons: HashMap<_, _> = resolution.failed.into_iter().collect();
        assert!(matches!(reasons["a"], PluginError::Cycle(_)));
        assert!(matches!(&reasons["b"], PluginError::Cycle(c) if c == "a, b"));
        assert!(matches!(&reasons["leaf"], PluginError::DependencyGroup(c) if c == "a"));
        assert!(matches!(&reasons["base"], PluginError::DependencyGroup(c) if c == "a"));
    }

    #[test]
    fn missing_dependency_fails_whole_component() {
        let resolution = resolve(&[
            manifest("core", &[]),
            manifest("weather", &["core", "http"]),
            manifest("other", &[]),
        ]);
        assert_eq!(resolution.order, vec!["other"]);
        let reasons: HashMap<_, _> = resolution.failed.into_iter().collect();
        assert_eq!(
            reasons["weather"],
            PluginError::MissingDependency {
                plugin: "weather".to_string(),
                dependency: "http".to_string()
            }
        );
        assert_eq!(reasons["core"], PluginError::DependencyGroup("weather".to_string()));
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let resolution = resolve(&[manifest("narcissus", &["narcissus"])]);
        assert!(resolution.order.is_empty());
        assert_eq!(resolution.failed[0].1, PluginError::Cycle("narcissus".to_string()));
    }
}
