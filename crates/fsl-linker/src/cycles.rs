//! Cycle detection over the unresolved part of the UDF dependency graph.
//!
//! A depth-first traversal runs from every unresolved function in
//! lexicographic order, following dependencies in the order they first
//! appear in each body. A dependency already on the path emits the path
//! suffix as a candidate cycle; candidates sharing a node are then fused
//! until fixpoint, yielding the strongly connected components. The
//! traversal and fuse orders are stable, and the member order of each
//! result is part of the linker's hash input.

use std::collections::{BTreeMap, BTreeSet};

use indexmap::IndexSet;

pub(crate) fn find_cycles(
    unlinked: &BTreeSet<String>,
    deps: &BTreeMap<String, IndexSet<String>>,
) -> Vec<Vec<String>> {
    let mut candidates: Vec<Vec<String>> = Vec::new();
    for start in unlinked {
        let mut path: Vec<&str> = Vec::new();
        let mut visited: BTreeSet<&str> = BTreeSet::new();
        visit(start, unlinked, deps, &mut path, &mut visited, &mut candidates);
    }
    merge_candidates(candidates)
}

fn visit<'a>(
    name: &'a str,
    unlinked: &'a BTreeSet<String>,
    deps: &'a BTreeMap<String, IndexSet<String>>,
    path: &mut Vec<&'a str>,
    visited: &mut BTreeSet<&'a str>,
    candidates: &mut Vec<Vec<String>>,
) {
    if let Some(position) = path.iter().position(|&on_path| on_path == name) {
        candidates.push(path[position..].iter().map(|s| s.to_string()).collect());
        return;
    }
    if !visited.insert(name) {
        return;
    }
    path.push(name);
    for dep in &deps[name] {
        if unlinked.contains(dep) {
            visit(dep, unlinked, deps, path, visited, candidates);
        }
    }
    path.pop();
}

/// Fuse any two candidates sharing a node: order of the first is kept, new
/// members append in the second's order. Repeats until no fuse applies.
fn merge_candidates(mut candidates: Vec<Vec<String>>) -> Vec<Vec<String>> {
    loop {
        let mut fused = false;
        'scan: for i in 0..candidates.len() {
            for j in i + 1..candidates.len() {
                if candidates[i].iter().any(|name| candidates[j].contains(name)) {
                    let second = candidates.remove(j);
                    for name in second {
                        if !candidates[i].contains(&name) {
                            candidates[i].push(name);
                        }
                    }
                    fused = true;
                    break 'scan;
                }
            }
        }
        if !fused {
            return candidates;
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn graph(edges: &[(&str, &[&str])]) -> (BTreeSet<String>, BTreeMap<String, IndexSet<String>>) {
        let unlinked = edges.iter().map(|(name, _)| name.to_string()).collect();
        let deps = edges
            .iter()
            .map(|(name, targets)| {
                (
                    name.to_string(),
                    targets.iter().map(|t| t.to_string()).collect(),
                )
            })
            .collect();
        (unlinked, deps)
    }

    #[test]
    fn two_cycle() {
        let (unlinked, deps) = graph(&[("f", &["g"]), ("g", &["f"])]);
        assert_eq!(
            vec![vec!["f".to_string(), "g".to_string()]],
            find_cycles(&unlinked, &deps),
        );
    }

    #[test]
    fn self_cycle() {
        let (unlinked, deps) = graph(&[("f", &["f"])]);
        assert_eq!(vec![vec!["f".to_string()]], find_cycles(&unlinked, &deps));
    }

    #[test]
    fn overlapping_cycles_fuse_into_one_component() {
        // a -> b -> a and b -> c -> b share b, so all three are one SCC.
        let (unlinked, deps) = graph(&[("a", &["b"]), ("b", &["a", "c"]), ("c", &["b"])]);
        let cycles = find_cycles(&unlinked, &deps);
        assert_eq!(1, cycles.len());
        assert_eq!(vec!["a", "b", "c"], cycles[0]);
    }

    #[test]
    fn disjoint_cycles_stay_separate() {
        let (unlinked, deps) = graph(&[
            ("a", &["b"]),
            ("b", &["a"]),
            ("c", &["d"]),
            ("d", &["c"]),
        ]);
        let cycles = find_cycles(&unlinked, &deps);
        assert_eq!(2, cycles.len());
        assert_eq!(vec!["a", "b"], cycles[0]);
        assert_eq!(vec!["c", "d"], cycles[1]);
    }

    #[test]
    fn order_is_deterministic_across_runs() {
        let (unlinked, deps) = graph(&[
            ("x", &["y", "z"]),
            ("y", &["x"]),
            ("z", &["x"]),
        ]);
        let first = find_cycles(&unlinked, &deps);
        let second = find_cycles(&unlinked, &deps);
        assert_eq!(first, second);
        assert_eq!(1, first.len());
        assert_eq!(vec!["x", "y", "z"], first[0]);
    }
}
