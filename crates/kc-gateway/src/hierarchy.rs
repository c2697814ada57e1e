//! Group lookup and subgroup traversal.

use std::collections::HashMap;
use std::future::Future;
use std::str::FromStr;

use kc_admin_client::{ClientResult, GroupRepresentation};
use thiserror::Error;

/// Top-level groups indexed by name.
///
/// Built from a single listing. When several groups share a name the first
/// one listed wins.
#[derive(Debug, Clone, Default)]
pub struct GroupIndex {
    by_name: HashMap<String, GroupRepresentation>,
}

impl GroupIndex {
    /// Indexes a group listing.
    #[must_use]
    pub fn new(groups: Vec<GroupRepresentation>) -> Self {
        let mut by_name = HashMap::with_capacity(groups.len());
        for group in groups {
            by_name.entry(group.name.clone()).or_insert(group);
        }
        Self { by_name }
    }

    /// Looks up a group by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&GroupRepresentation> {
        self.by_name.get(name)
    }

    /// Returns the number of distinct names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Returns true if no groups were indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// How far below the starting groups a traversal descends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubgroupDepth {
    /// At most this many subgroup levels. `Levels(0)` returns only the
    /// starting groups.
    Levels(usize),
    /// The whole tree.
    Unbounded,
}

impl Default for SubgroupDepth {
    fn default() -> Self {
        Self::Levels(1)
    }
}

impl SubgroupDepth {
    fn allows(self, level: usize) -> bool {
        match self {
            Self::Levels(max) => level <= max,
            Self::Unbounded => true,
        }
    }
}

/// Error parsing a [`SubgroupDepth`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid subgroup depth '{0}': expected a number or 'all'")]
pub struct ParseDepthError(String);

impl FromStr for SubgroupDepth {
    type Err = ParseDepthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("all") || s.eq_ignore_ascii_case("unbounded") {
            return Ok(Self::Unbounded);
        }
        s.parse::<usize>()
            .map(Self::Levels)
            .map_err(|_| ParseDepthError(s.to_string()))
    }
}

impl std::fmt::Display for SubgroupDepth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Levels(n) => write!(f, "{n}"),
            Self::Unbounded => f.write_str("all"),
        }
    }
}

/// Walks the subgroups below `roots`, depth first.
///
/// Output is in preorder: each group is followed by its descendants before
/// its next sibling. `children` fetches the direct subgroups of a group id.
/// A group id is only visited again when reached at a shallower level than
/// before, so cyclic data terminates while a root that also appears below
/// another root still gets its own levels. Groups without an id are emitted
/// but not expanded.
pub async fn walk<F, Fut>(
    roots: Vec<GroupRepresentation>,
    depth: SubgroupDepth,
    mut children: F,
) -> ClientResult<Vec<GroupRepresentation>>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = ClientResult<Vec<GroupRepresentation>>>,
{
    let mut out = Vec::new();
    // Shallowest level each id has been visited at.
    let mut visited: HashMap<String, usize> = HashMap::new();
    let mut stack: Vec<(GroupRepresentation, usize)> =
        roots.into_iter().rev().map(|g| (g, 0)).collect();

    while let Some((group, level)) = stack.pop() {
        let id = group.id.clone();
        if let Some(id) = &id {
            if visited.get(id).is_some_and(|&seen| level >= seen) {
                continue;
            }
            visited.insert(id.clone(), level);
        }
        let leaf = group.sub_group_count == Some(0);
        out.push(group);

        let Some(id) = id else { continue };
        if leaf || !depth.allows(level + 1) {
            continue;
        }
        let subgroups = children(id).await?;
        stack.extend(subgroups.into_iter().rev().map(|g| (g, level + 1)));
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(id: &str) -> GroupRepresentation {
        GroupRepresentation {
            id: Some(id.to_string()),
            ..GroupRepresentation::named(id)
        }
    }

    /// Parent id -> children, served as the `children` callback.
    fn tree(edges: &[(&str, &[&str])]) -> HashMap<String, Vec<GroupRepresentation>> {
        edges
            .iter()
            .map(|(parent, kids)| {
                (
                    (*parent).to_string(),
                    kids.iter().map(|k| group(k)).collect(),
                )
            })
            .collect()
    }

    async fn run(
        edges: &HashMap<String, Vec<GroupRepresentation>>,
        roots: &[&str],
        depth: SubgroupDepth,
    ) -> Vec<String> {
        let roots = roots.iter().map(|r| group(r)).collect();
        let groups = walk(roots, depth, |id| {
            let kids = edges.get(&id).cloned().unwrap_or_default();
            async move { Ok(kids) }
        })
        .await
        .unwrap();
        groups.into_iter().map(|g| g.name).collect()
    }

    #[tokio::test]
    async fn default_depth_stops_after_one_level() {
        let edges = tree(&[("a", &["a1", "a2"]), ("a1", &["a1x"]), ("b", &["b1"])]);
        let names = run(&edges, &["a", "b"], SubgroupDepth::default()).await;
        assert_eq!(names, vec!["a", "a1", "a2", "b", "b1"]);
    }

    #[tokio::test]
    async fn unbounded_walks_full_tree_in_preorder() {
        let edges = tree(&[("a", &["a1", "a2"]), ("a1", &["a1x"]), ("a1x", &["deep"])]);
        let names = run(&edges, &["a"], SubgroupDepth::Unbounded).await;
        assert_eq!(names, vec!["a", "a1", "a1x", "deep", "a2"]);
    }

    #[tokio::test]
    async fn zero_levels_returns_roots() {
        let edges = tree(&[("a", &["a1"])]);
        let names = run(&edges, &["a"], SubgroupDepth::Levels(0)).await;
        assert_eq!(names, vec!["a"]);
    }

    #[tokio::test]
    async fn cycles_terminate() {
        let edges = tree(&[("a", &["b"]), ("b", &["a"])]);
        let names = run(&edges, &["a"], SubgroupDepth::Unbounded).await;
        assert_eq!(names, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn root_seen_below_another_root_is_expanded() {
        let edges = tree(&[("org", &["dept"]), ("dept", &["team"])]);
        let names = run(&edges, &["org", "dept"], SubgroupDepth::default()).await;
        assert_eq!(names, vec!["org", "dept", "dept", "team"]);
    }

    #[tokio::test]
    async fn shared_roots_listed_once() {
        let edges = tree(&[("a", &["x"])]);
        let names = run(&edges, &["a", "a"], SubgroupDepth::Unbounded).await;
        assert_eq!(names, vec!["a", "x"]);
    }

    #[test]
    fn index_keeps_first_duplicate() {
        let mut first = group("1");
        first.name = "team".to_string();
        let mut second = group("2");
        second.name = "team".to_string();

        let index = GroupIndex::new(vec![first, second]);
        assert_eq!(index.len(), 1);
        assert_eq!(index.get("team").unwrap().id.as_deref(), Some("1"));
        assert!(index.get("other").is_none());
    }

    #[test]
    fn parse_depth() {
        assert_eq!("all".parse(), Ok(SubgroupDepth::Unbounded));
        assert_eq!(" 3 ".parse(), Ok(SubgroupDepth::Levels(3)));
        assert!("deep".parse::<SubgroupDepth>().is_err());
        assert_eq!(SubgroupDepth::Unbounded.to_string(), "all");
    }
}
