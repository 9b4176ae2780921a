//! Per-operator timing collection.
//!
//! The profiler aggregates operator invocations into a tree keyed by
//! operator name per call depth, so `filter → equals → get_field` shows up
//! as one path regardless of how many objects were scanned. Fast-path
//! notes from the index lookups land here too.

use std::time::Duration;

use indexmap::IndexMap;

use common_display::{DisplayTree, TreeNode};

/// Accumulated statistics for one operator at one position in the tree.
#[derive(Debug, Clone, Default)]
pub struct OpStats {
    /// Number of invocations.
    pub calls: u64,
    /// Total time spent, children included.
    pub total: Duration,
    /// Slowest single invocation.
    pub max: Duration,
}

impl OpStats {
    fn record(&mut self, elapsed: Duration) {
        self.calls += 1;
        self.total += elapsed;
        self.max = self.max.max(elapsed);
    }

    /// Mean time per invocation.
    pub fn mean(&self) -> Duration {
        if self.calls == 0 {
            Duration::ZERO
        } else {
            self.total / u32::try_from(self.calls).unwrap_or(u32::MAX)
        }
    }
}

#[derive(Debug, Default)]
struct ProfileNode {
    stats: OpStats,
    children: IndexMap<String, ProfileNode>,
}

/// Hierarchical timing profiler for query evaluation.
#[derive(Debug)]
pub struct Profiler {
    enabled: bool,
    root: ProfileNode,
    stack: Vec<String>,
    notes: Vec<String>,
}

impl Profiler {
    /// Create a profiler; a disabled one records nothing.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            root: ProfileNode::default(),
            stack: Vec::new(),
            notes: Vec::new(),
        }
    }

    /// Whether timings are being collected.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Begin timing an operator invocation.
    pub fn enter(&mut self, name: &str) {
        if self.enabled {
            self.stack.push(name.to_string());
        }
    }

    /// Finish the innermost invocation.
    pub fn exit(&mut self, elapsed: Duration) {
        if !self.enabled {
            return;
        }
        let mut node = &mut self.root;
        for name in &self.stack {
            node = node.children.entry(name.clone()).or_default();
        }
        node.stats.record(elapsed);
        self.stack.pop();
    }

    /// Record a fast-path or rewrite note.
    pub fn note(&mut self, message: impl Into<String>) {
        if self.enabled {
            self.notes.push(message.into());
        }
    }

    /// Render the breakdown: call tree, per-operator totals, and notes.
    pub fn report(&self) -> String {
        let tree = RenderNode::from_profile("query", &self.root);
        let mut out = DisplayTree::new(&tree).to_string();

        let mut totals: IndexMap<String, OpStats> = IndexMap::new();
        collect_totals(&self.root, &mut totals);
        let mut rows: Vec<_> = totals.into_iter().collect();
        rows.sort_by(|a, b| b.1.total.cmp(&a.1.total));

        if !rows.is_empty() {
            out.push_str("\ntotals:\n");
            for (name, stats) in rows {
                out.push_str(&format!(
                    "  {name}: {} call(s), total {:?}, avg {:?}, max {:?}\n",
                    stats.calls,
                    stats.total,
                    stats.mean(),
                    stats.max
                ));
            }
        }

        for note in &self.notes {
            out.push_str(&format!("note: {note}\n"));
        }
        out
    }
}

fn collect_totals(node: &ProfileNode, totals: &mut IndexMap<String, OpStats>) {
    for (name, child) in &node.children {
        let entry = totals.entry(name.clone()).or_default();
        entry.calls += child.stats.calls;
        entry.total += child.stats.total;
        entry.max = entry.max.max(child.stats.max);
        collect_totals(child, totals);
    }
}

struct RenderNode {
    label: String,
    details: Option<String>,
    children: Vec<RenderNode>,
}

impl RenderNode {
    fn from_profile(label: &str, node: &ProfileNode) -> Self {
        Self {
            label: label.to_string(),
            details: (node.stats.calls > 0).then(|| {
                format!(
                    "{} call(s), total {:?}, avg {:?}",
                    node.stats.calls,
                    node.stats.total,
                    node.stats.mean()
                )
            }),
            children: node
                .children
                .iter()
                .map(|(name, child)| Self::from_profile(name, child))
                .collect(),
        }
    }
}

impl TreeNode for RenderNode {
    fn name(&self) -> String {
        self.label.clone()
    }

    fn children(&self) -> Vec<&dyn TreeNode> {
        self.children.iter().map(|c| c as &dyn TreeNode).collect()
    }

    fn details(&self) -> Option<String> {
        self.details.clone()
    }
}
