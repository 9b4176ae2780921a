//! Tree display for hierarchical diagnostics.

use std::fmt;

/// A node in a display tree.
pub trait TreeNode {
    /// Display name of this node.
    fn name(&self) -> String;

    /// Child nodes, in display order.
    fn children(&self) -> Vec<&dyn TreeNode>;

    /// Additional details appended after the name.
    fn details(&self) -> Option<String> {
        None
    }
}

/// Helper for rendering tree structures with box-drawing connectors.
pub struct DisplayTree<'a> {
    root: &'a dyn TreeNode,
}

impl<'a> DisplayTree<'a> {
    /// Create a new display tree rooted at `root`.
    pub fn new(root: &'a dyn TreeNode) -> Self {
        Self { root }
    }

    fn fmt_node(
        &self,
        f: &mut fmt::Formatter<'_>,
        node: &dyn TreeNode,
        prefix: &str,
        is_last: bool,
    ) -> fmt::Result {
        let connector = if is_last { "└─ " } else { "├─ " };

        write!(f, "{prefix}{connector}{}", node.name())?;
        if let Some(details) = node.details() {
            write!(f, " ({details})")?;
        }
        writeln!(f)?;

        let children = node.children();
        let child_prefix = format!("{prefix}{}", if is_last { "   " } else { "│  " });

        for (i, child) in children.iter().enumerate() {
            self.fmt_node(f, *child, &child_prefix, i == children.len() - 1)?;
        }

        Ok(())
    }
}

impl fmt::Display for DisplayTree<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root.name())?;
        if let Some(details) = self.root.details() {
            write!(f, " ({details})")?;
        }
        writeln!(f)?;

        let children = self.root.children();
        for (i, child) in children.iter().enumerate() {
            self.fmt_node(f, *child, "", i == children.len() - 1)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestNode {
        name: String,
        details: Option<String>,
        children: Vec<TestNode>,
    }

    impl TreeNode for TestNode {
        fn name(&self) -> String {
            self.name.clone()
        }

        fn children(&self) -> Vec<&dyn TreeNode> {
            self.children.iter().map(|c| c as &dyn TreeNode).collect()
        }

        fn details(&self) -> Option<String> {
            self.details.clone()
        }
    }

    #[test]
    fn test_display_tree() {
        let tree = TestNode {
            name: "query".to_string(),
            details: None,
            children: vec![
                TestNode {
                    name: "filter".to_string(),
                    details: Some("3 calls".to_string()),
                    children: vec![TestNode {
                        name: "equals".to_string(),
                        details: None,
                        children: vec![],
                    }],
                },
                TestNode {
                    name: "count".to_string(),
                    details: None,
                    children: vec![],
                },
            ],
        };

        let rendered = DisplayTree::new(&tree).to_string();
        assert!(rendered.starts_with("query\n"));
        assert!(rendered.contains("├─ filter (3 calls)"));
        assert!(rendered.contains("│  └─ equals"));
        assert!(rendered.contains("└─ count"));
    }
}
