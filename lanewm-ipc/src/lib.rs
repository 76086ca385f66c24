//! Types describing a serialisable snapshot of a lanewm layout tree.
//!
//! The shape follows the i3 `get_tree` reply closely enough that existing i3 tooling can read
//! the container part of it. Producing and transporting the snapshot is up to the caller.

use serde::{Deserialize, Serialize};

/// Layout name of a lane, in its i3 spelling.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TreeLayout {
    /// Children arranged left to right.
    SplitH,
    /// Children arranged top to bottom.
    SplitV,
    /// Children stacked on top of each other, selected through tabs.
    Tabbed,
    /// Children stacked on top of each other, selected through title bars.
    Stacked,
}

/// Kind of node in the snapshot.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TreeNodeType {
    /// Lane or tiled window.
    Con,
    /// Floating window.
    FloatingCon,
}

/// Rectangle in logical coordinates.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TreeRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// One container in the layout tree.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LayoutTreeNode {
    /// Stable id of the container while it exists.
    pub id: u64,
    #[serde(rename = "type")]
    pub node_type: TreeNodeType,
    /// Layout of a lane, `None` for windows.
    pub layout: Option<TreeLayout>,
    /// Logical area of the container.
    pub rect: TreeRect,
    /// Area the window is actually shown in, after gaps and borders.
    pub window_rect: TreeRect,
    /// Share of the parent along the parent's main axis, between 0 and 1.
    pub percent: f64,
    pub focused: bool,
    /// 1 when the window is fullscreen, 0 otherwise.
    pub fullscreen_mode: u8,
    pub visible: bool,
    pub nodes: Vec<LayoutTreeNode>,
    /// Floating windows, only ever present on the root node.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub floating_nodes: Vec<LayoutTreeNode>,
}

impl LayoutTreeNode {
    /// Iterates over this node and all its descendants, depth first, tiled before floating.
    pub fn iter(&self) -> impl Iterator<Item = &LayoutTreeNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            stack.extend(node.floating_nodes.iter().rev());
            stack.extend(node.nodes.iter().rev());
            Some(node)
        })
    }

    /// Returns the focused node, if any.
    pub fn focused(&self) -> Option<&LayoutTreeNode> {
        self.iter().find(|node| node.focused)
    }
}

#[cfg(test)]
mod tests {
    use insta::assert_snapshot;

    use super::*;

    fn window(id: u64, x: i32, focused: bool) -> LayoutTreeNode {
        LayoutTreeNode {
            id,
            node_type: TreeNodeType::Con,
            layout: None,
            rect: TreeRect {
                x,
                y: 0,
                width: 640,
                height: 720,
            },
            window_rect: TreeRect {
                x,
                y: 0,
                width: 635,
                height: 720,
            },
            percent: 0.5,
            focused,
            fullscreen_mode: 0,
            visible: true,
            nodes: Vec::new(),
            floating_nodes: Vec::new(),
        }
    }

    fn lane() -> LayoutTreeNode {
        LayoutTreeNode {
            id: 1,
            node_type: TreeNodeType::Con,
            layout: Some(TreeLayout::SplitH),
            rect: TreeRect {
                x: 0,
                y: 0,
                width: 1280,
                height: 720,
            },
            window_rect: TreeRect {
                x: 0,
                y: 0,
                width: 1280,
                height: 720,
            },
            percent: 1.,
            focused: false,
            fullscreen_mode: 0,
            visible: true,
            nodes: vec![window(2, 0, false), window(3, 640, true)],
            floating_nodes: vec![LayoutTreeNode {
                node_type: TreeNodeType::FloatingCon,
                ..window(4, 100, false)
            }],
        }
    }

    #[test]
    fn layout_names_match_i3() {
        let names: Vec<_> = [
            TreeLayout::SplitH,
            TreeLayout::SplitV,
            TreeLayout::Tabbed,
            TreeLayout::Stacked,
        ]
        .iter()
        .map(|layout| serde_json::to_string(layout).unwrap())
        .collect();
        assert_eq!(names, [r#""splith""#, r#""splitv""#, r#""tabbed""#, r#""stacked""#]);
    }

    #[test]
    fn serialize_window_node() {
        let json = serde_json::to_string(&window(7, 0, true)).unwrap();
        assert_snapshot!(json, @r#"{"id":7,"type":"con","layout":null,"rect":{"x":0,"y":0,"width":640,"height":720},"window_rect":{"x":0,"y":0,"width":635,"height":720},"percent":0.5,"focused":true,"fullscreen_mode":0,"visible":true,"nodes":[]}"#);
    }

    #[test]
    fn parse_back_tree() {
        let tree = lane();
        let json = serde_json::to_string(&tree).unwrap();
        let parsed: LayoutTreeNode = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, tree);
    }

    #[test]
    fn iter_is_depth_first() {
        let tree = lane();
        let ids: Vec<_> = tree.iter().map(|node| node.id).collect();
        assert_eq!(ids, [1, 2, 3, 4]);
        assert_eq!(tree.focused().map(|node| node.id), Some(3));
    }
}
