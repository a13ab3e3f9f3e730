//! Constructive solid geometry scene tree.
//!
//! A [`Node`] is an owned, acyclic tree of primitives and operations. Trees
//! are built bottom-up with the combinator methods and then handed to a
//! serializer; nothing mutates a node once it is part of a larger tree.
//!
//! ```rust
//! use activity_skyline::scene::{HAlign, Node};
//!
//! let plate = Node::cube(10.0, 5.0, 0.1).translate(1.0, 1.0, -0.01);
//! let label = Node::text("2024", 1.5, HAlign::Left)
//!     .linear_extrude(1.0)
//!     .rotate(75.0, 0.0, 0.0);
//!
//! let model = Node::union(vec![plate, label]).scale_uniform(2.0);
//! assert_eq!(model.primitive_count(), 2);
//! ```

use serde::{Deserialize, Serialize};

/// Horizontal alignment of a text primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HAlign {
    Left,
    Center,
    Right,
}

impl HAlign {
    pub fn as_str(&self) -> &'static str {
        match self {
            HAlign::Left => "left",
            HAlign::Center => "center",
            HAlign::Right => "right",
        }
    }
}

/// A node in the CSG tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Node {
    /// Axis-aligned box with one corner at the origin
    Cube { size: [f64; 3] },
    /// Flat 2D text outline in the XY plane
    Text {
        text: String,
        size: f64,
        halign: HAlign,
    },
    /// Extrude a 2D child along +Z
    LinearExtrude { height: f64, child: Box<Node> },
    Translate { offset: [f64; 3], child: Box<Node> },
    /// Rotation in degrees about X, then Y, then Z
    Rotate { angles: [f64; 3], child: Box<Node> },
    Scale { factors: [f64; 3], child: Box<Node> },
    /// Convex hull of all children
    Hull { children: Vec<Node> },
    /// Boolean union of all children
    Union { children: Vec<Node> },
}

impl Node {
    // =========================================================================
    // Primitives
    // =========================================================================

    pub fn cube(x: f64, y: f64, z: f64) -> Self {
        Node::Cube { size: [x, y, z] }
    }

    pub fn text(text: impl Into<String>, size: f64, halign: HAlign) -> Self {
        Node::Text {
            text: text.into(),
            size,
            halign,
        }
    }

    pub fn hull(children: Vec<Node>) -> Self {
        Node::Hull { children }
    }

    pub fn union(children: Vec<Node>) -> Self {
        Node::Union { children }
    }

    // =========================================================================
    // Transform combinators (consume self, wrap it in a new parent)
    // =========================================================================

    pub fn translate(self, x: f64, y: f64, z: f64) -> Self {
        Node::Translate {
            offset: [x, y, z],
            child: Box::new(self),
        }
    }

    pub fn rotate(self, x_deg: f64, y_deg: f64, z_deg: f64) -> Self {
        Node::Rotate {
            angles: [x_deg, y_deg, z_deg],
            child: Box::new(self),
        }
    }

    pub fn scale(self, x: f64, y: f64, z: f64) -> Self {
        Node::Scale {
            factors: [x, y, z],
            child: Box::new(self),
        }
    }

    pub fn scale_uniform(self, factor: f64) -> Self {
        self.scale(factor, factor, factor)
    }

    pub fn linear_extrude(self, height: f64) -> Self {
        Node::LinearExtrude {
            height,
            child: Box::new(self),
        }
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    /// Direct children of this node.
    pub fn children(&self) -> Vec<&Node> {
        match self {
            Node::Cube { .. } | Node::Text { .. } => Vec::new(),
            Node::LinearExtrude { child, .. }
            | Node::Translate { child, .. }
            | Node::Rotate { child, .. }
            | Node::Scale { child, .. } => vec![child.as_ref()],
            Node::Hull { children } | Node::Union { children } => children.iter().collect(),
        }
    }

    /// Visit every node depth-first, parents before children.
    pub fn walk<'a>(&'a self, visit: &mut impl FnMut(&'a Node)) {
        visit(self);
        for child in self.children() {
            child.walk(visit);
        }
    }

    /// Number of leaf primitives (cubes and texts) in the tree.
    pub fn primitive_count(&self) -> usize {
        let mut count = 0;
        self.walk(&mut |node| {
            if matches!(node, Node::Cube { .. } | Node::Text { .. }) {
                count += 1;
            }
        });
        count
    }

    /// Depth of the tree (a lone primitive has depth 1).
    pub fn depth(&self) -> usize {
        1 + self.children().iter().map(|c| c.depth()).max().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combinators_nest_outward() {
        let node = Node::text("hi", 1.5, HAlign::Right)
            .linear_extrude(1.0)
            .rotate(45.0, 0.0, 0.0)
            .translate(1.0, 2.0, 3.0);

        let Node::Translate { offset, child } = &node else {
            panic!("expected translate at the root");
        };
        assert_eq!(*offset, [1.0, 2.0, 3.0]);
        let Node::Rotate { angles, child } = child.as_ref() else {
            panic!("expected rotate under translate");
        };
        assert_eq!(*angles, [45.0, 0.0, 0.0]);
        assert!(matches!(child.as_ref(), Node::LinearExtrude { height, .. } if *height == 1.0));
        assert_eq!(node.depth(), 4);
    }

    #[test]
    fn test_walk_and_counts() {
        let tree = Node::union(vec![
            Node::hull(vec![Node::cube(1.0, 1.0, 0.1), Node::cube(2.0, 2.0, 0.1)]),
            Node::cube(1.0, 1.0, 5.0).translate(0.0, 0.0, 0.2),
            Node::text("x", 1.0, HAlign::Left).linear_extrude(1.0),
        ]);

        assert_eq!(tree.primitive_count(), 4);

        let mut ops = Vec::new();
        tree.walk(&mut |n| {
            ops.push(match n {
                Node::Union { .. } => "union",
                Node::Hull { .. } => "hull",
                Node::Cube { .. } => "cube",
                Node::Translate { .. } => "translate",
                Node::LinearExtrude { .. } => "linear_extrude",
                Node::Text { .. } => "text",
                _ => "other",
            })
        });
        assert_eq!(
            ops,
            vec![
                "union",
                "hull",
                "cube",
                "cube",
                "translate",
                "cube",
                "linear_extrude",
                "text"
            ]
        );
    }

    #[test]
    fn test_json_shape() {
        let node = Node::cube(1.0, 2.0, 3.0).scale_uniform(2.0);
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["op"], "scale");
        assert_eq!(json["factors"], serde_json::json!([2.0, 2.0, 2.0]));
        assert_eq!(json["child"]["op"], "cube");

        let back: Node = serde_json::from_value(json).unwrap();
        assert_eq!(back, node);
    }
}
