//! Annotation node model.
//!
//! Annotation nodes live in a [`Layer`]: a tree rooted in an invisible group,
//! where edges represent parent→child containment and sibling order is paint
//! order (first child is painted first, last child is topmost). Every node
//! carries a Konva-style local [`Transform`] so layers can be zoomed and
//! panned without touching node geometry.

use crate::id::NodeId;
use kurbo::{Affine, BezPath, Ellipse, Point, Rect, Shape};
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashMap;

// ─── Colors & Style ──────────────────────────────────────────────────────

/// 8-bit RGBA color (straight alpha).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
    pub const RED: Color = Color::rgba(0xF5, 0x22, 0x2D, 0xFF);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#RGB`, `#RRGGBB` or `#RRGGBBAA` (leading `#` optional).
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let b = hex.as_bytes();
        let pair = |i: usize| -> Option<u8> { Some(hex_val(b[i])? << 4 | hex_val(b[i + 1])?) };

        match b.len() {
            3 => Some(Self::rgba(
                hex_val(b[0])? * 17,
                hex_val(b[1])? * 17,
                hex_val(b[2])? * 17,
                255,
            )),
            6 => Some(Self::rgba(pair(0)?, pair(2)?, pair(4)?, 255)),
            8 => Some(Self::rgba(pair(0)?, pair(2)?, pair(4)?, pair(6)?)),
            _ => None,
        }
    }

    pub fn to_hex(&self) -> String {
        if self.a == 255 {
            format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
        } else {
            format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
        }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Stroke and fill of an annotation node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Style {
    pub stroke: Color,
    pub stroke_width: f64,
    pub fill: Option<Color>,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            stroke: Color::RED,
            stroke_width: 2.0,
            fill: None,
        }
    }
}

impl Style {
    pub fn stroked(stroke: Color, stroke_width: f64) -> Self {
        Self {
            stroke,
            stroke_width,
            fill: None,
        }
    }

    pub fn filled(fill: Color) -> Self {
        Self {
            stroke: Color::TRANSPARENT,
            stroke_width: 0.0,
            fill: Some(fill),
        }
    }
}

// ─── Transform ───────────────────────────────────────────────────────────

/// Position / scale / offset triple shared by stage, layers and nodes.
///
/// A local point `p` maps to the parent space as
/// `position + scale * (p - offset)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub x: f64,
    pub y: f64,
    pub scale_x: f64,
    pub scale_y: f64,
    pub offset_x: f64,
    pub offset_y: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        x: 0.0,
        y: 0.0,
        scale_x: 1.0,
        scale_y: 1.0,
        offset_x: 0.0,
        offset_y: 0.0,
    };

    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..Self::IDENTITY
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn set_position(&mut self, p: Point) {
        self.x = p.x;
        self.y = p.y;
    }

    pub fn set_scale(&mut self, s: f64) {
        self.scale_x = s;
        self.scale_y = s;
    }

    pub fn affine(&self) -> Affine {
        Affine::translate((self.x, self.y))
            * Affine::scale_non_uniform(self.scale_x, self.scale_y)
            * Affine::translate((-self.offset_x, -self.offset_y))
    }
}

// ─── Nodes ───────────────────────────────────────────────────────────────

/// Geometry of an annotation node, in node-local coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    /// Layer root. Never painted, never hit.
    Root,
    /// Pure container; only its children are painted.
    Group,
    Rect {
        width: f64,
        height: f64,
    },
    /// Ellipse centered on the local origin.
    Ellipse {
        rx: f64,
        ry: f64,
    },
    /// Polyline (pen strokes, arrows); `closed` turns it into a polygon.
    Line {
        points: Vec<(f64, f64)>,
        closed: bool,
    },
    Text {
        content: String,
        font_size: f64,
    },
}

/// A single drawable annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    /// Shape identity used by plugins to claim ownership (`"rect"`, `"text"`…).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(flatten)]
    pub kind: NodeKind,
    #[serde(default)]
    pub transform: Transform,
    #[serde(default)]
    pub style: Style,
    #[serde(default)]
    pub draggable: bool,
}

impl Node {
    pub fn new(id: NodeId, kind: NodeKind) -> Self {
        Self {
            id,
            name: None,
            kind,
            transform: Transform::IDENTITY,
            style: Style::default(),
            draggable: false,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn with_style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    /// Outline of the node in local coordinates, or `None` for nodes
    /// without geometry of their own (root, groups, text).
    pub fn outline(&self) -> Option<BezPath> {
        match &self.kind {
            NodeKind::Root | NodeKind::Group | NodeKind::Text { .. } => None,
            NodeKind::Rect { width, height } => {
                Some(Rect::new(0.0, 0.0, *width, *height).abs().to_path(0.1))
            }
            NodeKind::Ellipse { rx, ry } => {
                Some(Ellipse::new(Point::ZERO, (*rx, *ry), 0.0).to_path(0.1))
            }
            NodeKind::Line { points, closed } => {
                let mut path = BezPath::new();
                let mut iter = points.iter();
                let &(x0, y0) = iter.next()?;
                path.move_to((x0, y0));
                for &(x, y) in iter {
                    path.line_to((x, y));
                }
                if *closed {
                    path.close_path();
                }
                Some(path)
            }
        }
    }

    /// Whether the interior of the outline counts as part of the node.
    pub fn is_area(&self) -> bool {
        match &self.kind {
            NodeKind::Rect { .. } | NodeKind::Ellipse { .. } => true,
            NodeKind::Line { closed, .. } => *closed,
            _ => false,
        }
    }

    /// Local bounding box, including text boxes (approximated from the
    /// glyph count since glyph metrics belong to the rendering backend).
    pub fn local_bounds(&self) -> Option<Rect> {
        match &self.kind {
            NodeKind::Text { content, font_size } => {
                let chars = content.chars().count().max(1) as f64;
                Some(Rect::new(0.0, 0.0, chars * font_size * 0.6, font_size * 1.2))
            }
            _ => self.outline().map(|p| p.bounding_box()),
        }
    }

    /// Serialize the node into a history snapshot.
    pub fn snapshot(&self) -> Result<NodeSnapshot, String> {
        serde_json::to_value(self)
            .map(NodeSnapshot)
            .map_err(|e| format!("cannot snapshot node {}: {e}", self.id))
    }
}

/// Serialized copy of a node, as stored on the history stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeSnapshot(pub serde_json::Value);

impl NodeSnapshot {
    /// Id of the node this snapshot was taken from.
    pub fn node_id(&self) -> Option<NodeId> {
        self.0.get("id")?.as_str().map(NodeId::intern)
    }

    pub fn to_node(&self) -> Result<Node, String> {
        serde_json::from_value(self.0.clone()).map_err(|e| format!("invalid node snapshot: {e}"))
    }
}

// ─── Layer ───────────────────────────────────────────────────────────────

/// An independently transformable tree of annotation nodes.
#[derive(Debug, Clone)]
pub struct Layer {
    pub graph: StableDiGraph<Node, ()>,
    pub root: NodeIndex,
    pub id_index: HashMap<NodeId, NodeIndex>,
    /// Paint order of each parent's children. `StableDiGraph` recycles
    /// indices, so insertion order cannot be recovered from them.
    child_order: HashMap<NodeIndex, SmallVec<[NodeIndex; 8]>>,
    pub transform: Transform,
    pub draggable: bool,
}

impl Default for Layer {
    fn default() -> Self {
        Self::new()
    }
}

impl Layer {
    #[must_use]
    pub fn new() -> Self {
        let mut graph = StableDiGraph::new();
        let root_id = NodeId::intern("layer_root");
        let root = graph.add_node(Node::new(root_id, NodeKind::Root));
        let mut id_index = HashMap::new();
        id_index.insert(root_id, root);

        Self {
            graph,
            root,
            id_index,
            child_order: HashMap::new(),
            transform: Transform::IDENTITY,
            draggable: false,
        }
    }

    /// Append `node` as the topmost child of `parent`.
    pub fn add_node(&mut self, parent: NodeIndex, node: Node) -> NodeIndex {
        let id = node.id;
        let idx = self.graph.add_node(node);
        self.graph.add_edge(parent, idx, ());
        self.child_order.entry(parent).or_default().push(idx);
        self.id_index.insert(id, idx);
        idx
    }

    /// Append `node` on top of everything else in the layer.
    pub fn add(&mut self, node: Node) -> NodeIndex {
        self.add_node(self.root, node)
    }

    /// Remove a node and its whole subtree. Returns the removed node itself.
    pub fn remove(&mut self, id: NodeId) -> Option<Node> {
        let idx = self.index_of(id)?;
        if idx == self.root {
            return None;
        }
        if let Some(parent) = self.parent(idx)
            && let Some(order) = self.child_order.get_mut(&parent)
        {
            order.retain(|c| *c != idx);
        }
        self.remove_subtree(idx)
    }

    fn remove_subtree(&mut self, idx: NodeIndex) -> Option<Node> {
        for child in self.children(idx) {
            self.remove_subtree(child);
        }
        self.child_order.remove(&idx);
        let removed = self.graph.remove_node(idx);
        if let Some(node) = &removed {
            self.id_index.remove(&node.id);
        }
        removed
    }

    /// Drop every annotation, keeping the layer transform.
    pub fn clear(&mut self) {
        for child in self.children(self.root) {
            self.remove_subtree(child);
        }
        self.child_order.clear();
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.id_index.get(&id).map(|idx| &self.graph[*idx])
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.id_index
            .get(&id)
            .copied()
            .map(|idx| &mut self.graph[idx])
    }

    pub fn index_of(&self, id: NodeId) -> Option<NodeIndex> {
        self.id_index.get(&id).copied()
    }

    pub fn parent(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .neighbors_directed(idx, petgraph::Direction::Incoming)
            .next()
    }

    /// Children of `idx` in paint order.
    pub fn children(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        self.child_order
            .get(&idx)
            .map(|order| order.to_vec())
            .unwrap_or_default()
    }

    /// Number of annotation nodes (the root is not counted).
    pub fn len(&self) -> usize {
        self.graph.node_count() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every annotation node in paint order (depth-first, parents before
    /// their children).
    pub fn paint_order(&self) -> Vec<NodeIndex> {
        let mut out = Vec::with_capacity(self.len());
        self.collect_paint_order(self.root, &mut out);
        out
    }

    fn collect_paint_order(&self, idx: NodeIndex, out: &mut Vec<NodeIndex>) {
        for child in self.children(idx) {
            out.push(child);
            self.collect_paint_order(child, out);
        }
    }

    /// Ids of every node carrying the shape name `name`.
    pub fn find_by_name(&self, name: &str) -> Vec<NodeId> {
        self.paint_order()
            .into_iter()
            .map(|idx| &self.graph[idx])
            .filter(|n| n.name.as_deref() == Some(name))
            .map(|n| n.id)
            .collect()
    }

    /// Node-local → layer-local transform, composed through all ancestors.
    pub fn node_affine(&self, idx: NodeIndex) -> Affine {
        let mut affine = self.graph[idx].transform.affine();
        let mut current = idx;
        while let Some(parent) = self.parent(current) {
            if parent == self.root {
                break;
            }
            affine = self.graph[parent].transform.affine() * affine;
            current = parent;
        }
        affine
    }

    /// Move a node to the top of its siblings. Returns true if the order changed.
    pub fn move_to_top(&mut self, id: NodeId) -> bool {
        let Some(idx) = self.index_of(id) else {
            return false;
        };
        let Some(parent) = self.parent(idx) else {
            return false;
        };
        let Some(order) = self.child_order.get_mut(&parent) else {
            return false;
        };
        match order.iter().position(|c| *c == idx) {
            Some(pos) if pos + 1 < order.len() => {
                let child = order.remove(pos);
                order.push(child);
                true
            }
            _ => false,
        }
    }

    /// Move a node to the bottom of its siblings. Returns true if the order changed.
    pub fn move_to_bottom(&mut self, id: NodeId) -> bool {
        let Some(idx) = self.index_of(id) else {
            return false;
        };
        let Some(parent) = self.parent(idx) else {
            return false;
        };
        let Some(order) = self.child_order.get_mut(&parent) else {
            return false;
        };
        match order.iter().position(|c| *c == idx) {
            Some(pos) if pos > 0 => {
                let child = order.remove(pos);
                order.insert(0, child);
                true
            }
            _ => false,
        }
    }
}
