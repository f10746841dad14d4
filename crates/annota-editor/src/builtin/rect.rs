//! Rectangle annotations.

use crate::params::DrawEventParams;
use crate::plugin::{Plugin, PluginParamValue};
use annota_core::{
    Color, HistoryMessage, HitTarget, Node, NodeId, NodeKind, Point, Style, Transform,
};

pub const SHAPE_NAME: &str = "rect";

/// Smallest side, in layer units, a drawn rect must have to be kept.
const MIN_SIDE: f64 = 2.0;

/// Drag out a stroked rectangle. Clicking an existing rect selects it and
/// raises it to the top.
#[derive(Debug, Default)]
pub struct RectPlugin {
    /// Node being drawn and the layer point the drag started at.
    drawing: Option<(NodeId, Point)>,
    pub selected: Option<NodeId>,
}

impl RectPlugin {
    fn style(value: &PluginParamValue) -> Style {
        match value {
            PluginParamValue::Stroke { color, width } => Style::stroked(*color, *width),
            _ => Style::default(),
        }
    }

    fn abandon(&mut self, params: &mut DrawEventParams<'_>) {
        if let Some((id, _)) = self.drawing.take() {
            params.draw_layer_mut().remove(id);
        }
    }
}

impl Plugin for RectPlugin {
    fn name(&self) -> &str {
        "rect"
    }

    fn title(&self) -> Option<&str> {
        Some("Rectangle")
    }

    fn iconfont(&self) -> Option<&str> {
        Some("iconfont icon-rect")
    }

    fn default_param_value(&self) -> Option<PluginParamValue> {
        Some(PluginParamValue::Stroke {
            color: Color::RED,
            width: 2.0,
        })
    }

    fn shape_selector(&self) -> Option<&str> {
        Some(SHAPE_NAME)
    }

    fn on_click(&mut self, params: &mut DrawEventParams<'_>) {
        let Some(HitTarget::Node { id, name }) = params.target().cloned() else {
            self.selected = None;
            return;
        };
        if name.as_deref() == Some(SHAPE_NAME) && params.draw_layer_mut().move_to_top(id) {
            self.selected = Some(id);
        }
    }

    fn on_draw_start(&mut self, params: &mut DrawEventParams<'_>) {
        if params.target().and_then(HitTarget::shape_name) == Some(SHAPE_NAME) {
            // Pressing on an existing rect is a selection, not a new shape.
            return;
        }
        let Some(start) = params.layer_pointer() else {
            return;
        };
        self.abandon(params);

        let id = NodeId::fresh(SHAPE_NAME);
        let style = Self::style(params.param_value());
        let node = Node::new(
            id,
            NodeKind::Rect {
                width: 0.0,
                height: 0.0,
            },
        )
        .with_name(SHAPE_NAME)
        .with_style(style)
        .with_transform(Transform::at(start.x, start.y));
        params.draw_layer_mut().add(node);
        self.drawing = Some((id, start));
    }

    fn on_draw(&mut self, params: &mut DrawEventParams<'_>) {
        let Some((id, start)) = self.drawing else {
            return;
        };
        let Some(p) = params.layer_pointer() else {
            return;
        };
        let Some(node) = params.draw_layer_mut().get_mut(id) else {
            // Scene was rebuilt under us.
            self.drawing = None;
            return;
        };
        node.transform
            .set_position(Point::new(start.x.min(p.x), start.y.min(p.y)));
        node.kind = NodeKind::Rect {
            width: (p.x - start.x).abs(),
            height: (p.y - start.y).abs(),
        };
    }

    fn on_draw_end(&mut self, params: &mut DrawEventParams<'_>) {
        self.on_draw(params);
        let Some((id, _)) = self.drawing.take() else {
            return;
        };
        let Some(node) = params.draw_layer().get(id) else {
            return;
        };
        let big_enough = matches!(
            node.kind,
            NodeKind::Rect { width, height } if width >= MIN_SIDE && height >= MIN_SIDE
        );
        if !big_enough {
            params.draw_layer_mut().remove(id);
            return;
        }
        match node.snapshot() {
            Ok(snapshot) => params.publish(HistoryMessage::Push(snapshot)),
            Err(e) => log::warn!("rect {id} not recorded: {e}"),
        }
    }

    fn on_leave(&mut self, params: &mut DrawEventParams<'_>) {
        self.abandon(params);
        self.selected = None;
    }
}
