//! Integration tests: hit testing and export over a zoomed, annotated scene
//! (annota-render).

use annota_core::viewport::{wheel_zoom, zoom_layers};
use annota_core::*;
use annota_render::{ExportFormat, export_stage, hit_test, render_region};
use image::Rgba;
use pretty_assertions::assert_eq;
use std::sync::Arc;

const GREY: Rgba<u8> = Rgba([128, 128, 128, 255]);

/// 400×200 image fitted into a 200×100 container (ratio 2).
fn scene() -> Scene {
    let bitmap = RgbaImage::from_pixel(400, 200, GREY);
    let fit = fit_to_container(200.0, 100.0, 400, 200).unwrap();
    Scene::fitted(
        Arc::new(bitmap),
        200.0,
        100.0,
        fit.canvas_width,
        fit.canvas_height,
        fit.pixel_ratio,
    )
}

fn box_at(id: &str, x: f64, y: f64, fill: Color) -> Node {
    Node::new(
        NodeId::intern(id),
        NodeKind::Rect {
            width: 10.0,
            height: 10.0,
        },
    )
    .with_name("rect")
    .with_style(Style::filled(fill))
    .with_transform(Transform::at(x, y))
}

#[test]
fn export_contains_annotations_at_native_scale() {
    let mut scene = scene();
    scene
        .draw_layer
        .add(box_at("cx_green", 50.0, 50.0, Color::rgba(0, 255, 0, 255)));

    let out = export_stage(&scene, ExportFormat::Png).unwrap();
    assert_eq!((out.width, out.height), (400, 200));

    let decoded = image::load_from_memory(&out.bytes).unwrap().to_rgba8();
    assert_eq!(*decoded.get_pixel(110, 110), Rgba([0, 255, 0, 255]));
    assert_eq!(*decoded.get_pixel(10, 10), GREY);
}

#[test]
fn hits_and_pixels_agree_after_stage_zoom() {
    let mut scene = scene();
    scene
        .draw_layer
        .add(box_at("cx_zoomed", 20.0, 20.0, Color::rgba(255, 0, 0, 255)));

    let step = WheelStep {
        delta_y: 1.0,
        ctrl_key: false,
    };
    for _ in 0..4 {
        wheel_zoom(
            &mut scene.stage.transform,
            Some(Point::new(0.0, 0.0)),
            step,
            0.25,
            true,
        );
    }
    let s = scene.stage.scale();
    let spot = Point::new(25.0 * s, 25.0 * s);

    assert_eq!(
        hit_test(&scene, spot).node_id(),
        Some(NodeId::intern("cx_zoomed"))
    );
    let pixel = render_region(&scene, Rect::from_origin_size(spot, (1.0, 1.0)), 1.0);
    assert_eq!(*pixel.get_pixel(0, 0), Rgba([255, 0, 0, 255]));
}

#[test]
fn layer_zoom_moves_annotations_with_the_image() {
    let mut scene = scene();
    scene
        .draw_layer
        .add(box_at("cx_layers", 90.0, 40.0, Color::rgba(0, 0, 255, 255)));

    zoom_layers(&mut scene, 2.0);
    // Stage centre (100, 50) is the pivot; the box now spans [80, 100]×[30, 50].
    assert_eq!(
        hit_test(&scene, Point::new(85.0, 35.0)).node_id(),
        Some(NodeId::intern("cx_layers"))
    );
    assert_eq!(hit_test(&scene, Point::new(70.0, 35.0)), HitTarget::Image);
    assert!((scene.image_layer.transform.scale_x - 2.0).abs() < 1e-12);
    assert_eq!(scene.draw_layer.transform, scene.image_layer.transform);
}
