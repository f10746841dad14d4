//! Shared fixtures for the editor integration tests.
#![allow(dead_code)]

use annota_editor::annota_core::{
    EditorConfig, Node, NodeId, NodeKind, RgbaImage, Stage, ToolbarItemConfig, Transform,
};
use annota_editor::{DrawEventParams, Editor, EditorObserver, Plugin, PluginInfo, PluginParamValue};
use image::Rgba;
use std::cell::RefCell;
use std::rc::Rc;

pub type Log = Rc<RefCell<Vec<String>>>;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

pub fn entries(log: &Log) -> Vec<String> {
    log.borrow().clone()
}

/// Solid image, `w × h` native pixels.
pub fn image(w: u32, h: u32) -> RgbaImage {
    RgbaImage::from_pixel(w, h, Rgba([40, 80, 120, 255]))
}

/// Host plugin that writes `name:hook` for every call it receives.
pub struct Recorder {
    pub name: &'static str,
    pub selector: Option<&'static str>,
    pub one_shot: bool,
    /// Stamp a 20×20 node named after the selector when clicking empty space.
    pub stamps: bool,
    /// Rebuild the scene (same size) on pointer down.
    pub reloads_on_press: bool,
    pub log: Log,
}

impl Recorder {
    pub fn new(name: &'static str, log: &Log) -> Self {
        Self {
            name,
            selector: None,
            one_shot: false,
            stamps: false,
            reloads_on_press: false,
            log: Rc::clone(log),
        }
    }

    pub fn owning(mut self, selector: &'static str) -> Self {
        self.selector = Some(selector);
        self
    }

    pub fn one_shot(mut self) -> Self {
        self.one_shot = true;
        self
    }

    pub fn stamping(mut self) -> Self {
        self.stamps = true;
        self
    }

    pub fn reloading(mut self) -> Self {
        self.reloads_on_press = true;
        self
    }

    pub fn boxed(self) -> Box<dyn Plugin> {
        Box::new(self)
    }

    fn note(&self, hook: &str) {
        self.log.borrow_mut().push(format!("{}:{hook}", self.name));
    }
}

impl Plugin for Recorder {
    fn name(&self) -> &str {
        self.name
    }

    fn shape_selector(&self) -> Option<&str> {
        self.selector
    }

    fn disappear_immediately(&self) -> bool {
        self.one_shot
    }

    fn on_enter(&mut self, _params: &mut DrawEventParams<'_>) {
        self.note("enter");
    }

    fn on_leave(&mut self, _params: &mut DrawEventParams<'_>) {
        self.note("leave");
    }

    fn on_click(&mut self, params: &mut DrawEventParams<'_>) {
        self.note("click");
        let on_node = params.target().and_then(|t| t.node_id()).is_some();
        if self.stamps
            && !on_node
            && let (Some(selector), Some(p)) = (self.selector, params.layer_pointer())
        {
            let node = Node::new(
                NodeId::fresh(selector),
                NodeKind::Rect {
                    width: 20.0,
                    height: 20.0,
                },
            )
            .with_name(selector)
            .with_transform(Transform::at(p.x, p.y));
            params.draw_layer_mut().add(node);
        }
    }

    fn on_draw_start(&mut self, params: &mut DrawEventParams<'_>) {
        self.note("draw_start");
        if self.reloads_on_press {
            let element = params.image_element();
            let bitmap = element.bitmap.clone();
            let (w, h) = (element.width as u32, element.height as u32);
            if let Err(e) = params.reload(bitmap, w, h) {
                panic!("reload failed: {e}");
            }
        }
    }

    fn on_draw(&mut self, _params: &mut DrawEventParams<'_>) {
        self.note("draw");
    }

    fn on_draw_end(&mut self, _params: &mut DrawEventParams<'_>) {
        self.note("draw_end");
    }
}

/// What the host shell was told.
#[derive(Debug, Default)]
pub struct Notes {
    pub stages: Vec<(f64, f64)>,
    pub toolbar: Vec<ToolbarItemConfig>,
    pub plugins: Vec<Option<String>>,
    pub params: Vec<PluginParamValue>,
}

pub struct Recording(pub Rc<RefCell<Notes>>);

impl EditorObserver for Recording {
    fn stage_changed(&mut self, stage: &Stage) {
        self.0.borrow_mut().stages.push((stage.width, stage.height));
    }

    fn toolbar_config_changed(&mut self, config: &ToolbarItemConfig) {
        self.0.borrow_mut().toolbar.push(config.clone());
    }

    fn plugin_changed(&mut self, current: Option<&PluginInfo>) {
        self.0
            .borrow_mut()
            .plugins
            .push(current.map(|p| p.name.clone()));
    }

    fn param_value_changed(&mut self, value: &PluginParamValue) {
        self.0.borrow_mut().params.push(value.clone());
    }
}

/// 1400×1000 image in the default 700×500 container (ratio 2).
pub fn mount(config: EditorConfig, host: Vec<Box<dyn Plugin>>) -> Editor {
    init_logger();
    Editor::mount(image(1400, 1000), config, host).unwrap()
}

pub fn mount_observed(
    config: EditorConfig,
    host: Vec<Box<dyn Plugin>>,
) -> (Editor, Rc<RefCell<Notes>>) {
    init_logger();
    let notes = Rc::new(RefCell::new(Notes::default()));
    let editor = Editor::mount_with(
        image(1400, 1000),
        config,
        host,
        Box::new(Recording(Rc::clone(&notes))),
    )
    .unwrap();
    (editor, notes)
}

/// Press, drag and release.
pub fn drag(editor: &mut Editor, from: (f64, f64), to: (f64, f64)) {
    use annota_editor::InputEvent;
    editor.dispatch(InputEvent::pointer_down(from.0, from.1));
    editor.dispatch(InputEvent::pointer_move(to.0, to.1));
    editor.dispatch(InputEvent::pointer_up(to.0, to.1));
}
