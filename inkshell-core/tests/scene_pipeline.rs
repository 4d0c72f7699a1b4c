use std::path::Path;

use approx::assert_relative_eq;
use inkshell_core::handlers::{refresh_outline, DrawHandlers, OutlineRegistry, Trigger};
use inkshell_core::paint::{BlendMode, Channel, FillColors, WeightsToColors};
use inkshell_core::render::{RasterState, RecordingRenderer};
use inkshell_core::scene::ModifierEvaluator;
use inkshell_core::scene_doc::{self, LoadedScene};

const SCENE: &str = r#"
id: 7
active: Box
camera: { eye: [0, 0, 8], target: [0, 0, 0] }
outline:
  enabled: true
  width: 1.0
  color: [0.1, 0.1, 0.1, 1.0]
objects:
  - name: Lamp
    data: { type: light }
  - name: Box
    data: { type: cube, size: 2.0 }
    vertex_groups:
      - name: Mask
        weights: { 0: 1.0, 1: 0.25, 2: 0.5 }
    color_layers:
      - { name: Col, fill: [0.2, 0.4, 0.6, 0.8] }
"#;

fn load(yaml: &str) -> LoadedScene {
    scene_doc::load_from_yaml_str(yaml).unwrap().build(Path::new(".")).unwrap()
}

fn draw(loaded: &LoadedScene, triggers: u32) -> (DrawHandlers, RecordingRenderer) {
    let mut registry = OutlineRegistry::new();
    let mut handlers = DrawHandlers::new();
    for i in 0..triggers {
        let trigger = if i % 3 == 0 { Trigger::FrameChange } else { Trigger::DepsgraphUpdate };
        refresh_outline(&loaded.scene, trigger, &mut registry, &mut handlers, &ModifierEvaluator).unwrap();
    }
    let mut recorder = RecordingRenderer::new();
    handlers.draw_all(&mut recorder, &loaded.view).unwrap();
    (handlers, recorder)
}

#[test]
fn outline_draws_once_after_many_triggers() {
    let loaded = load(SCENE);
    let (handlers, recorder) = draw(&loaded, 9);
    assert_eq!(handlers.len(), 1);
    assert_eq!(recorder.calls.len(), 1);
    let call = &recorder.calls[0];
    assert_eq!(call.state, RasterState::OUTLINE);
    assert_eq!((call.vertex_count, call.triangle_count), (24, 12));
    assert_eq!(call.color, [0.1, 0.1, 0.1, 1.0]);
    let b = call.bounds.unwrap();
    assert!(b.min[0] < 0.0 && b.max[0] > 0.0);
    assert!(b.min[0] > -1.0 && b.max[0] < 1.0);
}

#[test]
fn wider_outline_covers_more_screen() {
    let thin = load(SCENE);
    let thick = load(&SCENE.replace("width: 1.0", "width: 5.0"));
    let extent = |l: &LoadedScene| {
        let b = draw(l, 1).1.calls[0].bounds.unwrap();
        b.max[0] - b.min[0]
    };
    assert!(extent(&thick) > extent(&thin));
}

#[test]
fn light_active_draws_nothing() {
    let loaded = load(&SCENE.replace("active: Box", "active: Lamp"));
    let (handlers, recorder) = draw(&loaded, 3);
    assert!(handlers.is_empty());
    assert!(recorder.calls.is_empty());
}

#[test]
fn weights_then_fill() {
    let mut loaded = load(SCENE);
    let object = loaded.scene.active_object_mut().unwrap();

    let mut op = WeightsToColors::invoke(object).unwrap();
    assert_eq!((op.group.as_str(), op.layer.as_str()), ("Mask", "Col"));
    op.channel = Channel::G;
    op.execute(object).unwrap();

    let mesh = object.mesh_data().unwrap();
    let layer = mesh.color_layer("Col").unwrap();
    for (l, color) in mesh.loops.iter().zip(&layer.data) {
        let expected = match l.vertex {
            0 => 1.0,
            1 => 0.25,
            2 => 0.5,
            _ => 0.0,
        };
        assert_relative_eq!(color[1], expected);
        assert_relative_eq!(color[0], 0.2);
    }

    let fill = FillColors { color: [0.5, 0.0, 0.0, 0.5], channels: [true, false, false, true], blend: BlendMode::Multiply, layer: None };
    fill.execute(object).unwrap();
    let layer = object.mesh_data().unwrap().color_layer("Col").unwrap();
    for color in &layer.data {
        assert_relative_eq!(color[0], 0.1);
        assert_relative_eq!(color[2], 0.6);
        assert_relative_eq!(color[3], 0.4);
    }
}

#[test]
fn obj_scene_resolves_next_to_document() {
    let dir = std::env::temp_dir().join(format!("inkshell-scene-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let obj = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nv 0 0 1\nf 1 2 3 4\nf 1 2 5\n";
    std::fs::write(dir.join("shape.obj"), obj).unwrap();
    let yaml = "active: Shape\noutline: { enabled: true, apply_modifiers: false }\nobjects:\n  - name: Shape\n    data: { type: obj, path: shape.obj }\n";
    std::fs::write(dir.join("scene.yaml"), yaml).unwrap();

    let loaded = scene_doc::load_scene(dir.join("scene.yaml")).unwrap();
    let (_, recorder) = draw(&loaded, 2);
    assert_eq!(recorder.calls.len(), 1);
    assert_eq!(recorder.calls[0].vertex_count, 7);
    assert_eq!(recorder.calls[0].triangle_count, 3);

    std::fs::remove_dir_all(&dir).ok();
}
