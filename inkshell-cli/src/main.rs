use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use inkshell_core::handlers::{refresh_outline, DrawHandlers, OutlineRegistry, Trigger};
use inkshell_core::paint::{parse_channel_mask, BlendMode, Channel, FillColors, WeightsToColors};
use inkshell_core::render::{build_outline_buffers, BuildOptions, GeometrySource, NormalSampling, RecordingRenderer};
use inkshell_core::scene::{ModifierEvaluator, Object, Scene};
use inkshell_core::scene_doc::{self, LoadedScene};
use inkshell_core::VERSION;

#[derive(Parser, Debug)]
#[command(name = "inkshell", version = VERSION, about = "Silhouette outlines and vertex color tools")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SamplingArg {
    PerLoop,
    PerVertex,
}

impl From<SamplingArg> for NormalSampling {
    fn from(s: SamplingArg) -> Self {
        match s {
            SamplingArg::PerLoop => NormalSampling::PerLoop,
            SamplingArg::PerVertex => NormalSampling::PerVertex,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load and summarize a scene document
    Inspect { path: PathBuf },
    /// Build outline buffers for the active object
    Buffers {
        path: PathBuf,
        #[arg(long, value_enum)]
        sampling: Option<SamplingArg>,
        /// Use the stored mesh instead of the modifier-evaluated one
        #[arg(long)]
        raw: bool,
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Fire outline triggers and draw the registered callbacks into a recorder
    Draw {
        path: PathBuf,
        #[arg(long, default_value_t = 1)]
        triggers: u32,
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Copy vertex-group weights into a color channel
    PaintWeights {
        path: PathBuf,
        /// Defaults to the active object
        #[arg(long)]
        object: Option<String>,
        #[arg(long)]
        group: Option<String>,
        #[arg(long)]
        layer: Option<String>,
        #[arg(long)]
        channel: Option<Channel>,
        #[arg(long)]
        blend: Option<BlendMode>,
        /// Write the painted layer as JSON
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Fill color channels with constant values
    Fill {
        path: PathBuf,
        #[arg(long)]
        object: Option<String>,
        #[arg(long, value_parser = parse_color, default_value = "1,1,1,1")]
        color: [f32; 4],
        #[arg(long, value_parser = parse_channel_mask, default_value = "RGBA")]
        channels: [bool; 4],
        #[arg(long, default_value = "replace")]
        blend: BlendMode,
        #[arg(long)]
        layer: Option<String>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List Vulkan devices (requires --features vulkan)
    #[cfg(feature = "vulkan")]
    VkInfo,
    /// Draw the active object and its outline offscreen and write PNG
    #[cfg(feature = "vulkan")]
    VkRender {
        path: PathBuf,
        #[arg(long, default_value_t = 512)]
        width: u32,
        #[arg(long, default_value_t = 512)]
        height: u32,
        #[arg(long, default_value = "outline.png")]
        out: PathBuf,
    },
}

fn parse_color(s: &str) -> std::result::Result<[f32; 4], String> {
    let parts: Vec<f32> = s
        .split(',')
        .map(|p| p.trim().parse::<f32>().map_err(|e| format!("'{}': {}", p, e)))
        .collect::<std::result::Result<_, _>>()?;
    parts
        .try_into()
        .map_err(|v: Vec<f32>| format!("expected 4 components, got {}", v.len()))
}

fn target_object<'a>(scene: &'a mut Scene, name: Option<&str>) -> Result<&'a mut Object> {
    match name {
        Some(n) => Ok(scene.object_mut(n)?),
        None => scene.active_object_mut().ok_or_else(|| anyhow!("scene has no active object")),
    }
}

fn write_layer_json(object: &Object, layer: &str, out: &Path) -> Result<()> {
    let mesh = object.mesh_data()?;
    let data = &mesh
        .color_layer(layer)
        .ok_or_else(|| anyhow!("layer '{}' vanished", layer))?
        .data;
    let doc = serde_json::json!({ "object": object.name, "layer": layer, "data": data });
    std::fs::write(out, serde_json::to_string_pretty(&doc)?).with_context(|| format!("writing {}", out.display()))?;
    println!("Wrote {}", out.display());
    Ok(())
}

fn load(path: &Path) -> Result<LoadedScene> {
    let loaded = scene_doc::load_scene(path)?;
    log::debug!("{}: {} object(s), outline enabled={}", path.display(), loaded.scene.objects.len(), loaded.scene.outline.enabled);
    Ok(loaded)
}

fn run_triggers(loaded: &LoadedScene, count: u32, handlers: &mut DrawHandlers) -> Result<()> {
    let mut registry = OutlineRegistry::new();
    for i in 0..count {
        let trigger = if i % 2 == 0 { Trigger::DepsgraphUpdate } else { Trigger::FrameChange };
        refresh_outline(&loaded.scene, trigger, &mut registry, handlers, &ModifierEvaluator)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    match cli.cmd {
        Command::Inspect { path } => {
            let loaded = load(&path)?;
            let scene = &loaded.scene;
            println!("Scene {:?} (frame {})", scene.id, scene.frame);
            let o = &scene.outline;
            println!(
                "  outline: enabled={} width={:.2} color={:?} modifiers={} sampling={:?}",
                o.enabled, o.width, o.color, o.apply_modifiers, o.sampling
            );
            for (i, obj) in scene.objects.iter().enumerate() {
                let marker = if scene.active == Some(i) { "*" } else { " " };
                print!("{} {} [{}]", marker, obj.name, obj.kind.type_name());
                if let Ok(mesh) = obj.mesh_data() {
                    print!(" verts={} loops={} polys={}", mesh.vertex_count(), mesh.loop_count(), mesh.polygon_count());
                    let layers: Vec<&str> = mesh.color_layers.iter().map(|c| c.name.as_str()).collect();
                    if !layers.is_empty() { print!(" colors={:?}", layers); }
                }
                let groups: Vec<&str> = obj.vertex_groups.iter().map(|g| g.name.as_str()).collect();
                if !groups.is_empty() { print!(" groups={:?}", groups); }
                if !obj.modifiers.is_empty() { print!(" modifiers={}", obj.modifiers.len()); }
                println!();
            }
        }
        Command::Buffers { path, sampling, raw, json } => {
            let loaded = load(&path)?;
            let object = loaded.scene.active_object().ok_or_else(|| anyhow!("scene has no active object"))?;
            let mut options = BuildOptions::from(&loaded.scene.outline);
            if let Some(s) = sampling { options.sampling = s.into(); }
            if raw { options.source = GeometrySource::Raw; }
            let buffers = build_outline_buffers(object, &ModifierEvaluator, options)?;
            println!(
                "{}: {} vertices, {} triangles ({:?}, {:?})",
                object.name, buffers.vertex_count(), buffers.triangle_count(), options.sampling, options.source
            );
            if let Some(out) = json {
                std::fs::write(&out, serde_json::to_string_pretty(&buffers)?)?;
                println!("Wrote {}", out.display());
            }
        }
        Command::Draw { path, triggers, json } => {
            let loaded = load(&path)?;
            let mut handlers = DrawHandlers::new();
            run_triggers(&loaded, triggers, &mut handlers)?;
            let mut recorder = RecordingRenderer::new();
            let ran = handlers.draw_all(&mut recorder, &loaded.view)?;
            println!("{} trigger(s), {} callback(s) registered, {} drawn", triggers, handlers.len(), ran);
            for (i, call) in recorder.calls.iter().enumerate() {
                println!(
                    "  [{}] {:?} verts={} tris={} width={:.2} color={:?}",
                    i, call.state, call.vertex_count, call.triangle_count, call.width, call.color
                );
                if let Some(b) = call.bounds {
                    println!("      ndc min={:?} max={:?}", b.min, b.max);
                }
            }
            if let Some(out) = json {
                std::fs::write(&out, serde_json::to_string_pretty(&recorder)?)?;
                println!("Wrote {}", out.display());
            }
        }
        Command::PaintWeights { path, object, group, layer, channel, blend, out } => {
            let mut loaded = load(&path)?;
            let target = target_object(&mut loaded.scene, object.as_deref())?;
            let mut op = match WeightsToColors::invoke(target) {
                Ok(op) => op,
                // Explicit group and layer make the active ones irrelevant.
                Err(_) if group.is_some() && layer.is_some() => WeightsToColors {
                    group: String::new(),
                    layer: String::new(),
                    channel: Channel::R,
                    blend: BlendMode::Replace,
                },
                Err(e) => return Err(e.into()),
            };
            if let Some(g) = group { op.group = g; }
            if let Some(l) = layer { op.layer = l; }
            if let Some(c) = channel { op.channel = c; }
            if let Some(b) = blend { op.blend = b; }
            let n = op.execute(target)?;
            println!("Wrote {} loops into {}.{}", n, op.layer, op.channel);
            if let Some(out) = out {
                write_layer_json(target, &op.layer, &out)?;
            }
        }
        Command::Fill { path, object, color, channels, blend, layer, out } => {
            let mut loaded = load(&path)?;
            let target = target_object(&mut loaded.scene, object.as_deref())?;
            let op = FillColors { color, channels, blend, layer };
            let n = op.execute(target)?;
            println!("Filled {} loops", n);
            if let Some(out) = out {
                let layer = match &op.layer {
                    Some(l) => l.clone(),
                    None => target
                        .mesh_data()?
                        .active_color_layer()
                        .map(|c| c.name.clone())
                        .ok_or_else(|| anyhow!("no active color layer"))?,
                };
                write_layer_json(target, &layer, &out)?;
            }
        }
        #[cfg(feature = "vulkan")]
        Command::VkInfo => {
            let list = inkshell_core::render::vk::enumerate_devices()?;
            if list.is_empty() { println!("No Vulkan devices found"); }
            for (i, d) in list.iter().enumerate() { println!("[{}] {}", i, d); }
        }
        #[cfg(feature = "vulkan")]
        Command::VkRender { path, width, height, out } => {
            use inkshell_core::render::{render_solid, vk, CameraParams, OutlineUniforms, RenderContext};

            let loaded = load(&path)?;
            let camera = CameraParams { aspect: width as f32 / height.max(1) as f32, ..loaded.camera };
            let view = RenderContext::from_camera(&camera);

            let mut frame = vk::OffscreenFrame::new([1.0, 1.0, 1.0, 1.0]);
            // Host viewport draw of the object itself, then the outline callbacks on top.
            if let Some(object) = loaded.scene.active_object().filter(|o| o.is_mesh()) {
                let buffers = build_outline_buffers(object, &ModifierEvaluator, BuildOptions::from(&loaded.scene.outline))?;
                let uniforms = OutlineUniforms {
                    matrix_world: object.matrix_world,
                    perspective_matrix: view.perspective_matrix(),
                    width: 0.0,
                    color: [0.8, 0.8, 0.8, 1.0],
                };
                render_solid(&mut frame, &buffers, &uniforms)?;
            }
            let mut handlers = DrawHandlers::new();
            run_triggers(&loaded, 1, &mut handlers)?;
            handlers.draw_all(&mut frame, &view)?;

            let ctx = vk::VkContext::new("inkshell-render")?;
            println!("Rendering {} draw(s) on {}", frame.draw_count(), ctx.device_name());
            let pixels = frame.finish(&ctx, width, height)?;
            let img = image::RgbaImage::from_raw(width, height, pixels)
                .ok_or_else(|| anyhow!("Failed to create image from raw"))?;
            img.save(&out)?;
            println!("Wrote {}x{} image to {}", width, height, out.display());
        }
    }
    Ok(())
}
