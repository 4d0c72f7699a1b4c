//! Minimal Vulkan setup using Ash (feature-gated).
//! Creates instance, picks a physical device, and creates a logical device
//! with a graphics queue. [`OffscreenFrame`] replays outline/solid draws into
//! an RGBA8 image with dynamic rendering.

use std::collections::HashMap;
use std::ffi::{CStr, CString};

use anyhow::{anyhow, Result};
use ash::vk;
use bytemuck::{Pod, Zeroable};

use super::outline::{OutlineBuffers, OutlineUniforms, OutlineVertex};
use super::pass::{CullFace, ImmediateRenderer, RasterState};

pub struct VkContext {
    pub entry: ash::Entry,
    pub instance: ash::Instance,
    pub pdevice: vk::PhysicalDevice,
    pub device: ash::Device,
    pub graphics_queue: vk::Queue,
    pub graphics_queue_family: u32,
}

fn create_instance(entry: &ash::Entry, app_name: &str) -> Result<ash::Instance> {
    let app_name_c = CString::new(app_name)?;
    let engine_name_c = CString::new("inkshell-core")?;
    let app_info = vk::ApplicationInfo::builder()
        .application_name(&app_name_c)
        .application_version(vk::make_api_version(0, 0, 1, 0))
        .engine_name(&engine_name_c)
        .engine_version(vk::make_api_version(0, 0, 1, 0))
        .api_version(vk::API_VERSION_1_3);
    let instance_ci = vk::InstanceCreateInfo::builder().application_info(&app_info);
    Ok(unsafe { entry.create_instance(&instance_ci, None)? })
}

impl VkContext {
    pub fn new(app_name: &str) -> Result<Self> {
        let entry = unsafe { ash::Entry::load()? };
        let instance = create_instance(&entry, app_name)?;

        // Pick a physical device with graphics queue
        let pdevices = unsafe { instance.enumerate_physical_devices()? };
        let (pdevice, graphics_queue_family) = pdevices
            .iter()
            .find_map(|pd| {
                let families = unsafe { instance.get_physical_device_queue_family_properties(*pd) };
                families
                    .iter()
                    .enumerate()
                    .find(|(_, f)| f.queue_flags.contains(vk::QueueFlags::GRAPHICS))
                    .map(|(idx, _)| (*pd, idx as u32))
            })
            .ok_or_else(|| anyhow!("No suitable physical device with graphics queue"))?;

        let priorities = [1.0f32];
        let queue_ci = [vk::DeviceQueueCreateInfo::builder()
            .queue_family_index(graphics_queue_family)
            .queue_priorities(&priorities)
            .build()];

        // Dynamic rendering is core in 1.3
        let mut v13 = vk::PhysicalDeviceVulkan13Features::builder().dynamic_rendering(true);
        let device_ci = vk::DeviceCreateInfo::builder()
            .queue_create_infos(&queue_ci)
            .push_next(&mut v13);
        let device = unsafe { instance.create_device(pdevice, &device_ci, None)? };
        let graphics_queue = unsafe { device.get_device_queue(graphics_queue_family, 0) };

        log::debug!("vulkan device ready (queue family {})", graphics_queue_family);
        Ok(Self { entry, instance, pdevice, device, graphics_queue, graphics_queue_family })
    }

    pub fn device_name(&self) -> String {
        let props = unsafe { self.instance.get_physical_device_properties(self.pdevice) };
        let raw = unsafe { CStr::from_ptr(props.device_name.as_ptr()) };
        raw.to_string_lossy().into_owned()
    }
}

impl Drop for VkContext {
    fn drop(&mut self) {
        unsafe {
            self.device.device_wait_idle().ok();
            self.device.destroy_device(None);
            self.instance.destroy_instance(None);
        }
    }
}

pub fn enumerate_devices() -> Result<Vec<String>> {
    let entry = unsafe { ash::Entry::load()? };
    let instance = create_instance(&entry, "inkshell-enum")?;
    let mut out = Vec::new();
    for pd in unsafe { instance.enumerate_physical_devices()? } {
        let props = unsafe { instance.get_physical_device_properties(pd) };
        let name = unsafe { CStr::from_ptr(props.device_name.as_ptr()) }
            .to_string_lossy()
            .into_owned();
        out.push(format!(
            "{} (API {}.{}.{})",
            name,
            vk::api_version_major(props.api_version),
            vk::api_version_minor(props.api_version),
            vk::api_version_patch(props.api_version)
        ));
    }
    unsafe { instance.destroy_instance(None) };
    Ok(out)
}

// Compiled at build time by build.rs into OUT_DIR as `<source name>.spv`.
pub const OUTLINE_VERT_SPV: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/outline.vert.spv"));
pub const OUTLINE_FRAG_SPV: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/outline.frag.spv"));

pub fn create_shader_module(device: &ash::Device, bytes: &[u8]) -> Result<vk::ShaderModule> {
    let mut cursor = std::io::Cursor::new(bytes);
    let code = ash::util::read_spv(&mut cursor)?;
    let info = vk::ShaderModuleCreateInfo::builder().code(&code);
    let module = unsafe { device.create_shader_module(&info, None)? };
    Ok(module)
}

fn find_memory_type(instance: &ash::Instance, pdevice: vk::PhysicalDevice, type_bits: u32, props: vk::MemoryPropertyFlags) -> Result<u32> {
    let mem_props = unsafe { instance.get_physical_device_memory_properties(pdevice) };
    for i in 0..mem_props.memory_type_count {
        let i = i as usize;
        if (type_bits & (1 << i)) != 0 && mem_props.memory_types[i].property_flags.contains(props) {
            return Ok(i as u32);
        }
    }
    Err(anyhow!("No suitable memory type"))
}

type Image2d = (vk::Image, vk::DeviceMemory, vk::ImageView);

fn create_image_2d(ctx: &VkContext, width: u32, height: u32, format: vk::Format, usage: vk::ImageUsageFlags, aspect: vk::ImageAspectFlags) -> Result<Image2d> {
    let image_ci = vk::ImageCreateInfo::builder()
        .image_type(vk::ImageType::TYPE_2D)
        .format(format)
        .extent(vk::Extent3D { width, height, depth: 1 })
        .mip_levels(1)
        .array_layers(1)
        .samples(vk::SampleCountFlags::TYPE_1)
        .tiling(vk::ImageTiling::OPTIMAL)
        .usage(usage)
        .initial_layout(vk::ImageLayout::UNDEFINED);
    let image = unsafe { ctx.device.create_image(&image_ci, None)? };
    let mem_reqs = unsafe { ctx.device.get_image_memory_requirements(image) };
    let mem_type = find_memory_type(&ctx.instance, ctx.pdevice, mem_reqs.memory_type_bits, vk::MemoryPropertyFlags::DEVICE_LOCAL)?;
    let alloc = vk::MemoryAllocateInfo::builder().allocation_size(mem_reqs.size).memory_type_index(mem_type);
    let image_mem = unsafe { ctx.device.allocate_memory(&alloc, None)? };
    unsafe { ctx.device.bind_image_memory(image, image_mem, 0)? };
    let view_ci = vk::ImageViewCreateInfo::builder()
        .image(image)
        .view_type(vk::ImageViewType::TYPE_2D)
        .format(format)
        .subresource_range(subresource(aspect));
    let view = unsafe { ctx.device.create_image_view(&view_ci, None)? };
    Ok((image, image_mem, view))
}

fn destroy_image_2d(ctx: &VkContext, (image, mem, view): Image2d) {
    unsafe {
        ctx.device.destroy_image_view(view, None);
        ctx.device.destroy_image(image, None);
        ctx.device.free_memory(mem, None);
    }
}

fn subresource(aspect: vk::ImageAspectFlags) -> vk::ImageSubresourceRange {
    vk::ImageSubresourceRange { aspect_mask: aspect, base_mip_level: 0, level_count: 1, base_array_layer: 0, layer_count: 1 }
}

/// HOST_VISIBLE | HOST_COHERENT buffer, optionally filled with `init`.
fn create_host_buffer(ctx: &VkContext, size: u64, usage: vk::BufferUsageFlags, init: Option<&[u8]>) -> Result<(vk::Buffer, vk::DeviceMemory)> {
    let host_props = vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT;
    let ci = vk::BufferCreateInfo::builder().size(size).usage(usage).sharing_mode(vk::SharingMode::EXCLUSIVE);
    let buffer = unsafe { ctx.device.create_buffer(&ci, None)? };
    let req = unsafe { ctx.device.get_buffer_memory_requirements(buffer) };
    let mem_type = find_memory_type(&ctx.instance, ctx.pdevice, req.memory_type_bits, host_props)?;
    let alloc = vk::MemoryAllocateInfo::builder().allocation_size(req.size).memory_type_index(mem_type);
    let mem = unsafe { ctx.device.allocate_memory(&alloc, None)? };
    unsafe { ctx.device.bind_buffer_memory(buffer, mem, 0)? };
    if let Some(bytes) = init {
        unsafe {
            let p = ctx.device.map_memory(mem, 0, size, vk::MemoryMapFlags::empty())? as *mut u8;
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), p, bytes.len());
            ctx.device.unmap_memory(mem);
        }
    }
    Ok((buffer, mem))
}

/// Push constant block shared by outline.vert and outline.frag.
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct OutlinePush {
    pub matrix: [[f32; 4]; 4],
    pub color: [f32; 4],
    pub outline_width: f32,
    pub _pad: [f32; 3],
}

impl From<&OutlineUniforms> for OutlinePush {
    fn from(u: &OutlineUniforms) -> Self {
        Self { matrix: u.mvp().to_cols_array_2d(), color: u.color, outline_width: u.width, _pad: [0.0; 3] }
    }
}

#[derive(Debug, Clone, Copy)]
struct PendingDraw {
    state: RasterState,
    first_index: u32,
    index_count: u32,
    vertex_offset: i32,
    push: OutlinePush,
}

/// Collects draws issued through [`ImmediateRenderer`] and replays them on the GPU in [`OffscreenFrame::finish`].
pub struct OffscreenFrame {
    state: RasterState,
    clear_color: [f32; 4],
    vertices: Vec<OutlineVertex>,
    indices: Vec<u32>,
    draws: Vec<PendingDraw>,
}

impl OffscreenFrame {
    pub fn new(clear_color: [f32; 4]) -> Self {
        Self { state: RasterState::default(), clear_color, vertices: Vec::new(), indices: Vec::new(), draws: Vec::new() }
    }

    pub fn draw_count(&self) -> usize { self.draws.len() }

    /// Render every collected draw into a `width` x `height` RGBA8 image.
    pub fn finish(self, ctx: &VkContext, width: u32, height: u32) -> Result<Vec<u8>> {
        let color_format = vk::Format::R8G8B8A8_UNORM;
        let depth_format = vk::Format::D32_SFLOAT;
        let color = create_image_2d(ctx, width, height, color_format, vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::TRANSFER_SRC, vk::ImageAspectFlags::COLOR)?;
        let depth = create_image_2d(ctx, width, height, depth_format, vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT, vk::ImageAspectFlags::DEPTH)?;

        let readback_size = (width as u64) * (height as u64) * 4;
        let (readback, readback_mem) = create_host_buffer(ctx, readback_size, vk::BufferUsageFlags::TRANSFER_DST, None)?;

        let geometry = if self.draws.is_empty() {
            None
        } else {
            let vb_bytes: &[u8] = bytemuck::cast_slice(&self.vertices);
            let ib_bytes: &[u8] = bytemuck::cast_slice(&self.indices);
            let vb = create_host_buffer(ctx, vb_bytes.len() as u64, vk::BufferUsageFlags::VERTEX_BUFFER, Some(vb_bytes))?;
            let ib = create_host_buffer(ctx, ib_bytes.len() as u64, vk::BufferUsageFlags::INDEX_BUFFER, Some(ib_bytes))?;
            Some((vb, ib))
        };

        let vmod = create_shader_module(&ctx.device, OUTLINE_VERT_SPV)?;
        let fmod = create_shader_module(&ctx.device, OUTLINE_FRAG_SPV)?;
        let pc_range = vk::PushConstantRange::builder()
            .stage_flags(vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT)
            .offset(0)
            .size(std::mem::size_of::<OutlinePush>() as u32)
            .build();
        let layout_ci = vk::PipelineLayoutCreateInfo::builder().push_constant_ranges(std::slice::from_ref(&pc_range));
        let pipeline_layout = unsafe { ctx.device.create_pipeline_layout(&layout_ci, None)? };

        let mut pipelines: HashMap<RasterState, vk::Pipeline> = HashMap::new();
        for d in &self.draws {
            if !pipelines.contains_key(&d.state) {
                let p = create_pipeline(ctx, vmod, fmod, pipeline_layout, d.state, color_format, depth_format)?;
                pipelines.insert(d.state, p);
            }
        }
        log::debug!("{} draws, {} pipelines, {}x{}", self.draws.len(), pipelines.len(), width, height);

        let pool_ci = vk::CommandPoolCreateInfo::builder().queue_family_index(ctx.graphics_queue_family);
        let cmd_pool = unsafe { ctx.device.create_command_pool(&pool_ci, None)? };
        let alloc_ci = vk::CommandBufferAllocateInfo::builder().command_pool(cmd_pool).level(vk::CommandBufferLevel::PRIMARY).command_buffer_count(1);
        let cmd_buf = unsafe { ctx.device.allocate_command_buffers(&alloc_ci)? }[0];
        let begin = vk::CommandBufferBeginInfo::builder().flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
        unsafe { ctx.device.begin_command_buffer(cmd_buf, &begin)? };

        let barriers = [
            vk::ImageMemoryBarrier::builder()
                .src_access_mask(vk::AccessFlags::empty())
                .dst_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE)
                .old_layout(vk::ImageLayout::UNDEFINED)
                .new_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
                .image(color.0)
                .subresource_range(subresource(vk::ImageAspectFlags::COLOR))
                .build(),
            vk::ImageMemoryBarrier::builder()
                .src_access_mask(vk::AccessFlags::empty())
                .dst_access_mask(vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE)
                .old_layout(vk::ImageLayout::UNDEFINED)
                .new_layout(vk::ImageLayout::DEPTH_ATTACHMENT_OPTIMAL)
                .image(depth.0)
                .subresource_range(subresource(vk::ImageAspectFlags::DEPTH))
                .build(),
        ];
        unsafe {
            ctx.device.cmd_pipeline_barrier(
                cmd_buf,
                vk::PipelineStageFlags::TOP_OF_PIPE,
                vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &barriers,
            );
        }

        let color_att = vk::RenderingAttachmentInfo::builder()
            .image_view(color.2)
            .image_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
            .load_op(vk::AttachmentLoadOp::CLEAR)
            .store_op(vk::AttachmentStoreOp::STORE)
            .clear_value(vk::ClearValue { color: vk::ClearColorValue { float32: self.clear_color } })
            .build();
        let depth_att = vk::RenderingAttachmentInfo::builder()
            .image_view(depth.2)
            .image_layout(vk::ImageLayout::DEPTH_ATTACHMENT_OPTIMAL)
            .load_op(vk::AttachmentLoadOp::CLEAR)
            .store_op(vk::AttachmentStoreOp::DONT_CARE)
            .clear_value(vk::ClearValue { depth_stencil: vk::ClearDepthStencilValue { depth: 1.0, stencil: 0 } });
        let render_area = vk::Rect2D { offset: vk::Offset2D { x: 0, y: 0 }, extent: vk::Extent2D { width, height } };
        let render_info = vk::RenderingInfo::builder()
            .render_area(render_area)
            .layer_count(1)
            .color_attachments(std::slice::from_ref(&color_att))
            .depth_attachment(&depth_att);
        unsafe {
            ctx.device.cmd_begin_rendering(cmd_buf, &render_info);
            // Negative height keeps +Y up and counter-clockwise front faces as in GL.
            let viewport = vk::Viewport { x: 0.0, y: height as f32, width: width as f32, height: -(height as f32), min_depth: 0.0, max_depth: 1.0 };
            ctx.device.cmd_set_viewport(cmd_buf, 0, std::slice::from_ref(&viewport));
            ctx.device.cmd_set_scissor(cmd_buf, 0, std::slice::from_ref(&render_area));
            if let Some(((vb, _), (ib, _))) = geometry {
                ctx.device.cmd_bind_vertex_buffers(cmd_buf, 0, &[vb], &[0]);
                ctx.device.cmd_bind_index_buffer(cmd_buf, ib, 0, vk::IndexType::UINT32);
                for d in &self.draws {
                    ctx.device.cmd_bind_pipeline(cmd_buf, vk::PipelineBindPoint::GRAPHICS, pipelines[&d.state]);
                    ctx.device.cmd_push_constants(
                        cmd_buf,
                        pipeline_layout,
                        vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT,
                        0,
                        bytemuck::bytes_of(&d.push),
                    );
                    ctx.device.cmd_draw_indexed(cmd_buf, d.index_count, 1, d.first_index, d.vertex_offset, 0);
                }
            }
            ctx.device.cmd_end_rendering(cmd_buf);
        }

        let barrier_to_src = vk::ImageMemoryBarrier::builder()
            .src_access_mask(vk::AccessFlags::COLOR_ATTACHMENT_WRITE)
            .dst_access_mask(vk::AccessFlags::TRANSFER_READ)
            .old_layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
            .new_layout(vk::ImageLayout::TRANSFER_SRC_OPTIMAL)
            .image(color.0)
            .subresource_range(subresource(vk::ImageAspectFlags::COLOR));
        let region = vk::BufferImageCopy::builder()
            .buffer_offset(0)
            .buffer_row_length(0) // tightly packed
            .buffer_image_height(0)
            .image_subresource(vk::ImageSubresourceLayers { aspect_mask: vk::ImageAspectFlags::COLOR, mip_level: 0, base_array_layer: 0, layer_count: 1 })
            .image_offset(vk::Offset3D { x: 0, y: 0, z: 0 })
            .image_extent(vk::Extent3D { width, height, depth: 1 });
        unsafe {
            ctx.device.cmd_pipeline_barrier(
                cmd_buf,
                vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
                vk::PipelineStageFlags::TRANSFER,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                std::slice::from_ref(&barrier_to_src),
            );
            ctx.device.cmd_copy_image_to_buffer(cmd_buf, color.0, vk::ImageLayout::TRANSFER_SRC_OPTIMAL, readback, std::slice::from_ref(&region));
            ctx.device.end_command_buffer(cmd_buf)?;

            let submit = vk::SubmitInfo::builder().command_buffers(std::slice::from_ref(&cmd_buf));
            ctx.device.queue_submit(ctx.graphics_queue, std::slice::from_ref(&submit), vk::Fence::null())?;
            ctx.device.queue_wait_idle(ctx.graphics_queue)?;
        }

        let mut pixels = vec![0u8; readback_size as usize];
        unsafe {
            let ptr = ctx.device.map_memory(readback_mem, 0, readback_size, vk::MemoryMapFlags::empty())? as *const u8;
            std::ptr::copy_nonoverlapping(ptr, pixels.as_mut_ptr(), pixels.len());
            ctx.device.unmap_memory(readback_mem);
        }

        unsafe {
            for (_, p) in pipelines {
                ctx.device.destroy_pipeline(p, None);
            }
            ctx.device.destroy_pipeline_layout(pipeline_layout, None);
            ctx.device.destroy_shader_module(vmod, None);
            ctx.device.destroy_shader_module(fmod, None);
            ctx.device.destroy_command_pool(cmd_pool, None);
            if let Some(((vb, vb_mem), (ib, ib_mem))) = geometry {
                ctx.device.destroy_buffer(vb, None);
                ctx.device.free_memory(vb_mem, None);
                ctx.device.destroy_buffer(ib, None);
                ctx.device.free_memory(ib_mem, None);
            }
            ctx.device.destroy_buffer(readback, None);
            ctx.device.free_memory(readback_mem, None);
        }
        destroy_image_2d(ctx, color);
        destroy_image_2d(ctx, depth);

        Ok(pixels)
    }
}

impl ImmediateRenderer for OffscreenFrame {
    fn name(&self) -> &'static str { "vulkan-offscreen" }
    fn raster_state(&self) -> RasterState { self.state }
    fn set_raster_state(&mut self, state: RasterState) { self.state = state; }

    fn draw_indexed(&mut self, buffers: &OutlineBuffers, uniforms: &OutlineUniforms) -> crate::Result<()> {
        buffers.validate()?;
        let draw = PendingDraw {
            state: self.state,
            first_index: self.indices.len() as u32,
            index_count: (buffers.triangle_count() * 3) as u32,
            vertex_offset: self.vertices.len() as i32,
            push: OutlinePush::from(uniforms),
        };
        self.vertices.extend(buffers.interleaved());
        self.indices.extend_from_slice(buffers.flat_indices());
        self.draws.push(draw);
        Ok(())
    }
}

fn create_pipeline(
    ctx: &VkContext,
    vmod: vk::ShaderModule,
    fmod: vk::ShaderModule,
    layout: vk::PipelineLayout,
    state: RasterState,
    color_format: vk::Format,
    depth_format: vk::Format,
) -> Result<vk::Pipeline> {
    let entry = CStr::from_bytes_with_nul(b"main\0")?;
    let stages = [
        vk::PipelineShaderStageCreateInfo::builder().stage(vk::ShaderStageFlags::VERTEX).module(vmod).name(entry).build(),
        vk::PipelineShaderStageCreateInfo::builder().stage(vk::ShaderStageFlags::FRAGMENT).module(fmod).name(entry).build(),
    ];
    let binding_desc = vk::VertexInputBindingDescription::builder()
        .binding(0)
        .stride(std::mem::size_of::<OutlineVertex>() as u32)
        .input_rate(vk::VertexInputRate::VERTEX)
        .build();
    let attr_descs = [
        vk::VertexInputAttributeDescription::builder().location(0).binding(0).format(vk::Format::R32G32B32_SFLOAT).offset(0).build(),
        vk::VertexInputAttributeDescription::builder().location(1).binding(0).format(vk::Format::R32G32B32_SFLOAT).offset(12).build(),
    ];
    let vi = vk::PipelineVertexInputStateCreateInfo::builder()
        .vertex_binding_descriptions(std::slice::from_ref(&binding_desc))
        .vertex_attribute_descriptions(&attr_descs);
    let ia = vk::PipelineInputAssemblyStateCreateInfo::builder().topology(vk::PrimitiveTopology::TRIANGLE_LIST);
    let vp = vk::PipelineViewportStateCreateInfo::builder().viewport_count(1).scissor_count(1);
    let rs = vk::PipelineRasterizationStateCreateInfo::builder()
        .polygon_mode(vk::PolygonMode::FILL)
        .cull_mode(cull_mode(state))
        .front_face(vk::FrontFace::COUNTER_CLOCKWISE)
        .line_width(1.0);
    let ms = vk::PipelineMultisampleStateCreateInfo::builder().rasterization_samples(vk::SampleCountFlags::TYPE_1);
    let cb_mask = vk::ColorComponentFlags::R | vk::ColorComponentFlags::G | vk::ColorComponentFlags::B | vk::ColorComponentFlags::A;
    let cba = vk::PipelineColorBlendAttachmentState::builder().color_write_mask(cb_mask).blend_enable(false).build();
    let cb = vk::PipelineColorBlendStateCreateInfo::builder().attachments(std::slice::from_ref(&cba));
    let ds = vk::PipelineDepthStencilStateCreateInfo::builder()
        .depth_test_enable(state.depth_test)
        .depth_write_enable(state.depth_test)
        .depth_compare_op(vk::CompareOp::LESS_OR_EQUAL);
    let dyn_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
    let dyn_state = vk::PipelineDynamicStateCreateInfo::builder().dynamic_states(&dyn_states);
    let mut rendering_info = vk::PipelineRenderingCreateInfo::builder()
        .color_attachment_formats(std::slice::from_ref(&color_format))
        .depth_attachment_format(depth_format);
    let gp_ci = vk::GraphicsPipelineCreateInfo::builder()
        .stages(&stages)
        .vertex_input_state(&vi)
        .input_assembly_state(&ia)
        .viewport_state(&vp)
        .rasterization_state(&rs)
        .multisample_state(&ms)
        .depth_stencil_state(&ds)
        .color_blend_state(&cb)
        .dynamic_state(&dyn_state)
        .layout(layout)
        .push_next(&mut rendering_info);
    let pipeline = unsafe { ctx.device.create_graphics_pipelines(vk::PipelineCache::null(), std::slice::from_ref(&gp_ci), None) }
        .map_err(|e| anyhow!("pipeline creation failed: {:?}", e.1))?[0];
    Ok(pipeline)
}

fn cull_mode(state: RasterState) -> vk::CullModeFlags {
    match (state.cull_enabled, state.cull_face) {
        (false, _) => vk::CullModeFlags::NONE,
        (true, CullFace::Front) => vk::CullModeFlags::FRONT,
        (true, CullFace::Back) => vk::CullModeFlags::BACK,
    }
}
