mod camera;
mod gpu;

pub use camera::OrbitCamera;
pub use gpu::{FrameUniforms, LineVertex, MeshVertex};

use crate::app::egui_host::EguiFrameOutput;
use crate::scene::Scene;
use gpu::{GpuObject, LineBuffer};
use std::sync::Arc;
use winit::dpi::PhysicalSize;
use winit::window::Window;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to create rendering surface: {0}")]
    CreateSurface(#[from] wgpu::CreateSurfaceError),
    #[error("no compatible GPU adapter found")]
    NoAdapter,
    #[error("failed to create GPU device: {0}")]
    RequestDevice(#[from] wgpu::RequestDeviceError),
    #[error("surface reports no supported formats")]
    UnsupportedSurface,
    #[error("failed to acquire frame: {0}")]
    Surface(wgpu::SurfaceError),
}

pub struct RenderContext {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth_view: wgpu::TextureView,
    encode_srgb: bool,
    uniform_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    mesh_pipeline: wgpu::RenderPipeline,
    wireframe_pipeline: wgpu::RenderPipeline,
    line_pipeline: wgpu::RenderPipeline,
    grid: LineBuffer,
    axes: LineBuffer,
    object: Option<GpuObject>,
    egui_renderer: egui_wgpu::Renderer,
}

impl RenderContext {
    pub fn new(window: Arc<Window>, scene: &Scene) -> Result<Self, RenderError> {
        pollster::block_on(Self::new_async(window, scene))
    }

    async fn new_async(window: Arc<Window>, scene: &Scene) -> Result<Self, RenderError> {
        let size = window.inner_size();
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance.create_surface(window)?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::NoAdapter)?;
        log::info!("Using GPU adapter: {}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("meshview device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await?;

        let caps = surface.get_capabilities(&adapter);
        // Prefer a non-sRGB target; the scene shaders then encode themselves.
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|format| !format.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or(RenderError::UnsupportedSurface)?;
        let alpha_mode = caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            desired_maximum_frame_latency: 2,
            alpha_mode,
            view_formats: vec![],
        };
        surface.configure(&device, &config);
        log::info!(
            "Surface configured {}x{} ({:?})",
            config.width,
            config.height,
            format
        );

        let depth_view = create_depth_view(&device, config.width, config.height);

        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("frame uniforms"),
            size: std::mem::size_of::<FrameUniforms>() as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("frame layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame bind group"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("frame pipeline layout"),
            bind_group_layouts: &[&frame_layout],
            push_constant_ranges: &[],
        });

        let phong = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("phong shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/phong.wgsl").into()),
        });
        let line = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("line shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/line.wgsl").into()),
        });

        let mesh_pipeline = create_pipeline(
            &device,
            &pipeline_layout,
            PipelineDesc {
                label: "mesh pipeline",
                shader: &phong,
                vertex_layout: MeshVertex::layout(),
                topology: wgpu::PrimitiveTopology::TriangleList,
                format,
                blend: None,
            },
        );
        let wireframe_pipeline = create_pipeline(
            &device,
            &pipeline_layout,
            PipelineDesc {
                label: "wireframe pipeline",
                shader: &phong,
                vertex_layout: MeshVertex::layout(),
                topology: wgpu::PrimitiveTopology::LineList,
                format,
                blend: None,
            },
        );
        let line_pipeline = create_pipeline(
            &device,
            &pipeline_layout,
            PipelineDesc {
                label: "helper line pipeline",
                shader: &line,
                vertex_layout: LineVertex::layout(),
                topology: wgpu::PrimitiveTopology::LineList,
                format,
                blend: Some(wgpu::BlendState::ALPHA_BLENDING),
            },
        );

        let grid = LineBuffer::new(
            &device,
            "grid lines",
            &gpu::line_vertices(&scene.grid.line_vertices(), scene.grid.opacity),
        );
        let axes = LineBuffer::new(
            &device,
            "axes lines",
            &gpu::line_vertices(&scene.axes.line_vertices(), 1.0),
        );

        let egui_renderer = egui_wgpu::Renderer::new(&device, format, None, 1, false);

        Ok(Self {
            surface,
            device,
            queue,
            config,
            depth_view,
            encode_srgb: !format.is_srgb(),
            uniform_buffer,
            frame_bind_group,
            mesh_pipeline,
            wireframe_pipeline,
            line_pipeline,
            grid,
            axes,
            object: None,
            egui_renderer,
        })
    }

    pub fn size(&self) -> PhysicalSize<u32> {
        PhysicalSize::new(self.config.width, self.config.height)
    }

    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        self.depth_view = create_depth_view(&self.device, new_size.width, new_size.height);
    }

    /// Keeps the GPU copy of the loaded object in step with the scene.
    fn sync_object(&mut self, scene: &Scene) {
        let current = scene.object();
        let cached = self.object.as_ref().map(|object| object.id);
        if current.map(|object| object.id) == cached {
            return;
        }
        self.object = current.map(|object| GpuObject::upload(&self.device, object));
    }

    pub fn render(
        &mut self,
        scene: &Scene,
        camera: &OrbitCamera,
        ui: EguiFrameOutput,
    ) -> Result<(), RenderError> {
        let frame = match self.surface.get_current_texture() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                log::debug!("Surface lost or outdated, reconfiguring");
                self.surface.configure(&self.device, &self.config);
                return Ok(());
            }
            Err(wgpu::SurfaceError::Timeout) => {
                log::warn!("Timed out acquiring frame, skipping");
                return Ok(());
            }
            Err(err) => return Err(RenderError::Surface(err)),
        };
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        self.sync_object(scene);
        let uniforms = FrameUniforms::new(scene, camera, self.encode_srgb);
        self.queue
            .write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("frame encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("scene pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color(scene)),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_bind_group(0, &self.frame_bind_group, &[]);

            let object_visible = scene.object().is_some_and(|object| object.visible);
            if let (true, Some(object)) = (object_visible, &self.object) {
                let wireframe = scene.material().wireframe;
                pass.set_pipeline(if wireframe {
                    &self.wireframe_pipeline
                } else {
                    &self.mesh_pipeline
                });
                for mesh in &object.meshes {
                    mesh.draw(&mut pass, wireframe);
                }
            }

            if scene.axes.visible || scene.grid.visible {
                pass.set_pipeline(&self.line_pipeline);
                if scene.axes.visible {
                    self.axes.draw(&mut pass);
                }
                if scene.grid.visible {
                    self.grid.draw(&mut pass);
                }
            }
        }

        let screen_descriptor = ui.screen_descriptor(self.size());
        for (id, image_delta) in &ui.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }
        let extra_commands = self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &ui.clipped_primitives,
            &screen_descriptor,
        );
        {
            let pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("egui pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            let mut pass = pass.forget_lifetime();
            self.egui_renderer
                .render(&mut pass, &ui.clipped_primitives, &screen_descriptor);
        }

        self.queue.submit(
            extra_commands
                .into_iter()
                .chain(std::iter::once(encoder.finish())),
        );
        frame.present();

        for id in &ui.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
        Ok(())
    }

    fn clear_color(&self, scene: &Scene) -> wgpu::Color {
        let [r, g, b] = if self.encode_srgb {
            scene.background.to_srgb_f32()
        } else {
            scene.background.to_linear()
        };
        wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: 1.0,
        }
    }
}

struct PipelineDesc<'a> {
    label: &'a str,
    shader: &'a wgpu::ShaderModule,
    vertex_layout: wgpu::VertexBufferLayout<'static>,
    topology: wgpu::PrimitiveTopology,
    format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    desc: PipelineDesc<'_>,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(desc.label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: desc.shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[desc.vertex_layout],
        },
        primitive: wgpu::PrimitiveState {
            topology: desc.topology,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            // Materials are double-sided.
            cull_mode: None,
            unclipped_depth: false,
            polygon_mode: wgpu::PolygonMode::Fill,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::LessEqual,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: desc.shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: desc.format,
                blend: desc.blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        multiview: None,
        cache: None,
    })
}

fn create_depth_view(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}
