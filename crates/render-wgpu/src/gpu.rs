use crate::camera::ZoomCamera;
use crate::mesh::{Vertex, box_mesh, mesh_vertices};
use crate::shaders;
use bytemuck::{Pod, Zeroable};
use garment_assets::ModelAsset;
use garment_canvas::{CanvasError, PaintCanvas, PixelRect, TILE_LINE_WIDTH, TILE_SIZE, TILE_SPACING, tile_texture};
use garment_scene::{Lighting, Scene};
use glam::Mat4;
use wgpu::util::DeviceExt;

/// Errors from renderer resource updates.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("canvas error: {0}")]
    Canvas(#[from] CanvasError),
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct Uniforms {
    view_proj: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    ambient: [f32; 4],
    light_dir: [f32; 4],
    light_color: [f32; 4],
}

impl Uniforms {
    fn new(camera: &ZoomCamera, model: Mat4, lighting: &Lighting) -> Self {
        let ambient = lighting.ambient_color * lighting.ambient_intensity;
        let light = lighting.directional_color * lighting.directional_intensity;
        Self {
            view_proj: camera.view_projection().to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            ambient: ambient.extend(1.0).to_array(),
            light_dir: lighting.light_direction().extend(0.0).to_array(),
            light_color: light.extend(1.0).to_array(),
        }
    }
}

/// A texture with its sampler bind group.
struct BoundTexture {
    texture: wgpu::Texture,
    bind_group: wgpu::BindGroup,
    width: u32,
    height: u32,
}

struct GpuMesh {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
}

/// wgpu renderer for the background box and the painted garment.
pub struct WgpuRenderer {
    skybox_pipeline: wgpu::RenderPipeline,
    model_pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    uniform_bind_group: wgpu::BindGroup,
    texture_layout: wgpu::BindGroupLayout,
    paint_sampler: wgpu::Sampler,
    skybox_mesh: GpuMesh,
    tile_texture: BoundTexture,
    paint_texture: BoundTexture,
    model_meshes: Vec<GpuMesh>,
    depth_texture: wgpu::TextureView,
    surface_format: wgpu::TextureFormat,
}

impl WgpuRenderer {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        surface_format: wgpu::TextureFormat,
        width: u32,
        height: u32,
        scene: &Scene,
        paint: &PaintCanvas,
    ) -> Result<Self, RenderError> {
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("uniform_buffer"),
            contents: bytemuck::bytes_of(&Uniforms::new(
                &ZoomCamera::default(),
                Mat4::IDENTITY,
                &scene.lighting,
            )),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let uniform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("uniform_bind_group_layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let uniform_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("uniform_bind_group"),
            layout: &uniform_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("texture_bind_group_layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pipeline_layout"),
            bind_group_layouts: &[&uniform_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        // Background box: drawn from inside, so front faces are culled.
        let skybox_pipeline = create_pipeline(
            device,
            &pipeline_layout,
            surface_format,
            "skybox",
            &shaders::skybox_shader(),
            ("vs_sky", "fs_sky"),
            wgpu::Face::Front,
        );
        let model_pipeline = create_pipeline(
            device,
            &pipeline_layout,
            surface_format,
            "model",
            &shaders::model_shader(),
            ("vs_model", "fs_model"),
            wgpu::Face::Back,
        );

        let (box_vertices, box_indices) = box_mesh(scene.skybox.size);
        let skybox_mesh = GpuMesh {
            vertex_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("skybox_vertex_buffer"),
                contents: bytemuck::cast_slice(&box_vertices),
                usage: wgpu::BufferUsages::VERTEX,
            }),
            index_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("skybox_index_buffer"),
                contents: bytemuck::cast_slice(&box_indices),
                usage: wgpu::BufferUsages::INDEX,
            }),
            index_count: box_indices.len() as u32,
        };

        let tile_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("tile_sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let paint_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("paint_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let tiles = tile_texture(TILE_SIZE, TILE_SPACING, TILE_LINE_WIDTH)?;
        let tile_texture = create_bound_texture(device, &texture_layout, &tile_sampler, "tile", tiles.size());
        write_region(queue, &tile_texture.texture, PixelRect::full(TILE_SIZE, TILE_SIZE), tiles.pixels());

        let paint_texture = create_bound_texture(device, &texture_layout, &paint_sampler, "paint", paint.size());
        write_region(
            queue,
            &paint_texture.texture,
            PixelRect::full(paint.width(), paint.height()),
            paint.pixels(),
        );

        let depth_texture = create_depth_texture(device, width, height);
        tracing::info!("renderer ready ({surface_format:?}, {width}x{height})");

        Ok(Self {
            skybox_pipeline,
            model_pipeline,
            uniform_buffer,
            uniform_bind_group,
            texture_layout,
            paint_sampler,
            skybox_mesh,
            tile_texture,
            paint_texture,
            model_meshes: Vec::new(),
            depth_texture,
            surface_format,
        })
    }

    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) {
        self.depth_texture = create_depth_texture(device, width, height);
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.surface_format
    }

    pub fn has_model(&self) -> bool {
        !self.model_meshes.is_empty()
    }

    /// Create GPU buffers for every mesh of the model, replacing any previous
    /// model.
    pub fn upload_model(&mut self, device: &wgpu::Device, model: &ModelAsset) {
        self.model_meshes = model
            .meshes
            .iter()
            .filter(|mesh| !mesh.indices.is_empty())
            .map(|mesh| {
                let vertices = mesh_vertices(mesh);
                GpuMesh {
                    vertex_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some(&format!("{}_vertex_buffer", mesh.name)),
                        contents: bytemuck::cast_slice(&vertices),
                        usage: wgpu::BufferUsages::VERTEX,
                    }),
                    index_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some(&format!("{}_index_buffer", mesh.name)),
                        contents: bytemuck::cast_slice(&mesh.indices),
                        usage: wgpu::BufferUsages::INDEX,
                    }),
                    index_count: mesh.indices.len() as u32,
                }
            })
            .collect();
        tracing::info!("uploaded {} meshes of {}", self.model_meshes.len(), model.name);
    }

    /// Upload the canvas region changed since the last call. A canvas of a
    /// new size gets a new texture.
    pub fn update_paint_texture(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        canvas: &mut PaintCanvas,
    ) -> Result<(), RenderError> {
        if canvas.size() != (self.paint_texture.width, self.paint_texture.height) {
            tracing::debug!("paint texture resized to {}x{}", canvas.width(), canvas.height());
            self.paint_texture =
                create_bound_texture(device, &self.texture_layout, &self.paint_sampler, "paint", canvas.size());
            canvas.mark_all_dirty();
        }
        let Some(rect) = canvas.take_dirty() else {
            return Ok(());
        };
        let data = canvas.read_region(rect)?;
        write_region(queue, &self.paint_texture.texture, rect, &data);
        Ok(())
    }

    /// Render one frame: background box, then the garment if one is loaded.
    pub fn render(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        view: &wgpu::TextureView,
        camera: &ZoomCamera,
        scene: &Scene,
    ) {
        queue.write_buffer(
            &self.uniform_buffer,
            0,
            bytemuck::bytes_of(&Uniforms::new(camera, scene.model_matrix(), &scene.lighting)),
        );

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("render_encoder"),
        });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("main_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });

            pass.set_pipeline(&self.skybox_pipeline);
            pass.set_bind_group(0, &self.uniform_bind_group, &[]);
            pass.set_bind_group(1, &self.tile_texture.bind_group, &[]);
            draw_mesh(&mut pass, &self.skybox_mesh, wgpu::IndexFormat::Uint16);

            if scene.has_model() {
                pass.set_pipeline(&self.model_pipeline);
                pass.set_bind_group(0, &self.uniform_bind_group, &[]);
                pass.set_bind_group(1, &self.paint_texture.bind_group, &[]);
                for mesh in &self.model_meshes {
                    draw_mesh(&mut pass, mesh, wgpu::IndexFormat::Uint32);
                }
            }
        }

        queue.submit(std::iter::once(encoder.finish()));
    }
}

fn draw_mesh(pass: &mut wgpu::RenderPass<'_>, mesh: &GpuMesh, format: wgpu::IndexFormat) {
    pass.set_vertex_buffer(0, mesh.vertex_buffer.slice(..));
    pass.set_index_buffer(mesh.index_buffer.slice(..), format);
    pass.draw_indexed(0..mesh.index_count, 0, 0..1);
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    surface_format: wgpu::TextureFormat,
    name: &str,
    source: &str,
    (vs, fs): (&str, &str),
    cull: wgpu::Face,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(&format!("{name}_shader")),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(&format!("{name}_pipeline")),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some(vs),
            compilation_options: Default::default(),
            buffers: &[wgpu::VertexBufferLayout {
                array_stride: std::mem::size_of::<Vertex>() as u64,
                step_mode: wgpu::VertexStepMode::Vertex,
                attributes: &wgpu::vertex_attr_array![
                    0 => Float32x3,
                    1 => Float32x3,
                    2 => Float32x2,
                ],
            }],
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some(fs),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(wgpu::BlendState::REPLACE),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: Some(cull),
            ..Default::default()
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: wgpu::TextureFormat::Depth32Float,
            depth_write_enabled: true,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: Default::default(),
            bias: Default::default(),
        }),
        multisample: Default::default(),
        multiview: None,
        cache: None,
    })
}

/// RGBA8 sRGB texture, sampled in shaders and written from the CPU.
fn create_bound_texture(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    sampler: &wgpu::Sampler,
    name: &str,
    (width, height): (u32, u32),
) -> BoundTexture {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some(&format!("{name}_texture")),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    let view = texture.create_view(&Default::default());
    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some(&format!("{name}_bind_group")),
        layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::TextureView(&view),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    });
    BoundTexture {
        texture,
        bind_group,
        width,
        height,
    }
}

/// Copy tightly packed RGBA8 rows into a texture rectangle.
fn write_region(queue: &wgpu::Queue, texture: &wgpu::Texture, rect: PixelRect, data: &[u8]) {
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d {
                x: rect.x,
                y: rect.y,
                z: 0,
            },
            aspect: wgpu::TextureAspect::All,
        },
        data,
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(rect.width * 4),
            rows_per_image: Some(rect.height),
        },
        wgpu::Extent3d {
            width: rect.width,
            height: rect.height,
            depth_or_array_layers: 1,
        },
    );
}

fn create_depth_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("depth_texture"),
        size: wgpu::Extent3d {
            width: width.max(1),
            height: height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Depth32Float,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&Default::default())
}
