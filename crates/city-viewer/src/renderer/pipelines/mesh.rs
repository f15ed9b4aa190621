// Lit, textured triangle meshes: one ambient and one directional light,
// Lambert diffuse.

use crate::camera::PerspectiveCamera;
use crate::data::MeshVertex;
use crate::scene::SceneGraph;
use glam::Mat4;
use std::f32::consts::PI;

const MESH_WGSL: &str = r#"
struct Frame {
    view_proj:   mat4x4<f32>,
    light_dir:   vec4<f32>,
    light_color: vec4<f32>,
    ambient:     vec4<f32>,
}

struct Material {
    base_color: vec4<f32>,
}

struct Object {
    model:  mat4x4<f32>,
    normal: mat4x4<f32>,
}

@group(0) @binding(0) var<uniform> frame: Frame;
@group(1) @binding(0) var<uniform> material: Material;
@group(1) @binding(1) var t_base: texture_2d<f32>;
@group(1) @binding(2) var s_base: sampler;
@group(2) @binding(0) var<uniform> object: Object;

struct VSIn {
    @location(0) position: vec3<f32>,
    @location(1) normal:   vec3<f32>,
    @location(2) uv:       vec2<f32>,
    @location(3) color:    vec4<f32>,
}

struct VSOut {
    @builtin(position) clip: vec4<f32>,
    @location(0)     normal: vec3<f32>,
    @location(1)         uv: vec2<f32>,
    @location(2)      color: vec4<f32>,
}

@vertex
fn vs_main(input: VSIn) -> VSOut {
    var out: VSOut;
    out.clip = frame.view_proj * object.model * vec4<f32>(input.position, 1.0);
    out.normal = (object.normal * vec4<f32>(input.normal, 0.0)).xyz;
    out.uv = input.uv;
    out.color = input.color;
    return out;
}

@fragment
fn fs_main(input: VSOut, @builtin(front_facing) front: bool) -> @location(0) vec4<f32> {
    var n = normalize(input.normal);
    if (!front) {
        n = -n;
    }
    let albedo = material.base_color * input.color * textureSample(t_base, s_base, input.uv);
    let n_dot_l = max(dot(n, frame.light_dir.xyz), 0.0);
    // light_color and ambient arrive pre-divided by pi.
    let irradiance = frame.ambient.rgb + frame.light_color.rgb * n_dot_l;
    return vec4<f32>(albedo.rgb * irradiance, 1.0);
}
"#;

const VERTEX_ATTRS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
    0 => Float32x3,
    1 => Float32x3,
    2 => Float32x2,
    3 => Float32x4,
];

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct FrameUniforms {
    pub view_proj: Mat4,        // 64 B
    /// Unit vector towards the light; w unused.
    pub light_dir: [f32; 4],    // +16 -> 80
    pub light_color: [f32; 4],  // +16 -> 96
    pub ambient: [f32; 4],      // +16 -> 112
}

const _: [(); 112] = [(); core::mem::size_of::<FrameUniforms>()];

impl FrameUniforms {
    pub fn new(scene: &SceneGraph, camera: &PerspectiveCamera) -> Self {
        let sun = &scene.directional;
        let sun_rgb = sun.color.0 * sun.intensity / PI;
        let amb_rgb = scene.ambient.color.0 * scene.ambient.intensity / PI;
        Self {
            view_proj: camera.view_proj(),
            light_dir: sun.to_light().extend(0.0).to_array(),
            light_color: sun_rgb.extend(1.0).to_array(),
            ambient: amb_rgb.extend(1.0).to_array(),
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniforms {
    pub base_color: [f32; 4],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniforms {
    pub model: Mat4,
    pub normal: Mat4,
}

const _: [(); 128] = [(); core::mem::size_of::<ObjectUniforms>()];

impl ObjectUniforms {
    pub fn new(world: Mat4) -> Self {
        let normal = if world.determinant().abs() > f32::EPSILON {
            world.inverse().transpose()
        } else {
            world
        };
        Self { model: world, normal }
    }
}

pub struct MeshPipeline {
    /// Back faces culled.
    culled: wgpu::RenderPipeline,
    double_sided: wgpu::RenderPipeline,
    pub frame_layout: wgpu::BindGroupLayout,
    pub material_layout: wgpu::BindGroupLayout,
    pub object_layout: wgpu::BindGroupLayout,
    frame_ubo: wgpu::Buffer,
    frame_bind: wgpu::BindGroup,
}

impl MeshPipeline {
    pub fn new(
        device: &wgpu::Device,
        color_fmt: wgpu::TextureFormat,
        depth_fmt: wgpu::TextureFormat,
    ) -> Self {
        let uniform_entry = |binding, dynamic| wgpu::BindGroupLayoutEntry {
            binding,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: dynamic,
                min_binding_size: None,
            },
            count: None,
        };

        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Mesh Frame BGL"),
            entries: &[uniform_entry(0, false)],
        });
        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Mesh Material BGL"),
            entries: &[
                uniform_entry(0, false),
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });
        let object_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Mesh Object BGL"),
            entries: &[uniform_entry(0, true)],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("mesh.wgsl"),
            source: wgpu::ShaderSource::Wgsl(MESH_WGSL.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Mesh PipelineLayout"),
            bind_group_layouts: &[&frame_layout, &material_layout, &object_layout],
            push_constant_ranges: &[],
        });

        let make_pipeline = |label: &str, cull_mode| {
            device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
                label: Some(label),
                layout: Some(&pipeline_layout),
                vertex: wgpu::VertexState {
                    module: &shader,
                    entry_point: "vs_main",
                    buffers: &[wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<MeshVertex>() as u64,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &VERTEX_ATTRS,
                    }],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                },
                primitive: wgpu::PrimitiveState {
                    topology: wgpu::PrimitiveTopology::TriangleList,
                    front_face: wgpu::FrontFace::Ccw,
                    cull_mode,
                    ..Default::default()
                },
                depth_stencil: Some(wgpu::DepthStencilState {
                    format: depth_fmt,
                    depth_write_enabled: true,
                    depth_compare: wgpu::CompareFunction::LessEqual,
                    stencil: wgpu::StencilState::default(),
                    bias: wgpu::DepthBiasState::default(),
                }),
                fragment: Some(wgpu::FragmentState {
                    module: &shader,
                    entry_point: "fs_main",
                    targets: &[Some(wgpu::ColorTargetState {
                        format: color_fmt,
                        blend: None,
                        write_mask: wgpu::ColorWrites::ALL,
                    })],
                    compilation_options: wgpu::PipelineCompilationOptions::default(),
                }),
                multisample: wgpu::MultisampleState::default(),
                multiview: None,
            })
        };
        let culled = make_pipeline("Mesh Pipeline", Some(wgpu::Face::Back));
        let double_sided = make_pipeline("Mesh Pipeline (double-sided)", None);

        let frame_ubo = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Mesh Frame UBO"),
            size: std::mem::size_of::<FrameUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let frame_bind = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Mesh Frame Bind"),
            layout: &frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_ubo.as_entire_binding(),
            }],
        });

        Self {
            culled,
            double_sided,
            frame_layout,
            material_layout,
            object_layout,
            frame_ubo,
            frame_bind,
        }
    }

    pub fn write_frame(&self, queue: &wgpu::Queue, scene: &SceneGraph, camera: &PerspectiveCamera) {
        queue.write_buffer(
            &self.frame_ubo,
            0,
            bytemuck::bytes_of(&FrameUniforms::new(scene, camera)),
        );
    }

    pub fn frame_bind(&self) -> &wgpu::BindGroup {
        &self.frame_bind
    }

    pub fn pipeline(&self, double_sided: bool) -> &wgpu::RenderPipeline {
        if double_sided {
            &self.double_sided
        } else {
            &self.culled
        }
    }
}
