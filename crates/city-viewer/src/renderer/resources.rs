//! GPU copies of the scene's meshes, materials and textures.
//!
//! The scene only ever appends resources, so syncing uploads whatever lies
//! past the last uploaded index.

use super::pipelines::mesh::{MaterialUniforms, MeshPipeline, ObjectUniforms};
use crate::data::{MaterialData, TextureData};
use crate::scene::{MeshInstance, SceneGraph};
use wgpu::util::DeviceExt;

struct GpuPrimitive {
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    material: Option<usize>,
}

struct GpuTexture {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

struct GpuMaterial {
    _ubo: wgpu::Buffer,
    bind: wgpu::BindGroup,
    double_sided: bool,
}

/// Per-instance transforms, one dynamic-offset slot each.
struct ObjectBuffer {
    buffer: wgpu::Buffer,
    bind: wgpu::BindGroup,
    capacity: usize,
    stride: u64,
}

impl ObjectBuffer {
    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, capacity: usize) -> Self {
        let align = device.limits().min_uniform_buffer_offset_alignment as u64;
        let size = std::mem::size_of::<ObjectUniforms>() as u64;
        let stride = size.div_ceil(align) * align;
        let capacity = capacity.max(1);

        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Object UBO"),
            size: stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Object Bind"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(size),
                }),
            }],
        });
        Self {
            buffer,
            bind,
            capacity,
            stride,
        }
    }
}

pub struct GpuScene {
    textures: Vec<GpuTexture>,
    white: GpuTexture,
    sampler: wgpu::Sampler,
    materials: Vec<GpuMaterial>,
    default_material: GpuMaterial,
    meshes: Vec<Vec<GpuPrimitive>>,
    objects: ObjectBuffer,
    instances: Vec<MeshInstance>,
}

impl GpuScene {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue, pipeline: &MeshPipeline) -> Self {
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Material Sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let white = upload_texture(device, queue, &TextureData::white());
        let default_material = make_material(
            device,
            pipeline,
            &MaterialData::default(),
            &white.view,
            &sampler,
        );
        let objects = ObjectBuffer::new(device, &pipeline.object_layout, 64);

        Self {
            textures: Vec::new(),
            white,
            sampler,
            materials: Vec::new(),
            default_material,
            meshes: Vec::new(),
            objects,
            instances: Vec::new(),
        }
    }

    /// Uploads resources added to `scene` since the last call.
    pub fn sync(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pipeline: &MeshPipeline,
        scene: &SceneGraph,
    ) {
        for tex in &scene.textures()[self.textures.len().min(scene.textures().len())..] {
            self.textures.push(upload_texture(device, queue, tex));
        }
        for mat in &scene.materials()[self.materials.len().min(scene.materials().len())..] {
            let view = mat
                .base_color_texture
                .and_then(|i| self.textures.get(i))
                .map_or(&self.white.view, |t| &t.view);
            self.materials
                .push(make_material(device, pipeline, mat, view, &self.sampler));
        }
        let first_new = self.meshes.len();
        for mesh in &scene.meshes()[first_new.min(scene.meshes().len())..] {
            let prims = mesh
                .primitives
                .iter()
                .filter(|p| !p.indices.is_empty())
                .map(|p| GpuPrimitive {
                    vertex_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("Mesh VBO"),
                        contents: bytemuck::cast_slice(&p.vertices),
                        usage: wgpu::BufferUsages::VERTEX,
                    }),
                    index_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some("Mesh IBO"),
                        contents: bytemuck::cast_slice(&p.indices),
                        usage: wgpu::BufferUsages::INDEX,
                    }),
                    index_count: p.indices.len() as u32,
                    material: p.material,
                })
                .collect();
            self.meshes.push(prims);
        }
        if self.meshes.len() > first_new {
            log::info!(
                "Uploaded {} meshes, {} materials, {} textures to the GPU",
                self.meshes.len() - first_new,
                self.materials.len(),
                self.textures.len()
            );
        }
    }

    /// Writes this frame's instance transforms, growing the buffer if needed.
    pub fn write_instances(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pipeline: &MeshPipeline,
        scene: &SceneGraph,
    ) {
        self.instances = scene.mesh_instances();
        if self.instances.len() > self.objects.capacity {
            let capacity = self.instances.len().next_power_of_two();
            self.objects = ObjectBuffer::new(device, &pipeline.object_layout, capacity);
        }
        if self.instances.is_empty() {
            return;
        }

        let stride = self.objects.stride as usize;
        let mut staging = vec![0u8; stride * self.instances.len()];
        for (slot, inst) in staging.chunks_exact_mut(stride).zip(&self.instances) {
            let u = ObjectUniforms::new(inst.world);
            slot[..std::mem::size_of::<ObjectUniforms>()].copy_from_slice(bytemuck::bytes_of(&u));
        }
        queue.write_buffer(&self.objects.buffer, 0, &staging);
    }

    /// Records draws for the instances written by [`write_instances`](Self::write_instances).
    pub fn draw<'a>(&'a self, rpass: &mut wgpu::RenderPass<'a>, pipeline: &'a MeshPipeline) {
        rpass.set_bind_group(0, pipeline.frame_bind(), &[]);
        for (i, inst) in self.instances.iter().enumerate() {
            let Some(prims) = self.meshes.get(inst.mesh) else {
                continue;
            };
            let offset = (i as u64 * self.objects.stride) as u32;
            rpass.set_bind_group(2, &self.objects.bind, &[offset]);
            for prim in prims {
                let material = prim
                    .material
                    .and_then(|m| self.materials.get(m))
                    .unwrap_or(&self.default_material);
                rpass.set_pipeline(pipeline.pipeline(material.double_sided));
                rpass.set_bind_group(1, &material.bind, &[]);
                rpass.set_vertex_buffer(0, prim.vertex_buffer.slice(..));
                rpass.set_index_buffer(prim.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
                rpass.draw_indexed(0..prim.index_count, 0, 0..1);
            }
        }
    }
}

fn upload_texture(device: &wgpu::Device, queue: &wgpu::Queue, data: &TextureData) -> GpuTexture {
    let size = wgpu::Extent3d {
        width: data.width,
        height: data.height,
        depth_or_array_layers: 1,
    };
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Base Color Texture"),
        size,
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8UnormSrgb,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    queue.write_texture(
        wgpu::ImageCopyTexture {
            texture: &texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        &data.rgba,
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(4 * data.width),
            rows_per_image: Some(data.height),
        },
        size,
    );
    GpuTexture {
        view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
        _texture: texture,
    }
}

fn make_material(
    device: &wgpu::Device,
    pipeline: &MeshPipeline,
    data: &MaterialData,
    view: &wgpu::TextureView,
    sampler: &wgpu::Sampler,
) -> GpuMaterial {
    let ubo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Material UBO"),
        contents: bytemuck::bytes_of(&MaterialUniforms {
            base_color: data.base_color,
        }),
        usage: wgpu::BufferUsages::UNIFORM,
    });
    let bind = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("Material Bind"),
        layout: &pipeline.material_layout,
        entries: &[
            wgpu::BindGroupEntry {
                binding: 0,
                resource: ubo.as_entire_binding(),
            },
            wgpu::BindGroupEntry {
                binding: 1,
                resource: wgpu::BindingResource::TextureView(view),
            },
            wgpu::BindGroupEntry {
                binding: 2,
                resource: wgpu::BindingResource::Sampler(sampler),
            },
        ],
    });
    GpuMaterial {
        _ubo: ubo,
        bind,
        double_sided: data.double_sided,
    }
}
