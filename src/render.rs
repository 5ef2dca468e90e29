//! Drawing a [`Scene`] with wgpu.
//!
//! Nodes that share both a geometry and a material (`Rc` identity) are
//! collected into one instanced batch, uploaded once. GPU meshes, textures
//! and material bind groups are cached by the address of the shared value
//! they were built from; textures and materials are rebuilt whenever their
//! version changes, which is how maps that finish loading after the first
//! frame show up.

use std::{collections::HashMap, iter, rc::Rc};

use wgpu::util::DeviceExt;

use crate::{
    context::Context,
    data_structures::{
        geometry::Geometry,
        instance::InstanceRaw,
        material::{MapSlot, Material},
        model::{DrawModel, GpuMesh},
        texture::{ColourSpace, Texture, TextureHandle, create_sampler},
    },
    resources::{mesh::load_mesh, texture::FIRST_MAP_BINDING},
    scene::Scene,
};

/**
 * Material constants as the shader reads them. See `MaterialParams` in
 * house.wgsl for the packing.
 */
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaterialUniform {
    colour: [f32; 4],
    uv: [f32; 4],
    pbr: [f32; 4],
}

impl MaterialUniform {
    pub fn from_material(material: &Material) -> Self {
        let [r, g, b]: [f32; 3] = material.colour.into();
        let [repeat_u, repeat_v] = material.sampling().repeat;
        let displacement = if material.maps.ready(MapSlot::Displacement).is_some() {
            material.displacement_scale
        } else {
            0.0
        };
        Self {
            colour: [r, g, b, material.opacity],
            uv: [repeat_u, repeat_v, displacement, 0.0],
            pbr: [material.metalness, material.roughness, 0.0, 0.0],
        }
    }

    pub fn repeat(&self) -> [f32; 2] {
        [self.uv[0], self.uv[1]]
    }

    pub fn displacement_scale(&self) -> f32 {
        self.uv[2]
    }
}

/// Every node drawing one geometry with one material.
pub struct Batch {
    pub geometry: Rc<Geometry>,
    pub material: Rc<Material>,
    pub instances: Vec<InstanceRaw>,
}

impl Batch {
    pub fn is_transparent(&self) -> bool {
        self.material.transparent
    }
}

/// Groups the scene's meshes into batches in first-seen order, opaque
/// batches before transparent ones.
pub fn plan_batches(scene: &Scene) -> Vec<Batch> {
    let mut batches: Vec<Batch> = Vec::new();
    let mut index: HashMap<(usize, usize), usize> = HashMap::new();
    for (transform, mesh) in scene.meshes() {
        let key = (
            Rc::as_ptr(&mesh.geometry) as usize,
            Rc::as_ptr(&mesh.material) as usize,
        );
        let i = *index.entry(key).or_insert_with(|| {
            batches.push(Batch {
                geometry: mesh.geometry.clone(),
                material: mesh.material.clone(),
                instances: Vec::new(),
            });
            batches.len() - 1
        });
        batches[i].instances.push(transform.to_raw());
    }
    // stable, so first-seen order holds within each group
    batches.sort_by_key(Batch::is_transparent);
    batches
}

struct GpuBatch {
    batch: Batch,
    instance_buffer: wgpu::Buffer,
}

struct GpuMaterial {
    version: u64,
    #[allow(unused)]
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// Stand-ins bound for absent maps so the shader can always sample.
struct DefaultMaps {
    white: Texture,
    black: Texture,
    flat_normal: Texture,
}

impl DefaultMaps {
    fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self {
            white: Texture::create_solid(
                device,
                queue,
                [255, 255, 255, 255],
                ColourSpace::Linear,
                "white map",
            ),
            black: Texture::create_solid(device, queue, [0, 0, 0, 255], ColourSpace::Linear, "black map"),
            flat_normal: Texture::create_solid(
                device,
                queue,
                [127, 127, 255, 255],
                ColourSpace::Linear,
                "flat normal map",
            ),
        }
    }

    fn for_slot(&self, slot: MapSlot) -> &Texture {
        match slot {
            MapSlot::Displacement => &self.black,
            MapSlot::Normal => &self.flat_normal,
            _ => &self.white,
        }
    }
}

#[derive(Default)]
pub struct SceneRenderer {
    batches: Option<Vec<GpuBatch>>,
    meshes: HashMap<usize, GpuMesh>,
    textures: HashMap<usize, (u64, Texture)>,
    materials: HashMap<usize, GpuMaterial>,
    defaults: Option<DefaultMaps>,
}

impl SceneRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Draws `scene` into the next surface texture. `overlay` runs after the
    /// scene pass with the same encoder and view, before submission.
    pub fn render(
        &mut self,
        ctx: &mut Context,
        scene: &Scene,
        clear_colour: wgpu::Color,
        overlay: impl FnOnce(&mut Context, &mut wgpu::CommandEncoder, &wgpu::TextureView),
    ) -> Result<(), wgpu::SurfaceError> {
        let output = ctx.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = ctx
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        self.encode(ctx, &mut encoder, &view, scene, clear_colour);
        overlay(ctx, &mut encoder, &view);

        ctx.queue.submit(iter::once(encoder.finish()));
        output.present();
        Ok(())
    }

    /// Records the scene pass into `encoder`, clearing `view` first.
    pub fn encode(
        &mut self,
        ctx: &Context,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        scene: &Scene,
        clear_colour: wgpu::Color,
    ) {
        self.prepare(ctx, scene);
        let Some(batches) = self.batches.as_ref() else {
            return;
        };

        let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Render Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(clear_colour),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                view: &ctx.depth_texture.view,
                depth_ops: Some(wgpu::Operations {
                    load: wgpu::LoadOp::Clear(1.0),
                    store: wgpu::StoreOp::Store,
                }),
                stencil_ops: None,
            }),
            occlusion_query_set: None,
            timestamp_writes: None,
        });

        let mut transparent = false;
        render_pass.set_pipeline(&ctx.pipelines.basic);
        for gpu in batches {
            if gpu.batch.is_transparent() && !transparent {
                transparent = true;
                render_pass.set_pipeline(&ctx.pipelines.transparent);
            }
            let (Some(mesh), Some(material)) = (
                self.meshes.get(&geometry_key(&gpu.batch.geometry)),
                self.materials.get(&material_key(&gpu.batch.material)),
            ) else {
                log::warn!("batch {:?} has no GPU resources", gpu.batch.material.name);
                continue;
            };
            render_pass.set_vertex_buffer(1, gpu.instance_buffer.slice(..));
            render_pass.draw_mesh_instanced(
                mesh,
                &material.bind_group,
                &ctx.camera.bind_group,
                &ctx.light.bind_group,
                0..gpu.batch.instances.len() as u32,
            );
        }
    }

    /// Uploads whatever is missing or out of date.
    fn prepare(&mut self, ctx: &Context, scene: &Scene) {
        let device = &ctx.device;
        let queue = &ctx.queue;
        if self.defaults.is_none() {
            self.defaults = Some(DefaultMaps::new(device, queue));
        }
        if self.batches.is_none() {
            let batches: Vec<GpuBatch> = plan_batches(scene)
                .into_iter()
                .map(|batch| GpuBatch {
                    instance_buffer: device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                        label: Some(&format!("{} Instance Buffer", batch.material.name)),
                        contents: bytemuck::cast_slice(&batch.instances),
                        usage: wgpu::BufferUsages::VERTEX,
                    }),
                    batch,
                })
                .collect();
            log::debug!("scene uploaded as {} instanced batches", batches.len());
            self.batches = Some(batches);
        }

        let Some(batches) = self.batches.as_ref() else {
            return;
        };
        for gpu in batches {
            let geometry = &gpu.batch.geometry;
            self.meshes
                .entry(geometry_key(geometry))
                .or_insert_with(|| load_mesh(device, geometry));

            let material = &gpu.batch.material;
            let version = material.version();
            let stale = self
                .materials
                .get(&material_key(material))
                .is_none_or(|cached| cached.version != version);
            if stale {
                for (_, handle) in material.maps.iter() {
                    update_texture(&mut self.textures, device, queue, handle);
                }
                if let Some(defaults) = self.defaults.as_ref() {
                    let built = build_material(
                        device,
                        &ctx.material_layout,
                        material,
                        &self.textures,
                        defaults,
                    );
                    self.materials.insert(material_key(material), built);
                }
            }
        }
    }
}

fn geometry_key(geometry: &Rc<Geometry>) -> usize {
    Rc::as_ptr(geometry) as usize
}

fn material_key(material: &Rc<Material>) -> usize {
    Rc::as_ptr(material) as usize
}

fn update_texture(
    textures: &mut HashMap<usize, (u64, Texture)>,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    handle: &TextureHandle,
) {
    let version = handle.version();
    if textures
        .get(&handle.key())
        .is_some_and(|(cached, _)| *cached == version)
    {
        return;
    }
    let url = handle.url();
    let uploaded = handle.with_image(|img| {
        Texture::from_image(
            device,
            queue,
            img,
            Some(url.as_str()),
            handle.colour_space(),
            &handle.sampling(),
        )
    });
    match uploaded {
        Some(texture) => {
            log::debug!("uploaded {url}");
            textures.insert(handle.key(), (version, texture));
        }
        None => {
            textures.remove(&handle.key());
        }
    }
}

fn build_material(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    material: &Material,
    textures: &HashMap<usize, (u64, Texture)>,
    defaults: &DefaultMaps,
) -> GpuMaterial {
    let uniform = MaterialUniform::from_material(material);
    let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(&format!("{} Material Buffer", material.name)),
        contents: bytemuck::cast_slice(&[uniform]),
        usage: wgpu::BufferUsages::UNIFORM,
    });
    let sampler = create_sampler(device, &material.sampling());

    let views: Vec<&wgpu::TextureView> = MapSlot::ALL
        .iter()
        .map(|slot| {
            material
                .maps
                .ready(*slot)
                .and_then(|handle| textures.get(&handle.key()))
                .map(|(_, texture)| &texture.view)
                .unwrap_or(&defaults.for_slot(*slot).view)
        })
        .collect();

    let mut entries = vec![
        wgpu::BindGroupEntry {
            binding: 0,
            resource: uniform_buffer.as_entire_binding(),
        },
        wgpu::BindGroupEntry {
            binding: 1,
            resource: wgpu::BindingResource::Sampler(&sampler),
        },
    ];
    entries.extend(views.iter().enumerate().map(|(i, view)| wgpu::BindGroupEntry {
        binding: FIRST_MAP_BINDING + i as u32,
        resource: wgpu::BindingResource::TextureView(view),
    }));

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout,
        entries: &entries,
        label: Some(&format!("{} Material Bind Group", material.name)),
    });

    GpuMaterial {
        version: material.version(),
        uniform_buffer,
        bind_group,
    }
}
