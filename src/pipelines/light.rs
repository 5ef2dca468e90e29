use wgpu::util::DeviceExt;

use crate::lighting::LightingRig;

/// Door light plus three ghosts.
pub const MAX_POINT_LIGHTS: usize = 4;

pub struct LightResources {
    pub uniform: LightUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointLightRaw {
    position: [f32; 3],
    /// Zero means the light never fades out.
    distance: f32,
    /// Premultiplied by intensity.
    colour: [f32; 3],
    decay: f32,
}

/**
 * Uniforms require 16 byte alignment, so every vec3 is either widened to a
 * vec4 or shares its slot with a scalar.
 */
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    ambient: [f32; 4],
    /// Direction towards the moon.
    moon_direction: [f32; 4],
    moon_colour: [f32; 4],
    points: [PointLightRaw; MAX_POINT_LIGHTS],
}

impl LightUniform {
    pub fn from_rig(rig: &LightingRig) -> Self {
        let ambient = rig.ambient.colour.scaled(rig.ambient.intensity);
        let moon = rig.moon.colour.scaled(rig.moon.intensity);
        let direction: [f32; 3] = rig.moon.position.into();

        let mut points = [PointLightRaw::default(); MAX_POINT_LIGHTS];
        for (raw, light) in points.iter_mut().zip(rig.point_lights()) {
            *raw = PointLightRaw {
                position: light.position.into(),
                distance: light.distance,
                colour: light.colour.scaled(light.intensity),
                decay: light.decay,
            };
        }

        Self {
            ambient: [ambient[0], ambient[1], ambient[2], 1.0],
            moon_direction: [direction[0], direction[1], direction[2], 0.0],
            moon_colour: [moon[0], moon[1], moon[2], 1.0],
            points,
        }
    }

    pub fn point(&self, i: usize) -> Option<&PointLightRaw> {
        self.points.get(i)
    }
}

impl PointLightRaw {
    pub fn position(&self) -> [f32; 3] {
        self.position
    }
}

impl LightResources {
    pub fn new(device: &wgpu::Device, rig: &LightingRig) -> Self {
        let uniform = LightUniform::from_rig(rig);
        let buffer = mk_buffer(device, uniform);
        let bind_group_layout = mk_bind_group_layout(device);
        let bind_group = mk_bind_group(device, &bind_group_layout, &buffer);
        Self {
            uniform,
            buffer,
            bind_group,
            bind_group_layout,
        }
    }

    pub fn write(&mut self, queue: &wgpu::Queue, rig: &LightingRig) {
        self.uniform = LightUniform::from_rig(rig);
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&[self.uniform]));
    }
}

pub fn mk_buffer(device: &wgpu::Device, light_uniform: LightUniform) -> wgpu::Buffer {
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Light Buffer"),
        contents: bytemuck::cast_slice(&[light_uniform]),
        usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    })
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
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
        label: Some("light_bind_group_layout"),
    })
}

pub fn mk_bind_group(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    light_buffer: &wgpu::Buffer,
) -> wgpu::BindGroup {
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        layout: bind_group_layout,
        entries: &[wgpu::BindGroupEntry {
            binding: 0,
            resource: light_buffer.as_entire_binding(),
        }],
        label: Some("light_bind_group"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Preset;

    #[test]
    fn uniform_layout_is_aligned() {
        assert_eq!(std::mem::size_of::<PointLightRaw>(), 32);
        assert_eq!(std::mem::size_of::<LightUniform>() % 16, 0);
    }

    #[test]
    fn ghosts_follow_the_door_light() {
        let mut rig = LightingRig::new(Preset::Haunted);
        rig.animate(3.0);
        let uniform = LightUniform::from_rig(&rig);
        let door: [f32; 3] = rig.door.position.into();
        let ghost: [f32; 3] = rig.ghosts[2].light.position.into();
        assert_eq!(uniform.point(0).map(PointLightRaw::position), Some(door));
        assert_eq!(uniform.point(3).map(PointLightRaw::position), Some(ghost));
    }
}
