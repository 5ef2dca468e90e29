//! Parametric geometry.
//!
//! Shapes are described by a handful of numbers and turned into triangle
//! meshes on demand. Conventions follow the usual web 3D toolkits: boxes,
//! cones and spheres are centred on the origin, cones point up (+Y) and
//! planes lie in XY facing +Z. Triangles wind counter-clockwise when seen
//! from the side their normals point to. Texture coordinates have v = 0 at
//! the top edge, as wgpu samples images.

use std::f32::consts::{PI, TAU};

use cgmath::{InnerSpace, Vector3};

use crate::{
    data_structures::model::{MeshData, ModelVertex},
    resources::mesh::compute_tangents,
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Geometry {
    Box {
        width: f32,
        height: f32,
        depth: f32,
    },
    Cone {
        radius: f32,
        height: f32,
        radial_segments: u32,
    },
    Sphere {
        radius: f32,
        width_segments: u32,
        height_segments: u32,
    },
    Plane {
        width: f32,
        height: f32,
        width_segments: u32,
        height_segments: u32,
    },
}

impl Geometry {
    pub fn cuboid(width: f32, height: f32, depth: f32) -> Self {
        Geometry::Box {
            width,
            height,
            depth,
        }
    }

    pub fn cone(radius: f32, height: f32, radial_segments: u32) -> Self {
        Geometry::Cone {
            radius,
            height,
            radial_segments: radial_segments.max(3),
        }
    }

    pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Self {
        Geometry::Sphere {
            radius,
            width_segments: width_segments.max(3),
            height_segments: height_segments.max(2),
        }
    }

    pub fn plane(width: f32, height: f32) -> Self {
        Self::subdivided_plane(width, height, 1, 1)
    }

    /// A plane with enough vertices for a displacement map to move.
    pub fn subdivided_plane(width: f32, height: f32, width_segments: u32, height_segments: u32) -> Self {
        Geometry::Plane {
            width,
            height,
            width_segments: width_segments.max(1),
            height_segments: height_segments.max(1),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Geometry::Box { .. } => "box",
            Geometry::Cone { .. } => "cone",
            Geometry::Sphere { .. } => "sphere",
            Geometry::Plane { .. } => "plane",
        }
    }

    /// Triangulates the shape, with tangent frames filled in.
    pub fn mesh_data(&self) -> MeshData {
        let mut data = MeshData::default();
        match *self {
            Geometry::Box {
                width,
                height,
                depth,
            } => build_box(&mut data, width, height, depth),
            Geometry::Cone {
                radius,
                height,
                radial_segments,
            } => build_cone(&mut data, radius, height, radial_segments),
            Geometry::Sphere {
                radius,
                width_segments,
                height_segments,
            } => build_sphere(&mut data, radius, width_segments, height_segments),
            Geometry::Plane {
                width,
                height,
                width_segments,
                height_segments,
            } => push_grid(
                &mut data,
                Face {
                    centre: Vector3::new(0.0, 0.0, 0.0),
                    u: Vector3::unit_x(),
                    v: Vector3::unit_y(),
                    half_u: width / 2.0,
                    half_v: height / 2.0,
                },
                width_segments,
                height_segments,
            ),
        }
        compute_tangents(&mut data);
        data
    }
}

/// A flat rectangle spanned by two unit axes with `u x v` as its normal.
struct Face {
    centre: Vector3<f32>,
    u: Vector3<f32>,
    v: Vector3<f32>,
    half_u: f32,
    half_v: f32,
}

fn vertex(position: Vector3<f32>, tex_coords: [f32; 2], normal: Vector3<f32>) -> ModelVertex {
    ModelVertex {
        position: position.into(),
        tex_coords,
        normal: normal.into(),
        ..Default::default()
    }
}

fn push_grid(data: &mut MeshData, face: Face, segments_u: u32, segments_v: u32) {
    let base = data.vertices.len() as u32;
    let normal = face.u.cross(face.v);
    let stride = segments_u + 1;

    for iv in 0..=segments_v {
        let tv = iv as f32 / segments_v as f32;
        let along_v = face.half_v - tv * 2.0 * face.half_v;
        for iu in 0..=segments_u {
            let tu = iu as f32 / segments_u as f32;
            let along_u = -face.half_u + tu * 2.0 * face.half_u;
            let position = face.centre + face.u * along_u + face.v * along_v;
            data.vertices.push(vertex(position, [tu, tv], normal));
        }
    }

    for iv in 0..segments_v {
        for iu in 0..segments_u {
            let a = base + iv * stride + iu;
            let b = base + (iv + 1) * stride + iu;
            let c = base + (iv + 1) * stride + iu + 1;
            let d = base + iv * stride + iu + 1;
            data.indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }
}

fn build_box(data: &mut MeshData, width: f32, height: f32, depth: f32) {
    let (hw, hh, hd) = (width / 2.0, height / 2.0, depth / 2.0);
    let x = Vector3::unit_x();
    let y = Vector3::unit_y();
    let z = Vector3::unit_z();
    let faces = [
        // +X, -X
        Face { centre: x * hw, u: -z, v: y, half_u: hd, half_v: hh },
        Face { centre: -x * hw, u: z, v: y, half_u: hd, half_v: hh },
        // +Y, -Y
        Face { centre: y * hh, u: x, v: -z, half_u: hw, half_v: hd },
        Face { centre: -y * hh, u: x, v: z, half_u: hw, half_v: hd },
        // +Z, -Z
        Face { centre: z * hd, u: x, v: y, half_u: hw, half_v: hh },
        Face { centre: -z * hd, u: -x, v: y, half_u: hw, half_v: hh },
    ];
    for face in faces {
        push_grid(data, face, 1, 1);
    }
}

fn build_sphere(data: &mut MeshData, radius: f32, width_segments: u32, height_segments: u32) {
    let stride = width_segments + 1;

    for iy in 0..=height_segments {
        let v = iy as f32 / height_segments as f32;
        // pole vertices sit in the middle of their segment
        let u_offset = if iy == 0 {
            0.5 / width_segments as f32
        } else if iy == height_segments {
            -0.5 / width_segments as f32
        } else {
            0.0
        };
        for ix in 0..=width_segments {
            let u = ix as f32 / width_segments as f32;
            let (sin_phi, cos_phi) = (u * TAU).sin_cos();
            let (sin_theta, cos_theta) = (v * PI).sin_cos();
            let position = Vector3::new(
                -radius * cos_phi * sin_theta,
                radius * cos_theta,
                radius * sin_phi * sin_theta,
            );
            let normal = if position.magnitude2() > 0.0 {
                position.normalize()
            } else {
                Vector3::unit_y()
            };
            data.vertices.push(vertex(position, [u + u_offset, v], normal));
        }
    }

    for iy in 0..height_segments {
        for ix in 0..width_segments {
            let a = iy * stride + ix + 1;
            let b = iy * stride + ix;
            let c = (iy + 1) * stride + ix;
            let d = (iy + 1) * stride + ix + 1;
            if iy != 0 {
                data.indices.extend_from_slice(&[a, b, d]);
            }
            if iy != height_segments - 1 {
                data.indices.extend_from_slice(&[b, c, d]);
            }
        }
    }
}

fn build_cone(data: &mut MeshData, radius: f32, height: f32, radial_segments: u32) {
    let half_height = height / 2.0;
    let slope = radius / height;
    let stride = radial_segments + 1;

    // Torso: row 0 is the apex ring, row 1 the base ring.
    for row in 0..=1u32 {
        let ring_radius = row as f32 * radius;
        let y = half_height - row as f32 * height;
        for x in 0..=radial_segments {
            let u = x as f32 / radial_segments as f32;
            let (sin, cos) = (u * TAU).sin_cos();
            let position = Vector3::new(ring_radius * sin, y, ring_radius * cos);
            let normal = Vector3::new(sin, slope, cos).normalize();
            data.vertices.push(vertex(position, [u, row as f32], normal));
        }
    }
    for x in 0..radial_segments {
        let b = stride + x;
        let c = stride + x + 1;
        let d = x + 1;
        data.indices.extend_from_slice(&[b, c, d]);
    }

    // Base cap.
    let down = -Vector3::unit_y();
    let centre_start = data.vertices.len() as u32;
    for _ in 0..radial_segments {
        data.vertices
            .push(vertex(Vector3::new(0.0, -half_height, 0.0), [0.5, 0.5], down));
    }
    let rim_start = data.vertices.len() as u32;
    for x in 0..=radial_segments {
        let u = x as f32 / radial_segments as f32;
        let (sin, cos) = (u * TAU).sin_cos();
        let position = Vector3::new(radius * sin, -half_height, radius * cos);
        data.vertices
            .push(vertex(position, [cos * 0.5 + 0.5, sin * 0.5 + 0.5], down));
    }
    for x in 0..radial_segments {
        let c = centre_start + x;
        let i = rim_start + x;
        data.indices.extend_from_slice(&[i + 1, i, c]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face_normal(tri: [&ModelVertex; 3]) -> Vector3<f32> {
        let p0 = Vector3::from(tri[0].position);
        let p1 = Vector3::from(tri[1].position);
        let p2 = Vector3::from(tri[2].position);
        (p1 - p0).cross(p2 - p0)
    }

    fn assert_winding_matches_normals(geometry: Geometry) {
        let data = geometry.mesh_data();
        assert!(!data.indices.is_empty());
        for tri in data.triangles() {
            let n = face_normal(tri);
            if n.magnitude2() < 1e-12 {
                continue;
            }
            for v in tri {
                assert!(
                    n.dot(Vector3::from(v.normal)) > 0.0,
                    "{} triangle winds against its normals",
                    geometry.name()
                );
            }
        }
    }

    #[test]
    fn winding_agrees_with_normals() {
        assert_winding_matches_normals(Geometry::cuboid(4.0, 2.5, 4.0));
        assert_winding_matches_normals(Geometry::cone(3.5, 1.0, 4));
        assert_winding_matches_normals(Geometry::sphere(1.0, 16, 16));
        assert_winding_matches_normals(Geometry::plane(20.0, 20.0));
        assert_winding_matches_normals(Geometry::subdivided_plane(2.2, 2.2, 100, 100));
    }

    #[test]
    fn vertex_and_index_counts() {
        let cube = Geometry::cuboid(1.0, 1.0, 1.0).mesh_data();
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.indices.len(), 36);

        let door = Geometry::subdivided_plane(2.2, 2.2, 100, 100).mesh_data();
        assert_eq!(door.vertices.len(), 101 * 101);
        assert_eq!(door.indices.len(), 100 * 100 * 6);

        let roof = Geometry::cone(3.5, 1.0, 4).mesh_data();
        // torso rings + cap centres + cap rim
        assert_eq!(roof.vertices.len(), 5 * 2 + 4 + 5);
        assert_eq!(roof.indices.len(), 4 * 3 + 4 * 3);

        let bush = Geometry::sphere(1.0, 16, 16).mesh_data();
        assert_eq!(bush.vertices.len(), 17 * 17);
        assert_eq!(bush.indices.len(), (16 * 16 * 2 - 2 * 16) * 3);
    }

    #[test]
    fn box_extents() {
        let data = Geometry::cuboid(0.6, 0.8, 0.2).mesh_data();
        let max = data.vertices.iter().fold([f32::MIN; 3], |acc, v| {
            [
                acc[0].max(v.position[0]),
                acc[1].max(v.position[1]),
                acc[2].max(v.position[2]),
            ]
        });
        assert!((max[0] - 0.3).abs() < 1e-6);
        assert!((max[1] - 0.4).abs() < 1e-6);
        assert!((max[2] - 0.1).abs() < 1e-6);
    }

    #[test]
    fn cone_apex_and_base() {
        let data = Geometry::cone(3.5, 1.0, 4).mesh_data();
        let top = data
            .vertices
            .iter()
            .map(|v| v.position[1])
            .fold(f32::MIN, f32::max);
        let bottom = data
            .vertices
            .iter()
            .map(|v| v.position[1])
            .fold(f32::MAX, f32::min);
        assert!((top - 0.5).abs() < 1e-6);
        assert!((bottom + 0.5).abs() < 1e-6);
    }

    #[test]
    fn plane_uvs_cover_the_unit_square() {
        let data = Geometry::plane(20.0, 20.0).mesh_data();
        let uvs: Vec<_> = data.vertices.iter().map(|v| v.tex_coords).collect();
        assert!(uvs.contains(&[0.0, 0.0]));
        assert!(uvs.contains(&[1.0, 1.0]));
        // top left corner of the image sits at the top left of the plane
        let top_left = data
            .vertices
            .iter()
            .find(|v| v.tex_coords == [0.0, 0.0])
            .map(|v| v.position);
        assert_eq!(top_left, Some([-10.0, 10.0, 0.0]));
    }
}
