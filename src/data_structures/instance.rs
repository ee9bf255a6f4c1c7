//! Instance transformation data for GPU rendering.
//!
//! Per-instance data like position, rotation, and scale is stored as
//! GPU buffers and passed to shaders. Every mesh of a slot is drawn as one
//! instance whose matrix is the slot transform times the baked node transform.

use std::ops::Mul;

use cgmath::{Matrix, Matrix3, Matrix4, One, Rotation3, SquareMatrix};

use crate::data_structures::model;

/// Per-instance transformation: position, rotation (as quaternion), and scale.
#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    pub position: cgmath::Vector3<f32>,
    pub rotation: cgmath::Quaternion<f32>,
    pub scale: cgmath::Vector3<f32>,
}

impl Instance {
    /// Create a new instance with identity transformation (no move, rotate, or scale).
    pub fn new() -> Self {
        Self {
            position: cgmath::Vector3::new(0.0, 0.0, 0.0),
            // `Quaternion::one()` is the identity quaternion (no rotation)
            rotation: cgmath::Quaternion::one(),
            scale: cgmath::Vector3::new(1.0, 1.0, 1.0),
        }
    }

    /// Rotation from XYZ Euler angles: `pitch` about X applied after `yaw` about Y.
    pub fn set_euler_xy(&mut self, pitch: f32, yaw: f32) {
        self.rotation = cgmath::Quaternion::from_angle_x(cgmath::Rad(pitch))
            * cgmath::Quaternion::from_angle_y(cgmath::Rad(yaw));
    }

    pub fn to_matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from(self.rotation)
            * Matrix4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    pub fn to_raw(&self) -> InstanceRaw {
        InstanceRaw::from_matrix(self.to_matrix())
    }
}

impl Default for Instance {
    fn default() -> Self {
        Self::new()
    }
}

impl From<cgmath::Vector3<f32>> for Instance {
    fn from(position: cgmath::Vector3<f32>) -> Self {
        Instance {
            position,
            ..Default::default()
        }
    }
}

impl<'a> Mul<Matrix4<f32>> for &'a Instance {
    type Output = Matrix4<f32>;

    fn mul(self, rhs: Matrix4<f32>) -> Self::Output {
        self.to_matrix() * rhs
    }
}

/**
 * The raw instance is the actual data stored on the GPU
 */
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct InstanceRaw {
    model: [[f32; 4]; 4],
    normal: [[f32; 3]; 3],
}

impl InstanceRaw {
    /// Pack a world matrix. Normals use the inverse transpose so that
    /// non-uniformly scaled glTF nodes still shade correctly.
    pub fn from_matrix(world: Matrix4<f32>) -> Self {
        let linear = Matrix3::from_cols(world.x.truncate(), world.y.truncate(), world.z.truncate());
        let normal = linear
            .invert()
            .map(|inverse| inverse.transpose())
            .unwrap_or_else(Matrix3::identity);
        Self {
            model: world.into(),
            normal: normal.into(),
        }
    }
}

/**
 * As we store vertex data directly in the GPU memory we need to tell what the bytes refer to:
 *
 * offset: zero as we want to use the full space.
 * stride: length of a vertex
 *
 * Stride layout here: world matrix as four vec4s followed by the normal matrix as three vec3s
 */
impl model::Vertex for InstanceRaw {
    fn desc() -> wgpu::VertexBufferLayout<'static> {
        use std::mem;
        wgpu::VertexBufferLayout {
            array_stride: mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            // The shader only advances to the next instance when it starts a new instance
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 5,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // A mat4 takes up 4 vertex slots as it is technically 4 vec4s.
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 6,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 7,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 12]>() as wgpu::BufferAddress,
                    shader_location: 8,
                    format: wgpu::VertexFormat::Float32x4,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 16]>() as wgpu::BufferAddress,
                    shader_location: 9,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 19]>() as wgpu::BufferAddress,
                    shader_location: 10,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: mem::size_of::<[f32; 22]>() as wgpu::BufferAddress,
                    shader_location: 11,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{Vector3, Vector4};

    #[test]
    fn identity_instance_is_identity_matrix() {
        assert_eq!(Instance::new().to_matrix(), Matrix4::identity());
    }

    #[test]
    fn zero_tilt_keeps_rotation_identity() {
        let mut instance = Instance::new();
        instance.set_euler_xy(0.0, 0.0);
        assert_eq!(instance.rotation, cgmath::Quaternion::one());
    }

    #[test]
    fn yaw_turns_forward_axis_toward_x() {
        let mut instance = Instance::new();
        instance.set_euler_xy(0.0, std::f32::consts::FRAC_PI_2);
        let turned = instance.to_matrix() * Vector4::new(0.0, 0.0, 1.0, 0.0);
        assert!((turned.x - 1.0).abs() < 1e-5);
        assert!(turned.z.abs() < 1e-5);
    }

    #[test]
    fn translation_is_applied_after_local_matrix() {
        let instance = Instance::from(Vector3::new(10.0, 0.0, 0.0));
        let local = Matrix4::from_translation(Vector3::new(0.0, -2.0, 0.0));
        let world = &instance * local;
        assert_eq!(world.w.truncate(), Vector3::new(10.0, -2.0, 0.0));
    }

    #[test]
    fn normal_matrix_undoes_non_uniform_scale() {
        let raw = InstanceRaw::from_matrix(Matrix4::from_nonuniform_scale(2.0, 1.0, 1.0));
        assert_eq!(raw.normal[0][0], 0.5);
        assert_eq!(raw.normal[1][1], 1.0);
    }
}
