//! Scene graph and hierarchical scene organization.
//!
//! A slot is a [`ContainerNode`] (the positioning group that tilts) holding a
//! [`ModelNode`] (the recentred asset). World transforms flow from parent to
//! child in [`SceneNode::update_world_transforms`] and reach the GPU through
//! [`SceneNode::write_to_buffers`].

use cgmath::{Matrix4, SquareMatrix};
use wgpu::util::DeviceExt;

use crate::{
    data_structures::{
        bounds::Aabb,
        instance::{Instance, InstanceRaw},
        model,
    },
    render::{Instanced, Render},
};

pub trait SceneNode {
    fn get_local_transform(&self) -> &Instance;

    fn set_local_transform(&mut self, instance: Instance);

    fn set_local_transform_with(&mut self, mutation: &mut dyn FnMut(&mut Instance));

    fn get_world_transform(&self) -> Matrix4<f32>;

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>>;

    fn add_child(&mut self, child: Box<dyn SceneNode>);

    /**
     * Recomputes this node's world matrix as `parent * local` and passes it down.
     */
    fn update_world_transforms(&mut self, parents_world_transform: &Matrix4<f32>);

    fn update_world_transform_all(&mut self) {
        self.update_world_transforms(&Matrix4::identity());
    }

    fn write_to_buffers(&mut self, queue: &wgpu::Queue);

    fn get_render(&self) -> Vec<Instanced<'_>>;
}

impl<'a> From<&'a dyn SceneNode> for Render<'a> {
    fn from(sn: &'a dyn SceneNode) -> Self {
        Render::split_by_alpha(sn.get_render())
    }
}

/// A transform-only node. Slots use it as their positioning group.
pub struct ContainerNode {
    pub children: Vec<Box<dyn SceneNode>>,
    local: Instance,
    world: Matrix4<f32>,
}

impl ContainerNode {
    pub fn new(local: Instance) -> Self {
        Self {
            children: Vec::new(),
            local,
            world: Matrix4::identity(),
        }
    }
}

impl SceneNode for ContainerNode {
    fn get_local_transform(&self) -> &Instance {
        &self.local
    }

    fn set_local_transform(&mut self, instance: Instance) {
        self.local = instance;
    }

    fn set_local_transform_with(&mut self, mutation: &mut dyn FnMut(&mut Instance)) {
        mutation(&mut self.local);
    }

    fn get_world_transform(&self) -> Matrix4<f32> {
        self.world
    }

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>> {
        &self.children
    }

    fn add_child(&mut self, child: Box<dyn SceneNode>) {
        self.children.push(child);
    }

    fn update_world_transforms(&mut self, parents_world_transform: &Matrix4<f32>) {
        self.world = parents_world_transform * self.local.to_matrix();
        for child in self.children.iter_mut() {
            child.update_world_transforms(&self.world);
        }
    }

    fn write_to_buffers(&mut self, queue: &wgpu::Queue) {
        self.children
            .iter_mut()
            .for_each(|child| child.write_to_buffers(queue));
    }

    fn get_render(&self) -> Vec<Instanced<'_>> {
        self.children
            .iter()
            .flat_map(|child| child.get_render())
            .collect()
    }
}

/// A loaded asset. Every mesh keeps the transform its glTF node hierarchy
/// gave it and gets its own single-instance buffer.
pub struct ModelNode {
    children: Vec<Box<dyn SceneNode>>,
    model: model::Model,
    mesh_transforms: Vec<Matrix4<f32>>,
    instance_buffers: Vec<wgpu::Buffer>,
    world_transforms: Vec<Matrix4<f32>>,
    local: Instance,
    world: Matrix4<f32>,
    bounds: Aabb,
    id: u32,
}

impl ModelNode {
    /// `mesh_transforms[i]` places `model.meshes[i]` in model space, and
    /// `bounds` covers all vertices after that placement.
    pub fn new(
        id: u32,
        device: &wgpu::Device,
        model: model::Model,
        mesh_transforms: Vec<Matrix4<f32>>,
        bounds: Aabb,
    ) -> Self {
        let instance_buffers = mesh_transforms
            .iter()
            .zip(model.meshes.iter())
            .map(|(transform, mesh)| {
                device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{} Instance Buffer", mesh.name)),
                    contents: bytemuck::cast_slice(&[InstanceRaw::from_matrix(*transform)]),
                    usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
                })
            })
            .collect();
        let world_transforms = mesh_transforms.clone();

        Self {
            children: Vec::new(),
            model,
            mesh_transforms,
            instance_buffers,
            world_transforms,
            local: Instance::default(),
            world: Matrix4::identity(),
            bounds,
            id,
        }
    }

    /// Shift the model so that the centre of its bounding box sits at the
    /// node's origin.
    pub fn recenter(&mut self) {
        self.local.position = -self.bounds.center();
    }
}

impl SceneNode for ModelNode {
    fn get_local_transform(&self) -> &Instance {
        &self.local
    }

    fn set_local_transform(&mut self, instance: Instance) {
        self.local = instance;
    }

    fn set_local_transform_with(&mut self, mutation: &mut dyn FnMut(&mut Instance)) {
        mutation(&mut self.local);
    }

    fn get_world_transform(&self) -> Matrix4<f32> {
        self.world
    }

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>> {
        &self.children
    }

    fn add_child(&mut self, child: Box<dyn SceneNode>) {
        self.children.push(child);
    }

    fn update_world_transforms(&mut self, parents_world_transform: &Matrix4<f32>) {
        self.world = parents_world_transform * self.local.to_matrix();
        self.world_transforms = self
            .mesh_transforms
            .iter()
            .map(|mesh_transform| self.world * mesh_transform)
            .collect();
        for child in self.children.iter_mut() {
            child.update_world_transforms(&self.world);
        }
    }

    fn write_to_buffers(&mut self, queue: &wgpu::Queue) {
        for (buffer, world) in self
            .instance_buffers
            .iter()
            .zip(self.world_transforms.iter())
        {
            queue.write_buffer(
                buffer,
                0,
                bytemuck::cast_slice(&[InstanceRaw::from_matrix(*world)]),
            );
        }
        self.children
            .iter_mut()
            .for_each(|child| child.write_to_buffers(queue));
    }

    fn get_render(&self) -> Vec<Instanced<'_>> {
        let own = self
            .model
            .meshes
            .iter()
            .zip(self.instance_buffers.iter())
            .filter_map(|(mesh, instance)| {
                let material = self.model.materials.get(mesh.material)?;
                Some(Instanced {
                    instance,
                    mesh,
                    material,
                    amount: 1,
                    id: self.id,
                })
            });
        self.children
            .iter()
            .flat_map(|child| child.get_render())
            .chain(own)
            .collect()
    }
}
