use super::Vertex;
use crate::binding;
use crate::camera;
use crate::binding::PipelineBinding;
use crate::engine::Engine;
use crate::game::Game;
use crate::gfx;
use crate::gfx::{CmdBuf, Device, SwapChain};
use crate::os;
use crate::upload;
use crate::Error;

use maths_rs::Mat4f;

pub const VERTICES: [Vertex; 8] = [
    Vertex { position: [-0.5, -0.5, -0.5], colour: [0.0, 0.0, 0.0, 1.0] },
    Vertex { position: [ 0.5, -0.5, -0.5], colour: [1.0, 0.0, 0.0, 1.0] },
    Vertex { position: [ 0.5,  0.5, -0.5], colour: [1.0, 1.0, 0.0, 1.0] },
    Vertex { position: [-0.5,  0.5, -0.5], colour: [0.0, 1.0, 0.0, 1.0] },
    Vertex { position: [-0.5, -0.5,  0.5], colour: [0.0, 0.0, 1.0, 1.0] },
    Vertex { position: [ 0.5, -0.5,  0.5], colour: [1.0, 0.0, 1.0, 1.0] },
    Vertex { position: [ 0.5,  0.5,  0.5], colour: [1.0, 1.0, 1.0, 1.0] },
    Vertex { position: [-0.5,  0.5,  0.5], colour: [0.0, 1.0, 1.0, 1.0] },
];

pub const INDICES: [u16; 36] = [
    0, 2, 1, 0, 3, 2, // front
    4, 5, 6, 4, 6, 7, // back
    0, 4, 7, 0, 7, 3, // left
    1, 2, 6, 1, 6, 5, // right
    3, 7, 6, 3, 6, 2, // top
    0, 1, 5, 0, 5, 4, // bottom
];

// degrees per frame
const ROTATION_SPEED: f32 = 1.0;

pub struct Cube<D: Device> {
    binding: Option<PipelineBinding<D>>,
    vertex_buffer: Option<D::Buffer>,
    index_buffer: Option<D::Buffer>,
    constant_buffer: Option<D::Buffer>,
    cbv_index: usize,
    // degrees about x and y
    rotation: [f32; 2],
}

impl<D: Device> Default for Cube<D> {
    fn default() -> Self {
        Cube {
            binding: None,
            vertex_buffer: None,
            index_buffer: None,
            constant_buffer: None,
            cbv_index: 0,
            rotation: [0.0, 0.0],
        }
    }
}

impl<D: Device> Cube<D> {
    /// World view projection for the current rotation, the camera sits 3 units back looking down +z
    pub fn get_world_view_proj(&self, aspect: f32) -> Mat4f {
        let proj = camera::create_perspective_projection_lh_yup(f32::to_radians(60.0), aspect, 0.1, 100.0);
        let view = camera::create_translation_matrix(0.0, 0.0, 3.0);
        let mat_rot_x = camera::create_x_rotation_matrix(f32::to_radians(self.rotation[0]));
        let mat_rot_y = camera::create_y_rotation_matrix(f32::to_radians(self.rotation[1]));
        proj * view * (mat_rot_y * mat_rot_x)
    }
}

impl<D: Device, A: os::App> Game<D, A> for Cube<D> {
    fn init(&mut self, engine: &mut Engine<D, A>) -> Result<(), Error> {
        let (vs, ps) = super::create_shaders(&engine.device, include_str!("../../shaders/cube.hlsl"))?;
        let (render_target_format, depth_format) = super::get_target_formats::<D>(&engine.swap_chain);

        // b0 holds world_view_proj, read by the vertex shader only
        let root_signature = binding::build_root_signature(
            &engine.device,
            &gfx::RootSignatureInfo {
                parameters: vec![gfx::RootParameter {
                    kind: gfx::RootParameterKind::DescriptorTable(vec![gfx::DescriptorRange {
                        descriptor_type: gfx::DescriptorType::ConstantBuffer,
                        base_register: 0,
                        register_space: 0,
                        num_descriptors: 1,
                    }]),
                    visibility: gfx::ShaderVisibility::Vertex,
                }],
                allow_input_layout: true,
            },
        )?;

        let pipeline = binding::build_pipeline_state(
            &engine.device,
            &gfx::RenderPipelineInfo {
                vs: &vs,
                ps: &ps,
                input_layout: super::get_vertex_input_layout(),
                vertex_stride: std::mem::size_of::<Vertex>(),
                root_signature: &root_signature,
                raster_info: gfx::RasterInfo {
                    cull_mode: gfx::CullMode::None,
                    ..Default::default()
                },
                blend_info: gfx::BlendInfo::default(),
                depth_stencil_info: gfx::DepthStencilInfo {
                    depth_enabled: depth_format.is_some(),
                    depth_write: depth_format.is_some(),
                    depth_func: gfx::ComparisonFunc::Less,
                    ..Default::default()
                },
                topology: gfx::TopologyType::Triangle,
                render_target_format,
                depth_format,
            },
        )?;

        // constant data lives in the upload heap and is rewritten each frame
        let constant_buffer = upload::allocate(
            &mut engine.device,
            &gfx::BufferInfo {
                heap: gfx::HeapType::Upload,
                usage: gfx::BufferUsage::CONSTANT_BUFFER,
                size_bytes: std::mem::size_of::<Mat4f>(),
                stride: 0,
                format: gfx::Format::Unknown,
            },
        )?;
        let mut heap = engine.device.create_heap(&gfx::HeapInfo {
            heap_type: gfx::DescriptorHeapType::Shader,
            num_descriptors: 1,
        })?;
        self.cbv_index = engine.device.create_constant_buffer_view(&constant_buffer, &mut heap)?;

        self.binding = Some(PipelineBinding::new(
            Some(heap),
            root_signature,
            pipeline,
            gfx::Topology::TriangleList,
        )?);
        self.constant_buffer = Some(constant_buffer);
        self.vertex_buffer = Some(engine.upload_buffer(&super::vertex_buffer_info(VERTICES.len()), &VERTICES)?);
        self.index_buffer = Some(engine.upload_buffer(
            &gfx::BufferInfo {
                heap: gfx::HeapType::Device,
                usage: gfx::BufferUsage::INDEX,
                size_bytes: std::mem::size_of_val(&INDICES),
                stride: std::mem::size_of::<u16>(),
                format: gfx::Format::R16u,
            },
            &INDICES,
        )?);
        Ok(())
    }

    fn update(&mut self, engine: &mut Engine<D, A>) -> Result<bool, Error> {
        self.rotation[0] += ROTATION_SPEED * 0.5;
        self.rotation[1] += ROTATION_SPEED;

        let (width, height) = engine.swap_chain.get_size();
        let world_view_proj = self.get_world_view_proj(width as f32 / height as f32);

        // the previous frame has fully drained, so the gpu is not reading the buffer
        let constant_buffer = self
            .constant_buffer
            .as_mut()
            .ok_or_else(|| super::not_initialised("cube"))?;
        upload::stage::<D, Mat4f>(constant_buffer, &[world_view_proj])?;
        Ok(true)
    }

    fn render(&mut self, engine: &mut Engine<D, A>) -> Result<(), Error> {
        let (binding, vertex_buffer, index_buffer) = match (&self.binding, &self.vertex_buffer, &self.index_buffer) {
            (Some(binding), Some(vertex_buffer), Some(index_buffer)) => (binding, vertex_buffer, index_buffer),
            _ => return Err(super::not_initialised("cube")),
        };
        binding.bind_for_draw(engine.cmd(), vertex_buffer, Some(index_buffer), &[(0, self.cbv_index)])?;
        engine.cmd().draw_indexed_instanced(INDICES.len() as u32, 1, 0, 0, 0)
    }
}
