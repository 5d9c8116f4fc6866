use super::Vertex;
use crate::binding;
use crate::binding::PipelineBinding;
use crate::engine::Engine;
use crate::game::Game;
use crate::gfx;
use crate::gfx::{CmdBuf, Device};
use crate::os;
use crate::Error;

pub const VERTICES: [Vertex; 3] = [
    Vertex {
        position: [0.0, 0.5, 0.0],
        colour: [1.0, 0.0, 0.0, 1.0],
    },
    Vertex {
        position: [0.5, -0.5, 0.0],
        colour: [0.0, 1.0, 0.0, 1.0],
    },
    Vertex {
        position: [-0.5, -0.5, 0.0],
        colour: [0.0, 0.0, 1.0, 1.0],
    },
];

pub struct Triangle<D: Device> {
    binding: Option<PipelineBinding<D>>,
    vertex_buffer: Option<D::Buffer>,
}

impl<D: Device> Default for Triangle<D> {
    fn default() -> Self {
        Triangle {
            binding: None,
            vertex_buffer: None,
        }
    }
}

impl<D: Device, A: os::App> Game<D, A> for Triangle<D> {
    fn init(&mut self, engine: &mut Engine<D, A>) -> Result<(), Error> {
        let (vs, ps) = super::create_shaders(&engine.device, include_str!("../../shaders/colour.hlsl"))?;
        let (render_target_format, depth_format) = super::get_target_formats::<D>(&engine.swap_chain);

        // no parameters, the triangle only reads the input assembler
        let root_signature = binding::build_root_signature(
            &engine.device,
            &gfx::RootSignatureInfo {
                parameters: Vec::new(),
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
                raster_info: gfx::RasterInfo::default(),
                blend_info: gfx::BlendInfo::default(),
                depth_stencil_info: gfx::DepthStencilInfo::default(),
                topology: gfx::TopologyType::Triangle,
                render_target_format,
                depth_format,
            },
        )?;

        self.binding = Some(PipelineBinding::new(
            None,
            root_signature,
            pipeline,
            gfx::Topology::TriangleList,
        )?);
        self.vertex_buffer = Some(engine.upload_buffer(&super::vertex_buffer_info(VERTICES.len()), &VERTICES)?);
        Ok(())
    }

    fn update(&mut self, _engine: &mut Engine<D, A>) -> Result<bool, Error> {
        Ok(true)
    }

    fn render(&mut self, engine: &mut Engine<D, A>) -> Result<(), Error> {
        let (binding, vertex_buffer) = match (&self.binding, &self.vertex_buffer) {
            (Some(binding), Some(vertex_buffer)) => (binding, vertex_buffer),
            _ => return Err(super::not_initialised("triangle")),
        };
        binding.bind_for_draw(engine.cmd(), vertex_buffer, None, &[])?;
        engine.cmd().draw_instanced(binding.get_vertex_count(vertex_buffer), 1, 0, 0)
    }
}
