use super::Vertex;
use crate::binding;
use crate::binding::PipelineBinding;
use crate::engine::Engine;
use crate::game::{Game, RenderMode};
use crate::gfx;
use crate::gfx::{CmdBuf, Device};
use crate::os;
use crate::Error;

/// A point is appended every this many frames
pub const APPEND_INTERVAL: u64 = 4;

/// The curve stops growing once it has this many points
pub const MAX_POINTS: usize = 256;

/// Returns the `i`th point of a spiral, coloured from red to blue along its length
pub fn get_curve_point(i: usize) -> Vertex {
    let t = i as f32 / MAX_POINTS as f32;
    let theta = t * std::f32::consts::PI * 8.0;
    let radius = 0.1 + t * 0.8;
    Vertex {
        position: [f32::cos(theta) * radius, f32::sin(theta) * radius, 0.0],
        colour: [1.0 - t, 0.2, t, 1.0],
    }
}

pub struct Curve<D: Device> {
    binding: Option<PipelineBinding<D>>,
    vertex_buffer: Option<D::Buffer>,
    points: Vec<Vertex>,
    frame: u64,
}

impl<D: Device> Default for Curve<D> {
    fn default() -> Self {
        Curve {
            binding: None,
            vertex_buffer: None,
            points: vec![get_curve_point(0), get_curve_point(1)],
            frame: 0,
        }
    }
}

impl<D: Device> Curve<D> {
    pub fn get_num_points(&self) -> usize {
        self.points.len()
    }

    // the previous vertex buffer is dropped here, the frame loop has already drained every draw reading it
    fn upload_points<A: os::App>(&mut self, engine: &mut Engine<D, A>) -> Result<(), Error> {
        let buffer = engine.upload_buffer(&super::vertex_buffer_info(self.points.len()), &self.points)?;
        self.vertex_buffer = Some(buffer);
        Ok(())
    }
}

impl<D: Device, A: os::App> Game<D, A> for Curve<D> {
    fn init(&mut self, engine: &mut Engine<D, A>) -> Result<(), Error> {
        let (vs, ps) = super::create_shaders(&engine.device, include_str!("../../shaders/colour.hlsl"))?;
        let (render_target_format, depth_format) = super::get_target_formats::<D>(&engine.swap_chain);

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
                topology: gfx::TopologyType::Line,
                render_target_format,
                depth_format,
            },
        )?;

        self.binding = Some(PipelineBinding::new(
            None,
            root_signature,
            pipeline,
            gfx::Topology::LineStrip,
        )?);
        self.upload_points(engine)
    }

    fn update(&mut self, engine: &mut Engine<D, A>) -> Result<bool, Error> {
        self.frame += 1;
        if self.frame % APPEND_INTERVAL != 0 || self.points.len() >= MAX_POINTS {
            return Ok(false);
        }
        self.points.push(get_curve_point(self.points.len()));
        self.upload_points(engine)?;
        log::trace!("curve: {} points", self.points.len());
        Ok(true)
    }

    fn render(&mut self, engine: &mut Engine<D, A>) -> Result<(), Error> {
        let (binding, vertex_buffer) = match (&self.binding, &self.vertex_buffer) {
            (Some(binding), Some(vertex_buffer)) => (binding, vertex_buffer),
            _ => return Err(super::not_initialised("curve")),
        };
        binding.bind_for_draw(engine.cmd(), vertex_buffer, None, &[])?;
        engine.cmd().draw_instanced(binding.get_vertex_count(vertex_buffer), 1, 0, 0)
    }

    fn render_mode(&self) -> RenderMode {
        RenderMode::OnDemand
    }
}
