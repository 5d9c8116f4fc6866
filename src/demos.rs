use crate::engine::Engine;
use crate::gfx;
use crate::gfx::{Device, SwapChain, Texture};
use crate::os;
use crate::Error;
use crate::ErrorKind;

/// Single coloured triangle, the minimal upload, bind and draw round trip.
pub mod triangle;

/// Indexed, depth tested cube with a per frame world view projection constant buffer.
pub mod cube;

/// Growable line strip which is re-uploaded each time points are appended.
pub mod curve;

/// Names accepted by `run`
pub const DEMO_NAMES: [&str; 3] = ["triangle", "cube", "curve"];

/// Vertex layout shared by the demos, a position followed by a colour.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Vertex {
    pub position: [f32; 3],
    pub colour: [f32; 4],
}

/// Input layout matching `Vertex`: POSITION at byte 0 and COLOR at byte 12, stride 28
pub fn get_vertex_input_layout() -> Vec<gfx::InputElementInfo> {
    vec![
        gfx::InputElementInfo {
            semantic: String::from("POSITION"),
            index: 0,
            format: gfx::Format::RGB32f,
            input_slot: 0,
            aligned_byte_offset: 0,
        },
        gfx::InputElementInfo {
            semantic: String::from("COLOR"),
            index: 0,
            format: gfx::Format::RGBA32f,
            input_slot: 0,
            aligned_byte_offset: 12,
        },
    ]
}

/// Creates the `vs_main` and `ps_main` entry points of an hlsl source file
pub fn create_shaders<D: Device>(device: &D, src: &str) -> Result<(D::Shader, D::Shader), Error> {
    let vs = device.create_shader(
        &gfx::ShaderInfo {
            shader_type: gfx::ShaderType::Vertex,
            compile_info: Some(gfx::ShaderCompileInfo {
                entry_point: String::from("vs_main"),
                target: String::from("vs_5_0"),
                debug: cfg!(debug_assertions),
            }),
        },
        src.as_bytes(),
    )?;
    let ps = device.create_shader(
        &gfx::ShaderInfo {
            shader_type: gfx::ShaderType::Pixel,
            compile_info: Some(gfx::ShaderCompileInfo {
                entry_point: String::from("ps_main"),
                target: String::from("ps_5_0"),
                debug: cfg!(debug_assertions),
            }),
        },
        src.as_bytes(),
    )?;
    Ok((vs, ps))
}

/// Render target and depth formats of the swap chain, pipelines must be built against these
pub fn get_target_formats<D: Device>(swap_chain: &D::SwapChain) -> (gfx::Format, Option<gfx::Format>) {
    (
        swap_chain.get_backbuffer_texture().get_format(),
        swap_chain.get_depth_stencil_texture().map(|ds| ds.get_format()),
    )
}

/// Buffer info for a device heap vertex buffer holding `count` vertices
pub fn vertex_buffer_info(count: usize) -> gfx::BufferInfo {
    gfx::BufferInfo {
        heap: gfx::HeapType::Device,
        usage: gfx::BufferUsage::VERTEX,
        size_bytes: count * std::mem::size_of::<Vertex>(),
        stride: std::mem::size_of::<Vertex>(),
        format: gfx::Format::Unknown,
    }
}

pub(crate) fn not_initialised(name: &str) -> Error {
    Error::new(
        ErrorKind::IllegalState,
        format!("demos: {} rendered before init", name),
    )
}

/// Runs the demo called `name` for `frames` frames, or until the window closes when None
pub fn run<D: Device, A: os::App>(engine: &mut Engine<D, A>, name: &str, frames: Option<u64>) -> Result<u64, Error> {
    log::info!("demos: running '{}'", name);
    match name {
        "triangle" => engine.run(&mut triangle::Triangle::<D>::default(), frames),
        "cube" => engine.run(&mut cube::Cube::<D>::default(), frames),
        "curve" => engine.run(&mut curve::Curve::<D>::default(), frames),
        _ => Err(Error::new(
            ErrorKind::Config,
            format!("demos: unknown demo '{}', expected one of {:?}", name, DEMO_NAMES),
        )),
    }
}
