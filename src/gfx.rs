use crate::os;
use crate::Error;
use crate::ErrorKind;

use serde::{Deserialize, Serialize};

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Implemets this interface with a Direct3D12 backend.
#[cfg(target_os = "windows")]
pub mod d3d12;

/// Software backend which replays command lists on a cpu queue thread, available on all platforms.
pub mod null;

/// Number of backbuffers in a swap chain unless configured otherwise.
pub const DEFAULT_NUM_BUFFERS: u32 = 2;

/// Constant buffer views must be sized and placed on this alignment.
pub const CONSTANT_BUFFER_ALIGNMENT: usize = 256;

/// Maximum size of a root signature in 32 bit values.
pub const MAX_ROOT_SIGNATURE_DWORDS: u32 = 64;

/// Sentinels a `SubmissionMarker` holds before a fence signal retires it, fence values start at 1.
const SUBMISSION_RECORDING: u64 = 0;
const SUBMISSION_PENDING: u64 = u64::MAX;
const SUBMISSION_ABANDONED: u64 = u64::MAX - 1;

/// Information to create a device.
#[derive(Clone, Debug)]
pub struct DeviceInfo {
    /// Optional name of gpu adaptor, use None for the default / primary device
    pub adapter_name: Option<String>,
    /// Enables the api debug layer
    pub debug_layer: bool,
    /// If hardware device creation fails, create a device on the software adapter instead
    pub allow_software_fallback: bool,
    /// Size of the default device heap for shader resources (textures, buffers, etc)
    pub shader_heap_size: usize,
    /// Size of the default device heap for render targets
    pub render_target_heap_size: usize,
    /// Size of the default device heap for depth stencil targets
    pub depth_stencil_heap_size: usize,
}

impl Default for DeviceInfo {
    fn default() -> Self {
        DeviceInfo {
            adapter_name: None,
            debug_layer: cfg!(debug_assertions),
            allow_software_fallback: true,
            shader_heap_size: 64,
            render_target_heap_size: DEFAULT_NUM_BUFFERS as usize,
            depth_stencil_heap_size: 1,
        }
    }
}

/// Information returned from `Device::get_adapter_info`.
#[derive(Clone, Debug, Default)]
pub struct AdapterInfo {
    /// The chosen adapter name
    pub name: String,
    /// Description of the device
    pub description: String,
    /// Dedicated video memory in bytes
    pub dedicated_video_memory: usize,
    /// Dedicated system memory in bytes
    pub dedicated_system_memory: usize,
    /// Shared system memory in bytes
    pub shared_system_memory: usize,
    /// True when the device runs on a software (reference / warp) adapter
    pub software: bool,
    /// Highest feature level the device supports
    pub feature_level: FeatureLevel,
    /// List of available adapter descriptons
    pub available: Vec<String>,
}

impl std::fmt::Display for AdapterInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}:", self.name)?;
        writeln!(f, "  {}", self.description)?;
        writeln!(f, "  software: {}", self.software)?;
        writeln!(f, "  feature level: {:?}", self.feature_level)?;
        writeln!(f, "  video memory: {}mb", self.dedicated_video_memory / 1024 / 1024)?;
        writeln!(f, "  system memory: {}mb", self.dedicated_system_memory / 1024 / 1024)?;
        writeln!(f, "  shared memory: {}mb", self.shared_system_memory / 1024 / 1024)?;
        writeln!(f, "available adapters:")?;
        for adapter in &self.available {
            writeln!(f, "  {}", adapter)?;
        }
        Ok(())
    }
}

/// Feature level the device was created with.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum FeatureLevel {
    #[default]
    Level11_0,
    Level11_1,
    Level12_0,
    Level12_1,
}

bitflags! {
    /// Optional features which were detected or enabled at device creation.
    pub struct DeviceFeatureFlags: u32 {
        const NONE = 0;
        const DEBUG_LAYER = 1<<0;
        const SOFTWARE_ADAPTER = 1<<1;
        const ROOT_SIGNATURE_1_1 = 1<<2;
    }
}

bitflags! {
    /// How a buffer will be bound to the pipeline.
    pub struct BufferUsage: u32 {
        const NONE = 0;
        const VERTEX = 1<<0;
        const INDEX = 1<<1;
        const CONSTANT_BUFFER = 1<<2;
    }
}

/// Memory heap a resource lives in.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HeapType {
    /// Cpu writable, persistently mapped staging memory the gpu can read
    Upload,
    /// Gpu local memory, only reachable through a copy from an upload resource
    Device,
    /// Cpu readable memory the gpu copies into
    Readback,
}

/// Tracked usage mode of a gpu resource, transitions are declared with barriers.
#[repr(u32)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ResourceState {
    Common,
    CopyDst,
    CopySrc,
    GenericRead,
    VertexConstantBuffer,
    IndexBuffer,
    RenderTarget,
    DepthStencil,
    Present,
}

impl ResourceState {
    fn from_u32(value: u32) -> ResourceState {
        match value {
            0 => ResourceState::Common,
            1 => ResourceState::CopyDst,
            2 => ResourceState::CopySrc,
            3 => ResourceState::GenericRead,
            4 => ResourceState::VertexConstantBuffer,
            5 => ResourceState::IndexBuffer,
            6 => ResourceState::RenderTarget,
            7 => ResourceState::DepthStencil,
            _ => ResourceState::Present,
        }
    }
}

/// Format for resource types (textures / buffers).
/// n = normalised unsigned integer,
/// u = unsigned integer,
/// i = signed integer,
/// f = float
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Format {
    Unknown,
    R16u,
    R32u,
    R32f,
    RG32f,
    RGB32f,
    RGBA32f,
    RGBA8n,
    BGRA8n,
    D32f,
    D24nS8u,
}

impl Format {
    /// Returns true for formats which can be bound as a depth stencil target
    pub fn is_depth(&self) -> bool {
        matches!(self, Format::D32f | Format::D24nS8u)
    }

    /// Returns true for formats a swap chain or render target can use
    pub fn is_colour_target(&self) -> bool {
        matches!(self, Format::RGBA8n | Format::BGRA8n | Format::RGBA32f)
    }
}

/// Returns the size in bytes of a single element of `format`, 0 for `Format::Unknown`
pub fn block_size_for_format(format: Format) -> usize {
    match format {
        Format::Unknown => 0,
        Format::R16u => 2,
        Format::R32u => 4,
        Format::R32f => 4,
        Format::RG32f => 8,
        Format::RGB32f => 12,
        Format::RGBA32f => 16,
        Format::RGBA8n => 4,
        Format::BGRA8n => 4,
        Format::D32f => 4,
        Format::D24nS8u => 4,
    }
}

/// Information to create a buffer through `Device::create_buffer`.
#[derive(Copy, Clone, Debug)]
pub struct BufferInfo {
    /// Heap the buffer memory is allocated from
    pub heap: HeapType,
    /// Indicates how the buffer will be bound
    pub usage: BufferUsage,
    /// Size of the buffer in bytes, must be greater than 0
    pub size_bytes: usize,
    /// Byte size of one element (vertex stride, index size), 0 for raw buffers
    pub stride: usize,
    /// Index format for index buffers, `Format::Unknown` otherwise
    pub format: Format,
}

impl BufferInfo {
    /// Size the buffer is actually allocated with, constant buffers are aligned up to 256 bytes
    pub fn get_allocation_size(&self) -> usize {
        if self.usage.contains(BufferUsage::CONSTANT_BUFFER) {
            align_pow2(self.size_bytes, CONSTANT_BUFFER_ALIGNMENT)
        } else {
            self.size_bytes
        }
    }
}

/// Aligns `value` up to the power of 2 `align`
pub fn align_pow2(value: usize, align: usize) -> usize {
    (value + (align - 1)) & !(align - 1)
}

/// Structure to specify viewport coordinates on a `CmdBuf`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

/// Structure to specify scissor rect coordinates on a `CmdBuf`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ScissorRect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl From<os::Rect<i32>> for Viewport {
    fn from(rect: os::Rect<i32>) -> Viewport {
        Viewport {
            x: rect.x as f32,
            y: rect.y as f32,
            width: rect.width as f32,
            height: rect.height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

impl From<os::Rect<i32>> for ScissorRect {
    fn from(rect: os::Rect<i32>) -> ScissorRect {
        ScissorRect {
            left: rect.x,
            top: rect.y,
            right: rect.width,
            bottom: rect.height,
        }
    }
}

/// Values to clear colour render targets at the start of a frame.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClearColour {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl From<[f32; 4]> for ClearColour {
    fn from(rgba: [f32; 4]) -> ClearColour {
        ClearColour {
            r: rgba[0],
            g: rgba[1],
            b: rgba[2],
            a: rgba[3],
        }
    }
}

impl ClearColour {
    pub fn to_array(&self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Information to create a swap chain for a window.
#[derive(Copy, Clone, Debug)]
pub struct SwapChainInfo {
    /// Number of backbuffers, must be at least 2
    pub num_buffers: u32,
    /// Must be a colour target format, `Format::RGBA8n` or `Format::BGRA8n` are typical
    pub format: Format,
    /// Creates a depth stencil target sized to the window when set
    pub depth_format: Option<Format>,
    /// Clear colour for the backbuffer, the window background colour is used when None
    pub clear_colour: Option<ClearColour>,
}

/// Validates a swap chain description against the client size of the window it targets.
pub fn validate_swap_chain_info(info: &SwapChainInfo, width: i32, height: i32) -> Result<(), Error> {
    if width <= 0 || height <= 0 {
        return Err(Error::new(
            ErrorKind::SwapChain,
            format!("swap chain requires a non zero client area, window is {}x{}", width, height),
        ));
    }
    if info.num_buffers < 2 {
        return Err(Error::new(
            ErrorKind::SwapChain,
            format!("swap chain requires at least 2 buffers, {} requested", info.num_buffers),
        ));
    }
    if !info.format.is_colour_target() {
        return Err(Error::new(
            ErrorKind::SwapChain,
            format!("{:?} is not a presentable colour format", info.format),
        ));
    }
    if let Some(depth_format) = info.depth_format {
        if !depth_format.is_depth() {
            return Err(Error::new(
                ErrorKind::SwapChain,
                format!("{:?} is not a depth format", depth_format),
            ));
        }
    }
    Ok(())
}

/// Descriptor heap types.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DescriptorHeapType {
    /// Shader visible heap for constant buffer, shader resource and unordered access views
    Shader,
    RenderTarget,
    DepthStencil,
}

/// Information to create a descriptor heap.
#[derive(Copy, Clone, Debug)]
pub struct HeapInfo {
    pub heap_type: DescriptorHeapType,
    pub num_descriptors: usize,
}

/// The stage to create a shader for.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ShaderType {
    Vertex,
    Pixel,
}

/// Optional information to compile a shader from source, backends which only take bytecode ignore it.
#[derive(Clone, Debug)]
pub struct ShaderCompileInfo {
    /// Function to use as the entry point
    pub entry_point: String,
    /// Target shader model, ie "vs_5_0"
    pub target: String,
    /// Compile with debug information and without optimisation
    pub debug: bool,
}

/// Information to create a shader.
#[derive(Clone, Debug)]
pub struct ShaderInfo {
    pub shader_type: ShaderType,
    /// When None the source is treated as precompiled bytecode
    pub compile_info: Option<ShaderCompileInfo>,
}

/// Visibility of a root parameter to shader stages.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ShaderVisibility {
    All,
    Vertex,
    Pixel,
}

/// Type of view a descriptor references.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DescriptorType {
    ConstantBuffer,
    ShaderResource,
    UnorderedAccess,
}

/// A contiguous range of registers inside a descriptor table.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DescriptorRange {
    pub descriptor_type: DescriptorType,
    pub base_register: u32,
    pub register_space: u32,
    pub num_descriptors: u32,
}

/// Binding type of a single root parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RootParameterKind {
    /// Table of descriptors living in a shader visible heap
    DescriptorTable(Vec<DescriptorRange>),
    /// 32 bit values pushed directly into the root signature
    Constants {
        register: u32,
        register_space: u32,
        num_values: u32,
    },
    /// Root descriptor addressed by gpu virtual address
    Descriptor {
        descriptor_type: DescriptorType,
        register: u32,
        register_space: u32,
    },
}

/// One slot of a root signature.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RootParameter {
    pub kind: RootParameterKind,
    pub visibility: ShaderVisibility,
}

impl RootParameter {
    /// Cost of the parameter in 32 bit values
    pub fn get_num_dwords(&self) -> u32 {
        match &self.kind {
            RootParameterKind::DescriptorTable(_) => 1,
            RootParameterKind::Constants { num_values, .. } => *num_values,
            RootParameterKind::Descriptor { .. } => 2,
        }
    }
}

/// Information to create a root signature, parameters are bound by their index (slot).
#[derive(Clone, Debug)]
pub struct RootSignatureInfo {
    pub parameters: Vec<RootParameter>,
    /// Allows the input assembler to consume an input layout
    pub allow_input_layout: bool,
}

/// Checks a root signature description is well formed before it is serialised.
pub fn validate_root_signature(info: &RootSignatureInfo) -> Result<(), Error> {
    let mut dwords = 0;
    for (slot, param) in info.parameters.iter().enumerate() {
        match &param.kind {
            RootParameterKind::DescriptorTable(ranges) => {
                if ranges.is_empty() {
                    return Err(Error::new(
                        ErrorKind::RootSignature,
                        format!("descriptor table in slot {} has no ranges", slot),
                    ));
                }
                if ranges.iter().any(|r| r.num_descriptors == 0) {
                    return Err(Error::new(
                        ErrorKind::RootSignature,
                        format!("descriptor table in slot {} has an empty range", slot),
                    ));
                }
            }
            RootParameterKind::Constants { num_values, .. } => {
                if *num_values == 0 {
                    return Err(Error::new(
                        ErrorKind::RootSignature,
                        format!("root constants in slot {} have no values", slot),
                    ));
                }
            }
            RootParameterKind::Descriptor { .. } => (),
        }
        dwords += param.get_num_dwords();
    }
    if dwords > MAX_ROOT_SIGNATURE_DWORDS {
        return Err(Error::new(
            ErrorKind::RootSignature,
            format!("root signature uses {} dwords, the limit is {}", dwords, MAX_ROOT_SIGNATURE_DWORDS),
        ));
    }
    Ok(())
}

/// Describes a single element of a vertex input layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputElementInfo {
    pub semantic: String,
    pub index: u32,
    pub format: Format,
    pub input_slot: u32,
    pub aligned_byte_offset: u32,
}

/// Checks that every element of `layout` fits inside a vertex of `stride` bytes without overlapping another.
pub fn validate_input_layout(layout: &[InputElementInfo], stride: usize) -> Result<(), Error> {
    if stride == 0 {
        return Err(Error::new(ErrorKind::PipelineState, "vertex stride must be greater than 0"));
    }
    let mut spans: Vec<(usize, usize, &str)> = Vec::new();
    for element in layout {
        let size = block_size_for_format(element.format);
        if size == 0 {
            return Err(Error::new(
                ErrorKind::PipelineState,
                format!("input element {} has unknown format", element.semantic),
            ));
        }
        let start = element.aligned_byte_offset as usize;
        let end = start + size;
        if end > stride {
            return Err(Error::new(
                ErrorKind::PipelineState,
                format!(
                    "input element {} ends at byte {} which exceeds the vertex stride {}",
                    element.semantic, end, stride
                ),
            ));
        }
        for (s, e, name) in &spans {
            if start < *e && *s < end {
                return Err(Error::new(
                    ErrorKind::PipelineState,
                    format!("input element {} overlaps {}", element.semantic, name),
                ));
            }
        }
        spans.push((start, end, &element.semantic));
    }
    Ok(())
}

/// Polygon fill mode.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FillMode {
    Solid,
    Wireframe,
}

/// Polygon cull mode.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CullMode {
    None,
    Front,
    Back,
}

/// Information to control the rasterisation mode of primitives.
#[derive(Copy, Clone, Debug)]
pub struct RasterInfo {
    pub fill_mode: FillMode,
    pub cull_mode: CullMode,
    pub front_ccw: bool,
    pub depth_bias: i32,
    pub depth_clip_enable: bool,
}

impl Default for RasterInfo {
    fn default() -> Self {
        RasterInfo {
            fill_mode: FillMode::Solid,
            cull_mode: CullMode::None,
            front_ccw: false,
            depth_bias: 0,
            depth_clip_enable: true,
        }
    }
}

/// Blend factors.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BlendFactor {
    Zero,
    One,
    SrcColour,
    InvSrcColour,
    SrcAlpha,
    InvSrcAlpha,
    DstColour,
    InvDstColour,
    DstAlpha,
    InvDstAlpha,
}

/// Blend operations.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BlendOp {
    Add,
    Subtract,
    RevSubtract,
    Min,
    Max,
}

/// Blend state for the single render target.
#[derive(Copy, Clone, Debug)]
pub struct BlendInfo {
    pub blend_enabled: bool,
    pub src_blend: BlendFactor,
    pub dst_blend: BlendFactor,
    pub blend_op: BlendOp,
    pub src_blend_alpha: BlendFactor,
    pub dst_blend_alpha: BlendFactor,
    pub blend_op_alpha: BlendOp,
    pub write_mask: u8,
}

impl Default for BlendInfo {
    fn default() -> Self {
        BlendInfo {
            blend_enabled: false,
            src_blend: BlendFactor::One,
            dst_blend: BlendFactor::Zero,
            blend_op: BlendOp::Add,
            src_blend_alpha: BlendFactor::One,
            dst_blend_alpha: BlendFactor::Zero,
            blend_op_alpha: BlendOp::Add,
            write_mask: 0x0f,
        }
    }
}

/// Depth test comparison functions.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ComparisonFunc {
    Never,
    Less,
    Equal,
    LessEqual,
    Greater,
    NotEqual,
    GreaterEqual,
    Always,
}

/// Depth and stencil state.
#[derive(Copy, Clone, Debug)]
pub struct DepthStencilInfo {
    pub depth_enabled: bool,
    pub depth_write: bool,
    pub depth_func: ComparisonFunc,
    pub stencil_enabled: bool,
}

impl Default for DepthStencilInfo {
    fn default() -> Self {
        DepthStencilInfo {
            depth_enabled: false,
            depth_write: false,
            depth_func: ComparisonFunc::Always,
            stencil_enabled: false,
        }
    }
}

/// Primitive class a pipeline is built for.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TopologyType {
    Point,
    Line,
    Triangle,
}

/// Primitive topology set on the input assembler.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Topology {
    PointList,
    LineList,
    LineStrip,
    TriangleList,
    TriangleStrip,
}

impl Topology {
    pub fn get_type(&self) -> TopologyType {
        match self {
            Topology::PointList => TopologyType::Point,
            Topology::LineList | Topology::LineStrip => TopologyType::Line,
            Topology::TriangleList | Topology::TriangleStrip => TopologyType::Triangle,
        }
    }
}

/// Information to create a pipeline state object, immutable once created.
pub struct RenderPipelineInfo<'stack, D: Device> {
    pub vs: &'stack D::Shader,
    pub ps: &'stack D::Shader,
    pub input_layout: Vec<InputElementInfo>,
    /// Byte size of one vertex record, vertex buffers bound with this pipeline must match it
    pub vertex_stride: usize,
    pub root_signature: &'stack D::RootSignature,
    pub raster_info: RasterInfo,
    pub blend_info: BlendInfo,
    pub depth_stencil_info: DepthStencilInfo,
    pub topology: TopologyType,
    pub render_target_format: Format,
    pub depth_format: Option<Format>,
}

/// The parts of a pipeline state object command buffers validate draws against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineSignature {
    pub id: u64,
    pub root_signature_id: u64,
    pub topology: TopologyType,
    pub vertex_stride: usize,
    pub render_target_format: Format,
    pub depth_format: Option<Format>,
}

/// Checks a pipeline description is consistent and returns the signature draws are validated against.
pub fn validate_render_pipeline<D: Device>(info: &RenderPipelineInfo<D>) -> Result<PipelineSignature, Error> {
    if info.vs.get_type() != ShaderType::Vertex {
        return Err(Error::new(ErrorKind::PipelineState, "vs must be a vertex shader"));
    }
    if info.ps.get_type() != ShaderType::Pixel {
        return Err(Error::new(ErrorKind::PipelineState, "ps must be a pixel shader"));
    }
    if info.input_layout.is_empty() {
        return Err(Error::new(ErrorKind::PipelineState, "input layout has no elements"));
    }
    if !info.root_signature.allows_input_layout() {
        return Err(Error::new(
            ErrorKind::PipelineState,
            "root signature does not allow an input assembler input layout",
        ));
    }
    validate_input_layout(&info.input_layout, info.vertex_stride)?;
    if !info.render_target_format.is_colour_target() {
        return Err(Error::new(
            ErrorKind::PipelineState,
            format!("{:?} is not a render target format", info.render_target_format),
        ));
    }
    if let Some(depth_format) = info.depth_format {
        if !depth_format.is_depth() {
            return Err(Error::new(
                ErrorKind::PipelineState,
                format!("{:?} is not a depth format", depth_format),
            ));
        }
    } else if info.depth_stencil_info.depth_enabled {
        return Err(Error::new(
            ErrorKind::PipelineState,
            "depth test enabled without a depth format",
        ));
    }
    Ok(PipelineSignature {
        id: next_object_id(),
        root_signature_id: info.root_signature.get_id(),
        topology: info.topology,
        vertex_stride: info.vertex_stride,
        render_target_format: info.render_target_format,
        depth_format: info.depth_format,
    })
}

/// Declares the transition of a texture or buffer from `state_before` to `state_after`,
/// exactly one of `texture` or `buffer` is set.
pub struct TransitionBarrier<'stack, D: Device> {
    pub texture: Option<&'stack D::Texture>,
    pub buffer: Option<&'stack D::Buffer>,
    pub state_before: ResourceState,
    pub state_after: ResourceState,
}

impl<'stack, D: Device> TransitionBarrier<'stack, D> {
    pub fn texture(texture: &'stack D::Texture, state_before: ResourceState, state_after: ResourceState) -> Self {
        TransitionBarrier {
            texture: Some(texture),
            buffer: None,
            state_before,
            state_after,
        }
    }

    pub fn buffer(buffer: &'stack D::Buffer, state_before: ResourceState, state_after: ResourceState) -> Self {
        TransitionBarrier {
            texture: None,
            buffer: Some(buffer),
            state_before,
            state_after,
        }
    }
}

/// Recording state of a command buffer.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CmdBufState {
    /// Open for recording, created by `reset`
    Recording,
    /// Closed and not submitted, command buffers start here
    Closed,
    /// Submitted to the queue, may only be reset after the fence proves completion
    Executing,
}

/// Returns a process unique id for gpu objects
pub fn next_object_id() -> u64 {
    static NEXT_ID: AtomicU64 = AtomicU64::new(1);
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Shared, cheaply cloned record of the current `ResourceState` of a resource.
/// Command buffers update it as barriers are recorded.
#[derive(Clone, Debug)]
pub struct StateTracker {
    id: u64,
    state: Arc<AtomicU32>,
}

impl StateTracker {
    pub fn new(state: ResourceState) -> Self {
        StateTracker {
            id: next_object_id(),
            state: Arc::new(AtomicU32::new(state as u32)),
        }
    }

    pub fn get_id(&self) -> u64 {
        self.id
    }

    pub fn get(&self) -> ResourceState {
        ResourceState::from_u32(self.state.load(Ordering::Acquire))
    }

    pub fn set(&self, state: ResourceState) {
        self.state.store(state as u32, Ordering::Release)
    }
}

#[derive(Debug)]
struct MarkerState {
    value: AtomicU64,
    fence_id: AtomicU64,
}

/// Tracks one recording of a command buffer from reset to the fence signal which retires it.
/// Anything the recording reads, such as staging buffers, can hold a clone to know when it is safe to release.
#[derive(Clone, Debug)]
pub struct SubmissionMarker {
    state: Arc<MarkerState>,
}

impl SubmissionMarker {
    fn new() -> Self {
        SubmissionMarker {
            state: Arc::new(MarkerState {
                value: AtomicU64::new(SUBMISSION_RECORDING),
                fence_id: AtomicU64::new(0),
            }),
        }
    }

    fn set_pending(&self) {
        self.state.value.store(SUBMISSION_PENDING, Ordering::Release)
    }

    // the recording was closed and reset without ever being executed
    fn abandon(&self) {
        self.state.value.store(SUBMISSION_ABANDONED, Ordering::Release)
    }

    /// Called by backends when a signal of `fence_id` is enqueued behind the submission
    pub fn retire(&self, fence_id: u64, fence_value: u64) {
        self.state.fence_id.store(fence_id, Ordering::Relaxed);
        self.state.value.store(fence_value, Ordering::Release)
    }

    /// Fence value which retires the submission, None if it was never executed or no signal has been enqueued yet
    pub fn get_retire_value(&self) -> Option<u64> {
        match self.state.value.load(Ordering::Acquire) {
            SUBMISSION_RECORDING | SUBMISSION_PENDING | SUBMISSION_ABANDONED => None,
            v => Some(v),
        }
    }

    /// Id of the fence which retired the submission
    pub fn get_fence_id(&self) -> Option<u64> {
        self.get_retire_value()
            .map(|_| self.state.fence_id.load(Ordering::Relaxed))
    }

    pub fn is_abandoned(&self) -> bool {
        self.state.value.load(Ordering::Acquire) == SUBMISSION_ABANDONED
    }

    /// True once the gpu can no longer read anything the recording references:
    /// it was abandoned, or `fence` retired it and has completed that value
    pub fn is_complete<D: Device>(&self, fence: &D::Fence) -> bool {
        if self.is_abandoned() {
            return true;
        }
        match (self.get_retire_value(), self.get_fence_id()) {
            (Some(value), Some(id)) => id == fence.get_id() && fence.get_completed_value() >= value,
            _ => false,
        }
    }
}

/// Submissions executed since the last fence signal, shared by backends.
#[derive(Default)]
pub struct PendingSubmissions {
    markers: Vec<SubmissionMarker>,
}

impl PendingSubmissions {
    pub fn push(&mut self, marker: SubmissionMarker) {
        self.markers.push(marker);
    }

    /// Stamps every pending submission with the fence and value signalled behind it
    pub fn retire(&mut self, fence_id: u64, fence_value: u64) {
        for marker in self.markers.drain(..) {
            marker.retire(fence_id, fence_value);
        }
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

struct BoundTarget {
    tracker: StateTracker,
    format: Format,
}

struct BoundBuffer {
    tracker: StateTracker,
    stride: usize,
    num_elements: usize,
    format: Format,
}

struct BoundRootSignature {
    id: u64,
    parameters: Vec<RootParameter>,
    tables: Vec<bool>,
}

/// Tracks the recording state and bindings of a command buffer and rejects commands which
/// would execute with resources in the wrong state, or bindings missing or incompatible.
/// Backends call into it before recording each native command.
pub struct CmdBufValidator {
    state: CmdBufState,
    marker: SubmissionMarker,
    render_target: Option<BoundTarget>,
    depth_stencil: Option<BoundTarget>,
    root_signature: Option<BoundRootSignature>,
    pipeline: Option<PipelineSignature>,
    heaps: Vec<(u64, usize)>,
    vertex_buffer: Option<BoundBuffer>,
    index_buffer: Option<BoundBuffer>,
    topology: Option<Topology>,
    num_commands: usize,
    // states before each barrier of the current recording, restored if it is never executed
    journal: Vec<(StateTracker, ResourceState)>,
}

impl Default for CmdBufValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl CmdBufValidator {
    pub fn new() -> Self {
        CmdBufValidator {
            state: CmdBufState::Closed,
            marker: SubmissionMarker::new(),
            render_target: None,
            depth_stencil: None,
            root_signature: None,
            pipeline: None,
            heaps: Vec::new(),
            vertex_buffer: None,
            index_buffer: None,
            topology: None,
            num_commands: 0,
            journal: Vec::new(),
        }
    }

    pub fn get_state(&self) -> CmdBufState {
        self.state
    }

    pub fn get_marker(&self) -> SubmissionMarker {
        self.marker.clone()
    }

    /// Number of commands recorded since the last reset
    pub fn get_num_commands(&self) -> usize {
        self.num_commands
    }

    fn require_recording(&self, op: &str) -> Result<(), Error> {
        if self.state != CmdBufState::Recording {
            return Err(Error::new(
                ErrorKind::IllegalState,
                format!("{} recorded on a command buffer in state {:?}", op, self.state),
            ));
        }
        Ok(())
    }

    fn record(&mut self, op: &str) -> Result<(), Error> {
        self.require_recording(op)?;
        self.num_commands += 1;
        Ok(())
    }

    /// Re-opens recording, only legal once the gpu has completed the previous submission
    pub fn reset<D: Device>(&mut self, fence: &D::Fence, pipeline: Option<&D::RenderPipeline>) -> Result<(), Error> {
        match self.state {
            CmdBufState::Recording => {
                return Err(Error::new(
                    ErrorKind::IllegalState,
                    "reset called on a command buffer which is already recording",
                ));
            }
            CmdBufState::Executing => {
                let retire = self.marker.get_retire_value().ok_or_else(|| {
                    Error::new(
                        ErrorKind::IllegalState,
                        "reset called on a submitted command buffer before a fence was signalled behind it",
                    )
                })?;
                let fence_id = self.marker.get_fence_id().unwrap_or(0);
                if fence_id != fence.get_id() {
                    return Err(Error::new(
                        ErrorKind::IllegalState,
                        format!(
                            "reset gated on fence {} but the submission was retired by fence {}",
                            fence.get_id(),
                            fence_id
                        ),
                    ));
                }
                let completed = fence.get_completed_value();
                if completed < retire {
                    return Err(Error::new(
                        ErrorKind::IllegalState,
                        format!(
                            "reset called while the gpu may still be executing (fence completed {}, retires at {})",
                            completed, retire
                        ),
                    ));
                }
            }
            CmdBufState::Closed => {
                // never executed, the gpu will not apply its barriers
                for (tracker, before) in self.journal.drain(..).rev() {
                    tracker.set(before);
                }
                self.marker.abandon();
            }
        }
        self.journal.clear();
        self.marker = SubmissionMarker::new();
        self.state = CmdBufState::Recording;
        self.render_target = None;
        self.depth_stencil = None;
        self.root_signature = None;
        self.heaps.clear();
        self.vertex_buffer = None;
        self.index_buffer = None;
        self.topology = None;
        self.num_commands = 0;
        self.pipeline = pipeline.map(|p| p.get_signature().clone());
        Ok(())
    }

    pub fn close(&mut self) -> Result<(), Error> {
        if self.state != CmdBufState::Recording {
            return Err(Error::new(
                ErrorKind::IllegalState,
                format!("close called on a command buffer in state {:?}", self.state),
            ));
        }
        self.state = CmdBufState::Closed;
        Ok(())
    }

    /// Moves a closed command buffer to executing, the returned marker is retired by the next fence signal
    pub fn submit(&mut self) -> Result<SubmissionMarker, Error> {
        if self.state != CmdBufState::Closed {
            return Err(Error::new(
                ErrorKind::IllegalState,
                format!("execute called on a command buffer in state {:?}, it must be closed", self.state),
            ));
        }
        if self.num_commands == 0 {
            log::trace!("submitting an empty command buffer");
        }
        self.state = CmdBufState::Executing;
        self.journal.clear();
        self.marker.set_pending();
        Ok(self.marker.clone())
    }

    /// Validates and applies a transition
    pub fn transition_barrier<D: Device>(&mut self, barrier: &TransitionBarrier<D>) -> Result<(), Error> {
        self.record("transition barrier")?;
        let tracker = match (barrier.texture, barrier.buffer) {
            (Some(texture), None) => texture.get_state_tracker(),
            (None, Some(buffer)) => {
                if buffer.get_heap_type() != HeapType::Device {
                    return Err(Error::new(
                        ErrorKind::Validation,
                        format!("{:?} heap buffers have a fixed state and cannot be transitioned", buffer.get_heap_type()),
                    ));
                }
                buffer.get_state_tracker()
            }
            _ => {
                return Err(Error::new(
                    ErrorKind::Validation,
                    "transition barrier must reference exactly one texture or buffer",
                ));
            }
        };
        if barrier.state_before == barrier.state_after {
            return Err(Error::new(
                ErrorKind::Validation,
                format!("transition barrier from {:?} to itself", barrier.state_before),
            ));
        }
        let current = tracker.get();
        if current != barrier.state_before {
            return Err(Error::new(
                ErrorKind::Validation,
                format!(
                    "resource {} is in state {:?} but the barrier expects {:?}",
                    tracker.get_id(),
                    current,
                    barrier.state_before
                ),
            ));
        }
        self.journal.push((tracker.clone(), current));
        tracker.set(barrier.state_after);
        Ok(())
    }

    pub fn copy_buffer_region<D: Device>(
        &mut self,
        dst: &D::Buffer,
        dst_offset: usize,
        src: &D::Buffer,
        src_offset: usize,
        num_bytes: usize,
    ) -> Result<(), Error> {
        self.record("copy buffer region")?;
        if num_bytes == 0 {
            return Err(Error::new(ErrorKind::Validation, "copy of 0 bytes"));
        }
        if dst_offset + num_bytes > dst.get_size() {
            return Err(Error::new(
                ErrorKind::Validation,
                format!("copy writes {} bytes at {} into a {} byte buffer", num_bytes, dst_offset, dst.get_size()),
            ));
        }
        if src_offset + num_bytes > src.get_size() {
            return Err(Error::new(
                ErrorKind::Validation,
                format!("copy reads {} bytes at {} from a {} byte buffer", num_bytes, src_offset, src.get_size()),
            ));
        }
        if dst.get_heap_type() == HeapType::Upload {
            return Err(Error::new(ErrorKind::Validation, "copy destination cannot be an upload buffer"));
        }
        let dst_state = dst.get_state();
        if dst_state != ResourceState::CopyDst {
            return Err(Error::new(
                ErrorKind::Validation,
                format!("copy destination is in state {:?}, expected CopyDst", dst_state),
            ));
        }
        let src_state = src.get_state();
        let src_ok = match src.get_heap_type() {
            HeapType::Upload => true,
            HeapType::Device => src_state == ResourceState::CopySrc,
            HeapType::Readback => false,
        };
        if !src_ok {
            return Err(Error::new(
                ErrorKind::Validation,
                format!("copy source in {:?} heap is in state {:?}", src.get_heap_type(), src_state),
            ));
        }
        Ok(())
    }

    pub fn clear_render_target<D: Device>(&mut self, target: &D::Texture) -> Result<(), Error> {
        self.record("clear render target")?;
        let state = target.get_state_tracker().get();
        if state != ResourceState::RenderTarget {
            return Err(Error::new(
                ErrorKind::Validation,
                format!("clear of a render target in state {:?}", state),
            ));
        }
        Ok(())
    }

    pub fn clear_depth_stencil<D: Device>(&mut self, target: &D::Texture) -> Result<(), Error> {
        self.record("clear depth stencil")?;
        if !target.get_format().is_depth() {
            return Err(Error::new(ErrorKind::Validation, "clear depth stencil on a colour texture"));
        }
        let state = target.get_state_tracker().get();
        if state != ResourceState::DepthStencil {
            return Err(Error::new(
                ErrorKind::Validation,
                format!("clear of a depth stencil target in state {:?}", state),
            ));
        }
        Ok(())
    }

    pub fn set_render_targets<D: Device>(
        &mut self,
        target: &D::Texture,
        depth_stencil: Option<&D::Texture>,
    ) -> Result<(), Error> {
        self.record("set render targets")?;
        if !target.get_format().is_colour_target() {
            return Err(Error::new(ErrorKind::Validation, "render target must have a colour format"));
        }
        self.render_target = Some(BoundTarget {
            tracker: target.get_state_tracker().clone(),
            format: target.get_format(),
        });
        self.depth_stencil = match depth_stencil {
            Some(ds) => {
                if !ds.get_format().is_depth() {
                    return Err(Error::new(ErrorKind::Validation, "depth stencil target must have a depth format"));
                }
                Some(BoundTarget {
                    tracker: ds.get_state_tracker().clone(),
                    format: ds.get_format(),
                })
            }
            None => None,
        };
        Ok(())
    }

    pub fn set_viewport(&mut self) -> Result<(), Error> {
        self.record("set viewport")
    }

    pub fn set_scissor_rect(&mut self) -> Result<(), Error> {
        self.record("set scissor rect")
    }

    pub fn set_heaps<D: Device>(&mut self, heaps: &[&D::Heap]) -> Result<(), Error> {
        self.record("set heaps")?;
        if heaps.len() > 1 {
            return Err(Error::new(
                ErrorKind::Validation,
                "only one shader visible heap can be bound at a time",
            ));
        }
        self.heaps.clear();
        for heap in heaps {
            if heap.get_heap_type() != DescriptorHeapType::Shader {
                return Err(Error::new(
                    ErrorKind::Validation,
                    format!("{:?} heaps are not shader visible and cannot be bound", heap.get_heap_type()),
                ));
            }
            self.heaps.push((heap.get_id(), heap.get_num_descriptors()));
        }
        Ok(())
    }

    pub fn set_root_signature<D: Device>(&mut self, root_signature: &D::RootSignature) -> Result<(), Error> {
        self.record("set root signature")?;
        let parameters = root_signature.get_parameters().to_vec();
        self.root_signature = Some(BoundRootSignature {
            id: root_signature.get_id(),
            tables: vec![false; parameters.len()],
            parameters,
        });
        Ok(())
    }

    pub fn set_render_pipeline<D: Device>(&mut self, pipeline: &D::RenderPipeline) -> Result<(), Error> {
        self.record("set render pipeline")?;
        let signature = pipeline.get_signature();
        if let Some(rs) = &self.root_signature {
            if rs.id != signature.root_signature_id {
                return Err(Error::new(
                    ErrorKind::Validation,
                    "pipeline was built with a different root signature than the one bound",
                ));
            }
        }
        self.pipeline = Some(signature.clone());
        Ok(())
    }

    pub fn set_descriptor_table<D: Device>(&mut self, slot: u32, heap: &D::Heap, index: usize) -> Result<(), Error> {
        self.record("set descriptor table")?;
        let rs = self.root_signature.as_mut().ok_or_else(|| {
            Error::new(ErrorKind::Validation, "descriptor table set before a root signature was bound")
        })?;
        let param = rs.parameters.get(slot as usize).ok_or_else(|| {
            Error::new(
                ErrorKind::Validation,
                format!("root signature has no parameter in slot {}", slot),
            )
        })?;
        let table_size = match &param.kind {
            RootParameterKind::DescriptorTable(ranges) => ranges.iter().map(|r| r.num_descriptors as usize).sum::<usize>(),
            _ => {
                return Err(Error::new(
                    ErrorKind::Validation,
                    format!("root parameter in slot {} is not a descriptor table", slot),
                ));
            }
        };
        let bound = self.heaps.iter().find(|(id, _)| *id == heap.get_id()).ok_or_else(|| {
            Error::new(ErrorKind::Validation, "descriptor table references a heap which is not bound")
        })?;
        if index + table_size > bound.1 {
            return Err(Error::new(
                ErrorKind::Validation,
                format!("descriptor table at {} with {} descriptors exceeds heap size {}", index, table_size, bound.1),
            ));
        }
        if index >= heap.get_num_allocated() {
            return Err(Error::new(
                ErrorKind::Validation,
                format!("descriptor {} has not been written", index),
            ));
        }
        rs.tables[slot as usize] = true;
        Ok(())
    }

    pub fn push_constants(&mut self, slot: u32, num_values: usize) -> Result<(), Error> {
        self.record("push constants")?;
        let rs = self.root_signature.as_ref().ok_or_else(|| {
            Error::new(ErrorKind::Validation, "constants pushed before a root signature was bound")
        })?;
        match rs.parameters.get(slot as usize).map(|p| &p.kind) {
            Some(RootParameterKind::Constants { num_values: n, .. }) => {
                if num_values > *n as usize {
                    return Err(Error::new(
                        ErrorKind::Validation,
                        format!("pushed {} values into a slot with {} constants", num_values, n),
                    ));
                }
                Ok(())
            }
            _ => Err(Error::new(
                ErrorKind::Validation,
                format!("root parameter in slot {} is not a constants parameter", slot),
            )),
        }
    }

    pub fn set_vertex_buffer<D: Device>(&mut self, buffer: &D::Buffer, slot: u32) -> Result<(), Error> {
        self.record("set vertex buffer")?;
        if slot != 0 {
            return Err(Error::new(ErrorKind::Validation, "only vertex buffer slot 0 is supported"));
        }
        if !buffer.get_usage().contains(BufferUsage::VERTEX) || buffer.get_stride() == 0 {
            return Err(Error::new(
                ErrorKind::Validation,
                "vertex buffer was not created with VERTEX usage and a stride",
            ));
        }
        self.vertex_buffer = Some(BoundBuffer {
            tracker: buffer.get_state_tracker().clone(),
            stride: buffer.get_stride(),
            num_elements: buffer.get_size() / buffer.get_stride(),
            format: Format::Unknown,
        });
        Ok(())
    }

    pub fn set_index_buffer<D: Device>(&mut self, buffer: &D::Buffer) -> Result<(), Error> {
        self.record("set index buffer")?;
        let format = buffer.get_format();
        if !buffer.get_usage().contains(BufferUsage::INDEX) || !matches!(format, Format::R16u | Format::R32u) {
            return Err(Error::new(
                ErrorKind::Validation,
                "index buffer was not created with INDEX usage and an R16u or R32u format",
            ));
        }
        let stride = block_size_for_format(format);
        self.index_buffer = Some(BoundBuffer {
            tracker: buffer.get_state_tracker().clone(),
            stride,
            num_elements: buffer.get_size() / stride,
            format,
        });
        Ok(())
    }

    pub fn set_topology(&mut self, topology: Topology) -> Result<(), Error> {
        self.record("set topology")?;
        self.topology = Some(topology);
        Ok(())
    }

    fn validate_draw_state(&self) -> Result<(), Error> {
        let rt = self.render_target.as_ref().ok_or_else(|| {
            Error::new(ErrorKind::Validation, "draw without a render target bound")
        })?;
        let rt_state = rt.tracker.get();
        if rt_state != ResourceState::RenderTarget {
            return Err(Error::new(
                ErrorKind::Validation,
                format!("draw into a render target in state {:?}", rt_state),
            ));
        }
        let rs = self.root_signature.as_ref().ok_or_else(|| {
            Error::new(ErrorKind::Validation, "draw without a root signature bound")
        })?;
        let pipeline = self.pipeline.as_ref().ok_or_else(|| {
            Error::new(ErrorKind::Validation, "draw without a pipeline bound")
        })?;
        if pipeline.root_signature_id != rs.id {
            return Err(Error::new(
                ErrorKind::Validation,
                "bound pipeline was built with a different root signature than the one bound",
            ));
        }
        if pipeline.render_target_format != rt.format {
            return Err(Error::new(
                ErrorKind::Validation,
                format!(
                    "pipeline targets {:?} but the render target is {:?}",
                    pipeline.render_target_format, rt.format
                ),
            ));
        }
        match (pipeline.depth_format, &self.depth_stencil) {
            (Some(format), Some(ds)) => {
                if ds.format != format {
                    return Err(Error::new(
                        ErrorKind::Validation,
                        format!("pipeline depth format {:?} does not match the bound {:?}", format, ds.format),
                    ));
                }
                let ds_state = ds.tracker.get();
                if ds_state != ResourceState::DepthStencil {
                    return Err(Error::new(
                        ErrorKind::Validation,
                        format!("draw with a depth stencil target in state {:?}", ds_state),
                    ));
                }
            }
            (Some(format), None) => {
                return Err(Error::new(
                    ErrorKind::Validation,
                    format!("pipeline expects a {:?} depth target but none is bound", format),
                ));
            }
            _ => (),
        }
        for (slot, param) in rs.parameters.iter().enumerate() {
            if let RootParameterKind::DescriptorTable(_) = param.kind {
                if !rs.tables[slot] {
                    return Err(Error::new(
                        ErrorKind::Validation,
                        format!("descriptor table in slot {} is not bound", slot),
                    ));
                }
            }
        }
        let topology = self.topology.ok_or_else(|| {
            Error::new(ErrorKind::Validation, "draw without a primitive topology set")
        })?;
        if topology.get_type() != pipeline.topology {
            return Err(Error::new(
                ErrorKind::Validation,
                format!("topology {:?} does not match the pipeline topology type {:?}", topology, pipeline.topology),
            ));
        }
        let vb = self.vertex_buffer.as_ref().ok_or_else(|| {
            Error::new(ErrorKind::Validation, "draw without a vertex buffer bound")
        })?;
        let vb_state = vb.tracker.get();
        if !matches!(vb_state, ResourceState::VertexConstantBuffer | ResourceState::GenericRead) {
            return Err(Error::new(
                ErrorKind::Validation,
                format!("draw reads a vertex buffer in state {:?}", vb_state),
            ));
        }
        if vb.stride != pipeline.vertex_stride {
            return Err(Error::new(
                ErrorKind::Validation,
                format!("vertex buffer stride {} does not match the pipeline stride {}", vb.stride, pipeline.vertex_stride),
            ));
        }
        Ok(())
    }

    pub fn draw_instanced(&mut self, vertex_count: u32, instance_count: u32, start_vertex: u32) -> Result<(), Error> {
        self.record("draw instanced")?;
        self.validate_draw_state()?;
        if vertex_count == 0 || instance_count == 0 {
            return Err(Error::new(ErrorKind::Validation, "draw with a zero vertex or instance count"));
        }
        if let Some(vb) = &self.vertex_buffer {
            let end = start_vertex as u64 + vertex_count as u64;
            if end > vb.num_elements as u64 {
                return Err(Error::new(
                    ErrorKind::Validation,
                    format!(
                        "draw reads vertices {}..{} from a buffer with {} vertices",
                        start_vertex, end, vb.num_elements
                    ),
                ));
            }
        }
        Ok(())
    }

    pub fn draw_indexed_instanced(&mut self, index_count: u32, instance_count: u32, start_index: u32) -> Result<(), Error> {
        self.record("draw indexed instanced")?;
        self.validate_draw_state()?;
        if index_count == 0 || instance_count == 0 {
            return Err(Error::new(ErrorKind::Validation, "draw with a zero index or instance count"));
        }
        let ib = self.index_buffer.as_ref().ok_or_else(|| {
            Error::new(ErrorKind::Validation, "indexed draw without an index buffer bound")
        })?;
        let ib_state = ib.tracker.get();
        if !matches!(ib_state, ResourceState::IndexBuffer | ResourceState::GenericRead) {
            return Err(Error::new(
                ErrorKind::Validation,
                format!("draw reads an index buffer in state {:?}", ib_state),
            ));
        }
        let end = start_index as u64 + index_count as u64;
        if end > ib.num_elements as u64 {
            return Err(Error::new(
                ErrorKind::Validation,
                format!(
                    "draw reads indices {}..{} from a buffer with {} {:?} indices",
                    start_index, end, ib.num_elements, ib.format
                ),
            ));
        }
        Ok(())
    }
}

/// Validates a present, the backbuffer must have been transitioned to `ResourceState::Present`.
pub fn validate_present<D: Device>(backbuffer: &D::Texture) -> Result<(), Error> {
    let state = backbuffer.get_state_tracker().get();
    if state != ResourceState::Present {
        return Err(Error::new(
            ErrorKind::Validation,
            format!("present called with the backbuffer in state {:?}", state),
        ));
    }
    Ok(())
}

/// A gpu device is used to create gpu resources, the device also contains a single a command queue
/// to which all command buffers will submitted and executed each frame.
pub trait Device: 'static + Sized {
    type SwapChain: SwapChain<Self>;
    type CmdBuf: CmdBuf<Self>;
    type Fence: Fence<Self>;
    type Buffer: Buffer<Self>;
    type Texture: Texture<Self>;
    type Heap: Heap<Self>;
    type Shader: Shader<Self>;
    type RootSignature: RootSignature<Self>;
    type RenderPipeline: RenderPipeline<Self>;
    /// Create a device, falling back to a software adapter when allowed and hardware creation fails
    fn create(info: &DeviceInfo) -> Result<Self, Error>;
    /// Create a fence with its counter at 0
    fn create_fence(&mut self) -> Result<Self::Fence, Error>;
    /// Create a swap chain with backbuffers and views sized to the client area of `window`
    fn create_swap_chain<A: os::App>(
        &mut self,
        info: &SwapChainInfo,
        window: &A::Window,
    ) -> Result<Self::SwapChain, Error>;
    /// Create a command buffer in the `CmdBufState::Closed` state
    fn create_cmd_buf(&mut self) -> Result<Self::CmdBuf, Error>;
    /// Allocate a buffer, upload buffers are persistently mapped, device buffers start in `ResourceState::Common`
    fn create_buffer(&mut self, info: &BufferInfo) -> Result<Self::Buffer, Error>;
    fn create_heap(&mut self, info: &HeapInfo) -> Result<Self::Heap, Error>;
    /// Writes a constant buffer view of `buffer` into the next free slot of `heap` and returns its index
    fn create_constant_buffer_view(&mut self, buffer: &Self::Buffer, heap: &mut Self::Heap) -> Result<usize, Error>;
    fn create_shader(&self, info: &ShaderInfo, src: &[u8]) -> Result<Self::Shader, Error>;
    fn create_root_signature(&self, info: &RootSignatureInfo) -> Result<Self::RootSignature, Error>;
    fn create_render_pipeline(&self, info: &RenderPipelineInfo<Self>) -> Result<Self::RenderPipeline, Error>;
    /// Submit a closed command buffer to the queue, completion is observed through a fence
    fn execute(&mut self, cmd: &mut Self::CmdBuf) -> Result<(), Error>;
    fn get_adapter_info(&self) -> &AdapterInfo;
    fn get_feature_flags(&self) -> &DeviceFeatureFlags;
}

/// A monotonically increasing counter the gpu signals as it reaches points in the queue.
pub trait Fence<D: Device>: Sized {
    /// Unique id, submissions remember which fence retired them
    fn get_id(&self) -> u64;
    /// Increments the counter and enqueues a signal of the new value on the device queue
    fn advance_and_signal(&mut self, device: &mut D) -> Result<u64, Error>;
    /// Blocks until the gpu has completed `value`, expiry of `timeout` is `ErrorKind::FenceTimeout`
    fn wait_until(&self, value: u64, timeout: Option<Duration>) -> Result<(), Error>;
    /// Last value returned from `advance_and_signal`
    fn get_counter(&self) -> u64;
    /// Last value the gpu has completed
    fn get_completed_value(&self) -> u64;
    fn is_complete(&self, value: u64) -> bool {
        self.get_completed_value() >= value
    }
}

/// A swap chain is connected to a window and owns the rotating backbuffers it presents from.
pub trait SwapChain<D: Device>: Sized {
    fn get_num_buffers(&self) -> u32;
    /// Index of the backbuffer the current frame renders into, always in 0..num_buffers
    fn get_backbuffer_index(&self) -> u32;
    fn get_backbuffer_texture(&self) -> &D::Texture;
    fn get_depth_stencil_texture(&self) -> Option<&D::Texture>;
    fn get_clear_colour(&self) -> ClearColour;
    fn get_size(&self) -> (u32, u32);
    /// Presents the current backbuffer, which must be in `ResourceState::Present`, and advances the backbuffer index
    fn present(&mut self, device: &D, vsync: bool) -> Result<(), Error>;
}

/// Records gpu commands, recording calls return `ErrorKind::IllegalState` outside of `CmdBufState::Recording`
/// and `ErrorKind::Validation` when resources are in the wrong state or bindings are missing.
pub trait CmdBuf<D: Device>: Sized {
    fn get_state(&self) -> CmdBufState;
    /// Marker of the current recording, it is retired by the first fence signal after the recording is executed
    fn get_submission_marker(&self) -> SubmissionMarker;
    /// Re-opens recording, only legal once `fence` has completed the previous submission
    fn reset(&mut self, fence: &D::Fence, pipeline: Option<&D::RenderPipeline>) -> Result<(), Error>;
    /// Close recording, no further commands may be recorded until the next reset
    fn close(&mut self) -> Result<(), Error>;
    /// Close and submit to the device queue, completion is not waited for
    fn close_and_submit(&mut self, device: &mut D) -> Result<(), Error>
    where
        D: Device<CmdBuf = Self>,
    {
        self.close()?;
        device.execute(self)
    }
    fn transition_barrier(&mut self, barrier: &TransitionBarrier<D>) -> Result<(), Error>;
    fn copy_buffer_region(
        &mut self,
        dst_buffer: &D::Buffer,
        dst_offset: usize,
        src_buffer: &D::Buffer,
        src_offset: usize,
        num_bytes: usize,
    ) -> Result<(), Error>;
    fn clear_render_target(&mut self, target: &D::Texture, colour: ClearColour) -> Result<(), Error>;
    fn clear_depth_stencil(&mut self, target: &D::Texture, depth: f32, stencil: u8) -> Result<(), Error>;
    fn set_render_targets(&mut self, target: &D::Texture, depth_stencil: Option<&D::Texture>) -> Result<(), Error>;
    fn set_viewport(&mut self, viewport: &Viewport) -> Result<(), Error>;
    fn set_scissor_rect(&mut self, scissor_rect: &ScissorRect) -> Result<(), Error>;
    fn set_heaps(&mut self, heaps: &[&D::Heap]) -> Result<(), Error>;
    fn set_root_signature(&mut self, root_signature: &D::RootSignature) -> Result<(), Error>;
    fn set_render_pipeline(&mut self, pipeline: &D::RenderPipeline) -> Result<(), Error>;
    /// Points root parameter `slot` at the descriptor `index` of `heap`
    fn set_descriptor_table(&mut self, slot: u32, heap: &D::Heap, index: usize) -> Result<(), Error>;
    fn push_constants<T: Sized>(&mut self, slot: u32, data: &[T]) -> Result<(), Error>;
    fn set_vertex_buffer(&mut self, buffer: &D::Buffer, slot: u32) -> Result<(), Error>;
    fn set_index_buffer(&mut self, buffer: &D::Buffer) -> Result<(), Error>;
    fn set_topology(&mut self, topology: Topology) -> Result<(), Error>;
    fn draw_instanced(
        &mut self,
        vertex_count: u32,
        instance_count: u32,
        start_vertex: u32,
        start_instance: u32,
    ) -> Result<(), Error>;
    fn draw_indexed_instanced(
        &mut self,
        index_count: u32,
        instance_count: u32,
        start_index: u32,
        base_vertex: i32,
        start_instance: u32,
    ) -> Result<(), Error>;
}

/// A gpu buffer with a tracked resource state.
pub trait Buffer<D: Device>: Sized {
    /// Copies `data` into the mapped memory of an upload buffer at byte `offset`
    fn write<T: Sized>(&mut self, offset: usize, data: &[T]) -> Result<(), Error>;
    /// Reads back the whole contents of an upload or readback buffer
    fn read(&self) -> Result<Vec<u8>, Error>;
    fn get_size(&self) -> usize;
    fn get_heap_type(&self) -> HeapType;
    fn get_usage(&self) -> BufferUsage;
    fn get_stride(&self) -> usize;
    fn get_format(&self) -> Format;
    fn get_state_tracker(&self) -> &StateTracker;
    fn get_state(&self) -> ResourceState {
        self.get_state_tracker().get()
    }
}

/// A gpu texture with a tracked resource state, swap chain backbuffers and depth targets.
pub trait Texture<D: Device>: Sized {
    fn get_state_tracker(&self) -> &StateTracker;
    fn get_format(&self) -> Format;
    fn get_width(&self) -> u32;
    fn get_height(&self) -> u32;
}

/// A descriptor heap, descriptors are allocated linearly.
pub trait Heap<D: Device>: Sized {
    fn get_id(&self) -> u64;
    fn get_heap_type(&self) -> DescriptorHeapType;
    fn get_num_descriptors(&self) -> usize;
    fn get_num_allocated(&self) -> usize;
}

/// An opaque compiled shader.
pub trait Shader<D: Device>: Sized {
    fn get_type(&self) -> ShaderType;
    fn get_bytecode(&self) -> &[u8];
}

/// An immutable layout of shader visible bindings.
pub trait RootSignature<D: Device>: Sized {
    fn get_id(&self) -> u64;
    fn get_parameters(&self) -> &[RootParameter];
    fn allows_input_layout(&self) -> bool;
}

/// An immutable pipeline state object.
pub trait RenderPipeline<D: Device>: Sized {
    fn get_signature(&self) -> &PipelineSignature;
}

/// Take a slice of any sized type and return the bytes it spans
pub fn slice_as_u8_slice<T: Sized>(p: &[T]) -> &[u8] {
    unsafe { ::std::slice::from_raw_parts(p.as_ptr() as *const u8, std::mem::size_of_val(p)) }
}
