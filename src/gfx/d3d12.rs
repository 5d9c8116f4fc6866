use crate::gfx;
use crate::gfx::CmdBufValidator;
use crate::gfx::PendingSubmissions;
use crate::gfx::StateTracker;
use crate::os;
use crate::os::Window as OsWindow;
use crate::Error;
use crate::ErrorKind;

use windows::{
    core::*,
    Win32::Foundation::*,
    Win32::Graphics::Direct3D::Fxc::*,
    Win32::Graphics::Direct3D::*,
    Win32::Graphics::Direct3D12::*,
    Win32::Graphics::Dxgi::Common::*,
    Win32::Graphics::Dxgi::*,
    Win32::System::Threading::*,
};

use std::ffi::CString;
use std::time::Duration;

type Result<T> = std::result::Result<T, Error>;

pub struct Device {
    adapter_info: gfx::AdapterInfo,
    feature_flags: gfx::DeviceFeatureFlags,
    dxgi_factory: IDXGIFactory4,
    device: ID3D12Device,
    command_queue: ID3D12CommandQueue,
    pending: PendingSubmissions,
}

pub struct Fence {
    fence: ID3D12Fence,
    event: HANDLE,
    id: u64,
    counter: u64,
}

pub struct SwapChain {
    swap_chain: IDXGISwapChain3,
    backbuffers: Vec<Texture>,
    depth_stencil: Option<Texture>,
    bb_index: u32,
    clear_colour: gfx::ClearColour,
    width: u32,
    height: u32,
    // views of the backbuffers and depth target live here
    _rtv_heap: ID3D12DescriptorHeap,
    _dsv_heap: Option<ID3D12DescriptorHeap>,
}

pub struct CmdBuf {
    validator: CmdBufValidator,
    command_allocator: ID3D12CommandAllocator,
    command_list: ID3D12GraphicsCommandList,
}

pub struct Buffer {
    resource: ID3D12Resource,
    tracker: StateTracker,
    heap: gfx::HeapType,
    usage: gfx::BufferUsage,
    size: usize,
    stride: usize,
    format: gfx::Format,
    mapped: *mut u8,
    vbv: Option<D3D12_VERTEX_BUFFER_VIEW>,
    ibv: Option<D3D12_INDEX_BUFFER_VIEW>,
}

pub struct Texture {
    resource: ID3D12Resource,
    tracker: StateTracker,
    format: gfx::Format,
    width: u32,
    height: u32,
    rtv: Option<D3D12_CPU_DESCRIPTOR_HANDLE>,
    dsv: Option<D3D12_CPU_DESCRIPTOR_HANDLE>,
}

pub struct Heap {
    heap: ID3D12DescriptorHeap,
    id: u64,
    heap_type: gfx::DescriptorHeapType,
    num_descriptors: usize,
    num_allocated: usize,
    increment_size: usize,
}

pub struct Shader {
    shader_type: gfx::ShaderType,
    bytecode: Vec<u8>,
}

pub struct RootSignature {
    root_signature: ID3D12RootSignature,
    id: u64,
    parameters: Vec<gfx::RootParameter>,
    allow_input_layout: bool,
}

pub struct RenderPipeline {
    pso: ID3D12PipelineState,
    signature: gfx::PipelineSignature,
}

fn device_lost(e: windows::core::Error) -> Error {
    Error::new(ErrorKind::DeviceLost, format!("gfx::d3d12: {}", e.message()))
}

fn to_dxgi_format(format: gfx::Format) -> DXGI_FORMAT {
    match format {
        gfx::Format::Unknown => DXGI_FORMAT_UNKNOWN,
        gfx::Format::R16u => DXGI_FORMAT_R16_UINT,
        gfx::Format::R32u => DXGI_FORMAT_R32_UINT,
        gfx::Format::R32f => DXGI_FORMAT_R32_FLOAT,
        gfx::Format::RG32f => DXGI_FORMAT_R32G32_FLOAT,
        gfx::Format::RGB32f => DXGI_FORMAT_R32G32B32_FLOAT,
        gfx::Format::RGBA32f => DXGI_FORMAT_R32G32B32A32_FLOAT,
        gfx::Format::RGBA8n => DXGI_FORMAT_R8G8B8A8_UNORM,
        gfx::Format::BGRA8n => DXGI_FORMAT_B8G8R8A8_UNORM,
        gfx::Format::D32f => DXGI_FORMAT_D32_FLOAT,
        gfx::Format::D24nS8u => DXGI_FORMAT_D24_UNORM_S8_UINT,
    }
}

fn to_d3d12_resource_state(state: gfx::ResourceState) -> D3D12_RESOURCE_STATES {
    match state {
        gfx::ResourceState::Common => D3D12_RESOURCE_STATE_COMMON,
        gfx::ResourceState::CopyDst => D3D12_RESOURCE_STATE_COPY_DEST,
        gfx::ResourceState::CopySrc => D3D12_RESOURCE_STATE_COPY_SOURCE,
        gfx::ResourceState::GenericRead => D3D12_RESOURCE_STATE_GENERIC_READ,
        gfx::ResourceState::VertexConstantBuffer => D3D12_RESOURCE_STATE_VERTEX_AND_CONSTANT_BUFFER,
        gfx::ResourceState::IndexBuffer => D3D12_RESOURCE_STATE_INDEX_BUFFER,
        gfx::ResourceState::RenderTarget => D3D12_RESOURCE_STATE_RENDER_TARGET,
        gfx::ResourceState::DepthStencil => D3D12_RESOURCE_STATE_DEPTH_WRITE,
        gfx::ResourceState::Present => D3D12_RESOURCE_STATE_PRESENT,
    }
}

fn to_d3d12_heap_type(heap: gfx::HeapType) -> D3D12_HEAP_TYPE {
    match heap {
        gfx::HeapType::Upload => D3D12_HEAP_TYPE_UPLOAD,
        gfx::HeapType::Device => D3D12_HEAP_TYPE_DEFAULT,
        gfx::HeapType::Readback => D3D12_HEAP_TYPE_READBACK,
    }
}

fn to_d3d12_shader_visibility(visibility: gfx::ShaderVisibility) -> D3D12_SHADER_VISIBILITY {
    match visibility {
        gfx::ShaderVisibility::All => D3D12_SHADER_VISIBILITY_ALL,
        gfx::ShaderVisibility::Vertex => D3D12_SHADER_VISIBILITY_VERTEX,
        gfx::ShaderVisibility::Pixel => D3D12_SHADER_VISIBILITY_PIXEL,
    }
}

fn to_d3d12_range_type(descriptor_type: gfx::DescriptorType) -> D3D12_DESCRIPTOR_RANGE_TYPE {
    match descriptor_type {
        gfx::DescriptorType::ConstantBuffer => D3D12_DESCRIPTOR_RANGE_TYPE_CBV,
        gfx::DescriptorType::ShaderResource => D3D12_DESCRIPTOR_RANGE_TYPE_SRV,
        gfx::DescriptorType::UnorderedAccess => D3D12_DESCRIPTOR_RANGE_TYPE_UAV,
    }
}

fn to_d3d12_topology_type(topology: gfx::TopologyType) -> D3D12_PRIMITIVE_TOPOLOGY_TYPE {
    match topology {
        gfx::TopologyType::Point => D3D12_PRIMITIVE_TOPOLOGY_TYPE_POINT,
        gfx::TopologyType::Line => D3D12_PRIMITIVE_TOPOLOGY_TYPE_LINE,
        gfx::TopologyType::Triangle => D3D12_PRIMITIVE_TOPOLOGY_TYPE_TRIANGLE,
    }
}

fn to_d3d_topology(topology: gfx::Topology) -> D3D_PRIMITIVE_TOPOLOGY {
    match topology {
        gfx::Topology::PointList => D3D_PRIMITIVE_TOPOLOGY_POINTLIST,
        gfx::Topology::LineList => D3D_PRIMITIVE_TOPOLOGY_LINELIST,
        gfx::Topology::LineStrip => D3D_PRIMITIVE_TOPOLOGY_LINESTRIP,
        gfx::Topology::TriangleList => D3D_PRIMITIVE_TOPOLOGY_TRIANGLELIST,
        gfx::Topology::TriangleStrip => D3D_PRIMITIVE_TOPOLOGY_TRIANGLESTRIP,
    }
}

fn to_d3d12_blend(factor: gfx::BlendFactor) -> D3D12_BLEND {
    match factor {
        gfx::BlendFactor::Zero => D3D12_BLEND_ZERO,
        gfx::BlendFactor::One => D3D12_BLEND_ONE,
        gfx::BlendFactor::SrcColour => D3D12_BLEND_SRC_COLOR,
        gfx::BlendFactor::InvSrcColour => D3D12_BLEND_INV_SRC_COLOR,
        gfx::BlendFactor::SrcAlpha => D3D12_BLEND_SRC_ALPHA,
        gfx::BlendFactor::InvSrcAlpha => D3D12_BLEND_INV_SRC_ALPHA,
        gfx::BlendFactor::DstColour => D3D12_BLEND_DEST_COLOR,
        gfx::BlendFactor::InvDstColour => D3D12_BLEND_INV_DEST_COLOR,
        gfx::BlendFactor::DstAlpha => D3D12_BLEND_DEST_ALPHA,
        gfx::BlendFactor::InvDstAlpha => D3D12_BLEND_INV_DEST_ALPHA,
    }
}

fn to_d3d12_blend_op(op: gfx::BlendOp) -> D3D12_BLEND_OP {
    match op {
        gfx::BlendOp::Add => D3D12_BLEND_OP_ADD,
        gfx::BlendOp::Subtract => D3D12_BLEND_OP_SUBTRACT,
        gfx::BlendOp::RevSubtract => D3D12_BLEND_OP_REV_SUBTRACT,
        gfx::BlendOp::Min => D3D12_BLEND_OP_MIN,
        gfx::BlendOp::Max => D3D12_BLEND_OP_MAX,
    }
}

fn to_d3d12_comparison_func(func: gfx::ComparisonFunc) -> D3D12_COMPARISON_FUNC {
    match func {
        gfx::ComparisonFunc::Never => D3D12_COMPARISON_FUNC_NEVER,
        gfx::ComparisonFunc::Less => D3D12_COMPARISON_FUNC_LESS,
        gfx::ComparisonFunc::Equal => D3D12_COMPARISON_FUNC_EQUAL,
        gfx::ComparisonFunc::LessEqual => D3D12_COMPARISON_FUNC_LESS_EQUAL,
        gfx::ComparisonFunc::Greater => D3D12_COMPARISON_FUNC_GREATER,
        gfx::ComparisonFunc::NotEqual => D3D12_COMPARISON_FUNC_NOT_EQUAL,
        gfx::ComparisonFunc::GreaterEqual => D3D12_COMPARISON_FUNC_GREATER_EQUAL,
        gfx::ComparisonFunc::Always => D3D12_COMPARISON_FUNC_ALWAYS,
    }
}

fn transition_barrier(
    resource: &ID3D12Resource,
    state_before: D3D12_RESOURCE_STATES,
    state_after: D3D12_RESOURCE_STATES,
) -> D3D12_RESOURCE_BARRIER {
    D3D12_RESOURCE_BARRIER {
        Type: D3D12_RESOURCE_BARRIER_TYPE_TRANSITION,
        Flags: D3D12_RESOURCE_BARRIER_FLAG_NONE,
        Anonymous: D3D12_RESOURCE_BARRIER_0 {
            Transition: std::mem::ManuallyDrop::new(D3D12_RESOURCE_TRANSITION_BARRIER {
                pResource: std::mem::ManuallyDrop::new(Some(resource.clone())),
                StateBefore: state_before,
                StateAfter: state_after,
                Subresource: D3D12_RESOURCE_BARRIER_ALL_SUBRESOURCES,
            }),
        },
    }
}

// releases the resource reference held by a barrier once it has been recorded
fn drop_barrier(barrier: D3D12_RESOURCE_BARRIER) {
    unsafe {
        let mut transition = std::mem::ManuallyDrop::into_inner(barrier.Anonymous.Transition);
        std::mem::ManuallyDrop::drop(&mut transition.pResource);
    }
}

fn get_adapter_name(desc: &DXGI_ADAPTER_DESC1) -> String {
    let len = desc.Description.iter().position(|c| *c == 0).unwrap_or(desc.Description.len());
    String::from_utf16_lossy(&desc.Description[..len])
}

fn is_software_adapter(desc: &DXGI_ADAPTER_DESC1) -> bool {
    (desc.Flags & DXGI_ADAPTER_FLAG_SOFTWARE.0 as u32) != 0
}

fn get_hardware_adapter(
    factory: &IDXGIFactory4,
    adapter_name: &Option<String>,
    available: &mut Vec<String>,
) -> Option<IDXGIAdapter1> {
    let mut selected = None;
    unsafe {
        let mut i = 0;
        while let Ok(adapter) = factory.EnumAdapters1(i) {
            i += 1;
            let desc = match adapter.GetDesc1() {
                Ok(desc) => desc,
                Err(_) => continue,
            };
            let name = get_adapter_name(&desc);
            available.push(name.clone());
            if selected.is_some() || is_software_adapter(&desc) {
                continue;
            }
            if let Some(requested) = adapter_name {
                if *requested != name {
                    continue;
                }
            }
            // check the adapter supports d3d12 without creating the device yet
            if D3D12CreateDevice(
                &adapter,
                D3D_FEATURE_LEVEL_11_0,
                std::ptr::null_mut::<Option<ID3D12Device>>(),
            )
            .is_ok()
            {
                selected = Some(adapter);
            }
        }
    }
    selected
}

fn create_d3d12_device(adapter: &IDXGIAdapter1) -> Option<ID3D12Device> {
    let mut device: Option<ID3D12Device> = None;
    unsafe {
        if D3D12CreateDevice(adapter, D3D_FEATURE_LEVEL_11_0, &mut device).is_err() {
            return None;
        }
    }
    device
}

fn create_committed_buffer(device: &ID3D12Device, heap: gfx::HeapType, size: usize, state: gfx::ResourceState) -> Result<ID3D12Resource> {
    let mut resource: Option<ID3D12Resource> = None;
    unsafe {
        device
            .CreateCommittedResource(
                &D3D12_HEAP_PROPERTIES {
                    Type: to_d3d12_heap_type(heap),
                    ..Default::default()
                },
                D3D12_HEAP_FLAG_NONE,
                &D3D12_RESOURCE_DESC {
                    Dimension: D3D12_RESOURCE_DIMENSION_BUFFER,
                    Width: size as u64,
                    Height: 1,
                    DepthOrArraySize: 1,
                    MipLevels: 1,
                    SampleDesc: DXGI_SAMPLE_DESC { Count: 1, Quality: 0 },
                    Layout: D3D12_TEXTURE_LAYOUT_ROW_MAJOR,
                    ..Default::default()
                },
                to_d3d12_resource_state(state),
                None,
                &mut resource,
            )
            .map_err(|e| Error::new(ErrorKind::ResourceCreation, format!("gfx::d3d12: create buffer failed: {}", e.message())))?;
    }
    resource.ok_or_else(|| Error::new(ErrorKind::ResourceCreation, "gfx::d3d12: create buffer returned no resource"))
}

fn blob_to_string(blob: &ID3DBlob) -> String {
    unsafe {
        String::from_utf8_lossy(std::slice::from_raw_parts(
            blob.GetBufferPointer() as *const u8,
            blob.GetBufferSize(),
        ))
        .to_string()
    }
}

fn blob_to_vec(blob: &ID3DBlob) -> Vec<u8> {
    unsafe { std::slice::from_raw_parts(blob.GetBufferPointer() as *const u8, blob.GetBufferSize()).to_vec() }
}

impl Device {
    fn create_descriptor_heap(&self, heap_type: D3D12_DESCRIPTOR_HEAP_TYPE, num: usize, shader_visible: bool) -> Result<ID3D12DescriptorHeap> {
        unsafe {
            self.device
                .CreateDescriptorHeap(&D3D12_DESCRIPTOR_HEAP_DESC {
                    Type: heap_type,
                    NumDescriptors: num as u32,
                    Flags: if shader_visible {
                        D3D12_DESCRIPTOR_HEAP_FLAG_SHADER_VISIBLE
                    } else {
                        D3D12_DESCRIPTOR_HEAP_FLAG_NONE
                    },
                    NodeMask: 0,
                })
                .map_err(|e| Error::new(ErrorKind::ResourceCreation, format!("gfx::d3d12: create descriptor heap failed: {}", e.message())))
        }
    }

    fn create_depth_texture(&self, format: gfx::Format, width: u32, height: u32) -> Result<ID3D12Resource> {
        let mut resource: Option<ID3D12Resource> = None;
        let clear_value = D3D12_CLEAR_VALUE {
            Format: to_dxgi_format(format),
            Anonymous: D3D12_CLEAR_VALUE_0 {
                DepthStencil: D3D12_DEPTH_STENCIL_VALUE { Depth: 1.0, Stencil: 0 },
            },
        };
        unsafe {
            self.device
                .CreateCommittedResource(
                    &D3D12_HEAP_PROPERTIES {
                        Type: D3D12_HEAP_TYPE_DEFAULT,
                        ..Default::default()
                    },
                    D3D12_HEAP_FLAG_NONE,
                    &D3D12_RESOURCE_DESC {
                        Dimension: D3D12_RESOURCE_DIMENSION_TEXTURE2D,
                        Width: width as u64,
                        Height: height,
                        DepthOrArraySize: 1,
                        MipLevels: 1,
                        Format: to_dxgi_format(format),
                        SampleDesc: DXGI_SAMPLE_DESC { Count: 1, Quality: 0 },
                        Layout: D3D12_TEXTURE_LAYOUT_UNKNOWN,
                        Flags: D3D12_RESOURCE_FLAG_ALLOW_DEPTH_STENCIL,
                        ..Default::default()
                    },
                    D3D12_RESOURCE_STATE_DEPTH_WRITE,
                    Some(&clear_value),
                    &mut resource,
                )
                .map_err(|e| Error::new(ErrorKind::SwapChain, format!("gfx::d3d12: create depth target failed: {}", e.message())))?;
        }
        resource.ok_or_else(|| Error::new(ErrorKind::SwapChain, "gfx::d3d12: create depth target returned no resource"))
    }
}

impl gfx::Device for Device {
    type SwapChain = SwapChain;
    type CmdBuf = CmdBuf;
    type Fence = Fence;
    type Buffer = Buffer;
    type Texture = Texture;
    type Heap = Heap;
    type Shader = Shader;
    type RootSignature = RootSignature;
    type RenderPipeline = RenderPipeline;

    fn create(info: &gfx::DeviceInfo) -> Result<Device> {
        unsafe {
            let mut feature_flags = gfx::DeviceFeatureFlags::NONE;

            // enable debug layer
            let mut dxgi_factory_flags = DXGI_CREATE_FACTORY_FLAGS(0);
            if info.debug_layer {
                let mut debug: Option<ID3D12Debug> = None;
                if let Some(debug) = D3D12GetDebugInterface(&mut debug).ok().and(debug) {
                    debug.EnableDebugLayer();
                    dxgi_factory_flags |= DXGI_CREATE_FACTORY_DEBUG;
                    feature_flags |= gfx::DeviceFeatureFlags::DEBUG_LAYER;
                    log::info!("gfx::d3d12: enabled debug layer");
                } else {
                    log::warn!("gfx::d3d12: debug layer requested but unavailable");
                }
            }

            // create dxgi factory
            let dxgi_factory: IDXGIFactory4 = CreateDXGIFactory2(dxgi_factory_flags).map_err(|e| {
                Error::new(ErrorKind::DeviceCreation, format!("gfx::d3d12: failed to create dxgi factory: {}", e.message()))
            })?;

            // select adapter and create device, falling back to warp
            let mut available = Vec::new();
            let hardware = get_hardware_adapter(&dxgi_factory, &info.adapter_name, &mut available)
                .and_then(|adapter| create_d3d12_device(&adapter).map(|device| (adapter, device)));
            let (adapter, device, software) = match hardware {
                Some((adapter, device)) => (adapter, device, false),
                None => {
                    if !info.allow_software_fallback {
                        return Err(Error::new(
                            ErrorKind::DeviceCreation,
                            "gfx::d3d12: no hardware adapter could create a device and software fallback is disabled",
                        ));
                    }
                    log::warn!("gfx::d3d12: hardware device creation failed, falling back to warp");
                    let adapter: IDXGIAdapter1 = dxgi_factory.EnumWarpAdapter().map_err(|e| {
                        Error::new(ErrorKind::DeviceCreation, format!("gfx::d3d12: no warp adapter: {}", e.message()))
                    })?;
                    let device = create_d3d12_device(&adapter).ok_or_else(|| {
                        Error::new(ErrorKind::DeviceCreation, "gfx::d3d12: failed to create a device on the warp adapter")
                    })?;
                    feature_flags |= gfx::DeviceFeatureFlags::SOFTWARE_ADAPTER;
                    (adapter, device, true)
                }
            };

            // root signature 1.1 support
            let mut rs_feature = D3D12_FEATURE_DATA_ROOT_SIGNATURE {
                HighestVersion: D3D_ROOT_SIGNATURE_VERSION_1_1,
            };
            if device
                .CheckFeatureSupport(
                    D3D12_FEATURE_ROOT_SIGNATURE,
                    &mut rs_feature as *mut _ as *mut std::ffi::c_void,
                    std::mem::size_of::<D3D12_FEATURE_DATA_ROOT_SIGNATURE>() as u32,
                )
                .is_ok()
                && rs_feature.HighestVersion == D3D_ROOT_SIGNATURE_VERSION_1_1
            {
                feature_flags |= gfx::DeviceFeatureFlags::ROOT_SIGNATURE_1_1;
            }

            // highest supported feature level
            let requested = [
                D3D_FEATURE_LEVEL_11_0,
                D3D_FEATURE_LEVEL_11_1,
                D3D_FEATURE_LEVEL_12_0,
                D3D_FEATURE_LEVEL_12_1,
            ];
            let mut levels = D3D12_FEATURE_DATA_FEATURE_LEVELS {
                NumFeatureLevels: requested.len() as u32,
                pFeatureLevelsRequested: requested.as_ptr(),
                MaxSupportedFeatureLevel: D3D_FEATURE_LEVEL_11_0,
            };
            let feature_level = if device
                .CheckFeatureSupport(
                    D3D12_FEATURE_FEATURE_LEVELS,
                    &mut levels as *mut _ as *mut std::ffi::c_void,
                    std::mem::size_of::<D3D12_FEATURE_DATA_FEATURE_LEVELS>() as u32,
                )
                .is_ok()
            {
                match levels.MaxSupportedFeatureLevel {
                    D3D_FEATURE_LEVEL_12_1 => gfx::FeatureLevel::Level12_1,
                    D3D_FEATURE_LEVEL_12_0 => gfx::FeatureLevel::Level12_0,
                    D3D_FEATURE_LEVEL_11_1 => gfx::FeatureLevel::Level11_1,
                    _ => gfx::FeatureLevel::Level11_0,
                }
            } else {
                gfx::FeatureLevel::Level11_0
            };

            // create queue
            let command_queue: ID3D12CommandQueue = device
                .CreateCommandQueue(&D3D12_COMMAND_QUEUE_DESC {
                    Type: D3D12_COMMAND_LIST_TYPE_DIRECT,
                    ..Default::default()
                })
                .map_err(|e| {
                    Error::new(ErrorKind::DeviceCreation, format!("gfx::d3d12: failed to create command queue: {}", e.message()))
                })?;

            let desc = adapter.GetDesc1().map_err(|e| {
                Error::new(ErrorKind::DeviceCreation, format!("gfx::d3d12: failed to query adapter: {}", e.message()))
            })?;
            let adapter_info = gfx::AdapterInfo {
                name: get_adapter_name(&desc),
                description: format!("vendor {:#x} device {:#x}", desc.VendorId, desc.DeviceId),
                dedicated_video_memory: desc.DedicatedVideoMemory,
                dedicated_system_memory: desc.DedicatedSystemMemory,
                shared_system_memory: desc.SharedSystemMemory,
                software,
                feature_level,
                available,
            };
            log::info!("gfx::d3d12: created device on '{}'", adapter_info.name);

            Ok(Device {
                adapter_info,
                feature_flags,
                dxgi_factory,
                device,
                command_queue,
                pending: PendingSubmissions::default(),
            })
        }
    }

    fn create_fence(&mut self) -> Result<Fence> {
        unsafe {
            let fence: ID3D12Fence = self.device.CreateFence(0, D3D12_FENCE_FLAG_NONE).map_err(|e| {
                Error::new(ErrorKind::ResourceCreation, format!("gfx::d3d12: create fence failed: {}", e.message()))
            })?;
            let event = CreateEventA(None, false, false, None).map_err(|e| {
                Error::new(ErrorKind::ResourceCreation, format!("gfx::d3d12: create fence event failed: {}", e.message()))
            })?;
            Ok(Fence {
                fence,
                event,
                id: gfx::next_object_id(),
                counter: 0,
            })
        }
    }

    fn create_swap_chain<A: os::App>(&mut self, info: &gfx::SwapChainInfo, window: &A::Window) -> Result<SwapChain> {
        let size = window.get_client_size();
        gfx::validate_swap_chain_info(info, size.x, size.y)?;
        let hwnd = match window.get_native_handle() {
            os::NativeHandle::Hwnd(hwnd) => HWND(hwnd as *mut std::ffi::c_void),
            os::NativeHandle::Headless => {
                return Err(Error::new(ErrorKind::SwapChain, "gfx::d3d12: window has no native surface to present to"));
            }
        };
        let (width, height) = (size.x as u32, size.y as u32);

        unsafe {
            let swap_chain_desc = DXGI_SWAP_CHAIN_DESC1 {
                BufferCount: info.num_buffers,
                Width: width,
                Height: height,
                Format: to_dxgi_format(info.format),
                BufferUsage: DXGI_USAGE_RENDER_TARGET_OUTPUT,
                SwapEffect: DXGI_SWAP_EFFECT_FLIP_DISCARD,
                SampleDesc: DXGI_SAMPLE_DESC {
                    Count: 1,
                    ..Default::default()
                },
                ..Default::default()
            };
            let swap_chain: IDXGISwapChain1 = self
                .dxgi_factory
                .CreateSwapChainForHwnd(&self.command_queue, hwnd, &swap_chain_desc, None, None)
                .map_err(|e| Error::new(ErrorKind::SwapChain, format!("gfx::d3d12: failed to create swap chain: {}", e.message())))?;
            let swap_chain: IDXGISwapChain3 = swap_chain
                .cast()
                .map_err(|e| Error::new(ErrorKind::SwapChain, format!("gfx::d3d12: swap chain cast failed: {}", e.message())))?;

            // render target views for the backbuffers
            let rtv_heap = self
                .create_descriptor_heap(D3D12_DESCRIPTOR_HEAP_TYPE_RTV, info.num_buffers as usize, false)
                .map_err(|e| Error::new(ErrorKind::SwapChain, e.msg))?;
            let rtv_size = self.device.GetDescriptorHandleIncrementSize(D3D12_DESCRIPTOR_HEAP_TYPE_RTV) as usize;
            let rtv_start = rtv_heap.GetCPUDescriptorHandleForHeapStart();
            let mut backbuffers = Vec::new();
            for i in 0..info.num_buffers {
                let resource: ID3D12Resource = swap_chain.GetBuffer(i).map_err(|e| {
                    Error::new(ErrorKind::SwapChain, format!("gfx::d3d12: failed to get backbuffer {}: {}", i, e.message()))
                })?;
                let handle = D3D12_CPU_DESCRIPTOR_HANDLE {
                    ptr: rtv_start.ptr + i as usize * rtv_size,
                };
                self.device.CreateRenderTargetView(&resource, None, handle);
                backbuffers.push(Texture {
                    resource,
                    tracker: StateTracker::new(gfx::ResourceState::Present),
                    format: info.format,
                    width,
                    height,
                    rtv: Some(handle),
                    dsv: None,
                });
            }

            // optional depth target
            let (depth_stencil, dsv_heap) = match info.depth_format {
                Some(format) => {
                    let resource = self.create_depth_texture(format, width, height)?;
                    let dsv_heap = self
                        .create_descriptor_heap(D3D12_DESCRIPTOR_HEAP_TYPE_DSV, 1, false)
                        .map_err(|e| Error::new(ErrorKind::SwapChain, e.msg))?;
                    let handle = dsv_heap.GetCPUDescriptorHandleForHeapStart();
                    self.device.CreateDepthStencilView(&resource, None, handle);
                    (
                        Some(Texture {
                            resource,
                            tracker: StateTracker::new(gfx::ResourceState::DepthStencil),
                            format,
                            width,
                            height,
                            rtv: None,
                            dsv: Some(handle),
                        }),
                        Some(dsv_heap),
                    )
                }
                None => (None, None),
            };

            let clear_colour = info
                .clear_colour
                .unwrap_or_else(|| gfx::ClearColour::from(window.get_background_colour()));

            Ok(SwapChain {
                bb_index: swap_chain.GetCurrentBackBufferIndex(),
                swap_chain,
                backbuffers,
                depth_stencil,
                clear_colour,
                width,
                height,
                _rtv_heap: rtv_heap,
                _dsv_heap: dsv_heap,
            })
        }
    }

    fn create_cmd_buf(&mut self) -> Result<CmdBuf> {
        unsafe {
            let command_allocator: ID3D12CommandAllocator = self
                .device
                .CreateCommandAllocator(D3D12_COMMAND_LIST_TYPE_DIRECT)
                .map_err(|e| Error::new(ErrorKind::ResourceCreation, format!("gfx::d3d12: create command allocator failed: {}", e.message())))?;
            let command_list: ID3D12GraphicsCommandList = self
                .device
                .CreateCommandList(0, D3D12_COMMAND_LIST_TYPE_DIRECT, &command_allocator, None)
                .map_err(|e| Error::new(ErrorKind::ResourceCreation, format!("gfx::d3d12: create command list failed: {}", e.message())))?;
            // lists are created open, the api contract is that command buffers start closed
            command_list.Close().map_err(device_lost)?;
            Ok(CmdBuf {
                validator: CmdBufValidator::new(),
                command_allocator,
                command_list,
            })
        }
    }

    fn create_buffer(&mut self, info: &gfx::BufferInfo) -> Result<Buffer> {
        if info.size_bytes == 0 {
            return Err(Error::new(ErrorKind::ResourceCreation, "gfx::d3d12: buffer size must be greater than 0"));
        }
        if info.usage.contains(gfx::BufferUsage::INDEX) && !matches!(info.format, gfx::Format::R16u | gfx::Format::R32u) {
            return Err(Error::new(
                ErrorKind::ResourceCreation,
                format!("gfx::d3d12: {:?} is not an index format", info.format),
            ));
        }
        let size = info.get_allocation_size();
        let state = match info.heap {
            gfx::HeapType::Upload => gfx::ResourceState::GenericRead,
            gfx::HeapType::Readback => gfx::ResourceState::CopyDst,
            gfx::HeapType::Device => gfx::ResourceState::Common,
        };
        let resource = create_committed_buffer(&self.device, info.heap, size, state)?;

        // upload buffers stay mapped for their lifetime
        let mut mapped = std::ptr::null_mut();
        if info.heap == gfx::HeapType::Upload {
            unsafe {
                let mut map_data = std::ptr::null_mut();
                let read_range = D3D12_RANGE { Begin: 0, End: 0 };
                resource
                    .Map(0, Some(&read_range), Some(&mut map_data))
                    .map_err(|e| Error::new(ErrorKind::ResourceCreation, format!("gfx::d3d12: map failed: {}", e.message())))?;
                mapped = map_data as *mut u8;
            }
        }

        let location = unsafe { resource.GetGPUVirtualAddress() };
        let vbv = if info.usage.contains(gfx::BufferUsage::VERTEX) {
            Some(D3D12_VERTEX_BUFFER_VIEW {
                BufferLocation: location,
                StrideInBytes: info.stride as u32,
                SizeInBytes: size as u32,
            })
        } else {
            None
        };
        let ibv = if info.usage.contains(gfx::BufferUsage::INDEX) {
            Some(D3D12_INDEX_BUFFER_VIEW {
                BufferLocation: location,
                SizeInBytes: size as u32,
                Format: to_dxgi_format(info.format),
            })
        } else {
            None
        };

        Ok(Buffer {
            resource,
            tracker: StateTracker::new(state),
            heap: info.heap,
            usage: info.usage,
            size,
            stride: info.stride,
            format: info.format,
            mapped,
            vbv,
            ibv,
        })
    }

    fn create_heap(&mut self, info: &gfx::HeapInfo) -> Result<Heap> {
        if info.num_descriptors == 0 {
            return Err(Error::new(ErrorKind::ResourceCreation, "gfx::d3d12: heap must hold at least 1 descriptor"));
        }
        let (d3d12_type, shader_visible) = match info.heap_type {
            gfx::DescriptorHeapType::Shader => (D3D12_DESCRIPTOR_HEAP_TYPE_CBV_SRV_UAV, true),
            gfx::DescriptorHeapType::RenderTarget => (D3D12_DESCRIPTOR_HEAP_TYPE_RTV, false),
            gfx::DescriptorHeapType::DepthStencil => (D3D12_DESCRIPTOR_HEAP_TYPE_DSV, false),
        };
        let heap = self.create_descriptor_heap(d3d12_type, info.num_descriptors, shader_visible)?;
        let increment_size = unsafe { self.device.GetDescriptorHandleIncrementSize(d3d12_type) as usize };
        Ok(Heap {
            heap,
            id: gfx::next_object_id(),
            heap_type: info.heap_type,
            num_descriptors: info.num_descriptors,
            num_allocated: 0,
            increment_size,
        })
    }

    fn create_constant_buffer_view(&mut self, buffer: &Buffer, heap: &mut Heap) -> Result<usize> {
        if !buffer.usage.contains(gfx::BufferUsage::CONSTANT_BUFFER) {
            return Err(Error::new(
                ErrorKind::ResourceCreation,
                "gfx::d3d12: constant buffer view of a buffer without CONSTANT_BUFFER usage",
            ));
        }
        if heap.heap_type != gfx::DescriptorHeapType::Shader {
            return Err(Error::new(ErrorKind::ResourceCreation, "gfx::d3d12: constant buffer views need a shader heap"));
        }
        if heap.num_allocated >= heap.num_descriptors {
            return Err(Error::new(ErrorKind::ResourceCreation, "gfx::d3d12: descriptor heap is full"));
        }
        let index = heap.num_allocated;
        unsafe {
            let handle = D3D12_CPU_DESCRIPTOR_HANDLE {
                ptr: heap.heap.GetCPUDescriptorHandleForHeapStart().ptr + index * heap.increment_size,
            };
            self.device.CreateConstantBufferView(
                Some(&D3D12_CONSTANT_BUFFER_VIEW_DESC {
                    BufferLocation: buffer.resource.GetGPUVirtualAddress(),
                    SizeInBytes: buffer.size as u32,
                }),
                handle,
            );
        }
        heap.num_allocated += 1;
        Ok(index)
    }

    fn create_shader(&self, info: &gfx::ShaderInfo, src: &[u8]) -> Result<Shader> {
        if src.is_empty() {
            return Err(Error::new(ErrorKind::ShaderCompile, "gfx::d3d12: shader source is empty"));
        }
        let bytecode = match &info.compile_info {
            None => src.to_vec(),
            Some(compile_info) => {
                let flags = if compile_info.debug {
                    D3DCOMPILE_DEBUG | D3DCOMPILE_SKIP_OPTIMIZATION
                } else {
                    0
                };
                let entry_point = CString::new(compile_info.entry_point.as_str())
                    .map_err(|_| Error::new(ErrorKind::ShaderCompile, "gfx::d3d12: entry point contains a nul"))?;
                let target = CString::new(compile_info.target.as_str())
                    .map_err(|_| Error::new(ErrorKind::ShaderCompile, "gfx::d3d12: target contains a nul"))?;
                let mut shader_blob = None;
                let mut error_blob = None;
                let result = unsafe {
                    D3DCompile(
                        src.as_ptr() as *const std::ffi::c_void,
                        src.len(),
                        PCSTR::null(),
                        None,
                        None,
                        PCSTR(entry_point.as_ptr() as _),
                        PCSTR(target.as_ptr() as _),
                        flags,
                        0,
                        &mut shader_blob,
                        Some(&mut error_blob),
                    )
                };
                if let Err(e) = result {
                    let msg = error_blob.as_ref().map(blob_to_string).unwrap_or_else(|| e.message().to_string());
                    return Err(Error::new(
                        ErrorKind::ShaderCompile,
                        format!("gfx::d3d12: {} ({}): {}", compile_info.entry_point, compile_info.target, msg),
                    ));
                }
                let blob = shader_blob
                    .ok_or_else(|| Error::new(ErrorKind::ShaderCompile, "gfx::d3d12: compiler returned no bytecode"))?;
                blob_to_vec(&blob)
            }
        };
        Ok(Shader {
            shader_type: info.shader_type,
            bytecode,
        })
    }

    fn create_root_signature(&self, info: &gfx::RootSignatureInfo) -> Result<RootSignature> {
        gfx::validate_root_signature(info)?;

        // ranges must outlive the serialised description
        let ranges: Vec<Vec<D3D12_DESCRIPTOR_RANGE>> = info
            .parameters
            .iter()
            .map(|param| match &param.kind {
                gfx::RootParameterKind::DescriptorTable(ranges) => ranges
                    .iter()
                    .map(|range| D3D12_DESCRIPTOR_RANGE {
                        RangeType: to_d3d12_range_type(range.descriptor_type),
                        NumDescriptors: range.num_descriptors,
                        BaseShaderRegister: range.base_register,
                        RegisterSpace: range.register_space,
                        OffsetInDescriptorsFromTableStart: D3D12_DESCRIPTOR_RANGE_OFFSET_APPEND,
                    })
                    .collect(),
                _ => Vec::new(),
            })
            .collect();

        let parameters: Vec<D3D12_ROOT_PARAMETER> = info
            .parameters
            .iter()
            .zip(ranges.iter())
            .map(|(param, ranges)| {
                let visibility = to_d3d12_shader_visibility(param.visibility);
                match &param.kind {
                    gfx::RootParameterKind::DescriptorTable(_) => D3D12_ROOT_PARAMETER {
                        ParameterType: D3D12_ROOT_PARAMETER_TYPE_DESCRIPTOR_TABLE,
                        Anonymous: D3D12_ROOT_PARAMETER_0 {
                            DescriptorTable: D3D12_ROOT_DESCRIPTOR_TABLE {
                                NumDescriptorRanges: ranges.len() as u32,
                                pDescriptorRanges: ranges.as_ptr(),
                            },
                        },
                        ShaderVisibility: visibility,
                    },
                    gfx::RootParameterKind::Constants {
                        register,
                        register_space,
                        num_values,
                    } => D3D12_ROOT_PARAMETER {
                        ParameterType: D3D12_ROOT_PARAMETER_TYPE_32BIT_CONSTANTS,
                        Anonymous: D3D12_ROOT_PARAMETER_0 {
                            Constants: D3D12_ROOT_CONSTANTS {
                                ShaderRegister: *register,
                                RegisterSpace: *register_space,
                                Num32BitValues: *num_values,
                            },
                        },
                        ShaderVisibility: visibility,
                    },
                    gfx::RootParameterKind::Descriptor {
                        descriptor_type,
                        register,
                        register_space,
                    } => D3D12_ROOT_PARAMETER {
                        ParameterType: match descriptor_type {
                            gfx::DescriptorType::ConstantBuffer => D3D12_ROOT_PARAMETER_TYPE_CBV,
                            gfx::DescriptorType::ShaderResource => D3D12_ROOT_PARAMETER_TYPE_SRV,
                            gfx::DescriptorType::UnorderedAccess => D3D12_ROOT_PARAMETER_TYPE_UAV,
                        },
                        Anonymous: D3D12_ROOT_PARAMETER_0 {
                            Descriptor: D3D12_ROOT_DESCRIPTOR {
                                ShaderRegister: *register,
                                RegisterSpace: *register_space,
                            },
                        },
                        ShaderVisibility: visibility,
                    },
                }
            })
            .collect();

        let desc = D3D12_ROOT_SIGNATURE_DESC {
            NumParameters: parameters.len() as u32,
            pParameters: if parameters.is_empty() {
                std::ptr::null()
            } else {
                parameters.as_ptr()
            },
            Flags: if info.allow_input_layout {
                D3D12_ROOT_SIGNATURE_FLAG_ALLOW_INPUT_ASSEMBLER_INPUT_LAYOUT
            } else {
                D3D12_ROOT_SIGNATURE_FLAG_NONE
            },
            ..Default::default()
        };

        let mut signature_blob = None;
        let mut error_blob = None;
        let result = unsafe {
            D3D12SerializeRootSignature(&desc, D3D_ROOT_SIGNATURE_VERSION_1, &mut signature_blob, Some(&mut error_blob))
        };
        if let Err(e) = result {
            let msg = error_blob.as_ref().map(blob_to_string).unwrap_or_else(|| e.message().to_string());
            return Err(Error::new(ErrorKind::RootSignature, format!("gfx::d3d12: serialise failed: {}", msg)));
        }
        let signature_blob = signature_blob
            .ok_or_else(|| Error::new(ErrorKind::RootSignature, "gfx::d3d12: serialise returned no blob"))?;
        let root_signature: ID3D12RootSignature = unsafe {
            self.device
                .CreateRootSignature(0, &blob_to_vec(&signature_blob))
                .map_err(|e| Error::new(ErrorKind::RootSignature, format!("gfx::d3d12: create failed: {}", e.message())))?
        };

        Ok(RootSignature {
            root_signature,
            id: gfx::next_object_id(),
            parameters: info.parameters.clone(),
            allow_input_layout: info.allow_input_layout,
        })
    }

    fn create_render_pipeline(&self, info: &gfx::RenderPipelineInfo<Device>) -> Result<RenderPipeline> {
        let signature = gfx::validate_render_pipeline(info)?;

        // semantic names must outlive the description
        let semantics = info
            .input_layout
            .iter()
            .map(|element| CString::new(element.semantic.as_str()))
            .collect::<std::result::Result<Vec<CString>, _>>()
            .map_err(|_| Error::new(ErrorKind::PipelineState, "gfx::d3d12: semantic contains a nul"))?;
        let input_elements: Vec<D3D12_INPUT_ELEMENT_DESC> = info
            .input_layout
            .iter()
            .zip(semantics.iter())
            .map(|(element, semantic)| D3D12_INPUT_ELEMENT_DESC {
                SemanticName: PCSTR(semantic.as_ptr() as _),
                SemanticIndex: element.index,
                Format: to_dxgi_format(element.format),
                InputSlot: element.input_slot,
                AlignedByteOffset: element.aligned_byte_offset,
                InputSlotClass: D3D12_INPUT_CLASSIFICATION_PER_VERTEX_DATA,
                InstanceDataStepRate: 0,
            })
            .collect();

        let raster = &info.raster_info;
        let blend = &info.blend_info;
        let depth_stencil = &info.depth_stencil_info;

        let mut rtv_formats = [DXGI_FORMAT_UNKNOWN; 8];
        rtv_formats[0] = to_dxgi_format(info.render_target_format);

        let desc = D3D12_GRAPHICS_PIPELINE_STATE_DESC {
            InputLayout: D3D12_INPUT_LAYOUT_DESC {
                pInputElementDescs: input_elements.as_ptr(),
                NumElements: input_elements.len() as u32,
            },
            pRootSignature: std::mem::ManuallyDrop::new(Some(info.root_signature.root_signature.clone())),
            VS: D3D12_SHADER_BYTECODE {
                pShaderBytecode: info.vs.bytecode.as_ptr() as *const std::ffi::c_void,
                BytecodeLength: info.vs.bytecode.len(),
            },
            PS: D3D12_SHADER_BYTECODE {
                pShaderBytecode: info.ps.bytecode.as_ptr() as *const std::ffi::c_void,
                BytecodeLength: info.ps.bytecode.len(),
            },
            RasterizerState: D3D12_RASTERIZER_DESC {
                FillMode: match raster.fill_mode {
                    gfx::FillMode::Solid => D3D12_FILL_MODE_SOLID,
                    gfx::FillMode::Wireframe => D3D12_FILL_MODE_WIREFRAME,
                },
                CullMode: match raster.cull_mode {
                    gfx::CullMode::None => D3D12_CULL_MODE_NONE,
                    gfx::CullMode::Front => D3D12_CULL_MODE_FRONT,
                    gfx::CullMode::Back => D3D12_CULL_MODE_BACK,
                },
                FrontCounterClockwise: raster.front_ccw.into(),
                DepthBias: raster.depth_bias,
                DepthClipEnable: raster.depth_clip_enable.into(),
                ..Default::default()
            },
            BlendState: D3D12_BLEND_DESC {
                AlphaToCoverageEnable: false.into(),
                IndependentBlendEnable: false.into(),
                RenderTarget: [D3D12_RENDER_TARGET_BLEND_DESC {
                    BlendEnable: blend.blend_enabled.into(),
                    LogicOpEnable: false.into(),
                    SrcBlend: to_d3d12_blend(blend.src_blend),
                    DestBlend: to_d3d12_blend(blend.dst_blend),
                    BlendOp: to_d3d12_blend_op(blend.blend_op),
                    SrcBlendAlpha: to_d3d12_blend(blend.src_blend_alpha),
                    DestBlendAlpha: to_d3d12_blend(blend.dst_blend_alpha),
                    BlendOpAlpha: to_d3d12_blend_op(blend.blend_op_alpha),
                    LogicOp: D3D12_LOGIC_OP_NOOP,
                    RenderTargetWriteMask: blend.write_mask,
                }; 8],
            },
            DepthStencilState: D3D12_DEPTH_STENCIL_DESC {
                DepthEnable: depth_stencil.depth_enabled.into(),
                DepthWriteMask: if depth_stencil.depth_write {
                    D3D12_DEPTH_WRITE_MASK_ALL
                } else {
                    D3D12_DEPTH_WRITE_MASK_ZERO
                },
                DepthFunc: to_d3d12_comparison_func(depth_stencil.depth_func),
                StencilEnable: depth_stencil.stencil_enabled.into(),
                ..Default::default()
            },
            DSVFormat: info.depth_format.map(to_dxgi_format).unwrap_or(DXGI_FORMAT_UNKNOWN),
            SampleMask: u32::MAX,
            PrimitiveTopologyType: to_d3d12_topology_type(info.topology),
            NumRenderTargets: 1,
            RTVFormats: rtv_formats,
            SampleDesc: DXGI_SAMPLE_DESC { Count: 1, Quality: 0 },
            ..Default::default()
        };

        let result = unsafe { self.device.CreateGraphicsPipelineState(&desc) };
        // the description holds a reference on the root signature
        drop(std::mem::ManuallyDrop::into_inner(desc.pRootSignature));
        let pso: ID3D12PipelineState = result.map_err(|e| {
            Error::new(ErrorKind::PipelineState, format!("gfx::d3d12: create pipeline state failed: {}", e.message()))
        })?;

        Ok(RenderPipeline { pso, signature })
    }

    fn execute(&mut self, cmd: &mut CmdBuf) -> Result<()> {
        let marker = cmd.validator.submit()?;
        unsafe {
            let list: ID3D12CommandList = cmd.command_list.cast().map_err(device_lost)?;
            self.command_queue.ExecuteCommandLists(&[Some(list)]);
            if let Err(e) = self.device.GetDeviceRemovedReason().ok() {
                return Err(device_lost(e));
            }
        }
        self.pending.push(marker);
        Ok(())
    }

    fn get_adapter_info(&self) -> &gfx::AdapterInfo {
        &self.adapter_info
    }

    fn get_feature_flags(&self) -> &gfx::DeviceFeatureFlags {
        &self.feature_flags
    }
}

impl Drop for Fence {
    fn drop(&mut self) {
        unsafe {
            let _ = CloseHandle(self.event);
        }
    }
}

impl gfx::Fence<Device> for Fence {
    fn get_id(&self) -> u64 {
        self.id
    }

    fn advance_and_signal(&mut self, device: &mut Device) -> Result<u64> {
        let value = self.counter + 1;
        unsafe {
            device.command_queue.Signal(&self.fence, value).map_err(device_lost)?;
        }
        device.pending.retire(self.id, value);
        self.counter = value;
        Ok(value)
    }

    fn wait_until(&self, value: u64, timeout: Option<Duration>) -> Result<()> {
        if value > self.counter {
            return Err(Error::new(
                ErrorKind::Validation,
                format!("gfx::d3d12: wait for fence value {} which has not been signalled (counter {})", value, self.counter),
            ));
        }
        unsafe {
            if self.fence.GetCompletedValue() >= value {
                return Ok(());
            }
            self.fence.SetEventOnCompletion(value, self.event).map_err(device_lost)?;
            let ms = timeout.map(|t| t.as_millis().min(INFINITE as u128 - 1) as u32).unwrap_or(INFINITE);
            match WaitForSingleObject(self.event, ms) {
                WAIT_OBJECT_0 => Ok(()),
                WAIT_TIMEOUT => Err(Error::new(
                    ErrorKind::FenceTimeout,
                    format!("gfx::d3d12: fence reached {} of {} before the timeout", self.fence.GetCompletedValue(), value),
                )),
                _ => Err(Error::new(ErrorKind::DeviceLost, "gfx::d3d12: fence wait failed")),
            }
        }
    }

    fn get_counter(&self) -> u64 {
        self.counter
    }

    fn get_completed_value(&self) -> u64 {
        unsafe { self.fence.GetCompletedValue() }
    }
}

impl gfx::SwapChain<Device> for SwapChain {
    fn get_num_buffers(&self) -> u32 {
        self.backbuffers.len() as u32
    }

    fn get_backbuffer_index(&self) -> u32 {
        self.bb_index
    }

    fn get_backbuffer_texture(&self) -> &Texture {
        &self.backbuffers[self.bb_index as usize]
    }

    fn get_depth_stencil_texture(&self) -> Option<&Texture> {
        self.depth_stencil.as_ref()
    }

    fn get_clear_colour(&self) -> gfx::ClearColour {
        self.clear_colour
    }

    fn get_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn present(&mut self, _device: &Device, vsync: bool) -> Result<()> {
        gfx::validate_present::<Device>(&self.backbuffers[self.bb_index as usize])?;
        unsafe {
            self.swap_chain
                .Present(if vsync { 1 } else { 0 }, DXGI_PRESENT(0))
                .ok()
                .map_err(device_lost)?;
            self.bb_index = self.swap_chain.GetCurrentBackBufferIndex();
        }
        Ok(())
    }
}

impl gfx::CmdBuf<Device> for CmdBuf {
    fn get_state(&self) -> gfx::CmdBufState {
        self.validator.get_state()
    }

    fn get_submission_marker(&self) -> gfx::SubmissionMarker {
        self.validator.get_marker()
    }

    fn reset(&mut self, fence: &Fence, pipeline: Option<&RenderPipeline>) -> Result<()> {
        self.validator.reset::<Device>(fence, pipeline)?;
        unsafe {
            self.command_allocator.Reset().map_err(device_lost)?;
            self.command_list
                .Reset(&self.command_allocator, pipeline.map(|p| &p.pso))
                .map_err(device_lost)?;
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.validator.close()?;
        unsafe { self.command_list.Close().map_err(device_lost) }
    }

    fn transition_barrier(&mut self, barrier: &gfx::TransitionBarrier<Device>) -> Result<()> {
        self.validator.transition_barrier(barrier)?;
        let resource = match (barrier.texture, barrier.buffer) {
            (Some(texture), _) => &texture.resource,
            (_, Some(buffer)) => &buffer.resource,
            _ => return Err(Error::new(ErrorKind::Validation, "gfx::d3d12: barrier has no resource")),
        };
        let d3d12_barrier = transition_barrier(
            resource,
            to_d3d12_resource_state(barrier.state_before),
            to_d3d12_resource_state(barrier.state_after),
        );
        unsafe {
            self.command_list.ResourceBarrier(std::slice::from_ref(&d3d12_barrier));
        }
        drop_barrier(d3d12_barrier);
        Ok(())
    }

    fn copy_buffer_region(
        &mut self,
        dst_buffer: &Buffer,
        dst_offset: usize,
        src_buffer: &Buffer,
        src_offset: usize,
        num_bytes: usize,
    ) -> Result<()> {
        self.validator
            .copy_buffer_region::<Device>(dst_buffer, dst_offset, src_buffer, src_offset, num_bytes)?;
        unsafe {
            self.command_list.CopyBufferRegion(
                &dst_buffer.resource,
                dst_offset as u64,
                &src_buffer.resource,
                src_offset as u64,
                num_bytes as u64,
            );
        }
        Ok(())
    }

    fn clear_render_target(&mut self, target: &Texture, colour: gfx::ClearColour) -> Result<()> {
        self.validator.clear_render_target::<Device>(target)?;
        let rtv = target
            .rtv
            .ok_or_else(|| Error::new(ErrorKind::Validation, "gfx::d3d12: texture has no render target view"))?;
        let rgba = colour.to_array();
        unsafe {
            self.command_list.ClearRenderTargetView(rtv, rgba.as_ptr(), None);
        }
        Ok(())
    }

    fn clear_depth_stencil(&mut self, target: &Texture, depth: f32, stencil: u8) -> Result<()> {
        self.validator.clear_depth_stencil::<Device>(target)?;
        let dsv = target
            .dsv
            .ok_or_else(|| Error::new(ErrorKind::Validation, "gfx::d3d12: texture has no depth stencil view"))?;
        unsafe {
            self.command_list.ClearDepthStencilView(
                dsv,
                D3D12_CLEAR_FLAG_DEPTH | D3D12_CLEAR_FLAG_STENCIL,
                depth,
                stencil,
                &[],
            );
        }
        Ok(())
    }

    fn set_render_targets(&mut self, target: &Texture, depth_stencil: Option<&Texture>) -> Result<()> {
        self.validator.set_render_targets::<Device>(target, depth_stencil)?;
        let rtv = target
            .rtv
            .ok_or_else(|| Error::new(ErrorKind::Validation, "gfx::d3d12: texture has no render target view"))?;
        let dsv = depth_stencil.and_then(|ds| ds.dsv);
        unsafe {
            self.command_list.OMSetRenderTargets(
                1,
                Some(&rtv),
                false,
                dsv.as_ref().map(|h| h as *const D3D12_CPU_DESCRIPTOR_HANDLE),
            );
        }
        Ok(())
    }

    fn set_viewport(&mut self, viewport: &gfx::Viewport) -> Result<()> {
        self.validator.set_viewport()?;
        let d3d12_vp = D3D12_VIEWPORT {
            TopLeftX: viewport.x,
            TopLeftY: viewport.y,
            Width: viewport.width,
            Height: viewport.height,
            MinDepth: viewport.min_depth,
            MaxDepth: viewport.max_depth,
        };
        unsafe {
            self.command_list.RSSetViewports(&[d3d12_vp]);
        }
        Ok(())
    }

    fn set_scissor_rect(&mut self, scissor_rect: &gfx::ScissorRect) -> Result<()> {
        self.validator.set_scissor_rect()?;
        let d3d12_sr = RECT {
            left: scissor_rect.left,
            top: scissor_rect.top,
            right: scissor_rect.right,
            bottom: scissor_rect.bottom,
        };
        unsafe {
            self.command_list.RSSetScissorRects(&[d3d12_sr]);
        }
        Ok(())
    }

    fn set_heaps(&mut self, heaps: &[&Heap]) -> Result<()> {
        self.validator.set_heaps::<Device>(heaps)?;
        let d3d12_heaps: Vec<Option<ID3D12DescriptorHeap>> = heaps.iter().map(|h| Some(h.heap.clone())).collect();
        unsafe {
            self.command_list.SetDescriptorHeaps(&d3d12_heaps);
        }
        Ok(())
    }

    fn set_root_signature(&mut self, root_signature: &RootSignature) -> Result<()> {
        self.validator.set_root_signature::<Device>(root_signature)?;
        unsafe {
            self.command_list.SetGraphicsRootSignature(&root_signature.root_signature);
        }
        Ok(())
    }

    fn set_render_pipeline(&mut self, pipeline: &RenderPipeline) -> Result<()> {
        self.validator.set_render_pipeline::<Device>(pipeline)?;
        unsafe {
            self.command_list.SetPipelineState(&pipeline.pso);
        }
        Ok(())
    }

    fn set_descriptor_table(&mut self, slot: u32, heap: &Heap, index: usize) -> Result<()> {
        self.validator.set_descriptor_table::<Device>(slot, heap, index)?;
        unsafe {
            let handle = D3D12_GPU_DESCRIPTOR_HANDLE {
                ptr: heap.heap.GetGPUDescriptorHandleForHeapStart().ptr + (index * heap.increment_size) as u64,
            };
            self.command_list.SetGraphicsRootDescriptorTable(slot, handle);
        }
        Ok(())
    }

    fn push_constants<T: Sized>(&mut self, slot: u32, data: &[T]) -> Result<()> {
        let num_values = std::mem::size_of_val(data) / 4;
        self.validator.push_constants(slot, num_values)?;
        unsafe {
            self.command_list.SetGraphicsRoot32BitConstants(
                slot,
                num_values as u32,
                data.as_ptr() as *const std::ffi::c_void,
                0,
            );
        }
        Ok(())
    }

    fn set_vertex_buffer(&mut self, buffer: &Buffer, slot: u32) -> Result<()> {
        self.validator.set_vertex_buffer::<Device>(buffer, slot)?;
        if let Some(vbv) = &buffer.vbv {
            unsafe {
                self.command_list.IASetVertexBuffers(slot, Some(std::slice::from_ref(vbv)));
            }
        }
        Ok(())
    }

    fn set_index_buffer(&mut self, buffer: &Buffer) -> Result<()> {
        self.validator.set_index_buffer::<Device>(buffer)?;
        if let Some(ibv) = &buffer.ibv {
            unsafe {
                self.command_list.IASetIndexBuffer(Some(ibv));
            }
        }
        Ok(())
    }

    fn set_topology(&mut self, topology: gfx::Topology) -> Result<()> {
        self.validator.set_topology(topology)?;
        unsafe {
            self.command_list.IASetPrimitiveTopology(to_d3d_topology(topology));
        }
        Ok(())
    }

    fn draw_instanced(&mut self, vertex_count: u32, instance_count: u32, start_vertex: u32, start_instance: u32) -> Result<()> {
        self.validator.draw_instanced(vertex_count, instance_count, start_vertex)?;
        unsafe {
            self.command_list
                .DrawInstanced(vertex_count, instance_count, start_vertex, start_instance);
        }
        Ok(())
    }

    fn draw_indexed_instanced(
        &mut self,
        index_count: u32,
        instance_count: u32,
        start_index: u32,
        base_vertex: i32,
        start_instance: u32,
    ) -> Result<()> {
        self.validator
            .draw_indexed_instanced(index_count, instance_count, start_index)?;
        unsafe {
            self.command_list.DrawIndexedInstanced(
                index_count,
                instance_count,
                start_index,
                base_vertex,
                start_instance,
            );
        }
        Ok(())
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        if !self.mapped.is_null() {
            unsafe {
                self.resource.Unmap(0, None);
            }
        }
    }
}

impl gfx::Buffer<Device> for Buffer {
    fn write<T: Sized>(&mut self, offset: usize, data: &[T]) -> Result<()> {
        if self.heap != gfx::HeapType::Upload || self.mapped.is_null() {
            return Err(Error::new(
                ErrorKind::Validation,
                format!("gfx::d3d12: {:?} heap buffers are not cpu writable", self.heap),
            ));
        }
        let bytes = gfx::slice_as_u8_slice(data);
        if offset + bytes.len() > self.size {
            return Err(Error::new(
                ErrorKind::Validation,
                format!("gfx::d3d12: write of {} bytes at {} overflows a {} byte buffer", bytes.len(), offset, self.size),
            ));
        }
        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), self.mapped.add(offset), bytes.len());
        }
        Ok(())
    }

    fn read(&self) -> Result<Vec<u8>> {
        match self.heap {
            gfx::HeapType::Upload => unsafe { Ok(std::slice::from_raw_parts(self.mapped, self.size).to_vec()) },
            gfx::HeapType::Readback => unsafe {
                let mut map_data = std::ptr::null_mut();
                let read_range = D3D12_RANGE {
                    Begin: 0,
                    End: self.size,
                };
                self.resource
                    .Map(0, Some(&read_range), Some(&mut map_data))
                    .map_err(device_lost)?;
                let data = std::slice::from_raw_parts(map_data as *const u8, self.size).to_vec();
                let write_range = D3D12_RANGE { Begin: 0, End: 0 };
                self.resource.Unmap(0, Some(&write_range));
                Ok(data)
            },
            gfx::HeapType::Device => Err(Error::new(
                ErrorKind::Validation,
                "gfx::d3d12: device heap buffers are not cpu readable",
            )),
        }
    }

    fn get_size(&self) -> usize {
        self.size
    }

    fn get_heap_type(&self) -> gfx::HeapType {
        self.heap
    }

    fn get_usage(&self) -> gfx::BufferUsage {
        self.usage
    }

    fn get_stride(&self) -> usize {
        self.stride
    }

    fn get_format(&self) -> gfx::Format {
        self.format
    }

    fn get_state_tracker(&self) -> &StateTracker {
        &self.tracker
    }
}

impl gfx::Texture<Device> for Texture {
    fn get_state_tracker(&self) -> &StateTracker {
        &self.tracker
    }

    fn get_format(&self) -> gfx::Format {
        self.format
    }

    fn get_width(&self) -> u32 {
        self.width
    }

    fn get_height(&self) -> u32 {
        self.height
    }
}

impl gfx::Heap<Device> for Heap {
    fn get_id(&self) -> u64 {
        self.id
    }

    fn get_heap_type(&self) -> gfx::DescriptorHeapType {
        self.heap_type
    }

    fn get_num_descriptors(&self) -> usize {
        self.num_descriptors
    }

    fn get_num_allocated(&self) -> usize {
        self.num_allocated
    }
}

impl gfx::Shader<Device> for Shader {
    fn get_type(&self) -> gfx::ShaderType {
        self.shader_type
    }

    fn get_bytecode(&self) -> &[u8] {
        &self.bytecode
    }
}

impl gfx::RootSignature<Device> for RootSignature {
    fn get_id(&self) -> u64 {
        self.id
    }

    fn get_parameters(&self) -> &[gfx::RootParameter] {
        &self.parameters
    }

    fn allows_input_layout(&self) -> bool {
        self.allow_input_layout
    }
}

impl gfx::RenderPipeline<Device> for RenderPipeline {
    fn get_signature(&self) -> &gfx::PipelineSignature {
        &self.signature
    }
}
