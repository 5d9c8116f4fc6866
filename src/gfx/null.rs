use crate::gfx;
use crate::gfx::CmdBufValidator;
use crate::gfx::PendingSubmissions;
use crate::gfx::StateTracker;
use crate::os;
use crate::os::Window as OsWindow;
use crate::Error;
use crate::ErrorKind;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread;
use std::time::{Duration, Instant};

/// Name of the adapter the null device reports as hardware.
pub const HARDWARE_ADAPTER_NAME: &str = "Null Hardware Adapter";

/// Name of the adapter the null device falls back to.
pub const SOFTWARE_ADAPTER_NAME: &str = "Null Software Adapter";

// a poisoned lock only means a panic happened while it was held, the data is still plain memory
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Counters of the work the queue thread has retired, returned from `Device::get_stats`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub submissions: u64,
    pub signals: u64,
    pub barriers: u64,
    pub copies: u64,
    pub bytes_copied: u64,
    pub clears: u64,
    pub draws: u64,
    pub vertices: u64,
    pub presents: u64,
}

/// Last values written into a texture by the queue.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TextureContents {
    pub clear_colour: [f32; 4],
    pub depth: f32,
    pub stencil: u8,
    pub draws: u64,
}

impl Default for TextureContents {
    fn default() -> Self {
        TextureContents {
            clear_colour: [0.0; 4],
            depth: 1.0,
            stencil: 0,
            draws: 0,
        }
    }
}

type Memory = Arc<Mutex<Vec<u8>>>;
type Surface = Arc<Mutex<TextureContents>>;

enum Command {
    Barrier,
    Copy {
        dst: Memory,
        dst_offset: usize,
        src: Memory,
        src_offset: usize,
        num_bytes: usize,
    },
    ClearColour {
        target: Surface,
        colour: [f32; 4],
    },
    ClearDepth {
        target: Surface,
        depth: f32,
        stencil: u8,
    },
    Draw {
        target: Surface,
        vertices: u64,
    },
}

struct FenceShared {
    completed: Mutex<u64>,
    cond: Condvar,
}

enum QueueOp {
    Execute(Vec<Command>),
    Signal(Arc<FenceShared>, u64),
    Present,
    Shutdown,
}

fn replay(commands: Vec<Command>, stats: &Mutex<QueueStats>) {
    let mut stats = lock(stats);
    stats.submissions += 1;
    for command in commands {
        match command {
            Command::Barrier => stats.barriers += 1,
            Command::Copy {
                dst,
                dst_offset,
                src,
                src_offset,
                num_bytes,
            } => {
                if Arc::ptr_eq(&dst, &src) {
                    lock(&dst).copy_within(src_offset..src_offset + num_bytes, dst_offset);
                } else {
                    let src = lock(&src);
                    let mut dst = lock(&dst);
                    dst[dst_offset..dst_offset + num_bytes]
                        .copy_from_slice(&src[src_offset..src_offset + num_bytes]);
                }
                stats.copies += 1;
                stats.bytes_copied += num_bytes as u64;
            }
            Command::ClearColour { target, colour } => {
                let mut target = lock(&target);
                target.clear_colour = colour;
                target.draws = 0;
                stats.clears += 1;
            }
            Command::ClearDepth { target, depth, stencil } => {
                let mut target = lock(&target);
                target.depth = depth;
                target.stencil = stencil;
                stats.clears += 1;
            }
            Command::Draw { target, vertices } => {
                lock(&target).draws += 1;
                stats.draws += 1;
                stats.vertices += vertices;
            }
        }
    }
}

fn queue_thread(rx: mpsc::Receiver<QueueOp>, stats: Arc<Mutex<QueueStats>>, latency: Arc<AtomicU64>) {
    for op in rx {
        match op {
            QueueOp::Execute(commands) => {
                let nanos = latency.load(Ordering::Relaxed);
                if nanos > 0 {
                    thread::sleep(Duration::from_nanos(nanos));
                }
                replay(commands, &stats);
            }
            QueueOp::Signal(fence, value) => {
                let mut completed = lock(&fence.completed);
                if value > *completed {
                    *completed = value;
                }
                fence.cond.notify_all();
                lock(&stats).signals += 1;
            }
            QueueOp::Present => {
                lock(&stats).presents += 1;
            }
            QueueOp::Shutdown => break,
        }
    }
}

/// Software device, command lists are replayed in submission order on a dedicated queue thread.
pub struct Device {
    adapter_info: gfx::AdapterInfo,
    feature_flags: gfx::DeviceFeatureFlags,
    queue: mpsc::Sender<QueueOp>,
    worker: Option<thread::JoinHandle<()>>,
    stats: Arc<Mutex<QueueStats>>,
    latency: Arc<AtomicU64>,
    pending: PendingSubmissions,
}

pub struct Fence {
    shared: Arc<FenceShared>,
    id: u64,
    counter: u64,
}

pub struct SwapChain {
    backbuffers: Vec<Texture>,
    depth_stencil: Option<Texture>,
    bb_index: u32,
    clear_colour: gfx::ClearColour,
    width: u32,
    height: u32,
}

pub struct CmdBuf {
    validator: CmdBufValidator,
    commands: Vec<Command>,
    render_target: Option<Surface>,
}

pub struct Buffer {
    tracker: StateTracker,
    heap: gfx::HeapType,
    usage: gfx::BufferUsage,
    size: usize,
    stride: usize,
    format: gfx::Format,
    memory: Memory,
}

pub struct Texture {
    tracker: StateTracker,
    format: gfx::Format,
    width: u32,
    height: u32,
    contents: Surface,
}

pub struct Heap {
    id: u64,
    heap_type: gfx::DescriptorHeapType,
    num_descriptors: usize,
    num_allocated: usize,
}

pub struct Shader {
    shader_type: gfx::ShaderType,
    bytecode: Vec<u8>,
}

pub struct RootSignature {
    id: u64,
    parameters: Vec<gfx::RootParameter>,
    allow_input_layout: bool,
}

pub struct RenderPipeline {
    signature: gfx::PipelineSignature,
}

impl Device {
    /// Snapshot of the work the queue has retired so far
    pub fn get_stats(&self) -> QueueStats {
        *lock(&self.stats)
    }

    /// Delays each submitted command list on the queue thread, simulates a slow gpu
    pub fn set_queue_latency(&self, latency: Duration) {
        self.latency.store(latency.as_nanos() as u64, Ordering::Relaxed);
    }

    /// Number of submissions which have not had a fence signal enqueued behind them
    pub fn get_num_pending_submissions(&self) -> usize {
        self.pending.len()
    }

    fn enqueue(&self, op: QueueOp) -> Result<(), Error> {
        self.queue
            .send(op)
            .map_err(|_| Error::new(ErrorKind::DeviceLost, "gfx::null: queue thread has terminated"))
    }

    fn signal(&mut self, fence: &Fence, value: u64) -> Result<(), Error> {
        self.enqueue(QueueOp::Signal(fence.shared.clone(), value))?;
        self.pending.retire(fence.id, value);
        Ok(())
    }

    fn create_texture(&self, format: gfx::Format, width: u32, height: u32, state: gfx::ResourceState) -> Texture {
        Texture {
            tracker: StateTracker::new(state),
            format,
            width,
            height,
            contents: Arc::new(Mutex::new(TextureContents::default())),
        }
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        let _ = self.queue.send(QueueOp::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
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

    fn create(info: &gfx::DeviceInfo) -> Result<Device, Error> {
        let software = match info.adapter_name.as_deref() {
            None | Some(HARDWARE_ADAPTER_NAME) => false,
            Some(SOFTWARE_ADAPTER_NAME) => true,
            Some(name) => {
                if !info.allow_software_fallback {
                    return Err(Error::new(
                        ErrorKind::DeviceCreation,
                        format!("gfx::null: no adapter named '{}' and software fallback is disabled", name),
                    ));
                }
                log::warn!(
                    "gfx::null: no adapter named '{}', falling back to '{}'",
                    name,
                    SOFTWARE_ADAPTER_NAME
                );
                true
            }
        };

        let adapter_info = gfx::AdapterInfo {
            name: if software { SOFTWARE_ADAPTER_NAME } else { HARDWARE_ADAPTER_NAME }.to_string(),
            description: "cpu replay of submitted command lists".to_string(),
            dedicated_video_memory: 0,
            dedicated_system_memory: 0,
            shared_system_memory: 0,
            software,
            feature_level: gfx::FeatureLevel::Level12_0,
            available: vec![HARDWARE_ADAPTER_NAME.to_string(), SOFTWARE_ADAPTER_NAME.to_string()],
        };

        let mut feature_flags = gfx::DeviceFeatureFlags::ROOT_SIGNATURE_1_1;
        if info.debug_layer {
            feature_flags |= gfx::DeviceFeatureFlags::DEBUG_LAYER;
        }
        if software {
            feature_flags |= gfx::DeviceFeatureFlags::SOFTWARE_ADAPTER;
        }

        let (tx, rx) = mpsc::channel();
        let stats = Arc::new(Mutex::new(QueueStats::default()));
        let latency = Arc::new(AtomicU64::new(0));
        let worker = {
            let stats = stats.clone();
            let latency = latency.clone();
            thread::Builder::new()
                .name("gfx-null-queue".to_string())
                .spawn(move || queue_thread(rx, stats, latency))
                .map_err(|e| Error::new(ErrorKind::DeviceCreation, format!("gfx::null: failed to spawn queue: {}", e)))?
        };

        log::info!("gfx::null: created device on '{}'", adapter_info.name);

        Ok(Device {
            adapter_info,
            feature_flags,
            queue: tx,
            worker: Some(worker),
            stats,
            latency,
            pending: PendingSubmissions::default(),
        })
    }

    fn create_fence(&mut self) -> Result<Fence, Error> {
        Ok(Fence {
            shared: Arc::new(FenceShared {
                completed: Mutex::new(0),
                cond: Condvar::new(),
            }),
            id: gfx::next_object_id(),
            counter: 0,
        })
    }

    fn create_swap_chain<A: os::App>(
        &mut self,
        info: &gfx::SwapChainInfo,
        window: &A::Window,
    ) -> Result<SwapChain, Error> {
        let size = window.get_client_size();
        gfx::validate_swap_chain_info(info, size.x, size.y)?;
        let (width, height) = (size.x as u32, size.y as u32);

        let backbuffers = (0..info.num_buffers)
            .map(|_| self.create_texture(info.format, width, height, gfx::ResourceState::Present))
            .collect();
        let depth_stencil = info
            .depth_format
            .map(|format| self.create_texture(format, width, height, gfx::ResourceState::DepthStencil));
        let clear_colour = info
            .clear_colour
            .unwrap_or_else(|| gfx::ClearColour::from(window.get_background_colour()));

        Ok(SwapChain {
            backbuffers,
            depth_stencil,
            bb_index: 0,
            clear_colour,
            width,
            height,
        })
    }

    fn create_cmd_buf(&mut self) -> Result<CmdBuf, Error> {
        Ok(CmdBuf {
            validator: CmdBufValidator::new(),
            commands: Vec::new(),
            render_target: None,
        })
    }

    fn create_buffer(&mut self, info: &gfx::BufferInfo) -> Result<Buffer, Error> {
        if info.size_bytes == 0 {
            return Err(Error::new(ErrorKind::ResourceCreation, "gfx::null: buffer size must be greater than 0"));
        }
        if info.usage.contains(gfx::BufferUsage::INDEX) && !matches!(info.format, gfx::Format::R16u | gfx::Format::R32u) {
            return Err(Error::new(
                ErrorKind::ResourceCreation,
                format!("gfx::null: {:?} is not an index format", info.format),
            ));
        }
        let size = info.get_allocation_size();
        let state = match info.heap {
            gfx::HeapType::Upload => gfx::ResourceState::GenericRead,
            gfx::HeapType::Readback => gfx::ResourceState::CopyDst,
            gfx::HeapType::Device => gfx::ResourceState::Common,
        };
        Ok(Buffer {
            tracker: StateTracker::new(state),
            heap: info.heap,
            usage: info.usage,
            size,
            stride: info.stride,
            format: info.format,
            memory: Arc::new(Mutex::new(vec![0; size])),
        })
    }

    fn create_heap(&mut self, info: &gfx::HeapInfo) -> Result<Heap, Error> {
        if info.num_descriptors == 0 {
            return Err(Error::new(ErrorKind::ResourceCreation, "gfx::null: heap must hold at least 1 descriptor"));
        }
        Ok(Heap {
            id: gfx::next_object_id(),
            heap_type: info.heap_type,
            num_descriptors: info.num_descriptors,
            num_allocated: 0,
        })
    }

    fn create_constant_buffer_view(&mut self, buffer: &Buffer, heap: &mut Heap) -> Result<usize, Error> {
        if !buffer.usage.contains(gfx::BufferUsage::CONSTANT_BUFFER) {
            return Err(Error::new(
                ErrorKind::ResourceCreation,
                "gfx::null: constant buffer view of a buffer without CONSTANT_BUFFER usage",
            ));
        }
        if heap.heap_type != gfx::DescriptorHeapType::Shader {
            return Err(Error::new(ErrorKind::ResourceCreation, "gfx::null: constant buffer views need a shader heap"));
        }
        if heap.num_allocated >= heap.num_descriptors {
            return Err(Error::new(ErrorKind::ResourceCreation, "gfx::null: descriptor heap is full"));
        }
        let index = heap.num_allocated;
        heap.num_allocated += 1;
        Ok(index)
    }

    fn create_shader(&self, info: &gfx::ShaderInfo, src: &[u8]) -> Result<Shader, Error> {
        if src.is_empty() {
            return Err(Error::new(ErrorKind::ShaderCompile, "gfx::null: shader source is empty"));
        }
        if let Some(compile_info) = &info.compile_info {
            log::trace!(
                "gfx::null: keeping {} ({}) as source",
                compile_info.entry_point,
                compile_info.target
            );
        }
        Ok(Shader {
            shader_type: info.shader_type,
            bytecode: src.to_vec(),
        })
    }

    fn create_root_signature(&self, info: &gfx::RootSignatureInfo) -> Result<RootSignature, Error> {
        gfx::validate_root_signature(info)?;
        Ok(RootSignature {
            id: gfx::next_object_id(),
            parameters: info.parameters.clone(),
            allow_input_layout: info.allow_input_layout,
        })
    }

    fn create_render_pipeline(&self, info: &gfx::RenderPipelineInfo<Device>) -> Result<RenderPipeline, Error> {
        let signature = gfx::validate_render_pipeline(info)?;
        Ok(RenderPipeline { signature })
    }

    fn execute(&mut self, cmd: &mut CmdBuf) -> Result<(), Error> {
        let marker = cmd.validator.submit()?;
        let commands = std::mem::take(&mut cmd.commands);
        self.enqueue(QueueOp::Execute(commands))?;
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

impl gfx::Fence<Device> for Fence {
    fn get_id(&self) -> u64 {
        self.id
    }

    fn advance_and_signal(&mut self, device: &mut Device) -> Result<u64, Error> {
        let value = self.counter + 1;
        device.signal(self, value)?;
        self.counter = value;
        Ok(value)
    }

    fn wait_until(&self, value: u64, timeout: Option<Duration>) -> Result<(), Error> {
        if value > self.counter {
            return Err(Error::new(
                ErrorKind::Validation,
                format!("gfx::null: wait for fence value {} which has not been signalled (counter {})", value, self.counter),
            ));
        }
        let deadline = timeout.map(|t| Instant::now() + t);
        let mut completed = lock(&self.shared.completed);
        while *completed < value {
            completed = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(Error::new(
                            ErrorKind::FenceTimeout,
                            format!("gfx::null: fence reached {} of {} before the timeout", *completed, value),
                        ));
                    }
                    self.shared
                        .cond
                        .wait_timeout(completed, deadline - now)
                        .map(|(guard, _)| guard)
                        .unwrap_or_else(|e| e.into_inner().0)
                }
                None => self.shared.cond.wait(completed).unwrap_or_else(|e| e.into_inner()),
            };
        }
        Ok(())
    }

    fn get_counter(&self) -> u64 {
        self.counter
    }

    fn get_completed_value(&self) -> u64 {
        *lock(&self.shared.completed)
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

    fn present(&mut self, device: &Device, _vsync: bool) -> Result<(), Error> {
        gfx::validate_present::<Device>(&self.backbuffers[self.bb_index as usize])?;
        device.enqueue(QueueOp::Present)?;
        self.bb_index = (self.bb_index + 1) % self.backbuffers.len() as u32;
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

    fn reset(&mut self, fence: &Fence, pipeline: Option<&RenderPipeline>) -> Result<(), Error> {
        self.validator.reset::<Device>(fence, pipeline)?;
        self.commands.clear();
        self.render_target = None;
        Ok(())
    }

    fn close(&mut self) -> Result<(), Error> {
        self.validator.close()
    }

    fn transition_barrier(&mut self, barrier: &gfx::TransitionBarrier<Device>) -> Result<(), Error> {
        self.validator.transition_barrier(barrier)?;
        self.commands.push(Command::Barrier);
        Ok(())
    }

    fn copy_buffer_region(
        &mut self,
        dst_buffer: &Buffer,
        dst_offset: usize,
        src_buffer: &Buffer,
        src_offset: usize,
        num_bytes: usize,
    ) -> Result<(), Error> {
        self.validator
            .copy_buffer_region::<Device>(dst_buffer, dst_offset, src_buffer, src_offset, num_bytes)?;
        self.commands.push(Command::Copy {
            dst: dst_buffer.memory.clone(),
            dst_offset,
            src: src_buffer.memory.clone(),
            src_offset,
            num_bytes,
        });
        Ok(())
    }

    fn clear_render_target(&mut self, target: &Texture, colour: gfx::ClearColour) -> Result<(), Error> {
        self.validator.clear_render_target::<Device>(target)?;
        self.commands.push(Command::ClearColour {
            target: target.contents.clone(),
            colour: colour.to_array(),
        });
        Ok(())
    }

    fn clear_depth_stencil(&mut self, target: &Texture, depth: f32, stencil: u8) -> Result<(), Error> {
        self.validator.clear_depth_stencil::<Device>(target)?;
        self.commands.push(Command::ClearDepth {
            target: target.contents.clone(),
            depth,
            stencil,
        });
        Ok(())
    }

    fn set_render_targets(&mut self, target: &Texture, depth_stencil: Option<&Texture>) -> Result<(), Error> {
        self.validator.set_render_targets::<Device>(target, depth_stencil)?;
        self.render_target = Some(target.contents.clone());
        Ok(())
    }

    fn set_viewport(&mut self, _viewport: &gfx::Viewport) -> Result<(), Error> {
        self.validator.set_viewport()
    }

    fn set_scissor_rect(&mut self, _scissor_rect: &gfx::ScissorRect) -> Result<(), Error> {
        self.validator.set_scissor_rect()
    }

    fn set_heaps(&mut self, heaps: &[&Heap]) -> Result<(), Error> {
        self.validator.set_heaps::<Device>(heaps)
    }

    fn set_root_signature(&mut self, root_signature: &RootSignature) -> Result<(), Error> {
        self.validator.set_root_signature::<Device>(root_signature)
    }

    fn set_render_pipeline(&mut self, pipeline: &RenderPipeline) -> Result<(), Error> {
        self.validator.set_render_pipeline::<Device>(pipeline)
    }

    fn set_descriptor_table(&mut self, slot: u32, heap: &Heap, index: usize) -> Result<(), Error> {
        self.validator.set_descriptor_table::<Device>(slot, heap, index)
    }

    fn push_constants<T: Sized>(&mut self, slot: u32, data: &[T]) -> Result<(), Error> {
        self.validator.push_constants(slot, std::mem::size_of_val(data) / 4)
    }

    fn set_vertex_buffer(&mut self, buffer: &Buffer, slot: u32) -> Result<(), Error> {
        self.validator.set_vertex_buffer::<Device>(buffer, slot)
    }

    fn set_index_buffer(&mut self, buffer: &Buffer) -> Result<(), Error> {
        self.validator.set_index_buffer::<Device>(buffer)
    }

    fn set_topology(&mut self, topology: gfx::Topology) -> Result<(), Error> {
        self.validator.set_topology(topology)
    }

    fn draw_instanced(
        &mut self,
        vertex_count: u32,
        instance_count: u32,
        start_vertex: u32,
        _start_instance: u32,
    ) -> Result<(), Error> {
        self.validator.draw_instanced(vertex_count, instance_count, start_vertex)?;
        self.push_draw(vertex_count as u64 * instance_count as u64)
    }

    fn draw_indexed_instanced(
        &mut self,
        index_count: u32,
        instance_count: u32,
        start_index: u32,
        _base_vertex: i32,
        _start_instance: u32,
    ) -> Result<(), Error> {
        self.validator.draw_indexed_instanced(index_count, instance_count, start_index)?;
        self.push_draw(index_count as u64 * instance_count as u64)
    }
}

impl CmdBuf {
    /// Number of commands recorded since the last reset
    pub fn get_num_commands(&self) -> usize {
        self.validator.get_num_commands()
    }

    fn push_draw(&mut self, vertices: u64) -> Result<(), Error> {
        let target = self
            .render_target
            .clone()
            .ok_or_else(|| Error::new(ErrorKind::Validation, "gfx::null: draw without a render target"))?;
        self.commands.push(Command::Draw { target, vertices });
        Ok(())
    }
}

impl gfx::Buffer<Device> for Buffer {
    fn write<T: Sized>(&mut self, offset: usize, data: &[T]) -> Result<(), Error> {
        if self.heap != gfx::HeapType::Upload {
            return Err(Error::new(
                ErrorKind::Validation,
                format!("gfx::null: {:?} heap buffers are not cpu writable", self.heap),
            ));
        }
        let bytes = gfx::slice_as_u8_slice(data);
        if offset + bytes.len() > self.size {
            return Err(Error::new(
                ErrorKind::Validation,
                format!("gfx::null: write of {} bytes at {} overflows a {} byte buffer", bytes.len(), offset, self.size),
            ));
        }
        lock(&self.memory)[offset..offset + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    fn read(&self) -> Result<Vec<u8>, Error> {
        if self.heap == gfx::HeapType::Device {
            return Err(Error::new(ErrorKind::Validation, "gfx::null: device heap buffers are not cpu readable"));
        }
        Ok(lock(&self.memory).clone())
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

impl Texture {
    /// Contents as last written by the queue, stable once a fence wait has covered the writing submission
    pub fn get_contents(&self) -> TextureContents {
        *lock(&self.contents)
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
