use gpu_harness::*;

use gfx::null;
use gfx::Buffer;
use gfx::CmdBuf;
use gfx::Device;
use gfx::Fence;
use gfx::Heap;
use gfx::SwapChain;
use gfx::Texture;

use os::App;
use os::Window;

use demos::Vertex;
use upload::UploadPipeline;

use std::time::{Duration, Instant};

fn create_device() -> Result<null::Device, Error> {
    null::Device::create(&gfx::DeviceInfo::default())
}

fn create_window(width: i32, height: i32) -> Result<(os::null::App, os::null::Window), Error> {
    let mut app = os::null::App::create(os::AppInfo {
        name: String::from("tests"),
    })?;
    let window = app.create_window(os::WindowInfo {
        title: String::from("tests"),
        rect: os::Rect {
            x: 0,
            y: 0,
            width,
            height,
        },
        ..Default::default()
    })?;
    Ok((app, window))
}

fn swap_chain_info(num_buffers: u32, depth_format: Option<gfx::Format>) -> gfx::SwapChainInfo {
    gfx::SwapChainInfo {
        num_buffers,
        format: gfx::Format::RGBA8n,
        depth_format,
        clear_colour: None,
    }
}

fn vertex_buffer_info(num_bytes: usize) -> gfx::BufferInfo {
    gfx::BufferInfo {
        heap: gfx::HeapType::Device,
        usage: gfx::BufferUsage::VERTEX,
        size_bytes: num_bytes,
        stride: std::mem::size_of::<Vertex>(),
        format: gfx::Format::Unknown,
    }
}

fn empty_root_signature(device: &null::Device) -> Result<null::RootSignature, Error> {
    binding::build_root_signature(
        device,
        &gfx::RootSignatureInfo {
            parameters: Vec::new(),
            allow_input_layout: true,
        },
    )
}

fn colour_pipeline(
    device: &null::Device,
    root_signature: &null::RootSignature,
    topology: gfx::TopologyType,
    vertex_stride: usize,
) -> Result<null::RenderPipeline, Error> {
    let (vs, ps) = demos::create_shaders(device, include_str!("../shaders/colour.hlsl"))?;
    binding::build_pipeline_state(
        device,
        &gfx::RenderPipelineInfo {
            vs: &vs,
            ps: &ps,
            input_layout: demos::get_vertex_input_layout(),
            vertex_stride,
            root_signature,
            raster_info: gfx::RasterInfo::default(),
            blend_info: gfx::BlendInfo::default(),
            depth_stencil_info: gfx::DepthStencilInfo::default(),
            topology,
            render_target_format: gfx::Format::RGBA8n,
            depth_format: None,
        },
    )
}

// submits whatever is recorded in cmd and blocks until the queue has executed it
fn submit_and_wait(device: &mut null::Device, cmd: &mut null::CmdBuf, fence: &mut null::Fence) -> Result<u64, Error> {
    cmd.close_and_submit(device)?;
    let value = fence.advance_and_signal(device)?;
    fence.wait_until(value, Some(Duration::from_secs(10)))?;
    Ok(value)
}

#[test]
fn create_null_device() -> Result<(), Error> {
    let device = create_device()?;
    let adapter_info = device.get_adapter_info();
    assert_eq!(adapter_info.name, null::HARDWARE_ADAPTER_NAME);
    assert!(!adapter_info.software);
    assert_eq!(adapter_info.available.len(), 2);
    assert!(adapter_info.feature_level >= gfx::FeatureLevel::Level11_0);
    assert!(device.get_feature_flags().contains(gfx::DeviceFeatureFlags::ROOT_SIGNATURE_1_1));
    println!("{}", adapter_info);
    Ok(())
}

#[test]
fn software_adapter_fallback() -> Result<(), Error> {
    let device = null::Device::create(&gfx::DeviceInfo {
        adapter_name: Some(String::from("Missing Adapter")),
        allow_software_fallback: true,
        ..Default::default()
    })?;
    assert_eq!(device.get_adapter_info().name, null::SOFTWARE_ADAPTER_NAME);
    assert!(device.get_adapter_info().software);
    assert!(device.get_feature_flags().contains(gfx::DeviceFeatureFlags::SOFTWARE_ADAPTER));
    Ok(())
}

#[test]
fn missing_adapter_without_fallback_fails() {
    let result = null::Device::create(&gfx::DeviceInfo {
        adapter_name: Some(String::from("Missing Adapter")),
        allow_software_fallback: false,
        ..Default::default()
    });
    match result {
        Err(e) => {
            assert_eq!(e.kind, ErrorKind::DeviceCreation);
            assert!(e.is_fatal());
        }
        Ok(_) => panic!("device creation on a missing adapter must fail without software fallback"),
    }
}

#[test]
fn fence_values_increase_monotonically() -> Result<(), Error> {
    let mut device = create_device()?;
    let mut fence = device.create_fence()?;
    let mut cmd = device.create_cmd_buf()?;
    assert_eq!(fence.get_counter(), 0);

    let mut last = 0;
    for _ in 0..8 {
        cmd.reset(&fence, None)?;
        let value = submit_and_wait(&mut device, &mut cmd, &mut fence)?;
        assert!(value > last);
        assert!(fence.get_completed_value() >= value);
        assert!(fence.is_complete(value));
        last = value;
    }
    assert_eq!(fence.get_counter(), last);
    assert_eq!(device.get_stats().signals, 8);
    Ok(())
}

#[test]
fn fence_wait_blocks_until_queue_completes() -> Result<(), Error> {
    let mut device = create_device()?;
    let mut fence = device.create_fence()?;
    let mut cmd = device.create_cmd_buf()?;
    let latency = Duration::from_millis(100);
    device.set_queue_latency(latency);

    let start = Instant::now();
    cmd.reset(&fence, None)?;
    cmd.close_and_submit(&mut device)?;
    let value = fence.advance_and_signal(&mut device)?;
    fence.wait_until(value, None)?;

    assert!(start.elapsed() >= latency);
    assert!(fence.get_completed_value() >= value);
    Ok(())
}

#[test]
fn fence_wait_times_out() -> Result<(), Error> {
    let mut device = create_device()?;
    let mut fence = device.create_fence()?;
    let mut cmd = device.create_cmd_buf()?;
    device.set_queue_latency(Duration::from_millis(500));

    cmd.reset(&fence, None)?;
    cmd.close_and_submit(&mut device)?;
    let value = fence.advance_and_signal(&mut device)?;

    let err = fence
        .wait_until(value, Some(Duration::from_millis(10)))
        .expect_err("wait must time out while the queue is busy");
    assert_eq!(err.kind, ErrorKind::FenceTimeout);

    // the work still completes
    fence.wait_until(value, None)?;
    Ok(())
}

#[test]
fn wait_on_unsignalled_value_is_rejected() -> Result<(), Error> {
    let mut device = create_device()?;
    let fence = device.create_fence()?;
    let err = fence.wait_until(1, None).expect_err("value 1 was never signalled");
    assert_eq!(err.kind, ErrorKind::Validation);
    Ok(())
}

#[test]
fn double_reset_is_illegal() -> Result<(), Error> {
    let mut device = create_device()?;
    let fence = device.create_fence()?;
    let mut cmd = device.create_cmd_buf()?;
    assert_eq!(cmd.get_state(), gfx::CmdBufState::Closed);

    cmd.reset(&fence, None)?;
    assert_eq!(cmd.get_state(), gfx::CmdBufState::Recording);
    let err = cmd.reset(&fence, None).expect_err("second reset must be rejected");
    assert_eq!(err.kind, ErrorKind::IllegalState);
    Ok(())
}

#[test]
fn reset_before_fence_completion_is_illegal() -> Result<(), Error> {
    let mut device = create_device()?;
    let mut fence = device.create_fence()?;
    let mut cmd = device.create_cmd_buf()?;
    device.set_queue_latency(Duration::from_millis(300));

    cmd.reset(&fence, None)?;
    cmd.close_and_submit(&mut device)?;
    assert_eq!(cmd.get_state(), gfx::CmdBufState::Executing);
    assert_eq!(device.get_num_pending_submissions(), 1);

    // no signal behind the submission yet
    let err = cmd.reset(&fence, None).expect_err("reset without a signal");
    assert_eq!(err.kind, ErrorKind::IllegalState);

    // signalled but not yet completed
    let value = fence.advance_and_signal(&mut device)?;
    assert_eq!(device.get_num_pending_submissions(), 0);
    let err = cmd.reset(&fence, None).expect_err("reset while executing");
    assert_eq!(err.kind, ErrorKind::IllegalState);

    fence.wait_until(value, None)?;
    cmd.reset(&fence, None)?;
    Ok(())
}

#[test]
fn reset_is_gated_on_the_fence_which_retired_the_submission() -> Result<(), Error> {
    let mut device = create_device()?;
    let mut frame_fence = device.create_fence()?;
    let mut other_fence = device.create_fence()?;
    let mut cmd = device.create_cmd_buf()?;

    // advance the frame fence past the value the other fence will signal
    for _ in 0..3 {
        frame_fence.advance_and_signal(&mut device)?;
    }
    frame_fence.wait_until(frame_fence.get_counter(), None)?;

    cmd.reset(&frame_fence, None)?;
    cmd.close_and_submit(&mut device)?;
    let value = other_fence.advance_and_signal(&mut device)?;
    other_fence.wait_until(value, None)?;

    let marker = cmd.get_submission_marker();
    assert_eq!(marker.get_retire_value(), Some(value));
    assert_eq!(marker.get_fence_id(), Some(other_fence.get_id()));
    assert!(!marker.is_complete::<null::Device>(&frame_fence));

    let err = cmd.reset(&frame_fence, None).expect_err("retired by the other fence");
    assert_eq!(err.kind, ErrorKind::IllegalState);
    cmd.reset(&other_fence, None)?;
    Ok(())
}

#[test]
fn recording_while_closed_is_illegal() -> Result<(), Error> {
    let mut device = create_device()?;
    let mut cmd = device.create_cmd_buf()?;
    let err = cmd.set_topology(gfx::Topology::TriangleList).expect_err("cmd is closed");
    assert_eq!(err.kind, ErrorKind::IllegalState);
    let err = cmd.close().expect_err("cmd is already closed");
    assert_eq!(err.kind, ErrorKind::IllegalState);
    Ok(())
}

#[test]
fn upload_round_trip() -> Result<(), Error> {
    let mut device = create_device()?;
    let mut fence = device.create_fence()?;
    let mut cmd = device.create_cmd_buf()?;
    let mut upload = UploadPipeline::<null::Device>::new();

    let data: Vec<u8> = (0..1000).map(|i| (i * 7 % 251) as u8).collect();
    let info = gfx::BufferInfo {
        heap: gfx::HeapType::Device,
        usage: gfx::BufferUsage::NONE,
        size_bytes: data.len(),
        stride: 0,
        format: gfx::Format::Unknown,
    };

    cmd.reset(&fence, None)?;
    let device_buffer = upload.upload(&mut device, &mut cmd, &info, &data)?;
    assert_eq!(device_buffer.get_state(), gfx::ResourceState::GenericRead);
    assert_eq!(upload.get_num_staging(), 1);

    let readback = device.create_buffer(&gfx::BufferInfo {
        heap: gfx::HeapType::Readback,
        ..info
    })?;
    cmd.transition_barrier(&gfx::TransitionBarrier::<null::Device>::buffer(
        &device_buffer,
        gfx::ResourceState::GenericRead,
        gfx::ResourceState::CopySrc,
    ))?;
    cmd.copy_buffer_region(&readback, 0, &device_buffer, 0, data.len())?;

    cmd.close_and_submit(&mut device)?;
    let value = fence.advance_and_signal(&mut device)?;
    fence.wait_until(value, None)?;

    assert_eq!(upload.release_completed(&fence), 1);
    assert_eq!(upload.get_num_staging(), 0);
    assert_eq!(upload.get_bytes_uploaded(), data.len());
    assert_eq!(&readback.read()?[..data.len()], &data[..]);

    let stats = device.get_stats();
    assert_eq!(stats.copies, 2);
    assert_eq!(stats.bytes_copied, 2 * data.len() as u64);
    Ok(())
}

#[test]
fn staging_buffers_are_held_until_the_fence_completes() -> Result<(), Error> {
    let mut device = create_device()?;
    let mut fence = device.create_fence()?;
    let mut cmd = device.create_cmd_buf()?;
    let mut upload = UploadPipeline::<null::Device>::new();
    device.set_queue_latency(Duration::from_millis(200));

    cmd.reset(&fence, None)?;
    let _vb = upload.upload(&mut device, &mut cmd, &vertex_buffer_info(84), &demos::triangle::VERTICES)?;
    cmd.close_and_submit(&mut device)?;

    // no signal behind the submission yet, nothing can be released
    assert_eq!(upload.release_completed(&fence), 0);

    let value = fence.advance_and_signal(&mut device)?;
    assert_eq!(upload.release_completed(&fence), 0);
    assert_eq!(upload.get_num_staging(), 1);

    fence.wait_until(value, None)?;
    assert_eq!(upload.release_completed(&fence), 1);
    Ok(())
}

#[test]
fn staging_is_held_until_its_recording_is_submitted() -> Result<(), Error> {
    let mut device = create_device()?;
    let mut fence = device.create_fence()?;
    let mut cmd = device.create_cmd_buf()?;
    let mut upload = UploadPipeline::<null::Device>::new();

    cmd.reset(&fence, None)?;
    let _vb = upload.upload(&mut device, &mut cmd, &vertex_buffer_info(84), &demos::triangle::VERTICES)?;

    // a signal enqueued before the copy is executed does not cover it
    let value = fence.advance_and_signal(&mut device)?;
    fence.wait_until(value, None)?;
    assert_eq!(upload.release_completed(&fence), 0);
    assert_eq!(upload.get_num_staging(), 1);

    submit_and_wait(&mut device, &mut cmd, &mut fence)?;
    assert_eq!(upload.release_completed(&fence), 1);
    assert_eq!(device.get_stats().copies, 1);
    Ok(())
}

#[test]
fn abandoned_recording_releases_staging_and_restores_states() -> Result<(), Error> {
    let mut device = create_device()?;
    let fence = device.create_fence()?;
    let mut cmd = device.create_cmd_buf()?;
    let mut upload = UploadPipeline::<null::Device>::new();

    cmd.reset(&fence, None)?;
    let vb = upload.upload(&mut device, &mut cmd, &vertex_buffer_info(84), &demos::triangle::VERTICES)?;
    assert_eq!(vb.get_state(), gfx::ResourceState::VertexConstantBuffer);
    cmd.close()?;
    assert_eq!(upload.release_completed(&fence), 0);

    // reset without executing, the barriers never ran
    cmd.reset(&fence, None)?;
    assert_eq!(vb.get_state(), gfx::ResourceState::Common);
    assert_eq!(upload.release_completed(&fence), 1);

    // the buffer can be uploaded into again
    let mut staging = upload::allocate(
        &mut device,
        &gfx::BufferInfo {
            heap: gfx::HeapType::Upload,
            usage: gfx::BufferUsage::NONE,
            size_bytes: 84,
            stride: 0,
            format: gfx::Format::Unknown,
        },
    )?;
    upload::stage::<null::Device, Vertex>(&mut staging, &demos::triangle::VERTICES)?;
    upload::copy_to_device::<null::Device>(&mut cmd, &staging, &vb, 84)?;
    assert_eq!(vb.get_state(), gfx::ResourceState::VertexConstantBuffer);
    Ok(())
}

#[test]
fn oversized_copy_leaves_buffer_in_common() -> Result<(), Error> {
    let mut device = create_device()?;
    let fence = device.create_fence()?;
    let mut cmd = device.create_cmd_buf()?;

    let staging = upload::allocate(
        &mut device,
        &gfx::BufferInfo {
            heap: gfx::HeapType::Upload,
            usage: gfx::BufferUsage::NONE,
            size_bytes: 168,
            stride: 0,
            format: gfx::Format::Unknown,
        },
    )?;
    let vb = upload::allocate(&mut device, &vertex_buffer_info(84))?;

    cmd.reset(&fence, None)?;
    let err = upload::copy_to_device::<null::Device>(&mut cmd, &staging, &vb, 168).expect_err("copy overflows");
    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(vb.get_state(), gfx::ResourceState::Common);

    upload::copy_to_device::<null::Device>(&mut cmd, &staging, &vb, 84)?;
    assert_eq!(vb.get_state(), gfx::ResourceState::VertexConstantBuffer);
    Ok(())
}

#[test]
fn zero_size_upload_is_rejected() -> Result<(), Error> {
    let mut device = create_device()?;
    let fence = device.create_fence()?;
    let mut cmd = device.create_cmd_buf()?;
    let mut upload = UploadPipeline::<null::Device>::new();

    cmd.reset(&fence, None)?;
    let empty: [Vertex; 0] = [];
    let err = upload
        .upload(&mut device, &mut cmd, &vertex_buffer_info(84), &empty)
        .err()
        .expect("zero byte upload");
    assert_eq!(err.kind, ErrorKind::Validation);

    let err = upload::allocate(&mut device, &vertex_buffer_info(0)).err().expect("zero byte allocation");
    assert_eq!(err.kind, ErrorKind::Validation);
    Ok(())
}

#[test]
fn stage_rejects_device_heap_buffers() -> Result<(), Error> {
    let mut device = create_device()?;
    let mut buffer = device.create_buffer(&vertex_buffer_info(84))?;
    let err = upload::stage::<null::Device, Vertex>(&mut buffer, &demos::triangle::VERTICES)
        .expect_err("device heap buffers are not cpu writable");
    assert_eq!(err.kind, ErrorKind::Validation);
    Ok(())
}

#[test]
fn copy_to_device_requires_common_state() -> Result<(), Error> {
    let mut device = create_device()?;
    let fence = device.create_fence()?;
    let mut cmd = device.create_cmd_buf()?;

    let mut staging = upload::allocate(
        &mut device,
        &gfx::BufferInfo {
            heap: gfx::HeapType::Upload,
            usage: gfx::BufferUsage::NONE,
            size_bytes: 84,
            stride: 0,
            format: gfx::Format::Unknown,
        },
    )?;
    upload::stage::<null::Device, Vertex>(&mut staging, &demos::triangle::VERTICES)?;
    let vb = upload::allocate(&mut device, &vertex_buffer_info(84))?;

    cmd.reset(&fence, None)?;
    upload::copy_to_device::<null::Device>(&mut cmd, &staging, &vb, 84)?;
    assert_eq!(vb.get_state(), gfx::ResourceState::VertexConstantBuffer);

    // the buffer has left Common, a second copy must be rejected
    let err = upload::copy_to_device::<null::Device>(&mut cmd, &staging, &vb, 84).expect_err("not in Common");
    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(vb.get_state(), gfx::ResourceState::VertexConstantBuffer);
    Ok(())
}

#[test]
fn copy_requires_copy_dst_destination() -> Result<(), Error> {
    let mut device = create_device()?;
    let fence = device.create_fence()?;
    let mut cmd = device.create_cmd_buf()?;

    let staging = upload::allocate(
        &mut device,
        &gfx::BufferInfo {
            heap: gfx::HeapType::Upload,
            usage: gfx::BufferUsage::NONE,
            size_bytes: 84,
            stride: 0,
            format: gfx::Format::Unknown,
        },
    )?;
    let vb = upload::allocate(&mut device, &vertex_buffer_info(84))?;

    cmd.reset(&fence, None)?;
    let err = cmd.copy_buffer_region(&vb, 0, &staging, 0, 84).expect_err("destination is in Common");
    assert_eq!(err.kind, ErrorKind::Validation);

    cmd.transition_barrier(&gfx::TransitionBarrier::<null::Device>::buffer(
        &vb,
        gfx::ResourceState::Common,
        gfx::ResourceState::CopyDst,
    ))?;
    let err = cmd.copy_buffer_region(&vb, 0, &staging, 0, 128).expect_err("out of bounds");
    assert_eq!(err.kind, ErrorKind::Validation);
    cmd.copy_buffer_region(&vb, 0, &staging, 0, 84)?;
    Ok(())
}

#[test]
fn barrier_with_wrong_before_state_is_rejected() -> Result<(), Error> {
    let mut device = create_device()?;
    let fence = device.create_fence()?;
    let mut cmd = device.create_cmd_buf()?;
    let vb = device.create_buffer(&vertex_buffer_info(84))?;

    cmd.reset(&fence, None)?;
    let err = cmd
        .transition_barrier(&gfx::TransitionBarrier::<null::Device>::buffer(
            &vb,
            gfx::ResourceState::CopyDst,
            gfx::ResourceState::VertexConstantBuffer,
        ))
        .expect_err("buffer is in Common");
    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(vb.get_state(), gfx::ResourceState::Common);
    Ok(())
}

#[test]
fn draw_from_buffer_in_copy_dst_is_rejected() -> Result<(), Error> {
    let mut device = create_device()?;
    let fence = device.create_fence()?;
    let mut cmd = device.create_cmd_buf()?;
    let (_app, window) = create_window(64, 64)?;
    let swap_chain = device.create_swap_chain::<os::null::App>(&swap_chain_info(2, None), &window)?;

    let root_signature = empty_root_signature(&device)?;
    let pipeline = colour_pipeline(&device, &root_signature, gfx::TopologyType::Triangle, 28)?;

    let mut staging = upload::allocate(
        &mut device,
        &gfx::BufferInfo {
            heap: gfx::HeapType::Upload,
            usage: gfx::BufferUsage::NONE,
            size_bytes: 84,
            stride: 0,
            format: gfx::Format::Unknown,
        },
    )?;
    upload::stage::<null::Device, Vertex>(&mut staging, &demos::triangle::VERTICES)?;
    let vb = upload::allocate(&mut device, &vertex_buffer_info(84))?;

    cmd.reset(&fence, None)?;
    let bb = swap_chain.get_backbuffer_texture();
    cmd.transition_barrier(&gfx::TransitionBarrier::<null::Device>::texture(
        bb,
        gfx::ResourceState::Present,
        gfx::ResourceState::RenderTarget,
    ))?;
    cmd.set_render_targets(bb, None)?;

    // copy without the transition back to a readable state
    cmd.transition_barrier(&gfx::TransitionBarrier::<null::Device>::buffer(
        &vb,
        gfx::ResourceState::Common,
        gfx::ResourceState::CopyDst,
    ))?;
    cmd.copy_buffer_region(&vb, 0, &staging, 0, 84)?;

    cmd.set_root_signature(&root_signature)?;
    cmd.set_render_pipeline(&pipeline)?;
    cmd.set_vertex_buffer(&vb, 0)?;
    cmd.set_topology(gfx::Topology::TriangleList)?;
    let err = cmd.draw_instanced(3, 1, 0, 0).expect_err("vertex buffer is in CopyDst");
    assert_eq!(err.kind, ErrorKind::Validation);

    cmd.transition_barrier(&gfx::TransitionBarrier::<null::Device>::buffer(
        &vb,
        gfx::ResourceState::CopyDst,
        gfx::ResourceState::VertexConstantBuffer,
    ))?;
    cmd.draw_instanced(3, 1, 0, 0)?;

    let err = cmd.draw_instanced(u32::MAX, 1, 2, 0).expect_err("vertex range overflows");
    assert_eq!(err.kind, ErrorKind::Validation);
    Ok(())
}

#[test]
fn triangle_round_trip() -> Result<(), Error> {
    let mut device = create_device()?;
    let mut fence = device.create_fence()?;
    let mut cmd = device.create_cmd_buf()?;
    let mut upload = UploadPipeline::<null::Device>::new();
    let (_app, window) = create_window(1280, 720)?;
    let mut swap_chain = device.create_swap_chain::<os::null::App>(&swap_chain_info(2, None), &window)?;

    assert_eq!(std::mem::size_of::<Vertex>(), 28);
    let vertices = demos::triangle::VERTICES;
    assert_eq!(vertices[0].position, [0.0, 0.5, 0.0]);
    assert_eq!(vertices[1].position, [0.5, -0.5, 0.0]);
    assert_eq!(vertices[2].position, [-0.5, -0.5, 0.0]);

    // upload
    cmd.reset(&fence, None)?;
    let vb = upload.upload(&mut device, &mut cmd, &vertex_buffer_info(84), &vertices)?;
    submit_and_wait(&mut device, &mut cmd, &mut fence)?;
    assert_eq!(upload.release_completed(&fence), 1);

    // bind
    let root_signature = empty_root_signature(&device)?;
    let pipeline = colour_pipeline(&device, &root_signature, gfx::TopologyType::Triangle, 28)?;
    let binding = binding::PipelineBinding::<null::Device>::new(
        None,
        root_signature,
        pipeline,
        gfx::Topology::TriangleList,
    )?;

    // draw
    cmd.reset(&fence, None)?;
    let bb = swap_chain.get_backbuffer_texture();
    cmd.transition_barrier(&gfx::TransitionBarrier::<null::Device>::texture(
        bb,
        gfx::ResourceState::Present,
        gfx::ResourceState::RenderTarget,
    ))?;
    cmd.clear_render_target(bb, swap_chain.get_clear_colour())?;
    cmd.set_render_targets(bb, None)?;
    let rect = os::Rect {
        x: 0,
        y: 0,
        width: bb.get_width() as i32,
        height: bb.get_height() as i32,
    };
    cmd.set_viewport(&gfx::Viewport::from(rect))?;
    cmd.set_scissor_rect(&gfx::ScissorRect::from(rect))?;
    binding.bind_for_draw(&mut cmd, &vb, None, &[])?;
    cmd.draw_instanced(3, 1, 0, 0)?;
    cmd.transition_barrier(&gfx::TransitionBarrier::<null::Device>::texture(
        bb,
        gfx::ResourceState::RenderTarget,
        gfx::ResourceState::Present,
    ))?;
    submit_and_wait(&mut device, &mut cmd, &mut fence)?;

    let contents = swap_chain.get_backbuffer_texture().get_contents();
    assert_eq!(contents.draws, 1);
    assert_eq!(contents.clear_colour, window.get_background_colour());

    // present
    swap_chain.present(&device, true)?;
    assert_eq!(swap_chain.get_backbuffer_index(), 1);

    let stats = device.get_stats();
    assert_eq!(stats.draws, 1);
    assert_eq!(stats.vertices, 3);
    Ok(())
}

#[test]
fn backbuffer_index_cycles() -> Result<(), Error> {
    let mut device = create_device()?;
    let (_app, window) = create_window(320, 240)?;
    for num_buffers in 2..=4 {
        let mut swap_chain =
            device.create_swap_chain::<os::null::App>(&swap_chain_info(num_buffers, None), &window)?;
        assert_eq!(swap_chain.get_num_buffers(), num_buffers);
        assert_eq!(swap_chain.get_size(), (320, 240));
        let start = swap_chain.get_backbuffer_index();
        for _ in 0..num_buffers {
            swap_chain.present(&device, false)?;
            assert!(swap_chain.get_backbuffer_index() < num_buffers);
        }
        assert_eq!(swap_chain.get_backbuffer_index(), start);
    }
    Ok(())
}

#[test]
fn present_requires_present_state() -> Result<(), Error> {
    let mut device = create_device()?;
    let fence = device.create_fence()?;
    let mut cmd = device.create_cmd_buf()?;
    let (_app, window) = create_window(64, 64)?;
    let mut swap_chain = device.create_swap_chain::<os::null::App>(&swap_chain_info(2, None), &window)?;

    cmd.reset(&fence, None)?;
    cmd.transition_barrier(&gfx::TransitionBarrier::<null::Device>::texture(
        swap_chain.get_backbuffer_texture(),
        gfx::ResourceState::Present,
        gfx::ResourceState::RenderTarget,
    ))?;
    let err = swap_chain.present(&device, false).expect_err("backbuffer is a render target");
    assert_eq!(err.kind, ErrorKind::Validation);
    assert_eq!(swap_chain.get_backbuffer_index(), 0);
    Ok(())
}

#[test]
fn zero_area_swap_chain_fails() -> Result<(), Error> {
    let mut device = create_device()?;

    let (_app, window) = create_window(0, 720)?;
    let err = device
        .create_swap_chain::<os::null::App>(&swap_chain_info(2, None), &window)
        .err()
        .expect("zero width surface");
    assert_eq!(err.kind, ErrorKind::SwapChain);

    let (_app, mut window) = create_window(1280, 720)?;
    window.set_client_size(1280, 0);
    let err = device
        .create_swap_chain::<os::null::App>(&swap_chain_info(2, None), &window)
        .err()
        .expect("zero height surface");
    assert_eq!(err.kind, ErrorKind::SwapChain);
    Ok(())
}

#[test]
fn swap_chain_info_is_validated() -> Result<(), Error> {
    let mut device = create_device()?;
    let (_app, window) = create_window(64, 64)?;

    let err = device
        .create_swap_chain::<os::null::App>(&swap_chain_info(1, None), &window)
        .err()
        .expect("single buffered swap chain");
    assert_eq!(err.kind, ErrorKind::SwapChain);

    let err = device
        .create_swap_chain::<os::null::App>(&swap_chain_info(2, Some(gfx::Format::RGBA8n)), &window)
        .err()
        .expect("colour depth format");
    assert_eq!(err.kind, ErrorKind::SwapChain);

    let swap_chain =
        device.create_swap_chain::<os::null::App>(&swap_chain_info(2, Some(gfx::Format::D32f)), &window)?;
    let ds = swap_chain.get_depth_stencil_texture().expect("depth target");
    assert_eq!(ds.get_format(), gfx::Format::D32f);
    assert_eq!(ds.get_state_tracker().get(), gfx::ResourceState::DepthStencil);
    Ok(())
}

#[test]
fn input_layout_must_fit_stride() -> Result<(), Error> {
    let layout = demos::get_vertex_input_layout();
    gfx::validate_input_layout(&layout, 28)?;

    let err = gfx::validate_input_layout(&layout, 24).expect_err("COLOR ends at 28");
    assert_eq!(err.kind, ErrorKind::PipelineState);

    let mut overlapping = layout.clone();
    overlapping[1].aligned_byte_offset = 8;
    let err = gfx::validate_input_layout(&overlapping, 28).expect_err("COLOR overlaps POSITION");
    assert_eq!(err.kind, ErrorKind::PipelineState);

    let device = create_device()?;
    let root_signature = empty_root_signature(&device)?;
    let err = colour_pipeline(&device, &root_signature, gfx::TopologyType::Triangle, 24)
        .err()
        .expect("pipeline with an inconsistent layout");
    assert_eq!(err.kind, ErrorKind::PipelineState);
    Ok(())
}

#[test]
fn pipeline_requires_matching_shader_types() -> Result<(), Error> {
    let device = create_device()?;
    let root_signature = empty_root_signature(&device)?;
    let (vs, ps) = demos::create_shaders(&device, include_str!("../shaders/colour.hlsl"))?;
    let err = binding::build_pipeline_state(
        &device,
        &gfx::RenderPipelineInfo {
            vs: &ps,
            ps: &vs,
            input_layout: demos::get_vertex_input_layout(),
            vertex_stride: 28,
            root_signature: &root_signature,
            raster_info: gfx::RasterInfo::default(),
            blend_info: gfx::BlendInfo::default(),
            depth_stencil_info: gfx::DepthStencilInfo::default(),
            topology: gfx::TopologyType::Triangle,
            render_target_format: gfx::Format::RGBA8n,
            depth_format: None,
        },
    )
    .err()
    .expect("swapped shader stages");
    assert_eq!(err.kind, ErrorKind::PipelineState);

    let err = device
        .create_shader(
            &gfx::ShaderInfo {
                shader_type: gfx::ShaderType::Vertex,
                compile_info: None,
            },
            &[],
        )
        .err()
        .expect("empty shader");
    assert_eq!(err.kind, ErrorKind::ShaderCompile);
    Ok(())
}

#[test]
fn root_signature_is_validated() -> Result<(), Error> {
    let device = create_device()?;

    let err = binding::build_root_signature(
        &device,
        &gfx::RootSignatureInfo {
            parameters: vec![gfx::RootParameter {
                kind: gfx::RootParameterKind::DescriptorTable(Vec::new()),
                visibility: gfx::ShaderVisibility::All,
            }],
            allow_input_layout: true,
        },
    )
    .err()
    .expect("table without ranges");
    assert_eq!(err.kind, ErrorKind::RootSignature);

    let err = binding::build_root_signature(
        &device,
        &gfx::RootSignatureInfo {
            parameters: vec![gfx::RootParameter {
                kind: gfx::RootParameterKind::Constants {
                    register: 0,
                    register_space: 0,
                    num_values: gfx::MAX_ROOT_SIGNATURE_DWORDS + 1,
                },
                visibility: gfx::ShaderVisibility::All,
            }],
            allow_input_layout: true,
        },
    )
    .err()
    .expect("root signature over the dword limit");
    assert_eq!(err.kind, ErrorKind::RootSignature);
    Ok(())
}

#[test]
fn pipeline_binding_rejects_mismatched_root_signature() -> Result<(), Error> {
    let device = create_device()?;
    let root_signature = empty_root_signature(&device)?;
    let other = empty_root_signature(&device)?;
    let pipeline = colour_pipeline(&device, &root_signature, gfx::TopologyType::Triangle, 28)?;

    let err = binding::PipelineBinding::<null::Device>::new(None, other, pipeline, gfx::Topology::TriangleList)
        .err()
        .expect("pipeline built from another root signature");
    assert_eq!(err.kind, ErrorKind::PipelineState);

    let pipeline = colour_pipeline(&device, &root_signature, gfx::TopologyType::Triangle, 28)?;
    let err = binding::PipelineBinding::<null::Device>::new(None, root_signature, pipeline, gfx::Topology::LineStrip)
        .err()
        .expect("line topology on a triangle pipeline");
    assert_eq!(err.kind, ErrorKind::PipelineState);
    Ok(())
}

#[test]
fn binding_pipeline_with_other_root_signature_is_rejected() -> Result<(), Error> {
    let mut device = create_device()?;
    let fence = device.create_fence()?;
    let mut cmd = device.create_cmd_buf()?;
    let root_signature = empty_root_signature(&device)?;
    let other = empty_root_signature(&device)?;
    let pipeline = colour_pipeline(&device, &root_signature, gfx::TopologyType::Triangle, 28)?;

    cmd.reset(&fence, None)?;
    cmd.set_root_signature(&other)?;
    let err = cmd.set_render_pipeline(&pipeline).expect_err("incompatible root signature");
    assert_eq!(err.kind, ErrorKind::Validation);
    Ok(())
}

#[test]
fn descriptor_tables_are_validated() -> Result<(), Error> {
    let mut device = create_device()?;
    let fence = device.create_fence()?;
    let mut cmd = device.create_cmd_buf()?;
    let (_app, window) = create_window(64, 64)?;
    let swap_chain = device.create_swap_chain::<os::null::App>(&swap_chain_info(2, None), &window)?;

    let root_signature = binding::build_root_signature(
        &device,
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
    let pipeline = colour_pipeline(&device, &root_signature, gfx::TopologyType::Triangle, 28)?;

    let cb = device.create_buffer(&gfx::BufferInfo {
        heap: gfx::HeapType::Upload,
        usage: gfx::BufferUsage::CONSTANT_BUFFER,
        size_bytes: 64,
        stride: 0,
        format: gfx::Format::Unknown,
    })?;
    assert_eq!(cb.get_size(), gfx::CONSTANT_BUFFER_ALIGNMENT);
    let mut heap = device.create_heap(&gfx::HeapInfo {
        heap_type: gfx::DescriptorHeapType::Shader,
        num_descriptors: 1,
    })?;
    let index = device.create_constant_buffer_view(&cb, &mut heap)?;
    assert_eq!(index, 0);
    assert_eq!(heap.get_num_allocated(), 1);
    let err = device.create_constant_buffer_view(&cb, &mut heap).expect_err("heap is full");
    assert_eq!(err.kind, ErrorKind::ResourceCreation);

    let mut staging = upload::allocate(
        &mut device,
        &gfx::BufferInfo {
            heap: gfx::HeapType::Upload,
            usage: gfx::BufferUsage::VERTEX,
            size_bytes: 84,
            stride: 28,
            format: gfx::Format::Unknown,
        },
    )?;
    upload::stage::<null::Device, Vertex>(&mut staging, &demos::triangle::VERTICES)?;

    cmd.reset(&fence, None)?;
    let bb = swap_chain.get_backbuffer_texture();
    cmd.transition_barrier(&gfx::TransitionBarrier::<null::Device>::texture(
        bb,
        gfx::ResourceState::Present,
        gfx::ResourceState::RenderTarget,
    ))?;
    cmd.set_render_targets(bb, None)?;
    cmd.set_root_signature(&root_signature)?;

    // heap not bound yet
    let err = cmd.set_descriptor_table(0, &heap, 0).expect_err("heap is not bound");
    assert_eq!(err.kind, ErrorKind::Validation);

    cmd.set_heaps(&[&heap])?;
    cmd.set_render_pipeline(&pipeline)?;
    cmd.set_vertex_buffer(&staging, 0)?;
    cmd.set_topology(gfx::Topology::TriangleList)?;

    // table left unbound
    let err = cmd.draw_instanced(3, 1, 0, 0).expect_err("descriptor table is unbound");
    assert_eq!(err.kind, ErrorKind::Validation);

    let err = cmd.set_descriptor_table(0, &heap, 1).expect_err("outside the heap");
    assert_eq!(err.kind, ErrorKind::Validation);
    let err = cmd.set_descriptor_table(1, &heap, 0).expect_err("no parameter in slot 1");
    assert_eq!(err.kind, ErrorKind::Validation);

    cmd.set_descriptor_table(0, &heap, index)?;
    cmd.draw_instanced(3, 1, 0, 0)?;
    Ok(())
}

#[test]
fn push_constants_are_validated() -> Result<(), Error> {
    let mut device = create_device()?;
    let fence = device.create_fence()?;
    let mut cmd = device.create_cmd_buf()?;
    let root_signature = binding::build_root_signature(
        &device,
        &gfx::RootSignatureInfo {
            parameters: vec![
                gfx::RootParameter {
                    kind: gfx::RootParameterKind::Constants {
                        register: 0,
                        register_space: 0,
                        num_values: 4,
                    },
                    visibility: gfx::ShaderVisibility::Vertex,
                },
                gfx::RootParameter {
                    kind: gfx::RootParameterKind::DescriptorTable(vec![gfx::DescriptorRange {
                        descriptor_type: gfx::DescriptorType::ConstantBuffer,
                        num_descriptors: 1,
                        base_register: 1,
                        register_space: 0,
                    }]),
                    visibility: gfx::ShaderVisibility::Vertex,
                },
            ],
            allow_input_layout: true,
        },
    )?;
    let colour = [1.0f32, 0.5, 0.25, 1.0];

    cmd.reset(&fence, None)?;
    let err = cmd.push_constants(0, &colour).expect_err("no root signature");
    assert_eq!(err.kind, ErrorKind::Validation);

    cmd.set_root_signature(&root_signature)?;
    cmd.push_constants(0, &colour)?;
    cmd.push_constants(0, &colour[..2])?;

    let err = cmd.push_constants(0, &[0.0f32; 5]).expect_err("more values than the slot holds");
    assert_eq!(err.kind, ErrorKind::Validation);
    let err = cmd.push_constants(1, &colour).expect_err("slot 1 is a descriptor table");
    assert_eq!(err.kind, ErrorKind::Validation);
    let err = cmd.push_constants(2, &colour).expect_err("slot 2 does not exist");
    assert_eq!(err.kind, ErrorKind::Validation);
    Ok(())
}

#[test]
fn draw_without_bindings_is_rejected() -> Result<(), Error> {
    let mut device = create_device()?;
    let fence = device.create_fence()?;
    let mut cmd = device.create_cmd_buf()?;

    cmd.reset(&fence, None)?;
    let err = cmd.draw_instanced(3, 1, 0, 0).expect_err("nothing is bound");
    assert_eq!(err.kind, ErrorKind::Validation);
    let err = cmd.draw_indexed_instanced(3, 1, 0, 0, 0).expect_err("nothing is bound");
    assert_eq!(err.kind, ErrorKind::Validation);
    Ok(())
}

#[test]
fn index_buffers_need_an_index_format() -> Result<(), Error> {
    let mut device = create_device()?;
    let err = device
        .create_buffer(&gfx::BufferInfo {
            heap: gfx::HeapType::Device,
            usage: gfx::BufferUsage::INDEX,
            size_bytes: 72,
            stride: 2,
            format: gfx::Format::Unknown,
        })
        .err()
        .expect("index buffer without a format");
    assert_eq!(err.kind, ErrorKind::ResourceCreation);
    Ok(())
}
