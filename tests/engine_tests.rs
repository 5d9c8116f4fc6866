use gpu_harness::*;

use gfx::null;
use gfx::Buffer;
use gfx::SwapChain;

use os::Window;

use engine::Engine;
use config::EngineConfig;

type NullEngine = Engine<null::Device, os::null::App>;

fn test_config(demo: &str) -> EngineConfig {
    EngineConfig {
        name: String::from("engine tests"),
        window_rect: os::Rect {
            x: 0,
            y: 0,
            width: 640,
            height: 480,
        },
        vsync: false,
        demo: String::from(demo),
        frames: Some(4),
        ..Default::default()
    }
}

fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!("gpu_harness_{}_{}.json", name, std::process::id()))
}

#[test]
fn create_engine() -> Result<(), Error> {
    let engine = NullEngine::create_from_config(test_config("triangle"))?;
    assert_eq!(engine.swap_chain.get_size(), (640, 480));
    assert_eq!(engine.swap_chain.get_num_buffers(), gfx::DEFAULT_NUM_BUFFERS);
    assert!(engine.swap_chain.get_depth_stencil_texture().is_some());
    assert_eq!(engine.get_frame_index(), 0);
    Ok(())
}

#[test]
fn run_triangle_demo() -> Result<(), Error> {
    let mut engine = NullEngine::create_from_config(test_config("triangle"))?;
    let frames = demos::run(&mut engine, "triangle", Some(3))?;
    assert_eq!(frames, 3);
    assert_eq!(engine.get_rendered_frames(), 3);

    let stats = engine.device.get_stats();
    assert_eq!(stats.draws, 3);
    assert_eq!(stats.vertices, 9);
    assert_eq!(stats.presents, 3);

    // frames used buffers 0, 1, 0 so the current buffer holds the second frame
    assert_eq!(engine.swap_chain.get_backbuffer_index(), 1);
    let contents = engine.swap_chain.get_backbuffer_texture().get_contents();
    assert_eq!(contents.draws, 1);
    assert_eq!(contents.clear_colour, engine.main_window.get_background_colour());
    assert_eq!(engine.upload.get_num_staging(), 0);
    Ok(())
}

#[test]
fn run_cube_demo() -> Result<(), Error> {
    let mut engine = NullEngine::create_from_config(test_config("cube"))?;
    let frames = demos::run(&mut engine, "cube", Some(5))?;
    assert_eq!(frames, 5);

    let stats = engine.device.get_stats();
    assert_eq!(stats.draws, 5);
    assert_eq!(stats.vertices, 5 * demos::cube::INDICES.len() as u64);
    Ok(())
}

#[test]
fn cube_without_depth_target() -> Result<(), Error> {
    let mut engine = NullEngine::create_from_config(EngineConfig {
        depth_format: None,
        ..test_config("cube")
    })?;
    assert!(engine.swap_chain.get_depth_stencil_texture().is_none());
    let frames = demos::run(&mut engine, "cube", Some(2))?;
    assert_eq!(frames, 2);
    Ok(())
}

#[test]
fn run_curve_demo_renders_on_demand() -> Result<(), Error> {
    let mut engine = NullEngine::create_from_config(test_config("curve"))?;
    let mut curve = demos::curve::Curve::<null::Device>::default();
    assert_eq!(curve.get_num_points(), 2);

    let frames = engine.run(&mut curve, Some(8))?;
    assert_eq!(frames, 8);

    // the first frame plus one per appended point
    assert_eq!(curve.get_num_points(), 4);
    assert_eq!(engine.get_rendered_frames(), 3);

    let stats = engine.device.get_stats();
    assert_eq!(stats.presents, 3);
    assert_eq!(stats.vertices, 2 + 3 + 4);
    Ok(())
}

#[test]
fn unknown_demo_is_a_config_error() -> Result<(), Error> {
    let mut engine = NullEngine::create_from_config(test_config("missing"))?;
    let err = demos::run(&mut engine, "missing", Some(1)).expect_err("no such demo");
    assert_eq!(err.kind, ErrorKind::Config);
    Ok(())
}

#[test]
fn closed_window_stops_the_loop() -> Result<(), Error> {
    let mut engine = NullEngine::create_from_config(test_config("triangle"))?;
    engine.main_window.close();
    let frames = demos::run(&mut engine, "triangle", Some(10))?;
    assert_eq!(frames, 0);
    assert_eq!(engine.get_rendered_frames(), 0);
    Ok(())
}

#[test]
fn upload_buffer_waits_for_the_copy() -> Result<(), Error> {
    let mut engine = NullEngine::create_from_config(test_config("triangle"))?;
    engine.device.set_queue_latency(std::time::Duration::from_millis(50));

    let vertices = demos::triangle::VERTICES;
    let vb = engine.upload_buffer(&demos::vertex_buffer_info(vertices.len()), &vertices)?;
    assert_eq!(vb.get_state(), gfx::ResourceState::VertexConstantBuffer);
    assert_eq!(engine.upload.get_num_staging(), 0);
    assert_eq!(engine.upload.get_bytes_uploaded(), std::mem::size_of_val(&vertices));
    assert_eq!(engine.device.get_stats().bytes_copied, std::mem::size_of_val(&vertices) as u64);
    Ok(())
}

#[test]
fn upload_buffer_inside_a_frame_is_illegal() -> Result<(), Error> {
    let mut engine = NullEngine::create_from_config(test_config("triangle"))?;
    let vertices = demos::triangle::VERTICES;

    engine.begin_frame()?;
    let err = engine
        .upload_buffer(&demos::vertex_buffer_info(vertices.len()), &vertices)
        .err()
        .expect("upload while recording");
    assert_eq!(err.kind, ErrorKind::IllegalState);
    engine.end_frame()?;
    assert_eq!(engine.device.get_stats().presents, 1);
    Ok(())
}

#[test]
fn wait_idle_keeps_staging_for_unsubmitted_copies() -> Result<(), Error> {
    let mut engine = NullEngine::create_from_config(test_config("triangle"))?;
    let vertices = demos::triangle::VERTICES;

    engine.begin_frame()?;
    let _vb = engine.upload.upload(
        &mut engine.device,
        &mut engine.cmd_buf,
        &demos::vertex_buffer_info(vertices.len()),
        &vertices,
    )?;
    engine.wait_idle()?;
    assert_eq!(engine.upload.get_num_staging(), 1);

    engine.end_frame()?;
    assert_eq!(engine.upload.get_num_staging(), 0);
    assert_eq!(engine.device.get_stats().copies, 1);
    Ok(())
}

#[test]
fn failed_upload_leaves_engine_usable() -> Result<(), Error> {
    let mut engine = NullEngine::create_from_config(test_config("triangle"))?;
    let empty: [demos::Vertex; 0] = [];
    let err = engine
        .upload_buffer(&demos::vertex_buffer_info(3), &empty)
        .err()
        .expect("zero byte upload");
    assert_eq!(err.kind, ErrorKind::Validation);

    let frames = demos::run(&mut engine, "triangle", Some(2))?;
    assert_eq!(frames, 2);
    Ok(())
}

#[test]
fn frame_loop_waits_for_slow_queue() -> Result<(), Error> {
    let mut engine = NullEngine::create_from_config(test_config("triangle"))?;
    engine.device.set_queue_latency(std::time::Duration::from_millis(20));
    demos::run(&mut engine, "triangle", Some(3))?;
    assert_eq!(engine.device.get_stats().draws, 3);
    assert_eq!(engine.device.get_num_pending_submissions(), 0);
    Ok(())
}

#[test]
fn error_kinds_classify_fatal_errors() {
    assert!(Error::new(ErrorKind::DeviceLost, "removed").is_fatal());
    assert!(Error::new(ErrorKind::FenceTimeout, "timeout").is_fatal());
    assert!(!Error::new(ErrorKind::Validation, "state").is_fatal());
    let err = Error::new(ErrorKind::SwapChain, "zero area");
    assert_eq!(err.to_string(), "swap chain: zero area");
}

#[test]
fn config_round_trip() -> Result<(), Error> {
    let path = temp_path("round_trip");
    let config = EngineConfig {
        adapter_name: Some(String::from("Null Software Adapter")),
        clear_colour: Some(gfx::ClearColour::from([0.1, 0.2, 0.3, 1.0])),
        fence_timeout_ms: None,
        ..test_config("curve")
    };
    config.save(&path)?;
    let loaded = EngineConfig::load(&path)?;
    let _ = std::fs::remove_file(&path);
    assert_eq!(loaded, config);
    Ok(())
}

#[test]
fn config_defaults() -> Result<(), Error> {
    let missing = EngineConfig::load(temp_path("does_not_exist"))?;
    assert_eq!(missing, EngineConfig::default());

    let path = temp_path("partial");
    std::fs::write(&path, "{ \"demo\": \"cube\", \"num_buffers\": 3 }")?;
    let partial = EngineConfig::load(&path)?;
    let _ = std::fs::remove_file(&path);
    assert_eq!(partial.demo, "cube");
    assert_eq!(partial.num_buffers, 3);
    assert_eq!(partial.depth_format, Some(gfx::Format::D32f));
    assert_eq!(partial.get_fence_timeout(), Some(std::time::Duration::from_millis(10000)));
    Ok(())
}

#[test]
fn invalid_config_is_rejected() -> Result<(), Error> {
    let path = temp_path("invalid");
    std::fs::write(&path, "{ \"num_buffers\": \"two\" }")?;
    let result = EngineConfig::load(&path);
    let _ = std::fs::remove_file(&path);
    assert_eq!(result.expect_err("num_buffers must be a number").kind, ErrorKind::Config);
    Ok(())
}
