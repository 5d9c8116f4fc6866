use gpu_harness::prelude::*;

fn main() -> Result<(), gpu_harness::Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // harness [config.json] [demo]
    let args: Vec<String> = std::env::args().collect();
    let config_path = args.get(1).map(|s| s.as_str()).unwrap_or("harness.json");
    let mut config = EngineConfig::load(config_path)?;
    if let Some(demo) = args.get(2) {
        config.demo = demo.clone();
    }

    let demo = config.demo.clone();
    let frames = config.frames;

    let mut engine = Engine::<gfx_platform::Device, os_platform::App>::create_from_config(config)?;
    let result = demos::run(&mut engine, &demo, frames);
    if let Err(e) = &result {
        log::error!("harness: {} stopped after {} frames: {}", demo, engine.get_frame_index(), e);
    }
    result.map(|_| ())
}
