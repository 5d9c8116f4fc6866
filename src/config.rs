use crate::gfx;
use crate::os;
use crate::Error;

use serde::{Deserialize, Serialize};

use std::path::Path;

/// Serialisable engine settings, read from `harness.json` by the harness binary
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// App and window title
    pub name: String,
    // pos xy, size xy
    pub window_rect: os::Rect<i32>,
    /// Number of swap chain backbuffers, at least 2
    pub num_buffers: u32,
    pub vsync: bool,
    /// Adapter to create the device on, None for the first hardware adapter
    pub adapter_name: Option<String>,
    pub debug_layer: bool,
    pub allow_software_fallback: bool,
    /// Backbuffer clear colour, None uses the window background colour
    pub clear_colour: Option<gfx::ClearColour>,
    /// Creates a depth target with the swap chain when set
    pub depth_format: Option<gfx::Format>,
    /// Fence waits longer than this fail with a timeout, None waits forever
    pub fence_timeout_ms: Option<u64>,
    /// Name of the demo game to run
    pub demo: String,
    /// Stop after this many frames, None runs until the window closes
    pub frames: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            name: "gpu harness".to_string(),
            window_rect: os::Rect {
                x: 100,
                y: 100,
                width: 1280,
                height: 720,
            },
            num_buffers: gfx::DEFAULT_NUM_BUFFERS,
            vsync: true,
            adapter_name: None,
            debug_layer: cfg!(debug_assertions),
            allow_software_fallback: true,
            clear_colour: None,
            depth_format: Some(gfx::Format::D32f),
            fence_timeout_ms: Some(10000),
            demo: "triangle".to_string(),
            frames: None,
        }
    }
}

impl EngineConfig {
    /// Reads config from a json file at `path`, returns defaults if the file does not exist
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        if path.exists() {
            let data = std::fs::read(path)?;
            let config = serde_json::from_slice(&data)?;
            log::info!("config: loaded {}", path.display());
            Ok(config)
        } else {
            log::info!("config: {} not found, using defaults", path.display());
            Ok(EngineConfig::default())
        }
    }

    /// Writes config as pretty json to `path`
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    pub fn get_device_info(&self) -> gfx::DeviceInfo {
        gfx::DeviceInfo {
            adapter_name: self.adapter_name.clone(),
            debug_layer: self.debug_layer,
            allow_software_fallback: self.allow_software_fallback,
            render_target_heap_size: self.num_buffers as usize,
            ..Default::default()
        }
    }

    pub fn get_swap_chain_info(&self) -> gfx::SwapChainInfo {
        gfx::SwapChainInfo {
            num_buffers: self.num_buffers,
            format: gfx::Format::RGBA8n,
            depth_format: self.depth_format,
            clear_colour: self.clear_colour,
        }
    }

    pub fn get_window_info(&self) -> os::WindowInfo {
        os::WindowInfo {
            title: self.name.clone(),
            rect: self.window_rect,
            ..Default::default()
        }
    }

    pub fn get_fence_timeout(&self) -> Option<std::time::Duration> {
        self.fence_timeout_ms.map(std::time::Duration::from_millis)
    }
}
