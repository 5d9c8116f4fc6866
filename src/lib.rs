/// Operating system module, window and surface providers.
pub mod os;

/// Graphics module, explicit command list gpu api with d3d12 and null backends.
pub mod gfx;

/// Two heap resource transfer protocol (upload heap to device heap).
pub mod upload;

/// Root signature, descriptor heap and pipeline state bundles.
pub mod binding;

/// Engine context object which owns the core gpu resources and drives the frame loop.
pub mod engine;

/// Game trait implemented by interchangeable demo modules.
pub mod game;

/// Demo games.
pub mod demos;

/// Projection and transform matrix helpers.
pub mod camera;

/// Serialisable engine configuration.
pub mod config;

/// Use bitmask for flags
#[macro_use]
extern crate bitflags;

/// Categorises errors so callers can distinguish which stage failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Adapter selection or device creation failed
    DeviceCreation,
    /// Swap chain or its views could not be created
    SwapChain,
    /// Shader bytecode was empty or shader source failed to compile
    ShaderCompile,
    /// Root signature failed to serialise or create
    RootSignature,
    /// Pipeline state object failed to create, or its description is inconsistent
    PipelineState,
    /// Buffer, texture or descriptor heap creation failed
    ResourceCreation,
    /// A command violated resource state or binding rules
    Validation,
    /// A command buffer was used in a state that does not allow the operation
    IllegalState,
    /// The device was removed or the queue rejected work
    DeviceLost,
    /// A fence wait expired before the gpu reached the requested value
    FenceTimeout,
    /// Configuration could not be read or parsed
    Config,
    /// File system error
    Io,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::DeviceCreation => "device creation",
            ErrorKind::SwapChain => "swap chain",
            ErrorKind::ShaderCompile => "shader compile",
            ErrorKind::RootSignature => "root signature",
            ErrorKind::PipelineState => "pipeline state",
            ErrorKind::ResourceCreation => "resource creation",
            ErrorKind::Validation => "validation",
            ErrorKind::IllegalState => "illegal state",
            ErrorKind::DeviceLost => "device lost",
            ErrorKind::FenceTimeout => "fence timeout",
            ErrorKind::Config => "config",
            ErrorKind::Io => "io",
        };
        write!(f, "{}", name)
    }
}

/// Generic error with a kind identifying the failing stage and a message
#[derive(thiserror::Error, Debug)]
#[error("{kind}: {msg}")]
pub struct Error {
    pub kind: ErrorKind,
    pub msg: String,
}

impl Error {
    pub fn new(kind: ErrorKind, msg: impl Into<String>) -> Self {
        Error {
            kind,
            msg: msg.into(),
        }
    }

    /// Errors which leave gpu state unknown and must end the run
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::DeviceCreation | ErrorKind::SwapChain | ErrorKind::DeviceLost | ErrorKind::FenceTimeout
        )
    }
}

// conversion for windows-rs win32 errors
#[cfg(target_os = "windows")]
impl From<windows::core::Error> for Error {
    fn from(err: windows::core::Error) -> Error {
        Error {
            kind: ErrorKind::DeviceLost,
            msg: err.message().to_string(),
        }
    }
}

// std errors
impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Error {
        Error {
            kind: ErrorKind::Io,
            msg: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        Error {
            kind: ErrorKind::Config,
            msg: err.to_string(),
        }
    }
}

/// Most commonly used re-exported types.
pub mod prelude {
    #[doc(hidden)]
    pub use crate::{
        gfx,
        os,
        upload,
        binding,
        engine,
        game,
        demos,
        config,
        Error,
        ErrorKind,

        gfx::Device,
        gfx::Fence,
        gfx::SwapChain,
        gfx::CmdBuf,
        gfx::Buffer,
        gfx::Texture,
        gfx::Heap,
        gfx::Shader,
        gfx::RootSignature,
        gfx::RenderPipeline,

        os::App,
        os::Window,

        engine::Engine,
        game::Game,
        game::RenderMode,
        config::EngineConfig,
        upload::UploadPipeline,
        binding::PipelineBinding,
    };

    #[cfg(target_os = "windows")]
    pub use crate::os::win32 as os_platform;
    #[cfg(target_os = "windows")]
    pub use crate::gfx::d3d12 as gfx_platform;

    #[cfg(not(target_os = "windows"))]
    pub use crate::os::null as os_platform;
    #[cfg(not(target_os = "windows"))]
    pub use crate::gfx::null as gfx_platform;
}
