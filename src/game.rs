use crate::engine::Engine;
use crate::gfx;
use crate::os;
use crate::Error;

/// Decides which frames a game records draws for.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RenderMode {
    /// Begin, render and present every frame
    EveryFrame,
    /// Only render when `Game::update` reports a change, and on the first frame
    OnDemand,
}

/// Interface implemented by each demo, the engine calls `init` once then `update` and `render` per frame.
pub trait Game<D: gfx::Device, A: os::App> {
    /// Create gpu resources, uploads issued here complete before the first frame
    fn init(&mut self, engine: &mut Engine<D, A>) -> Result<(), Error>;
    /// Cpu side per frame work, returns true when the frame needs to be rendered
    fn update(&mut self, engine: &mut Engine<D, A>) -> Result<bool, Error>;
    /// Record draws into `engine.cmd_buf`, called between `begin_frame` and `end_frame`
    fn render(&mut self, engine: &mut Engine<D, A>) -> Result<(), Error>;
    fn render_mode(&self) -> RenderMode {
        RenderMode::EveryFrame
    }
}
