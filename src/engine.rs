use crate::config::EngineConfig;
use crate::game::{Game, RenderMode};
use crate::gfx;
use crate::gfx::{CmdBuf, Device, Fence, SwapChain, Texture};
use crate::os;
use crate::os::{App, Window};
use crate::upload::UploadPipeline;
use crate::Error;
use crate::ErrorKind;

use std::time::Duration;

/// Engine context which owns the core gpu resources and drives the frame loop:
/// reset, `Present -> RenderTarget`, clear, game draws, `RenderTarget -> Present`, submit, fence wait, present.
pub struct Engine<D: Device, A: App> {
    pub app: A,
    pub main_window: A::Window,
    pub device: D,
    pub swap_chain: D::SwapChain,
    pub cmd_buf: D::CmdBuf,
    pub fence: D::Fence,
    pub upload: UploadPipeline<D>,
    pub config: EngineConfig,
    fence_timeout: Option<Duration>,
    frame: u64,
    rendered_frames: u64,
}

impl<D, A> Engine<D, A>
where
    D: Device,
    A: App,
{
    /// Creates the device, swap chain for `window`, command buffer and fence
    pub fn create(app: A, window: A::Window, config: EngineConfig) -> Result<Self, Error> {
        let mut device = D::create(&config.get_device_info())?;
        log::info!("engine: adapter {}", device.get_adapter_info());

        let swap_chain = device.create_swap_chain::<A>(&config.get_swap_chain_info(), &window)?;
        let (width, height) = swap_chain.get_size();
        log::info!(
            "engine: swap chain {}x{} with {} buffers",
            width,
            height,
            swap_chain.get_num_buffers()
        );

        let cmd_buf = device.create_cmd_buf()?;
        let fence = device.create_fence()?;

        Ok(Engine {
            app,
            main_window: window,
            device,
            swap_chain,
            cmd_buf,
            fence,
            upload: UploadPipeline::new(),
            fence_timeout: config.get_fence_timeout(),
            config,
            frame: 0,
            rendered_frames: 0,
        })
    }

    /// Creates the app and main window from `config` then the engine for them
    pub fn create_from_config(config: EngineConfig) -> Result<Self, Error> {
        let mut app = A::create(os::AppInfo {
            name: config.name.clone(),
        })?;
        let window = app.create_window(config.get_window_info())?;
        Self::create(app, window, config)
    }

    /// The command buffer frames and uploads are recorded into
    pub fn cmd(&mut self) -> &mut D::CmdBuf {
        &mut self.cmd_buf
    }

    /// Number of frames run so far, rendered or not
    pub fn get_frame_index(&self) -> u64 {
        self.frame
    }

    /// Number of frames which were rendered and presented
    pub fn get_rendered_frames(&self) -> u64 {
        self.rendered_frames
    }

    /// Opens the command buffer for the current backbuffer, transitions it to render target,
    /// clears colour and depth, and binds targets, viewport and scissor
    pub fn begin_frame(&mut self) -> Result<(), Error> {
        self.cmd_buf.reset(&self.fence, None)?;

        let bb = self.swap_chain.get_backbuffer_texture();
        let ds = self.swap_chain.get_depth_stencil_texture();
        self.cmd_buf.transition_barrier(&gfx::TransitionBarrier::<D>::texture(
            bb,
            gfx::ResourceState::Present,
            gfx::ResourceState::RenderTarget,
        ))?;
        self.cmd_buf.clear_render_target(bb, self.swap_chain.get_clear_colour())?;
        if let Some(ds) = ds {
            self.cmd_buf.clear_depth_stencil(ds, 1.0, 0)?;
        }
        self.cmd_buf.set_render_targets(bb, ds)?;

        let rect = os::Rect {
            x: 0,
            y: 0,
            width: bb.get_width() as i32,
            height: bb.get_height() as i32,
        };
        self.cmd_buf.set_viewport(&gfx::Viewport::from(rect))?;
        self.cmd_buf.set_scissor_rect(&gfx::ScissorRect::from(rect))?;
        Ok(())
    }

    /// Transitions the backbuffer to present, submits, waits for the gpu to drain and presents
    pub fn end_frame(&mut self) -> Result<(), Error> {
        let bb = self.swap_chain.get_backbuffer_texture();
        self.cmd_buf.transition_barrier(&gfx::TransitionBarrier::<D>::texture(
            bb,
            gfx::ResourceState::RenderTarget,
            gfx::ResourceState::Present,
        ))?;
        self.cmd_buf.close_and_submit(&mut self.device)?;
        self.drain()?;
        self.swap_chain.present(&self.device, self.config.vsync)?;
        Ok(())
    }

    // signal behind everything submitted and block until the gpu reaches it
    fn drain(&mut self) -> Result<u64, Error> {
        let value = self.fence.advance_and_signal(&mut self.device)?;
        self.fence.wait_until(value, self.fence_timeout)?;
        self.upload.release_completed(&self.fence);
        Ok(value)
    }

    /// Blocks until all submitted work has completed
    pub fn wait_idle(&mut self) -> Result<(), Error> {
        self.drain().map(|_| ())
    }

    /// Uploads `data` into a new device heap buffer, waiting for the copy to complete.
    /// The staging buffer is released before returning.
    pub fn upload_buffer<T: Sized>(&mut self, info: &gfx::BufferInfo, data: &[T]) -> Result<D::Buffer, Error> {
        if self.cmd_buf.get_state() == gfx::CmdBufState::Recording {
            return Err(Error::new(
                ErrorKind::IllegalState,
                "engine: upload_buffer called while a frame is being recorded",
            ));
        }
        self.cmd_buf.reset(&self.fence, None)?;
        let buffer = self.upload.upload(&mut self.device, &mut self.cmd_buf, info, data);
        let buffer = match buffer {
            Ok(buffer) => buffer,
            Err(e) => {
                // leave the command buffer closed so the next frame can reset it
                let _ = self.cmd_buf.close();
                return Err(e);
            }
        };
        self.cmd_buf.close_and_submit(&mut self.device)?;
        self.drain()?;
        Ok(buffer)
    }

    /// Runs one frame of `game`, returns false once the app or window wants to quit
    pub fn run_frame<G: Game<D, A>>(&mut self, game: &mut G) -> Result<bool, Error> {
        if !self.app.run() {
            return Ok(false);
        }
        self.main_window.update(&mut self.app);
        if self.main_window.is_closed() {
            return Ok(false);
        }

        let redraw = game.update(self)?;
        let render = match game.render_mode() {
            RenderMode::EveryFrame => true,
            RenderMode::OnDemand => redraw || self.rendered_frames == 0,
        };
        if render {
            self.begin_frame()?;
            game.render(self)?;
            self.end_frame()?;
            self.rendered_frames += 1;
        }
        self.frame += 1;
        Ok(true)
    }

    /// Initialises `game` and runs frames until the window closes or `max_frames` have run
    pub fn run<G: Game<D, A>>(&mut self, game: &mut G, max_frames: Option<u64>) -> Result<u64, Error> {
        game.init(self)?;
        let start = self.frame;
        loop {
            if let Some(max) = max_frames {
                if self.frame - start >= max {
                    break;
                }
            }
            match self.run_frame(game) {
                Ok(true) => (),
                Ok(false) => break,
                Err(e) => {
                    log::error!("engine: frame {} failed: {}", self.frame, e);
                    // errors leave the gpu state unknown, drain what was submitted before returning
                    if !e.is_fatal() {
                        let _ = self.wait_idle();
                    }
                    return Err(e);
                }
            }
        }
        self.wait_idle()?;
        let frames = self.frame - start;
        log::info!("engine: ran {} frames, rendered {}", frames, self.rendered_frames);
        Ok(frames)
    }
}
