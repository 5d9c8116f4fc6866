use super::AppInfo;
use super::NativeHandle;
use super::Size;
use super::WindowInfo;

use crate::Error;

/// Headless app, windows exist only as a size and a background colour
pub struct App {
    name: String,
    quit: bool,
}

/// Headless window
pub struct Window {
    info: WindowInfo,
    closed: bool,
}

impl App {
    pub fn get_name(&self) -> &str {
        &self.name
    }

    /// Makes the next call to `run` return false
    pub fn request_quit(&mut self) {
        self.quit = true;
    }
}

impl Window {
    /// Changes the reported client size, swap chains created afterwards pick it up
    pub fn set_client_size(&mut self, width: i32, height: i32) {
        self.info.rect.width = width;
        self.info.rect.height = height;
    }
}

impl super::App for App {
    type Window = Window;

    fn create(info: AppInfo) -> Result<Self, Error> {
        Ok(App {
            name: info.name,
            quit: false,
        })
    }

    fn create_window(&mut self, info: WindowInfo) -> Result<Window, Error> {
        log::debug!("os::null: create window '{}' {}x{}", info.title, info.rect.width, info.rect.height);
        Ok(Window {
            info,
            closed: false,
        })
    }

    fn run(&mut self) -> bool {
        !self.quit
    }
}

impl super::Window<App> for Window {
    fn get_native_handle(&self) -> NativeHandle {
        NativeHandle::Headless
    }

    fn get_client_size(&self) -> Size<i32> {
        Size {
            x: self.info.rect.width,
            y: self.info.rect.height,
        }
    }

    fn get_background_colour(&self) -> [f32; 4] {
        self.info.background_colour
    }

    fn update(&mut self, app: &mut App) {
        if self.closed {
            app.request_quit();
        }
    }

    fn close(&mut self) {
        self.closed = true;
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}
