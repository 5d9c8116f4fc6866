/// Headless platform, creates windows with a fixed client size and no native surface.
pub mod null;

/// Implements this interface for windows win32 platfrom
#[cfg(target_os = "windows")]
pub mod win32;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Describes a rectangle starting at the top left corner specified by x,y
/// with the size of width and height.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect<T> {
    pub x: T,
    pub y: T,
    pub width: T,
    pub height: T,
}

/// 2D size with x = width and y = height
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Size<T> {
    pub x: T,
    pub y: T,
}

/// Platform specific handle a swap chain can be created for.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NativeHandle {
    /// There is no native surface, only software backends can present to it
    Headless,
    /// Win32 window handle stored as its integer value
    Hwnd(isize),
}

/// Information to create an application
pub struct AppInfo {
    pub name: String,
}

/// Filled out to specify various window parameters
/// when a window is created by `App::create_window`
#[derive(Clone, Debug)]
pub struct WindowInfo {
    pub title: String,
    pub rect: Rect<i32>,
    /// Colour the window clears to, swap chains derive a clear colour from it when none is supplied
    pub background_colour: [f32; 4],
}

impl Default for WindowInfo {
    fn default() -> Self {
        WindowInfo {
            title: "gpu harness".to_string(),
            rect: Rect {
                x: 100,
                y: 100,
                width: 1280,
                height: 720,
            },
            background_colour: [0.45, 0.55, 0.60, 1.00],
        }
    }
}

/// An interface which all platforms need to implement
/// for general operating system calls
pub trait App: 'static + Sized {
    type Window: Window<Self>;
    fn create(info: AppInfo) -> Result<Self, Error>;
    fn create_window(&mut self, info: WindowInfo) -> Result<Self::Window, Error>;
    /// Pumps pending messages, returns false once the app has been asked to quit
    fn run(&mut self) -> bool;
}

/// An instance of an operating system window, the surface provider for a swap chain
pub trait Window<A: App>: 'static + Sized {
    fn get_native_handle(&self) -> NativeHandle;
    /// Size of the drawable client area in pixels
    fn get_client_size(&self) -> Size<i32>;
    fn get_background_colour(&self) -> [f32; 4];
    fn update(&mut self, app: &mut A);
    fn close(&mut self);
    fn is_closed(&self) -> bool;
}
