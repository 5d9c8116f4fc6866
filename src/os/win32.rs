use windows::{
    core::*,
    Win32::Foundation::*,
    Win32::System::LibraryLoader::*,
    Win32::UI::WindowsAndMessaging::*,
};

use super::AppInfo;
use super::NativeHandle;
use super::Size;
use super::WindowInfo;

pub struct App {
    window_class: String,
    hinstance: HINSTANCE,
    quit: bool,
}

pub struct Window {
    info: WindowInfo,
    hwnd: HWND,
    closed: bool,
}

impl Window {
    pub fn get_hwnd(&self) -> HWND {
        self.hwnd
    }
}

impl Drop for Window {
    fn drop(&mut self) {
        if !self.closed {
            unsafe {
                let _ = DestroyWindow(self.hwnd);
            }
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        unsafe {
            let _ = UnregisterClassA(PCSTR(self.window_class.as_ptr() as _), self.hinstance);
        }
    }
}

extern "system" fn wndproc(window: HWND, message: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    unsafe {
        match message {
            WM_DESTROY => {
                PostQuitMessage(0);
                LRESULT(0)
            }
            _ => DefWindowProcA(window, message, wparam, lparam),
        }
    }
}

impl super::App for App {
    type Window = Window;

    fn create(info: AppInfo) -> std::result::Result<Self, crate::Error> {
        unsafe {
            let window_class = info.name + "\0";
            let instance = GetModuleHandleA(None).map_err(|e| {
                crate::Error::new(crate::ErrorKind::DeviceCreation, format!("os::win32: GetModuleHandleA failed: {}", e.message()))
            })?;

            let wc = WNDCLASSA {
                hCursor: LoadCursorW(None, IDC_ARROW)?,
                hInstance: instance.into(),
                lpszClassName: PCSTR(window_class.as_ptr() as _),
                style: CS_HREDRAW | CS_VREDRAW,
                lpfnWndProc: Some(wndproc),
                ..Default::default()
            };

            if RegisterClassA(&wc) == 0 {
                return Err(crate::Error::new(
                    crate::ErrorKind::DeviceCreation,
                    "os::win32: window class already registered",
                ));
            }

            Ok(App {
                window_class,
                hinstance: instance.into(),
                quit: false,
            })
        }
    }

    fn create_window(&mut self, info: WindowInfo) -> std::result::Result<Window, crate::Error> {
        let title = info.title.clone() + "\0";
        let hwnd = unsafe {
            CreateWindowExA(
                WINDOW_EX_STYLE::default(),
                PCSTR(self.window_class.as_ptr() as _),
                PCSTR(title.as_ptr() as _),
                WS_OVERLAPPEDWINDOW | WS_VISIBLE,
                info.rect.x,
                info.rect.y,
                info.rect.width,
                info.rect.height,
                None,
                None,
                self.hinstance,
                None,
            )?
        };
        Ok(Window {
            info,
            hwnd,
            closed: false,
        })
    }

    fn run(&mut self) -> bool {
        unsafe {
            let mut msg = MSG::default();
            while PeekMessageA(&mut msg, None, 0, 0, PM_REMOVE).as_bool() {
                let _ = TranslateMessage(&msg);
                DispatchMessageA(&msg);
                if msg.message == WM_QUIT {
                    self.quit = true;
                    break;
                }
            }
        }
        !self.quit
    }
}

impl super::Window<App> for Window {
    fn get_native_handle(&self) -> NativeHandle {
        NativeHandle::Hwnd(self.hwnd.0 as isize)
    }

    fn get_client_size(&self) -> Size<i32> {
        let mut rect = RECT::default();
        unsafe {
            if GetClientRect(self.hwnd, &mut rect).is_err() {
                return Size {
                    x: self.info.rect.width,
                    y: self.info.rect.height,
                };
            }
        }
        Size {
            x: rect.right - rect.left,
            y: rect.bottom - rect.top,
        }
    }

    fn get_background_colour(&self) -> [f32; 4] {
        self.info.background_colour
    }

    fn update(&mut self, _app: &mut App) {
        if !self.closed && unsafe { !IsWindow(self.hwnd).as_bool() } {
            self.closed = true;
        }
    }

    fn close(&mut self) {
        if !self.closed {
            unsafe {
                let _ = DestroyWindow(self.hwnd);
            }
            self.closed = true;
        }
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}
