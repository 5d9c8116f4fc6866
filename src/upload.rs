use crate::gfx;
use crate::gfx::{Buffer, CmdBuf, Device, Fence};
use crate::Error;
use crate::ErrorKind;

/// Returns the state a device buffer is left in after `copy_to_device`, based on how it will be bound.
pub fn get_readable_state(usage: gfx::BufferUsage) -> gfx::ResourceState {
    if usage.contains(gfx::BufferUsage::INDEX) {
        gfx::ResourceState::IndexBuffer
    } else if usage.intersects(gfx::BufferUsage::VERTEX | gfx::BufferUsage::CONSTANT_BUFFER) {
        gfx::ResourceState::VertexConstantBuffer
    } else {
        gfx::ResourceState::GenericRead
    }
}

/// Allocates a buffer, upload buffers come back persistently mapped and device buffers in `ResourceState::Common`.
pub fn allocate<D: Device>(device: &mut D, info: &gfx::BufferInfo) -> Result<D::Buffer, Error> {
    if info.size_bytes == 0 {
        return Err(Error::new(
            ErrorKind::Validation,
            "upload: cannot allocate a buffer of 0 bytes",
        ));
    }
    device.create_buffer(info)
}

/// Copies `data` into the mapped memory of `upload`, no gpu work is recorded.
/// The caller must have fence waited on any earlier copy still reading from `upload`.
pub fn stage<D: Device, T: Sized>(upload: &mut D::Buffer, data: &[T]) -> Result<(), Error> {
    if upload.get_heap_type() != gfx::HeapType::Upload {
        return Err(Error::new(
            ErrorKind::Validation,
            format!("upload: stage target is a {:?} heap buffer", upload.get_heap_type()),
        ));
    }
    if std::mem::size_of_val(data) == 0 {
        return Err(Error::new(ErrorKind::Validation, "upload: cannot stage 0 bytes"));
    }
    upload.write(0, data)
}

/// Records the device side of an upload into `cmd`: `Common -> CopyDst`, the region copy,
/// then `CopyDst ->` the readable state for the buffer usage.
pub fn copy_to_device<D: Device>(
    cmd: &mut D::CmdBuf,
    upload: &D::Buffer,
    device_buffer: &D::Buffer,
    size_bytes: usize,
) -> Result<(), Error> {
    if size_bytes == 0 {
        return Err(Error::new(ErrorKind::Validation, "upload: cannot copy 0 bytes"));
    }
    // checked before the first barrier so a rejected copy leaves the device buffer in Common
    if size_bytes > upload.get_size() || size_bytes > device_buffer.get_size() {
        return Err(Error::new(
            ErrorKind::Validation,
            format!(
                "upload: {} byte copy from a {} byte upload buffer into a {} byte device buffer",
                size_bytes,
                upload.get_size(),
                device_buffer.get_size()
            ),
        ));
    }
    cmd.transition_barrier(&gfx::TransitionBarrier::<D>::buffer(
        device_buffer,
        gfx::ResourceState::Common,
        gfx::ResourceState::CopyDst,
    ))?;
    cmd.copy_buffer_region(device_buffer, 0, upload, 0, size_bytes)?;
    cmd.transition_barrier(&gfx::TransitionBarrier::<D>::buffer(
        device_buffer,
        gfx::ResourceState::CopyDst,
        get_readable_state(device_buffer.get_usage()),
    ))
}

struct Staging<D: Device> {
    _buffer: D::Buffer,
    // the recording the copy out of the buffer lives in
    marker: gfx::SubmissionMarker,
}

/// Stages data through upload heap buffers into device heap buffers and keeps
/// each staging buffer alive until the fence confirms the copy out of it has executed.
pub struct UploadPipeline<D: Device> {
    staging: Vec<Staging<D>>,
    bytes_uploaded: usize,
}

impl<D: Device> Default for UploadPipeline<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Device> UploadPipeline<D> {
    pub fn new() -> Self {
        UploadPipeline {
            staging: Vec::new(),
            bytes_uploaded: 0,
        }
    }

    /// Allocates a device heap buffer described by `info` and records the copy of `data` into it on `cmd`.
    /// The staging buffer is retained until `release_completed` sees the fence complete the submission of `cmd`,
    /// or `cmd` is reset without being executed.
    pub fn upload<T: Sized>(
        &mut self,
        device: &mut D,
        cmd: &mut D::CmdBuf,
        info: &gfx::BufferInfo,
        data: &[T],
    ) -> Result<D::Buffer, Error> {
        let size_bytes = std::mem::size_of_val(data);
        if size_bytes == 0 || info.size_bytes == 0 {
            return Err(Error::new(ErrorKind::Validation, "upload: cannot upload 0 bytes"));
        }
        if size_bytes > info.size_bytes {
            return Err(Error::new(
                ErrorKind::Validation,
                format!("upload: {} bytes of data do not fit in a {} byte buffer", size_bytes, info.size_bytes),
            ));
        }

        let mut staging = allocate(
            device,
            &gfx::BufferInfo {
                heap: gfx::HeapType::Upload,
                usage: gfx::BufferUsage::NONE,
                size_bytes,
                stride: 0,
                format: gfx::Format::Unknown,
            },
        )?;
        stage::<D, T>(&mut staging, data)?;

        let device_buffer = allocate(
            device,
            &gfx::BufferInfo {
                heap: gfx::HeapType::Device,
                ..*info
            },
        )?;
        let copied = copy_to_device::<D>(cmd, &staging, &device_buffer, size_bytes);

        // held even when the copy failed part way, `cmd` may already reference it
        self.staging.push(Staging {
            _buffer: staging,
            marker: cmd.get_submission_marker(),
        });
        copied?;

        log::debug!("upload: recorded {} byte copy into a {:?} buffer", size_bytes, info.usage);
        self.bytes_uploaded += size_bytes;
        Ok(device_buffer)
    }

    /// Releases staging buffers whose copies `fence` has completed, or whose recordings were abandoned,
    /// returns how many were released
    pub fn release_completed(&mut self, fence: &D::Fence) -> usize {
        let before = self.staging.len();
        self.staging.retain(|s| !s.marker.is_complete::<D>(fence));
        let released = before - self.staging.len();
        if released > 0 {
            log::trace!(
                "upload: released {} staging buffers at fence {}",
                released,
                fence.get_completed_value()
            );
        }
        released
    }

    /// Number of staging buffers still held
    pub fn get_num_staging(&self) -> usize {
        self.staging.len()
    }

    /// Total bytes staged through this pipeline
    pub fn get_bytes_uploaded(&self) -> usize {
        self.bytes_uploaded
    }
}
