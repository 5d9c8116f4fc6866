use crate::gfx;
use crate::gfx::{Buffer, CmdBuf, Device, RenderPipeline, RootSignature};
use crate::Error;
use crate::ErrorKind;

/// Serialises and creates an immutable root signature, it must exist before any pipeline built against it.
pub fn build_root_signature<D: Device>(device: &D, info: &gfx::RootSignatureInfo) -> Result<D::RootSignature, Error> {
    let root_signature = device.create_root_signature(info)?;
    log::debug!(
        "binding: created root signature {} with {} parameters",
        root_signature.get_id(),
        info.parameters.len()
    );
    Ok(root_signature)
}

/// Creates an immutable pipeline state object, changes to shaders or fixed function state need a new one.
pub fn build_pipeline_state<D: Device>(device: &D, info: &gfx::RenderPipelineInfo<D>) -> Result<D::RenderPipeline, Error> {
    let pipeline = device.create_render_pipeline(info)?;
    let signature = pipeline.get_signature();
    log::debug!(
        "binding: created pipeline {} ({:?}, stride {}, {:?})",
        signature.id,
        signature.topology,
        signature.vertex_stride,
        signature.render_target_format
    );
    Ok(pipeline)
}

/// Everything a draw needs bound besides its geometry: the shader visible descriptor heap,
/// the root signature, the pipeline state and the primitive topology.
pub struct PipelineBinding<D: Device> {
    pub heap: Option<D::Heap>,
    pub root_signature: D::RootSignature,
    pub pipeline: D::RenderPipeline,
    pub topology: gfx::Topology,
}

impl<D: Device> PipelineBinding<D> {
    /// Bundles objects which were built together, `pipeline` must have been built from `root_signature`
    /// and for the class of `topology`
    pub fn new(
        heap: Option<D::Heap>,
        root_signature: D::RootSignature,
        pipeline: D::RenderPipeline,
        topology: gfx::Topology,
    ) -> Result<Self, Error> {
        let signature = pipeline.get_signature();
        if signature.root_signature_id != root_signature.get_id() {
            return Err(Error::new(
                ErrorKind::PipelineState,
                "binding: pipeline was built from a different root signature",
            ));
        }
        if signature.topology != topology.get_type() {
            return Err(Error::new(
                ErrorKind::PipelineState,
                format!(
                    "binding: {:?} topology cannot be drawn with a {:?} pipeline",
                    topology, signature.topology
                ),
            ));
        }
        Ok(PipelineBinding {
            heap,
            root_signature,
            pipeline,
            topology,
        })
    }

    /// Binds heaps, root signature, pipeline, vertex and index buffers, topology and finally the
    /// descriptor tables as (root slot, heap index) pairs, which reference the heap bound first.
    pub fn bind_for_draw(
        &self,
        cmd: &mut D::CmdBuf,
        vertex_buffer: &D::Buffer,
        index_buffer: Option<&D::Buffer>,
        tables: &[(u32, usize)],
    ) -> Result<(), Error> {
        if let Some(heap) = &self.heap {
            cmd.set_heaps(&[heap])?;
        }
        cmd.set_root_signature(&self.root_signature)?;
        cmd.set_render_pipeline(&self.pipeline)?;
        cmd.set_vertex_buffer(vertex_buffer, 0)?;
        if let Some(index_buffer) = index_buffer {
            cmd.set_index_buffer(index_buffer)?;
        }
        cmd.set_topology(self.topology)?;
        if !tables.is_empty() {
            let heap = self.heap.as_ref().ok_or_else(|| {
                Error::new(ErrorKind::Validation, "binding: descriptor tables need a descriptor heap")
            })?;
            for (slot, index) in tables {
                cmd.set_descriptor_table(*slot, heap, *index)?;
            }
        }
        Ok(())
    }

    /// Number of vertices a bound `vertex_buffer` holds for this pipeline's stride
    pub fn get_vertex_count(&self, vertex_buffer: &D::Buffer) -> u32 {
        let stride = self.pipeline.get_signature().vertex_stride;
        if stride == 0 {
            0
        } else {
            (vertex_buffer.get_size() / stride) as u32
        }
    }
}
