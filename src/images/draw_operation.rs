// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
The draw operation lifecycle.

A [DrawOperation] draws one shape.  It moves through these states:

```text
Uninitialized ──initialize──▶ ResourcesCreated ──materialize──▶ Idle ◀──refresh── PendingUpdate
      │                                                           │ ──mutation──────▶ │
      └──setup fails──▶ Unusable                     any state ──dispose──▶ Disposed
```

* The setup hook is an optional future that runs once and may produce an image to texture the
  shape with.  It never touches the device.
* Materialization creates everything device-resident: shared objects (pipeline, binding layout,
  sampler) come from the [SharedCache]; the uniform buffer, texture, binding set and geometry
  buffer belong to the operation.  It may be repeated; prior per-operation objects are released
  first.  To move to another device, [DrawOperation::detach_device] from the old one, then
  materialize on the new one.
* Mutations only mark the operation pending.  [DrawOperation::refresh_pending] then performs at
  most one geometry upload and one uniform upload, however many mutations happened.
* [DrawOperation::draw] records one draw call.

Any call after [DrawOperation::dispose] fails with [DrawError::InvalidState].
*/

use crate::bindings::bind_style::{BindingDescription, BindingKind, BoundResource, Stage};
use crate::bindings::buffer_types::{CRepr, value_as_bytes};
use crate::bindings::layout_builder::{LayoutElement, LayoutEntry, LayoutError, ResourceLayoutBuilder};
use crate::bindings::sampler::SamplerType;
use crate::bindings::visible_to::{GPUBufferUsage, TextureUsage};
use crate::cache::{CacheError, CachedResource, OwnerEntry, ResourceCache};
use crate::images::device::{
    BufferHandle, Device, DeviceError, DeviceObject, DrawCall, LayoutHandle, PipelineDescription,
    PipelineHandle, SamplerHandle, SetHandle, TextureDescription, TextureHandle,
};
use crate::images::frame_driver::FrameHooks;
use crate::images::geometry::{GeometryBufferGenerator, GeometryError, PackedBuffer};
use crate::images::index_algorithms::Topology;
use crate::images::shader::{ShaderChoice, ShaderSet};
use crate::images::shape::ShapeDefinition;
use crate::images::vertex_algorithms::{ElementSkip, VertexGenerator};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

/// Objects shared between draw operations through the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharedObject {
    Pipeline(PipelineHandle),
    Layout(LayoutHandle),
    Sampler(SamplerHandle),
}

impl SharedObject {
    pub fn device_object(self) -> DeviceObject {
        match self {
            SharedObject::Pipeline(p) => DeviceObject::Pipeline(p),
            SharedObject::Layout(l) => DeviceObject::Layout(l),
            SharedObject::Sampler(s) => DeviceObject::Sampler(s),
        }
    }
}

impl CachedResource for SharedObject {
    fn dispose(&self, device: &dyn Device) {
        device.release(self.device_object());
    }
}

/// The cache draw operations share: owners are renderer kinds, named resources are device objects.
pub type SharedCache = ResourceCache<ShaderSet, SharedObject>;

/// Tightly packed RGBA8 texels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl ImageData {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Self {
        Self {
            width,
            height,
            rgba,
        }
    }

    /// An image filled with one color.
    pub fn filled(width: u32, height: u32, color: [u8; 4]) -> Self {
        let rgba = color
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 4)
            .collect();
        Self::new(width, height, rgba)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct SetupError(pub String);

/// One-time, device-independent setup.  Resolves to an optional image to texture the shape with.
pub type SetupHook = Pin<Box<dyn Future<Output = Result<Option<ImageData>, SetupError>> + Send>>;

/// Per-operation uniforms, bound at the first slot of the binding layout.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawUniforms {
    /// Column-major.
    pub transform: [[f32; 4]; 4],
    pub color: [f32; 4],
}

unsafe impl CRepr for DrawUniforms {}

impl Default for DrawUniforms {
    fn default() -> Self {
        Self {
            transform: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
            color: [1.0, 1.0, 1.0, 1.0],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// Setup has not completed.
    Uninitialized,
    /// Setup completed; nothing exists on the device.
    ResourcesCreated,
    /// Materialized, nothing pending.
    Idle,
    /// Materialized, with changes waiting for [DrawOperation::refresh_pending].
    PendingUpdate,
    /// Setup failed.  Only disposal is possible.
    Unusable,
    Disposed,
}

impl LifecycleState {
    /// Materialized and drawable.
    pub fn is_ready(self) -> bool {
        matches!(self, LifecycleState::Idle | LifecycleState::PendingUpdate)
    }
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum DrawError {
    #[error("{operation} is not valid in state {state:?}")]
    InvalidState {
        operation: &'static str,
        state: LifecycleState,
    },
    #[error("setup failed: {0}")]
    SetupFailed(String),
    #[error("no built-in shader for vertex fields {fields:?}")]
    NoBuiltinShader { fields: Vec<&'static str> },
    #[error("cached resource {0:?} holds an object of the wrong kind")]
    WrongCachedKind(String),
    #[error("renderer kind {0:?} is already cached with different shaders")]
    ShaderKindConflict(String),
    #[error(transparent)]
    Cache(#[from] CacheError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    Device(#[from] DeviceError),
}

#[derive(Debug)]
struct DeviceObjects {
    uniforms: BufferHandle,
    texture: Option<TextureHandle>,
    binding_set: SetHandle,
    pipeline: PipelineHandle,
}

/**
Draws one shape.

`G` is the vertex generation strategy, see [crate::images::vertex_algorithms].
*/
pub struct DrawOperation<G> {
    name: String,
    cache: Arc<SharedCache>,
    geometry: GeometryBufferGenerator<G>,
    shader: ShaderChoice,
    shape: Arc<ShapeDefinition>,
    uniforms: DrawUniforms,
    alpha: bool,
    setup: Option<SetupHook>,
    image: Option<ImageData>,
    state: LifecycleState,
    active: bool,
    shape_changed: bool,
    vertex_regen_pending: bool,
    uniforms_dirty: bool,
    buffer: PackedBuffer,
    objects: Option<DeviceObjects>,
}

impl<G> std::fmt::Debug for DrawOperation<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawOperation")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("active", &self.active)
            .field("shape", &self.shape.id())
            .field("buffer", &self.buffer)
            .finish()
    }
}

impl<G: VertexGenerator> DrawOperation<G> {
    pub fn new(
        name: impl Into<String>,
        cache: Arc<SharedCache>,
        geometry: GeometryBufferGenerator<G>,
        shape: Arc<ShapeDefinition>,
    ) -> Self {
        Self {
            name: name.into(),
            cache,
            geometry,
            shader: ShaderChoice::Default,
            shape,
            uniforms: DrawUniforms::default(),
            alpha: false,
            setup: None,
            image: None,
            state: LifecycleState::Uninitialized,
            active: true,
            shape_changed: false,
            vertex_regen_pending: false,
            uniforms_dirty: false,
            buffer: PackedBuffer::new(),
            objects: None,
        }
    }

    pub fn with_shader(mut self, shader: ShaderChoice) -> Self {
        self.shader = shader;
        self
    }

    pub fn with_setup(mut self, setup: SetupHook) -> Self {
        self.setup = Some(setup);
        self
    }

    pub fn with_topology(mut self, topology: Topology) -> Self {
        self.geometry = self.geometry.with_topology(topology);
        self
    }

    pub fn with_uniforms(mut self, uniforms: DrawUniforms) -> Self {
        self.uniforms = uniforms;
        self
    }

    /// Enables alpha blending.
    pub fn with_alpha(mut self, alpha: bool) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn shape(&self) -> &Arc<ShapeDefinition> {
        &self.shape
    }

    pub fn uniforms(&self) -> &DrawUniforms {
        &self.uniforms
    }

    pub fn geometry(&self) -> &GeometryBufferGenerator<G> {
        &self.geometry
    }

    pub fn buffer(&self) -> &PackedBuffer {
        &self.buffer
    }

    pub fn image(&self) -> Option<&ImageData> {
        self.image.as_ref()
    }

    pub fn pipeline(&self) -> Option<PipelineHandle> {
        self.objects.as_ref().map(|o| o.pipeline)
    }

    pub fn binding_set(&self) -> Option<SetHandle> {
        self.objects.as_ref().map(|o| o.binding_set)
    }

    pub fn uniform_buffer(&self) -> Option<BufferHandle> {
        self.objects.as_ref().map(|o| o.uniforms)
    }

    fn invalid(&self, operation: &'static str) -> DrawError {
        DrawError::InvalidState {
            operation,
            state: self.state,
        }
    }

    /**
    Drives the setup hook without blocking.

    Completes with `Ok` once setup is done (immediately if there is no hook).  A failing hook leaves
    the operation [LifecycleState::Unusable].  Any call once setup has completed is
    [DrawError::InvalidState].
    */
    pub fn poll_initialize(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), DrawError>> {
        if self.state != LifecycleState::Uninitialized {
            return Poll::Ready(Err(self.invalid("initialize")));
        }
        let outcome = match self.setup.as_mut() {
            None => Ok(None),
            Some(hook) => match hook.as_mut().poll(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(outcome) => outcome,
            },
        };
        self.setup = None;
        match outcome {
            Ok(image) => {
                self.image = image;
                self.state = LifecycleState::ResourcesCreated;
                logwise::info_sync!(
                    "{name} initialized",
                    name = logwise::privacy::LogIt(&self.name)
                );
                Poll::Ready(Ok(()))
            }
            Err(e) => {
                self.state = LifecycleState::Unusable;
                logwise::error_sync!(
                    "{name} setup failed: {err}",
                    name = logwise::privacy::LogIt(&self.name),
                    err = logwise::privacy::LogIt(&e)
                );
                Poll::Ready(Err(DrawError::SetupFailed(e.0)))
            }
        }
    }

    /// Runs the setup hook to completion.
    pub async fn initialize_once(&mut self) -> Result<(), DrawError> {
        std::future::poll_fn(|cx| self.poll_initialize(cx)).await
    }

    /**
    Creates (or re-creates) everything this operation needs on `device`.

    Valid after setup and in any ready state.  Geometry is validated and generated before the
    device is touched, so an unsupported shape fails without side effects.  On other failures the
    operation is left in [LifecycleState::ResourcesCreated] with nothing on the device.
    */
    pub fn materialize_for_device(&mut self, device: &dyn Device) -> Result<(), DrawError> {
        match self.state {
            LifecycleState::ResourcesCreated | LifecycleState::Idle | LifecycleState::PendingUpdate => {}
            _ => return Err(self.invalid("materialize_for_device")),
        }
        let plan = self.geometry.plan(&self.shape)?;
        let generated = self.geometry.generate_planned(&plan)?;

        self.release_device_objects(device);
        self.state = LifecycleState::ResourcesCreated;

        let mut created = Vec::new();
        let objects = match self.create_device_objects(device, &mut created) {
            Ok(objects) => objects,
            Err(e) => {
                for object in created {
                    device.release(object);
                }
                return Err(e);
            }
        };
        if let Err(e) = self.buffer.write(device, &generated, &self.name) {
            for object in created {
                device.release(object);
            }
            self.buffer.release(device);
            return Err(e.into());
        }
        self.objects = Some(objects);
        self.shape_changed = false;
        self.vertex_regen_pending = false;
        self.uniforms_dirty = false;
        self.state = LifecycleState::Idle;
        logwise::info_sync!(
            "{name} materialized: {vertices} vertices, {indices} indices",
            name = logwise::privacy::LogIt(&self.name),
            vertices = generated.vertex_count,
            indices = generated.indices.len()
        );
        Ok(())
    }

    fn shader_set(&self) -> Result<ShaderSet, DrawError> {
        match &self.shader {
            ShaderChoice::Custom(set) => Ok(set.clone()),
            ShaderChoice::Default => {
                let layout = self.geometry.vertex_layout();
                ShaderSet::builtin_for(&layout, self.image.is_some()).ok_or_else(|| {
                    DrawError::NoBuiltinShader {
                        fields: layout.field_names().collect(),
                    }
                })
            }
        }
    }

    //per-operation objects are pushed onto `created` as they are made
    fn create_device_objects(
        &self,
        device: &dyn Device,
        created: &mut Vec<DeviceObject>,
    ) -> Result<DeviceObjects, DrawError> {
        let shaders = self.shader_set()?;
        let owner_shaders = shaders.clone();
        let owner = self
            .cache
            .get_or_register_owner(shaders.kind(), move |_| Ok(owner_shaders.clone()));
        //one kind, one shader set
        if *owner.owner_resource()? != shaders {
            return Err(DrawError::ShaderKindConflict(shaders.kind().to_owned()));
        }

        let uniforms = device.create_buffer(
            std::mem::size_of::<DrawUniforms>() as u64,
            GPUBufferUsage::VertexAndFragmentShaderRead,
            &self.name,
        )?;
        created.push(DeviceObject::Buffer(uniforms));
        device.update_buffer(uniforms, 0, value_as_bytes(&self.uniforms))?;

        let builder = ResourceLayoutBuilder::new();
        builder.insert_first(LayoutElement::new(
            BindingDescription::new("uniforms", BindingKind::UniformBuffer, Stage::VertexAndFragment),
            BoundResource::Buffer(uniforms),
        ))?;
        let texture = match &self.image {
            None => None,
            Some(image) => {
                let texture = device.create_texture(
                    &TextureDescription {
                        width: image.width,
                        height: image.height,
                        usage: TextureUsage::FragmentShaderSample,
                        debug_name: self.name.clone(),
                    },
                    &image.rgba,
                )?;
                created.push(DeviceObject::Texture(texture));
                let sampler = shared_sampler(&owner, device, SamplerType::Mipmapped)?;
                builder.insert_last(LayoutElement::new(
                    BindingDescription::new("image", BindingKind::Texture, Stage::Fragment),
                    BoundResource::Texture(texture),
                ))?;
                builder.insert_last(LayoutElement::new(
                    BindingDescription::new("image_sampler", BindingKind::Sampler, Stage::Fragment),
                    BoundResource::Sampler(sampler),
                ))?;
                Some(texture)
            }
        };

        let layout_variant = if texture.is_some() { "textured" } else { "plain" };
        let layout_name = format!("layout/{layout_variant}");
        let built = builder.build(|entries| shared_layout(&owner, device, &layout_name, entries))?;
        let layout = built.layout;

        let vertex_layout = self.geometry.vertex_layout();
        let pipeline_name = format!(
            "pipeline/{}/{layout_variant}/{}{}",
            self.geometry.topology().name(),
            vertex_layout.field_names().collect::<Vec<_>>().join("+"),
            if self.alpha { "/alpha" } else { "" }
        );
        let topology = self.geometry.topology();
        let alpha = self.alpha;
        let label = format!("{}:{pipeline_name}", shaders.kind());
        let pipeline = owner.get_or_add_resource(device, &pipeline_name, move |device, shaders| {
            let pipeline = device.create_pipeline(&PipelineDescription {
                label: &label,
                vertex_wgsl: shaders.vertex_wgsl(),
                fragment_wgsl: shaders.fragment_wgsl(),
                vertex_layout: &vertex_layout,
                topology,
                layout,
                alpha,
            })?;
            Ok(SharedObject::Pipeline(pipeline))
        })?;
        let SharedObject::Pipeline(pipeline) = *pipeline else {
            return Err(DrawError::WrongCachedKind(pipeline_name));
        };

        let binding_set = device.create_binding_set(layout, &built.resources)?;
        created.push(DeviceObject::Set(binding_set));

        Ok(DeviceObjects {
            uniforms,
            texture,
            binding_set,
            pipeline,
        })
    }

    fn release_device_objects(&mut self, device: &dyn Device) {
        if let Some(objects) = self.objects.take() {
            device.release(DeviceObject::Set(objects.binding_set));
            device.release(DeviceObject::Buffer(objects.uniforms));
            if let Some(texture) = objects.texture {
                device.release(DeviceObject::Texture(texture));
            }
        }
        self.buffer.release(device);
    }

    //mutations before materialization need no flag; materialization starts from scratch
    fn mark_pending(&mut self, operation: &'static str) -> Result<(), DrawError> {
        match self.state {
            LifecycleState::Disposed => Err(self.invalid(operation)),
            LifecycleState::Idle => {
                self.state = LifecycleState::PendingUpdate;
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /**
    Replaces the shape and the skip applied to it.

    The new shape is validated immediately; on error the operation keeps its previous shape.  The
    geometry buffer is regenerated, and resized if needed, on the next refresh.
    */
    pub fn set_shape(&mut self, shape: Arc<ShapeDefinition>, skip: ElementSkip) -> Result<(), DrawError> {
        if self.state == LifecycleState::Disposed {
            return Err(self.invalid("set_shape"));
        }
        let previous_skip = self.geometry.skip();
        if shape == self.shape && skip == previous_skip {
            return Ok(());
        }
        self.geometry.set_skip(skip);
        if let Err(e) = self.geometry.plan(&shape) {
            self.geometry.set_skip(previous_skip);
            return Err(e.into());
        }
        self.shape = shape;
        self.shape_changed = true;
        self.mark_pending("set_shape")
    }

    /// Regenerates vertex contents on the next refresh, for generators whose output changed.
    pub fn notify_pending_vertex_regeneration(&mut self) -> Result<(), DrawError> {
        self.mark_pending("notify_pending_vertex_regeneration")?;
        self.vertex_regen_pending = true;
        Ok(())
    }

    pub fn set_transform(&mut self, transform: [[f32; 4]; 4]) -> Result<(), DrawError> {
        self.mark_pending("set_transform")?;
        self.uniforms.transform = transform;
        self.uniforms_dirty = true;
        Ok(())
    }

    pub fn set_color(&mut self, color: [f32; 4]) -> Result<(), DrawError> {
        self.mark_pending("set_color")?;
        self.uniforms.color = color;
        self.uniforms_dirty = true;
        Ok(())
    }

    /// Inactive operations keep their device objects but are not drawn.
    pub fn set_active(&mut self, active: bool) -> Result<(), DrawError> {
        if self.state == LifecycleState::Disposed {
            return Err(self.invalid("set_active"));
        }
        self.active = active;
        Ok(())
    }

    /**
    Writes pending changes to the device.

    Returns whether anything was written.  Geometry is uploaded at most once and uniforms at most
    once per call.
    */
    pub fn refresh_pending(&mut self, device: &dyn Device) -> Result<bool, DrawError> {
        let uniform_buffer = match (self.state, &self.objects) {
            (LifecycleState::Idle, Some(_)) => return Ok(false),
            (LifecycleState::PendingUpdate, Some(objects)) => objects.uniforms,
            _ => return Err(self.invalid("refresh_pending")),
        };
        if self.shape_changed || self.vertex_regen_pending {
            let generated = self.geometry.generate(&self.shape)?;
            let fit = self.buffer.write(device, &generated, &self.name)?;
            logwise::trace_sync!(
                "{name} geometry refreshed ({fit})",
                name = logwise::privacy::LogIt(&self.name),
                fit = logwise::privacy::LogIt(&fit)
            );
            self.shape_changed = false;
            self.vertex_regen_pending = false;
        }
        if self.uniforms_dirty {
            device.update_buffer(uniform_buffer, 0, value_as_bytes(&self.uniforms))?;
            self.uniforms_dirty = false;
        }
        self.state = LifecycleState::Idle;
        Ok(true)
    }

    /// Records this operation's draw.  Returns `false` without recording when inactive.
    pub fn draw(&self, device: &dyn Device) -> Result<bool, DrawError> {
        let (objects, buffer) = match (self.state.is_ready(), &self.objects, self.buffer.buffer()) {
            (true, Some(objects), Some(buffer)) => (objects, buffer),
            _ => return Err(self.invalid("draw")),
        };
        if !self.active {
            return Ok(false);
        }
        device.record_draw(&DrawCall {
            index_count: self.buffer.index_count(),
            vertex_buffer: buffer,
            vertices: self.buffer.vertex_range(),
            index_buffer: buffer,
            indices: self.buffer.index_range(),
            pipeline: objects.pipeline,
            binding_sets: vec![objects.binding_set],
        })?;
        Ok(true)
    }

    /**
    Releases per-operation objects on `device` and returns to [LifecycleState::ResourcesCreated].

    Used when rendering moves to another device: `device` is the previous one.  The next
    [Self::materialize_for_device] starts from scratch.  Does nothing if not materialized.
    */
    pub fn detach_device(&mut self, device: &dyn Device) -> Result<(), DrawError> {
        match self.state {
            LifecycleState::Disposed => Err(self.invalid("detach_device")),
            LifecycleState::Idle | LifecycleState::PendingUpdate => {
                self.release_device_objects(device);
                self.state = LifecycleState::ResourcesCreated;
                logwise::trace_sync!(
                    "{name} detached from device",
                    name = logwise::privacy::LogIt(&self.name)
                );
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Releases per-operation device objects.  Terminal.
    pub fn dispose(&mut self, device: &dyn Device) -> Result<(), DrawError> {
        if self.state == LifecycleState::Disposed {
            return Err(self.invalid("dispose"));
        }
        self.release_device_objects(device);
        self.setup = None;
        self.image = None;
        self.active = false;
        self.state = LifecycleState::Disposed;
        logwise::info_sync!(
            "{name} disposed",
            name = logwise::privacy::LogIt(&self.name)
        );
        Ok(())
    }
}

fn shared_sampler(
    owner: &OwnerEntry<ShaderSet, SharedObject>,
    device: &dyn Device,
    sampler_type: SamplerType,
) -> Result<SamplerHandle, DrawError> {
    let name = sampler_type.cache_name();
    let sampler = owner.get_or_add_resource(device, name, move |device, _| {
        Ok(SharedObject::Sampler(device.create_sampler(sampler_type)?))
    })?;
    match *sampler {
        SharedObject::Sampler(s) => Ok(s),
        _ => Err(DrawError::WrongCachedKind(name.to_owned())),
    }
}

fn shared_layout(
    owner: &OwnerEntry<ShaderSet, SharedObject>,
    device: &dyn Device,
    name: &str,
    entries: &[LayoutEntry],
) -> Result<LayoutHandle, DrawError> {
    let entries = entries.to_vec();
    let layout = owner.get_or_add_resource(device, name, move |device, _| {
        Ok(SharedObject::Layout(device.create_binding_layout(&entries)?))
    })?;
    match *layout {
        SharedObject::Layout(l) => Ok(l),
        _ => Err(DrawError::WrongCachedKind(name.to_owned())),
    }
}

impl<G: VertexGenerator> FrameHooks for DrawOperation<G> {
    fn name(&self) -> &str {
        &self.name
    }

    fn lifecycle(&self) -> LifecycleState {
        self.state
    }

    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) -> Result<(), DrawError> {
        DrawOperation::set_active(self, active)
    }

    fn poll_initialize(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), DrawError>> {
        DrawOperation::poll_initialize(self, cx)
    }

    fn materialize_for_device(&mut self, device: &dyn Device) -> Result<(), DrawError> {
        DrawOperation::materialize_for_device(self, device)
    }

    fn refresh_pending(&mut self, device: &dyn Device) -> Result<bool, DrawError> {
        DrawOperation::refresh_pending(self, device)
    }

    fn detach_device(&mut self, device: &dyn Device) -> Result<(), DrawError> {
        DrawOperation::detach_device(self, device)
    }

    fn draw(&self, device: &dyn Device) -> Result<bool, DrawError> {
        DrawOperation::draw(self, device)
    }

    fn dispose(&mut self, device: &dyn Device) -> Result<(), DrawError> {
        DrawOperation::dispose(self, device)
    }
}
