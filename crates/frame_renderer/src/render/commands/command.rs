//! Low-level render commands
//!
//! Commands are the fully lowered form of a frame: each variant carries only
//! what its execution step needs, and a list of commands is replayed in order
//! by the processor with no reordering.

use std::sync::Arc;

use crate::foundation::math::{Colour, Mat4, Resolution};
use crate::render::objects::{
    AmbientRenderLight, DirectionalRenderLight, PointRenderLight, RenderCamera, RenderDynamicMesh,
    RenderSkinnedAnimation,
};
use crate::render::resources::{RenderMaterial, RenderMesh, RenderShader, RenderTargetGroup, RenderTexture};

/// One step of a compiled frame
#[derive(Debug, Clone)]
pub enum RenderCommand {
    /// Compile a shader on the device
    LoadShader {
        /// Shader to load
        shader: Arc<RenderShader>,
    },
    /// Upload a texture
    LoadTexture {
        /// Texture to load
        texture: Arc<RenderTexture>,
    },
    /// Upload a static mesh
    LoadMesh {
        /// Mesh to load
        mesh: Arc<RenderMesh>,
    },
    /// Create a framebuffer from loaded attachments
    LoadTargetGroup {
        /// Target group to load
        target_group: Arc<RenderTargetGroup>,
    },
    /// Start rendering into the default framebuffer
    Begin {
        /// Viewport size
        resolution: Resolution,
        /// Clear colour
        clear_colour: Colour,
    },
    /// Start rendering into an off-screen target group
    BeginWithTargetGroup {
        /// Target to bind
        target_group: Arc<RenderTargetGroup>,
        /// Clear colour
        clear_colour: Colour,
    },
    /// Set the camera for the following draws
    ApplyCamera {
        /// Camera
        camera: Box<RenderCamera>,
    },
    /// Set the ambient light for the following draws
    ApplyAmbientLight {
        /// Light
        light: AmbientRenderLight,
    },
    /// Add a directional light for the following draws
    ApplyDirectionalLight {
        /// Light
        light: DirectionalRenderLight,
    },
    /// Add a point light for the following draws
    ApplyPointLight {
        /// Light
        light: PointRenderLight,
    },
    /// Bind a material's shader, textures and uniforms
    ApplyMaterial {
        /// Material
        material: Arc<RenderMaterial>,
    },
    /// Bind a loaded static mesh
    ApplyMesh {
        /// Mesh
        mesh: Arc<RenderMesh>,
    },
    /// Stream and bind a dynamic mesh
    ApplyDynamicMesh {
        /// Mesh
        mesh: Arc<RenderDynamicMesh>,
    },
    /// Push a skinning pose for the bound mesh
    ApplySkinnedAnimation {
        /// Pose
        animation: Arc<RenderSkinnedAnimation>,
    },
    /// Draw the bound mesh once
    RenderInstance {
        /// Object to world transform
        world: Mat4,
    },
    /// Finish the current target
    End,
    /// Release a shader
    UnloadShader {
        /// Shader to unload
        shader: Arc<RenderShader>,
    },
    /// Release a texture
    UnloadTexture {
        /// Texture to unload
        texture: Arc<RenderTexture>,
    },
    /// Release a static mesh
    UnloadMesh {
        /// Mesh to unload
        mesh: Arc<RenderMesh>,
    },
    /// Release a framebuffer
    UnloadTargetGroup {
        /// Target group to unload
        target_group: Arc<RenderTargetGroup>,
    },
}

/// Payload-free discriminant of [`RenderCommand`]
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderCommandKind {
    LoadShader,
    LoadTexture,
    LoadMesh,
    LoadTargetGroup,
    Begin,
    BeginWithTargetGroup,
    ApplyCamera,
    ApplyAmbientLight,
    ApplyDirectionalLight,
    ApplyPointLight,
    ApplyMaterial,
    ApplyMesh,
    ApplyDynamicMesh,
    ApplySkinnedAnimation,
    RenderInstance,
    End,
    UnloadShader,
    UnloadTexture,
    UnloadMesh,
    UnloadTargetGroup,
}

impl RenderCommandKind {
    /// Whether the command creates a backend resource
    pub fn is_load(self) -> bool {
        matches!(
            self,
            Self::LoadShader | Self::LoadTexture | Self::LoadMesh | Self::LoadTargetGroup
        )
    }

    /// Whether the command destroys a backend resource
    pub fn is_unload(self) -> bool {
        matches!(
            self,
            Self::UnloadShader | Self::UnloadTexture | Self::UnloadMesh | Self::UnloadTargetGroup
        )
    }
}

impl RenderCommand {
    /// Discriminant of this command
    pub fn kind(&self) -> RenderCommandKind {
        match self {
            RenderCommand::LoadShader { .. } => RenderCommandKind::LoadShader,
            RenderCommand::LoadTexture { .. } => RenderCommandKind::LoadTexture,
            RenderCommand::LoadMesh { .. } => RenderCommandKind::LoadMesh,
            RenderCommand::LoadTargetGroup { .. } => RenderCommandKind::LoadTargetGroup,
            RenderCommand::Begin { .. } => RenderCommandKind::Begin,
            RenderCommand::BeginWithTargetGroup { .. } => RenderCommandKind::BeginWithTargetGroup,
            RenderCommand::ApplyCamera { .. } => RenderCommandKind::ApplyCamera,
            RenderCommand::ApplyAmbientLight { .. } => RenderCommandKind::ApplyAmbientLight,
            RenderCommand::ApplyDirectionalLight { .. } => RenderCommandKind::ApplyDirectionalLight,
            RenderCommand::ApplyPointLight { .. } => RenderCommandKind::ApplyPointLight,
            RenderCommand::ApplyMaterial { .. } => RenderCommandKind::ApplyMaterial,
            RenderCommand::ApplyMesh { .. } => RenderCommandKind::ApplyMesh,
            RenderCommand::ApplyDynamicMesh { .. } => RenderCommandKind::ApplyDynamicMesh,
            RenderCommand::ApplySkinnedAnimation { .. } => RenderCommandKind::ApplySkinnedAnimation,
            RenderCommand::RenderInstance { .. } => RenderCommandKind::RenderInstance,
            RenderCommand::End => RenderCommandKind::End,
            RenderCommand::UnloadShader { .. } => RenderCommandKind::UnloadShader,
            RenderCommand::UnloadTexture { .. } => RenderCommandKind::UnloadTexture,
            RenderCommand::UnloadMesh { .. } => RenderCommandKind::UnloadMesh,
            RenderCommand::UnloadTargetGroup { .. } => RenderCommandKind::UnloadTargetGroup,
        }
    }
}

/// Ordered run of commands
#[derive(Debug, Clone, Default)]
pub struct RenderCommandList {
    commands: Vec<RenderCommand>,
}

impl RenderCommandList {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a command
    pub fn push(&mut self, command: RenderCommand) {
        self.commands.push(command);
    }

    /// Append every command of another list, preserving order
    pub fn append(&mut self, other: &mut RenderCommandList) {
        self.commands.append(&mut other.commands);
    }

    /// Commands in execution order
    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    /// Number of commands
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Iterate commands in execution order
    pub fn iter(&self) -> std::slice::Iter<'_, RenderCommand> {
        self.commands.iter()
    }
}

impl<'a> IntoIterator for &'a RenderCommandList {
    type Item = &'a RenderCommand;
    type IntoIter = std::slice::Iter<'a, RenderCommand>;

    fn into_iter(self) -> Self::IntoIter {
        self.commands.iter()
    }
}

impl FromIterator<RenderCommand> for RenderCommandList {
    fn from_iter<I: IntoIterator<Item = RenderCommand>>(iter: I) -> Self {
        Self { commands: iter.into_iter().collect() }
    }
}

/// A compiled frame: ordered command lists plus the transient data they reference
#[derive(Debug, Default)]
pub struct RenderCommandBuffer {
    frame_index: u64,
    lists: Vec<RenderCommandList>,
    dynamic_meshes: Vec<Arc<RenderDynamicMesh>>,
}

impl RenderCommandBuffer {
    /// Create a buffer
    pub fn new(frame_index: u64, lists: Vec<RenderCommandList>, dynamic_meshes: Vec<Arc<RenderDynamicMesh>>) -> Self {
        Self { frame_index, lists, dynamic_meshes }
    }

    /// Index of the snapshot this buffer was compiled from
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Lists in execution order
    pub fn lists(&self) -> &[RenderCommandList] {
        &self.lists
    }

    /// Every command across every list, in execution order
    pub fn commands(&self) -> impl Iterator<Item = &RenderCommand> {
        self.lists.iter().flat_map(RenderCommandList::iter)
    }

    /// Total command count
    pub fn command_count(&self) -> usize {
        self.lists.iter().map(RenderCommandList::len).sum()
    }

    /// Dynamic meshes kept alive for the buffer's lifetime
    pub fn dynamic_meshes(&self) -> &[Arc<RenderDynamicMesh>] {
        &self.dynamic_meshes
    }
}
