//! Backend-agnostic data layout descriptions shared by resources and devices

use serde::{Deserialize, Serialize};

use crate::foundation::math::Resolution;

/// A single attribute in an interleaved vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VertexElement {
    /// `vec4` position
    Position4,
    /// `vec3` normal
    Normal3,
    /// `vec2` texture coordinate
    Uv2,
    /// Four normalised bytes of colour
    Colour4Bytes,
    /// `vec4` skinning weights
    Weights4,
    /// Four byte joint indices
    JointIndices4Bytes,
}

impl VertexElement {
    /// Size of the element in bytes
    pub fn size(self) -> usize {
        match self {
            VertexElement::Position4 | VertexElement::Weights4 => 16,
            VertexElement::Normal3 => 12,
            VertexElement::Uv2 => 8,
            VertexElement::Colour4Bytes | VertexElement::JointIndices4Bytes => 4,
        }
    }

    /// Attribute name the shader is expected to declare
    pub fn attribute_name(self) -> &'static str {
        match self {
            VertexElement::Position4 => "a_position",
            VertexElement::Normal3 => "a_normal",
            VertexElement::Uv2 => "a_texCoord",
            VertexElement::Colour4Bytes => "a_colour",
            VertexElement::Weights4 => "a_weights",
            VertexElement::JointIndices4Bytes => "a_jointIndices",
        }
    }
}

/// Ordered list of interleaved vertex attributes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VertexFormat {
    elements: Vec<VertexElement>,
}

impl VertexFormat {
    /// Create a format from its elements
    pub fn new(elements: Vec<VertexElement>) -> Self {
        Self { elements }
    }

    /// Position, normal and texture coordinate
    pub fn static_mesh() -> Self {
        Self::new(vec![VertexElement::Position4, VertexElement::Normal3, VertexElement::Uv2])
    }

    /// Static mesh layout plus skinning weights and joint indices
    pub fn animated_mesh() -> Self {
        Self::new(vec![
            VertexElement::Position4,
            VertexElement::Normal3,
            VertexElement::Uv2,
            VertexElement::Weights4,
            VertexElement::JointIndices4Bytes,
        ])
    }

    /// Position, texture coordinate and vertex colour
    pub fn sprite() -> Self {
        Self::new(vec![VertexElement::Position4, VertexElement::Uv2, VertexElement::Colour4Bytes])
    }

    /// Elements in declaration order
    pub fn elements(&self) -> &[VertexElement] {
        &self.elements
    }

    /// Size of one vertex in bytes
    pub fn stride(&self) -> usize {
        self.elements.iter().map(|element| element.size()).sum()
    }
}

/// Primitive topology used when drawing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PolygonType {
    /// Independent triangles
    Triangle,
    /// Triangle strip
    TriangleStrip,
    /// Independent line segments
    Line,
}

/// Width of index buffer entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IndexFormat {
    /// 16-bit unsigned indices
    Short,
}

impl IndexFormat {
    /// Size of one index in bytes
    pub fn size(self) -> usize {
        match self {
            IndexFormat::Short => 2,
        }
    }
}

/// Everything a device needs to interpret a mesh's raw buffers
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MeshLayout {
    /// Interleaved vertex layout
    pub vertex_format: VertexFormat,
    /// Primitive topology
    pub polygon_type: PolygonType,
    /// Index width
    pub index_format: IndexFormat,
}

impl MeshLayout {
    /// Indexed triangle list of static mesh vertices
    pub fn static_triangles() -> Self {
        Self {
            vertex_format: VertexFormat::static_mesh(),
            polygon_type: PolygonType::Triangle,
            index_format: IndexFormat::Short,
        }
    }
}

/// Pixel format of a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageFormat {
    /// 8 bits per channel RGBA
    Rgba8888,
    /// 8 bits per channel RGB
    Rgb888,
    /// Single 8-bit luminance channel
    Lum8,
    /// 16-bit depth
    Depth16,
    /// 32-bit depth
    Depth32,
}

impl ImageFormat {
    /// Bytes per pixel
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            ImageFormat::Rgba8888 | ImageFormat::Depth32 => 4,
            ImageFormat::Rgb888 => 3,
            ImageFormat::Depth16 => 2,
            ImageFormat::Lum8 => 1,
        }
    }

    /// Whether the format stores depth rather than colour
    pub fn is_depth(self) -> bool {
        matches!(self, ImageFormat::Depth16 | ImageFormat::Depth32)
    }
}

/// Texture sampling filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterMode {
    /// Nearest texel
    Nearest,
    /// Bilinear
    Bilinear,
}

/// Texture addressing outside `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WrapMode {
    /// Clamp to edge
    Clamp,
    /// Repeat
    Repeat,
}

/// Immutable description of a texture
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TextureDescriptor {
    /// Size in pixels
    pub dimensions: Resolution,
    /// Pixel format
    pub format: ImageFormat,
    /// Sampling filter
    pub filter_mode: FilterMode,
    /// Wrap along S
    pub wrap_s: WrapMode,
    /// Wrap along T
    pub wrap_t: WrapMode,
    /// Whether the device should build a mip chain
    pub mipmapped: bool,
}

impl TextureDescriptor {
    /// Clamped, bilinear, non-mipmapped texture
    pub fn new(dimensions: Resolution, format: ImageFormat) -> Self {
        Self {
            dimensions,
            format,
            filter_mode: FilterMode::Bilinear,
            wrap_s: WrapMode::Clamp,
            wrap_t: WrapMode::Clamp,
            mipmapped: false,
        }
    }

    /// Expected byte length of tightly packed level-0 pixel data
    pub fn data_size(&self) -> usize {
        self.dimensions.width as usize * self.dimensions.height as usize * self.format.bytes_per_pixel()
    }
}

/// Blend factor applied to source or destination colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlendMode {
    /// 0
    Zero,
    /// 1
    One,
    /// Source colour
    SourceCol,
    /// 1 - source colour
    OneMinusSourceCol,
    /// Source alpha
    SourceAlpha,
    /// 1 - source alpha
    OneMinusSourceAlpha,
    /// Destination alpha
    DestAlpha,
    /// 1 - destination alpha
    OneMinusDestAlpha,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_format_strides() {
        assert_eq!(VertexFormat::static_mesh().stride(), 36);
        assert_eq!(VertexFormat::animated_mesh().stride(), 56);
        assert_eq!(VertexFormat::sprite().stride(), 28);
    }

    #[test]
    fn test_texture_data_size() {
        let descriptor = TextureDescriptor::new(Resolution::new(4, 2), ImageFormat::Rgb888);
        assert_eq!(descriptor.data_size(), 24);
        assert!(!descriptor.format.is_depth());
    }
}
