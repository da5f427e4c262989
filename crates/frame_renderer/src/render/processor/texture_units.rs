//! Texture unit allocation for material and shadow map textures
//!
//! Units are handed out from zero each time a material is applied. The
//! manager remembers what each unit holds so rebinding the same texture to
//! the same unit never reaches the device.

use crate::render::api::{GraphicsDevice, TextureHandle};

/// Allocates texture units and elides redundant binds
#[derive(Debug)]
pub struct TextureUnitManager {
    bound: Vec<Option<TextureHandle>>,
    next_unit: usize,
}

impl TextureUnitManager {
    /// Create a manager for `max_units` units
    pub fn new(max_units: u32) -> Self {
        Self {
            bound: vec![None; max_units as usize],
            next_unit: 0,
        }
    }

    /// Number of units available
    pub fn max_units(&self) -> usize {
        self.bound.len()
    }

    /// Start a new allocation from unit zero, keeping remembered bindings
    pub fn begin_material(&mut self) {
        self.next_unit = 0;
    }

    /// Bind a texture to the next free unit and return the unit.
    ///
    /// Returns whether the device was actually called alongside the unit.
    ///
    /// # Panics
    /// Running out of units means a material references more textures than
    /// the configured limit.
    pub fn bind<D: GraphicsDevice + ?Sized>(&mut self, device: &mut D, texture: TextureHandle) -> (u32, bool) {
        let unit = self.next_unit;
        assert!(
            unit < self.bound.len(),
            "Ran out of texture units: only {} are available",
            self.bound.len()
        );
        self.next_unit += 1;

        // Bounded by max_units, which is a u32.
        let unit_index = u32::try_from(unit).unwrap_or(u32::MAX);
        if self.bound[unit] == Some(texture) {
            return (unit_index, false);
        }

        device.bind_texture(unit_index, texture);
        self.bound[unit] = Some(texture);
        (unit_index, true)
    }

    /// Forget every remembered binding, forcing the next binds to reach the device
    pub fn invalidate(&mut self) {
        self.bound.iter_mut().for_each(|slot| *slot = None);
        self.next_unit = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Resolution;
    use crate::render::backends::RecordingDevice;
    use crate::render::resources::{ImageFormat, RenderTexture, TextureDescriptor};

    fn texture(device: &mut RecordingDevice) -> TextureHandle {
        let texture = RenderTexture::attachment(TextureDescriptor::new(Resolution::new(4, 4), ImageFormat::Rgba8888));
        device.create_texture(&texture).unwrap()
    }

    #[test]
    fn test_units_allocated_from_zero_per_material() {
        let mut device = RecordingDevice::new();
        let (a, b, c) = (texture(&mut device), texture(&mut device), texture(&mut device));
        let mut units = TextureUnitManager::new(4);

        units.begin_material();
        assert_eq!(units.bind(&mut device, a), (0, true));
        assert_eq!(units.bind(&mut device, b), (1, true));

        units.begin_material();
        assert_eq!(units.bind(&mut device, a), (0, false));
        assert_eq!(units.bind(&mut device, c), (1, true));
    }

    #[test]
    fn test_invalidate_forces_rebind() {
        let mut device = RecordingDevice::new();
        let a = texture(&mut device);
        let mut units = TextureUnitManager::new(1);
        units.bind(&mut device, a);
        units.invalidate();
        assert_eq!(units.bind(&mut device, a), (0, true));
    }

    #[test]
    #[should_panic(expected = "Ran out of texture units")]
    fn test_exhausting_units_panics() {
        let mut device = RecordingDevice::new();
        let (a, b) = (texture(&mut device), texture(&mut device));
        let mut units = TextureUnitManager::new(1);
        units.bind(&mut device, a);
        units.bind(&mut device, b);
    }
}
