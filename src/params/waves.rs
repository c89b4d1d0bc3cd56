//! Wave parameter set: the traveling waves and the global shaping knobs.

use glam::Vec2;

use crate::error::ConfigError;

/// One traveling wave.
///
/// Fields are private so that every descriptor in circulation has passed validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveDescriptor {
    /// Travel direction in plane space (need not be normalized)
    direction: Vec2,

    /// Distance between crests (plane units, > 0)
    wavelength: f32,

    /// Peak height before the amplitude gradient is applied (plane units, >= 0)
    base_amplitude: f32,

    /// Phase speed in radians per second; the sign picks the travel direction
    angular_speed: f32,
}

impl WaveDescriptor {
    /// Build a descriptor, rejecting values that would produce NaN or infinite displacement.
    ///
    /// A standalone descriptor has no position in a set, so its errors report `index: 0`;
    /// use `WaveSet::from_components` to get the offending wave's real index.
    pub fn new(
        direction: Vec2,
        wavelength: f32,
        base_amplitude: f32,
        angular_speed: f32,
    ) -> Result<Self, ConfigError> {
        Self::validated(0, direction, wavelength, base_amplitude, angular_speed)
    }

    fn validated(
        index: usize,
        direction: Vec2,
        wavelength: f32,
        base_amplitude: f32,
        angular_speed: f32,
    ) -> Result<Self, ConfigError> {
        if !wavelength.is_finite() || wavelength <= 0.0 {
            return Err(ConfigError::InvalidWavelength {
                index,
                value: wavelength,
            });
        }
        if !direction.is_finite() || direction.length_squared() <= f32::EPSILON {
            return Err(ConfigError::ZeroDirection {
                index,
                x: direction.x,
                y: direction.y,
            });
        }
        if !base_amplitude.is_finite() || base_amplitude < 0.0 {
            return Err(ConfigError::InvalidAmplitude {
                index,
                value: base_amplitude,
            });
        }
        if !angular_speed.is_finite() {
            return Err(ConfigError::InvalidSpeed {
                index,
                value: angular_speed,
            });
        }
        Ok(Self {
            direction,
            wavelength,
            base_amplitude,
            angular_speed,
        })
    }

    pub fn direction(&self) -> Vec2 {
        self.direction
    }

    pub fn wavelength(&self) -> f32 {
        self.wavelength
    }

    pub fn base_amplitude(&self) -> f32 {
        self.base_amplitude
    }

    pub fn angular_speed(&self) -> f32 {
        self.angular_speed
    }
}

/// Ordered, fixed-size collection of waves. Empty is legal and leaves the grid flat.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WaveSet {
    waves: Vec<WaveDescriptor>,
}

impl WaveSet {
    /// Build from raw `(direction, wavelength, amplitude, speed)` tuples.
    ///
    /// Errors carry the index of the offending wave.
    pub fn from_components(
        components: &[([f32; 2], f32, f32, f32)],
    ) -> Result<Self, ConfigError> {
        let waves = components
            .iter()
            .enumerate()
            .map(|(index, &(dir, wavelength, amplitude, speed))| {
                WaveDescriptor::validated(index, Vec2::from_array(dir), wavelength, amplitude, speed)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { waves })
    }

    pub fn new(waves: Vec<WaveDescriptor>) -> Self {
        Self { waves }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.waves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waves.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, WaveDescriptor> {
        self.waves.iter()
    }
}

impl<'a> IntoIterator for &'a WaveSet {
    type Item = &'a WaveDescriptor;
    type IntoIter = std::slice::Iter<'a, WaveDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.waves.iter()
    }
}

/// Amplitude multiplier interpolated by the surface's vertical UV coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmplitudeGradient {
    /// Multiplier at v = 0 (bottom edge of the plane)
    pub bottom_scale: f32,

    /// Multiplier at v = 1 (top edge of the plane)
    pub top_scale: f32,
}

impl AmplitudeGradient {
    pub fn scale_at(&self, v: f32) -> f32 {
        self.bottom_scale + (self.top_scale - self.bottom_scale) * v
    }
}

/// Global shaping shared by every wave of a set.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapingParameters {
    /// Horizontal-to-vertical displacement ratio in [0, 1].
    ///
    /// Near 0 the surface is a pure heightfield; toward 1 crests sharpen (Gerstner)
    /// and may self-intersect at high amplitude.
    steepness: f32,

    pub amplitude_gradient: AmplitudeGradient,
}

impl ShapingParameters {
    pub fn new(steepness: f32, amplitude_gradient: AmplitudeGradient) -> Result<Self, ConfigError> {
        if !(0.0..=1.0).contains(&steepness) {
            return Err(ConfigError::SteepnessOutOfRange(steepness));
        }
        let AmplitudeGradient {
            bottom_scale,
            top_scale,
        } = amplitude_gradient;
        if !bottom_scale.is_finite() || !top_scale.is_finite() {
            return Err(ConfigError::InvalidGradient {
                bottom: bottom_scale,
                top: top_scale,
            });
        }
        Ok(Self {
            steepness,
            amplitude_gradient,
        })
    }

    /// Steepness clamped to its declared range.
    pub fn steepness(&self) -> f32 {
        self.steepness.clamp(0.0, 1.0)
    }

    /// Copy with a different steepness (used by the `--steepness` override).
    pub fn with_steepness(self, steepness: f32) -> Result<Self, ConfigError> {
        Self::new(steepness, self.amplitude_gradient)
    }
}

impl Default for ShapingParameters {
    fn default() -> Self {
        Self {
            steepness: 0.0001, // Hero tuning: effectively a heightfield
            amplitude_gradient: AmplitudeGradient {
                bottom_scale: 0.5,
                top_scale: 3.0,
            },
        }
    }
}
