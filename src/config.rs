//! Showcase configuration.
//!
//! [`ShowcaseConfig::default`] reproduces the original gallery: four remote GLB
//! files, a narrow 10° camera far down the +Z axis and a white backdrop.
//! The values are applied to the [`Context`](crate::context::Context) once in
//! `on_init`.

/// Everything that shapes the showcase scene.
#[derive(Clone, Debug)]
pub struct ShowcaseConfig {
    /// Asset locations in request order. Slot positions follow this order.
    pub assets: Vec<String>,
    /// Horizontal distance between neighbouring slots in world units.
    pub spacing: f32,
    /// Number of empty spacing units inserted after the first slot.
    pub gap_after_first: usize,
    pub camera: CameraConfig,
    pub clear_colour: wgpu::Color,
    pub lighting: LightingConfig,
    pub tilt: TiltConfig,
}

#[derive(Clone, Debug)]
pub struct CameraConfig {
    pub position: [f32; 3],
    /// Vertical field of view.
    pub fovy_degrees: f32,
    pub znear: f32,
    pub zfar: f32,
}

#[derive(Clone, Debug)]
pub struct LightingConfig {
    pub ambient_colour: [f32; 3],
    pub ambient_intensity: f32,
    pub directional_colour: [f32; 3],
    pub directional_intensity: f32,
    /// The directional light shines from here toward the origin.
    pub directional_position: [f32; 3],
}

/// Gains and easing factors of the cursor tilt.
#[derive(Clone, Debug)]
pub struct TiltConfig {
    pub pitch_gain: f32,
    pub yaw_gain: f32,
    pub base_delay: f32,
    /// Added to `base_delay` once per gallery position.
    pub delay_step: f32,
}

impl TiltConfig {
    /// Easing factor for the slot at gallery position `index`.
    pub fn delay(&self, index: usize) -> f32 {
        self.base_delay + index as f32 * self.delay_step
    }
}

pub const DEFAULT_ASSETS: [&str; 4] = [
    "https://file.garden/aDkw2WzQiQyHQO4K/Four_mockup/m1n.glb",
    "https://file.garden/aDkw2WzQiQyHQO4K/Four_mockup/m2.glb",
    "https://file.garden/aDkw2WzQiQyHQO4K/Four_mockup/m3n2.glb",
    "https://file.garden/aDkw2WzQiQyHQO4K/Four_mockup/m4n.glb",
];

impl Default for ShowcaseConfig {
    fn default() -> Self {
        Self {
            assets: DEFAULT_ASSETS.iter().map(|url| url.to_string()).collect(),
            spacing: 10.0,
            gap_after_first: 1,
            camera: CameraConfig::default(),
            clear_colour: wgpu::Color::WHITE,
            lighting: LightingConfig::default(),
            tilt: TiltConfig::default(),
        }
    }
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 4.0, 170.0],
            fovy_degrees: 10.0,
            znear: 1.0,
            zfar: 2000.0,
        }
    }
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            ambient_colour: [1.0; 3],
            ambient_intensity: 0.6,
            directional_colour: [1.0; 3],
            directional_intensity: 0.8,
            directional_position: [5.0, 5.0, 5.0],
        }
    }
}

impl Default for TiltConfig {
    fn default() -> Self {
        Self {
            pitch_gain: 0.5,
            yaw_gain: 1.4,
            base_delay: 0.04,
            delay_step: 0.02,
        }
    }
}

impl ShowcaseConfig {
    /// Default scene with a different asset list.
    pub fn with_assets<I, S>(assets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            assets: assets.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }
}
