//! GPU textures and texture creation utilities.
//!
//! This module provides [`Texture`], a wrapper around WGPU GPU texture resources,
//! and helper methods for creating depth and multisample targets and for
//! uploading decoded images with a full mip chain.

use anyhow::*;
use image::{Rgba, Rgba32FImage, RgbaImage, imageops::FilterType};

/// A GPU texture with a view and optional sampler.
///
/// Wraps WGPU texture objects along with associated views and samplers.
/// Material textures are created via [`from_rgba`](Self::from_rgba), render
/// targets via [`create_depth_texture`](Self::create_depth_texture) and
/// [`create_msaa_target`](Self::create_msaa_target).
#[derive(Clone, Debug)]
pub struct Texture {
    #[allow(unused)]
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub sampler: Option<wgpu::Sampler>,
}

/// Sampling quality applied to material textures after they are decoded.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextureOptions {
    pub generate_mipmaps: bool,
    /// 1 disables anisotropic filtering. wgpu accepts up to 16.
    pub anisotropy: u16,
    /// Colour textures are stored as sRGB and decoded to linear on sampling.
    pub srgb: bool,
}

impl TextureOptions {
    /// Mipmaps, trilinear filtering and the highest anisotropy the adapter offers.
    pub fn sharp(max_anisotropy: u16) -> Self {
        Self {
            generate_mipmaps: true,
            anisotropy: max_anisotropy.clamp(1, 16),
            srgb: true,
        }
    }
}

impl Default for TextureOptions {
    fn default() -> Self {
        Self {
            generate_mipmaps: false,
            anisotropy: 1,
            srgb: true,
        }
    }
}

/// Number of levels in a full mip chain down to 1x1.
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// Triangle-filtered mip chain, level 0 first.
///
/// With `srgb` the colour channels are averaged in linear light so that
/// distant levels keep the brightness of the base image. Alpha is always
/// linear.
pub fn build_mip_chain(base: &RgbaImage, levels: u32, srgb: bool) -> Vec<RgbaImage> {
    let mut chain = vec![base.clone()];
    if levels <= 1 {
        return chain;
    }
    let mut linear = to_linear(base, srgb);
    for _ in 1..levels {
        let width = (linear.width() / 2).max(1);
        let height = (linear.height() / 2).max(1);
        linear = image::imageops::resize(&linear, width, height, FilterType::Triangle);
        chain.push(from_linear(&linear, srgb));
    }
    chain
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(c: f32) -> f32 {
    if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

fn to_linear(img: &RgbaImage, srgb: bool) -> Rgba32FImage {
    Rgba32FImage::from_fn(img.width(), img.height(), |x, y| {
        let [r, g, b, a] = img.get_pixel(x, y).0.map(|c| c as f32 / 255.0);
        let decode = |c: f32| if srgb { srgb_to_linear(c) } else { c };
        Rgba([decode(r), decode(g), decode(b), a])
    })
}

fn from_linear(img: &Rgba32FImage, srgb: bool) -> RgbaImage {
    RgbaImage::from_fn(img.width(), img.height(), |x, y| {
        let [r, g, b, a] = img.get_pixel(x, y).0;
        let encode = |c: f32| if srgb { linear_to_srgb(c) } else { c };
        let quantize = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
        Rgba([
            quantize(encode(r)),
            quantize(encode(g)),
            quantize(encode(b)),
            quantize(a),
        ])
    })
}

impl Texture {
    /// Standard depth buffer texture format (32-bit float).
    pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Create a depth texture for depth-testing during rendering.
    ///
    /// # Arguments
    ///
    /// * `size` is [width, height] of the texture in pixels
    /// * `sample_count` has to match the colour target of the render pass
    /// * `label` is used as a debug label for the GPU resource
    pub fn create_depth_texture(
        device: &wgpu::Device,
        size: [u32; 2],
        sample_count: u32,
        label: &str,
    ) -> Self {
        let size = wgpu::Extent3d {
            width: size[0].max(1),
            height: size[1].max(1),
            depth_or_array_layers: 1,
        };
        let desc = wgpu::TextureDescriptor {
            label: Some(label),
            size,
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format: Self::DEPTH_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[Self::DEPTH_FORMAT],
        };
        let texture = device.create_texture(&desc);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            sampler: None,
        }
    }

    /// Multisampled colour target that resolves into the surface texture.
    pub fn create_msaa_target(
        device: &wgpu::Device,
        config: &wgpu::SurfaceConfiguration,
        sample_count: u32,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("msaa colour target"),
            size: wgpu::Extent3d {
                width: config.width.max(1),
                height: config.height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count,
            dimension: wgpu::TextureDimension::D2,
            format: config.format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            sampler: None,
        }
    }

    /// 1x1 texture of a single colour. Used for materials without a base colour map.
    pub fn solid(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        rgba: [u8; 4],
        label: &str,
    ) -> Result<Self> {
        let img = RgbaImage::from_pixel(1, 1, image::Rgba(rgba));
        Self::from_rgba(device, queue, &img, Some(label), TextureOptions::default())
    }

    /// Upload a decoded image.
    ///
    /// With `generate_mipmaps` every level of the chain is written, and the
    /// sampler filters linearly between levels.
    pub fn from_rgba(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        img: &RgbaImage,
        label: Option<&str>,
        options: TextureOptions,
    ) -> Result<Self> {
        let (width, height) = img.dimensions();
        if width == 0 || height == 0 {
            bail!("texture {:?} has no pixels", label);
        }
        let levels = if options.generate_mipmaps {
            mip_level_count(width, height)
        } else {
            1
        };

        let size = wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        };
        let format = if options.srgb {
            wgpu::TextureFormat::Rgba8UnormSrgb
        } else {
            wgpu::TextureFormat::Rgba8Unorm
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size,
            mip_level_count: levels,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        for (level, mip) in build_mip_chain(img, levels, options.srgb).iter().enumerate() {
            let (mip_width, mip_height) = mip.dimensions();
            queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    aspect: wgpu::TextureAspect::All,
                    texture: &texture,
                    mip_level: level as u32,
                    origin: wgpu::Origin3d::ZERO,
                },
                mip,
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * mip_width),
                    rows_per_image: Some(mip_height),
                },
                wgpu::Extent3d {
                    width: mip_width,
                    height: mip_height,
                    depth_or_array_layers: 1,
                },
            );
        }

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = Some(create_sampler(device, options));

        Ok(Self {
            texture,
            view,
            sampler,
        })
    }
}

pub fn create_sampler(device: &wgpu::Device, options: TextureOptions) -> wgpu::Sampler {
    // Anisotropy requires linear filtering on all three axes.
    let mipmap_filter = if options.generate_mipmaps || options.anisotropy > 1 {
        wgpu::MipmapFilterMode::Linear
    } else {
        wgpu::MipmapFilterMode::Nearest
    };
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("material sampler"),
        address_mode_u: wgpu::AddressMode::Repeat,
        address_mode_v: wgpu::AddressMode::Repeat,
        address_mode_w: wgpu::AddressMode::Repeat,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter,
        anisotropy_clamp: options.anisotropy.clamp(1, 16),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mip_count_matches_largest_side() {
        assert_eq!(mip_level_count(1, 1), 1);
        assert_eq!(mip_level_count(256, 256), 9);
        assert_eq!(mip_level_count(1024, 512), 11);
        assert_eq!(mip_level_count(300, 17), 9);
    }

    #[test]
    fn mip_chain_halves_down_to_one_pixel() {
        let base = RgbaImage::from_pixel(8, 2, image::Rgba([200, 10, 10, 255]));
        let chain = build_mip_chain(&base, mip_level_count(8, 2), true);
        let sizes: Vec<_> = chain.iter().map(|level| level.dimensions()).collect();
        assert_eq!(sizes, vec![(8, 2), (4, 1), (2, 1), (1, 1)]);
        assert_eq!(chain[3].get_pixel(0, 0), &image::Rgba([200, 10, 10, 255]));
    }

    #[test]
    fn srgb_levels_average_in_linear_light() {
        // Alternating black and white columns
        let base = RgbaImage::from_fn(2, 1, |x, _| {
            let v = if x == 0 { 0 } else { 255 };
            image::Rgba([v, v, v, 255])
        });
        let srgb = build_mip_chain(&base, 2, true);
        let linear = build_mip_chain(&base, 2, false);
        // Half linear intensity is about 188 in sRGB, not the 128 a byte average gives
        let srgb_grey = srgb[1].get_pixel(0, 0).0[0];
        let linear_grey = linear[1].get_pixel(0, 0).0[0];
        assert!((185..=190).contains(&srgb_grey), "{srgb_grey}");
        assert!((126..=129).contains(&linear_grey), "{linear_grey}");
        assert_eq!(srgb[1].get_pixel(0, 0).0[3], 255);
    }

    #[test]
    fn sharp_options_cap_anisotropy() {
        assert_eq!(TextureOptions::sharp(64).anisotropy, 16);
        assert_eq!(TextureOptions::sharp(0).anisotropy, 1);
        assert!(TextureOptions::sharp(16).generate_mipmaps);
    }
}
