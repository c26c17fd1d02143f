//! Dynamically updated feed texture
//!
//! One RGBA8 texture holds the externally composited pixel buffer. It is
//! reallocated only when the incoming dimensions change; otherwise each
//! tick is an in-place sub-region write. The caller's row stride is
//! honored exactly and may exceed `width * 4`.

/// What an incoming pixel buffer requires of the texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdatePlan {
    /// Nothing to do (empty or inconsistent input); texture unchanged
    Skip,
    /// Dimensions changed; allocate a new texture, then write
    Reallocate,
    /// Same dimensions; in-place write
    Write,
}

/// Decide how to apply an incoming buffer, independent of any GPU state.
pub fn plan_update(
    current: (u32, u32),
    width: u32,
    height: u32,
    stride: u32,
    pixel_len: usize,
) -> UpdatePlan {
    if pixel_len == 0 || width == 0 || height == 0 {
        return UpdatePlan::Skip;
    }
    // Widen before multiplying; the dimensions are caller-controlled
    let row_size = width as u64 * 4;
    if (stride as u64) < row_size {
        log::warn!("feed stride {stride} shorter than row size {row_size}");
        return UpdatePlan::Skip;
    }
    let needed = stride as u64 * height as u64;
    if (pixel_len as u64) < needed {
        log::warn!("feed buffer holds {pixel_len} bytes, needs {needed}");
        return UpdatePlan::Skip;
    }
    if current != (width, height) {
        UpdatePlan::Reallocate
    } else {
        UpdatePlan::Write
    }
}

pub struct FeedTexture {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    sampler: wgpu::Sampler,
    size: (u32, u32),
}

fn create_texture(device: &wgpu::Device, width: u32, height: u32) -> wgpu::Texture {
    device.create_texture(&wgpu::TextureDescriptor {
        label: Some("feed_texture"),
        size: wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    })
}

impl FeedTexture {
    /// Starts as a single white texel so meshes draw before the first
    /// feed arrives.
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let texture = create_texture(device, 1, 1);
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("feed_sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let this = Self {
            texture,
            view,
            sampler,
            size: (1, 1),
        };
        this.write(queue, &[0xFF; 4], 1, 1, 4);
        this
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn sampler(&self) -> &wgpu::Sampler {
        &self.sampler
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    fn write(&self, queue: &wgpu::Queue, pixels: &[u8], width: u32, height: u32, stride: u32) {
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(stride),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
    }

    /// Apply one incoming pixel buffer. Returns true when the texture
    /// was reallocated and dependent bind groups must be rebuilt.
    pub fn update(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        pixels: &[u8],
        width: u32,
        height: u32,
        stride: u32,
    ) -> bool {
        match plan_update(self.size, width, height, stride, pixels.len()) {
            UpdatePlan::Skip => false,
            UpdatePlan::Write => {
                self.write(queue, pixels, width, height, stride);
                false
            }
            UpdatePlan::Reallocate => {
                log::info!("feed texture resized to {width}x{height}");
                self.texture = create_texture(device, width, height);
                self.view = self
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default());
                self.size = (width, height);
                self.write(queue, pixels, width, height, stride);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_buffer_is_noop() {
        assert_eq!(plan_update((800, 600), 800, 600, 3200, 0), UpdatePlan::Skip);
    }

    #[test]
    fn test_zero_dimensions_skipped() {
        assert_eq!(plan_update((1, 1), 0, 600, 3200, 4096), UpdatePlan::Skip);
        assert_eq!(plan_update((1, 1), 800, 0, 3200, 4096), UpdatePlan::Skip);
    }

    #[test]
    fn test_short_buffer_skipped() {
        // 800x600 at stride 3200 needs 1_920_000 bytes
        assert_eq!(
            plan_update((800, 600), 800, 600, 3200, 1_000_000),
            UpdatePlan::Skip
        );
    }

    #[test]
    fn test_stride_below_row_size_skipped() {
        assert_eq!(
            plan_update((800, 600), 800, 600, 3000, 1_920_000),
            UpdatePlan::Skip
        );
    }

    #[test]
    fn test_huge_width_skipped_without_overflow() {
        // width * 4 exceeds u32; the comparison must not wrap
        assert_eq!(
            plan_update((1, 1), u32::MAX, 1, u32::MAX, 1 << 20),
            UpdatePlan::Skip
        );
    }

    #[test]
    fn test_same_dimensions_write_in_place() {
        assert_eq!(
            plan_update((800, 600), 800, 600, 3200, 1_920_000),
            UpdatePlan::Write
        );
    }

    #[test]
    fn test_padded_stride_accepted() {
        // Stride above width*4 is padding, honored as-is
        assert_eq!(
            plan_update((800, 600), 800, 600, 3328, 3328 * 600),
            UpdatePlan::Write
        );
    }

    #[test]
    fn test_dimension_change_reallocates() {
        assert_eq!(
            plan_update((800, 600), 1024, 768, 4096, 4096 * 768),
            UpdatePlan::Reallocate
        );
    }
}
