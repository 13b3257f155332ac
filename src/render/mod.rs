pub mod colors;
pub mod scene;
pub mod text;

use std::sync::Arc;

use anyhow::{anyhow, Result};
use vello::wgpu;
use vello::{AaConfig, AaSupport, RenderParams, Renderer, RendererOptions, Scene};
use winit::window::Window;

use colors::BACKGROUND;

/// Window surface plus the vello renderer drawing the heatmap into it.
pub struct RenderState {
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
    pub surface: wgpu::Surface<'static>,
    pub surface_config: wgpu::SurfaceConfiguration,
    pub renderer: Renderer,
    target: SceneTarget,
    blitter: wgpu::util::TextureBlitter,
}

impl RenderState {
    pub async fn new(window: Arc<Window>) -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance.create_surface(window.clone())?;
        let (adapter, device, queue) = request_gpu(&instance, &surface).await?;

        let format = pick_surface_format(&surface.get_capabilities(&adapter).formats)?;
        let size = window.inner_size();
        let surface_config = surface_config(format, size.width, size.height);
        surface.configure(&device, &surface_config);
        tracing::debug!(?format, width = surface_config.width, height = surface_config.height, "Surface configured");

        let renderer = heatmap_renderer(&device)?;
        let target = SceneTarget::new(&device, surface_config.width, surface_config.height);
        let blitter = wgpu::util::TextureBlitter::new(&device, format);

        Ok(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            surface,
            surface_config,
            renderer,
            target,
            blitter,
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.surface_config.width = width.max(1);
        self.surface_config.height = height.max(1);
        self.surface.configure(&self.device, &self.surface_config);
        self.target = SceneTarget::new(&self.device, self.surface_config.width, self.surface_config.height);
    }

    /// Draw `scene` offscreen, then copy it onto the next swapchain image.
    pub fn render(&mut self, scene: &Scene) -> Result<()> {
        let frame = self.surface.get_current_texture()?;

        self.renderer.render_to_texture(
            &self.device,
            &self.queue,
            scene,
            &self.target.view,
            &heatmap_params(self.surface_config.width, self.surface_config.height),
        )?;

        let frame_view = frame.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("heatmap present"),
            });
        self.blitter
            .copy(&self.device, &mut encoder, &self.target.view, &frame_view);
        self.queue.submit(Some(encoder.finish()));

        frame.present();
        Ok(())
    }
}

async fn request_gpu(
    instance: &wgpu::Instance,
    surface: &wgpu::Surface<'_>,
) -> Result<(wgpu::Adapter, wgpu::Device, wgpu::Queue)> {
    let adapter = instance
        .request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::default(),
            compatible_surface: Some(surface),
            force_fallback_adapter: false,
        })
        .await
        .ok_or_else(|| anyhow!("No GPU adapter can present to this window"))?;
    tracing::info!("Using adapter: {:?}", adapter.get_info().name);

    let (device, queue) = adapter
        .request_device(&wgpu::DeviceDescriptor::default(), None)
        .await?;
    Ok((adapter, device, queue))
}

/// Prefer a non-sRGB 8-bit swapchain: vello's output is already sRGB encoded.
pub fn pick_surface_format(formats: &[wgpu::TextureFormat]) -> Result<wgpu::TextureFormat> {
    formats
        .iter()
        .copied()
        .find(|f| {
            matches!(
                f,
                wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Bgra8Unorm
            )
        })
        .or_else(|| formats.first().copied())
        .ok_or_else(|| anyhow!("Surface reported no supported formats"))
}

pub fn surface_config(format: wgpu::TextureFormat, width: u32, height: u32) -> wgpu::SurfaceConfiguration {
    wgpu::SurfaceConfiguration {
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        format,
        width: width.max(1),
        height: height.max(1),
        present_mode: wgpu::PresentMode::AutoVsync,
        alpha_mode: wgpu::CompositeAlphaMode::Auto,
        view_formats: vec![],
        desired_maximum_frame_latency: 2,
    }
}

// Heat cells and glyph images are axis-aligned; area AA is enough.
fn heatmap_renderer(device: &wgpu::Device) -> Result<Renderer> {
    let renderer = Renderer::new(
        device,
        RendererOptions {
            use_cpu: false,
            antialiasing_support: AaSupport::area_only(),
            num_init_threads: None,
            pipeline_cache: None,
        },
    )?;
    Ok(renderer)
}

fn heatmap_params(width: u32, height: u32) -> RenderParams {
    RenderParams {
        base_color: BACKGROUND.to_peniko(),
        width,
        height,
        antialiasing_method: AaConfig::Area,
    }
}

/// Rgba8Unorm storage image vello writes into before the blit.
struct SceneTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl SceneTarget {
    fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("heatmap offscreen"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::STORAGE_BINDING
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { _texture: texture, view }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vello::wgpu::TextureFormat;

    #[test]
    fn prefers_linear_swapchain_format() {
        let formats = [TextureFormat::Bgra8UnormSrgb, TextureFormat::Bgra8Unorm];
        assert_eq!(pick_surface_format(&formats).unwrap(), TextureFormat::Bgra8Unorm);

        let only_srgb = [TextureFormat::Rgba8UnormSrgb];
        assert_eq!(pick_surface_format(&only_srgb).unwrap(), TextureFormat::Rgba8UnormSrgb);

        assert!(pick_surface_format(&[]).is_err());
    }

    #[test]
    fn surface_config_never_has_zero_extent() {
        let config = surface_config(TextureFormat::Rgba8Unorm, 0, 0);
        assert_eq!((config.width, config.height), (1, 1));
        assert_eq!(config.usage, wgpu::TextureUsages::RENDER_ATTACHMENT);
    }
}
