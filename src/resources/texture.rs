use anyhow::Context as _;
use image::RgbaImage;

use crate::data_structures::material::MapSlot;

/// Binding of the first material map; maps follow in [`MapSlot::ALL`] order.
pub const FIRST_MAP_BINDING: u32 = 2;

/**
 * Material layout: uniform at 0, one shared sampler at 1, then one texture per
 * map slot. The vertex stage reads the displacement map, everything else is
 * fragment only.
 */
pub fn material_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    let mut entries = vec![
        wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        },
        wgpu::BindGroupLayoutEntry {
            binding: 1,
            visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        },
    ];
    for (i, slot) in MapSlot::ALL.iter().enumerate() {
        let visibility = if *slot == MapSlot::Displacement {
            wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT
        } else {
            wgpu::ShaderStages::FRAGMENT
        };
        entries.push(wgpu::BindGroupLayoutEntry {
            binding: FIRST_MAP_BINDING + i as u32,
            visibility,
            ty: wgpu::BindingType::Texture {
                multisampled: false,
                view_dimension: wgpu::TextureViewDimension::D2,
                sample_type: wgpu::TextureSampleType::Float { filterable: true },
            },
            count: None,
        });
    }
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &entries,
        label: Some("material_bind_group_layout"),
    })
}

#[cfg(target_arch = "wasm32")]
fn format_url(root: &str, file_name: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().context("no window")?;
    let origin = window
        .location()
        .origin()
        .map_err(|_| anyhow::anyhow!("page has no origin"))?;
    let base = reqwest::Url::parse(&format!("{}/{}/", origin, root.trim_matches('/')))?;
    Ok(base.join(file_name)?)
}

pub async fn load_binary(root: &str, file_name: &str) -> anyhow::Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(root, file_name)?;
        let response = reqwest::get(url).await?.error_for_status()?;
        response.bytes().await?.to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        let path = std::path::Path::new(root).join(file_name);
        tokio::fs::read(&path)
            .await
            .with_context(|| format!("reading {}", path.display()))?
    };

    Ok(data)
}

/// Reads `file_name` below `root` and decodes it to RGBA8.
pub async fn fetch_image(root: String, file_name: String) -> anyhow::Result<RgbaImage> {
    let data = load_binary(&root, &file_name).await?;
    #[cfg(not(target_arch = "wasm32"))]
    let img = tokio::task::spawn_blocking(move || decode(&data)).await??;
    #[cfg(target_arch = "wasm32")]
    let img = decode(&data)?;
    Ok(img)
}

pub fn decode(bytes: &[u8]) -> anyhow::Result<RgbaImage> {
    let img = image::load_from_memory(bytes).context("decoding image")?;
    Ok(img.to_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode(b"definitely not a jpeg").is_err());
    }

    #[test]
    fn decode_reads_png() {
        let img = RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]));
        let mut bytes = std::io::Cursor::new(Vec::new());
        img.write_to(&mut bytes, image::ImageFormat::Png).expect("encode");
        let decoded = decode(bytes.get_ref()).expect("decode");
        assert_eq!(decoded.dimensions(), (3, 2));
        assert_eq!(decoded.get_pixel(1, 1).0, [10, 20, 30, 255]);
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[tokio::test]
    async fn missing_file_is_an_error() {
        let result = fetch_image("does-not-exist".into(), "nothing.jpg".into()).await;
        assert!(result.is_err());
    }
}
