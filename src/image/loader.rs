use crate::Result;
use image::{DynamicImage, ImageFormat, RgbImage};

pub struct ImageLoader;

impl ImageLoader {
    /// 从内存字节解码图像（格式自动识别）
    pub fn from_bytes(bytes: &[u8]) -> Result<DynamicImage> {
        if let Some(format) = Self::detect_format(bytes) {
            tracing::debug!("Decoding {:?} image: {} bytes", format, bytes.len());
        }

        let image = image::load_from_memory(bytes)?;

        Ok(image)
    }

    /// 检测图像格式
    pub fn detect_format(bytes: &[u8]) -> Option<ImageFormat> {
        image::guess_format(bytes).ok()
    }

    /// 统一转换为三通道RGB
    pub fn to_rgb(image: DynamicImage) -> RgbImage {
        match image {
            DynamicImage::ImageRgb8(rgb) => rgb,
            other => {
                tracing::debug!("Converting {:?} image to RGB", other.color());
                other.to_rgb8()
            }
        }
    }
}
