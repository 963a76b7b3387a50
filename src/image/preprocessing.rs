use crate::image::ImageLoader;
use crate::utils::error::ServeError;
use crate::Result;
use image::imageops::FilterType;
use image::DynamicImage;
use ndarray::Array4;
use serde::Deserialize;
use std::path::Path;

/// 预处理配置，对应模型目录下的 preprocessor_config.json
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PreprocessorConfig {
    pub do_resize: bool,
    pub size: SizeSpec,
    /// PIL重采样编号：0=nearest, 1=lanczos, 2=bilinear, 3=bicubic
    pub resample: u8,
    pub do_rescale: bool,
    pub rescale_factor: f32,
    pub do_normalize: bool,
    pub image_mean: Vec<f32>,
    pub image_std: Vec<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SizeSpec {
    Dims { height: u32, width: u32 },
    ShortestEdge { shortest_edge: u32 },
    Edge(u32),
}

impl SizeSpec {
    /// (height, width)
    pub fn dims(&self) -> (u32, u32) {
        match *self {
            SizeSpec::Dims { height, width } => (height, width),
            SizeSpec::ShortestEdge { shortest_edge } => (shortest_edge, shortest_edge),
            SizeSpec::Edge(edge) => (edge, edge),
        }
    }
}

impl Default for PreprocessorConfig {
    fn default() -> Self {
        // ViTImageProcessor 默认参数
        Self {
            do_resize: true,
            size: SizeSpec::Dims { height: 224, width: 224 },
            resample: 2,
            do_rescale: true,
            rescale_factor: 1.0 / 255.0,
            do_normalize: true,
            image_mean: vec![0.5, 0.5, 0.5],
            image_std: vec![0.5, 0.5, 0.5],
        }
    }
}

impl PreprocessorConfig {
    /// 读取配置文件；文件不存在时使用默认参数
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::warn!(
                "Preprocessor config not found at {}, using ViT defaults",
                path.display()
            );
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    fn filter(&self) -> FilterType {
        match self.resample {
            0 => FilterType::Nearest,
            1 => FilterType::Lanczos3,
            3 => FilterType::CatmullRom,
            _ => FilterType::Triangle,
        }
    }
}

/// 将解码后的图像转换为模型输入张量 [1, 3, H, W]
#[derive(Debug, Clone)]
pub struct ImagePreprocessor {
    config: PreprocessorConfig,
    mean: [f32; 3],
    std: [f32; 3],
}

impl ImagePreprocessor {
    pub fn new(config: PreprocessorConfig) -> Result<Self> {
        let mean = channel_triplet("image_mean", &config.image_mean)?;
        let std = channel_triplet("image_std", &config.image_std)?;

        if std.iter().any(|s| *s == 0.0) {
            return Err(ServeError::Config("image_std must not contain zero".to_string()));
        }

        let (height, width) = config.size.dims();
        if height == 0 || width == 0 {
            return Err(ServeError::Config(format!("Invalid target size {}x{}", width, height)));
        }

        Ok(Self { config, mean, std })
    }

    /// 模型输入尺寸 (height, width)
    pub fn input_size(&self) -> (u32, u32) {
        self.config.size.dims()
    }

    pub fn preprocess(&self, image: DynamicImage) -> Result<Array4<f32>> {
        let (height, width) = self.input_size();
        let mut rgb = ImageLoader::to_rgb(image);

        if self.config.do_resize {
            if rgb.dimensions() != (width, height) {
                rgb = image::imageops::resize(&rgb, width, height, self.config.filter());
            }
        } else if rgb.dimensions() != (width, height) {
            return Err(ServeError::InvalidInput(format!(
                "Image is {}x{} but the model expects {}x{}",
                rgb.width(),
                rgb.height(),
                width,
                height
            )));
        }

        let rescale = if self.config.do_rescale { self.config.rescale_factor } else { 1.0 };
        let normalize = self.config.do_normalize;

        let tensor = Array4::from_shape_fn(
            (1, 3, height as usize, width as usize),
            |(_, c, y, x)| {
                let value = rgb.get_pixel(x as u32, y as u32)[c] as f32 * rescale;
                if normalize {
                    (value - self.mean[c]) / self.std[c]
                } else {
                    value
                }
            },
        );

        Ok(tensor)
    }
}

fn channel_triplet(name: &str, values: &[f32]) -> Result<[f32; 3]> {
    match values {
        [r, g, b] => Ok([*r, *g, *b]),
        [v] => Ok([*v; 3]),
        _ => Err(ServeError::Config(format!(
            "{} must have 1 or 3 values, got {}",
            name,
            values.len()
        ))),
    }
}
