use crate::utils::error::ServeError;
use crate::Result;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// 模型 config.json 中用到的字段
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    #[serde(rename = "_name_or_path", default)]
    pub name_or_path: Option<String>,

    #[serde(default)]
    pub image_size: Option<u32>,

    pub id2label: HashMap<String, String>,
}

impl ModelConfig {
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ServeError::ModelLoad(format!(
                "Model config not found: {}",
                path.display()
            )));
        }

        tracing::info!("Loading model config from: {}", path.display());

        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// 按下标排列的标签表；下标必须从0开始连续
    pub fn labels(&self) -> Result<Vec<String>> {
        let mut labels = vec![None; self.id2label.len()];

        for (key, label) in &self.id2label {
            let index: usize = key
                .parse()
                .map_err(|_| ServeError::Config(format!("Invalid id2label key '{}'", key)))?;

            match labels.get_mut(index) {
                Some(slot) => *slot = Some(label.clone()),
                None => {
                    return Err(ServeError::Config(format!(
                        "id2label index {} out of range for {} labels",
                        index,
                        self.id2label.len()
                    )));
                }
            }
        }

        let labels: Vec<String> = labels.into_iter().flatten().collect();
        if labels.is_empty() {
            return Err(ServeError::Config("id2label is empty".to_string()));
        }
        if labels.len() != self.id2label.len() {
            return Err(ServeError::Config("id2label indices are not contiguous".to_string()));
        }

        Ok(labels)
    }
}
