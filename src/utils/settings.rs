use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::Path;

use crate::shared::constants;

/// Tunables for the posture model. Resolved as defaults <- settings file <- CLI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelSettings {
    pub confidence_threshold: f32,
    pub input_size: u32,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            confidence_threshold: constants::DEFAULT_CONFIDENCE_THRESHOLD,
            input_size: constants::DEFAULT_INPUT_SIZE,
        }
    }
}

impl ModelSettings {
    /// Reads `path` if it exists. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("invalid settings in {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut settings = Self::default();

        for (line_no, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let Some((key, value)) = trimmed.split_once('=') else {
                continue;
            };
            let value = value.trim();

            match key.trim() {
                "confidence-threshold" => {
                    settings.confidence_threshold = value
                        .parse()
                        .map_err(|e| anyhow!("line {}: confidence-threshold '{}': {}", line_no + 1, value, e))?;
                }
                "input-size" => {
                    settings.input_size = value
                        .parse()
                        .map_err(|e| anyhow!("line {}: input-size '{}': {}", line_no + 1, value, e))?;
                }
                _ => {}
            }
        }

        settings.validate()?;
        Ok(settings)
    }

    pub fn with_overrides(mut self, confidence: Option<f32>, input_size: Option<u32>) -> Result<Self> {
        if let Some(c) = confidence {
            self.confidence_threshold = c;
        }
        if let Some(s) = input_size {
            self.input_size = s;
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            anyhow::bail!("confidence threshold must be within 0..=1, got {}", self.confidence_threshold);
        }
        if self.input_size == 0 {
            anyhow::bail!("input size must be positive");
        }
        Ok(())
    }
}
