use anyhow::{anyhow, Result};

use crate::config::AppConfig;

pub fn validate_config(config: &AppConfig) -> Result<()> {
    if config.input_dirs.is_empty() {
        return Err(anyhow!("input_dirs must list at least one directory"));
    }
    if config.max_file_bytes == 0 {
        return Err(anyhow!("max_file_bytes must be greater than 0"));
    }
    validate_threshold("overlap_min_confidence", config.overlap_min_confidence)?;
    validate_threshold("travel_min_confidence", config.travel_min_confidence)?;
    if config.report_dir.trim().is_empty() {
        return Err(anyhow!("report_dir must not be empty"));
    }
    if config.schedule_hour > 23 || config.schedule_minute > 59 {
        return Err(anyhow!("schedule_hour or schedule_minute out of range"));
    }
    if let Some(url) = &config.enrichment_url {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(anyhow!("enrichment_url must be an http(s) URL"));
        }
    }
    Ok(())
}

fn validate_threshold(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || !(0.0..=100.0).contains(&value) {
        return Err(anyhow!("{} must be within 0..=100", name));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_values() {
        let mut config = AppConfig {
            overlap_min_confidence: 120.0,
            ..AppConfig::default()
        };
        assert!(validate_config(&config).is_err());
        config.overlap_min_confidence = 70.0;
        config.schedule_hour = 24;
        assert!(validate_config(&config).is_err());
        config.schedule_hour = 6;
        config.enrichment_url = Some("ftp://example".to_string());
        assert!(validate_config(&config).is_err());
        config.enrichment_url = None;
        assert!(validate_config(&config).is_ok());
    }
}
