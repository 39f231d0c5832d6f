//! Config command implementation.

use arcstats_monitor::config::Config;
use std::fs;
use std::path::PathBuf;

use crate::cli::ConfigFormat;

/// Generates configuration files
pub fn command_config(
    output: Option<PathBuf>,
    format: ConfigFormat,
    commented: bool,
) -> anyhow::Result<()> {
    let output = output.unwrap_or_else(|| PathBuf::from("arcstats-monitor.yaml"));
    let content = render_config(&Config::default(), format, commented)?;

    if output.to_string_lossy() == "-" {
        print!("{}", content);
    } else {
        fs::write(&output, content)?;
        println!("✅ Configuration written to: {}", output.display());
    }

    Ok(())
}

/// Serializes `config`; comments are only added to YAML output.
pub fn render_config(
    config: &Config,
    format: ConfigFormat,
    commented: bool,
) -> anyhow::Result<String> {
    let content = match format {
        ConfigFormat::Json => serde_json::to_string_pretty(config)?,
        ConfigFormat::Toml => toml::to_string_pretty(config)?,
        ConfigFormat::Yaml => {
            let content = serde_yaml::to_string(config)?;
            if commented {
                add_config_comments(content)
            } else {
                content
            }
        }
    };
    Ok(content)
}

/// Adds comments to YAML configuration
fn add_config_comments(yaml: String) -> String {
    let comments = r#"# ARC Stats Monitor Configuration
# ================================
#
# Server Configuration
# --------------------
# bind: "127.0.0.1"                    # Bind IP of the read-only HTTP view
# port: 9317                           # HTTP port
# enable_http: true                    # Serve the HTTP view
#
# Collection
# ----------
# poll_interval_seconds: 5             # Seconds between polls
# history_capacity: null               # Retained points (null = 300s worth)
# acquisition_timeout_seconds: 3       # Give up on a slow source after this
# source: auto                         # auto | kstat | sysctl | file
# source_path: null                    # kstat path override, required for "file"
#
# Presentation
# ------------
# hit_ratio_warning_threshold: 0.9     # Health turns to warning below this
# unit_mode: human                     # raw | human
# byte_metrics: null                   # Extra metric names shown in byte units
# count_metrics: null                  # Metric names never shown in byte units
#
# Logging
# -------
# log_level: info                      # off | error | warn | info | debug | trace

"#;
    format!("{comments}{yaml}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use arcstats_monitor::config::parse_config;

    #[test]
    fn test_rendered_config_reloads() {
        for (format, ext) in [
            (ConfigFormat::Yaml, "yaml"),
            (ConfigFormat::Json, "json"),
            (ConfigFormat::Toml, "toml"),
        ] {
            let text = render_config(&Config::default(), format, true).unwrap();
            let cfg = parse_config(&text, Some(ext)).unwrap();
            assert_eq!(cfg.port, Some(9317));
            assert!(cfg.engine_settings().is_ok());
        }
    }

    #[test]
    fn test_commented_yaml_has_header() {
        let text = render_config(&Config::default(), ConfigFormat::Yaml, true).unwrap();
        assert!(text.starts_with("# ARC Stats Monitor Configuration"));
        let plain = render_config(&Config::default(), ConfigFormat::Yaml, false).unwrap();
        assert!(!plain.contains('#'));
    }

    #[test]
    fn test_command_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        command_config(Some(path.clone()), ConfigFormat::Json, false).unwrap();
        let cfg = parse_config(&std::fs::read_to_string(path).unwrap(), Some("json")).unwrap();
        assert_eq!(cfg.bind.as_deref(), Some("127.0.0.1"));
    }
}
