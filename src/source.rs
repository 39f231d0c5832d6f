//! Acquisition of raw ARC counter dumps.
//!
//! A `StatsSource` only has to hand back the raw bytes of one dump or a
//! distinct error. Parsing happens elsewhere.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use tracing::debug;

use crate::config::{EngineSettings, SourceKind};
use crate::error::{AcquisitionError, ConfigError};

/// Linux location of the ARC kstat file.
pub const KSTAT_ARCSTATS_PATH: &str = "/proc/spl/kstat/zfs/arcstats";
/// Present whenever the ZFS SPL kernel module is loaded.
const SPL_KSTAT_ROOT: &str = "/proc/spl";
/// sysctl node holding the ARC counters on FreeBSD and macOS.
pub const SYSCTL_ARCSTATS_NODE: &str = "kstat.zfs.misc.arcstats";

/// Supplier of raw counter dumps.
///
/// Implementations may block; the collector calls them off the async runtime.
pub trait StatsSource: Send + Sync {
    fn fetch_raw(&self) -> Result<Vec<u8>, AcquisitionError>;

    /// Short human-readable description used in logs and `check` output.
    fn describe(&self) -> String;
}

/// Reads a kstat-format file such as `/proc/spl/kstat/zfs/arcstats`.
#[derive(Debug, Clone)]
pub struct KstatFileSource {
    path: PathBuf,
}

impl KstatFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for KstatFileSource {
    fn default() -> Self {
        Self::new(KSTAT_ARCSTATS_PATH)
    }
}

impl StatsSource for KstatFileSource {
    fn fetch_raw(&self) -> Result<Vec<u8>, AcquisitionError> {
        read_file(&self.path).map_err(|e| match e {
            AcquisitionError::NotFound(_)
                if self.path == Path::new(KSTAT_ARCSTATS_PATH)
                    && !Path::new(SPL_KSTAT_ROOT).exists() =>
            {
                AcquisitionError::Unsupported(format!(
                    "{} missing, ZFS kernel module not loaded",
                    SPL_KSTAT_ROOT
                ))
            }
            other => other,
        })
    }

    fn describe(&self) -> String {
        format!("kstat file {}", self.path.display())
    }
}

/// Reads any file holding a dump in either supported format.
///
/// Used for sample data generated by `generate-sample`.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl StatsSource for FileSource {
    fn fetch_raw(&self) -> Result<Vec<u8>, AcquisitionError> {
        read_file(&self.path)
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, AcquisitionError> {
    let target = path.display().to_string();
    let bytes = fs::read(path).map_err(|e| AcquisitionError::from_io(&e, &target))?;
    debug!("Read {} bytes from {}", bytes.len(), target);
    Ok(bytes)
}

/// Runs `sysctl kstat.zfs.misc.arcstats`.
#[derive(Debug, Clone)]
pub struct SysctlSource {
    program: String,
    node: String,
}

impl SysctlSource {
    pub fn new(program: impl Into<String>, node: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            node: node.into(),
        }
    }
}

impl Default for SysctlSource {
    fn default() -> Self {
        Self::new("sysctl", SYSCTL_ARCSTATS_NODE)
    }
}

impl StatsSource for SysctlSource {
    fn fetch_raw(&self) -> Result<Vec<u8>, AcquisitionError> {
        let command = format!("{} {}", self.program, self.node);
        let output = Command::new(&self.program)
            .arg(&self.node)
            .output()
            .map_err(|e| AcquisitionError::from_io(&e, &self.program))?;

        if !output.status.success() {
            return Err(AcquisitionError::CommandFailed {
                command,
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        debug!("`{}` produced {} bytes", command, output.stdout.len());
        Ok(output.stdout)
    }

    fn describe(&self) -> String {
        format!("command `{} {}`", self.program, self.node)
    }
}

/// Builds the source selected by the settings.
pub fn source_from_settings(
    settings: &EngineSettings,
) -> Result<Arc<dyn StatsSource>, ConfigError> {
    let kstat = || -> Arc<dyn StatsSource> {
        Arc::new(match &settings.source_path {
            Some(p) => KstatFileSource::new(p),
            None => KstatFileSource::default(),
        })
    };

    let source: Arc<dyn StatsSource> = match settings.source {
        SourceKind::Kstat => kstat(),
        SourceKind::Auto if cfg!(target_os = "linux") => kstat(),
        SourceKind::Auto | SourceKind::Sysctl => Arc::new(SysctlSource::default()),
        SourceKind::File => match &settings.source_path {
            Some(p) => Arc::new(FileSource::new(p)),
            None => return Err(ConfigError::MissingSourcePath),
        },
    };
    Ok(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_file_source_reads_bytes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "hits 4 10").unwrap();
        let src = FileSource::new(file.path());
        assert_eq!(src.fetch_raw().unwrap(), b"hits 4 10\n".to_vec());
        assert!(src.describe().starts_with("file "));
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let src = KstatFileSource::new("/nonexistent/arcstats");
        assert!(matches!(
            src.fetch_raw().unwrap_err(),
            AcquisitionError::NotFound(_)
        ));
    }

    #[test]
    fn test_missing_command_is_not_found() {
        let src = SysctlSource::new("arcstats-monitor-no-such-binary", SYSCTL_ARCSTATS_NODE);
        assert!(matches!(
            src.fetch_raw().unwrap_err(),
            AcquisitionError::NotFound(_)
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_command_reports_status() {
        let src = SysctlSource::new("false", "ignored");
        match src.fetch_raw().unwrap_err() {
            AcquisitionError::CommandFailed { status, .. } => assert_ne!(status, 0),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_source_from_settings() {
        let settings = EngineSettings {
            source: SourceKind::File,
            source_path: Some(PathBuf::from("/tmp/sample.txt")),
            ..EngineSettings::default()
        };
        let src = source_from_settings(&settings).unwrap();
        assert_eq!(src.describe(), "file /tmp/sample.txt");

        let kstat = EngineSettings {
            source: SourceKind::Kstat,
            ..EngineSettings::default()
        };
        assert_eq!(
            source_from_settings(&kstat).unwrap().describe(),
            format!("kstat file {}", KSTAT_ARCSTATS_PATH)
        );
    }
}
