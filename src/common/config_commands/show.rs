use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Write the resolved config path to provided writer.
pub(super) fn path_config_with_writer(path: &Path, output: &mut dyn Write) -> Result<()> {
    writeln!(output, "{}", path.display())?;
    Ok(())
}

/// Stream the config file, or explain where to create one and what the
/// defaults are.
pub(super) fn show_config_with_io(
    path: &Path,
    defaults: &str,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> Result<()> {
    if path.exists() {
        let mut file = fs::File::open(path)
            .with_context(|| format!("Failed to open config file {}", path.display()))?;
        std::io::copy(&mut file, stdout)?;
    } else {
        writeln!(stderr, "No config file found at {}", path.display())?;
        writeln!(stderr, "Using defaults:\n")?;
        write!(stderr, "{defaults}")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{path_config_with_writer, show_config_with_io};

    #[test]
    fn path_command_writes_display_path() {
        let path = std::path::Path::new("/tmp/peerdrop-config.toml");
        let mut out = Vec::new();

        path_config_with_writer(path, &mut out).expect("path output should succeed");

        assert_eq!(String::from_utf8(out).unwrap(), "/tmp/peerdrop-config.toml\n");
    }

    #[test]
    fn show_command_streams_existing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "port = 1234\n").expect("write config");

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        show_config_with_io(&path, "port = 9999\n", &mut stdout, &mut stderr)
            .expect("show should succeed");

        assert_eq!(String::from_utf8(stdout).unwrap(), "port = 1234\n");
        assert!(stderr.is_empty());
    }

    #[test]
    fn show_command_prints_defaults_when_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing.toml");

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        show_config_with_io(&path, "port = 9999\n", &mut stdout, &mut stderr)
            .expect("show should succeed when file is missing");

        assert!(stdout.is_empty());
        let err = String::from_utf8(stderr).unwrap();
        assert!(err.contains("No config file found at"));
        assert!(err.contains("port = 9999"));
    }
}
