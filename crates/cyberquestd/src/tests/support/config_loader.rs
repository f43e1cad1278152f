//! Configuration loaders provisioning world content and a Unix socket under
//! a temporary directory.

use std::ffi::OsString;
use std::fs;

use camino::Utf8PathBuf;
use tempfile::TempDir;

use cyberquest_config::{Config, ConfigError, Pacing, SocketEndpoint};

use crate::bootstrap::ConfigLoader;

const WORLD_YAML: &str = r#"
defaultHost: gateway
banner: "CYBERQUEST TERMINAL"
startupText: "Type help to begin."
hosts:
  gateway:
    files:
      - name: readme.txt
        text: "Nothing to see here."
  vault:
    users:
      - userName: root
        password: toor
"#;

/// Loader pointing at freshly written world content.
pub struct TestConfigLoader {
    _dir: TempDir,
    root: Utf8PathBuf,
}

impl TestConfigLoader {
    #[must_use]
    pub fn new() -> Self {
        Self::with_world(WORLD_YAML)
    }

    /// Writes `yaml` as the world file.
    #[must_use]
    pub fn with_world(yaml: &str) -> Self {
        let dir = TempDir::new().expect("failed to create temporary directory");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf())
            .expect("temporary directory was not valid UTF-8");
        fs::write(root.join("world.yaml"), yaml).expect("failed to write world file");
        Self { _dir: dir, root }
    }

    pub fn socket_path(&self) -> Utf8PathBuf {
        self.root.join("run").join("cyberquestd.sock")
    }
}

impl ConfigLoader for TestConfigLoader {
    fn load(&self) -> Result<Config, ConfigError> {
        Ok(Config {
            listen: SocketEndpoint::unix(self.socket_path()),
            world_path: self.root.join("world.yaml"),
            log_filter: "warn".to_owned(),
            pacing: Pacing::Instant,
            ..Config::default()
        })
    }
}

/// Loader that fails the way a mistyped flag does.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, ConfigError> {
        let args = vec![
            OsString::from("cyberquestd"),
            OsString::from("--pacing"),
            OsString::from("warp-speed"),
        ];
        Config::load_from_iter(args)
    }
}
