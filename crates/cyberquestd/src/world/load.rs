//! YAML loading for world content and sequence scripts.

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use super::{HostRecord, SequenceStep, WORLD_TARGET, World};

/// Errors raised while loading world content.
#[derive(Debug, Error)]
pub enum WorldError {
    /// The world file could not be read.
    #[error("failed to read world file '{path}': {source}")]
    Read {
        /// Configured world file.
        path: Utf8PathBuf,
        /// Underlying filesystem error.
        #[source]
        source: io::Error,
    },
    /// The world file is not valid YAML for the content schema.
    #[error("failed to parse world file '{path}': {source}")]
    Parse {
        /// Configured world file.
        path: Utf8PathBuf,
        /// YAML decoding error.
        #[source]
        source: serde_saphyr::Error,
    },
    /// `defaultHost` names a host that the content does not define.
    #[error("default host '{host}' is not defined in the world file")]
    UnknownDefaultHost {
        /// The undefined host identifier.
        host: String,
    },
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct WorldDocument {
    default_host: Option<String>,
    default_user: Option<String>,
    banner: Option<String>,
    startup_text: Option<String>,
    help_text: Option<String>,
    hosts: BTreeMap<String, HostRecord>,
}

impl World {
    /// Loads world content from a YAML file.
    ///
    /// Sequence scripts referenced by files are read relative to the world
    /// file's directory. A script that cannot be read or parsed is logged and
    /// left out; opening its file then reports the file as empty.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError`] when the world file itself cannot be read or
    /// parsed, or when its default host is undefined.
    pub fn load(path: &Utf8Path) -> Result<Self, WorldError> {
        let text = fs::read_to_string(path).map_err(|source| WorldError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Utf8Path::new(""));
        Self::parse(&text, base_dir, path)
    }

    /// Parses world content from YAML text, resolving scripts under `base_dir`.
    ///
    /// # Errors
    ///
    /// See [`World::load`].
    pub fn from_yaml(text: &str, base_dir: &Utf8Path) -> Result<Self, WorldError> {
        Self::parse(text, base_dir, Utf8Path::new("<inline>"))
    }

    fn parse(text: &str, base_dir: &Utf8Path, origin: &Utf8Path) -> Result<Self, WorldError> {
        let document: WorldDocument =
            serde_saphyr::from_str(text).map_err(|source| WorldError::Parse {
                path: origin.to_path_buf(),
                source,
            })?;

        if let Some(host) = &document.default_host
            && !document.hosts.contains_key(host)
        {
            return Err(WorldError::UnknownDefaultHost { host: host.clone() });
        }

        let mut world = Self {
            default_host: document.default_host,
            default_user: document.default_user,
            banner: document.banner,
            startup_text: document.startup_text,
            help_text: document.help_text,
            hosts: document.hosts,
            scripts: HashMap::new(),
        };
        world.load_scripts(base_dir);
        Ok(world)
    }

    fn load_scripts(&mut self, base_dir: &Utf8Path) {
        let references: Vec<String> = self
            .hosts
            .values()
            .flat_map(|host| host.files.iter())
            .filter_map(|file| file.script_ref.clone())
            .collect();

        for reference in references {
            if self.scripts.contains_key(&reference) {
                continue;
            }
            let path = base_dir.join(&reference);
            match read_script(&path) {
                Ok(steps) => {
                    debug!(
                        target: WORLD_TARGET,
                        script = %reference,
                        steps = steps.len(),
                        "sequence script loaded"
                    );
                    self.scripts.insert(reference, steps);
                }
                Err(error) => {
                    warn!(
                        target: WORLD_TARGET,
                        script = %reference,
                        path = %path,
                        error = %error,
                        "sequence script unavailable"
                    );
                }
            }
        }
    }
}

fn read_script(path: &Utf8Path) -> Result<Vec<SequenceStep>, WorldError> {
    let text = fs::read_to_string(path).map_err(|source| WorldError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_script(&text).map_err(|source| WorldError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Parses a multi-document YAML stream, one step per document.
pub(crate) fn parse_script(text: &str) -> Result<Vec<SequenceStep>, serde_saphyr::Error> {
    split_documents(text)
        .iter()
        .map(|document| serde_saphyr::from_str(document))
        .collect()
}

fn split_documents(text: &str) -> Vec<String> {
    let mut documents = Vec::new();
    let mut current = String::new();
    for line in text.lines() {
        let marker = line.trim_end();
        if marker == "---" || marker == "..." {
            push_document(&mut documents, &mut current);
            continue;
        }
        current.push_str(line);
        current.push('\n');
    }
    push_document(&mut documents, &mut current);
    documents
}

fn push_document(documents: &mut Vec<String>, current: &mut String) {
    let has_content = current.lines().any(|line| {
        let trimmed = line.trim();
        !trimmed.is_empty() && !trimmed.starts_with('#')
    });
    if has_content {
        documents.push(std::mem::take(current));
    } else {
        current.clear();
    }
}
