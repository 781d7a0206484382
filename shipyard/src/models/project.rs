//! Project file models

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::errors::LaunchError;

/// How a file's content travels on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FileEncoding {
    #[default]
    #[serde(rename = "utf-8")]
    Utf8,
    #[serde(rename = "base64")]
    Base64,
}

impl FileEncoding {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileEncoding::Utf8 => "utf-8",
            FileEncoding::Base64 => "base64",
        }
    }
}

/// A single file of a deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectFile {
    path: String,
    content: Vec<u8>,
    encoding: FileEncoding,
}

impl ProjectFile {
    /// Create a text file
    pub fn text(path: &str, content: impl Into<String>) -> Self {
        Self {
            path: normalize_path(path),
            content: content.into().into_bytes(),
            encoding: FileEncoding::Utf8,
        }
    }

    /// Create a binary file
    pub fn binary(path: &str, content: Vec<u8>) -> Self {
        Self {
            path: normalize_path(path),
            content,
            encoding: FileEncoding::Base64,
        }
    }

    /// Decode a file as submitted by a client
    pub fn decode(path: &str, content: &str, encoding: Option<&str>) -> Result<Self, LaunchError> {
        match encoding.map(str::to_ascii_lowercase).as_deref() {
            None | Some("utf-8") | Some("utf8") | Some("text") => Ok(Self::text(path, content)),
            Some("base64") => {
                let bytes = BASE64.decode(content.trim()).map_err(|e| {
                    LaunchError::ValidationError(format!("{path}: invalid base64 content: {e}"))
                })?;
                Ok(Self::binary(path, bytes))
            }
            Some(other) => Err(LaunchError::ValidationError(format!(
                "{path}: unsupported encoding '{other}'"
            ))),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn encoding(&self) -> FileEncoding {
        self.encoding
    }

    /// The content as text, if this is a UTF-8 file
    pub fn as_text(&self) -> Option<&str> {
        match self.encoding {
            FileEncoding::Utf8 => std::str::from_utf8(&self.content).ok(),
            FileEncoding::Base64 => None,
        }
    }

    /// A new file at the same path with different text content
    pub fn with_text(&self, content: impl Into<String>) -> Self {
        Self::text(&self.path, content)
    }

    /// Content as sent to the hosting platform
    pub fn wire_data(&self) -> String {
        match self.encoding {
            FileEncoding::Utf8 => String::from_utf8_lossy(&self.content).into_owned(),
            FileEncoding::Base64 => BASE64.encode(&self.content),
        }
    }

    /// File extension, lower-cased, without the dot
    pub fn extension(&self) -> Option<String> {
        let name = self.path.rsplit('/').next()?;
        let (_, ext) = name.rsplit_once('.')?;
        Some(ext.to_ascii_lowercase())
    }
}

/// Make a path relative: no leading slash or `./`
pub fn normalize_path(path: &str) -> String {
    let mut p = path.trim().replace('\\', "/");
    loop {
        if let Some(rest) = p.strip_prefix("./") {
            p = rest.to_string();
        } else if let Some(rest) = p.strip_prefix('/') {
            p = rest.to_string();
        } else {
            break;
        }
    }
    p
}

/// Path-keyed set of files submitted for one deployment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeployBatch {
    files: BTreeMap<String, ProjectFile>,
}

impl DeployBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a batch from caller files, rejecting duplicate and empty paths
    pub fn from_files(files: impl IntoIterator<Item = ProjectFile>) -> Result<Self, LaunchError> {
        let mut batch = Self::new();
        for file in files {
            if file.path().is_empty() {
                return Err(LaunchError::ValidationError("file with empty path".to_string()));
            }
            if batch.contains(file.path()) {
                return Err(LaunchError::ValidationError(format!(
                    "duplicate file path: {}",
                    file.path()
                )));
            }
            batch.files.insert(file.path.clone(), file);
        }
        Ok(batch)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    pub fn get(&self, path: &str) -> Option<&ProjectFile> {
        self.files.get(path)
    }

    pub fn files(&self) -> impl Iterator<Item = &ProjectFile> {
        self.files.values()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Add a file only if its path is not taken. Returns whether it was added.
    pub fn insert_if_absent(&mut self, file: ProjectFile) -> bool {
        if self.files.contains_key(file.path()) {
            return false;
        }
        self.files.insert(file.path.clone(), file);
        true
    }

    /// Add a file, replacing whatever is at its path
    pub fn upsert(&mut self, file: ProjectFile) {
        self.files.insert(file.path.clone(), file);
    }

    /// Concatenated text of every UTF-8 file
    pub fn concatenated_text(&self) -> String {
        let mut out = String::new();
        for text in self.files.values().filter_map(ProjectFile::as_text) {
            out.push_str(text);
            out.push('\n');
        }
        out
    }
}
