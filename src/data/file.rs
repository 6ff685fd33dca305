//! File values

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::result::{ExecutionError, ExecutionResult};

/// Known file extensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FileExtension {
    None,
    Csv,
    Txt,
    Xlsx,
    Zip,
}

impl FileExtension {
    /// Infer the extension from a string such as `".csv"` or `"CSV"`.
    ///
    /// Unknown extensions map to `None`.
    pub fn from_extension_str(ext: &str) -> Self {
        let ext = ext.trim_start_matches('.');
        match ext.to_ascii_lowercase().as_str() {
            "csv" => FileExtension::Csv,
            "txt" => FileExtension::Txt,
            "xlsx" => FileExtension::Xlsx,
            "zip" => FileExtension::Zip,
            _ => FileExtension::None,
        }
    }

    /// Infer the extension from a file name
    pub fn from_file_name(name: &str) -> Self {
        match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => Self::from_extension_str(ext),
            _ => FileExtension::None,
        }
    }
}

/// MIME types attached to files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MimeType {
    TextCsv,
    TextPlain,
    ApplicationZip,
    ApplicationXlsx,
    ApplicationOctetStream,
}

impl MimeType {
    pub fn from_extension(extension: FileExtension) -> Self {
        match extension {
            FileExtension::Csv => MimeType::TextCsv,
            FileExtension::Txt => MimeType::TextPlain,
            FileExtension::Zip => MimeType::ApplicationZip,
            FileExtension::Xlsx => MimeType::ApplicationXlsx,
            FileExtension::None => MimeType::ApplicationOctetStream,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MimeType::TextCsv => "text/csv",
            MimeType::TextPlain => "text/plain",
            MimeType::ApplicationZip => "application/zip",
            MimeType::ApplicationXlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            MimeType::ApplicationOctetStream => "application/octet-stream",
        }
    }

    /// Whether content of this type is expected to be text
    pub fn is_text(&self) -> bool {
        matches!(self, MimeType::TextCsv | MimeType::TextPlain)
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable file value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    pub name: String,
    pub extension: FileExtension,
    pub mime_type: MimeType,
    pub content: Vec<u8>,
}

impl File {
    pub fn new(
        name: impl Into<String>,
        extension: FileExtension,
        mime_type: MimeType,
        content: Vec<u8>,
    ) -> Self {
        Self {
            name: name.into(),
            extension,
            mime_type,
            content,
        }
    }

    /// Create a file, inferring extension and MIME type from the name
    pub fn from_name(name: impl Into<String>, content: Vec<u8>) -> Self {
        let name = name.into();
        let extension = FileExtension::from_file_name(&name);
        Self::new(name, extension, MimeType::from_extension(extension), content)
    }

    pub fn size(&self) -> usize {
        self.content.len()
    }

    /// Content decoded as UTF-8
    pub fn as_text(&self) -> ExecutionResult<&str> {
        std::str::from_utf8(&self.content).map_err(|e| {
            ExecutionError::io(format!("File \"{}\" is not valid UTF-8: {}", self.name, e))
        })
    }
}
