// Path: crates/types/src/app/mod.rs
//! Core content data structures: documents, indexes, clones and servers.

use crate::keys;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// A semantic version of a TELA smart contract template.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Version {
    /// The major version.
    pub major: u32,
    /// The minor version.
    pub minor: u32,
    /// The patch version.
    pub patch: u32,
}

impl Version {
    /// Creates a new version.
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('.').collect();
        let [major, minor, patch] = parts.as_slice() else {
            return Err(format!("invalid version format: {}", s));
        };
        let parse = |part: &str, what: &str| {
            part.parse::<u32>()
                .map_err(|_| format!("invalid {} version: {}", what, part))
        };
        Ok(Self::new(
            parse(major, "major")?,
            parse(minor, "minor")?,
            parse(patch, "patch")?,
        ))
    }
}

/// The accepted content languages of a TELA document.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocType {
    /// Generic docType for any file type.
    #[serde(rename = "TELA-STATIC-1")]
    Static,
    /// HTML.
    #[serde(rename = "TELA-HTML-1")]
    Html,
    /// JSON.
    #[serde(rename = "TELA-JSON-1")]
    Json,
    /// CSS.
    #[serde(rename = "TELA-CSS-1")]
    Css,
    /// JavaScript.
    #[serde(rename = "TELA-JS-1")]
    Js,
    /// Markdown.
    #[serde(rename = "TELA-MD-1")]
    Markdown,
    /// Go.
    #[serde(rename = "TELA-GO-1")]
    Go,
}

impl DocType {
    /// Every accepted language, in declaration order.
    pub const ALL: [DocType; 7] = [
        DocType::Static,
        DocType::Html,
        DocType::Json,
        DocType::Css,
        DocType::Js,
        DocType::Markdown,
        DocType::Go,
    ];

    /// The on-chain tag of this language.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::Static => "TELA-STATIC-1",
            DocType::Html => "TELA-HTML-1",
            DocType::Json => "TELA-JSON-1",
            DocType::Css => "TELA-CSS-1",
            DocType::Js => "TELA-JS-1",
            DocType::Markdown => "TELA-MD-1",
            DocType::Go => "TELA-GO-1",
        }
    }

    /// Guesses the language of a file from its extension.
    ///
    /// Returns `None` for extensionless names other than `LICENSE`.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let ext = Path::new(file_name)
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase());
        match ext.as_deref() {
            Some("html") => Some(DocType::Html),
            Some("json") => Some(DocType::Json),
            Some("js") => Some(DocType::Js),
            Some("css") => Some(DocType::Css),
            Some("md") => Some(DocType::Markdown),
            Some("go") => Some(DocType::Go),
            Some(_) => Some(DocType::Static),
            None if file_name == "LICENSE" => Some(DocType::Static),
            None => None,
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocType {
    type Err = String;

    /// Exact, case-sensitive match against the accepted tags.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DocType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("{} is not an accepted language", s))
    }
}

/// Standard display headers stored on every TELA contract.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    /// On-chain name. For documents this is the file name, including extension.
    #[serde(rename = "nameHdr")]
    pub name: String,
    /// On-chain description.
    #[serde(rename = "descrHdr")]
    pub description: String,
    /// On-chain icon URL.
    #[serde(rename = "iconURLHdr")]
    pub icon_url: String,
}

/// The detached signature pair of a document's body.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    /// The `C` signature value.
    #[serde(rename = "checkC")]
    pub check_c: String,
    /// The `S` signature value.
    #[serde(rename = "checkS")]
    pub check_s: String,
}

/// A single servable file published as a TELA-DOC-1 contract.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// The content language.
    #[serde(rename = "docType")]
    pub doc_type: DocType,
    /// The full contract code. The file body sits in its trailing comment block.
    pub code: String,
    /// Sub-directory to place the file in, `/` separated. Empty for the tree root.
    #[serde(rename = "subDir")]
    pub sub_dir: String,
    /// The SCID of this document.
    pub scid: String,
    /// The owner address, or `anon`.
    pub author: String,
    /// The canonical name.
    #[serde(rename = "dURL")]
    pub durl: String,
    /// The template version the code matched.
    pub version: Version,
    /// Signature values of the body.
    pub signature: Signature,
    /// Display headers.
    pub headers: Headers,
}

impl Document {
    /// The file name this document materializes as.
    pub fn file_name(&self) -> &str {
        &self.headers.name
    }

    /// The sub-directory split into path segments, empty segments dropped.
    pub fn sub_dir_segments(&self) -> impl Iterator<Item = &str> {
        self.sub_dir.split('/').filter(|s| !s.is_empty())
    }
}

/// A content tree root published as a TELA-INDEX-1 contract.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Index {
    /// The SCID of this index.
    pub scid: String,
    /// The owner address, or `anon`.
    pub author: String,
    /// The canonical name.
    #[serde(rename = "dURL")]
    pub durl: String,
    /// TELA-MOD tags, comma separated. Empty when none are enabled.
    pub mods: String,
    /// Ordered document references. The first one is the entrypoint.
    pub docs: Vec<String>,
    /// The template version the code matched.
    pub version: Version,
    /// Display headers.
    pub headers: Headers,
}

impl Index {
    /// Returns true if this index is tagged as an embeddable library.
    pub fn is_library(&self) -> bool {
        keys::is_library(&self.durl)
    }

    /// Returns true if this index holds the shards of a single file.
    pub fn is_doc_shards(&self) -> bool {
        keys::is_doc_shards(&self.durl)
    }
}

/// The on-disk materialization of a resolved document or index tree.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeClone {
    /// Main directory of the materialized files.
    #[serde(rename = "basePath")]
    pub base_path: PathBuf,
    /// URL serve path, set only when the entry document lives in a sub-directory.
    #[serde(rename = "servePath")]
    pub serve_path: String,
    /// The entrypoint file name.
    pub entrypoint: String,
    /// The canonical name.
    #[serde(rename = "dURL")]
    pub durl: String,
    /// The commit TXID when resolved at a historical revision.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
}

impl TreeClone {
    /// Returns true if this tree is tagged as a library.
    pub fn is_library(&self) -> bool {
        keys::is_library(&self.durl)
    }
}

/// Identity of one active hosting server.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ServerInfo {
    /// The canonical name of the hosted content.
    pub name: String,
    /// The listen address, `:<port>`.
    pub address: String,
    /// The SCID the content was resolved from.
    pub scid: String,
    /// The entrypoint file name.
    pub entrypoint: String,
}

/// A single rating left on a TELA contract.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Rating {
    /// The rater's address.
    pub address: String,
    /// The rating, `0..=99`.
    pub rating: u64,
    /// The block height the rating was made at.
    pub height: u64,
}

/// Aggregated ratings of a TELA contract.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct RatingSummary {
    /// The number of positive ratings.
    pub likes: u64,
    /// The number of negative ratings.
    pub dislikes: u64,
    /// The mean of the rating categories (`rating / 10`).
    pub average: f64,
    /// Individual ratings, newest first.
    pub ratings: Vec<Rating>,
}
