// Path: crates/core/src/templates/mod.rs

//! The canonical TELA contract templates.
//!
//! Every accepted version is kept so content installed from an older template
//! still validates. Lists are ordered oldest first.

use tela_types::app::Version;

/// The TELA-DOC-1 template, latest version.
pub const TELA_DOC_1: &str = include_str!("TELA-DOC-1.bas");
/// The TELA-INDEX-1 template, latest version.
pub const TELA_INDEX_1: &str = include_str!("TELA-INDEX-1.bas");
const TELA_INDEX_1_V1_0_0: &str = include_str!("TELA-INDEX-1-v1.0.0.bas");

/// Accepted TELA-DOC-1 versions and their code.
pub const DOC_VERSIONS: [(Version, &str); 1] = [(Version::new(1, 0, 0), TELA_DOC_1)];

/// Accepted TELA-INDEX-1 versions and their code.
pub const INDEX_VERSIONS: [(Version, &str); 2] = [
    (Version::new(1, 0, 0), TELA_INDEX_1_V1_0_0),
    (Version::new(1, 1, 0), TELA_INDEX_1),
];
