// Path: crates/types/src/keys/mod.rs
//! Defines constants for well-known contract variable keys.
//!
//! These constants are the single source of truth for the keys the TELA
//! templates `STORE` on-chain. Using them prevents typos between the
//! validator, the locator and the resolver, which all read the same entries.

/// The on-chain name of the contract. For documents this is the file name.
pub const NAME_HDR: &str = "nameHdr";
/// The on-chain description of the contract.
pub const DESCR_HDR: &str = "descrHdr";
/// The on-chain icon URL of the contract.
pub const ICON_URL_HDR: &str = "iconURLHdr";
/// The canonical, URL-like name of the content.
pub const DURL: &str = "dURL";
/// The sub-directory a document is placed in, `/` separated.
pub const SUB_DIR: &str = "subDir";
/// The content language of a document.
pub const DOC_TYPE: &str = "docType";
/// The `C` value of a document's detached signature.
pub const FILE_CHECK_C: &str = "fileCheckC";
/// The `S` value of a document's detached signature.
pub const FILE_CHECK_S: &str = "fileCheckS";
/// The owner (author) address.
pub const OWNER: &str = "owner";
/// The commit hash of the latest code, equal to the SCID until the first update.
pub const HASH: &str = "hash";
/// The TELA-MOD tag string of an index.
pub const MODS: &str = "mods";
/// The template version stored by an index.
pub const TELA_VERSION: &str = "telaVersion";
/// The template version stored by a document.
pub const DOC_VERSION: &str = "docVersion";
/// The number of positive ratings.
pub const LIKES: &str = "likes";
/// The number of negative ratings.
pub const DISLIKES: &str = "dislikes";
/// The variable holding the contract code itself.
pub const CODE: &str = "C";

/// Prefix of the document reference keys in an index, suffixed with `1..n`.
pub const DOC_PREFIX: &str = "DOC";

/// The anonymous author sentinel used when no owner is stored.
pub const ANON_AUTHOR: &str = "anon";

/// The dURL suffix tagging an index as an embeddable library.
pub const TAG_LIBRARY: &str = ".lib";
/// The dURL tag marking an index whose documents are shards of one file.
pub const TAG_DOC_SHARDS: &str = ".shards";

/// The key of the `n`-th document reference (`1`-based) of an index.
pub fn doc_key(n: usize) -> String {
    format!("{}{}", DOC_PREFIX, n)
}

/// Parses the numeric suffix of a document reference key, if `key` is one.
pub fn doc_number(key: &str) -> Option<u64> {
    let digits = key.strip_prefix(DOC_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Returns true if a dURL carries the library tag.
pub fn is_library(durl: &str) -> bool {
    durl.ends_with(TAG_LIBRARY)
}

/// Returns true if a dURL carries the DocShards tag.
pub fn is_doc_shards(durl: &str) -> bool {
    durl.contains(TAG_DOC_SHARDS)
}
