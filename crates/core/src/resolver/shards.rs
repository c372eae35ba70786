// Path: crates/core/src/resolver/shards.rs

//! Reassembly of DocShards bundles.
//!
//! Shards are documents named `<stem>-<n>.<ext>` whose comment bodies are
//! consecutive slices of one file. The file is rebuilt under the name of the
//! first shard with `-1.` replaced by `.`.

use super::{check_component, join_sub_dir, path_exists, Created};
use crate::locator::Locator;
use std::path::Path;
use tela_types::error::{GraphError, TelaError, ValidationError};
use tela_types::Result;

/// Returns a shard's raw bytes: the comment body without its framing newlines.
pub fn shard_body(code: &str) -> Result<&str> {
    let start = code
        .find("/*")
        .filter(|_| code.contains("*/"))
        .ok_or_else(|| ValidationError::Parse("could not parse multiline comment".into()))?;
    let comment = code.get(start + 3..).unwrap_or_default();
    Ok(comment.strip_suffix("\n*/").unwrap_or(comment))
}

/// The name of the rebuilt file, derived from the first shard's name.
pub fn recreated_name(first_shard: &str) -> String {
    first_shard.replace("-1.", ".")
}

/// Rebuilds the file held by the shards `docs` of index `scid` below `root`.
pub(super) async fn reconstruct(
    locator: &Locator,
    scid: &str,
    docs: &[String],
    root: &Path,
    created: &mut Created,
) -> Result<()> {
    if docs.is_empty() {
        return Err(GraphError::EmptyShards(scid.to_string()).into());
    }

    let mut target = None;
    let mut content = Vec::new();
    for (i, doc_scid) in docs.iter().enumerate() {
        let doc = locator
            .fetch_document_vars(doc_scid)
            .await
            .map_err(|e| e.context(doc_scid.clone()))?;
        if i == 0 {
            let name = recreated_name(doc.file_name());
            check_component(&name)?;
            let path = join_sub_dir(root, doc.sub_dir_segments())?.join(&name);
            if path_exists(&path).await? {
                return Err(TelaError::AlreadyExists(path));
            }
            target = Some(path);
        }
        content.extend_from_slice(shard_body(&doc.code)?.as_bytes());
    }

    let Some(path) = target else {
        return Err(GraphError::EmptyShards(scid.to_string()).into());
    };
    tracing::info!(target: "tela::resolver", path = %path.display(), shards = docs.len(), "Constructing from shards");
    created.write_file(&path, &content).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{Resolver, Revision};
    use crate::test_support::{locator, DocSpec, IndexSpec, MockLedger};

    #[test]
    fn shard_body_keeps_inner_whitespace() {
        assert_eq!(shard_body("code\n/*\n  a b \n*/").unwrap(), "  a b ");
        assert_eq!(recreated_name("big-1.js"), "big.js");
        assert!(shard_body("no comment").is_err());
    }

    #[tokio::test]
    async fn shards_are_concatenated_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = MockLedger::new();
        ledger.add_doc("s1", &DocSpec::new("big-1.js", "TELA-JS-1", "let a = 1;\n").sub_dir("lib"));
        ledger.add_doc("s2", &DocSpec::new("big-2.js", "TELA-JS-1", "let b = 2;"));
        ledger.add_index("sh", &IndexSpec::new("big.shards", &["s1", "s2"]));

        let clone = Resolver::new(locator(&ledger), false)
            .resolve_index_graph("sh", dir.path(), Revision::Latest)
            .await
            .unwrap();
        assert_eq!(clone.entrypoint, "");
        let rebuilt = dir.path().join("big.shards/lib/big.js");
        assert_eq!(
            std::fs::read_to_string(rebuilt).unwrap(),
            "let a = 1;\nlet b = 2;"
        );
    }

    #[tokio::test]
    async fn empty_bundle_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = MockLedger::new();
        ledger.add_index("sh", &IndexSpec::new("big.shards", &[]));

        let err = Resolver::new(locator(&ledger), false)
            .resolve_index_graph("sh", dir.path(), Revision::Latest)
            .await
            .unwrap_err();
        assert!(matches!(
            err.root_cause(),
            TelaError::Graph(GraphError::EmptyShards(_))
        ));
    }
}
