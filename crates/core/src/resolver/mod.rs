// Path: crates/core/src/resolver/mod.rs

//! Materializes TELA documents and index graphs onto disk.
//!
//! An index is resolved by walking its document references in order. Documents
//! are written below the tree root, embedded libraries recurse one directory
//! deeper, and DocShards bundles are reassembled into a single file. A failed
//! resolution removes the files and directories it created, unless the failure
//! was a pre-existing path. Anything already on disk is left alone.

mod shards;

use crate::locator::{index_docs, Locator, Probe};
use crate::validator::valid_index_version;
use futures::future::{BoxFuture, FutureExt};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tela_telemetry::time::Timer;
use tela_telemetry::{error_metrics, hosting_metrics};
use tela_types::app::TreeClone;
use tela_types::error::{ErrorCode, GraphError, TelaError, ValidationError};
use tela_types::keys;
use tela_types::Result;

/// Which revision of an index to resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Revision {
    /// The current code, subject to the update policy.
    Latest,
    /// The code installed or updated by this transaction.
    Commit(String),
    /// The code as of this topo-height.
    Height(u64),
}

impl Revision {
    /// The revision embedded libraries are resolved at.
    fn nested(&self, commit_height: Option<u64>) -> Revision {
        match (self, commit_height) {
            (Revision::Latest, _) => Revision::Latest,
            (_, Some(h)) => Revision::Height(h),
            (Revision::Height(h), None) => Revision::Height(*h),
            (Revision::Commit(_), None) => Revision::Latest,
        }
    }
}

/// Rejects names that would leave the directory they are joined onto.
pub(crate) fn check_component(name: &str) -> Result<()> {
    let unsafe_name = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0');
    if unsafe_name {
        return Err(GraphError::UnsafePath(name.to_string()).into());
    }
    Ok(())
}

/// Joins `/`-separated `segments` onto `base`, checking every segment.
pub(crate) fn join_sub_dir<'a>(
    base: &Path,
    segments: impl Iterator<Item = &'a str>,
) -> Result<PathBuf> {
    let mut path = base.to_path_buf();
    for segment in segments {
        check_component(segment)?;
        path.push(segment);
    }
    Ok(path)
}

/// Returns the file body held in a document's trailing comment block.
pub fn document_body(code: &str) -> Result<&str> {
    let start = code
        .find("/*")
        .ok_or_else(|| ValidationError::Parse("could not parse multiline comment".into()))?;
    let comment = code.get(start + 2..).unwrap_or_default();
    if !comment.contains("*/") {
        return Err(ValidationError::Parse("could not parse multiline comment".into()).into());
    }
    let comment = comment.trim_end();
    Ok(comment.strip_suffix("*/").unwrap_or(comment).trim())
}

async fn path_exists(path: &Path) -> Result<bool> {
    Ok(tokio::fs::try_exists(path).await?)
}

/// The files and directories one resolution created, in creation order.
#[derive(Debug, Default)]
pub(crate) struct Created {
    files: Vec<PathBuf>,
    dirs: Vec<PathBuf>,
}

impl Created {
    async fn create_dirs(&mut self, dir: &Path) -> Result<()> {
        let mut missing = Vec::new();
        let mut next = Some(dir);
        while let Some(d) = next {
            if d.as_os_str().is_empty() || path_exists(d).await? {
                break;
            }
            missing.push(d.to_path_buf());
            next = d.parent();
        }
        self.dirs.extend(missing.into_iter().rev());
        tokio::fs::create_dir_all(dir).await?;
        Ok(())
    }

    /// Writes `bytes` to `path`, creating parent directories.
    async fn write_file(&mut self, path: &Path, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            self.create_dirs(parent).await?;
        }
        self.files.push(path.to_path_buf());
        tokio::fs::write(path, bytes).await?;
        hosting_metrics().inc_bytes_materialized(bytes.len() as u64);
        Ok(())
    }

    /// Removes everything recorded, newest first.
    async fn unwind(self) {
        let (files, dirs) = (self.files.len(), self.dirs.len());
        for file in self.files.iter().rev() {
            if let Err(e) = tokio::fs::remove_file(file).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(target: "tela::resolver", path = %file.display(), error = %e, "Failed to remove file");
                }
            }
        }
        // A directory that still holds foreign entries stays.
        for dir in self.dirs.iter().rev() {
            if let Err(e) = tokio::fs::remove_dir(dir).await {
                tracing::debug!(target: "tela::resolver", path = %dir.display(), error = %e, "Kept directory");
            }
        }
        tracing::debug!(target: "tela::resolver", files, dirs, "Removed partial tree");
    }
}

fn record_outcome<T>(kind: &'static str, result: &Result<T>) {
    match result {
        Ok(_) => hosting_metrics().inc_resolutions(kind, "ok"),
        Err(e) => {
            hosting_metrics().inc_resolutions(kind, "error");
            error_metrics().inc_error("resolver", e.code());
        }
    }
}

/// State threaded through one index graph resolution.
#[derive(Debug, Default)]
struct Walk {
    in_progress: HashSet<String>,
    created: Created,
}

/// Resolves references into file trees.
#[derive(Debug, Clone)]
pub struct Resolver {
    locator: Locator,
    allow_updates: bool,
}

impl Resolver {
    /// Creates a resolver. With `allow_updates` false, updated indexes are refused.
    pub fn new(locator: Locator, allow_updates: bool) -> Self {
        Self {
            locator,
            allow_updates,
        }
    }

    /// The locator used for every query.
    pub fn locator(&self) -> &Locator {
        &self.locator
    }

    /// Writes document `scid` below `placement`.
    ///
    /// `position` is the document's index in its parent's reference list;
    /// position 0 records the entrypoint and, for documents in a
    /// sub-directory, the serve path.
    pub async fn resolve_document(
        &self,
        scid: &str,
        position: usize,
        placement: &Path,
    ) -> Result<TreeClone> {
        let mut created = Created::default();
        let result = self
            .document_into(scid, position, placement, &mut created)
            .await;
        if matches!(&result, Err(e) if !e.is_already_exists()) {
            created.unwind().await;
        }
        result
    }

    async fn document_into(
        &self,
        scid: &str,
        position: usize,
        placement: &Path,
        created: &mut Created,
    ) -> Result<TreeClone> {
        let doc = self.locator.fetch_document_vars(scid).await?;
        let name = doc.file_name();
        check_component(name)?;

        let path = join_sub_dir(placement, doc.sub_dir_segments())?.join(name);
        if path_exists(&path).await? {
            return Err(TelaError::AlreadyExists(path));
        }

        let body = document_body(&doc.code)?;
        created.write_file(&path, body.as_bytes()).await?;
        tracing::info!(target: "tela::resolver", file = %name, scid, "Created document");

        let is_entry = position == 0;
        let sub_dir = doc.sub_dir.trim_matches('/');
        Ok(TreeClone {
            base_path: placement.to_path_buf(),
            serve_path: if is_entry && !sub_dir.is_empty() {
                format!("/{}", sub_dir)
            } else {
                String::new()
            },
            entrypoint: if is_entry { name.to_string() } else { String::new() },
            durl: doc.durl.clone(),
            commit: None,
        })
    }

    /// Resolves index `scid` and everything it references into `base/<durl>`.
    pub async fn resolve_index_graph(
        &self,
        scid: &str,
        base: &Path,
        revision: Revision,
    ) -> Result<TreeClone> {
        let _timer = Timer::new(hosting_metrics(), "index");
        let mut walk = Walk::default();
        let result = self.index_graph(scid, base, revision, &mut walk).await;
        if matches!(&result, Err(e) if !e.is_already_exists()) {
            walk.created.unwind().await;
        }
        record_outcome("index", &result);
        result
    }

    fn index_graph<'a>(
        &'a self,
        scid: &'a str,
        base: &'a Path,
        revision: Revision,
        walk: &'a mut Walk,
    ) -> BoxFuture<'a, Result<TreeClone>> {
        async move {
            if !walk.in_progress.insert(scid.to_string()) {
                return Err(GraphError::Cycle(scid.to_string()).into());
            }
            let result = self.index_graph_inner(scid, base, &revision, walk).await;
            walk.in_progress.remove(scid);
            result
        }
        .boxed()
    }

    async fn index_graph_inner(
        &self,
        scid: &str,
        base: &Path,
        revision: &Revision,
        walk: &mut Walk,
    ) -> Result<TreeClone> {
        let durl = self.locator.fetch_var(scid, keys::DURL).await?;
        let tag = format!("{}@{}", durl, scid);

        let (code, commit_height) = match revision {
            Revision::Latest => {
                if !self.allow_updates {
                    let hash = self.locator.fetch_var(scid, keys::HASH).await?;
                    if hash != scid {
                        return Err(TelaError::from(GraphError::Updated(format!(
                            "{}@{}",
                            durl, hash
                        )))
                        .context(tag));
                    }
                }
                (self.locator.fetch_code(scid).await?, None)
            }
            Revision::Commit(txid) => {
                let (code, height) = self
                    .locator
                    .fetch_historical_code(scid, txid)
                    .await
                    .map_err(|e| e.context(format!("{}@{}", durl, txid)))?;
                (code, Some(height))
            }
            Revision::Height(h) => (self.locator.fetch_code_at_height(scid, *h).await?, None),
        };

        let (contract, _) = valid_index_version(self.locator.parser(), &code)
            .map_err(|e| TelaError::from(e).context(tag.clone()))?;
        let docs = index_docs(&contract);

        check_component(&durl)?;
        let root = base.join(&durl);
        let nested = revision.nested(commit_height);

        let mut clone = if keys::is_doc_shards(&durl) {
            shards::reconstruct(&self.locator, scid, &docs, &root, &mut walk.created)
                .await
                .map(|()| TreeClone::default())
        } else {
            self.resolve_references(&docs, &root, &nested, walk).await
        }
        .map_err(|e| e.context(tag))?;

        clone.base_path = root;
        clone.durl = durl;
        if let Revision::Commit(txid) = revision {
            clone.commit = Some(txid.clone());
        }
        tracing::info!(target: "tela::resolver", durl = %clone.durl, scid, "Resolved index");
        Ok(clone)
    }

    async fn resolve_references(
        &self,
        docs: &[String],
        root: &Path,
        nested: &Revision,
        walk: &mut Walk,
    ) -> Result<TreeClone> {
        let mut clone = TreeClone::default();
        for (position, doc) in docs.iter().enumerate() {
            match self.locator.probe(doc).await? {
                Probe::Document => {
                    let c = self
                        .document_into(doc, position, root, &mut walk.created)
                        .await
                        .map_err(|e| e.context(doc.clone()))?;
                    if position == 0 {
                        clone.entrypoint = c.entrypoint;
                        clone.serve_path = c.serve_path;
                    }
                }
                Probe::Index => {
                    if position == 0 {
                        return Err(GraphError::EntrypointIsIndex {
                            index: doc.clone(),
                        }
                        .into());
                    }
                    let lib_durl = self.locator.fetch_var(doc, keys::DURL).await?;
                    if !keys::is_library(&lib_durl) && !keys::is_doc_shards(&lib_durl) {
                        return Err(GraphError::NotLibrary(format!("{}@{}", lib_durl, doc)).into());
                    }
                    self.index_graph(doc, root, nested.clone(), walk).await?;
                }
                Probe::Invalid => {
                    return Err(GraphError::InvalidReference(doc.clone()).into());
                }
            }
        }
        Ok(clone)
    }

    /// Resolves `scid` into `root`: a document into `root/<durl>/`, an index into `root/<durl>/`.
    pub async fn clone(&self, scid: &str, root: &Path) -> Result<TreeClone> {
        match self.locator.probe(scid).await? {
            Probe::Document => {
                let _timer = Timer::new(hosting_metrics(), "document");
                let durl = self.locator.fetch_var(scid, keys::DURL).await?;
                check_component(&durl)?;
                let result = self.resolve_document(scid, 0, &root.join(&durl)).await;
                record_outcome("document", &result);
                result
            }
            Probe::Index => self.resolve_index_graph(scid, root, Revision::Latest).await,
            Probe::Invalid => Err(GraphError::InvalidReference(scid.to_string()).into()),
        }
    }

    /// Resolves index `scid` as of transaction `txid` into `root/<durl>/`.
    pub async fn clone_at_commit(&self, scid: &str, txid: &str, root: &Path) -> Result<TreeClone> {
        if self.locator.probe(scid).await? != Probe::Index {
            return Err(GraphError::InvalidReference(scid.to_string()).into());
        }
        self.resolve_index_graph(scid, root, Revision::Commit(txid.to_string()))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{locator, render_index, DocSpec, IndexSpec, MockLedger};

    fn resolver(ledger: &MockLedger, allow_updates: bool) -> Resolver {
        Resolver::new(locator(ledger), allow_updates)
    }

    fn site(ledger: &MockLedger) {
        ledger.add_doc("d1", &DocSpec::new("index.html", "TELA-HTML-1", "<h1>app</h1>"));
        ledger.add_doc("d2", &DocSpec::new("style.css", "TELA-CSS-1", "body{}").sub_dir("css"));
        ledger.add_index("i1", &IndexSpec::new("app.tela", &["d1", "d2"]));
    }

    #[test]
    fn document_body_is_the_trailing_comment() {
        assert_eq!(document_body("code\n/*\n  hello\n*/\n").unwrap(), "hello");
        assert!(document_body("code only").is_err());
        assert!(document_body("code /* open").is_err());
    }

    #[test]
    fn unsafe_components_are_rejected() {
        for name in ["", ".", "..", "a/b", "a\\b"] {
            assert!(check_component(name).is_err(), "{name}");
        }
        assert!(join_sub_dir(Path::new("/t"), "a/../b".split('/')).is_err());
        assert_eq!(
            join_sub_dir(Path::new("/t"), "a/b".split('/')).unwrap(),
            Path::new("/t/a/b")
        );
    }

    #[tokio::test]
    async fn index_tree_is_materialized() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = MockLedger::new();
        site(&ledger);

        let clone = resolver(&ledger, false)
            .resolve_index_graph("i1", dir.path(), Revision::Latest)
            .await
            .unwrap();

        let root = dir.path().join("app.tela");
        assert_eq!(clone.base_path, root);
        assert_eq!(clone.entrypoint, "index.html");
        assert_eq!(clone.serve_path, "");
        assert_eq!(clone.durl, "app.tela");
        assert_eq!(std::fs::read_to_string(root.join("index.html")).unwrap(), "<h1>app</h1>");
        assert_eq!(std::fs::read_to_string(root.join("css/style.css")).unwrap(), "body{}");
    }

    #[tokio::test]
    async fn entry_in_sub_dir_sets_serve_path() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = MockLedger::new();
        ledger.add_doc("d1", &DocSpec::new("a.html", "TELA-HTML-1", "a").sub_dir("x"));
        ledger.add_index("i1", &IndexSpec::new("app.tela", &["d1"]));

        let clone = resolver(&ledger, false)
            .resolve_index_graph("i1", dir.path(), Revision::Latest)
            .await
            .unwrap();
        assert_eq!(clone.serve_path, "/x");
        assert_eq!(clone.entrypoint, "a.html");
        assert!(dir.path().join("app.tela/x/a.html").is_file());
    }

    #[tokio::test]
    async fn index_as_entrypoint_fails_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = MockLedger::new();
        site(&ledger);
        ledger.add_index("lib", &IndexSpec::new("std.lib", &["d2"]));
        ledger.add_index("i2", &IndexSpec::new("bad.tela", &["lib", "d1"]));

        let err = resolver(&ledger, false)
            .resolve_index_graph("i2", dir.path(), Revision::Latest)
            .await
            .unwrap_err();
        assert!(matches!(
            err.root_cause(),
            TelaError::Graph(GraphError::EntrypointIsIndex { .. })
        ));
        assert!(!dir.path().join("bad.tela").exists());
    }

    #[tokio::test]
    async fn non_library_embed_fails_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = MockLedger::new();
        site(&ledger);
        ledger.add_index("i2", &IndexSpec::new("outer.tela", &["d1", "i1"]));

        let err = resolver(&ledger, false)
            .resolve_index_graph("i2", dir.path(), Revision::Latest)
            .await
            .unwrap_err();
        assert!(matches!(err.root_cause(), TelaError::Graph(GraphError::NotLibrary(_))));
        assert!(!dir.path().join("outer.tela").exists());
    }

    #[tokio::test]
    async fn libraries_nest_one_level_deeper() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = MockLedger::new();
        site(&ledger);
        ledger.add_doc("l1", &DocSpec::new("util.js", "TELA-JS-1", "export {}"));
        ledger.add_index("lib", &IndexSpec::new("util.lib", &["l1"]));
        ledger.add_index("i2", &IndexSpec::new("outer.tela", &["d1", "lib"]));

        resolver(&ledger, false)
            .resolve_index_graph("i2", dir.path(), Revision::Latest)
            .await
            .unwrap();
        assert!(dir.path().join("outer.tela/util.lib/util.js").is_file());
    }

    #[tokio::test]
    async fn updated_library_respects_update_policy() {
        let ledger = MockLedger::new();
        site(&ledger);
        ledger.add_doc("l1", &DocSpec::new("util.js", "TELA-JS-1", "export {}"));
        ledger.add_index("lib", &IndexSpec::new("util.lib", &["l1"]));
        ledger.add_index("i2", &IndexSpec::new("outer.tela", &["d1", "lib"]));
        ledger.mark_updated("lib");

        let dir = tempfile::tempdir().unwrap();
        let err = resolver(&ledger, false)
            .resolve_index_graph("i2", dir.path(), Revision::Latest)
            .await
            .unwrap_err();
        assert!(matches!(err.root_cause(), TelaError::Graph(GraphError::Updated(_))));
        assert!(!dir.path().join("outer.tela").exists());

        resolver(&ledger, true)
            .resolve_index_graph("i2", dir.path(), Revision::Latest)
            .await
            .unwrap();
        assert!(dir.path().join("outer.tela/util.lib/util.js").is_file());
    }

    #[tokio::test]
    async fn existing_files_are_not_overwritten_or_removed() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = MockLedger::new();
        site(&ledger);
        let existing = dir.path().join("app.tela/css/style.css");
        std::fs::create_dir_all(existing.parent().unwrap()).unwrap();
        std::fs::write(&existing, "keep me").unwrap();

        let err = resolver(&ledger, false)
            .resolve_index_graph("i1", dir.path(), Revision::Latest)
            .await
            .unwrap_err();
        assert!(err.is_already_exists());
        assert_eq!(std::fs::read_to_string(&existing).unwrap(), "keep me");
    }

    #[tokio::test]
    async fn failure_keeps_files_that_were_already_there() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = MockLedger::new();
        site(&ledger);
        ledger.add_raw("junk", "Function A() Uint64\n10 RETURN 0\nEnd Function");
        ledger.add_index("i2", &IndexSpec::new("app.tela", &["d1", "d2", "junk"]));
        let root = dir.path().join("app.tela");
        std::fs::create_dir_all(&root).unwrap();
        std::fs::write(root.join("keep.txt"), "mine").unwrap();

        let err = resolver(&ledger, false)
            .resolve_index_graph("i2", dir.path(), Revision::Latest)
            .await
            .unwrap_err();
        assert!(matches!(
            err.root_cause(),
            TelaError::Graph(GraphError::InvalidReference(_))
        ));
        assert_eq!(std::fs::read_to_string(root.join("keep.txt")).unwrap(), "mine");
        assert!(!root.join("index.html").exists());
        assert!(!root.join("css").exists());
    }

    #[tokio::test]
    async fn failed_library_leaves_no_partial_tree() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = MockLedger::new();
        site(&ledger);
        ledger.add_raw("junk", "Function A() Uint64\n10 RETURN 0\nEnd Function");
        ledger.add_doc("l1", &DocSpec::new("util.js", "TELA-JS-1", "export {}").sub_dir("a/b"));
        ledger.add_index("lib", &IndexSpec::new("util.lib", &["l1", "junk"]));
        ledger.add_index("i2", &IndexSpec::new("outer.tela", &["d1", "lib"]));

        resolver(&ledger, false)
            .resolve_index_graph("i2", dir.path(), Revision::Latest)
            .await
            .unwrap_err();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn cycles_fail_fast() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = MockLedger::new();
        ledger.add_doc("d1", &DocSpec::new("a.js", "TELA-JS-1", "a"));
        ledger.add_index("a", &IndexSpec::new("a.lib", &["d1", "b"]));
        ledger.add_index("b", &IndexSpec::new("b.lib", &["d1", "a"]));

        let err = resolver(&ledger, false)
            .resolve_index_graph("a", dir.path(), Revision::Latest)
            .await
            .unwrap_err();
        assert!(matches!(err.root_cause(), TelaError::Graph(GraphError::Cycle(_))));
        assert!(!dir.path().join("a.lib").exists());
    }

    #[tokio::test]
    async fn invalid_reference_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = MockLedger::new();
        ledger.add_raw("junk", "Function A() Uint64\n10 RETURN 0\nEnd Function");
        ledger.add_index("i1", &IndexSpec::new("app.tela", &["junk"]));

        let err = resolver(&ledger, false)
            .resolve_index_graph("i1", dir.path(), Revision::Latest)
            .await
            .unwrap_err();
        assert!(matches!(
            err.root_cause(),
            TelaError::Graph(GraphError::InvalidReference(_))
        ));
    }

    #[tokio::test]
    async fn single_document_clone() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = MockLedger::new();
        site(&ledger);

        let clone = resolver(&ledger, false).clone("d2", dir.path()).await.unwrap();
        assert_eq!(clone.base_path, dir.path().join("style.css"));
        assert!(dir.path().join("style.css/css/style.css").is_file());
    }

    #[tokio::test]
    async fn clone_at_commit_uses_historical_code() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = MockLedger::new();
        site(&ledger);
        ledger.add_doc("d3", &DocSpec::new("new.html", "TELA-HTML-1", "new"));
        ledger.add_doc("l1", &DocSpec::new("old.js", "TELA-JS-1", "old"));
        ledger.add_doc("l2", &DocSpec::new("new.js", "TELA-JS-1", "new"));
        ledger.add_index("lib", &IndexSpec::new("util.lib", &["l2"]));
        ledger.set_code_at("lib", 90, &render_index(&IndexSpec::new("util.lib", &["l1"])));

        let old = render_index(&IndexSpec::new("app.tela", &["d1", "lib"]));
        ledger.add_tx("tx1", "i1", &old, 100);
        ledger.update_code("i1", 150, &render_index(&IndexSpec::new("app.tela", &["d3"])));
        ledger.mark_updated("i1");

        let clone = resolver(&ledger, false)
            .clone_at_commit("i1", "tx1", dir.path())
            .await
            .unwrap();
        assert_eq!(clone.commit.as_deref(), Some("tx1"));
        assert_eq!(clone.entrypoint, "index.html");
        let root = dir.path().join("app.tela");
        assert!(root.join("index.html").is_file());
        assert!(root.join("util.lib/old.js").is_file());
        assert!(!root.join("new.html").exists());
    }
}
