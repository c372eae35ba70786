// Path: crates/types/src/error/mod.rs
//! Core error types for TELA hosting.

use std::path::PathBuf;
use thiserror::Error;

/// A trait for assigning a stable, machine-readable string code to an error.
pub trait ErrorCode {
    /// Returns the unique, stable string identifier for this error variant.
    fn code(&self) -> &'static str;
}

/// Errors raised while checking a contract against the canonical templates.
///
/// Variants name the aspect that differed, never the differing content.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// The contract source could not be parsed.
    #[error("Parse error: {0}")]
    Parse(String),
    /// The two contracts define different sets of functions.
    #[error("Function set does not match")]
    FunctionSet,
    /// A function has a different number of lines.
    #[error("Line count does not match in function {function}")]
    LineCount {
        /// The function that differed.
        function: String,
    },
    /// A line has a different number of parts.
    #[error("Line parts do not match in function {function}")]
    LineParts {
        /// The function that differed.
        function: String,
    },
    /// A line part differs.
    #[error("Line token does not match in function {function}")]
    Token {
        /// The function that differed.
        function: String,
    },
    /// The code matched none of the supported template versions.
    #[error("Not a valid {kind} template")]
    NotTemplate {
        /// Which template family was tried, `DOC` or `INDEX`.
        kind: &'static str,
    },
    /// The stored content language is not one of the accepted tags.
    #[error("Invalid docType: {0}")]
    InvalidDocType(String),
}

impl ErrorCode for ValidationError {
    fn code(&self) -> &'static str {
        match self {
            Self::Parse(_) => "VALIDATION_PARSE_ERROR",
            Self::FunctionSet => "VALIDATION_FUNCTION_SET",
            Self::LineCount { .. } => "VALIDATION_LINE_COUNT",
            Self::LineParts { .. } => "VALIDATION_LINE_PARTS",
            Self::Token { .. } => "VALIDATION_TOKEN",
            Self::NotTemplate { .. } => "VALIDATION_NOT_TEMPLATE",
            Self::InvalidDocType(_) => "VALIDATION_INVALID_DOC_TYPE",
        }
    }
}

/// Errors returned by the remote ledger interface.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// The request could not be delivered or the response could not be read.
    #[error("Transport error: {0}")]
    Transport(String),
    /// The daemon answered with a JSON-RPC error object.
    #[error("RPC error {code}: {message}")]
    Rpc {
        /// The JSON-RPC error code.
        code: i64,
        /// The JSON-RPC error message.
        message: String,
    },
    /// A response was received but could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),
    /// The contract has no code.
    #[error("Code is empty for {0}")]
    EmptyCode(String),
    /// A required variable is not stored on the contract.
    #[error("Could not get {key} from {scid}")]
    MissingVar {
        /// The contract queried.
        scid: String,
        /// The variable that was missing.
        key: String,
    },
    /// The transaction could not be found.
    #[error("Transaction not found: {0}")]
    TxNotFound(String),
    /// The transaction carries no contract code.
    #[error("No code found in transaction {0}")]
    NoCodeInTx(String),
    /// The transaction neither installs nor references the contract.
    #[error("Transaction {txid} does not target {scid}")]
    TxTargetMismatch {
        /// The transaction id.
        txid: String,
        /// The contract the code was requested for.
        scid: String,
    },
}

impl ErrorCode for LedgerError {
    fn code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "LEDGER_TRANSPORT_ERROR",
            Self::Rpc { .. } => "LEDGER_RPC_ERROR",
            Self::Decode(_) => "LEDGER_DECODE_ERROR",
            Self::EmptyCode(_) => "LEDGER_EMPTY_CODE",
            Self::MissingVar { .. } => "LEDGER_MISSING_VAR",
            Self::TxNotFound(_) => "LEDGER_TX_NOT_FOUND",
            Self::NoCodeInTx(_) => "LEDGER_NO_CODE_IN_TX",
            Self::TxTargetMismatch { .. } => "LEDGER_TX_TARGET_MISMATCH",
        }
    }
}

/// Errors raised while walking an index's reference graph.
#[derive(Error, Debug)]
pub enum GraphError {
    /// An index was found where the entrypoint document should be.
    #[error("Entrypoint of {index} is an index")]
    EntrypointIsIndex {
        /// The index being resolved.
        index: String,
    },
    /// An embedded index is not tagged as a library.
    #[error("Embedded index {0} is not a library")]
    NotLibrary(String),
    /// The contract's code was updated and updates are not allowed.
    #[error("User defined no updates and {0} has been updated")]
    Updated(String),
    /// A reference is neither a document nor an index.
    #[error("Could not validate {0} as a TELA document or index")]
    InvalidReference(String),
    /// A reference was reached again while it was still being resolved.
    #[error("Reference cycle through {0}")]
    Cycle(String),
    /// A DocShards bundle holds no documents.
    #[error("DocShards index {0} has no shards")]
    EmptyShards(String),
    /// A stored name or sub-directory would escape the tree root.
    #[error("Unsafe path component: {0}")]
    UnsafePath(String),
}

impl ErrorCode for GraphError {
    fn code(&self) -> &'static str {
        match self {
            Self::EntrypointIsIndex { .. } => "GRAPH_ENTRYPOINT_IS_INDEX",
            Self::NotLibrary(_) => "GRAPH_NOT_LIBRARY",
            Self::Updated(_) => "GRAPH_UPDATED",
            Self::InvalidReference(_) => "GRAPH_INVALID_REFERENCE",
            Self::Cycle(_) => "GRAPH_CYCLE",
            Self::EmptyShards(_) => "GRAPH_EMPTY_SHARDS",
            Self::UnsafePath(_) => "GRAPH_UNSAFE_PATH",
        }
    }
}

/// Errors related to the server registry.
#[derive(Error, Debug)]
pub enum HostError {
    /// Every port in the configured range is taken.
    #[error("Could not find open port")]
    NoOpenPort,
    /// The registry already holds the maximum number of servers.
    #[error("Already have {0} active servers")]
    AtCapacity(usize),
    /// The port is outside the accepted range.
    #[error("Invalid port {0}")]
    InvalidPort(u16),
    /// Libraries and DocShards bundles cannot be hosted directly.
    #[error("{0} cannot be served")]
    NotServable(String),
    /// Historical revisions are only available with updates allowed.
    #[error("Cannot serve at commit without allowing updates")]
    UpdatesDisabled,
    /// No active server matches the requested contract.
    #[error("Could not find active server for {0}")]
    NoActiveServer(String),
    /// The listener could not be bound.
    #[error("Bind error: {0}")]
    Bind(String),
}

impl ErrorCode for HostError {
    fn code(&self) -> &'static str {
        match self {
            Self::NoOpenPort => "HOST_NO_OPEN_PORT",
            Self::AtCapacity(_) => "HOST_AT_CAPACITY",
            Self::InvalidPort(_) => "HOST_INVALID_PORT",
            Self::NotServable(_) => "HOST_NOT_SERVABLE",
            Self::UpdatesDisabled => "HOST_UPDATES_DISABLED",
            Self::NoActiveServer(_) => "HOST_NO_ACTIVE_SERVER",
            Self::Bind(_) => "HOST_BIND_ERROR",
        }
    }
}

/// Errors related to link parsing and dispatch.
#[derive(Error, Debug)]
pub enum LinkError {
    /// The link has no `://` separator.
    #[error("Invalid link format")]
    Malformed,
    /// The link addresses something other than TELA content.
    #[error("Unsupported link target: {0}")]
    UnsupportedTarget(String),
    /// The link names an action this resolver does not perform.
    #[error("Unsupported link action: {0}")]
    UnsupportedAction(String),
    /// A required argument is missing.
    #[error("Missing link argument: {0}")]
    MissingArgument(&'static str),
}

impl ErrorCode for LinkError {
    fn code(&self) -> &'static str {
        match self {
            Self::Malformed => "LINK_MALFORMED",
            Self::UnsupportedTarget(_) => "LINK_UNSUPPORTED_TARGET",
            Self::UnsupportedAction(_) => "LINK_UNSUPPORTED_ACTION",
            Self::MissingArgument(_) => "LINK_MISSING_ARGUMENT",
        }
    }
}

/// The top-level error type of the workspace.
#[derive(Error, Debug)]
pub enum TelaError {
    /// A template validation error.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
    /// A remote ledger error.
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
    /// A reference graph error.
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),
    /// A hosting error.
    #[error("Host error: {0}")]
    Host(#[from] HostError),
    /// A link error.
    #[error("Link error: {0}")]
    Link(#[from] LinkError),
    /// The target path was already present and was left untouched.
    #[error("{0} already exists")]
    AlreadyExists(PathBuf),
    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// A configuration error occurred.
    #[error("Configuration error: {0}")]
    Config(String),
    /// Wraps an error with the reference that was being resolved.
    #[error("{target}: {source}")]
    Resolution {
        /// The reference being resolved.
        target: String,
        /// The underlying error.
        #[source]
        source: Box<TelaError>,
    },
}

impl TelaError {
    /// Wraps `self` with the reference being resolved.
    pub fn context(self, target: impl Into<String>) -> Self {
        TelaError::Resolution {
            target: target.into(),
            source: Box::new(self),
        }
    }

    /// Returns the innermost error, looking through `Resolution` wrappers.
    pub fn root_cause(&self) -> &TelaError {
        match self {
            TelaError::Resolution { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Returns true if the root cause is a pre-existing path.
    pub fn is_already_exists(&self) -> bool {
        matches!(self.root_cause(), TelaError::AlreadyExists(_))
    }
}

impl ErrorCode for TelaError {
    fn code(&self) -> &'static str {
        match self {
            Self::Validation(e) => e.code(),
            Self::Ledger(e) => e.code(),
            Self::Graph(e) => e.code(),
            Self::Host(e) => e.code(),
            Self::Link(e) => e.code(),
            Self::AlreadyExists(_) => "TELA_ALREADY_EXISTS",
            Self::Io(_) => "TELA_IO_ERROR",
            Self::Config(_) => "TELA_CONFIG_ERROR",
            Self::Resolution { source, .. } => source.code(),
        }
    }
}
