// Path: crates/core/src/link.rs

//! `open://` and `tela://` links.
//!
//! A link has the form `open://<scid>/<path>...`, or `tela://open/<scid>/<path>...`
//! with the action spelled out. Opening a link serves the referenced index if
//! it is not already hosted, then points into it.

use crate::registry::Registry;
use tela_types::error::{HostError, LinkError};
use tela_types::Result;

/// Link target carrying the action as its first argument.
pub const TARGET_TELA: &str = "tela";
/// The only link action this crate performs. Also accepted as a target.
pub const ACTION_OPEN: &str = "open";

/// Splits `link` into its target and its `/`-separated arguments.
pub fn parse_link(link: &str) -> Result<(String, Vec<String>), LinkError> {
    let (target, rest) = link.split_once("://").ok_or(LinkError::Malformed)?;
    let args = rest.split('/').map(str::to_string).collect();
    Ok((target.to_string(), args))
}

/// Serves the content `link` points at and returns a URL into it.
///
/// If the content is already hosted, the URL points at the root of the
/// existing server. Path segments after the SCID are appended to the URL.
pub async fn resolve_link(registry: &Registry, link: &str) -> Result<String> {
    let (target, args) = parse_link(link)?;
    let mut args = args.into_iter();
    match target.as_str() {
        ACTION_OPEN => {}
        TARGET_TELA => match args.next().as_deref() {
            Some(ACTION_OPEN) => {}
            Some(other) => return Err(LinkError::UnsupportedAction(other.to_string()).into()),
            None => return Err(LinkError::MissingArgument("action").into()),
        },
        _ => return Err(LinkError::UnsupportedTarget(target).into()),
    }
    let scid = args
        .next()
        .filter(|s| !s.is_empty())
        .ok_or(LinkError::MissingArgument("scid"))?;
    let path: Vec<String> = args.collect();

    let mut url = match registry.serve(&scid).await {
        Ok(url) => {
            if path.is_empty() {
                url
            } else {
                let entrypoint = registry
                    .server_info()
                    .into_iter()
                    .find(|s| s.scid == scid)
                    .map(|s| format!("/{}", s.entrypoint))
                    .unwrap_or_default();
                url.strip_suffix(&entrypoint).unwrap_or(&url).to_string()
            }
        }
        Err(e) if e.is_already_exists() => {
            let server = registry
                .server_info()
                .into_iter()
                .find(|s| s.scid == scid)
                .ok_or_else(|| HostError::NoActiveServer(scid.clone()))?;
            tracing::debug!(target: "tela::link", scid = %scid, address = %server.address, "Reusing server");
            format!("http://localhost{}", server.address)
        }
        Err(e) => return Err(e),
    };

    for segment in path {
        url.push('/');
        url.push_str(&segment);
    }
    Ok(url)
}
