//! `pubview keys`: message keys grouped by version.

use anyhow::Result;
use clap::{Args, ValueEnum};
use pubview_core::normalize::{KeyAccessor, NormalizeMode, Normalized, VersionKeys, normalize};
use std::io::{self, Write};

use super::{Context, RemoteArgs, fetch_remote};
use crate::output::{OutputMode, Renderable, pretty_section, render_list};

/// Where each element of a version bucket keeps its key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum KeyPath {
    /// `content.key`
    #[default]
    Content,
    /// `key` on the element itself
    Envelope,
}

impl From<KeyPath> for KeyAccessor {
    fn from(path: KeyPath) -> Self {
        match path {
            KeyPath::Content => Self::Content,
            KeyPath::Envelope => Self::Envelope,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct KeysArgs {
    /// Position id to fetch.
    pub position_id: String,

    /// Key location inside each message.
    #[arg(long, value_enum, default_value_t = KeyPath::Content)]
    pub key_path: KeyPath,

    #[command(flatten)]
    pub remote: RemoteArgs,
}

impl Renderable for VersionKeys {
    fn render_human(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "Version {} ({} keys)", self.version, self.keys.len())?;
        for key in &self.keys {
            writeln!(w, "  {key}")?;
        }
        Ok(())
    }

    fn render_json(&self, w: &mut dyn Write) -> io::Result<()> {
        serde_json::to_writer(w, self).map_err(io::Error::from)
    }

    fn render_table(&self, w: &mut dyn Write) -> io::Result<()> {
        writeln!(w, "{}  {}", self.version, self.keys.join(","))
    }

    fn table_headers() -> &'static [&'static str] {
        &["VERSION", "KEYS"]
    }
}

pub fn run_keys(args: &KeysArgs, ctx: &Context) -> Result<()> {
    let raw = fetch_remote(ctx, &args.remote, &args.position_id)?;
    let summary = match normalize(&raw, NormalizeMode::KeySummary(args.key_path.into())) {
        Normalized::KeySummary(summary) => summary,
        Normalized::FullTable(_) => Vec::new(),
    };

    if ctx.output == OutputMode::Pretty {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        pretty_section(&mut out, "GUIDs by Version")?;
        if summary.is_empty() {
            writeln!(out, "(no messages)")?;
        }
    }
    render_list(&summary, ctx.output)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> VersionKeys {
        VersionKeys {
            version: "2".into(),
            keys: vec!["k1".into(), "k2".into()],
        }
    }

    #[test]
    fn text_row_joins_keys() {
        let mut buf = Vec::new();
        sample().render_table(&mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "2  k1,k2\n");
    }

    #[test]
    fn human_lists_keys_indented() {
        let mut buf = Vec::new();
        sample().render_human(&mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "Version 2 (2 keys)\n  k1\n  k2\n");
    }

    #[test]
    fn json_is_version_and_keys() {
        let mut buf = Vec::new();
        sample().render_json(&mut buf).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value, serde_json::json!({ "version": "2", "keys": ["k1", "k2"] }));
    }
}
