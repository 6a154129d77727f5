//! Fenced code block conversion.

use crate::{
    config::MarkdownConfig,
    doc::{Node, parse_fragment},
    exec,
    utils::exec::resolve_command,
};
use anyhow::{Context, Result};
use std::io::Write;

/// Turns the markdown inside a fenced block into canonical nodes.
pub trait CodeConverter {
    fn convert(&self, markdown: &str) -> Result<Vec<Node>>;
}

/// Converter backed by an external markdown-to-HTML command (pandoc by default).
///
/// The block is written to a temporary `.md` file, passed as the last
/// argument; the command's stdout must be well-formed XML.
pub struct CommandConverter<'a> {
    config: &'a MarkdownConfig,
}

impl<'a> CommandConverter<'a> {
    pub fn new(config: &'a MarkdownConfig) -> Self {
        Self { config }
    }
}

impl CodeConverter for CommandConverter<'_> {
    fn convert(&self, markdown: &str) -> Result<Vec<Node>> {
        let command = resolve_command(&[&self.config.command, &self.config.fallback])?;

        let mut input = tempfile::Builder::new()
            .prefix("petur-code-")
            .suffix(".md")
            .tempfile()
            .context("Failed to create markdown input file")?;
        input.write_all(markdown.as_bytes())?;
        input.flush()?;

        let output = exec!(command; input.path())?;
        let html = String::from_utf8(output.stdout).context("Converter output is not UTF-8")?;

        parse_fragment(&html).context("Converter output is not well-formed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_converter_is_an_error() {
        let config = MarkdownConfig {
            command: vec!["petur-no-such-converter".into()],
            fallback: vec!["petur-no-such-fallback".into()],
        };
        let err = CommandConverter::new(&config).convert("*x*").unwrap_err();
        assert!(err.to_string().contains("petur-no-such-converter"));
    }

    #[cfg(unix)]
    #[test]
    fn test_stdout_becomes_nodes() {
        // `cat` echoes the temp file, standing in for a real converter.
        let config = MarkdownConfig {
            command: vec!["cat".into()],
            fallback: vec![],
        };
        let nodes = CommandConverter::new(&config)
            .convert("<p>one</p>\n<pre>two</pre>")
            .unwrap();

        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].as_element().unwrap().text(), "one");
    }

    #[cfg(unix)]
    #[test]
    fn test_malformed_output_is_an_error() {
        let config = MarkdownConfig {
            command: vec!["cat".into()],
            fallback: vec![],
        };
        assert!(CommandConverter::new(&config).convert("<p>open").is_err());
    }
}
