//! MCP server descriptors and the TOML fallback scan.
//!
//! Servers are referenced by name from `selected_mcp_servers`. When the CLI
//! cannot enumerate its own servers, the referenced config file is scanned
//! for `[mcp.servers.<name>]` table headers instead.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;

/// How the CLI reaches an MCP server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "transport", rename_all = "lowercase")]
pub enum McpTransport {
    Stdio {
        command: String,
        #[serde(default)]
        args: Vec<String>,
    },
    Http {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        bearer_token_env_var: Option<String>,
    },
}

impl McpTransport {
    /// Build a stdio transport from a single command line, splitting the
    /// argument string shell-style. An unparseable line keeps the raw string
    /// as one argument rather than dropping it.
    pub fn stdio(command: impl Into<String>, args_line: &str) -> Self {
        let args = match shlex::split(args_line) {
            Some(parts) => parts,
            None if args_line.trim().is_empty() => Vec::new(),
            None => vec![args_line.to_string()],
        };
        Self::Stdio {
            command: command.into(),
            args,
        }
    }
}

/// A named MCP server definition, owned by configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpServerConfig {
    pub name: String,
    #[serde(flatten)]
    pub transport: McpTransport,
    #[serde(default = "default_startup_timeout")]
    pub startup_timeout_secs: u64,
    #[serde(default = "default_tool_timeout")]
    pub tool_timeout_secs: u64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_startup_timeout() -> u64 {
    10
}

fn default_tool_timeout() -> u64 {
    60
}

fn default_enabled() -> bool {
    true
}

fn server_table_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Matches [mcp.servers."quoted-name"] and [mcp.servers.bare_name].
    RE.get_or_init(|| {
        Regex::new(r#"\[mcp\.servers\.(?:"([^"]+)"|([^\]"]+))\]"#).expect("static regex")
    })
}

/// Extract server names from `[mcp.servers.*]` table headers in TOML text.
///
/// Accepts both the quoted and the bare key form. Order of appearance is
/// preserved; duplicates are dropped.
pub fn parse_server_names(toml_text: &str) -> Vec<String> {
    let mut names = Vec::new();
    for caps in server_table_regex().captures_iter(toml_text) {
        let name = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str().trim().to_string())
            .unwrap_or_default();
        if !name.is_empty() && !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// Scan a config file for MCP server names. Missing or unreadable files
/// yield an empty list; the fallback is advisory, never fatal.
pub fn server_names_from_file(path: &Path) -> Vec<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_server_names(&content),
        Err(e) => {
            log::debug!("mcp fallback: cannot read {}: {e}", path.display());
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_quoted_and_bare_table_names() {
        let toml = r#"
[mcp.servers."web-search"]
url = "https://search.example.com"

[mcp.servers.github]
command = "gh-mcp"
"#;
        let names = parse_server_names(toml);
        assert_eq!(names, vec!["web-search".to_string(), "github".to_string()]);
    }

    #[test]
    fn ignores_unrelated_tables() {
        let toml = r#"
[model]
name = "kimi-k2"

[mcp]
enabled = true

[servers.rogue]
command = "nope"
"#;
        assert!(parse_server_names(toml).is_empty());
    }

    #[test]
    fn deduplicates_repeated_names() {
        let toml = "[mcp.servers.a]\n[mcp.servers.\"a\"]\n[mcp.servers.b]\n";
        assert_eq!(
            parse_server_names(toml),
            vec!["a".to_string(), "b".to_string()]
        );
    }

    #[test]
    fn missing_file_yields_empty_list() {
        assert!(server_names_from_file(Path::new("/nonexistent/config.toml")).is_empty());
    }

    #[test]
    fn reads_names_from_file() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "[mcp.servers.\"web-search\"]").unwrap();
        writeln!(tmp, "[mcp.servers.github]").unwrap();
        let names = server_names_from_file(tmp.path());
        assert!(names.contains(&"web-search".to_string()));
        assert!(names.contains(&"github".to_string()));
    }

    #[test]
    fn stdio_transport_splits_args_shell_style() {
        let t = McpTransport::stdio("serena", "--stdio --project \"my dir\"");
        assert_eq!(
            t,
            McpTransport::Stdio {
                command: "serena".into(),
                args: vec!["--stdio".into(), "--project".into(), "my dir".into()],
            }
        );
    }

    #[test]
    fn server_config_defaults_apply() {
        let toml = r#"
name = "web-search"
transport = "http"
url = "https://search.example.com"
"#;
        let cfg: McpServerConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.startup_timeout_secs, 10);
        assert_eq!(cfg.tool_timeout_secs, 60);
        assert!(cfg.enabled);
        assert!(matches!(cfg.transport, McpTransport::Http { .. }));
    }

    #[test]
    fn server_config_roundtrips_stdio() {
        let cfg = McpServerConfig {
            name: "fs".into(),
            transport: McpTransport::stdio("mcp-fs", "--root /tmp"),
            startup_timeout_secs: 5,
            tool_timeout_secs: 30,
            enabled: false,
        };
        let text = toml::to_string(&cfg).unwrap();
        let back: McpServerConfig = toml::from_str(&text).unwrap();
        assert_eq!(back, cfg);
    }
}
