use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use clap::Parser;

use crate::action_executor::{self, ActionError};
use crate::config::{self, parse_limit, Config, ConfigError};
use crate::contract::{DisplayItem, RenderResultList};
use crate::node_cache::{SystemClock, StatusProvider};
use crate::query_service::{PeerQueryService, QueryHandler};
use crate::status::TailscaleCli;
use crate::transport::Transport;

#[derive(Debug)]
pub enum RuntimeError {
    Config(ConfigError),
    Action(ActionError),
    Io(std::io::Error),
    Encode(serde_json::Error),
    NoResults(String),
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(error) => write!(f, "config error: {error}"),
            Self::Action(error) => write!(f, "action error: {error}"),
            Self::Io(error) => write!(f, "io error: {error}"),
            Self::Encode(error) => write!(f, "encode error: {error}"),
            Self::NoResults(query) => write!(f, "no nodes match '{query}'"),
        }
    }
}

impl std::error::Error for RuntimeError {}

impl From<ConfigError> for RuntimeError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<ActionError> for RuntimeError {
    fn from(value: ActionError) -> Self {
        Self::Action(value)
    }
}

impl From<std::io::Error> for RuntimeError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for RuntimeError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

/// Search Tailscale nodes by hostname and copy their IPv4 address.
#[derive(Debug, Clone, Parser, PartialEq, Eq)]
#[command(name = "tailpick", version)]
pub struct RuntimeOptions {
    /// Hostname query; words are joined with spaces.
    pub query: Vec<String>,

    /// Maximum number of results (overrides the configured limit).
    #[arg(long)]
    pub limit: Option<String>,

    /// Print the render list as JSON.
    #[arg(long)]
    pub json: bool,

    /// Copy the top result's address to the clipboard.
    #[arg(long, conflicts_with = "serve")]
    pub copy: bool,

    /// Answer JSON requests line by line on stdin/stdout.
    #[arg(long, conflicts_with_all = ["json", "query"])]
    pub serve: bool,

    /// Config file location.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl RuntimeOptions {
    pub fn query_text(&self) -> String {
        self.query.join(" ")
    }
}

pub fn parse_cli_args(args: &[String]) -> Result<RuntimeOptions, clap::Error> {
    let argv = std::iter::once("tailpick".to_string()).chain(args.iter().cloned());
    RuntimeOptions::try_parse_from(argv)
}

pub fn run_with_options(options: RuntimeOptions) -> Result<(), RuntimeError> {
    let config = load_or_create_config(options.config.as_deref())?;
    let limit = match options.limit.as_deref() {
        Some(raw) => parse_limit(raw)?,
        None => config.result_limit()?,
    };
    tracing::info!(
        config_path = %config.config_path.display(),
        status_command = %config.status_command,
        limit,
        serve = options.serve,
        "startup"
    );

    let mut service = build_service(&config);
    let stdout = std::io::stdout();

    if options.serve {
        let stdin = std::io::stdin();
        return serve(Transport::new(service, limit), stdin.lock(), stdout.lock());
    }

    let query = options.query_text();
    let items = service.handle_query(&query, limit);
    if options.copy {
        let top = items
            .first()
            .ok_or_else(|| RuntimeError::NoResults(query.clone()))?;
        action_executor::execute(&top.action)?;
    }

    let mut out = stdout.lock();
    if options.json {
        serde_json::to_writer(&mut out, &RenderResultList { items })?;
        writeln!(out)?;
    } else {
        write_plain(&mut out, &items)?;
    }
    Ok(())
}

/// Loads the config, writing the defaults out first if the file is missing.
pub fn load_or_create_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let config = config::load(path)?;
    if !config.config_path.exists() {
        config::save(&config)?;
        tracing::info!(
            config_path = %config.config_path.display(),
            "wrote default config"
        );
    }
    Ok(config)
}

pub fn build_service(config: &Config) -> PeerQueryService<TailscaleCli, SystemClock> {
    let provider = StatusProvider::with_clock(
        TailscaleCli::new(config.status_command.trim()),
        SystemClock,
        config.cache_ttl(),
    );
    PeerQueryService::new(provider).with_icon_path(config.icon_path.clone())
}

/// One request per input line, one response per output line, until EOF.
pub fn serve<H, R, W>(
    mut transport: Transport<'_, H>,
    input: R,
    mut output: W,
) -> Result<(), RuntimeError>
where
    H: QueryHandler,
    R: BufRead,
    W: Write,
{
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let response = transport.handle_json(&line);
        writeln!(output, "{response}")?;
        output.flush()?;
    }
    tracing::info!("serve loop finished");
    Ok(())
}

fn write_plain(out: &mut impl Write, items: &[DisplayItem]) -> Result<(), std::io::Error> {
    for item in items {
        writeln!(out, "{}\t{}", item.label, item.subtitle)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{load_or_create_config, parse_cli_args, write_plain};
    use crate::config::{self, Config};
    use crate::model::PeerNode;
    use crate::query_service::display_item;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn unique_config_path(label: &str) -> std::path::PathBuf {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        std::env::temp_dir()
            .join(format!("tailpick-{label}-{}-{unique}", std::process::id()))
            .join("config.toml")
    }

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn query_words_are_joined() {
        let options = parse_cli_args(&args(&["web", "srv", "--limit", "3"])).unwrap();
        assert_eq!(options.query_text(), "web srv");
        assert_eq!(options.limit.as_deref(), Some("3"));
        assert!(!options.serve);
    }

    #[test]
    fn serve_rejects_query_words() {
        assert!(parse_cli_args(&args(&["--serve", "srv"])).is_err());
    }

    #[test]
    fn plain_output_is_tab_separated() {
        let node = PeerNode::new("server", "100.2.2.2", false);
        let items = vec![display_item(&node, "icon.png")];
        let mut out = Vec::new();
        write_plain(&mut out, &items).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "server (offline)\t100.2.2.2\n");
    }

    #[test]
    fn missing_config_is_written_with_defaults() {
        let path = unique_config_path("create-default");
        assert!(!path.exists());

        let created = load_or_create_config(Some(path.as_path())).expect("config should load");

        assert!(path.exists());
        let reloaded = config::load(Some(path.as_path())).expect("written config should load");
        std::fs::remove_dir_all(path.parent().unwrap()).expect("temp dir should be removed");
        assert_eq!(created, reloaded);
        assert_eq!(reloaded.limit, Config::default().limit);
    }

    #[test]
    fn existing_config_is_left_untouched() {
        let path = unique_config_path("keep-existing");
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "limit = \"4\"\n").unwrap();

        let loaded = load_or_create_config(Some(path.as_path())).expect("config should load");
        let raw = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_dir_all(path.parent().unwrap()).unwrap();

        assert_eq!(loaded.limit, "4");
        assert_eq!(raw, "limit = \"4\"\n");
    }
}
