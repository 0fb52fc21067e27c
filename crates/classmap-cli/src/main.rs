#![deny(unsafe_code)]

//! classmap CLI — inspect and query manifest-driven symbol indexes.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use classmap_config::AppConfig;
use classmap_core::{IndexSource, Resolver, Services};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// classmap — resolve symbols to files through includepath manifests.
#[derive(Parser)]
#[command(name = "classmap", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file.
    #[arg(short, long, default_value = "classmap.toml")]
    config: PathBuf,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Index root to register, in precedence order. Replaces `index.roots`.
    #[arg(short, long = "root", global = true)]
    roots: Vec<String>,

    /// Developer mode: bypass the cache for this run.
    #[arg(long, global = true)]
    dev: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the file a symbol maps to.
    Locate {
        /// Symbol name, in any case.
        symbol: String,
    },

    /// Print every mapped symbol with its file.
    List,

    /// Print registered autoloaders in the order they are tried.
    Autoloaders,

    /// Print registered classpaths.
    Classpaths,

    /// Build every root from scratch and report what it contributes.
    Check,

    /// Validate and display configuration.
    Config {
        /// Show the resolved configuration.
        #[arg(long)]
        show: bool,
    },

    /// Print version and build information.
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(&cli.config).await?;
    if !cli.roots.is_empty() {
        config.index.roots = cli.roots.clone();
    }
    if cli.dev {
        config.runtime.developer_mode = true;
    }

    // Set up tracing subscriber; -v flags override the configured level
    let filter = match cli.verbose {
        0 => config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let mut out = io::stdout().lock();
    match cli.command {
        Commands::Locate { symbol } => cmd_locate(&config, &symbol, &mut out)?,
        Commands::List => cmd_list(&config, &mut out)?,
        Commands::Autoloaders => cmd_autoloaders(&config, &mut out)?,
        Commands::Classpaths => cmd_classpaths(&config, &mut out)?,
        Commands::Check => cmd_check(&config, &mut out)?,
        Commands::Config { show } => cmd_config(&cli.config, &config, show, &mut out)?,
        Commands::Version => writeln!(out, "classmap {}", classmap_core::build_info::version_string())?,
    }

    Ok(())
}

/// Open the resolver and register every configured root.
fn open_resolver(config: &AppConfig) -> Result<Resolver> {
    if config.index.roots.is_empty() {
        bail!("no index roots configured; set index.roots or pass --root");
    }

    let services = Services::from_config(config);
    let mut resolver = Resolver::open(services.clone()).context("failed to open resolver")?;
    for root in &config.index.roots {
        let source = IndexSource::new(root.as_str(), services.clone());
        resolver
            .add_source(&source)
            .with_context(|| format!("failed to index {root}"))?;
    }
    Ok(resolver)
}

fn cmd_locate(config: &AppConfig, symbol: &str, out: &mut impl Write) -> Result<()> {
    let resolver = open_resolver(config)?;
    match resolver.locate(symbol) {
        Some(path) => writeln!(out, "{}", path.display())?,
        None => bail!("{symbol} is not mapped by any index root"),
    }
    Ok(())
}

fn cmd_list(config: &AppConfig, out: &mut impl Write) -> Result<()> {
    let resolver = open_resolver(config)?;
    for (symbol, path) in resolver.mappings() {
        writeln!(out, "{symbol}\t{}", path.display())?;
    }
    info!(symbols = resolver.len(), "listed mappings");
    Ok(())
}

fn cmd_autoloaders(config: &AppConfig, out: &mut impl Write) -> Result<()> {
    let resolver = open_resolver(config)?;
    for (owner, method) in resolver.autoloaders() {
        writeln!(out, "{owner}::{method}")?;
    }
    Ok(())
}

fn cmd_classpaths(config: &AppConfig, out: &mut impl Write) -> Result<()> {
    let resolver = open_resolver(config)?;
    for classpath in resolver.classpaths() {
        writeln!(out, "{classpath}")?;
    }
    Ok(())
}

/// Rebuild each root in developer mode so stale cache entries cannot hide
/// manifest errors.
fn cmd_check(config: &AppConfig, out: &mut impl Write) -> Result<()> {
    if config.index.roots.is_empty() {
        bail!("no index roots configured; set index.roots or pass --root");
    }

    let mut check_config = config.clone();
    check_config.runtime.developer_mode = true;
    let services = Services::from_config(&check_config);

    let mut failures = 0usize;
    for root in &config.index.roots {
        let source = IndexSource::new(root.as_str(), services.clone());
        match source.tables() {
            Ok(tables) => writeln!(
                out,
                "{root}: {} symbols, {} autoloaders, {} classpaths",
                tables.mapping.len(),
                tables.autoloaders.len(),
                tables.classpaths.len()
            )?,
            Err(e) => {
                warn!(root = %root, error = %e, "index build failed");
                writeln!(out, "{root}: error: {e}")?;
                failures += 1;
            }
        }
    }

    if failures > 0 {
        bail!("{failures} of {} index roots failed to build", config.index.roots.len());
    }
    Ok(())
}

fn cmd_config(
    config_path: &Path,
    config: &AppConfig,
    show: bool,
    out: &mut impl Write,
) -> Result<()> {
    if show {
        let toml_str =
            toml::to_string_pretty(config).map_err(|e| anyhow::anyhow!("TOML error: {e}"))?;
        writeln!(out, "{toml_str}")?;
    } else {
        writeln!(out, "Configuration at '{}' is valid.", config_path.display())?;
    }
    Ok(())
}

async fn load_config(path: &Path) -> Result<AppConfig> {
    if path.exists() {
        AppConfig::load(path).await.map_err(|e| anyhow::anyhow!(e))
    } else {
        info!(path = %path.display(), "Config file not found, using defaults");
        Ok(AppConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use classmap_test_utils::ProjectFixture;
    use classmap_test_utils::config::TestConfigBuilder;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn sample_project() -> ProjectFixture {
        let project = ProjectFixture::new();
        project.files(&["libs/auth/AuthService.ext", "libs/auth/TokenStore.ext"]);
        project.manifest(
            "libs/auth",
            r#"<cluster path="">
                 <class name="AuthService" file="AuthService.ext"/>
                 <class name="*Store" file="*Store.ext"/>
               </cluster>
               <autoload class="Legacy" method="load"/>
               <classpath path="vendor/lib"/>"#,
        );
        project
    }

    fn config_for(project: &ProjectFixture) -> AppConfig {
        TestConfigBuilder::new()
            .root(project.base_dir())
            .cache_backend("none")
            .build()
    }

    fn run(f: impl FnOnce(&mut Vec<u8>) -> Result<()>) -> Result<String> {
        let mut out = Vec::new();
        f(&mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_cli_parses_repeated_roots() {
        let cli = Cli::try_parse_from(["classmap", "--root", "/a", "--root", "/b", "--dev", "list"])
            .unwrap();
        assert_eq!(cli.roots, vec!["/a".to_string(), "/b".to_string()]);
        assert!(cli.dev);
        assert!(matches!(cli.command, Commands::List));
    }

    #[test]
    fn test_cli_requires_symbol_for_locate() {
        assert!(Cli::try_parse_from(["classmap", "locate"]).is_err());
    }

    #[test]
    fn test_locate_prints_mapped_path() {
        let project = sample_project();
        let config = config_for(&project);
        let output = run(|out| cmd_locate(&config, "authservice", out)).unwrap();
        assert_eq!(
            output.trim_end(),
            project.path("libs/auth/AuthService.ext").display().to_string()
        );
    }

    #[test]
    fn test_locate_unknown_symbol_fails() {
        let project = sample_project();
        let config = config_for(&project);
        let err = run(|out| cmd_locate(&config, "Missing", out)).unwrap_err();
        assert!(err.to_string().contains("Missing"));
    }

    #[test]
    fn test_list_is_sorted_by_symbol() {
        let project = sample_project();
        let config = config_for(&project);
        let output = run(|out| cmd_list(&config, out)).unwrap();
        let symbols: Vec<&str> = output
            .lines()
            .filter_map(|line| line.split('\t').next())
            .collect();
        assert_eq!(symbols, vec!["AUTHSERVICE", "TOKENSTORE"]);
    }

    #[test]
    fn test_autoloaders_and_classpaths() {
        let project = sample_project();
        let config = config_for(&project);
        assert_eq!(
            run(|out| cmd_autoloaders(&config, out)).unwrap(),
            "Legacy::load\n"
        );
        assert_eq!(
            run(|out| cmd_classpaths(&config, out)).unwrap(),
            "vendor/lib\n"
        );
    }

    #[test_log::test]
    fn test_check_reports_broken_root() {
        let project = sample_project();
        let broken = ProjectFixture::new();
        broken.config_manifest("<cluster path=\"missing\"><class name=\"*\" file=\"*.ext\"/></cluster>");

        let config = TestConfigBuilder::new()
            .root(project.base_dir())
            .root(broken.base_dir())
            .build();
        let mut out = Vec::new();
        let err = cmd_check(&config, &mut out).unwrap_err();
        assert!(err.to_string().contains("1 of 2"));

        let output = String::from_utf8(out).unwrap();
        assert!(output.contains("2 symbols, 1 autoloaders, 1 classpaths"));
        assert!(output.contains("error:"));
    }

    #[test]
    fn test_commands_require_roots() {
        let config = AppConfig::default();
        assert!(run(|out| cmd_list(&config, out)).is_err());
        assert!(run(|out| cmd_check(&config, out)).is_err());
    }

    #[test]
    fn test_config_show_renders_toml() {
        let config = TestConfigBuilder::new().root("/srv/app").build();
        let output = run(|out| cmd_config(Path::new("classmap.toml"), &config, true, out)).unwrap();
        assert!(output.contains("[index]"));
        assert!(output.contains("/srv/app"));
    }

    #[test_log::test(tokio::test)]
    async fn test_load_config_reads_file_or_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("classmap.toml");
        tokio::fs::write(&path, b"[index]\nroots = [\"/srv/app\"]\n[cache]\nbackend = \"none\"\n")
            .await
            .unwrap();

        let config = load_config(&path).await.unwrap();
        assert_eq!(config.index.roots, vec!["/srv/app"]);
        assert_eq!(config.cache.backend, "none");

        let defaults = load_config(&tmp.path().join("absent.toml")).await.unwrap();
        assert!(defaults.index.roots.is_empty());
        assert_eq!(defaults.cache.backend, "memory");
    }
}
