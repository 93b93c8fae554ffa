//! # cairn CLI
//!
//! Command-line interface for the Cairn chunked content store.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cairn_cas::CasStore;
use cairn_config::logging::{init_logging, LogLevel};
use cairn_config::{log_build_info, log_cli_debug, log_restore_info, log_store_debug, Config};
use cairn_manifest::{
    ContentHash, Layout, ManifestBuilder, ManifestWalker, TreeDecoder, TreeEncoder, TreeNode,
};
use clap::{Parser, Subcommand};
use console::style;

mod progress;

use progress::ChunkBar;

/// Cairn - chunked, content-addressed file storage
#[derive(Parser)]
#[command(name = "cairn")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Content store root directory (overrides config and CAIRN_STORE)
    #[arg(long, global = true, value_name = "DIR")]
    store: Option<PathBuf>,

    /// Worker threads for chunk uploads and fetches
    #[arg(short = 'j', long, global = true)]
    threads: Option<usize>,

    /// Hide progress bars
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a file or directory and print its tree JSON
    Add {
        #[arg(value_name = "PATH")]
        path: PathBuf,

        /// Write the tree JSON here instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Restore a tree JSON (file path or `-` for stdin) into a directory
    Get {
        #[arg(value_name = "TREE_JSON")]
        tree: PathBuf,

        #[arg(value_name = "DEST", default_value = ".")]
        dest: PathBuf,
    },

    /// Write the bytes behind a manifest handle
    Cat {
        #[arg(value_name = "HANDLE")]
        handle: String,

        /// Write to this file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Display content store statistics
    Status,

    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,
    /// Print the config file locations
    Path,
    /// Write a default config file
    Init {
        /// Write the global config instead of the project one
        #[arg(long)]
        global: bool,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Effective settings after layering config, env and flags.
struct Settings {
    store_root: PathBuf,
    threads: Option<usize>,
    layout: Layout,
    quiet: bool,
}

impl Settings {
    fn resolve(cli: &Cli, config: &Config) -> Self {
        Self {
            store_root: cli
                .store
                .clone()
                .unwrap_or_else(|| config.storage.resolved_root()),
            threads: cli.threads.or(config.ingest.threads),
            layout: config.chunking.layout(),
            quiet: cli.quiet,
        }
    }

    fn open_store(&self) -> Result<CasStore> {
        log_store_debug!("Opening store", root = self.store_root.display().to_string());
        CasStore::new(&self.store_root)
            .with_context(|| format!("Failed to open store at {}", self.store_root.display()))
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(LogLevel::from_verbosity(cli.verbose));

    cairn_config::reload().context("Failed to load configuration")?;
    let config = cairn_config::config().clone();
    config.validate().context("Invalid configuration")?;
    let settings = Settings::resolve(&cli, &config);

    match cli.command {
        Commands::Add { path, output } => cmd_add(&settings, &path, output.as_deref()),
        Commands::Get { tree, dest } => cmd_get(&settings, &tree, &dest),
        Commands::Cat { handle, output } => cmd_cat(&settings, &handle, output.as_deref()),
        Commands::Status => cmd_status(&settings),
        Commands::Config { command } => cmd_config(&config, command),
    }
}

fn cmd_add(settings: &Settings, path: &Path, output: Option<&Path>) -> Result<()> {
    let store = settings.open_store()?;
    let bar = ChunkBar::new(settings.quiet);

    let builder = ManifestBuilder::new(&store)
        .layout(settings.layout)
        .threads(settings.threads)
        .progress(Some(&bar));
    let node = TreeEncoder::new(builder)
        .encode_path(path)
        .with_context(|| format!("Failed to add {}", path.display()))?;
    bar.finish();

    let handle = node.manifest.handle()?;
    log_build_info!(
        "Stored tree",
        path = path.display().to_string(),
        files = node.file_count(),
        handle = handle.to_string()
    );

    let json = serde_json::to_string_pretty(&node)?;
    match output {
        Some(out) => {
            let out = cairn_config::path::normalize_nonexistent(out)?;
            fs::write(&out, json.as_bytes())
                .with_context(|| format!("Failed to write {}", out.display()))?;
            eprintln!("Tree: {}", out.display());
        }
        None => println!("{}", json),
    }

    eprintln!(
        "{} {} file(s) stored",
        style("✔").green(),
        style(node.file_count()).bold()
    );
    eprintln!("Handle: {}", handle);
    Ok(())
}

fn cmd_get(settings: &Settings, tree: &Path, dest: &Path) -> Result<()> {
    let json = if tree == Path::new("-") {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        fs::read_to_string(tree).with_context(|| format!("Failed to read {}", tree.display()))?
    };
    let node: TreeNode = serde_json::from_str(&json).context("Invalid tree JSON")?;
    log_cli_debug!("Parsed tree", name = node.name.clone(), files = node.file_count());

    let store = settings.open_store()?;
    let bar = ChunkBar::new(settings.quiet);
    let walker = ManifestWalker::new(&store)
        .threads(settings.threads)
        .progress(Some(&bar));
    fs::create_dir_all(dest)?;
    let written = TreeDecoder::new(walker)
        .decode_into(&node, dest)
        .with_context(|| format!("Failed to restore {}", node.name))?;
    bar.finish();

    log_restore_info!("Restored tree", files = written.len(), dest = dest.display().to_string());
    eprintln!(
        "{} {} file(s) restored into {}",
        style("✔").green(),
        style(written.len()).bold(),
        dest.display()
    );
    Ok(())
}

fn cmd_cat(settings: &Settings, handle: &str, output: Option<&Path>) -> Result<()> {
    let handle: ContentHash = handle
        .trim()
        .parse()
        .with_context(|| format!("Invalid handle: {}", handle))?;

    let store = settings.open_store()?;
    let bar = ChunkBar::new(settings.quiet || output.is_none());
    let data = ManifestWalker::new(&store)
        .threads(settings.threads)
        .progress(Some(&bar))
        .restore_handle(&handle)
        .with_context(|| format!("Failed to restore {}", handle))?;
    bar.finish();
    log_restore_info!("Restored handle", handle = handle.to_string(), size = data.len());

    match output {
        Some(out) => fs::write(out, &data)
            .with_context(|| format!("Failed to write {}", out.display()))?,
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(&data)?;
            stdout.flush()?;
        }
    }
    Ok(())
}

fn cmd_status(settings: &Settings) -> Result<()> {
    println!("Store: {}", settings.store_root.display());
    if !settings.store_root.exists() {
        println!("  (not created yet)");
        return Ok(());
    }

    let stats = settings.open_store()?.stats()?;
    println!("  Blobs:       {}", stats.blob_count);
    println!("  Total bytes: {}", stats.total_bytes);
    println!("  Average:     {} bytes", stats.avg_blob_size());
    println!(
        "  Sizes:       <1KB {} | <1MB {} | <100MB {} | larger {}",
        stats.small_blobs, stats.medium_blobs, stats.large_blobs, stats.huge_blobs
    );
    println!(
        "Layout: chunk {} B, manifest limit {} B, {} hashes/part",
        settings.layout.chunk_size,
        settings.layout.manifest_size_limit,
        settings.layout.hashes_per_part
    );
    Ok(())
}

fn cmd_config(config: &Config, command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show => {
            print!("{}", config.to_toml()?);
        }
        ConfigCommands::Path => {
            match Config::global_config_path() {
                Some(p) => println!("Global:  {}", p.display()),
                None => println!("Global:  (no home directory)"),
            }
            println!("Project: {}", Config::project_config_path().display());
        }
        ConfigCommands::Init { global, force } => {
            let path = if global {
                Config::global_config_path().context("No home directory for global config")?
            } else {
                Config::project_config_path()
            };
            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                );
            }
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, Config::default_toml()?)?;
            println!("Wrote {}", path.display());
        }
    }
    Ok(())
}
