use clap::{Args, Parser, Subcommand};
use melon_tools::config::{self, ToolConfig};
use melon_tools::crypto::text;
use melon_tools::vault::pack::{self, PackOptions};
use melon_tools::vault::transport::{Transport, transport_for};
use melon_tools::vault::{Vault, VaultView};
use melon_tools::{output, preview, shell, svg};
use std::io::Read;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "melon")]
#[command(about = "Formation diagrams, encrypted vaults and text encryption")]
#[command(long_about = "\
Formation diagrams, encrypted vaults and text encryption

Three independent tools:

  melon formation render            # write formation.svg from melon.toml
  melon formation markers           # print marker coordinates
  melon formation gen-config        # print a documented melon.toml

  melon vault ls <LOCATION>         # list an encrypted vault
  melon vault get <LOCATION> <ID>   # decrypt and reassemble a file
  melon vault preview <LOCATION> <ID>
  melon vault shell <LOCATION>      # browse interactively
  melon vault pack <DIR> <DEST>     # build a vault from a directory

  melon text encrypt [TEXT]         # stdin when TEXT is omitted
  melon text decrypt [BUNDLE]

LOCATION is an http(s):// URL or a local directory. Passwords come from
--password or the MELON_PASSWORD environment variable.

Any config key can be overridden per run: --set block.mid_x=12")]
#[command(version)]
struct Cli {
    /// Config file (missing file = stock defaults)
    #[arg(long, default_value = config::DEFAULT_CONFIG_FILE, global = true)]
    config: PathBuf,

    /// Override a config value, e.g. `--set star.visible=true` (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE", global = true)]
    overrides: Vec<String>,

    /// Password for vault and text commands
    #[arg(long, env = "MELON_PASSWORD", global = true, hide_env_values = true)]
    password: Option<String>,

    /// Log debug detail to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Formation diagram generator
    #[command(subcommand)]
    Formation(FormationCommand),
    /// Encrypted vault browser
    #[command(subcommand)]
    Vault(VaultCommand),
    /// Password-based text encryption
    #[command(subcommand)]
    Text(TextCommand),
}

#[derive(Subcommand)]
enum FormationCommand {
    /// Render the grid and visible formations to SVG
    Render {
        /// Output file, replaced if it exists
        #[arg(long, default_value = svg::DEFAULT_OUTPUT)]
        out: PathBuf,
    },
    /// Print computed marker coordinates in grid cells
    Markers,
    /// Print a stock melon.toml with all options documented
    GenConfig,
}

/// Vault location plus an optional sub-vault path.
#[derive(Args, Clone)]
struct VaultTarget {
    /// Vault root: URL or local directory
    location: String,
    /// Sub-vault ids to enter first, e.g. `2/5`
    #[arg(long, default_value = "")]
    at: String,
}

#[derive(Subcommand)]
enum VaultCommand {
    /// List sub-vaults and files
    Ls(VaultTarget),
    /// Decrypt a file and write it to disk
    Get {
        #[command(flatten)]
        target: VaultTarget,
        /// File id from the listing
        id: String,
        /// Destination (default: the file's name)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Decrypt a file and write an HTML preview page
    Preview {
        #[command(flatten)]
        target: VaultTarget,
        /// File id from the listing
        id: String,
        /// Destination (default: <name>.html)
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Browse a vault interactively
    Shell {
        /// Vault root: URL or local directory
        location: String,
    },
    /// Build an encrypted vault from a local directory
    Pack {
        /// Directory to pack
        source: PathBuf,
        /// Output directory (served as the vault root)
        dest: PathBuf,
        /// Max bytes per encrypted part (default: [vault] part_size)
        #[arg(long)]
        part_size: Option<u64>,
    },
}

#[derive(Subcommand)]
enum TextCommand {
    /// Encrypt text into a salt.iv.ciphertext bundle
    Encrypt {
        /// Plaintext (read from stdin when omitted)
        text: Option<String>,
    },
    /// Decrypt a bundle
    Decrypt {
        /// Bundle (read from stdin when omitted)
        bundle: Option<String>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run(cli)
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    // The text tool never reads melon.toml.
    match cli.command {
        Command::Formation(cmd) => {
            let tool_config = config::load_config(&cli.config, &cli.overrides)?;
            run_formation(cmd, &tool_config)?
        }
        Command::Vault(cmd) => {
            let tool_config = config::load_config(&cli.config, &cli.overrides)?;
            init_thread_pool(&tool_config.vault);
            run_vault(cmd, &tool_config, cli.password.as_deref())?
        }
        Command::Text(cmd) => {
            let password = require_password(cli.password.as_deref())?;
            let result = match cmd {
                TextCommand::Encrypt { text: plaintext } => {
                    text::encrypt(&read_arg_or_stdin(plaintext)?, password)?
                }
                TextCommand::Decrypt { bundle } => {
                    text::decrypt(&read_arg_or_stdin(bundle)?, password)?
                }
            };
            println!("{}", result);
        }
    }

    Ok(())
}

fn run_formation(
    cmd: FormationCommand,
    tool_config: &ToolConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        FormationCommand::Render { out } => {
            let (markers, document) = svg::render_formations(tool_config);
            svg::write_svg(&out, &document)?;
            tracing::info!(path = %out.display(), markers = markers.len(), "wrote svg");
            output::print_render_output(&out, svg::canvas_size(&tool_config.grid), markers.len());
        }
        FormationCommand::Markers => {
            output::print_markers(&melon_tools::formation::collect_markers(tool_config));
        }
        FormationCommand::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }
    Ok(())
}

fn run_vault(
    cmd: VaultCommand,
    tool_config: &ToolConfig,
    password: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let password = require_password(password)?;
    match cmd {
        VaultCommand::Ls(target) => {
            let vault = open_vault(&target.location, password);
            let view = navigate(&vault, &target.at)?;
            output::print_vault_listing(&view);
        }
        VaultCommand::Get { target, id, out } => {
            let vault = open_vault(&target.location, password);
            let view = navigate(&vault, &target.at)?;
            let file = vault.fetch_file(&view, &id)?;
            let dest = match out {
                Some(out) => out,
                None => file.local_name()?,
            };
            std::fs::write(&dest, &file.bytes)?;
            output::print_file_saved(&file, &dest);
        }
        VaultCommand::Preview { target, id, out } => {
            let vault = open_vault(&target.location, password);
            let view = navigate(&vault, &target.at)?;
            let file = vault.fetch_file(&view, &id)?;
            let dest = match out {
                Some(out) => out,
                None => shell::html_name(&file.local_name()?),
            };
            preview::write_page(&file, &dest)?;
            output::print_file_saved(&file, &dest);
        }
        VaultCommand::Shell { location } => {
            let vault = open_vault(&location, password);
            let stdin = std::io::stdin();
            shell::run(&vault, stdin.lock(), std::io::stdout())?;
        }
        VaultCommand::Pack {
            source,
            dest,
            part_size,
        } => {
            let options = PackOptions::today(part_size.unwrap_or(tool_config.vault.part_size));
            let summary = pack::pack(&source, &dest, password, &options)?;
            output::print_pack_summary(&summary, &dest);
        }
    }
    Ok(())
}

fn open_vault(location: &str, password: &str) -> Vault<Box<dyn Transport>> {
    Vault::new(transport_for(location), location, password)
}

/// Open the root, then enter each `/`-separated sub-vault id in `at`.
fn navigate<T: Transport>(
    vault: &Vault<T>,
    at: &str,
) -> Result<VaultView, melon_tools::vault::VaultError> {
    let mut view = vault.open_root()?;
    for id in at.split('/').filter(|s| !s.is_empty()) {
        view = vault.enter(&view, id)?;
    }
    Ok(view)
}

fn require_password(password: Option<&str>) -> Result<&str, Box<dyn std::error::Error>> {
    match password {
        Some(p) if !p.is_empty() => Ok(p),
        _ => Err("a password is required: pass --password or set MELON_PASSWORD".into()),
    }
}

fn read_arg_or_stdin(arg: Option<String>) -> std::io::Result<String> {
    match arg {
        Some(value) => Ok(value),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf.trim_end_matches(['\r', '\n']).to_string())
        }
    }
}

/// Log to stderr; `RUST_LOG` wins, then `-v`, then warnings only.
fn init_tracing(verbose: bool) {
    let default = if verbose { "melon_tools=debug,melon=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize the rayon thread pool used for part fetches and sealing.
///
/// Caps at the number of available CPU cores; users can constrain down, not up.
fn init_thread_pool(vault: &config::VaultConfig) {
    let threads = config::effective_threads(vault);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
