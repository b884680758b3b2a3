//! Interactive vault browser.
//!
//! A line-oriented loop over one [`Vault`]: every command recomputes its
//! result from a fresh fetch and prints it, replacing whatever was shown
//! before. A failed command prints its error and leaves the current vault
//! unchanged.
//!
//! ```text
//! ls                   list the current vault
//! cd <id>              enter a sub-vault
//! cd ..                go up (not above the opened root)
//! get <id> [path]      decrypt a file to disk (default: its name)
//! preview <id> [path]  write an HTML preview (default: <name>.html)
//! help                 show commands
//! quit                 leave
//! ```

use crate::output;
use crate::preview;
use crate::vault::transport::Transport;
use crate::vault::{Vault, VaultError, VaultView};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::warn;

pub const HELP: &[&str] = &[
    "ls                   list the current vault",
    "cd <id>              enter a sub-vault",
    "cd ..                go up one level",
    "get <id> [path]      decrypt a file to disk",
    "preview <id> [path]  write an HTML preview",
    "help                 show this help",
    "quit                 leave",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Enter(String),
    Up,
    Get { id: String, path: Option<PathBuf> },
    Preview { id: String, path: Option<PathBuf> },
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let words: Vec<&str> = line.split_whitespace().collect();
        match words.as_slice() {
            ["ls"] => Ok(Command::List),
            ["cd", ".."] => Ok(Command::Up),
            ["cd", id] => Ok(Command::Enter(id.to_string())),
            ["get", id] => Ok(Command::Get {
                id: id.to_string(),
                path: None,
            }),
            ["get", id, path] => Ok(Command::Get {
                id: id.to_string(),
                path: Some(PathBuf::from(path)),
            }),
            ["preview", id] => Ok(Command::Preview {
                id: id.to_string(),
                path: None,
            }),
            ["preview", id, path] => Ok(Command::Preview {
                id: id.to_string(),
                path: Some(PathBuf::from(path)),
            }),
            ["help"] | ["?"] => Ok(Command::Help),
            ["quit"] | ["exit"] => Ok(Command::Quit),
            _ => Err(format!("unrecognized command: {}", line.trim())),
        }
    }
}

pub enum Outcome {
    Lines(Vec<String>),
    Quit,
}

/// Default preview destination for a saved file name: `<name>.html`.
pub fn html_name(local: &Path) -> PathBuf {
    let mut name = local.as_os_str().to_os_string();
    name.push(".html");
    PathBuf::from(name)
}

/// Browser state: the vault and the directory currently shown.
pub struct Session<'a, T> {
    vault: &'a Vault<T>,
    view: VaultView,
    /// Where `get`/`preview` write when no path is given.
    download_dir: PathBuf,
}

impl<'a, T: Transport> Session<'a, T> {
    /// Open the vault root.
    pub fn start(vault: &'a Vault<T>) -> Result<Self, VaultError> {
        let view = vault.open_root()?;
        Ok(Self {
            vault,
            view,
            download_dir: PathBuf::new(),
        })
    }

    /// Write default-named downloads under `dir` instead of the working
    /// directory.
    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = dir.into();
        self
    }

    pub fn view(&self) -> &VaultView {
        &self.view
    }

    pub fn prompt(&self) -> String {
        format!("melon:{}> ", self.view.location)
    }

    pub fn execute(&mut self, command: Command) -> Result<Outcome, VaultError> {
        let lines = match command {
            Command::List => {
                self.view = self.vault.open(&self.view.location)?;
                output::format_vault_listing(&self.view)
            }
            Command::Enter(id) => {
                self.view = self.vault.enter(&self.view, &id)?;
                output::format_vault_listing(&self.view)
            }
            Command::Up => {
                self.view = self.vault.up(&self.view)?;
                output::format_vault_listing(&self.view)
            }
            Command::Get { id, path } => {
                let file = self.vault.fetch_file(&self.view, &id)?;
                let dest = match path {
                    Some(path) => path,
                    None => self.download_dir.join(file.local_name()?),
                };
                std::fs::write(&dest, &file.bytes)?;
                output::format_file_saved(&file, &dest)
            }
            Command::Preview { id, path } => {
                let file = self.vault.fetch_file(&self.view, &id)?;
                let dest = match path {
                    Some(path) => path,
                    None => self.download_dir.join(html_name(&file.local_name()?)),
                };
                preview::write_page(&file, &dest)?;
                output::format_file_saved(&file, &dest)
            }
            Command::Help => HELP.iter().map(|l| l.to_string()).collect(),
            Command::Quit => return Ok(Outcome::Quit),
        };
        Ok(Outcome::Lines(lines))
    }
}

/// Run the browser loop until `quit` or end of input.
///
/// Only the initial open is fatal; per-command errors are printed.
pub fn run<T: Transport, R: BufRead, W: Write>(
    vault: &Vault<T>,
    input: R,
    mut out: W,
) -> Result<(), VaultError> {
    let mut session = Session::start(vault)?;
    for line in output::format_vault_listing(session.view()) {
        writeln!(out, "{line}")?;
    }

    let mut lines = input.lines();
    loop {
        write!(out, "{}", session.prompt())?;
        out.flush()?;
        let Some(line) = lines.next().transpose()? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }
        let result = line
            .parse::<Command>()
            .and_then(|cmd| session.execute(cmd).map_err(|e| e.to_string()));
        match result {
            Ok(Outcome::Quit) => break,
            Ok(Outcome::Lines(printed)) => {
                for l in printed {
                    writeln!(out, "{l}")?;
                }
            }
            Err(msg) => {
                warn!(command = line.trim(), "{msg}");
                writeln!(out, "{msg}")?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use tempfile::TempDir;

    fn tree() -> MemoryTransport {
        let transport = MemoryTransport::default();
        let mut root = empty_index();
        add_file(&mut root, "0", "note.txt", &["0-0.enc"]);
        add_vault(&mut root, "1", "Inner");
        transport.insert_index("v", &root, "pw");
        transport.insert_sealed("v/0-0.enc", b"secret note", "pw");
        let mut inner = empty_index();
        add_file(&mut inner, "0", "deep.json", &["0-0.enc"]);
        transport.insert_index("v/1", &inner, "pw");
        transport.insert_sealed("v/1/0-0.enc", b"{}", "pw");
        transport
    }

    // =========================================================================
    // Parsing
    // =========================================================================

    #[test]
    fn parses_navigation() {
        assert_eq!("ls".parse::<Command>(), Ok(Command::List));
        assert_eq!("cd ..".parse::<Command>(), Ok(Command::Up));
        assert_eq!("  cd 3 ".parse::<Command>(), Ok(Command::Enter("3".into())));
    }

    #[test]
    fn parses_get_with_optional_path() {
        assert_eq!(
            "get 0".parse::<Command>(),
            Ok(Command::Get {
                id: "0".into(),
                path: None
            })
        );
        assert_eq!(
            "preview 0 out.html".parse::<Command>(),
            Ok(Command::Preview {
                id: "0".into(),
                path: Some(PathBuf::from("out.html"))
            })
        );
    }

    #[test]
    fn rejects_unknown_and_malformed() {
        assert!("rm -rf".parse::<Command>().is_err());
        assert!("cd".parse::<Command>().is_err());
        assert!("get".parse::<Command>().is_err());
        assert!("ls extra".parse::<Command>().is_err());
    }

    // =========================================================================
    // Session
    // =========================================================================

    #[test]
    fn session_navigates_down_and_up() {
        let transport = tree();
        let vault = Vault::new(&transport, "v", "pw");
        let mut session = Session::start(&vault).unwrap();

        session.execute(Command::Enter("1".into())).unwrap();
        assert_eq!(session.view().location, "v/1");
        assert_eq!(session.prompt(), "melon:v/1> ");

        session.execute(Command::Up).unwrap();
        assert_eq!(session.view().location, "v");
    }

    #[test]
    fn failed_command_keeps_current_view() {
        let transport = tree();
        let vault = Vault::new(&transport, "v", "pw");
        let mut session = Session::start(&vault).unwrap();

        assert!(matches!(
            session.execute(Command::Up),
            Err(VaultError::AtRoot)
        ));
        assert!(session.execute(Command::Enter("9".into())).is_err());
        assert_eq!(session.view().location, "v");
    }

    #[test]
    fn get_writes_decrypted_file() {
        let transport = tree();
        let vault = Vault::new(&transport, "v", "pw");
        let mut session = Session::start(&vault).unwrap();
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("note.txt");

        session
            .execute(Command::Get {
                id: "0".into(),
                path: Some(dest.clone()),
            })
            .unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), b"secret note");
    }

    #[test]
    fn preview_writes_html() {
        let transport = tree();
        let vault = Vault::new(&transport, "v", "pw");
        let mut session = Session::start(&vault).unwrap();
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("note.html");

        session
            .execute(Command::Preview {
                id: "0".into(),
                path: Some(dest.clone()),
            })
            .unwrap();
        let html = std::fs::read_to_string(&dest).unwrap();
        assert!(html.contains(r#"<pre class="code-block">secret note</pre>"#));
    }

    fn hostile_tree() -> MemoryTransport {
        let transport = MemoryTransport::default();
        let mut root = empty_index();
        add_file(&mut root, "0", "../escape.txt", &["0-0.enc"]);
        add_file(&mut root, "1", "/tmp/melon-absolute.txt", &["1-0.enc"]);
        add_file(&mut root, "2", "..", &["2-0.enc"]);
        transport.insert_index("v", &root, "pw");
        for part in ["v/0-0.enc", "v/1-0.enc", "v/2-0.enc"] {
            transport.insert_sealed(part, b"payload", "pw");
        }
        transport
    }

    #[test]
    fn default_get_stays_in_download_dir() {
        let transport = hostile_tree();
        let vault = Vault::new(&transport, "v", "pw");
        let tmp = TempDir::new().unwrap();
        let downloads = tmp.path().join("downloads");
        std::fs::create_dir(&downloads).unwrap();
        let mut session = Session::start(&vault).unwrap().with_download_dir(&downloads);

        for id in ["0", "1"] {
            session
                .execute(Command::Get {
                    id: id.into(),
                    path: None,
                })
                .unwrap();
        }
        assert_eq!(std::fs::read(downloads.join("escape.txt")).unwrap(), b"payload");
        assert!(downloads.join("melon-absolute.txt").exists());
        assert!(!tmp.path().join("escape.txt").exists());
    }

    #[test]
    fn default_preview_uses_sanitized_name() {
        let transport = hostile_tree();
        let vault = Vault::new(&transport, "v", "pw");
        let tmp = TempDir::new().unwrap();
        let mut session = Session::start(&vault).unwrap().with_download_dir(tmp.path());

        session
            .execute(Command::Preview {
                id: "0".into(),
                path: None,
            })
            .unwrap();
        assert!(tmp.path().join("escape.txt.html").exists());
    }

    #[test]
    fn default_get_rejects_name_without_file_component() {
        let transport = hostile_tree();
        let vault = Vault::new(&transport, "v", "pw");
        let tmp = TempDir::new().unwrap();
        let mut session = Session::start(&vault).unwrap().with_download_dir(tmp.path());

        let result = session.execute(Command::Get {
            id: "2".into(),
            path: None,
        });
        assert!(matches!(result, Err(VaultError::UnsafeName(_))));
    }

    #[test]
    fn html_name_appends_extension() {
        assert_eq!(html_name(Path::new("a.txt")), PathBuf::from("a.txt.html"));
    }

    // =========================================================================
    // run loop
    // =========================================================================

    #[test]
    fn run_prints_listing_errors_and_stops_at_quit() {
        let transport = tree();
        let vault = Vault::new(&transport, "v", "pw");
        let input = b"cd 1\n\nbogus\ncd ..\nquit\nls\n";
        let mut out = Vec::new();

        run(&vault, &input[..], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("v\n🔙 ..\n📁 [1] Inner\n"));
        assert!(text.contains("melon:v/1> "));
        assert!(text.contains("📄 [0] deep.json"));
        assert!(text.contains("unrecognized command: bogus"));
        // "ls" after quit never runs: root opened for start and "cd .." only
        let index_fetches = transport
            .fetched()
            .iter()
            .filter(|l| l.as_str() == "v/index.vault")
            .count();
        assert_eq!(index_fetches, 2);
    }

    #[test]
    fn run_ends_at_eof() {
        let transport = tree();
        let vault = Vault::new(&transport, "v", "pw");
        let mut out = Vec::new();
        run(&vault, &b"ls\n"[..], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("🔙 ..").count(), 2);
    }

    #[test]
    fn run_fails_when_root_cannot_open() {
        let transport = tree();
        let vault = Vault::new(&transport, "missing", "pw");
        let mut out = Vec::new();
        assert!(run(&vault, &b""[..], &mut out).is_err());
    }
}
