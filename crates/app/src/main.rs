use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use pathway_core::Catalog;
use pathway_core::model::{OwnerKey, PathId};
use services::{
    Assistant, ChatRelay, Clock, Conversation, DashboardSnapshot, HttpAssistant,
    HttpProgressStore, LearningPathService, load_catalog,
};
use storage::{Identity, LocalStore, ProgressStore, StoreSelector};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEVICE_KEY_FILE: &str = "device-id";

#[derive(Debug, PartialEq, Eq)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingOperand { command: &'static str, name: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidIndex { raw: String },
    InvalidPathId { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingOperand { command, name } => {
                write!(f, "{command} requires <{name}>")
            }
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidIndex { raw } => write!(f, "invalid milestone index: {raw}"),
            ArgsError::InvalidPathId { raw } => write!(f, "invalid path id: {raw:?}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  pathway catalog");
    eprintln!("  pathway list");
    eprintln!("  pathway add <category>");
    eprintln!("  pathway remove <path-id>");
    eprintln!("  pathway toggle <path-id> <milestone-index>");
    eprintln!("  pathway chat [--skill <skill>] [--level <level>]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --api-url <url>    Pathway API base URL");
    eprintln!("  --token <jwt>      bearer token for the API");
    eprintln!("  --user-id <id>     signed-in user id");
    eprintln!("  --data-dir <dir>   local storage directory (default ~/.pathway)");
    eprintln!("  --catalog <file>   replacement catalog JSON (default: built-in)");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  PATHWAY_API_URL, PATHWAY_TOKEN, PATHWAY_USER_ID, PATHWAY_DATA_DIR, CATALOG_PATH");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Catalog,
    List,
    Add,
    Remove,
    Toggle,
    Chat,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "catalog" => Some(Self::Catalog),
            "list" => Some(Self::List),
            "add" => Some(Self::Add),
            "remove" => Some(Self::Remove),
            "toggle" => Some(Self::Toggle),
            "chat" => Some(Self::Chat),
            _ => None,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Catalog => "catalog",
            Self::List => "list",
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Toggle => "toggle",
            Self::Chat => "chat",
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Action {
    Catalog,
    List,
    Add { category: String },
    Remove { id: PathId },
    Toggle { id: PathId, index: usize },
    Chat { skill: Option<String>, level: Option<String> },
}

/// Remote sync is enabled only when all three are known.
#[derive(Debug, PartialEq, Eq)]
struct RemoteArgs {
    api_url: String,
    token: String,
    user_id: String,
}

#[derive(Debug, PartialEq, Eq)]
struct Args {
    action: Action,
    api_url: Option<String>,
    remote: Option<RemoteArgs>,
    data_dir: PathBuf,
    catalog_path: Option<PathBuf>,
}

impl Args {
    fn parse(
        argv: Vec<String>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ArgsError> {
        let env = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let mut iter = argv.into_iter();
        let first = iter.next().unwrap_or_else(|| "list".to_string());
        let cmd = Command::from_arg(&first).ok_or(ArgsError::UnknownCommand(first))?;

        let mut api_url = env("PATHWAY_API_URL");
        let mut token = env("PATHWAY_TOKEN");
        let mut user_id = env("PATHWAY_USER_ID");
        let mut data_dir = env("PATHWAY_DATA_DIR").map(PathBuf::from);
        let mut catalog_path = env("CATALOG_PATH").map(PathBuf::from);
        let mut skill = None;
        let mut level = None;
        let mut operands = Vec::new();

        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--api-url" => api_url = Some(require_value(&mut iter, "--api-url")?),
                "--token" => token = Some(require_value(&mut iter, "--token")?),
                "--user-id" => user_id = Some(require_value(&mut iter, "--user-id")?),
                "--data-dir" => {
                    data_dir = Some(PathBuf::from(require_value(&mut iter, "--data-dir")?));
                }
                "--catalog" => {
                    catalog_path = Some(PathBuf::from(require_value(&mut iter, "--catalog")?));
                }
                "--skill" if cmd == Command::Chat => {
                    skill = Some(require_value(&mut iter, "--skill")?);
                }
                "--level" if cmd == Command::Chat => {
                    level = Some(require_value(&mut iter, "--level")?);
                }
                flag if flag.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ => operands.push(arg),
            }
        }

        let action = Action::from_operands(cmd, operands, skill, level)?;
        let remote = match (&api_url, token, user_id) {
            (Some(url), Some(token), Some(user_id)) => Some(RemoteArgs {
                api_url: url.clone(),
                token,
                user_id,
            }),
            _ => None,
        };

        Ok(Self {
            action,
            api_url,
            remote,
            data_dir: data_dir.unwrap_or_else(|| default_data_dir(&lookup)),
            catalog_path,
        })
    }
}

impl Action {
    fn from_operands(
        cmd: Command,
        operands: Vec<String>,
        skill: Option<String>,
        level: Option<String>,
    ) -> Result<Self, ArgsError> {
        let mut ops = operands.into_iter();
        let mut operand = |name: &'static str| {
            ops.next().ok_or(ArgsError::MissingOperand {
                command: cmd.name(),
                name,
            })
        };

        let action = match cmd {
            Command::Catalog => Self::Catalog,
            Command::List => Self::List,
            Command::Add => Self::Add {
                category: operand("category")?,
            },
            Command::Remove => Self::Remove {
                id: parse_path_id(operand("path-id")?)?,
            },
            Command::Toggle => {
                let id = parse_path_id(operand("path-id")?)?;
                let raw = operand("milestone-index")?;
                let index = raw
                    .parse()
                    .map_err(|_| ArgsError::InvalidIndex { raw: raw.clone() })?;
                Self::Toggle { id, index }
            }
            Command::Chat => Self::Chat { skill, level },
        };

        // Categories may contain spaces when passed unquoted.
        match (action, ops.next()) {
            (Self::Add { category }, Some(next)) => {
                let rest: Vec<String> = std::iter::once(next).chain(ops).collect();
                Ok(Self::Add {
                    category: format!("{category} {}", rest.join(" ")),
                })
            }
            (_, Some(extra)) => Err(ArgsError::UnknownArg(extra)),
            (action, None) => Ok(action),
        }
    }
}

fn parse_path_id(raw: String) -> Result<PathId, ArgsError> {
    PathId::new(raw.clone()).map_err(|_| ArgsError::InvalidPathId { raw })
}

fn default_data_dir(lookup: &impl Fn(&str) -> Option<String>) -> PathBuf {
    lookup("HOME")
        .filter(|h| !h.is_empty())
        .map_or_else(|| PathBuf::from(".pathway"), |home| Path::new(&home).join(".pathway"))
}

/// Read the device key from `dir`, creating one on first use.
fn load_or_create_device_key(dir: &Path) -> std::io::Result<OwnerKey> {
    let file = dir.join(DEVICE_KEY_FILE);
    if let Ok(raw) = std::fs::read_to_string(&file) {
        if let Ok(key) = OwnerKey::new(raw) {
            return Ok(key);
        }
        tracing::warn!(file = %file.display(), "device key file is empty, generating a new key");
    }

    std::fs::create_dir_all(dir)?;
    let key = OwnerKey::new_device();
    std::fs::write(&file, key.as_str())?;
    tracing::debug!(key = %key, "created device key");
    Ok(key)
}

fn build_service(
    args: &Args,
    clock: Clock,
    catalog: Arc<Catalog>,
) -> Result<LearningPathService, Box<dyn std::error::Error>> {
    let device = load_or_create_device_key(&args.data_dir)?;
    let local: Arc<dyn ProgressStore> = Arc::new(LocalStore::new(&args.data_dir, clock));

    let (selector, identity) = match &args.remote {
        Some(remote) => {
            let store: Arc<dyn ProgressStore> =
                Arc::new(HttpProgressStore::new(&remote.api_url, &remote.token, clock));
            let user = OwnerKey::new(remote.user_id.as_str())?;
            (
                StoreSelector::new(Some(store), local),
                Identity::signed_in(user, device),
            )
        }
        None => (StoreSelector::local_only(local), Identity::anonymous(device)),
    };

    Ok(LearningPathService::new(
        clock,
        catalog,
        Arc::new(selector),
        identity,
    ))
}

fn print_catalog(catalog: &Catalog) {
    for template in catalog.list_templates() {
        println!(
            "{} {} [{}] - {} milestones",
            template.icon,
            template.category,
            template.color_tag,
            template.milestones.len()
        );
        println!("    {}", template.description);
    }
}

fn print_snapshot(snapshot: &DashboardSnapshot, catalog: &Catalog) {
    if snapshot.show_selection {
        println!("No learning paths yet. Pick one from `pathway catalog` and run `pathway add <category>`.");
        println!("(storage: {})", snapshot.backend);
        return;
    }

    let overall = &snapshot.overall_progress;
    println!(
        "Overall progress: {}/{} milestones ({:.0}%)  (storage: {})",
        overall.completed, overall.total, overall.percent, snapshot.backend
    );
    for path in &snapshot.paths {
        let meta = catalog.display_metadata(path.category());
        let progress = path.progress();
        println!();
        println!(
            "{} [{}]  {}/{} ({:.0}%)",
            path.title(),
            meta.color_tag,
            progress.completed,
            progress.total,
            progress.percent
        );
        println!("    id: {}", path.id());
        for (index, milestone) in path.milestones().iter().enumerate() {
            let mark = if milestone.completed() { "x" } else { " " };
            println!("    [{mark}] {index}. {}", milestone.title());
        }
    }
}

async fn chat_loop(
    assistant: &dyn Assistant,
    skill: Option<String>,
    level: Option<String>,
) -> std::io::Result<()> {
    let mut conversation = Conversation::new().with_skill(skill);
    if level.is_some() {
        conversation = conversation.with_level(level);
    }
    if let Some(greeting) = conversation.messages().first() {
        println!("assistant> {}", greeting.content);
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if matches!(line.trim(), "exit" | "quit") {
            break;
        }
        if let Some(reply) = conversation.send(assistant, &line).await {
            println!("assistant> {}", reply.content);
        }
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let argv: Vec<String> = std::env::args().skip(1).collect();
    if matches!(argv.first().map(String::as_str), Some("--help" | "-h")) {
        print_usage();
        return Ok(());
    }

    let args = Args::parse(argv, |key| std::env::var(key).ok()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let clock = Clock::system();
    let catalog = Arc::new(load_catalog(args.catalog_path.as_deref())?);

    match &args.action {
        Action::Catalog => print_catalog(&catalog),
        Action::Chat { skill, level } => {
            let assistant: Box<dyn Assistant> = match &args.api_url {
                Some(url) => Box::new(HttpAssistant::new(url.as_str())),
                None => Box::new(ChatRelay::from_env()),
            };
            chat_loop(assistant.as_ref(), skill.clone(), level.clone()).await?;
        }
        Action::List => {
            let service = build_service(&args, clock, Arc::clone(&catalog))?;
            print_snapshot(&service.snapshot().await?, &catalog);
        }
        Action::Add { category } => {
            let service = build_service(&args, clock, Arc::clone(&catalog))?;
            print_snapshot(&service.add_path(category).await?, &catalog);
        }
        Action::Remove { id } => {
            let service = build_service(&args, clock, Arc::clone(&catalog))?;
            print_snapshot(&service.remove_path(id).await?, &catalog);
        }
        Action::Toggle { id, index } => {
            let service = build_service(&args, clock, Arc::clone(&catalog))?;
            print_snapshot(&service.toggle_milestone(id, *index).await?, &catalog);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn argv(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_string()).collect()
    }

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn no_arguments_lists_paths() {
        let args = Args::parse(vec![], env(&[("HOME", "/home/ada")])).unwrap();
        assert_eq!(args.action, Action::List);
        assert_eq!(args.data_dir, PathBuf::from("/home/ada/.pathway"));
        assert!(args.remote.is_none());
    }

    #[test]
    fn add_joins_unquoted_category_words() {
        let args = Args::parse(argv(&["add", "Web", "Development"]), env(&[])).unwrap();
        assert_eq!(
            args.action,
            Action::Add {
                category: "Web Development".into()
            }
        );
    }

    #[test]
    fn toggle_parses_id_and_index() {
        let args = Args::parse(argv(&["toggle", "devops-1", "2"]), env(&[])).unwrap();
        assert_eq!(
            args.action,
            Action::Toggle {
                id: PathId::new("devops-1").unwrap(),
                index: 2
            }
        );
    }

    #[test]
    fn toggle_rejects_bad_index_and_missing_operands() {
        assert_eq!(
            Args::parse(argv(&["toggle", "devops-1", "two"]), env(&[])),
            Err(ArgsError::InvalidIndex { raw: "two".into() })
        );
        assert_eq!(
            Args::parse(argv(&["toggle", "devops-1"]), env(&[])),
            Err(ArgsError::MissingOperand {
                command: "toggle",
                name: "milestone-index"
            })
        );
        assert_eq!(
            Args::parse(argv(&["remove"]), env(&[])),
            Err(ArgsError::MissingOperand {
                command: "remove",
                name: "path-id"
            })
        );
    }

    #[test]
    fn unknown_input_is_rejected() {
        assert_eq!(
            Args::parse(argv(&["dance"]), env(&[])),
            Err(ArgsError::UnknownCommand("dance".into()))
        );
        assert_eq!(
            Args::parse(argv(&["list", "--verbose"]), env(&[])),
            Err(ArgsError::UnknownArg("--verbose".into()))
        );
        assert_eq!(
            Args::parse(argv(&["list", "extra"]), env(&[])),
            Err(ArgsError::UnknownArg("extra".into()))
        );
        assert_eq!(
            Args::parse(argv(&["list", "--skill", "rust"]), env(&[])),
            Err(ArgsError::UnknownArg("--skill".into()))
        );
        assert_eq!(
            Args::parse(argv(&["list", "--token"]), env(&[])),
            Err(ArgsError::MissingValue { flag: "--token" })
        );
    }

    #[test]
    fn remote_needs_url_token_and_user() {
        let partial = Args::parse(
            argv(&["list"]),
            env(&[("PATHWAY_API_URL", "http://api"), ("PATHWAY_TOKEN", "t")]),
        )
        .unwrap();
        assert!(partial.remote.is_none());
        assert_eq!(partial.api_url.as_deref(), Some("http://api"));

        let full = Args::parse(
            argv(&["list", "--user-id", "user_1"]),
            env(&[("PATHWAY_API_URL", "http://api"), ("PATHWAY_TOKEN", "t")]),
        )
        .unwrap();
        assert_eq!(
            full.remote,
            Some(RemoteArgs {
                api_url: "http://api".into(),
                token: "t".into(),
                user_id: "user_1".into(),
            })
        );
    }

    #[test]
    fn flags_override_environment() {
        let args = Args::parse(
            argv(&["chat", "--skill", "react", "--level", "advanced", "--data-dir", "/tmp/p"]),
            env(&[("PATHWAY_DATA_DIR", "/var/p")]),
        )
        .unwrap();
        assert_eq!(
            args.action,
            Action::Chat {
                skill: Some("react".into()),
                level: Some("advanced".into())
            }
        );
        assert_eq!(args.data_dir, PathBuf::from("/tmp/p"));
    }

    #[test]
    fn catalog_path_comes_from_env_or_flag() {
        let from_env =
            Args::parse(argv(&["catalog"]), env(&[("CATALOG_PATH", "/etc/paths.json")])).unwrap();
        assert_eq!(from_env.catalog_path, Some(PathBuf::from("/etc/paths.json")));

        let from_flag = Args::parse(
            argv(&["add", "Rust", "--catalog", "/tmp/custom.json"]),
            env(&[("CATALOG_PATH", "/etc/paths.json")]),
        )
        .unwrap();
        assert_eq!(from_flag.catalog_path, Some(PathBuf::from("/tmp/custom.json")));
        assert!(Args::parse(argv(&["list"]), env(&[])).unwrap().catalog_path.is_none());
    }

    #[tokio::test]
    async fn replacement_catalog_offers_its_own_categories() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("catalog.json");
        std::fs::write(
            &file,
            r#"[{"category":"Rust","description":"Systems","icon":"🦀","color":"orange",
                "milestones":[{"title":"Ownership","description":"Borrowing"}]}]"#,
        )
        .unwrap();
        let args = Args {
            action: Action::Add {
                category: "Rust".into(),
            },
            api_url: None,
            remote: None,
            data_dir: dir.path().join("data"),
            catalog_path: Some(file),
        };

        let catalog = Arc::new(load_catalog(args.catalog_path.as_deref()).unwrap());
        let service =
            build_service(&args, pathway_core::time::fixed_clock(), catalog).unwrap();
        let snapshot = service.add_path("Rust").await.unwrap();
        assert_eq!(snapshot.paths[0].category(), "Rust");
        assert!(service.add_path("DevOps").await.is_err());
    }

    #[test]
    fn device_key_is_created_once_and_reused() {
        let dir = tempfile::tempdir().unwrap();
        let first = load_or_create_device_key(dir.path()).unwrap();
        let second = load_or_create_device_key(dir.path()).unwrap();

        assert_eq!(first, second);
        assert!(first.as_str().starts_with("device-"));
    }

    #[tokio::test]
    async fn local_only_service_round_trips_through_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let args = Args {
            action: Action::List,
            api_url: None,
            remote: None,
            data_dir: dir.path().to_path_buf(),
            catalog_path: None,
        };
        let catalog = Arc::new(Catalog::builtin().unwrap());
        let clock = pathway_core::time::fixed_clock();

        let service = build_service(&args, clock, Arc::clone(&catalog)).unwrap();
        let snapshot = service.add_path("DevOps").await.unwrap();
        let id = snapshot.paths[0].id().clone();
        service.toggle_milestone(&id, 0).await.unwrap();

        let reopened = build_service(&args, clock, catalog).unwrap();
        let snapshot = reopened.snapshot().await.unwrap();
        assert_eq!(snapshot.paths.len(), 1);
        assert_eq!(snapshot.overall_progress.completed, 1);
    }
}
