use std::path::PathBuf;

use clap::{Parser, Subcommand};
use dfs_client::config::{
    DEFAULT_AUTH_ROUTE, DEFAULT_BASE_URL, DEFAULT_SESSION_HEADER, DEFAULT_STATE_FILE, Timeouts,
};
use dfs_client::files::SearchQuery;
use dfs_client::{Client, ClientConfig, ClientError, FileEntry, LoginCredentials, RegisterRequest, SearchHit};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("not logged in; run `dfs login` first")]
    NotLoggedIn,
    #[error("invalid file name: {0}")]
    InvalidFileName(String),
    #[error("local file error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "dfs", about = "Distributed file storage client")]
struct Cli {
    #[arg(long, env = "DFS_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,

    #[arg(long, env = "DFS_SESSION_HEADER", default_value = DEFAULT_SESSION_HEADER)]
    session_header: String,

    #[arg(long, env = "DFS_AUTH_ROUTE", default_value = DEFAULT_AUTH_ROUTE)]
    auth_route: String,

    #[arg(long, env = "DFS_STATE_FILE", default_value = DEFAULT_STATE_FILE)]
    state_file: PathBuf,

    #[arg(long, env = "DFS_REQUEST_TIMEOUT_SECS", default_value_t = 30)]
    request_timeout_secs: u64,

    #[arg(long, env = "DFS_CONNECT_TIMEOUT_SECS", default_value_t = 10)]
    connect_timeout_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        username: String,
        #[arg(long, env = "DFS_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Register {
        username: String,
        email: String,
        #[arg(long, env = "DFS_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Logout,
    /// Show the persisted user, or the backend's view with `--remote`.
    Whoami {
        #[arg(long)]
        remote: bool,
    },
    Ls {
        #[arg(default_value = "/")]
        path: String,
    },
    Search {
        query: String,
        #[arg(long)]
        content_type: Option<String>,
        #[arg(long)]
        min_size: Option<u64>,
        #[arg(long)]
        max_size: Option<u64>,
        #[arg(long)]
        page: Option<u32>,
    },
    Mkdir {
        path: String,
    },
    /// Move or rename a file or directory.
    Mv {
        source: String,
        destination: String,
    },
    Rm {
        path: String,
        /// Remove a directory and its contents.
        #[arg(short, long)]
        recursive: bool,
    },
    /// Show metadata of one file.
    Info {
        path: String,
    },
    Upload {
        file: PathBuf,
        #[arg(default_value = "/")]
        dir: String,
    },
    Download {
        path: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    Usage,
}

impl Cli {
    fn config(&self) -> Result<ClientConfig, ClientError> {
        ClientConfig {
            base_url: self.base_url.clone(),
            session_header: self.session_header.clone(),
            auth_route: self.auth_route.clone(),
            state_file: self.state_file.clone(),
            timeouts: Timeouts { request_secs: self.request_timeout_secs, connect_secs: self.connect_timeout_secs },
        }
        .validated()
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let client = Client::from_config(&cli.config()?)?;
    client.gateway.events().on_invalidated(|event| {
        eprintln!("session expired; log in again ({})", event.redirect_to);
    });

    run(&client, cli.command).await
}

async fn run(client: &Client, command: Command) -> Result<(), CliError> {
    match command {
        Command::Login { username, password } => {
            let user = client.session.login(&LoginCredentials::new(username, password)).await?;
            println!("logged in as {}", user.username);
        }
        Command::Register { username, email, password } => {
            let user = client
                .session
                .register(&RegisterRequest::new(username, email, password))
                .await?;
            println!("registered and logged in as {}", user.username);
        }
        Command::Logout => {
            client.session.logout().await;
            println!("logged out");
        }
        Command::Whoami { remote } => {
            let user = if remote {
                client.files.profile().await?
            } else {
                client.session.user().ok_or(CliError::NotLoggedIn)?
            };
            println!("{} <{}> ({})", user.username, user.email, user.user_id);
        }
        Command::Ls { path } => print_entries(&client.files.list(&path).await?),
        Command::Search { query, content_type, min_size, max_size, page } => {
            let query = SearchQuery { content_type, min_size, max_size, page, ..SearchQuery::new(query) };
            let result = client.files.search(query).await?;
            print_hits(&result.files);
            println!("{} matches, page {} of {}", result.total_elements, result.current_page + 1, result.total_pages.max(1));
        }
        Command::Mkdir { path } => client.files.create_directory(&path).await?,
        Command::Mv { source, destination } => client.files.move_entry(&source, &destination).await?,
        Command::Rm { path, recursive: true } => client.files.delete_directory(&path).await?,
        Command::Rm { path, recursive: false } => client.files.delete_file(&path).await?,
        Command::Info { path } => print_entries(&[client.files.info(&path).await?]),
        Command::Upload { file, dir } => {
            let name = file
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| CliError::InvalidFileName(file.display().to_string()))?
                .to_owned();
            let bytes = tokio::fs::read(&file).await?;
            let stored = client.files.upload(&dir, &name, bytes).await?;
            println!("uploaded {} ({} bytes, {} replicas)", stored.path, stored.size, stored.current_replicas);
        }
        Command::Download { path, output } => {
            let bytes = client.files.download(&path).await?;
            let target = match output {
                Some(target) => target,
                None => PathBuf::from(remote_file_name(&path).ok_or_else(|| CliError::InvalidFileName(path.clone()))?),
            };
            tokio::fs::write(&target, &bytes).await?;
            println!("saved {} bytes to {}", bytes.len(), target.display());
        }
        Command::Usage => {
            let info = client.files.storage_info().await?;
            println!(
                "{} of {} used ({:.1}%), {} bytes available",
                info.formatted_usage,
                info.formatted_quota,
                info.percent_used(),
                info.available_space
            );
        }
    }
    Ok(())
}

fn print_entries(entries: &[FileEntry]) {
    for entry in entries {
        let kind = if entry.is_directory { 'd' } else { '-' };
        let modified = entry.last_modified.as_deref().unwrap_or("-");
        println!("{kind} {:>10} {modified:<19} {}", entry.size, entry.path);
    }
}

fn print_hits(hits: &[SearchHit]) {
    for hit in hits {
        println!("{:>10} {}", hit.file_size, hit.file_path);
    }
}

fn remote_file_name(path: &str) -> Option<&str> {
    path.rsplit('/').find(|s| !s.is_empty())
}
