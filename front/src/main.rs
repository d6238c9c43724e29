use std::{path::PathBuf, process, sync::Arc};

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use dialoguer::{Confirm, Password};
use eyre::eyre;
use taskdesk::{
    api::{ApiClient, HttpTransport},
    config::Config,
    error::TodoError,
    filter::{FilterCriteria, StatusFilter},
    model::{Id, Todo, TodoStatus, User},
    notify::{Notifier, TerminalNotifier},
    session::{Auth, FileTokenStore, Session},
    todo::{today, TodoDraft, TodoStore},
    ui,
};
use tracing_subscriber::EnvFilter;

const LOGIN_HINT: &str = "Not logged in. Run `taskdesk login --email <EMAIL>` first.";

#[derive(Parser)]
#[command(name = "taskdesk", version, about = "Terminal client for the task board API")]
struct Cli {
    /// Base URL of the API
    #[arg(long, env = "TASKDESK_API_URL", global = true)]
    api_url: Option<String>,

    /// Where the session token is kept
    #[arg(long, env = "TASKDESK_TOKEN_FILE", global = true)]
    token_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and remember the session
    Login {
        #[arg(long)]
        email: String,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Create an account
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the logged in user
    Whoami,
    /// Counts, favorites, distribution and the new / in progress panels
    Dashboard,
    /// List todos
    List(FilterArgs),
    /// Add a todo
    Add(AddArgs),
    /// Change a todo's fields
    Edit(EditArgs),
    /// Move a todo to another status
    Status { id: Id, status: TodoStatus },
    /// Flip a todo's favorite flag
    Favorite { id: Id },
    /// Delete a todo after confirmation
    Delete {
        id: Id,
        /// Confirm without prompting
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args)]
struct FilterArgs {
    /// Search title and description
    #[arg(long, default_value = "")]
    keyword: String,
    /// NEW, IN_PROGRESS, COMPLETED or all
    #[arg(long)]
    status: Option<StatusFilter>,
    /// Only favorites
    #[arg(long)]
    favorites: bool,
    /// Creation day, YYYY-MM-DD
    #[arg(long)]
    date: Option<NaiveDate>,
}

impl From<FilterArgs> for FilterCriteria {
    fn from(args: FilterArgs) -> Self {
        Self {
            keyword: args.keyword,
            status: args.status.and_then(|status| status.0),
            only_favorites: args.favorites,
            date: args.date,
        }
    }
}

#[derive(Args)]
struct AddArgs {
    title: String,
    #[arg(long, default_value = "")]
    description: String,
    /// Only needed for past dates
    #[arg(long, default_value = "NEW")]
    status: TodoStatus,
    /// Emoji or icon URL
    #[arg(long)]
    icon: Option<String>,
    /// Defaults to today
    #[arg(long)]
    date: Option<NaiveDate>,
}

#[derive(Args)]
struct EditArgs {
    id: Id,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    status: Option<TodoStatus>,
    #[arg(long)]
    icon: Option<String>,
    #[arg(long)]
    date: Option<NaiveDate>,
}

impl EditArgs {
    fn apply(self, draft: &mut TodoDraft) {
        if let Some(title) = self.title {
            draft.title = title;
        }
        if let Some(description) = self.description {
            draft.description = description;
        }
        if let Some(status) = self.status {
            draft.status = status;
        }
        if let Some(icon) = self.icon {
            draft.icon = Some(icon);
        }
        if let Some(date) = self.date {
            draft.date = Some(date);
        }
    }
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load()?.with_overrides(cli.api_url, cli.token_file);

    let session = Arc::new(Session::new(FileTokenStore::new(&config.token_path)));
    let transport = Arc::new(HttpTransport::new(config.api_url));
    let client = ApiClient::new(transport, session);
    let notifier: Arc<dyn Notifier> = Arc::new(TerminalNotifier);

    let Err(report) = run(cli.command, client, notifier).await else {
        return Ok(());
    };

    // notified already, only the exit code is left to report
    match report.downcast_ref::<TodoError>() {
        Some(TodoError::AuthExpired) => {
            eprintln!("{LOGIN_HINT}");
            process::exit(TodoError::AuthExpired.exit_code());
        }
        Some(err) => process::exit(err.exit_code()),
        None => Err(report),
    }
}

async fn run(command: Command, client: ApiClient, notifier: Arc<dyn Notifier>) -> eyre::Result<()> {
    let auth = Auth::new(client.clone(), notifier.clone());

    match command {
        Command::Login { email, password } => {
            let password = password_or_prompt(password)?;
            if let Some(user) = auth.login(&email, &password).await? {
                println!("{}", ui::user(&user));
            }
        }
        Command::Register {
            username,
            email,
            password,
        } => {
            let password = password_or_prompt(password)?;
            auth.register(&username, &email, &password).await?;
        }
        Command::Logout => {
            auth.logout().await;
            println!("Logged out.");
        }
        command => {
            let user = auth.ensure_user().await?;
            let store = TodoStore::new(client, notifier);
            protected(command, &user, &store).await?;
        }
    }

    Ok(())
}

/// Commands behind the login guard.
async fn protected(command: Command, user: &User, store: &TodoStore) -> eyre::Result<()> {
    match command {
        Command::Whoami => println!("{}", ui::user(user)),
        Command::Dashboard => {
            store.refresh().await?;
            println!("{}", ui::dashboard(user, &store.todos().await));
        }
        Command::List(filter) => {
            let criteria = FilterCriteria::from(filter);
            store.set_criteria(criteria.clone()).await?;
            println!("{}", ui::list(&store.visible().await, &criteria));
        }
        Command::Add(args) => {
            // the duplicate check runs against the loaded list
            store.refresh().await?;
            let draft = TodoDraft {
                id: None,
                title: args.title,
                description: args.description,
                status: args.status,
                icon: args.icon,
                date: Some(args.date.unwrap_or_else(today)),
            };
            store.create(&draft).await?;
        }
        Command::Edit(args) => {
            let todo = lookup(store, &args.id).await?;
            let mut draft = TodoDraft::from_todo(&todo);
            args.apply(&mut draft);
            store.update(&draft).await?;
        }
        Command::Status { id, status } => {
            let todo = lookup(store, &id).await?;
            store.change_status(&todo, status).await?;
        }
        Command::Favorite { id } => {
            let todo = lookup(store, &id).await?;
            store.toggle_favorite(&todo).await?;
        }
        Command::Delete { id, yes } => {
            let todo = lookup(store, &id).await?;
            store.mark_for_delete(&todo).await?;

            let confirmed = yes
                || Confirm::new()
                    .with_prompt(format!(
                        "Are you sure you want to delete \"{}\"? This action cannot be undone.",
                        todo.title
                    ))
                    .default(false)
                    .interact()?;

            if confirmed {
                store.confirm_delete().await?;
            } else {
                store.cancel_delete().await;
                println!("Cancelled.");
            }
        }
        Command::Login { .. } | Command::Register { .. } | Command::Logout => {}
    }

    Ok(())
}

async fn lookup(store: &TodoStore, id: &Id) -> eyre::Result<Todo> {
    store.refresh().await?;
    store
        .find(id)
        .await
        .ok_or_else(|| eyre!("no todo with id {id}"))
}

fn password_or_prompt(password: Option<String>) -> eyre::Result<String> {
    match password {
        Some(password) => Ok(password),
        None => Ok(Password::new().with_prompt("Password").interact()?),
    }
}
