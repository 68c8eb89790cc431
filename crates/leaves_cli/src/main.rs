use clap::{CommandFactory, Parser};
use leaves_cli::cli::{self, Cli, Command, SessionCli, SessionCommand};
use leaves_cli::render;
use leaves_cli::shell::{expand_alias, is_affirmative, normalize_parse_error, split_command_line};
use leaves_core::config::{self, Config, Palette, palette_for_theme};
use leaves_core::error::AppError;
use leaves_core::model::{Task, TaskId};
use leaves_core::notify::{self, NoopNotifier, Notifier};
use leaves_core::remote::HttpSuggestions;
use leaves_core::session::Session;
use leaves_core::storage::JsonFileStore;
use leaves_core::store::{NewTask, TaskStore};
use leaves_core::view::StatusFilter;
use std::io::{self, BufRead, Write};
use time::{OffsetDateTime, UtcOffset};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

struct App {
    config: Config,
    palette: Palette,
    offset: UtcOffset,
    session: Session<JsonFileStore, Box<dyn Notifier>>,
}

impl App {
    fn open(config: Config, offset: UtcOffset, quiet: bool) -> Result<Self, AppError> {
        let store = TaskStore::open(JsonFileStore::from_env()?, config.store_key.clone())?;
        let notifier: Box<dyn Notifier> = if quiet {
            Box::new(NoopNotifier)
        } else {
            notify::notifier_from_config(&config)
        };
        let session = Session::new(store, notifier, config.create_delay());

        Ok(Self {
            palette: palette_for_theme(config.theme.as_deref()),
            offset,
            session,
            config,
        })
    }

    fn suggestions(&self) -> Result<HttpSuggestions, AppError> {
        HttpSuggestions::new(self.config.suggestion_endpoint.clone())
    }

    fn require(&self, id: TaskId) -> Result<&Task, AppError> {
        self.session
            .store()
            .find_by_id(id)
            .ok_or_else(|| AppError::not_found(format!("no note with id {id}")))
    }
}

/// Tracing is opt-in via `RUST_LOG`; an empty or invalid filter means off.
fn init_tracing() {
    let filter = std::env::var("RUST_LOG")
        .ok()
        .and_then(|raw| {
            let raw = raw.trim();
            if raw.is_empty() {
                return None;
            }
            EnvFilter::try_new(raw).ok()
        })
        .unwrap_or_else(|| EnvFilter::new("off"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .with(filter)
        .init();
}

fn load_config(raw_overrides: &[String]) -> Result<Config, AppError> {
    let loaded = config::load_config_with_fallback();
    if let Some(err) = loaded.error {
        eprintln!("WARNING: {err}; using default configuration");
    }
    let overrides = cli::collect_overrides(raw_overrides)?;
    Ok(config::merge_overrides(&loaded.config, &overrides))
}

fn print_json(value: &serde_json::Value) {
    println!("{value}");
}

fn print_list(app: &App, json: bool) -> Result<(), AppError> {
    let now = OffsetDateTime::now_utc();
    let visible = app.session.visible();
    if json {
        print_json(&render::tasks_json(&visible, now));
        return Ok(());
    }

    println!(
        "{}",
        render::render_table(&visible, app.session.view(), now, app.offset)?
    );
    if let Some(helper) = app.session.helper() {
        println!("{}", app.palette.mutedize(helper));
    }
    Ok(())
}

fn print_task(task: &Task, json: bool, label: &str) {
    if json {
        print_json(&render::task_json(task, OffsetDateTime::now_utc()));
    } else {
        println!("{label}: {} ({})", task.description(), task.id());
    }
}

fn confirm(input: &mut dyn BufRead, question: &str) -> Result<bool, AppError> {
    print!("{question} [y/N] ");
    io::stdout().flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(is_affirmative(&answer))
}

async fn watch(app: &App, count: Option<u32>, json: bool) -> Result<(), AppError> {
    let mut ticker = tokio::time::interval(app.config.refresh_interval());
    let mut ticks = 0u32;

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => break,
        }

        if ticks == 0 || app.session.wants_refresh() {
            print_list(app, json)?;
        }
        ticks += 1;
        if count.is_some_and(|limit| ticks >= limit) {
            break;
        }
    }

    Ok(())
}

fn notify_due(app: &App, json: bool) -> Result<(), AppError> {
    let notifier: Box<dyn Notifier> = if json {
        Box::new(NoopNotifier)
    } else {
        notify::notifier_from_config(&app.config)
    };
    let outcome = notify::notify_due(
        app.session.store().tasks(),
        OffsetDateTime::now_utc(),
        notifier.as_ref(),
    );

    for failure in &outcome.failures {
        tracing::warn!(id = %failure.task_id, error = %failure.error, "notification failed");
    }

    if json {
        let failures: Vec<_> = outcome
            .failures
            .iter()
            .map(|failure| {
                serde_json::json!({ "id": failure.task_id, "error": failure.error.to_string() })
            })
            .collect();
        print_json(&serde_json::json!({ "notified": outcome.notified, "failures": failures }));
    } else if outcome.notified.is_empty() && outcome.failures.is_empty() {
        println!("No notes are due");
    } else {
        println!("Notified {} due note(s)", outcome.notified.len());
        for failure in &outcome.failures {
            eprintln!("ERROR: note {}: {}", failure.task_id, failure.error);
        }
    }

    Ok(())
}

async fn run_command(
    app: &mut App,
    command: Command,
    json: bool,
    input: &mut dyn BufRead,
) -> Result<(), AppError> {
    match command {
        Command::Add {
            description,
            deadline,
        } => {
            let Some(description) = description else {
                return Err(AppError::invalid_input("description is required"));
            };
            let deadline = deadline
                .map(|raw| cli::parse_deadline(&raw, app.offset))
                .transpose()?;

            let task = app
                .session
                .submit(NewTask::new(description).with_deadline(deadline))
                .await?;
            print_task(&task, json, "Added note");
        }
        Command::List { search, filter } => {
            // Only the flags given change the view; the session keeps the rest.
            if let Some(filter) = filter {
                let filter: StatusFilter = filter.parse()?;
                app.session.set_filter(filter);
            }
            if let Some(search) = search {
                app.session.set_search(search);
            }
            print_list(app, json)?;
        }
        Command::Show { id } => {
            let task = app.require(id.parse()?)?;
            let now = OffsetDateTime::now_utc();
            if json {
                print_json(&render::task_json(task, now));
            } else {
                println!(
                    "{}",
                    render::render_detail(task, now, app.offset, &app.palette)?
                );
            }
        }
        Command::Edit {
            id,
            new_description,
        } => {
            let task = app.session.edit(id.parse()?, &new_description)?;
            print_task(&task, json, "Updated note");
        }
        Command::Toggle { id } => {
            let id: TaskId = id.parse()?;
            match app.session.toggle(id)? {
                Some(task) if json => print_json(&render::task_json(&task, OffsetDateTime::now_utc())),
                Some(task) => println!(
                    "Marked note {} as {}",
                    task.id(),
                    task.status().as_str()
                ),
                None if json => print_json(&serde_json::Value::Null),
                None => println!("No note with id {id}"),
            }
        }
        Command::Delete { id, yes } => {
            let id: TaskId = id.parse()?;
            if app.session.store().find_by_id(id).is_none() {
                println!("No note with id {id}");
                return Ok(());
            }

            let confirmed = yes || confirm(input, "Delete this note?")?;
            match app.session.delete(id, confirmed)? {
                Some(task) => print_task(&task, json, "Deleted note"),
                None => println!("Cancelled"),
            }
        }
        Command::Clear { yes } => {
            let confirmed = yes || confirm(input, "Delete all notes?")?;
            if app.session.clear_all(confirmed)? {
                if json {
                    print_json(&serde_json::json!({ "cleared": true }));
                } else {
                    println!("Cleared all notes");
                }
            } else {
                println!("Cancelled");
            }
        }
        Command::Sync { limit } => {
            let port = app.suggestions()?;
            let limit = limit.unwrap_or(app.config.suggestion_limit);
            let created = app.session.sync_suggestions(&port, limit).await?;
            if json {
                let refs: Vec<&Task> = created.iter().collect();
                print_json(&render::tasks_json(&refs, OffsetDateTime::now_utc()));
            } else {
                for task in &created {
                    println!("Added suggestion: {} ({})", task.description(), task.id());
                }
            }
        }
        Command::Push { id } => {
            let port = app.suggestions()?;
            let echoed = app.session.push(&port, id.parse()?).await?;
            if json {
                print_json(&serde_json::to_value(&echoed)?);
            } else {
                match echoed.id {
                    Some(remote_id) => println!("Sent note: {} (remote id {remote_id})", echoed.title),
                    None => println!("Sent note: {}", echoed.title),
                }
            }
        }
        Command::Notify => notify_due(app, json)?,
        Command::Watch { count } => watch(app, count, json).await?,
    }

    Ok(())
}

/// Commands that print their own result and leave the list alone.
fn prints_own_view(command: &SessionCommand) -> bool {
    matches!(
        command,
        SessionCommand::Base(
            Command::List { .. } | Command::Show { .. } | Command::Notify | Command::Watch { .. }
        )
    )
}

async fn run_session_command(
    app: &mut App,
    command: SessionCommand,
    json: bool,
    input: &mut dyn BufRead,
) -> Result<(), AppError> {
    let render_after = !prints_own_view(&command);

    match command {
        SessionCommand::Base(command) => run_command(app, command, json, input).await?,
        SessionCommand::Search { text } => app.session.set_search(text.join(" ")),
        SessionCommand::Filter { filter } => app.session.set_filter(filter.parse()?),
        SessionCommand::BeginEdit { id } => {
            let id: TaskId = id.parse()?;
            if !app.session.begin_edit(id) {
                return Err(AppError::invalid_input(format!("cannot edit note {id} now")));
            }
        }
        SessionCommand::Save { text } => app.session.save_edit(&text)?,
        SessionCommand::Cancel => app.session.cancel_edit(),
    }

    if render_after {
        print_list(app, json)?;
    }
    Ok(())
}

fn print_help() {
    let mut cmd = SessionCli::command();
    println!("{}", cmd.render_help());
}

async fn run_interactive(config: Config, offset: UtcOffset) -> Result<(), AppError> {
    let mut app = App::open(config, offset, false)?;
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut line = String::new();

    print_list(&app, false)?;
    loop {
        line.clear();
        if input.read_line(&mut line)? == 0 {
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("quit") {
            break;
        }
        if trimmed == "help" || trimmed == "?" {
            print_help();
            continue;
        }

        let args = match split_command_line(trimmed)
            .and_then(|args| expand_alias(args, &app.config.aliases))
        {
            Ok(args) if args.is_empty() => continue,
            Ok(args) => args,
            Err(err) => {
                eprintln!("ERROR: {err}");
                continue;
            }
        };

        let argv = std::iter::once("leaves".to_string()).chain(args);
        let parsed = match SessionCli::try_parse_from(argv) {
            Ok(parsed) => parsed,
            Err(err) if !err.use_stderr() => {
                let _ = err.print();
                continue;
            }
            Err(err) => {
                eprintln!("ERROR: {}", normalize_parse_error(err));
                continue;
            }
        };

        if let Err(err) = run_session_command(&mut app, parsed.command, parsed.json, &mut input).await
        {
            eprintln!("ERROR: {err}");
        }
    }

    Ok(())
}

async fn run(cli: Cli, config: Config, offset: UtcOffset) -> Result<(), AppError> {
    let mut app = App::open(config, offset, cli.json)?;
    let stdin = io::stdin();
    let mut input = stdin.lock();
    run_command(&mut app, cli.command, cli.json, &mut input).await
}

fn exit_with(err: AppError) -> ! {
    eprintln!("ERROR: {err}");
    std::process::exit(1);
}

fn main() {
    init_tracing();
    // Read before any runtime thread exists.
    let offset = cli::local_offset();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|err| exit_with(err.into()));

    let mut args = std::env::args_os();
    args.next();
    if args.next().is_none() {
        let config = load_config(&[]).unwrap_or_else(|err| exit_with(err));
        if let Err(err) = runtime.block_on(run_interactive(config, offset)) {
            exit_with(err);
        }
        return;
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => {
            let _ = err.print();
            return;
        }
        Err(err) => exit_with(normalize_parse_error(err)),
    };

    let config = load_config(&cli.config_override).unwrap_or_else(|err| exit_with(err));
    if let Err(err) = runtime.block_on(run(cli, config, offset)) {
        exit_with(err);
    }
}
