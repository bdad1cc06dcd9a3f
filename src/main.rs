mod api;
mod cli;
mod config;
mod error;
mod queue;
mod ui;
mod workbench;

use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use api::{HttpQueueClient, QueueApi};
use cli::{Cli, Command, GenerateArgs, SessionCommand, parse_session_line};
use config::LeadQueueConfig;
use error::QueueError;
use queue::{ItemId, RoleScope};
use ui::{Pending, Theme};
use workbench::{Completion, Workbench};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => LeadQueueConfig::load_from(path)?,
        None => LeadQueueConfig::load()?,
    };
    if let Some(url) = &cli.base_url {
        config.base_url = url.clone();
    }

    let client = HttpQueueClient::new(
        &config.base_url,
        config.connect_timeout(),
        config.request_timeout(),
    )?;
    let mut bench = Workbench::new(client, config.goals);
    let theme = Theme::default();

    match cli.command {
        Command::Status => {
            load(&mut bench, &theme).await?;
            theme.print_progress(&bench.progress(), &bench.goal_metrics());
        }
        Command::Generate(args) => {
            generate(&mut bench, &theme, &config, args).await?;
            theme.print_progress(&bench.progress(), &bench.goal_metrics());
        }
        Command::Work { role } => {
            load(&mut bench, &theme).await?;
            run_session(&mut bench, &theme, &config, RoleScope::parse(&role)).await?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "leadqueue=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn load<A: QueueApi>(bench: &mut Workbench<A>, theme: &Theme) -> Result<(), QueueError> {
    let pending = Pending::start("Loading current batch...");
    let loaded = bench.load_current().await;
    pending.finish();
    if !loaded? {
        theme.warn("No active batch on the server. Run `leadqueue generate` to create one.");
    }
    Ok(())
}

async fn generate<A: QueueApi>(
    bench: &mut Workbench<A>,
    theme: &Theme,
    config: &LeadQueueConfig,
    args: GenerateArgs,
) -> Result<(), QueueError> {
    let size = args.size.unwrap_or(config.batch_size);
    let industries = if args.industries.is_empty() {
        config.industries.clone()
    } else {
        args.industries
    };
    let pending = Pending::start(format!("Generating a batch of {size}..."));
    let result = bench.generate(size, industries).await;
    pending.finish();
    let batch = result?;
    let label = batch.id.map(|id| format!(" {id}")).unwrap_or_default();
    let loaded = bench.store().len();
    let requested = batch.size.map(|n| format!(" of {n} requested")).unwrap_or_default();
    theme.success(&format!("Batch{label} ready with {loaded} items{requested}"));
    if let Some(created_at) = batch.created_at {
        theme.info(&format!("Created at {created_at}"));
    }
    Ok(())
}

/// Reads session commands from stdin until `quit` or end of input. Each
/// command runs to completion before the next line is read.
async fn run_session<A: QueueApi>(
    bench: &mut Workbench<A>,
    theme: &Theme,
    config: &LeadQueueConfig,
    scope: RoleScope,
) -> Result<()> {
    if !bench.store().is_empty() {
        bench.start(scope);
    }
    show(bench, theme);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match parse_session_line(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(err) => {
                println!("{err}");
                continue;
            }
        };
        if matches!(command, SessionCommand::Quit) {
            break;
        }
        if let Err(err) = dispatch(bench, theme, config, command).await {
            theme.failure(&err);
        }
    }
    Ok(())
}

async fn dispatch<A: QueueApi>(
    bench: &mut Workbench<A>,
    theme: &Theme,
    config: &LeadQueueConfig,
    command: SessionCommand,
) -> Result<(), QueueError> {
    match command {
        SessionCommand::Start { role } => {
            let scope = RoleScope::parse(role.as_deref().unwrap_or("any"));
            bench.start(scope);
            show(bench, theme);
        }
        SessionCommand::End => {
            bench.end();
            theme.info("Block ended.");
        }
        SessionCommand::Select { id } => {
            bench.select(ItemId::new(id))?;
            show(bench, theme);
        }
        SessionCommand::Next => {
            bench.select_next();
            show(bench, theme);
        }
        SessionCommand::Show => show(bench, theme),
        SessionCommand::List => {
            let scope = bench.session().scope().cloned().unwrap_or_default();
            theme.print_list(&bench.pending(&scope), bench.session().selected());
        }
        SessionCommand::Done(args) => {
            ensure_controls(bench)?;
            let id = target(bench, args.item())?;
            let completion = Completion {
                activity: args.activity().map_err(QueueError::Validation)?,
                resolution: args.resolution().map_err(QueueError::Validation)?,
                notes: args.notes(),
                next_touch_at: args.at,
            };
            let pending = Pending::start(format!("Completing {id}..."));
            let result = bench.mark_done(&id, completion).await;
            pending.finish();
            let plan = result?;
            theme.success(&format!(
                "{id} done: status {}, next touch {}",
                plan.new_status, plan.next_touch
            ));
            show(bench, theme);
        }
        SessionCommand::Skip { item, reason } => {
            ensure_controls(bench)?;
            let id = target(bench, item.map(ItemId::new))?;
            let pending = Pending::start(format!("Skipping {id}..."));
            let result = bench.mark_skip(&id, &reason.join(" ")).await;
            pending.finish();
            result?;
            theme.success(&format!("{id} skipped"));
            show(bench, theme);
        }
        SessionCommand::Edit(args) => {
            let pending = Pending::start(format!("Updating lead {}...", args.lead_id));
            let result = bench.edit_lead(&args.lead_id, args.update()).await;
            pending.finish();
            let touched = result?;
            theme.success(&format!("Lead {} updated ({touched} items)", args.lead_id));
        }
        SessionCommand::Refresh => {
            let added = bench.refresh().await?;
            theme.info(&format!("{added} new items loaded; restart the block to include them."));
        }
        SessionCommand::Reload => {
            load(bench, theme).await?;
            show(bench, theme);
        }
        SessionCommand::Generate(args) => {
            generate(bench, theme, config, args).await?;
            show(bench, theme);
        }
        SessionCommand::Progress => {
            theme.print_progress(&bench.progress(), &bench.goal_metrics());
        }
        SessionCommand::Quit => {}
    }
    Ok(())
}

fn ensure_controls<A: QueueApi>(bench: &Workbench<A>) -> Result<(), QueueError> {
    if bench.controls_enabled() {
        Ok(())
    } else {
        Err(QueueError::Validation(
            "Batch is finished or empty. Generate a new batch first.".into(),
        ))
    }
}

/// The explicit item, or the current selection.
fn target<A: QueueApi>(bench: &Workbench<A>, explicit: Option<ItemId>) -> Result<ItemId, QueueError> {
    explicit
        .or_else(|| bench.session().selected().cloned())
        .ok_or_else(|| QueueError::Validation("No item selected. Use `select ID` or --item.".into()))
}

fn show<A: QueueApi>(bench: &Workbench<A>, theme: &Theme) {
    theme.print_session(bench.session(), &bench.session_progress());
    theme.print_current(bench.current(), &bench.progress());
}
