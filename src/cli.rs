//! Interface de linha de comando do leadqueue baseada em clap.
//!
//! Define a struct [`Cli`] com subcomandos [`Command`] (status, generate, work)
//! e a gramática [`SessionCommand`] lida linha a linha durante `work`.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::api::LeadUpdate;
use crate::queue::{ActivityType, ItemId, LeadStatus, NextTouch, Outcome, Plan, Resolution};

/// leadqueue: fila diária de contatos com leads, um bloco de trabalho por vez.
#[derive(Debug, Parser)]
#[command(name = "leadqueue", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Caminho para o arquivo de configuração (padrão: ./leadqueue.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// URL base da API, sobrescreve o arquivo de configuração.
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Habilita saída detalhada (verbose).
    #[arg(long, short, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Mostra o progresso do lote atual e as metas do dia.
    Status,

    /// Gera um novo lote no servidor, substituindo o atual.
    Generate(GenerateArgs),

    /// Abre uma sessão interativa de trabalho sobre o lote atual.
    Work {
        /// Papel do bloco inicial: "any", "unassigned" ou um papel específico.
        #[arg(long, default_value = "any")]
        role: String,
    },
}

#[derive(Debug, Clone, Args)]
pub struct GenerateArgs {
    /// Número de itens no lote (padrão: batch_size da configuração).
    #[arg(long)]
    pub size: Option<u32>,

    /// Indústria a incluir; pode repetir.
    #[arg(long = "industry")]
    pub industries: Vec<String>,
}

/// One line typed during a work session.
#[derive(Debug, Parser)]
#[command(no_binary_name = true, name = "session")]
pub struct SessionLine {
    #[command(subcommand)]
    pub command: SessionCommand,
}

#[derive(Debug, Subcommand)]
pub enum SessionCommand {
    /// Start a block for a role scope (default: any).
    Start { role: Option<String> },
    /// End the current block.
    End,
    /// Select an item by id.
    Select { id: String },
    /// Jump to the next open item in the block.
    Next,
    /// Show the selected item.
    Show,
    /// List open items for the block's role scope.
    List,
    /// Mark an item done.
    Done(DoneArgs),
    /// Skip an item.
    Skip {
        /// Item to skip (default: selected).
        #[arg(long)]
        item: Option<String>,
        /// Why it was skipped.
        #[arg(trailing_var_arg = true)]
        reason: Vec<String>,
    },
    /// Edit fields on a lead.
    Edit(EditArgs),
    /// Pull items added to the current batch on the server.
    Refresh,
    /// Reload the current batch, ending the block.
    Reload,
    /// Generate a new batch, ending the block.
    Generate(GenerateArgs),
    /// Batch progress and daily goals.
    Progress,
    /// Leave the session.
    #[command(alias = "exit")]
    Quit,
}

#[derive(Debug, Clone, Args)]
pub struct DoneArgs {
    /// call, email or social.
    #[arg(long, short = 'a', default_value = "")]
    pub activity: String,

    /// meeting_set, converted, no_answer, not_interested or touched.
    #[arg(long, short = 'o', conflicts_with_all = ["status", "next_touch"])]
    pub outcome: Option<String>,

    /// Set the status directly instead of choosing an outcome.
    #[arg(long, short = 's', requires = "next_touch")]
    pub status: Option<String>,

    /// none, tomorrow, 3_days or next_week. Used with --status.
    #[arg(long, short = 'n', requires = "status")]
    pub next_touch: Option<String>,

    /// Explicit next-touch date (YYYY-MM-DD).
    #[arg(long)]
    pub at: Option<NaiveDate>,

    /// Item to complete (default: selected).
    #[arg(long)]
    pub item: Option<String>,

    /// Free-form notes.
    #[arg(trailing_var_arg = true)]
    pub notes: Vec<String>,
}

impl DoneArgs {
    /// Blank activity is kept as `None` so the workbench rejects it.
    pub fn activity(&self) -> Result<Option<ActivityType>, String> {
        if self.activity.trim().is_empty() {
            return Ok(None);
        }
        ActivityType::parse(&self.activity)
            .map(Some)
            .ok_or_else(|| format!("unknown activity type '{}'", self.activity))
    }

    pub fn resolution(&self) -> Result<Resolution, String> {
        match (&self.status, &self.next_touch) {
            (Some(status), Some(touch)) => {
                let new_status =
                    LeadStatus::parse(status).ok_or_else(|| format!("unknown status '{status}'"))?;
                let next_touch =
                    NextTouch::parse(touch).ok_or_else(|| format!("unknown next touch '{touch}'"))?;
                Ok(Resolution::Explicit(Plan {
                    new_status,
                    next_touch,
                }))
            }
            _ => Ok(Resolution::Outcome(Outcome::from_code(
                self.outcome.as_deref().unwrap_or("touched"),
            ))),
        }
    }

    pub fn notes(&self) -> String {
        self.notes.join(" ")
    }

    pub fn item(&self) -> Option<ItemId> {
        self.item.as_deref().map(ItemId::from)
    }
}

#[derive(Debug, Clone, Args)]
pub struct EditArgs {
    pub lead_id: String,
    #[arg(long)]
    pub company: Option<String>,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub role: Option<String>,
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long)]
    pub location: Option<String>,
    #[arg(long)]
    pub industry: Option<String>,
}

impl EditArgs {
    pub fn update(&self) -> LeadUpdate {
        LeadUpdate {
            company: self.company.clone(),
            name: self.name.clone(),
            role: self.role.clone(),
            status: self.status.clone(),
            location: self.location.clone(),
            industry: self.industry.clone(),
            ..Default::default()
        }
    }
}

/// Parses one session line. Blank lines yield `Ok(None)`.
pub fn parse_session_line(line: &str) -> Result<Option<SessionCommand>, clap::Error> {
    let words: Vec<&str> = line.split_whitespace().collect();
    if words.is_empty() {
        return Ok(None);
    }
    SessionLine::try_parse_from(words).map(|parsed| Some(parsed.command))
}
