//! Interface de terminal do leadqueue: spinners e saída colorida.
//!
//! Usa `indicatif` para o spinner exibido enquanto uma requisição está em
//! andamento e `console` para estilizar cartões de item, progresso e metas.

use std::time::Duration;

use console::Style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::error::QueueError;
use crate::queue::{GoalMetric, ItemId, Progress, QueueItem, SessionController};

const BAR_WIDTH: usize = 20;

/// Spinner mostrado enquanto o servidor não responde.
///
/// O controle que iniciou a ação fica "desabilitado" (a sessão não lê a próxima
/// linha) até [`finish`](Pending::finish) ser chamado.
pub struct Pending {
    pb: ProgressBar,
}

impl Pending {
    pub fn start(message: impl Into<String>) -> Self {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(message.into());
        pb.enable_steady_tick(Duration::from_millis(100));
        Self { pb }
    }

    pub fn finish(self) {
        self.pb.finish_and_clear();
    }
}

/// Estilos usados em toda a saída do terminal.
pub struct Theme {
    green: Style,
    red: Style,
    yellow: Style,
    cyan: Style,
    dim: Style,
    bold: Style,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            green: Style::new().green().bold(),
            red: Style::new().red().bold(),
            yellow: Style::new().yellow(),
            cyan: Style::new().cyan(),
            dim: Style::new().dim(),
            bold: Style::new().bold(),
        }
    }
}

impl Theme {
    pub fn success(&self, message: &str) {
        println!("  {} {message}", self.green.apply_to("✓"));
    }

    /// Falhas mostram a categoria e a mensagem do servidor sem alteração.
    pub fn failure(&self, err: &QueueError) {
        println!(
            "  {} {}: {err}",
            self.red.apply_to("✗"),
            self.red.apply_to(err.kind())
        );
    }

    pub fn warn(&self, message: &str) {
        println!("  {} {message}", self.yellow.apply_to("!"));
    }

    pub fn info(&self, message: &str) {
        println!("  {}", self.dim.apply_to(message));
    }

    /// Cartão do item selecionado, ou o estado vazio/finalizado do lote.
    pub fn print_current(&self, current: Option<&QueueItem>, progress: &Progress) {
        if progress.is_empty() {
            println!("  {}", self.dim.apply_to("No items in this batch. Generate a new batch to begin."));
            return;
        }
        if progress.is_finished() {
            println!(
                "  {} All {} items finished. Generate a new batch to keep going.",
                self.green.apply_to("★"),
                progress.total
            );
            return;
        }
        match current {
            Some(item) => self.print_item(item),
            None => println!("  {}", self.dim.apply_to("Nothing selected.")),
        }
    }

    pub fn print_item(&self, item: &QueueItem) {
        let role = if item.is_unassigned() {
            "unassigned"
        } else {
            item.role.as_str()
        };
        println!();
        println!(
            "  {} {}",
            self.cyan.apply_to(format!("[{}]", item.item_id)),
            self.bold.apply_to(item.display_label())
        );
        println!("    role: {role}   status: {}", item.status);
        let details: Vec<String> = [
            item.location.as_ref().map(|v| format!("location: {v}")),
            item.industry.as_ref().map(|v| format!("industry: {v}")),
            item.forecast_month.as_ref().map(|v| format!("forecast: {v}")),
            item.arr.map(|v| format!("arr: {}", money(v))),
            item.ap_spend.map(|v| format!("ap spend: {}", money(v))),
            item.next_touch_at.as_ref().map(|v| format!("next touch: {v}")),
        ]
        .into_iter()
        .flatten()
        .collect();
        if !details.is_empty() {
            println!("    {}", self.dim.apply_to(details.join("   ")));
        }
        let flag = if item.is_completed {
            Some(self.green.apply_to("completed"))
        } else if item.is_skipped {
            Some(self.yellow.apply_to("skipped"))
        } else {
            None
        };
        if let Some(flag) = flag {
            println!("    {flag}");
        }
    }

    pub fn print_list(&self, items: &[&QueueItem], selected: Option<&ItemId>) {
        if items.is_empty() {
            println!("  {}", self.dim.apply_to("No open items."));
            return;
        }
        for item in items {
            let marker = if selected == Some(&item.item_id) { "›" } else { " " };
            let role = if item.is_unassigned() { "-" } else { item.role.as_str() };
            println!(
                "  {marker} {:<8} {:<40} {:<14} {}",
                item.item_id.as_str(),
                item.display_label(),
                role,
                item.status
            );
        }
    }

    pub fn print_session(&self, session: &SessionController, progress: &Progress) {
        match session.scope() {
            Some(scope) => println!(
                "  {} role={scope}  {}/{} done",
                self.cyan.apply_to("block"),
                progress.done,
                progress.total
            ),
            None => println!("  {}", self.dim.apply_to("No block running. Use `start [ROLE]`.")),
        }
    }

    pub fn print_progress(&self, progress: &Progress, goals: &[GoalMetric]) {
        println!();
        println!("{}", self.bold.apply_to("─── Batch ───"));
        println!(
            "  {} {:>3}%  {} done, {} remaining of {}",
            bar(progress.percent),
            progress.percent,
            progress.done,
            progress.remaining,
            progress.total
        );
        println!("{}", self.bold.apply_to("─── Daily goals ───"));
        for metric in goals {
            let style = if metric.percent >= 100 { &self.green } else { &self.yellow };
            println!(
                "  {:<7}{} {:>3}%  {}/{}",
                metric.activity.as_str(),
                style.apply_to(bar(metric.percent)),
                metric.percent,
                metric.count,
                metric.target
            );
        }
    }
}

fn bar(percent: u32) -> String {
    let filled = (percent.min(100) as usize * BAR_WIDTH) / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

fn money(value: f64) -> String {
    if value >= 1_000_000.0 {
        format!("${:.1}M", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("${:.0}K", value / 1_000.0)
    } else {
        format!("${value:.0}")
    }
}
