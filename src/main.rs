// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use std::env;

use finance_flow::{
    Action, Config, Controller, CurrencyCode, Dashboard, ExpenseDraft, Month, Notification,
    NotificationKind, Severity, SqliteStore, Store, Theme, VERSION,
};

const USAGE: &str = "\
Usage: finance-flow [--db <path>] [command]

Commands:
  add <amount> <currency> <category> <YYYY-MM-DD> [note...]
  budget <YYYY-MM> <amount>
  view [YYYY-MM]
  currency <CODE>
  theme <light|dark>
  reset --yes
  currencies

Without a command the terminal dashboard opens.";

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let (config, rest) = Config::from_env_and_args(args)?;
    config.ensure_db_dir()?;

    let command = rest.first().map(String::as_str);
    let params = rest.get(1..).unwrap_or_default();

    match command {
        None => run_ui_mode(&config),
        Some("add") => {
            init_logging(&config);
            run_add(&config, params)
        }
        Some("budget") => {
            init_logging(&config);
            run_budget(&config, params)
        }
        Some("view") => {
            init_logging(&config);
            run_view(&config, params)
        }
        Some("currency") => {
            init_logging(&config);
            run_currency(&config, params)
        }
        Some("theme") => {
            init_logging(&config);
            run_theme(&config, params)
        }
        Some("reset") => {
            init_logging(&config);
            run_reset(&config, params)
        }
        Some("currencies") => {
            run_currencies();
            Ok(())
        }
        Some("help") | Some("--help") | Some("-h") => {
            println!("💸 Finance Flow v{}\n\n{}", VERSION, USAGE);
            Ok(())
        }
        Some(other) => bail!("Unknown command '{}'\n\n{}", other, USAGE),
    }
}

fn init_logging(config: &Config) {
    tracing_subscriber::fmt()
        .with_env_filter(config.env_filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn open(config: &Config, month: Option<Month>) -> Result<Controller<SqliteStore>> {
    let store = SqliteStore::open(&config.db_path)
        .with_context(|| format!("Failed to open database at {}", config.db_path.display()))?;
    Ok(match month {
        Some(month) => Controller::with_month(store, month),
        None => Controller::new(store),
    })
}

// ============================================================================
// Commands
// ============================================================================

fn run_add(config: &Config, params: &[String]) -> Result<()> {
    if params.len() < 4 {
        bail!("add needs <amount> <currency> <category> <YYYY-MM-DD>\n\n{}", USAGE);
    }

    let note = params[4..].join(" ");
    let draft = ExpenseDraft {
        amount: params[0].trim().parse().ok(),
        currency_code: Some(params[1].clone()),
        category: Some(params[2].clone()),
        date: Some(params[3].clone()),
        note: Some(note).filter(|n| !n.is_empty()),
    };

    // Show the month the expense lands in
    let month = NaiveDate::parse_from_str(params[3].trim(), "%Y-%m-%d")
        .ok()
        .map(Month::of);

    let mut controller = open(config, month)?;
    let notifications = controller.handle(Action::AddExpense(draft));
    finish(&mut controller, notifications)
}

fn run_budget(config: &Config, params: &[String]) -> Result<()> {
    let (month, amount) = match params {
        [month, amount] => (month, amount),
        _ => bail!("budget needs <YYYY-MM> <amount>\n\n{}", USAGE),
    };
    let month: Month = month.parse()?;

    let mut controller = open(config, Some(month))?;
    let notifications = controller.handle(Action::SetBudget {
        amount: amount.trim().parse().ok(),
    });
    finish(&mut controller, notifications)
}

fn run_view(config: &Config, params: &[String]) -> Result<()> {
    let month = params.first().map(|m| m.parse::<Month>()).transpose()?;
    let mut controller = open(config, month)?;
    let notifications = controller.take_notifications();
    finish(&mut controller, notifications)
}

fn run_currency(config: &Config, params: &[String]) -> Result<()> {
    let code: CurrencyCode = match params.first() {
        Some(code) => code.parse()?,
        None => bail!("currency needs a code ({})", currency_list()),
    };

    let mut controller = open(config, None)?;
    let notifications = controller.handle(Action::ChangePrimaryCurrency(code));
    finish(&mut controller, notifications)
}

fn run_theme(config: &Config, params: &[String]) -> Result<()> {
    let theme: Theme = match params.first() {
        Some(theme) => theme.parse()?,
        None => bail!("theme needs light or dark"),
    };

    let mut controller = open(config, None)?;
    let notifications = run_action(&mut controller, Action::SetTheme(theme));
    print_notifications(&notifications);
    if !notifications
        .iter()
        .any(|n| n.kind == NotificationKind::PersistenceFailed)
    {
        println!("✓ Theme set to {}", theme);
    }
    Ok(())
}

fn run_reset(config: &Config, params: &[String]) -> Result<()> {
    if params.first().map(String::as_str) != Some("--yes") {
        println!("⚠️  This deletes every expense, budget and category color.");
        println!("   Run again with: finance-flow reset --yes");
        return Ok(());
    }

    let mut controller = open(config, None)?;
    let notifications = run_action(&mut controller, Action::ResetAll);
    print_notifications(&notifications);
    Ok(())
}

fn run_currencies() {
    println!("💱 Supported currencies (rate to USD)");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    for code in CurrencyCode::ALL {
        println!("  {}  {:<4} {:>8}", code, code.symbol(), code.rate_to_reference());
    }
}

fn currency_list() -> String {
    CurrencyCode::ALL
        .iter()
        .map(CurrencyCode::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

// ============================================================================
// Output
// ============================================================================

/// Apply one action and collect everything it raised, startup warnings included
fn run_action<S: Store>(controller: &mut Controller<S>, action: Action) -> Vec<Notification> {
    let mut notifications = controller.handle(action);
    notifications.extend(controller.take_notifications());
    notifications
}

/// Print what happened and the resulting month; rejected input fails the command
fn finish(controller: &mut Controller<SqliteStore>, mut notifications: Vec<Notification>) -> Result<()> {
    notifications.extend(controller.take_notifications());
    print_notifications(&notifications);

    if let Some(rejected) = notifications
        .iter()
        .find(|n| n.kind == NotificationKind::ValidationFailed)
    {
        bail!("{}", rejected.message);
    }

    print_dashboard(&controller.dashboard());
    Ok(())
}

fn print_notifications(notifications: &[Notification]) {
    for n in notifications {
        let icon = match n.severity {
            Severity::Info => "ℹ️ ",
            Severity::Success => "✓",
            Severity::Warning => "⚠️ ",
            Severity::Error => "❌",
        };
        println!("{} {}", icon, n.message);
    }
}

fn print_dashboard(d: &Dashboard) {
    println!("\n📅 {} ({})", d.month_label, d.currency);
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("  Budget:     {}", d.budget_display);
    println!("  Spent:      {}", d.spent_display);
    println!("  Money left: {}", d.remaining_display);
    if d.is_over_budget {
        println!("  🚨 Over budget");
    }

    if d.expenses.is_empty() {
        println!("\n  No expenses this month");
        return;
    }

    println!("\n📋 Expenses");
    for row in &d.expenses {
        println!(
            "  {} {}  {:<16} {:>14}  {}",
            row.icon,
            row.date.format("%b %d"),
            row.category,
            row.amount_display,
            row.note
        );
    }

    println!("\n📊 By category");
    for slice in &d.categories {
        println!("  {:<16} {:>12.2}  {}", slice.category, slice.total, slice.color);
    }
}

// ============================================================================
// Terminal UI
// ============================================================================

#[cfg(feature = "tui")]
fn run_ui_mode(config: &Config) -> Result<()> {
    println!("🖥️  Loading Finance Flow...\n");

    // Logs go to a file so the alternate screen stays clean
    let log_path = config.log_path();
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(config.env_filter())
        .with_writer(std::sync::Mutex::new(log_file))
        .with_ansi(false)
        .init();

    let controller = open(config, None)?;
    let mut app = ui::App::new(controller);
    ui::run_ui(&mut app)?;

    println!("\n✅ Finance Flow closed");

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &Config) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use a command, see: finance-flow help");
    eprintln!("   Or the web UI: cargo run --bin finance-flow-server --features server");
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use finance_flow::MemoryStore;

    fn kinds(notifications: &[Notification]) -> Vec<NotificationKind> {
        notifications.iter().map(|n| n.kind).collect()
    }

    #[test]
    fn test_theme_command_reports_startup_warnings() {
        let mut store = MemoryStore::new();
        store.insert_raw("expenses", "{{{");
        let mut controller = Controller::with_month(store, "2024-03".parse().unwrap());

        let notifications = run_action(&mut controller, Action::SetTheme(Theme::Dark));
        assert_eq!(
            kinds(&notifications),
            vec![NotificationKind::StorageRecovered],
            "recovered storage must reach the user"
        );
        assert_eq!(controller.state().preferences.theme, Theme::Dark);
        assert!(controller.take_notifications().is_empty(), "nothing left pending");
    }

    #[test]
    fn test_reset_command_collects_all_notifications() {
        let mut store = MemoryStore::new();
        store.insert_raw("budgets", "[1, 2]");
        let mut controller = Controller::with_month(store, "2024-03".parse().unwrap());

        let notifications = run_action(&mut controller, Action::ResetAll);
        assert_eq!(
            kinds(&notifications),
            vec![NotificationKind::StorageRecovered, NotificationKind::DataReset]
        );
    }
}
