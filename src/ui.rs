// 🖥️ Terminal dashboard - ratatui front end over the view controller

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use finance_flow::{
    Action, Controller, Dashboard, ExpenseDraft, Month, Notification, NotificationKind, Severity,
    Store, Theme,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

const FORM_LABELS: [&str; 5] = ["Amount", "Currency", "Category", "Date", "Note"];

#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseForm {
    pub fields: [String; 5],
    pub focus: usize,
}

impl ExpenseForm {
    fn new(currency: &str, date: &str) -> Self {
        ExpenseForm {
            fields: [
                String::new(),
                currency.to_string(),
                String::new(),
                date.to_string(),
                String::new(),
            ],
            focus: 0,
        }
    }

    fn next_field(&mut self) {
        self.focus = (self.focus + 1) % self.fields.len();
    }

    fn previous_field(&mut self) {
        self.focus = (self.focus + self.fields.len() - 1) % self.fields.len();
    }

    fn to_draft(&self) -> ExpenseDraft {
        let text = |i: usize| Some(self.fields[i].clone()).filter(|s| !s.trim().is_empty());
        ExpenseDraft {
            amount: self.fields[0].trim().parse().ok(),
            currency_code: text(1),
            category: text(2),
            date: text(3),
            note: text(4),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    Normal,
    AddExpense(ExpenseForm),
    SetBudget(String),
    ConfirmReset,
}

pub struct App<S: Store> {
    pub controller: Controller<S>,
    pub dashboard: Dashboard,
    pub state: TableState,
    pub mode: Mode,
    /// Notifications from the last action, most severe first
    pub status: Vec<Notification>,
}

impl<S: Store> App<S> {
    pub fn new(mut controller: Controller<S>) -> Self {
        let pending = controller.take_notifications();
        let dashboard = controller.dashboard();

        let mut app = Self {
            controller,
            dashboard,
            state: TableState::default(),
            mode: Mode::Normal,
            status: Vec::new(),
        };
        app.show(pending);
        app.reset_selection();
        app
    }

    fn refresh(&mut self) {
        self.dashboard = self.controller.dashboard();
        let len = self.dashboard.expenses.len();
        match self.state.selected() {
            Some(i) if i >= len => self.reset_selection(),
            None if len > 0 => self.state.select(Some(0)),
            _ => {}
        }
    }

    fn reset_selection(&mut self) {
        if self.dashboard.expenses.is_empty() {
            self.state.select(None);
        } else {
            self.state.select(Some(0));
        }
    }

    fn show(&mut self, mut notifications: Vec<Notification>) {
        if notifications.is_empty() {
            return;
        }
        notifications.sort_by_key(|n| std::cmp::Reverse(severity_rank(n.severity)));
        self.status = notifications;
    }

    /// Run one action; returns false when the input was rejected
    pub fn apply(&mut self, action: Action) -> bool {
        let mut notifications = self.controller.handle(action);
        notifications.extend(self.controller.take_notifications());
        let accepted = !notifications
            .iter()
            .any(|n| n.kind == NotificationKind::ValidationFailed);

        self.show(notifications);
        self.refresh();
        accepted
    }

    pub fn next_month(&mut self) {
        let month = self.dashboard.month.next();
        self.apply(Action::ChangeMonth(month));
        self.reset_selection();
    }

    pub fn previous_month(&mut self) {
        let month = self.dashboard.month.previous();
        self.apply(Action::ChangeMonth(month));
        self.reset_selection();
    }

    pub fn cycle_currency(&mut self) {
        let code = self.dashboard.currency.next();
        self.apply(Action::ChangePrimaryCurrency(code));
    }

    pub fn start_add_expense(&mut self) {
        let month = self.dashboard.month;
        let today = chrono::Local::now().date_naive();
        let date = if month == Month::of(today) {
            today
        } else {
            month.first_day()
        };
        let form = ExpenseForm::new(self.dashboard.currency.as_str(), &date.format("%Y-%m-%d").to_string());
        self.mode = Mode::AddExpense(form);
    }

    pub fn edit_selected(&mut self) {
        if let Some(row) = self.state.selected().and_then(|i| self.dashboard.expenses.get(i)) {
            let id = row.id;
            self.apply(Action::EditExpense(id));
        }
    }

    pub fn next(&mut self) {
        let len = self.dashboard.expenses.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.dashboard.expenses.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    /// Returns true when the app should quit
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        let mode = std::mem::replace(&mut self.mode, Mode::Normal);
        match mode {
            Mode::Normal => return self.handle_normal_key(key),
            Mode::AddExpense(mut form) => match key.code {
                KeyCode::Esc => {}
                KeyCode::Enter => {
                    if !self.apply(Action::AddExpense(form.to_draft())) {
                        self.mode = Mode::AddExpense(form);
                    }
                }
                KeyCode::Tab | KeyCode::Down => {
                    form.next_field();
                    self.mode = Mode::AddExpense(form);
                }
                KeyCode::BackTab | KeyCode::Up => {
                    form.previous_field();
                    self.mode = Mode::AddExpense(form);
                }
                KeyCode::Backspace => {
                    form.fields[form.focus].pop();
                    self.mode = Mode::AddExpense(form);
                }
                KeyCode::Char(c) => {
                    form.fields[form.focus].push(c);
                    self.mode = Mode::AddExpense(form);
                }
                _ => self.mode = Mode::AddExpense(form),
            },
            Mode::SetBudget(mut input) => match key.code {
                KeyCode::Esc => {}
                KeyCode::Enter => {
                    let amount = input.trim().parse().ok();
                    if !self.apply(Action::SetBudget { amount }) {
                        self.mode = Mode::SetBudget(input);
                    }
                }
                KeyCode::Backspace => {
                    input.pop();
                    self.mode = Mode::SetBudget(input);
                }
                KeyCode::Char(c) => {
                    input.push(c);
                    self.mode = Mode::SetBudget(input);
                }
                _ => self.mode = Mode::SetBudget(input),
            },
            Mode::ConfirmReset => {
                if let KeyCode::Char('y') | KeyCode::Char('Y') = key.code {
                    self.apply(Action::ResetAll);
                    self.reset_selection();
                }
            }
        }
        false
    }

    fn handle_normal_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return true,
            KeyCode::Left | KeyCode::Char('h') => self.previous_month(),
            KeyCode::Right | KeyCode::Char('l') => self.next_month(),
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::Char('a') => self.start_add_expense(),
            KeyCode::Char('b') => self.mode = Mode::SetBudget(String::new()),
            KeyCode::Char('c') => self.cycle_currency(),
            KeyCode::Char('t') => {
                self.apply(Action::ToggleTheme);
            }
            KeyCode::Char('e') => self.edit_selected(),
            KeyCode::Char('R') => self.mode = Mode::ConfirmReset,
            _ => {}
        }
        false
    }
}

fn severity_rank(severity: Severity) -> u8 {
    match severity {
        Severity::Info => 0,
        Severity::Success => 1,
        Severity::Warning => 2,
        Severity::Error => 3,
    }
}

pub fn run_ui<S: Store>(app: &mut App<S>) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend, S: Store>(
    terminal: &mut Terminal<B>,
    app: &mut App<S>,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press && app.handle_key(key) {
                return Ok(());
            }
        }
    }
}

// ============================================================================
// Rendering
// ============================================================================

struct Palette {
    base: Style,
    border: Color,
    muted: Color,
}

fn palette(theme: Theme) -> Palette {
    match theme {
        Theme::Light => Palette {
            base: Style::default().fg(Color::Black).bg(Color::White),
            border: Color::Blue,
            muted: Color::Gray,
        },
        Theme::Dark => Palette {
            base: Style::default().fg(Color::White).bg(Color::Black),
            border: Color::Cyan,
            muted: Color::DarkGray,
        },
    }
}

/// `#rrggbb` to a terminal color
fn hex_color(hex: &str) -> Color {
    let channel = |i: usize| {
        hex.get(i..i + 2)
            .and_then(|h| u8::from_str_radix(h, 16).ok())
            .unwrap_or(0x80)
    };
    Color::Rgb(channel(1), channel(3), channel(5))
}

fn ui<S: Store>(f: &mut Frame, app: &mut App<S>) {
    let colors = palette(app.dashboard.theme);
    f.render_widget(Block::default().style(colors.base), f.size());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(3), // Budget / spent / remaining
            Constraint::Min(0),    // Expenses + breakdown
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app, &colors);
    render_stats(f, chunks[1], app, &colors);

    let content = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(chunks[2]);
    render_table(f, content[0], app, &colors);
    render_breakdown(f, content[1], app, &colors);

    render_status_bar(f, chunks[3], app, &colors);

    match &app.mode {
        Mode::Normal => {}
        Mode::AddExpense(form) => render_expense_form(f, form, &colors),
        Mode::SetBudget(input) => render_prompt(
            f,
            " Set Budget ",
            vec![Line::from(vec![
                Span::styled(format!("{} for {}: ", app.dashboard.currency_symbol, app.dashboard.month_label), Style::default().add_modifier(Modifier::BOLD)),
                Span::raw(format!("{}_", input)),
            ])],
            &colors,
        ),
        Mode::ConfirmReset => render_prompt(
            f,
            " Reset ",
            vec![
                Line::from("Delete all expenses, budgets and colors?"),
                Line::from(Span::styled("y = yes, any other key = cancel", Style::default().fg(colors.muted))),
            ],
            &colors,
        ),
    }
}

fn render_header<S: Store>(f: &mut Frame, area: Rect, app: &App<S>, colors: &Palette) {
    let d = &app.dashboard;
    let spans = vec![
        Span::styled("💸 Finance Flow", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("  │  "),
        Span::styled("◀ ", Style::default().fg(colors.muted)),
        Span::styled(d.month_label.clone(), Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
        Span::styled(" ▶", Style::default().fg(colors.muted)),
        Span::raw("  │  "),
        Span::raw(format!("{} ({})", d.currency, d.currency_symbol)),
        Span::raw("  │  "),
        Span::styled(format!("{} theme", d.theme), Style::default().fg(colors.muted)),
    ];

    let header = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(colors.border)));
    f.render_widget(header, area);
}

fn render_stats<S: Store>(f: &mut Frame, area: Rect, app: &App<S>, colors: &Palette) {
    let d = &app.dashboard;
    let boxes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 3), Constraint::Ratio(1, 3), Constraint::Ratio(1, 3)])
        .split(area);

    let remaining_color = if d.view.remaining < 0.0 { Color::Red } else { Color::Green };
    let stats = [
        (" Budget ", d.budget_display.clone(), Style::default()),
        (" Spent ", d.spent_display.clone(), Style::default().fg(Color::Yellow)),
        (" Money Left ", d.remaining_display.clone(), Style::default().fg(remaining_color).add_modifier(Modifier::BOLD)),
    ];

    for ((title, value, style), rect) in stats.into_iter().zip(boxes.iter()) {
        let widget = Paragraph::new(Span::styled(value, style))
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(colors.border))
                    .title(title),
            );
        f.render_widget(widget, *rect);
    }
}

fn render_table<S: Store>(f: &mut Frame, area: Rect, app: &mut App<S>, colors: &Palette) {
    let header_cells = ["", "Date", "Category", "Note", "Amount"]
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)));
    let header = Row::new(header_cells).height(1);

    let rows = app.dashboard.expenses.iter().map(|row| {
        let original = if row.currency_code == app.dashboard.currency {
            String::new()
        } else {
            format!(" ({:.2} {})", row.original_amount, row.currency_code)
        };
        Row::new(vec![
            Cell::from(row.icon),
            Cell::from(row.date.format("%b %d").to_string()),
            Cell::from(truncate(&row.category, 18)).style(Style::default().fg(hex_color(&row.color))),
            Cell::from(truncate(&row.note, 28)).style(Style::default().fg(colors.muted)),
            Cell::from(format!("{}{}", row.amount_display, original)).style(Style::default().fg(Color::Red)),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(3),
            Constraint::Length(8),
            Constraint::Length(20),
            Constraint::Min(10),
            Constraint::Length(26),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(colors.border))
            .title(format!(" Expenses ({}) ", app.dashboard.expenses.len())),
    )
    .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_breakdown<S: Store>(f: &mut Frame, area: Rect, app: &App<S>, colors: &Palette) {
    let d = &app.dashboard;
    let bar_width = area.width.saturating_sub(4) as f64;

    let mut lines = Vec::new();
    if d.categories.is_empty() {
        lines.push(Line::from(Span::styled(
            "No expenses this month",
            Style::default().fg(colors.muted).add_modifier(Modifier::ITALIC),
        )));
    }
    for slice in &d.categories {
        let share = if d.view.spent > 0.0 { slice.total / d.view.spent } else { 0.0 };
        let color = hex_color(&slice.color);
        lines.push(Line::from(vec![
            Span::styled("■ ", Style::default().fg(color)),
            Span::raw(format!("{} ", slice.category)),
            Span::styled(
                format!("{:.2} ({:.0}%)", slice.total, share * 100.0),
                Style::default().fg(colors.muted),
            ),
        ]));
        let filled = (share * bar_width).round() as usize;
        lines.push(Line::from(Span::styled("█".repeat(filled), Style::default().fg(color))));
    }

    let widget = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(colors.border))
            .title(" By Category "),
    );
    f.render_widget(widget, area);
}

fn render_status_bar<S: Store>(f: &mut Frame, area: Rect, app: &App<S>, colors: &Palette) {
    let mut spans = Vec::new();

    for n in &app.status {
        let color = match n.severity {
            Severity::Info => Color::Cyan,
            Severity::Success => Color::Green,
            Severity::Warning => Color::Yellow,
            Severity::Error => Color::Red,
        };
        spans.push(Span::styled(n.message.clone(), Style::default().fg(color).add_modifier(Modifier::BOLD)));
        spans.push(Span::raw("  │  "));
    }

    for (key, label) in [
        ("←/→", "month"),
        ("a", "add"),
        ("b", "budget"),
        ("c", "currency"),
        ("t", "theme"),
        ("R", "reset"),
    ] {
        spans.push(Span::styled(key, Style::default().fg(Color::Yellow)));
        spans.push(Span::raw(format!(" {}  ", label)));
    }
    spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    spans.push(Span::raw(" quit"));

    let status = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(colors.border)));
    f.render_widget(status, area);
}

fn render_expense_form(f: &mut Frame, form: &ExpenseForm, colors: &Palette) {
    let lines = FORM_LABELS
        .iter()
        .zip(form.fields.iter())
        .enumerate()
        .map(|(i, (label, value))| {
            let focused = i == form.focus;
            let label_style = if focused {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(colors.muted)
            };
            let cursor = if focused { "_" } else { "" };
            Line::from(vec![
                Span::styled(format!("  {:<10}", label), label_style),
                Span::raw(format!("{}{}", value, cursor)),
            ])
        })
        .collect();

    render_prompt(f, " Add Expense (Tab: next field, Enter: save, Esc: cancel) ", lines, colors);
}

fn render_prompt(f: &mut Frame, title: &str, lines: Vec<Line>, colors: &Palette) {
    let height = lines.len() as u16 + 2;
    let area = centered(f.size(), 64, height);
    let widget = Paragraph::new(lines).style(colors.base).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(title.to_string()),
    );
    f.render_widget(Clear, area);
    f.render_widget(widget, area);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}
