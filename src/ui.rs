use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Gauge, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use rusqlite::Connection;
use silk_progress::entities::collectible::{self, Category, Collectible};
use silk_progress::entities::format_percentage;
use silk_progress::progress::{fetch_progress, ProgressSummary};
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Overview,
    Items,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Overview => Page::Items,
            Page::Items => Page::Overview,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Overview => "Overview",
            Page::Items => "Items",
        }
    }
}

pub struct App {
    conn: Connection,
    pub summary: ProgressSummary,
    pub category: Category,
    pub items: Vec<Collectible>,
    pub state: TableState,
    pub current_page: Page,
    pub message: Option<String>,
}

impl App {
    pub fn new(conn: Connection) -> Result<Self> {
        let mut app = Self {
            summary: fetch_progress(&conn)?,
            conn,
            category: Category::Tools,
            items: Vec::new(),
            state: TableState::default(),
            current_page: Page::Overview,
            message: None,
        };
        app.load_items()?;
        Ok(app)
    }

    fn load_items(&mut self) -> Result<()> {
        self.items = collectible::fetch_all(&self.conn, self.category)?;
        let selected = match self.state.selected() {
            _ if self.items.is_empty() => None,
            Some(i) => Some(i.min(self.items.len() - 1)),
            None => Some(0),
        };
        self.state.select(selected);
        Ok(())
    }

    fn category_index(&self) -> usize {
        Category::ALL
            .iter()
            .position(|c| *c == self.category)
            .unwrap_or(0)
    }

    pub fn next_category(&mut self) -> Result<()> {
        let i = (self.category_index() + 1) % Category::ALL.len();
        self.select_category(Category::ALL[i])
    }

    pub fn previous_category(&mut self) -> Result<()> {
        let len = Category::ALL.len();
        let i = (self.category_index() + len - 1) % len;
        self.select_category(Category::ALL[i])
    }

    fn select_category(&mut self, category: Category) -> Result<()> {
        self.category = category;
        self.state.select(None);
        self.load_items()
    }

    pub fn selected_item(&self) -> Option<&Collectible> {
        self.state.selected().and_then(|i| self.items.get(i))
    }

    /// Flip the selected row between pending and collected, then refresh
    pub fn toggle_selected(&mut self) -> Result<()> {
        let Some(item) = self.selected_item() else {
            return Ok(());
        };
        let (id, name, status) = (item.id.clone(), item.name.clone(), item.status.toggled());

        collectible::set_status(&self.conn, self.category, &id, status)?;
        self.message = Some(format!("{} → {}", name, status.label()));
        self.reload()
    }

    pub fn reload(&mut self) -> Result<()> {
        self.summary = fetch_progress(&self.conn)?;
        self.load_items()
    }

    pub fn next(&mut self) {
        let len = self.items.len();
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
        let len = self.items.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
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

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return Ok(()),
                KeyCode::Tab => app.current_page = app.current_page.next(),
                KeyCode::Right | KeyCode::Char('l') => app.next_category()?,
                KeyCode::Left | KeyCode::Char('h') => app.previous_category()?,
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::Char(' ') | KeyCode::Enter if app.current_page == Page::Items => {
                    app.toggle_selected()?
                }
                KeyCode::Char('r') => app.reload()?,
                _ => {}
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    match app.current_page {
        Page::Overview => render_overview(f, chunks[1], app),
        Page::Items => render_items(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut tab_spans = vec![];
    for (i, page) in [Page::Overview, Page::Items].iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title().to_string(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Completion: {}%", format_percentage(app.summary.total_percentage())),
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Magenta)));

    f.render_widget(header, area);
}

fn render_overview(f: &mut Frame, area: Rect, app: &App) {
    let mut constraints = vec![Constraint::Length(3)];
    constraints.extend(app.summary.categories.iter().map(|_| Constraint::Length(3)));
    constraints.push(Constraint::Min(0));

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    let total = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" Collected Progress "))
        .gauge_style(Style::default().fg(Color::Magenta).bg(Color::Black))
        .ratio(app.summary.bar_width() / 100.0)
        .label(format!("{}%", format_percentage(app.summary.total_percentage())));
    f.render_widget(total, rows[0]);

    for (i, progress) in app.summary.categories.iter().enumerate() {
        let pct = progress.counts.percentage();
        let border = if progress.category == app.category {
            Color::Magenta
        } else {
            Color::DarkGray
        };
        let gauge = Gauge::default()
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(border))
                    .title(format!(" {} Collected ", progress.category.label())),
            )
            .gauge_style(Style::default().fg(Color::Green).bg(Color::Black))
            .percent(pct.min(100) as u16)
            .label(format!(
                "{} / {}  ({}%)",
                progress.counts.collected, progress.counts.total, pct
            ));
        f.render_widget(gauge, rows[i + 1]);
    }
}

fn render_items(f: &mut Frame, area: Rect, app: &mut App) {
    let header_cells = ["Name", "Status", "Notes", "%"].iter().map(|h| {
        Cell::from(*h).style(Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD))
    });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = app.items.iter().map(|item| {
        let color = if item.is_collected() { Color::Green } else { Color::Gray };
        Row::new(vec![
            Cell::from(truncate(&item.name, 40)),
            Cell::from(item.status.label()).style(Style::default().fg(color)),
            Cell::from(truncate(&item.notes, 40)),
            Cell::from(format_percentage(item.percentage)),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Length(42),
            Constraint::Length(11),
            Constraint::Min(20),
            Constraint::Length(6),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(format!(" {} ", app.category.label())),
    )
    .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);

    let mut status_spans = vec![Span::styled(
        format!(" {} {}/{} ", app.category.label(), selected, app.items.len()),
        Style::default().fg(Color::Cyan),
    )];

    if let Some(message) = &app.message {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(message.clone(), Style::default().fg(Color::Green)));
    }

    for (key, label) in [("Tab", " Page"), ("←/→", " Category"), ("↑/↓", " Nav"), ("Space", " Toggle"), ("r", " Reload")] {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(key, Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(label));
    }
    status_spans.push(Span::raw(" | "));
    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use silk_progress::{seed_database, setup_database, CollectibleStatus};

    fn seeded_app() -> App {
        let mut conn = Connection::open_in_memory().unwrap();
        setup_database(&conn).unwrap();
        seed_database(&mut conn).unwrap();
        App::new(conn).unwrap()
    }

    #[test]
    fn test_app_loads_tools_first() {
        let app = seeded_app();
        assert_eq!(app.category, Category::Tools);
        assert_eq!(app.items.len(), 51);
        assert_eq!(app.state.selected(), Some(0));
        assert_eq!(app.summary.total_percentage(), 87.0);
    }

    #[test]
    fn test_category_navigation_wraps() {
        let mut app = seeded_app();
        app.previous_category().unwrap();
        assert_eq!(app.category, Category::Abilities);
        assert_eq!(app.items.len(), 8);

        app.next_category().unwrap();
        app.next_category().unwrap();
        assert_eq!(app.category, Category::WeaverSkills);
    }

    #[test]
    fn test_toggle_updates_total() {
        let mut app = seeded_app();
        app.select_category(Category::Crests).unwrap();

        while app.selected_item().map(|i| i.status) != Some(CollectibleStatus::Pending) {
            app.next();
        }
        app.toggle_selected().unwrap();

        assert_eq!(app.summary.total_percentage(), 88.0);
        assert!(app.message.as_deref().unwrap_or_default().ends_with("Collected"));
    }

    #[test]
    fn test_row_navigation_wraps() {
        let mut app = seeded_app();
        app.select_category(Category::SilkHearts).unwrap();
        app.previous();
        assert_eq!(app.state.selected(), Some(2));
        app.next();
        assert_eq!(app.state.selected(), Some(0));
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("Brújula", 10), "Brújula");
        assert_eq!(truncate("Tobilleras rapisedeñas", 10), "Tobille...");
    }
}
