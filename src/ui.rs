use anyhow::Result;
use chrono::NaiveDate;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use pythrone::derived::{
    display_id, egg_detail, female_label, format_change, lock_summary, male_label, weight_history,
};
use pythrone::follicle::{latest_check, next_check_reminder, pairing_next_check_due};
use pythrone::grouping::{group_animals_by_status, group_pairings, partition_clutches};
use pythrone::{Animal, AnimalStatus, Clutch, Pairing, PairingStatus, StatusVisibility, Urgency, WeightRecord};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::collections::HashMap;
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Collection,
    Clutches,
    Pairings,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Collection => Page::Clutches,
            Page::Clutches => Page::Pairings,
            Page::Pairings => Page::Collection,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Collection => Page::Pairings,
            Page::Clutches => Page::Collection,
            Page::Pairings => Page::Clutches,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Collection => "Collection",
            Page::Clutches => "Clutches",
            Page::Pairings => "Pairings",
        }
    }
}

/// One table line on the collection page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CollectionRow<'a> {
    Heading(AnimalStatus, usize),
    Animal(&'a Animal),
}

pub struct App {
    pub animals: Vec<Animal>,
    pub weights: HashMap<String, Vec<WeightRecord>>,
    pub clutches: Vec<Clutch>,
    pub pairings: Vec<Pairing>,
    pub visibility: StatusVisibility,
    pub today: NaiveDate,
    pub current_page: Page,
    pub collection_state: TableState,
    pub clutch_state: TableState,
    pub pairing_state: TableState,
    pub show_detail: bool,
}

impl App {
    pub fn new(
        animals: Vec<Animal>,
        weights: HashMap<String, Vec<WeightRecord>>,
        clutches: Vec<Clutch>,
        pairings: Vec<Pairing>,
        visibility: StatusVisibility,
        today: NaiveDate,
    ) -> Self {
        let mut app = Self {
            animals,
            weights,
            clutches,
            pairings,
            visibility,
            today,
            current_page: Page::Collection,
            collection_state: TableState::default(),
            clutch_state: TableState::default(),
            pairing_state: TableState::default(),
            show_detail: false,
        };
        app.collection_state.select(first(app.collection_rows().len()));
        app.clutch_state.select(first(app.clutches.len()));
        app.pairing_state.select(first(app.pairings.len()));
        app
    }

    /// Visible status buckets, each heading followed by its animals.
    pub fn collection_rows(&self) -> Vec<CollectionRow<'_>> {
        let groups = group_animals_by_status(&self.animals);
        let mut rows = Vec::new();
        for group in groups.visible(&self.visibility) {
            rows.push(CollectionRow::Heading(group.status, group.animals.len()));
            rows.extend(group.animals.iter().copied().map(CollectionRow::Animal));
        }
        rows
    }

    /// Active clutches first, then hatched ones.
    pub fn clutch_rows(&self) -> Vec<&Clutch> {
        let groups = partition_clutches(&self.clutches);
        groups.active.into_iter().chain(groups.completed).collect()
    }

    /// Pairings in lifecycle order.
    pub fn pairing_rows(&self) -> Vec<&Pairing> {
        let groups = group_pairings(&self.pairings);
        PairingStatus::ALL
            .into_iter()
            .flat_map(|status| groups.get(status).to_vec())
            .collect()
    }

    fn row_count(&self) -> usize {
        match self.current_page {
            Page::Collection => self.collection_rows().len(),
            Page::Clutches => self.clutches.len(),
            Page::Pairings => self.pairings.len(),
        }
    }

    fn current_state(&mut self) -> &mut TableState {
        match self.current_page {
            Page::Collection => &mut self.collection_state,
            Page::Clutches => &mut self.clutch_state,
            Page::Pairings => &mut self.pairing_state,
        }
    }

    pub fn selected_animal(&self) -> Option<&Animal> {
        let i = self.collection_state.selected()?;
        let rows = self.collection_rows();
        match rows.get(i) {
            Some(CollectionRow::Animal(animal)) => Some(*animal),
            _ => None,
        }
    }

    pub fn toggle_detail(&mut self) {
        self.show_detail = !self.show_detail;
    }

    pub fn next_page(&mut self) {
        self.current_page = self.current_page.next();
    }

    pub fn previous_page(&mut self) {
        self.current_page = self.current_page.previous();
    }

    /// Show or hide one status bucket on the collection page.
    pub fn toggle_status(&mut self, status: AnimalStatus) {
        self.visibility.toggle(status);
        let len = self.collection_rows().len();
        self.collection_state.select(first(len));
    }

    pub fn next(&mut self) {
        let len = self.row_count();
        if len == 0 {
            return;
        }
        let state = self.current_state();
        let i = match state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.row_count();
        if len == 0 {
            return;
        }
        let state = self.current_state();
        let i = match state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        state.select(Some(i));
    }
}

fn first(len: usize) -> Option<usize> {
    if len == 0 {
        None
    } else {
        Some(0)
    }
}

pub fn urgency_color(urgency: Urgency) -> Color {
    match urgency {
        Urgency::Complete => Color::DarkGray,
        Urgency::Green => Color::Green,
        Urgency::Yellow => Color::Yellow,
        Urgency::Red => Color::Red,
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res?;
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Enter => app.toggle_detail(),
                KeyCode::Tab => app.next_page(),
                KeyCode::BackTab => app.previous_page(),
                KeyCode::Char(c @ '1'..='7') if app.current_page == Page::Collection => {
                    let index = c as usize - '1' as usize;
                    app.toggle_status(AnimalStatus::ALL[index]);
                }
                KeyCode::Down | KeyCode::Char('j') => app.next(),
                KeyCode::Up | KeyCode::Char('k') => app.previous(),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return Ok(()),
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

    if app.show_detail && app.current_page == Page::Collection {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);

        render_collection(f, content_chunks[0], app);
        render_weight_panel(f, content_chunks[1], app);
    } else {
        match app.current_page {
            Page::Collection => render_collection(f, chunks[1], app),
            Page::Clutches => render_clutches(f, chunks[1], app),
            Page::Pairings => render_pairings(f, chunks[1], app),
        }
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut tab_spans = vec![];
    for (i, page) in [Page::Collection, Page::Clutches, Page::Pairings].iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }

        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };

        tab_spans.push(Span::styled(page.title().to_string(), style));
    }

    let incubating = app.clutches.iter().filter(|c| c.is_active()).count();
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Animals: {}", app.animals.len()),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Incubating: {incubating}"),
        Style::default().fg(Color::Green),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Today: {}", app.today),
        Style::default().fg(Color::Cyan),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn header_row(titles: &[&'static str]) -> Row<'static> {
    let cells = titles.iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });
    Row::new(cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1)
}

fn bordered(title: String) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(title)
}

fn highlight() -> Style {
    Style::default()
        .bg(Color::DarkGray)
        .add_modifier(Modifier::BOLD)
}

fn render_collection(f: &mut Frame, area: Rect, app: &mut App) {
    let rows: Vec<Row> = app
        .collection_rows()
        .into_iter()
        .map(|row| match row {
            CollectionRow::Heading(status, count) => Row::new(vec![Cell::from(format!(
                "{} ({count})",
                status.heading()
            ))])
            .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
            CollectionRow::Animal(animal) => Row::new(vec![
                Cell::from(format!("  {}", display_id(animal))),
                Cell::from(animal.name.clone().unwrap_or_default()),
                Cell::from(animal.sex.symbol()),
                Cell::from(truncate(animal.morph.as_deref().unwrap_or(""), 34)),
                Cell::from(
                    animal
                        .weight_grams
                        .map(|g| format!("{g}g"))
                        .unwrap_or_else(|| "-".to_string()),
                ),
            ]),
        })
        .collect();

    let hidden = app.visibility.hidden().count();
    let title = if hidden > 0 {
        format!(" Collection ({hidden} hidden) ")
    } else {
        " Collection ".to_string()
    };

    let table = Table::new(
        rows,
        [
            Constraint::Length(20),
            Constraint::Length(16),
            Constraint::Length(3),
            Constraint::Length(36),
            Constraint::Length(9),
        ],
    )
    .header(header_row(&["ID", "Name", "Sex", "Morph", "Weight"]))
    .block(bordered(title))
    .highlight_style(highlight())
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.collection_state);
}

fn render_weight_panel(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Weight History ");

    let Some(animal) = app.selected_animal() else {
        f.render_widget(Paragraph::new("No animal selected").block(block), area);
        return;
    };

    let records = app.weights.get(&animal.id).map(Vec::as_slice).unwrap_or(&[]);
    let mut content = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("  {}", display_id(animal)),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
    ];

    if records.is_empty() {
        content.push(Line::from(Span::styled(
            "  No weights logged",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }
    for entry in weight_history(records) {
        let mut spans = vec![
            Span::raw(format!("  {}  ", entry.record.recorded_at)),
            Span::styled(
                format!("{}g", entry.record.weight_grams),
                Style::default().fg(Color::White),
            ),
        ];
        if let Some(change) = entry.change {
            let color = if change < 0 { Color::Red } else { Color::Green };
            spans.push(Span::raw("  "));
            spans.push(Span::styled(format_change(change), Style::default().fg(color)));
        }
        content.push(Line::from(spans));
    }

    f.render_widget(Paragraph::new(content).block(block), area);
}

fn render_clutches(f: &mut Frame, area: Rect, app: &mut App) {
    let today = app.today;
    let rows: Vec<Row> = app
        .clutch_rows()
        .into_iter()
        .map(|clutch| {
            let countdown = clutch.countdown(today);
            let color = urgency_color(countdown.urgency);
            Row::new(vec![
                Cell::from(clutch.clutch_number.clone()),
                Cell::from(date_cell(clutch.lay_date)),
                Cell::from(date_cell(clutch.expected_hatch_date)),
                Cell::from(countdown.text).style(Style::default().fg(color)),
                Cell::from(format!("{} {}", clutch.egg_count, egg_detail(clutch))),
                Cell::from(if clutch.is_hatched() {
                    clutch.hatch_count.to_string()
                } else {
                    "-".to_string()
                }),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(20),
            Constraint::Length(34),
            Constraint::Length(8),
        ],
    )
    .header(header_row(&["Clutch", "Laid", "Expected", "Countdown", "Eggs", "Hatched"]))
    .block(bordered(" Clutches ".to_string()))
    .highlight_style(highlight())
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.clutch_state);
}

fn render_pairings(f: &mut Frame, area: Rect, app: &mut App) {
    let today = app.today;
    let find = |id: &str| app.animals.iter().find(|a| a.id == id);

    let rows: Vec<Row> = app
        .pairing_rows()
        .into_iter()
        .map(|pairing| {
            let female = find(&pairing.female_id)
                .map(female_label)
                .unwrap_or_else(|| "Unknown".to_string());
            let males = pairing
                .males
                .iter()
                .map(|m| {
                    let name = find(&m.male_id)
                        .map(male_label)
                        .unwrap_or_else(|| "Unknown".to_string());
                    format!("{name} ({})", lock_summary(m.lock_count))
                })
                .collect::<Vec<_>>()
                .join(", ");
            let follicle = latest_check(&pairing.follicle_checks)
                .and_then(|c| c.follicle_size_mm)
                .map(|mm| format!("{mm}mm"))
                .unwrap_or_else(|| "-".to_string());
            let reminder = next_check_reminder(pairing_next_check_due(&pairing.follicle_checks), today);
            let reminder_color = if reminder.urgent { Color::Red } else { Color::White };

            Row::new(vec![
                Cell::from(pairing.status.as_str()),
                Cell::from(truncate(&female, 24)),
                Cell::from(truncate(&males, 36)),
                Cell::from(follicle),
                Cell::from(reminder.text).style(Style::default().fg(reminder_color)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(10),
            Constraint::Length(26),
            Constraint::Length(38),
            Constraint::Length(9),
            Constraint::Length(16),
        ],
    )
    .header(header_row(&["Status", "Female", "Males", "Follicle", "Next Check"]))
    .block(bordered(" Pairings ".to_string()))
    .highlight_style(highlight())
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.pairing_state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let mut status_spans = vec![
        Span::styled("Tab", Style::default().fg(Color::Yellow)),
        Span::raw(" Page | "),
        Span::styled("↑/↓ j/k", Style::default().fg(Color::Yellow)),
        Span::raw(" Nav | "),
    ];

    if app.current_page == Page::Collection {
        status_spans.push(Span::styled("Enter", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" Weights | "));
        status_spans.push(Span::styled("1-7", Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(" Hide/Show status | "));
    }

    status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
    status_spans.push(Span::raw(" Quit"));

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn date_cell(date: Option<NaiveDate>) -> String {
    date.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn animal(number: i64, status: Option<AnimalStatus>) -> Animal {
        let mut a = Animal::new(number);
        a.status = status;
        a
    }

    fn app() -> App {
        let animals = vec![
            animal(1, Some(AnimalStatus::FemaleBreeder)),
            animal(2, Some(AnimalStatus::FemaleBreeder)),
            animal(3, None),
        ];
        let mut hatched = Clutch::new("C1", Some(date(2025, 1, 1)));
        hatched.actual_hatch_date = Some(date(2025, 2, 27));
        let clutches = vec![hatched, Clutch::new("C2", Some(date(2025, 4, 14)))];
        App::new(
            animals,
            HashMap::new(),
            clutches,
            Vec::new(),
            StatusVisibility::all_visible(),
            date(2025, 6, 1),
        )
    }

    #[test]
    fn test_collection_rows_have_headings() {
        let app = app();
        let rows = app.collection_rows();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0], CollectionRow::Heading(AnimalStatus::FemaleBreeder, 2));
        assert_eq!(rows[3], CollectionRow::Heading(AnimalStatus::OnHold, 1));
    }

    #[test]
    fn test_toggle_status_hides_bucket() {
        let mut app = app();
        app.toggle_status(AnimalStatus::OnHold);
        assert_eq!(app.collection_rows().len(), 3);
        assert!(!app.visibility.is_visible(AnimalStatus::OnHold));
    }

    #[test]
    fn test_active_clutches_listed_first() {
        let app = app();
        let numbers: Vec<&str> = app.clutch_rows().iter().map(|c| c.clutch_number.as_str()).collect();
        assert_eq!(numbers, vec!["C2", "C1"]);
    }

    #[test]
    fn test_navigation_wraps() {
        let mut app = app();
        app.previous();
        assert_eq!(app.collection_state.selected(), Some(4));
        app.next();
        assert_eq!(app.collection_state.selected(), Some(0));

        app.next_page();
        assert_eq!(app.current_page, Page::Clutches);
        app.next();
        app.next();
        assert_eq!(app.clutch_state.selected(), Some(0));
    }

    #[test]
    fn test_selected_animal_skips_headings() {
        let mut app = app();
        assert!(app.selected_animal().is_none());
        app.next();
        assert_eq!(app.selected_animal().map(|a| a.animal_number), Some(1));
    }

    #[test]
    fn test_urgency_colors() {
        assert_eq!(urgency_color(Urgency::Red), Color::Red);
        assert_eq!(urgency_color(Urgency::Complete), Color::DarkGray);
    }
}
