mod input;

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use input::TextInputState;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs, Wrap},
    Frame, Terminal,
};
use roll_core::config::ConfigError;
use roll_core::identification::{
    display_line, format_attack_speed, formatted_id_number, identification_info, polarity,
    roll_percentage_string,
};
use roll_core::item::analyze;
use roll_core::ranking::rank;
use roll_core::simulator::{Requirement, RollRequirements, SimulatorConfig, MAX_AMP_TIER};
use roll_core::storage::RolledItemCollection;
use roll_core::{Comparison, Item, ItemDatabase, Polarity, Rarity, RollSimulator, RollTier};
use std::io;
use std::path::{Path, PathBuf};

/// Rerolls per worker before auto-roll gives up
const MAX_AUTO_ROLLS: u64 = 100_000;

fn main() -> Result<(), io::Error> {
    init_logging();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Load config and create app
    let config_path = Path::new("config");
    let rolls_path = PathBuf::from("rolls.json");
    let mut app = match ItemDatabase::load_from_dir(config_path) {
        Ok(db) => App::new(db, rolls_path),
        Err(e) => {
            log::error!("failed to load {}: {}", config_path.display(), e);
            App::with_config_error(e)
        }
    };

    // Run app
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("Error: {err:?}");
    }

    Ok(())
}

/// Log to a file; stderr is hidden behind the alternate screen
fn init_logging() {
    let Ok(file) = std::fs::File::create("roll_tui.log") else {
        return;
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
}

#[derive(PartialEq, Eq, Clone, Copy)]
enum Focus {
    Items,
    Identifications,
}

#[derive(PartialEq, Eq, Clone, Copy)]
enum DetailTab {
    Simulator,
    Analysis,
    Info,
}

/// What the requirement popup edits
#[derive(Clone, PartialEq, Eq)]
enum EditTarget {
    Overall,
    Stat(String),
}

struct RequirementEdit {
    target: EditTarget,
    input: TextInputState,
}

struct App {
    db: Option<ItemDatabase>,
    item_names: Vec<String>,
    item_state: ListState,
    /// Highlighted identification in the simulator view
    id_index: usize,
    focus: Focus,
    detail_tab: DetailTab,
    simulator: Option<RollSimulator>,
    requirements: RollRequirements,
    collection: RolledItemCollection,
    rolls_path: PathBuf,
    editing: Option<RequirementEdit>,
    message: Option<String>,
    /// Config error if loading failed
    config_error: Option<ConfigError>,
}

impl App {
    fn new(db: ItemDatabase, rolls_path: PathBuf) -> Self {
        let item_names: Vec<String> = db.item_names().into_iter().cloned().collect();

        let mut message = None;
        let collection = match RolledItemCollection::load_or_default(&rolls_path) {
            Ok(collection) => collection,
            Err(e) => {
                log::warn!("{}", e);
                message = Some(e.to_string());
                RolledItemCollection::new()
            }
        };

        let mut item_state = ListState::default();
        if !item_names.is_empty() {
            item_state.select(Some(0));
        }

        let mut app = App {
            db: Some(db),
            item_names,
            item_state,
            id_index: 0,
            focus: Focus::Items,
            detail_tab: DetailTab::Simulator,
            simulator: None,
            requirements: RollRequirements::default(),
            collection,
            rolls_path,
            editing: None,
            message,
            config_error: None,
        };
        app.reset_simulator();
        app
    }

    fn with_config_error(error: ConfigError) -> Self {
        App {
            db: None,
            item_names: Vec::new(),
            item_state: ListState::default(),
            id_index: 0,
            focus: Focus::Items,
            detail_tab: DetailTab::Simulator,
            simulator: None,
            requirements: RollRequirements::default(),
            collection: RolledItemCollection::new(),
            rolls_path: PathBuf::new(),
            editing: None,
            message: None,
            config_error: Some(error),
        }
    }

    fn selected_item(&self) -> Option<&Item> {
        let db = self.db.as_ref()?;
        let name = self.item_names.get(self.item_state.selected()?)?;
        db.get(name)
    }

    /// Key of the highlighted rolled identification
    fn highlighted_key(&self) -> Option<String> {
        let sim = self.simulator.as_ref()?;
        sim.current()
            .identifications
            .get(self.id_index)
            .map(|(key, _)| key.clone())
    }

    /// Start a fresh simulation for the selected item
    fn reset_simulator(&mut self) {
        self.id_index = 0;
        self.requirements = RollRequirements::default();
        self.simulator = self.selected_item().and_then(|item| {
            match RollSimulator::new(item, SimulatorConfig::default(), rand::random()) {
                Ok(sim) => Some(sim),
                Err(e) => {
                    log::warn!("{}: {}", item.name, e);
                    None
                }
            }
        });
    }

    fn select_item(&mut self, index: usize) {
        if self.item_state.selected() != Some(index) {
            self.item_state.select(Some(index));
            self.reset_simulator();
        }
    }

    fn reroll(&mut self) {
        if let Some(ref mut sim) = self.simulator {
            sim.roll();
        }
    }

    fn auto_roll(&mut self) {
        if self.requirements.is_empty() {
            self.message = Some("Set a requirement first (e / E)".to_string());
            return;
        }
        let Some(ref mut sim) = self.simulator else {
            return;
        };

        let workers = std::thread::available_parallelism().map_or(1, |n| n.get());
        let outcome = sim.auto_roll_parallel(&self.requirements, workers, MAX_AUTO_ROLLS);
        self.message = Some(if outcome.is_met() {
            format!("Requirements met after {} rolls", outcome.attempts())
        } else {
            format!("Gave up after {} rolls", outcome.attempts())
        });
    }

    /// Apply a change to the simulator settings
    fn update_config(&mut self, change: impl FnOnce(&mut SimulatorConfig)) {
        let Some(item) = self.selected_item().cloned() else {
            return;
        };
        let Some(ref mut sim) = self.simulator else {
            return;
        };

        let mut config = sim.config().clone();
        change(&mut config);
        if let Err(e) = sim.set_config(&item, config) {
            self.message = Some(e.to_string());
        }
    }

    fn change_amp(&mut self, delta: i8) {
        self.update_config(|config| {
            config.amp_tier = config
                .amp_tier
                .saturating_add_signed(delta)
                .min(MAX_AMP_TIER);
        });
    }

    fn cycle_augment(&mut self) {
        let highlighted = self.highlighted_key();
        self.update_config(|config| {
            config.augment = config.augment.next();
            if config.locked.is_none() {
                config.locked = highlighted;
            }
        });
    }

    fn toggle_lock(&mut self) {
        let Some(key) = self.highlighted_key() else {
            return;
        };
        self.update_config(|config| {
            config.locked = if config.locked.as_deref() == Some(key.as_str()) {
                None
            } else {
                Some(key)
            };
        });
    }

    /// Flip the highlighted id's requirement, or the overall one
    fn toggle_comparison(&mut self) {
        let key = self.highlighted_key();
        if self.requirements.toggle_direction(key.as_deref()).is_none() {
            self.message = Some("No requirement to flip".to_string());
        }
    }

    fn open_edit(&mut self, target: EditTarget) {
        let current = match target {
            EditTarget::Overall => self.requirements.overall,
            EditTarget::Stat(ref key) => self.requirements.per_stat.get(key).copied(),
        };
        let value = current.map(|r| r.value.to_string()).unwrap_or_default();
        self.editing = Some(RequirementEdit {
            target,
            input: TextInputState::new(value),
        });
    }

    fn commit_edit(&mut self) {
        let Some(edit) = self.editing.take() else {
            return;
        };

        let value = match edit.input.percentage() {
            Ok(value) => value,
            Err(e) => {
                self.message = Some(e);
                self.editing = Some(edit);
                return;
            }
        };

        match edit.target {
            EditTarget::Overall => {
                let comparison = self
                    .requirements
                    .overall
                    .map_or(Comparison::AtLeast, |r| r.comparison);
                self.requirements.overall = value.map(|value| Requirement { value, comparison });
            }
            EditTarget::Stat(key) => match value {
                Some(value) => {
                    let comparison = self
                        .requirements
                        .per_stat
                        .get(&key)
                        .map_or(Comparison::AtLeast, |r| r.comparison);
                    self.requirements
                        .per_stat
                        .insert(key, Requirement { value, comparison });
                }
                None => {
                    self.requirements.per_stat.remove(&key);
                }
            },
        }
    }

    fn save_current(&mut self) {
        let Some(ref sim) = self.simulator else {
            return;
        };

        self.collection.add(sim.to_rolled_item());
        self.message = Some(match self.collection.save_to_file(&self.rolls_path) {
            Ok(()) => format!("Saved roll to {}", self.rolls_path.display()),
            Err(e) => e.to_string(),
        });
    }
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            // Only handle key press events, not release or repeat
            if key.kind != KeyEventKind::Press {
                continue;
            }

            // Clear message on any keypress
            app.message = None;

            if app.config_error.is_some() {
                if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
                    return Ok(());
                }
                continue;
            }

            if app.editing.is_some() {
                handle_edit_keys(app, key.code);
                continue;
            }

            // Global keys
            match key.code {
                KeyCode::Char('q') => return Ok(()),
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    return Ok(())
                }
                KeyCode::Tab => {
                    app.detail_tab = match app.detail_tab {
                        DetailTab::Simulator => DetailTab::Analysis,
                        DetailTab::Analysis => DetailTab::Info,
                        DetailTab::Info => DetailTab::Simulator,
                    };
                    continue;
                }
                KeyCode::Left | KeyCode::Char('h') => {
                    app.focus = Focus::Items;
                    continue;
                }
                KeyCode::Right | KeyCode::Char('l') => {
                    if app.simulator.is_some() {
                        app.focus = Focus::Identifications;
                    }
                    continue;
                }
                KeyCode::Char('r') => app.reroll(),
                KeyCode::Char('a') => app.auto_roll(),
                KeyCode::Char('+') | KeyCode::Char('=') => app.change_amp(1),
                KeyCode::Char('-') => app.change_amp(-1),
                KeyCode::Char('g') => app.cycle_augment(),
                KeyCode::Char('L') => app.toggle_lock(),
                KeyCode::Char('c') => app.toggle_comparison(),
                KeyCode::Char('e') => app.open_edit(EditTarget::Overall),
                KeyCode::Char('E') => {
                    if let Some(key) = app.highlighted_key() {
                        app.open_edit(EditTarget::Stat(key));
                    }
                }
                KeyCode::Char('s') => app.save_current(),
                _ => {}
            }

            // Handle based on current focus
            match app.focus {
                Focus::Items => handle_item_keys(app, key.code),
                Focus::Identifications => handle_identification_keys(app, key.code),
            }
        }
    }
}

fn handle_item_keys(app: &mut App, code: KeyCode) {
    match code {
        KeyCode::Up | KeyCode::Char('k') => {
            if let Some(selected) = app.item_state.selected() {
                if selected > 0 {
                    app.select_item(selected - 1);
                }
            }
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if let Some(selected) = app.item_state.selected() {
                if selected < app.item_names.len().saturating_sub(1) {
                    app.select_item(selected + 1);
                }
            } else if !app.item_names.is_empty() {
                app.select_item(0);
            }
        }
        _ => {}
    }
}

fn handle_identification_keys(app: &mut App, code: KeyCode) {
    let count = app
        .simulator
        .as_ref()
        .map_or(0, |sim| sim.current().identifications.len());

    match code {
        KeyCode::Up | KeyCode::Char('k') => {
            app.id_index = app.id_index.saturating_sub(1);
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if app.id_index + 1 < count {
                app.id_index += 1;
            }
        }
        _ => {}
    }
}

fn handle_edit_keys(app: &mut App, code: KeyCode) {
    let Some(ref mut edit) = app.editing else {
        return;
    };

    match code {
        KeyCode::Esc => app.editing = None,
        KeyCode::Enter => app.commit_edit(),
        KeyCode::Backspace => edit.input.backspace(),
        KeyCode::Delete => edit.input.delete(),
        KeyCode::Left => edit.input.move_left(),
        KeyCode::Right => edit.input.move_right(),
        KeyCode::Home => edit.input.move_home(),
        KeyCode::End => edit.input.move_end(),
        KeyCode::Char(c) => edit.input.insert(c),
        _ => {}
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    // If there's a config error, show it instead of the normal UI
    if let Some(ref error) = app.config_error {
        render_config_error(f, error);
        return;
    }

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(f.area());

    let main_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(chunks[0]);

    render_items(f, app, main_chunks[0]);
    render_detail(f, app, main_chunks[1]);
    render_help(f, app, chunks[1]);

    if app.editing.is_some() {
        render_edit_popup(f, app);
    }
}

fn render_config_error(f: &mut Frame, error: &ConfigError) {
    let area = centered_rect(80, 60, f.area());
    let heading = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
    let dim = Style::default().fg(Color::DarkGray);

    let (title, hint) = match error {
        ConfigError::Io { .. } => (
            "Could not read the item database",
            "Run from the directory that contains config/items and config/weights.",
        ),
        ConfigError::Parse { .. } => (
            "An item or weight file is not valid TOML",
            "Items are [[items]] tables; ranged identifications are { min, max, raw }.",
        ),
        ConfigError::DuplicateItem { .. } => (
            "Two items share a name",
            "Item names are the database key and must be unique across config/items.",
        ),
    };

    let mut lines = vec![
        Line::from(Span::styled(title, Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))),
        Line::from(""),
    ];

    if let ConfigError::DuplicateItem { ref name, .. } = error {
        lines.push(Line::from(vec![
            Span::styled("Item: ", heading),
            Span::styled(name.clone(), Style::default().fg(Color::Cyan)),
        ]));
    }

    lines.push(Line::from(Span::styled("Where:", heading)));
    lines.extend(
        error
            .location_description()
            .lines()
            .map(|line| Line::from(Span::styled(format!("  {}", line), Style::default().fg(Color::Cyan)))),
    );
    lines.push(Line::from(Span::styled("What:", heading)));
    lines.extend(error.error_message().lines().map(|line| Line::from(format!("  {}", line))));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(hint, dim)));
    lines.push(Line::from(vec![
        Span::styled("q", Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
        Span::styled(" quits.", dim),
    ]));

    let paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red))
                .title(" Item Database "),
        )
        .wrap(Wrap { trim: false });

    f.render_widget(ratatui::widgets::Clear, area);
    f.render_widget(paragraph, area);
}

fn rarity_color(rarity: Rarity) -> Color {
    match rarity {
        Rarity::Common => Color::White,
        Rarity::Set => Color::Green,
        Rarity::Unique => Color::Yellow,
        Rarity::Rare => Color::Magenta,
        Rarity::Legendary => Color::Cyan,
        Rarity::Fabled => Color::Red,
        Rarity::Mythic => Color::Rgb(170, 0, 170),
    }
}

fn tier_color(percentage: f64) -> Color {
    match RollTier::classify(percentage, false) {
        RollTier::Perfect => Color::Cyan,
        RollTier::High => Color::Green,
        RollTier::Mid => Color::Yellow,
        RollTier::Low => Color::Red,
    }
}

fn polarity_color(polarity: Polarity) -> Color {
    match polarity {
        Polarity::Beneficial => Color::Green,
        Polarity::Detrimental => Color::Red,
        Polarity::Neutral => Color::Gray,
    }
}

fn render_items(f: &mut Frame, app: &mut App, area: Rect) {
    let items: Vec<ListItem> = match app.db {
        Some(ref db) => app
            .item_names
            .iter()
            .filter_map(|name| db.get(name))
            .map(|item| {
                ListItem::new(Line::from(vec![
                    Span::styled(item.name.clone(), Style::default().fg(rarity_color(item.rarity))),
                    Span::raw(" "),
                    Span::styled(format!("(Lv. {})", item.level), Style::default().fg(Color::DarkGray)),
                ]))
            })
            .collect(),
        None => Vec::new(),
    };

    let border_style = if app.focus == Focus::Items {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(" Items "),
        )
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    f.render_stateful_widget(list, area, &mut app.item_state);
}

fn render_detail(f: &mut Frame, app: &App, area: Rect) {
    let tabs = Tabs::new(vec!["Simulator", "Analysis", "Info"])
        .select(match app.detail_tab {
            DetailTab::Simulator => 0,
            DetailTab::Analysis => 1,
            DetailTab::Info => 2,
        })
        .style(Style::default())
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let tab_block = Block::default()
        .borders(Borders::ALL)
        .title(" Item Detail ");
    f.render_widget(tabs.block(tab_block), chunks[0]);

    let content = match app.selected_item() {
        None => Text::from("No items in the database\n\nAdd .toml files under config/items"),
        Some(item) => match app.detail_tab {
            DetailTab::Simulator => render_simulator(app, item),
            DetailTab::Analysis => render_analysis(app, item),
            DetailTab::Info => render_info(item),
        },
    };

    let border_style = if app.focus == Focus::Identifications {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    let paragraph = Paragraph::new(content)
        .block(Block::default().borders(Borders::ALL).border_style(border_style))
        .wrap(Wrap { trim: false });

    f.render_widget(paragraph, chunks[1]);
}

fn requirement_text(req: Option<&Requirement>) -> String {
    match req {
        Some(req) => format!("{} {}%", req.comparison.symbol(), req.value),
        None => "-".to_string(),
    }
}

fn render_simulator(app: &App, item: &Item) -> Text<'static> {
    let Some(ref sim) = app.simulator else {
        return Text::from("This item has no rolling identifications");
    };
    let config = sim.config();
    let roll = sim.current();
    let label = Style::default().fg(Color::DarkGray);

    let mut lines: Vec<Line> = vec![
        Line::from(Span::styled(
            item.name.clone(),
            Style::default().fg(rarity_color(item.rarity)).add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("Amplifier: ", label),
            Span::raw(format!("{}/{}", config.amp_tier, MAX_AMP_TIER)),
            Span::styled("  Augment: ", label),
            Span::raw(config.augment.name()),
            Span::styled("  Locked: ", label),
            Span::raw(config.locked.clone().unwrap_or_else(|| "-".to_string())),
        ]),
        Line::from(vec![
            Span::styled("Rerolls: ", label),
            Span::raw(sim.reroll_count().to_string()),
            Span::styled("  Overall: ", label),
            Span::styled(
                roll_percentage_string(roll.overall),
                Style::default().fg(tier_color(roll.overall)).add_modifier(Modifier::BOLD),
            ),
            Span::styled("  Requirement: ", label),
            Span::raw(requirement_text(app.requirements.overall.as_ref())),
        ]),
        Line::from(""),
    ];

    for (index, (key, id)) in roll.identifications.iter().enumerate() {
        let (name, unit) = match identification_info(key) {
            Some(info) => (info.display_name.to_string(), info.unit),
            None => (key.clone(), ""),
        };
        let marker = if config.locked.as_deref() == Some(key.as_str()) { "[L] " } else { "    " };

        let mut spans = vec![
            Span::raw(marker),
            Span::styled(
                format!("{}{}{}", formatted_id_number(id.value), unit, id.stars.as_text()),
                Style::default().fg(polarity_color(polarity(id.value, key))),
            ),
            Span::raw(format!(" {} ", name)),
            Span::styled(
                format!("[{}]", roll_percentage_string(id.percentage)),
                Style::default().fg(tier_color(id.percentage)),
            ),
        ];
        if let Some(req) = app.requirements.per_stat.get(key) {
            spans.push(Span::styled(format!("  need {}", requirement_text(Some(req))), label));
        }

        let mut line = Line::from(spans);
        if app.focus == Focus::Identifications && index == app.id_index {
            line = line.style(Style::default().bg(Color::DarkGray));
        }
        lines.push(line);
    }

    let fixed: Vec<_> = item.fixed_identifications().collect();
    if !fixed.is_empty() {
        lines.push(Line::from(""));
        for (key, value) in fixed {
            let (name, unit) = identification_info(key).map_or((key, ""), |info| (info.display_name, info.unit));
            lines.push(Line::from(Span::styled(
                format!("    {}{} {}", formatted_id_number(value), unit, name),
                label,
            )));
        }
    }

    Text::from(lines)
}

fn render_analysis(app: &App, item: &Item) -> Text<'static> {
    let rolls: Vec<_> = app.collection.for_item(&item.name).collect();
    if rolls.is_empty() {
        return Text::from(format!(
            "No stored rolls for {}\n\nPress 's' on the Simulator tab to save one",
            item.name
        ));
    }

    let mut lines: Vec<Line> = Vec::new();
    let ranges = item.ranges();

    for (index, rolled) in rolls.iter().enumerate() {
        let analyzed = analyze(item, rolled);
        let mut header = vec![
            Span::styled(format!("Roll #{} ", index + 1), Style::default().add_modifier(Modifier::BOLD)),
            Span::styled(
                roll_percentage_string(analyzed.overall),
                Style::default().fg(tier_color(analyzed.overall)),
            ),
        ];
        if let Some(count) = rolled.reroll_count {
            header.push(Span::styled(format!("  ({} rerolls)", count), Style::default().fg(Color::DarkGray)));
        }
        lines.push(Line::from(header));

        for stat in &analyzed.stats {
            lines.push(Line::from(Span::styled(
                format!("  {}", display_line(stat)),
                Style::default().fg(tier_color(stat.percentage)),
            )));
        }
        lines.push(Line::from(""));
    }

    let mut push_ranking = |title: String, weight| {
        lines.push(Line::from(Span::styled(title, Style::default().fg(Color::Yellow))));
        for (place, entry) in rank(&ranges, rolls.iter().copied(), weight).iter().enumerate() {
            let number = rolls
                .iter()
                .position(|r| std::ptr::eq(*r, entry.rolled))
                .map_or(0, |i| i + 1);
            lines.push(Line::from(format!("  {}. Roll #{}  {:.4}", place + 1, number, entry.score)));
        }
    };

    push_ranking("Ranking (unweighted)".to_string(), None);
    for weight in app.db.as_ref().map_or(&[][..], |db| db.weights_for(&item.name)) {
        push_ranking(format!("Ranking ({} by {})", weight.weight_name, weight.author), Some(weight));
    }

    Text::from(lines)
}

fn render_info(item: &Item) -> Text<'static> {
    let label = Style::default().fg(Color::DarkGray);
    let mut lines: Vec<Line> = vec![
        Line::from(Span::styled(
            item.name.clone(),
            Style::default().fg(rarity_color(item.rarity)).add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled("Rarity: ", label),
            Span::raw(item.rarity.name()),
            Span::styled("  Level: ", label),
            Span::raw(item.level.to_string()),
        ]),
    ];

    if item.internal_name() != item.name {
        lines.push(Line::from(vec![
            Span::styled("Internal name: ", label),
            Span::raw(item.internal_name().to_string()),
        ]));
    }
    if let Some(ref item_type) = item.item_type {
        lines.push(Line::from(vec![Span::styled("Type: ", label), Span::raw(item_type.clone())]));
    }
    if let Some(ref speed) = item.attack_speed {
        lines.push(Line::from(format_attack_speed(speed)));
    }
    lines.push(Line::from(vec![
        Span::styled("Identification cost: ", label),
        Span::raw(format!("{} emeralds", item.identification_cost())),
    ]));
    lines.push(Line::from(""));

    for (key, range) in item.ranged_identifications() {
        let (name, unit) = identification_info(key).map_or((key, ""), |info| (info.label(), info.unit));
        lines.push(Line::from(vec![
            Span::raw(format!("{} ", name)),
            Span::styled(
                format!("{}{} to {}{}", range.min, unit, range.max, unit),
                Style::default().fg(Color::Cyan),
            ),
            Span::styled(format!("  (base {})", range.raw), label),
        ]));
    }
    for (key, value) in item.fixed_identifications() {
        let (name, unit) = identification_info(key).map_or((key, ""), |info| (info.label(), info.unit));
        lines.push(Line::from(format!("{} {}{}", name, formatted_id_number(value), unit)));
    }

    Text::from(lines)
}

fn render_help(f: &mut Frame, app: &App, area: Rect) {
    let help_text = if let Some(ref msg) = app.message {
        Span::styled(msg.clone(), Style::default().fg(Color::Yellow))
    } else if app.editing.is_some() {
        Span::raw("Enter: Apply (empty clears) | Esc: Cancel")
    } else {
        Span::raw("r: Reroll | a: Auto | +/-: Amp | g: Augment | L: Lock | e/E: Requirement | c: >=/<= | s: Save | Tab: Detail | q: Quit")
    };

    let help = Paragraph::new(Line::from(help_text))
        .block(Block::default().borders(Borders::ALL).title(" Help "));

    f.render_widget(help, area);
}

fn render_edit_popup(f: &mut Frame, app: &App) {
    let Some(ref edit) = app.editing else {
        return;
    };
    let area = centered_rect(50, 20, f.area());
    f.render_widget(ratatui::widgets::Clear, area);

    let title = match edit.target {
        EditTarget::Overall => " Overall requirement (%) ".to_string(),
        EditTarget::Stat(ref key) => format!(" {} requirement (%) ", key),
    };

    let body = if edit.input.value().is_empty() {
        Line::from(vec![
            Span::raw(edit.input.display_with_cursor()),
            Span::styled(" empty clears the requirement", Style::default().fg(Color::DarkGray)),
        ])
    } else {
        Line::from(edit.input.display_with_cursor())
    };

    let paragraph = Paragraph::new(body).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(title),
    );
    f.render_widget(paragraph, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::backend::TestBackend;

    const ITEMS: &str = r#"
[[items]]
name = "Breezer"
rarity = "legendary"
level = 95

[items.identifications]
rawAirDamage = { min = 45, max = 195, raw = 150 }
walkSpeed = { min = 6, max = 26, raw = 20 }
"#;

    fn app() -> App {
        let db = ItemDatabase::load_from_str(ITEMS, Path::new("items.toml")).unwrap();
        App::new(db, PathBuf::from("missing-dir/rolls.json"))
    }

    fn screen_text(error: &ConfigError) -> String {
        let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
        terminal.draw(|f| render_config_error(f, error)).unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[test]
    fn test_duplicate_item_screen_names_item() {
        let doubled = format!("{}\n[[items]]\nname = \"Breezer\"\n", ITEMS);
        let err = ItemDatabase::load_from_str(&doubled, Path::new("weapons.toml")).unwrap_err();
        let text = screen_text(&err);
        assert!(text.contains("Two items share a name"));
        assert!(text.contains("Breezer"));
        assert!(text.contains("weapons.toml"));
    }

    #[test]
    fn test_parse_error_screen_has_message() {
        let err = ItemDatabase::load_from_str("[[items]]\nname = ", Path::new("broken.toml")).unwrap_err();
        let text = screen_text(&err);
        assert!(text.contains("not valid TOML"));
        let message = err.error_message();
        let first_line = message.lines().next().unwrap().trim();
        assert!(!first_line.is_empty());
        assert!(text.contains(first_line));
    }

    #[test]
    fn test_comparison_toggle_targets_highlighted_stat() {
        let mut app = app();
        let key = app.highlighted_key().unwrap();
        app.requirements.overall = Some(Requirement::at_least(40.0));
        app.requirements.per_stat.insert(key.clone(), Requirement::at_least(50.0));

        app.toggle_comparison();
        assert_eq!(app.requirements.per_stat[&key].comparison, Comparison::AtMost);
        assert_eq!(app.requirements.overall.unwrap().comparison, Comparison::AtLeast);

        // Editing the value keeps the chosen direction
        app.open_edit(EditTarget::Stat(key.clone()));
        if let Some(ref mut edit) = app.editing {
            edit.input = TextInputState::new("75".to_string());
        }
        app.commit_edit();
        assert_eq!(
            app.requirements.per_stat[&key],
            Requirement {
                value: 75.0,
                comparison: Comparison::AtMost
            }
        );
    }

    #[test]
    fn test_comparison_toggle_falls_back_to_overall() {
        let mut app = app();
        app.requirements.overall = Some(Requirement::at_least(40.0));
        app.toggle_comparison();
        assert_eq!(app.requirements.overall.unwrap().comparison, Comparison::AtMost);
        assert!(app.message.is_none());

        app.requirements.overall = None;
        app.toggle_comparison();
        assert!(app.message.is_some());
    }
}
