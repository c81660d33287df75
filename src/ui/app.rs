use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Terminal, Frame,
};
use std::io;

use crate::models::{Config, LookbackWindow};
use crate::ui::chart::render_series_chart;
use crate::ui::query::SeriesLoader;
use crate::ui::Page;

pub struct DashboardApp {
    loader: SeriesLoader,
    page: Page,
    window: LookbackWindow,
    warning: Option<String>,
    demo_dark_mode: bool,
    should_quit: bool,
}

impl DashboardApp {
    pub fn new(config: &Config) -> Result<Self> {
        let loader = SeriesLoader::new(&config.database_path)?;

        Ok(Self {
            loader,
            page: Page::Overview,
            window: LookbackWindow::OneYear,
            warning: None,
            demo_dark_mode: false,
            should_quit: false,
        })
    }

    pub fn draw(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Tab bar
                Constraint::Min(0),    // Content
                Constraint::Length(3), // Status bar
            ])
            .split(f.area());

        self.render_tab_bar(f, chunks[0]);

        match self.page {
            Page::Overview => self.render_chart_page(f, chunks[1], "日経平均株価"),
            Page::SectorIndices => self.render_chart_page(f, chunks[1], "17業種別指数"),
            Page::Settings => self.render_settings(f, chunks[1]),
        }

        self.render_status_bar(f, chunks[2]);
    }

    fn render_tab_bar(&self, f: &mut Frame, area: Rect) {
        let titles: Vec<&str> = Page::ALL.iter().map(|page| page.title()).collect();
        let selected = Page::ALL.iter().position(|page| *page == self.page).unwrap_or(0);

        let tabs = ratatui::widgets::Tabs::new(titles)
            .block(Block::default().borders(Borders::ALL).title("株式ナビ - Market Dashboard"))
            .style(Style::default().fg(Color::White))
            .highlight_style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
            .select(selected);

        f.render_widget(tabs, area);
    }

    fn render_chart_page(&mut self, f: &mut Frame, area: Rect, title: &str) {
        match self.loader.load(self.page, self.window) {
            Ok(frame) if frame.is_empty() => {
                let paragraph = Paragraph::new(vec![
                    Line::from(""),
                    Line::from("No data for this window yet."),
                    Line::from("Run the batch updates first:"),
                    Line::from(""),
                    Line::from("  cargo run --bin kabu-plus -- update"),
                    Line::from("  cargo run --bin yahoo -- update"),
                ])
                .block(Block::default().borders(Borders::ALL).title(title.to_string()))
                .style(Style::default().fg(Color::Yellow));
                f.render_widget(paragraph, area);
            }
            Ok(frame) => {
                let chart_title = format!("{} ({})", title, self.window.label());
                render_series_chart(f, area, &chart_title, &frame);
            }
            Err(e) => {
                // Query problems must not take the dashboard down
                self.warning = Some(e.to_string());
                let paragraph = Paragraph::new(vec![
                    Line::from(""),
                    Line::from(format!("⚠️ Could not load data: {}", e)),
                ])
                .block(Block::default().borders(Borders::ALL).title(title.to_string()))
                .style(Style::default().fg(Color::Yellow));
                f.render_widget(paragraph, area);
            }
        }
    }

    fn render_settings(&self, f: &mut Frame, area: Rect) {
        let dark_mode = if self.demo_dark_mode { "ON" } else { "OFF" };
        let paragraph = Paragraph::new(vec![
            Line::from("⚙️ Settings"),
            Line::from(""),
            Line::from(format!("• Dark mode (demo): {}", dark_mode)),
            Line::from("  Press d to toggle"),
            Line::from(""),
            Line::from("Configuration files:"),
            Line::from("• .env - feed credentials and paths"),
            Line::from("• stocks.db - SQLite database"),
        ])
        .block(Block::default().borders(Borders::ALL).title("⚙️ Settings"))
        .style(Style::default().fg(Color::White));

        f.render_widget(paragraph, area);
    }

    fn render_status_bar(&self, f: &mut Frame, area: Rect) {
        let line = if let Some(warning) = &self.warning {
            Line::from(vec![Span::styled(
                format!("⚠️ {}", warning),
                Style::default().fg(Color::Yellow),
            )])
        } else {
            Line::from(vec![
                Span::styled("Press ", Style::default().fg(Color::Gray)),
                Span::styled("Tab", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
                Span::styled(" to switch pages • ", Style::default().fg(Color::Gray)),
                Span::styled("←/→", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
                Span::styled(
                    format!(" window ({}) • ", self.window.label()),
                    Style::default().fg(Color::Gray),
                ),
                Span::styled("R", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
                Span::styled(" to reload • ", Style::default().fg(Color::Gray)),
                Span::styled("Q", Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
                Span::styled(" to quit", Style::default().fg(Color::Gray)),
            ])
        };

        let paragraph = Paragraph::new(vec![line])
            .block(Block::default().borders(Borders::ALL))
            .style(Style::default().fg(Color::White));

        f.render_widget(paragraph, area);
    }

    pub fn handle_key_event(&mut self, key: KeyCode) -> Result<()> {
        match key {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
            }
            KeyCode::Tab => {
                self.next_page();
            }
            KeyCode::BackTab => {
                self.previous_page();
            }
            KeyCode::Left => {
                self.cycle_window(-1);
            }
            KeyCode::Right => {
                self.cycle_window(1);
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.loader.clear_cache();
                self.warning = None;
            }
            KeyCode::Char('d') | KeyCode::Char('D') => {
                if self.page == Page::Settings {
                    self.demo_dark_mode = !self.demo_dark_mode;
                }
            }
            KeyCode::Char('1') => {
                self.page = Page::Overview;
            }
            KeyCode::Char('2') => {
                self.page = Page::SectorIndices;
            }
            KeyCode::Char('3') => {
                self.page = Page::Settings;
            }
            _ => {}
        }
        Ok(())
    }

    fn next_page(&mut self) {
        let position = Page::ALL.iter().position(|page| *page == self.page).unwrap_or(0);
        self.page = Page::ALL[(position + 1) % Page::ALL.len()];
    }

    fn previous_page(&mut self) {
        let position = Page::ALL.iter().position(|page| *page == self.page).unwrap_or(0);
        self.page = Page::ALL[(position + Page::ALL.len() - 1) % Page::ALL.len()];
    }

    fn cycle_window(&mut self, step: i32) {
        let position = LookbackWindow::ALL
            .iter()
            .position(|window| *window == self.window)
            .unwrap_or(0) as i32;
        let count = LookbackWindow::ALL.len() as i32;
        self.window = LookbackWindow::ALL[(position + step).rem_euclid(count) as usize];
    }
}

/// Run the main dashboard application
pub fn run_app(config: &Config) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    io::stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;

    let mut app = DashboardApp::new(config)?;

    // Main application loop
    let result = loop {
        if let Err(e) = terminal.draw(|f| app.draw(f)) {
            break Err(e.into());
        }

        if let Ok(Event::Key(key)) = event::read() {
            if key.kind == KeyEventKind::Press {
                if let Err(e) = app.handle_key_event(key.code) {
                    break Err(e);
                }

                if app.should_quit {
                    break Ok(());
                }
            }
        }
    };

    // Cleanup terminal
    disable_raw_mode()?;
    io::stdout().execute(LeaveAlternateScreen)?;
    result
}
