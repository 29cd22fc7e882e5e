//! Ratatui-based chart viewer.
//!
//! Shows one chart at a time for a generated table. Count charts use Ratatui's
//! `BarChart`; histograms go through Plotters (`plotters_chart`).

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span, Text},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Clear, Paragraph},
    Terminal,
};

use crate::app::pipeline;
use crate::domain::{Category, CustomerTable, RunConfig};
use crate::error::AppError;
use crate::plot::{
    bill_histogram, churn_by_contract, churn_split, tenure_histogram, BoxSummary, ChartKind,
    ChurnHistogram, ChurnSplit, DEFAULT_BINS,
};
use crate::report::fmt4;

mod plotters_chart;

use plotters_chart::ChurnHistogramChart;

/// Customers added or removed per `+` / `-` press.
const COUNT_STEP: usize = 250;
const MIN_CUSTOMERS: usize = 50;

/// Start the TUI.
pub fn run(config: RunConfig) -> Result<(), AppError> {
    let mut app = App::new(config)?;

    let _guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// Chart data derived from one table.
struct Charts {
    split: ChurnSplit,
    by_contract: Vec<(&'static str, ChurnSplit)>,
    tenure: ChurnHistogram,
    bill: ChurnHistogram,
}

impl Charts {
    fn from_table(table: &CustomerTable) -> Self {
        Self {
            split: churn_split(table),
            by_contract: churn_by_contract(table)
                .into_iter()
                .map(|(c, s)| (c.label(), s))
                .collect(),
            tenure: tenure_histogram(table, DEFAULT_BINS),
            bill: bill_histogram(table, DEFAULT_BINS),
        }
    }
}

struct App {
    config: RunConfig,
    chart: ChartKind,
    charts: Charts,
    status: String,
}

impl App {
    fn new(config: RunConfig) -> Result<Self, AppError> {
        let run = pipeline::prepare(&config)?;
        Ok(Self {
            charts: Charts::from_table(&run.table),
            status: generated_status(&config, run.table.len()),
            config,
            chart: ChartKind::ChurnRate,
        })
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))? {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the viewer should exit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Left => self.chart = self.chart.prev(),
            KeyCode::Right => self.chart = self.chart.next(),
            KeyCode::Char('r') => {
                self.config.generator.seed = self.config.generator.seed.wrapping_add(1);
                self.regenerate();
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.config.generator.num_customers =
                    self.config.generator.num_customers.saturating_add(COUNT_STEP);
                self.regenerate();
            }
            KeyCode::Char('-') => {
                self.config.generator.num_customers = self
                    .config
                    .generator
                    .num_customers
                    .saturating_sub(COUNT_STEP)
                    .max(MIN_CUSTOMERS);
                self.regenerate();
            }
            _ => {}
        }
        false
    }

    /// Rebuild the charts; failures are shown in the status line and keep the old charts.
    fn regenerate(&mut self) {
        match pipeline::prepare(&self.config) {
            Ok(run) => {
                self.charts = Charts::from_table(&run.table);
                self.status = generated_status(&self.config, run.table.len());
            }
            Err(err) => {
                log::warn!("regeneration failed: {err}");
                self.status = format!("Generation failed: {err}");
            }
        }
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(3)])
            .split(frame.area());

        self.draw_header(frame, chunks[0]);
        self.draw_chart(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let position = ChartKind::ALL.iter().position(|&k| k == self.chart).unwrap_or(0) + 1;
        let lines = vec![
            Line::from(vec![
                Span::styled("churn", Style::default().fg(Color::Cyan)),
                Span::raw(format!(" | chart {position}/{}: {}", ChartKind::ALL.len(), self.chart.title())),
            ]),
            Line::from(Span::styled(
                format!(
                    "customers: {} | seed: {} | churn rate: {}%",
                    self.config.generator.num_customers,
                    self.config.generator.seed,
                    fmt4(100.0 * self.charts.split.churn_share()),
                ),
                Style::default().fg(Color::Gray),
            )),
        ];
        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title(self.chart.title()).borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        match self.chart {
            ChartKind::ChurnRate => frame.render_widget(churn_rate_bars(&self.charts.split), inner),
            ChartKind::ByContract => {
                frame.render_widget(contract_bars(&self.charts.by_contract), inner)
            }
            ChartKind::Tenure => draw_histogram(frame, inner, &self.charts.tenure, "tenure (months)"),
            ChartKind::MonthlyBill => {
                draw_histogram(frame, inner, &self.charts.bill, "monthly bill")
            }
        }
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "←/→ chart  r reseed  +/- customers  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn generated_status(config: &RunConfig, rows: usize) -> String {
    format!("generated {rows} customers (seed {})", config.generator.seed)
}

fn stayed_style() -> Style {
    Style::default().fg(Color::Cyan)
}

fn churned_style() -> Style {
    Style::default().fg(Color::LightRed)
}

fn churn_rate_bars(split: &ChurnSplit) -> BarChart<'static> {
    let share = split.churn_share();
    let bars = [
        Bar::default()
            .label(Line::from("churn=0"))
            .value(split.stayed as u64)
            .text_value(format!("{} ({}%)", split.stayed, fmt4(100.0 * (1.0 - share))))
            .style(stayed_style()),
        Bar::default()
            .label(Line::from("churn=1"))
            .value(split.churned as u64)
            .text_value(format!("{} ({}%)", split.churned, fmt4(100.0 * share)))
            .style(churned_style()),
    ];
    BarChart::default()
        .bar_width(18)
        .bar_gap(4)
        .data(BarGroup::default().bars(&bars))
}

fn contract_bars(groups: &[(&'static str, ChurnSplit)]) -> BarChart<'static> {
    let mut chart = BarChart::default().bar_width(8).bar_gap(1).group_gap(4);
    for (label, split) in groups {
        let bars = [
            Bar::default()
                .label(Line::from("0"))
                .value(split.stayed as u64)
                .style(stayed_style()),
            Bar::default()
                .label(Line::from("1"))
                .value(split.churned as u64)
                .style(churned_style()),
        ];
        chart = chart.data(BarGroup::default().label(Line::from(*label)).bars(&bars));
    }
    chart
}

fn draw_histogram(frame: &mut ratatui::Frame<'_>, area: Rect, hist: &ChurnHistogram, x_label: &str) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(2)])
        .split(area);

    frame.render_widget(ChurnHistogramChart { hist, x_label }, chunks[0]);

    let lines: Vec<Line> = [
        ("churn=0", hist.stayed_box, stayed_style()),
        ("churn=1", hist.churned_box, churned_style()),
    ]
    .into_iter()
    .map(|(label, summary, style)| Line::from(Span::styled(box_line(label, summary), style)))
    .collect();
    frame.render_widget(Paragraph::new(Text::from(lines)), chunks[1]);
}

fn box_line(label: &str, summary: Option<BoxSummary>) -> String {
    match summary {
        Some(b) => format!(
            "{label}: min={} q1={} median={} q3={} max={}",
            fmt4(b.min),
            fmt4(b.q1),
            fmt4(b.median),
            fmt4(b.q3),
            fmt4(b.max)
        ),
        None => format!("{label}: no rows"),
    }
}
