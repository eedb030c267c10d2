//! Dashboard screen — gateway metrics at a glance.

use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table};
use tokio::sync::mpsc::UnboundedSender;

use fluxforge_api::types::Metrics;

use crate::action::Action;
use crate::component::Component;
use crate::theme;

pub struct DashboardScreen {
    focused: bool,
    action_tx: Option<UnboundedSender<Action>>,
    metrics: Option<Arc<Metrics>>,
}

impl DashboardScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            action_tx: None,
            metrics: None,
        }
    }

    fn render_counts(&self, frame: &mut Frame, area: Rect, m: &Metrics) {
        let cells = [
            ("Devices", format!("{} / {}", m.enabled_devices, m.total_devices)),
            ("Tags", format!("{} / {}", m.enabled_tags, m.total_tags)),
            ("Scan Classes", m.scan_class_count.to_string()),
            ("InfluxDB", m.influxdb_count.to_string()),
        ];

        #[allow(clippy::cast_possible_truncation)]
        let columns = Layout::horizontal(vec![
            Constraint::Ratio(1, cells.len() as u32);
            cells.len()
        ])
        .split(area);

        for ((label, value), cell_area) in cells.iter().zip(columns.iter()) {
            let block = Block::default()
                .title(format!(" {label} "))
                .title_style(theme::title_style())
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(theme::border_default());
            let inner = block.inner(*cell_area);
            frame.render_widget(block, *cell_area);
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(
                    value.clone(),
                    theme::title_style(),
                )))
                .centered(),
                inner,
            );
        }
    }

    fn render_scan_class_load(&self, frame: &mut Frame, area: Rect, m: &Metrics) {
        let block = Block::default()
            .title(" Enabled tags by scan class ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_default());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows: Vec<Row> = m
            .tags_by_scan_class
            .iter()
            .map(|load| {
                Row::new(vec![
                    Cell::from(load.name.clone()),
                    Cell::from(format!("{} ms", load.interval_ms)),
                    Cell::from(load.tag_count.to_string()),
                ])
                .style(theme::table_row())
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Min(16),
                Constraint::Length(10),
                Constraint::Length(8),
            ],
        )
        .header(
            Row::new(vec!["Scan Class", "Interval", "Tags"]).style(theme::table_header()),
        );
        frame.render_widget(table, inner);
    }

    fn render_devices(&self, frame: &mut Frame, area: Rect, m: &Metrics) {
        let block = Block::default()
            .title(" Devices ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_default());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows: Vec<Row> = m
            .device_summary
            .iter()
            .map(|d| {
                let status = if d.enabled {
                    Span::styled("enabled", theme::badge_collected())
                } else {
                    Span::styled("disabled", theme::badge_available())
                };
                Row::new(vec![
                    Cell::from(d.name.clone()),
                    Cell::from(d.endpoint_url.clone()),
                    Cell::from(Line::from(status)),
                    Cell::from(d.enabled_tag_count.to_string()),
                    Cell::from(d.influxdb_name.clone().unwrap_or_else(|| "-".into())),
                ])
                .style(theme::table_row())
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Min(14),
                Constraint::Min(24),
                Constraint::Length(9),
                Constraint::Length(6),
                Constraint::Min(12),
            ],
        )
        .header(
            Row::new(vec!["Name", "Endpoint", "Status", "Tags", "InfluxDB"])
                .style(theme::table_header()),
        );
        frame.render_widget(table, inner);
    }
}

impl Component for DashboardScreen {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(action_tx);
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match key.code {
            KeyCode::Char('R') => Ok(Some(Action::LoadMetrics)),
            _ => Ok(None),
        }
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        if let Action::MetricsLoaded(metrics) = action {
            self.metrics = Some(Arc::clone(metrics));
        }
        Ok(None)
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let Some(metrics) = self.metrics.clone() else {
            let block = Block::default()
                .title(" Dashboard ")
                .title_style(theme::title_style())
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(if self.focused {
                    theme::border_focused()
                } else {
                    theme::border_default()
                });
            let inner = block.inner(area);
            frame.render_widget(block, area);
            frame.render_widget(
                Paragraph::new("Loading metrics...").style(theme::key_hint()),
                inner,
            );
            return;
        };

        let layout = Layout::vertical([
            Constraint::Length(3),
            Constraint::Length(8),
            Constraint::Min(4),
        ])
        .split(area);

        self.render_counts(frame, layout[0], &metrics);
        self.render_scan_class_load(frame, layout[1], &metrics);
        self.render_devices(frame, layout[2], &metrics);
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn id(&self) -> &str {
        "dashboard"
    }
}
