//! Devices screen — registered OPC UA devices with scan control.

use std::collections::HashMap;
use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table, TableState};
use throbber_widgets_tui::{Throbber, ThrobberState};
use tokio::sync::mpsc::UnboundedSender;

use fluxforge_api::types::Device;
use fluxforge_core::{ScanState, TagSnapshot};

use crate::action::Action;
use crate::component::Component;
use crate::theme;

pub struct DevicesScreen {
    focused: bool,
    action_tx: Option<UnboundedSender<Action>>,
    snapshot: Arc<TagSnapshot>,
    /// Live scan state per device, fed by the bridge's watchers. Absent
    /// entries fall back to the snapshot (idle).
    scan_states: HashMap<i64, ScanState>,
    table_state: TableState,
    throbber: ThrobberState,
    /// Device pending delete confirmation.
    pending_delete: Option<i64>,
}

impl DevicesScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            action_tx: None,
            snapshot: Arc::new(TagSnapshot::default()),
            scan_states: HashMap::new(),
            table_state: TableState::default(),
            throbber: ThrobberState::default(),
            pending_delete: None,
        }
    }

    fn devices(&self) -> &[Device] {
        &self.snapshot.devices
    }

    fn selected_device(&self) -> Option<&Device> {
        self.devices().get(self.table_state.selected().unwrap_or(0))
    }

    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss, clippy::as_conversions)]
    fn move_selection(&mut self, delta: isize) {
        let len = self.devices().len();
        if len == 0 {
            return;
        }
        let current = self.table_state.selected().unwrap_or(0) as isize;
        let next = (current + delta).clamp(0, len as isize - 1);
        self.table_state.select(Some(next as usize));
    }

    fn scan_state(&self, device_id: i64) -> &ScanState {
        self.scan_states.get(&device_id).unwrap_or(&ScanState::Idle)
    }

    fn scan_label(&self, device_id: i64) -> (String, ratatui::style::Style) {
        match self.scan_state(device_id) {
            ScanState::Idle => ("idle".into(), theme::badge_available()),
            ScanState::Scanning => ("scanning".into(), theme::input_active()),
            ScanState::Complete { nodes } => {
                (format!("{} nodes", nodes.len()), theme::badge_collected())
            }
            ScanState::Error { .. } => ("error".into(), ratatui::style::Style::default().fg(theme::ERROR_RED)),
        }
    }

    fn render_table(&mut self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" OPC UA Devices ")
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

        let rows: Vec<Row> = self
            .devices()
            .iter()
            .map(|d| {
                let (scan, scan_style) = self.scan_label(d.id);
                Row::new(vec![
                    Cell::from(d.id.to_string()),
                    Cell::from(d.name.clone()),
                    Cell::from(d.endpoint_url.clone()),
                    Cell::from(if d.enabled { "yes" } else { "no" }),
                    Cell::from(format!("{}/{}", d.enabled_tag_count, d.tag_count)),
                    Cell::from(Line::from(Span::styled(scan, scan_style))),
                ])
                .style(theme::table_row())
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(4),
                Constraint::Min(14),
                Constraint::Min(26),
                Constraint::Length(7),
                Constraint::Length(8),
                Constraint::Length(12),
            ],
        )
        .header(
            Row::new(vec!["ID", "Name", "Endpoint", "Enabled", "Tags", "Scan"])
                .style(theme::table_header()),
        )
        .row_highlight_style(theme::table_selected());

        frame.render_stateful_widget(table, inner, &mut self.table_state);
    }

    fn render_detail(&mut self, frame: &mut Frame, area: Rect) {
        let Some(device) = self.selected_device() else {
            return;
        };
        let device_id = device.id;
        let name = device.name.clone();
        let security = device.security_policy.clone();
        let influx = device.influxdb_name.clone().unwrap_or_else(|| "-".into());

        let block = Block::default()
            .title(format!(" {name} "))
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_default());
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut lines = vec![Line::from(vec![
            Span::styled("  Security  ", theme::key_hint()),
            Span::styled(security, theme::table_row()),
            Span::styled("   InfluxDB  ", theme::key_hint()),
            Span::styled(influx, theme::table_row()),
        ])];

        match self.scan_state(device_id).clone() {
            ScanState::Error { message } => {
                lines.push(Line::from(Span::styled(
                    format!("  Scan failed: {message}"),
                    ratatui::style::Style::default().fg(theme::ERROR_RED),
                )));
            }
            ScanState::Scanning => {
                // Throbber rendered separately below.
            }
            _ => {}
        }

        frame.render_widget(Paragraph::new(lines), inner);

        if self.scan_state(device_id).is_scanning() && inner.height > 1 {
            let throbber_area = Rect::new(inner.x + 2, inner.y + 1, inner.width.saturating_sub(2), 1);
            let throbber = Throbber::default()
                .label("scanning address space...")
                .style(theme::input_active());
            frame.render_stateful_widget(throbber, throbber_area, &mut self.throbber);
        }
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let line = if let Some(id) = self.pending_delete {
            let name = self
                .snapshot
                .device_name(id)
                .unwrap_or("device")
                .to_owned();
            Line::from(vec![
                Span::styled(
                    format!(" Delete '{name}' and all its tags? "),
                    ratatui::style::Style::default().fg(theme::ERROR_RED),
                ),
                Span::styled("y ", theme::key_hint_key()),
                Span::styled("confirm  ", theme::key_hint()),
                Span::styled("n ", theme::key_hint_key()),
                Span::styled("cancel", theme::key_hint()),
            ])
        } else {
            Line::from(vec![
                Span::styled(" s ", theme::key_hint_key()),
                Span::styled("scan  ", theme::key_hint()),
                Span::styled("c ", theme::key_hint_key()),
                Span::styled("clear scan  ", theme::key_hint()),
                Span::styled("x ", theme::key_hint_key()),
                Span::styled("delete  ", theme::key_hint()),
                Span::styled("R ", theme::key_hint_key()),
                Span::styled("reload", theme::key_hint()),
            ])
        };
        frame.render_widget(Paragraph::new(line), area);
    }
}

impl Component for DevicesScreen {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(action_tx);
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        // Pending delete confirmation consumes y/n.
        if let Some(device_id) = self.pending_delete {
            return match key.code {
                KeyCode::Char('y') => {
                    self.pending_delete = None;
                    Ok(Some(Action::DeleteDevice(device_id)))
                }
                _ => {
                    self.pending_delete = None;
                    Ok(None)
                }
            };
        }

        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.move_selection(1);
                Ok(None)
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.move_selection(-1);
                Ok(None)
            }
            KeyCode::Char('s') => {
                // Re-starting while a scan runs is disallowed.
                match self.selected_device() {
                    Some(d) if !self.scan_state(d.id).is_scanning() => {
                        Ok(Some(Action::StartScan(d.id)))
                    }
                    _ => Ok(None),
                }
            }
            KeyCode::Char('c') => Ok(self.selected_device().map(|d| Action::ClearScan(d.id))),
            KeyCode::Char('x') => {
                self.pending_delete = self.selected_device().map(|d| d.id);
                Ok(None)
            }
            KeyCode::Char('R') => Ok(Some(Action::LoadSnapshot)),
            _ => Ok(None),
        }
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::SnapshotLoaded(snapshot) => {
                self.snapshot = Arc::clone(snapshot);
                if self.table_state.selected().is_none() && !self.devices().is_empty() {
                    self.table_state.select(Some(0));
                }
                self.move_selection(0);
            }
            Action::ScanUpdated { device_id, state } => {
                self.scan_states.insert(*device_id, state.clone());
            }
            Action::Tick => {
                self.throbber.calc_next();
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let layout = Layout::vertical([
            Constraint::Min(5),
            Constraint::Length(4),
            Constraint::Length(1),
        ])
        .split(area);

        self.render_table(frame, layout[0]);
        self.render_detail(frame, layout[1]);
        self.render_footer(frame, layout[2]);
    }

    fn wants_input(&self) -> bool {
        self.pending_delete.is_some()
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn id(&self) -> &str {
        "devices"
    }
}
