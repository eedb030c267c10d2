//! Tags screen — the merged tag table with filtering, sorting, grouping,
//! selection, and bulk actions.
//!
//! All row state is derived: the screen holds the latest snapshot plus
//! filter/sort/group settings and recomputes its visible rows whenever
//! either changes. Mutations go to the bridge, which reloads the
//! snapshot afterwards; nothing is patched locally.

use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Clear, Paragraph, Row, Table, TableState};
use tokio::sync::mpsc::UnboundedSender;
use tui_input::Input;
use tui_input::backend::crossterm::EventHandler;

use fluxforge_core::{
    CollectionView, FilterCriteria, GroupKey, MergedTagRow, ScanClassFilter, Selection,
    SortDirection, SortKey, TagSnapshot, filter_rows, group_rows, plan_collection,
    resolve_scan_class, sort_rows,
};

use crate::action::{Action, Notification};
use crate::component::Component;
use crate::theme;
use crate::widgets::sub_tabs;

/// Which input owns the keyboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum InputMode {
    #[default]
    Normal,
    Search,
    Wildcard,
    /// Scan-class picker modal for bulk reassignment.
    PickScanClass,
    /// Remove confirmation.
    ConfirmRemove,
}

/// One visible line of the table: a group header or a tag row.
enum ViewRow {
    Group {
        label: String,
        total: usize,
        collected: usize,
    },
    Tag(MergedTagRow),
}

pub struct TagsScreen {
    focused: bool,
    action_tx: Option<UnboundedSender<Action>>,
    snapshot: Arc<TagSnapshot>,

    // Filter / sort / group state (owned here, applied via core functions).
    criteria: FilterCriteria,
    sort_key: SortKey,
    sort_dir: SortDirection,
    group_by: Option<GroupKey>,
    device_filter_idx: usize, // 0 = all, 1.. = snapshot.devices[idx-1]

    selection: Selection,

    search_input: Input,
    wildcard_input: Input,
    input_mode: InputMode,
    picker_idx: usize,

    view_rows: Vec<ViewRow>,
    filtered_count: usize,
    table_state: TableState,
}

impl TagsScreen {
    pub fn new() -> Self {
        let mut screen = Self {
            focused: false,
            action_tx: None,
            snapshot: Arc::new(TagSnapshot::default()),
            criteria: FilterCriteria::default(),
            sort_key: SortKey::default(),
            sort_dir: SortDirection::default(),
            group_by: None,
            device_filter_idx: 0,
            selection: Selection::new(),
            search_input: Input::default(),
            wildcard_input: Input::default(),
            input_mode: InputMode::default(),
            picker_idx: 0,
            view_rows: Vec::new(),
            filtered_count: 0,
            table_state: TableState::default(),
        };
        screen.recompute();
        screen
    }

    /// Rebuild the visible rows from the snapshot and the current
    /// filter/sort/group settings.
    fn recompute(&mut self) {
        self.criteria.search = self.search_input.value().to_owned();
        self.criteria.wildcard = self.wildcard_input.value().to_owned();

        let mut rows = filter_rows(&self.snapshot.rows, &self.criteria);
        sort_rows(&mut rows, self.sort_key, self.sort_dir);
        self.filtered_count = rows.len();

        self.view_rows = match self.group_by {
            None => rows.into_iter().map(ViewRow::Tag).collect(),
            Some(key) => {
                let mut out = Vec::with_capacity(rows.len() + 8);
                for (label, bucket) in group_rows(&rows, key) {
                    out.push(ViewRow::Group {
                        label,
                        total: bucket.len(),
                        collected: bucket.iter().filter(|r| r.is_collected).count(),
                    });
                    out.extend(bucket.into_iter().map(ViewRow::Tag));
                }
                out
            }
        };

        self.clamp_cursor();
    }

    fn clamp_cursor(&mut self) {
        if self.view_rows.is_empty() {
            self.table_state.select(None);
        } else {
            let idx = self.table_state.selected().unwrap_or(0);
            self.table_state
                .select(Some(idx.min(self.view_rows.len() - 1)));
        }
    }

    /// The filtered tag rows, in display order (group headers stripped).
    fn visible_tags(&self) -> Vec<MergedTagRow> {
        self.view_rows
            .iter()
            .filter_map(|v| match v {
                ViewRow::Tag(row) => Some(row.clone()),
                ViewRow::Group { .. } => None,
            })
            .collect()
    }

    fn cursor_row(&self) -> Option<&MergedTagRow> {
        match self.view_rows.get(self.table_state.selected()?) {
            Some(ViewRow::Tag(row)) => Some(row),
            _ => None,
        }
    }

    #[allow(clippy::cast_possible_wrap, clippy::cast_sign_loss, clippy::as_conversions)]
    fn move_selection(&mut self, delta: isize) {
        let len = self.view_rows.len();
        if len == 0 {
            return;
        }
        let current = self.table_state.selected().unwrap_or(0) as isize;
        let next = (current + delta).clamp(0, len as isize - 1);
        self.table_state.select(Some(next as usize));
    }

    fn selected_rows(&self) -> Vec<MergedTagRow> {
        self.selection.selected_rows(&self.snapshot.rows)
    }

    fn selected_collected(&self) -> Vec<MergedTagRow> {
        self.selected_rows()
            .into_iter()
            .filter(|r| r.is_collected)
            .collect()
    }

    fn cycle_view(&mut self) {
        self.criteria.view = match self.criteria.view {
            CollectionView::All => CollectionView::Collected,
            CollectionView::Collected => CollectionView::Available,
            CollectionView::Available => CollectionView::All,
        };
        self.selection.clear();
        self.recompute();
    }

    fn cycle_device_filter(&mut self) {
        let count = self.snapshot.devices.len();
        self.device_filter_idx = (self.device_filter_idx + 1) % (count + 1);
        self.criteria.device_id = if self.device_filter_idx == 0 {
            None
        } else {
            self.snapshot
                .devices
                .get(self.device_filter_idx - 1)
                .map(|d| d.id)
        };
        self.recompute();
    }

    fn cycle_group(&mut self) {
        self.group_by = match self.group_by {
            None => Some(GroupKey::Device),
            Some(GroupKey::Device) => Some(GroupKey::ScanClass),
            Some(GroupKey::ScanClass) => Some(GroupKey::Namespace),
            Some(GroupKey::Namespace) => Some(GroupKey::DataType),
            Some(GroupKey::DataType) => Some(GroupKey::Status),
            Some(GroupKey::Status) => None,
        };
        self.recompute();
    }

    fn cycle_sort(&mut self) {
        self.sort_key = match self.sort_key {
            SortKey::DisplayName => SortKey::DeviceName,
            SortKey::DeviceName => SortKey::Path,
            SortKey::Path => SortKey::Namespace,
            SortKey::Namespace => SortKey::DataType,
            SortKey::DataType => SortKey::MeasurementName,
            SortKey::MeasurementName => SortKey::ScanClassName,
            SortKey::ScanClassName => SortKey::Enabled,
            SortKey::Enabled => SortKey::Status,
            SortKey::Status => SortKey::DisplayName,
        };
        self.recompute();
    }

    fn toggle_unassigned(&mut self) {
        self.criteria.scan_class = match self.criteria.scan_class {
            Some(ScanClassFilter::Unassigned) => None,
            _ => Some(ScanClassFilter::Unassigned),
        };
        self.recompute();
    }

    /// Bulk add-to-collection for the selected rows, using the default
    /// scan class. Collected rows are skipped by the planner.
    fn collect_selected(&mut self) -> Option<Action> {
        let rows = self.selected_rows();
        let chosen = resolve_scan_class(None, &self.snapshot.scan_classes);
        let plans = plan_collection(&rows, &self.snapshot.saved_by_device, chosen);
        self.selection.clear();
        if plans.is_empty() {
            return Some(Action::Notify(Notification::info(
                "No uncollected tags selected",
            )));
        }
        Some(Action::CollectTags(plans))
    }

    // ── Picker (bulk scan-class reassignment) ────────────────────────

    /// Picker entries: None plus every scan class.
    fn picker_len(&self) -> usize {
        self.snapshot.scan_classes.len() + 1
    }

    fn apply_picker(&mut self) -> Option<Action> {
        let scan_class_id = if self.picker_idx == 0 {
            None
        } else {
            self.snapshot
                .scan_classes
                .get(self.picker_idx - 1)
                .map(|sc| sc.id)
        };
        let rows = self.selected_collected();
        self.selection.clear();
        self.input_mode = InputMode::Normal;
        if rows.is_empty() {
            return Some(Action::Notify(Notification::info(
                "No collected tags selected",
            )));
        }
        Some(Action::AssignScanClass {
            rows,
            scan_class_id,
        })
    }

    fn render_picker(&self, frame: &mut Frame, area: Rect) {
        #[allow(clippy::cast_possible_truncation)]
        let height = (self.picker_len() as u16 + 2).min(area.height);
        let width = 40u16.min(area.width.saturating_sub(4));
        let x = area.x + (area.width.saturating_sub(width)) / 2;
        let y = area.y + (area.height.saturating_sub(height)) / 2;
        let modal = Rect::new(x, y, width, height);

        frame.render_widget(Clear, modal);
        let block = Block::default()
            .title(" Assign scan class ")
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused());
        let inner = block.inner(modal);
        frame.render_widget(block, modal);

        let mut lines = Vec::with_capacity(self.picker_len());
        for i in 0..self.picker_len() {
            let label = if i == 0 {
                "None".to_owned()
            } else {
                let sc = &self.snapshot.scan_classes[i - 1];
                let default = if sc.is_default { " (default)" } else { "" };
                format!("{} — {} ms{default}", sc.name, sc.interval_ms)
            };
            let style = if i == self.picker_idx {
                theme::table_selected()
            } else {
                theme::table_row()
            };
            lines.push(Line::from(Span::styled(format!(" {label}"), style)));
        }
        frame.render_widget(Paragraph::new(lines), inner);
    }

    // ── Rendering ────────────────────────────────────────────────────

    fn render_filter_bar(&self, frame: &mut Frame, area: Rect) {
        let rows_layout =
            Layout::vertical([Constraint::Length(1), Constraint::Length(1)]).split(area);

        // Line 1: view tabs + counts.
        let view_idx = match self.criteria.view {
            CollectionView::All => 0,
            CollectionView::Collected => 1,
            CollectionView::Available => 2,
        };
        let total = self.snapshot.rows.len();
        let collected = self.snapshot.collected_count();
        let all_label = format!("All ({total})");
        let collected_label = format!("Collected ({collected})");
        let available_label = format!("Available ({})", total - collected);
        let labels = [
            all_label.as_str(),
            collected_label.as_str(),
            available_label.as_str(),
        ];
        let mut line = sub_tabs::render_sub_tabs(&labels, view_idx);
        line.spans.push(Span::styled(
            format!("   {} / {total} shown", self.filtered_count),
            theme::key_hint(),
        ));
        frame.render_widget(Paragraph::new(line), rows_layout[0]);

        // Line 2: search + wildcard inputs and active filters.
        let mut spans = vec![
            Span::styled(" /", theme::key_hint_key()),
            Span::styled(
                format!("{:<20}", self.search_input.value()),
                if self.input_mode == InputMode::Search {
                    theme::input_active()
                } else {
                    theme::table_row()
                },
            ),
            Span::styled("  w:", theme::key_hint_key()),
            Span::styled(
                format!("{:<24}", self.wildcard_input.value()),
                if self.input_mode == InputMode::Wildcard {
                    theme::input_active()
                } else {
                    theme::table_row()
                },
            ),
        ];

        if let Some(device_id) = self.criteria.device_id {
            let name = self
                .snapshot
                .device_name(device_id)
                .unwrap_or("?")
                .to_owned();
            spans.push(Span::styled(
                format!("  device={name}"),
                theme::input_active(),
            ));
        }
        if matches!(self.criteria.scan_class, Some(ScanClassFilter::Unassigned)) {
            spans.push(Span::styled("  unassigned", theme::input_active()));
        }
        if let Some(key) = self.group_by {
            spans.push(Span::styled(
                format!("  grouped:{key:?}"),
                theme::input_active(),
            ));
        }
        spans.push(Span::styled(
            format!("  sort:{:?}{}", self.sort_key, match self.sort_dir {
                SortDirection::Ascending => "",
                SortDirection::Descending => " desc",
            }),
            theme::key_hint(),
        ));

        frame.render_widget(Paragraph::new(Line::from(spans)), rows_layout[1]);
    }

    fn render_table(&mut self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" Tags ")
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
            .view_rows
            .iter()
            .map(|view_row| match view_row {
                ViewRow::Group {
                    label,
                    total,
                    collected,
                } => Row::new(vec![
                    Cell::from(""),
                    Cell::from(Line::from(Span::styled(
                        format!("── {label} ({total} tags, {collected} collected)"),
                        theme::title_style(),
                    ))),
                ]),
                ViewRow::Tag(row) => {
                    let marked = self.selection.contains(&row.key());
                    let mark = if marked { "[x]" } else { "[ ]" };
                    let status = if row.is_collected {
                        Span::styled("collected", theme::badge_collected())
                    } else {
                        Span::styled("available", theme::badge_available())
                    };
                    let base = if marked {
                        theme::row_marked()
                    } else {
                        theme::table_row()
                    };
                    Row::new(vec![
                        Cell::from(mark),
                        Cell::from(row.display_name.clone()),
                        Cell::from(row.address()),
                        Cell::from(Line::from(status)),
                        Cell::from(row.device_name.clone()),
                        Cell::from(row.namespace.to_string()),
                        Cell::from(row.data_type.clone()),
                        Cell::from(if row.is_collected {
                            if row.scan_class_name.is_empty() {
                                "none".to_owned()
                            } else {
                                row.scan_class_name.clone()
                            }
                        } else {
                            "-".to_owned()
                        }),
                        Cell::from(match (row.is_collected, row.enabled) {
                            (false, _) => "-",
                            (true, true) => "yes",
                            (true, false) => "no",
                        }),
                    ])
                    .style(base)
                }
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(3),
                Constraint::Min(16),
                Constraint::Min(24),
                Constraint::Length(9),
                Constraint::Min(10),
                Constraint::Length(3),
                Constraint::Length(8),
                Constraint::Min(10),
                Constraint::Length(4),
            ],
        )
        .header(
            Row::new(vec![
                "", "Tag Name", "Path", "Status", "Device", "NS", "Type", "Scan Class", "En",
            ])
            .style(theme::table_header()),
        )
        .row_highlight_style(theme::table_selected());

        frame.render_stateful_widget(table, inner, &mut self.table_state);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let line = match self.input_mode {
            InputMode::Search => Line::from(vec![
                Span::styled(" search: ", theme::key_hint()),
                Span::styled(self.search_input.value().to_owned(), theme::input_active()),
                Span::styled("  Esc/Enter done", theme::key_hint()),
            ]),
            InputMode::Wildcard => Line::from(vec![
                Span::styled(" wildcard: ", theme::key_hint()),
                Span::styled(
                    self.wildcard_input.value().to_owned(),
                    theme::input_active(),
                ),
                Span::styled("  Esc/Enter done", theme::key_hint()),
            ]),
            InputMode::ConfirmRemove => Line::from(vec![
                Span::styled(
                    format!(
                        " Remove {} tags from the collection? ",
                        self.selected_collected().len()
                    ),
                    ratatui::style::Style::default().fg(theme::ERROR_RED),
                ),
                Span::styled("y ", theme::key_hint_key()),
                Span::styled("confirm  ", theme::key_hint()),
                Span::styled("n ", theme::key_hint_key()),
                Span::styled("cancel", theme::key_hint()),
            ]),
            _ => {
                let mut spans = vec![
                    Span::styled(" Space ", theme::key_hint_key()),
                    Span::styled("select  ", theme::key_hint()),
                    Span::styled("a ", theme::key_hint_key()),
                    Span::styled("all  ", theme::key_hint()),
                    Span::styled("m ", theme::key_hint_key()),
                    Span::styled("match  ", theme::key_hint()),
                    Span::styled("C ", theme::key_hint_key()),
                    Span::styled("collect  ", theme::key_hint()),
                    Span::styled("c ", theme::key_hint_key()),
                    Span::styled("class  ", theme::key_hint()),
                    Span::styled("E/D ", theme::key_hint_key()),
                    Span::styled("en/disable  ", theme::key_hint()),
                    Span::styled("x ", theme::key_hint_key()),
                    Span::styled("remove  ", theme::key_hint()),
                    Span::styled("v b s o f u ", theme::key_hint_key()),
                    Span::styled("filters", theme::key_hint()),
                ];
                if !self.selection.is_empty() {
                    spans.push(Span::styled(
                        format!("   {} selected", self.selection.len()),
                        theme::input_active(),
                    ));
                }
                Line::from(spans)
            }
        };
        frame.render_widget(Paragraph::new(line), area);
    }
}

impl Component for TagsScreen {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(action_tx);
        Ok(())
    }

    #[allow(clippy::too_many_lines)]
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match self.input_mode {
            InputMode::Search => {
                match key.code {
                    KeyCode::Esc | KeyCode::Enter => self.input_mode = InputMode::Normal,
                    _ => {
                        self.search_input
                            .handle_event(&crossterm::event::Event::Key(key));
                        self.recompute();
                    }
                }
                return Ok(None);
            }
            InputMode::Wildcard => {
                match key.code {
                    KeyCode::Esc | KeyCode::Enter => self.input_mode = InputMode::Normal,
                    _ => {
                        self.wildcard_input
                            .handle_event(&crossterm::event::Event::Key(key));
                        self.recompute();
                    }
                }
                return Ok(None);
            }
            InputMode::PickScanClass => {
                return match key.code {
                    KeyCode::Esc => {
                        self.input_mode = InputMode::Normal;
                        Ok(None)
                    }
                    KeyCode::Char('j') | KeyCode::Down => {
                        self.picker_idx = (self.picker_idx + 1) % self.picker_len();
                        Ok(None)
                    }
                    KeyCode::Char('k') | KeyCode::Up => {
                        let len = self.picker_len();
                        self.picker_idx = (self.picker_idx + len - 1) % len;
                        Ok(None)
                    }
                    KeyCode::Enter => Ok(self.apply_picker()),
                    _ => Ok(None),
                };
            }
            InputMode::ConfirmRemove => {
                return match key.code {
                    KeyCode::Char('y') => {
                        self.input_mode = InputMode::Normal;
                        let rows = self.selected_collected();
                        self.selection.clear();
                        Ok(Some(Action::RemoveTags(rows)))
                    }
                    _ => {
                        self.input_mode = InputMode::Normal;
                        Ok(None)
                    }
                };
            }
            InputMode::Normal => {}
        }

        match (key.modifiers, key.code) {
            // Navigation
            (_, KeyCode::Char('j') | KeyCode::Down) => {
                self.move_selection(1);
                Ok(None)
            }
            (_, KeyCode::Char('k') | KeyCode::Up) => {
                self.move_selection(-1);
                Ok(None)
            }
            (KeyModifiers::CONTROL, KeyCode::Char('d')) => {
                self.move_selection(10);
                Ok(None)
            }
            (KeyModifiers::CONTROL, KeyCode::Char('u')) => {
                self.move_selection(-10);
                Ok(None)
            }
            (_, KeyCode::Home) => {
                self.table_state.select(Some(0));
                Ok(None)
            }
            (_, KeyCode::End) => {
                if !self.view_rows.is_empty() {
                    self.table_state.select(Some(self.view_rows.len() - 1));
                }
                Ok(None)
            }

            // Text inputs
            (_, KeyCode::Char('/')) => {
                self.input_mode = InputMode::Search;
                Ok(None)
            }
            (_, KeyCode::Char('w')) => {
                self.input_mode = InputMode::Wildcard;
                Ok(None)
            }

            // Selection
            (_, KeyCode::Char(' ')) => {
                let key = self.cursor_row().map(MergedTagRow::key);
                if let Some(key) = key {
                    self.selection.toggle(key);
                }
                Ok(None)
            }
            (_, KeyCode::Char('a')) => {
                let visible = self.visible_tags();
                self.selection.toggle_all(&visible);
                Ok(None)
            }
            (_, KeyCode::Char('m')) => {
                let pattern = self.wildcard_input.value().to_owned();
                if pattern.is_empty() {
                    return Ok(Some(Action::Notify(Notification::info(
                        "Enter a wildcard pattern first (w)",
                    ))));
                }
                let visible = self.visible_tags();
                self.selection.select_matching(&pattern, &visible);
                Ok(None)
            }

            // Filters / view
            (_, KeyCode::Char('v')) => {
                self.cycle_view();
                Ok(None)
            }
            (_, KeyCode::Char('b')) => {
                self.cycle_group();
                Ok(None)
            }
            (_, KeyCode::Char('s')) => {
                self.cycle_sort();
                Ok(None)
            }
            (_, KeyCode::Char('o')) => {
                self.sort_dir = self.sort_dir.toggled();
                self.recompute();
                Ok(None)
            }
            (_, KeyCode::Char('f')) => {
                self.cycle_device_filter();
                Ok(None)
            }
            (_, KeyCode::Char('u')) => {
                self.toggle_unassigned();
                Ok(None)
            }

            // Bulk actions
            (_, KeyCode::Char('C')) => Ok(self.collect_selected()),
            (_, KeyCode::Char('c')) => {
                if self.selected_collected().is_empty() {
                    return Ok(Some(Action::Notify(Notification::info(
                        "No collected tags selected",
                    ))));
                }
                self.picker_idx = 0;
                self.input_mode = InputMode::PickScanClass;
                Ok(None)
            }
            (_, KeyCode::Char('E')) => {
                let rows = self.selected_collected();
                self.selection.clear();
                Ok((!rows.is_empty())
                    .then_some(Action::SetTagsEnabled {
                        rows,
                        enabled: true,
                    }))
            }
            (_, KeyCode::Char('D')) => {
                let rows = self.selected_collected();
                self.selection.clear();
                Ok((!rows.is_empty())
                    .then_some(Action::SetTagsEnabled {
                        rows,
                        enabled: false,
                    }))
            }
            (_, KeyCode::Char('x')) => {
                if !self.selected_collected().is_empty() {
                    self.input_mode = InputMode::ConfirmRemove;
                }
                Ok(None)
            }

            (_, KeyCode::Char('R')) => Ok(Some(Action::LoadSnapshot)),

            _ => Ok(None),
        }
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        if let Action::SnapshotLoaded(snapshot) = action {
            self.snapshot = Arc::clone(snapshot);
            // The device-filter cycle index may now point past the device
            // list; re-derive the id it stands for.
            if self.device_filter_idx > self.snapshot.devices.len() {
                self.device_filter_idx = 0;
                self.criteria.device_id = None;
            }
            self.recompute();
        }
        Ok(None)
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let layout = Layout::vertical([
            Constraint::Length(2),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(area);

        self.render_filter_bar(frame, layout[0]);
        self.render_table(frame, layout[1]);
        self.render_footer(frame, layout[2]);

        if self.input_mode == InputMode::PickScanClass {
            self.render_picker(frame, area);
        }
    }

    fn wants_input(&self) -> bool {
        self.input_mode != InputMode::Normal
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn id(&self) -> &str {
        "tags"
    }
}
