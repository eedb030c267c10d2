//! Minimal vertical form: labelled text inputs with one active field.
//!
//! Backs the create dialogs (scan class, InfluxDB target) and the setup
//! wizard. Tab/Down and Shift+Tab/Up move between fields; all other keys
//! go to the active `tui_input::Input`.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph};
use tui_input::Input;
use tui_input::backend::crossterm::EventHandler;

use crate::theme;

pub struct FormField {
    pub label: &'static str,
    pub input: Input,
    /// Render the value as asterisks (tokens, passwords).
    pub mask: bool,
}

impl FormField {
    pub fn new(label: &'static str, initial: &str) -> Self {
        Self {
            label,
            input: Input::new(initial.to_owned()),
            mask: false,
        }
    }

    pub fn masked(label: &'static str, initial: &str) -> Self {
        Self {
            label,
            input: Input::new(initial.to_owned()),
            mask: true,
        }
    }
}

pub struct Form {
    pub title: &'static str,
    pub fields: Vec<FormField>,
    pub active: usize,
}

impl Form {
    pub fn new(title: &'static str, fields: Vec<FormField>) -> Self {
        Self {
            title,
            fields,
            active: 0,
        }
    }

    pub fn value(&self, index: usize) -> String {
        self.fields
            .get(index)
            .map(|f| f.input.value().to_owned())
            .unwrap_or_default()
    }

    /// Feed a key into the form. Enter and Esc are left for the owner to
    /// interpret (submit / cancel); everything else is consumed here.
    pub fn handle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Tab | KeyCode::Down => {
                self.active = (self.active + 1) % self.fields.len().max(1);
            }
            KeyCode::BackTab | KeyCode::Up => {
                let len = self.fields.len().max(1);
                self.active = (self.active + len - 1) % len;
            }
            _ => {
                if let Some(field) = self.fields.get_mut(self.active) {
                    field
                        .input
                        .handle_event(&crossterm::event::Event::Key(key));
                }
            }
        }
    }

    /// Render the form as a centered modal over `area`.
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        #[allow(clippy::cast_possible_truncation)]
        let height = (self.fields.len() as u16 + 4).min(area.height);
        let width = 64u16.min(area.width.saturating_sub(4));
        let x = area.x + (area.width.saturating_sub(width)) / 2;
        let y = area.y + (area.height.saturating_sub(height)) / 2;
        let modal = Rect::new(x, y, width, height);

        frame.render_widget(Clear, modal);

        let block = Block::default()
            .title(format!(" {} ", self.title))
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(theme::border_focused());
        let inner = block.inner(modal);
        frame.render_widget(block, modal);

        let mut lines = Vec::with_capacity(self.fields.len() + 2);
        for (i, field) in self.fields.iter().enumerate() {
            let value = if field.mask {
                "*".repeat(field.input.value().len())
            } else {
                field.input.value().to_owned()
            };
            let (marker, style) = if i == self.active {
                ("> ", theme::input_active())
            } else {
                ("  ", theme::table_row())
            };
            lines.push(Line::from(vec![
                Span::styled(marker, theme::key_hint_key()),
                Span::styled(format!("{:<14}", field.label), theme::key_hint()),
                Span::styled(value, style),
            ]));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("Enter ", theme::key_hint_key()),
            Span::styled("save  ", theme::key_hint()),
            Span::styled("Tab ", theme::key_hint_key()),
            Span::styled("next field  ", theme::key_hint()),
            Span::styled("Esc ", theme::key_hint_key()),
            Span::styled("cancel", theme::key_hint()),
        ]));

        frame.render_widget(Paragraph::new(lines), inner);
    }
}
