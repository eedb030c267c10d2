//! Setup screen — first-run wizard shown until the portal reports
//! `setup_complete`.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};
use tokio::sync::mpsc::UnboundedSender;

use fluxforge_api::types::{SystemConfig, SystemConfigUpdate};

use crate::action::{Action, Notification};
use crate::component::Component;
use crate::theme;
use crate::widgets::form::{Form, FormField};

pub struct SetupScreen {
    focused: bool,
    action_tx: Option<UnboundedSender<Action>>,
    form: Form,
    seeded: bool,
}

impl SetupScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            action_tx: None,
            form: Self::build_form(&SystemConfig {
                setup_complete: false,
                influxdb_url: "http://localhost:8086".into(),
                influxdb_token: String::new(),
                influxdb_org: String::new(),
                influxdb_default_bucket: "telemetry".into(),
                telegraf_config_path: "/etc/telegraf/telegraf.conf".into(),
                telegraf_reload_command: String::new(),
                app_title: "FluxForge".into(),
            }),
            seeded: false,
        }
    }

    fn build_form(config: &SystemConfig) -> Form {
        Form::new(
            "Portal setup",
            vec![
                FormField::new("Title", &config.app_title),
                FormField::new("InfluxDB URL", &config.influxdb_url),
                FormField::masked("Token", &config.influxdb_token),
                FormField::new("Org", &config.influxdb_org),
                FormField::new("Bucket", &config.influxdb_default_bucket),
                FormField::new("Telegraf path", &config.telegraf_config_path),
                FormField::new("Reload cmd", &config.telegraf_reload_command),
            ],
        )
    }

    fn submit(&mut self) -> Option<Action> {
        let url = self.form.value(1).trim().to_owned();
        if url.parse::<url::Url>().is_err() {
            return Some(Action::Notify(Notification::error(format!(
                "Invalid InfluxDB URL: {url}"
            ))));
        }

        Some(Action::UpdateSystemConfig(SystemConfigUpdate {
            app_title: self.form.value(0).trim().to_owned(),
            influxdb_url: url,
            influxdb_token: self.form.value(2).trim().to_owned(),
            influxdb_org: self.form.value(3).trim().to_owned(),
            influxdb_default_bucket: self.form.value(4).trim().to_owned(),
            telegraf_config_path: self.form.value(5).trim().to_owned(),
            telegraf_reload_command: self.form.value(6).trim().to_owned(),
        }))
    }
}

impl Component for SetupScreen {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(action_tx);
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        match key.code {
            KeyCode::Enter => Ok(self.submit()),
            _ => {
                self.form.handle_key(key);
                Ok(None)
            }
        }
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        if let Action::SystemConfigLoaded(config) = action {
            // Seed the form once from the server's current values.
            if !self.seeded {
                self.form = Self::build_form(config);
                self.seeded = true;
            }
        }
        Ok(None)
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .title(" FluxForge Setup ")
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
            Paragraph::new(
                "Configure the default InfluxDB connection and Telegraf paths.\n\
                 The gateway marks setup complete once this form is saved.",
            )
            .style(theme::key_hint()),
            Rect::new(inner.x + 1, inner.y, inner.width.saturating_sub(2), 2),
        );

        self.form.render(frame, inner);
    }

    fn wants_input(&self) -> bool {
        true
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn id(&self) -> &str {
        "setup"
    }
}
