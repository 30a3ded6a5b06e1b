use eframe::egui;
use imu_monitor::source::{self, BAUDRATES};
use imu_monitor::{Config, IngestionPipeline, LinkState, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Open,
    Close,
    Send,
}

/// Port selection, open/close and the free-text device command.
pub struct SerialPanel {
    port_name: Option<String>,
    baud_rate: u32,
    command: String,
}

impl SerialPanel {
    pub fn new(config: &Config) -> Self {
        Self {
            port_name: config.port.clone(),
            baud_rate: config.baud_rate,
            command: String::new(),
        }
    }

    pub fn port_name(&self) -> Option<&str> {
        self.port_name.as_deref()
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    /// Draws the panel, then runs whatever was clicked. A failing action
    /// never cuts the panel short.
    pub fn show(&mut self, ui: &mut egui::Ui, pipeline: &mut IngestionPipeline) -> Result<()> {
        let connected = pipeline.state() != LinkState::Disconnected;
        match self.draw(ui, connected) {
            Some(action) => self.perform(action, pipeline),
            None => Ok(()),
        }
    }

    fn draw(&mut self, ui: &mut egui::Ui, connected: bool) -> Option<Action> {
        let mut action = None;
        ui.heading("Serial");

        if connected {
            ui.label(format!("'{}' 8-N-1", self.port_name.as_deref().unwrap_or("")));
        } else {
            egui::ComboBox::new("ports", "Port")
                .selected_text(self.port_name.as_deref().unwrap_or(""))
                .show_ui(ui, |ui| {
                    for port in source::available_ports() {
                        let port_name = port.port_name.clone();
                        ui.selectable_value(&mut self.port_name, Some(port.port_name), port_name);
                    }
                });

            egui::ComboBox::new("baudrates", "Baud rate")
                .selected_text(format!("{}", self.baud_rate))
                .show_ui(ui, |ui| {
                    for baudrate in BAUDRATES {
                        ui.selectable_value(&mut self.baud_rate, baudrate, format!("{baudrate}"));
                    }
                });
        }

        if self.port_name.is_some() {
            if connected {
                if ui.button("Close").clicked() {
                    action = Some(Action::Close);
                }
            } else if ui.button("Open").clicked() {
                action = Some(Action::Open);
            }
        }
        ui.separator();

        ui.heading("Device command");
        ui.horizontal(|ui| {
            ui.text_edit_singleline(&mut self.command);
            if ui
                .add_enabled(
                    connected && !self.command.is_empty(),
                    egui::Button::new("Send"),
                )
                .clicked()
            {
                action = Some(Action::Send);
            }
        });

        action
    }

    fn perform(&mut self, action: Action, pipeline: &mut IngestionPipeline) -> Result<()> {
        match action {
            Action::Open => {
                let Some(port_name) = &self.port_name else {
                    return Ok(());
                };
                let (source, sink) = source::open_serial(port_name, self.baud_rate)?;
                pipeline.connect(source, Some(Box::new(sink)))
            }
            Action::Close => {
                pipeline.disconnect();
                Ok(())
            }
            Action::Send => pipeline.send_command(&self.command),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn panel(port: &str) -> SerialPanel {
        SerialPanel::new(&Config {
            port: Some(port.into()),
            ..Default::default()
        })
    }

    #[test]
    fn failed_open_stays_disconnected() {
        let mut pipeline = IngestionPipeline::from_config(&Config::default()).unwrap();
        let mut panel = panel("/dev/imu_monitor_no_such_port");
        panel.command = "r100".into();

        assert!(panel.perform(Action::Open, &mut pipeline).is_err());
        assert_eq!(pipeline.state(), LinkState::Disconnected);
        assert_eq!(panel.command, "r100");
        assert!(panel.perform(Action::Send, &mut pipeline).is_err());
    }

    #[test]
    fn draws_command_field_without_a_click() {
        let ctx = egui::Context::default();
        let mut panel = panel("/dev/imu_monitor_no_such_port");
        let mut action = Some(Action::Close);
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                action = panel.draw(ui, false);
            });
        });
        assert_eq!(action, None);
        assert_eq!(panel.port_name(), Some("/dev/imu_monitor_no_such_port"));
    }
}
