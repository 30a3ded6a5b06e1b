use std::path::PathBuf;

use eframe::egui::{self};
use egui::menu;
use egui_modal::Modal;
use egui_plot::{Legend, Line, PlotPoints};
use imu_monitor::config::{self, DEFAULT_CONFIG_FILE, MAX_DISPLAY_CAPACITY};
use imu_monitor::{export, Config, IngestionPipeline, Sample};
use nalgebra::Vector3;

use crate::serial_panel::SerialPanel;

pub fn init(
    pipeline: IngestionPipeline,
    config: Config,
    config_path: Option<PathBuf>,
) -> eframe::Result {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1024.0, 768.0]),
        ..Default::default()
    };
    eframe::run_native(
        "IMU Telemetry Monitor",
        options,
        Box::new(|_cc| Ok(Box::new(MonitorApp::new(pipeline, config, config_path)))),
    )
}

struct MonitorApp {
    pipeline: IngestionPipeline,
    config: Config,
    config_path: Option<PathBuf>,
    serial: SerialPanel,
    display_capacity: usize,
    decimation_ratio: u32,
    show_acc: bool,
    show_gyro: bool,
    show_mag: bool,
    show_euler: bool,
    message: String,
}

impl MonitorApp {
    pub fn new(pipeline: IngestionPipeline, config: Config, config_path: Option<PathBuf>) -> Self {
        Self {
            display_capacity: pipeline.display_capacity().get(),
            decimation_ratio: pipeline.decimation_ratio().get(),
            serial: SerialPanel::new(&config),
            pipeline,
            config,
            config_path,
            show_acc: true,
            show_gyro: true,
            show_mag: true,
            show_euler: true,
            message: String::new(),
        }
    }

    fn export(&self) -> Option<String> {
        let mut dialog = rfd::FileDialog::new()
            .add_filter("csv", &["csv"])
            .set_file_name(export::default_file_name());
        if let Some(dir) = &self.config.export_dir {
            dialog = dialog.set_directory(dir);
        }

        let mut path = dialog.save_file()?;
        path.set_extension("csv");
        Some(match self.pipeline.export(&path) {
            Ok(count) => format!("Exported {count} samples to\n{}", path.display()),
            Err(e) => format!("Export failed:\n{e}"),
        })
    }

    fn save_settings(&mut self) -> String {
        self.config.port = self.serial.port_name().map(str::to_owned);
        self.config.baud_rate = self.serial.baud_rate();
        self.config.display_capacity = self.display_capacity;
        self.config.decimation_ratio = self.decimation_ratio;

        let path = self
            .config_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        match self.config.save(&path) {
            Ok(()) => format!("Settings saved to\n{}", path.display()),
            Err(e) => format!("Saving settings failed:\n{e}"),
        }
    }
}

impl eframe::App for MonitorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let modal_message = Modal::new(ctx, "message");
        modal_message.show(|ui| {
            modal_message.title(ui, "IMU Telemetry Monitor");
            modal_message.frame(ui, |ui| {
                modal_message.body(ui, self.message.clone());
            });
            modal_message.buttons(ui, |ui| {
                if modal_message.caution_button(ui, "close").clicked() {
                    // After clicking, the modal is automatically closed
                };
                if ui.button("🗐 copy to clipboard").clicked() {
                    ui.output_mut(|p| p.copied_text = self.message.clone());
                };
            });
        });

        let mut report: Option<String> = None;

        egui::SidePanel::left("left_panel").show(ctx, |ui| {
            menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("🖴 Export CSV").clicked() {
                        ui.close_menu();
                        report = self.export();
                    }
                    if ui.button("⚙ Save settings").clicked() {
                        ui.close_menu();
                        report = Some(self.save_settings());
                    }
                });
            });
            ui.separator();

            if let Err(e) = self.serial.show(ui, &mut self.pipeline) {
                report = Some(e.to_string());
            }
            ui.separator();

            ui.heading("Collection");
            ui.horizontal(|ui| {
                let start = ui.button("▶ Start").clicked();
                let pause = ui.button("⏸ Pause").clicked();
                let resume = ui.button("⏵ Resume").clicked();
                let result = if start {
                    self.pipeline.start()
                } else if pause {
                    self.pipeline.pause()
                } else if resume {
                    self.pipeline.resume()
                } else {
                    Ok(())
                };
                if let Err(e) = result {
                    report = Some(e.to_string());
                }
                if ui.button("🗑 Clear").clicked() {
                    self.pipeline.clear();
                }
            });
            ui.separator();

            ui.heading("Display");
            if ui
                .add(
                    egui::DragValue::new(&mut self.display_capacity)
                        .range(1..=MAX_DISPLAY_CAPACITY)
                        .prefix("max points: "),
                )
                .changed()
            {
                match config::validate_display_capacity(self.display_capacity) {
                    Ok(capacity) => self.pipeline.set_display_capacity(capacity),
                    Err(e) => report = Some(e.to_string()),
                }
            }
            if ui
                .add(
                    egui::DragValue::new(&mut self.decimation_ratio)
                        .range(1..=1000)
                        .prefix("1 of every "),
                )
                .changed()
            {
                match config::validate_decimation_ratio(self.decimation_ratio) {
                    Ok(ratio) => self.pipeline.set_decimation_ratio(ratio),
                    Err(e) => report = Some(e.to_string()),
                }
            }
            ui.toggle_value(&mut self.show_acc, "Accel");
            ui.toggle_value(&mut self.show_gyro, "Gyro");
            ui.toggle_value(&mut self.show_mag, "Mag");
            ui.toggle_value(&mut self.show_euler, "Euler");
            ui.separator();

            ui.heading("Status");
            let stats = self.pipeline.stats();
            egui::Grid::new("status")
                .num_columns(2)
                .striped(true)
                .show(ui, |ui| {
                    ui.label("State");
                    ui.label(self.pipeline.state().to_string());
                    ui.end_row();
                    ui.label("Archived");
                    ui.label(self.pipeline.archive_count().to_string());
                    ui.end_row();
                    ui.label("Displayed");
                    ui.label(self.pipeline.display_count().to_string());
                    ui.end_row();
                    ui.label("Lines");
                    ui.label(stats.lines.to_string());
                    ui.end_row();
                    ui.label("Discarded");
                    ui.label(stats.discarded.to_string());
                    ui.end_row();
                    ui.label("Device messages");
                    ui.label(stats.non_data.to_string());
                    ui.end_row();
                });
        });

        if let Some(message) = report {
            self.message = message;
            modal_message.open();
        }

        let samples = self.pipeline.display_snapshot();
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                if self.show_acc {
                    vector_plot(ui, "Accelerometer", "g", &samples, |s| s.accel, ["x", "y", "z"]);
                }
                if self.show_gyro {
                    vector_plot(ui, "Gyro", "°/s", &samples, |s| s.gyro, ["x", "y", "z"]);
                }
                if self.show_mag {
                    vector_plot(ui, "Mag", "µT", &samples, |s| s.mag, ["x", "y", "z"]);
                }
                if self.show_euler {
                    vector_plot(
                        ui,
                        "Euler",
                        "°",
                        &samples,
                        |s| s.euler,
                        ["roll", "pitch", "yaw"],
                    );
                }

                ui.collapsing("Device messages", |ui| {
                    for line in self.pipeline.device_log().iter().rev() {
                        ui.monospace(line);
                    }
                });
            });
        });

        ctx.request_repaint_after(self.config.redraw_interval());
    }
}

/// Plots against the device timestamp, or the sample's position when the
/// device sent none.
fn x_of(index: usize, sample: &Sample) -> f64 {
    sample.timestamp.map_or(index as f64, |t| t as f64)
}

fn vector_plot(
    ui: &mut egui::Ui,
    title: &str,
    unit: &str,
    samples: &[Sample],
    field: fn(&Sample) -> Option<Vector3<f64>>,
    names: [&str; 3],
) {
    ui.label(title);
    egui_plot::Plot::new(title)
        .height(180.0)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .y_axis_label(unit)
        .legend(Legend::default())
        .show(ui, |plot_ui| {
            for (axis, name) in names.into_iter().enumerate() {
                let points: PlotPoints = samples
                    .iter()
                    .enumerate()
                    .filter_map(|(i, s)| field(s).map(|v| [x_of(i, s), v[axis]]))
                    .collect();
                plot_ui.line(Line::new(points).name(name));
            }
        });
}
