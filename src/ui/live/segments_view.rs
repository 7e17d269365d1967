use std::{path::Path, sync::Arc};

use egui::{Align, Button, Color32, Id, Key, Layout, RichText, TextEdit};
use egui_extras::{Column, TableBuilder};
use egui_plot::{Legend, Line, PlotPoints};
use log::{error, info};

use crate::{SegwatchError, monitor::PollMode, render::render_html_report, ui::stroke_shade};

use super::LiveMonitorApp;
use crate::ui::PALETTE_ORANGE;

// load times at or above this are drawn fully red
const LOAD_TIME_SHADE_CEILING_S: f64 = 2.0;
const CHART_HEIGHT_RATIO: f32 = 0.45;
const ROW_HEIGHT: f32 = 18.;

impl LiveMonitorApp {
    pub(crate) fn export_html(&self, destination: &Path) -> Result<(), SegwatchError> {
        let report = render_html_report(self.dashboard.table(), &self.title);
        std::fs::write(destination, report).map_err(|e| SegwatchError::ExportError { source: e })?;
        info!(
            "Exported {} segments to {:?}",
            self.dashboard.table().len(),
            destination
        );
        Ok(())
    }

    pub(crate) fn controls_view(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("controls")
            .min_height(30.)
            .show(ctx, |ui| {
                ui.with_layout(Layout::left_to_right(Align::Center), |ui| {
                    ui.add_space(10.);
                    let mode = self.control.as_ref().map(|control| control.mode().clone());
                    match mode {
                        Some(PollMode::Session(session_id)) => {
                            ui.label("Manifest URL");
                            let url_input = ui.add(
                                TextEdit::singleline(&mut self.manifest_url)
                                    .id(Id::new("manifestUrl"))
                                    .hint_text("https://example.com/stream.m3u8")
                                    .desired_width(360.),
                            );
                            let submitted = url_input.lost_focus()
                                && ui.input(|is| is.key_pressed(Key::Enter));
                            let can_start = !self.is_starting();
                            if ui.add_enabled(can_start, Button::new("Start")).clicked()
                                || (submitted && can_start)
                            {
                                self.start_monitoring();
                            }
                            ui.label(RichText::new(format!("Session {}", session_id)).weak());
                        }
                        Some(PollMode::Global) => {
                            ui.label("Polling all monitored streams");
                        }
                        None => {
                            ui.label(&self.title);
                        }
                    }

                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.add_space(10.);
                        if ui.button("Export HTML").clicked()
                            && let Some(path) = rfd::FileDialog::new()
                                .add_filter("HTML", &["html"])
                                .set_file_name("segments.html")
                                .save_file()
                        {
                            self.status = Some(match self.export_html(&path) {
                                Ok(()) => format!("Exported to {}", path.display()),
                                Err(e) => {
                                    error!("Could not export segments: {}", e);
                                    e.to_string()
                                }
                            });
                        }
                    });
                });
                if let Some(status) = &self.status {
                    ui.label(RichText::new(status).small());
                }
            });
    }

    pub(crate) fn segments_view(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let chart = self.dashboard.chart();
            let labels = chart.labels();
            let chart_height = ui.available_height() * CHART_HEIGHT_RATIO;

            egui_plot::Plot::new("loadTimeChart")
                .height(chart_height)
                .show_background(false)
                .legend(Legend::default())
                .allow_drag(false)
                .allow_scroll(false)
                .allow_zoom(false)
                .include_x(0.)
                .include_y(0.)
                .include_y(chart.max_load_time().unwrap_or(1.))
                .x_axis_formatter(move |mark, _range| {
                    let position = mark.value.round();
                    if (mark.value - position).abs() > f64::EPSILON || position < 0. {
                        return String::new();
                    }
                    labels.get(position as usize).cloned().unwrap_or_default()
                })
                .y_axis_label("Load time (s)")
                .show(ui, |plot_ui| {
                    plot_ui.line(
                        Line::new("Load time", PlotPoints::new(chart.points()))
                            .gradient_color(
                                Arc::new(|point| {
                                    stroke_shade(
                                        Color32::GREEN,
                                        Color32::RED,
                                        (point.y / LOAD_TIME_SHADE_CEILING_S) as f32,
                                    )
                                }),
                                false,
                            )
                            .color(PALETTE_ORANGE),
                    );
                    plot_ui.line(
                        Line::new("Trend", PlotPoints::new(chart.trend_points()))
                            .color(Color32::LIGHT_GRAY),
                    );
                });

            ui.separator();
            ui.label(format!(
                "{} segments, {} delayed",
                self.dashboard.table().len(),
                self.dashboard.table().delayed_count()
            ));

            TableBuilder::new(ui)
                .id_salt("segmentTable")
                .striped(true)
                .resizable(true)
                .cell_layout(Layout::left_to_right(Align::Center))
                .column(Column::remainder().at_least(240.).clip(true))
                .columns(Column::auto().at_least(80.), 3)
                .header(20., |mut header| {
                    for title in ["URL", "Duration (s)", "Load time (s)", "Status"] {
                        header.col(|ui| {
                            ui.strong(title);
                        });
                    }
                })
                .body(|mut body| {
                    for row in self.dashboard.table().rows() {
                        let text_color = if row.delayed {
                            PALETTE_ORANGE
                        } else {
                            Color32::LIGHT_GRAY
                        };
                        body.row(ROW_HEIGHT, |mut table_row| {
                            table_row.col(|ui| {
                                ui.label(RichText::new(&row.url).color(text_color));
                            });
                            table_row.col(|ui| {
                                ui.label(RichText::new(row.duration.to_string()).color(text_color));
                            });
                            table_row.col(|ui| {
                                ui.label(
                                    RichText::new(row.load_time.to_string()).color(text_color),
                                );
                            });
                            table_row.col(|ui| {
                                ui.label(RichText::new(row.status_label()).color(text_color));
                            });
                        });
                    }
                });
        });
    }
}
