//! Parley Desktop: egui app state and UI.

use crate::blocks;
use eframe::egui;
use lib::channel;
use lib::config::{self, ModeConfig};
use lib::history::HistoryClient;
use lib::ui::{Coordinator, Effect, EffectRunner, UiEvent, View};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;
use tokio::sync::mpsc;

const INPUT_HEIGHT: f32 = 60.0;
const SIDEBAR_WIDTH: f32 = 260.0;
const LOG_BUFFER_MAX_LINES: usize = 2000;
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Ring buffer of log lines for the Logs window. Written by DesktopLogger.
static LOG_LINES: OnceLock<Mutex<VecDeque<String>>> = OnceLock::new();

fn log_buffer() -> &'static Mutex<VecDeque<String>> {
    LOG_LINES.get_or_init(|| Mutex::new(VecDeque::new()))
}

fn push_log_line(line: String) {
    if let Ok(mut buf) = log_buffer().lock() {
        buf.push_back(line);
        while buf.len() > LOG_BUFFER_MAX_LINES {
            buf.pop_front();
        }
    }
}

/// Logger that appends to LOG_LINES for display in the Logs window.
struct DesktopLogger;

impl log::Log for DesktopLogger {
    fn enabled(&self, _: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        let line = format!(
            "{} [{}] {}",
            chrono::Local::now().format("%H:%M:%S%.3f"),
            record.level(),
            record.args()
        );
        push_log_line(line);
    }

    fn flush(&self) {}
}

static LOGGER: DesktopLogger = DesktopLogger;

pub fn install_logger() {
    let _ = log_buffer();
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(log::LevelFilter::Debug);
}

/// Runtime, realtime channel and history client behind the window.
pub struct Backend {
    /// Owns the worker threads; dropped with the app.
    _runtime: tokio::runtime::Runtime,
    runner: EffectRunner<HistoryClient>,
    history: Arc<HistoryClient>,
    events: mpsc::UnboundedReceiver<UiEvent>,
    modes: Vec<ModeConfig>,
}

impl Backend {
    pub fn start(config_path: Option<PathBuf>) -> anyhow::Result<Self> {
        let (config, path) = config::load_config(config_path)?;
        log::info!("loaded config from {}", path.display());
        let base_url = config::resolve_server_url(&config);
        let history = Arc::new(HistoryClient::new(&base_url)?);

        let runtime = tokio::runtime::Runtime::new()?;
        let (tx, events) = mpsc::unbounded_channel::<UiEvent>();
        log::info!("connecting to {}", base_url);
        let sender = channel::spawn(runtime.handle(), base_url.clone(), tx.clone());
        let runner = EffectRunner::new(Arc::clone(&history), sender, tx, runtime.handle().clone());

        Ok(Self {
            _runtime: runtime,
            runner,
            history,
            events,
            modes: config.modes,
        })
    }
}

/// Modal prompts raised by host effects.
enum Dialog {
    Rename { id: String, name: String },
    Delete { id: String, name: String },
}

pub struct ParleyApp {
    backend: Backend,
    coordinator: Coordinator,
    dialog: Option<Dialog>,
    /// Move keyboard focus to the input box on the next frame.
    focus_input: bool,
    scroll_to_bottom: bool,
    show_logs: bool,
}

impl ParleyApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, backend: Backend) -> Self {
        log::info!("desktop started");
        let mut app = Self {
            backend,
            coordinator: Coordinator::new(),
            dialog: None,
            focus_input: false,
            scroll_to_bottom: false,
            show_logs: false,
        };
        let init = app.coordinator.init();
        for effect in app.backend.runner.run(init) {
            log::debug!("ignoring startup effect {:?}", effect);
        }
        app
    }

    fn dispatch(&mut self, ctx: &egui::Context, event: UiEvent) {
        let effects = self.coordinator.dispatch(event);
        let host = self.backend.runner.run(effects);
        for effect in host {
            self.host_effect(ctx, effect);
        }
    }

    fn host_effect(&mut self, ctx: &egui::Context, effect: Effect) {
        match effect {
            Effect::PromptRename { id, current_name } => {
                self.dialog = Some(Dialog::Rename {
                    id,
                    name: current_name,
                })
            }
            Effect::ConfirmDelete { id, name } => self.dialog = Some(Dialog::Delete { id, name }),
            Effect::Download(id) => {
                let url = self.backend.history.download_url(&id).to_string();
                log::info!("opening {}", url);
                ctx.output_mut(|o| o.open_url = Some(egui::output::OpenUrl::new_tab(url)));
            }
            Effect::FocusInput => self.focus_input = true,
            Effect::ScrollToBottom => self.scroll_to_bottom = true,
            other => log::warn!("host cannot run {:?}", other),
        }
    }

    /// Drain results and realtime events queued by the runtime.
    fn poll_events(&mut self, ctx: &egui::Context) {
        loop {
            match self.backend.events.try_recv() {
                Ok(event) => self.dispatch(ctx, event),
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => break,
            }
        }
    }
}

fn ui_header(ui: &mut egui::Ui, view: &View<'_>, show_logs: &mut bool, actions: &mut Vec<UiEvent>) {
    egui::Frame::none()
        .inner_margin(egui::Margin::symmetric(16.0, 0.0))
        .show(ui, |ui| {
            ui.add_space(10.0);
            ui.horizontal(|ui| {
                let toggle = if view.sidebar.collapsed { "☰" } else { "⟨" };
                if ui.button(toggle).on_hover_text("Toggle history").clicked() {
                    actions.push(UiEvent::ToggleSidebar);
                }
                if view.back_visible && ui.button("← Back").clicked() {
                    actions.push(UiEvent::ReturnToMenu);
                }
                ui.heading("Parley");
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.selectable_label(*show_logs, "Logs").clicked() {
                        *show_logs = !*show_logs;
                    }
                    ui.label(egui::RichText::new(&view.status).weak());
                });
            });
            ui.add_space(10.0);
        });
}

/// History list. Returns the rectangles that count as "inside a menu" for click-outside detection.
fn ui_sidebar(ctx: &egui::Context, ui: &mut egui::Ui, view: &View<'_>, actions: &mut Vec<UiEvent>) -> Vec<egui::Rect> {
    let mut menu_rects = Vec::new();
    ui.add_space(16.0);
    ui.horizontal(|ui| {
        ui.heading("History");
        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.small_button("⟳").on_hover_text("Refresh").clicked() {
                actions.push(UiEvent::RefreshSessions);
            }
        });
    });
    ui.add_space(8.0);
    if view.sidebar.items.is_empty() {
        ui.label(egui::RichText::new("No sessions yet.").weak());
    }
    egui::ScrollArea::vertical().show(ui, |ui| {
        for item in &view.sidebar.items {
            ui.horizontal(|ui| {
                let menu = ui.small_button("⋮");
                menu_rects.push(menu.rect);
                if menu.clicked() {
                    actions.push(UiEvent::ToggleMenu(item.id.to_string()));
                }
                ui.vertical(|ui| {
                    let label = ui.add_enabled(
                        view.sidebar.selectable,
                        egui::SelectableLabel::new(item.loading, item.name),
                    );
                    if label.clicked() {
                        actions.push(UiEvent::OpenSession(item.id.to_string()));
                    }
                    ui.label(egui::RichText::new(&item.time_label).small().weak());
                });
                if item.loading {
                    ui.spinner();
                }

                if item.menu_open {
                    let area = egui::Area::new(egui::Id::new(("session_menu", item.id)))
                        .order(egui::Order::Foreground)
                        .fixed_pos(menu.rect.left_bottom())
                        .show(ctx, |ui| {
                            egui::Frame::popup(ui.style()).show(ui, |ui| {
                                if ui.button("Rename").clicked() {
                                    actions.push(UiEvent::RenameRequested(item.id.to_string()));
                                }
                                if ui.button("Delete").clicked() {
                                    actions.push(UiEvent::DeleteRequested(item.id.to_string()));
                                }
                                if ui.button("Download").clicked() {
                                    actions.push(UiEvent::DownloadRequested(item.id.to_string()));
                                }
                            });
                        });
                    menu_rects.push(area.response.rect);
                }
            });
            ui.add_space(6.0);
        }
    });
    menu_rects
}

fn ui_mode_menu(ui: &mut egui::Ui, modes: &[ModeConfig], actions: &mut Vec<UiEvent>) {
    ui.add_space(24.0);
    ui.heading("Select a mode");
    ui.add_space(12.0);
    for mode in modes {
        let button = egui::Button::new(format!("{}. {}", mode.id, mode.label));
        if ui.add_sized([320.0, 32.0], button).clicked() {
            actions.push(UiEvent::StartMode(mode.id.clone()));
        }
        ui.add_space(6.0);
    }
}

fn ui_transcript(ui: &mut egui::Ui, view: &View<'_>, flags: (&mut bool, &mut bool), actions: &mut Vec<UiEvent>) {
    let (scroll_to_bottom, focus_input) = flags;
    let input_height = if view.input.is_some() { INPUT_HEIGHT + 16.0 } else { 0.0 };
    let messages_height = (ui.available_height() - input_height).max(80.0);

    egui::ScrollArea::vertical()
        .max_height(messages_height)
        .stick_to_bottom(true)
        .auto_shrink([false, false])
        .show(ui, |ui| {
            for m in view.transcript {
                blocks::message(ui, m);
                ui.add_space(8.0);
            }
            if std::mem::take(scroll_to_bottom) {
                ui.scroll_to_cursor(Some(egui::Align::BOTTOM));
            }
        });

    let Some(input) = &view.input else {
        return;
    };
    ui.add_space(8.0);
    ui.horizontal(|ui| {
        ui.label(egui::RichText::new(input.prompt).strong());
        let mut text = input.text.to_string();
        let edit = ui.add_sized(
            [ui.available_width() - 80.0, INPUT_HEIGHT],
            egui::TextEdit::multiline(&mut text).hint_text("Shift+Enter for a new line"),
        );
        if std::mem::take(focus_input) {
            edit.request_focus();
        }
        let enter = edit.has_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter) && !i.modifiers.shift);
        if enter {
            // The multiline edit already inserted the newline.
            if text.ends_with('\n') {
                text.pop();
            }
        }
        if text != input.text {
            actions.push(UiEvent::InputChanged(text));
        }
        if ui.button("Send").clicked() || enter {
            actions.push(UiEvent::SubmitInput);
        }
    });
}

fn ui_logs(ctx: &egui::Context, open: &mut bool) {
    let lines: Vec<String> = log_buffer()
        .lock()
        .map(|b| b.iter().cloned().collect())
        .unwrap_or_default();
    egui::Window::new("Logs")
        .open(open)
        .default_size([640.0, 360.0])
        .show(ctx, |ui| {
            egui::ScrollArea::vertical().stick_to_bottom(true).show(ui, |ui| {
                for line in &lines {
                    ui.label(egui::RichText::new(line.as_str()).family(egui::FontFamily::Monospace));
                }
                if lines.is_empty() {
                    ui.label("No log output yet.");
                }
            });
        });
}

/// Draws the open dialog; returns the answer once the user picks one.
fn ui_dialog(ctx: &egui::Context, dialog: &mut Dialog) -> Option<UiEvent> {
    let mut answer = None;
    match dialog {
        Dialog::Rename { id, name } => {
            egui::Window::new("Rename session")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    let edit = ui.text_edit_singleline(name);
                    edit.request_focus();
                    let enter = ui.input(|i| i.key_pressed(egui::Key::Enter));
                    ui.horizontal(|ui| {
                        if ui.button("Rename").clicked() || enter {
                            answer = Some(UiEvent::RenameEntered {
                                id: id.clone(),
                                name: Some(name.clone()),
                            });
                        }
                        if ui.button("Cancel").clicked() {
                            answer = Some(UiEvent::RenameEntered {
                                id: id.clone(),
                                name: None,
                            });
                        }
                    });
                });
        }
        Dialog::Delete { id, name } => {
            egui::Window::new("Delete session")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.label(format!("Delete \"{}\"? This cannot be undone.", name));
                    ui.add_space(8.0);
                    ui.horizontal(|ui| {
                        if ui.button("Delete").clicked() {
                            answer = Some(UiEvent::DeleteConfirmed {
                                id: id.clone(),
                                confirmed: true,
                            });
                        }
                        if ui.button("Cancel").clicked() {
                            answer = Some(UiEvent::DeleteConfirmed {
                                id: id.clone(),
                                confirmed: false,
                            });
                        }
                    });
                });
        }
    }
    answer
}

impl eframe::App for ParleyApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_events(ctx);

        let mut actions = Vec::new();
        let menu_open = self.coordinator.state().open_menu.is_some();
        let mut menu_rects = Vec::new();
        {
            let view = self.coordinator.view();

            egui::TopBottomPanel::top("header").show(ctx, |ui| {
                ui_header(ui, &view, &mut self.show_logs, &mut actions);
            });

            if !view.sidebar.collapsed {
                egui::SidePanel::left("history")
                    .resizable(false)
                    .exact_width(SIDEBAR_WIDTH)
                    .show(ctx, |ui| {
                        menu_rects = ui_sidebar(ctx, ui, &view, &mut actions);
                    });
            }

            egui::CentralPanel::default().show(ctx, |ui| {
                egui::Frame::none()
                    .inner_margin(egui::Margin::symmetric(24.0, 0.0))
                    .show(ui, |ui| {
                        if let Some(notice) = view.notice {
                            ui.add_space(8.0);
                            ui.horizontal(|ui| {
                                ui.colored_label(egui::Color32::RED, notice);
                                if ui.small_button("Dismiss").clicked() {
                                    actions.push(UiEvent::DismissNotice);
                                }
                            });
                        }
                        if view.menu_overlay {
                            ui_mode_menu(ui, &self.backend.modes, &mut actions);
                        } else {
                            ui.add_space(16.0);
                            ui_transcript(
                                ui,
                                &view,
                                (&mut self.scroll_to_bottom, &mut self.focus_input),
                                &mut actions,
                            );
                        }
                    });
            });
        }

        if menu_open && ctx.input(|i| i.pointer.any_click()) {
            let pos = ctx.input(|i| i.pointer.interact_pos());
            if pos.map_or(true, |p| !menu_rects.iter().any(|r| r.contains(p))) {
                actions.push(UiEvent::ClickOutside);
            }
        }

        if let Some(dialog) = self.dialog.as_mut() {
            if let Some(answer) = ui_dialog(ctx, dialog) {
                self.dialog = None;
                actions.push(answer);
            }
        }
        ui_logs(ctx, &mut self.show_logs);

        for action in actions {
            self.dispatch(ctx, action);
        }
        ctx.request_repaint_after(POLL_INTERVAL);
    }
}
