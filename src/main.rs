// Image Compressor - pick or drop images, re-save them into a `compressed` folder
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use iced::font::{Family, Weight};
use iced::widget::{button, checkbox, column, container, pick_list, row, scrollable, slider, text, Space};
use iced::{executor, subscription, window, Application, Command, Element, Event, Font, Length, Settings, Subscription, Theme};
use image_compressor::{
    expand_inputs, process_files, BatchReport, CompressionSettings, FileStatus, OutputFormat, Quality,
};
use log::LevelFilter;
use std::path::PathBuf;

const HEADING_FONT: Font = Font {
    family: Family::SansSerif,
    weight: Weight::Bold,
    stretch: iced::font::Stretch::Normal,
    monospaced: false,
};

const BODY_FONT: Font = Font {
    family: Family::SansSerif,
    weight: Weight::Normal,
    stretch: iced::font::Stretch::Normal,
    monospaced: false,
};

const FORMATS: &[OutputFormat] = &OutputFormat::ALL;

const DROP_PLACEHOLDER: &str = "Drag and drop files here...";
const STATUS_PLACEHOLDER: &str = "Select or drop images to compress them.";

pub fn main() -> iced::Result {
    env_logger::Builder::new()
        .filter_level(LevelFilter::Info)
        .parse_default_env()
        .format_timestamp(None)
        .init();

    ImageCompressor::run(Settings {
        window: iced::window::Settings {
            size: (480, 600),
            min_size: Some((420, 520)),
            resizable: true,
            decorations: true,
            ..Default::default()
        },
        default_font: BODY_FONT,
        default_text_size: 14.0,
        ..Default::default()
    })
}

#[derive(Default)]
struct ImageCompressor {
    quality: u8,
    format: OutputFormat,
    optimize: bool,
    overwrite: bool,
    // Files of the drag gesture currently being delivered
    dropped: Vec<PathBuf>,
    drop_pending: bool,
    drop_text: String,
    is_processing: bool,
    status_message: String,
    last_output_dir: Option<PathBuf>,
    results: Vec<ProcessResult>,
}

#[derive(Debug, Clone)]
enum Message {
    SelectFiles,
    FilesSelected(Option<Vec<PathBuf>>),
    FileDropped(PathBuf),
    DropFinished,
    QualityChanged(u8),
    FormatSelected(OutputFormat),
    OptimizeToggled(bool),
    OverwriteToggled(bool),
    ProcessingComplete(String, Vec<ProcessResult>),
    OpenOutputFolder,
    ClearResults,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ResultKind {
    Compressed,
    Skipped,
    Failed,
}

#[derive(Debug, Clone)]
struct ProcessResult {
    filename: String,
    output: Option<PathBuf>,
    original_size: u64,
    new_size: u64,
    kind: ResultKind,
    message: String,
}

impl Application for ImageCompressor {
    type Message = Message;
    type Theme = Theme;
    type Executor = executor::Default;
    type Flags = ();

    fn new(_flags: ()) -> (Self, Command<Message>) {
        let defaults = CompressionSettings::default();
        let app = Self {
            quality: defaults.quality.get(),
            format: defaults.format,
            optimize: defaults.optimize,
            overwrite: defaults.overwrite,
            drop_text: DROP_PLACEHOLDER.to_string(),
            status_message: STATUS_PLACEHOLDER.to_string(),
            ..Self::default()
        };
        (app, Command::none())
    }

    fn title(&self) -> String {
        String::from("Image Compressor")
    }

    fn update(&mut self, message: Message) -> Command<Message> {
        match message {
            Message::SelectFiles => {
                return Command::perform(select_files(), Message::FilesSelected);
            }
            Message::FilesSelected(Some(paths)) => {
                return self.start_batch(paths);
            }
            Message::FilesSelected(None) => {}
            Message::FileDropped(path) => {
                // One drag delivers one event per file; gather them before starting.
                self.dropped.push(path);
                if !self.drop_pending {
                    self.drop_pending = true;
                    return Command::perform(async {}, |_| Message::DropFinished);
                }
            }
            Message::DropFinished => {
                self.drop_pending = false;
                let paths = std::mem::take(&mut self.dropped);
                if !self.is_processing {
                    self.drop_text = paths
                        .iter()
                        .map(|p| p.display().to_string())
                        .collect::<Vec<_>>()
                        .join("\n");
                }
                return self.start_batch(paths);
            }
            Message::QualityChanged(quality) => {
                self.quality = quality;
            }
            Message::FormatSelected(format) => {
                self.format = format;
            }
            Message::OptimizeToggled(value) => {
                self.optimize = value;
            }
            Message::OverwriteToggled(value) => {
                self.overwrite = value;
            }
            Message::ProcessingComplete(summary, results) => {
                self.is_processing = false;
                self.status_message = summary;
                self.last_output_dir = results
                    .iter()
                    .filter_map(|r| r.output.as_ref())
                    .find_map(|p| p.parent().map(|dir| dir.to_path_buf()));
                self.results = results;
            }
            Message::OpenOutputFolder => {
                if let Some(dir) = &self.last_output_dir {
                    if let Err(e) = open::that(dir) {
                        log::warn!("Could not open {}: {}", dir.display(), e);
                    }
                }
            }
            Message::ClearResults => {
                self.results.clear();
                self.drop_text = DROP_PLACEHOLDER.to_string();
                self.status_message = STATUS_PLACEHOLDER.to_string();
            }
        }
        Command::none()
    }

    fn subscription(&self) -> Subscription<Message> {
        subscription::events_with(|event, _status| match event {
            Event::Window(window::Event::FileDropped(path)) => Some(Message::FileDropped(path)),
            _ => None,
        })
    }

    fn view(&self) -> Element<Message> {
        let title = text("Image Compressor")
            .size(22)
            .font(HEADING_FONT);

        let select_button = if self.is_processing {
            button("Select Images").padding([6, 12])
        } else {
            button("Select Images")
                .on_press(Message::SelectFiles)
                .padding([6, 12])
        };

        let quality_section = column![
            row![
                text(Quality::MIN).size(13).font(BODY_FONT),
                slider(Quality::MIN..=Quality::MAX, self.quality, Message::QualityChanged)
                    .width(Length::Fill),
                text(Quality::MAX).size(13).font(BODY_FONT),
            ]
            .spacing(8),
            text(format!("Quality: {}%", self.quality))
                .size(13)
                .font(BODY_FONT),
        ]
        .spacing(4);

        let format_section = column![
            row![
                text("Format:")
                    .size(13)
                    .font(BODY_FONT)
                    .width(80),
                pick_list(FORMATS, Some(self.format), Message::FormatSelected),
            ]
            .spacing(8),
            if self.format.supports_quality() {
                text("")
            } else {
                text(format!("{} is lossless, quality is ignored", self.format))
                    .size(12)
                    .font(BODY_FONT)
            },
        ]
        .spacing(4);

        let options = row![
            checkbox("Optimize", self.optimize, Message::OptimizeToggled)
                .size(13)
                .spacing(8),
            checkbox("Overwrite existing", self.overwrite, Message::OverwriteToggled)
                .size(13)
                .spacing(8),
        ]
        .spacing(16);

        let drop_area = container(scrollable(
            text(&self.drop_text).size(12).font(BODY_FONT),
        ))
        .width(Length::Fill)
        .height(Length::Fixed(110.0))
        .padding(8)
        .style(iced::theme::Container::Box);

        let status = if self.is_processing {
            text("Compressing...").size(13).font(BODY_FONT)
        } else {
            text(&self.status_message).size(13).font(BODY_FONT)
        };

        let results_section = if !self.results.is_empty() {
            let results_list: Vec<Element<Message>> = self
                .results
                .iter()
                .map(|result| {
                    let label = match result.kind {
                        ResultKind::Compressed => "[OK]",
                        ResultKind::Skipped => "[SKIP]",
                        ResultKind::Failed => "[FAIL]",
                    };

                    row![
                        text(label)
                            .size(12)
                            .font(if result.kind == ResultKind::Failed { HEADING_FONT } else { BODY_FONT })
                            .width(48),
                        text(&result.filename)
                            .size(12)
                            .font(BODY_FONT)
                            .width(Length::Fill),
                        if result.kind == ResultKind::Compressed {
                            text(size_change(result.original_size, result.new_size))
                            .size(12)
                            .font(BODY_FONT)
                        } else {
                            text(&result.message).size(12).font(BODY_FONT)
                        }
                    ]
                    .spacing(8)
                    .into()
                })
                .collect();

            let open_button = if self.last_output_dir.is_some() {
                button("Open Output")
                    .on_press(Message::OpenOutputFolder)
                    .padding([6, 12])
            } else {
                button("Open Output").padding([6, 12])
            };

            column![
                text("Results")
                    .size(16)
                    .font(HEADING_FONT),
                container(scrollable(column(results_list).spacing(3)).height(Length::Fixed(100.0)))
                    .style(iced::theme::Container::Box)
                    .padding(8),
                row![
                    open_button,
                    button("Clear")
                        .on_press(Message::ClearResults)
                        .padding([6, 12]),
                ]
                .spacing(8)
            ]
            .spacing(8)
        } else {
            column![]
        };

        let content = column![
            title,
            Space::with_height(12),
            select_button,
            Space::with_height(12),
            quality_section,
            Space::with_height(8),
            format_section,
            Space::with_height(8),
            options,
            Space::with_height(12),
            drop_area,
            Space::with_height(8),
            status,
            Space::with_height(12),
            results_section,
        ]
        .padding(16);

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn theme(&self) -> Theme {
        Theme::Light
    }
}

impl ImageCompressor {
    /// Control values as they are right now. A running batch keeps its own copy.
    fn settings(&self) -> CompressionSettings {
        CompressionSettings {
            quality: Quality::clamped(self.quality),
            format: self.format,
            optimize: self.optimize,
            overwrite: self.overwrite,
        }
    }

    fn start_batch(&mut self, paths: Vec<PathBuf>) -> Command<Message> {
        if paths.is_empty() {
            return Command::none();
        }
        if self.is_processing {
            log::warn!("A batch is already running, ignoring {} file(s)", paths.len());
            return Command::none();
        }

        self.is_processing = true;
        self.results.clear();

        Command::perform(compress_batch(paths, self.settings()), |(summary, results)| {
            Message::ProcessingComplete(summary, results)
        })
    }
}

async fn select_files() -> Option<Vec<PathBuf>> {
    rfd::AsyncFileDialog::new()
        .add_filter("Images", &["jpg", "jpeg", "png", "gif", "bmp", "webp", "tif", "tiff"])
        .pick_files()
        .await
        .map(|handles| handles.iter().map(|h| h.path().to_path_buf()).collect())
}

async fn compress_batch(
    paths: Vec<PathBuf>,
    settings: CompressionSettings,
) -> (String, Vec<ProcessResult>) {
    tokio::task::spawn_blocking(move || {
        let files = expand_inputs(&paths);
        let report = process_files(&files, &settings);
        (report.summary(), to_process_results(&report))
    })
    .await
    .unwrap_or_else(|e| {
        log::error!("Compression worker stopped: {}", e);
        ("Compression stopped unexpectedly.".to_string(), Vec::new())
    })
}

fn to_process_results(report: &BatchReport) -> Vec<ProcessResult> {
    report
        .outcomes
        .iter()
        .map(|outcome| {
            let filename = outcome
                .source
                .file_name()
                .unwrap_or(outcome.source.as_os_str())
                .to_string_lossy()
                .to_string();

            let (kind, original_size, new_size, message) = match &outcome.status {
                FileStatus::Compressed(result) => (
                    ResultKind::Compressed,
                    result.original_size,
                    result.compressed_size,
                    String::new(),
                ),
                FileStatus::Skipped => (ResultKind::Skipped, 0, 0, "Output exists".to_string()),
                FileStatus::Failed(e) => (ResultKind::Failed, 0, 0, e.to_string()),
            };

            ProcessResult {
                filename,
                output: outcome.output.clone(),
                original_size,
                new_size,
                kind,
                message,
            }
        })
        .collect()
}

fn size_change(original: u64, compressed: u64) -> String {
    format!("{} -> {}", format_size(original), format_size(compressed))
}

fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_change_is_plain_ascii() {
        let label = size_change(2048, 900);
        assert_eq!(label, "2.0 KB -> 900 B");
        assert!(label.is_ascii());
    }
}
