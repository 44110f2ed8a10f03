mod archive;
mod config;
mod error;
mod navigator;
mod progress;
mod sanitize;
mod thumbnail;

use iced::{
    widget::{button, column, container, image, row, scrollable, text, text_input, text_input::Id},
    Element, Length, Task, Theme, Subscription, Color, ContentFit,
    time, clipboard,
    keyboard::{self, Key},
    event::{self, Event as IcedEvent},
    alignment, Padding,
    window,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing_subscriber::EnvFilter;

use archive::{NasaArchive, SearchClient};
use error::ViewerError;
use navigator::{Navigator, Position, ResolvedItem};
use progress::Kind;

const TITLE: &str = "Nasa Archive Image Viewer";

fn init_logging() {
    let filter = EnvFilter::try_from_env("NASA_VIEWER_LOG")
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> iced::Result {
    init_logging();
    let config = config::Config::load();

    iced::application(TITLE, App::update, App::view)
        .theme(App::theme)
        .subscription(App::subscription)
        .window(window::Settings {
            size: iced::Size::new(config.window.width as f32, config.window.height as f32),
            min_size: Some(iced::Size::new(
                config.window.min_width as f32,
                config.window.min_height as f32,
            )),
            position: window::Position::Centered,
            ..Default::default()
        })
        .run_with(move || App::new(config))
}

#[derive(Debug, Clone, Copy)]
enum Command {
    Search,
    Forward,
    Back,
}

/// Navigator state captured when a command finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NavState {
    position: Option<Position>,
    at_start: bool,
    at_end: bool,
}

impl NavState {
    fn of(navigator: &Navigator) -> Self {
        NavState {
            position: navigator.position(),
            at_start: navigator.at_start(),
            at_end: navigator.at_end(),
        }
    }
}

impl Default for NavState {
    fn default() -> Self {
        NavState {
            position: None,
            at_start: true,
            at_end: true,
        }
    }
}

#[derive(Debug, Clone)]
enum Message {
    InputChanged(String),
    Submit,
    Forward,
    Back,
    Navigated {
        command: Command,
        result: Result<ResolvedItem, ViewerError>,
        nav: NavState,
    },
    Tick,
    CopyDescription,
    Exit,
}

struct App {
    input_text: String,
    description: String,
    image: Option<image::Handle>,
    image_summary: Option<thumbnail::ImageSummary>,
    nav: NavState,
    status: Option<String>,
    is_loading: bool,
    loading_frame: usize,
    search_client: Arc<dyn SearchClient>,
    navigator: Arc<Mutex<Navigator>>,
    input_id: Id,
}

impl App {
    fn new(config: config::Config) -> (Self, Task<Message>) {
        let archive = Arc::new(NasaArchive::with_config(&config.archive));
        progress::log(format!("Using archive at {}", config.archive.search_url));

        let input_id = Id::unique();

        let app = App {
            input_text: String::new(),
            description: String::new(),
            image: None,
            image_summary: None,
            nav: NavState::default(),
            status: None,
            is_loading: false,
            loading_frame: 0,
            search_client: archive.clone(),
            navigator: Arc::new(Mutex::new(Navigator::new(archive))),
            input_id: input_id.clone(),
        };

        (app, text_input::focus(input_id))
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::InputChanged(value) => {
                self.input_text = value;
                Task::none()
            }
            Message::Submit => {
                let query = self.input_text.trim().to_string();
                if query.is_empty() || self.is_loading {
                    return Task::none();
                }

                self.begin_command();
                let client = self.search_client.clone();
                let navigator = self.navigator.clone();

                Task::future(async move {
                    let mut navigator = navigator.lock().await;
                    let result = navigator.search(client.as_ref(), &query).await;

                    Message::Navigated {
                        command: Command::Search,
                        result,
                        nav: NavState::of(&navigator),
                    }
                })
            }
            Message::Forward => self.navigate(Command::Forward),
            Message::Back => self.navigate(Command::Back),
            Message::Navigated { command, result, nav } => {
                self.finish_command(command, result, nav);
                Task::none()
            }
            Message::Tick => {
                if self.is_loading {
                    self.loading_frame = (self.loading_frame + 1) % 60; // 10 frames * 6 messages
                }
                Task::none()
            }
            Message::CopyDescription => {
                clipboard::write(self.description.clone())
            }
            Message::Exit => {
                iced::exit()
            }
        }
    }

    fn navigate(&mut self, command: Command) -> Task<Message> {
        if self.is_loading {
            return Task::none();
        }

        self.begin_command();
        let navigator = self.navigator.clone();

        Task::future(async move {
            let mut navigator = navigator.lock().await;
            let result = match command {
                Command::Forward => navigator.advance().await,
                Command::Back => navigator.retreat().await,
                Command::Search => unreachable!("searches are started by Message::Submit"),
            };

            Message::Navigated {
                command,
                result,
                nav: NavState::of(&navigator),
            }
        })
    }

    fn finish_command(&mut self, command: Command, result: Result<ResolvedItem, ViewerError>, nav: NavState) {
        self.is_loading = false;
        let replaced = nav.position.map(|p| p.generation) != self.nav.position.map(|p| p.generation);
        self.nav = nav;

        match result {
            Ok(item) => {
                self.image_summary = thumbnail::probe(&item.image_bytes);
                self.image = Some(image::Handle::from_bytes(item.image_bytes));
                self.description = item.text;
                self.status = None;
            }
            Err(e) => {
                progress::log_with(Kind::Error, format!("{:?} failed: {}", command, e));
                // New results loaded but their first image failed: drop the old search's content.
                if replaced {
                    self.description.clear();
                    self.image = None;
                    self.image_summary = None;
                }
                self.status = Some(e.to_string());
            }
        }
    }

    fn begin_command(&mut self) {
        self.is_loading = true;
        self.loading_frame = 0;
        self.status = None;
    }

    fn subscription(&self) -> Subscription<Message> {
        let timer = if self.is_loading {
            time::every(Duration::from_millis(80)).map(|_| Message::Tick)
        } else {
            Subscription::none()
        };

        let events = event::listen_with(|event, _status, _id| {
            if let IcedEvent::Keyboard(keyboard::Event::KeyPressed {
                key: Key::Named(keyboard::key::Named::Escape),
                ..
            }) = event
            {
                Some(Message::Exit)
            } else {
                None
            }
        });

        Subscription::batch([timer, events])
    }

    fn view(&self) -> Element<Message> {
        let prompt = text("What pictures are you looking for? (eg. Earth):")
            .size(20)
            .width(Length::Fill)
            .align_x(alignment::Horizontal::Center);

        let mut input = text_input("Earth", &self.input_text)
            .padding(10)
            .size(16)
            .width(Length::Fixed(400.0))
            .id(self.input_id.clone());
        let mut search_button = button(text("SEARCH")).padding(10);
        if !self.is_loading {
            input = input
                .on_input(Message::InputChanged)
                .on_submit(Message::Submit);
            search_button = search_button.on_press(Message::Submit);
        }

        let search_area = column![
            prompt,
            container(row![input, search_button].spacing(10))
                .width(Length::Fill)
                .align_x(alignment::Horizontal::Center),
        ]
        .spacing(15);

        let image_view = container(self.image_area())
            .width(Length::Fill)
            .height(Length::Fixed(500.0))
            .align_x(alignment::Horizontal::Center)
            .align_y(alignment::Vertical::Center)
            .style(|_: &Theme| container::Style {
                background: Some(Color::BLACK.into()),
                ..Default::default()
            });

        let description_title = text("Information About The Image:")
            .size(20)
            .width(Length::Fill)
            .align_x(alignment::Horizontal::Center);

        let description_box = container(
            scrollable(
                container(text(self.description.clone()).size(15))
                    .padding(15)
                    .width(Length::Fill),
            )
            .height(Length::Fill),
        )
        .width(Length::Fill)
        .height(Length::Fixed(200.0))
        .style(container::bordered_box);

        let idle = !self.is_loading;
        let back = button(text("BACK"))
            .padding(10)
            .on_press_maybe((idle && !self.nav.at_start).then_some(Message::Back));
        let forward = button(text("FORWARD"))
            .padding(10)
            .on_press_maybe((idle && !self.nav.at_end).then_some(Message::Forward));

        let mut nav_row = row![back, forward].spacing(20);
        if !self.description.is_empty() && idle {
            nav_row = nav_row.push(
                button(text("[Copy]").size(14))
                    .on_press(Message::CopyDescription)
                    .padding(10),
            );
        }

        let content_column = column![
            search_area,
            image_view,
            description_title,
            description_box,
            container(nav_row)
                .width(Length::Fill)
                .align_x(alignment::Horizontal::Center),
            self.status_bar(),
        ]
        .spacing(10)
        .padding(Padding::from([10, 20]));

        container(content_column)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn image_area(&self) -> Element<Message> {
        if self.is_loading {
            let loading_frames = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
            let loading_messages = [
                "Contacting the archive...",
                "Scanning the skies...",
                "Pointing the telescope...",
                "Waiting for downlink...",
                "Developing the film...",
                "Adjusting the focus...",
            ];

            let message_idx = (self.loading_frame / 10) % loading_messages.len();
            let spinner_idx = self.loading_frame % loading_frames.len();

            column![
                text(loading_frames[spinner_idx]).size(32).color(Color::WHITE),
                text(loading_messages[message_idx]).size(15).color(Color::WHITE),
            ]
            .spacing(10)
            .align_x(alignment::Horizontal::Center)
            .into()
        } else if let Some(handle) = &self.image {
            image(handle.clone())
                .content_fit(ContentFit::Contain)
                .width(Length::Fill)
                .height(Length::Fill)
                .into()
        } else {
            text("").into()
        }
    }

    fn status_bar(&self) -> Element<Message> {
        let mut summary = String::new();
        if let Some(position) = self.nav.position {
            summary = format!("Image {} of {}", position.index + 1, position.len);
            if let Some(total) = position.total_hits {
                summary.push_str(&format!(" ({} total hits)", total));
            }
        }
        if let Some(image_summary) = &self.image_summary {
            if !summary.is_empty() {
                summary.push_str(" | ");
            }
            summary.push_str(&image_summary.to_string());
        }

        let mut lines = column![text(summary).size(13)].spacing(2);
        if let Some(status) = &self.status {
            lines = lines.push(text(status.clone()).size(14).color(Color::from_rgb(0.9, 0.4, 0.4)));
        }
        for entry in progress::recent(3) {
            lines = lines.push(
                text(format!("[{}] {}", entry.kind.label(), entry.text))
                    .size(12)
                    .color(Color::from_rgb(0.6, 0.6, 0.6)),
            );
        }
        lines.into()
    }

    fn theme(&self) -> Theme {
        Theme::TokyoNight
    }
}
