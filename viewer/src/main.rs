use dashcore::auth::SessionId;
use dashcore::processing::charts::{ChartSpec, Trace, HEATMAP_HEIGHT};
use dashcore::{Event, ViewState};
use iced::{
    mouse,
    widget::{
        button,
        canvas::{self, Canvas, Frame, Geometry, Path, Stroke},
        column, row, text, text_input, Column, Container,
    },
    Color, Element, Length, Point, Rectangle, Renderer, Size, Task, Theme,
};
use serde::{Deserialize, Serialize};

const DEFAULT_BRIDGE: &str = "http://127.0.0.1:9000";

fn main() -> iced::Result {
    iced::application(Viewer::boot, Viewer::update, Viewer::view)
        .title(application_title)
        .theme(application_theme)
        .run()
}

fn application_title(_: &Viewer) -> String {
    "Vision Dashboard".into()
}

fn application_theme(_: &Viewer) -> Theme {
    Theme::Dark
}

fn bridge_url() -> String {
    std::env::var("DASHBOARD_BRIDGE").unwrap_or_else(|_| DEFAULT_BRIDGE.into())
}

#[derive(Debug)]
struct Viewer {
    bridge: String,
    session: Option<SessionId>,
    username: String,
    password: String,
    view: ViewState,
    status: String,
    processing: bool,
}

#[derive(Debug, Clone)]
enum Message {
    SessionOpened(Result<SessionId, String>),
    UsernameChanged(String),
    PasswordChanged(String),
    LoginPressed,
    RegisterPressed,
    ProcessPressed,
    ViewReceived(Result<ViewState, String>),
}

impl Viewer {
    fn boot() -> (Self, Task<Message>) {
        let bridge = bridge_url();
        (
            Viewer {
                bridge: bridge.clone(),
                session: None,
                username: String::new(),
                password: String::new(),
                view: ViewState::idle(),
                status: format!("Connecting to {bridge}..."),
                processing: false,
            },
            Task::perform(open_session(bridge), Message::SessionOpened),
        )
    }

    fn update(state: &mut Self, message: Message) -> Task<Message> {
        match message {
            Message::SessionOpened(Ok(session)) => {
                state.session = Some(session);
                state.status = format!("Connected to {}", state.bridge);
                Task::none()
            }
            Message::SessionOpened(Err(err)) => {
                state.status = format!("Bridge unavailable: {err}");
                Task::none()
            }
            Message::UsernameChanged(value) => {
                state.username = value;
                Task::none()
            }
            Message::PasswordChanged(value) => {
                state.password = value;
                Task::none()
            }
            Message::LoginPressed => state.send(Event::LoginAttempted {
                username: state.username.clone(),
                password: state.password.clone(),
            }),
            Message::RegisterPressed => state.send(Event::RegisterAttempted {
                username: state.username.clone(),
                password: state.password.clone(),
            }),
            Message::ProcessPressed => {
                state.processing = true;
                state.status = "Processing images...".into();
                state.send(Event::ProcessRequested)
            }
            Message::ViewReceived(Ok(view)) => {
                state.processing = false;
                state.view = view;
                state.status = format!("Connected to {}", state.bridge);
                Task::none()
            }
            Message::ViewReceived(Err(err)) => {
                state.processing = false;
                state.status = format!("Bridge error: {err}");
                Task::none()
            }
        }
    }

    fn send(&mut self, event: Event) -> Task<Message> {
        match self.session {
            Some(session) => Task::perform(
                post_event(self.bridge.clone(), session, event),
                Message::ViewReceived,
            ),
            None => {
                self.processing = false;
                self.status = "Not connected to the bridge".into();
                Task::none()
            }
        }
    }

    fn view(state: &Self) -> Element<'_, Message> {
        let mut layout = Column::new().spacing(20).padding(20);

        if state.view.auth_panel_visible {
            let auth_panel = column![
                text("Sign in").size(26),
                text_input("Username", &state.username)
                    .on_input(Message::UsernameChanged)
                    .padding(6),
                text_input("Password", &state.password)
                    .on_input(Message::PasswordChanged)
                    .secure(true)
                    .padding(6),
                row![
                    button("Log in").on_press(Message::LoginPressed).padding(10),
                    button("Register")
                        .on_press(Message::RegisterPressed)
                        .padding(10),
                ]
                .spacing(10),
                text(&state.view.access_message).size(14),
            ]
            .spacing(10)
            .width(Length::Fixed(360.0));
            layout = layout.push(auth_panel);
        }

        if state.view.dashboard_visible {
            let process_button = if state.processing {
                button("Processing...").padding(10)
            } else {
                button("Process images")
                    .on_press(Message::ProcessPressed)
                    .padding(10)
            };

            let area = AreaChart::from_spec(&state.view.area_chart);
            let heatmap = Heatmap::from_spec(&state.view.heatmap_chart);
            let heatmap_height = heatmap.height;

            let dashboard = column![
                text("Object analysis").size(26),
                text(&state.view.access_message).size(14),
                process_button,
                text(&state.view.processing_message).size(16),
                text(area.title.clone()).size(18),
                Canvas::new(area)
                    .width(Length::Fill)
                    .height(Length::Fixed(260.0)),
                text(heatmap.title.clone()).size(18),
                Canvas::new(heatmap)
                    .width(Length::Fill)
                    .height(Length::Fixed(heatmap_height)),
            ]
            .spacing(10)
            .width(Length::Fill);
            layout = layout.push(dashboard);
        }

        layout = layout.push(text(&state.status).size(12));

        Container::new(layout)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }
}

#[derive(Debug, Deserialize)]
struct SessionReply {
    session: SessionId,
}

#[derive(Debug, Serialize)]
struct EventRequest {
    session: SessionId,
    event: Event,
}

async fn open_session(bridge: String) -> Result<SessionId, String> {
    let client = reqwest::Client::new();
    let response = client
        .post(format!("{bridge}/session"))
        .send()
        .await
        .map_err(|e| e.to_string())?;
    response
        .json::<SessionReply>()
        .await
        .map(|reply| reply.session)
        .map_err(|e| e.to_string())
}

async fn post_event(bridge: String, session: SessionId, event: Event) -> Result<ViewState, String> {
    let client = reqwest::Client::new();
    let response = client
        .post(format!("{bridge}/event"))
        .json(&EventRequest { session, event })
        .send()
        .await
        .map_err(|e| e.to_string())?;
    if response.status().is_success() {
        response
            .json::<ViewState>()
            .await
            .map_err(|e| e.to_string())
    } else {
        let status = response.status();
        let text = response.text().await.unwrap_or_else(|_| "".into());
        Err(format!("{}: {}", status, text))
    }
}

fn chart_title(spec: &ChartSpec) -> String {
    spec.layout
        .as_ref()
        .map(|layout| layout.title.clone())
        .unwrap_or_default()
}

/// Filled line over the label counts.
#[derive(Debug, Clone, Default)]
struct AreaChart {
    title: String,
    labels: Vec<String>,
    values: Vec<f32>,
}

impl AreaChart {
    fn from_spec(spec: &ChartSpec) -> Self {
        let series = spec.data.iter().find_map(|trace| match trace {
            Trace::Scatter { x, y, .. } => Some((x.clone(), y.clone())),
            _ => None,
        });
        let (labels, values) = series.unwrap_or_default();
        Self {
            title: chart_title(spec),
            labels,
            values: values.into_iter().map(|v| v as f32).collect(),
        }
    }
}

impl canvas::Program<Message> for AreaChart {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        frame.fill_rectangle(
            Point::ORIGIN,
            bounds.size(),
            Color::from_rgb(0.05, 0.05, 0.05),
        );

        if self.values.is_empty() {
            return vec![frame.into_geometry()];
        }

        let label_band = 18.0;
        let plot_height = (bounds.height - label_band).max(1.0);
        let max = self.values.iter().cloned().fold(1.0, f32::max);
        let x_at = |i: usize| {
            if self.values.len() > 1 {
                i as f32 * bounds.width / (self.values.len() as f32 - 1.0)
            } else {
                bounds.width / 2.0
            }
        };
        let y_at = |value: f32| plot_height - (value / max) * plot_height * 0.9;

        let area = Path::new(|builder| {
            builder.move_to(Point::new(x_at(0), plot_height));
            for (i, value) in self.values.iter().enumerate() {
                builder.line_to(Point::new(x_at(i), y_at(*value)));
            }
            builder.line_to(Point::new(x_at(self.values.len() - 1), plot_height));
            builder.close();
        });
        frame.fill(&area, Color::from_rgba(0.18, 0.72, 0.89, 0.35));

        let line = Path::new(|builder| {
            for (i, value) in self.values.iter().enumerate() {
                let point = Point::new(x_at(i), y_at(*value));
                if i == 0 {
                    builder.move_to(point);
                } else {
                    builder.line_to(point);
                }
            }
        });
        frame.stroke(
            &line,
            Stroke::default()
                .with_width(2.5)
                .with_color(Color::from_rgb(0.18, 0.72, 0.89)),
        );

        for (i, (label, value)) in self.labels.iter().zip(&self.values).enumerate() {
            let x = (x_at(i) - 12.0).clamp(0.0, (bounds.width - 40.0).max(0.0));
            frame.fill_text(canvas::Text {
                content: label.clone(),
                position: Point::new(x, plot_height + 2.0),
                color: Color::from_rgb(0.8, 0.8, 0.85),
                size: 12.0.into(),
                ..canvas::Text::default()
            });
            frame.fill_text(canvas::Text {
                content: format!("{value}"),
                position: Point::new(x, (y_at(*value) - 16.0).max(0.0)),
                color: Color::WHITE,
                size: 12.0.into(),
                ..canvas::Text::default()
            });
        }

        vec![frame.into_geometry()]
    }
}

/// One row of cells, colored by count.
#[derive(Debug, Clone)]
struct Heatmap {
    title: String,
    labels: Vec<String>,
    values: Vec<f32>,
    height: f32,
}

impl Heatmap {
    fn from_spec(spec: &ChartSpec) -> Self {
        let series = spec.data.iter().find_map(|trace| match trace {
            Trace::Heatmap { z, x, .. } => Some((x.clone(), z.first().cloned().unwrap_or_default())),
            _ => None,
        });
        let (labels, values) = series.unwrap_or_default();
        let height = spec
            .layout
            .as_ref()
            .and_then(|layout| layout.height)
            .unwrap_or(HEATMAP_HEIGHT) as f32;
        Self {
            title: chart_title(spec),
            labels,
            values: values.into_iter().map(|v| v as f32).collect(),
            height,
        }
    }
}

/// Piecewise-linear approximation of the Viridis scale, `t` in `[0, 1]`.
fn viridis(t: f32) -> Color {
    const STOPS: [(f32, f32, f32); 5] = [
        (0.267, 0.005, 0.329),
        (0.230, 0.322, 0.546),
        (0.128, 0.567, 0.551),
        (0.369, 0.789, 0.383),
        (0.993, 0.906, 0.144),
    ];
    let scaled = t.clamp(0.0, 1.0) * (STOPS.len() - 1) as f32;
    let index = (scaled.floor() as usize).min(STOPS.len() - 2);
    let frac = scaled - index as f32;
    let (r0, g0, b0) = STOPS[index];
    let (r1, g1, b1) = STOPS[index + 1];
    Color::from_rgb(
        r0 + (r1 - r0) * frac,
        g0 + (g1 - g0) * frac,
        b0 + (b1 - b0) * frac,
    )
}

impl canvas::Program<Message> for Heatmap {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        frame.fill_rectangle(
            Point::ORIGIN,
            bounds.size(),
            Color::from_rgb(0.02, 0.02, 0.04),
        );

        if self.values.is_empty() {
            return vec![frame.into_geometry()];
        }

        let min = self.values.iter().cloned().fold(f32::INFINITY, f32::min);
        let max = self.values.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
        let span = (max - min).max(1.0);
        let cell_width = bounds.width / self.values.len() as f32;

        for (i, (label, value)) in self.labels.iter().zip(&self.values).enumerate() {
            let origin = Point::new(i as f32 * cell_width, 0.0);
            frame.fill_rectangle(
                origin,
                Size::new((cell_width - 1.0).max(1.0), bounds.height),
                viridis((value - min) / span),
            );
            frame.fill_text(canvas::Text {
                content: format!("{label}: {value}"),
                position: Point::new(origin.x + 4.0, bounds.height / 2.0 - 6.0),
                color: Color::WHITE,
                size: 12.0.into(),
                ..canvas::Text::default()
            });
        }

        vec![frame.into_geometry()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashcore::processing::charts::{build_area_chart, build_heatmap_chart};
    use dashcore::processing::LabelDistribution;

    #[test]
    fn charts_are_read_back_from_specs() {
        let distribution = LabelDistribution::count(["cat", "dog", "cat"]);

        let area = AreaChart::from_spec(&build_area_chart(&distribution));
        assert_eq!(area.labels, vec!["cat", "dog"]);
        assert_eq!(area.values, vec![2.0, 1.0]);
        assert!(!area.title.is_empty());

        let heatmap = Heatmap::from_spec(&build_heatmap_chart(&distribution));
        assert_eq!(heatmap.values, vec![2.0, 1.0]);
        assert_eq!(heatmap.height, HEATMAP_HEIGHT as f32);
    }

    #[test]
    fn empty_spec_draws_nothing() {
        let area = AreaChart::from_spec(&ChartSpec::empty());
        assert!(area.values.is_empty());
        assert!(area.title.is_empty());
        assert!(Heatmap::from_spec(&ChartSpec::empty()).labels.is_empty());
    }

    #[test]
    fn viridis_spans_purple_to_yellow() {
        let low = viridis(0.0);
        let high = viridis(1.0);
        assert!(low.b > low.g);
        assert!(high.r > 0.9 && high.g > 0.8);
        assert_eq!(viridis(-3.0), low);
    }
}
