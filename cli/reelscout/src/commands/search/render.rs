//! Pure rendering of the search view.
//!
//! [render] lays out one frame for the current input, the published
//! [SearchModel] and the trending searches. Drawing the frame is left to the
//! session, so the layout can be tested without a terminal.

use reelscout_catalog::MovieSummary;
use reelscout_core::{SearchModel, SearchState, TelemetryRecord};

const HEADLINE: &str = "Find Movies You'll Enjoy Without the Hassle";
const PROMPT: &str = "Search: ";
const INPUT_ROW: u16 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Plain,
    Heading,
    Dim,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub text: String,
    pub style: LineStyle,
}

impl Line {
    fn new(text: impl Into<String>, style: LineStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    fn blank() -> Self {
        Self::new("", LineStyle::Plain)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub lines: Vec<Line>,
    /// Column and row of the text cursor
    pub cursor: (u16, u16),
}

pub struct View<'a> {
    pub input: &'a str,
    pub model: &'a SearchModel,
    pub trending: &'a [TelemetryRecord],
}

pub fn render(view: &View, width: u16, height: u16) -> Frame {
    let mut lines = vec![
        Line::new(HEADLINE, LineStyle::Heading),
        Line::blank(),
        Line::new(format!("{PROMPT}{}", view.input), LineStyle::Plain),
        Line::blank(),
    ];

    if !view.trending.is_empty() {
        lines.push(Line::new("Trending", LineStyle::Heading));
        for (rank, record) in view.trending.iter().enumerate() {
            let name = if record.title.is_empty() {
                &record.search_term
            } else {
                &record.title
            };
            lines.push(Line::new(
                format!("  {}. {name}", rank + 1),
                LineStyle::Plain,
            ));
        }
        lines.push(Line::blank());
    }

    lines.push(Line::new("All Movies", LineStyle::Heading));
    match view.model.state() {
        SearchState::Idle => {},
        SearchState::Loading => lines.push(Line::new("  Loading...", LineStyle::Dim)),
        SearchState::Error(message) => lines.push(Line::new(format!("  {message}"), LineStyle::Error)),
        SearchState::Success(movies) if movies.is_empty() => {
            lines.push(Line::new("  No movies found.", LineStyle::Dim))
        },
        SearchState::Success(movies) => {
            lines.extend(movies.iter().map(|movie| Line::new(movie_line(movie), LineStyle::Plain)))
        },
    }

    lines.truncate(height as usize);
    for line in &mut lines {
        if line.text.chars().count() > width as usize {
            line.text = line.text.chars().take(width as usize).collect();
        }
    }

    // Keep the cursor on the last visible column of a long query.
    let column = (PROMPT.chars().count() + view.input.chars().count())
        .min(width.saturating_sub(1) as usize);
    Frame {
        lines,
        cursor: (column as u16, INPUT_ROW),
    }
}

fn movie_line(movie: &MovieSummary) -> String {
    let rating = if movie.vote_average > 0.0 {
        format!("{:.1}", movie.vote_average)
    } else {
        "N/A".to_string()
    };
    let language = movie.original_language.as_deref().unwrap_or("N/A");
    let year = movie.release_year().unwrap_or("N/A");
    format!("  {}  ★ {rating} · {language} · {year}", movie.title)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use reelscout_catalog::MockClient;
    use reelscout_core::{MemoryStore, SearchController};

    use super::*;

    fn movie(id: u64, title: &str) -> MovieSummary {
        MovieSummary {
            id,
            title: title.to_string(),
            poster_path: None,
            vote_average: 7.66,
            release_date: Some("2022-03-01".to_string()),
            original_language: Some("en".to_string()),
        }
    }

    fn texts(frame: &Frame) -> Vec<&str> {
        frame.lines.iter().map(|line| line.text.as_str()).collect()
    }

    /// Drive a real controller to a settled model.
    async fn settled_model(client: MockClient, queries: &[&str]) -> SearchModel {
        let queries = queries.iter().map(|query| query.to_string()).collect::<Vec<_>>();
        SearchController::new(client, MemoryStore::new())
            .run(futures::stream::iter(queries))
            .await
    }

    #[test]
    fn idle_view_shows_prompt_and_heading() {
        let model = SearchModel::new();
        let frame = render(
            &View {
                input: "",
                model: &model,
                trending: &[],
            },
            80,
            24,
        );

        assert_eq!(texts(&frame), vec![
            HEADLINE,
            "",
            "Search: ",
            "",
            "All Movies"
        ]);
        assert_eq!(frame.cursor, (8, INPUT_ROW));
    }

    #[tokio::test]
    async fn results_are_listed_with_rating_language_and_year() {
        let client = MockClient::new();
        client.push_response(reelscout_catalog::MockResponse::ok(vec![]));
        client.push_response(reelscout_catalog::MockResponse::ok(vec![
            movie(1, "The Batman"),
            MovieSummary {
                vote_average: 0.0,
                release_date: Some(String::new()),
                original_language: None,
                ..movie(2, "Batman Begins")
            },
        ]));
        let model = settled_model(client, &["batman"]).await;

        let frame = render(
            &View {
                input: "batman",
                model: &model,
                trending: &[],
            },
            80,
            24,
        );

        assert_eq!(&texts(&frame)[4..], &[
            "All Movies",
            "  The Batman  ★ 7.7 · en · 2022",
            "  Batman Begins  ★ N/A · N/A · N/A",
        ]);
        assert_eq!(frame.cursor, (14, INPUT_ROW));
    }

    #[tokio::test]
    async fn error_is_shown_instead_of_results() {
        let client = MockClient::new();
        client.push_response(reelscout_catalog::MockResponse::err(
            reelscout_catalog::FetchError::ApiError("Invalid API key".to_string()),
        ));
        let model = settled_model(client, &[]).await;

        let frame = render(
            &View {
                input: "",
                model: &model,
                trending: &[],
            },
            80,
            24,
        );

        let last = frame.lines.last().unwrap();
        assert_eq!(last.style, LineStyle::Error);
        assert_eq!(
            last.text,
            format!("  {}", reelscout_core::FETCH_ERROR_MESSAGE)
        );
    }

    #[tokio::test]
    async fn empty_results_say_so() {
        let model = settled_model(MockClient::new(), &[]).await;
        let frame = render(
            &View {
                input: "",
                model: &model,
                trending: &[],
            },
            80,
            24,
        );
        assert_eq!(texts(&frame).last(), Some(&"  No movies found."));
    }

    #[test]
    fn trending_is_ranked() {
        let model = SearchModel::new();
        let mut untitled = TelemetryRecord::first("alien".to_string(), &movie(2, ""));
        untitled.count = 3;
        let trending = vec![
            TelemetryRecord::first("batman".to_string(), &movie(1, "The Batman")),
            untitled,
        ];

        let frame = render(
            &View {
                input: "",
                model: &model,
                trending: &trending,
            },
            80,
            24,
        );

        assert_eq!(&texts(&frame)[4..8], &[
            "Trending",
            "  1. The Batman",
            "  2. alien",
            ""
        ]);
    }

    #[test]
    fn frame_is_clipped_to_terminal_size() {
        let model = SearchModel::new();
        let frame = render(
            &View {
                input: "a very long query that does not fit",
                model: &model,
                trending: &[],
            },
            12,
            3,
        );

        assert_eq!(texts(&frame), vec!["Find Movies ", "", "Search: a ve"]);
        assert_eq!(frame.cursor, (11, INPUT_ROW));
    }

    #[test]
    fn cursor_stays_on_screen_of_zero_width() {
        let model = SearchModel::new();
        let frame = render(
            &View {
                input: "dune",
                model: &model,
                trending: &[],
            },
            0,
            24,
        );

        assert_eq!(frame.cursor, (0, INPUT_ROW));
    }
}
