use chrono::Local;
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Text};
use ratatui::widgets::{Block, Padding, Paragraph, Widget, Wrap};

use crate::chat::{Message as ChatMessage, Role, SourceRef};
use crate::tui::component::Component;

/// Horizontal padding (per side) between the border and text content.
const CONTENT_PAD_H: u16 = 1;
/// Total horizontal space consumed by borders (1 left + 1 right) and padding.
const HORIZONTAL_OVERHEAD: u16 = 2 + CONTENT_PAD_H * 2;
/// Total vertical space consumed by borders (1 top + 1 bottom).
const VERTICAL_OVERHEAD: u16 = 2;

const SOURCES_HEADING: &str = "Sources:";

/// A stateless component that renders one chat message.
///
/// User messages are green and labelled "You"; assistant messages are blue
/// and labelled "Assistant". The bottom border carries the local time
/// (HH:MM). Assistant messages end with a Sources list when they cite any.
///
/// [`calculate_height`](Self::calculate_height) predicts the rendered height
/// with `textwrap`, so `MessageList` can lay out the scroll canvas without
/// rendering first.
#[derive(Clone, Copy)]
pub struct Message<'a> {
    pub message: &'a ChatMessage,
    pub is_selected: bool,
}

/// The lines of a message body, before wrapping: content, then the
/// sources footer.
fn body_lines(message: &ChatMessage) -> Vec<(String, LineKind)> {
    let mut lines: Vec<(String, LineKind)> = message
        .content
        .trim()
        .lines()
        .map(|l| (l.to_string(), LineKind::Content))
        .collect();
    if lines.is_empty() {
        lines.push((String::new(), LineKind::Content));
    }
    let sources = match message.role {
        Role::Assistant => message.display_sources(),
        Role::User => Vec::new(),
    };
    if !sources.is_empty() {
        lines.push((String::new(), LineKind::Content));
        lines.push((SOURCES_HEADING.to_string(), LineKind::Heading));
        lines.extend(
            sources
                .iter()
                .map(|s| (format_source(s), LineKind::Source)),
        );
    }
    lines
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum LineKind {
    Content,
    Heading,
    Source,
}

fn format_source(source: &SourceRef) -> String {
    if source.title == source.url {
        format!("- {}", source.url)
    } else {
        format!("- {} ({})", source.title, source.url)
    }
}

fn role_label(role: Role) -> &'static str {
    match role {
        Role::User => "You",
        Role::Assistant => "Assistant",
    }
}

fn role_style(role: Role) -> Style {
    match role {
        Role::User => Style::default().fg(Color::Green),
        Role::Assistant => Style::default().fg(Color::Blue),
    }
}

fn wrap_options(width: u16) -> textwrap::Options<'static> {
    textwrap::Options::new(width as usize)
        .break_words(true)
        .word_separator(textwrap::WordSeparator::AsciiSpace)
}

impl<'a> Message<'a> {
    pub fn new(message: &'a ChatMessage, is_selected: bool) -> Self {
        Self {
            message,
            is_selected,
        }
    }

    /// Height of the rendered message at `width`, borders included.
    ///
    /// Wrapping options must match `Paragraph`'s so the prediction equals
    /// what gets drawn.
    pub fn calculate_height(message: &ChatMessage, width: u16) -> u16 {
        let content_width = width.saturating_sub(HORIZONTAL_OVERHEAD);
        if content_width == 0 {
            return 1;
        }
        let rows: usize = body_lines(message)
            .iter()
            .map(|(line, _)| textwrap::wrap(line, wrap_options(content_width)).len().max(1))
            .sum();
        rows as u16 + VERTICAL_OVERHEAD
    }
}

impl Widget for Message<'_> {
    fn render(self, area: Rect, buf: &mut ratatui::buffer::Buffer) {
        let style = role_style(self.message.role);
        let border_style = if self.is_selected {
            Style::default().fg(Color::Cyan)
        } else {
            style.add_modifier(Modifier::DIM)
        };
        let time = self
            .message
            .timestamp
            .with_timezone(&Local)
            .format("%H:%M")
            .to_string();

        let block = Block::bordered()
            .title(role_label(self.message.role))
            .title_bottom(Line::from(time).right_aligned())
            .border_type(ratatui::widgets::BorderType::Rounded)
            .border_style(border_style)
            .title_style(border_style)
            .padding(Padding::horizontal(CONTENT_PAD_H));

        let inner_area = block.inner(area);
        block.render(area, buf);

        let lines: Vec<Line> = body_lines(self.message)
            .into_iter()
            .map(|(text, kind)| match kind {
                LineKind::Content => Line::styled(text, style),
                LineKind::Heading => {
                    Line::styled(text, Style::default().add_modifier(Modifier::BOLD))
                }
                LineKind::Source => Line::styled(text, Style::default().fg(Color::DarkGray)),
            })
            .collect();

        Paragraph::new(Text::from(lines))
            .wrap(Wrap { trim: true })
            .render(inner_area, buf);
    }
}

impl Component for Message<'_> {
    fn render(&mut self, frame: &mut Frame, area: Rect) {
        frame.render_widget(*self, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;

    fn render_text(message: &ChatMessage, width: u16) -> String {
        let height = Message::calculate_height(message, width);
        let backend = TestBackend::new(width, height);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal
            .draw(|f| Component::render(&mut Message::new(message, false), f, f.area()))
            .unwrap();
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn calculate_height_single_line() {
        let message = ChatMessage::user("Hello");
        assert_eq!(Message::calculate_height(&message, 80), 1 + VERTICAL_OVERHEAD);
    }

    #[test]
    fn calculate_height_zero_width_returns_minimum() {
        let message = ChatMessage::user("Hello world");
        assert_eq!(Message::calculate_height(&message, HORIZONTAL_OVERHEAD), 1);
    }

    #[test]
    fn calculate_height_wraps_at_width_boundary() {
        let message = ChatMessage::user("Hello world");
        // content_width = 5 → "Hello" | "world"
        assert_eq!(Message::calculate_height(&message, 9), 2 + VERTICAL_OVERHEAD);
    }

    #[test]
    fn calculate_height_counts_sources_footer() {
        let message = ChatMessage::assistant(
            "See the act.",
            vec![SourceRef::from_url("https://isap.sejm.gov.pl")],
        );
        // content + blank + heading + one source
        assert_eq!(Message::calculate_height(&message, 80), 4 + VERTICAL_OVERHEAD);
    }

    #[test]
    fn user_messages_never_show_sources() {
        let message = ChatMessage::user("Is https://example.com official?");
        assert_eq!(Message::calculate_height(&message, 80), 1 + VERTICAL_OVERHEAD);
    }

    #[test]
    fn render_shows_role_and_sources() {
        let message = ChatMessage::assistant(
            "Check https://www.gov.pl/web/udsc for details.",
            Vec::new(),
        );
        let text = render_text(&message, 80);
        assert!(text.contains("Assistant"));
        assert!(text.contains("Sources:"));
        assert!(text.contains("- https://www.gov.pl/web/udsc"));
    }

    #[test]
    fn render_titled_source() {
        let message = ChatMessage::assistant(
            "Answer",
            vec![SourceRef {
                url: "https://isap.sejm.gov.pl".into(),
                title: "Act on Foreigners".into(),
            }],
        );
        let text = render_text(&message, 80);
        assert!(text.contains("- Act on Foreigners (https://isap.sejm.gov.pl)"));
    }

    #[test]
    fn user_label_is_you() {
        let text = render_text(&ChatMessage::user("Hi"), 40);
        assert!(text.contains("You"));
    }
}
