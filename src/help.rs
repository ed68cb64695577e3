use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Flex, Layout, Rect},
    style::Style,
    text::{Line, Text},
    widgets::{Block, Clear, Padding, Paragraph, Widget},
};

static BINDINGS: &[(&str, &str)] = &[
    ("h, LEFT", "Previous week"),
    ("l, RIGHT", "Next week"),
    ("0, HOME", "Current week"),
    ("r", "Refresh"),
    ("c, TAB", "Next calendar"),
    ("C, BACKTAB", "Previous calendar"),
    ("s", "Sign in"),
    ("?", "Show this help"),
    ("q, ESC", "Quit"),
];

const KEY_COLUMN_WIDTH: usize = 16;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) struct Help(pub(crate) Style);

impl Help {
    fn text() -> Text<'static> {
        let mut lines = BINDINGS
            .iter()
            .map(|(keys, action)| Line::raw(format!("{keys:KEY_COLUMN_WIDTH$}{action}")))
            .collect::<Vec<_>>();
        lines.push(Line::raw(""));
        lines.push(Line::raw("Press the Any Key to dismiss."));
        Text::from(lines)
    }
}

impl Widget for Help {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let text = Help::text();
        let block = Block::bordered()
            .title(" Commands ")
            .title_alignment(Alignment::Center)
            .padding(Padding::horizontal(1));
        // Two border cells plus one padding cell on each side
        let overlay = centered(area, text.width() + 4, text.height() + 2);
        Clear.render(overlay, buf);
        Paragraph::new(text)
            .block(block)
            .style(self.0)
            .render(overlay, buf);
    }
}

/// A `width` by `height` rect in the middle of `area`, shrunk to fit
fn centered(area: Rect, width: usize, height: usize) -> Rect {
    let width = u16::try_from(width).unwrap_or(u16::MAX);
    let height = u16::try_from(height).unwrap_or(u16::MAX);
    let [column] = Layout::horizontal([width]).flex(Flex::Center).areas(area);
    let [cell] = Layout::vertical([height]).flex(Flex::Center).areas(column);
    cell
}
