use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, BorderType};

/// Visual configuration for the segmented field. `base` is applied to every
/// box; the more specific styles are patched on top of it.
#[derive(Debug, Clone)]
pub struct OtpStyle {
    /// Style applied to every box (border and content).
    pub base: Style,
    /// Style patched onto the focused box.
    pub focused: Style,
    /// Style applied to a filled box's digit.
    pub digit: Style,
    /// Style applied to the placeholder character in empty boxes.
    pub placeholder: Style,
    /// Style patched onto every box while the widget is disabled.
    pub disabled: Style,
    /// Border shape shared by all boxes.
    pub border_type: BorderType,
    /// Optional block drawn around the whole field; the boxes are laid out
    /// inside its inner area.
    pub container: Option<Block<'static>>,
    /// Total width of one box including its borders.
    pub box_width: u16,
    /// Columns between adjacent boxes.
    pub gap: u16,
}

impl Default for OtpStyle {
    fn default() -> Self {
        Self {
            base: Style::default().fg(Color::DarkGray),
            focused: Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            digit: Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            placeholder: Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM),
            disabled: Style::default().fg(Color::DarkGray).add_modifier(Modifier::DIM),
            border_type: BorderType::Rounded,
            container: None,
            box_width: 5,
            gap: 1,
        }
    }
}

impl OtpStyle {
    /// Height one box occupies (content row plus top and bottom border).
    pub const BOX_HEIGHT: u16 = 3;

    /// Width needed to lay out `length` boxes side by side.
    pub fn total_width(&self, length: usize) -> u16 {
        let length = u16::try_from(length).unwrap_or(u16::MAX);
        length
            .saturating_mul(self.box_width)
            .saturating_add(length.saturating_sub(1).saturating_mul(self.gap))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_width_accounts_for_gaps() {
        let style = OtpStyle::default();
        // 4 boxes of 5 columns with 3 single-column gaps.
        assert_eq!(style.total_width(4), 23);
        assert_eq!(style.total_width(1), 5);
    }

    #[test]
    fn total_width_zero_length() {
        let style = OtpStyle::default();
        assert_eq!(style.total_width(0), 0);
    }
}
