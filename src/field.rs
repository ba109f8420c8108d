use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::layout::{Position, Rect};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::buffer::{numerals_of, OtpBuffer};
use crate::error::{OtpError, Result};
use crate::style::OtpStyle;

pub const DEFAULT_LENGTH: usize = 4;

/// Notification produced by a state-changing operation.
///
/// `Changed` fires once per accepted mutation regardless of fill state;
/// `Submitted` fires in addition whenever an operation leaves every box
/// filled. Both are kept distinct on purpose: callers wanting a live value
/// watch `Changed`, callers wanting completion watch `Submitted`, and a
/// caller re-submitting the same value twice is its own problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OtpSignal {
    Changed(String),
    Submitted(String),
}

type SignalFn = Box<dyn FnMut(&str) + Send>;

/// Segmented one-time-password entry field.
///
/// One box per digit, a single focus index, and no per-box state: rendering
/// always mirrors the internal buffer. The host event loop forwards key,
/// paste, and mouse events, redraws after each call, and calls [`settle`]
/// once per turn to release the bulk-input guard.
///
/// [`settle`]: OtpField::settle
pub struct OtpField {
    buffer: OtpBuffer,
    focus: usize,
    disabled: bool,
    placeholder: String,
    style: OtpStyle,
    /// Raised while a bulk operation from the current event turn owns the
    /// buffer; suppresses the per-character edit path until `settle`.
    bulk_guard: bool,
    on_change: Option<SignalFn>,
    on_submit: Option<SignalFn>,
}

impl Default for OtpField {
    fn default() -> Self {
        Self {
            buffer: OtpBuffer::new(DEFAULT_LENGTH),
            focus: 0,
            disabled: false,
            placeholder: String::new(),
            style: OtpStyle::default(),
            bulk_guard: false,
            on_change: None,
            on_submit: None,
        }
    }
}

impl OtpField {
    /// Create a field with `length` boxes. `length` must be at least 1.
    pub fn new(length: usize) -> Result<Self> {
        if length == 0 {
            return Err(OtpError::ZeroLength);
        }
        Ok(Self {
            buffer: OtpBuffer::new(length),
            ..Self::default()
        })
    }

    /// Placeholder shown (dimmed) in empty boxes. Only the first character
    /// fits a one-character box; the rest is ignored.
    pub fn with_placeholder(mut self, text: impl Into<String>) -> Self {
        self.placeholder = text.into();
        self
    }

    pub fn with_style(mut self, style: OtpStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Callback mirroring every `Changed` signal.
    pub fn on_change(mut self, callback: impl FnMut(&str) + Send + 'static) -> Self {
        self.on_change = Some(Box::new(callback));
        self
    }

    /// Callback mirroring every `Submitted` signal.
    pub fn on_submit(mut self, callback: impl FnMut(&str) + Send + 'static) -> Self {
        self.on_submit = Some(Box::new(callback));
        self
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// True when every box holds a digit.
    pub fn is_complete(&self) -> bool {
        self.buffer.is_full()
    }

    /// Concatenation of the filled boxes, in order.
    pub fn value(&self) -> String {
        self.buffer.value()
    }

    /// Index of the box that receives the next keystroke.
    pub fn focused(&self) -> usize {
        self.focus
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Disable or re-enable the field. While disabled, all input handling is
    /// ignored and no cursor is rendered. The caller owning an autofill
    /// session cancels it when disabling (see `autofill`).
    pub fn set_disabled(&mut self, disabled: bool) {
        self.disabled = disabled;
    }

    /// Clear every box and return focus to the first one. Fires only the
    /// `Changed` reconciliation signal, never `Submitted`.
    pub fn reset(&mut self) -> Vec<OtpSignal> {
        self.buffer.clear_all();
        self.focus = 0;
        self.emit(false)
    }

    /// Release the bulk-input guard. Call once per event-loop turn, after
    /// pending input has been drained — the deferred half of the bulk
    /// operations' two-phase commit.
    pub fn settle(&mut self) {
        self.bulk_guard = false;
    }

    /// Apply a raw edit to one box, as a host change-event would deliver it.
    ///
    /// Empty `text` is a deletion and is accepted before any numeric check.
    /// Multi-character `text` is treated as bulk input typed into the box:
    /// it clears the whole field and distributes the numerals from `index`.
    /// Otherwise the box stores the last character of `text`, provided it is
    /// a numeral; anything else is discarded without effect.
    pub fn apply_edit(&mut self, index: usize, text: &str) -> Vec<OtpSignal> {
        if self.disabled || index >= self.buffer.len() {
            return Vec::new();
        }
        if self.bulk_guard {
            tracing::trace!(index, "edit dropped while bulk fill in flight");
            return Vec::new();
        }
        if text.is_empty() {
            self.buffer.clear_slot(index);
            if index > 0 {
                self.focus = index - 1;
            }
            return self.emit(false);
        }
        if text.chars().nth(1).is_some() {
            return self.bulk_type(index, text);
        }
        let Some(digit) = text.chars().last().filter(char::is_ascii_digit) else {
            return Vec::new();
        };
        self.buffer.set(index, digit);
        if index + 1 < self.buffer.len() {
            self.focus = index + 1;
        }
        let submitted = self.buffer.is_full();
        self.emit(submitted)
    }

    /// Distribute a pasted string across the boxes, starting at the first.
    /// Non-numerals are stripped; an all-non-numeral paste changes nothing.
    /// Boxes beyond the pasted digits keep their content.
    pub fn handle_paste(&mut self, pasted: &str) -> Vec<OtpSignal> {
        if self.disabled {
            return Vec::new();
        }
        self.bulk_fill(0, pasted)
    }

    /// Distribute an ambient-autofill payload. Same algorithm as paste,
    /// always seeded at the first box (the autofill target).
    pub fn handle_autofill(&mut self, code: &str) -> Vec<OtpSignal> {
        if self.disabled {
            return Vec::new();
        }
        self.bulk_fill(0, code)
    }

    /// Process one key press. Digits edit the focused box; Backspace clears
    /// it, or moves focus back when it is already empty. Everything else,
    /// and all input while disabled, is ignored.
    pub fn handle_key_event(&mut self, key: KeyEvent) -> Vec<OtpSignal> {
        if self.disabled || key.kind != KeyEventKind::Press {
            return Vec::new();
        }
        if key
            .modifiers
            .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT)
        {
            return Vec::new();
        }
        match key.code {
            KeyCode::Char(c) => {
                let index = self.focus;
                self.apply_edit(index, &c.to_string())
            }
            KeyCode::Backspace => {
                let index = self.focus;
                if self.buffer.get(index).is_some() {
                    self.apply_edit(index, "")
                } else {
                    if index > 0 {
                        self.focus = index - 1;
                    }
                    Vec::new()
                }
            }
            _ => Vec::new(),
        }
    }

    /// Focus the clicked box, except that clicking ahead of the fill point
    /// (the predecessor is still empty) redirects to the first empty box.
    /// The caret always lands on the box content, so the next keystroke
    /// replaces rather than appends.
    pub fn handle_click(&mut self, index: usize) {
        if self.disabled || index >= self.buffer.len() {
            return;
        }
        if index > 0 && self.buffer.get(index - 1).is_none() {
            if let Some(first_empty) = self.buffer.first_empty() {
                self.focus = first_empty;
                return;
            }
        }
        self.focus = index;
    }

    /// Hit-test a mouse press against the rendered boxes.
    pub fn handle_mouse(&mut self, mouse: MouseEvent, area: Rect) {
        if let MouseEventKind::Down(MouseButton::Left) = mouse.kind {
            if let Some(index) = self.hit_test(area, mouse.column, mouse.row) {
                self.handle_click(index);
            }
        }
    }

    /// Convenience dispatcher for a raw crossterm event. `area` is the same
    /// rectangle passed to [`render`](OtpField::render), used for mouse
    /// hit-testing.
    pub fn handle_event(&mut self, event: &Event, area: Rect) -> Vec<OtpSignal> {
        match event {
            Event::Key(key) => self.handle_key_event(*key),
            Event::Paste(pasted) => self.handle_paste(pasted),
            Event::Mouse(mouse) => {
                self.handle_mouse(*mouse, area);
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    /// Columns needed to render every box at the configured geometry,
    /// including a bordered container's frame when one is set.
    pub fn desired_width(&self) -> u16 {
        let width = self.style.total_width(self.buffer.len());
        if self.style.container.is_some() {
            width.saturating_add(2)
        } else {
            width
        }
    }

    /// Rows needed to render the boxes (and container frame, if any).
    pub fn desired_height(&self) -> u16 {
        if self.style.container.is_some() {
            OtpStyle::BOX_HEIGHT + 2
        } else {
            OtpStyle::BOX_HEIGHT
        }
    }

    /// The rectangle each box occupies inside `area`. Shared by rendering,
    /// cursor placement, and mouse hit-testing so they can never disagree.
    pub fn box_areas(&self, area: Rect) -> Vec<Rect> {
        let area = self.content_area(area);
        let step = u32::from(self.style.box_width) + u32::from(self.style.gap);
        (0..self.buffer.len())
            .map(|i| {
                let x = (u32::from(area.x) + i as u32 * step).min(u32::from(u16::MAX)) as u16;
                Rect::new(
                    x,
                    area.y,
                    self.style.box_width,
                    OtpStyle::BOX_HEIGHT.min(area.height),
                )
                .intersection(area)
            })
            .collect()
    }

    /// The area left for boxes once the container block has taken its share.
    fn content_area(&self, area: Rect) -> Rect {
        match &self.style.container {
            Some(block) => block.inner(area),
            None => area,
        }
    }

    /// Box index under the given terminal cell, if any.
    pub fn hit_test(&self, area: Rect, column: u16, row: u16) -> Option<usize> {
        self.box_areas(area)
            .iter()
            .position(|rect| rect.contains(Position::new(column, row)))
    }

    /// Terminal cell the cursor should occupy, when the field is enabled and
    /// the focused box is visible.
    pub fn cursor_pos(&self, area: Rect) -> Option<Position> {
        if self.disabled {
            return None;
        }
        let rect = self.box_areas(area).into_iter().nth(self.focus)?;
        if rect.width < 3 || rect.height < OtpStyle::BOX_HEIGHT {
            return None;
        }
        Some(Position::new(rect.x + rect.width / 2, rect.y + 1))
    }

    /// Draw the field and place the cursor in the focused box.
    pub fn render(&self, frame: &mut Frame<'_>, area: Rect) {
        if let Some(container) = &self.style.container {
            frame.render_widget(container.clone(), area);
        }
        for (i, rect) in self.box_areas(area).into_iter().enumerate() {
            if rect.width < 3 || rect.height < OtpStyle::BOX_HEIGHT {
                continue;
            }
            let mut border_style = self.style.base;
            if self.disabled {
                border_style = border_style.patch(self.style.disabled);
            } else if i == self.focus {
                border_style = border_style.patch(self.style.focused);
            }
            let content = match self.buffer.get(i) {
                Some(digit) => {
                    let mut digit_style = self.style.digit;
                    if self.disabled {
                        digit_style = digit_style.patch(self.style.disabled);
                    }
                    Span::styled(digit.to_string(), digit_style)
                }
                None => match self.placeholder.chars().next() {
                    Some(hint) => {
                        let mut hint_style = self.style.placeholder;
                        if self.disabled {
                            hint_style = hint_style.patch(self.style.disabled);
                        }
                        Span::styled(hint.to_string(), hint_style)
                    }
                    None => Span::raw(" "),
                },
            };
            let block = Block::default()
                .borders(Borders::ALL)
                .border_type(self.style.border_type)
                .border_style(border_style);
            frame.render_widget(
                Paragraph::new(Line::from(content)).centered().block(block),
                rect,
            );
        }
        if let Some(pos) = self.cursor_pos(area) {
            frame.set_cursor_position(pos);
        }
    }

    fn bulk_fill(&mut self, start: usize, raw: &str) -> Vec<OtpSignal> {
        let digits = numerals_of(raw);
        if digits.is_empty() {
            return Vec::new();
        }
        self.buffer.fill_from(start, &digits);
        self.focus_first_gap();
        self.bulk_guard = true;
        self.emit(self.buffer.is_full())
    }

    /// Bulk input typed into one box: the whole field restarts from the
    /// numerals, distributed from the edited box.
    fn bulk_type(&mut self, start: usize, text: &str) -> Vec<OtpSignal> {
        let digits = numerals_of(text);
        if digits.is_empty() {
            return Vec::new();
        }
        self.buffer.clear_all();
        self.buffer.fill_from(start, &digits);
        self.focus_first_gap();
        self.bulk_guard = true;
        self.emit(self.buffer.is_full())
    }

    fn focus_first_gap(&mut self) {
        self.focus = self
            .buffer
            .first_empty()
            .unwrap_or(self.buffer.len() - 1);
    }

    fn emit(&mut self, submitted: bool) -> Vec<OtpSignal> {
        let value = self.buffer.value();
        if let Some(callback) = self.on_change.as_mut() {
            callback(&value);
        }
        let mut signals = vec![OtpSignal::Changed(value.clone())];
        if submitted {
            if let Some(callback) = self.on_submit.as_mut() {
                callback(&value);
            }
            signals.push(OtpSignal::Submitted(value));
        }
        signals
    }
}
