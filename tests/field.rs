//! End-to-end widget flows driven through raw crossterm events, plus render
//! checks against a test backend.

use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::backend::TestBackend;
use ratatui::layout::Rect;
use ratatui::widgets::Block;
use ratatui::Terminal;

use otp_field::{OtpField, OtpSignal, OtpStyle};

const AREA: Rect = Rect {
    x: 0,
    y: 0,
    width: 40,
    height: 3,
};

fn key(code: KeyCode) -> Event {
    Event::Key(KeyEvent::from(code))
}

fn click(column: u16, row: u16) -> Event {
    Event::Mouse(MouseEvent {
        kind: MouseEventKind::Down(MouseButton::Left),
        column,
        row,
        modifiers: KeyModifiers::NONE,
    })
}

/// The character shown in the middle of each box after rendering into a
/// 40x3 test terminal.
fn rendered_digits(field: &OtpField) -> Vec<String> {
    let backend = TestBackend::new(AREA.width, AREA.height);
    let mut terminal = Terminal::new(backend).unwrap();
    terminal
        .draw(|frame| field.render(frame, frame.area()))
        .unwrap();
    let buffer = terminal.backend().buffer().clone();
    field
        .box_areas(AREA)
        .iter()
        .filter(|rect| rect.width >= 3)
        .map(|rect| {
            buffer
                .cell((rect.x + rect.width / 2, rect.y + 1))
                .map(|cell| cell.symbol().to_string())
                .unwrap_or_default()
        })
        .collect()
}

#[test]
fn typing_through_the_event_dispatcher_submits() {
    let mut field = OtpField::new(4).unwrap();
    let mut submitted = Vec::new();
    for c in ['2', '0', '2', '6'] {
        for signal in field.handle_event(&key(KeyCode::Char(c)), AREA) {
            if let OtpSignal::Submitted(value) = signal {
                submitted.push(value);
            }
        }
        field.settle();
    }
    assert_eq!(submitted, vec!["2026".to_string()]);
}

#[test]
fn paste_event_distributes_and_rendering_mirrors_buffer() {
    let mut field = OtpField::new(4).unwrap();
    field.handle_event(&Event::Paste("12-34".into()), AREA);
    field.settle();
    assert_eq!(field.value(), "1234");
    assert_eq!(rendered_digits(&field), vec!["1", "2", "3", "4"]);
}

#[test]
fn paste_of_letters_renders_nothing() {
    let mut field = OtpField::new(4).unwrap();
    let signals = field.handle_event(&Event::Paste("abcd".into()), AREA);
    assert!(signals.is_empty());
    assert_eq!(rendered_digits(&field), vec![" ", " ", " ", " "]);
}

#[test]
fn placeholder_fills_empty_boxes_until_typed_over() {
    let mut field = OtpField::new(4).unwrap().with_placeholder("0");
    assert_eq!(rendered_digits(&field), vec!["0", "0", "0", "0"]);
    field.handle_event(&key(KeyCode::Char('7')), AREA);
    assert_eq!(rendered_digits(&field), vec!["7", "0", "0", "0"]);
}

#[test]
fn mouse_click_ahead_redirects_to_fill_point() {
    let mut field = OtpField::new(4).unwrap();
    // Box 2 center is at column 14; its predecessor is empty, so focus goes
    // to the first empty box instead.
    field.handle_event(&click(14, 1), AREA);
    assert_eq!(field.focused(), 0);

    field.handle_event(&key(KeyCode::Char('1')), AREA);
    field.handle_event(&click(8, 1), AREA); // box 1, predecessor filled
    assert_eq!(field.focused(), 1);
}

#[test]
fn backspace_walks_back_through_empty_boxes() {
    let mut field = OtpField::new(4).unwrap();
    field.handle_event(&key(KeyCode::Char('1')), AREA);
    field.handle_event(&key(KeyCode::Char('2')), AREA);
    field.handle_event(&key(KeyCode::Backspace), AREA); // empty box 2 -> focus 1
    field.handle_event(&key(KeyCode::Backspace), AREA); // clears box 1 -> focus 0
    assert_eq!(field.value(), "1");
    assert_eq!(field.focused(), 0);
}

#[test]
fn reset_restores_the_initial_rendering() {
    let mut field = OtpField::new(4).unwrap();
    field.handle_event(&Event::Paste("9876".into()), AREA);
    field.settle();
    field.reset();
    assert_eq!(rendered_digits(&field), vec![" ", " ", " ", " "]);
    assert_eq!(field.focused(), 0);
    assert_eq!(field.len(), 4);
}

#[test]
fn disabled_field_ignores_events_from_the_dispatcher() {
    let mut field = OtpField::new(4).unwrap().with_disabled(true);
    assert!(field.handle_event(&key(KeyCode::Char('5')), AREA).is_empty());
    assert!(field
        .handle_event(&Event::Paste("1234".into()), AREA)
        .is_empty());
    field.handle_event(&click(8, 1), AREA);
    assert_eq!(field.focused(), 0);
    assert!(field.value().is_empty());
}

#[test]
fn container_block_insets_the_boxes() {
    let style = OtpStyle {
        container: Some(Block::bordered()),
        ..OtpStyle::default()
    };
    let field = OtpField::new(4).unwrap().with_style(style);
    let areas = field.box_areas(Rect::new(0, 0, 40, 5));
    assert_eq!(areas[0].x, 1);
    assert_eq!(areas[0].y, 1);
    assert_eq!(field.desired_width(), 25);
    assert_eq!(field.desired_height(), 5);
}

#[test]
fn six_digit_field_takes_only_six_of_nine_pasted() {
    let mut field = OtpField::new(6).unwrap();
    let signals = field.handle_event(&Event::Paste("123456789".into()), AREA);
    assert!(signals.contains(&OtpSignal::Submitted("123456".into())));
    assert_eq!(field.value(), "123456");
}
