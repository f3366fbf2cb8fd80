use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Local cursor motion. Never sent to the server.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Motion {
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
}

/// What a captured key means to the editor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyAction {
    Insert(char),
    Newline,
    Backspace,
    Move(Motion),
    Quit,
    /// Anything else: handled locally (or not at all), no edit produced.
    PassThrough,
}

pub fn map_key(key: &KeyEvent) -> KeyAction {
    if key.kind == KeyEventKind::Release {
        return KeyAction::PassThrough;
    }

    let control = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);

    match key.code {
        KeyCode::Char('c') if control => KeyAction::Quit,
        // Ctrl-H is how some terminals report backspace.
        KeyCode::Char('h') if control => KeyAction::Backspace,
        KeyCode::Char(_) if control || alt => KeyAction::PassThrough,
        KeyCode::Char(ch) => KeyAction::Insert(ch),
        KeyCode::Enter => KeyAction::Newline,
        KeyCode::Backspace => KeyAction::Backspace,
        KeyCode::Left => KeyAction::Move(Motion::Left),
        KeyCode::Right => KeyAction::Move(Motion::Right),
        KeyCode::Up => KeyAction::Move(Motion::Up),
        KeyCode::Down => KeyAction::Move(Motion::Down),
        KeyCode::Home => KeyAction::Move(Motion::Home),
        KeyCode::End => KeyAction::Move(Motion::End),
        _ => KeyAction::PassThrough,
    }
}
