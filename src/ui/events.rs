use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Every way the user can poke the player, plus the periodic tick the run
/// loop feeds through the same dispatch path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    // UI events
    Quit,
    Tick,

    // Playback events
    TogglePlayPause,
    NextTrack,
    PreviousTrack,
    ToggleBitrate,

    // Seek events
    SeekForward,
    SeekBack,
    SeekPercent(u8),

    // Navigation events
    CursorUp,
    CursorDown,
    PlayCursor,
    NextFolder,
    PrevFolder,

    // Catalog events
    RefreshCatalog,
}

pub fn key_to_app_event(key: KeyEvent) -> Option<AppEvent> {
    match (key.code, key.modifiers) {
        (KeyCode::Char('c'), KeyModifiers::CONTROL) => Some(AppEvent::Quit),
        (KeyCode::Char('q'), KeyModifiers::NONE) | (KeyCode::Esc, _) => Some(AppEvent::Quit),

        // Playback controls
        (KeyCode::Char(' '), KeyModifiers::NONE) => Some(AppEvent::TogglePlayPause),
        (KeyCode::Char('n'), KeyModifiers::NONE) => Some(AppEvent::NextTrack),
        (KeyCode::Char('b'), KeyModifiers::NONE) => Some(AppEvent::PreviousTrack),
        (KeyCode::Char('m'), KeyModifiers::NONE) => Some(AppEvent::ToggleBitrate),

        // Seek bar: arrows nudge, digits jump to a tenth of the track
        (KeyCode::Right, _) => Some(AppEvent::SeekForward),
        (KeyCode::Left, _) => Some(AppEvent::SeekBack),
        (KeyCode::Char(c), KeyModifiers::NONE) if c.is_ascii_digit() => {
            let tenth = c as u8 - b'0';
            Some(AppEvent::SeekPercent(tenth * 10))
        }

        // Navigation
        (KeyCode::Up, _) => Some(AppEvent::CursorUp),
        (KeyCode::Down, _) => Some(AppEvent::CursorDown),
        (KeyCode::Enter, _) => Some(AppEvent::PlayCursor),
        (KeyCode::Tab, KeyModifiers::NONE) => Some(AppEvent::NextFolder),
        (KeyCode::BackTab, _) => Some(AppEvent::PrevFolder),

        // Catalog
        (KeyCode::F(5), _) => Some(AppEvent::RefreshCatalog),

        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn transport_keys() {
        assert_eq!(
            key_to_app_event(press(KeyCode::Char(' '))),
            Some(AppEvent::TogglePlayPause)
        );
        assert_eq!(
            key_to_app_event(press(KeyCode::Char('n'))),
            Some(AppEvent::NextTrack)
        );
        assert_eq!(
            key_to_app_event(press(KeyCode::Char('b'))),
            Some(AppEvent::PreviousTrack)
        );
    }

    #[test]
    fn digits_map_to_seek_percentages() {
        assert_eq!(
            key_to_app_event(press(KeyCode::Char('0'))),
            Some(AppEvent::SeekPercent(0))
        );
        assert_eq!(
            key_to_app_event(press(KeyCode::Char('3'))),
            Some(AppEvent::SeekPercent(30))
        );
        assert_eq!(
            key_to_app_event(press(KeyCode::Char('9'))),
            Some(AppEvent::SeekPercent(90))
        );
    }

    #[test]
    fn folder_tabs_and_refresh() {
        assert_eq!(
            key_to_app_event(press(KeyCode::Tab)),
            Some(AppEvent::NextFolder)
        );
        assert_eq!(
            key_to_app_event(press(KeyCode::BackTab)),
            Some(AppEvent::PrevFolder)
        );
        assert_eq!(
            key_to_app_event(press(KeyCode::F(5))),
            Some(AppEvent::RefreshCatalog)
        );
    }

    #[test]
    fn quit_variants() {
        assert_eq!(key_to_app_event(press(KeyCode::Char('q'))), Some(AppEvent::Quit));
        assert_eq!(key_to_app_event(press(KeyCode::Esc)), Some(AppEvent::Quit));
        assert_eq!(
            key_to_app_event(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Some(AppEvent::Quit)
        );
    }

    #[test]
    fn unmapped_keys_are_ignored() {
        assert_eq!(key_to_app_event(press(KeyCode::Char('z'))), None);
        assert_eq!(key_to_app_event(press(KeyCode::Home)), None);
    }
}
