use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::nav::KeyContext;

use super::app::{App, Filter};

pub(super) fn handle_key(app: &mut App, key: KeyEvent) {
    let modified = key
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT);
    let ctx = KeyContext {
        text_input_active: app.input.active,
        modified,
    };

    if !app.nav.accepts(ctx) {
        // Unmodified keys belong to the open filter prompt.
        handle_filter_input(app, key);
        return;
    }

    // Chorded shortcuts stay live even while the prompt has focus.
    if modified {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('r') {
            app.run_sync();
        }
        return;
    }

    let ids = app.visible_ids();
    let len = ids.len();
    match key.code {
        KeyCode::Char('q') => app.quit = true,
        KeyCode::Char('s') => app.run_sync(),
        KeyCode::Char('/') => app.input.begin(),
        KeyCode::Char('c') => {
            app.filter = Filter::All;
            app.reconcile_view();
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.nav.activate(len);
            app.nav.move_next(len);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.nav.activate(len);
            app.nav.move_prev(len);
        }
        KeyCode::Char('g') => app.nav.jump_first(len),
        KeyCode::Tab => {
            let has_files = app
                .nav
                .focused_index()
                .and_then(|i| ids.get(i))
                .and_then(|id| app.engine.cache().get(id))
                .is_some_and(|r| !r.files.is_empty());
            if has_files {
                app.nav.focus_preview(true);
            } else {
                app.nav.focus_list();
            }
        }
        KeyCode::Enter => {
            if app.nav.state() == crate::nav::NavState::Inactive {
                app.nav.activate(len);
            }
            app.nav.select(&ids);
        }
        KeyCode::Esc => app.nav.escape(),
        KeyCode::Char('d') => delete_focused(app, &ids),
        _ => {}
    }
}

fn delete_focused(app: &mut App, ids: &[crate::model::GistId]) {
    let Some(id) = app.nav.focused_index().and_then(|i| ids.get(i)) else {
        return;
    };
    match app.engine.submit_delete(id) {
        Ok(()) => app.status = Some(format!("deleting {id}...")),
        Err(err) => app.status = Some(format!("{err:#}")),
    }
    app.reconcile_view();
}

fn handle_filter_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.input.cancel(),
        KeyCode::Enter => {
            let raw = app.input.take();
            app.filter = parse_filter(&raw);
            app.reconcile_view();
        }
        KeyCode::Backspace => app.input.backspace(),
        KeyCode::Left => app.input.move_left(),
        KeyCode::Right => app.input.move_right(),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.input.insert_char(c);
        }
        _ => {}
    }
}

/// `lang:rust`, `tag:todo`, or bare text treated as a language id.
fn parse_filter(raw: &str) -> Filter {
    let raw = raw.trim();
    if raw.is_empty() {
        return Filter::All;
    }
    if let Some(tag) = raw.strip_prefix("tag:") {
        return Filter::Tag(tag.trim().to_string());
    }
    if let Some(lang) = raw.strip_prefix("lang:") {
        return Filter::Language(lang.trim().to_string());
    }
    Filter::Language(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::RemoteConfig;
    use crate::remote::HttpRemote;
    use crate::store::LocalStore;
    use crate::sync::SyncEngine;

    fn test_app(dir: &std::path::Path) -> App {
        let store = LocalStore::init(dir).unwrap();
        // Nothing listens here; any sync attempt fails fast.
        let remote = HttpRemote::new(
            RemoteConfig {
                base_url: "http://127.0.0.1:9".to_string(),
            },
            "token".to_string(),
        )
        .unwrap();
        App::new(SyncEngine::new(remote), store)
    }

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn open_filter_prompt_captures_unmodified_keys() {
        let tmp = tempfile::tempdir().unwrap();
        let mut app = test_app(tmp.path());
        app.input.begin();
        handle_key(&mut app, press(KeyCode::Char('q'), KeyModifiers::NONE));
        handle_key(&mut app, press(KeyCode::Char('x'), KeyModifiers::NONE));
        assert!(!app.quit);
        assert_eq!(app.input.buf, "qx");
    }

    #[test]
    fn chorded_resync_stays_live_while_the_prompt_is_open() {
        let tmp = tempfile::tempdir().unwrap();
        let mut app = test_app(tmp.path());
        app.input.begin();
        handle_key(&mut app, press(KeyCode::Char('r'), KeyModifiers::CONTROL));
        // The chord reached the sync path instead of the filter buffer.
        assert!(
            app.status
                .as_deref()
                .is_some_and(|s| s.starts_with("sync failed"))
        );
        assert!(app.input.active);
        assert!(app.input.buf.is_empty());
    }

    #[test]
    fn filter_text_parses_into_bucket_filters() {
        assert_eq!(parse_filter("tag: todo"), Filter::Tag("todo".to_string()));
        assert_eq!(
            parse_filter("lang:rust"),
            Filter::Language("rust".to_string())
        );
        assert_eq!(
            parse_filter("python"),
            Filter::Language("python".to_string())
        );
        assert_eq!(parse_filter("  "), Filter::All);
    }
}
