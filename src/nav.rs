//! Keyboard-driven cursor over the cache's ordered view. The machine never
//! caches a list length: every transition clamps against the length handed
//! in at transition time, so background sync churn cannot strand the cursor.

use crate::model::GistId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavState {
    Inactive,
    ListFocused(usize),
    PreviewFocused(usize),
}

/// What the key dispatcher knows about the keystroke it is forwarding.
#[derive(Clone, Copy, Debug)]
pub struct KeyContext {
    /// Focus currently sits inside an editable text field.
    pub text_input_active: bool,
    /// The keystroke carries a modifier (chorded shortcut).
    pub modified: bool,
}

#[derive(Debug, Default)]
pub struct Navigator {
    state: NavState,
    /// UI-visible selection, orthogonal to keyboard focus.
    active: Option<GistId>,
}

impl Default for NavState {
    fn default() -> Self {
        NavState::Inactive
    }
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> NavState {
        self.state
    }

    pub fn active_selection(&self) -> Option<&GistId> {
        self.active.as_ref()
    }

    pub fn focused_index(&self) -> Option<usize> {
        match self.state {
            NavState::Inactive => None,
            NavState::ListFocused(i) | NavState::PreviewFocused(i) => Some(i),
        }
    }

    /// Unmodified single keys are suppressed while a text input has focus;
    /// chorded shortcuts always pass.
    pub fn accepts(&self, ctx: KeyContext) -> bool {
        ctx.modified || !ctx.text_input_active
    }

    /// Explicit engagement with the list surface.
    pub fn activate(&mut self, len: usize) {
        if self.state == NavState::Inactive && len > 0 {
            self.state = NavState::ListFocused(0);
        }
    }

    pub fn move_next(&mut self, len: usize) {
        self.step(len, 1)
    }

    pub fn move_prev(&mut self, len: usize) {
        self.step(len, -1)
    }

    fn step(&mut self, len: usize, delta: isize) {
        let Some(i) = self.focused_index() else {
            return;
        };
        if len == 0 {
            return;
        }
        let next = if delta < 0 {
            i.saturating_sub(delta.unsigned_abs())
        } else {
            i.saturating_add(delta as usize)
        };
        let clamped = next.min(len - 1);
        self.state = match self.state {
            NavState::PreviewFocused(_) => NavState::PreviewFocused(clamped),
            _ => NavState::ListFocused(clamped),
        };
    }

    pub fn jump_first(&mut self, len: usize) {
        if self.focused_index().is_some() && len > 0 {
            self.state = match self.state {
                NavState::PreviewFocused(_) => NavState::PreviewFocused(0),
                _ => NavState::ListFocused(0),
            };
        }
    }

    /// List -> preview, only when the focused record has something to show.
    pub fn focus_preview(&mut self, focused_has_files: bool) {
        if let NavState::ListFocused(i) = self.state
            && focused_has_files
        {
            self.state = NavState::PreviewFocused(i);
        }
    }

    pub fn focus_list(&mut self) {
        if let NavState::PreviewFocused(i) = self.state {
            self.state = NavState::ListFocused(i);
        }
    }

    pub fn escape(&mut self) {
        self.state = NavState::Inactive;
    }

    /// Mark the focused identity as the active selection. No state change.
    pub fn select(&mut self, ids: &[GistId]) -> Option<GistId> {
        let i = self.focused_index()?;
        let id = ids.get(i)?.clone();
        self.active = Some(id.clone());
        Some(id)
    }

    pub fn clear_selection(&mut self) {
        self.active = None;
    }

    /// Re-clamp after the underlying view changed. Focus survives shrinkage
    /// by moving to the new last index; only an empty view deactivates.
    pub fn on_view_changed(&mut self, len: usize) {
        let Some(i) = self.focused_index() else {
            return;
        };
        if len == 0 {
            self.state = NavState::Inactive;
            return;
        }
        if i > len - 1 {
            let last = len - 1;
            self.state = match self.state {
                NavState::PreviewFocused(_) => NavState::PreviewFocused(last),
                _ => NavState::ListFocused(last),
            };
        }
    }

    /// Drop a selection whose record no longer exists.
    pub fn prune_selection(&mut self, ids: &[GistId]) {
        if let Some(active) = &self.active
            && !ids.contains(active)
        {
            self.active = None;
        }
    }
}
