/// Line editor for the filter prompt.
#[derive(Debug, Default)]
pub(super) struct Input {
    pub(super) buf: String,
    pub(super) cursor: usize,
    pub(super) active: bool,
}

impl Input {
    pub(super) fn begin(&mut self) {
        self.buf.clear();
        self.cursor = 0;
        self.active = true;
    }

    pub(super) fn cancel(&mut self) {
        self.buf.clear();
        self.cursor = 0;
        self.active = false;
    }

    pub(super) fn take(&mut self) -> String {
        self.active = false;
        self.cursor = 0;
        std::mem::take(&mut self.buf)
    }

    pub(super) fn insert_char(&mut self, c: char) {
        self.buf.insert(self.cursor, c);
        self.cursor += 1;
    }

    pub(super) fn backspace(&mut self) {
        if self.cursor == 0 {
            return;
        }
        self.cursor -= 1;
        self.buf.remove(self.cursor);
    }

    pub(super) fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub(super) fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.buf.len());
    }
}
