use cwhile_parser::identifiers::Ident;

/// Names bound by the rewrite itself (range loop element bindings), with
/// user declarations able to shadow them for the rest of their block.
#[derive(Debug)]
pub(crate) struct BindingScope<T> {
    /// `None` marks a user declaration hiding an outer binding of the same
    /// name.
    entries: Vec<(Ident, Option<T>)>,
}

impl<T> Default for BindingScope<T> {
    fn default() -> Self {
        Self {
            entries: Default::default(),
        }
    }
}

impl<T: Copy> BindingScope<T> {
    pub(crate) fn lookup(&self, name: Ident) -> Option<T> {
        self.entries
            .iter()
            .rev()
            .find(|(bound, _)| *bound == name)
            .and_then(|(_, value)| *value)
    }

    pub(crate) fn bind(&mut self, name: Ident, value: T) {
        self.entries.push((name, Some(value)));
    }

    pub(crate) fn shadow(&mut self, name: Ident) {
        if self.lookup(name).is_some() {
            self.entries.push((name, None));
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn mark(&self) -> usize {
        self.entries.len()
    }

    /// Drops every binding made since `mark`.
    pub(crate) fn restore(&mut self, mark: usize) {
        self.entries.truncate(mark);
    }
}
