use serde::Serialize;

#[derive(PartialEq, Eq, Debug, Serialize, Clone)]
pub struct Todo {
    pub id: u64,
    pub text: String,
    pub done: bool,
}

/// Flat to-do list. Every operation keeps the insertion order of the surviving items.
#[derive(PartialEq, Eq, Debug, Serialize, Clone, Default)]
#[serde(transparent)]
pub struct TaskList(Vec<Todo>);

impl TaskList {
    /// Builds a list from already validated items, dropping repeated ids.
    pub fn from_items(items: impl IntoIterator<Item = Todo>) -> Self {
        let mut list = Vec::<Todo>::new();
        for item in items {
            if list.iter().all(|existing| existing.id != item.id) {
                list.push(item);
            }
        }
        Self(list)
    }

    /// One past the highest id. Once that runs out of range, the lowest free id from 1 up.
    fn next_id(&self) -> u64 {
        match self.0.iter().map(|todo| todo.id).max() {
            None => 1,
            Some(max) => max.checked_add(1).unwrap_or_else(|| {
                (1..)
                    .find(|id| self.0.iter().all(|todo| todo.id != *id))
                    .unwrap_or(0)
            }),
        }
    }

    /// Appends a new open task. Returns `None` when the text is blank.
    pub fn add(&mut self, text: &str) -> Option<&Todo> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let todo = Todo {
            id: self.next_id(),
            text: text.to_string(),
            done: false,
        };
        self.0.push(todo);
        self.0.last()
    }

    /// Flips the done flag. Returns the new value, or `None` for unknown ids.
    pub fn toggle(&mut self, id: u64) -> Option<bool> {
        let todo = self.0.iter_mut().find(|todo| todo.id == id)?;
        todo.done = !todo.done;
        Some(todo.done)
    }

    pub fn delete(&mut self, id: u64) -> bool {
        let before = self.0.len();
        self.0.retain(|todo| todo.id != id);
        before != self.0.len()
    }

    /// Returns the number of removed tasks.
    pub fn clear_completed(&mut self) -> usize {
        let before = self.0.len();
        self.0.retain(|todo| !todo.done);
        before - self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Todo> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn completed(&self) -> usize {
        self.0.iter().filter(|todo| todo.done).count()
    }
}
