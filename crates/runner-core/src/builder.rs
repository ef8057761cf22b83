use crate::command::Command;
use crate::sequence::Sequence;

/// Fluent construction of a [`Sequence`].
///
/// The child list is fixed once [`SequenceBuilder::build`] is called.
///
/// ```
/// use runner_core::{Sequence, SequenceBuilder};
///
/// let seq: Sequence = SequenceBuilder::new()
///     .then(Sequence::empty())
///     .then_if(false, Sequence::empty())
///     .build();
///
/// assert_eq!(seq.len(), 1);
/// ```
#[derive(Default)]
pub struct SequenceBuilder {
    name: Option<String>,
    commands: Vec<Box<dyn Command>>,
}

impl SequenceBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Name the sequence being built.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Append a command.
    #[must_use]
    pub fn then<C>(self, command: C) -> Self
    where
        C: Command + 'static,
    {
        self.then_boxed(Box::new(command))
    }

    #[must_use]
    pub fn then_boxed(mut self, command: Box<dyn Command>) -> Self {
        self.commands.push(command);
        self
    }

    /// Append `command` only when `condition` holds.
    #[must_use]
    pub fn then_if<C>(self, condition: bool, command: C) -> Self
    where
        C: Command + 'static,
    {
        if condition { self.then(command) } else { self }
    }

    /// Append a nested sequence built from `build`.
    #[must_use]
    pub fn group(self, build: impl FnOnce(SequenceBuilder) -> SequenceBuilder) -> Self {
        self.then(build(SequenceBuilder::new()).build())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    #[must_use]
    pub fn build(self) -> Sequence {
        let sequence = Sequence::new(self.commands);
        match self.name {
            Some(name) => sequence.with_name(name),
            None => sequence,
        }
    }
}

impl Extend<Box<dyn Command>> for SequenceBuilder {
    fn extend<I: IntoIterator<Item = Box<dyn Command>>>(&mut self, iter: I) {
        self.commands.extend(iter);
    }
}
