//! A growable arena addressed by small, `Copy` handles.
//!
//! Tokens produced by the lexer are stored here rather than owned directly by the AST or by
//! macro bodies, so that a macro definition can capture a range of tokens once and every
//! expansion (and every AST node built from the expansion) can refer back to the same
//! storage by [`Id<T>`] instead of cloning token data around.

use std::{
    fmt::{self, Debug},
    hash::{Hash, Hasher},
    marker::PhantomData,
    num::NonZeroU32,
};

use crate::{source::SourceFileId, span::Span};

/// ID of an element within an [`Arena<T>`].
pub struct Id<T> {
    index: NonZeroU32,
    _phantom_data: PhantomData<T>,
}

/// Arena which maps singular elements of source files onto their source file IDs.
///
/// Elements are typically tokens, but the same scheme is reused for anything keyed by
/// "where in the source did this come from": lexer errors, trivia runs, and so on.
#[derive(Debug, Clone)]
pub struct Arena<T> {
    source_file_id_mapping: Vec<(Id<T>, SourceFileId)>,
    elements: Vec<T>,
}

impl<T> Arena<T> {
    pub fn new() -> Self {
        Self {
            source_file_id_mapping: vec![],
            elements: vec![],
        }
    }

    fn current_element_id(&self) -> Id<T> {
        Id {
            // SAFETY: Always adds 1 to the u32, therefore it can never be zero.
            index: unsafe { NonZeroU32::new_unchecked(self.elements.len() as u32 + 1) },
            _phantom_data: PhantomData,
        }
    }

    pub fn build_source_file(&mut self, source_file_id: SourceFileId) -> ArenaBuilder<T> {
        let start = self.current_element_id();
        self.source_file_id_mapping.push((start, source_file_id));
        ArenaBuilder {
            arena: self,
            start,
        }
    }

    pub fn element(&self, id: Id<T>) -> &T {
        &self.elements[(u32::from(id.index) - 1) as usize]
    }

    pub fn source_file_id(&self, id: Id<T>) -> SourceFileId {
        match self
            .source_file_id_mapping
            .binary_search_by_key(&id, |&(element_id, _)| element_id)
        {
            Ok(i) => self.source_file_id_mapping[i].1,
            Err(i) => self.source_file_id_mapping[i - 1].1,
        }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Appends elements belonging to a single source file onto an [`Arena<T>`].
#[derive(Debug)]
pub struct ArenaBuilder<'a, T> {
    arena: &'a mut Arena<T>,
    start: Id<T>,
}

impl<'a, T> ArenaBuilder<'a, T> {
    pub fn push(&mut self, element: T) -> Id<T> {
        let id = self.arena.current_element_id();
        self.arena.elements.push(element);
        id
    }

    pub fn arena(&self) -> &Arena<T> {
        self.arena
    }

    pub fn finish(self) -> Span<T> {
        let end = self.arena.current_element_id();
        Span::Spanning {
            start: self.start,
            end,
        }
    }
}

impl<T> Id<T> {
    pub fn successor(self) -> Self {
        Self {
            index: self.index.saturating_add(1),
            _phantom_data: PhantomData,
        }
    }

    pub fn successor_in(self, span: Span<T>) -> Option<Self> {
        match span {
            Span::Empty => None,
            Span::Spanning { end, .. } => (self < end).then_some(self.successor()),
        }
    }
}

impl<T> Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.index, f)
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for Id<T> {}

impl<T> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.index.cmp(&other.index)
    }
}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}
