//! Active variable context.
//!
//! A [`Scope`] is a chain of frames, innermost first: one frame per enclosing
//! `FOREACH` iteration, ending in the root [`Variables`]. Frames borrow their
//! data, so entering an iteration costs three small values and no cloning.

use crate::value::{Value, Variables};

/// Zero-based position of the current `FOREACH` item.
pub const INDEX_KEY: &str = "_INDEX";
/// `true` only for the first `FOREACH` item.
pub const FIRST_KEY: &str = "_FIRST";
/// `true` only for the last `FOREACH` item.
pub const LAST_KEY: &str = "_LAST";
/// The item itself, when a `FOREACH` item is not a mapping.
pub const ITEM_KEY: &str = "_ITEM";

#[derive(Debug)]
pub(crate) struct Scope<'a> {
    frame: Frame<'a>,
    parent: Option<&'a Scope<'a>>,
}

#[derive(Debug)]
enum Frame<'a> {
    Root(&'a Variables),
    Iteration {
        item: &'a Value,
        index: Value,
        first: Value,
        last: Value,
    },
}

impl Frame<'_> {
    /// Iteration lookups prefer metadata, then the item's own entries.
    fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Frame::Root(vars) => vars.get(key),
            Frame::Iteration {
                item,
                index,
                first,
                last,
            } => match key {
                INDEX_KEY => Some(index),
                FIRST_KEY => Some(first),
                LAST_KEY => Some(last),
                _ => match item {
                    Value::Map(map) => map.get(key),
                    scalar if key == ITEM_KEY => Some(*scalar),
                    _ => None,
                },
            },
        }
    }
}

impl<'a> Scope<'a> {
    pub(crate) fn root(vars: &'a Variables) -> Self {
        Self {
            frame: Frame::Root(vars),
            parent: None,
        }
    }

    /// Enters one iteration of a `FOREACH` over a sequence of `len` items.
    pub(crate) fn iteration<'s>(&'s self, item: &'s Value, index: usize, len: usize) -> Scope<'s> {
        Scope {
            frame: Frame::Iteration {
                item,
                index: Value::from(index),
                first: Value::Bool(index == 0),
                last: Value::Bool(index + 1 == len),
            },
            parent: Some(self),
        }
    }

    /// Resolves a possibly dotted name.
    ///
    /// The full name is tried as a key first; otherwise the first segment is
    /// resolved through the frame chain and the rest with
    /// [`Value::get_path`].
    pub(crate) fn lookup(&self, name: &str) -> Option<&Value> {
        if let Some(value) = self.get(name) {
            return Some(value);
        }

        let (head, tail) = name.split_once('.')?;
        let rest: Vec<&str> = tail.split('.').collect();
        self.get(head)?.get_path(&rest)
    }

    /// Looks up an exact key, innermost frame first.
    fn get(&self, key: &str) -> Option<&Value> {
        let mut scope = Some(self);
        while let Some(current) = scope {
            if let Some(value) = current.frame.get(key) {
                return Some(value);
            }
            scope = current.parent;
        }
        None
    }
}
