use crate::value::{DeclaredType, Value};
use std::collections::HashMap;
use thiserror::Error;

/// Index of a frame in the [`Environment`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameId(usize);

#[derive(Debug, Error, PartialEq)]
pub enum EnvError {
    #[error("Undefined variable '{0}'")]
    Undefined(String),
    #[error("Variable '{0}' is already declared in this scope")]
    AlreadyDeclared(String),
    #[error("Type mismatch: cannot assign {value} to '{name}' of type {expected}")]
    TypeMismatch {
        value: String,
        name: String,
        expected: DeclaredType,
    },
}

#[derive(Debug, Clone)]
struct Binding {
    value: Value,
    declared_type: DeclaredType,
}

#[derive(Debug, Default)]
struct Frame {
    values: HashMap<String, Binding>,
    parent: Option<FrameId>,
}

/// Scope chain stored as a stack of frames. A frame's parent always sits
/// below it, so discarding the innermost frame never leaves a dangling link.
#[derive(Debug)]
pub struct Environment {
    frames: Vec<Frame>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    pub fn new() -> Self {
        Self {
            frames: vec![Frame::default()],
        }
    }

    pub fn root(&self) -> FrameId {
        FrameId(0)
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Opens a frame whose lookups fall back to `parent`.
    pub fn push_frame(&mut self, parent: FrameId) -> FrameId {
        self.frames.push(Frame {
            values: HashMap::new(),
            parent: Some(parent),
        });
        FrameId(self.frames.len() - 1)
    }

    /// Discards the innermost frame. The root frame is never removed.
    pub fn pop_frame(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    /// Binds `name` in `frame`. Integer and floating values are converted to
    /// the declared type; any other mismatch is recorded as-is. A name keeps
    /// its declared type for the lifetime of its frame, so declaring it twice
    /// in the same frame fails. Child frames may shadow it.
    pub fn define(
        &mut self,
        frame: FrameId,
        name: &str,
        declared_type: DeclaredType,
        value: Value,
    ) -> Result<(), EnvError> {
        let values = &mut self.frames[frame.0].values;
        if values.contains_key(name) {
            return Err(EnvError::AlreadyDeclared(name.to_string()));
        }

        values.insert(
            name.to_string(),
            Binding {
                value: value.coerce_numeric(declared_type),
                declared_type,
            },
        );
        Ok(())
    }

    pub fn get(&self, frame: FrameId, name: &str) -> Result<Value, EnvError> {
        self.lookup(frame, name)
            .map(|binding| binding.value.clone())
            .ok_or_else(|| EnvError::Undefined(name.to_string()))
    }

    pub fn get_type(&self, frame: FrameId, name: &str) -> Result<DeclaredType, EnvError> {
        self.lookup(frame, name)
            .map(|binding| binding.declared_type)
            .ok_or_else(|| EnvError::Undefined(name.to_string()))
    }

    /// Stores `value` in the nearest frame that declares `name`, checked
    /// against that frame's declared type. Returns the value actually stored.
    pub fn assign(&mut self, frame: FrameId, name: &str, value: Value) -> Result<Value, EnvError> {
        let owner = self
            .owner_of(frame, name)
            .ok_or_else(|| EnvError::Undefined(name.to_string()))?;

        let binding = self.frames[owner.0]
            .values
            .get_mut(name)
            .ok_or_else(|| EnvError::Undefined(name.to_string()))?;

        let expected = binding.declared_type;
        let compatible = match value.shape() {
            Some(actual) => {
                actual == expected
                    || matches!(
                        (expected, actual),
                        (DeclaredType::Integer, DeclaredType::Float)
                            | (DeclaredType::Float, DeclaredType::Integer)
                    )
            }
            None => false,
        };

        if !compatible {
            return Err(EnvError::TypeMismatch {
                value: describe(&value),
                name: name.to_string(),
                expected,
            });
        }

        binding.value = value.coerce_numeric(expected);
        Ok(binding.value.clone())
    }

    fn lookup(&self, frame: FrameId, name: &str) -> Option<&Binding> {
        self.owner_of(frame, name)
            .and_then(|owner| self.frames[owner.0].values.get(name))
    }

    fn owner_of(&self, frame: FrameId, name: &str) -> Option<FrameId> {
        let mut current = Some(frame);
        while let Some(id) = current {
            let frame = &self.frames[id.0];
            if frame.values.contains_key(name) {
                return Some(id);
            }
            current = frame.parent;
        }
        None
    }
}

fn describe(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s),
        Value::Char(c) => format!("'{}'", c),
        other => other.to_string(),
    }
}
