use std::fmt;

/// Location of an element inside a nested expression array, as the list of
/// indices walked from the root. The root array itself is the empty path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpressionPath(Vec<usize>);

impl ExpressionPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, index: usize) {
        self.0.push(index);
    }

    pub fn pop(&mut self) {
        self.0.pop();
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }
}

impl fmt::Display for ExpressionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "<root>");
        }
        for idx in &self.0 {
            write!(f, "[{idx}]")?;
        }
        Ok(())
    }
}

/// A compilation error with the path of the offending element.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileError {
    pub message: String,
    pub path: ExpressionPath,
    pub kind: CompileErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileErrorKind {
    Malformed,
    UnsupportedConversion,
    DepthLimit { limit: usize },
}

impl CompileError {
    pub fn malformed(message: impl Into<String>, path: ExpressionPath) -> Self {
        Self {
            message: message.into(),
            path,
            kind: CompileErrorKind::Malformed,
        }
    }

    pub fn unsupported(found: impl Into<String>, path: ExpressionPath) -> Self {
        Self {
            message: found.into(),
            path,
            kind: CompileErrorKind::UnsupportedConversion,
        }
    }

    pub fn depth_limit(limit: usize, path: ExpressionPath) -> Self {
        Self {
            message: format!("nesting deeper than {limit} levels"),
            path,
            kind: CompileErrorKind::DepthLimit { limit },
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.kind {
            CompileErrorKind::Malformed => "malformed",
            CompileErrorKind::UnsupportedConversion => "unsupported",
            CompileErrorKind::DepthLimit { .. } => "depth",
        };
        write!(f, "[{label}] {}: {}", self.path, self.message)
    }
}

impl std::error::Error for CompileError {}
