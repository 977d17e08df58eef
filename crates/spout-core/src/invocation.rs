//! A parsed command invocation.

use crate::options::{OptionValue, Options};

/// One structured command call, produced by a request parser and
/// consumed by the invocation engine.
#[derive(Debug, Clone, Default)]
pub struct Invocation {
    /// Command path, e.g. `["repo", "stat"]`.
    pub command: Vec<String>,
    /// Positional arguments.
    pub args: Vec<String>,
    /// Named options.
    pub options: Options,
}

impl Invocation {
    pub fn new(command: Vec<String>) -> Self {
        Self { command, args: Vec::new(), options: Options::new() }
    }

    /// Builder form used by tests and in-process callers.
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn with_option(mut self, name: impl Into<String>, value: OptionValue) -> Self {
        self.options.set(name, value);
        self
    }

    /// The leading command path segment, if any.
    pub fn root(&self) -> Option<&str> {
        self.command.first().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_collects_args_and_options() {
        let inv = Invocation::new(vec!["cat".to_string()])
            .with_arg("/tmp/a.txt")
            .with_option("encoding", OptionValue::Text("text".to_string()));

        assert_eq!(inv.root(), Some("cat"));
        assert_eq!(inv.args, vec!["/tmp/a.txt".to_string()]);
        assert_eq!(inv.options.encoding(), Some("text"));
    }
}
