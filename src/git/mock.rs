use std::sync::Mutex;

use crate::error::Result;
use crate::git::GitClient;

type Handler = Box<dyn Fn(&str, &[&str]) -> Result<String> + Send + Sync>;

/// Git client answering from a closure instead of a real repository
pub struct MockClient {
    handler: Handler,
    calls: Mutex<Vec<String>>,
}

impl MockClient {
    /// Create a mock whose output is produced by `handler(subcmd, args)`
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&str, &[&str]) -> Result<String> + Send + Sync + 'static,
    {
        MockClient {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Mock that returns the same output for every command
    pub fn with_output(output: impl Into<String>) -> Self {
        let output = output.into();
        MockClient::new(move |_, _| Ok(output.clone()))
    }

    /// Every executed command line, in call order (e.g. `log v1.0.0..v1.1.0 --no-decorate ...`)
    pub fn calls(&self) -> Vec<String> {
        match self.calls.lock() {
            Ok(calls) => calls.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl GitClient for MockClient {
    fn exec(&self, subcmd: &str, args: &[&str]) -> Result<String> {
        let line = std::iter::once(subcmd)
            .chain(args.iter().copied())
            .collect::<Vec<_>>()
            .join(" ");
        match self.calls.lock() {
            Ok(mut calls) => calls.push(line),
            Err(poisoned) => poisoned.into_inner().push(line),
        }

        (self.handler)(subcmd, args)
    }
}
