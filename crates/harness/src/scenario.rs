//! Scenario definition
//!
//! A scenario is an immutable, ordered list of named steps. Each step is a
//! closure over its captured parameters that borrows the session for the
//! duration of one call.

use futures::future::BoxFuture;

use crate::outcome::ActionResult;
use crate::session::Session;

pub type StepFn<S> = Box<dyn for<'s> Fn(&'s S) -> BoxFuture<'s, ActionResult> + Send + Sync>;

pub struct NamedStep<S: Session> {
    pub name: String,
    pub(crate) run: StepFn<S>,
}

pub struct Scenario<S: Session> {
    pub name: String,
    pub(crate) steps: Vec<NamedStep<S>>,
}

impl<S: Session> Scenario<S> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    /// Append a step.
    ///
    /// ```ignore
    /// scenario.step("login", move |s| {
    ///     let config = config.clone();
    ///     async move { steps::login(s, &config).await }.boxed()
    /// })
    /// ```
    pub fn step<F>(mut self, name: impl Into<String>, run: F) -> Self
    where
        F: for<'s> Fn(&'s S) -> BoxFuture<'s, ActionResult> + Send + Sync + 'static,
    {
        self.steps.push(NamedStep {
            name: name.into(),
            run: Box::new(run),
        });
        self
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl<S: Session> std::fmt::Debug for Scenario<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scenario")
            .field("name", &self.name)
            .field("steps", &self.step_names())
            .finish()
    }
}
