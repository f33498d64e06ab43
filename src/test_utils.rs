//! Test utilities
//!
//! Proptest generators and an in-memory [`BuildEngine`] whose behaviour is
//! scripted per project, used to drive the coordinator deterministically.

#[cfg(test)]
pub mod generators {
    use proptest::prelude::*;

    /// Generate a project file name such as `core-lib.csproj`
    pub fn project_name() -> impl Strategy<Value = String> {
        ("[a-z][a-z0-9-]{0,12}", prop_oneof!["proj", "csproj", "vcxproj"])
            .prop_map(|(stem, ext)| format!("{stem}.{ext}"))
    }

    /// Generate between 1 and 12 distinct project names, in random order
    pub fn job_names() -> impl Strategy<Value = Vec<String>> {
        proptest::collection::btree_set(project_name(), 1..=12)
            .prop_map(|set| set.into_iter().collect::<Vec<_>>())
            .prop_shuffle()
    }
}

#[cfg(test)]
pub mod engine {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use crate::core::engine::{
        BuildEngine, BuildRequest, CompletionSender, EngineOutcome, Properties, SessionConfig,
    };
    use crate::core::job::BuildStatus;
    use crate::error::EngineError;

    /// What the engine does with one project
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Script {
        Succeed,
        Fail,
        /// `execute` returns an error
        EngineError,
        /// `submit` rejects the request
        RejectSubmit,
        /// `submit` accepts the request, then drops its completion sender
        DropCompletion,
    }

    #[derive(Default)]
    struct State {
        executed: Vec<String>,
        held: Vec<(String, CompletionSender)>,
        opens: usize,
        closes: usize,
        session_open: bool,
        last_config: Option<SessionConfig>,
        last_properties: Option<Properties>,
    }

    /// Scripted engine
    ///
    /// By default every project succeeds immediately. In holding mode,
    /// submitted requests wait until [`ScriptHandle::release`] is called.
    pub struct ScriptedEngine {
        scripts: HashMap<String, Script>,
        hold: bool,
        fail_open: bool,
        state: Arc<Mutex<State>>,
    }

    impl ScriptedEngine {
        pub fn new() -> Self {
            Self {
                scripts: HashMap::new(),
                hold: false,
                fail_open: false,
                state: Arc::new(Mutex::new(State::default())),
            }
        }

        pub fn holding() -> Self {
            Self {
                hold: true,
                ..Self::new()
            }
        }

        #[must_use]
        pub fn with_script(mut self, project: &str, script: Script) -> Self {
            self.scripts.insert(project.to_string(), script);
            self
        }

        #[must_use]
        pub fn failing_open(mut self) -> Self {
            self.fail_open = true;
            self
        }

        pub fn handle(&self) -> ScriptHandle {
            ScriptHandle {
                state: Arc::clone(&self.state),
            }
        }

        fn script_for(&self, request: &BuildRequest) -> Script {
            self.scripts
                .get(&request.job().display_name())
                .copied()
                .unwrap_or(Script::Succeed)
        }

        fn record(&self, request: &BuildRequest) {
            let mut state = self.state.lock().unwrap();
            state.executed.push(request.job().display_name());
            state.last_properties = Some(request.properties().clone());
        }
    }

    fn scripted_outcome(script: Script) -> EngineOutcome {
        match script {
            Script::Fail => EngineOutcome::failed("scripted failure", Duration::from_millis(1)),
            _ => EngineOutcome::succeeded(Duration::from_millis(1)),
        }
    }

    impl BuildEngine for ScriptedEngine {
        async fn execute(&self, request: BuildRequest) -> Result<EngineOutcome, EngineError> {
            self.record(&request);
            match self.script_for(&request) {
                Script::EngineError => Err(EngineError::Other("scripted engine error".to_string())),
                script => Ok(scripted_outcome(script)),
            }
        }

        fn open_session(&mut self, config: SessionConfig) -> Result<(), EngineError> {
            if self.fail_open {
                return Err(EngineError::Other("scripted open failure".to_string()));
            }
            let mut state = self.state.lock().unwrap();
            if state.session_open {
                return Err(EngineError::SessionAlreadyOpen);
            }
            state.session_open = true;
            state.opens += 1;
            state.last_config = Some(config);
            Ok(())
        }

        fn submit(&self, request: BuildRequest, completion: CompletionSender) -> Result<(), EngineError> {
            if !self.state.lock().unwrap().session_open {
                return Err(EngineError::NoSession);
            }
            let script = self.script_for(&request);
            if script == Script::RejectSubmit {
                return Err(EngineError::Other("scripted rejection".to_string()));
            }
            self.record(&request);

            match script {
                Script::DropCompletion => drop(completion),
                _ if self.hold => {
                    let name = request.job().display_name();
                    self.state.lock().unwrap().held.push((name, completion));
                }
                script => {
                    let _ = completion.send(scripted_outcome(script));
                }
            }
            Ok(())
        }

        fn close_session(&mut self) -> Result<(), EngineError> {
            let mut state = self.state.lock().unwrap();
            if !state.session_open {
                return Err(EngineError::NoSession);
            }
            state.session_open = false;
            state.closes += 1;
            Ok(())
        }
    }

    /// Shared view of a [`ScriptedEngine`] that outlives the coordinator borrow
    #[derive(Clone)]
    pub struct ScriptHandle {
        state: Arc<Mutex<State>>,
    }

    impl ScriptHandle {
        /// Projects in the order the engine received them
        pub fn executed(&self) -> Vec<String> {
            self.state.lock().unwrap().executed.clone()
        }

        pub fn opens(&self) -> usize {
            self.state.lock().unwrap().opens
        }

        pub fn closes(&self) -> usize {
            self.state.lock().unwrap().closes
        }

        pub fn last_config(&self) -> Option<SessionConfig> {
            self.state.lock().unwrap().last_config
        }

        pub fn last_properties(&self) -> Option<Properties> {
            self.state.lock().unwrap().last_properties.clone()
        }

        /// Complete a held request; returns false if nothing by that name is held
        pub fn release(&self, project: &str, status: BuildStatus) -> bool {
            let mut state = self.state.lock().unwrap();
            let Some(index) = state.held.iter().position(|(name, _)| name == project) else {
                return false;
            };
            let (_, completion) = state.held.remove(index);
            let outcome = match status {
                BuildStatus::Succeeded => EngineOutcome::succeeded(Duration::from_millis(1)),
                BuildStatus::Failed => EngineOutcome::failed("released as failed", Duration::from_millis(1)),
            };
            completion.send(outcome).is_ok()
        }

        /// Wait until at least `count` requests are held
        pub async fn wait_for_held(&self, count: usize) {
            tokio::time::timeout(Duration::from_secs(5), async {
                while self.state.lock().unwrap().held.len() < count {
                    tokio::time::sleep(Duration::from_millis(1)).await;
                }
            })
            .await
            .expect("requests were never submitted");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::generators::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn test_project_name_generator(name in project_name()) {
            prop_assert!(name.contains('.'));
            prop_assert!(name.chars().next().unwrap().is_ascii_lowercase());
        }

        #[test]
        fn test_job_names_are_distinct(names in job_names()) {
            let unique: HashSet<_> = names.iter().collect();
            prop_assert_eq!(unique.len(), names.len());
            prop_assert!(!names.is_empty() && names.len() <= 12);
        }
    }
}
