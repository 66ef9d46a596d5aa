use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

/// The playback engine as the controller sees it. One stream at a time;
/// `load` replaces the current stream and leaves it paused so callers decide
/// when sound starts. Position and duration are polled every UI tick, which
/// also stands in for end-of-track callbacks via `is_finished`.
#[async_trait(?Send)]
pub trait AudioBackend {
    async fn load(&mut self, url: &str) -> Result<()>;
    fn play(&mut self);
    fn pause(&mut self);
    fn seek(&mut self, position: Duration) -> Result<()>;
    fn position(&self) -> Duration;
    /// Total length of the loaded stream, when the decoder knows it.
    fn duration(&self) -> Option<Duration>;
    /// True when the loaded stream has drained, or nothing is loaded.
    fn is_finished(&self) -> bool;
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Shared view into a [`ScriptedBackend`], kept by the test while the
    /// backend itself is boxed away behind the trait.
    #[derive(Debug, Default)]
    pub struct ScriptedState {
        pub loaded: Vec<String>,
        pub playing: bool,
        pub position: Duration,
        pub duration: Option<Duration>,
        pub finished: bool,
        pub seeks: Vec<Duration>,
        pub fail_next_load: bool,
    }

    /// Scripted engine for exercising transport logic without a sound
    /// device. Records every call; tests poke the shared state to simulate
    /// decoder behavior.
    #[derive(Debug)]
    pub struct ScriptedBackend {
        state: Rc<RefCell<ScriptedState>>,
    }

    impl ScriptedBackend {
        pub fn new() -> (Self, Rc<RefCell<ScriptedState>>) {
            let state = Rc::new(RefCell::new(ScriptedState::default()));
            (
                Self {
                    state: Rc::clone(&state),
                },
                state,
            )
        }
    }

    #[async_trait(?Send)]
    impl AudioBackend for ScriptedBackend {
        async fn load(&mut self, url: &str) -> Result<()> {
            let mut state = self.state.borrow_mut();
            if state.fail_next_load {
                state.fail_next_load = false;
                anyhow::bail!("scripted load failure");
            }
            state.loaded.push(url.to_string());
            state.position = Duration::ZERO;
            state.finished = false;
            state.playing = false;
            Ok(())
        }

        fn play(&mut self) {
            self.state.borrow_mut().playing = true;
        }

        fn pause(&mut self) {
            self.state.borrow_mut().playing = false;
        }

        fn seek(&mut self, position: Duration) -> Result<()> {
            let mut state = self.state.borrow_mut();
            state.seeks.push(position);
            state.position = position;
            Ok(())
        }

        fn position(&self) -> Duration {
            self.state.borrow().position
        }

        fn duration(&self) -> Option<Duration> {
            self.state.borrow().duration
        }

        fn is_finished(&self) -> bool {
            self.state.borrow().finished
        }
    }
}
