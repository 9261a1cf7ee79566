use std::{collections::VecDeque, sync::Arc};

use parking_lot::{Mutex, ReentrantMutex};

use crate::{
  error::Error,
  observable::Observable,
  observer::Subscriber,
  var::Var,
};

#[derive(Clone)]
enum Terminal {
  Error(Error),
  Complete,
}

/// What a new subscriber is shown before live pushes.
pub(crate) enum Replay {
  Nothing,
  Latest(Var),
  Buffer { items: VecDeque<Var>, capacity: Option<usize> },
}

impl Replay {
  fn record(&mut self, value: &Var) {
    match self {
      Replay::Nothing => {}
      Replay::Latest(latest) => *latest = value.clone(),
      Replay::Buffer { items, capacity } => {
        if *capacity == Some(0) {
          return;
        }
        items.push_back(value.clone());
        if let Some(capacity) = *capacity {
          while items.len() > capacity {
            items.pop_front();
          }
        }
      }
    }
  }

  fn snapshot(&self) -> Vec<Var> {
    match self {
      Replay::Nothing => vec![],
      Replay::Latest(latest) => vec![latest.clone()],
      Replay::Buffer { items, .. } => items.iter().cloned().collect(),
    }
  }
}

struct State {
  subscribers: Vec<Subscriber>,
  terminal: Option<Terminal>,
  replay: Replay,
}

/// State shared by all subject flavours.
///
/// Mutation happens under `state`; delivery happens outside it, serialized
/// by `emitting` so that every subscriber sees pushes in one order.
/// `emitting` is reentrant because an observer may push into the subject it
/// is observing.
pub(crate) struct SubjectCore {
  state: Mutex<State>,
  emitting: ReentrantMutex<()>,
}

impl SubjectCore {
  pub(crate) fn new(replay: Replay) -> Arc<Self> {
    Arc::new(SubjectCore {
      state: Mutex::new(State { subscribers: vec![], terminal: None, replay }),
      emitting: ReentrantMutex::new(()),
    })
  }

  pub(crate) fn next(&self, value: Var) {
    let _emitting = self.emitting.lock();
    let subscribers = {
      let mut state = self.state.lock();
      if state.terminal.is_some() {
        return;
      }
      state.replay.record(&value);
      state.subscribers.retain(|s| !s.is_disposed());
      state.subscribers.clone()
    };
    for subscriber in subscribers {
      subscriber.next(value.clone());
    }
  }

  pub(crate) fn error(&self, err: Error) { self.terminate(Terminal::Error(err)) }

  pub(crate) fn complete(&self) { self.terminate(Terminal::Complete) }

  fn terminate(&self, terminal: Terminal) {
    let _emitting = self.emitting.lock();
    let subscribers = {
      let mut state = self.state.lock();
      if state.terminal.is_some() {
        return;
      }
      state.terminal = Some(terminal.clone());
      std::mem::take(&mut state.subscribers)
    };
    for subscriber in subscribers {
      deliver_terminal(&subscriber, &terminal);
    }
  }

  pub(crate) fn subscribe(&self, subscriber: Subscriber) {
    let _emitting = self.emitting.lock();
    let (replay, terminal) = {
      let mut state = self.state.lock();
      // After termination only a replay buffer is still shown.
      let replay = match (&state.terminal, &state.replay) {
        (None, replay) | (Some(_), replay @ Replay::Buffer { .. }) => replay.snapshot(),
        _ => vec![],
      };
      if state.terminal.is_none() {
        state.subscribers.retain(|s| !s.is_disposed());
        state.subscribers.push(subscriber.clone());
      }
      (replay, state.terminal.clone())
    };
    for value in replay {
      subscriber.next(value);
    }
    if let Some(terminal) = terminal {
      deliver_terminal(&subscriber, &terminal);
    }
  }

  pub(crate) fn latest(&self) -> Option<Var> {
    match &self.state.lock().replay {
      Replay::Latest(latest) => Some(latest.clone()),
      _ => None,
    }
  }

  pub(crate) fn is_terminated(&self) -> bool { self.state.lock().terminal.is_some() }

  pub(crate) fn subscriber_count(&self) -> usize {
    let mut state = self.state.lock();
    state.subscribers.retain(|s| !s.is_disposed());
    state.subscribers.len()
  }

  pub(crate) fn observable(self: &Arc<Self>) -> Observable {
    let core = self.clone();
    Observable::from_fn(move |subscriber| core.subscribe(subscriber))
  }
}

fn deliver_terminal(subscriber: &Subscriber, terminal: &Terminal) {
  match terminal {
    Terminal::Error(err) => subscriber.error(err.clone()),
    Terminal::Complete => subscriber.complete(),
  }
}
