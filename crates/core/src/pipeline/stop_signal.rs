use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Polled once per loop iteration, after the frame has been emitted.
pub trait StopSignal: Send {
    fn should_stop(&mut self) -> bool;
}

/// Runs until the source is exhausted.
pub struct NeverStop;

impl StopSignal for NeverStop {
    fn should_stop(&mut self) -> bool {
        false
    }
}

/// Shared flag raised from another thread (key listener, Ctrl-C handler).
#[derive(Clone, Debug, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl StopSignal for CancellationFlag {
    fn should_stop(&mut self) -> bool {
        self.is_cancelled()
    }
}

/// Stops after a fixed number of iterations.
pub struct FrameLimit {
    limit: usize,
    seen: usize,
}

impl FrameLimit {
    pub fn new(limit: usize) -> Self {
        Self { limit, seen: 0 }
    }
}

impl StopSignal for FrameLimit {
    fn should_stop(&mut self) -> bool {
        self.seen += 1;
        self.seen >= self.limit
    }
}

/// Stops when either signal asks to.
pub struct AnyOf<A, B>(pub A, pub B);

impl<A: StopSignal, B: StopSignal> StopSignal for AnyOf<A, B> {
    fn should_stop(&mut self) -> bool {
        // Both are polled so iteration-counting signals stay in step.
        let a = self.0.should_stop();
        let b = self.1.should_stop();
        a || b
    }
}

impl<F> StopSignal for F
where
    F: FnMut() -> bool + Send,
{
    fn should_stop(&mut self) -> bool {
        self()
    }
}

/// Operator instructions for stopping a run with `key`.
pub fn quit_hint(key: char) -> String {
    format!("press '{key}' then Enter, or Ctrl-C, to stop")
}

/// Raises `flag` when the operator enters `key` on stdin.
///
/// Input is line-buffered, so the key must be followed by Enter. Any other
/// input repeats [`quit_hint`]. The thread ends at EOF or once the flag is
/// raised.
pub fn spawn_key_listener(flag: CancellationFlag, key: char) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("key-listener".into())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if is_quit_line(&line, key) {
                    log::info!("Stop requested from keyboard");
                    flag.cancel();
                    break;
                }
                if !line.trim().is_empty() {
                    log::info!("Unrecognized input; {}", quit_hint(key));
                }
                if flag.is_cancelled() {
                    break;
                }
            }
        })
}

fn is_quit_line(line: &str, key: char) -> bool {
    let mut chars = line.trim().chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.eq_ignore_ascii_case(&key))
}
