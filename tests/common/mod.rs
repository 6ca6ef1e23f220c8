//! Shared operations for integration tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use stability_patterns::{operation_fn, CallError, Context, Operation, Outcome};

/// Counts invocations of a test operation.
#[derive(Debug, Clone, Default)]
pub struct Calls(Arc<AtomicU32>);

impl Calls {
    pub fn get(&self) -> u32 {
        self.0.load(Ordering::SeqCst)
    }

    fn bump(&self) -> u32 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// An operation that replays `script` in order, repeating the last entry
/// once the script runs out.
#[allow(dead_code)]
pub fn scripted(
    script: Vec<Result<&'static str, &'static str>>,
) -> (impl Operation<Output = &'static str, Error = &'static str>, Calls) {
    let calls = Calls::default();
    let counter = calls.clone();
    let script = Arc::new(Mutex::new(VecDeque::from(script)));

    let op = operation_fn(move |_ctx: Context| {
        counter.bump();
        let step = {
            let mut script = script.lock().unwrap();
            if script.len() > 1 {
                script.pop_front()
            } else {
                script.front().copied()
            }
        };
        async move {
            match step {
                Some(Ok(value)) => Ok(value),
                Some(Err(err)) => Err(CallError::Upstream(err)),
                None => Err(CallError::Upstream("script empty")),
            }
        }
    });
    (op, calls)
}

/// An operation that always fails with `err`.
#[allow(dead_code)]
pub fn always_failing(
    err: &'static str,
) -> (impl Operation<Output = &'static str, Error = &'static str>, Calls) {
    scripted(vec![Err(err)])
}

/// An operation returning its invocation number.
#[allow(dead_code)]
pub fn numbered() -> (impl Operation<Output = u32, Error = &'static str>, Calls) {
    let calls = Calls::default();
    let counter = calls.clone();
    let op = operation_fn(move |_ctx: Context| {
        let n = counter.bump();
        async move { Ok::<_, CallError<&'static str>>(n) }
    });
    (op, calls)
}

#[allow(dead_code)]
pub fn is_cancelled<T>(outcome: &Outcome<T, &'static str>) -> bool {
    matches!(outcome, Err(err) if err.is_cancellation())
}
