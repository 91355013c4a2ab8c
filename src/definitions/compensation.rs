use std::{fmt, future::Future};

/// Reversal actions in the order their forward steps completed.
#[derive(Debug, Clone)]
pub struct CompensationStack<C> {
    entries: Vec<C>,
}

impl<C> Default for CompensationStack<C> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<C> CompensationStack<C>
where
    C: Clone + fmt::Display,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, compensation: C) {
        self.entries.push(compensation);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in push order.
    pub fn iter(&self) -> impl Iterator<Item = &C> {
        self.entries.iter()
    }

    /// Runs every entry once, newest first. Failures are logged and returned,
    /// the remaining entries still run. Consumes the stack so it cannot be
    /// unwound twice.
    pub async fn unwind_all<F, Fut, E>(self, mut compensate: F) -> Vec<(C, E)>
    where
        F: FnMut(C) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        E: fmt::Display,
    {
        log::info!("Unwinding {} compensations", self.entries.len());
        let mut failures = Vec::new();
        for entry in self.entries.into_iter().rev() {
            match compensate(entry.clone()).await {
                Ok(()) => log::debug!("Compensation {entry} done"),
                Err(e) => {
                    log::error!("Compensation {entry} failed, continuing unwind: {e}");
                    failures.push((entry, e));
                }
            }
        }
        failures
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    #[tokio::test]
    async fn test_unwinds_in_reverse_order() {
        let mut stack = CompensationStack::new();
        stack.push("flight");
        stack.push("hotel");
        stack.push("transport");
        assert_eq!(3, stack.len());
        assert_eq!(
            vec!["flight", "hotel", "transport"],
            stack.iter().copied().collect::<Vec<_>>()
        );

        let called = Arc::new(Mutex::new(Vec::new()));
        let failures = stack
            .unwind_all(|c| {
                let called = called.clone();
                async move {
                    called.lock().unwrap().push(c);
                    Ok::<(), String>(())
                }
            })
            .await;

        assert!(failures.is_empty());
        assert_eq!(
            vec!["transport", "hotel", "flight"],
            *called.lock().unwrap()
        );
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_unwind() {
        let mut stack = CompensationStack::new();
        stack.push("flight");
        stack.push("hotel");

        let called = Arc::new(Mutex::new(Vec::new()));
        let failures = stack
            .unwind_all(|c| {
                let called = called.clone();
                async move {
                    called.lock().unwrap().push(c);
                    if c == "hotel" {
                        Err("hotel system down".to_string())
                    } else {
                        Ok(())
                    }
                }
            })
            .await;

        assert_eq!(vec![("hotel", "hotel system down".to_string())], failures);
        assert_eq!(vec!["hotel", "flight"], *called.lock().unwrap());
    }

    #[tokio::test]
    async fn test_empty_stack_unwinds_nothing() {
        let stack: CompensationStack<&str> = CompensationStack::new();
        assert!(stack.is_empty());
        let failures = stack
            .unwind_all(|_| async { Err::<(), _>("never called") })
            .await;
        assert!(failures.is_empty());
    }
}
