use anyhow::{anyhow, Context, Result};
use tracing::debug;

use crate::ctx::Ctx;

type RunFn = Box<dyn Fn(&Ctx) -> Result<()> + Send + Sync>;

/// A node in the task graph: a named unit of work, or a sequential or
/// concurrent composition of nodes.
pub enum Task {
    Leaf { name: &'static str, run: RunFn },
    Series(Vec<Task>),
    Parallel(Vec<Task>),
}

impl Task {
    pub fn leaf(
        name: &'static str,
        run: impl Fn(&Ctx) -> Result<()> + Send + Sync + 'static,
    ) -> Task {
        Task::Leaf {
            name,
            run: Box::new(run),
        }
    }

    pub fn series(tasks: Vec<Task>) -> Task {
        Task::Series(tasks)
    }

    pub fn parallel(tasks: Vec<Task>) -> Task {
        Task::Parallel(tasks)
    }

    /// Execute the node.
    ///
    /// Series nodes run children strictly in order and abort on the first
    /// failure. Parallel nodes run children on scoped threads and always
    /// wait for every sibling; any child failure fails the group, with no
    /// rollback of completed siblings. There is no retry anywhere.
    pub fn run(&self, ctx: &Ctx) -> Result<()> {
        match self {
            Task::Leaf { name, run } => {
                debug!(task = *name, "starting task");
                run(ctx).with_context(|| format!("task `{name}` failed"))
            }

            Task::Series(tasks) => {
                for task in tasks {
                    task.run(ctx)?;
                }
                Ok(())
            }

            Task::Parallel(tasks) => {
                let results: Vec<Result<()>> = std::thread::scope(|scope| {
                    let handles: Vec<_> = tasks
                        .iter()
                        .map(|task| scope.spawn(move || task.run(ctx)))
                        .collect();

                    handles
                        .into_iter()
                        .map(|handle| {
                            handle
                                .join()
                                .unwrap_or_else(|_| Err(anyhow!("task thread panicked")))
                        })
                        .collect()
                });

                for result in results {
                    result?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ctx::testutil;
    use std::sync::{Arc, Mutex};

    type Log = Arc<Mutex<Vec<&'static str>>>;

    fn recording(name: &'static str, log: &Log) -> Task {
        let log = Arc::clone(log);
        Task::leaf(name, move |_| {
            log.lock().unwrap().push(name);
            Ok(())
        })
    }

    fn failing(name: &'static str, log: &Log) -> Task {
        let log = Arc::clone(log);
        Task::leaf(name, move |_| {
            log.lock().unwrap().push(name);
            anyhow::bail!("boom")
        })
    }

    #[test]
    fn series_runs_children_in_order() {
        let ctx = testutil::bare_ctx();
        let log: Log = Arc::default();

        Task::series(vec![
            recording("a", &log),
            recording("b", &log),
            recording("c", &log),
        ])
        .run(&ctx)
        .unwrap();

        assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn series_aborts_after_the_first_failure() {
        let ctx = testutil::bare_ctx();
        let log: Log = Arc::default();

        let err = Task::series(vec![
            recording("a", &log),
            failing("b", &log),
            recording("c", &log),
        ])
        .run(&ctx)
        .unwrap_err();

        assert_eq!(*log.lock().unwrap(), vec!["a", "b"]);
        assert!(err.to_string().contains("task `b` failed"));
    }

    #[test]
    fn parallel_waits_for_all_children() {
        let ctx = testutil::bare_ctx();
        let log: Log = Arc::default();

        Task::parallel(vec![
            recording("a", &log),
            recording("b", &log),
            recording("c", &log),
        ])
        .run(&ctx)
        .unwrap();

        let mut ran = log.lock().unwrap().clone();
        ran.sort_unstable();
        assert_eq!(ran, vec!["a", "b", "c"]);
    }

    #[test]
    fn parallel_failure_does_not_cancel_siblings() {
        let ctx = testutil::bare_ctx();
        let log: Log = Arc::default();

        let err = Task::parallel(vec![
            failing("a", &log),
            recording("b", &log),
            recording("c", &log),
        ])
        .run(&ctx)
        .unwrap_err();

        let mut ran = log.lock().unwrap().clone();
        ran.sort_unstable();
        assert_eq!(ran, vec!["a", "b", "c"]);
        assert!(err.to_string().contains("task `a` failed"));
    }

    #[test]
    fn leaf_failures_carry_the_task_name() {
        let ctx = testutil::bare_ctx();
        let log: Log = Arc::default();

        let err = failing("prepare-zlib", &log).run(&ctx).unwrap_err();
        assert!(err.to_string().contains("task `prepare-zlib` failed"));
    }
}
