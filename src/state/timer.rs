use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use tokio::{task::JoinHandle, time::sleep};

/// Schedules cancellable one-shot delayed jobs on the Tokio runtime.
///
/// Jobs run at most once. [`TimerHandle::cancel`] is idempotent and safe to
/// call after the job has fired; a job canceled while its delay is still
/// pending never runs. Cancellation that races with a job already past its
/// delay cannot stop it mid-flight, so jobs that touch shared state must
/// re-check that state under its lock before acting.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimerScheduler;

impl TimerScheduler {
    /// Arm a one-shot timer that drives `job` to completion after `delay`.
    pub fn schedule<F>(&self, delay: Duration, job: F) -> TimerHandle
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let canceled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&canceled);

        // The deadline must be anchored here, not at the task's first poll;
        // otherwise time advanced before the task runs pushes it into the
        // future.
        let delay = sleep(delay);

        let task = tokio::spawn(async move {
            delay.await;
            if flag.load(Ordering::SeqCst) {
                return;
            }
            job.await;
        });

        TimerHandle { canceled, task }
    }
}

/// Handle to a scheduled one-shot job.
#[derive(Debug)]
pub struct TimerHandle {
    canceled: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl TimerHandle {
    /// Cancel the job. Idempotent; a no-op once the job has fired.
    pub fn cancel(&self) {
        if !self.canceled.swap(true, Ordering::SeqCst) {
            self.task.abort();
        }
    }

    /// Whether [`cancel`](Self::cancel) has been called on this handle.
    pub fn is_canceled(&self) -> bool {
        self.canceled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use tokio::time::advance;

    use super::*;

    fn counter_job(counter: &Arc<AtomicUsize>) -> impl Future<Output = ()> + Send + 'static {
        let counter = Arc::clone(counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
        }
    }

    // Let spawned timer tasks run to completion after the clock moved.
    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fires_exactly_once_after_delay() {
        let counter = Arc::new(AtomicUsize::new(0));
        let _handle = TimerScheduler.schedule(Duration::from_secs(5), counter_job(&counter));

        advance(Duration::from_secs(4)).await;
        settle().await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        advance(Duration::from_secs(2)).await;
        settle().await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        advance(Duration::from_secs(60)).await;
        settle().await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn canceled_job_never_runs() {
        let counter = Arc::new(AtomicUsize::new(0));
        let handle = TimerScheduler.schedule(Duration::from_secs(5), counter_job(&counter));

        handle.cancel();
        advance(Duration::from_secs(10)).await;
        settle().await;

        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_is_idempotent_and_safe_after_firing() {
        let counter = Arc::new(AtomicUsize::new(0));
        let handle = TimerScheduler.schedule(Duration::from_secs(1), counter_job(&counter));

        advance(Duration::from_secs(2)).await;
        settle().await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);

        handle.cancel();
        handle.cancel();
        assert!(handle.is_canceled());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
