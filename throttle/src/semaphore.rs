use std::sync::atomic::{AtomicBool, Ordering};

/// Counting semaphore that can be switched off, a disabled semaphore never blocks.
pub struct Semaphore {
    flag: AtomicBool,
    sem: std::sync::Arc<tokio::sync::Semaphore>,
}

impl Semaphore {
    pub fn new() -> Self {
        Self {
            flag: AtomicBool::new(false),
            sem: std::sync::Arc::new(tokio::sync::Semaphore::new(0)),
        }
    }

    pub fn with_capacity(value: usize) -> Self {
        let sem = Self::new();
        sem.setup(value);
        sem
    }

    pub fn setup(&self, value: usize) {
        self.flag.store(value > 0, Ordering::Release);
        if value == 0 {
            return;
        }
        self.sem.forget_permits(self.sem.available_permits());
        self.sem.add_permits(value);
    }

    pub fn enabled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }

    pub fn available_permits(&self) -> usize {
        self.sem.available_permits()
    }

    pub async fn acquire_owned(&self) -> Option<tokio::sync::OwnedSemaphorePermit> {
        if !self.enabled() {
            return None;
        }
        // we never close the semaphore so acquire can only fail if that invariant is broken
        match self.sem.clone().acquire_owned().await {
            Ok(permit) => Some(permit),
            Err(error) => {
                tracing::error!("semaphore closed unexpectedly: {}", &error);
                None
            }
        }
    }

    pub async fn consume(&self) {
        if !self.enabled() {
            return;
        }
        match self.sem.acquire().await {
            Ok(permit) => permit.forget(),
            Err(error) => tracing::error!("semaphore closed unexpectedly: {}", &error),
        }
    }

    pub async fn run_replenish_thread(&self, replenish: usize, interval: std::time::Duration) {
        if !self.enabled() {
            return;
        }
        loop {
            tokio::time::sleep(interval).await;
            let curr_permits = self.sem.available_permits();
            if curr_permits >= replenish {
                continue;
            }
            self.sem.add_permits(replenish - curr_permits);
        }
    }
}
