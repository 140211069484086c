use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tokio::{runtime::Handle, sync::Notify};

/// Shared handle for the external interruption signal.
///
/// The controller polls [Interrupt::is_triggered] at pass and test
/// boundaries; tests that block on a child process can await
/// [Interrupt::triggered] instead.
#[derive(Clone, Debug, Default)]
pub struct Interrupt {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    flag: AtomicBool,
    notify: Notify,
}

impl Interrupt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.inner.flag.store(true, Ordering::SeqCst);
        self.inner.notify.notify_one();
    }

    pub fn is_triggered(&self) -> bool {
        self.inner.flag.load(Ordering::SeqCst)
    }

    /// Resolves once the interruption has been triggered.
    pub async fn triggered(&self) {
        while !self.is_triggered() {
            self.inner.notify.notified().await;
        }
    }

    /// Trip this handle when the process receives Ctrl-C.
    pub fn listen_for_ctrl_c(&self, runtime: &Handle) {
        let interrupt = self.clone();
        runtime.spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                interrupt.trigger();
            }
        });
    }
}
