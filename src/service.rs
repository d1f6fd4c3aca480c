//! 백그라운드 작업 하나의 시작/정지를 관리하는 협력적 생명주기 관리자
//!
//! 상태 전이:
//!   Stopped --go()--> Running --stop()--> ShuttingDown --(작업 종료)--> Stopped
//!   Running --(작업이 스스로 종료)--> Stopped
//!
//! 모든 전이는 하나의 뮤텍스 아래에서 일어나므로, 동시에 호출된
//! go/stop/is_running이 반쯤 적용된 상태를 보는 일은 없다.

use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Stopped,
    Running,
    ShuttingDown,
}

impl ServiceState {
    pub fn name(&self) -> &'static str {
        match self {
            ServiceState::Stopped => "Stopped",
            ServiceState::Running => "Running",
            ServiceState::ShuttingDown => "ShuttingDown",
        }
    }
}

struct Inner {
    state: ServiceState,
    /// 시작된 실행의 수. 실행 번호는 1부터 시작한다.
    run: u64,
    /// 가장 최근에 정지 요청된 실행 번호
    shutdown: watch::Sender<u64>,
    /// 현재 (또는 가장 최근) 실행의 종료 여부
    done: watch::Receiver<bool>,
}

/// 작업 하나의 생명주기 관리자.
///
/// 복제해도 같은 관리자를 가리킨다. 스트림마다 따로 만들어 쓴다.
#[derive(Clone)]
pub struct ServiceManager {
    inner: Arc<Mutex<Inner>>,
}

impl Default for ServiceManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceManager {
    pub fn new() -> Self {
        let (shutdown, _) = watch::channel(0);
        // 한 번도 실행되지 않은 관리자의 wait()는 바로 반환된다
        let (_, done) = watch::channel(true);
        ServiceManager {
            inner: Arc::new(Mutex::new(Inner {
                state: ServiceState::Stopped,
                run: 0,
                shutdown,
                done,
            })),
        }
    }

    /// Stopped 상태일 때만 작업을 시작하고 true를 반환한다.
    ///
    /// 작업은 관리자 핸들을 받아 tokio 런타임 위에서 실행되며,
    /// 작업이 끝나면 (정상 종료든 panic이든) 상태는 Stopped로 돌아간다.
    pub fn go<F, Fut>(&self, task: F) -> bool
    where
        F: FnOnce(ServiceManager) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (done_tx, done_rx) = watch::channel(false);
        {
            let mut inner = self.inner.lock();
            if inner.state != ServiceState::Stopped {
                return false;
            }
            inner.state = ServiceState::Running;
            inner.run += 1;
            inner.done = done_rx;
        }

        let guard = RunGuard {
            manager: self.clone(),
            done: done_tx,
        };
        let fut = task(self.clone());
        tokio::spawn(async move {
            let _guard = guard;
            fut.await;
        });
        true
    }

    pub fn is_running(&self) -> bool {
        self.inner.lock().state == ServiceState::Running
    }

    pub fn state(&self) -> ServiceState {
        self.inner.lock().state
    }

    /// 진단용 상태 이름
    pub fn state_name(&self) -> &'static str {
        self.state().name()
    }

    /// 현재 실행의 정지 신호.
    ///
    /// stop()이 호출되는 순간 한 번 발생하며, 여러 곳에서 기다려도 된다.
    /// Stopped 상태에서 얻은 신호는 다음 실행에 속한다.
    pub fn shutting_down(&self) -> ShutdownSignal {
        let inner = self.inner.lock();
        let run = match inner.state {
            ServiceState::Stopped => inner.run + 1,
            ServiceState::Running | ServiceState::ShuttingDown => inner.run,
        };
        ShutdownSignal {
            rx: inner.shutdown.subscribe(),
            run,
        }
    }

    /// Running이면 정지를 요청하고 작업이 끝날 때까지 기다린 뒤 true를 반환한다.
    /// Running이 아니면 바로 false를 반환한다.
    pub async fn stop(&self) -> bool {
        let mut done = {
            let mut inner = self.inner.lock();
            if inner.state != ServiceState::Running {
                return false;
            }
            inner.state = ServiceState::ShuttingDown;
            let run = inner.run;
            inner.shutdown.send_replace(run);
            inner.done.clone()
        };

        debug!("Waiting for service to shut down");
        let _ = done.wait_for(|finished| *finished).await;
        true
    }

    /// 현재 (또는 가장 최근) 작업이 끝날 때까지 기다린다
    pub async fn wait(&self) {
        let mut done = self.inner.lock().done.clone();
        let _ = done.wait_for(|finished| *finished).await;
    }
}

/// 작업 종료 시 상태를 Stopped로 되돌린다
struct RunGuard {
    manager: ServiceManager,
    done: watch::Sender<bool>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        let mut inner = self.manager.inner.lock();
        inner.state = ServiceState::Stopped;
        self.done.send_replace(true);
    }
}

/// 실행 하나에 대한 일회성 정지 신호
#[derive(Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<u64>,
    run: u64,
}

impl ShutdownSignal {
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow() >= self.run
    }

    /// 정지가 요청될 때까지 기다린다
    pub async fn wait(&mut self) {
        let run = self.run;
        let _ = self.rx.wait_for(|stopped| *stopped >= run).await;
    }
}
