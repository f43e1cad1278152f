//! Behavioural tests for the server lifecycle from launch to shutdown.

use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use camino::Utf8Path;

use crate::process::{LaunchPlan, ServiceDeps, ShutdownError, ShutdownSignal, run_server_with};

use super::support::{
    FailingConfigLoader, HealthEvent, RecordingHealthReporter, TestClient, TestConfigLoader,
};

const SOCKET_WAIT: Duration = Duration::from_secs(5);

#[derive(Clone)]
struct TestShutdownSignal {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl TestShutdownSignal {
    fn new() -> Self {
        Self {
            inner: Arc::new((Mutex::new(false), Condvar::new())),
        }
    }

    fn trigger(&self) {
        let (lock, cvar) = &*self.inner;
        let mut triggered = lock.lock().expect("shutdown mutex poisoned");
        *triggered = true;
        cvar.notify_all();
    }
}

impl ShutdownSignal for TestShutdownSignal {
    fn wait(&self) -> Result<(), ShutdownError> {
        let (lock, cvar) = &*self.inner;
        let mut triggered = lock.lock().expect("shutdown mutex poisoned");
        while !*triggered {
            triggered = cvar
                .wait(triggered)
                .expect("shutdown mutex poisoned during wait");
        }
        Ok(())
    }
}

#[cfg(unix)]
fn wait_for_socket(path: &Utf8Path) {
    let deadline = Instant::now() + SOCKET_WAIT;
    while !path.exists() {
        assert!(Instant::now() < deadline, "socket {path} never appeared");
        thread::sleep(Duration::from_millis(10));
    }
}

#[cfg(unix)]
#[test]
fn server_serves_sessions_until_shutdown() {
    let loader = TestConfigLoader::new();
    let socket = loader.socket_path();
    let reporter = Arc::new(RecordingHealthReporter::default());
    let shutdown = TestShutdownSignal::new();
    let plan = LaunchPlan {
        services: ServiceDeps {
            loader,
            reporter: reporter.clone(),
        },
        shutdown: shutdown.clone(),
    };
    let server = thread::spawn(move || run_server_with(plan));

    wait_for_socket(&socket);
    {
        let mut client = TestClient::unix(&socket);
        let greeting = client.until_prompt();
        assert_eq!(
            greeting.output,
            "CYBERQUEST TERMINAL\r\nType help to begin.\r\n"
        );
        assert_eq!(greeting.prompt, "gateway> ");

        let opened = client.run("files.open {file: \"readme.txt\"}");
        assert_eq!(opened.output, "Nothing to see here.\r\n");
    }

    shutdown.trigger();
    server
        .join()
        .expect("server thread panicked")
        .expect("server should stop cleanly");

    assert!(!socket.exists(), "socket file should be removed on shutdown");
    assert!(reporter.events().contains(&HealthEvent::BootstrapSucceeded));
}

#[test]
fn launch_stops_when_bootstrap_fails() {
    let reporter = Arc::new(RecordingHealthReporter::default());
    let shutdown = TestShutdownSignal::new();
    let plan = LaunchPlan {
        services: ServiceDeps {
            loader: FailingConfigLoader,
            reporter: reporter.clone(),
        },
        shutdown,
    };

    let error = run_server_with(plan).expect_err("launch should fail");

    assert!(error.as_cli().is_some());
    assert!(matches!(
        reporter.events().last(),
        Some(HealthEvent::BootstrapFailed(_))
    ));
}
