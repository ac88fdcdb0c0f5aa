#[path = "common/mod.rs"]
mod common;

use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use common::wait_until;
use lifeline::{
    config::ServiceIdentity,
    error::ServiceError,
    service::{Heartbeat, LifecycleService, ServiceHandlers},
    signal::{StopSignal, WaitOutcome},
    state::{ControlEvent, ServiceState, codes},
    test_utils::RecordingManager,
};

type Service = LifecycleService<RecordingManager, Heartbeat>;

fn start(tick: Duration) -> (Arc<Service>, thread::JoinHandle<Result<(), ServiceError>>) {
    let service = Arc::new(LifecycleService::new(
        ServiceIdentity::default(),
        tick,
        RecordingManager::new(),
        Heartbeat::default(),
    ));
    let runner = Arc::clone(&service);
    let handle = thread::spawn(move || runner.run());
    (service, handle)
}

#[test]
fn wait_on_unset_signal_times_out() {
    let signal = StopSignal::new();
    let started = Instant::now();

    assert_eq!(signal.wait(Duration::from_millis(100)), WaitOutcome::TimedOut);
    assert!(started.elapsed() >= Duration::from_millis(100));
}

#[test]
fn concurrent_set_interrupts_long_wait() {
    let signal = Arc::new(StopSignal::new());
    let setter = Arc::clone(&signal);
    thread::spawn(move || {
        thread::sleep(Duration::from_millis(10));
        setter.set();
    });

    let started = Instant::now();
    assert_eq!(signal.wait(Duration::from_millis(5000)), WaitOutcome::Signaled);
    assert!(
        started.elapsed() < Duration::from_millis(1000),
        "wait was not interrupted: {:?}",
        started.elapsed()
    );
}

#[test]
fn stop_request_after_several_ticks() {
    let (service, handle) = start(Duration::from_millis(50));

    thread::sleep(Duration::from_millis(200));
    wait_until(|| service.manager().count_logs("is running") >= 3);

    let stop_called = Instant::now();
    service.request_stop();
    handle.join().expect("run thread panicked").expect("run failed");
    assert!(stop_called.elapsed() < Duration::from_millis(100));

    let manager = service.manager();
    assert!(manager.count_logs("is running") >= 3);
    assert_eq!(manager.count_logs("is stopping"), 1);
    assert_eq!(manager.count_logs("has stopped"), 1);
    assert_eq!(manager.statuses().last(), Some(&ServiceState::Stopped));
}

#[test]
fn pre_shutdown_then_stop_is_harmless() {
    let (service, handle) = start(Duration::from_secs(5));
    wait_until(|| service.manager().count_logs("has started") == 1);

    let stop_called = Instant::now();
    service.handle_control(ControlEvent::from_raw(codes::PRESHUTDOWN, 0, None));
    handle.join().expect("run thread panicked").expect("run failed");
    assert!(stop_called.elapsed() < Duration::from_secs(2));

    service.request_stop();
    assert_eq!(service.manager().statuses().last(), Some(&ServiceState::Stopped));

    let logs = service.manager().logs();
    assert_eq!(
        logs,
        vec![
            "has started",
            "received a pre-shutdown notification",
            "is stopping",
            "has stopped",
        ]
    );
}

#[test]
fn stop_latency_is_bounded_by_tick() {
    let (service, handle) = start(Duration::from_millis(300));
    wait_until(|| service.manager().count_logs("has started") == 1);

    let stop_called = Instant::now();
    service.request_stop();
    handle.join().expect("run thread panicked").expect("run failed");

    assert!(stop_called.elapsed() <= Duration::from_millis(300 + 250));
}

#[test]
fn racing_stop_and_pre_shutdown_end_in_one_stop() {
    let (service, handle) = start(Duration::from_millis(20));
    wait_until(|| service.manager().count_logs("is running") >= 1);

    let a = {
        let service = Arc::clone(&service);
        thread::spawn(move || service.request_stop())
    };
    let b = {
        let service = Arc::clone(&service);
        thread::spawn(move || service.handle_pre_shutdown())
    };
    a.join().unwrap();
    b.join().unwrap();
    handle.join().unwrap().unwrap();

    let manager = service.manager();
    assert_eq!(manager.count_logs("is stopping"), 1);
    assert_eq!(manager.count_logs("has stopped"), 1);
    assert!(manager.count_logs("received a pre-shutdown notification") <= 1);
    assert_eq!(
        manager
            .statuses()
            .iter()
            .filter(|s| **s == ServiceState::Stopped)
            .count(),
        1
    );
    assert_eq!(manager.statuses().last(), Some(&ServiceState::Stopped));
}

#[test]
fn unknown_controls_never_stop_the_service() {
    let (service, handle) = start(Duration::from_millis(20));
    wait_until(|| service.manager().count_logs("has started") == 1);

    for code in [codes::SHUTDOWN, codes::PAUSE, codes::TIME_CHANGE, 255] {
        service.handle_control(ControlEvent::from_raw(code, 1, None));
    }
    thread::sleep(Duration::from_millis(60));
    assert!(!service.is_stopping());

    service.request_stop();
    handle.join().unwrap().unwrap();
    assert_eq!(
        service
            .manager()
            .logs()
            .iter()
            .filter(|l| l.starts_with("received an event:"))
            .count(),
        4
    );
}
