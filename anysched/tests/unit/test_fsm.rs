//! FSM unit tests

use anysched::operation::{OperationEvent, OperationFsm, OperationState};

#[test]
fn test_fsm_initial_state() {
    let fsm = OperationFsm::new();
    assert_eq!(fsm.state(), &OperationState::Created);
    assert!(fsm.error().is_none());
    assert!(fsm.message().is_none());
    assert_eq!(fsm.polls(), 0);
}

#[test]
fn test_fsm_rollout_success_flow() {
    let mut fsm = OperationFsm::new();

    // Created -> InProgress
    fsm.process(OperationEvent::Pending("1 of 3 updated replicas are available...".to_string()))
        .unwrap();
    assert_eq!(fsm.state(), &OperationState::InProgress);

    // InProgress stays InProgress while polls are not done
    fsm.process(OperationEvent::Pending("2 of 3 updated replicas are available...".to_string()))
        .unwrap();
    assert_eq!(fsm.message(), Some("2 of 3 updated replicas are available..."));

    // InProgress -> Succeeded
    fsm.process(OperationEvent::Completed).unwrap();
    assert_eq!(fsm.state(), &OperationState::Succeeded);
    assert_eq!(fsm.polls(), 3);
    assert!(fsm.is_terminal());
}

#[test]
fn test_fsm_done_on_first_poll() {
    let mut fsm = OperationFsm::new();
    fsm.process(OperationEvent::Completed).unwrap();
    assert_eq!(fsm.state(), &OperationState::Succeeded);
}

#[test]
fn test_fsm_failure_flow() {
    let mut fsm = OperationFsm::new();

    fsm.process(OperationEvent::Pending("waiting".to_string())).unwrap();
    fsm.process(OperationEvent::Failed("deadline exceeded".to_string()))
        .unwrap();

    assert_eq!(fsm.state(), &OperationState::Failed);
    assert_eq!(fsm.error(), Some("deadline exceeded"));
    assert!(fsm.is_terminal());
}

#[test]
fn test_fsm_terminal_states_are_sticky() {
    let mut fsm = OperationFsm::new();
    fsm.process(OperationEvent::Completed).unwrap();

    assert!(fsm.process(OperationEvent::Pending("again".to_string())).is_err());
    assert!(fsm.process(OperationEvent::Failed("late".to_string())).is_err());
    assert_eq!(fsm.state(), &OperationState::Succeeded);
    assert_eq!(fsm.polls(), 1);

    let mut fsm = OperationFsm::new();
    fsm.process(OperationEvent::Failed("boom".to_string())).unwrap();
    assert!(fsm.process(OperationEvent::Completed).is_err());
    assert_eq!(fsm.state(), &OperationState::Failed);
}
