use alloy_primitives::TxHash;
use std::time::Duration;
use task::{MessageStatus, TaskError};
use zklink_ops::{exit_code, Interrupted, EXIT_INTERRUPTED};

#[test]
fn test_task_errors_keep_their_exit_codes() {
    let cases = [
        (
            TaskError::MissingRequiredParameter {
                name: "validator".into(),
            },
            2,
        ),
        (
            TaskError::UnresolvedDeploymentAddress {
                artifact: "deploy_zklink.zkLinkProxy".into(),
                network: "OPTIMISM".into(),
            },
            3,
        ),
        (
            TaskError::TransactionFailed {
                hash: TxHash::repeat_byte(1),
                cause: "reverted".into(),
            },
            4,
        ),
        (
            TaskError::BridgeStatusTimeout {
                hash: TxHash::repeat_byte(1),
                target: MessageStatus::Relayed,
                last: MessageStatus::Proven,
                waited: Duration::from_secs(60),
            },
            5,
        ),
        (
            TaskError::NothingToResume {
                task: "sync-l2-requests".into(),
                network: "OPTIMISM".into(),
            },
            7,
        ),
    ];

    for (err, code) in cases {
        assert_eq!(exit_code(&eyre::Report::new(err)), code);
    }
}

#[test]
fn test_wrapped_task_error_is_found() {
    let report = eyre::Report::new(TaskError::ExternalServiceUnavailable {
        service: "l1 rpc".into(),
        cause: "timeout".into(),
    })
    .wrap_err("running sync-l2-requests");

    assert_eq!(exit_code(&report), 6);
}

#[test]
fn test_interrupted_and_other_errors() {
    assert_eq!(exit_code(&eyre::Report::new(Interrupted)), EXIT_INTERRUPTED);
    assert_eq!(exit_code(&eyre::eyre!("config file missing")), 1);
    assert_eq!(
        exit_code(&client::parse_private_key("0x12").unwrap_err().into()),
        2
    );
}
