//! Library integration tests.

use dotplan::PlanError;

#[test]
fn error_types_are_public() {
    let err = PlanError::MalformedPolicyConfig {
        message: "missing `sdk.version`".into(),
    };
    assert!(err.to_string().contains("sdk.version"));
    assert!(err.is_resolution_error());
}

#[test]
fn result_type_alias_is_public() {
    fn test_fn() -> dotplan::Result<()> {
        Ok(())
    }
    assert!(test_fn().is_ok());
}

#[test]
fn cli_types_are_public() {
    use clap::Parser;
    use dotplan::cli::{Cli, Commands};

    let cli = Cli::parse_from(["dotplan", "plan", "--sdk", "lts", "--json"]);

    if let Commands::Plan(args) = cli.command {
        assert!(args.json);
        assert_eq!(args.sdk, vec!["lts"]);
    } else {
        panic!("Expected Plan command");
    }
}
