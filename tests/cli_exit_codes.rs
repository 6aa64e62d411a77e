use std::process::Command;

const REQUIRED: &[&str] = &[
    "--target-project-id",
    "my-project",
    "--target-location-id",
    "us-central1",
    "--target-entry-group-id",
    "databricks-eg",
    "--server-hostname",
    "adb-123.azuredatabricks.net",
    "--http-path",
    "/sql/1.0/warehouses/abc123",
    "--access-token-secret",
    "databricks-token",
];

fn run_connector(args: &[&str]) -> Option<i32> {
    Command::new(env!("CARGO_BIN_EXE_databricks-connector"))
        .args(args)
        .env_remove("GOOGLE_OAUTH_ACCESS_TOKEN")
        .output()
        .unwrap()
        .status
        .code()
}

fn with_required<'a>(extra: &[&'a str]) -> Vec<&'a str> {
    let mut args: Vec<&str> = REQUIRED.to_vec();
    args.extend_from_slice(extra);
    args
}

#[test]
fn test_missing_required_flag_exits_with_one() {
    assert_eq!(run_connector(&["--local-output-only"]), Some(1));
}

#[test]
fn test_conflicting_output_flags_exit_with_one() {
    let args = with_required(&["--local-output-only", "--output-bucket", "metadata-imports"]);
    assert_eq!(run_connector(&args), Some(1));
}

#[test]
fn test_folder_without_bucket_exits_with_one() {
    let args = with_required(&["--local-output-only", "--output-folder", "databricks"]);
    assert_eq!(run_connector(&args), Some(1));
}

#[test]
fn test_missing_output_choice_exits_with_one() {
    assert_eq!(run_connector(REQUIRED), Some(1));
}

#[test]
fn test_invalid_value_exits_with_one() {
    let mut args = with_required(&["--local-output-only"]);
    args[7] = "https://adb-123.azuredatabricks.net";
    assert_eq!(run_connector(&args), Some(1));
}

#[test]
fn test_help_exits_with_zero() {
    assert_eq!(run_connector(&["--help"]), Some(0));
}

#[test]
fn test_toml_connector_unknown_flag_exits_with_one() {
    let status = Command::new(env!("CARGO_BIN_EXE_toml-connector"))
        .arg("--no-such-flag")
        .output()
        .unwrap()
        .status;
    assert_eq!(status.code(), Some(1));
}
