//! Tests for CLI parsing and configuration resolution.

use super::*;
use rstest::rstest;

const ENV_INPUTS: [&str; 16] = [
    "INPUT_TARGETS",
    "INPUT_BINS",
    "INPUT_BIN",
    "INPUT_LIB",
    "INPUT_FEATURES",
    "INPUT_PACKAGE",
    "INPUT_FILES_TO_PACK",
    "INPUT_RELEASE_OPTIONS",
    "GITHUB_REF_NAME",
    "INPUT_TOKEN",
    "CARGO_TARGET_DIR",
    "INPUT_OUTPUT_DIR",
    "RUSTFLAGS",
    "INPUT_SKIP_DEPS",
    "INPUT_SKIP_UPLOAD",
    "DEBUG",
];

/// Parse `args` with every recognised input variable cleared, then `env` set.
fn parse_with_env(args: &[&str], env: &[(&str, &str)]) -> Cli {
    let mut vars: Vec<(&str, Option<&str>)> = ENV_INPUTS
        .iter()
        .filter(|&&name| env.iter().all(|&(set, _)| set != name))
        .map(|&name| (name, None))
        .collect();
    vars.extend(env.iter().map(|&(name, value)| (name, Some(value))));
    temp_env::with_vars(vars, || {
        let argv = std::iter::once("rust-release-action").chain(args.iter().copied());
        Cli::try_parse_from(argv).expect("arguments parse")
    })
}

#[test]
fn cli_reads_action_inputs_from_environment() {
    let cli = parse_with_env(
        &[],
        &[
            ("INPUT_TARGETS", "x86_64-unknown-linux-musl\naarch64-apple-darwin, "),
            ("INPUT_BINS", "tool, helper"),
            ("INPUT_LIB", "true"),
            ("INPUT_FEATURES", "cli\ntls"),
            ("INPUT_PACKAGE", "tool"),
            ("INPUT_FILES_TO_PACK", "README.md\nLICENSE"),
            ("INPUT_RELEASE_OPTIONS", "--draft  --generate-notes"),
            ("GITHUB_REF_NAME", "v1.0.0"),
            ("INPUT_TOKEN", "t0ken"),
            ("INPUT_OUTPUT_DIR", "/tmp/out"),
        ],
    );

    let config = cli.into_config().expect("valid config");

    let targets: Vec<&str> = config.targets.iter().map(TargetTriple::as_str).collect();
    assert_eq!(targets, ["x86_64-unknown-linux-musl", "aarch64-apple-darwin"]);
    assert_eq!(config.selection.bins, ["tool", "helper"]);
    assert!(config.selection.lib);
    assert_eq!(config.features, ["cli", "tls"]);
    assert_eq!(config.package.as_deref(), Some("tool"));
    assert_eq!(
        config.files_to_pack,
        [Utf8PathBuf::from("README.md"), Utf8PathBuf::from("LICENSE")]
    );
    assert_eq!(config.release_options, ["--draft", "--generate-notes"]);
    assert_eq!(config.ref_name.as_deref(), Some("v1.0.0"));
    assert_eq!(config.token.as_deref(), Some("t0ken"));
    assert_eq!(config.output_dir, Utf8PathBuf::from("/tmp/out"));
    assert_eq!(config.target_dir, Utf8PathBuf::from("target"));
}

#[test]
fn flags_override_environment() {
    let cli = parse_with_env(
        &["--targets", "x86_64-pc-windows-msvc", "--skip-upload"],
        &[("INPUT_TARGETS", "x86_64-unknown-linux-gnu")],
    );
    let config = cli.into_config().expect("valid config");
    assert_eq!(config.targets[0].as_str(), "x86_64-pc-windows-msvc");
    assert!(config.skip_upload);
}

#[test]
fn legacy_bin_input_is_merged() {
    let cli = parse_with_env(
        &["--skip-upload"],
        &[
            ("INPUT_TARGETS", "x86_64-unknown-linux-gnu"),
            ("INPUT_BIN", "tool"),
        ],
    );
    let config = cli.into_config().expect("valid config");
    assert_eq!(config.selection.bins, ["tool"]);
}

#[rstest]
#[case::falsy("false", false)]
#[case::zero("0", false)]
#[case::empty("", false)]
#[case::off("off", false)]
#[case::truthy("true", true)]
#[case::numeric("1", true)]
#[case::yes("yes", true)]
fn boolean_inputs_accept_action_spellings(#[case] value: &str, #[case] expected: bool) {
    let cli = parse_with_env(
        &[],
        &[
            ("INPUT_LIB", value),
            ("INPUT_SKIP_DEPS", value),
            ("INPUT_SKIP_UPLOAD", value),
            ("DEBUG", value),
        ],
    );
    assert_eq!(cli.lib, expected);
    assert_eq!(cli.skip_deps, expected);
    assert_eq!(cli.skip_upload, expected);
    assert_eq!(cli.debug, expected);
}

#[test]
fn boolean_flag_without_value_is_on() {
    let cli = parse_with_env(&["--debug", "--lib"], &[("DEBUG", "false")]);
    assert!(cli.debug);
    assert!(cli.lib);
}

#[test]
fn missing_targets_are_rejected() {
    let cli = parse_with_env(&["--skip-upload"], &[("INPUT_TARGETS", " , \n")]);
    assert!(matches!(cli.into_config(), Err(ReleaseError::NoTargets)));
}

#[test]
fn malformed_target_is_rejected() {
    let cli = parse_with_env(&["--skip-upload", "--targets", "x86_64--linux"], &[]);
    assert!(matches!(
        cli.into_config(),
        Err(ReleaseError::InvalidTarget { .. })
    ));
}

#[test]
fn upload_requires_a_ref_name() {
    let cli = parse_with_env(&["--targets", "x86_64-unknown-linux-gnu"], &[]);
    assert!(matches!(
        cli.into_config(),
        Err(ReleaseError::MissingInput {
            name: "GITHUB_REF_NAME"
        })
    ));
}

#[test]
fn output_dir_defaults_to_temp_subdirectory() {
    let cli = parse_with_env(
        &["--targets", "x86_64-unknown-linux-gnu", "--skip-upload"],
        &[],
    );
    let config = cli.into_config().expect("valid config");
    assert_eq!(config.output_dir.file_name(), Some(DEFAULT_OUTPUT_SUBDIR));
    assert!(config.ref_name.is_none());
}

#[rstest]
#[case::commas(Some("a,b,c"), &["a", "b", "c"])]
#[case::newlines(Some("a\nb\r\nc"), &["a", "b", "c"])]
#[case::blanks(Some(" ,\n , "), &[])]
#[case::absent(None, &[])]
fn split_list_handles_separators(#[case] input: Option<&str>, #[case] expected: &[&str]) {
    assert_eq!(split_list(input), expected);
}
