//! Settings and front-end tests driving the `polish` binary

use std::fs;

use crate::common::{polish, stderr, stdout};

#[test]
fn config_set_persists_and_show_reads_back() {
    let home = tempfile::tempdir().unwrap();

    let output = polish(home.path(), &["config", "set", "tone=casual", "output_count=3"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let printed = stdout(&output);
    assert!(printed.contains("updated tone"));
    assert!(printed.contains("updated outputCount"));

    let file = fs::read_to_string(home.path().join(".polish").join("config.toml")).unwrap();
    assert!(file.contains("[style]"));
    assert!(file.contains("tone = \"casual\""));
    assert!(file.contains("output_count = \"3\""));

    let output = polish(home.path(), &["config", "show"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let shown = stdout(&output);
    assert!(shown.contains("tone = casual"));
    assert!(shown.contains("outputCount = 3"));
    assert!(shown.contains("apiKey = (unset)"));
}

#[test]
fn setting_the_same_value_twice_reports_no_changes() {
    let home = tempfile::tempdir().unwrap();
    assert!(polish(home.path(), &["config", "set", "showTooltips=false"]).status.success());
    let output = polish(home.path(), &["config", "set", "showTooltips=false"]);
    assert!(output.status.success());
    assert_eq!(stdout(&output).trim(), "no changes");
}

#[test]
fn invalid_values_are_rejected_without_writing() {
    let home = tempfile::tempdir().unwrap();
    let output = polish(home.path(), &["config", "set", "iconSize=99"]);
    assert!(!output.status.success());
    assert!(!home.path().join(".polish").join("config.toml").exists());

    let output = polish(home.path(), &["config", "set", "colour=blue"]);
    assert!(!output.status.success());
}

#[test]
fn stored_key_is_masked_in_show() {
    let home = tempfile::tempdir().unwrap();
    let output = polish(home.path(), &["config", "set", "apiKey=sk-abcdefghijklmnop"]);
    assert!(output.status.success(), "{}", stderr(&output));

    let shown = stdout(&polish(home.path(), &["config", "show"]));
    assert!(!shown.contains("sk-abcdefghijklmnop"));
    assert!(shown.contains("apiKey = "));
}

#[test]
fn platforms_lists_builtin_profiles() {
    let home = tempfile::tempdir().unwrap();
    let output = polish(home.path(), &["platforms"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let listed = stdout(&output);
    assert!(listed.contains("slack\tapp.slack.com\trich-blocks"));
    assert!(listed.contains("teams\tteams.microsoft.com\trich-blocks"));
    assert!(listed.contains("gmail\tmail.google.com\trich-breaks"));
}

#[test]
fn enhance_without_key_reports_the_notice() {
    let home = tempfile::tempdir().unwrap();
    let output = polish(home.path(), &["enhance", "grammar", "--yes", "i seen him"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Please set your OpenAI API key"));
    assert!(stdout(&output).is_empty());
}

#[test]
fn enhance_rejects_unknown_objectives() {
    let home = tempfile::tempdir().unwrap();
    let output = polish(home.path(), &["enhance", "poetry", "--yes", "hello"]);
    assert!(!output.status.success());
    assert!(stderr(&output).contains("unknown objective"));
}

#[test]
fn logs_go_to_the_polish_directory() {
    let home = tempfile::tempdir().unwrap();
    let output = polish(home.path(), &["platforms"]);
    assert!(output.status.success());
    assert!(home.path().join(".polish").join("logs").join("polish.log").exists());
}
