//! Config files on disk driving local lookups and launch commands

use std::fs;

use repodash::config::{self, Config};
use repodash::forge::RepoListing;
use repodash::launcher;
use repodash::pipeline;
use repodash::summary::RepositorySummary;
use tempfile::TempDir;

#[test]
fn test_hand_written_config_drives_filter_and_launch() {
    let tmp = TempDir::new().unwrap();
    let code = tmp.path().join("code");
    fs::create_dir_all(code.join("widget")).unwrap();

    let path = tmp.path().join("config.toml");
    fs::write(
        &path,
        format!(
            r#"
excluded_repos = ["archive"]
local_code_path = "{}"

[launch]
terminal = ["tmux", "new-window", "-c", "{{path}}", "-n", "{{title}}"]
assistant = "my-assistant"
"#,
            code.display()
        ),
    )
    .unwrap();

    let config = config::load_from(&path).unwrap();
    assert_eq!(config.launch.default_prompt, "/StartOfTheDay");
    assert_eq!(config.sonar.url, "https://sonarcloud.io");

    let kept = pipeline::filter_repositories(
        &config,
        vec![
            RepoListing::minimal("acme", "widget"),
            RepoListing::minimal("acme", "archive"),
            RepoListing::minimal("acme", "gadget"),
        ],
    );
    let names: Vec<&str> = kept.iter().map(|l| l.name.as_str()).collect();
    assert_eq!(names, vec!["widget", "gadget"]);

    let mut widget = RepositorySummary::from_listing(&kept[0]);
    widget.local_path = config.local_path_for("widget");
    assert_eq!(widget.local_path, Some(code.join("widget")));
    assert_eq!(config.local_path_for("gadget"), None);

    let command = launcher::build_command(&widget, None, None, &config.launch).unwrap();
    assert_eq!(command.program, "tmux");
    assert_eq!(
        command.args,
        vec![
            "new-window".to_string(),
            "-c".to_string(),
            code.join("widget").display().to_string(),
            "-n".to_string(),
            "widget".to_string(),
            "my-assistant".to_string(),
            "/StartOfTheDay".to_string(),
        ]
    );
}

#[test]
fn test_saved_config_round_trips_through_disk() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("nested").join("config.toml");

    let mut config = Config {
        included_repos: vec!["widget".to_string()],
        github_org: Some("acme".to_string()),
        ..Default::default()
    };
    config.sonar.organization = Some("acme-sonar".to_string());
    config::save_to(&path, &config).unwrap();

    let loaded = config::load_from(&path).unwrap();
    assert_eq!(loaded.github_org(), Some("acme"));
    assert_eq!(loaded.sonar_org(), Some("acme-sonar"));
    assert!(loaded.includes("widget"));
    assert!(!loaded.includes("gadget"));
}

#[test]
fn test_legacy_json_is_migrated_once() {
    let tmp = TempDir::new().unwrap();
    let json = tmp.path().join(".repo-overview.json");
    let toml_path = tmp.path().join(".repodash").join("config.toml");
    fs::write(
        &json,
        r#"{"excluded_repos": ["old"], "sonarcloud_org": "acme-sonar", "local_code_path": "/srv/code"}"#,
    )
    .unwrap();

    assert!(config::migrate(&json, &toml_path).unwrap());
    assert!(!config::migrate(&json, &toml_path).unwrap());

    let loaded = config::load_from(&toml_path).unwrap();
    assert!(!loaded.includes("old"));
    assert_eq!(loaded.sonar_org(), Some("acme-sonar"));
    assert_eq!(loaded.local_code_path, "/srv/code");
}
