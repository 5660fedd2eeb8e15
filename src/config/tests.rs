use super::*;

#[test]
fn defaults_match_the_classic_wiki_layout() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 8000);
    assert_eq!(settings.pages.directory, PathBuf::from("page"));
    assert_eq!(settings.auth.users_file, PathBuf::from("users.toml"));
    assert_eq!(settings.auth.brute_limit.get(), 10);
    assert_eq!(settings.auth.brute_window, Duration::from_secs(10));
    assert_eq!(settings.logging.level, LevelFilter::INFO);
    assert!(matches!(settings.logging.format, LogFormat::Compact));
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        pages_directory: Some(PathBuf::from("/srv/wiki")),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert_eq!(settings.pages.directory, PathBuf::from("/srv/wiki"));
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn rejects_zero_port() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(0);

    let err = Settings::from_raw(raw).expect_err("zero port");
    assert!(matches!(err, LoadError::Invalid { key: "server.port", .. }));
}

#[test]
fn rejects_unparseable_host() {
    let mut raw = RawSettings::default();
    raw.server.host = Some("not a host".to_string());

    let err = Settings::from_raw(raw).expect_err("bad host");
    assert!(matches!(err, LoadError::Invalid { key: "server.addr", .. }));
}

#[test]
fn rejects_unknown_log_level() {
    let mut raw = RawSettings::default();
    raw.logging.level = Some("loud".to_string());

    let err = Settings::from_raw(raw).expect_err("bad level");
    assert!(matches!(err, LoadError::Invalid { key: "logging.level", .. }));
}

#[test]
fn rejects_zero_brute_window() {
    let mut raw = RawSettings::default();
    raw.auth.brute_window_seconds = Some(0);

    let err = Settings::from_raw(raw).expect_err("zero window");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "auth.brute_window_seconds",
            ..
        }
    ));
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["wijiwiki"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn short_port_flag_is_accepted() {
    let args = CliArgs::parse_from(["wijiwiki", "serve", "-p", "9090"]);
    match args.command.expect("serve command") {
        Command::Serve(serve) => assert_eq!(serve.overrides.server_port, Some(9090)),
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn parse_init_arguments() {
    let args = CliArgs::parse_from([
        "wijiwiki",
        "init",
        "--admin-password",
        "hunter2",
        "--users-file",
        "/tmp/users.toml",
    ]);

    match args.command.expect("init command") {
        Command::Init(init) => {
            assert_eq!(init.admin_password, "hunter2");
            assert_eq!(init.users_file, Some(PathBuf::from("/tmp/users.toml")));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn init_users_file_override_applies() {
    let mut raw = RawSettings::default();
    raw.apply_init_overrides(&InitArgs {
        admin_password: "pw".to_string(),
        users_file: Some(PathBuf::from("accounts.toml")),
    });

    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.auth.users_file, PathBuf::from("accounts.toml"));
}

#[test]
fn config_file_layer_is_read() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("wiki.toml");
    std::fs::write(
        &path,
        "[server]\nport = 8123\n\n[pages]\ndirectory = \"content\"\n\n[auth]\nbrute_limit = 3\n",
    )
    .expect("write config");

    let args = CliArgs::parse_from([
        "wijiwiki",
        "--config-file",
        path.to_str().expect("utf8 path"),
        "serve",
    ]);
    let settings = load(&args).expect("load");

    assert_eq!(settings.server.addr.port(), 8123);
    assert_eq!(settings.pages.directory, PathBuf::from("content"));
    assert_eq!(settings.auth.brute_limit.get(), 3);
}
