// tests/config_load.rs
use risk_news_aggregator::config::{AggregatorConfig, ENV_CONFIG_PATH, ENV_OFFLINE};
use std::{env, fs};

#[test]
fn partial_toml_keeps_defaults_for_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("aggregator.toml");
    fs::write(
        &p,
        r#"
[breaker]
failure_threshold = 3

[crawl]
max_results = 12
"#,
    )
    .unwrap();

    let cfg = AggregatorConfig::load_from(&p).unwrap();
    assert_eq!(cfg.breaker.failure_threshold, 3);
    assert_eq!(cfg.breaker.cooldown_secs, 60);
    assert_eq!(cfg.crawl.max_results, 12);
    assert_eq!(cfg.rate_limit.max_calls, 60);
    assert_eq!(cfg.http.max_connections_per_host, 30);
}

#[test]
fn invalid_values_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("bad.toml");
    fs::write(&p, "[rate_limit]\nmax_calls = 0\n").unwrap();
    assert!(AggregatorConfig::load_from(&p).is_err());

    fs::write(&p, "[crawl\nmax_results = ").unwrap();
    assert!(AggregatorConfig::load_from(&p).is_err());
}

#[serial_test::serial]
#[test]
fn default_uses_env_then_file_then_builtin() {
    // isolate CWD so the repo's own config/ is not picked up
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    env::remove_var(ENV_CONFIG_PATH);
    env::remove_var(ENV_OFFLINE);

    // 1) nothing → defaults
    let cfg = AggregatorConfig::load_default().unwrap();
    assert_eq!(cfg.crawl.max_results, 20);
    assert!(!cfg.crawl.offline);

    // 2) ./config/aggregator.toml
    let cfg_dir = tmp.path().join("config");
    fs::create_dir_all(&cfg_dir).unwrap();
    fs::write(cfg_dir.join("aggregator.toml"), "[crawl]\nmax_results = 7\n").unwrap();
    assert_eq!(AggregatorConfig::load_default().unwrap().crawl.max_results, 7);

    // 3) env path wins
    let p_env = tmp.path().join("elsewhere.toml");
    fs::write(&p_env, "[crawl]\nmax_results = 3\n").unwrap();
    env::set_var(ENV_CONFIG_PATH, p_env.display().to_string());
    assert_eq!(AggregatorConfig::load_default().unwrap().crawl.max_results, 3);

    // 4) env path to nowhere is an error, not a silent default
    env::set_var(ENV_CONFIG_PATH, tmp.path().join("missing.toml").display().to_string());
    assert!(AggregatorConfig::load_default().is_err());
    env::remove_var(ENV_CONFIG_PATH);

    env::set_current_dir(&old).unwrap();
}

#[serial_test::serial]
#[test]
fn offline_env_flag_forces_fallback_mode() {
    let old = env::current_dir().unwrap();
    let tmp = tempfile::tempdir().unwrap();
    env::set_current_dir(tmp.path()).unwrap();
    env::remove_var(ENV_CONFIG_PATH);

    env::set_var(ENV_OFFLINE, "1");
    assert!(AggregatorConfig::load_default().unwrap().crawl.offline);
    env::set_var(ENV_OFFLINE, "0");
    assert!(!AggregatorConfig::load_default().unwrap().crawl.offline);
    env::remove_var(ENV_OFFLINE);

    env::set_current_dir(&old).unwrap();
}
